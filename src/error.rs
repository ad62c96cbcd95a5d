//! Error types for all parsing, encoding and voxel operations.

use quick_error::quick_error;
use std::io::Error as IoError;

quick_error! {
    #[derive(Debug)]
    /// Error type for all operations in this crate.
    pub enum NiftiError {
        /// The stream does not start with a recognisable NIfTI header size.
        InvalidFormat {
            display("invalid NIfTI file format")
        }
        /// The header magic is not one of the four allowed strings.
        InvalidMagic {
            display("invalid NIfTI magic string")
        }
        /// A header field holds a value the format does not allow.
        InvalidHeader(reason: &'static str) {
            display("invalid NIfTI header: {}", reason)
        }
        /// The header size identifies neither NIfTI-1 nor NIfTI-2.
        UnknownVersion(size: i32) {
            display("unknown NIfTI version (header size {})", size)
        }
        /// The datatype cannot be encoded or decoded.
        UnsupportedDataType(code: i32) {
            display("unsupported datatype code {}", code)
        }
        /// A code value is outside its enumeration table.
        InvalidCode(of: &'static str, code: i32) {
            display("unknown {} code {}", of, code)
        }
        /// The input ended before the expected number of bytes was read.
        ShortRead(expected: usize, got: usize) {
            display("short read: expected {} bytes, got {}", expected, got)
        }
        /// A voxel access lies outside the raw volume.
        OutOfRange(offset: usize, len: usize) {
            display("byte offset {} out of range for volume of {} bytes", offset, len)
        }
        /// A buffer length disagrees with the dimensions that describe it.
        DimensionMismatch(expected: i64, got: i64) {
            display("expected volume length {}, got {}", expected, got)
        }
        /// An operation received an empty input sequence.
        EmptyInput {
            display("input sequence is empty")
        }
        /// A fixed-width text field received an oversized value.
        IncorrectLength(field: &'static str, len: usize) {
            display("{} of {} bytes does not fit the field", field, len)
        }
        /// I/O error.
        Io(err: IoError) {
            from()
            source(err)
            display("I/O error: {}", err)
        }
        /// Malformed segmentation coordinate document.
        Json(err: ::serde_json::Error) {
            from()
            source(err)
            display("JSON error: {}", err)
        }
    }
}

/// Alias for a `Result` with a `NiftiError` error type.
pub type Result<T> = ::std::result::Result<T, NiftiError>;
