//! Endianness and byte-level utilities shared by the header and volume
//! codecs, plus the gzip glue applied at the byte-stream boundary.

use crate::error::{NiftiError, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian, NativeEndian};
use byteordered::Endianness;
use flate2::bufread::GzDecoder;
use std::io::Read;
use std::path::Path;

/// Obtain this system's endianness.
#[cfg(target_endian = "little")]
pub fn native_endianness() -> Endianness {
    Endianness::Little
}

/// Obtain this system's endianness.
#[cfg(target_endian = "big")]
pub fn native_endianness() -> Endianness {
    Endianness::Big
}

/// The opposite endianness: little returns big and vice versa.
pub fn opposite_endianness(e: Endianness) -> Endianness {
    if e == Endianness::Little {
        Endianness::Big
    } else {
        Endianness::Little
    }
}

/// Swap an `i16` between the native byte order and its opposite.
pub fn swap_i16(v: i16) -> i16 {
    let mut b = [0u8; 2];
    NativeEndian::write_i16(&mut b, v);
    if cfg!(target_endian = "little") {
        BigEndian::read_i16(&b)
    } else {
        LittleEndian::read_i16(&b)
    }
}

/// Swap an `i32` between the native byte order and its opposite.
pub fn swap_i32(v: i32) -> i32 {
    let mut b = [0u8; 4];
    NativeEndian::write_i32(&mut b, v);
    if cfg!(target_endian = "little") {
        BigEndian::read_i32(&b)
    } else {
        LittleEndian::read_i32(&b)
    }
}

/// Swap an `i64` between the native byte order and its opposite.
pub fn swap_i64(v: i64) -> i64 {
    let mut b = [0u8; 8];
    NativeEndian::write_i64(&mut b, v);
    if cfg!(target_endian = "little") {
        BigEndian::read_i64(&b)
    } else {
        LittleEndian::read_i64(&b)
    }
}

/// Swap an `f32` bit pattern between the native byte order and its opposite.
pub fn swap_f32(v: f32) -> f32 {
    let mut b = [0u8; 4];
    NativeEndian::write_f32(&mut b, v);
    if cfg!(target_endian = "little") {
        BigEndian::read_f32(&b)
    } else {
        LittleEndian::read_f32(&b)
    }
}

/// Swap an `f64` bit pattern between the native byte order and its opposite.
pub fn swap_f64(v: f64) -> f64 {
    let mut b = [0u8; 8];
    NativeEndian::write_f64(&mut b, v);
    if cfg!(target_endian = "little") {
        BigEndian::read_f64(&b)
    } else {
        LittleEndian::read_f64(&b)
    }
}

/// Decide whether a header needs byte swapping from its raw `dim[0]` field.
///
/// Returns `Ok(false)` if `dim[0]` is already in `[1, 7]`, `Ok(true)` if it
/// lands in range after one swap, and `InvalidHeader` otherwise.
pub fn needs_header_swap(dim0: i16) -> Result<bool> {
    if (1..=7).contains(&dim0) {
        return Ok(false);
    }
    let swapped = swap_i16(dim0);
    if (1..=7).contains(&swapped) {
        Ok(true)
    } else {
        Err(NiftiError::InvalidHeader("dim[0] out of range"))
    }
}

/// Check the leading bytes for the gzip magic. The decision is made on
/// content, never on a file extension.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 3 && bytes[0] == 0x1f && bytes[1] == 0x8b && bytes[2] == 0x08
}

/// Inflate the buffer if it is gzip-compressed, otherwise hand it back
/// unchanged.
pub fn deflate_if_gzip(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if !is_gzip(&bytes) {
        return Ok(bytes);
    }
    let mut decoder = GzDecoder::new(&bytes[..]);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Whether the file name carries a `.gz` suffix.
pub fn is_gz_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .file_name()
        .map(|a| a.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn endianness() {
        let native = native_endianness();
        assert_eq!(opposite_endianness(opposite_endianness(native)), native);
        assert_eq!(opposite_endianness(Endianness::Little), Endianness::Big);
    }

    #[test]
    fn swaps() {
        assert_eq!(swap_i16(0x0102), 0x0201);
        assert_eq!(swap_i16(swap_i16(-1234)), -1234);
        assert_eq!(swap_i32(0x0102_0304), 0x0403_0201);
        assert_eq!(swap_i64(0x0102_0304_0506_0708), 0x0807_0605_0403_0201);
        assert_eq!(swap_f32(swap_f32(1.5)), 1.5);
        assert_eq!(swap_f64(swap_f64(-2.25)), -2.25);
    }

    #[test]
    fn header_swap_detection() {
        assert_eq!(needs_header_swap(3).unwrap(), false);
        assert_eq!(needs_header_swap(7).unwrap(), false);
        // 3 stored in the opposite byte order reads back as 0x0300
        assert_eq!(needs_header_swap(swap_i16(3)).unwrap(), true);
        assert!(needs_header_swap(0).is_err());
        assert!(needs_header_swap(swap_i16(0)).is_err());
    }

    #[test]
    fn gzip_round_trip() {
        let payload = b"not actually a nifti file".to_vec();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(&payload).unwrap();
        let compressed = encoder.finish().unwrap();

        assert!(is_gzip(&compressed));
        assert!(!is_gzip(&payload));
        assert_eq!(deflate_if_gzip(compressed).unwrap(), payload);
        assert_eq!(deflate_if_gzip(payload.clone()).unwrap(), payload);
    }

    #[test]
    fn filenames() {
        assert!(!is_gz_file("/path/to/something.nii"));
        assert!(is_gz_file("/path/to/something.nii.gz"));
        assert!(is_gz_file("1.2.3.img.gz"));
        assert!(!is_gz_file("plain.hdr"));
    }
}
