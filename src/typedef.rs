//! Types defined by the NIfTI standard: datatype codes, transform codes,
//! slice orders, measurement units and axis orientations. All of them can be
//! converted from their on-disk integer codes and back.

use crate::error::{NiftiError, Result};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::fmt;

/// Version discriminant of a NIfTI stream.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum NiftiVersion {
    /// NIfTI-1, 348-byte header.
    Nifti1,
    /// NIfTI-2, 540-byte header.
    Nifti2,
}

impl NiftiVersion {
    /// The version number as found in user-facing options (1 or 2).
    pub fn number(self) -> i32 {
        match self {
            NiftiVersion::Nifti1 => 1,
            NiftiVersion::Nifti2 => 2,
        }
    }
}

impl Default for NiftiVersion {
    fn default() -> NiftiVersion {
        NiftiVersion::Nifti1
    }
}

/// Data type for representing a NIfTI value type in a volume.
///
/// `Binary`, `Float128`, `Complex128` and `Complex256` are recognised by the
/// catalogue but not supported by the voxel codec: reads yield zero and
/// writes fail.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum NiftiType {
    /// Unspecified datatype.
    Unknown = 0,
    /// 1 bit per voxel (unsupported by the codec).
    Binary = 1,
    /// unsigned char.
    Uint8 = 2,
    /// signed short.
    Int16 = 4,
    /// signed int.
    Int32 = 8,
    /// 32 bit float.
    Float32 = 16,
    /// 64 bit complex = 2 32 bit floats.
    Complex64 = 32,
    /// 64 bit float = double.
    Float64 = 64,
    /// 3 8 bit bytes.
    Rgb24 = 128,
    /// signed char.
    Int8 = 256,
    /// unsigned short.
    Uint16 = 512,
    /// unsigned int.
    Uint32 = 768,
    /// signed long long.
    Int64 = 1024,
    /// unsigned long long.
    Uint64 = 1280,
    /// 128 bit float = long double.
    Float128 = 1536,
    /// 128 bit complex = 2 64 bit floats.
    Complex128 = 1792,
    /// 256 bit complex = 2 128 bit floats.
    Complex256 = 2048,
    /// 4 8 bit bytes.
    Rgba32 = 2304,
}

impl NiftiType {
    /// Retrieve the size of an element of this data type, in bytes.
    pub fn size_of(self) -> usize {
        use NiftiType::*;
        match self {
            Unknown | Binary => 0,
            Int8 | Uint8 => 1,
            Int16 | Uint16 => 2,
            Rgb24 => 3,
            Int32 | Uint32 | Float32 | Rgba32 => 4,
            Int64 | Uint64 | Float64 | Complex64 => 8,
            Float128 | Complex128 => 16,
            Complex256 => 32,
        }
    }

    /// The unit of byte swapping for this data type, in bytes.
    /// A swap size of 0 means the element is endianness-neutral.
    pub fn swap_size(self) -> usize {
        use NiftiType::*;
        match self {
            Unknown | Binary | Int8 | Uint8 | Rgb24 | Rgba32 => 0,
            Int16 | Uint16 => 2,
            Int32 | Uint32 | Float32 | Complex64 => 4,
            Int64 | Uint64 | Float64 | Complex128 => 8,
            Float128 | Complex256 => 16,
        }
    }
}

impl fmt::Display for NiftiType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use NiftiType::*;
        let name = match *self {
            Unknown => "UNKNOWN",
            Binary => "BINARY",
            Int8 => "INT8",
            Uint8 => "UINT8",
            Int16 => "INT16",
            Uint16 => "UINT16",
            Int32 => "INT32",
            Uint32 => "UINT32",
            Int64 => "INT64",
            Uint64 => "UINT64",
            Float32 => "FLOAT32",
            Float64 => "FLOAT64",
            Float128 => "FLOAT128",
            Complex64 => "COMPLEX64",
            Complex128 => "COMPLEX128",
            Complex256 => "COMPLEX256",
            Rgb24 => "RGB24",
            Rgba32 => "RGBA32",
        };
        f.write_str(name)
    }
}

/// Check whether a raw code identifies a datatype of the catalogue.
pub fn is_valid_datatype(code: i32) -> bool {
    NiftiType::from_i32(code).is_some()
}

/// Map a raw datatype code to `(n_by_per, swap_size)`, the number of bytes
/// per voxel and the unit of endianness reversal. Unknown codes map to
/// `(0, 0)`.
pub fn assign_datatype_size(code: i32) -> (i16, i16) {
    match NiftiType::from_i32(code) {
        Some(t) => (t.size_of() as i16, t.swap_size() as i16),
        None => (0, 0),
    }
}

/// An enum type for representing a NIfTI unit of measurement.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum Unit {
    /// NIFTI code for unspecified units.
    Unknown = 0,
    /// NIFTI code for meters.
    Meter = 1,
    /// NIFTI code for millimeters.
    Mm = 2,
    /// NIFTI code for micrometers.
    Micron = 3,
    /// NIFTI code for seconds.
    Sec = 8,
    /// NIFTI code for milliseconds.
    Msec = 16,
    /// NIFTI code for microseconds.
    Usec = 24,
    /// NIFTI code for Hertz.
    Hz = 32,
    /// NIFTI code for ppm.
    Ppm = 40,
    /// NIFTI code for radians per second.
    Rads = 48,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Unit::*;
        let name = match *self {
            Unknown => "Unknown",
            Meter => "Meter",
            Mm => "Millimeter",
            Micron => "Micron",
            Sec => "Second",
            Msec => "Millisecond",
            Usec => "Microsecond",
            Hz => "Hertz",
            Ppm => "Ppm",
            Rads => "Radians per second",
        };
        f.write_str(name)
    }
}

/// An enum type for representing a NIfTI XForm (patient orientation) code.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum XForm {
    /// Arbitrary coordinates (Method 1).
    Unknown = 0,
    /// Scanner-based anatomical coordinates.
    ScannerAnat = 1,
    /// Coordinates aligned to another file's, or to anatomical "truth".
    AlignedAnat = 2,
    /// Coordinates aligned to the Talairach-Tournoux Atlas; (0,0,0)=AC.
    Talairach = 3,
    /// MNI 152 normalized coordinates.
    Mni152 = 4,
}

impl fmt::Display for XForm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use XForm::*;
        let name = match *self {
            Unknown => "0: Unknown",
            ScannerAnat => "1: Scanner Anat",
            AlignedAnat => "2: Aligned Anat",
            Talairach => "3: Talairach",
            Mni152 => "4: MNI",
        };
        f.write_str(name)
    }
}

/// An enum type for representing the slice acquisition order.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum SliceOrder {
    /// NIFTI_SLICE_UNKNOWN
    Unknown = 0,
    /// NIFTI_SLICE_SEQ_INC
    SeqInc = 1,
    /// NIFTI_SLICE_SEQ_DEC
    SeqDec = 2,
    /// NIFTI_SLICE_ALT_INC
    AltInc = 3,
    /// NIFTI_SLICE_ALT_DEC
    AltDec = 4,
    /// NIFTI_SLICE_ALT_INC2
    AltInc2 = 5,
    /// NIFTI_SLICE_ALT_DEC2
    AltDec2 = 6,
}

impl fmt::Display for SliceOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use SliceOrder::*;
        let name = match *self {
            Unknown => "0: Unknown",
            SeqInc => "1: Sequential Increasing",
            SeqDec => "2: Sequential Decreasing",
            AltInc => "3: Alternating Increasing",
            AltDec => "4: Alternating Decreasing",
            AltInc2 => "5: Alternating Increasing 2",
            AltDec2 => "6: Alternating Decreasing 2",
        };
        f.write_str(name)
    }
}

/// Direction of a voxel axis in patient coordinates.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum Orientation {
    /// The axis direction could not be determined.
    Unknown = 0,
    /// Left to right.
    L2R = 1,
    /// Right to left.
    R2L = 2,
    /// Posterior to anterior.
    P2A = 3,
    /// Anterior to posterior.
    A2P = 4,
    /// Inferior to superior.
    I2S = 5,
    /// Superior to inferior.
    S2I = 6,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Orientation::*;
        let name = match *self {
            Unknown => "Unknown",
            L2R => "L2R",
            R2L => "R2L",
            P2A => "P2A",
            A2P => "A2P",
            I2S => "I2S",
            S2I => "S2I",
        };
        f.write_str(name)
    }
}

/// Validate a raw slice code against the slice order table.
pub fn slice_order_from_code(code: i32) -> Result<SliceOrder> {
    SliceOrder::from_i32(code).ok_or(NiftiError::InvalidCode("slice order", code))
}

/// Validate a raw xform code against the orientation table.
pub fn xform_from_code(code: i32) -> Result<XForm> {
    XForm::from_i32(code).ok_or(NiftiError::InvalidCode("xform", code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datatype_sizes() {
        assert_eq!(assign_datatype_size(NiftiType::Uint8 as i32), (1, 0));
        assert_eq!(assign_datatype_size(NiftiType::Int16 as i32), (2, 2));
        assert_eq!(assign_datatype_size(NiftiType::Rgb24 as i32), (3, 0));
        assert_eq!(assign_datatype_size(NiftiType::Rgba32 as i32), (4, 0));
        assert_eq!(assign_datatype_size(NiftiType::Float32 as i32), (4, 4));
        assert_eq!(assign_datatype_size(NiftiType::Complex64 as i32), (8, 4));
        assert_eq!(assign_datatype_size(NiftiType::Float64 as i32), (8, 8));
        assert_eq!(assign_datatype_size(NiftiType::Float128 as i32), (16, 16));
        assert_eq!(assign_datatype_size(NiftiType::Complex128 as i32), (16, 8));
        assert_eq!(assign_datatype_size(NiftiType::Complex256 as i32), (32, 16));
        // codes outside the catalogue
        assert_eq!(assign_datatype_size(42), (0, 0));
    }

    #[test]
    fn datatype_codes() {
        assert_eq!(NiftiType::from_i32(4), Some(NiftiType::Int16));
        assert_eq!(NiftiType::from_i32(2304), Some(NiftiType::Rgba32));
        assert_eq!(NiftiType::from_i32(3), None);
        assert!(is_valid_datatype(512));
        assert!(!is_valid_datatype(-1));
    }

    #[test]
    fn display_strings() {
        assert_eq!(NiftiType::Int16.to_string(), "INT16");
        assert_eq!(XForm::ScannerAnat.to_string(), "1: Scanner Anat");
        assert_eq!(XForm::Mni152.to_string(), "4: MNI");
        assert_eq!(Orientation::R2L.to_string(), "R2L");
        assert_eq!(SliceOrder::Unknown.to_string(), "0: Unknown");
    }
}
