//! The fixed-layout NIfTI-1 (348 byte) and NIfTI-2 (540 byte) header
//! records, with byte-exact decoding and encoding under a runtime byte
//! order, and the version-tagged [`NiftiHeader`] wrapper the reader and
//! writer pipelines branch on.

use crate::error::{NiftiError, Result};
use crate::typedef::{assign_datatype_size, is_valid_datatype, NiftiType, NiftiVersion};
use crate::util::{swap_f32, swap_i16, swap_i32};
use byteordered::{ByteOrdered, Endianness};
use derive_builder::Builder;
use std::io::{Read, Write};

/// Size of a NIfTI-1 header, in bytes.
pub const NII1_HEADER_SIZE: i32 = 348;
/// Size of a NIfTI-2 header, in bytes.
pub const NII2_HEADER_SIZE: i32 = 540;
/// Default number of zero bytes between a header and the voxel data when the
/// declared `vox_offset` does not leave room for any.
pub const DEFAULT_HEADER_PADDING: i32 = 4;

/// Magic code for NIfTI-1 header files (paired `.hdr`/`.img`).
pub const MAGIC_CODE_NI1: &[u8; 4] = b"ni1\0";
/// Magic code for single-file NIfTI-1 (`.nii`).
pub const MAGIC_CODE_NIP1: &[u8; 4] = b"n+1\0";
/// Magic code for NIfTI-2 header files (paired `.hdr`/`.img`).
pub const MAGIC_CODE_NI2: &[u8; 8] = &[0x6e, 0x69, 0x32, 0x00, 0x0d, 0x0a, 0x1a, 0x0a];
/// Magic code for single-file NIfTI-2 (`.nii`).
pub const MAGIC_CODE_NIP2: &[u8; 8] = &[0x6e, 0x2b, 0x32, 0x00, 0x0d, 0x0a, 0x1a, 0x0a];

/// The NIfTI-1 header record. All fields are public and named after the
/// specification's header file. A builder is also available.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default)]
pub struct Nifti1Header {
    /// Header size, must be 348
    pub sizeof_hdr: i32,
    /// Unused in NIFTI-1
    pub data_type: [u8; 10],
    /// Unused in NIFTI-1
    pub db_name: [u8; 18],
    /// Unused in NIFTI-1
    pub extents: i32,
    /// Unused in NIFTI-1
    pub session_error: i16,
    /// Unused in NIFTI-1
    pub regular: u8,
    /// MRI slice ordering, packed as three 2-bit fields
    pub dim_info: u8,
    /// Data array dimensions; `dim[0]` is the dimensionality
    pub dim: [i16; 8],
    /// 1st intent parameter
    pub intent_p1: f32,
    /// 2nd intent parameter
    pub intent_p2: f32,
    /// 3rd intent parameter
    pub intent_p3: f32,
    /// NIFTI_INTENT_* code
    pub intent_code: i16,
    /// Defines the data type
    pub datatype: i16,
    /// Number of bits per voxel
    pub bitpix: i16,
    /// First slice index
    pub slice_start: i16,
    /// Grid spacings; `pixdim[0]` carries the qfac sign
    pub pixdim: [f32; 8],
    /// Offset into the .nii file to reach the volume
    pub vox_offset: f32,
    /// Data scaling: slope
    pub scl_slope: f32,
    /// Data scaling: offset
    pub scl_inter: f32,
    /// Last slice index
    pub slice_end: i16,
    /// Slice timing order
    pub slice_code: u8,
    /// Units of pixdim[1..4]
    pub xyzt_units: u8,
    /// Max display intensity
    pub cal_max: f32,
    /// Min display intensity
    pub cal_min: f32,
    /// Time for 1 slice
    pub slice_duration: f32,
    /// Time axis shift
    pub toffset: f32,
    /// Unused in NIFTI-1
    pub glmax: i32,
    /// Unused in NIFTI-1
    pub glmin: i32,
    /// Any text you like
    pub descrip: [u8; 80],
    /// Auxiliary filename
    pub aux_file: [u8; 24],
    /// NIFTI_XFORM_* code
    pub qform_code: i16,
    /// NIFTI_XFORM_* code
    pub sform_code: i16,
    /// Quaternion b param
    pub quatern_b: f32,
    /// Quaternion c param
    pub quatern_c: f32,
    /// Quaternion d param
    pub quatern_d: f32,
    /// Quaternion x shift
    pub qoffset_x: f32,
    /// Quaternion y shift
    pub qoffset_y: f32,
    /// Quaternion z shift
    pub qoffset_z: f32,
    /// 1st row affine transform
    pub srow_x: [f32; 4],
    /// 2nd row affine transform
    pub srow_y: [f32; 4],
    /// 3rd row affine transform
    pub srow_z: [f32; 4],
    /// 'name' or meaning of data
    pub intent_name: [u8; 16],
    /// Magic code, `b"n+1\0"` or `b"ni1\0"`
    pub magic: [u8; 4],
}

impl Default for Nifti1Header {
    fn default() -> Nifti1Header {
        Nifti1Header {
            sizeof_hdr: NII1_HEADER_SIZE,
            data_type: [0; 10],
            db_name: [0; 18],
            extents: 0,
            session_error: 0,
            regular: 0,
            dim_info: 0,
            dim: [1, 0, 0, 0, 0, 0, 0, 0],
            intent_p1: 0.,
            intent_p2: 0.,
            intent_p3: 0.,
            intent_code: 0,
            datatype: 0,
            bitpix: 0,
            slice_start: 0,
            pixdim: [0.; 8],
            vox_offset: 352.,
            scl_slope: 0.,
            scl_inter: 0.,
            slice_end: 0,
            slice_code: 0,
            xyzt_units: 0,
            cal_max: 0.,
            cal_min: 0.,
            slice_duration: 0.,
            toffset: 0.,
            glmax: 0,
            glmin: 0,
            descrip: [0; 80],
            aux_file: [0; 24],
            qform_code: 0,
            sform_code: 0,
            quatern_b: 0.,
            quatern_c: 0.,
            quatern_d: 0.,
            qoffset_x: 0.,
            qoffset_y: 0.,
            qoffset_z: 0.,
            srow_x: [0.; 4],
            srow_y: [0.; 4],
            srow_z: [0.; 4],
            intent_name: [0; 16],
            magic: *MAGIC_CODE_NIP1,
        }
    }
}

impl Nifti1Header {
    /// Build a fresh single-file header for the given shape and datatype.
    ///
    /// `dim` follows the on-disk convention (`dim[0]` is the rank). A rank
    /// outside `[0, 7]` or a non-positive extent falls back to a
    /// `1×1×1` three-dimensional shape, and an unknown datatype falls back
    /// to `FLOAT32`.
    pub fn shaped(dim: Option<[i16; 8]>, datatype: i32) -> Nifti1Header {
        let mut dim = dim.unwrap_or([3, 1, 1, 1, 1, 1, 1, 1]);
        if !(0..=7).contains(&dim[0]) || dim[1..=dim[0] as usize].iter().any(|&d| d < 1) {
            dim = [3, 1, 1, 1, 1, 1, 1, 1];
        }
        let datatype = if is_valid_datatype(datatype) {
            datatype
        } else {
            NiftiType::Float32 as i32
        };

        let mut header = Nifti1Header {
            regular: b'r',
            datatype: datatype as i16,
            ..Nifti1Header::default()
        };
        header.dim[0] = dim[0];
        header.pixdim[0] = 0.0;
        for c in 1..=dim[0] as usize {
            header.dim[c] = dim[c];
            header.pixdim[c] = 1.0;
        }
        let (nbyper, _) = assign_datatype_size(datatype);
        header.bitpix = 8 * nbyper;
        header
    }

    /// Read a NIfTI-1 header from a byte source in the given byte order.
    /// It is assumed that the input is at the start of the header.
    pub fn from_reader<S: Read>(src: S, endianness: Endianness) -> Result<Nifti1Header> {
        let mut h = Nifti1Header::default();
        let mut f = ByteOrdered::runtime(src, endianness);

        h.sizeof_hdr = f.read_i32()?;
        f.read_exact(&mut h.data_type)?;
        f.read_exact(&mut h.db_name)?;
        h.extents = f.read_i32()?;
        h.session_error = f.read_i16()?;
        h.regular = f.read_u8()?;
        h.dim_info = f.read_u8()?;
        for v in &mut h.dim {
            *v = f.read_i16()?;
        }
        h.intent_p1 = f.read_f32()?;
        h.intent_p2 = f.read_f32()?;
        h.intent_p3 = f.read_f32()?;
        h.intent_code = f.read_i16()?;
        h.datatype = f.read_i16()?;
        h.bitpix = f.read_i16()?;
        h.slice_start = f.read_i16()?;
        for v in &mut h.pixdim {
            *v = f.read_f32()?;
        }
        h.vox_offset = f.read_f32()?;
        h.scl_slope = f.read_f32()?;
        h.scl_inter = f.read_f32()?;
        h.slice_end = f.read_i16()?;
        h.slice_code = f.read_u8()?;
        h.xyzt_units = f.read_u8()?;
        h.cal_max = f.read_f32()?;
        h.cal_min = f.read_f32()?;
        h.slice_duration = f.read_f32()?;
        h.toffset = f.read_f32()?;
        h.glmax = f.read_i32()?;
        h.glmin = f.read_i32()?;
        f.read_exact(&mut h.descrip)?;
        f.read_exact(&mut h.aux_file)?;
        h.qform_code = f.read_i16()?;
        h.sform_code = f.read_i16()?;
        h.quatern_b = f.read_f32()?;
        h.quatern_c = f.read_f32()?;
        h.quatern_d = f.read_f32()?;
        h.qoffset_x = f.read_f32()?;
        h.qoffset_y = f.read_f32()?;
        h.qoffset_z = f.read_f32()?;
        for v in &mut h.srow_x {
            *v = f.read_f32()?;
        }
        for v in &mut h.srow_y {
            *v = f.read_f32()?;
        }
        for v in &mut h.srow_z {
            *v = f.read_f32()?;
        }
        f.read_exact(&mut h.intent_name)?;
        f.read_exact(&mut h.magic)?;

        Ok(h)
    }

    /// Write the header to a byte sink in the given byte order. Exactly 348
    /// bytes are emitted.
    pub fn write_to<W: Write>(&self, dst: W, endianness: Endianness) -> Result<()> {
        let mut f = ByteOrdered::runtime(dst, endianness);

        f.write_i32(self.sizeof_hdr)?;
        f.write_all(&self.data_type)?;
        f.write_all(&self.db_name)?;
        f.write_i32(self.extents)?;
        f.write_i16(self.session_error)?;
        f.write_u8(self.regular)?;
        f.write_u8(self.dim_info)?;
        for v in &self.dim {
            f.write_i16(*v)?;
        }
        f.write_f32(self.intent_p1)?;
        f.write_f32(self.intent_p2)?;
        f.write_f32(self.intent_p3)?;
        f.write_i16(self.intent_code)?;
        f.write_i16(self.datatype)?;
        f.write_i16(self.bitpix)?;
        f.write_i16(self.slice_start)?;
        for v in &self.pixdim {
            f.write_f32(*v)?;
        }
        f.write_f32(self.vox_offset)?;
        f.write_f32(self.scl_slope)?;
        f.write_f32(self.scl_inter)?;
        f.write_i16(self.slice_end)?;
        f.write_u8(self.slice_code)?;
        f.write_u8(self.xyzt_units)?;
        f.write_f32(self.cal_max)?;
        f.write_f32(self.cal_min)?;
        f.write_f32(self.slice_duration)?;
        f.write_f32(self.toffset)?;
        f.write_i32(self.glmax)?;
        f.write_i32(self.glmin)?;
        f.write_all(&self.descrip)?;
        f.write_all(&self.aux_file)?;
        f.write_i16(self.qform_code)?;
        f.write_i16(self.sform_code)?;
        for v in &[
            self.quatern_b,
            self.quatern_c,
            self.quatern_d,
            self.qoffset_x,
            self.qoffset_y,
            self.qoffset_z,
        ] {
            f.write_f32(*v)?;
        }
        for v in self.srow_x.iter().chain(&self.srow_y).chain(&self.srow_z) {
            f.write_f32(*v)?;
        }
        f.write_all(&self.intent_name)?;
        f.write_all(&self.magic)?;

        Ok(())
    }

    /// Serialise the header to 348 bytes in native byte order.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(NII1_HEADER_SIZE as usize);
        self.write_to(&mut out, crate::util::native_endianness())?;
        Ok(out)
    }

    /// Ensure the magic is one of the two NIfTI-1 strings.
    pub fn validate_magic(&self) -> Result<()> {
        if &self.magic == MAGIC_CODE_NI1 || &self.magic == MAGIC_CODE_NIP1 {
            Ok(())
        } else {
            Err(NiftiError::InvalidMagic)
        }
    }

    /// Produce a copy with every multi-byte numeric field byte-swapped.
    pub fn swapped(&self) -> Nifti1Header {
        let mut h = self.clone();
        h.sizeof_hdr = swap_i32(h.sizeof_hdr);
        h.extents = swap_i32(h.extents);
        h.session_error = swap_i16(h.session_error);
        for v in &mut h.dim {
            *v = swap_i16(*v);
        }
        h.intent_p1 = swap_f32(h.intent_p1);
        h.intent_p2 = swap_f32(h.intent_p2);
        h.intent_p3 = swap_f32(h.intent_p3);
        h.intent_code = swap_i16(h.intent_code);
        h.datatype = swap_i16(h.datatype);
        h.bitpix = swap_i16(h.bitpix);
        h.slice_start = swap_i16(h.slice_start);
        for v in &mut h.pixdim {
            *v = swap_f32(*v);
        }
        h.vox_offset = swap_f32(h.vox_offset);
        h.scl_slope = swap_f32(h.scl_slope);
        h.scl_inter = swap_f32(h.scl_inter);
        h.slice_end = swap_i16(h.slice_end);
        h.cal_max = swap_f32(h.cal_max);
        h.cal_min = swap_f32(h.cal_min);
        h.slice_duration = swap_f32(h.slice_duration);
        h.toffset = swap_f32(h.toffset);
        h.glmax = swap_i32(h.glmax);
        h.glmin = swap_i32(h.glmin);
        h.qform_code = swap_i16(h.qform_code);
        h.sform_code = swap_i16(h.sform_code);
        h.quatern_b = swap_f32(h.quatern_b);
        h.quatern_c = swap_f32(h.quatern_c);
        h.quatern_d = swap_f32(h.quatern_d);
        h.qoffset_x = swap_f32(h.qoffset_x);
        h.qoffset_y = swap_f32(h.qoffset_y);
        h.qoffset_z = swap_f32(h.qoffset_z);
        for i in 0..4 {
            h.srow_x[i] = swap_f32(h.srow_x[i]);
            h.srow_y[i] = swap_f32(h.srow_y[i]);
            h.srow_z[i] = swap_f32(h.srow_z[i]);
        }
        h
    }
}

/// The NIfTI-2 header record. The same information as the NIfTI-1 record,
/// re-widened: floats are `f64`, dims and slice offsets are `i64`, codes are
/// `i32`. The field order differs from NIfTI-1 and is fixed by the standard.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default)]
pub struct Nifti2Header {
    /// Header size, must be 540
    pub sizeof_hdr: i32,
    /// Magic code, `b"n+2\0\r\n\x1a\n"` or `b"ni2\0\r\n\x1a\n"`
    pub magic: [u8; 8],
    /// Defines the data type
    pub datatype: i16,
    /// Number of bits per voxel
    pub bitpix: i16,
    /// Data array dimensions; `dim[0]` is the dimensionality
    pub dim: [i64; 8],
    /// 1st intent parameter
    pub intent_p1: f64,
    /// 2nd intent parameter
    pub intent_p2: f64,
    /// 3rd intent parameter
    pub intent_p3: f64,
    /// Grid spacings; `pixdim[0]` carries the qfac sign
    pub pixdim: [f64; 8],
    /// Offset into the .nii file to reach the volume
    pub vox_offset: i64,
    /// Data scaling: slope
    pub scl_slope: f64,
    /// Data scaling: offset
    pub scl_inter: f64,
    /// Max display intensity
    pub cal_max: f64,
    /// Min display intensity
    pub cal_min: f64,
    /// Time for 1 slice
    pub slice_duration: f64,
    /// Time axis shift
    pub toffset: f64,
    /// First slice index
    pub slice_start: i64,
    /// Last slice index
    pub slice_end: i64,
    /// Any text you like
    pub descrip: [u8; 80],
    /// Auxiliary filename
    pub aux_file: [u8; 24],
    /// NIFTI_XFORM_* code
    pub qform_code: i32,
    /// NIFTI_XFORM_* code
    pub sform_code: i32,
    /// Quaternion b param
    pub quatern_b: f64,
    /// Quaternion c param
    pub quatern_c: f64,
    /// Quaternion d param
    pub quatern_d: f64,
    /// Quaternion x shift
    pub qoffset_x: f64,
    /// Quaternion y shift
    pub qoffset_y: f64,
    /// Quaternion z shift
    pub qoffset_z: f64,
    /// 1st row affine transform
    pub srow_x: [f64; 4],
    /// 2nd row affine transform
    pub srow_y: [f64; 4],
    /// 3rd row affine transform
    pub srow_z: [f64; 4],
    /// Slice timing order
    pub slice_code: i32,
    /// Units of pixdim[1..4]
    pub xyzt_units: i32,
    /// NIFTI_INTENT_* code
    pub intent_code: i32,
    /// 'name' or meaning of data
    pub intent_name: [u8; 16],
    /// MRI slice ordering, packed as three 2-bit fields
    pub dim_info: u8,
    /// Reserved
    pub unused_str: [u8; 15],
}

impl Default for Nifti2Header {
    fn default() -> Nifti2Header {
        Nifti2Header {
            sizeof_hdr: NII2_HEADER_SIZE,
            magic: *MAGIC_CODE_NIP2,
            datatype: 0,
            bitpix: 0,
            dim: [1, 0, 0, 0, 0, 0, 0, 0],
            intent_p1: 0.,
            intent_p2: 0.,
            intent_p3: 0.,
            pixdim: [0.; 8],
            vox_offset: (NII2_HEADER_SIZE + DEFAULT_HEADER_PADDING) as i64,
            scl_slope: 0.,
            scl_inter: 0.,
            cal_max: 0.,
            cal_min: 0.,
            slice_duration: 0.,
            toffset: 0.,
            slice_start: 0,
            slice_end: 0,
            descrip: [0; 80],
            aux_file: [0; 24],
            qform_code: 0,
            sform_code: 0,
            quatern_b: 0.,
            quatern_c: 0.,
            quatern_d: 0.,
            qoffset_x: 0.,
            qoffset_y: 0.,
            qoffset_z: 0.,
            srow_x: [0.; 4],
            srow_y: [0.; 4],
            srow_z: [0.; 4],
            slice_code: 0,
            xyzt_units: 0,
            intent_code: 0,
            intent_name: [0; 16],
            dim_info: 0,
            unused_str: [0; 15],
        }
    }
}

impl Nifti2Header {
    /// Build a fresh single-file header for the given shape and datatype,
    /// with the same fallbacks as [`Nifti1Header::shaped`].
    pub fn shaped(dim: Option<[i64; 8]>, datatype: i32) -> Nifti2Header {
        let mut dim = dim.unwrap_or([3, 1, 1, 1, 1, 1, 1, 1]);
        if !(0..=7).contains(&dim[0]) || dim[1..=dim[0] as usize].iter().any(|&d| d < 1) {
            dim = [3, 1, 1, 1, 1, 1, 1, 1];
        }
        let datatype = if is_valid_datatype(datatype) {
            datatype
        } else {
            NiftiType::Float32 as i32
        };

        let mut header = Nifti2Header {
            datatype: datatype as i16,
            ..Nifti2Header::default()
        };
        header.dim[0] = dim[0];
        header.pixdim[0] = 0.0;
        for c in 1..=dim[0] as usize {
            header.dim[c] = dim[c];
            header.pixdim[c] = 1.0;
        }
        let (nbyper, _) = assign_datatype_size(datatype);
        header.bitpix = 8 * nbyper;
        header
    }

    /// Read a NIfTI-2 header from a byte source in the given byte order.
    pub fn from_reader<S: Read>(src: S, endianness: Endianness) -> Result<Nifti2Header> {
        let mut h = Nifti2Header::default();
        let mut f = ByteOrdered::runtime(src, endianness);

        h.sizeof_hdr = f.read_i32()?;
        f.read_exact(&mut h.magic)?;
        h.datatype = f.read_i16()?;
        h.bitpix = f.read_i16()?;
        for v in &mut h.dim {
            *v = f.read_i64()?;
        }
        h.intent_p1 = f.read_f64()?;
        h.intent_p2 = f.read_f64()?;
        h.intent_p3 = f.read_f64()?;
        for v in &mut h.pixdim {
            *v = f.read_f64()?;
        }
        h.vox_offset = f.read_i64()?;
        h.scl_slope = f.read_f64()?;
        h.scl_inter = f.read_f64()?;
        h.cal_max = f.read_f64()?;
        h.cal_min = f.read_f64()?;
        h.slice_duration = f.read_f64()?;
        h.toffset = f.read_f64()?;
        h.slice_start = f.read_i64()?;
        h.slice_end = f.read_i64()?;
        f.read_exact(&mut h.descrip)?;
        f.read_exact(&mut h.aux_file)?;
        h.qform_code = f.read_i32()?;
        h.sform_code = f.read_i32()?;
        h.quatern_b = f.read_f64()?;
        h.quatern_c = f.read_f64()?;
        h.quatern_d = f.read_f64()?;
        h.qoffset_x = f.read_f64()?;
        h.qoffset_y = f.read_f64()?;
        h.qoffset_z = f.read_f64()?;
        for v in &mut h.srow_x {
            *v = f.read_f64()?;
        }
        for v in &mut h.srow_y {
            *v = f.read_f64()?;
        }
        for v in &mut h.srow_z {
            *v = f.read_f64()?;
        }
        h.slice_code = f.read_i32()?;
        h.xyzt_units = f.read_i32()?;
        h.intent_code = f.read_i32()?;
        f.read_exact(&mut h.intent_name)?;
        h.dim_info = f.read_u8()?;
        f.read_exact(&mut h.unused_str)?;

        Ok(h)
    }

    /// Write the header to a byte sink in the given byte order. Exactly 540
    /// bytes are emitted.
    pub fn write_to<W: Write>(&self, dst: W, endianness: Endianness) -> Result<()> {
        let mut f = ByteOrdered::runtime(dst, endianness);

        f.write_i32(self.sizeof_hdr)?;
        f.write_all(&self.magic)?;
        f.write_i16(self.datatype)?;
        f.write_i16(self.bitpix)?;
        for v in &self.dim {
            f.write_i64(*v)?;
        }
        f.write_f64(self.intent_p1)?;
        f.write_f64(self.intent_p2)?;
        f.write_f64(self.intent_p3)?;
        for v in &self.pixdim {
            f.write_f64(*v)?;
        }
        f.write_i64(self.vox_offset)?;
        f.write_f64(self.scl_slope)?;
        f.write_f64(self.scl_inter)?;
        f.write_f64(self.cal_max)?;
        f.write_f64(self.cal_min)?;
        f.write_f64(self.slice_duration)?;
        f.write_f64(self.toffset)?;
        f.write_i64(self.slice_start)?;
        f.write_i64(self.slice_end)?;
        f.write_all(&self.descrip)?;
        f.write_all(&self.aux_file)?;
        f.write_i32(self.qform_code)?;
        f.write_i32(self.sform_code)?;
        for v in &[
            self.quatern_b,
            self.quatern_c,
            self.quatern_d,
            self.qoffset_x,
            self.qoffset_y,
            self.qoffset_z,
        ] {
            f.write_f64(*v)?;
        }
        for v in self.srow_x.iter().chain(&self.srow_y).chain(&self.srow_z) {
            f.write_f64(*v)?;
        }
        f.write_i32(self.slice_code)?;
        f.write_i32(self.xyzt_units)?;
        f.write_i32(self.intent_code)?;
        f.write_all(&self.intent_name)?;
        f.write_u8(self.dim_info)?;
        f.write_all(&self.unused_str)?;

        Ok(())
    }

    /// Serialise the header to 540 bytes in native byte order.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(NII2_HEADER_SIZE as usize);
        self.write_to(&mut out, crate::util::native_endianness())?;
        Ok(out)
    }

    /// Ensure the magic is one of the two NIfTI-2 strings.
    pub fn validate_magic(&self) -> Result<()> {
        if &self.magic == MAGIC_CODE_NI2 || &self.magic == MAGIC_CODE_NIP2 {
            Ok(())
        } else {
            Err(NiftiError::InvalidMagic)
        }
    }
}

/// A version-tagged NIfTI header. All read and write paths branch on this
/// tag; version-agnostic consumers should go through [`crate::image::NiftiImage`]
/// instead of matching on it.
#[derive(Debug, Clone, PartialEq)]
pub enum NiftiHeader {
    /// A NIfTI-1 header.
    V1(Nifti1Header),
    /// A NIfTI-2 header.
    V2(Nifti2Header),
}

impl NiftiHeader {
    /// The version this header belongs to.
    pub fn version(&self) -> NiftiVersion {
        match self {
            NiftiHeader::V1(_) => NiftiVersion::Nifti1,
            NiftiHeader::V2(_) => NiftiVersion::Nifti2,
        }
    }

    /// The raw dimensionality field `dim[0]`.
    pub fn dim0(&self) -> i64 {
        match self {
            NiftiHeader::V1(h) => i64::from(h.dim[0]),
            NiftiHeader::V2(h) => h.dim[0],
        }
    }

    /// The raw datatype code.
    pub fn datatype(&self) -> i32 {
        match self {
            NiftiHeader::V1(h) => i32::from(h.datatype),
            NiftiHeader::V2(h) => i32::from(h.datatype),
        }
    }

    /// Bits per voxel.
    pub fn bitpix(&self) -> i16 {
        match self {
            NiftiHeader::V1(h) => h.bitpix,
            NiftiHeader::V2(h) => h.bitpix,
        }
    }

    /// Byte offset from the start of a single-file stream to the voxels.
    pub fn vox_offset(&self) -> i64 {
        match self {
            NiftiHeader::V1(h) => h.vox_offset as i64,
            NiftiHeader::V2(h) => h.vox_offset,
        }
    }

    /// Validate the magic against the version's allowed strings.
    pub fn validate_magic(&self) -> Result<()> {
        match self {
            NiftiHeader::V1(h) => h.validate_magic(),
            NiftiHeader::V2(h) => h.validate_magic(),
        }
    }

    /// A human-readable rendering of every header field.
    pub fn pretty(&self) -> String {
        match self {
            NiftiHeader::V1(h) => format!("{:#?}", h),
            NiftiHeader::V2(h) => format!("{:#?}", h),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{native_endianness, opposite_endianness};

    #[test]
    fn nifti1_layout_is_348_bytes() {
        let bytes = Nifti1Header::default().to_bytes().unwrap();
        assert_eq!(bytes.len(), NII1_HEADER_SIZE as usize);
    }

    #[test]
    fn nifti2_layout_is_540_bytes() {
        let bytes = Nifti2Header::default().to_bytes().unwrap();
        assert_eq!(bytes.len(), NII2_HEADER_SIZE as usize);
    }

    #[test]
    fn nifti1_round_trip() {
        let header = Nifti1Header {
            dim: [3, 64, 64, 10, 0, 0, 0, 0],
            datatype: NiftiType::Uint8 as i16,
            bitpix: 8,
            pixdim: [0., 3., 3., 3., 0., 0., 0., 0.],
            qform_code: 1,
            quatern_c: 1.,
            magic: *MAGIC_CODE_NIP1,
            ..Nifti1Header::default()
        };
        let bytes = header.to_bytes().unwrap();
        let back = Nifti1Header::from_reader(&bytes[..], native_endianness()).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn nifti1_round_trip_opposite_order() {
        let opposite = opposite_endianness(native_endianness());
        let header = Nifti1Header {
            dim: [3, 91, 109, 91, 1, 1, 1, 1],
            datatype: NiftiType::Int16 as i16,
            bitpix: 16,
            ..Nifti1Header::default()
        };
        let mut bytes = Vec::new();
        header.write_to(&mut bytes, opposite).unwrap();
        let back = Nifti1Header::from_reader(&bytes[..], opposite).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn nifti2_round_trip() {
        let header = Nifti2Header {
            dim: [4, 16, 16, 8, 2, 1, 1, 1],
            datatype: NiftiType::Float32 as i16,
            bitpix: 32,
            sform_code: 4,
            srow_x: [-2., 0., 0., 90.],
            srow_y: [0., 2., 0., -126.],
            srow_z: [0., 0., 2., -72.],
            ..Nifti2Header::default()
        };
        let bytes = header.to_bytes().unwrap();
        let back = Nifti2Header::from_reader(&bytes[..], native_endianness()).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn swapped_is_involutive() {
        let header = Nifti1Header {
            dim: [3, 240, 240, 155, 1, 1, 1, 1],
            datatype: NiftiType::Int16 as i16,
            bitpix: 16,
            vox_offset: 352.,
            scl_slope: 2.,
            ..Nifti1Header::default()
        };
        assert_eq!(header.swapped().swapped(), header);
        assert_eq!(header.swapped().dim[0], crate::util::swap_i16(3));
    }

    #[test]
    fn shaped_headers() {
        let h1 = Nifti1Header::shaped(Some([3, 240, 240, 155, 0, 0, 0, 0]), 4);
        assert_eq!(h1.dim[..4], [3, 240, 240, 155]);
        assert_eq!(h1.bitpix, 16);
        assert_eq!(h1.pixdim[..4], [0., 1., 1., 1.]);

        // bad rank falls back to 1x1x1, bad datatype falls back to FLOAT32
        let h1 = Nifti1Header::shaped(Some([9, 0, 0, 0, 0, 0, 0, 0]), 3);
        assert_eq!(h1.dim, [3, 1, 1, 1, 0, 0, 0, 0]);
        assert_eq!(i32::from(h1.datatype), NiftiType::Float32 as i32);
        assert_eq!(h1.bitpix, 32);

        let h2 = Nifti2Header::shaped(None, NiftiType::Uint8 as i32);
        assert_eq!(h2.dim[..4], [3, 1, 1, 1]);
        assert_eq!(h2.bitpix, 8);
        assert_eq!(h2.sizeof_hdr, NII2_HEADER_SIZE);
    }

    #[test]
    fn magic_validation() {
        let mut h = Nifti1Header::default();
        assert!(h.validate_magic().is_ok());
        h.magic = *b"bad\0";
        assert!(matches!(h.validate_magic(), Err(NiftiError::InvalidMagic)));

        let mut h2 = Nifti2Header::default();
        assert!(h2.validate_magic().is_ok());
        h2.magic = *MAGIC_CODE_NI2;
        assert!(h2.validate_magic().is_ok());
    }
}
