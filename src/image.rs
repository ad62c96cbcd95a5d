//! The version-agnostic, in-memory image record: dimension and geometry
//! metadata, the raw volume bytes, the bidirectional mapping to the V1/V2
//! header records, and the voxel-level accessors.

use crate::affine::{
    affine_inverse, diagonal_affine, matrix_to_orientation, quaternion_to_affine, Affine4,
};
use crate::error::{NiftiError, Result};
use crate::header::{
    Nifti1Header, Nifti2Header, NiftiHeader, DEFAULT_HEADER_PADDING, MAGIC_CODE_NI1,
    MAGIC_CODE_NI2, MAGIC_CODE_NIP1, MAGIC_CODE_NIP2, NII1_HEADER_SIZE, NII2_HEADER_SIZE,
};
use crate::typedef::{
    assign_datatype_size, slice_order_from_code, xform_from_code, NiftiType, NiftiVersion,
    Orientation, SliceOrder, Unit, XForm,
};
use crate::util::native_endianness;
use crate::volume::{element, VoxelGrid};
use byteordered::Endianness;
use log::warn;
use num_traits::FromPrimitive;

/// A decoded NIfTI image: every header-derived field in its widest form,
/// the reconstructed transforms, and the raw volume bytes.
///
/// Fields are public for direct inspection; the accessor methods add
/// validation and string rendering on top of them.
#[derive(Debug, Clone)]
pub struct NiftiImage {
    /// Number of dimensions (1..=7).
    pub ndim: i64,
    /// Grid extent along x.
    pub nx: i64,
    /// Grid extent along y.
    pub ny: i64,
    /// Grid extent along z.
    pub nz: i64,
    /// Grid extent along t.
    pub nt: i64,
    /// Grid extent along the fifth axis.
    pub nu: i64,
    /// Grid extent along the sixth axis.
    pub nv: i64,
    /// Grid extent along the seventh axis.
    pub nw: i64,
    /// `dim[0] = ndim`, `dim[1] = nx`, and so on.
    pub dim: [i64; 8],
    /// Number of voxels, the product of the extents over `1..=ndim`.
    pub nvox: i64,
    /// Bytes per voxel, matching the datatype.
    pub nbyper: i32,
    /// Raw datatype code.
    pub datatype: i32,
    /// Grid spacing along x.
    pub dx: f64,
    /// Grid spacing along y.
    pub dy: f64,
    /// Grid spacing along z.
    pub dz: f64,
    /// Grid spacing along t.
    pub dt: f64,
    /// Grid spacing along the fifth axis.
    pub du: f64,
    /// Grid spacing along the sixth axis.
    pub dv: f64,
    /// Grid spacing along the seventh axis.
    pub dw: f64,
    /// `pixdim[1] = dx`, and so on; `pixdim[0]` carries the raw qfac sign.
    pub pixdim: [f64; 8],
    /// Scaling slope.
    pub scl_slope: f64,
    /// Scaling intercept.
    pub scl_inter: f64,
    /// Calibration minimum.
    pub cal_min: f64,
    /// Calibration maximum.
    pub cal_max: f64,
    /// qform code.
    pub qform_code: i32,
    /// sform code.
    pub sform_code: i32,
    /// Frequency-encoding dimension index (0 when unset).
    pub freq_dim: i32,
    /// Phase-encoding dimension index (0 when unset).
    pub phase_dim: i32,
    /// Slice dimension index (0 when unset).
    pub slice_dim: i32,
    /// Slice timing code.
    pub slice_code: i32,
    /// First slice index.
    pub slice_start: i64,
    /// Last slice index.
    pub slice_end: i64,
    /// Time between individual slices.
    pub slice_duration: f64,
    /// Quaternion b parameter.
    pub quatern_b: f64,
    /// Quaternion c parameter.
    pub quatern_c: f64,
    /// Quaternion d parameter.
    pub quatern_d: f64,
    /// Quaternion x shift.
    pub qoffset_x: f64,
    /// Quaternion y shift.
    pub qoffset_y: f64,
    /// Quaternion z shift.
    pub qoffset_z: f64,
    /// Handedness sign of the qform, `-1` or `+1`.
    pub qfac: f64,
    /// qform: voxel indices to patient coordinates.
    pub qto_xyz: Affine4,
    /// qform: patient coordinates to voxel indices.
    pub qto_ijk: Affine4,
    /// sform: voxel indices to patient coordinates.
    pub sto_xyz: Affine4,
    /// sform: patient coordinates to voxel indices.
    pub sto_ijk: Affine4,
    /// Time coordinate offset.
    pub toffset: f64,
    /// Spatial units code (low three bits of `xyzt_units`).
    pub xyz_units: i32,
    /// Temporal units code (bits 3..=5 of `xyzt_units`).
    pub time_units: i32,
    /// Intent code.
    pub intent_code: i32,
    /// First intent parameter.
    pub intent_p1: f64,
    /// Second intent parameter.
    pub intent_p2: f64,
    /// Third intent parameter.
    pub intent_p3: f64,
    /// Intent name, NUL-padded.
    pub intent_name: [u8; 16],
    /// Free-text description, NUL-padded.
    pub descrip: [u8; 80],
    /// Auxiliary file name, NUL-padded.
    pub aux_file: [u8; 24],
    /// Unit of byte swapping of the volume (0 when none is needed).
    pub swap_size: i32,
    /// Byte order of the volume bytes.
    pub byte_order: Endianness,
    /// The raw voxel bytes, `nbyper * nvox` long.
    pub volume: Vec<u8>,
    /// Orientation of the i, j and k voxel axes.
    pub ijk_orient: [Orientation; 3],
    /// The affine assembled from the header's s-rows.
    pub affine: Affine4,
    /// Offset of the voxel bytes in a single-file stream.
    pub vox_offset: f64,
    /// Version of the header this image came from.
    pub version: NiftiVersion,
}

impl Default for NiftiImage {
    fn default() -> NiftiImage {
        NiftiImage {
            ndim: 0,
            nx: 0,
            ny: 0,
            nz: 0,
            nt: 0,
            nu: 0,
            nv: 0,
            nw: 0,
            dim: [0; 8],
            nvox: 0,
            nbyper: 0,
            datatype: 0,
            dx: 0.,
            dy: 0.,
            dz: 0.,
            dt: 0.,
            du: 0.,
            dv: 0.,
            dw: 0.,
            pixdim: [0.; 8],
            scl_slope: 0.,
            scl_inter: 0.,
            cal_min: 0.,
            cal_max: 0.,
            qform_code: 0,
            sform_code: 0,
            freq_dim: 0,
            phase_dim: 0,
            slice_dim: 0,
            slice_code: 0,
            slice_start: 0,
            slice_end: 0,
            slice_duration: 0.,
            quatern_b: 0.,
            quatern_c: 0.,
            quatern_d: 0.,
            qoffset_x: 0.,
            qoffset_y: 0.,
            qoffset_z: 0.,
            qfac: 0.,
            qto_xyz: Affine4::zeros(),
            qto_ijk: Affine4::zeros(),
            sto_xyz: Affine4::zeros(),
            sto_ijk: Affine4::zeros(),
            toffset: 0.,
            xyz_units: 0,
            time_units: 0,
            intent_code: 0,
            intent_p1: 0.,
            intent_p2: 0.,
            intent_p3: 0.,
            intent_name: [0; 16],
            descrip: [0; 80],
            aux_file: [0; 24],
            swap_size: 0,
            byte_order: native_endianness(),
            volume: Vec::new(),
            ijk_orient: [Orientation::Unknown; 3],
            affine: Affine4::zeros(),
            vox_offset: 0.,
            version: NiftiVersion::Nifti1,
        }
    }
}

fn dim_info_to_freq_dim(dim_info: u8) -> i32 {
    i32::from(dim_info & 0x03)
}

fn dim_info_to_phase_dim(dim_info: u8) -> i32 {
    i32::from((dim_info >> 2) & 0x03)
}

fn dim_info_to_slice_dim(dim_info: u8) -> i32 {
    i32::from((dim_info >> 4) & 0x03)
}

/// Pack spatial and temporal unit codes back into an `xyzt_units` byte.
pub fn space_time_to_xyzt(xyz_unit: i32, time_unit: i32) -> u8 {
    ((xyz_unit & 0x07) | (time_unit & 0x38)) as u8
}

/// Pack frequency, phase and slice dimension indices back into a `dim_info`
/// byte.
pub fn fps_to_dim_info(freq_dim: i32, phase_dim: i32, slice_dim: i32) -> u8 {
    ((freq_dim & 0x03) | ((phase_dim & 0x03) << 2) | ((slice_dim & 0x03) << 4)) as u8
}

fn text_field<const N: usize>(bytes: &[u8; N]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\u{0}')
        .replace('\u{0}', "")
}

impl NiftiImage {
    /// Build an empty image of the given extents and datatype, with unit
    /// spacings, a zero-filled volume in native byte order and no transform
    /// information.
    pub fn with_dims(dim: &[i64], datatype: i32) -> Result<NiftiImage> {
        if dim.is_empty() || dim.len() > 7 {
            return Err(NiftiError::InvalidHeader("dimensionality out of range"));
        }
        let (nbyper, swap_size) = assign_datatype_size(datatype);
        if nbyper == 0 {
            return Err(NiftiError::UnsupportedDataType(datatype));
        }

        let mut img = NiftiImage {
            ndim: dim.len() as i64,
            nbyper: i32::from(nbyper),
            swap_size: i32::from(swap_size),
            datatype,
            ..NiftiImage::default()
        };
        img.dim[0] = img.ndim;
        img.pixdim[0] = 0.0;
        let mut nvox: i64 = 1;
        for (i, &d) in dim.iter().enumerate() {
            if d < 1 {
                return Err(NiftiError::InvalidHeader("non-positive dimension extent"));
            }
            img.dim[i + 1] = d;
            img.pixdim[i + 1] = 1.0;
            nvox *= d;
        }
        for i in dim.len() + 1..8 {
            img.dim[i] = 1;
            img.pixdim[i] = 1.0;
        }
        img.nvox = nvox;
        img.nx = img.dim[1];
        img.ny = img.dim[2];
        img.nz = img.dim[3];
        img.nt = img.dim[4];
        img.nu = img.dim[5];
        img.nv = img.dim[6];
        img.nw = img.dim[7];
        img.dx = img.pixdim[1];
        img.dy = img.pixdim[2];
        img.dz = img.pixdim[3];
        img.dt = img.pixdim[4];
        img.du = img.pixdim[5];
        img.dv = img.pixdim[6];
        img.dw = img.pixdim[7];
        img.volume = vec![0u8; (nvox * i64::from(nbyper)) as usize];
        Ok(img)
    }

    /// Populate an image record from a decoded header, reconstructing the
    /// derived fields: voxel count, qform/sform matrices and their inverses,
    /// the affine and the axis orientations. The volume is left empty.
    pub fn from_header(header: &NiftiHeader, byte_order: Endianness) -> Result<NiftiImage> {
        let mut img = match header {
            NiftiHeader::V1(h) => Self::from_nifti1(h),
            NiftiHeader::V2(h) => Self::from_nifti2(h),
        };
        img.byte_order = byte_order;
        img.version = header.version();

        if header.bitpix() == 0 {
            return Err(NiftiError::InvalidHeader("bitpix is zero"));
        }

        // Fix bad extents in the header
        for i in 3..8 {
            if img.dim[i] <= 0 {
                warn!("coercing non-positive dim[{}] to 1", i);
                img.dim[i] = 1;
            }
        }
        img.nz = img.dim[3];
        img.nt = img.dim[4];
        img.nu = img.dim[5];
        img.nv = img.dim[6];
        img.nw = img.dim[7];

        img.nvox = 1;
        for i in 1..=img.ndim.clamp(0, 7) {
            img.nvox *= img.dim[i as usize];
        }

        if img.qform_code <= 0 {
            img.qto_xyz = diagonal_affine(img.dx, img.dy, img.dz);
            img.qform_code = XForm::Unknown as i32;
        } else {
            img.qfac = if img.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
            img.qto_xyz = quaternion_to_affine(
                img.quatern_b,
                img.quatern_c,
                img.quatern_d,
                img.qoffset_x,
                img.qoffset_y,
                img.qoffset_z,
                img.dx,
                img.dy,
                img.dz,
                img.qfac,
            );
        }
        img.qto_ijk = affine_inverse(&img.qto_xyz);

        if img.sform_code <= 0 {
            img.sform_code = XForm::Unknown as i32;
        } else {
            img.sto_xyz = img.affine;
            img.sto_ijk = affine_inverse(&img.sto_xyz);
        }

        img.ijk_orient = matrix_to_orientation(&img.affine);

        Ok(img)
    }

    fn from_nifti1(h: &Nifti1Header) -> NiftiImage {
        let mut img = NiftiImage::default();

        img.freq_dim = dim_info_to_freq_dim(h.dim_info);
        img.phase_dim = dim_info_to_phase_dim(h.dim_info);
        img.slice_dim = dim_info_to_slice_dim(h.dim_info);

        img.vox_offset = f64::from(h.vox_offset);
        img.datatype = i32::from(h.datatype);

        img.xyz_units = i32::from(h.xyzt_units & 0x07);
        img.time_units = i32::from(h.xyzt_units & 0x38);

        img.slice_code = i32::from(h.slice_code);
        img.slice_start = i64::from(h.slice_start);
        img.slice_end = i64::from(h.slice_end);
        img.slice_duration = f64::from(h.slice_duration);

        img.cal_min = f64::from(h.cal_min);
        img.cal_max = f64::from(h.cal_max);

        img.qform_code = i32::from(h.qform_code);
        img.sform_code = i32::from(h.sform_code);

        img.scl_slope = f64::from(h.scl_slope);
        img.scl_inter = f64::from(h.scl_inter);

        img.intent_name = h.intent_name;
        img.intent_code = i32::from(h.intent_code);
        img.intent_p1 = f64::from(h.intent_p1);
        img.intent_p2 = f64::from(h.intent_p2);
        img.intent_p3 = f64::from(h.intent_p3);

        img.quatern_b = f64::from(h.quatern_b);
        img.quatern_c = f64::from(h.quatern_c);
        img.quatern_d = f64::from(h.quatern_d);
        img.qoffset_x = f64::from(h.qoffset_x);
        img.qoffset_y = f64::from(h.qoffset_y);
        img.qoffset_z = f64::from(h.qoffset_z);

        img.descrip = h.descrip;
        img.aux_file = h.aux_file;
        img.toffset = f64::from(h.toffset);

        for i in 0..8 {
            img.dim[i] = i64::from(h.dim[i]);
            img.pixdim[i] = f64::from(h.pixdim[i]);
        }
        img.ndim = img.dim[0];
        img.nx = img.dim[1];
        img.ny = img.dim[2];
        img.nz = img.dim[3];
        img.nt = img.dim[4];
        img.nu = img.dim[5];
        img.nv = img.dim[6];
        img.nw = img.dim[7];
        img.dx = img.pixdim[1];
        img.dy = img.pixdim[2];
        img.dz = img.pixdim[3];
        img.dt = img.pixdim[4];
        img.du = img.pixdim[5];
        img.dv = img.pixdim[6];
        img.dw = img.pixdim[7];

        let (nbyper, swap_size) = assign_datatype_size(img.datatype);
        img.nbyper = i32::from(nbyper);
        img.swap_size = i32::from(swap_size);

        #[rustfmt::skip]
        let affine = Affine4::new(
            f64::from(h.srow_x[0]), f64::from(h.srow_x[1]), f64::from(h.srow_x[2]), f64::from(h.srow_x[3]),
            f64::from(h.srow_y[0]), f64::from(h.srow_y[1]), f64::from(h.srow_y[2]), f64::from(h.srow_y[3]),
            f64::from(h.srow_z[0]), f64::from(h.srow_z[1]), f64::from(h.srow_z[2]), f64::from(h.srow_z[3]),
            0.0, 0.0, 0.0, 1.0,
        );
        img.affine = affine;

        img
    }

    fn from_nifti2(h: &Nifti2Header) -> NiftiImage {
        let mut img = NiftiImage::default();

        img.freq_dim = dim_info_to_freq_dim(h.dim_info);
        img.phase_dim = dim_info_to_phase_dim(h.dim_info);
        img.slice_dim = dim_info_to_slice_dim(h.dim_info);

        img.vox_offset = h.vox_offset as f64;
        img.datatype = i32::from(h.datatype);

        img.xyz_units = h.xyzt_units & 0x07;
        img.time_units = h.xyzt_units & 0x38;

        img.slice_code = h.slice_code;
        img.slice_start = h.slice_start;
        img.slice_end = h.slice_end;
        img.slice_duration = h.slice_duration;

        img.cal_min = h.cal_min;
        img.cal_max = h.cal_max;

        img.qform_code = h.qform_code;
        img.sform_code = h.sform_code;

        img.scl_slope = h.scl_slope;
        img.scl_inter = h.scl_inter;

        img.intent_name = h.intent_name;
        img.intent_code = h.intent_code;
        img.intent_p1 = h.intent_p1;
        img.intent_p2 = h.intent_p2;
        img.intent_p3 = h.intent_p3;

        img.quatern_b = h.quatern_b;
        img.quatern_c = h.quatern_c;
        img.quatern_d = h.quatern_d;
        img.qoffset_x = h.qoffset_x;
        img.qoffset_y = h.qoffset_y;
        img.qoffset_z = h.qoffset_z;

        img.descrip = h.descrip;
        img.aux_file = h.aux_file;
        img.toffset = h.toffset;

        img.dim = h.dim;
        img.pixdim = h.pixdim;
        img.ndim = img.dim[0];
        img.nx = img.dim[1];
        img.ny = img.dim[2];
        img.nz = img.dim[3];
        img.nt = img.dim[4];
        img.nu = img.dim[5];
        img.nv = img.dim[6];
        img.nw = img.dim[7];
        img.dx = img.pixdim[1];
        img.dy = img.pixdim[2];
        img.dz = img.pixdim[3];
        img.dt = img.pixdim[4];
        img.du = img.pixdim[5];
        img.dv = img.pixdim[6];
        img.dw = img.pixdim[7];

        let (nbyper, swap_size) = assign_datatype_size(img.datatype);
        img.nbyper = i32::from(nbyper);
        img.swap_size = i32::from(swap_size);

        #[rustfmt::skip]
        let affine = Affine4::new(
            h.srow_x[0], h.srow_x[1], h.srow_x[2], h.srow_x[3],
            h.srow_y[0], h.srow_y[1], h.srow_y[2], h.srow_y[3],
            h.srow_z[0], h.srow_z[1], h.srow_z[2], h.srow_z[3],
            0.0, 0.0, 0.0, 1.0,
        );
        img.affine = affine;

        img
    }

    /// Convert the image metadata into a NIfTI-1 header. `paired` selects
    /// the header/image pair layout: the `ni1` magic and a zero
    /// `vox_offset`. Single-file output uses the `n+1` magic and coerces a
    /// non-positive `vox_offset` past the header.
    pub fn to_nifti1_header(&self, paired: bool) -> Nifti1Header {
        let mut header = Nifti1Header {
            regular: b'r',
            vox_offset: self.vox_offset as f32,
            ..Nifti1Header::default()
        };

        header.dim[0] = self.ndim as i16;
        header.dim[1] = self.nx as i16;
        header.dim[2] = self.ny as i16;
        header.dim[3] = self.nz as i16;
        header.dim[4] = self.nt as i16;
        header.dim[5] = self.nu as i16;
        header.dim[6] = self.nv as i16;
        header.dim[7] = self.nw as i16;

        header.pixdim[0] = 0.0;
        header.pixdim[1] = self.dx.abs() as f32;
        header.pixdim[2] = self.dy.abs() as f32;
        header.pixdim[3] = self.dz.abs() as f32;
        header.pixdim[4] = self.dt.abs() as f32;
        header.pixdim[5] = self.du.abs() as f32;
        header.pixdim[6] = self.dv.abs() as f32;
        header.pixdim[7] = self.dw as f32;

        header.datatype = self.datatype as i16;
        header.bitpix = (8 * self.nbyper) as i16;

        if self.cal_max > self.cal_min {
            header.cal_min = self.cal_min as f32;
            header.cal_max = self.cal_max as f32;
        }

        if self.scl_slope != 0.0 {
            header.scl_slope = self.scl_slope as f32;
            header.scl_inter = self.scl_inter as f32;
        }

        if self.descrip[0] != 0x0 {
            header.descrip[..79].copy_from_slice(&self.descrip[..79]);
            header.descrip[79] = 0x0;
        }

        if self.aux_file[0] != 0x0 {
            header.aux_file[..23].copy_from_slice(&self.aux_file[..23]);
            header.aux_file[23] = 0x0;
        }

        header.intent_code = self.intent_code as i16;
        header.intent_p1 = self.intent_p1 as f32;
        header.intent_p2 = self.intent_p2 as f32;
        header.intent_p3 = self.intent_p3 as f32;
        if self.intent_name[0] != 0x0 {
            header.intent_name[..15].copy_from_slice(&self.intent_name[..15]);
            header.intent_name[15] = 0x0;
        }

        header.xyzt_units = space_time_to_xyzt(self.xyz_units, self.time_units);
        header.toffset = self.toffset as f32;

        if self.qform_code > 0 {
            header.qform_code = self.qform_code as i16;
            header.quatern_b = self.quatern_b as f32;
            header.quatern_c = self.quatern_c as f32;
            header.quatern_d = self.quatern_d as f32;
            header.qoffset_x = self.qoffset_x as f32;
            header.qoffset_y = self.qoffset_y as f32;
            header.qoffset_z = self.qoffset_z as f32;
            header.pixdim[0] = if self.qfac >= 0.0 { 1.0 } else { -1.0 };
        }

        if self.sform_code > 0 {
            header.sform_code = self.sform_code as i16;
            for i in 0..4 {
                header.srow_x[i] = self.sto_xyz[(0, i)] as f32;
                header.srow_y[i] = self.sto_xyz[(1, i)] as f32;
                header.srow_z[i] = self.sto_xyz[(2, i)] as f32;
            }
        }

        header.dim_info = fps_to_dim_info(self.freq_dim, self.phase_dim, self.slice_dim);

        header.slice_code = self.slice_code as u8;
        header.slice_start = self.slice_start as i16;
        header.slice_end = self.slice_end as i16;
        header.slice_duration = self.slice_duration as f32;

        if paired {
            header.magic = *MAGIC_CODE_NI1;
            header.vox_offset = 0.0;
        } else {
            header.magic = *MAGIC_CODE_NIP1;
            if header.vox_offset as i32 - NII1_HEADER_SIZE <= 0 {
                header.vox_offset = (NII1_HEADER_SIZE + DEFAULT_HEADER_PADDING) as f32;
            }
        }

        header
    }

    /// Convert the image metadata into a NIfTI-2 header, with the same
    /// pairing rules as [`NiftiImage::to_nifti1_header`].
    pub fn to_nifti2_header(&self, paired: bool) -> Nifti2Header {
        let mut header = Nifti2Header {
            vox_offset: self.vox_offset as i64,
            ..Nifti2Header::default()
        };

        header.dim[0] = self.ndim;
        header.dim[1] = self.nx;
        header.dim[2] = self.ny;
        header.dim[3] = self.nz;
        header.dim[4] = self.nt;
        header.dim[5] = self.nu;
        header.dim[6] = self.nv;
        header.dim[7] = self.nw;

        header.pixdim[0] = 0.0;
        header.pixdim[1] = self.dx.abs();
        header.pixdim[2] = self.dy.abs();
        header.pixdim[3] = self.dz.abs();
        header.pixdim[4] = self.dt.abs();
        header.pixdim[5] = self.du.abs();
        header.pixdim[6] = self.dv.abs();
        header.pixdim[7] = self.dw;

        header.datatype = self.datatype as i16;
        header.bitpix = (8 * self.nbyper) as i16;

        if self.cal_max > self.cal_min {
            header.cal_min = self.cal_min;
            header.cal_max = self.cal_max;
        }

        if self.scl_slope != 0.0 {
            header.scl_slope = self.scl_slope;
            header.scl_inter = self.scl_inter;
        }

        if self.descrip[0] != 0x0 {
            header.descrip[..79].copy_from_slice(&self.descrip[..79]);
            header.descrip[79] = 0x0;
        }

        if self.aux_file[0] != 0x0 {
            header.aux_file[..23].copy_from_slice(&self.aux_file[..23]);
            header.aux_file[23] = 0x0;
        }

        header.intent_code = self.intent_code;
        header.intent_p1 = self.intent_p1;
        header.intent_p2 = self.intent_p2;
        header.intent_p3 = self.intent_p3;
        if self.intent_name[0] != 0x0 {
            header.intent_name[..15].copy_from_slice(&self.intent_name[..15]);
            header.intent_name[15] = 0x0;
        }

        header.xyzt_units = i32::from(space_time_to_xyzt(self.xyz_units, self.time_units));
        header.toffset = self.toffset;

        if self.qform_code > 0 {
            header.qform_code = self.qform_code;
            header.quatern_b = self.quatern_b;
            header.quatern_c = self.quatern_c;
            header.quatern_d = self.quatern_d;
            header.qoffset_x = self.qoffset_x;
            header.qoffset_y = self.qoffset_y;
            header.qoffset_z = self.qoffset_z;
            header.pixdim[0] = if self.qfac >= 0.0 { 1.0 } else { -1.0 };
        }

        if self.sform_code > 0 {
            header.sform_code = self.sform_code;
            for i in 0..4 {
                header.srow_x[i] = self.sto_xyz[(0, i)];
                header.srow_y[i] = self.sto_xyz[(1, i)];
                header.srow_z[i] = self.sto_xyz[(2, i)];
            }
        }

        header.dim_info = fps_to_dim_info(self.freq_dim, self.phase_dim, self.slice_dim);

        header.slice_code = self.slice_code;
        header.slice_start = self.slice_start;
        header.slice_end = self.slice_end;
        header.slice_duration = self.slice_duration;

        if paired {
            header.magic = *MAGIC_CODE_NI2;
            header.vox_offset = 0;
        } else {
            header.magic = *MAGIC_CODE_NIP2;
            if header.vox_offset - i64::from(NII2_HEADER_SIZE) <= 0 {
                header.vox_offset = i64::from(NII2_HEADER_SIZE + DEFAULT_HEADER_PADDING);
            }
        }

        header
    }

    fn byte_range(&self, x: i64, y: i64, z: i64, t: i64) -> Result<(usize, usize)> {
        let index = t * self.nx * self.ny * self.nz + z * self.nx * self.ny + y * self.nx + x;
        let nbyper = i64::from(self.nbyper);
        let start = index * nbyper;
        let end = (index + 1) * nbyper;
        if index < 0 || end > self.volume.len() as i64 {
            return Err(NiftiError::OutOfRange(
                start.max(0) as usize,
                self.volume.len(),
            ));
        }
        Ok((start as usize, end as usize))
    }

    /// Decode the voxel value at `(x, y, z, t)`, applying the slope and
    /// intercept rescaling.
    pub fn get_at(&self, x: i64, y: i64, z: i64, t: i64) -> Result<f64> {
        let (start, end) = self.byte_range(x, y, z, t)?;
        Ok(element::decode_voxel(
            &self.volume[start..end],
            self.datatype,
            self.byte_order,
            self.scl_slope,
            self.scl_inter,
        ))
    }

    /// Encode a value into the raw volume at `(x, y, z, t)`.
    pub fn set_at(&mut self, value: f64, x: i64, y: i64, z: i64, t: i64) -> Result<()> {
        let (start, end) = self.byte_range(x, y, z, t)?;
        let bytes = element::encode_voxel(
            value,
            self.datatype,
            self.byte_order,
            self.nbyper,
            self.scl_slope,
            self.scl_inter,
        )?;
        self.volume[start..end].copy_from_slice(&bytes);
        Ok(())
    }

    /// Materialise the full `(nx, ny, nz, nt)` voxel grid from the raw
    /// volume.
    pub fn get_voxels(&self) -> Result<VoxelGrid> {
        let mut grid = VoxelGrid::new(
            self.nx.max(0) as usize,
            self.ny.max(0) as usize,
            self.nz.max(0) as usize,
            self.nt.max(0) as usize,
            self.datatype,
        );
        for t in 0..self.nt {
            for z in 0..self.nz {
                for y in 0..self.ny {
                    for x in 0..self.nx {
                        let v = self.get_at(x, y, z, t)?;
                        grid.set(x as usize, y as usize, z as usize, t as usize, v);
                    }
                }
            }
        }
        Ok(grid)
    }

    /// Re-encode a voxel grid into a fresh raw volume, replacing the current
    /// one. The grid is consumed read-only.
    pub fn set_voxel_to_raw_volume(&mut self, grid: &VoxelGrid) -> Result<()> {
        let nbyper = self.nbyper as usize;
        let mut result = vec![0u8; grid.raw_byte_size()];
        for (index, &voxel) in grid.data().iter().enumerate() {
            let bytes = element::encode_voxel(
                voxel,
                self.datatype,
                self.byte_order,
                self.nbyper,
                self.scl_slope,
                self.scl_inter,
            )?;
            result[index * nbyper..(index + 1) * nbyper].copy_from_slice(&bytes);
        }
        self.volume = result;
        Ok(())
    }

    /// Decode the `(z, t)` plane as a flat array of length `nx * ny`,
    /// `x` varying fastest.
    pub fn slice_at(&self, z: i64, t: i64) -> Result<Vec<f64>> {
        if z < 0 || z >= self.nz {
            return Err(NiftiError::OutOfRange(z.max(0) as usize, self.nz as usize));
        }
        if t < 0 || t >= self.nt {
            return Err(NiftiError::OutOfRange(t.max(0) as usize, self.nt as usize));
        }
        let mut out = Vec::with_capacity((self.nx * self.ny) as usize);
        for y in 0..self.ny {
            for x in 0..self.nx {
                out.push(self.get_at(x, y, z, t)?);
            }
        }
        Ok(out)
    }

    /// Decode the whole spatial volume at time `t` as a flat array of length
    /// `nx * ny * nz`, `x` varying fastest.
    pub fn volume_at(&self, t: i64) -> Result<Vec<f64>> {
        if t < 0 || t >= self.nt {
            return Err(NiftiError::OutOfRange(t.max(0) as usize, self.nt as usize));
        }
        let mut out = Vec::with_capacity((self.nx * self.ny * self.nz) as usize);
        for z in 0..self.nz {
            for y in 0..self.ny {
                for x in 0..self.nx {
                    out.push(self.get_at(x, y, z, t)?);
                }
            }
        }
        Ok(out)
    }

    /// Decode the time series of the point `(x, y, z)` over `dim[4]`.
    pub fn time_series(&self, x: i64, y: i64, z: i64) -> Result<Vec<f64>> {
        if x < 0 || x >= self.nx {
            return Err(NiftiError::OutOfRange(x.max(0) as usize, self.nx as usize));
        }
        if y < 0 || y >= self.ny {
            return Err(NiftiError::OutOfRange(y.max(0) as usize, self.ny as usize));
        }
        if z < 0 || z >= self.nz {
            return Err(NiftiError::OutOfRange(z.max(0) as usize, self.nz as usize));
        }
        let mut out = Vec::with_capacity(self.dim[4].max(0) as usize);
        for t in 0..self.dim[4] {
            out.push(self.get_at(x, y, z, t)?);
        }
        Ok(out)
    }

    /// The datatype as a validated enum.
    pub fn data_type(&self) -> Result<NiftiType> {
        NiftiType::from_i32(self.datatype)
            .ok_or(NiftiError::InvalidCode("datatype", self.datatype))
    }

    /// The qform coordinate mapping method as a validated enum.
    pub fn qform(&self) -> Result<XForm> {
        xform_from_code(self.qform_code)
    }

    /// The sform coordinate mapping method as a validated enum.
    pub fn sform(&self) -> Result<XForm> {
        xform_from_code(self.sform_code)
    }

    /// The slice order as a validated enum.
    pub fn slice_order(&self) -> Result<SliceOrder> {
        slice_order_from_code(self.slice_code)
    }

    /// The spatial and temporal units of measurement as validated enums.
    pub fn units(&self) -> Result<(Unit, Unit)> {
        let space = Unit::from_i32(self.xyz_units)
            .ok_or(NiftiError::InvalidCode("spatial unit", self.xyz_units))?;
        let time = Unit::from_i32(self.time_units)
            .ok_or(NiftiError::InvalidCode("temporal unit", self.time_units))?;
        Ok((space, time))
    }

    /// Orientation of the i, j and k voxel axes.
    pub fn orientation(&self) -> [Orientation; 3] {
        self.ijk_orient
    }

    /// The 4×4 affine assembled from the header's s-rows.
    pub fn affine(&self) -> Affine4 {
        self.affine
    }

    /// The image shape as `(x, y, z, t)` extents.
    pub fn img_shape(&self) -> [i64; 4] {
        [self.dim[1], self.dim[2], self.dim[3], self.dim[4]]
    }

    /// The voxel size along the x, y, z and t axes.
    pub fn voxel_size(&self) -> [f64; 4] {
        [self.pixdim[1], self.pixdim[2], self.pixdim[3], self.pixdim[4]]
    }

    /// The description with trailing NUL bytes removed.
    pub fn description(&self) -> String {
        text_field(&self.descrip)
    }

    /// The intent name with trailing NUL bytes removed.
    pub fn intent_name_str(&self) -> String {
        text_field(&self.intent_name)
    }

    /// The auxiliary file name with trailing NUL bytes removed.
    pub fn aux_file_str(&self) -> String {
        text_field(&self.aux_file)
    }

    /// The raw volume bytes.
    pub fn raw_data(&self) -> &[u8] {
        &self.volume
    }

    /// Set the slice code, validated against the slice order table.
    pub fn set_slice_code(&mut self, slice_code: i32) -> Result<()> {
        slice_order_from_code(slice_code)?;
        self.slice_code = slice_code;
        Ok(())
    }

    /// Set the qform code, validated against the orientation table.
    pub fn set_qform_code(&mut self, qform_code: i32) -> Result<()> {
        xform_from_code(qform_code)?;
        self.qform_code = qform_code;
        Ok(())
    }

    /// Set the sform code, validated against the orientation table.
    pub fn set_sform_code(&mut self, sform_code: i32) -> Result<()> {
        xform_from_code(sform_code)?;
        self.sform_code = sform_code;
        Ok(())
    }

    /// Set the datatype, validated against the datatype catalogue. The
    /// per-voxel width and swap size are updated to match.
    pub fn set_datatype(&mut self, datatype: i32) -> Result<()> {
        if !crate::typedef::is_valid_datatype(datatype) {
            return Err(NiftiError::InvalidCode("datatype", datatype));
        }
        self.datatype = datatype;
        let (nbyper, swap_size) = assign_datatype_size(datatype);
        self.nbyper = i32::from(nbyper);
        self.swap_size = i32::from(swap_size);
        Ok(())
    }

    /// Replace the affine and refresh the derived axis orientations.
    pub fn set_affine(&mut self, affine: Affine4) {
        self.affine = affine;
        self.ijk_orient = matrix_to_orientation(&affine);
    }

    /// Set the description. At most 79 bytes fit the field; the rest is
    /// NUL padding.
    pub fn set_description(&mut self, descrip: &str) -> Result<()> {
        let bytes = descrip.as_bytes();
        if bytes.len() > 79 {
            return Err(NiftiError::IncorrectLength("description", bytes.len()));
        }
        self.descrip = [0; 80];
        self.descrip[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Set the intent name. At most 15 bytes fit the field.
    pub fn set_intent_name(&mut self, intent_name: &str) -> Result<()> {
        let bytes = intent_name.as_bytes();
        if bytes.len() > 15 {
            return Err(NiftiError::IncorrectLength("intent name", bytes.len()));
        }
        self.intent_name = [0; 16];
        self.intent_name[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Set the auxiliary file name. At most 23 bytes fit the field.
    pub fn set_aux_file(&mut self, aux_file: &str) -> Result<()> {
        let bytes = aux_file.as_bytes();
        if bytes.len() > 23 {
            return Err(NiftiError::IncorrectLength("auxiliary file", bytes.len()));
        }
        self.aux_file = [0; 24];
        self.aux_file[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Set the slice duration.
    pub fn set_slice_duration(&mut self, slice_duration: f64) {
        self.slice_duration = slice_duration;
    }

    /// Set the first slice index.
    pub fn set_slice_start(&mut self, slice_start: i64) {
        self.slice_start = slice_start;
    }

    /// Set the last slice index.
    pub fn set_slice_end(&mut self, slice_end: i64) {
        self.slice_end = slice_end;
    }

    /// Set the spatial units code.
    pub fn set_xyz_units(&mut self, xyz_units: i32) {
        self.xyz_units = xyz_units;
    }

    /// Set the temporal units code.
    pub fn set_time_units(&mut self, time_units: i32) {
        self.time_units = time_units;
    }

    /// Replace the raw volume. The buffer length must match the product of
    /// the positive extents and the per-voxel width.
    pub fn set_volume(&mut self, volume: Vec<u8>) -> Result<()> {
        if self.nx == 0 {
            return Err(NiftiError::InvalidHeader("x dimension must not be zero"));
        }
        if self.ny == 0 {
            return Err(NiftiError::InvalidHeader("y dimension must not be zero"));
        }
        let mut expected = self.nx * self.ny;
        for n in [self.nz, self.nt, self.nu, self.nv, self.nw] {
            if n > 0 {
                expected *= n;
            }
        }
        let (nbyper, _) = assign_datatype_size(self.datatype);
        expected *= i64::from(nbyper);
        if volume.len() as i64 != expected {
            return Err(NiftiError::DimensionMismatch(expected, volume.len() as i64));
        }
        self.volume = volume;
        Ok(())
    }
}
