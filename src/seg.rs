//! Segmentation-mask tooling: a run-length codec over slice planes, and
//! conversion between sparse `(x, y, z, t, value)` coordinate lists (the
//! JSON annotation exchange format) and full NIfTI volumes.

use crate::error::{NiftiError, Result};
use crate::header::{Nifti1Header, Nifti2Header};
use crate::image::NiftiImage;
use crate::typedef::NiftiVersion;
use crate::util::native_endianness;
use crate::volume::{element, VoxelGrid};
use crate::writer::{NiftiOutput, NiftiWriterBuilder};
use derive_builder::Builder;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

/// A segmentation label as found in annotation JSON; either an integer or a
/// floating point number. Distinct bit patterns count as distinct labels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordValue {
    /// An integral label.
    Int(i64),
    /// A floating point label.
    Float(f64),
}

impl CoordValue {
    fn key(&self) -> (u8, u64) {
        match self {
            CoordValue::Int(i) => (0, *i as u64),
            CoordValue::Float(f) => (1, f.to_bits()),
        }
    }

    /// The label as an integer, truncating a float label.
    pub fn as_i64(&self) -> i64 {
        match self {
            CoordValue::Int(i) => *i,
            CoordValue::Float(f) => *f as i64,
        }
    }
}

impl PartialEq for CoordValue {
    fn eq(&self, other: &CoordValue) -> bool {
        self.key() == other.key()
    }
}

impl Eq for CoordValue {}

impl Hash for CoordValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// One labelled voxel of a sparse segmentation mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentCoord {
    /// Voxel index along x.
    pub x: i64,
    /// Voxel index along y.
    pub y: i64,
    /// Voxel index along z.
    pub z: i64,
    /// Voxel index along t.
    pub t: i64,
    /// The segmentation label.
    pub value: CoordValue,
}

/// A run-length encoded segmentation of one `(z, t)` slice for one label.
///
/// `encoded_seg` alternates background and foreground run lengths, always
/// starting with a background run (possibly of length zero).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentRle {
    /// Alternating run lengths.
    pub encoded_seg: Vec<f64>,
    /// The expanded slice, background zero and foreground `pix_val`.
    pub decoded_seg: Vec<f64>,
    /// The slice's z index in the segment's own convention; exports flip it
    /// to `dim_z - 1 - z_index`.
    pub z_index: f64,
    /// The slice's t index.
    pub t_index: f64,
    /// The foreground label value.
    pub pix_val: f64,
}

impl SegmentRle {
    /// Expand `encoded_seg` into `decoded_seg`.
    pub fn decode(&mut self) {
        self.decoded_seg = rle_decode(&self.encoded_seg, self.pix_val);
    }

    /// Compress `decoded_seg` into `encoded_seg`.
    pub fn encode(&mut self) -> Result<()> {
        self.encoded_seg = rle_encode(&self.decoded_seg)?;
        Ok(())
    }
}

/// Run-length encode a sequence into run lengths of equal consecutive
/// values. A sequence that does not start with zero gets a leading
/// zero-length background run. Empty input is an error.
pub fn rle_encode(original: &[f64]) -> Result<Vec<f64>> {
    if original.is_empty() {
        return Err(NiftiError::EmptyInput);
    }
    let mut encoded = Vec::new();
    if original[0] != 0.0 {
        encoded.push(0.0);
    }
    let mut i = 0;
    while i < original.len() {
        let mut count = 1.0;
        while i < original.len() - 1 && original[i] == original[i + 1] {
            count += 1.0;
            i += 1;
        }
        encoded.push(count);
        i += 1;
    }
    Ok(encoded)
}

/// Expand run lengths back into a sequence: even-indexed runs fill with
/// zero, odd-indexed runs with `pix_val`.
pub fn rle_decode(encoded: &[f64], pix_val: f64) -> Vec<f64> {
    let mut out = Vec::new();
    for (idx, &run) in encoded.iter().enumerate() {
        let fill = if idx % 2 == 0 { 0.0 } else { pix_val };
        for _ in 0..run as usize {
            out.push(fill);
        }
    }
    out
}

/// Run-length encode every `(z, t)` slice of the grid, once per distinct
/// non-zero label present in it. Slices without the label are skipped.
pub fn import_as_rle(grid: &VoxelGrid) -> Result<Vec<SegmentRle>> {
    let labels: Vec<f64> = grid
        .value_occurrence()
        .into_iter()
        .map(|(v, _)| v)
        .filter(|&v| v != 0.0)
        .collect();

    let mut segments = Vec::new();
    for t in 0..grid.dim_t() {
        for z in 0..grid.dim_z() {
            let slice = grid.slice_at(z, t);
            for &label in &labels {
                if !slice.contains(&label) {
                    continue;
                }
                let masked: Vec<f64> = slice
                    .iter()
                    .map(|&p| if p == label { label } else { 0.0 })
                    .collect();
                let encoded = rle_encode(&masked)?;
                segments.push(SegmentRle {
                    encoded_seg: encoded,
                    decoded_seg: masked,
                    z_index: z as f64,
                    t_index: t as f64,
                    pix_val: label,
                });
            }
        }
    }
    Ok(segments)
}

/// Write every segment's foreground voxels into the grid. The segment
/// convention stores slices axially flipped, so a segment for `z_index`
/// lands on plane `dim_z - 1 - z_index`.
pub fn export_single_from_rle(grid: &mut VoxelGrid, segments: &[SegmentRle]) -> Result<()> {
    let (dim_x, dim_y, dim_z, dim_t) = (grid.dim_x(), grid.dim_y(), grid.dim_z(), grid.dim_t());
    for segment in segments {
        let decoded = if segment.decoded_seg.is_empty() {
            rle_decode(&segment.encoded_seg, segment.pix_val)
        } else {
            segment.decoded_seg.clone()
        };
        let zi = segment.z_index as i64;
        let ti = segment.t_index as i64;
        if zi < 0 || zi >= dim_z as i64 {
            return Err(NiftiError::OutOfRange(zi.max(0) as usize, dim_z));
        }
        if ti < 0 || ti >= dim_t as i64 {
            return Err(NiftiError::OutOfRange(ti.max(0) as usize, dim_t));
        }
        if decoded.len() < dim_x * dim_y {
            return Err(NiftiError::DimensionMismatch(
                (dim_x * dim_y) as i64,
                decoded.len() as i64,
            ));
        }
        let z = dim_z - 1 - zi as usize;
        for y in 0..dim_y {
            for x in 0..dim_x {
                if decoded[y * dim_x + x] != 0.0 {
                    grid.set(x, y, z, ti as usize, segment.pix_val);
                }
            }
        }
    }
    Ok(())
}

/// Conversion between NIfTI volumes and sparse coordinate annotations.
///
/// One of the two headers must be provided for [`Segmentation::coords_to_nii`];
/// when both are set, the NIfTI-2 header takes precedence.
#[derive(Debug, Clone, Default, Builder)]
pub struct Segmentation {
    /// NIfTI-1 header describing the output geometry.
    #[builder(default, setter(strip_option))]
    nii1_header: Option<Nifti1Header>,
    /// NIfTI-2 header describing the output geometry.
    #[builder(default, setter(strip_option))]
    nii2_header: Option<Nifti2Header>,
    /// Gzip-compress files written to `out_file`.
    #[builder(default = "true")]
    compression: bool,
    /// Optional path to persist the converted output.
    #[builder(default, setter(strip_option))]
    out_file: Option<PathBuf>,
    /// Use the corrected label mapper: every distinct value receives the
    /// next unused positive label and every occurrence is written. The
    /// default keeps the historical behaviour, where a label is only
    /// written from its second occurrence on and every value maps to 1.
    #[builder(default)]
    corrected_labels: bool,
}

impl Segmentation {
    /// Convert every non-zero voxel of the image into a coordinate list,
    /// iterating `(x, y, z, t)` in nested order. When `out_file` is set,
    /// the list is also written there as indented JSON.
    pub fn nii_to_coords(&self, img: &NiftiImage) -> Result<Vec<SegmentCoord>> {
        let voxels = img.get_voxels()?;
        let mut res = Vec::new();
        for x in 0..img.nx {
            for y in 0..img.ny {
                for z in 0..img.nz {
                    for t in 0..img.nt {
                        let val =
                            voxels.get(x as usize, y as usize, z as usize, t as usize);
                        if val != 0.0 {
                            res.push(SegmentCoord {
                                x,
                                y,
                                z,
                                t,
                                value: CoordValue::Int(val as i64),
                            });
                        }
                    }
                }
            }
        }

        if let Some(out_file) = &self.out_file {
            let dataset = serde_json::to_vec_pretty(&res)?;
            fs::write(out_file, dataset)?;
        }
        Ok(res)
    }

    /// Convert a coordinate list into a single-file NIfTI byte stream using
    /// the configured header's geometry, datatype and scaling. When
    /// `out_file` is set, the stream is also written there (gzip-compressed
    /// when `compression` is on).
    pub fn coords_to_nii(&self, coords: &[SegmentCoord]) -> Result<Vec<u8>> {
        match (&self.nii1_header, &self.nii2_header) {
            (_, Some(h)) => {
                let h = h.clone();
                self.convert_with(
                    coords,
                    NiftiVersion::Nifti2,
                    [h.dim[1], h.dim[2], h.dim[3], h.dim[4]],
                    i32::from(h.datatype),
                    i32::from(h.bitpix),
                    h.scl_slope,
                    h.scl_inter,
                    None,
                    Some(h),
                )
            }
            (Some(h), None) => {
                let h = h.clone();
                self.convert_with(
                    coords,
                    NiftiVersion::Nifti1,
                    [
                        i64::from(h.dim[1]),
                        i64::from(h.dim[2]),
                        i64::from(h.dim[3]),
                        i64::from(h.dim[4]),
                    ],
                    i32::from(h.datatype),
                    i32::from(h.bitpix),
                    f64::from(h.scl_slope),
                    f64::from(h.scl_inter),
                    Some(h),
                    None,
                )
            }
            (None, None) => Err(NiftiError::InvalidHeader(
                "a header structure must be provided",
            )),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn convert_with(
        &self,
        coords: &[SegmentCoord],
        version: NiftiVersion,
        dim: [i64; 4],
        datatype: i32,
        bitpix: i32,
        scl_slope: f64,
        scl_inter: f64,
        header1: Option<Nifti1Header>,
        header2: Option<Nifti2Header>,
    ) -> Result<Vec<u8>> {
        if bitpix <= 0 {
            return Err(NiftiError::InvalidHeader("bitpix must be positive"));
        }
        let dim: Vec<usize> = dim.iter().map(|&d| d.max(1) as usize).collect();
        let (nx, ny, nz, nt) = (dim[0], dim[1], dim[2], dim[3]);

        let mut grid = VoxelGrid::new(nx, ny, nz, nt, datatype);
        let mut mapper: HashMap<CoordValue, f64> = HashMap::new();

        // Coordinates sharing a value share one pixel label.
        if self.corrected_labels {
            let mut byte_code = 1.0;
            for coord in coords {
                let label = *mapper.entry(coord.value).or_insert_with(|| {
                    let assigned = byte_code;
                    byte_code += 1.0;
                    assigned
                });
                self.checked_set(&mut grid, coord, label)?;
            }
        } else {
            // Historical mapper: a label is only written from its second
            // occurrence on, and every distinct value maps to 1.
            for coord in coords {
                match mapper.get(&coord.value) {
                    Some(&label) => self.checked_set(&mut grid, coord, label)?,
                    None => {
                        mapper.insert(coord.value, 1.0);
                    }
                }
            }
        }
        debug!("{} distinct labels over {} coordinates", mapper.len(), coords.len());

        let (nbyper, _) = crate::typedef::assign_datatype_size(datatype);
        let nbyper = i32::from(nbyper);
        let mut raw_img = vec![0u8; grid.raw_byte_size()];
        for (index, &voxel) in grid.data().iter().enumerate() {
            let bytes = element::encode_voxel(
                voxel,
                datatype,
                native_endianness(),
                nbyper,
                scl_slope,
                scl_inter,
            )?;
            let start = index * nbyper as usize;
            raw_img[start..start + nbyper as usize].copy_from_slice(&bytes);
        }

        let image = NiftiImage {
            volume: raw_img,
            ..NiftiImage::default()
        };
        let mut builder = NiftiWriterBuilder::default();
        builder
            .path(self.out_file.clone().unwrap_or_default())
            .data(image)
            .version(version)
            .compression(self.compression);
        if let Some(h) = header1 {
            builder.header1(h);
        }
        if let Some(h) = header2 {
            builder.header2(h);
        }
        let mut writer = builder.build().expect("all writer fields are provided");

        let output = writer.to_output()?;
        if self.out_file.is_some() {
            writer.write()?;
        }
        match output {
            NiftiOutput::Single(bytes) => Ok(bytes),
            NiftiOutput::Pair { .. } => unreachable!("segmentation output is single-file"),
        }
    }

    fn checked_set(&self, grid: &mut VoxelGrid, coord: &SegmentCoord, label: f64) -> Result<()> {
        let inside = (0..grid.dim_x() as i64).contains(&coord.x)
            && (0..grid.dim_y() as i64).contains(&coord.y)
            && (0..grid.dim_z() as i64).contains(&coord.z)
            && (0..grid.dim_t() as i64).contains(&coord.t);
        if !inside {
            return Err(NiftiError::OutOfRange(
                coord.x.max(0) as usize,
                grid.len(),
            ));
        }
        grid.set(
            coord.x as usize,
            coord.y as usize,
            coord.z as usize,
            coord.t as usize,
            label,
        );
        Ok(())
    }
}
