//! The dense voxel grid: a logically 4-D, `(x, y, z, t)`-indexed array of
//! double-precision values materialised from a raw volume, with in-place
//! axis flips and simple statistics.

pub mod element;

use crate::typedef::assign_datatype_size;
use std::collections::HashMap;

/// A dense `(x, y, z, t)`-indexed grid of `f64` voxel values.
///
/// The index mapping is row-major in `x`, then `y`, then `z`, then `t`:
/// `idx(x, y, z, t) = ((t * dim_z + z) * dim_y + y) * dim_x + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    data: Vec<f64>,
    dim_x: usize,
    dim_y: usize,
    dim_z: usize,
    dim_t: usize,
    datatype: i32,
}

/// A count of voxel values partitioned over equal-width buckets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Histogram {
    /// Size of the smallest bucket.
    pub min: usize,
    /// Size of the biggest bucket.
    pub max: usize,
    /// Total number of samples.
    pub count: usize,
    /// The buckets, in increasing value order.
    pub buckets: Vec<Bucket>,
}

/// One histogram partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    /// Number of values in this bucket.
    pub count: usize,
    /// Low, inclusive bound.
    pub min: f64,
    /// High bound; exclusive except for the last bucket.
    pub max: f64,
}

impl VoxelGrid {
    /// Allocate a zero-filled grid of the given shape and datatype code.
    pub fn new(dim_x: usize, dim_y: usize, dim_z: usize, dim_t: usize, datatype: i32) -> VoxelGrid {
        VoxelGrid {
            data: vec![0.0; dim_x * dim_y * dim_z * dim_t],
            dim_x,
            dim_y,
            dim_z,
            dim_t,
            datatype,
        }
    }

    fn index(&self, x: usize, y: usize, z: usize, t: usize) -> usize {
        ((t * self.dim_z + z) * self.dim_y + y) * self.dim_x + x
    }

    /// Grid width along x.
    pub fn dim_x(&self) -> usize {
        self.dim_x
    }

    /// Grid width along y.
    pub fn dim_y(&self) -> usize {
        self.dim_y
    }

    /// Grid width along z.
    pub fn dim_z(&self) -> usize {
        self.dim_z
    }

    /// Grid width along t.
    pub fn dim_t(&self) -> usize {
        self.dim_t
    }

    /// The datatype code the grid was materialised from.
    pub fn datatype(&self) -> i32 {
        self.datatype
    }

    /// Number of voxels in the grid.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the grid holds no voxels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The full dataset in index order.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Fetch the value at `(x, y, z, t)`.
    ///
    /// # Panics
    /// Panics if the coordinates exceed the grid shape.
    pub fn get(&self, x: usize, y: usize, z: usize, t: usize) -> f64 {
        self.data[self.index(x, y, z, t)]
    }

    /// Store a value at `(x, y, z, t)`.
    ///
    /// # Panics
    /// Panics if the coordinates exceed the grid shape.
    pub fn set(&mut self, x: usize, y: usize, z: usize, t: usize, value: f64) {
        let idx = self.index(x, y, z, t);
        self.data[idx] = value;
    }

    /// Collect the `(z, t)` plane as a flat array of length
    /// `dim_x * dim_y`, `x` varying fastest.
    pub fn slice_at(&self, z: usize, t: usize) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.dim_x * self.dim_y);
        for y in 0..self.dim_y {
            for x in 0..self.dim_x {
                out.push(self.get(x, y, z, t));
            }
        }
        out
    }

    /// Collect the whole spatial volume at time `t` as a flat array of
    /// length `dim_x * dim_y * dim_z`, `x` varying fastest.
    pub fn volume_at(&self, t: usize) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.dim_x * self.dim_y * self.dim_z);
        for z in 0..self.dim_z {
            for y in 0..self.dim_y {
                for x in 0..self.dim_x {
                    out.push(self.get(x, y, z, t));
                }
            }
        }
        out
    }

    /// Count the positive, negative and zero voxels, in that order.
    pub fn count_nonzero(&self) -> (usize, usize, usize) {
        let mut pos = 0;
        let mut neg = 0;
        let mut zero = 0;
        for &v in &self.data {
            if v > 0.0 {
                pos += 1;
            } else if v < 0.0 {
                neg += 1;
            } else {
                zero += 1;
            }
        }
        (pos, neg, zero)
    }

    /// Reverse the grid along the x axis, in place.
    pub fn flip_x(&mut self) {
        for t in 0..self.dim_t {
            for z in 0..self.dim_z {
                for y in 0..self.dim_y {
                    for x in 0..self.dim_x / 2 {
                        let a = self.index(x, y, z, t);
                        let b = self.index(self.dim_x - 1 - x, y, z, t);
                        self.data.swap(a, b);
                    }
                }
            }
        }
    }

    /// Reverse the grid along the y axis, in place.
    pub fn flip_y(&mut self) {
        for t in 0..self.dim_t {
            for z in 0..self.dim_z {
                for y in 0..self.dim_y / 2 {
                    for x in 0..self.dim_x {
                        let a = self.index(x, y, z, t);
                        let b = self.index(x, self.dim_y - 1 - y, z, t);
                        self.data.swap(a, b);
                    }
                }
            }
        }
    }

    /// Reverse the grid along the z axis, in place.
    pub fn flip_z(&mut self) {
        for t in 0..self.dim_t {
            for z in 0..self.dim_z / 2 {
                for y in 0..self.dim_y {
                    for x in 0..self.dim_x {
                        let a = self.index(x, y, z, t);
                        let b = self.index(x, y, self.dim_z - 1 - z, t);
                        self.data.swap(a, b);
                    }
                }
            }
        }
    }

    /// Flip to the sagittal view: y and z reversed.
    pub fn flip_sagittal(&mut self) {
        self.flip_z();
        self.flip_y();
    }

    /// Flip to the coronal view: x and y reversed.
    pub fn flip_coronal(&mut self) {
        self.flip_x();
        self.flip_y();
    }

    /// Flip to the axial view: x and z reversed.
    pub fn flip_axial(&mut self) {
        self.flip_z();
        self.flip_x();
    }

    /// Partition the voxel values linearly over `bins` buckets between the
    /// minimum and maximum of the data. When every value is the same, a
    /// single bucket holds all samples.
    pub fn histogram(&self, bins: usize) -> Histogram {
        hist(bins, &self.data)
    }

    /// The number of raw bytes needed to encode this grid with its datatype.
    pub fn raw_byte_size(&self) -> usize {
        let (nbyper, _) = assign_datatype_size(self.datatype);
        self.data.len() * nbyper as usize
    }

    /// Count the occurrences of each distinct value, sorted by value.
    pub fn value_occurrence(&self) -> Vec<(f64, usize)> {
        let mut counts: HashMap<u64, usize> = HashMap::new();
        for &v in &self.data {
            *counts.entry(v.to_bits()).or_insert(0) += 1;
        }
        let mut out: Vec<(f64, usize)> = counts
            .into_iter()
            .map(|(bits, n)| (f64::from_bits(bits), n))
            .collect();
        out.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        out
    }
}

/// Linear histogram over `bins` buckets. Empty input or zero bins yield an
/// empty histogram.
pub fn hist(bins: usize, input: &[f64]) -> Histogram {
    if input.is_empty() || bins == 0 {
        return Histogram::default();
    }

    let mut min = input[0];
    let mut max = input[0];
    for &v in input {
        min = min.min(v);
        max = max.max(v);
    }

    if min == max {
        return Histogram {
            min: input.len(),
            max: input.len(),
            count: input.len(),
            buckets: vec![Bucket {
                count: input.len(),
                min,
                max,
            }],
        };
    }

    let scale = (max - min) / bins as f64;
    let mut buckets: Vec<Bucket> = (0..bins)
        .map(|i| Bucket {
            count: 0,
            min: i as f64 * scale + min,
            max: (i + 1) as f64 * scale + min,
        })
        .collect();

    for &v in input {
        let bi = (((v - min) / scale) as usize).min(bins - 1);
        buckets[bi].count += 1;
    }

    let min_c = buckets.iter().map(|b| b.count).min().unwrap_or(0);
    let max_c = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    Histogram {
        min: min_c,
        max: max_c,
        count: input.len(),
        buckets,
    }
}
