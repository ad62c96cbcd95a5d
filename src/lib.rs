//! Rust implementation of the [NIfTI-1 and NIfTI-2](https://nifti.nimh.nih.gov)
//! medical imaging file formats: a binary header codec with endianness
//! auto-detection, a double-precision voxel engine over the raw volume, and
//! run-length / coordinate-list segmentation tooling.
//!
//! The read path goes from a byte buffer through version probing, header
//! decoding and derived-field computation (dimensions, affine, units) to the
//! voxel accessors; the write path assembles a header of either version,
//! padding and the raw volume back into a byte stream or file. Gzip is
//! handled transparently at both boundaries.
//!
//! # Example
//!
//! ```no_run
//! use niivox::reader::NiftiReader;
//! # use niivox::Result;
//!
//! # fn run() -> Result<()> {
//! let mut reader = NiftiReader::from_file("brain.nii.gz")?;
//! reader.parse()?;
//! let image = reader.image();
//! println!("shape: {:?}", image.img_shape());
//! println!("datatype: {}", image.data_type()?);
//! let voxels = image.get_voxels()?;
//! println!("non-zero voxels: {:?}", voxels.count_nonzero());
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

pub mod affine;
pub mod error;
pub mod header;
pub mod image;
pub mod reader;
pub mod seg;
pub mod typedef;
pub mod util;
pub mod volume;
pub mod writer;

pub use crate::error::{NiftiError, Result};
pub use crate::header::{
    Nifti1Header, Nifti2Header, NiftiHeader, MAGIC_CODE_NI1, MAGIC_CODE_NI2, MAGIC_CODE_NIP1,
    MAGIC_CODE_NIP2, NII1_HEADER_SIZE, NII2_HEADER_SIZE,
};
pub use crate::image::NiftiImage;
pub use crate::reader::NiftiReader;
pub use crate::typedef::{NiftiType, NiftiVersion, Orientation, SliceOrder, Unit, XForm};
pub use crate::volume::VoxelGrid;
pub use crate::writer::{NiftiOutput, NiftiWriter, NiftiWriterBuilder};
pub use byteordered::Endianness;
