//! The write pipeline: convert image metadata into a header of the chosen
//! version, then emit `header ‖ padding ‖ volume` for single-file output or
//! separate header and image byte sequences for paired output, optionally
//! gzip-compressed, in native byte order.

use crate::error::{NiftiError, Result};
use crate::header::{Nifti1Header, Nifti2Header, DEFAULT_HEADER_PADDING, MAGIC_CODE_NI1,
    MAGIC_CODE_NI2, MAGIC_CODE_NIP1, MAGIC_CODE_NIP2, NII1_HEADER_SIZE, NII2_HEADER_SIZE};
use crate::image::NiftiImage;
use crate::typedef::NiftiVersion;
use derive_builder::Builder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, warn};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// File extension for single-file NIfTI output.
const NIFTI_EXT: &str = ".nii";
/// File extension appended to compressed output.
const NIFTI_COMPRESSED_EXT: &str = ".gz";

/// The byte sequences produced by one write.
#[derive(Debug, Clone, PartialEq)]
pub enum NiftiOutput {
    /// A single-file stream: header, padding and voxels.
    Single(Vec<u8>),
    /// A header/image pair.
    Pair {
        /// The header stream (348 or 540 bytes).
        header: Vec<u8>,
        /// The raw voxel stream.
        image: Vec<u8>,
    },
}

/// A NIfTI writer.
///
/// Built through [`NiftiWriterBuilder`]; `data` is the image to serialise,
/// everything else is optional:
///
/// ```no_run
/// use niivox::writer::NiftiWriterBuilder;
/// use niivox::typedef::NiftiVersion;
/// # use niivox::image::NiftiImage;
/// # fn run(image: NiftiImage) -> niivox::Result<()> {
/// let mut writer = NiftiWriterBuilder::default()
///     .path("out/volume")
///     .data(image)
///     .version(NiftiVersion::Nifti2)
///     .compression(true)
///     .build()
///     .expect("incomplete writer configuration");
/// writer.write()?;
/// # Ok(())
/// # }
/// ```
///
/// When a header of the selected version is supplied it is used as-is after
/// the pairing fix-ups (magic and `vox_offset`) and extent coercion;
/// otherwise one is derived from the image metadata.
#[derive(Debug, Clone, Builder)]
pub struct NiftiWriter {
    /// Output path; the `.nii` suffix is appended when missing.
    #[builder(default, setter(into))]
    path: PathBuf,
    /// Write a header/image (`.hdr`/`.img`) pair instead of a single file.
    #[builder(default)]
    write_header_file: bool,
    /// Gzip-compress the emitted file(s).
    #[builder(default)]
    compression: bool,
    /// Version to emit.
    #[builder(default)]
    version: NiftiVersion,
    /// The image to serialise.
    data: NiftiImage,
    /// Optional pre-built NIfTI-1 header.
    #[builder(default, setter(strip_option))]
    header1: Option<Nifti1Header>,
    /// Optional pre-built NIfTI-2 header.
    #[builder(default, setter(strip_option))]
    header2: Option<Nifti2Header>,
}

impl NiftiWriter {
    /// Build the output byte sequences without touching the filesystem.
    pub fn to_output(&self) -> Result<NiftiOutput> {
        match self.version {
            NiftiVersion::Nifti1 => {
                let header = self.resolve_nifti1_header()?;
                let header_bytes = header.to_bytes()?;
                if self.write_header_file {
                    Ok(NiftiOutput::Pair {
                        header: header_bytes,
                        image: self.data.volume.clone(),
                    })
                } else {
                    Ok(NiftiOutput::Single(self.assemble_single(
                        header_bytes,
                        header.vox_offset as i64,
                        i64::from(NII1_HEADER_SIZE),
                    )))
                }
            }
            NiftiVersion::Nifti2 => {
                let header = self.resolve_nifti2_header()?;
                let header_bytes = header.to_bytes()?;
                if self.write_header_file {
                    Ok(NiftiOutput::Pair {
                        header: header_bytes,
                        image: self.data.volume.clone(),
                    })
                } else {
                    Ok(NiftiOutput::Single(self.assemble_single(
                        header_bytes,
                        header.vox_offset,
                        i64::from(NII2_HEADER_SIZE),
                    )))
                }
            }
        }
    }

    /// Write the output to the configured path. Paired output goes to
    /// `<path>_nifti.hdr` and `<path>_nifti.img`; `.gz` is appended when
    /// compressing.
    pub fn write(&mut self) -> Result<()> {
        let output = self.to_output()?;

        let mut path = self.path.to_string_lossy().into_owned();
        if !path.ends_with(NIFTI_EXT) {
            path.push_str(NIFTI_EXT);
        }

        match output {
            NiftiOutput::Single(dataset) => {
                if self.compression && !path.ends_with(NIFTI_COMPRESSED_EXT) {
                    path.push_str(NIFTI_COMPRESSED_EXT);
                }
                debug!("writing single-file NIfTI image to {}", path);
                write_payload(&path, self.compression, &dataset)
            }
            NiftiOutput::Pair { header, image } => {
                let mut header_path = path.replace(NIFTI_EXT, "_nifti.hdr");
                let mut image_path = path.replace(NIFTI_EXT, "_nifti.img");
                if self.compression {
                    header_path.push_str(NIFTI_COMPRESSED_EXT);
                    image_path.push_str(NIFTI_COMPRESSED_EXT);
                }
                debug!("writing NIfTI pair to {} and {}", header_path, image_path);
                write_payload(&header_path, self.compression, &header)?;
                write_payload(&image_path, self.compression, &image)
            }
        }
    }

    /// `header ‖ padding ‖ volume`, padding to `vox_offset` when it leaves
    /// room past the header and to the default four zero bytes otherwise.
    fn assemble_single(&self, header_bytes: Vec<u8>, vox_offset: i64, sizeof_hdr: i64) -> Vec<u8> {
        let gap = vox_offset - sizeof_hdr;
        let padding = if gap > 0 {
            gap as usize
        } else {
            DEFAULT_HEADER_PADDING as usize
        };

        let mut dataset = header_bytes;
        dataset.extend(std::iter::repeat(0u8).take(padding));
        dataset.extend_from_slice(&self.data.volume);
        dataset
    }

    fn resolve_nifti1_header(&self) -> Result<Nifti1Header> {
        let mut header = match &self.header1 {
            Some(h) => {
                let mut h = h.clone();
                if self.write_header_file {
                    h.magic = *MAGIC_CODE_NI1;
                    h.vox_offset = 0.0;
                } else {
                    h.magic = *MAGIC_CODE_NIP1;
                    if h.vox_offset as i32 - NII1_HEADER_SIZE <= 0 {
                        h.vox_offset = (NII1_HEADER_SIZE + DEFAULT_HEADER_PADDING) as f32;
                    }
                }
                h
            }
            None => self.data.to_nifti1_header(self.write_header_file),
        };
        for (i, d) in header.dim.iter_mut().enumerate().skip(1) {
            if *d <= 0 {
                warn!("coercing non-positive dim[{}] to 1 on write", i);
                *d = 1;
            }
        }
        if header.bitpix <= 0 {
            return Err(NiftiError::InvalidHeader("bitpix must be positive"));
        }
        Ok(header)
    }

    fn resolve_nifti2_header(&self) -> Result<Nifti2Header> {
        let mut header = match &self.header2 {
            Some(h) => {
                let mut h = h.clone();
                if self.write_header_file {
                    h.magic = *MAGIC_CODE_NI2;
                    h.vox_offset = 0;
                } else {
                    h.magic = *MAGIC_CODE_NIP2;
                    if h.vox_offset - i64::from(NII2_HEADER_SIZE) <= 0 {
                        h.vox_offset = i64::from(NII2_HEADER_SIZE + DEFAULT_HEADER_PADDING);
                    }
                }
                h
            }
            None => self.data.to_nifti2_header(self.write_header_file),
        };
        for (i, d) in header.dim.iter_mut().enumerate().skip(1) {
            if *d <= 0 {
                warn!("coercing non-positive dim[{}] to 1 on write", i);
                *d = 1;
            }
        }
        if header.bitpix <= 0 {
            return Err(NiftiError::InvalidHeader("bitpix must be positive"));
        }
        Ok(header)
    }
}

fn write_payload(path: &str, compression: bool, payload: &[u8]) -> Result<()> {
    let file = File::create(path)?;
    if compression {
        let mut encoder = GzEncoder::new(file, Compression::fast());
        encoder.write_all(payload)?;
        encoder.finish()?;
    } else {
        let mut file = file;
        file.write_all(payload)?;
    }
    Ok(())
}
