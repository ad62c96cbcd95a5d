//! The read pipeline: version probing by header size, endianness
//! resolution, header decoding and volume loading, from in-memory byte
//! buffers. Gzip-compressed input is inflated transparently based on its
//! leading bytes, never on a file extension.

use crate::error::{NiftiError, Result};
use crate::header::{Nifti1Header, Nifti2Header, NiftiHeader, NII1_HEADER_SIZE, NII2_HEADER_SIZE};
use crate::image::NiftiImage;
use crate::typedef::NiftiVersion;
use crate::util::{deflate_if_gzip, opposite_endianness};
use byteordered::{ByteOrdered, Endianness};
use log::debug;
use std::fs;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

/// A NIfTI reader over one byte buffer (single-file input) or two (paired
/// header/image input).
///
/// ```no_run
/// use niivox::reader::NiftiReader;
/// # use niivox::Result;
/// # fn run() -> Result<()> {
/// let mut reader = NiftiReader::from_file("volume.nii.gz")?.retain_header(true);
/// reader.parse()?;
/// let image = reader.image();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct NiftiReader {
    reader: Cursor<Vec<u8>>,
    h_reader: Option<Cursor<Vec<u8>>>,
    byte_order: Endianness,
    retain_header: bool,
    in_memory: bool,
    data: NiftiImage,
    header: Option<NiftiHeader>,
    version: Option<NiftiVersion>,
}

impl NiftiReader {
    /// Create a reader over a single-file byte buffer. The buffer is
    /// inflated first when it carries the gzip magic.
    pub fn from_bytes(image: Vec<u8>) -> Result<NiftiReader> {
        let image = deflate_if_gzip(image)?;
        Ok(NiftiReader {
            reader: Cursor::new(image),
            h_reader: None,
            byte_order: Endianness::Little,
            retain_header: false,
            in_memory: true,
            data: NiftiImage::default(),
            header: None,
            version: None,
        })
    }

    /// Create a reader over a paired header/image buffer pair. Either buffer
    /// may be gzip-compressed.
    pub fn from_paired_bytes(header: Vec<u8>, image: Vec<u8>) -> Result<NiftiReader> {
        let mut reader = NiftiReader::from_bytes(image)?;
        reader.h_reader = Some(Cursor::new(deflate_if_gzip(header)?));
        Ok(reader)
    }

    /// Create a reader over the contents of a single file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<NiftiReader> {
        NiftiReader::from_bytes(fs::read(path)?)
    }

    /// Create a reader over the contents of a header/image file pair.
    pub fn from_paired_files<P: AsRef<Path>, Q: AsRef<Path>>(
        header: P,
        image: Q,
    ) -> Result<NiftiReader> {
        NiftiReader::from_paired_bytes(fs::read(header)?, fs::read(image)?)
    }

    /// Whether to keep the decoded header record after parsing.
    pub fn retain_header(mut self, retain: bool) -> NiftiReader {
        self.retain_header = retain;
        self
    }

    /// Whether to keep the whole input in memory while parsing. The current
    /// implementation always does; the option is kept for forward
    /// compatibility with a streaming reader.
    pub fn in_memory(mut self, in_memory: bool) -> NiftiReader {
        self.in_memory = in_memory;
        self
    }

    /// The resolved byte order of the input.
    pub fn byte_order(&self) -> Endianness {
        self.byte_order
    }

    /// The resolved version, available after [`NiftiReader::parse`].
    pub fn version(&self) -> Option<NiftiVersion> {
        self.version
    }

    /// The decoded image, populated by [`NiftiReader::parse`].
    pub fn image(&self) -> &NiftiImage {
        &self.data
    }

    /// Consume the reader, yielding the decoded image.
    pub fn into_image(self) -> NiftiImage {
        self.data
    }

    /// The decoded header, kept only when `retain_header` was enabled.
    /// `pretty` logs a human-readable rendering.
    pub fn header(&self, pretty: bool) -> Option<&NiftiHeader> {
        if let (true, Some(h)) = (pretty, self.header.as_ref()) {
            debug!("{}", h.pretty());
        }
        self.header.as_ref()
    }

    /// Decode the header and load the volume bytes.
    pub fn parse(&mut self) -> Result<()> {
        let version = self.probe_version()?;
        self.version = Some(version);
        self.parse_nifti(version)
    }

    /// Discriminate the version from `sizeof_hdr`, trying little endian
    /// first and big endian second.
    fn probe_version(&mut self) -> Result<NiftiVersion> {
        let h_reader = self.h_reader.as_mut().unwrap_or(&mut self.reader);
        h_reader.seek(SeekFrom::Start(0))?;

        let size = ByteOrdered::runtime(&mut *h_reader, self.byte_order).read_i32()?;
        let version = match size {
            NII1_HEADER_SIZE => Some(NiftiVersion::Nifti1),
            NII2_HEADER_SIZE => Some(NiftiVersion::Nifti2),
            _ => None,
        };
        if let Some(version) = version {
            return Ok(version);
        }

        self.byte_order = Endianness::Big;
        h_reader.seek(SeekFrom::Start(0))?;
        let size = ByteOrdered::runtime(&mut *h_reader, self.byte_order).read_i32()?;
        match size {
            NII1_HEADER_SIZE => Ok(NiftiVersion::Nifti1),
            NII2_HEADER_SIZE => Ok(NiftiVersion::Nifti2),
            _ => Err(NiftiError::InvalidFormat),
        }
    }

    fn decode_header(&mut self, version: NiftiVersion) -> Result<NiftiHeader> {
        let h_reader = self.h_reader.as_mut().unwrap_or(&mut self.reader);
        h_reader.seek(SeekFrom::Start(0))?;
        match version {
            NiftiVersion::Nifti1 => Ok(NiftiHeader::V1(Nifti1Header::from_reader(
                &mut *h_reader,
                self.byte_order,
            )?)),
            NiftiVersion::Nifti2 => Ok(NiftiHeader::V2(Nifti2Header::from_reader(
                &mut *h_reader,
                self.byte_order,
            )?)),
        }
    }

    fn parse_nifti(&mut self, version: NiftiVersion) -> Result<()> {
        let mut header = self.decode_header(version)?;
        header.validate_magic()?;

        // a dim[0] outside [1, 7] means the probe guessed the wrong byte
        // order; flip once and decode again
        if !(1..=7).contains(&header.dim0()) {
            self.byte_order = opposite_endianness(self.byte_order);
            header = self.decode_header(version)?;
            if !(1..=7).contains(&header.dim0()) {
                return Err(NiftiError::InvalidHeader("dim[0] out of range"));
            }
        }
        debug!(
            "NIfTI-{} header, {:?} byte order",
            version.number(),
            self.byte_order
        );

        self.data = NiftiImage::from_header(&header, self.byte_order)?;

        let stat_dim = if self.data.dim[5] > 1 {
            self.data.dim[5]
        } else {
            1
        };
        let data_size = self.data.dim[1]
            * self.data.dim[2]
            * self.data.dim[3]
            * self.data.dim[4]
            * stat_dim
            * (i64::from(header.bitpix()) / 8);

        let vox_offset = header.vox_offset();
        self.reader.seek(SeekFrom::Start(vox_offset.max(0) as u64))?;
        let mut buf = vec![0u8; data_size.max(0) as usize];
        let got = read_filling(&mut self.reader, &mut buf)?;
        if got < buf.len() {
            return Err(NiftiError::ShortRead(buf.len(), got));
        }
        debug!("loaded {} volume bytes at offset {}", buf.len(), vox_offset);
        self.data.volume = buf;

        if self.retain_header {
            self.header = Some(header);
        }
        Ok(())
    }
}

/// Read into the whole buffer, reporting how many bytes could be filled.
fn read_filling<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = src.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
