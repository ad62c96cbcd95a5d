use pretty_assertions::assert_eq;

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

use niivox::util::{native_endianness, opposite_endianness};
use niivox::volume::element::encode_voxel;
use niivox::{
    Endianness, Nifti1Header, Nifti2Header, NiftiError, NiftiReader, NiftiType, NiftiVersion,
    XForm,
};

/// Assemble a single-file NIfTI-1 stream in the requested byte order.
fn single_file_v1(header: &Nifti1Header, volume: &[u8], endianness: Endianness) -> Vec<u8> {
    let mut bytes = Vec::new();
    header.write_to(&mut bytes, endianness).unwrap();
    let pad = (header.vox_offset as usize).saturating_sub(bytes.len());
    bytes.extend(std::iter::repeat(0u8).take(pad));
    bytes.extend_from_slice(volume);
    bytes
}

fn int16_header() -> Nifti1Header {
    Nifti1Header {
        dim: [3, 4, 4, 3, 0, 0, 0, 0],
        datatype: NiftiType::Int16 as i16,
        bitpix: 16,
        pixdim: [0., 1., 1., 1., 0., 0., 0., 0.],
        vox_offset: 352.,
        qform_code: 1,
        ..Nifti1Header::default()
    }
}

/// 4*4*3 INT16 voxels holding `x + 4y + 16z - 5`.
fn int16_volume(endianness: Endianness) -> Vec<u8> {
    let mut volume = Vec::new();
    for z in 0..3i64 {
        for y in 0..4i64 {
            for x in 0..4i64 {
                let value = (x + 4 * y + 16 * z - 5) as f64;
                let bytes =
                    encode_voxel(value, NiftiType::Int16 as i32, endianness, 2, 0.0, 0.0).unwrap();
                volume.extend_from_slice(&bytes);
            }
        }
    }
    volume
}

fn check_int16_image(reader: &NiftiReader) {
    let image = reader.image();
    assert_eq!(image.img_shape(), [4, 4, 3, 1]);
    assert_eq!(image.nvox, 48);
    assert_eq!(image.nbyper, 2);
    assert_eq!(image.data_type().unwrap(), NiftiType::Int16);
    assert_eq!(image.data_type().unwrap().to_string(), "INT16");
    assert_eq!(image.qform().unwrap().to_string(), "1: Scanner Anat");
    for z in 0..3 {
        for y in 0..4 {
            for x in 0..4 {
                let expected = (x + 4 * y + 16 * z - 5) as f64;
                assert_eq!(image.get_at(x, y, z, 0).unwrap(), expected);
            }
        }
    }
}

#[test]
fn parse_single_file_v1() {
    let stream = single_file_v1(&int16_header(), &int16_volume(Endianness::Little), Endianness::Little);
    let mut reader = NiftiReader::from_bytes(stream).unwrap().retain_header(true);
    reader.parse().unwrap();

    assert_eq!(reader.version(), Some(NiftiVersion::Nifti1));
    assert_eq!(reader.byte_order(), Endianness::Little);
    assert!(reader.header(false).is_some());
    check_int16_image(&reader);
    // the fourth extent was zero on disk and is coerced on read
    assert_eq!(reader.image().dim, [3, 4, 4, 3, 1, 1, 1, 1]);
}

#[test]
fn parse_opposite_byte_order() {
    let opposite = opposite_endianness(native_endianness());
    let stream = single_file_v1(&int16_header(), &int16_volume(opposite), opposite);
    let mut reader = NiftiReader::from_bytes(stream).unwrap();
    reader.parse().unwrap();

    assert_eq!(reader.byte_order(), opposite);
    check_int16_image(&reader);
}

#[test]
fn parse_gzip_compressed_input() {
    let stream = single_file_v1(&int16_header(), &int16_volume(Endianness::Little), Endianness::Little);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(&stream).unwrap();
    let compressed = encoder.finish().unwrap();

    let mut reader = NiftiReader::from_bytes(compressed).unwrap();
    reader.parse().unwrap();
    check_int16_image(&reader);
}

#[test]
fn parse_paired_input() {
    let mut header = int16_header();
    header.magic = *b"ni1\0";
    header.vox_offset = 0.;
    let mut header_bytes = Vec::new();
    header.write_to(&mut header_bytes, Endianness::Little).unwrap();

    let mut reader =
        NiftiReader::from_paired_bytes(header_bytes, int16_volume(Endianness::Little)).unwrap();
    reader.parse().unwrap();
    check_int16_image(&reader);
}

#[test]
fn parse_single_file_v2_with_sform() {
    let header = Nifti2Header {
        dim: [3, 4, 4, 2, 0, 0, 0, 0],
        datatype: NiftiType::Float32 as i16,
        bitpix: 32,
        vox_offset: 544,
        sform_code: XForm::Mni152 as i32,
        srow_x: [-2., 0., 0., 90.],
        srow_y: [0., 2., 0., -126.],
        srow_z: [0., 0., 2., -72.],
        ..Nifti2Header::default()
    };
    let mut stream = Vec::new();
    header.write_to(&mut stream, Endianness::Little).unwrap();
    stream.extend_from_slice(&[0u8; 4]);
    stream.extend_from_slice(&vec![0u8; 4 * 4 * 2 * 4]);

    let mut reader = NiftiReader::from_bytes(stream).unwrap();
    reader.parse().unwrap();

    assert_eq!(reader.version(), Some(NiftiVersion::Nifti2));
    assert_eq!(reader.byte_order(), Endianness::Little);
    let image = reader.image();
    assert_eq!(
        image
            .orientation()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        vec!["R2L", "P2A", "I2S"]
    );
    assert_eq!(image.sform().unwrap().to_string(), "4: MNI");
    assert_eq!(image.qform().unwrap().to_string(), "0: Unknown");
    assert_eq!(image.affine()[(0, 0)], -2.0);
    assert_eq!(image.affine()[(0, 3)], 90.0);
    assert_eq!(image.get_at(3, 3, 1, 0).unwrap(), 0.0);
}

#[test]
fn rejects_unrecognised_stream() {
    let mut reader = NiftiReader::from_bytes(vec![0xAB; 400]).unwrap();
    assert!(matches!(reader.parse(), Err(NiftiError::InvalidFormat)));
}

#[test]
fn rejects_bad_magic() {
    let mut header = int16_header();
    header.magic = *b"bad\0";
    let stream = single_file_v1(&header, &int16_volume(Endianness::Little), Endianness::Little);
    let mut reader = NiftiReader::from_bytes(stream).unwrap();
    assert!(matches!(reader.parse(), Err(NiftiError::InvalidMagic)));
}

#[test]
fn rejects_zero_dim0() {
    let mut header = int16_header();
    header.dim[0] = 0;
    let stream = single_file_v1(&header, &int16_volume(Endianness::Little), Endianness::Little);
    let mut reader = NiftiReader::from_bytes(stream).unwrap();
    assert!(matches!(reader.parse(), Err(NiftiError::InvalidHeader(_))));
}

#[test]
fn rejects_zero_bitpix() {
    let mut header = int16_header();
    header.bitpix = 0;
    let stream = single_file_v1(&header, &int16_volume(Endianness::Little), Endianness::Little);
    let mut reader = NiftiReader::from_bytes(stream).unwrap();
    assert!(matches!(reader.parse(), Err(NiftiError::InvalidHeader(_))));
}

#[test]
fn rejects_short_volume() {
    let volume = int16_volume(Endianness::Little);
    let mut stream = single_file_v1(&int16_header(), &volume, Endianness::Little);
    stream.truncate(stream.len() - 10);
    let mut reader = NiftiReader::from_bytes(stream).unwrap();
    assert!(matches!(reader.parse(), Err(NiftiError::ShortRead(96, 86))));
}
