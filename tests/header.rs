use pretty_assertions::assert_eq;

use niivox::header::Nifti1HeaderBuilder;
use niivox::util::native_endianness;
use niivox::{Nifti1Header, Nifti2Header, NiftiHeader, NiftiType, NiftiVersion};

#[test]
fn minimal_headers_have_exact_layout() {
    let h1 = Nifti1Header::default();
    assert_eq!(h1.to_bytes().unwrap().len(), 348);
    let h2 = Nifti2Header::default();
    assert_eq!(h2.to_bytes().unwrap().len(), 540);
}

#[test]
fn builder_defaults() {
    let hdr = Nifti1HeaderBuilder::default()
        .dim([3, 64, 64, 10, 0, 0, 0, 0])
        .datatype(NiftiType::Uint8 as i16)
        .bitpix(8)
        .cal_min(0.)
        .cal_max(128.)
        .build()
        .unwrap();
    assert_eq!(hdr.sizeof_hdr, 348);
    assert_eq!(hdr.cal_max, 128.);
    assert_eq!(hdr.vox_offset, 352.);
    assert_eq!(&hdr.magic, b"n+1\0");
}

#[test]
fn nifti2_magic_bytes() {
    let hdr = Nifti2Header::default();
    assert_eq!(hdr.magic, [0x6e, 0x2b, 0x32, 0x00, 0x0d, 0x0a, 0x1a, 0x0a]);
    let bytes = hdr.to_bytes().unwrap();
    // the magic sits right after sizeof_hdr
    assert_eq!(&bytes[4..12], &hdr.magic);
}

#[test]
fn tagged_header_accessors() {
    let hdr = NiftiHeader::V1(Nifti1Header {
        dim: [3, 240, 240, 155, 1, 1, 1, 1],
        datatype: NiftiType::Int16 as i16,
        bitpix: 16,
        vox_offset: 352.,
        ..Nifti1Header::default()
    });
    assert_eq!(hdr.version(), NiftiVersion::Nifti1);
    assert_eq!(hdr.dim0(), 3);
    assert_eq!(hdr.datatype(), NiftiType::Int16 as i32);
    assert_eq!(hdr.bitpix(), 16);
    assert_eq!(hdr.vox_offset(), 352);
    assert!(hdr.validate_magic().is_ok());

    let hdr = NiftiHeader::V2(Nifti2Header::shaped(
        Some([3, 16, 16, 4, 0, 0, 0, 0]),
        NiftiType::Float64 as i32,
    ));
    assert_eq!(hdr.version(), NiftiVersion::Nifti2);
    assert_eq!(hdr.bitpix(), 64);
    assert_eq!(hdr.vox_offset(), 544);
}

#[test]
fn header_byte_round_trip_is_lossless() {
    let mut descrip = [0u8; 80];
    descrip[..10].copy_from_slice(b"FSL3.2beta");
    let header = Nifti1Header {
        regular: b'r',
        dim: [3, 91, 109, 91, 1, 1, 1, 1],
        datatype: 2,
        bitpix: 8,
        pixdim: [0., 2., 2., 2., 1., 1., 1., 1.],
        vox_offset: 352.,
        xyzt_units: 10,
        cal_max: 255.,
        descrip,
        qform_code: 0,
        sform_code: 4,
        srow_x: [-2., 0., 0., 90.],
        srow_y: [0., 2., 0., -126.],
        srow_z: [0., 0., 2., -72.],
        ..Nifti1Header::default()
    };
    let bytes = header.to_bytes().unwrap();
    assert_eq!(bytes.len(), 348);
    let reparsed = Nifti1Header::from_reader(&bytes[..], native_endianness()).unwrap();
    assert_eq!(reparsed, header);
}
