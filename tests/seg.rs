use pretty_assertions::assert_eq;

use tempfile::tempdir;

use niivox::seg::{
    export_single_from_rle, import_as_rle, rle_decode, rle_encode, CoordValue, SegmentCoord,
    SegmentationBuilder,
};
use niivox::{Nifti1Header, NiftiReader, NiftiType, VoxelGrid};

fn coord(x: i64, y: i64, z: i64, t: i64, value: i64) -> SegmentCoord {
    SegmentCoord {
        x,
        y,
        z,
        t,
        value: CoordValue::Int(value),
    }
}

#[test]
fn rle_reference_vector() {
    let encoded = vec![10657., 7., 215., 7., 9., 11.];
    let total: f64 = encoded.iter().sum();

    let decoded = rle_decode(&encoded, 1.0);
    assert_eq!(decoded.len(), total as usize);
    assert_eq!(&decoded[10657..10664], &[1.; 7]);
    assert_eq!(&decoded[10650..10657], &[0.; 7]);
    assert_eq!(&decoded[decoded.len() - 11..], &[1.; 11]);

    assert_eq!(rle_encode(&decoded).unwrap(), encoded);
}

#[test]
fn rle_import_export_round_trip() {
    let mut grid = VoxelGrid::new(4, 4, 3, 1, NiftiType::Uint8 as i32);
    grid.set(1, 1, 0, 0, 2.0);
    grid.set(2, 1, 0, 0, 2.0);
    grid.set(0, 0, 2, 0, 3.0);
    grid.set(3, 3, 2, 0, 2.0);

    let segments = import_as_rle(&grid).unwrap();
    // one segment per (slice, label) pair that holds the label
    assert_eq!(segments.len(), 3);

    let mut restored = VoxelGrid::new(4, 4, 3, 1, NiftiType::Uint8 as i32);
    export_single_from_rle(&mut restored, &segments).unwrap();

    // the segment convention flips the z axis on export
    assert_eq!(restored.get(1, 1, 2, 0), 2.0);
    assert_eq!(restored.get(2, 1, 2, 0), 2.0);
    assert_eq!(restored.get(0, 0, 0, 0), 3.0);
    assert_eq!(restored.get(3, 3, 0, 0), 2.0);
    assert_eq!(restored.count_nonzero(), (4, 0, 44));
}

#[test]
fn export_validates_segment_indices() {
    let segments = import_as_rle(&{
        let mut g = VoxelGrid::new(2, 2, 2, 1, NiftiType::Uint8 as i32);
        g.set(0, 0, 1, 0, 1.0);
        g
    })
    .unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].z_index, 1.0);

    let mut same_shape = VoxelGrid::new(2, 2, 2, 1, NiftiType::Uint8 as i32);
    assert!(export_single_from_rle(&mut same_shape, &segments).is_ok());
    assert_eq!(same_shape.get(0, 0, 0, 0), 1.0);

    // a grid with fewer slices cannot absorb the segment
    let mut tiny = VoxelGrid::new(1, 1, 1, 1, NiftiType::Uint8 as i32);
    assert!(export_single_from_rle(&mut tiny, &segments).is_err());
}

fn seg_header() -> Nifti1Header {
    Nifti1Header::shaped(Some([4, 2, 2, 1, 1, 0, 0, 0]), NiftiType::Uint8 as i32)
}

#[test]
fn coords_to_nii_keeps_historical_label_mapper() {
    let seg = SegmentationBuilder::default()
        .nii1_header(seg_header())
        .compression(false)
        .build()
        .unwrap();

    let bytes = seg
        .coords_to_nii(&[coord(0, 0, 0, 0, 7), coord(1, 0, 0, 0, 7)])
        .unwrap();

    let mut reader = NiftiReader::from_bytes(bytes).unwrap();
    reader.parse().unwrap();
    let image = reader.image();
    // the first occurrence of a label is never written
    assert_eq!(image.get_at(0, 0, 0, 0).unwrap(), 0.0);
    assert_eq!(image.get_at(1, 0, 0, 0).unwrap(), 1.0);
}

#[test]
fn coords_to_nii_corrected_labels() {
    let seg = SegmentationBuilder::default()
        .nii1_header(seg_header())
        .compression(false)
        .corrected_labels(true)
        .build()
        .unwrap();

    let bytes = seg
        .coords_to_nii(&[
            coord(0, 0, 0, 0, 7),
            coord(1, 0, 0, 0, 7),
            coord(0, 1, 0, 0, 9),
        ])
        .unwrap();

    let mut reader = NiftiReader::from_bytes(bytes).unwrap();
    reader.parse().unwrap();
    let image = reader.image();
    // distinct values compress to consecutive labels, every occurrence set
    assert_eq!(image.get_at(0, 0, 0, 0).unwrap(), 1.0);
    assert_eq!(image.get_at(1, 0, 0, 0).unwrap(), 1.0);
    assert_eq!(image.get_at(0, 1, 0, 0).unwrap(), 2.0);
    assert_eq!(image.get_at(1, 1, 0, 0).unwrap(), 0.0);
}

#[test]
fn coords_to_nii_requires_header() {
    let seg = SegmentationBuilder::default().build().unwrap();
    assert!(seg.coords_to_nii(&[coord(0, 0, 0, 0, 1)]).is_err());
}

#[test]
fn coords_to_nii_rejects_out_of_grid_coordinates() {
    let seg = SegmentationBuilder::default()
        .nii1_header(seg_header())
        .corrected_labels(true)
        .build()
        .unwrap();
    assert!(seg.coords_to_nii(&[coord(5, 0, 0, 0, 1)]).is_err());
}

#[test]
fn nii_to_coords_lists_nonzero_voxels() {
    let seg = SegmentationBuilder::default()
        .nii1_header(seg_header())
        .compression(false)
        .corrected_labels(true)
        .build()
        .unwrap();
    let bytes = seg
        .coords_to_nii(&[coord(1, 0, 0, 0, 7), coord(0, 1, 0, 0, 9)])
        .unwrap();

    let mut reader = NiftiReader::from_bytes(bytes).unwrap();
    reader.parse().unwrap();

    let dir = tempdir().unwrap();
    let json_path = dir.path().join("coords.json");
    let out = SegmentationBuilder::default()
        .out_file(json_path.clone())
        .build()
        .unwrap();
    let coords = out.nii_to_coords(reader.image()).unwrap();

    assert_eq!(
        coords,
        vec![coord(0, 1, 0, 0, 2), coord(1, 0, 0, 0, 1)]
    );

    // the coordinate list round-trips through the JSON document
    let text = std::fs::read_to_string(json_path).unwrap();
    let back: Vec<SegmentCoord> = serde_json::from_str(&text).unwrap();
    assert_eq!(back, coords);
}

#[test]
fn segmentation_writes_compressed_file() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("segmentation");
    let seg = SegmentationBuilder::default()
        .nii1_header(seg_header())
        .out_file(out)
        .build()
        .unwrap();
    seg.coords_to_nii(&[coord(0, 0, 0, 0, 7), coord(1, 0, 0, 0, 7)])
        .unwrap();

    let raw = std::fs::read(dir.path().join("segmentation.nii.gz")).unwrap();
    assert!(niivox::util::is_gzip(&raw));
}
