//! An application for dumping NIfTI file meta-data.

use niivox::reader::NiftiReader;
use std::env;

fn main() {
    let mut args = env::args().skip(1);
    let filename = args.next().expect("Path to NIfTI file is required");
    let mut reader = NiftiReader::from_file(filename)
        .expect("Failed to read NIfTI file")
        .retain_header(true);
    reader.parse().expect("Failed to parse NIfTI file");

    let image = reader.image();
    println!("version:     NIfTI-{}", reader.version().unwrap().number());
    println!("byte order:  {:?}", reader.byte_order());
    println!("shape:       {:?}", image.img_shape());
    println!("voxel size:  {:?}", image.voxel_size());
    match image.data_type() {
        Ok(t) => println!("datatype:    {}", t),
        Err(_) => println!("datatype:    ILLEGAL ({})", image.datatype),
    }
    println!(
        "orientation: {}",
        image
            .orientation()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    if let Ok(qform) = image.qform() {
        println!("qform:       {}", qform);
    }
    if let Ok(sform) = image.sform() {
        println!("sform:       {}", sform);
    }
    if !image.description().is_empty() {
        println!("descrip:     {}", image.description());
    }
    if let Some(header) = reader.header(false) {
        println!("{}", header.pretty());
    }
}
