//! Per-voxel translation between raw bytes and double-precision values,
//! honouring the datatype, the byte order of the volume and the optional
//! slope/intercept rescaling.
//!
//! Three-byte RGB24 voxels keep the historical behaviour of being packed and
//! unpacked through an `f32` bit pattern truncated to 24 bits; RGB data is
//! never rescaled.

use crate::error::{NiftiError, Result};
use crate::typedef::NiftiType;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use byteordered::Endianness;
use num_traits::FromPrimitive;

/// Decode a single voxel from its raw bytes into an `f64`.
///
/// The element width is taken from `bytes.len()`; `datatype` disambiguates
/// signedness and float interpretation within a width. Unsupported widths
/// (0, 16 and 32 bytes) and unknown datatypes decode to zero. When
/// `scl_slope` is non-zero and the datatype is not RGB24, the value is
/// rescaled as `scl_slope * v + scl_inter`.
pub fn decode_voxel(
    bytes: &[u8],
    datatype: i32,
    byte_order: Endianness,
    scl_slope: f64,
    scl_inter: f64,
) -> f64 {
    let dt = NiftiType::from_i32(datatype);
    let mut value = match bytes.len() {
        1 => {
            if dt == Some(NiftiType::Int8) {
                f64::from(bytes[0] as i8)
            } else {
                f64::from(bytes[0])
            }
        }
        2 => {
            let v = if byte_order == Endianness::Little {
                LittleEndian::read_u16(bytes)
            } else {
                BigEndian::read_u16(bytes)
            };
            match dt {
                Some(NiftiType::Int16) => f64::from(v as i16),
                Some(NiftiType::Uint16) => f64::from(v),
                _ => 0.0,
            }
        }
        3 => {
            let v = if byte_order == Endianness::Little {
                u32::from(bytes[0]) | u32::from(bytes[1]) << 8 | u32::from(bytes[2]) << 16
            } else {
                u32::from(bytes[2]) | u32::from(bytes[1]) << 8 | u32::from(bytes[0]) << 16
            };
            f64::from(f32::from_bits(v))
        }
        4 => {
            let v = if byte_order == Endianness::Little {
                LittleEndian::read_u32(bytes)
            } else {
                BigEndian::read_u32(bytes)
            };
            match dt {
                Some(NiftiType::Int32) => f64::from(v as i32),
                Some(NiftiType::Uint32) => f64::from(v),
                Some(NiftiType::Float32) | Some(NiftiType::Rgba32) => {
                    f64::from(f32::from_bits(v))
                }
                _ => 0.0,
            }
        }
        8 => {
            let v = if byte_order == Endianness::Little {
                LittleEndian::read_u64(bytes)
            } else {
                BigEndian::read_u64(bytes)
            };
            match dt {
                Some(NiftiType::Float64) | Some(NiftiType::Complex64) => f64::from_bits(v),
                Some(NiftiType::Int64) => v as i64 as f64,
                Some(NiftiType::Uint64) => v as f64,
                _ => 0.0,
            }
        }
        _ => 0.0,
    };

    if scl_slope != 0.0 && dt != Some(NiftiType::Rgb24) {
        value = scl_slope * value + scl_inter;
    }
    value
}

/// Encode a single voxel value into `n_by_per` raw bytes, symmetrically to
/// [`decode_voxel`].
///
/// When `scl_slope` is non-zero and the datatype is not RGB24, the inverse
/// transform `(v - scl_inter) / scl_slope` is applied before writing.
/// `n_by_per` of 0 and the 16- and 32-byte widths are rejected.
pub fn encode_voxel(
    value: f64,
    datatype: i32,
    byte_order: Endianness,
    n_by_per: i32,
    scl_slope: f64,
    scl_inter: f64,
) -> Result<Vec<u8>> {
    let dt = NiftiType::from_i32(datatype);
    let v = if scl_slope != 0.0 && dt != Some(NiftiType::Rgb24) {
        (value - scl_inter) / scl_slope
    } else {
        value
    };

    match n_by_per {
        1 => {
            let raw = if dt == Some(NiftiType::Int8) {
                v as i8 as u8
            } else {
                v as u8
            };
            Ok(vec![raw])
        }
        2 => {
            let raw = if dt == Some(NiftiType::Int16) {
                v as i16 as u16
            } else {
                v as u16
            };
            let mut b = [0u8; 2];
            if byte_order == Endianness::Little {
                LittleEndian::write_u16(&mut b, raw);
            } else {
                BigEndian::write_u16(&mut b, raw);
            }
            Ok(b.to_vec())
        }
        3 => {
            let bits = (v as f32).to_bits();
            let b = if byte_order == Endianness::Little {
                [bits as u8, (bits >> 8) as u8, (bits >> 16) as u8]
            } else {
                [(bits >> 16) as u8, (bits >> 8) as u8, bits as u8]
            };
            Ok(b.to_vec())
        }
        4 => {
            let raw = match dt {
                Some(NiftiType::Int32) => v as i32 as u32,
                Some(NiftiType::Float32) | Some(NiftiType::Rgba32) => (v as f32).to_bits(),
                _ => v as u32,
            };
            let mut b = [0u8; 4];
            if byte_order == Endianness::Little {
                LittleEndian::write_u32(&mut b, raw);
            } else {
                BigEndian::write_u32(&mut b, raw);
            }
            Ok(b.to_vec())
        }
        8 => {
            let raw = match dt {
                Some(NiftiType::Float64) | Some(NiftiType::Complex64) => v.to_bits(),
                Some(NiftiType::Int64) => v as i64 as u64,
                _ => v as u64,
            };
            let mut b = [0u8; 8];
            if byte_order == Endianness::Little {
                LittleEndian::write_u64(&mut b, raw);
            } else {
                BigEndian::write_u64(&mut b, raw);
            }
            Ok(b.to_vec())
        }
        _ => Err(NiftiError::UnsupportedDataType(datatype)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typedef::NiftiType;
    use crate::util::{native_endianness, opposite_endianness};

    fn round_trip(value: f64, datatype: NiftiType, byte_order: Endianness) -> f64 {
        let code = datatype as i32;
        let n = datatype.size_of() as i32;
        let bytes = encode_voxel(value, code, byte_order, n, 0.0, 0.0).unwrap();
        assert_eq!(bytes.len(), n as usize);
        decode_voxel(&bytes, code, byte_order, 0.0, 0.0)
    }

    #[test]
    fn integer_round_trips() {
        for &bo in &[native_endianness(), opposite_endianness(native_endianness())] {
            assert_eq!(round_trip(-100.0, NiftiType::Int8, bo), -100.0);
            assert_eq!(round_trip(200.0, NiftiType::Uint8, bo), 200.0);
            assert_eq!(round_trip(-30000.0, NiftiType::Int16, bo), -30000.0);
            assert_eq!(round_trip(65000.0, NiftiType::Uint16, bo), 65000.0);
            assert_eq!(round_trip(-2_000_000.0, NiftiType::Int32, bo), -2_000_000.0);
            assert_eq!(round_trip(4_000_000_000.0, NiftiType::Uint32, bo), 4_000_000_000.0);
            assert_eq!(round_trip(-9_000_000_000.0, NiftiType::Int64, bo), -9_000_000_000.0);
            assert_eq!(round_trip(9_000_000_000.0, NiftiType::Uint64, bo), 9_000_000_000.0);
        }
    }

    #[test]
    fn float_round_trips() {
        for &bo in &[native_endianness(), opposite_endianness(native_endianness())] {
            assert_eq!(round_trip(0.5, NiftiType::Float32, bo), 0.5);
            assert_eq!(round_trip(-1.25e10, NiftiType::Float32, bo), -1.25e10);
            assert_eq!(round_trip(1.0e-300, NiftiType::Float64, bo), 1.0e-300);
            assert_eq!(round_trip(-2.5, NiftiType::Float64, bo), -2.5);
        }
    }

    #[test]
    fn slope_and_intercept() {
        let bo = native_endianness();
        let code = NiftiType::Int16 as i32;
        // raw = (900 - 100) / 2 = 400; decode applies 2 * 400 + 100 = 900
        let bytes = encode_voxel(900.0, code, bo, 2, 2.0, 100.0).unwrap();
        assert_eq!(decode_voxel(&bytes, code, bo, 0.0, 0.0), 400.0);
        assert_eq!(decode_voxel(&bytes, code, bo, 2.0, 100.0), 900.0);
    }

    #[test]
    fn rgb24_never_rescaled() {
        let bo = native_endianness();
        let code = NiftiType::Rgb24 as i32;
        let bytes = encode_voxel(1.5e-39, code, bo, 3, 2.0, 10.0).unwrap();
        assert_eq!(bytes.len(), 3);
        // decoded through the f32 bit pattern, with the slope ignored
        let val = decode_voxel(&bytes, code, bo, 2.0, 10.0);
        assert!(val.is_finite());
    }

    #[test]
    fn unsupported_widths() {
        let bo = native_endianness();
        assert!(encode_voxel(1.0, NiftiType::Unknown as i32, bo, 0, 0.0, 0.0).is_err());
        assert!(encode_voxel(1.0, NiftiType::Float128 as i32, bo, 16, 0.0, 0.0).is_err());
        assert!(encode_voxel(1.0, NiftiType::Complex256 as i32, bo, 32, 0.0, 0.0).is_err());
        assert_eq!(decode_voxel(&[0u8; 16], NiftiType::Float128 as i32, bo, 0.0, 0.0), 0.0);
        assert_eq!(decode_voxel(&[0u8; 32], NiftiType::Complex256 as i32, bo, 0.0, 0.0), 0.0);
    }

    #[test]
    fn opposite_order_bytes_differ() {
        let le = encode_voxel(258.0, NiftiType::Uint16 as i32, Endianness::Little, 2, 0.0, 0.0)
            .unwrap();
        let be =
            encode_voxel(258.0, NiftiType::Uint16 as i32, Endianness::Big, 2, 0.0, 0.0).unwrap();
        assert_eq!(le, vec![0x02, 0x01]);
        assert_eq!(be, vec![0x01, 0x02]);
    }
}
