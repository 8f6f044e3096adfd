//! Conversion of raw SMC value buffers into temperatures.

use crate::{error::DecodeError, key, DataType};

/// Signed fixed point: 7 integer bits, 8 fractional bits.
pub const TYPE_SP78: DataType = key!("sp78");
/// IEEE-754 single precision.
pub const TYPE_FLT: DataType = key!("flt ");

/// Decodes a temperature value.
///
/// Both supported formats are big-endian. Any other `(data_type, size)` pair is rejected rather
/// than guessed at.
pub fn decode(data_type: DataType, size: u32, bytes: &[u8]) -> Result<f64, DecodeError> {
    match (data_type, size) {
        (TYPE_SP78, 2) => {
            let raw = leading::<2>(bytes)?;
            Ok(f64::from(i16::from_be_bytes(raw)) / 256.0)
        }
        (TYPE_FLT, 4) => {
            let raw = leading::<4>(bytes)?;
            Ok(f64::from(f32::from_bits(u32::from_be_bytes(raw))))
        }
        _ => Err(DecodeError::UnsupportedFormat { data_type, size }),
    }
}

fn leading<const N: usize>(bytes: &[u8]) -> Result<[u8; N], DecodeError> {
    bytes
        .get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or(DecodeError::Truncated {
            expected: N,
            actual: bytes.len(),
        })
}
