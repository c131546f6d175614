//! Record decoding for the sensor head line protocol
//!
//! Records are whitespace-delimited ASCII tokens, one record per line:
//!
//! ```text
//! atxy <dt_us> <ax_raw> <ay_raw>
//! gtxyz <dt_us> <gx_raw> <gy_raw> <gz_raw>
//! w <message tokens...>
//! ```
//!
//! Delta times arrive in microseconds and are converted to seconds here.

use thiserror::Error;

use crate::readings::{AccReading, GyroReading};

/// Record tag constants (the first token of each line)
pub mod tag {
    /// Two-axis accelerometer sample
    pub const ACC: &str = "atxy";
    /// Three-axis gyroscope sample
    pub const GYRO: &str = "gtxyz";
    /// Firmware warning, never fatal
    pub const WARNING: &str = "w";
}

/// Decoded record variants
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Accelerometer sample
    Acc(AccReading),
    /// Gyroscope sample
    Gyro(GyroReading),
    /// Firmware-reported non-fatal event
    Warning(String),
}

/// Decode error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The line contained no tokens at all.
    #[error("empty record")]
    Empty,

    /// The first token is not a recognized tag.
    #[error("unknown tag in record {0:?}")]
    UnknownTag(String),

    /// A recognized tag arrived with the wrong number of tokens.
    #[error("`{tag}` record has {got} tokens, expected {expected}")]
    WrongTokenCount {
        tag: &'static str,
        expected: usize,
        got: usize,
    },

    /// A numeric field failed to parse.
    #[error("bad number {value:?} in `{tag}` record")]
    InvalidNumber { tag: &'static str, value: String },
}

fn parse_field(tag: &'static str, token: &str) -> Result<f64, DecodeError> {
    token.parse().map_err(|_| DecodeError::InvalidNumber {
        tag,
        value: token.to_string(),
    })
}

/// Decode a single line into a [`Record`].
///
/// Microsecond delta times are converted to seconds. Warnings are returned
/// as ordinary values; only malformed records produce an error.
pub fn decode(line: &str) -> Result<Record, DecodeError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.split_first() {
        None => Err(DecodeError::Empty),
        Some((&tag::ACC, fields)) => {
            if fields.len() != 3 {
                return Err(DecodeError::WrongTokenCount {
                    tag: tag::ACC,
                    expected: 4,
                    got: tokens.len(),
                });
            }
            Ok(Record::Acc(AccReading {
                dt: parse_field(tag::ACC, fields[0])? * 1e-6,
                ax_raw: parse_field(tag::ACC, fields[1])?,
                ay_raw: parse_field(tag::ACC, fields[2])?,
            }))
        }
        Some((&tag::GYRO, fields)) => {
            if fields.len() != 4 {
                return Err(DecodeError::WrongTokenCount {
                    tag: tag::GYRO,
                    expected: 5,
                    got: tokens.len(),
                });
            }
            Ok(Record::Gyro(GyroReading {
                dt: parse_field(tag::GYRO, fields[0])? * 1e-6,
                gx_raw: parse_field(tag::GYRO, fields[1])?,
                gy_raw: parse_field(tag::GYRO, fields[2])?,
                gz_raw: parse_field(tag::GYRO, fields[3])?,
            }))
        }
        Some((&tag::WARNING, fields)) => Ok(Record::Warning(fields.join(" "))),
        Some((other, _)) => Err(DecodeError::UnknownTag(other.to_string())),
    }
}
