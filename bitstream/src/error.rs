//! Bitstream errors.

use std::fmt;

/// Result alias used across the bitstream crate.
pub type BitResult<T> = Result<T, BitError>;

/// A malformed bitstream request.
///
/// Running out of capacity while writing is not an error: bounded writers
/// record it in their overflow counter instead so callers can roll back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitError {
    /// A read ran past the last readable bit.
    UnexpectedEof { requested: usize, available: usize },

    /// A width above what the operation supports.
    InvalidBitCount { bits: usize, max_bits: usize },

    /// A value with set bits above the requested width.
    ValueOutOfRange { value: u64, bits: usize },

    /// A signed value whose magnitude does not fit a short varint.
    MagnitudeOutOfRange { value: i64 },
}

impl fmt::Display for BitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof {
                requested,
                available,
            } => write!(
                f,
                "read of {requested} bits past end of stream ({available} bits left)"
            ),
            Self::InvalidBitCount { bits, max_bits } => {
                write!(f, "bit width {bits} exceeds the limit of {max_bits}")
            }
            Self::ValueOutOfRange { value, bits } => {
                write!(f, "value {value} does not fit in {bits} bits")
            }
            Self::MagnitudeOutOfRange { value } => {
                write!(f, "magnitude of {value} does not fit in a short varint")
            }
        }
    }
}

impl std::error::Error for BitError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_numbers() {
        let cases = [
            (
                BitError::UnexpectedEof {
                    requested: 8,
                    available: 3,
                },
                ["8 bits", "3 bits"],
            ),
            (
                BitError::InvalidBitCount {
                    bits: 65,
                    max_bits: 64,
                },
                ["65", "64"],
            ),
            (
                BitError::ValueOutOfRange { value: 256, bits: 8 },
                ["256", "8 bits"],
            ),
            (
                BitError::MagnitudeOutOfRange { value: -70_000 },
                ["-70000", "short varint"],
            ),
        ];
        for (err, needles) in cases {
            let msg = err.to_string();
            for needle in needles {
                assert!(msg.contains(needle), "{msg:?} should mention {needle:?}");
            }
        }
    }

    #[test]
    fn bit_error_is_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<BitError>();
    }
}
