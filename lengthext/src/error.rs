use std::fmt::Display;

/// Catchall Error for decoding operator input and preparing an extension run.
/// Every variant describes bad input; once the inputs are accepted the hashing itself cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    InvalidDigestLength(usize),
    InvalidDigestFormat(String),
    InvalidRange { min: u64, max: u64 },
    InvalidHexEncoding(String),
    InvalidEscape { position: usize, reason: &'static str },
    UnknownDecodeMode(String),
    LengthOverflow(u64),
    InvalidLength(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDigestLength(len) => {
                write!(f, "sha1(prefix) must be 40 hex chars, got {len}")
            }
            Self::InvalidDigestFormat(digest) => {
                write!(f, "sha1(prefix) contains non-hex characters: {digest}")
            }
            Self::InvalidRange { min, max } => {
                write!(f, "min-length ({min}) must not exceed max-length ({max})")
            }
            Self::InvalidHexEncoding(reason) => write!(f, "invalid hex string: {reason}"),
            Self::InvalidEscape { position, reason } => {
                write!(f, "invalid escape sequence at byte {position}: {reason}")
            }
            Self::UnknownDecodeMode(mode) => {
                write!(f, "unknown decode mode '{mode}', expected one of raw, hex, echo")
            }
            Self::LengthOverflow(len) => {
                write!(f, "length {len} is too large for the 64 bit length field")
            }
            Self::InvalidLength(text) => write!(f, "'{text}' is not a valid length"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

#[test]
fn test_error_messages() {
    assert_eq!(
        Error::InvalidDigestLength(3).to_string(),
        "sha1(prefix) must be 40 hex chars, got 3"
    );
    assert_eq!(
        Error::InvalidRange { min: 5, max: 2 }.to_string(),
        "min-length (5) must not exceed max-length (2)"
    );
}
