pub mod hex {
    use crate::error::{Error, Result};

    /// Converts a single pair of hex digits into a byte.
    /// If there are unnatural hex chars given, returns None.
    fn single_u8_be(pair: [u8; 2]) -> Option<u8> {
        (pair[0] as char)
            .to_digit(16)
            .zip((pair[1] as char).to_digit(16))
            .map(|(v1, v2)| (v1 << 4 | v2) as u8)
    }

    /// Converts from a given hex string to a byte vector, one byte per pair of digits.
    pub fn from_hex(hex: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        let hex = hex.as_ref();

        if hex.len() % 2 == 1 {
            return Err(Error::InvalidHexEncoding(format!(
                "odd number of digits ({})",
                hex.len()
            )));
        }

        hex.chunks_exact(2)
            .enumerate()
            .map(|(i, chunk)| {
                single_u8_be([chunk[0], chunk[1]]).ok_or_else(|| {
                    Error::InvalidHexEncoding(format!("non-hex digit in pair at offset {}", 2 * i))
                })
            })
            .collect()
    }

    /// Converts bytes to a lowercase hex string.
    pub fn to_hex(bytes: &[u8]) -> String {
        let mut hex = String::with_capacity(2 * bytes.len());
        for i in bytes {
            hex.extend(format!("{:02x}", *i).chars());
        }
        hex
    }

    /// Parses the 40 character textual form of a SHA-1 digest.
    /// Characters outside of [0-9a-fA-F] are rejected instead of being read as zero.
    pub fn digest_from_hex(hex: &str) -> Result<[u8; 20]> {
        let count = hex.chars().count();
        if count != 40 {
            return Err(Error::InvalidDigestLength(count));
        }
        if !hex.chars().all(|v| v.is_ascii_hexdigit()) {
            return Err(Error::InvalidDigestFormat(hex.to_string()));
        }

        let bytes = from_hex(hex)?;
        let mut digest = [0u8; 20];
        digest.copy_from_slice(&bytes);
        Ok(digest)
    }

    #[test]
    fn test_from_hex() {
        assert_eq!(from_hex("ffff"), Ok(vec![0xff, 0xff]));
        assert_eq!(from_hex("0fFf"), Ok(vec![0x0f, 0xff]));
        assert_eq!(from_hex(""), Ok(vec![]));
        assert!(matches!(from_hex("abc"), Err(Error::InvalidHexEncoding(_))));
        assert!(matches!(from_hex("zz"), Err(Error::InvalidHexEncoding(_))));
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0x0f, 0xff]), "0fff");
        assert_eq!(to_hex(&[0xff, 0xff]), "ffff");
    }

    #[test]
    fn test_digest_from_hex() {
        let digest = digest_from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
        assert_eq!(digest[0], 0xda);
        assert_eq!(digest[19], 0x09);
        assert_eq!(to_hex(&digest), "da39a3ee5e6b4b0d3255bfef95601890afd80709");

        assert_eq!(
            digest_from_hex("DA39A3EE5E6B4B0D3255BFEF95601890AFD80709"),
            Ok(digest)
        );
        assert_eq!(digest_from_hex("da39"), Err(Error::InvalidDigestLength(4)));
        assert!(matches!(
            digest_from_hex("da39a3ee5e6b4b0d3255bfef95601890afd8070g"),
            Err(Error::InvalidDigestFormat(_))
        ));
    }
}

pub mod escape {
    use crate::error::{Error, Result};

    /// Renders every byte as `\xHH`, printable or not.
    pub fn to_escaped(bytes: &[u8]) -> String {
        let mut escaped = String::with_capacity(4 * bytes.len());
        for i in bytes {
            escaped.extend(format!("\\x{:02x}", *i).chars());
        }
        escaped
    }

    fn simple_escape(c: u8) -> Option<u8> {
        match c {
            b'a' => Some(0x07),
            b'b' => Some(0x08),
            b't' => Some(b'\t'),
            b'n' => Some(b'\n'),
            b'v' => Some(0x0b),
            b'f' => Some(0x0c),
            b'r' => Some(b'\r'),
            b'e' => Some(0x1b),
            _ => None,
        }
    }

    /// Decodes C-style backslash escapes :
    ///  - \a \b \t \n \v \f \r \e
    ///  - \xHH with exactly two hex digits
    ///  - \NNN with exactly three octal digits
    /// Any other backslash is kept literally and the following byte is decoded on its own.
    pub fn from_escaped(text: &[u8]) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(text.len());
        let mut i = 0;

        while i < text.len() {
            if text[i] != b'\\' {
                bytes.push(text[i]);
                i += 1;
                continue;
            }

            let Some(&next) = text.get(i + 1) else {
                bytes.push(b'\\');
                break;
            };

            if let Some(byte) = simple_escape(next) {
                bytes.push(byte);
                i += 2;
            } else if next == b'x' {
                let digits = text
                    .get(i + 2..i + 4)
                    .filter(|v| v.iter().all(u8::is_ascii_hexdigit))
                    .ok_or(Error::InvalidEscape {
                        position: i,
                        reason: "\\x must be followed by two hex digits",
                    })?;
                bytes.push(digits.iter().fold(0u8, |acc, v| {
                    acc << 4 | (*v as char).to_digit(16).unwrap_or(0) as u8
                }));
                i += 4;
            } else if (b'0'..=b'7').contains(&next) {
                let invalid = Error::InvalidEscape {
                    position: i,
                    reason: "octal escape must be three digits no greater than \\377",
                };
                let digits = text
                    .get(i + 1..i + 4)
                    .filter(|v| v.iter().all(|d| (b'0'..=b'7').contains(d)))
                    .ok_or(invalid.clone())?;
                let value = digits
                    .iter()
                    .fold(0u32, |acc, v| acc << 3 | (v - b'0') as u32);
                bytes.push(u8::try_from(value).map_err(|_| invalid)?);
                i += 4;
            } else {
                bytes.push(b'\\');
                i += 1;
            }
        }
        Ok(bytes)
    }

    #[test]
    fn test_to_escaped() {
        assert_eq!(to_escaped(b"A\x00\xff"), "\\x41\\x00\\xff");
        assert_eq!(to_escaped(b""), "");
    }

    #[test]
    fn test_escape_round_trip() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        assert_eq!(from_escaped(to_escaped(&bytes).as_bytes()), Ok(bytes));
    }

    #[test]
    fn test_from_escaped() {
        assert_eq!(
            from_escaped(b"\\a\\b\\t\\n\\v\\f\\r\\e"),
            Ok(vec![0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x1b])
        );
        assert_eq!(from_escaped(b"admin=true"), Ok(b"admin=true".to_vec()));
        assert_eq!(from_escaped(b"\\x41\\x4A\\101"), Ok(b"AJA".to_vec()));
        assert_eq!(from_escaped(b"\\000\\377"), Ok(vec![0x00, 0xff]));
        assert_eq!(from_escaped(b"\\q"), Ok(b"\\q".to_vec()));
        assert_eq!(from_escaped(b"end\\"), Ok(b"end\\".to_vec()));
        // the second backslash is not swallowed by the first one
        assert_eq!(from_escaped(b"\\\\n"), Ok(b"\\\n".to_vec()));
    }

    #[test]
    fn test_from_escaped_rejects_truncated() {
        assert!(matches!(
            from_escaped(b"ab\\x4"),
            Err(Error::InvalidEscape { position: 2, .. })
        ));
        assert!(matches!(from_escaped(b"\\xzz"), Err(Error::InvalidEscape { .. })));
        assert!(matches!(from_escaped(b"\\12"), Err(Error::InvalidEscape { .. })));
        assert!(matches!(from_escaped(b"\\400"), Err(Error::InvalidEscape { .. })));
    }
}

pub mod append {
    use std::{fmt::Display, str::FromStr};

    use super::{escape::from_escaped, hex::from_hex};
    use crate::error::{Error, Result};

    /// How the operator spelled the bytes to append.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub enum AppendDecode {
        Raw,
        Hex,
        #[default]
        Echo,
    }

    impl AppendDecode {
        /// Decodes operator input into the raw attacker bytes.
        pub fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
            match self {
                Self::Raw => Ok(input.to_vec()),
                Self::Hex => from_hex(input),
                Self::Echo => from_escaped(input),
            }
        }
    }

    impl FromStr for AppendDecode {
        type Err = Error;

        fn from_str(s: &str) -> Result<Self> {
            match s {
                "raw" => Ok(Self::Raw),
                "hex" => Ok(Self::Hex),
                "echo" | "escape" => Ok(Self::Echo),
                _ => Err(Error::UnknownDecodeMode(s.to_string())),
            }
        }
    }

    impl Display for AppendDecode {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Raw => f.write_str("raw"),
                Self::Hex => f.write_str("hex"),
                Self::Echo => f.write_str("echo"),
            }
        }
    }

    #[test]
    fn test_decode_modes() {
        assert_eq!(AppendDecode::Raw.decode(b"\\x41"), Ok(b"\\x41".to_vec()));
        assert_eq!(AppendDecode::Hex.decode(b"4142"), Ok(b"AB".to_vec()));
        assert_eq!(AppendDecode::Echo.decode(b"\\x41\\n"), Ok(b"A\n".to_vec()));
        assert!(matches!(
            AppendDecode::Hex.decode(b"abc"),
            Err(Error::InvalidHexEncoding(_))
        ));
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("raw".parse::<AppendDecode>(), Ok(AppendDecode::Raw));
        assert_eq!("escape".parse::<AppendDecode>(), Ok(AppendDecode::Echo));
        assert_eq!(AppendDecode::default(), AppendDecode::Echo);
        assert_eq!(
            "base64".parse::<AppendDecode>(),
            Err(Error::UnknownDecodeMode("base64".into()))
        );
    }
}
