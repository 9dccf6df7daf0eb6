use std::{
    ffi::OsString,
    fmt::Display,
    io::{self, Write},
    str::FromStr,
};

use clap::Parser;
use log::{debug, info};

use lengthext::{
    digest::{sha1::Sha1Core, FromState},
    encode::{append::AppendDecode, hex::digest_from_hex},
    enumerate, par_enumerate, validate_range, Error,
};

/// Computes SHA-1 length extensions of sha1(prefix) for every prefix length in a range.
/// Each output line is `<length>: <forged sha1> <bytes to append>`.
#[derive(Parser, Debug)]
#[command(name = "sha1append", version)]
pub struct Args {
    /// SHA-1 of the unknown prefix (40 hex chars)
    pub digest: String,

    /// Data to append after the padding, decoded according to --append-decode
    #[arg(value_name = "ATTACKER-STRING", allow_hyphen_values = true)]
    pub attacker: OsString,

    /// Smallest prefix length to try
    #[arg(short = 'm', long = "min-length", value_name = "N", default_value = "0", value_parser = parse_length)]
    pub min_length: u64,

    /// Largest prefix length to try
    #[arg(short = 'M', long = "max-length", value_name = "N", default_value = "64", value_parser = parse_length)]
    pub max_length: u64,

    /// How ATTACKER-STRING is encoded: raw, hex or echo (backslash escapes)
    #[arg(short = 'd', long = "append-decode", value_name = "MODE", default_value = "echo", value_parser = AppendDecode::from_str)]
    pub append_decode: AppendDecode,

    /// Compute the candidates on all cores before printing them
    #[arg(short = 'j', long)]
    pub parallel: bool,
}

/// Parses a length the way strtol(.., 0) does : decimal, 0x-prefixed hex or 0-prefixed octal.
pub fn parse_length(text: &str) -> Result<u64, Error> {
    let trimmed = text.trim();
    let parsed = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)
    } else if trimmed.len() > 1 && trimmed.starts_with('0') {
        u64::from_str_radix(&trimmed[1..], 8)
    } else {
        trimmed.parse::<u64>()
    };
    parsed.map_err(|_| Error::InvalidLength(text.to_string()))
}

/// Validated run parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub digest: [u8; 20],
    pub attacker: Vec<u8>,
    pub min_len: u64,
    pub max_len: u64,
    pub parallel: bool,
}

impl Config {
    /// Decodes and checks every argument so that nothing can fail once output has started.
    pub fn from_args(args: Args) -> Result<Self, Error> {
        let digest = digest_from_hex(&args.digest)?;
        let attacker = args
            .append_decode
            .decode(args.attacker.as_encoded_bytes())?;

        let lengths = validate_range(args.min_length, args.max_length)?;

        Ok(Self {
            digest,
            attacker,
            min_len: *lengths.start(),
            max_len: *lengths.end(),
            parallel: args.parallel,
        })
    }
}

/// Catchall Error for a run of the tool
#[derive(Debug)]
pub enum AppError {
    Input(Error),
    Output(io::Error),
}

impl From<Error> for AppError {
    fn from(value: Error) -> Self {
        Self::Input(value)
    }
}

impl From<io::Error> for AppError {
    fn from(value: io::Error) -> Self {
        Self::Output(value)
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input(v) => v.fmt(f),
            Self::Output(v) => write!(f, "cannot write output: {v}"),
        }
    }
}

impl std::error::Error for AppError {}

/// Writes one line per candidate length, ascending.
pub fn run(config: &Config, out: &mut impl Write) -> Result<(), AppError> {
    debug!(
        "seed registers {:08x?}",
        Sha1Core::from_state(config.digest, 0).registers()
    );
    info!(
        "extending with {} bytes for prefix lengths {}..={}",
        config.attacker.len(),
        config.min_len,
        config.max_len
    );

    if config.parallel {
        let results = par_enumerate(config.digest, config.min_len, config.max_len, &config.attacker)?;
        for result in &results {
            writeln!(out, "{result}")?;
        }
    } else {
        for result in enumerate(config.digest, config.min_len, config.max_len, &config.attacker)? {
            writeln!(out, "{result}")?;
        }
    }
    out.flush()?;
    Ok(())
}

#[test]
fn test_parse_length() {
    assert_eq!(parse_length("0"), Ok(0));
    assert_eq!(parse_length("64"), Ok(64));
    assert_eq!(parse_length("0x40"), Ok(64));
    assert_eq!(parse_length("0X1f"), Ok(31));
    assert_eq!(parse_length("010"), Ok(8));
    assert_eq!(parse_length("-1"), Err(Error::InvalidLength("-1".into())));
    assert_eq!(parse_length("08"), Err(Error::InvalidLength("08".into())));
    assert!(parse_length("ten").is_err());
}
