use clap::{error::ErrorKind, Parser};

use lengthext::{
    encode::{append::AppendDecode, escape::from_escaped, hex::to_hex},
    Error,
};
use sha1append::{run, Args, Config};

const EMPTY_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

fn config(argv: &[&str]) -> Result<Config, Error> {
    let args = Args::try_parse_from([&["sha1append"][..], argv].concat()).unwrap();
    Config::from_args(args)
}

fn output(config: &Config) -> String {
    let mut out = Vec::new();
    run(config, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_defaults() {
    let args = Args::try_parse_from(["sha1append", EMPTY_SHA1, "abc"]).unwrap();
    assert_eq!(args.min_length, 0);
    assert_eq!(args.max_length, 64);
    assert_eq!(args.append_decode, AppendDecode::Echo);
    assert!(!args.parallel);
}

#[test]
fn test_options() {
    let args = Args::try_parse_from([
        "sha1append", "-m", "0x10", "--max-length", "020", "-d", "hex", "-j", EMPTY_SHA1, "4142",
    ])
    .unwrap();
    assert_eq!(args.min_length, 16);
    assert_eq!(args.max_length, 16);
    assert_eq!(args.append_decode, AppendDecode::Hex);
    assert!(args.parallel);

    let config = Config::from_args(args).unwrap();
    assert_eq!(config.attacker, b"AB");
}

#[test]
fn test_usage_errors() {
    let err = Args::try_parse_from(["sha1append", "--frobnicate", EMPTY_SHA1, "x"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownArgument);

    let err = Args::try_parse_from(["sha1append", "-d", "base64", EMPTY_SHA1, "x"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueValidation);

    let err = Args::try_parse_from(["sha1append", "-M", "lots", EMPTY_SHA1, "x"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueValidation);

    let err = Args::try_parse_from(["sha1append", EMPTY_SHA1]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

    let err = Args::try_parse_from(["sha1append", "--help"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayHelp);
}

#[test]
fn test_validation_errors() {
    assert_eq!(config(&["abcd", "x"]), Err(Error::InvalidDigestLength(4)));
    assert!(matches!(
        config(&["xa39a3ee5e6b4b0d3255bfef95601890afd80709", "x"]),
        Err(Error::InvalidDigestFormat(_))
    ));
    assert_eq!(
        config(&["-m", "5", "-M", "2", EMPTY_SHA1, "x"]),
        Err(Error::InvalidRange { min: 5, max: 2 })
    );
    assert!(matches!(
        config(&["-d", "hex", EMPTY_SHA1, "abc"]),
        Err(Error::InvalidHexEncoding(_))
    ));
    assert!(matches!(
        config(&[EMPTY_SHA1, "trailing \\x4"]),
        Err(Error::InvalidEscape { .. })
    ));
    assert_eq!(
        config(&["-M", "0xffffffffffffffff", EMPTY_SHA1, "x"]),
        Err(Error::LengthOverflow(u64::MAX))
    );
}

#[test]
fn test_empty_prefix_output() {
    let config = config(&["-M", "0", EMPTY_SHA1, ""]).unwrap();
    let expected = format!(
        "0: c80b973c1157a7fe4f4150ad4c2a932494bf7bc7 \\x80{}\n",
        "\\x00".repeat(63)
    );
    assert_eq!(output(&config), expected);
}

#[test]
fn test_default_range_output() {
    let config = config(&[EMPTY_SHA1, "admin=true"]).unwrap();
    let text = output(&config);
    let lines: Vec<_> = text.lines().collect();

    assert_eq!(lines.len(), 65);
    for (i, line) in lines.iter().enumerate() {
        assert!(line.starts_with(&format!("{i}: ")));
    }

    let parallel = Config {
        parallel: true,
        ..config.clone()
    };
    assert_eq!(output(&parallel), text);
}

#[test]
fn test_forged_line_verifies() {
    let secret = b"0123456789 user=bob";
    let digest = to_hex(&openssl::sha::sha1(secret));
    let config = config(&["-m", "10", "-M", "30", &digest, ";admin=true\\n"]).unwrap();

    let text = output(&config);
    let line = text
        .lines()
        .find(|v| v.starts_with(&format!("{}: ", secret.len())))
        .unwrap();

    let mut parts = line.split(' ');
    parts.next();
    let forged = parts.next().unwrap();
    let suffix = from_escaped(parts.next().unwrap().as_bytes()).unwrap();

    assert!(suffix.ends_with(b";admin=true\n"));
    assert_eq!(
        forged,
        to_hex(&openssl::sha::sha1(&[&secret[..], &suffix].concat()))
    );
}

#[test]
fn test_raw_mode_keeps_backslashes() {
    let config = config(&["-d", "raw", "-M", "0", EMPTY_SHA1, "\\x41"]).unwrap();
    assert_eq!(config.attacker, b"\\x41");
    assert!(output(&config).trim_end().ends_with("\\x5c\\x78\\x34\\x31"));
}

#[test]
fn test_exit_status() {
    use std::process::Command;

    let sha1append = || Command::new(env!("CARGO_BIN_EXE_sha1append"));

    let ok = sha1append().args(["-M", "0", EMPTY_SHA1, ""]).output().unwrap();
    assert!(ok.status.success());
    assert_eq!(ok.status.code(), Some(0));
    assert_eq!(String::from_utf8(ok.stdout).unwrap().lines().count(), 1);

    let invalid = sha1append().args(["-m", "5", "-M", "2", EMPTY_SHA1, "x"]).output().unwrap();
    assert_eq!(invalid.status.code(), Some(1));
    assert!(invalid.stdout.is_empty());
    assert!(String::from_utf8(invalid.stderr).unwrap().starts_with("sha1append: "));

    let usage = sha1append().args(["--frobnicate", EMPTY_SHA1, "x"]).output().unwrap();
    assert!(!usage.status.success());
    assert_eq!(usage.status.code(), Some(2));
}
