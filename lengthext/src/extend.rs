use std::{fmt::Display, ops::RangeInclusive};

use bytes::{BufMut, BytesMut};
use log::{debug, trace};
use rayon::prelude::*;

use crate::{
    digest::{sha1::Sha1Core, FromState, Hasher},
    encode::{escape::to_escaped, hex::to_hex},
    error::{Error, Result},
    padding::{PaddingSpec, LENGTH_FIELD},
};

/// Digest of `prefix || padding || attacker` for one hypothesized prefix length,
/// together with the bytes that have to be appended to the original message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionResult {
    pub length: u64,
    pub digest: [u8; 20],
    pub suffix: Vec<u8>,
}

impl Display for ExtensionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} {}",
            self.length,
            to_hex(&self.digest),
            to_escaped(&self.suffix)
        )
    }
}

/// Resumes the engine from `seed` with its bit counter forged to the padded length,
/// so the final padding is computed as if the unknown prefix had really been absorbed.
pub fn extend_padded<H: FromState>(
    seed: H::OUTPUT,
    padding: &PaddingSpec,
    attacker: &[u8],
) -> H::OUTPUT {
    let mut hasher = Hasher::<H>::from_state(seed, padding.padded_len() * 8);
    hasher.update(attacker);
    hasher.finalize()
}

/// SHA-1 of `prefix || padding(length) || attacker`, knowing only `seed = SHA-1(prefix)` and `length = |prefix|`.
pub fn extend(seed: [u8; 20], length: u64, attacker: &[u8]) -> Result<[u8; 20]> {
    let padding = PaddingSpec::compute(length)?;
    Ok(extend_padded::<Sha1Core>(seed, &padding, attacker))
}

fn candidate(seed: [u8; 20], length: u64, attacker: &[u8]) -> ExtensionResult {
    let padding = PaddingSpec::unchecked(length);
    trace!(
        "length {}: {} zero bytes, length field {} bits, resuming at bit {}",
        padding.length(),
        padding.zero_pad_len(),
        padding.bit_len(),
        padding.padded_len() * 8
    );

    let mut suffix = BytesMut::with_capacity(padding.len() + attacker.len());
    padding.put(&mut suffix);
    suffix.put(attacker);

    ExtensionResult {
        length: padding.length(),
        digest: extend_padded::<Sha1Core>(seed, &padding, attacker),
        suffix: suffix.to_vec(),
    }
}

/// Checks the range once so that no candidate inside it can overflow.
pub fn validate_range(min: u64, max: u64) -> Result<RangeInclusive<u64>> {
    if min > max {
        return Err(Error::InvalidRange { min, max });
    }
    // the padded length grows with the length, so the largest candidate bounds all others
    PaddingSpec::compute(max)?;
    Ok(min..=max)
}

/// Lazy sequence of ExtensionResults, ascending by candidate length.
#[derive(Clone, Debug)]
pub struct Candidates<'a> {
    seed: [u8; 20],
    lengths: RangeInclusive<u64>,
    attacker: &'a [u8],
}

impl Iterator for Candidates<'_> {
    type Item = ExtensionResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.lengths
            .next()
            .map(|length| candidate(self.seed, length, self.attacker))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lengths.size_hint()
    }
}

/// Enumerates every candidate prefix length in `min..=max`.
pub fn enumerate(seed: [u8; 20], min: u64, max: u64, attacker: &[u8]) -> Result<Candidates<'_>> {
    let lengths = validate_range(min, max)?;
    debug!(
        "enumerating lengths {min}..={max} with {} attacker bytes",
        attacker.len()
    );
    Ok(Candidates {
        seed,
        lengths,
        attacker,
    })
}

/// Same results as `enumerate`, computed on the rayon pool and collected in ascending order.
pub fn par_enumerate(
    seed: [u8; 20],
    min: u64,
    max: u64,
    attacker: &[u8],
) -> Result<Vec<ExtensionResult>> {
    let lengths = validate_range(min, max)?;
    debug!(
        "enumerating lengths {min}..={max} in parallel with {} attacker bytes",
        attacker.len()
    );
    Ok(lengths
        .into_par_iter()
        .map(|length| candidate(seed, length, attacker))
        .collect())
}

/// Implements Length-Extension Attack on a HashAlgorithm where the inner state can be reconstructed from the output.
/// Unlike the enumeration above, the visible part of the message is known and the secret length is fixed,
/// so the whole forged message is rebuilt.
pub struct LengthExtender<H: FromState> {
    msg: BytesMut,
    hasher: Hasher<H>,
}

impl<H: FromState> LengthExtender<H> {
    pub fn new(keylen: u64, msg: &[u8], hash: H::OUTPUT) -> Result<Self> {
        let total = keylen
            .checked_add(msg.len() as u64)
            .ok_or(Error::LengthOverflow(keylen))?;
        let padding = PaddingSpec::with_layout(total, H::BUFFERLEN, LENGTH_FIELD)?;

        let mut bytes = BytesMut::with_capacity(2 * (msg.len() + padding.len()));
        bytes.put(msg);
        padding.put(&mut bytes);

        Ok(Self {
            msg: bytes,
            hasher: Hasher::from_state(hash, padding.padded_len() * 8),
        })
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
        self.msg.put(bytes);
    }

    /// Returns the forged message (without the secret) and its MAC.
    pub fn finalize(self) -> (Vec<u8>, H::OUTPUT) {
        (self.msg.into(), self.hasher.finalize())
    }
}

#[cfg(test)]
const EMPTY_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

#[cfg(test)]
fn random_bytes(len: usize) -> Vec<u8> {
    use rand::RngCore;

    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
fn check_extension(len: usize) {
    let prefix = random_bytes(len);
    let seed = openssl::sha::sha1(&prefix);
    let padding = PaddingSpec::compute(len as u64).unwrap().to_bytes();

    for attacker_len in [0, 1, 10, 55, 64, 100, 150] {
        let attacker = random_bytes(attacker_len);
        let expected = openssl::sha::sha1(&[&prefix[..], &padding, &attacker].concat());

        assert_eq!(
            extend(seed, len as u64, &attacker).unwrap(),
            expected,
            "prefix {len} bytes, attacker {attacker_len} bytes"
        );
    }
}

#[cfg(test)]
macro_rules! extension_matches_openssl {
    ($($len:literal),*) => {
        paste::paste! {
            $(
                #[test]
                fn [<test_extend_prefix_len_ $len>]() {
                    check_extension($len);
                }
            )*
        }
    };
}

#[cfg(test)]
extension_matches_openssl!(0, 1, 55, 56, 63, 64, 65, 119, 120, 127, 128);

#[test]
fn test_extend_random_lengths() {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    for _ in 0..20 {
        check_extension(rng.gen_range(0..1000));
    }
}

#[test]
fn test_extend_depends_on_padded_length() {
    let seed = openssl::sha::sha1(b"secret||message");
    assert_eq!(extend(seed, 15, b"x"), extend(seed, 15, b"x"));

    // 15 and 16 both pad to one block: same digest, different length field in the suffix
    assert_eq!(extend(seed, 15, b"x"), extend(seed, 16, b"x"));
    let results: Vec<_> = enumerate(seed, 15, 16, b"x").unwrap().collect();
    assert_eq!(results[0].digest, results[1].digest);
    assert_ne!(results[0].suffix, results[1].suffix);

    // 55 still fits into one block, 56 spills into a second one
    assert_ne!(extend(seed, 55, b"x"), extend(seed, 56, b"x"));
}

#[test]
fn test_validate_range() {
    assert_eq!(validate_range(3, 3), Ok(3..=3));
    assert_eq!(validate_range(0, 64), Ok(0..=64));
    assert_eq!(validate_range(4, 3), Err(Error::InvalidRange { min: 4, max: 3 }));
    assert_eq!(
        validate_range(0, u64::MAX / 8),
        Err(Error::LengthOverflow(u64::MAX / 8))
    );
}

#[test]
fn test_enumerate_range() {
    let seed = openssl::sha::sha1(b"hello");
    let attacker = b";admin=true";
    let results: Vec<_> = enumerate(seed, 3, 130, attacker).unwrap().collect();

    assert_eq!(results.len(), 128);
    assert!(results.windows(2).all(|v| v[0].length + 1 == v[1].length));
    assert_eq!(results[0].length, 3);
    assert_eq!(results[127].length, 130);

    for result in &results {
        let padding = PaddingSpec::compute(result.length).unwrap();
        assert_eq!(result.suffix.len(), padding.len() + attacker.len());
        assert_eq!((result.length + padding.len() as u64) % 64, 0);
        assert!(result.suffix.ends_with(attacker));
        assert_eq!(result.digest, extend(seed, result.length, attacker).unwrap());
    }

    // "hello" is 5 bytes long
    let hit = &results[2];
    assert_eq!(hit.length, 5);
    assert_eq!(
        hit.digest,
        openssl::sha::sha1(&[&b"hello"[..], &hit.suffix].concat())
    );
}

#[test]
fn test_enumerate_single_and_invalid() {
    let seed = openssl::sha::sha1(b"");
    assert_eq!(enumerate(seed, 7, 7, b"").unwrap().count(), 1);
    assert_eq!(
        enumerate(seed, 8, 7, b"").err(),
        Some(Error::InvalidRange { min: 8, max: 7 })
    );
    assert_eq!(
        enumerate(seed, 0, u64::MAX, b"").err(),
        Some(Error::LengthOverflow(u64::MAX))
    );
}

#[test]
fn test_par_enumerate_matches_sequential() {
    let seed = openssl::sha::sha1(b"some secret prefix");
    let attacker = random_bytes(77);

    let sequential: Vec<_> = enumerate(seed, 0, 200, &attacker).unwrap().collect();
    let parallel = par_enumerate(seed, 0, 200, &attacker).unwrap();
    assert_eq!(sequential, parallel);

    assert!(matches!(
        par_enumerate(seed, 1, 0, &attacker),
        Err(Error::InvalidRange { .. })
    ));
}

#[test]
fn test_empty_prefix_line() {
    use crate::encode::hex::digest_from_hex;

    let seed = digest_from_hex(EMPTY_SHA1).unwrap();
    let results: Vec<_> = enumerate(seed, 0, 0, b"").unwrap().collect();
    assert_eq!(results.len(), 1);

    let result = &results[0];
    let mut block = vec![0u8; 64];
    block[0] = 0x80;
    assert_eq!(result.suffix, block);
    assert_eq!(result.digest, openssl::sha::sha1(&block));
    assert_eq!(
        result.to_string(),
        format!(
            "0: c80b973c1157a7fe4f4150ad4c2a932494bf7bc7 \\x80{}",
            "\\x00".repeat(63)
        )
    );
}

#[test]
fn test_suffix_unescapes() {
    use crate::encode::escape::from_escaped;

    let seed = openssl::sha::sha1(b"k");
    let attacker: Vec<u8> = (0..=255u8).collect();
    for result in enumerate(seed, 0, 3, &attacker).unwrap() {
        let line = result.to_string();
        let escaped = line.rsplit(' ').next().unwrap();
        assert_eq!(from_escaped(escaped.as_bytes()).unwrap(), result.suffix);
    }
}

#[test]
fn test_length_extender_forges_mac() {
    use crate::digest::mac;

    const SECRET_KEY: &[u8; 10] = b"SECRET KEY";
    let msg = b"comment1=cooking%20MCs;userdata=foo";
    let target = mac::<Sha1Core>(SECRET_KEY, msg);

    let mut extender =
        LengthExtender::<Sha1Core>::new(SECRET_KEY.len() as u64, msg, target).unwrap();
    extender.update(b";admin=true");
    let (tamper_msg, tamper_hash) = extender.finalize();

    assert!(tamper_msg.starts_with(msg));
    assert!(tamper_msg.ends_with(b";admin=true"));
    assert_eq!(mac::<Sha1Core>(SECRET_KEY, &tamper_msg), tamper_hash);
    assert_eq!(
        to_hex(&tamper_hash),
        "59858bb36377c840888bad20643eb6c313eb48dd"
    );
}
