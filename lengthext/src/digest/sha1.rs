use bytes::BufMut;

use super::{FromState, HashAlgorithm, Hasher};
use crate::padding::{zero_run, LENGTH_FIELD, SEPARATOR};

pub type Sha1 = Hasher<Sha1Core>;

/// SHA-1 engine state : five 32 bit registers and the number of bits absorbed so far (mod 2^64).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sha1Core {
    state: [u32; 5],
    bit_len: u64,
}

impl Default for Sha1Core {
    fn default() -> Self {
        Self {
            state: [0x67452301, 0xEFCDAB89, 0x98BADCFE, 0x10325476, 0xC3D2E1F0],
            bit_len: 0,
        }
    }
}

impl Sha1Core {
    /// Seeds the engine directly from registers and a bit counter.
    pub fn from_registers(state: [u32; 5], bit_len: u64) -> Self {
        Self { state, bit_len }
    }

    pub fn registers(&self) -> [u32; 5] {
        self.state
    }

    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }
}

impl HashAlgorithm for Sha1Core {
    const BUFFERLEN: usize = 64;
    type OUTPUT = [u8; 20];

    fn compress(&mut self, bytes: &[u8]) {
        assert_eq!(bytes.len(), Self::BUFFERLEN);

        let mut w = [0u32; 80];
        w.iter_mut()
            .zip(bytes.chunks_exact(4))
            .for_each(|(u, v)| *u = u32::from_be_bytes([v[0], v[1], v[2], v[3]]));

        for i in 16..80 {
            w[i] = (w[i - 3] ^ w[i - 8] ^ w[i - 14] ^ w[i - 16]).rotate_left(1)
        }

        let [mut a, mut b, mut c, mut d, mut e] = self.state;

        for (i, word) in w.iter().enumerate() {
            let (f, k) = match i {
                0..=19 => (ch(b, c, d), 0x5A827999),
                20..=39 => (parity(b, c, d), 0x6ED9EBA1),
                40..=59 => (maj(b, c, d), 0x8F1BBCDC),
                _ => (parity(b, c, d), 0xCA62C1D6),
            };
            let temp = a
                .rotate_left(5)
                .wrapping_add(f)
                .wrapping_add(e)
                .wrapping_add(k)
                .wrapping_add(*word);
            e = d;
            d = c;
            c = b.rotate_left(30);
            b = a;
            a = temp;
        }

        self.bit_len = self.bit_len.wrapping_add(Self::BUFFERLEN as u64 * 8);
        for (s, v) in self.state.iter_mut().zip([a, b, c, d, e]) {
            *s = s.wrapping_add(v);
        }
    }

    /// Pads the pending tail; the length field is derived from the bit counter only,
    /// which is what lets a forged counter stand in for an unknown prefix.
    fn padding(&self, buf: &mut bytes::BytesMut) {
        let len = self
            .bit_len
            .wrapping_add((buf.len() as u64).wrapping_mul(8))
            .to_be_bytes();
        let n_zeros = zero_run(buf.len(), Self::BUFFERLEN, LENGTH_FIELD);
        buf.put_u8(SEPARATOR);
        buf.put_bytes(0x00, n_zeros);
        buf.put(&len[..])
    }

    fn finalize(self) -> Self::OUTPUT {
        let mut bytes = [0u8; 20];
        bytes
            .iter_mut()
            .zip(self.state.map(|v| v.to_be_bytes()).concat())
            .for_each(|(u, v)| *u = v);
        bytes
    }
}

impl FromState for Sha1Core {
    fn from_state(hash: Self::OUTPUT, bit_len: u64) -> Self {
        let mut state = [0u32; 5];
        state
            .iter_mut()
            .zip(hash.chunks_exact(4))
            .for_each(|(v, chunks)| {
                *v = u32::from_be_bytes([chunks[0], chunks[1], chunks[2], chunks[3]])
            });
        Self::from_registers(state, bit_len)
    }
}

#[inline]
fn ch(b: u32, c: u32, d: u32) -> u32 {
    (b & c) | (!b & d)
}

#[inline]
fn parity(b: u32, c: u32, d: u32) -> u32 {
    b ^ c ^ d
}

#[inline]
fn maj(b: u32, c: u32, d: u32) -> u32 {
    (b & c) | (b & d) | (c & d)
}

#[test]
fn test_sha1() {
    use crate::encode::hex::to_hex;

    // test vectors again from wikipedia : https://en.wikipedia.org/wiki/SHA-1
    let mut hasher = Sha1::new();
    hasher.update(&b"The quick brown fox jumps over the lazy dog"[..]);
    let state = hasher.finalize();

    assert_eq!(to_hex(&state), "2fd4e1c67a2d28fced849ee1bb76e7391b93eb12");

    let mut hasher = Sha1::new();
    hasher.update(&b"The quick brown fox jumps over the lazy cog"[..]);
    let state = hasher.finalize();

    assert_eq!(to_hex(&state), "de9f2c7fd25e1b3afad3e85a0bd17d9b100db4b3");

    assert_eq!(
        to_hex(&Sha1::new().finalize()),
        "da39a3ee5e6b4b0d3255bfef95601890afd80709"
    );
}

#[test]
fn test_sha1_against_openssl() {
    // tails of 56..63 bytes spill the length field into an extra block
    for len in 0..200usize {
        let data: Vec<u8> = (0..len).map(|v| (v * 7 + 3) as u8).collect();

        let mut hasher = Sha1::new();
        for chunk in data.chunks(13) {
            hasher.update(chunk);
        }
        assert_eq!(hasher.finalize(), openssl::sha::sha1(&data), "length {len}");
    }
}

#[test]
fn test_from_state_keeps_registers() {
    let digest = openssl::sha::sha1(b"abc");
    let core = Sha1Core::from_state(digest, 512);

    assert_eq!(core.registers()[0], 0xa9993e36);
    assert_eq!(core.registers()[4], 0x9cd0d89d);
    assert_eq!(core.bit_len(), 512);
    assert_eq!(Sha1Core::from_registers(core.registers(), 512), core);
    assert_eq!(core.finalize(), digest);
}
