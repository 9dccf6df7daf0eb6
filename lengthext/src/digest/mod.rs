use bytes::{Buf, BufMut, BytesMut};

pub mod sha1;

/// Incremental driver around a HashAlgorithm : buffers input and compresses every full block.
pub struct Hasher<H: HashAlgorithm> {
    core: H,
    buf: BytesMut,
}

/// Allows translation from a given hash and bit counter to reconstruct an internal state
pub trait FromState: HashAlgorithm {
    fn from_state(hash: Self::OUTPUT, bit_len: u64) -> Self;
}

/// Basic pattern for a HashAlgorithm
///  - compress for a BUFFERLEN bytes
///  - padding for less than BUFFERLEN bytes
///  - finalize for translating internal state to Hash
pub trait HashAlgorithm: Default {
    const BUFFERLEN: usize;
    type OUTPUT: Sized + Clone + Copy + AsRef<[u8]>;

    fn compress(&mut self, bytes: &[u8]);
    fn padding(&self, buf: &mut BytesMut);
    fn finalize(self) -> Self::OUTPUT;
}

/// Implements a basic Hasher for a given HashAlgorithm
impl<H: HashAlgorithm> Hasher<H> {
    pub fn new() -> Self {
        Self::with_core(H::default())
    }

    fn with_core(core: H) -> Self {
        Self {
            core,
            buf: BytesMut::with_capacity(2 * H::BUFFERLEN),
        }
    }

    pub fn update(&mut self, bytes: impl AsRef<[u8]>) {
        self.buf.put(bytes.as_ref());

        while let Some(block) = self.buf.get(0..H::BUFFERLEN) {
            self.core.compress(block);
            self.buf.advance(H::BUFFERLEN);
        }
    }

    pub fn finalize(mut self) -> H::OUTPUT {
        self.core.padding(&mut self.buf);
        while let Some(block) = self.buf.get(0..H::BUFFERLEN) {
            self.core.compress(block);
            self.buf.advance(H::BUFFERLEN);
        }
        debug_assert!(self.buf.is_empty());
        self.core.finalize()
    }
}

impl<H: HashAlgorithm> Default for Hasher<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: FromState> Hasher<H> {
    /// Resumes hashing as if `bit_len` bits had already been absorbed into a state that produced `hash`.
    pub fn from_state(hash: H::OUTPUT, bit_len: u64) -> Self {
        Self::with_core(H::from_state(hash, bit_len))
    }
}

/// Calculates the MAC of a given (secret) key and message : MAC(key, message) = H( key || message )
pub fn mac<H: HashAlgorithm>(key: &[u8], message: &[u8]) -> H::OUTPUT {
    let mut hasher = Hasher::<H>::new();
    hasher.update(key);
    hasher.update(message);
    hasher.finalize()
}

#[test]
fn test_mac_sha1() {
    use crate::encode::hex::to_hex;
    use sha1::Sha1Core;

    assert_eq!(
        to_hex(&mac::<Sha1Core>(b"SECRET KEY", b"comment1=cooking%20MCs;userdata=foo")),
        "9037e1602ac4a6e89ecf59c5e6be6c4040a36bd6"
    );
    assert_ne!(
        mac::<Sha1Core>(b"YELLOW SUBMARINE", b"MESSAGE"),
        mac::<Sha1Core>(b"YELLOW SUBMARINE", b"MESSAG")
    );
}
