use bytes::{BufMut, BytesMut};

use crate::digest::{sha1::Sha1Core, HashAlgorithm};
use crate::error::{Error, Result};

/// Size of the big-endian bit-count field closing every padded message.
pub const LENGTH_FIELD: usize = 8;

/// Separator byte opening the Merkle-Damgard padding.
pub const SEPARATOR: u8 = 0x80;

/// Number of zero bytes needed after `tail` message bytes and the separator so that the length field ends on a block boundary.
pub fn zero_run(tail: usize, block_size: usize, len_field: usize) -> usize {
    (block_size - (tail % block_size + 1 + len_field) % block_size) % block_size
}

/// Merkle-Damgard padding for a message of a hypothesized length :
///  - 0x80 separator
///  - zero_pad_len zero bytes
///  - big-endian bit-count of the message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaddingSpec {
    length: u64,
    len_field: usize,
    zero_pad_len: usize,
    bit_len: u64,
}

impl PaddingSpec {
    /// Padding for the SHA-1 layout (64 byte blocks, 8 byte length field).
    pub fn compute(length: u64) -> Result<Self> {
        Self::with_layout(length, Sha1Core::BUFFERLEN, LENGTH_FIELD)
    }

    /// Padding for an arbitrary block / length-field layout.
    /// Fails with LengthOverflow whenever the padded bit count no longer fits into 64 bits.
    pub fn with_layout(length: u64, block_size: usize, len_field: usize) -> Result<Self> {
        assert!(block_size > len_field, "length field must fit into one block");

        let overflow = || Error::LengthOverflow(length);
        let block = block_size as u64;

        let bit_len = length.checked_mul(8).ok_or_else(overflow)?;
        let n_blocks = length
            .checked_add(len_field as u64 + 1)
            .and_then(|v| v.checked_add(block - 1))
            .ok_or_else(overflow)?
            / block;
        let padded_len = n_blocks.checked_mul(block).ok_or_else(overflow)?;
        // the extension resumes with a bit counter of padded_len * 8
        padded_len.checked_mul(8).ok_or_else(overflow)?;

        let zero_pad_len = (padded_len - length - len_field as u64 - 1) as usize;
        debug_assert_eq!(
            zero_pad_len,
            zero_run((length % block) as usize, block_size, len_field)
        );

        Ok(Self {
            length,
            len_field,
            zero_pad_len,
            bit_len,
        })
    }

    /// SHA-1 layout for a length already known to be in range (see `compute`).
    pub(crate) fn unchecked(length: u64) -> Self {
        let block_size = Sha1Core::BUFFERLEN;
        Self {
            length,
            len_field: LENGTH_FIELD,
            zero_pad_len: zero_run((length % block_size as u64) as usize, block_size, LENGTH_FIELD),
            bit_len: length.wrapping_mul(8),
        }
    }

    /// Hypothesized byte length of the unknown message.
    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn zero_pad_len(&self) -> usize {
        self.zero_pad_len
    }

    /// Bit count written into the length field, `length * 8`.
    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    /// Number of padding bytes, separator and length field included.
    pub fn len(&self) -> usize {
        1 + self.zero_pad_len + self.len_field
    }

    /// Message length plus padding, always a multiple of the block size.
    pub fn padded_len(&self) -> u64 {
        self.length + self.len() as u64
    }

    /// Appends the padding bytes to the buffer.
    pub fn put(&self, buf: &mut BytesMut) {
        let len = self.bit_len.to_be_bytes();

        buf.put_u8(SEPARATOR);
        buf.put_bytes(0x00, self.zero_pad_len);
        if self.len_field >= len.len() {
            buf.put_bytes(0x00, self.len_field - len.len());
            buf.put(&len[..]);
        } else {
            buf.put(&len[len.len() - self.len_field..]);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.len());
        self.put(&mut buf);
        buf.to_vec()
    }
}

#[test]
fn test_zero_pad_len_boundary() {
    for length in 0..=512u64 {
        let spec = PaddingSpec::compute(length).unwrap();
        assert_eq!(
            spec.zero_pad_len() == 0,
            length % 64 == 55,
            "unexpected zero run for length {length}"
        );
    }
}

#[test]
fn test_padded_len_is_block_aligned() {
    for length in 0..=512u64 {
        let spec = PaddingSpec::compute(length).unwrap();
        assert_eq!(spec.padded_len() % 64, 0);
        assert_eq!(spec.to_bytes().len(), spec.len());
        assert!(spec.len() >= 9 && spec.len() <= 72);
    }
}

#[test]
fn test_zero_run_agrees() {
    for length in 0..=256u64 {
        let spec = PaddingSpec::compute(length).unwrap();
        assert_eq!(spec.zero_pad_len(), zero_run(length as usize, 64, LENGTH_FIELD));
    }
}

#[test]
fn test_padding_bytes() {
    let spec = PaddingSpec::compute(0).unwrap();
    assert_eq!(spec.zero_pad_len(), 55);
    assert_eq!(spec.to_bytes(), [&[0x80u8][..], &[0u8; 63][..]].concat());

    let spec = PaddingSpec::compute(55).unwrap();
    assert_eq!(spec.to_bytes(), vec![0x80, 0, 0, 0, 0, 0, 0, 0x01, 0xb8]);

    let spec = PaddingSpec::compute(56).unwrap();
    assert_eq!(spec.zero_pad_len(), 63);
    assert_eq!(spec.padded_len(), 128);
    assert_eq!(&spec.to_bytes()[64..], &[0, 0, 0, 0, 0, 0, 0x01, 0xc0]);
}

#[test]
fn test_other_layout() {
    // MD-style 128 byte blocks with a 16 byte length field
    let spec = PaddingSpec::with_layout(3, 128, 16).unwrap();
    assert_eq!(spec.padded_len(), 128);
    let bytes = spec.to_bytes();
    assert_eq!(bytes.len(), 125);
    assert_eq!(&bytes[bytes.len() - 16..bytes.len() - 1], &[0u8; 15]);
    assert_eq!(bytes[bytes.len() - 1], 24);
}

#[test]
fn test_length_overflow() {
    assert_eq!(
        PaddingSpec::compute(u64::MAX),
        Err(Error::LengthOverflow(u64::MAX))
    );
    assert_eq!(
        PaddingSpec::compute(u64::MAX / 8),
        Err(Error::LengthOverflow(u64::MAX / 8))
    );
    assert!(PaddingSpec::compute(u64::MAX / 8 - 128).is_ok());
}

#[test]
fn test_length_field_carries_bit_count() {
    for length in [0u64, 3, 55, 56, 1000] {
        let spec = PaddingSpec::compute(length).unwrap();
        assert_eq!(spec.length(), length);
        assert_eq!(spec.bit_len(), length * 8);
        assert_eq!(
            spec.to_bytes()[spec.len() - LENGTH_FIELD..],
            spec.bit_len().to_be_bytes()
        );
        assert_eq!(PaddingSpec::unchecked(length), spec);
    }
}
