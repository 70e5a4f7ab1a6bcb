use std::{fmt, io};

use anyhow::{bail, Result};
use byteorder::{ByteOrder, LittleEndian};

use crate::compress::{algorand_matrix, Compressor, Matrix, INPUT_LEN, N_ROWS, OUTPUT_LEN};

/// The size in bytes of the sumhash checksum.
pub const DIGEST_SIZE: usize = OUTPUT_LEN;

/// Block size, in bytes, of the sumhash hash function.
pub const DIGEST_BLOCK_SIZE: usize = INPUT_LEN - OUTPUT_LEN;

/// Size in bytes of a salt. A salt is XORed into every block, so it is exactly one block long.
pub const SALT_SIZE: usize = DIGEST_BLOCK_SIZE;

// Bytes at the end of the last block which carry the message length in bits.
const LENGTH_FIELD_SIZE: usize = 16;

/// hash computes the unsalted sumhash512 digest of data.
pub fn hash(data: &[u8]) -> [u8; DIGEST_SIZE] {
    let mut h = Sumhash512::new();
    h.update(data);
    h.finalize()
}

/// hash_salted computes the sumhash512 digest of data in salted mode.
pub fn hash_salted(data: &[u8], salt: &[u8; SALT_SIZE]) -> [u8; DIGEST_SIZE] {
    let mut h = Sumhash512::new_with_salt(*salt);
    h.update(data);
    h.finalize()
}

/// BitCounter is the 128-bit count of message bits absorbed so far, kept as two 64-bit words.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitCounter {
    hi: u64,
    lo: u64,
}

impl BitCounter {
    /// add_bytes accounts for n more bytes, carrying into the high word when the low word overflows.
    pub fn add_bytes(&mut self, n: u64) {
        let (lo, carry) = self.lo.overflowing_add(n << 3);
        self.lo = lo;
        self.hi = self.hi.wrapping_add(n >> 61).wrapping_add(u64::from(carry));
    }

    /// bits returns the counter value.
    pub fn bits(&self) -> u128 {
        (u128::from(self.hi) << 64) | u128::from(self.lo)
    }

    /// to_le_bytes encodes the low word then the high word, both little-endian.
    pub fn to_le_bytes(&self) -> [u8; LENGTH_FIELD_SIZE] {
        let mut out = [0; LENGTH_FIELD_SIZE];
        LittleEndian::write_u64(&mut out[..8], self.lo);
        LittleEndian::write_u64(&mut out[8..], self.hi);
        out
    }

    // Number of bytes past the last block boundary.
    fn block_offset(&self) -> usize {
        ((self.lo >> 3) % DIGEST_BLOCK_SIZE as u64) as usize
    }
}

/// Chain holds the chaining value together with what is needed to advance it one block.
#[derive(Clone)]
pub(crate) struct Chain<C: Compressor> {
    pub(crate) c: C,
    h: [u64; N_ROWS], // hash chain (from last compression, or IV)
    pub(crate) salt: Option<[u8; SALT_SIZE]>,
}

impl<C: Compressor> Chain<C> {
    pub(crate) fn new(c: C, salt: Option<[u8; SALT_SIZE]>) -> Self {
        Self {
            c,
            h: [0; N_ROWS],
            salt,
        }
    }

    /// compress_block replaces the chain value with the compression of chain || block.
    /// The salt, if any, is applied to the block half only.
    pub(crate) fn compress_block(&mut self, block: &[u8]) {
        debug_assert_eq!(block.len(), DIGEST_BLOCK_SIZE);
        let mut cin = [0; INPUT_LEN];

        LittleEndian::write_u64_into(&self.h, &mut cin[..DIGEST_SIZE]);
        match self.salt {
            Some(ref salt) => cin[DIGEST_SIZE..]
                .iter_mut()
                .zip(block.iter().zip(salt.iter()))
                .for_each(|(val, (b, s))| *val = b ^ s),
            None => cin[DIGEST_SIZE..].copy_from_slice(block),
        }

        self.c.compress(&mut self.h, &cin);
    }

    pub(crate) fn digest(&self) -> [u8; DIGEST_SIZE] {
        let mut out = [0; DIGEST_SIZE];
        LittleEndian::write_u64_into(&self.h, &mut out);
        out
    }
}

/// Sumhash512 is a streaming sumhash512 computation.
///
/// Data is fed with [`update`](Self::update) in chunks of any size and the digest is
/// produced by [`finalize`](Self::finalize), which consumes the state. The result does not
/// depend on how the input was split between `update` calls.
///
/// A state is about 200 bytes plus the compressor handle and never allocates, so use one
/// per thread rather than sharing it.
#[derive(Clone)]
pub struct Sumhash512<C: Compressor = &'static Matrix> {
    chain: Chain<C>,
    count: BitCounter,
    buf: [u8; DIGEST_BLOCK_SIZE], // data written since last compression
}

impl Sumhash512 {
    /// new returns an unsalted state over the Algorand matrix.
    pub fn new() -> Self {
        Self::with_compressor(algorand_matrix())
    }

    /// new_with_salt returns a state over the Algorand matrix computing the hash in salted mode.
    pub fn new_with_salt(salt: [u8; SALT_SIZE]) -> Self {
        Self::with_compressor_and_salt(algorand_matrix(), salt)
    }

    /// new_with_salt_slice is [`new_with_salt`](Self::new_with_salt) for a salt whose length is
    /// only known at runtime. It fails unless the salt is exactly [`SALT_SIZE`] bytes.
    pub fn new_with_salt_slice(salt: &[u8]) -> Result<Self> {
        let salt: [u8; SALT_SIZE] = match salt.try_into() {
            Ok(salt) => salt,
            Err(_) => bail!("bad salt size: want {}, got {}", SALT_SIZE, salt.len()),
        };
        Ok(Self::new_with_salt(salt))
    }
}

impl Default for Sumhash512 {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Compressor> Sumhash512<C> {
    /// with_compressor returns an unsalted state hashing with a custom compressor.
    pub fn with_compressor(c: C) -> Self {
        Self::init(c, None)
    }

    /// with_compressor_and_salt returns a salted state hashing with a custom compressor.
    pub fn with_compressor_and_salt(c: C, salt: [u8; SALT_SIZE]) -> Self {
        Self::init(c, Some(salt))
    }

    fn init(c: C, salt: Option<[u8; SALT_SIZE]>) -> Self {
        let mut s = Self {
            chain: Chain::new(c, salt),
            count: BitCounter::default(),
            buf: [0; DIGEST_BLOCK_SIZE],
        };
        if s.chain.salt.is_some() {
            // Write an initial block of zeros, effectively
            // prepending the salt to the input.
            s.update(&[0; DIGEST_BLOCK_SIZE]);
        }
        s
    }

    /// update absorbs data.
    pub fn update(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        let r = self.count.block_offset();
        self.count.add_bytes(data.len() as u64);

        if data.len() < DIGEST_BLOCK_SIZE - r {
            self.buf[r..r + data.len()].copy_from_slice(data);
            return;
        }

        let (head, rest) = data.split_at(DIGEST_BLOCK_SIZE - r);
        self.buf[r..].copy_from_slice(head);
        self.chain.compress_block(&self.buf);

        let mut blocks = rest.chunks_exact(DIGEST_BLOCK_SIZE);
        for block in &mut blocks {
            self.chain.compress_block(block);
        }
        let tail = blocks.remainder();
        self.buf[..tail.len()].copy_from_slice(tail);
    }

    /// finalize pads the message, appends its length in bits and returns the digest.
    pub fn finalize(self) -> [u8; DIGEST_SIZE] {
        let mut out = [0; DIGEST_SIZE];
        self.finalize_into(&mut out);
        out
    }

    /// finalize_into is [`finalize`](Self::finalize) writing into a caller-provided buffer.
    pub fn finalize_into(mut self, out: &mut [u8; DIGEST_SIZE]) {
        let p = DIGEST_BLOCK_SIZE - LENGTH_FIELD_SIZE;

        // Padding. sumhash reads bits least significant first, so 0x80 is the
        // last bit of its byte.
        let r = self.count.block_offset();
        self.buf[r] = 0x80;
        if r < p {
            self.buf[r + 1..p].fill(0);
        } else {
            // No room left for the length field.
            self.buf[r + 1..].fill(0);
            self.chain.compress_block(&self.buf);
            self.buf[..p].fill(0);
        }

        self.buf[p..].copy_from_slice(&self.count.to_le_bytes());
        self.chain.compress_block(&self.buf);

        *out = self.chain.digest();
    }

    /// sum appends the digest of the data written so far to prefix.
    /// It does not change the underlying state, so more data can be written afterwards.
    pub fn sum(&self, mut prefix: Vec<u8>) -> Vec<u8> {
        prefix.extend_from_slice(&self.clone().finalize());
        prefix
    }

    /// reset discards everything written, returning the state to how it was created
    /// (salted states absorb their zero block again).
    pub fn reset(&mut self) {
        *self = Self::init(self.chain.c.clone(), self.chain.salt);
    }

    /// bit_len returns the number of bits absorbed so far, including the salting block.
    pub fn bit_len(&self) -> u128 {
        self.count.bits()
    }

    /// is_salted reports whether the state hashes in salted mode.
    pub fn is_salted(&self) -> bool {
        self.chain.salt.is_some()
    }
}

impl<C: Compressor> io::Write for Sumhash512<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<C: Compressor> fmt::Debug for Sumhash512<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sumhash512 { ... }")
    }
}
