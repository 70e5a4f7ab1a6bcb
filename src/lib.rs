#![warn(missing_docs)]
//! A Rust implementation of Algorand’s [sumhash512](https://github.com/algorand/go-sumhash), the subset-sum hash function with a
//! 64-byte output.
//!
//! Each 64-byte block is absorbed by compressing `chain || block` with an 8×1024 matrix of
//! 64-bit words: every set message bit selects a column, and the selected entries of each row
//! are summed modulo 2^64. Selection is done with masks, so compression runs in constant time.
//! The message is padded with a `0x80` byte and its 128-bit length in bits.
//!
//! In salted mode every block is XORed with a 64-byte salt, and an all-zero block is
//! absorbed up front.
//!
//! # Example
//! ```
//! use sumhash512::{hash, Sumhash512};
//!
//! let mut h = Sumhash512::new();
//! h.update("hello ".as_bytes());
//! h.update("world".as_bytes());
//! let output = h.finalize();
//! println!("Result: {}", hex::encode(output));
//!
//! assert_eq!(output, hash("hello world".as_bytes()));
//! ```
//!
//! The [`sumhash512core`] module plugs the same function into the RustCrypto `digest` traits:
//! ```
//! use digest::Digest;
//! use sumhash512::sumhash512core::Sumhash512Hasher;
//!
//! let output = Sumhash512Hasher::digest("hello world".as_bytes());
//! assert_eq!(output.as_slice(), sumhash512::hash("hello world".as_bytes()).as_slice());
//! ```
/// `compress` represents the compression function which is performed on a message.
pub mod compress;
/// `sumhash512` is the streaming hash state and the one-shot hash functions.
pub mod sumhash512;
/// `sumhash512core` implements the `digest` crate core traits for sumhash512.
pub mod sumhash512core;

pub use crate::sumhash512::{
    hash, hash_salted, Sumhash512, DIGEST_BLOCK_SIZE, DIGEST_SIZE, SALT_SIZE,
};
