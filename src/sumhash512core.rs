use core::fmt;

use digest::{
    block_buffer::Eager,
    core_api::{
        AlgorithmName, Buffer, BufferKindUser, CoreWrapper, FixedOutputCore, UpdateCore,
    },
    crypto_common::{Block, BlockSizeUser},
    typenum::U64,
    HashMarker, Output, OutputSizeUser, Reset,
};

use crate::compress::{algorand_matrix, Compressor, Matrix};
use crate::sumhash512::{BitCounter, Chain, SALT_SIZE};

/// Sumhash512Hasher is sumhash512 over the Algorand matrix behind the `digest` traits.
pub type Sumhash512Hasher = CoreWrapper<Sumhash512Core>;

/// Sumhash512Core is the block-level sumhash512 state used by [`CoreWrapper`].
/// Buffering of partial blocks is left to the wrapper.
#[derive(Clone)]
pub struct Sumhash512Core<C: Compressor = &'static Matrix> {
    chain: Chain<C>,
    count: BitCounter, // bytes compressed so far, in bits
}

impl Sumhash512Core {
    /// new_with_salt returns a core over the Algorand matrix in salted mode.
    pub fn new_with_salt(salt: [u8; SALT_SIZE]) -> Self {
        Self::with_compressor(algorand_matrix(), Some(salt))
    }
}

impl Default for Sumhash512Core {
    fn default() -> Self {
        Self::with_compressor(algorand_matrix(), None)
    }
}

impl<C: Compressor> Sumhash512Core<C> {
    /// with_compressor returns a core hashing with a custom compressor, salted if salt is set.
    pub fn with_compressor(c: C, salt: Option<[u8; SALT_SIZE]>) -> Self {
        let mut s = Self {
            chain: Chain::new(c, salt),
            count: BitCounter::default(),
        };
        if s.chain.salt.is_some() {
            s.compress_block(&[0; SALT_SIZE]);
        }
        s
    }

    fn compress_block(&mut self, data: &[u8]) {
        self.count.add_bytes(data.len() as u64);
        self.chain.compress_block(data);
    }
}

impl<C: Compressor> Reset for Sumhash512Core<C> {
    fn reset(&mut self) {
        *self = Self::with_compressor(self.chain.c.clone(), self.chain.salt);
    }
}

impl<C: Compressor> HashMarker for Sumhash512Core<C> {}

impl<C: Compressor> BlockSizeUser for Sumhash512Core<C> {
    type BlockSize = U64;
}

impl<C: Compressor> BufferKindUser for Sumhash512Core<C> {
    type BufferKind = Eager;
}

impl<C: Compressor> OutputSizeUser for Sumhash512Core<C> {
    type OutputSize = U64;
}

impl<C: Compressor> FixedOutputCore for Sumhash512Core<C> {
    fn finalize_fixed_core(&mut self, buffer: &mut Buffer<Self>, out: &mut Output<Self>) {
        let mut bitlen = self.count; // number of input bits written
        bitlen.add_bytes(buffer.get_pos() as u64);

        let chain = &mut self.chain;
        buffer.digest_pad(0x80, &bitlen.to_le_bytes(), |b| chain.compress_block(b));

        out.copy_from_slice(&self.chain.digest());
    }
}

impl<C: Compressor> UpdateCore for Sumhash512Core<C> {
    fn update_blocks(&mut self, blocks: &[Block<Self>]) {
        for b in blocks {
            self.compress_block(b)
        }
    }
}

impl<C: Compressor> AlgorithmName for Sumhash512Core<C> {
    fn write_alg_name(f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sumhash512")
    }
}

impl<C: Compressor> fmt::Debug for Sumhash512Core<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sumhash512Core { ... }")
    }
}

#[cfg(test)]
pub mod test {
    use std::io::Write;

    use super::*;
    use crate::sumhash512::{hash, hash_salted, Sumhash512};
    use digest::{Digest, FixedOutput, FixedOutputReset, Update};
    use sha3::{
        digest::{ExtendableOutput, XofReader},
        Shake256,
    };

    fn shake(seed: &str, out: &mut [u8]) {
        let mut v = Shake256::default();
        Update::update(&mut v, seed.as_bytes());
        v.finalize_xof().read(out);
    }

    #[test]
    fn test_vector() {
        for (input, output) in [
            ("", "0e7698f535975ebaf1fdcd38819589aa9906595ea9e86c73aded6964651d869a2c1579fbdd9c977ec5f5fc3b61749db57cad898f80f5c69f9a8f013cb7aafedc"),
            ("abc", "3fb641e5b7ffdce77abf80104b458dab1a0012729d158f4dac96a43993b26ad1b58261f090e50b20e242d02e531834aa5a76c5a99ab2e49d01b282eceeae6ec8"),
            ("You must be the change you wish to see in the world. -Mahatma Gandhi", "2495462abaa3b2eaa84b32eae9d97e1031dfde9cfebe78e8de1df110a0f1a80f918e4f652b8f6c754698413ebbfac41f74ec1a25111769a7633151e49b90ecfe"),
        ] {
            let mut h = Sumhash512Hasher::default();
            Update::update(&mut h, input.as_bytes());

            let sum = hex::encode(h.finalize_fixed());
            assert_eq!(
                output, sum,
                "test vector mismatched for {:?}! got {}, want {}",
                input, sum, output
            );
        }
    }

    #[test]
    fn sumhash512() {
        let mut input = [0; 6000];
        shake("sumhash input", &mut input);

        let sum = hex::encode(Sumhash512Hasher::digest(input));
        let expected_sum = "1ad6dafe03f330e06554300ecc24a59d41ec6afe387c34f4d9a2d971e71ae751823f520135cdc766ba7886a0a2a8954fd17ecae64f58e4431e572571e0f0a9aa";
        assert_eq!(sum, expected_sum, "got {}, want {}", sum, expected_sum)
    }

    #[test]
    fn sumhash512_salt() {
        let mut input = [0; 6000];
        shake("sumhash input", &mut input);
        let mut salt = [0; 64];
        shake("sumhash salt", &mut salt);

        let mut h = CoreWrapper::from_core(Sumhash512Core::new_with_salt(salt));
        Update::update(&mut h, &input);

        let sum = hex::encode(h.finalize_fixed());
        let expected_sum = "bc0f4251957352da5102970a32ecad694d88e9f9c4230a2b13d2c7037107245e64e1f7e7dbeca625e2f7d1cd5f63d9070e0255b687301ade29fab952dd44abc7";
        assert_eq!(sum, expected_sum, "got {}, want {}", sum, expected_sum);
    }

    #[test]
    fn sumhash512_reset() {
        let mut input = [0; 6000];
        shake("sumhash", &mut input);

        let mut h = Sumhash512Hasher::default();
        h.write_all(&input).unwrap();
        Update::update(&mut h, &input);

        shake("sumhash input", &mut input);
        Reset::reset(&mut h);
        Update::update(&mut h, &input);

        let sum = hex::encode(h.finalize_fixed_reset());
        let expected_sum = "1ad6dafe03f330e06554300ecc24a59d41ec6afe387c34f4d9a2d971e71ae751823f520135cdc766ba7886a0a2a8954fd17ecae64f58e4431e572571e0f0a9aa";
        assert_eq!(sum, expected_sum, "got {}, want {}", sum, expected_sum);

        // finalize_fixed_reset leaves a fresh state behind
        Update::update(&mut h, b"abc");
        assert_eq!(h.finalize_fixed().as_slice(), hash(b"abc").as_slice());
    }

    #[test]
    fn salted_reset() {
        let salt = [0xa5; SALT_SIZE];
        let mut h = CoreWrapper::from_core(Sumhash512Core::new_with_salt(salt));
        Update::update(&mut h, b"discarded");
        Reset::reset(&mut h);
        Update::update(&mut h, b"kept");
        assert_eq!(h.finalize_fixed().as_slice(), hash_salted(b"kept", &salt).as_slice());
    }

    #[test]
    fn matches_streaming_state() {
        let mut input = [0; 300];
        shake("core and state", &mut input);
        let salt = [0x3c; SALT_SIZE];

        (0..=input.len()).for_each(|l| {
            let msg = &input[..l];

            let plain = Sumhash512Hasher::digest(msg);
            assert_eq!(plain.as_slice(), hash(msg).as_slice(), "length {}", l);

            let mut h = CoreWrapper::from_core(Sumhash512Core::new_with_salt(salt));
            Update::update(&mut h, msg);
            assert_eq!(
                h.finalize_fixed().as_slice(),
                hash_salted(msg, &salt).as_slice(),
                "salted length {}",
                l
            );
        });
    }

    #[test]
    fn split_updates() {
        let mut input = [0; 1000];
        shake("split", &mut input);

        let mut h = Sumhash512Hasher::new();
        let mut s = Sumhash512::new();
        for chunk in input.chunks(37) {
            Digest::update(&mut h, chunk);
            s.update(chunk);
        }
        assert_eq!(h.finalize().as_slice(), s.finalize().as_slice());
    }

    #[test]
    fn algorithm_name() {
        let h = Sumhash512Hasher::default();
        assert!(format!("{:?}", h).starts_with("Sumhash512"));
        assert_eq!(format!("{:?}", Sumhash512Core::default()), "Sumhash512Core { ... }");
    }
}
