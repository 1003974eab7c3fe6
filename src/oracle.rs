use rand::prelude::*;

use crate::error::{LabError, Result};

/* Number of random blocks checked by the self-test. */
pub const SELF_TEST_BLOCKS: usize = 16;

/// Width of one block symbol. Blocks are stored one symbol per byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolWidth {
    Byte,
    Nibble,
}

impl SymbolWidth {
    pub fn mask(self) -> u8 {
        match self {
            SymbolWidth::Byte => 0xff,
            SymbolWidth::Nibble => 0x0f,
        }
    }

    /// Hex digits used to write one symbol.
    pub fn hex_digits(self) -> usize {
        match self {
            SymbolWidth::Byte => 2,
            SymbolWidth::Nibble => 1,
        }
    }
}

/// A reduced-round block cipher seen as an encryption/decryption oracle.
///
/// Blocks are slices of `block_symbols()` symbols, each masked to
/// `symbol_width()`. Both directions work in place.
pub trait CipherOracle: Sync {
    type RoundKeys: Send + Sync;

    fn name(&self) -> &'static str;

    fn rounds(&self) -> usize;

    fn block_symbols(&self) -> usize;

    fn symbol_width(&self) -> SymbolWidth;

    fn key_bytes(&self) -> usize;

    fn key_schedule(&self, key: &[u8]) -> Self::RoundKeys;

    fn encrypt(&self, block: &mut [u8], round_keys: &Self::RoundKeys);

    fn decrypt(&self, block: &mut [u8], round_keys: &Self::RoundKeys);
}

/* Fill a block with uniform symbols of the given width. */
pub fn rand_symbols<R: Rng + ?Sized>(rng: &mut R, block: &mut [u8], width: SymbolWidth) {
    rng.fill_bytes(block);
    let mask = width.mask();
    block.iter_mut().for_each(|s| *s &= mask);
}

pub fn xor_symbols_assign(a: &mut [u8], b: &[u8]) {
    a.iter_mut().zip(b).for_each(|(va, vb)| *va ^= *vb);
}

/* Check decrypt(encrypt(p)) == p under a random key before trusting the oracle. */
pub fn self_test<C: CipherOracle, R: Rng + ?Sized>(cipher: &C, rng: &mut R) -> Result<()> {
    let mut key = vec![0u8; cipher.key_bytes()];
    rng.fill_bytes(&mut key);
    let round_keys = cipher.key_schedule(&key);

    let mut block = vec![0u8; cipher.block_symbols()];
    for _ in 0..SELF_TEST_BLOCKS {
        rand_symbols(rng, &mut block, cipher.symbol_width());
        let expected = block.clone();
        cipher.encrypt(&mut block, &round_keys);
        cipher.decrypt(&mut block, &round_keys);
        if block != expected {
            return Err(LabError::SelfTest {
                cipher: cipher.name(),
                rounds: cipher.rounds(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;

    /* Encryption adds one to the first symbol, decryption forgets to undo it. */
    struct Broken;

    impl CipherOracle for Broken {
        type RoundKeys = ();

        fn name(&self) -> &'static str {
            "broken"
        }
        fn rounds(&self) -> usize {
            1
        }
        fn block_symbols(&self) -> usize {
            4
        }
        fn symbol_width(&self) -> SymbolWidth {
            SymbolWidth::Byte
        }
        fn key_bytes(&self) -> usize {
            0
        }
        fn key_schedule(&self, _key: &[u8]) {}
        fn encrypt(&self, block: &mut [u8], _: &()) {
            block[0] = block[0].wrapping_add(1);
        }
        fn decrypt(&self, _block: &mut [u8], _: &()) {}
    }

    #[test]
    fn test_self_test_rejects_broken_oracle() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        match self_test(&Broken, &mut rng) {
            Err(LabError::SelfTest { cipher, rounds }) => {
                assert_eq!(cipher, "broken");
                assert_eq!(rounds, 1);
            }
            other => panic!("expected self-test failure, got {other:?}"),
        }
    }

    #[test]
    fn test_rand_symbols_masked() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut block = [0u8; 64];
        rand_symbols(&mut rng, &mut block, SymbolWidth::Nibble);
        assert!(block.iter().all(|s| *s < 16));
        assert!(block.iter().any(|s| *s != 0));
    }

    #[test]
    fn test_xor_symbols() {
        let mut a = [0x0f, 0xf0, 0xaa];
        xor_symbols_assign(&mut a, &[0xff, 0xff, 0xaa]);
        assert_eq!(a, [0xf0, 0x0f, 0x00]);
    }
}
