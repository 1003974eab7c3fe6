use aes::hazmat::*;
use aes::Block;

use crate::oracle::{CipherOracle, SymbolWidth};

pub const AES_BLOCK_SIZE: usize = 16;

/*
Reduced-round AES on a 16-byte block.
    rk[0] is a whitening key, rk[1..=R] feed R full AES rounds (SubBytes, ShiftRows, MixColumns, AddRoundKey).
    rk[i] = aes_round(rk[i-1], RC_i), with RC_i the block whose first byte is i.
*/
pub struct ReducedAes {
    rounds: usize,
}

impl ReducedAes {
    pub fn new(rounds: usize) -> Self {
        Self { rounds }
    }
}

impl CipherOracle for ReducedAes {
    type RoundKeys = Vec<Block>;

    fn name(&self) -> &'static str {
        "AES"
    }

    fn rounds(&self) -> usize {
        self.rounds
    }

    fn block_symbols(&self) -> usize {
        AES_BLOCK_SIZE
    }

    fn symbol_width(&self) -> SymbolWidth {
        SymbolWidth::Byte
    }

    fn key_bytes(&self) -> usize {
        AES_BLOCK_SIZE
    }

    fn key_schedule(&self, key: &[u8]) -> Vec<Block> {
        let mut round_keys = Vec::with_capacity(self.rounds + 1);
        round_keys.push(Block::clone_from_slice(key));
        for i in 1..=self.rounds {
            let mut rc = zero_block();
            rc[0] = i as u8;
            round_keys.push(aes_enc(&round_keys[i - 1], &rc));
        }
        round_keys
    }

    fn encrypt(&self, block: &mut [u8], round_keys: &Vec<Block>) {
        let mut state = Block::clone_from_slice(block);
        xor_block_assign(&mut state, &round_keys[0]);
        for key in &round_keys[1..] {
            aes_forward(&mut state, key);
        }
        block.copy_from_slice(&state);
    }

    fn decrypt(&self, block: &mut [u8], round_keys: &Vec<Block>) {
        let mut state = Block::clone_from_slice(block);
        for key in round_keys[1..].iter().rev() {
            aes_backward(&mut state, key);
        }
        xor_block_assign(&mut state, &round_keys[0]);
        block.copy_from_slice(&state);
    }
}

#[inline]
pub fn aes_enc(block: &Block, key: &Block) -> Block {
    let mut res = block.to_owned();
    aes_forward(&mut res, key);
    res
}

#[inline]
pub fn aes_forward(block: &mut Block, key: &Block) {
    cipher_round(block, key);
}

#[inline]
pub fn aes_backward(block: &mut Block, key: &Block) {
    xor_block_assign(block, key);
    inv_mix_columns(block);
    equiv_inv_cipher_round(block, &zero_block());
    mix_columns(block);
}

#[inline]
pub fn zero_block() -> Block {
    Block::from([0u8; AES_BLOCK_SIZE])
}

pub fn xor_block_assign(a: &mut Block, b: &Block) {
    a.iter_mut().zip(b).for_each(|(va, vb)| *va ^= *vb);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::self_test;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_aes_round_inverse() {
        let key = Block::from(0x2923be84e16cd6ae529049f1f1bbe9ebu128.to_be_bytes());
        let input = Block::from(0x8747290a0d805e104a1ec8477e2fccd5u128.to_be_bytes());

        let mut output = input.to_owned();
        aes_forward(&mut output, &key);
        assert_ne!(input, output);
        aes_backward(&mut output, &key);

        assert_eq!(input, output);
    }

    #[test]
    fn test_key_schedule_length() {
        let cipher = ReducedAes::new(5);
        let round_keys = cipher.key_schedule(&[7u8; 16]);
        assert_eq!(round_keys.len(), 6);
        assert_eq!(round_keys[0], Block::from([7u8; 16]));
        assert_ne!(round_keys[1], round_keys[2]);
    }

    #[test]
    fn test_zero_rounds_is_whitening() {
        let cipher = ReducedAes::new(0);
        let round_keys = cipher.key_schedule(&[0x11; 16]);
        let mut block = [0x22u8; 16];
        cipher.encrypt(&mut block, &round_keys);
        assert_eq!(block, [0x33u8; 16]);
    }

    #[test]
    fn test_self_test_passes() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for rounds in [1, 4, 10] {
            self_test(&ReducedAes::new(rounds), &mut rng).unwrap();
        }
    }

    proptest! {
        #[test]
        fn prop_decrypt_inverts_encrypt(
            key in prop::array::uniform16(any::<u8>()),
            plain in prop::array::uniform16(any::<u8>()),
            rounds in 1usize..8,
        ) {
            let cipher = ReducedAes::new(rounds);
            let round_keys = cipher.key_schedule(&key);
            let mut block = plain;
            cipher.encrypt(&mut block, &round_keys);
            cipher.decrypt(&mut block, &round_keys);
            prop_assert_eq!(block, plain);
        }
    }
}
