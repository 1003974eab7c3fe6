use crate::oracle::{CipherOracle, SymbolWidth};

pub const GFN_NIBBLES: usize = 16;
pub const GFN_KEY_BYTES: usize = 10;

const KEY_NIBBLES: usize = 2 * GFN_KEY_BYTES;
const SBOX: [u8; 16] = [
    0xc, 0x0, 0xf, 0xa, 0x2, 0xb, 0x9, 0x5, 0x8, 0x3, 0xd, 0x7, 0x1, 0xe, 0x6, 0x4,
];
// Nibble i moves to position SHUFFLE[i].
const SHUFFLE: [usize; 16] = [5, 0, 1, 4, 7, 12, 3, 8, 13, 6, 9, 2, 15, 10, 11, 14];

/*
A 64-bit type-II generalized Feistel network over 16 nibbles with an 80-bit key.
Each round computes x[2j+1] ^= S(x[2j] ^ rk[j]) for j in 0..8 and shuffles the nibbles, except after the last round.
*/
pub struct Gfn {
    rounds: usize,
}

impl Gfn {
    pub fn new(rounds: usize) -> Self {
        Self { rounds }
    }
}

/* The 80-bit key register as 20 nibbles, rotated by three nibbles and refreshed through the S-box every round. */
fn gfn_round_keys(key: &[u8], rounds: usize) -> Vec<[u8; 8]> {
    let mut reg: Vec<u8> = key
        .iter()
        .flat_map(|b| [b >> 4, b & 0xf])
        .take(KEY_NIBBLES)
        .collect();
    reg.resize(KEY_NIBBLES, 0);

    let mut round_keys = Vec::with_capacity(rounds);
    for r in 0..rounds {
        let mut rk = [0u8; 8];
        rk.copy_from_slice(&reg[..8]);
        round_keys.push(rk);

        reg.rotate_left(3);
        reg[0] = SBOX[reg[0] as usize];
        reg[16] = SBOX[reg[16] as usize];
        reg[1] ^= ((r + 1) & 0xf) as u8;
        reg[2] ^= (((r + 1) >> 4) & 0xf) as u8;
    }
    round_keys
}

/* The Feistel layer is an involution. */
fn feistel_layer(block: &mut [u8], rk: &[u8; 8]) {
    for j in 0..8 {
        block[2 * j + 1] ^= SBOX[(block[2 * j] ^ rk[j]) as usize];
    }
}

fn shuffle(block: &mut [u8]) {
    let mut out = [0u8; GFN_NIBBLES];
    for (i, nibble) in block.iter().enumerate() {
        out[SHUFFLE[i]] = *nibble;
    }
    block.copy_from_slice(&out);
}

fn unshuffle(block: &mut [u8]) {
    let mut out = [0u8; GFN_NIBBLES];
    for (i, nibble) in out.iter_mut().enumerate() {
        *nibble = block[SHUFFLE[i]];
    }
    block.copy_from_slice(&out);
}

impl CipherOracle for Gfn {
    type RoundKeys = Vec<[u8; 8]>;

    fn name(&self) -> &'static str {
        "GFN"
    }

    fn rounds(&self) -> usize {
        self.rounds
    }

    fn block_symbols(&self) -> usize {
        GFN_NIBBLES
    }

    fn symbol_width(&self) -> SymbolWidth {
        SymbolWidth::Nibble
    }

    fn key_bytes(&self) -> usize {
        GFN_KEY_BYTES
    }

    fn key_schedule(&self, key: &[u8]) -> Vec<[u8; 8]> {
        gfn_round_keys(key, self.rounds)
    }

    fn encrypt(&self, block: &mut [u8], round_keys: &Vec<[u8; 8]>) {
        for (r, rk) in round_keys.iter().enumerate() {
            feistel_layer(block, rk);
            if r + 1 != round_keys.len() {
                shuffle(block);
            }
        }
    }

    fn decrypt(&self, block: &mut [u8], round_keys: &Vec<[u8; 8]>) {
        for (r, rk) in round_keys.iter().enumerate().rev() {
            if r + 1 != round_keys.len() {
                unshuffle(block);
            }
            feistel_layer(block, rk);
        }
    }
}

/// One-nibble identity cipher. Every boomerang returns.
pub struct Identity;

impl CipherOracle for Identity {
    type RoundKeys = ();

    fn name(&self) -> &'static str {
        "Identity"
    }

    fn rounds(&self) -> usize {
        0
    }

    fn block_symbols(&self) -> usize {
        1
    }

    fn symbol_width(&self) -> SymbolWidth {
        SymbolWidth::Nibble
    }

    fn key_bytes(&self) -> usize {
        0
    }

    fn key_schedule(&self, _key: &[u8]) {}

    fn encrypt(&self, _block: &mut [u8], _round_keys: &()) {}

    fn decrypt(&self, _block: &mut [u8], _round_keys: &()) {}
}
