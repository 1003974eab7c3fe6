use rand::prelude::*;
use serde::Deserialize;

use crate::difference::Difference;
use crate::oracle::*;

/// Which return condition a trial checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Distinguisher {
    /// E(p1) ^ dc and E(p1 ^ dp) ^ dc decrypt to a pair with difference dp.
    Boomerang,
    /// E(p1) ^ E(p1 ^ dp) equals dc.
    Differential,
}

impl Distinguisher {
    pub fn title(self) -> &'static str {
        match self {
            Distinguisher::Boomerang => "Boomerang",
            Distinguisher::Differential => "Differential",
        }
    }

    /// What one trial throws, as written in result records.
    pub fn unit(self) -> &'static str {
        match self {
            Distinguisher::Boomerang => "boomerangs",
            Distinguisher::Differential => "pairs",
        }
    }

    pub fn run<C: CipherOracle, R: Rng + ?Sized>(
        self,
        cipher: &C,
        round_keys: &C::RoundKeys,
        trials: u64,
        dp: &Difference,
        dc: &Difference,
        rng: &mut R,
    ) -> u64 {
        match self {
            Distinguisher::Boomerang => boomerang(cipher, round_keys, trials, dp, dc, rng),
            Distinguisher::Differential => differential(cipher, round_keys, trials, dp, dc, rng),
        }
    }
}

/* Throw `trials` boomerangs under fixed round keys and count the returned ones. */
pub fn boomerang<C: CipherOracle, R: Rng + ?Sized>(
    cipher: &C,
    round_keys: &C::RoundKeys,
    trials: u64,
    dp: &Difference,
    dc: &Difference,
    rng: &mut R,
) -> u64 {
    let width = cipher.symbol_width();
    let len = cipher.block_symbols();
    debug_assert_eq!(dp.symbols().len(), len);
    debug_assert_eq!(dc.symbols().len(), len);
    let (mut x1, mut x2) = (vec![0u8; len], vec![0u8; len]);

    let mut returned = 0;
    for _ in 0..trials {
        // p1 random, p2 = p1 ^ dp
        rand_symbols(rng, &mut x1, width);
        x2.copy_from_slice(&x1);
        xor_symbols_assign(&mut x2, dp.symbols());

        // c3 = E(p1) ^ dc, c4 = E(p2) ^ dc
        cipher.encrypt(&mut x1, round_keys);
        cipher.encrypt(&mut x2, round_keys);
        xor_symbols_assign(&mut x1, dc.symbols());
        xor_symbols_assign(&mut x2, dc.symbols());

        // p3 = D(c3), p4 = D(c4)
        cipher.decrypt(&mut x1, round_keys);
        cipher.decrypt(&mut x2, round_keys);

        if x1
            .iter()
            .zip(&x2)
            .zip(dp.symbols())
            .all(|((a, b), d)| a ^ b == *d)
        {
            returned += 1;
        }
    }
    returned
}

/* Count the pairs with input difference dp that reach output difference dc. */
pub fn differential<C: CipherOracle, R: Rng + ?Sized>(
    cipher: &C,
    round_keys: &C::RoundKeys,
    trials: u64,
    dp: &Difference,
    dc: &Difference,
    rng: &mut R,
) -> u64 {
    let width = cipher.symbol_width();
    let len = cipher.block_symbols();
    debug_assert_eq!(dp.symbols().len(), len);
    debug_assert_eq!(dc.symbols().len(), len);
    let (mut x1, mut x2) = (vec![0u8; len], vec![0u8; len]);

    let mut hits = 0;
    for _ in 0..trials {
        rand_symbols(rng, &mut x1, width);
        x2.copy_from_slice(&x1);
        xor_symbols_assign(&mut x2, dp.symbols());

        cipher.encrypt(&mut x1, round_keys);
        cipher.encrypt(&mut x2, round_keys);

        if x1
            .iter()
            .zip(&x2)
            .zip(dc.symbols())
            .all(|((a, b), d)| a ^ b == *d)
        {
            hits += 1;
        }
    }
    hits
}

/// One key and its trial count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BunchOutcome {
    pub key: Vec<u8>,
    pub returned: u64,
}

/* Draw a fresh master key and run one bunch of trials under it. */
pub fn bunch<C: CipherOracle, R: Rng + ?Sized>(
    cipher: &C,
    distinguisher: Distinguisher,
    trials: u64,
    dp: &Difference,
    dc: &Difference,
    rng: &mut R,
) -> BunchOutcome {
    let mut key = vec![0u8; cipher.key_bytes()];
    rng.fill_bytes(&mut key);
    let round_keys = cipher.key_schedule(&key);

    let returned = distinguisher.run(cipher, &round_keys, trials, dp, dc, rng);
    BunchOutcome { key, returned }
}
