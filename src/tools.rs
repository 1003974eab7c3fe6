use rand::prelude::*;
use rand::rngs::OsRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

/*
Glue between a configuration and one run: seeding, the oracle self-test, difference parsing, the experiments and the final record.
*/
use crate::aes_round::ReducedAes;
use crate::config::{CipherKind, ExperimentConfig};
use crate::difference::Difference;
use crate::error::Result;
use crate::keylog::KeyLog;
use crate::oracle::{self_test, CipherOracle};
use crate::parallel::{run_experiments, Job};
use crate::report::ReportRecord;
use crate::toy::{Gfn, Identity};
use crate::trial::Distinguisher;

/* Draw the initial seed from the OS and offset it by the task id, so tasks launched together diverge. */
pub fn init_seed(task_id: u32) -> Result<u32> {
    let mut bytes = [0u8; 4];
    OsRng.try_fill_bytes(&mut bytes)?;
    let seed = u32::from_le_bytes(bytes).wrapping_add(task_id);
    info!(seed = format_args!("0x{:08X}", seed), "PRNG initialized");
    Ok(seed)
}

/* Pick the oracle named by the configuration and run it. */
pub fn run_config(config: &ExperimentConfig, initial_seed: u32) -> Result<ReportRecord> {
    match config.cipher {
        CipherKind::Aes => run_task(&ReducedAes::new(config.rounds), config, initial_seed),
        CipherKind::Gfn => run_task(&Gfn::new(config.rounds), config, initial_seed),
        CipherKind::Identity => run_task(&Identity, config, initial_seed),
    }
}

/* Every random choice of the run derives from initial_seed. */
pub fn run_task<C: CipherOracle>(
    cipher: &C,
    config: &ExperimentConfig,
    initial_seed: u32,
) -> Result<ReportRecord> {
    config.validate()?;
    let dp = Difference::parse(&config.dp, cipher.symbol_width(), cipher.block_symbols())?;
    let dc = Difference::parse(&config.dc, cipher.symbol_width(), cipher.block_symbols())?;

    if dp.is_zero() && config.distinguisher == Distinguisher::Boomerang {
        warn!("input difference is zero, every boomerang returns");
    }

    let mut master = ChaCha8Rng::seed_from_u64(initial_seed as u64);
    self_test(cipher, &mut master)?;
    info!(cipher = cipher.name(), rounds = cipher.rounds(), "check decryption: true");

    let job = Job {
        distinguisher: config.distinguisher,
        counts: config.counts(),
        dp: &dp,
        dc: &dc,
    };
    let key_log = config.per_key.then(KeyLog::stdout);
    let tally = run_experiments(cipher, &job, config.experiments, &mut master, key_log.as_ref())?;

    if let Some(log) = &key_log {
        log.flush()?;
        if let Some((lowest, highest)) = log.range() {
            info!(
                lowest = format_args!("2^{:.3}", lowest),
                highest = format_args!("2^{:.3}", highest),
                "per-key range"
            );
        }
    }

    Ok(ReportRecord {
        seed: initial_seed,
        rounds: config.rounds,
        cipher: cipher.name().to_owned(),
        title: config.distinguisher.title().to_owned(),
        unit: config.distinguisher.unit().to_owned(),
        dp: dp.to_string(),
        dc: dc.to_string(),
        thrown: tally.thrown,
        returned: tally.returned,
    })
}
