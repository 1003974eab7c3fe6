use std::io;
use std::iter::Sum;
use std::ops::Add;
use std::time::{Duration, Instant};

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::difference::Difference;
use crate::error::{LabError, Result};
use crate::keylog::KeyLog;
use crate::oracle::CipherOracle;
use crate::report::Probability;
use crate::trial::{bunch, Distinguisher};

/* Log progress when (bunch & STEP) == 0. */
pub const STEP: u64 = (1 << 10) - 1;

pub type WorkerSeed = [u8; 32];

/// N1 workers, N2 bunches per worker, N3 trials per bunch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Counts {
    pub workers: usize,
    pub bunches: u64,
    pub trials: u64,
}

impl Counts {
    pub fn per_experiment(&self) -> u128 {
        self.workers as u128 * self.bunches as u128 * self.trials as u128
    }
}

/// What a single worker threw and got back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerTally {
    pub worker: usize,
    pub bunches: u64,
    pub returned: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub thrown: u128,
    pub returned: u128,
}

impl Tally {
    pub fn probability(&self) -> Probability {
        Probability::estimate(self.returned as f64, self.thrown as f64)
    }
}

impl Add for Tally {
    type Output = Tally;

    fn add(self, other: Tally) -> Tally {
        Tally {
            thrown: self.thrown + other.thrown,
            returned: self.returned + other.returned,
        }
    }
}

impl Sum for Tally {
    fn sum<I: Iterator<Item = Tally>>(iter: I) -> Tally {
        iter.fold(Tally::default(), |a, b| a + b)
    }
}

/* Sum the private worker slots once every worker has joined. */
pub fn reduce(slots: &[WorkerTally], trials: u64) -> Tally {
    slots
        .iter()
        .map(|slot| Tally {
            thrown: slot.bunches as u128 * trials as u128,
            returned: slot.returned as u128,
        })
        .sum()
}

/* One independent seed per worker, drawn from the run's master generator. */
pub fn worker_seeds<R: Rng + ?Sized>(master: &mut R, workers: usize) -> Vec<WorkerSeed> {
    (0..workers)
        .map(|_| {
            let mut seed = WorkerSeed::default();
            master.fill_bytes(&mut seed);
            seed
        })
        .collect()
}

/// The read-only part of a run, shared by every worker.
#[derive(Clone, Copy, Debug)]
pub struct Job<'a> {
    pub distinguisher: Distinguisher,
    pub counts: Counts,
    pub dp: &'a Difference,
    pub dc: &'a Difference,
}

/* Run `bunches` bunches for one worker, drawing keys and plaintexts from rng. */
pub fn run_bunches<C: CipherOracle, R: Rng + ?Sized>(
    cipher: &C,
    job: &Job,
    worker: usize,
    bunches: u64,
    rng: &mut R,
    key_log: Option<&KeyLog>,
) -> io::Result<WorkerTally> {
    let trials = job.counts.trials;
    let mut returned = 0;
    for j in 0..bunches {
        let outcome = bunch(cipher, job.distinguisher, trials, job.dp, job.dc, rng);
        returned += outcome.returned;
        if let Some(log) = key_log {
            log.record(&outcome.key, outcome.returned, trials)?;
        }
        if (j & STEP) == 0 {
            info!(worker, bunch = j, of = bunches, "bunch progress");
        }
    }
    Ok(WorkerTally {
        worker,
        bunches,
        returned,
    })
}

/* Run all bunches of one worker with its own generator. */
pub fn run_worker<C: CipherOracle>(
    cipher: &C,
    job: &Job,
    worker: usize,
    seed: WorkerSeed,
    key_log: Option<&KeyLog>,
) -> io::Result<WorkerTally> {
    let mut rng = ChaCha8Rng::from_seed(seed);
    run_bunches(cipher, job, worker, job.counts.bunches, &mut rng, key_log)
}

/* One experiment: every worker runs its bunches on a pool of counts.workers threads. */
pub fn send_boomerangs<C: CipherOracle>(
    cipher: &C,
    job: &Job,
    seeds: &[WorkerSeed],
    key_log: Option<&KeyLog>,
) -> Result<Tally> {
    let counts = &job.counts;
    if counts.workers == 0 || seeds.len() != counts.workers {
        return Err(LabError::Config(format!(
            "{} seeds for {} workers",
            seeds.len(),
            counts.workers
        )));
    }
    info!(
        rounds = cipher.rounds(),
        workers = counts.workers,
        bunches = counts.bunches,
        trials = counts.trials,
        total_log2 = format_args!("{:.2}", (counts.per_experiment() as f64).log2()),
        "throwing"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(counts.workers)
        .build()?;
    let wall = Instant::now();
    let cpu = cpu_time();

    let slots = pool.install(|| {
        seeds
            .par_iter()
            .enumerate()
            .map(|(worker, seed)| run_worker(cipher, job, worker, *seed, key_log))
            .collect::<io::Result<Vec<_>>>()
    })?;

    let cpu_secs = match (cpu, cpu_time()) {
        (Some(start), Some(end)) => end.saturating_sub(start).as_secs_f64(),
        _ => f64::NAN,
    };
    let tally = reduce(&slots, counts.trials);
    info!(
        returned = tally.returned,
        probability = %tally.probability().short(),
        wall_secs = format_args!("{:.4}", wall.elapsed().as_secs_f64()),
        cpu_secs = format_args!("{:.4}", cpu_secs),
        "experiment done"
    );
    Ok(tally)
}

/* Repeat the experiment with fresh worker seeds and sum the tallies. */
pub fn run_experiments<C: CipherOracle, R: Rng + ?Sized>(
    cipher: &C,
    job: &Job,
    experiments: u32,
    master: &mut R,
    key_log: Option<&KeyLog>,
) -> Result<Tally> {
    let mut total = Tally::default();
    for experiment in 0..experiments {
        debug!(experiment, of = experiments, "experiment start");
        let seeds = worker_seeds(master, job.counts.workers);
        total = total + send_boomerangs(cipher, job, &seeds, key_log)?;
    }
    Ok(total)
}

/* User plus system CPU time of the whole process. */
#[cfg(unix)]
pub fn cpu_time() -> Option<Duration> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: getrusage only writes into the provided struct.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: rc == 0 means the struct was filled in.
    let usage = unsafe { usage.assume_init() };
    let tv = |t: libc::timeval| {
        Duration::from_secs(t.tv_sec as u64) + Duration::from_micros(t.tv_usec as u64)
    };
    Some(tv(usage.ru_utime) + tv(usage.ru_stime))
}

#[cfg(not(unix))]
pub fn cpu_time() -> Option<Duration> {
    None
}
