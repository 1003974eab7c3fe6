use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{CipherKind, ExperimentConfig};
use crate::difference::Difference;
use crate::error::LabError;
use crate::oracle::SymbolWidth;
use crate::parallel::{run_experiments, Counts, Job};
use crate::report::{collect, Probability, ReportRecord};
use crate::tools::*;
use crate::toy::Identity;
use crate::trial::Distinguisher;

fn identity_config(dir: &std::path::Path) -> ExperimentConfig {
    ExperimentConfig {
        cipher: CipherKind::Identity,
        distinguisher: Distinguisher::Boomerang,
        rounds: 1,
        deg1: 3,
        deg2: 5,
        experiments: 2,
        workers: 2,
        dp: "0".to_owned(),
        dc: "0".to_owned(),
        per_key: false,
        output_dir: dir.to_owned(),
    }
}

#[test]
fn test_identity_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = identity_config(dir.path());
    let record = run_config(&config, 0xdeadbeef).unwrap();

    assert_eq!(record.thrown, 2 * 2 * (1 << 3) * (1 << 5));
    assert_eq!(record.returned, record.thrown);
    assert_eq!(record.probability(), Probability::Log2(0.0));
    assert_eq!(record.cipher, "Identity");

    let path = record.write_to(&config.output_dir, 4).unwrap();
    assert!(path.ends_with("result_1_4.txt"));
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.starts_with("Initial seed 0xDEADBEEF\n"));
    assert!(text.contains("Average probability = 2^(-0.0000)\n"));
    assert!(text.contains("Number of boomerangs thrown = 2^10\n"));
    assert!(text.contains("Number of boomerangs returned = 1024\n"));
}

#[test]
fn test_zero_trials_report_sentinel() {
    let zero = Difference::zero(SymbolWidth::Nibble, 1);
    let job = Job {
        distinguisher: Distinguisher::Boomerang,
        counts: Counts {
            workers: 1,
            bunches: 1,
            trials: 0,
        },
        dp: &zero,
        dc: &zero,
    };
    let mut master = ChaCha8Rng::seed_from_u64(0);
    let tally = run_experiments(&Identity, &job, 1, &mut master, None).unwrap();
    assert_eq!(tally.thrown, 0);
    assert_eq!(tally.returned, 0);

    let record = ReportRecord {
        seed: 0,
        rounds: 0,
        cipher: "Identity".to_owned(),
        title: "Boomerang".to_owned(),
        unit: "boomerangs".to_owned(),
        dp: zero.to_string(),
        dc: zero.to_string(),
        thrown: tally.thrown,
        returned: tally.returned,
    };
    assert_eq!(record.probability(), Probability::BelowThreshold);
    assert!(record
        .to_string()
        .contains("Average probability = 2^(-inf)\n"));
}

#[test]
fn test_seeded_gfn_runs_reproduce() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExperimentConfig {
        cipher: CipherKind::Gfn,
        rounds: 3,
        dp: "000000000000000a".to_owned(),
        dc: "00000000000000a0".to_owned(),
        deg1: 2,
        deg2: 8,
        ..identity_config(dir.path())
    };
    let first = run_config(&config, 17).unwrap();
    let second = run_config(&config, 17).unwrap();
    assert_eq!(first, second);
    assert!(first.returned <= first.thrown);
    assert_eq!(first.dp, "000000000000000a");
}

#[test]
fn test_aes_differential_runs() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExperimentConfig {
        cipher: CipherKind::Aes,
        distinguisher: Distinguisher::Differential,
        rounds: 1,
        dp: "00000000e20000000000000000000000".to_owned(),
        dc: "000000000000000000e2000000000000".to_owned(),
        deg1: 1,
        deg2: 6,
        experiments: 1,
        ..identity_config(dir.path())
    };
    let record = run_config(&config, 5).unwrap();
    assert_eq!(record.thrown, 2 * 2 * 64);
    assert!(record.returned <= record.thrown);
    assert_eq!(record.title, "Differential");
    assert!(record.to_string().contains("Number of pairs thrown = 2^8\n"));
}

#[test]
fn test_per_key_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExperimentConfig {
        per_key: true,
        ..identity_config(dir.path())
    };
    let record = run_config(&config, 9).unwrap();
    assert_eq!(record.returned, record.thrown);
    assert_eq!(record, run_config(&identity_config(dir.path()), 9).unwrap());
}

#[test]
fn test_malformed_difference_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExperimentConfig {
        cipher: CipherKind::Gfn,
        dp: "00000000".to_owned(),
        ..identity_config(dir.path())
    };
    assert!(matches!(
        run_config(&config, 0),
        Err(LabError::Difference(_))
    ));

    let config = ExperimentConfig {
        dc: "z".to_owned(),
        ..identity_config(dir.path())
    };
    assert!(matches!(
        run_config(&config, 0),
        Err(LabError::Difference(_))
    ));

    let config = ExperimentConfig {
        cipher: CipherKind::Aes,
        dp: format!("e2{}", " ".repeat(30)),
        dc: "000000000000000000e2000000000000".to_owned(),
        ..identity_config(dir.path())
    };
    assert!(matches!(
        run_config(&config, 0),
        Err(LabError::Difference(_))
    ));
}

#[test]
fn test_invalid_config_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExperimentConfig {
        workers: 0,
        ..identity_config(dir.path())
    };
    assert!(matches!(run_config(&config, 0), Err(LabError::Config(_))));
}

#[test]
fn test_tasks_collect() {
    let dir = tempfile::tempdir().unwrap();
    let config = identity_config(dir.path());
    for task in 0..3 {
        run_config(&config, task)
            .unwrap()
            .write_to(dir.path(), task)
            .unwrap();
    }
    let collected = collect(dir.path(), 1, 3).unwrap();
    assert_eq!(collected.files, 3);
    assert_eq!(collected.returned, 3 * 1024);
    assert_eq!(collected.probability(), Probability::Log2(0.0));
}

#[test]
fn test_init_seed() {
    assert!(init_seed(0).is_ok());
    assert!(init_seed(u32::MAX).is_ok());
}
