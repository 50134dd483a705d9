//! Verdict classification (spec §4.1 step 5) and per-submission aggregation
//! (spec §4.2 "Aggregation"). Both are pure functions so P1/P7 (aggregation
//! correctness, classification determinism) can be unit tested without a
//! sandbox.

use olympus_common::Verdict;
use olympus_store::TestOutcome;

/// Signals the spec classifies as RE; anything else non-zero is UNK.
const RUNTIME_ERROR_SIGNALS: [i32; 3] = [1 /* SIGHUP */, 11 /* SIGSEGV */, 8 /* SIGFPE */];
const OOM_SIGNAL: i32 = 9; // SIGKILL

/// Normalizes a raw wait-status signal, which may be reported as the bare
/// signal number or as `128 + signal` (the shell/`$?` convention).
pub fn normalize_signal(raw: i32) -> i32 {
    if raw > 128 {
        raw - 128
    } else {
        raw
    }
}

/// Outcome of one sandboxed run, before string comparison.
pub enum RunOutcome<'a> {
    TimedOut,
    Killed { signal: i32 },
    Exited { code: i32, stdout: &'a str },
}

/// Classifies one test's outcome per §4.1 step 5.
pub fn classify(outcome: RunOutcome<'_>, expected_output: &str) -> Verdict {
    match outcome {
        RunOutcome::TimedOut => Verdict::Tle,
        RunOutcome::Killed { signal } => {
            let signal = normalize_signal(signal);
            if signal == OOM_SIGNAL {
                Verdict::Mle
            } else if RUNTIME_ERROR_SIGNALS.contains(&signal) {
                Verdict::Re
            } else {
                Verdict::Unk
            }
        }
        RunOutcome::Exited { code, stdout } => {
            if code != 0 {
                return Verdict::Unk;
            }
            if stdout.trim() == expected_output.trim() {
                Verdict::Ac
            } else {
                Verdict::Wa
            }
        }
    }
}

/// Result of the per-submission aggregation: `counts = 10 * N`,
/// `score = 10 * N_AC` (I2, P1).
pub struct Aggregate {
    pub score: i32,
    pub counts: i32,
    pub tests: Vec<TestOutcome>,
}

pub fn aggregate(results: &[(Verdict, f64, i32)]) -> Aggregate {
    let counts = 10 * results.len() as i32;
    let score = 10 * results.iter().filter(|(v, _, _)| v.is_accepted()).count() as i32;

    let tests = results
        .iter()
        .enumerate()
        .map(|(i, (verdict, wall_time_seconds, peak_rss_mib))| TestOutcome {
            ordinal: i as i32 + 1,
            verdict: verdict.as_str().to_string(),
            wall_time_seconds: *wall_time_seconds,
            peak_rss_mib: *peak_rss_mib,
        })
        .collect();

    Aggregate {
        score,
        counts,
        tests,
    }
}

/// All testcases report CE (spec §4.2 step 4c). CE counts as a successful
/// judge (§7): `status = SUCCESS`, `score = 0`.
pub fn all_compile_error(testcase_count: usize) -> Aggregate {
    let tests = (0..testcase_count)
        .map(|i| TestOutcome {
            ordinal: i as i32 + 1,
            verdict: Verdict::Ce.as_str().to_string(),
            wall_time_seconds: 0.0,
            peak_rss_mib: 0,
        })
        .collect();

    Aggregate {
        score: 0,
        counts: 10 * testcase_count as i32,
        tests,
    }
}
