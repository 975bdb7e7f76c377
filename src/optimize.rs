//! Quality search against a byte-size budget.
//!
//! [`optimize_quality`] runs a bounded binary search over quality 1–100,
//! calling a caller-supplied `measure` function that encodes at a quality
//! and reports the byte count. It is a heuristic with a fixed cost ceiling
//! of [`MAX_PROBES`] encodes, not an exact solver: real encoders are only
//! roughly monotonic in quality.
//!
//! ## Search rules
//!
//! - `mid = floor((low + high) / 2)`, measured once per probe.
//! - The running best is the probe closest to the target by absolute
//!   difference...
//! - ...except that every probe at or under the target is adopted as best
//!   unconditionally. The result is biased toward the highest quality that
//!   still fits, even when an over-target probe was closer. Keep this
//!   asymmetry: "fixing" it to pure closest-distance changes outputs.
//! - Over target searches the lower half, otherwise the upper half; stop
//!   when the range is empty.
//!
//! A final guard replaces pathological answers (quality under
//! [`MIN_ACCEPTABLE_QUALITY`], or still more than 1.5× over budget) with
//! [`FALLBACK_QUALITY`].

use crate::imaging::Quality;
use std::collections::HashMap;
use tracing::debug;

/// Upper bound on encodes per search.
pub const MAX_PROBES: u32 = 7;
/// Results below this quality are rejected by the guard.
pub const MIN_ACCEPTABLE_QUALITY: u32 = 15;
/// Quality used when the guard rejects the search result.
pub const FALLBACK_QUALITY: u32 = 80;
/// Quality reported when no probe runs.
const INITIAL_BEST: u32 = 90;
/// Default size budget in KB (1 KB = 1024 bytes).
pub const DEFAULT_TARGET_KB: u64 = 200;

/// Outcome of a quality search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityChoice {
    pub quality: Quality,
    /// Number of search probes (distinct encodes) performed.
    pub probes: u32,
    /// Encoded size at the search result, before any fallback.
    pub measured_bytes: u64,
    /// Whether the guard replaced the search result with [`FALLBACK_QUALITY`].
    pub fell_back: bool,
}

/// Search for a quality whose encoded size lands near `target_bytes`.
///
/// The guard reuses the measurement taken during the search, so `measure`
/// is called at most [`MAX_PROBES`] times. Errors from `measure` abort the
/// search.
pub fn optimize_quality<E>(
    mut measure: impl FnMut(Quality) -> Result<u64, E>,
    target_bytes: u64,
) -> Result<QualityChoice, E> {
    let mut sizes: HashMap<u32, u64> = HashMap::new();
    let mut probe = |q: u32| -> Result<u64, E> {
        if let Some(&size) = sizes.get(&q) {
            return Ok(size);
        }
        let size = measure(Quality::new(q))?;
        sizes.insert(q, size);
        Ok(size)
    };

    let mut low = Quality::MIN.value();
    let mut high = Quality::MAX.value();
    let mut best = INITIAL_BEST;
    let mut best_diff = u64::MAX;
    let mut probes = 0;

    while probes < MAX_PROBES && low <= high {
        let mid = (low + high) / 2;
        let size = probe(mid)?;
        probes += 1;
        debug!(quality = mid, bytes = size, target = target_bytes, "quality probe");

        let diff = size.abs_diff(target_bytes);
        if diff < best_diff {
            best_diff = diff;
            best = mid;
        }

        if size > target_bytes {
            high = mid - 1;
        } else {
            low = mid + 1;
            best = mid;
        }
    }

    let measured_bytes = probe(best)?;
    let way_over = measured_bytes as f64 > target_bytes as f64 * 1.5;
    let fell_back = best < MIN_ACCEPTABLE_QUALITY || way_over;
    if fell_back {
        debug!(
            quality = best,
            bytes = measured_bytes,
            "search result rejected, using fallback quality"
        );
    }

    Ok(QualityChoice {
        quality: Quality::new(if fell_back { FALLBACK_QUALITY } else { best }),
        probes,
        measured_bytes,
        fell_back,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    const KB: u64 = 1024;

    /// Run the optimizer over a size function given in KB, recording probes.
    fn run(size_kb: impl Fn(u32) -> u64, target_kb: u64) -> (QualityChoice, Vec<u32>) {
        let mut calls = Vec::new();
        let choice = optimize_quality(
            |q| {
                calls.push(q.value());
                Ok::<_, Infallible>(size_kb(q.value()) * KB)
            },
            target_kb * KB,
        )
        .unwrap();
        (choice, calls)
    }

    #[test]
    fn converges_on_increasing_size_function() {
        let (choice, calls) = run(|q| 10 + 3 * q as u64, 200);
        assert_eq!(calls, vec![50, 75, 62, 68, 65, 63, 64]);
        assert_eq!(choice.quality.value(), 63);
        assert_eq!(choice.probes, 7);
        assert_eq!(choice.measured_bytes, 199 * KB);
        assert!(!choice.fell_back);
    }

    #[test]
    fn never_exceeds_seven_encodes() {
        for target in [1, 50, 150, 200, 250, 299, 10_000] {
            let (choice, calls) = run(|q| 2 * q as u64 + 1, target);
            assert!(calls.len() <= MAX_PROBES as usize, "target {target}");
            assert!(choice.probes <= MAX_PROBES);
        }
    }

    #[test]
    fn under_target_probe_wins_over_closer_over_target_probe() {
        // q=50 is 1 KB over (closest), q=49 is 2 KB under: the under-target
        // probe is preferred.
        let (choice, calls) = run(|q| if q >= 50 { 201 } else { 100 + 2 * q as u64 }, 200);
        assert_eq!(calls, vec![50, 25, 37, 43, 46, 48, 49]);
        assert_eq!(choice.quality.value(), 49);
        assert!(!choice.fell_back);
    }

    #[test]
    fn decreasing_size_function_falls_back() {
        // size(q) = 1000 - 9q KB is over 200 KB for every probe, so the search
        // walks down to q=1 and keeps q=50 as the closest; 550 KB is way over.
        let (choice, calls) = run(|q| 1000 - 9 * q as u64, 200);
        assert_eq!(calls, vec![50, 25, 12, 6, 3, 1]);
        assert_eq!(choice.probes, 6);
        assert_eq!(choice.quality.value(), FALLBACK_QUALITY);
        assert_eq!(choice.measured_bytes, 550 * KB);
        assert!(choice.fell_back);
    }

    #[test]
    fn low_quality_result_falls_back() {
        // Only very low qualities fit the budget
        let (choice, _) = run(|q| if q <= 10 { 100 } else { 1000 }, 200);
        assert_eq!(choice.quality.value(), FALLBACK_QUALITY);
        assert!(choice.fell_back);
    }

    #[test]
    fn constant_size_under_target_climbs_to_max() {
        // Lossless encoders ignore quality; every probe fits
        let (choice, calls) = run(|_| 10, 200);
        assert_eq!(calls, vec![50, 75, 88, 94, 97, 99, 100]);
        assert_eq!(choice.quality.value(), 100);
    }

    #[test]
    fn measure_error_aborts() {
        let result = optimize_quality(|_| Err::<u64, _>("encoder down"), 200 * KB);
        assert_eq!(result, Err("encoder down"));
    }
}
