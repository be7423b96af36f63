//! Risk Aggregator
//!
//! Maps a signal set to a bounded score in [0, 100]. Per-occurrence signals
//! contribute weight x count, flat signals contribute their weight once;
//! clamping at 100 is the only nonlinearity. Summation is commutative, so the
//! result is invariant under permutation of the signal set.

use crate::signals::{Signal, SignalHit};

pub const MAX_SCORE: u32 = 100;

/// How a signal's weight applies to its count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Weighting {
    /// weight x occurrence count
    PerOccurrence(u32),
    /// weight once, however high the count
    Flat(u32),
}

fn weighting(signal: Signal) -> Weighting {
    match signal {
        Signal::OddHourLogin => Weighting::PerOccurrence(5),
        Signal::FailedLoginAttempts => Weighting::Flat(15),
        Signal::MultipleIps => Weighting::Flat(10),
        Signal::WeekendAccess => Weighting::PerOccurrence(3),
        Signal::UntrustedDevices => Weighting::PerOccurrence(10),
        Signal::ExcessiveFileAccess => Weighting::Flat(15),
        Signal::FileDeletions => Weighting::Flat(20),
        Signal::GeolocationAnomaly => Weighting::Flat(10),
        Signal::DeviceChangeDetected => Weighting::Flat(10),
    }
}

/// Aggregate a signal set into a clamped risk score.
pub fn aggregate(hits: &[SignalHit]) -> u32 {
    let total: u64 = hits
        .iter()
        .map(|hit| match weighting(hit.signal) {
            Weighting::PerOccurrence(w) => w as u64 * hit.count,
            Weighting::Flat(w) => w as u64,
        })
        .sum();

    total.min(MAX_SCORE as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_signal_set_scores_zero() {
        assert_eq!(aggregate(&[]), 0);
    }

    #[test]
    fn flat_signals_ignore_their_count() {
        let low = [SignalHit { signal: Signal::FailedLoginAttempts, count: 4 }];
        let high = [SignalHit { signal: Signal::FailedLoginAttempts, count: 400 }];
        assert_eq!(aggregate(&low), 15);
        assert_eq!(aggregate(&high), 15);
    }

    #[test]
    fn per_occurrence_signals_scale_with_count() {
        let hits = [SignalHit { signal: Signal::UntrustedDevices, count: 6 }];
        assert_eq!(aggregate(&hits), 60);

        let hits = [SignalHit { signal: Signal::OddHourLogin, count: 3 }];
        assert_eq!(aggregate(&hits), 15);
    }

    #[test]
    fn score_is_clamped_to_100() {
        let hits = [
            SignalHit { signal: Signal::UntrustedDevices, count: 50 },
            SignalHit { signal: Signal::FileDeletions, count: 10 },
        ];
        assert_eq!(aggregate(&hits), 100);
    }

    #[test]
    fn aggregation_is_order_independent() {
        let mut hits = vec![
            SignalHit { signal: Signal::OddHourLogin, count: 2 },
            SignalHit { signal: Signal::FailedLoginAttempts, count: 5 },
            SignalHit { signal: Signal::MultipleIps, count: 3 },
            SignalHit { signal: Signal::WeekendAccess, count: 4 },
            SignalHit { signal: Signal::FileDeletions, count: 7 },
        ];
        let forward = aggregate(&hits);
        hits.reverse();
        assert_eq!(aggregate(&hits), forward);
        hits.swap(0, 2);
        assert_eq!(aggregate(&hits), forward);
    }

    #[test]
    fn combined_weights_sum_linearly_below_the_cap() {
        let hits = [
            SignalHit { signal: Signal::OddHourLogin, count: 2 },   // 10
            SignalHit { signal: Signal::MultipleIps, count: 3 },    // 10
            SignalHit { signal: Signal::WeekendAccess, count: 1 },  // 3
        ];
        assert_eq!(aggregate(&hits), 23);
    }
}
