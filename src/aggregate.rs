//! Turns running accumulators into immutable per-process summaries.

use serde::{Deserialize, Serialize};

use crate::sampler::{Accumulators, ProcessAccumulator};

/// Round to one decimal place, correctly rounded from the exact binary value
/// with exact ties going to the even digit (0.25 -> 0.2, 0.35 -> 0.3).
pub fn round1(value: f64) -> f64 {
    let scaled = value * 10.0;
    if !scaled.is_finite() {
        return value;
    }
    // value * 10 == scaled + residual, exactly.
    let residual = value.mul_add(10.0, -scaled);
    let mut rounded = scaled.round();
    let offset = scaled - rounded;
    if offset.abs() == 0.5 {
        let step = 2.0 * offset;
        if residual == 0.0 {
            if rounded % 2.0 != 0.0 {
                rounded += step;
            }
        } else if residual.signum() == offset.signum() {
            rounded += step;
        }
    }
    rounded / 10.0
}

/// Mean of `values` rounded to one decimal, 0.0 for an empty slice.
pub fn mean1(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    round1(values.iter().sum::<f64>() / values.len() as f64)
}

/// Averaged/peak view of one process after all ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedProcess {
    pub pid: u32,
    pub name: Option<String>,
    pub user: Option<String>,
    pub cpu_avg: f64,
    pub mem_avg: f64,
    pub cpu_peak: f64,
    pub mem_peak: f64,
    pub samples: u32,
    pub cpu_over: u32,
    pub mem_over: u32,
}

impl FinalizedProcess {
    fn from_accumulator(acc: &ProcessAccumulator) -> Self {
        let samples = f64::from(acc.samples);
        Self {
            pid: acc.pid,
            name: acc.name.clone(),
            user: acc.owner.clone(),
            cpu_avg: round1(acc.cpu_sum / samples),
            mem_avg: round1(acc.mem_sum / samples),
            cpu_peak: round1(acc.cpu_peak),
            mem_peak: round1(acc.mem_peak),
            samples: acc.samples,
            cpu_over: acc.cpu_over,
            mem_over: acc.mem_over,
        }
    }
}

/// Finalize every accumulator that saw at least one sample. Output is in
/// pid order; callers that need a ranking sort it themselves.
pub fn finalize(accumulators: &Accumulators) -> Vec<FinalizedProcess> {
    let mut out: Vec<FinalizedProcess> = accumulators
        .values()
        .filter(|acc| acc.samples > 0)
        .map(FinalizedProcess::from_accumulator)
        .collect();
    out.sort_by_key(|p| p.pid);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc(pid: u32, samples: u32, cpu_sum: f64, cpu_peak: f64) -> ProcessAccumulator {
        ProcessAccumulator {
            samples,
            cpu_sum,
            cpu_peak,
            mem_sum: 3.0 * f64::from(samples),
            mem_peak: 3.04,
            cpu_over: samples.min(1),
            ..ProcessAccumulator::new(pid)
        }
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(52.0), 52.0);
        assert_eq!(round1(33.333), 33.3);
        assert_eq!(round1(0.06), 0.1);
        assert_eq!(round1(-0.19999), -0.2);
    }

    #[test]
    fn test_round1_ties_to_even() {
        assert_eq!(round1(0.25), 0.2);
        assert_eq!(round1(2.25), 2.2);
        assert_eq!(round1(10.25), 10.2);
        assert_eq!(round1(0.75), 0.8);
        assert_eq!(round1(-0.25), -0.2);
        // Not ties in binary: 0.35 is stored just below, 0.15 just above.
        assert_eq!(round1(0.35), 0.3);
        assert_eq!(round1(0.15), 0.1);
        assert_eq!(round1(f64::MAX), f64::MAX);
    }

    #[test]
    fn test_average_just_below_threshold_stays_below() {
        let config = crate::config::SampleConfig::new(50.0, 10.0, 2, 0.0);
        let mut acc = ProcessAccumulator::new(7);
        for cpu in [50.1, 50.0] {
            acc.record(
                Some("edge".into()),
                crate::source::ProcessReading {
                    cpu_percent: cpu,
                    mem_percent: 0.5,
                    owner: None,
                },
                &config,
            );
        }
        let mut map = Accumulators::new();
        map.insert(7, acc);

        let out = finalize(&map);
        assert_eq!(out[0].cpu_avg, 50.0);
        assert_eq!(out[0].cpu_over, 1);
        assert!(crate::classify::classify_process(&out[0], &config).is_none());
    }

    #[test]
    fn test_mean1() {
        assert_eq!(mean1(&[]), 0.0);
        assert_eq!(mean1(&[10.0, 20.0, 25.0]), 18.3);
    }

    #[test]
    fn test_finalize_averages_and_drops_empty() {
        let mut map = Accumulators::new();
        map.insert(2, acc(2, 5, 260.0, 80.0));
        map.insert(1, acc(1, 3, 100.0, 66.666));
        map.insert(3, acc(3, 0, 0.0, 0.0));

        let out = finalize(&map);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].pid, 1);
        assert_eq!(out[0].cpu_avg, 33.3);
        assert_eq!(out[0].cpu_peak, 66.7);
        assert_eq!(out[0].mem_peak, 3.0);
        assert_eq!(out[1].cpu_avg, 52.0);
        assert_eq!(out[1].samples, 5);
        assert_eq!(out[1].cpu_over, 1);
    }

    #[test]
    fn test_finalize_empty() {
        assert!(finalize(&Accumulators::new()).is_empty());
    }
}
