use crate::error::{Error, Result};

/// Aggregate statistics of one experiment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExperimentSummary {
    /// Mean over trials of the per-trial mean TBLER
    pub tbler_mean: f64,

    /// Mean decoded bits per trial (summed over UTs)
    pub throughput_mean: f64,

    /// Population standard deviation of the per-trial TBLER
    pub tbler_std: f64,

    /// Fraction of HARQ reports that were NACKs, over all trials and UTs
    pub harq_nack_rate: f64,
}

impl ExperimentSummary {
    pub fn from_trials(tbler: &[f32], throughput: &[u64], harq: &HarqCounter) -> Result<Self> {
        let tbler: Vec<f64> = tbler.iter().map(|&v| f64::from(v)).collect();
        let throughput: Vec<f64> = throughput.iter().map(|&v| v as f64).collect();

        let empty = || Error::InvalidConfig("cannot aggregate an experiment without trials".into());

        Ok(Self {
            tbler_mean: mean(&tbler).ok_or_else(empty)?,
            throughput_mean: mean(&throughput).ok_or_else(empty)?,
            tbler_std: std_dev(&tbler).ok_or_else(empty)?,
            harq_nack_rate: harq.nack_rate().ok_or_else(empty)?,
        })
    }

    /// Named values in archive order
    pub fn fields(&self) -> [(&'static str, f64); 4] {
        [
            ("tbler_mean", self.tbler_mean),
            ("throughput_mean", self.throughput_mean),
            ("tbler_std", self.tbler_std),
            ("harq_nack_rate", self.harq_nack_rate),
        ]
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by N), `None` for an empty slice
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Running ACK/NACK tally
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HarqCounter {
    acks: u64,
    reports: u64,
}

impl HarqCounter {
    pub fn record(&mut self, harq_feedback: &[bool]) {
        self.acks += harq_feedback.iter().filter(|&&ack| ack).count() as u64;
        self.reports += harq_feedback.len() as u64;
    }

    pub fn acks(&self) -> u64 {
        self.acks
    }

    pub fn reports(&self) -> u64 {
        self.reports
    }

    /// `1 - ACKs / reports`, `None` before the first report
    pub fn nack_rate(&self) -> Option<f64> {
        if self.reports == 0 {
            return None;
        }
        Some(1.0 - self.acks as f64 / self.reports as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert_eq!(std_dev(&values), Some(2.0));
        assert_eq!(mean(&[]), None);
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn test_nack_rate_over_all_reports() {
        let mut harq = HarqCounter::default();
        assert_eq!(harq.nack_rate(), None);

        harq.record(&[true, false, true, true]);
        harq.record(&[false, false, true, true]);

        assert_eq!(harq.reports(), 8);
        assert_eq!(harq.acks(), 5);
        assert_eq!(harq.nack_rate(), Some(0.375));
    }

    #[test]
    fn test_summary() {
        let mut harq = HarqCounter::default();
        harq.record(&[true, true]);
        harq.record(&[true, false]);

        let summary = ExperimentSummary::from_trials(&[0.0, 0.5], &[1000, 3000], &harq).unwrap();

        assert_eq!(summary.tbler_mean, 0.25);
        assert_eq!(summary.tbler_std, 0.25);
        assert_eq!(summary.throughput_mean, 2000.0);
        assert_eq!(summary.harq_nack_rate, 0.25);
        assert_eq!(summary.fields()[0], ("tbler_mean", 0.25));
    }

    #[test]
    fn test_summary_rejects_empty() {
        let harq = HarqCounter::default();
        assert!(ExperimentSummary::from_trials(&[], &[], &harq).is_err());
    }
}
