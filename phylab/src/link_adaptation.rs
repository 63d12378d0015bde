/// Link adaptation
///
/// Chooses one MCS per UT for the current SINR grid.
/// - Inner loop (ILLA): highest MCS whose predicted TBLER meets the target
/// - Outer loop (OLLA): ILLA on an SINR corrected by a per-UT offset that
///   HARQ feedback steers toward the BLER target

use burn::tensor::backend::Backend;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::mcs::McsTable;
use crate::phy_abs::BlerModel;
use crate::sinr::SinrGrid;

/// OLLA offsets are kept within +/- this many dB
pub const MAX_OLLA_OFFSET_DB: f32 = 20.0;

/// Selects an MCS index per UT
pub trait LinkAdaptation<B: Backend> {
    fn select_mcs(&mut self, sinr: &SinrGrid<B>, table: &McsTable) -> Result<Vec<usize>>;

    /// HARQ feedback of the transmissions scheduled by the last selection
    fn observe(&mut self, _harq_feedback: &[bool]) -> Result<()> {
        Ok(())
    }
}

fn check_bler_target(bler_target: f32) -> Result<()> {
    if bler_target > 0.0 && bler_target < 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "bler_target must lie in (0, 1), got {bler_target}"
        )))
    }
}

#[derive(Clone, Debug)]
pub struct InnerLoopLinkAdaptation {
    model: BlerModel,
    bler_target: f32,
}

impl InnerLoopLinkAdaptation {
    pub fn new(model: BlerModel, bler_target: f32) -> Result<Self> {
        check_bler_target(bler_target)?;
        Ok(Self { model, bler_target })
    }

    pub fn bler_target(&self) -> f32 {
        self.bler_target
    }

    /// Highest MCS of `table` meeting the target for UT `ut`, or 0 if none does
    fn select_for_ut(
        &self,
        table: &McsTable,
        sinr_eff: &BTreeMap<u32, Vec<f32>>,
        num_re: usize,
        ut: usize,
    ) -> usize {
        table
            .entries()
            .iter()
            .enumerate()
            .rev()
            .find(|(_, entry)| {
                let eff = sinr_eff[&entry.modulation_order][ut];
                let (_, tbler) = self.model.block_error_rates(entry, eff, num_re);
                tbler <= self.bler_target
            })
            .map(|(index, _)| index)
            .unwrap_or(0)
    }
}

impl<B: Backend> LinkAdaptation<B> for InnerLoopLinkAdaptation {
    fn select_mcs(&mut self, sinr: &SinrGrid<B>, table: &McsTable) -> Result<Vec<usize>> {
        let sinr_eff = self.model.effective_sinr_by_order(sinr, table)?;
        let num_re = sinr.num_re();

        Ok((0..sinr.num_ut())
            .map(|ut| self.select_for_ut(table, &sinr_eff, num_re, ut))
            .collect())
    }
}

#[derive(Clone, Debug)]
pub struct OuterLoopLinkAdaptation {
    inner: InnerLoopLinkAdaptation,
    offsets_db: Vec<f32>,
    step_down_db: f32,
    step_up_db: f32,
}

impl OuterLoopLinkAdaptation {
    /// `step_db` is applied on NACK; ACKs raise the offset by
    /// `step_db * target / (1 - target)` so the loop settles at the target
    pub fn new(model: BlerModel, bler_target: f32, num_ut: usize, step_db: f32) -> Result<Self> {
        let inner = InnerLoopLinkAdaptation::new(model, bler_target)?;
        if !(step_db.is_finite() && step_db > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "OLLA step must be positive, got {step_db}"
            )));
        }
        Ok(Self {
            inner,
            offsets_db: vec![0.0; num_ut],
            step_down_db: step_db,
            step_up_db: step_db * bler_target / (1.0 - bler_target),
        })
    }

    /// Current SINR correction per UT (dB)
    pub fn offsets_db(&self) -> &[f32] {
        &self.offsets_db
    }
}

impl<B: Backend> LinkAdaptation<B> for OuterLoopLinkAdaptation {
    fn select_mcs(&mut self, sinr: &SinrGrid<B>, table: &McsTable) -> Result<Vec<usize>> {
        let corrected = sinr.with_offsets_db(&self.offsets_db)?;
        self.inner.select_mcs(&corrected, table)
    }

    fn observe(&mut self, harq_feedback: &[bool]) -> Result<()> {
        if harq_feedback.len() != self.offsets_db.len() {
            return Err(Error::ShapeMismatch {
                expected: self.offsets_db.len(),
                actual: harq_feedback.len(),
            });
        }
        for (offset, &ack) in self.offsets_db.iter_mut().zip(harq_feedback) {
            let step = if ack { self.step_up_db } else { -self.step_down_db };
            *offset = (*offset + step).clamp(-MAX_OLLA_OFFSET_DB, MAX_OLLA_OFFSET_DB);
        }
        Ok(())
    }
}
