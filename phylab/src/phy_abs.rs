/// PHY abstraction
///
/// Maps a per-resource-element SINR grid and an MCS choice to link-level
/// outcomes without simulating bits:
/// - EESM (exponential effective SINR mapping) compresses the grid of each
///   UT into one effective SINR, with a calibration factor per modulation
/// - a logistic waterfall per MCS turns effective SINR into code block BLER
/// - code block BLER is combined into transport block BLER
/// - HARQ ACK/NACK is drawn from the transport block BLER
///
/// Reference: Brueninghaus et al., "Link Performance Models for System Level
/// Simulations of Broadband Radio Access Systems", PIMRC 2005

use burn::tensor::backend::Backend;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::mcs::{num_code_blocks, McsEntry, McsTable};
use crate::sinr::SinrGrid;
use crate::units::lin_to_db;

/// Result of one PHY abstraction call, one element per UT
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhyOutcome {
    /// Bits delivered (TB size on ACK, 0 on NACK)
    pub num_decoded_bits: Vec<u64>,

    /// HARQ feedback, `true` = ACK
    pub harq_feedback: Vec<bool>,

    /// Effective SINR (linear)
    pub sinr_eff: Vec<f32>,

    /// Code block error probability
    pub bler: Vec<f32>,

    /// Transport block error probability
    pub tbler: Vec<f32>,
}

impl PhyOutcome {
    pub fn num_ut(&self) -> usize {
        self.harq_feedback.len()
    }

    pub fn mean_tbler(&self) -> f32 {
        if self.tbler.is_empty() {
            return 0.0;
        }
        self.tbler.iter().sum::<f32>() / self.tbler.len() as f32
    }

    pub fn total_decoded_bits(&self) -> u64 {
        self.num_decoded_bits.iter().sum()
    }

    pub fn num_acks(&self) -> usize {
        self.harq_feedback.iter().filter(|&&ack| ack).count()
    }
}

/// Evaluates a scheduled MCS against the channel
pub trait PhyAbstraction<B: Backend> {
    /// `mcs[u]` is the MCS index of UT `u` in `table`
    fn evaluate(&mut self, mcs: &[usize], sinr: &SinrGrid<B>, table: &McsTable) -> Result<PhyOutcome>;
}

/// Deterministic part of the abstraction: SINR -> error probabilities
#[derive(Clone, Debug, PartialEq)]
pub struct BlerModel {
    /// Distance of the waterfall midpoint from the Shannon bound (dB)
    pub gap_db: f32,

    /// Steepness of the waterfall (per dB)
    pub slope_per_db: f32,
}

impl Default for BlerModel {
    fn default() -> Self {
        Self {
            gap_db: 1.5,
            slope_per_db: 1.5,
        }
    }
}

impl BlerModel {
    /// EESM calibration factor for a modulation order
    pub fn eesm_beta(modulation_order: u32) -> f32 {
        match modulation_order {
            0..=2 => 1.6,
            3..=4 => 6.0,
            5..=6 => 20.0,
            _ => 60.0,
        }
    }

    /// Effective SINR (linear) per UT: `-beta * ln(mean(exp(-sinr / beta)))`
    ///
    /// Evaluated relative to the per-UT minimum so the exponentials never
    /// underflow at high SINR.
    pub fn effective_sinr<B: Backend>(&self, sinr: &SinrGrid<B>, beta: f32) -> Result<Vec<f32>> {
        let num_ut = sinr.num_ut();
        let linear = sinr.linear().clone();

        // [1, 1, num_ut, 1]
        let floor = linear.clone().min_dim(0).min_dim(1);

        let compressed = (linear - floor.clone())
            .div_scalar(-beta)
            .exp()
            .mean_dim(0)
            .mean_dim(1)
            .log()
            .mul_scalar(-beta)
            + floor;

        compressed
            .reshape([num_ut])
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| Error::Tensor(format!("{:?}", e)))
    }

    /// Effective SINR for every modulation order used by `table`
    pub fn effective_sinr_by_order<B: Backend>(
        &self,
        sinr: &SinrGrid<B>,
        table: &McsTable,
    ) -> Result<BTreeMap<u32, Vec<f32>>> {
        let mut by_order = BTreeMap::new();
        for entry in table.entries() {
            if !by_order.contains_key(&entry.modulation_order) {
                let beta = Self::eesm_beta(entry.modulation_order);
                by_order.insert(entry.modulation_order, self.effective_sinr(sinr, beta)?);
            }
        }
        Ok(by_order)
    }

    /// SINR (dB) at which the code block BLER of `entry` is 50%
    pub fn threshold_db(&self, entry: &McsEntry) -> f32 {
        let shannon = 2f32.powf(entry.spectral_efficiency()) - 1.0;
        lin_to_db(shannon) + self.gap_db
    }

    /// Code block BLER for an effective SINR (linear)
    pub fn code_block_bler(&self, entry: &McsEntry, sinr_eff: f32) -> f32 {
        let sinr_db = lin_to_db(sinr_eff.max(f32::MIN_POSITIVE));
        let x = self.slope_per_db * (sinr_db - self.threshold_db(entry));
        1.0 / (1.0 + x.exp())
    }

    /// `(code block BLER, transport block BLER)` for a TB spanning `num_re` REs
    pub fn block_error_rates(&self, entry: &McsEntry, sinr_eff: f32, num_re: usize) -> (f32, f32) {
        let bler = self.code_block_bler(entry, sinr_eff);
        let num_cb = num_code_blocks(entry.transport_block_size(num_re));
        let tbler = 1.0 - (1.0 - bler).powi(num_cb as i32);
        (bler, tbler.clamp(0.0, 1.0))
    }
}

/// EESM-based PHY abstraction with random HARQ outcomes
#[derive(Clone, Debug)]
pub struct EesmPhyAbstraction {
    model: BlerModel,
    rng: StdRng,
}

impl EesmPhyAbstraction {
    pub fn new(model: BlerModel, seed: u64) -> Self {
        Self {
            model,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn model(&self) -> &BlerModel {
        &self.model
    }
}

impl<B: Backend> PhyAbstraction<B> for EesmPhyAbstraction {
    fn evaluate(&mut self, mcs: &[usize], sinr: &SinrGrid<B>, table: &McsTable) -> Result<PhyOutcome> {
        let num_ut = sinr.num_ut();
        if mcs.len() != num_ut {
            return Err(Error::ShapeMismatch {
                expected: num_ut,
                actual: mcs.len(),
            });
        }
        let num_re = sinr.num_re();

        // EESM depends only on the modulation order; compute each one once
        let mut sinr_eff_cache: BTreeMap<u32, Vec<f32>> = BTreeMap::new();
        let mut outcome = PhyOutcome::default();

        for (ut, &index) in mcs.iter().enumerate() {
            let entry = table.entry(index)?;
            let order = entry.modulation_order;
            if !sinr_eff_cache.contains_key(&order) {
                let values = self.model.effective_sinr(sinr, BlerModel::eesm_beta(order))?;
                sinr_eff_cache.insert(order, values);
            }
            let sinr_eff = sinr_eff_cache[&order][ut];

            let (bler, tbler) = self.model.block_error_rates(&entry, sinr_eff, num_re);
            let ack = self.rng.gen_bool(f64::from(1.0 - tbler).clamp(0.0, 1.0));
            let tbs = entry.transport_block_size(num_re);

            outcome.num_decoded_bits.push(if ack { tbs } else { 0 });
            outcome.harq_feedback.push(ack);
            outcome.sinr_eff.push(sinr_eff);
            outcome.bler.push(bler);
            outcome.tbler.push(tbler);
        }

        tracing::trace!(
            table = table.index(),
            category = %table.category(),
            ?mcs,
            tbler = ?outcome.tbler,
            "PHY abstraction evaluated"
        );

        Ok(outcome)
    }
}
