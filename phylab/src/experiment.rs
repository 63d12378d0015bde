/// Experiment driver
///
/// Runs `num_experiments` independent trials of the pipeline
///
///   SINR grid -> link adaptation (MCS) -> PHY abstraction (HARQ, TBLER)
///
/// and reduces the per-trial TBLER and throughput to an [`ExperimentSummary`].
/// Every random draw comes from generators seeded by `config.seed`, so the
/// same configuration always yields the same report.

use burn::tensor::backend::Backend;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{ExperimentConfig, LinkAdaptationKind};
use crate::error::Result;
use crate::link_adaptation::{InnerLoopLinkAdaptation, LinkAdaptation, OuterLoopLinkAdaptation};
use crate::mcs::McsTable;
use crate::output;
use crate::phy_abs::{BlerModel, EesmPhyAbstraction, PhyAbstraction};
use crate::sinr::SinrGenerator;
use crate::stats::{ExperimentSummary, HarqCounter};

/// A progress line is logged every this many trials
pub const PROGRESS_INTERVAL: usize = 5;

/// Per-trial sequences plus their aggregate
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentReport {
    pub experiment_id: String,

    /// Mean TBLER over UTs, one entry per trial
    pub tbler: Vec<f32>,

    /// Decoded bits summed over UTs, one entry per trial
    pub throughput: Vec<u64>,

    pub summary: ExperimentSummary,
}

impl ExperimentReport {
    pub fn num_trials(&self) -> usize {
        self.tbler.len()
    }
}

/// One configured experiment, ready to run against any pair of components
pub struct Experiment<'a> {
    config: &'a ExperimentConfig,
    table: McsTable,
    sinr: SinrGenerator,
    rng: StdRng,
}

impl<'a> Experiment<'a> {
    pub fn new(config: &'a ExperimentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            table: config.mcs_table()?,
            sinr: SinrGenerator::new(config)?,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    pub fn table(&self) -> &McsTable {
        &self.table
    }

    /// Execute all trials with the given link adaptation and PHY abstraction
    pub fn run<B: Backend>(
        &mut self,
        device: &B::Device,
        link_adaptation: &mut dyn LinkAdaptation<B>,
        phy_abstraction: &mut dyn PhyAbstraction<B>,
    ) -> Result<ExperimentReport> {
        let num_trials = self.config.num_experiments;
        tracing::info!(
            experiment = %self.config.experiment_id,
            trials = num_trials,
            num_ut = self.config.num_ut,
            table = self.table.index(),
            category = %self.table.category(),
            "running experiment"
        );

        let mut tbler = Vec::with_capacity(num_trials);
        let mut throughput = Vec::with_capacity(num_trials);
        let mut harq = HarqCounter::default();

        for trial in 0..num_trials {
            let sinr = self.sinr.sample::<B, _>(&mut self.rng, device)?;

            let mcs = link_adaptation.select_mcs(&sinr, &self.table)?;
            let outcome = phy_abstraction.evaluate(&mcs, &sinr, &self.table)?;

            tbler.push(outcome.mean_tbler());
            throughput.push(outcome.total_decoded_bits());
            harq.record(&outcome.harq_feedback);
            link_adaptation.observe(&outcome.harq_feedback)?;

            tracing::debug!(
                trial,
                ?mcs,
                tbler = outcome.mean_tbler(),
                decoded_bits = outcome.total_decoded_bits(),
                acks = outcome.num_acks(),
                "trial complete"
            );

            if (trial + 1) % PROGRESS_INTERVAL == 0 {
                tracing::info!("progress: {}/{}", trial + 1, num_trials);
            }
        }

        let summary = ExperimentSummary::from_trials(&tbler, &throughput, &harq)?;
        tracing::info!(
            tbler_mean = summary.tbler_mean,
            tbler_std = summary.tbler_std,
            throughput_mean = summary.throughput_mean,
            harq_nack_rate = summary.harq_nack_rate,
            "experiment complete"
        );

        Ok(ExperimentReport {
            experiment_id: self.config.experiment_id.clone(),
            tbler,
            throughput,
            summary,
        })
    }
}

/// Link adaptation selected by `config.link_adaptation`
pub fn build_link_adaptation<B: Backend>(
    config: &ExperimentConfig,
    model: BlerModel,
) -> Result<Box<dyn LinkAdaptation<B>>> {
    Ok(match config.link_adaptation {
        LinkAdaptationKind::Illa => Box::new(InnerLoopLinkAdaptation::new(model, config.bler_target)?),
        LinkAdaptationKind::Olla => Box::new(OuterLoopLinkAdaptation::new(
            model,
            config.bler_target,
            config.num_ut,
            config.olla_step_db,
        )?),
    })
}

/// Run `config` with the EESM abstraction and the configured link adaptation
pub fn run_experiment<B: Backend>(config: &ExperimentConfig, device: &B::Device) -> Result<ExperimentReport> {
    let mut experiment = Experiment::new(config)?;

    let model = BlerModel::default();
    let mut link_adaptation = build_link_adaptation::<B>(config, model.clone())?;
    // HARQ draws use their own stream so that SINR draws do not shift with MCS choices
    let mut phy_abstraction = EesmPhyAbstraction::new(model, config.seed.wrapping_add(1));

    experiment.run(device, link_adaptation.as_mut(), &mut phy_abstraction)
}

/// [`run_experiment`] followed by writing the summary archive and chart
pub fn run_and_persist<B: Backend>(config: &ExperimentConfig, device: &B::Device) -> Result<ExperimentReport> {
    let report = run_experiment::<B>(config, device)?;

    let summary_path = output::save_summary(&config.output_dir, &config.experiment_id, &report.summary)?;
    let chart = output::save_chart(
        &config.output_dir,
        &config.experiment_id,
        config.bler_target,
        &report.tbler,
        &report.summary,
    );

    // Results are written as a pair or not at all
    if let Err(e) = chart {
        if let Err(remove) = std::fs::remove_file(&summary_path) {
            tracing::warn!(path = %summary_path.display(), error = %remove, "could not remove summary archive");
        }
        return Err(e);
    }

    Ok(report)
}
