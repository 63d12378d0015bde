//! phylab - PHY Abstraction Experiment Driver
//!
//! Runs link-level experiments without bit-level simulation: random
//! per-resource-element SINR grids are fed through link adaptation (MCS
//! selection from 3GPP NR tables) and an EESM-based PHY abstraction that
//! predicts block error rates and draws HARQ feedback. Per-trial TBLER and
//! throughput are aggregated into a summary that is saved as an `.npz`
//! archive and a chart.
//!
//! Tensor work runs on any burn backend; the binary uses the CPU `NdArray`
//! backend unless built with the `wgpu` feature.

pub mod error;
pub mod config;
pub mod units;
pub mod mcs;
pub mod sinr;
pub mod phy_abs;
pub mod link_adaptation;
pub mod stats;
pub mod experiment;
pub mod output;
pub mod mapping;
pub mod awgn;
pub mod test_utils;

pub use error::{Error, Result};
pub use config::{ExperimentConfig, LinkAdaptationKind};
pub use units::{db_to_lin, lin_to_db, db_to_lin_tensor, lin_to_db_tensor};
pub use mcs::{McsCategory, McsEntry, McsTable, num_code_blocks};
pub use sinr::{SinrGenerator, SinrGrid};
pub use phy_abs::{BlerModel, EesmPhyAbstraction, PhyAbstraction, PhyOutcome};
pub use link_adaptation::{InnerLoopLinkAdaptation, LinkAdaptation, OuterLoopLinkAdaptation};
pub use stats::{ExperimentSummary, HarqCounter};
pub use experiment::{Experiment, ExperimentReport, build_link_adaptation, run_experiment, run_and_persist};
pub use output::{save_chart, save_summary};
pub use mapping::{ConstellationType, Mapper, average_energy};
pub use awgn::{AwgnChannel, bit_error_rate, ebno_to_no};

/// Backend used by the binary
#[cfg(not(feature = "wgpu"))]
pub type DefaultBackend = burn::backend::NdArray;

/// Backend used by the binary
#[cfg(feature = "wgpu")]
pub type DefaultBackend = burn::backend::Wgpu;
