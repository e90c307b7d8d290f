pub mod error;
pub use error::DriverError;

pub mod plan;
pub use plan::{IterationPlan, resolve_axis};

pub mod runner;
pub use runner::{
    PipelineDriver, ProcessResult, SetupOptions, cfht_main, cfht_main_from, cfht_setup,
    lsst_sim_main, lsst_sim_main_from, lsst_sim_setup, setup,
};
