//! Batch pipeline driver for astronomical survey data repositories.
//!
//! Pipeline tasks declare which identifier axes they need (visit, ccd,
//! amp, sky tile, raft, sensor, channel, snap); the driver parses the
//! matching command-line options, opens the input and output
//! repositories, enumerates the cross product of the selected identifier
//! values (querying the repository for "all" when an axis is not given),
//! and invokes the task's processing function once per combination,
//! skipping combinations whose output already exists unless forced.
//!
//! The entry points are [`driver::cfht_main`] and
//! [`driver::lsst_sim_main`], one per supported camera, together with the
//! [`driver::cfht_setup`]/[`driver::lsst_sim_setup`] repository helpers
//! and the [`fetch::get_dataset`]/[`fetch::get_psf`] retrieval helpers.

pub mod camera;
pub mod cli;
pub mod dataid;
pub mod driver;
pub mod exposure;
pub mod fetch;
pub mod repo;
pub mod stage;

pub use camera::Camera;
pub use dataid::{Axis, AxisValue, DataId, TaskNeeds};
pub use driver::{DriverError, ProcessResult};
pub use repo::{FsRepository, RepoError, Repository};
