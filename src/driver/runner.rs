use crate::camera::Camera;
use crate::cli::{CfhtArgs, LsstSimArgs};
use crate::dataid::{Axis, AxisValue, DataId, TaskNeeds};
use crate::driver::error::DriverError;
use crate::driver::plan::{IterationPlan, resolve_axis};
use crate::repo::mapper::MapperPolicy;
use crate::repo::{FsRepository, Repository};

use clap::Parser;
use log::info;
use std::ffi::OsString;
use std::path::PathBuf;

/// Result type for caller-supplied processing functions.
pub type ProcessResult = Result<(), Box<dyn std::error::Error>>;

/// Dataset type whose values are enumerated when an axis is not given on
/// the command line.
const QUERY_DATASET: &str = "raw";

/// Runs a processing function over every data ID of a plan, skipping IDs
/// whose output dataset already exists unless forced.
pub struct PipelineDriver<'a> {
    in_repo: &'a dyn Repository,
    out_repo: &'a dyn Repository,
    out_dataset: String,
    force: bool,
}

impl<'a> PipelineDriver<'a> {
    pub fn new(
        in_repo: &'a dyn Repository,
        out_repo: &'a dyn Repository,
        out_dataset: &str,
        force: bool,
    ) -> PipelineDriver<'a> {
        PipelineDriver {
            in_repo,
            out_repo,
            out_dataset: out_dataset.to_string(),
            force,
        }
    }

    /// Returns the number of data IDs actually processed.
    pub fn run<F>(&self, plan: &IterationPlan, mut process: F) -> Result<usize, DriverError>
    where
        F: FnMut(&dyn Repository, &dyn Repository, &DataId) -> ProcessResult,
    {
        let mut processed = 0;
        for data_id in plan {
            if !self.force && self.out_repo.dataset_exists(&self.out_dataset, &data_id)? {
                continue;
            }
            info!("***** Processing {}", data_id);
            process(self.in_repo, self.out_repo, &data_id).map_err(DriverError::Process)?;
            processed += 1;
        }
        Ok(processed)
    }
}

/// Repository locations for a driver run; unset fields fall back to the
/// camera defaults during setup.
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    pub root: Option<PathBuf>,
    pub out_root: Option<PathBuf>,
    pub registry: Option<PathBuf>,
    pub calib_root: Option<PathBuf>,
    pub policy: Option<PathBuf>,
    pub needs_calib: bool,
}

/// Opens the input/output repository pair, filling in defaults: the
/// registry from the repository root or the site directory, the
/// calibration root from the site directory, and the output root from the
/// input root. The registry, when found, serves both repositories.
pub fn setup(
    camera: Camera,
    opts: SetupOptions,
) -> Result<(FsRepository, FsRepository), DriverError> {
    let root = opts.root.unwrap_or_else(|| PathBuf::from("."));
    let out_root = opts.out_root.unwrap_or_else(|| root.clone());

    let registry = opts.registry.or_else(|| {
        camera
            .registry_candidates(&root)
            .into_iter()
            .find(|p| p.exists())
    });
    let calib_root = if opts.needs_calib {
        opts.calib_root.or_else(|| {
            let default = camera.default_calib_root();
            default.exists().then_some(default)
        })
    } else {
        None
    };
    let policy = match &opts.policy {
        Some(path) => Some(MapperPolicy::from_file(path)?),
        None => None,
    };

    let mut in_repo = FsRepository::open(camera, &root);
    if let Some(policy) = &policy {
        in_repo = in_repo.with_policy(policy.clone());
    }
    if let Some(path) = &registry {
        in_repo = in_repo.with_registry(path)?;
    }
    if let Some(path) = &calib_root {
        in_repo = in_repo.with_calib_root(path);
    }

    let mut out_repo = FsRepository::open(camera, &out_root);
    if let Some(policy) = policy {
        out_repo = out_repo.with_policy(policy);
    }
    if let Some(path) = &registry {
        out_repo = out_repo.with_registry(path)?;
    }

    info!(
        "Set up {} repositories: input {}, output {}",
        camera.name(),
        root.display(),
        out_root.display()
    );
    Ok((in_repo, out_repo))
}

pub fn cfht_setup(opts: SetupOptions) -> Result<(FsRepository, FsRepository), DriverError> {
    setup(Camera::Cfht, opts)
}

pub fn lsst_sim_setup(opts: SetupOptions) -> Result<(FsRepository, FsRepository), DriverError> {
    setup(Camera::LsstSim, opts)
}

fn int_values(values: &[i64]) -> Vec<AxisValue> {
    values.iter().map(|&v| AxisValue::Int(v)).collect()
}

fn text_values(values: &[String]) -> Vec<AxisValue> {
    values.iter().map(|v| AxisValue::Text(v.clone())).collect()
}

/// CFHT driver entry point over the process's own command line.
pub fn cfht_main<F>(
    process: F,
    out_dataset: &str,
    needs: &TaskNeeds,
    default_root: &str,
) -> Result<usize, DriverError>
where
    F: FnMut(&dyn Repository, &dyn Repository, &DataId) -> ProcessResult,
{
    cfht_main_from(std::env::args_os(), process, out_dataset, needs, default_root)
}

/// CFHT driver entry point over an explicit argument list.
pub fn cfht_main_from<I, T, F>(
    argv: I,
    process: F,
    out_dataset: &str,
    needs: &TaskNeeds,
    default_root: &str,
) -> Result<usize, DriverError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    F: FnMut(&dyn Repository, &dyn Repository, &DataId) -> ProcessResult,
{
    let args = CfhtArgs::try_parse_from(argv)?;
    args.validate(needs)?;

    let (in_repo, out_repo) = setup(
        Camera::Cfht,
        SetupOptions {
            root: Some(
                args.common
                    .root
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(default_root)),
            ),
            out_root: Some(args.common.out_root.clone()),
            registry: args.common.registry.clone(),
            calib_root: args.common.calib_root.clone(),
            policy: args.common.policy.clone(),
            needs_calib: needs.calib,
        },
    )?;

    let mut plan = IterationPlan::new();
    if needs.sky_tile {
        plan.set(
            Axis::SkyTile,
            resolve_axis(
                &in_repo,
                QUERY_DATASET,
                Axis::SkyTile,
                int_values(&args.common.sky_tile),
            )?,
        );
    } else {
        for axis in Camera::Cfht.exposure_axes(needs) {
            let requested = match axis {
                Axis::Visit => int_values(&args.common.visit),
                Axis::Ccd => int_values(&args.ccd),
                Axis::Amp => int_values(&args.amp),
                _ => Vec::new(),
            };
            plan.set(axis, resolve_axis(&in_repo, QUERY_DATASET, axis, requested)?);
        }
    }

    PipelineDriver::new(&in_repo, &out_repo, out_dataset, args.common.force).run(&plan, process)
}

/// LSST simulator driver entry point over the process's own command line.
pub fn lsst_sim_main<F>(
    process: F,
    out_dataset: &str,
    needs: &TaskNeeds,
    default_root: &str,
) -> Result<usize, DriverError>
where
    F: FnMut(&dyn Repository, &dyn Repository, &DataId) -> ProcessResult,
{
    lsst_sim_main_from(std::env::args_os(), process, out_dataset, needs, default_root)
}

/// LSST simulator driver entry point over an explicit argument list.
pub fn lsst_sim_main_from<I, T, F>(
    argv: I,
    process: F,
    out_dataset: &str,
    needs: &TaskNeeds,
    default_root: &str,
) -> Result<usize, DriverError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    F: FnMut(&dyn Repository, &dyn Repository, &DataId) -> ProcessResult,
{
    let args = LsstSimArgs::try_parse_from(argv)?;
    args.validate(needs)?;

    let (in_repo, out_repo) = setup(
        Camera::LsstSim,
        SetupOptions {
            root: Some(
                args.common
                    .root
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(default_root)),
            ),
            out_root: Some(args.common.out_root.clone()),
            registry: args.common.registry.clone(),
            calib_root: args.common.calib_root.clone(),
            policy: args.common.policy.clone(),
            needs_calib: needs.calib,
        },
    )?;

    let mut plan = IterationPlan::new();
    if needs.sky_tile {
        plan.set(
            Axis::SkyTile,
            resolve_axis(
                &in_repo,
                QUERY_DATASET,
                Axis::SkyTile,
                int_values(&args.common.sky_tile),
            )?,
        );
    } else {
        for axis in Camera::LsstSim.exposure_axes(needs) {
            let requested = match axis {
                Axis::Visit => int_values(&args.common.visit),
                Axis::Snap => int_values(&args.snap),
                Axis::Raft => text_values(&args.raft),
                Axis::Sensor => text_values(&args.sensor),
                Axis::Channel => text_values(&args.channel),
                _ => Vec::new(),
            };
            plan.set(axis, resolve_axis(&in_repo, QUERY_DATASET, axis, requested)?);
        }
    }

    PipelineDriver::new(&in_repo, &out_repo, out_dataset, args.common.force).run(&plan, process)
}
