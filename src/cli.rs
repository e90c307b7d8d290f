//! Command-line options for pipeline driver tasks.
//!
//! The option set depends on the camera and on the task's need set: CFHT
//! tasks take integer `--ccd`/`--amp` selectors while LSST simulator tasks
//! take `--snap` and the raft/sensor/channel detector coordinates. Axis
//! options outside the task's need set are rejected after parsing.

use crate::dataid::TaskNeeds;

use clap::{Args, Parser};
use std::fmt;
use std::path::PathBuf;

/// An option that exists on the command line but is not used by the task
/// being run.
#[derive(Debug)]
pub struct UnusedOptionError {
    pub flag: &'static str,
}

impl fmt::Display for UnusedOptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "option {} is not used by this task", self.flag)
    }
}

impl std::error::Error for UnusedOptionError {}

/// Options shared by both cameras.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Input repository root
    #[arg(short = 'i', long = "input", value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Output repository root
    #[arg(short = 'o', long = "output", value_name = "ROOT", default_value = ".")]
    pub out_root: PathBuf,

    /// Execute even if the output dataset exists
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Registry database
    #[arg(short = 'R', long, value_name = "FILE")]
    pub registry: Option<PathBuf>,

    /// Calibration repository root
    #[arg(short = 'C', long = "calib-root", value_name = "ROOT")]
    pub calib_root: Option<PathBuf>,

    /// Mapper policy file overriding the camera's dataset layout
    #[arg(short = 'p', long, value_name = "FILE")]
    pub policy: Option<PathBuf>,

    /// Sky tile number (can be repeated)
    #[arg(short = 't', long = "sky-tile", value_name = "TILE")]
    pub sky_tile: Vec<i64>,

    /// Visit number (can be repeated)
    #[arg(short = 'v', long, value_name = "VISIT")]
    pub visit: Vec<i64>,
}

impl CommonArgs {
    fn validate(&self, needs: &TaskNeeds) -> Result<(), UnusedOptionError> {
        if !needs.calib && self.calib_root.is_some() {
            return Err(UnusedOptionError {
                flag: "--calib-root",
            });
        }
        if needs.sky_tile {
            if !self.visit.is_empty() {
                return Err(UnusedOptionError { flag: "--visit" });
            }
        } else if !self.sky_tile.is_empty() {
            return Err(UnusedOptionError { flag: "--sky-tile" });
        }
        Ok(())
    }
}

/// Driver options for CFHT tasks.
#[derive(Parser, Debug, Clone, Default)]
#[command(about = "Batch pipeline driver for a CFHT data repository")]
pub struct CfhtArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// CCD number (can be repeated)
    #[arg(short = 'c', long, value_name = "CCD")]
    pub ccd: Vec<i64>,

    /// Amp number (can be repeated)
    #[arg(short = 'a', long, value_name = "AMP")]
    pub amp: Vec<i64>,
}

impl CfhtArgs {
    pub fn validate(&self, needs: &TaskNeeds) -> Result<(), UnusedOptionError> {
        self.common.validate(needs)?;
        if !needs.needs_ccd() && !self.ccd.is_empty() {
            return Err(UnusedOptionError { flag: "--ccd" });
        }
        if !needs.amp && !self.amp.is_empty() {
            return Err(UnusedOptionError { flag: "--amp" });
        }
        Ok(())
    }
}

/// Driver options for LSST simulator tasks.
#[derive(Parser, Debug, Clone, Default)]
#[command(about = "Batch pipeline driver for an LSST simulator data repository")]
pub struct LsstSimArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Snap number (can be repeated)
    #[arg(short = 'S', long, value_name = "SNAP")]
    pub snap: Vec<i64>,

    /// Raft coordinates, e.g. 2,3 (can be repeated)
    #[arg(short = 'r', long, value_name = "RAFT")]
    pub raft: Vec<String>,

    /// Sensor coordinates, e.g. 1,1 (can be repeated)
    #[arg(short = 's', long, value_name = "SENSOR")]
    pub sensor: Vec<String>,

    /// Channel coordinates, e.g. 0,0 (can be repeated)
    #[arg(short = 'a', long, value_name = "CHANNEL")]
    pub channel: Vec<String>,
}

impl LsstSimArgs {
    pub fn validate(&self, needs: &TaskNeeds) -> Result<(), UnusedOptionError> {
        self.common.validate(needs)?;
        if !needs.snap && !self.snap.is_empty() {
            return Err(UnusedOptionError { flag: "--snap" });
        }
        if !needs.needs_raft_sensor() {
            if !self.raft.is_empty() {
                return Err(UnusedOptionError { flag: "--raft" });
            }
            if !self.sensor.is_empty() {
                return Err(UnusedOptionError { flag: "--sensor" });
            }
        }
        if !needs.channel && !self.channel.is_empty() {
            return Err(UnusedOptionError { flag: "--channel" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cfht_repeatable_axis_options() {
        let args = CfhtArgs::parse_from([
            "task", "-i", "/in", "-o", "/out", "-v", "100", "-v", "101", "-c", "3", "-a", "0",
            "-a", "1",
        ]);
        assert_eq!(args.common.visit, vec![100, 101]);
        assert_eq!(args.ccd, vec![3]);
        assert_eq!(args.amp, vec![0, 1]);
        assert!(!args.common.force);
    }

    #[test]
    fn test_lsst_sim_short_a_is_channel() {
        let args = LsstSimArgs::parse_from(["task", "-a", "0,1", "-r", "2,3", "-s", "1,1"]);
        assert_eq!(args.channel, vec!["0,1".to_string()]);
        assert_eq!(args.raft, vec!["2,3".to_string()]);
    }

    #[test]
    fn test_validate_rejects_axis_outside_need_set() {
        let args = CfhtArgs::parse_from(["task", "-v", "100", "-a", "0"]);
        let needs = TaskNeeds {
            ccd: true,
            ..TaskNeeds::default()
        };
        let err = args.validate(&needs).unwrap_err();
        assert_eq!(err.flag, "--amp");
    }

    #[test]
    fn test_validate_rejects_calib_root_when_not_needed() {
        let args = CfhtArgs::parse_from(["task", "-C", "/calib"]);
        let err = args.validate(&TaskNeeds::new()).unwrap_err();
        assert_eq!(err.flag, "--calib-root");
    }

    #[test]
    fn test_validate_sky_tile_task_rejects_visit() {
        let args = CfhtArgs::parse_from(["task", "-v", "100"]);
        let needs = TaskNeeds {
            sky_tile: true,
            ..TaskNeeds::default()
        };
        let err = args.validate(&needs).unwrap_err();
        assert_eq!(err.flag, "--visit");
    }

    #[test]
    fn test_validate_exposure_task_rejects_sky_tile() {
        let args = LsstSimArgs::parse_from(["task", "-t", "99"]);
        let err = args.validate(&TaskNeeds::new()).unwrap_err();
        assert_eq!(err.flag, "--sky-tile");
    }

    #[test]
    fn test_force_and_registry() {
        let args = LsstSimArgs::parse_from(["task", "-f", "-R", "/data/registry.sqlite3"]);
        assert!(args.common.force);
        assert_eq!(
            args.common.registry.as_deref(),
            Some(std::path::Path::new("/data/registry.sqlite3"))
        );
    }
}
