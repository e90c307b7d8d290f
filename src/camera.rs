use crate::dataid::{Axis, TaskNeeds};
use std::path::{Path, PathBuf};

/// File name of the SQLite registry inside a repository root.
pub const REGISTRY_FILE: &str = "registry.sqlite3";

const CFHT_SITE_ROOT: &str = "/lsst/DC3/data/obstest/CFHTLS";
const LSST_SIM_SITE_ROOT: &str = "/lsst/DC3/data/obstest/ImSim";

/// The two supported camera geometries.
///
/// CFHT exposures subdivide into integer-numbered CCDs and amps. The LSST
/// simulator subdivides into rafts, sensors and channels addressed by
/// detector coordinates, with an optional snap index per visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Camera {
    Cfht,
    LsstSim,
}

impl Camera {
    pub fn name(&self) -> &'static str {
        match self {
            Camera::Cfht => "cfht",
            Camera::LsstSim => "lsstSim",
        }
    }

    /// The exposure-space axes this camera iterates for a given need set,
    /// in nesting order. Empty for sky-tile tasks, which iterate the
    /// skyTile axis alone.
    pub fn exposure_axes(&self, needs: &TaskNeeds) -> Vec<Axis> {
        let mut axes = vec![Axis::Visit];
        match self {
            Camera::Cfht => {
                if needs.needs_ccd() {
                    axes.push(Axis::Ccd);
                }
                if needs.amp {
                    axes.push(Axis::Amp);
                }
            }
            Camera::LsstSim => {
                if needs.snap {
                    axes.push(Axis::Snap);
                }
                if needs.needs_raft_sensor() {
                    axes.push(Axis::Raft);
                    axes.push(Axis::Sensor);
                }
                if needs.channel {
                    axes.push(Axis::Channel);
                }
            }
        }
        axes
    }

    /// Candidate registry locations, tried in order: the repository's own
    /// registry file, then the site data directory.
    pub fn registry_candidates(&self, root: &Path) -> Vec<PathBuf> {
        vec![
            root.join(REGISTRY_FILE),
            Path::new(self.site_root()).join(REGISTRY_FILE),
        ]
    }

    /// Default calibration root when the task needs calibration products
    /// and none was given on the command line.
    pub fn default_calib_root(&self) -> PathBuf {
        match self {
            Camera::Cfht => Path::new(CFHT_SITE_ROOT).join("calib"),
            Camera::LsstSim => PathBuf::from(LSST_SIM_SITE_ROOT),
        }
    }

    fn site_root(&self) -> &'static str {
        match self {
            Camera::Cfht => CFHT_SITE_ROOT,
            Camera::LsstSim => LSST_SIM_SITE_ROOT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cfht_axes_for_amp_level_task() {
        let needs = TaskNeeds {
            amp: true,
            ..TaskNeeds::default()
        };
        assert_eq!(
            Camera::Cfht.exposure_axes(&needs),
            vec![Axis::Visit, Axis::Ccd, Axis::Amp]
        );
    }

    #[test]
    fn test_cfht_axes_for_visit_level_task() {
        assert_eq!(
            Camera::Cfht.exposure_axes(&TaskNeeds::new()),
            vec![Axis::Visit]
        );
    }

    #[test]
    fn test_lsst_sim_axes_for_channel_level_task() {
        let needs = TaskNeeds {
            snap: true,
            channel: true,
            ..TaskNeeds::default()
        };
        assert_eq!(
            Camera::LsstSim.exposure_axes(&needs),
            vec![
                Axis::Visit,
                Axis::Snap,
                Axis::Raft,
                Axis::Sensor,
                Axis::Channel
            ]
        );
    }

    #[test]
    fn test_lsst_sim_sensor_task_skips_snap_and_channel() {
        let needs = TaskNeeds {
            sensor: true,
            ..TaskNeeds::default()
        };
        assert_eq!(
            Camera::LsstSim.exposure_axes(&needs),
            vec![Axis::Visit, Axis::Raft, Axis::Sensor]
        );
    }

    #[test]
    fn test_registry_candidates_prefer_repo_root() {
        let candidates = Camera::Cfht.registry_candidates(Path::new("/data/run1"));
        assert_eq!(candidates[0], Path::new("/data/run1/registry.sqlite3"));
        assert_eq!(candidates.len(), 2);
    }
}
