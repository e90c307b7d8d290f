use crate::camera::Camera;
use crate::dataid::{Axis, AxisValue, DataId};
use crate::repo::RepoError;

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One dataset type's storage layout: a relative path template with
/// `{axis}` tokens for the metadata sidecar. The pixel file, when present,
/// sits next to the sidecar with a `.tif` extension.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetTemplate {
    pub template: String,
    /// Calibration products resolve under the calibration root.
    #[serde(default)]
    pub calib: bool,
}

/// Table of dataset templates for one camera, loadable from a JSON policy
/// file or built from per-camera defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct MapperPolicy {
    pub datasets: BTreeMap<String, DatasetTemplate>,
}

impl MapperPolicy {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<MapperPolicy, RepoError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let policy: MapperPolicy = serde_json::from_reader(reader)?;
        Ok(policy)
    }

    /// Built-in layout for a camera's standard dataset types.
    pub fn for_camera(camera: Camera) -> MapperPolicy {
        let mut datasets = BTreeMap::new();
        let mut add = |name: &str, template: &str, calib: bool| {
            datasets.insert(
                name.to_string(),
                DatasetTemplate {
                    template: template.to_string(),
                    calib,
                },
            );
        };

        match camera {
            Camera::Cfht => {
                add("raw", "raw/v{visit}-c{ccd}-a{amp}.json", false);
                add("postISR", "postISR/v{visit}-c{ccd}-a{amp}.json", false);
                add("calexp", "calexp/v{visit}-c{ccd}.json", false);
                add("src", "src/v{visit}-c{ccd}.json", false);
                add("bias", "bias/c{ccd}-a{amp}.json", true);
                add("flat", "flat/c{ccd}-a{amp}.json", true);
                add("coadd", "coadd/st{skyTile}.json", false);
            }
            Camera::LsstSim => {
                add(
                    "raw",
                    "raw/v{visit}-E{snap}-r{raft}-s{sensor}-C{channel}.json",
                    false,
                );
                add(
                    "postISR",
                    "postISR/v{visit}-E{snap}-r{raft}-s{sensor}-C{channel}.json",
                    false,
                );
                add("calexp", "calexp/v{visit}-r{raft}-s{sensor}.json", false);
                add("src", "src/v{visit}-r{raft}-s{sensor}.json", false);
                add("bias", "bias/r{raft}-s{sensor}-C{channel}.json", true);
                add("flat", "flat/r{raft}-s{sensor}-C{channel}.json", true);
                add("coadd", "coadd/st{skyTile}.json", false);
            }
        }

        MapperPolicy { datasets }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Token(Axis),
}

fn parse_template(template: &str) -> Result<Vec<Segment>, RepoError> {
    let mut segments = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        if open > 0 {
            segments.push(Segment::Literal(rest[..open].to_string()));
        }
        let Some(close) = rest[open..].find('}') else {
            return Err(RepoError::BadTemplate(format!(
                "unterminated token in '{}'",
                template
            )));
        };
        let name = &rest[open + 1..open + close];
        let axis = Axis::from_name(name).ok_or_else(|| {
            RepoError::BadTemplate(format!("unknown axis '{}' in '{}'", name, template))
        })?;
        segments.push(Segment::Token(axis));
        rest = &rest[open + close + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }
    Ok(segments)
}

/// Matches a relative path against a parsed template, capturing one value
/// per token. Token captures run up to the first occurrence of the next
/// literal segment; integer axes must parse or the match fails.
fn match_path(segments: &[Segment], path: &str) -> Option<DataId> {
    let mut pos = 0;
    let mut id = DataId::new();
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Literal(lit) => {
                if !path[pos..].starts_with(lit.as_str()) {
                    return None;
                }
                pos += lit.len();
            }
            Segment::Token(axis) => {
                let capture = match segments.get(i + 1) {
                    Some(Segment::Literal(lit)) => {
                        let end = path[pos..].find(lit.as_str())?;
                        &path[pos..pos + end]
                    }
                    _ => &path[pos..],
                };
                if capture.is_empty() {
                    return None;
                }
                let value = AxisValue::parse_for(*axis, capture).ok()?;
                pos += capture.len();
                id.set(*axis, value);
            }
        }
    }
    if pos == path.len() { Some(id) } else { None }
}

/// Translates dataset type + data ID into physical storage locations under
/// a repository root, and reverse-matches stored files back into data IDs
/// for registry-less repositories.
#[derive(Debug, Clone)]
pub struct Mapper {
    policy: MapperPolicy,
    root: PathBuf,
    calib_root: Option<PathBuf>,
}

impl Mapper {
    pub fn new(policy: MapperPolicy, root: impl Into<PathBuf>) -> Mapper {
        Mapper {
            policy,
            root: root.into(),
            calib_root: None,
        }
    }

    pub fn set_policy(&mut self, policy: MapperPolicy) {
        self.policy = policy;
    }

    pub fn set_calib_root(&mut self, path: impl Into<PathBuf>) {
        self.calib_root = Some(path.into());
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dataset(&self, name: &str) -> Result<&DatasetTemplate, RepoError> {
        self.policy
            .datasets
            .get(name)
            .ok_or_else(|| RepoError::UnknownDatasetType(name.to_string()))
    }

    fn base_dir(&self, template: &DatasetTemplate) -> &Path {
        if template.calib {
            self.calib_root.as_deref().unwrap_or(&self.root)
        } else {
            &self.root
        }
    }

    /// The axes named by a dataset type's template, in token order.
    pub fn template_axes(&self, dataset: &str) -> Result<Vec<Axis>, RepoError> {
        let template = self.dataset(dataset)?;
        let segments = parse_template(&template.template)?;
        Ok(segments
            .into_iter()
            .filter_map(|s| match s {
                Segment::Token(axis) => Some(axis),
                Segment::Literal(_) => None,
            })
            .collect())
    }

    /// Absolute path of the metadata sidecar for a dataset. Extra axes in
    /// the data ID are ignored; a missing template axis is an error.
    pub fn sidecar_path(&self, dataset: &str, data_id: &DataId) -> Result<PathBuf, RepoError> {
        let template = self.dataset(dataset)?;
        let segments = parse_template(&template.template)?;
        let mut rel = String::new();
        for segment in &segments {
            match segment {
                Segment::Literal(lit) => rel.push_str(lit),
                Segment::Token(axis) => {
                    let value =
                        data_id
                            .get(*axis)
                            .ok_or_else(|| RepoError::MissingAxis {
                                dataset: dataset.to_string(),
                                axis: *axis,
                            })?;
                    rel.push_str(&value.to_string());
                }
            }
        }
        Ok(self.base_dir(template).join(rel))
    }

    /// Pixel file next to the sidecar.
    pub fn pixel_path(&self, dataset: &str, data_id: &DataId) -> Result<PathBuf, RepoError> {
        Ok(self.sidecar_path(dataset, data_id)?.with_extension("tif"))
    }

    /// Every distinct value of one axis among the stored files of a
    /// dataset type. Walks the repository and reverse-matches paths
    /// against the template; used when no registry is available.
    pub fn scan_axis(&self, dataset: &str, axis: Axis) -> Result<Vec<AxisValue>, RepoError> {
        let template = self.dataset(dataset)?;
        let segments = parse_template(&template.template)?;
        let base = self.base_dir(template);

        let mut values = BTreeSet::new();
        if !base.exists() {
            return Ok(Vec::new());
        }
        for entry in WalkDir::new(base).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(base) else {
                continue;
            };
            let Some(rel) = rel.to_str() else { continue };
            if let Some(id) = match_path(&segments, rel) {
                if let Some(value) = id.get(axis) {
                    values.insert(value.clone());
                }
            }
        }
        Ok(values.into_iter().collect())
    }
}
