use crate::camera::Camera;
use crate::dataid::{Axis, AxisValue, DataId};
use crate::exposure::{self, Exposure, ExposureHeader};
use crate::repo::mapper::{Mapper, MapperPolicy};
use crate::repo::registry::Registry;
use crate::repo::{RepoError, Repository};

use std::path::{Path, PathBuf};

/// Filesystem-backed repository: a mapper translating dataset type + data
/// ID into paths, with an optional SQLite registry for metadata queries.
/// Without a registry, metadata queries scan the stored files instead.
#[derive(Debug)]
pub struct FsRepository {
    mapper: Mapper,
    registry: Option<Registry>,
}

impl FsRepository {
    /// Opens a repository with the camera's built-in mapper policy and no
    /// registry.
    pub fn open(camera: Camera, root: impl Into<PathBuf>) -> FsRepository {
        FsRepository {
            mapper: Mapper::new(MapperPolicy::for_camera(camera), root),
            registry: None,
        }
    }

    /// Replaces the built-in mapper policy, e.g. with one loaded from a
    /// policy file. Root and calibration root are kept.
    pub fn with_policy(mut self, policy: MapperPolicy) -> FsRepository {
        self.mapper.set_policy(policy);
        self
    }

    pub fn with_registry(mut self, path: impl AsRef<Path>) -> Result<FsRepository, RepoError> {
        self.registry = Some(Registry::open(path)?);
        Ok(self)
    }

    pub fn with_calib_root(mut self, path: impl Into<PathBuf>) -> FsRepository {
        self.mapper.set_calib_root(path);
        self
    }

    pub fn root(&self) -> &Path {
        self.mapper.root()
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }
}

impl Repository for FsRepository {
    fn query_metadata(&self, dataset: &str, axis: Axis) -> Result<Vec<AxisValue>, RepoError> {
        if let Some(registry) = &self.registry {
            if registry.has_dataset(dataset)? {
                return registry.query_column(dataset, axis);
            }
        }
        self.mapper.scan_axis(dataset, axis)
    }

    fn dataset_exists(&self, dataset: &str, data_id: &DataId) -> Result<bool, RepoError> {
        if let Some(registry) = &self.registry {
            if registry.has_dataset(dataset)? {
                let axes = self.mapper.template_axes(dataset)?;
                return registry.contains(dataset, &axes, data_id);
            }
        }
        Ok(self.mapper.sidecar_path(dataset, data_id)?.exists())
    }

    fn get(&self, dataset: &str, data_id: &DataId) -> Result<Exposure, RepoError> {
        let sidecar = self.mapper.sidecar_path(dataset, data_id)?;
        if !sidecar.exists() {
            return Err(RepoError::NotFound {
                dataset: dataset.to_string(),
                data_id: data_id.clone(),
            });
        }
        let info = exposure::read_sidecar(&sidecar)?;
        let pixel_path = self.mapper.pixel_path(dataset, data_id)?;
        let pixels = if pixel_path.exists() {
            Some(exposure::read_pixels(&pixel_path)?)
        } else {
            None
        };
        Ok(Exposure { info, pixels })
    }

    fn get_header(&self, dataset: &str, data_id: &DataId) -> Result<ExposureHeader, RepoError> {
        let sidecar = self.mapper.sidecar_path(dataset, data_id)?;
        if !sidecar.exists() {
            return Err(RepoError::NotFound {
                dataset: dataset.to_string(),
                data_id: data_id.clone(),
            });
        }
        let info = exposure::read_sidecar(&sidecar)?;
        let pixel_path = self.mapper.pixel_path(dataset, data_id)?;
        let dimensions = if pixel_path.exists() {
            Some(exposure::read_dimensions(&pixel_path)?)
        } else {
            None
        };
        Ok(ExposureHeader { info, dimensions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn write_raw(root: &Path, visit: i64, ccd: i64, amp: i64, psf: bool) {
        let dir = root.join("raw");
        fs::create_dir_all(&dir).unwrap();
        let psf_block = if psf {
            r#", "psf": {"model": "doubleGaussian", "fwhm": 0.8}"#
        } else {
            ""
        };
        let body = format!(
            r#"{{"filter": "g", "exptime": 15.0, "obs_date": "2011-03-01T04:30:00Z"{}}}"#,
            psf_block
        );
        fs::write(dir.join(format!("v{}-c{}-a{}.json", visit, ccd, amp)), body).unwrap();
    }

    fn sample_repo() -> (TempDir, FsRepository) {
        let dir = tempdir().unwrap();
        write_raw(dir.path(), 100, 0, 0, true);
        write_raw(dir.path(), 100, 0, 1, false);
        write_raw(dir.path(), 101, 1, 0, true);
        let repo = FsRepository::open(Camera::Cfht, dir.path());
        (dir, repo)
    }

    #[test]
    fn test_query_metadata_scans_without_registry() {
        let (_dir, repo) = sample_repo();
        assert_eq!(
            repo.query_metadata("raw", Axis::Visit).unwrap(),
            vec![AxisValue::Int(100), AxisValue::Int(101)]
        );
    }

    #[test]
    fn test_query_metadata_prefers_registry() {
        let (dir, repo) = sample_repo();
        let registry_path = dir.path().join("registry.sqlite3");
        {
            let registry = Registry::open(&registry_path).unwrap();
            // deliberately different from what is on disk
            let id = DataId::new()
                .with(Axis::Visit, 999)
                .with(Axis::Ccd, 0)
                .with(Axis::Amp, 0);
            registry.insert("raw", &id).unwrap();
        }
        let repo = repo.with_registry(&registry_path).unwrap();
        assert_eq!(
            repo.query_metadata("raw", Axis::Visit).unwrap(),
            vec![AxisValue::Int(999)]
        );
    }

    #[test]
    fn test_registry_without_table_falls_back_to_scan() {
        let (dir, repo) = sample_repo();
        let registry_path = dir.path().join("registry.sqlite3");
        Registry::open(&registry_path).unwrap();
        let repo = repo.with_registry(&registry_path).unwrap();
        assert_eq!(
            repo.query_metadata("raw", Axis::Ccd).unwrap(),
            vec![AxisValue::Int(0), AxisValue::Int(1)]
        );
    }

    #[test]
    fn test_dataset_exists() {
        let (_dir, repo) = sample_repo();
        let present = DataId::new()
            .with(Axis::Visit, 100)
            .with(Axis::Ccd, 0)
            .with(Axis::Amp, 0);
        assert!(repo.dataset_exists("raw", &present).unwrap());

        let absent = DataId::new()
            .with(Axis::Visit, 100)
            .with(Axis::Ccd, 5)
            .with(Axis::Amp, 0);
        assert!(!repo.dataset_exists("raw", &absent).unwrap());
    }

    #[test]
    fn test_dataset_exists_answered_from_registry() {
        let (dir, repo) = sample_repo();
        let registry_path = dir.path().join("registry.sqlite3");
        {
            let registry = Registry::open(&registry_path).unwrap();
            let id = DataId::new()
                .with(Axis::Visit, 999)
                .with(Axis::Ccd, 0)
                .with(Axis::Amp, 0);
            registry.insert("raw", &id).unwrap();
        }
        let repo = repo.with_registry(&registry_path).unwrap();

        // registered but not on disk
        let registered = DataId::new()
            .with(Axis::Visit, 999)
            .with(Axis::Ccd, 0)
            .with(Axis::Amp, 0);
        assert!(repo.dataset_exists("raw", &registered).unwrap());

        // on disk but not registered: the registry table is authoritative
        let unregistered = DataId::new()
            .with(Axis::Visit, 100)
            .with(Axis::Ccd, 0)
            .with(Axis::Amp, 0);
        assert!(!repo.dataset_exists("raw", &unregistered).unwrap());

        // no calexp table, so existence falls back to the filesystem
        let calexp = DataId::new().with(Axis::Visit, 100).with(Axis::Ccd, 0);
        assert!(!repo.dataset_exists("calexp", &calexp).unwrap());
        let dir_calexp = dir.path().join("calexp");
        fs::create_dir_all(&dir_calexp).unwrap();
        fs::write(dir_calexp.join("v100-c0.json"), "{}").unwrap();
        assert!(repo.dataset_exists("calexp", &calexp).unwrap());
    }

    #[test]
    fn test_with_policy_overrides_layout() {
        let dir = tempdir().unwrap();
        let inputs = dir.path().join("inputs");
        fs::create_dir_all(&inputs).unwrap();
        fs::write(
            inputs.join("42.json"),
            r#"{"filter": "r", "exptime": 30.0, "obs_date": "2011-03-01T04:30:00Z"}"#,
        )
        .unwrap();

        let policy: MapperPolicy =
            serde_json::from_str(r#"{"datasets": {"raw": {"template": "inputs/{visit}.json"}}}"#)
                .unwrap();
        let repo = FsRepository::open(Camera::Cfht, dir.path()).with_policy(policy);

        let id = DataId::new().with(Axis::Visit, 42);
        assert!(repo.dataset_exists("raw", &id).unwrap());
        assert_eq!(repo.get("raw", &id).unwrap().info.filter, "r");
        assert_eq!(
            repo.query_metadata("raw", Axis::Visit).unwrap(),
            vec![AxisValue::Int(42)]
        );
        // default CFHT datasets are gone once the policy is replaced
        assert!(matches!(
            repo.dataset_exists("calexp", &id),
            Err(RepoError::UnknownDatasetType(_))
        ));
    }

    #[test]
    fn test_get_returns_not_found() {
        let (_dir, repo) = sample_repo();
        let absent = DataId::new()
            .with(Axis::Visit, 42)
            .with(Axis::Ccd, 0)
            .with(Axis::Amp, 0);
        let err = repo.get("raw", &absent);
        assert!(matches!(err, Err(RepoError::NotFound { .. })));
    }

    #[test]
    fn test_get_and_get_header_without_pixel_file() {
        let (_dir, repo) = sample_repo();
        let id = DataId::new()
            .with(Axis::Visit, 100)
            .with(Axis::Ccd, 0)
            .with(Axis::Amp, 0);

        let exposure = repo.get("raw", &id).unwrap();
        assert!(exposure.pixels.is_none());
        assert_eq!(exposure.psf().unwrap().fwhm, 0.8);

        let header = repo.get_header("raw", &id).unwrap();
        assert!(header.dimensions.is_none());
        assert_eq!(header.psf().unwrap().model, "doubleGaussian");
    }

    #[test]
    fn test_get_header_reads_dimensions_not_pixels() {
        use std::fs::File;
        use tiff::encoder::{TiffEncoder, colortype};

        let (dir, repo) = sample_repo();
        let pixel_path = dir.path().join("raw/v100-c0-a0.tif");
        let file = File::create(&pixel_path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        let data: Vec<f32> = vec![1.0; 16];
        encoder
            .write_image::<colortype::Gray32Float>(4, 4, &data)
            .unwrap();

        let id = DataId::new()
            .with(Axis::Visit, 100)
            .with(Axis::Ccd, 0)
            .with(Axis::Amp, 0);
        let header = repo.get_header("raw", &id).unwrap();
        assert_eq!(header.dimensions, Some((4, 4)));

        let exposure = repo.get("raw", &id).unwrap();
        assert_eq!(exposure.pixels.unwrap().buffer.len(), 16);
    }
}
