use crate::dataid::{Axis, AxisValue, DataId};
use crate::exposure::{Exposure, ExposureHeader};

pub mod error;
pub use error::RepoError;

pub mod mapper;
pub use mapper::{DatasetTemplate, Mapper, MapperPolicy};

pub mod registry;
pub use registry::Registry;

pub mod fs;
pub use fs::FsRepository;

/// Data-access seam between the driver and physical storage. Processing
/// functions receive repositories only through this trait.
pub trait Repository {
    /// Every known value of an axis for a dataset type.
    fn query_metadata(&self, dataset: &str, axis: Axis) -> Result<Vec<AxisValue>, RepoError>;

    /// Whether the dataset exists for the given data ID.
    fn dataset_exists(&self, dataset: &str, data_id: &DataId) -> Result<bool, RepoError>;

    /// Full retrieval: metadata plus pixels when stored.
    fn get(&self, dataset: &str, data_id: &DataId) -> Result<Exposure, RepoError>;

    /// Minimal retrieval: metadata and image dimensions only, without
    /// decoding pixel data.
    fn get_header(&self, dataset: &str, data_id: &DataId) -> Result<ExposureHeader, RepoError>;
}
