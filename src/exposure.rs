use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};

/// Point-spread-function description carried in an exposure's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsfModel {
    /// Model family, e.g. "doubleGaussian".
    pub model: String,
    /// Full width at half maximum, arcseconds.
    pub fwhm: f64,
}

/// Exposure metadata stored as a JSON sidecar next to the pixel file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposureInfo {
    pub filter: String,
    pub exptime: f64,
    pub obs_date: DateTime<Utc>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub psf: Option<PsfModel>,
}

/// Exposure metadata plus image dimensions, read without decoding pixels.
#[derive(Debug, Clone)]
pub struct ExposureHeader {
    pub info: ExposureInfo,
    /// Width and height of the pixel plane, when a pixel file exists.
    pub dimensions: Option<(u32, u32)>,
}

impl ExposureHeader {
    pub fn psf(&self) -> Option<&PsfModel> {
        self.info.psf.as_ref()
    }
}

/// A single-band pixel plane.
#[derive(Debug, Clone)]
pub struct ImagePlane {
    pub width: u32,
    pub height: u32,
    pub buffer: Vec<f32>,
}

impl fmt::Display for ImagePlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min_value = self
            .buffer
            .iter()
            .filter(|&&x| !x.is_nan())
            .min_by(|a, b| a.partial_cmp(b).unwrap())
            .unwrap_or(&f32::NAN);

        let max_value = self
            .buffer
            .iter()
            .filter(|&&x| !x.is_nan())
            .max_by(|a, b| a.partial_cmp(b).unwrap())
            .unwrap_or(&f32::NAN);

        write!(
            f,
            "Width: {}\nHeight: {}\nMin value: {}\nMax value: {}",
            self.width, self.height, min_value, max_value,
        )
    }
}

/// A fully retrieved dataset: metadata plus pixels when a pixel file is
/// present for the mapped location.
#[derive(Debug, Clone)]
pub struct Exposure {
    pub info: ExposureInfo,
    pub pixels: Option<ImagePlane>,
}

impl Exposure {
    pub fn psf(&self) -> Option<&PsfModel> {
        self.info.psf.as_ref()
    }
}

#[derive(Debug)]
pub enum ExposureError {
    Io(std::io::Error),
    Sidecar(serde_json::Error),
    Pixels(String),
}

impl fmt::Display for ExposureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExposureError::Io(e) => write!(f, "I/O error: {}", e),
            ExposureError::Sidecar(e) => write!(f, "Failed to parse exposure sidecar: {}", e),
            ExposureError::Pixels(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ExposureError {}

impl From<std::io::Error> for ExposureError {
    fn from(err: std::io::Error) -> ExposureError {
        ExposureError::Io(err)
    }
}

impl From<serde_json::Error> for ExposureError {
    fn from(err: serde_json::Error) -> ExposureError {
        ExposureError::Sidecar(err)
    }
}

/// Reads the JSON metadata sidecar for an exposure.
pub fn read_sidecar(path: &Path) -> Result<ExposureInfo, ExposureError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let info: ExposureInfo = serde_json::from_reader(reader)?;
    Ok(info)
}

/// Reads only the image dimensions from a TIFF pixel file. The decoder
/// stops after the directory entries, so no pixel data is touched.
pub fn read_dimensions(path: &Path) -> Result<(u32, u32), ExposureError> {
    let file = File::open(path)
        .map_err(|e| ExposureError::Pixels(format!("Failed to open file: {}", e)))?;
    let reader = BufReader::new(file);

    let mut decoder = Decoder::new(reader)
        .map_err(|e| ExposureError::Pixels(format!("Failed to decode TIFF: {}", e)))?;

    decoder
        .dimensions()
        .map_err(|e| ExposureError::Pixels(format!("Failed to get dimensions: {}", e)))
}

/// Decodes the full pixel plane from a TIFF pixel file.
pub fn read_pixels(path: &Path) -> Result<ImagePlane, ExposureError> {
    let file = File::open(path)
        .map_err(|e| ExposureError::Pixels(format!("Failed to open file: {}", e)))?;
    let reader = BufReader::new(file);

    let mut decoder = Decoder::new(reader)
        .map_err(|e| ExposureError::Pixels(format!("Failed to decode TIFF: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| ExposureError::Pixels(format!("Failed to get dimensions: {}", e)))?;

    let buffer: Vec<f32> = match decoder
        .read_image()
        .map_err(|e| ExposureError::Pixels(format!("Failed to read image: {}", e)))?
    {
        DecodingResult::U8(data) => data.iter().map(|&x| x as f32).collect(),
        DecodingResult::U16(data) => data.iter().map(|&x| x as f32).collect(),
        DecodingResult::U32(data) => data.iter().map(|&x| x as f32).collect(),
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.iter().map(|&x| x as f32).collect(),
        _ => {
            return Err(ExposureError::Pixels(
                "Unsupported pixel format".to_string(),
            ));
        }
    };

    Ok(ImagePlane {
        width,
        height,
        buffer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn sample_sidecar(psf: bool) -> String {
        let psf_block = if psf {
            r#", "psf": {"model": "doubleGaussian", "fwhm": 0.7}"#
        } else {
            ""
        };
        format!(
            r#"{{
                "filter": "r",
                "exptime": 30.0,
                "obs_date": "2011-03-01T04:30:00Z",
                "object": "deep-field-1"{}
            }}"#,
            psf_block
        )
    }

    #[test]
    fn test_read_sidecar_with_psf() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exposure.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(sample_sidecar(true).as_bytes()).unwrap();

        let info = read_sidecar(&path).unwrap();
        assert_eq!(info.filter, "r");
        assert_eq!(info.psf.as_ref().unwrap().model, "doubleGaussian");
        assert_eq!(info.psf.as_ref().unwrap().fwhm, 0.7);
    }

    #[test]
    fn test_read_sidecar_without_psf() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exposure.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(sample_sidecar(false).as_bytes()).unwrap();

        let info = read_sidecar(&path).unwrap();
        assert!(info.psf.is_none());
        assert_eq!(info.object.as_deref(), Some("deep-field-1"));
    }

    #[test]
    fn test_read_sidecar_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_sidecar(&dir.path().join("nope.json"));
        assert!(matches!(err, Err(ExposureError::Io(_))));
    }

    #[test]
    fn test_read_pixels_and_dimensions() {
        use tiff::encoder::{TiffEncoder, colortype};

        let dir = tempdir().unwrap();
        let path = dir.path().join("exposure.tif");
        let file = File::create(&path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        let data: Vec<f32> = vec![0.0, 1.5, 2.5, 3.0, 4.0, 5.0];
        encoder
            .write_image::<colortype::Gray32Float>(3, 2, &data)
            .unwrap();

        assert_eq!(read_dimensions(&path).unwrap(), (3, 2));

        let plane = read_pixels(&path).unwrap();
        assert_eq!(plane.width, 3);
        assert_eq!(plane.height, 2);
        assert_eq!(plane.buffer, data);
    }
}
