use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Identifier axes for survey exposures and their subdivisions.
///
/// Declaration order is the loop nesting order used by the driver:
/// visit, then snap, then the detector axes, then channel. Sky tiles
/// are iterated on their own and never mix with the exposure axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub enum Axis {
    #[serde(rename = "visit")]
    Visit,
    #[serde(rename = "snap")]
    Snap,
    #[serde(rename = "raft")]
    Raft,
    #[serde(rename = "ccd")]
    Ccd,
    #[serde(rename = "sensor")]
    Sensor,
    #[serde(rename = "amp")]
    Amp,
    #[serde(rename = "channel")]
    Channel,
    #[serde(rename = "skyTile")]
    SkyTile,
}

impl Axis {
    pub fn name(&self) -> &'static str {
        match self {
            Axis::Visit => "visit",
            Axis::Snap => "snap",
            Axis::Raft => "raft",
            Axis::Ccd => "ccd",
            Axis::Sensor => "sensor",
            Axis::Amp => "amp",
            Axis::Channel => "channel",
            Axis::SkyTile => "skyTile",
        }
    }

    pub fn from_name(name: &str) -> Option<Axis> {
        match name {
            "visit" => Some(Axis::Visit),
            "snap" => Some(Axis::Snap),
            "raft" => Some(Axis::Raft),
            "ccd" => Some(Axis::Ccd),
            "sensor" => Some(Axis::Sensor),
            "amp" => Some(Axis::Amp),
            "channel" => Some(Axis::Channel),
            "skyTile" => Some(Axis::SkyTile),
            _ => None,
        }
    }

    /// Plural label used in "Running over all ..." driver messages.
    pub fn plural_label(&self) -> &'static str {
        match self {
            Axis::Visit => "input visits",
            Axis::Snap => "snaps",
            Axis::Raft => "rafts",
            Axis::Ccd => "CCDs",
            Axis::Sensor => "sensors",
            Axis::Amp => "amps",
            Axis::Channel => "channels",
            Axis::SkyTile => "sky tiles",
        }
    }

    /// Raft, sensor and channel carry detector coordinates like "2,3";
    /// every other axis is an integer.
    pub fn is_integer(&self) -> bool {
        !matches!(self, Axis::Raft | Axis::Sensor | Axis::Channel)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single identifier value: an integer for visit/snap/ccd/amp/skyTile,
/// free text for the detector coordinate axes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AxisValue {
    Int(i64),
    Text(String),
}

impl AxisValue {
    /// Parses a command-line token for the given axis.
    pub fn parse_for(axis: Axis, token: &str) -> Result<AxisValue, DataIdError> {
        if axis.is_integer() {
            token
                .parse::<i64>()
                .map(AxisValue::Int)
                .map_err(|_| DataIdError::NotAnInteger {
                    axis,
                    token: token.to_string(),
                })
        } else {
            Ok(AxisValue::Text(token.to_string()))
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AxisValue::Int(v) => Some(*v),
            AxisValue::Text(_) => None,
        }
    }
}

impl From<i64> for AxisValue {
    fn from(v: i64) -> AxisValue {
        AxisValue::Int(v)
    }
}

impl From<&str> for AxisValue {
    fn from(v: &str) -> AxisValue {
        AxisValue::Text(v.to_string())
    }
}

impl From<String> for AxisValue {
    fn from(v: String) -> AxisValue {
        AxisValue::Text(v)
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Int(v) => write!(f, "{}", v),
            AxisValue::Text(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug)]
pub enum DataIdError {
    NotAnInteger { axis: Axis, token: String },
}

impl fmt::Display for DataIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIdError::NotAnInteger { axis, token } => {
                write!(f, "{} expects an integer value, got '{}'", axis, token)
            }
        }
    }
}

impl std::error::Error for DataIdError {}

/// One point in the identifier space, e.g. visit=85408556 ccd=12 amp=0.
///
/// Transient by design: the driver builds one per cross-product tuple and
/// hands it to the processing function. Iteration and display follow the
/// axis nesting order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataId {
    values: BTreeMap<Axis, AxisValue>,
}

impl DataId {
    pub fn new() -> DataId {
        DataId::default()
    }

    pub fn with(mut self, axis: Axis, value: impl Into<AxisValue>) -> DataId {
        self.set(axis, value);
        self
    }

    pub fn set(&mut self, axis: Axis, value: impl Into<AxisValue>) {
        self.values.insert(axis, value.into());
    }

    pub fn get(&self, axis: Axis) -> Option<&AxisValue> {
        self.values.get(&axis)
    }

    pub fn contains(&self, axis: Axis) -> bool {
        self.values.contains_key(&axis)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, &AxisValue)> {
        self.values.iter().map(|(a, v)| (*a, v))
    }

    pub fn axes(&self) -> impl Iterator<Item = Axis> + '_ {
        self.values.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (axis, value) in self.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}={}", axis, value)?;
            first = false;
        }
        Ok(())
    }
}

/// The axes a pipeline task needs, as declared by its author.
///
/// Visit is implicit for every exposure-space task; raft rides along with
/// sensor, and ccd with amp, mirroring how the detector hierarchy nests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskNeeds {
    pub calib: bool,
    pub sky_tile: bool,
    pub ccd: bool,
    pub amp: bool,
    pub snap: bool,
    pub sensor: bool,
    pub channel: bool,
}

impl TaskNeeds {
    pub fn new() -> TaskNeeds {
        TaskNeeds::default()
    }

    /// CCD loops run when the task asks for ccd- or amp-level data.
    pub fn needs_ccd(&self) -> bool {
        self.ccd || self.amp
    }

    /// Raft/sensor loops run when the task asks for sensor- or
    /// channel-level data.
    pub fn needs_raft_sensor(&self) -> bool {
        self.sensor || self.channel
    }
}
