use crate::error::MalformedInput;

/// Scale factor between fixed-point E7 coordinates and decimal degrees.
pub const E7_SCALE: f64 = 10_000_000.0;

/// Converts a fixed-point E7 coordinate to decimal degrees.
pub fn e7_to_degrees(value: i32) -> f64 {
    value as f64 / E7_SCALE
}

/// One recorded position from the location history.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(try_from = "RawLocation")]
pub struct LocationSample {
    pub latitude_e7: i32,
    pub longitude_e7: i32,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl LocationSample {
    pub fn new(latitude_e7: i32, longitude_e7: i32, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        LocationSample {
            latitude_e7,
            longitude_e7,
            timestamp,
        }
    }

    /// Latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        e7_to_degrees(self.latitude_e7)
    }

    /// Longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        e7_to_degrees(self.longitude_e7)
    }
}

/// A single record as it appears in a Takeout `Records.json`.
///
/// Newer exports carry an RFC 3339 `timestamp`, older ones a `timestampMs`
/// string holding Unix milliseconds. Every other field is ignored.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLocation {
    latitude_e7: i32,
    longitude_e7: i32,
    #[serde(default)]
    timestamp: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    timestamp_ms: Option<String>,
}

impl TryFrom<RawLocation> for LocationSample {
    type Error = String;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        let timestamp = match (raw.timestamp, raw.timestamp_ms) {
            (Some(ts), _) => ts,
            (None, Some(ms)) => {
                let millis = ms
                    .parse::<i64>()
                    .map_err(|e| format!("invalid timestampMs {:?}: {}", ms, e))?;
                chrono::DateTime::<chrono::Utc>::from_timestamp_millis(millis)
                    .ok_or_else(|| format!("timestampMs out of range: {}", millis))?
            }
            (None, None) => return Err("missing field `timestamp`".to_string()),
        };

        Ok(LocationSample::new(raw.latitude_e7, raw.longitude_e7, timestamp))
    }
}

/// Top-level layout of the export.
#[derive(Debug, serde::Deserialize)]
struct LocationFile {
    locations: Vec<LocationSample>,
}

/// Location history ordered by timestamp.
///
/// Backed by a sorted vector sliced with binary search, so two samples sharing
/// a timestamp are both kept. Their relative order is not guaranteed.
/// Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct LocationIndex {
    samples: Vec<LocationSample>,
}

impl LocationIndex {
    /// Builds the index from samples in any order.
    pub fn new(mut samples: Vec<LocationSample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        LocationIndex { samples }
    }

    /// Parses a `{"locations": [...]}` document held in memory.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MalformedInput> {
        let file: LocationFile = serde_json::from_slice(bytes)?;
        Ok(LocationIndex::new(file.locations))
    }

    /// Reads and parses a `Records.json` file.
    ///
    /// # Arguments
    /// * `path` - Path to the Takeout location history export.
    ///
    /// # Returns
    /// * `Result<LocationIndex, MalformedInput>` - The built index, or why it could not be built.
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, MalformedInput> {
        let data = std::fs::read(path)?;
        Self::from_slice(&data)
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Ascending traversal of every sample with `low <= timestamp <= high`.
    ///
    /// Each call starts a fresh traversal. Yields nothing when `low > high`.
    pub fn range(
        &self,
        low: chrono::DateTime<chrono::Utc>,
        high: chrono::DateTime<chrono::Utc>,
    ) -> std::slice::Iter<'_, LocationSample> {
        if low > high {
            return self.samples[..0].iter();
        }
        let start = self.samples.partition_point(|s| s.timestamp < low);
        let end = self.samples.partition_point(|s| s.timestamp <= high);
        self.samples[start..end].iter()
    }

    /// Ascending traversal of the whole index.
    pub fn iter(&self) -> std::slice::Iter<'_, LocationSample> {
        self.samples.iter()
    }

    /// Earliest sample, if any.
    pub fn first(&self) -> Option<&LocationSample> {
        self.samples.first()
    }

    /// Latest sample, if any.
    pub fn last(&self) -> Option<&LocationSample> {
        self.samples.last()
    }
}
