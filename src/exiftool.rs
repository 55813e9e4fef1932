//! Reading and writing photo metadata through the external `exiftool` binary.

use crate::error::ExifToolError;
use crate::index::LocationSample;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

/// Metadata fields the fixer cares about for one photo.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhotoMetadata {
    pub path: PathBuf,
    /// Latitude or longitude is already present.
    pub has_gps: bool,
    /// Raw `DateTimeOriginal` value, if present.
    pub date_time_original: Option<String>,
    /// Why exiftool could not read this photo.
    pub error: Option<String>,
}

/// Coordinates to write, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsFix {
    pub fn latitude_ref(&self) -> &'static str {
        if self.latitude < 0.0 { "S" } else { "N" }
    }

    pub fn longitude_ref(&self) -> &'static str {
        if self.longitude < 0.0 { "W" } else { "E" }
    }
}

impl From<&LocationSample> for GpsFix {
    fn from(sample: &LocationSample) -> Self {
        GpsFix {
            latitude: sample.latitude(),
            longitude: sample.longitude(),
        }
    }
}

/// Reads and writes photo metadata.
pub trait MetadataTool {
    /// Extracts metadata for every photo, in the order given.
    fn read(&self, photos: &[PathBuf]) -> Result<Vec<PhotoMetadata>, ExifToolError>;

    /// Writes GPS latitude/longitude and their hemisphere references.
    fn write_gps(&self, photo: &Path, fix: &GpsFix) -> Result<(), ExifToolError>;
}

/// One entry of `exiftool -json` output.
#[derive(Debug, serde::Deserialize)]
struct RawMetadata {
    #[serde(rename = "SourceFile")]
    source_file: String,
    #[serde(rename = "GPSLatitude")]
    gps_latitude: Option<serde_json::Value>,
    #[serde(rename = "GPSLongitude")]
    gps_longitude: Option<serde_json::Value>,
    #[serde(rename = "DateTimeOriginal")]
    date_time_original: Option<serde_json::Value>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

impl RawMetadata {
    fn into_metadata(self, path: PathBuf) -> PhotoMetadata {
        let date_time_original = match self.date_time_original {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };
        PhotoMetadata {
            path,
            has_gps: self.gps_latitude.is_some() || self.gps_longitude.is_some(),
            date_time_original,
            error: self.error,
        }
    }
}

/// Comparison key for a path as exiftool reports it in `SourceFile`.
///
/// exiftool prints `/` separators on every platform.
fn source_key(path: &str) -> String {
    path.replace('\\', "/")
}

/// Builds the `-@ -` argfile: one path per line.
fn argfile(photos: &[PathBuf]) -> String {
    let mut list = String::new();
    for photo in photos {
        list.push_str(&photo.to_string_lossy());
        list.push('\n');
    }
    list
}

/// Matches `exiftool -json` output back to the requested photos.
///
/// Photos exiftool skipped entirely get an error entry.
fn parse_read_output(stdout: &str, photos: &[PathBuf]) -> Result<Vec<PhotoMetadata>, ExifToolError> {
    let raw: Vec<RawMetadata> = if stdout.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(stdout)?
    };

    let mut by_source: std::collections::HashMap<String, RawMetadata> = raw
        .into_iter()
        .map(|entry| (source_key(&entry.source_file), entry))
        .collect();

    Ok(photos
        .iter()
        .map(|photo| match by_source.remove(&source_key(&photo.to_string_lossy())) {
            Some(entry) => entry.into_metadata(photo.clone()),
            None => PhotoMetadata {
                path: photo.clone(),
                error: Some("no metadata returned by exiftool".to_string()),
                ..Default::default()
            },
        })
        .collect())
}

/// `MetadataTool` backed by the `exiftool` command-line program.
#[derive(Debug, Clone)]
pub struct ExifTool {
    binary: String,
}

impl ExifTool {
    pub fn new(binary: impl Into<String>) -> Self {
        ExifTool { binary: binary.into() }
    }

    fn output(&self, command: &mut Command) -> Result<std::process::Output, ExifToolError> {
        command.output().map_err(|source| ExifToolError::Spawn {
            binary: self.binary.clone(),
            source,
        })
    }

    /// Runs `exiftool -ver` and returns the reported version.
    pub fn check(&self) -> Result<String, ExifToolError> {
        let output = self.output(Command::new(&self.binary).arg("-ver"))?;
        if !output.status.success() {
            return Err(failed(&output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn failed(output: &std::process::Output) -> ExifToolError {
    ExifToolError::Failed {
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

impl MetadataTool for ExifTool {
    fn read(&self, photos: &[PathBuf]) -> Result<Vec<PhotoMetadata>, ExifToolError> {
        if photos.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = photos.len(), "Extracting metadata with exiftool");
        // Paths go through stdin so the command line stays short for any
        // library size.
        let mut child = Command::new(&self.binary)
            .args(["-json", "-n", "-GPSLatitude", "-GPSLongitude", "-DateTimeOriginal", "-@", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExifToolError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let list = argfile(photos);
        let feeder = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || stdin.write_all(list.as_bytes()))
        });

        let output = child.wait_with_output().map_err(ExifToolError::Pipe)?;

        if let Some(feeder) = feeder {
            match feeder.join() {
                Ok(Ok(())) => {}
                // exiftool quit before reading every path; its exit status
                // and output decide what happened.
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!("exiftool closed its input early");
                }
                Ok(Err(e)) => return Err(ExifToolError::Pipe(e)),
                Err(_) => {
                    return Err(ExifToolError::Pipe(std::io::Error::other(
                        "file list writer panicked",
                    )));
                }
            }
        }

        // exiftool exits non-zero when any single file fails but still prints
        // JSON for the rest.
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() && stdout.trim().is_empty() {
            return Err(failed(&output));
        }

        parse_read_output(&stdout, photos)
    }

    fn write_gps(&self, photo: &Path, fix: &GpsFix) -> Result<(), ExifToolError> {
        debug!(photo = %photo.display(), latitude = fix.latitude, longitude = fix.longitude, "Writing GPS metadata");
        let output = self.output(
            Command::new(&self.binary)
                .arg("-overwrite_original")
                .arg("-n")
                .arg(format!("-GPSLatitude={}", fix.latitude.abs()))
                .arg(format!("-GPSLatitudeRef={}", fix.latitude_ref()))
                .arg(format!("-GPSLongitude={}", fix.longitude.abs()))
                .arg(format!("-GPSLongitudeRef={}", fix.longitude_ref()))
                .arg(photo),
        )?;

        if !output.status.success() {
            return Err(failed(&output));
        }
        Ok(())
    }
}
