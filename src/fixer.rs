use crate::exiftool::{GpsFix, MetadataTool, PhotoMetadata};
use crate::file_processing;
use crate::index::{LocationIndex, LocationSample};
use crate::matcher;
use crate::utils;

use tracing::{debug, info, warn};

/// How far a location may be from the capture time to be used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// Only samples within this distance of the capture time.
    Within(chrono::TimeDelta),
    /// The closest sample anywhere in the history.
    Unbounded,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub processed: usize,
    pub written: usize,
    pub no_location_found: usize,
    pub no_date_time: usize,
    pub gps_already_set: usize,
    pub read_failed: usize,
    pub backup_failed: usize,
    pub write_failed: usize,
}

impl Summary {
    pub fn log(&self) {
        info!("Summary:");
        info!("\tFiles processed: {}", self.processed);
        info!("\tSuccessfully processed files: {}", self.written);
        info!("\tFiles with no location found: {}", self.no_location_found);
        info!("\tFiles with no date time found: {}", self.no_date_time);
        info!("\tFiles with GPS metadata already set: {}", self.gps_already_set);
        info!("\tFiles with unreadable metadata: {}", self.read_failed);
        info!("\tFiles with backup failure: {}", self.backup_failed);
        info!("\tFiles with write failure: {}", self.write_failed);
    }
}

/// A photo that will receive coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedWrite {
    pub path: std::path::PathBuf,
    pub capture_time: chrono::DateTime<chrono::Utc>,
    pub sample: LocationSample,
    pub fix: GpsFix,
}

/// Outcome of matching every photo, before anything is written.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub writes: Vec<PlannedWrite>,
    pub summary: Summary,
}

fn lookup<'a>(
    index: &'a LocationIndex,
    capture_time: chrono::DateTime<chrono::Utc>,
    tolerance: Tolerance,
) -> Option<&'a LocationSample> {
    match tolerance {
        Tolerance::Within(delta) => matcher::find_nearest(index, capture_time, delta),
        Tolerance::Unbounded => matcher::find_nearest_unbounded(index, capture_time),
    }
}

/// Decides, photo by photo, which ones get coordinates and from which sample.
///
/// Photos that already carry GPS data, have no usable capture time or have
/// no location close enough are skipped and counted.
///
/// # Arguments
/// * `index` - Location history.
/// * `metadata` - Metadata of every photo found, in processing order.
/// * `tolerance` - Matching window.
/// * `bar` - Progress bar advanced once per photo.
///
/// # Returns
/// * `Plan` - Photos to write plus the skip counters so far.
pub fn plan(
    index: &LocationIndex,
    metadata: &[PhotoMetadata],
    tolerance: Tolerance,
    bar: &indicatif::ProgressBar,
) -> Plan {
    let mut plan = Plan::default();
    plan.summary.processed = metadata.len();

    for photo in metadata {
        bar.inc(1);
        let file = photo.path.display();

        if let Some(err) = &photo.error {
            warn!("Skipping file {} because its metadata could not be read: {}", file, err);
            plan.summary.read_failed += 1;
            continue;
        }

        if photo.has_gps {
            debug!("Skipping file {} because it already has GPS metadata", file);
            plan.summary.gps_already_set += 1;
            continue;
        }

        let Some(raw_time) = photo.date_time_original.as_deref() else {
            warn!("Skipping file {} because we couldn't determine the time the photo was taken", file);
            plan.summary.no_date_time += 1;
            continue;
        };

        let capture_time = match utils::parse_capture_time(raw_time) {
            Ok(ts) => ts,
            Err(e) => {
                warn!("Skipping file {} because we couldn't parse the time the photo was taken: {}", file, e);
                plan.summary.no_date_time += 1;
                continue;
            }
        };

        let Some(sample) = lookup(index, capture_time, tolerance) else {
            warn!("No location found within the defined tolerance for file {}", file);
            plan.summary.no_location_found += 1;
            continue;
        };

        let fix = GpsFix::from(sample);
        debug!(
            "Found location for file {}: {}, {} ({} from capture time)",
            file,
            fix.latitude,
            fix.longitude,
            utils::format_delta(matcher::time_distance(sample.timestamp, capture_time)),
        );

        plan.writes.push(PlannedWrite {
            path: photo.path.clone(),
            capture_time,
            sample: sample.clone(),
            fix,
        });
    }

    plan
}

/// Backs up and writes every planned photo.
///
/// A failed backup skips that photo; a failed write is counted. Neither stops
/// the run.
///
/// # Arguments
/// * `plan` - Output of `plan`.
/// * `tool` - Metadata writer.
/// * `skip_backup` - Write without creating `<file>.bak` first.
/// * `bar` - Progress bar advanced once per planned write.
///
/// # Returns
/// * `Summary` - Final counters for the whole run.
pub fn apply<T: MetadataTool + ?Sized>(
    plan: &Plan,
    tool: &T,
    skip_backup: bool,
    bar: &indicatif::ProgressBar,
) -> Summary {
    let mut summary = plan.summary.clone();

    for write in &plan.writes {
        bar.inc(1);
        let file = write.path.display();

        if skip_backup {
            debug!("Skipping backup of file {}", file);
        } else if let Err(e) = file_processing::backup_file(&write.path) {
            warn!("Skipping file {} because we couldn't back it up: {:#}", file, e);
            summary.backup_failed += 1;
            continue;
        }

        match tool.write_gps(&write.path, &write.fix) {
            Ok(()) => summary.written += 1,
            Err(e) => {
                warn!("Error when writing metadata for file {}: {}", file, e);
                summary.write_failed += 1;
            }
        }
    }

    summary
}
