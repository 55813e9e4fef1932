mod cli;
mod error;
mod exiftool;
mod file_processing;
mod fixer;
mod index;
mod matcher;
mod progress;
mod prompt;
mod utils;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::exiftool::MetadataTool;

/// Sets up the global `tracing` subscriber on stderr, printing around any progress bar.
///
/// `RUST_LOG` wins when set; otherwise INFO, DEBUG with `-v`, TRACE with `-vv`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(progress::LogWriter)
        .init();
}

/// Main entry point of the application.
///
/// This function orchestrates the entire workflow:
/// 1. Parses command-line arguments and sets up logging.
/// 2. Loads the location history into the index.
/// 3. Collects the photos and reads their metadata through exiftool.
/// 4. Matches every photo against the index.
/// 5. Asks for confirmation, backs up and writes the coordinates.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Success or an error if any fatal step fails.
fn main() -> anyhow::Result<()> {
    let total_start = std::time::Instant::now();
    let args = cli::Args::parse();
    init_logging(args.verbose);

    let locations = index::LocationIndex::from_path(&args.location_file)
        .with_context(|| format!("Failed to load {}", args.location_file.display()))?;
    info!("Read {} GPS locations", locations.len());
    if locations.is_empty() {
        warn!("The location history is empty, no photo can be matched");
    }
    if let (Some(first), Some(last)) = (locations.first(), locations.last()) {
        info!(
            "Locations cover {} to {}",
            utils::format_timestamp(first.timestamp),
            utils::format_timestamp(last.timestamp)
        );
    }

    file_processing::check_path(&args.photos_directory)?;
    let scan = file_processing::collect_photos(&args.photos_directory)?;
    info!("Found:");
    info!("\tUnsupported extensions: {:?}", scan.unsupported);
    info!("\tFiles to process: {}", scan.photos.len());
    for photo in &scan.photos {
        debug!("\t\t{}", photo.display());
    }

    let tool = exiftool::ExifTool::new(args.exiftool_binary.as_str());
    let version = tool.check().context("Error when initializing exiftool")?;
    debug!("Using exiftool {}", version);

    let metadata = tool
        .read(&scan.photos)
        .context("Error when extracting metadata")?;

    let tolerance = if args.unbounded {
        fixer::Tolerance::Unbounded
    } else {
        fixer::Tolerance::Within(args.tolerance)
    };
    let bar = progress::photo_bar(metadata.len(), "Matching");
    let plan = fixer::plan(&locations, &metadata, tolerance, &bar);
    bar.finish_and_clear();

    if args.dry_run {
        for write in &plan.writes {
            info!(
                "Would set {} (taken {}) to {}, {} (location recorded {})",
                write.path.display(),
                utils::format_timestamp(write.capture_time),
                write.fix.latitude,
                write.fix.longitude,
                utils::format_timestamp(write.sample.timestamp)
            );
        }
        info!("Dry run: {} files would be modified, nothing was written", plan.writes.len());
        plan.summary.log();
        return Ok(());
    }

    if plan.writes.is_empty() {
        info!("No files to modify");
        plan.summary.log();
        return Ok(());
    }

    if args.skip_prompt {
        info!("Skipping confirmation prompt.");
    } else {
        info!("{} files will be modified. Do you wish to proceed? (Yes/No)", plan.writes.len());
        let confirmed = prompt::request_confirmation(std::io::stdin().lock())
            .context("Failed to read confirmation")?;
        if !confirmed {
            info!("Aborting.");
            return Ok(());
        }
    }

    info!("Starting the exif rewrite operation");
    let bar = progress::photo_bar(plan.writes.len(), "Writing");
    let summary = fixer::apply(&plan, &tool, args.skip_backup, &bar);
    bar.finish_and_clear();
    info!("Finished the exif rewrite operation");
    summary.log();

    info!("Completed in {:.2} seconds", total_start.elapsed().as_secs_f64());
    Ok(())
}
