/// Structure representing command-line arguments.
#[derive(Debug)]
pub struct Args {
    pub location_file: std::path::PathBuf,
    pub photos_directory: std::path::PathBuf,
    pub tolerance: chrono::TimeDelta,
    pub unbounded: bool,
    pub skip_backup: bool,
    pub skip_prompt: bool,
    pub dry_run: bool,
    pub exiftool_binary: String,
    pub verbose: u8,
}

/// Command-line arguments parser using Clap.
///
/// Supports the location history and photo paths, the matching tolerance,
/// and switches controlling backups, confirmation and writes.
impl Args {
    /// Parses command-line arguments from the process environment.
    ///
    /// Exits with a usage message if required arguments are missing or invalid.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    fn from_matches(matches: &clap::ArgMatches) -> Self {
        Args {
            location_file: matches
                .get_one::<std::path::PathBuf>("location-file")
                .cloned()
                .unwrap_or_default(),
            photos_directory: matches
                .get_one::<std::path::PathBuf>("photos-directory")
                .cloned()
                .unwrap_or_default(),
            tolerance: matches
                .get_one::<chrono::TimeDelta>("tolerance")
                .copied()
                .unwrap_or_else(|| chrono::TimeDelta::hours(1)),
            unbounded: matches.get_flag("unbounded"),
            skip_backup: matches.get_flag("skip-backup"),
            skip_prompt: matches.get_flag("skip-prompt"),
            dry_run: matches.get_flag("dry-run"),
            exiftool_binary: matches
                .get_one::<String>("exiftool-binary")
                .cloned()
                .unwrap_or_else(|| "exiftool".to_string()),
            verbose: matches.get_count("verbose"),
        }
    }
}

fn command() -> clap::Command {
    clap::Command::new("photo-location-fixer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Add GPS coordinates from a Google Takeout location history to photos that lack them")
        .arg(
            clap::Arg::new("location-file")
                .short('f')
                .long("location-file")
                .alias("locationFile")
                .help("Path to the location history file (Records.json)")
                .required(true)
                .num_args(1)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::Arg::new("photos-directory")
                .short('d')
                .long("photos-directory")
                .help("Path to the photos directory")
                .required(true)
                .num_args(1)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::Arg::new("tolerance")
                .short('t')
                .long("tolerance")
                .help("Tolerance for the date to find (e.g. 1h, 30m, 1h30m, 1h30m30s)")
                .num_args(1)
                .default_value("1h")
                .value_parser(clap::builder::ValueParser::new(parse_tolerance)),
        )
        .arg(
            clap::Arg::new("unbounded")
                .long("unbounded")
                .help("Ignore the tolerance and use the closest location found anywhere")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("tolerance"),
        )
        .arg(
            clap::Arg::new("skip-backup")
                .long("skip-backup")
                .help("Skip backup of the photos before modifying them")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("skip-prompt")
                .short('y')
                .long("skip-prompt")
                .alias("skip-promt")
                .help("Skip the prompt before modifying the photos")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .help("Show which photos would be modified without writing anything")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("exiftool-binary")
                .long("exiftool-binary")
                .help("Path to the exiftool executable")
                .num_args(1)
                .default_value("exiftool"),
        )
        .arg(
            clap::Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbose output (repeat for trace output)")
                .action(clap::ArgAction::Count),
        )
}

/// Parses a tolerance such as `1h`, `30m` or `1h30m30s`.
///
/// # Arguments
/// * `s` - Duration in compact notation.
///
/// # Returns
/// * `Result<TimeDelta, String>` - Parsed tolerance.
fn parse_tolerance(s: &str) -> Result<chrono::TimeDelta, String> {
    let duration = humantime::parse_duration(s).map_err(|e| format!("Not a valid duration: {}", e))?;
    chrono::TimeDelta::from_std(duration).map_err(|e| format!("Duration out of range: {}", e))
}
