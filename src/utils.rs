use chrono::TimeZone;

/// Layout exiftool uses for `DateTimeOriginal`.
pub const CAPTURE_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Parses a photo capture time such as `2019:04:19 20:07:30`.
///
/// The field carries no timezone, so the wall-clock value is taken as UTC,
/// the same reference the location history is normalized to.
///
/// # Arguments
/// * `value` - Raw `DateTimeOriginal` value.
///
/// # Returns
/// * `anyhow::Result<DateTime<Utc>>` - Capture time, or an error if the value does not match the layout.
pub fn parse_capture_time(value: &str) -> anyhow::Result<chrono::DateTime<chrono::Utc>> {
    let dt = chrono::NaiveDateTime::parse_from_str(value.trim(), CAPTURE_TIME_FORMAT)
        .map_err(|e| anyhow::anyhow!("Failed to parse capture time {:?}: {}", value, e))?;
    Ok(chrono::Utc.from_utc_datetime(&dt))
}

/// Formats a timestamp for log output: `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Formats a duration as `1h 51m 31s` for log output.
pub fn format_delta(delta: chrono::TimeDelta) -> String {
    match delta.abs().to_std() {
        Ok(d) => humantime::format_duration(std::time::Duration::from_secs(d.as_secs())).to_string(),
        Err(_) => delta.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_capture_time() {
        let ts = parse_capture_time("2019:04:19 20:07:30").unwrap();
        assert_eq!(ts, chrono::Utc.with_ymd_and_hms(2019, 4, 19, 20, 7, 30).unwrap());
    }

    #[test]
    fn test_parse_capture_time_trims_whitespace() {
        assert!(parse_capture_time(" 2019:04:19 20:07:30\n").is_ok());
    }

    #[test]
    fn test_parse_capture_time_rejects_other_layouts() {
        assert!(parse_capture_time("2019-04-19 20:07:30").is_err());
        assert!(parse_capture_time("2019:04:19").is_err());
        assert!(parse_capture_time("0000:00:00 00:00:00").is_err());
        assert!(parse_capture_time("").is_err());
    }

    #[test]
    fn test_format_timestamp() {
        let ts = chrono::Utc.with_ymd_and_hms(2019, 4, 19, 20, 8, 28).unwrap();
        assert_eq!(format_timestamp(ts), "2019-04-19 20:08:28");
    }

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(chrono::TimeDelta::seconds(58)), "58s");
        assert_eq!(format_delta(chrono::TimeDelta::seconds(-(3600 + 51 * 60 + 31))), "1h 51m 31s");
    }
}
