//! Small helpers shared by the storage layer and the CLI.

use std::fs;
use std::io;
use std::path::Path;

use chrono::Duration;

use crate::error::{Result, SaplingError};

/// Largest snapshot or config file read into memory (10 MB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Read a file into a string, refusing anything over `MAX_FILE_SIZE`.
pub fn read_to_string_limited(path: &Path) -> Result<String> {
    read_to_string_with_limit(path, MAX_FILE_SIZE)
}

pub fn read_to_string_with_limit(path: &Path, max_size: u64) -> Result<String> {
    let size = fs::metadata(path)
        .map_err(|e| SaplingError::storage(path, e))?
        .len();

    if size > max_size {
        let e = io::Error::new(
            io::ErrorKind::InvalidData,
            format!("file too large ({} bytes, max {} bytes)", size, max_size),
        );
        return Err(SaplingError::storage(path, e));
    }

    fs::read_to_string(path).map_err(|e| SaplingError::storage(path, e))
}

/// Parse a duration like "30d", "12h", "45m" or "90s". A bare number is days.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let (num_str, unit) = if let Some(stripped) = s.strip_suffix('d') {
        (stripped, 'd')
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, 'h')
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 'm')
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, 's')
    } else {
        (s, 'd')
    };

    let num: i64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid duration number: {}", num_str))?;

    if num <= 0 {
        return Err("Duration must be positive".to_string());
    }

    let duration = match unit {
        'd' => Duration::try_days(num),
        'h' => Duration::try_hours(num),
        'm' => Duration::try_minutes(num),
        _ => Duration::try_seconds(num),
    };
    duration.ok_or_else(|| format!("Duration out of range: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_to_string_limited_success() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("snapshot.json");
        fs::write(&path, "{}").unwrap();

        assert_eq!(read_to_string_limited(&path).unwrap(), "{}");
    }

    #[test]
    fn test_read_missing_file_is_storage_error() {
        let temp = TempDir::new().unwrap();
        let err = read_to_string_limited(&temp.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SaplingError::Storage { .. }));
    }

    #[test]
    fn test_read_with_limit_boundary() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("boundary.txt");
        fs::write(&path, "x".repeat(100)).unwrap();

        assert!(read_to_string_with_limit(&path, 100).is_ok());
        let err = read_to_string_with_limit(&path, 99).unwrap_err().to_string();
        assert!(err.contains("too large"));
        assert!(err.contains("max 99 bytes"));
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("30d").unwrap(), Duration::days(30));
        assert_eq!(parse_duration("12h").unwrap(), Duration::hours(12));
        assert_eq!(parse_duration("45m").unwrap(), Duration::minutes(45));
        assert_eq!(parse_duration("90s").unwrap(), Duration::seconds(90));
        assert_eq!(parse_duration(" 7 ").unwrap(), Duration::days(7));
    }

    #[test]
    fn test_parse_duration_rejects_bad_input() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0d").is_err());
        assert!(parse_duration("-3h").is_err());
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("99999999999999d").is_err());
    }
}
