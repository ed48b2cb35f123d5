//! Environment variable parsing utilities.

use std::time::Duration;

use super::ConfigError;

/// Get environment variable with default value.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get optional environment variable (None if empty or missing).
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

/// Parse duration string (e.g., "30s", "2m", "1h").
/// Returns None for "off" or "0".
pub fn parse_duration(s: &str) -> Result<Option<Duration>, String> {
    let s = s.trim().to_lowercase();

    if s == "off" || s == "0" || s.is_empty() {
        return Ok(None);
    }

    if let Some(num) = s.strip_suffix("ms") {
        let num: u64 = num
            .parse()
            .map_err(|_| format!("invalid number: {}", num))?;
        return Ok(Some(Duration::from_millis(num)));
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else {
        // Plain seconds
        return s
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| format!("invalid duration: {}", s));
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    Ok(Some(Duration::from_secs(num * multiplier)))
}

/// Parse a byte size (e.g., "512", "64K", "10M", "1G"). Suffixes are binary.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim().to_uppercase();
    let s = s.strip_suffix('B').unwrap_or(&s);

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('K') {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('M') {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('G') {
        (n, 1024 * 1024 * 1024)
    } else {
        (s, 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid size: {}", s))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflows: {}", s))
}

/// Parse environment variable as duration.
pub fn env_duration(key: &str, default: &str) -> Result<Option<Duration>, ConfigError> {
    let value = env_or(key, default);
    parse_duration(&value).map_err(|e| ConfigError::Parse {
        key: key.into(),
        value,
        error: e,
    })
}

/// Parse environment variable as byte size.
pub fn env_size(key: &str, default: u64) -> Result<u64, ConfigError> {
    match env_opt(key) {
        Some(value) => parse_size(&value).map_err(|e| ConfigError::Parse {
            key: key.into(),
            value,
            error: e,
        }),
        None => Ok(default),
    }
}
