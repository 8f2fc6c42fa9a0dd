// Settings Model
// Run configuration, read from OBS_PATCHER_* environment variables

use std::path::PathBuf;

use log::LevelFilter;

pub const ENV_DESCRIPTOR_URL: &str = "OBS_PATCHER_DESCRIPTOR_URL";
pub const ENV_REFRESH_OFFICIAL: &str = "OBS_PATCHER_REFRESH_OFFICIAL";
pub const ENV_NO_PAUSE: &str = "OBS_PATCHER_NO_PAUSE";
pub const ENV_LOG_DIR: &str = "OBS_PATCHER_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "OBS_PATCHER_LOG_LEVEL";
pub const ENV_LOG_RETENTION_DAYS: &str = "OBS_PATCHER_LOG_RETENTION_DAYS";
pub const ENV_TIMEOUT_SECS: &str = "OBS_PATCHER_TIMEOUT_SECS";

fn default_descriptor_url() -> String {
    "https://glimesh-static-assets.nyc3.digitaloceanspaces.com/obs-glimesh-service.json".to_string()
}

fn default_refresh_official() -> bool {
    true
}

fn default_pause_on_exit() -> bool {
    true
}

fn default_log_dir() -> Option<PathBuf> {
    dirs_next::data_local_dir().map(|dir| dir.join("obs-service-patcher").join("logs"))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_retention_days() -> u32 {
    30
}

fn default_timeout_secs() -> u64 {
    30
}

/// Settings for a single patcher run
#[derive(Debug, Clone, PartialEq)]
pub struct PatcherSettings {
    /// Where the service descriptor is downloaded from
    pub descriptor_url: String,

    /// Download the upstream services.json into services2.json for each install
    pub refresh_official: bool,

    /// Wait for Enter before the process exits
    pub pause_on_exit: bool,

    /// Directory for the log file, None logs to stderr only
    pub log_dir: Option<PathBuf>,

    pub log_level: String,

    /// Days to keep old log files (0 = keep forever)
    pub log_retention_days: u32,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PatcherSettings {
    fn default() -> Self {
        Self {
            descriptor_url: default_descriptor_url(),
            refresh_official: default_refresh_official(),
            pause_on_exit: default_pause_on_exit(),
            log_dir: default_log_dir(),
            log_level: default_log_level(),
            log_retention_days: default_log_retention_days(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl PatcherSettings {
    /// Load settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    /// Values that fail to parse keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = value(ENV_DESCRIPTOR_URL) {
            settings.descriptor_url = url;
        }
        if let Some(flag) = value(ENV_REFRESH_OFFICIAL) {
            match parse_flag(&flag) {
                Some(enabled) => settings.refresh_official = enabled,
                None => log::warn!("Ignoring {ENV_REFRESH_OFFICIAL}={flag}: expected true/false"),
            }
        }
        if let Some(flag) = value(ENV_NO_PAUSE) {
            settings.pause_on_exit = !parse_flag(&flag).unwrap_or(true);
        }
        if let Some(dir) = value(ENV_LOG_DIR) {
            settings.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            settings.log_level = level;
        }
        if let Some(days) = value(ENV_LOG_RETENTION_DAYS) {
            match days.parse() {
                Ok(days) => settings.log_retention_days = days,
                Err(_) => log::warn!("Ignoring {ENV_LOG_RETENTION_DAYS}={days}: not a number"),
            }
        }
        if let Some(secs) = value(ENV_TIMEOUT_SECS) {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => settings.timeout_secs = secs,
                _ => log::warn!("Ignoring {ENV_TIMEOUT_SECS}={secs}: expected a positive number"),
            }
        }

        settings
    }

    /// Parsed log level, falling back to Info
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> PatcherSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PatcherSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let settings = settings_from(&[]);
        assert_eq!(settings, PatcherSettings::default());
        assert!(settings.descriptor_url.starts_with("https://"));
        assert!(settings.refresh_official);
        assert!(settings.pause_on_exit);
        assert_eq!(settings.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn test_overrides() {
        let settings = settings_from(&[
            (ENV_DESCRIPTOR_URL, "https://example.com/service.json"),
            (ENV_REFRESH_OFFICIAL, "false"),
            (ENV_NO_PAUSE, "1"),
            (ENV_LOG_DIR, "/tmp/patcher-logs"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_LOG_RETENTION_DAYS, "7"),
            (ENV_TIMEOUT_SECS, "5"),
        ]);
        assert_eq!(settings.descriptor_url, "https://example.com/service.json");
        assert!(!settings.refresh_official);
        assert!(!settings.pause_on_exit);
        assert_eq!(settings.log_dir, Some(PathBuf::from("/tmp/patcher-logs")));
        assert_eq!(settings.level_filter(), LevelFilter::Debug);
        assert_eq!(settings.log_retention_days, 7);
        assert_eq!(settings.timeout_secs, 5);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let settings = settings_from(&[
            (ENV_REFRESH_OFFICIAL, "sometimes"),
            (ENV_LOG_RETENTION_DAYS, "a week"),
            (ENV_TIMEOUT_SECS, "0"),
            (ENV_LOG_LEVEL, "loud"),
        ]);
        assert!(settings.refresh_official);
        assert_eq!(settings.log_retention_days, 30);
        assert_eq!(settings.timeout_secs, 30);
        assert_eq!(settings.level_filter(), LevelFilter::Info);
    }
}
