// Path Locator
// Finds rtmp-services directories of OBS Studio and Streamlabs OBS installs

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::services::{emit_patch_event, EventSink, PatchEventKind};

/// File the rtmp-services plugin reads its service list from
pub const SERVICES_FILE_NAME: &str = "services.json";

/// Nested layout of the obs-studio-node runtime bundled with Streamlabs OBS
const SLOBS_BUNDLED_SERVICES: &[&str] = &[
    "app.asar.unpacked",
    "node_modules",
    "obs-studio-node",
    "data",
    "obs-plugins",
    "rtmp-services",
];

/// Operating system a target applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl HostOs {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => HostOs::Windows,
            "macos" => HostOs::MacOs,
            "linux" => HostOs::Linux,
            _ => HostOs::Other,
        }
    }
}

/// Platform predicate of a target row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFilter {
    Any,
    Only(HostOs),
}

impl PlatformFilter {
    fn matches(self, os: HostOs) -> bool {
        match self {
            PlatformFilter::Any => true,
            PlatformFilter::Only(wanted) => wanted == os,
        }
    }
}

/// Where a target path starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRoot {
    /// Per-user configuration directory (%APPDATA%, ~/Library/Application Support, ~/.config)
    UserConfig,
    /// Directory named by an environment variable
    EnvVar(&'static str),
    /// Absolute directory
    Fixed(&'static str),
}

/// One row of the install table: a platform, a root and the segments
/// leading to an rtmp-services directory.
#[derive(Debug, Clone, Copy)]
pub struct InstallTarget {
    pub label: &'static str,
    pub platform: PlatformFilter,
    pub root: PathRoot,
    pub prefix: &'static [&'static str],
    pub suffix: &'static [&'static str],
}

impl InstallTarget {
    /// Build the rtmp-services directory for this row, None when the root
    /// is unavailable in the given environment.
    pub fn resolve(&self, env: &dyn PathEnvironment) -> Option<PathBuf> {
        let mut dir = match self.root {
            PathRoot::UserConfig => env.config_dir()?,
            PathRoot::EnvVar(name) => {
                let value = env.var(name)?;
                if value.is_empty() {
                    return None;
                }
                PathBuf::from(value)
            }
            PathRoot::Fixed(path) => PathBuf::from(path),
        };
        dir.extend(self.prefix);
        dir.extend(self.suffix);
        Some(dir)
    }
}

/// Known installations, in checking order: config-based installs first,
/// then the Streamlabs OBS bundled runtime.
pub const INSTALL_TARGETS: &[InstallTarget] = &[
    InstallTarget {
        label: "OBS Studio",
        platform: PlatformFilter::Any,
        root: PathRoot::UserConfig,
        prefix: &["obs-studio", "plugin_config", "rtmp-services"],
        suffix: &[],
    },
    InstallTarget {
        label: "Streamlabs OBS",
        platform: PlatformFilter::Any,
        root: PathRoot::UserConfig,
        prefix: &["slobs-client", "plugin_config", "rtmp-services"],
        suffix: &[],
    },
    InstallTarget {
        label: "SLOBS Electron 32-bit",
        platform: PlatformFilter::Only(HostOs::Windows),
        root: PathRoot::EnvVar("ProgramFiles(x86)"),
        prefix: &["Streamlabs OBS", "resources"],
        suffix: SLOBS_BUNDLED_SERVICES,
    },
    InstallTarget {
        label: "SLOBS Electron 64-bit",
        platform: PlatformFilter::Only(HostOs::Windows),
        root: PathRoot::EnvVar("ProgramFiles"),
        prefix: &["Streamlabs OBS", "resources"],
        suffix: SLOBS_BUNDLED_SERVICES,
    },
    InstallTarget {
        label: "SLOBS Electron",
        platform: PlatformFilter::Only(HostOs::MacOs),
        root: PathRoot::Fixed("/Applications"),
        prefix: &["Streamlabs OBS.app", "Contents", "Resources"],
        suffix: SLOBS_BUNDLED_SERVICES,
    },
];

/// The parts of the host the locator looks at
pub trait PathEnvironment {
    fn os(&self) -> HostOs;
    fn config_dir(&self) -> Option<PathBuf>;
    fn var(&self, name: &str) -> Option<OsString>;
}

/// The real host: current OS, dirs-next config dir, process environment
pub struct SystemEnvironment;

impl PathEnvironment for SystemEnvironment {
    fn os(&self) -> HostOs {
        HostOs::current()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        dirs_next::config_dir()
    }

    fn var(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }
}

/// An installation whose services file exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedTarget {
    pub label: String,
    /// The rtmp-services directory
    pub directory: PathBuf,
    /// `directory/services.json`
    pub services_path: PathBuf,
}

/// Check every row of `targets` that applies to the host and return the
/// installations whose services file exists. Only existence is checked.
pub fn locate_targets(
    targets: &[InstallTarget],
    env: &dyn PathEnvironment,
    event_sink: &dyn EventSink,
) -> Vec<DetectedTarget> {
    let os = env.os();
    let mut found: Vec<DetectedTarget> = Vec::new();

    for target in targets.iter().filter(|t| t.platform.matches(os)) {
        let Some(directory) = target.resolve(env) else {
            log::debug!("Skipping {}: root not available", target.label);
            continue;
        };
        let services_path = directory.join(SERVICES_FILE_NAME);

        if !is_present(&services_path) {
            log::debug!("No {} at {:?}", target.label, services_path);
            continue;
        }

        if found.iter().any(|d| d.directory == directory) {
            log::debug!("{} resolves to an already detected directory {:?}", target.label, directory);
            continue;
        }

        log::info!("Detected {} at: {:?}", target.label, directory);
        emit_patch_event(
            event_sink,
            PatchEventKind::Detected,
            Some(&directory),
            format!("Detected {}", target.label),
        );

        found.push(DetectedTarget {
            label: target.label.to_string(),
            directory,
            services_path,
        });
    }

    found
}

/// Locate installations on this machine using the built-in table
pub fn find_obs_directories(event_sink: &dyn EventSink) -> Vec<DetectedTarget> {
    locate_targets(INSTALL_TARGETS, &SystemEnvironment, event_sink)
}

fn is_present(path: &Path) -> bool {
    std::fs::metadata(path).is_ok()
}
