// Official Services Sync
// Stores a fresh copy of the upstream services.json as services2.json

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::ServicesPackage;
use crate::services::{
    emit_patch_event, write_atomic, DetectedTarget, EventSink, FetchError, PatchEventKind,
    RemoteClient,
};

/// Manifest read to find the upstream URL
pub const PACKAGE_FILE_NAME: &str = "package.json";
/// Where the upstream copy is stored
pub const REFRESHED_FILE_NAME: &str = "services2.json";

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to read {}: {source}", .path.display())]
    ReadPackage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    DecodePackage {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} has no download url", .path.display())]
    MissingUrl { path: PathBuf },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read the package manifest of an rtmp-services directory
pub fn read_package(directory: &Path) -> Result<ServicesPackage, SyncError> {
    let path = directory.join(PACKAGE_FILE_NAME);
    let raw = std::fs::read(&path).map_err(|source| SyncError::ReadPackage {
        path: path.clone(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| SyncError::DecodePackage { path, source })
}

/// Download the upstream services.json named by the directory's package
/// manifest and store it next to the local one.
pub async fn refresh_directory(
    client: &RemoteClient,
    directory: &Path,
) -> Result<PathBuf, SyncError> {
    let package = read_package(directory)?;
    let url = package.services_url().ok_or_else(|| SyncError::MissingUrl {
        path: directory.join(PACKAGE_FILE_NAME),
    })?;

    let body = client.get_bytes(&url).await?;

    let destination = directory.join(REFRESHED_FILE_NAME);
    write_atomic(&destination, &body).map_err(|source| SyncError::Write {
        path: destination.clone(),
        source,
    })?;

    log::info!("Downloaded fresh services file from {url} into {destination:?}");
    Ok(destination)
}

/// Refresh every detected directory. Failures are reported and skipped,
/// they never stop the patch that follows. Returns the number refreshed.
pub async fn refresh_all(
    client: &RemoteClient,
    targets: &[DetectedTarget],
    event_sink: &dyn EventSink,
) -> usize {
    let mut refreshed = 0;

    for target in targets {
        match refresh_directory(client, &target.directory).await {
            Ok(destination) => {
                refreshed += 1;
                emit_patch_event(
                    event_sink,
                    PatchEventKind::Refreshed,
                    Some(&destination),
                    format!("Downloaded fresh services file for {}", target.label),
                );
            }
            Err(e) => {
                log::warn!("Could not refresh {}: {e}", target.label);
                emit_patch_event(
                    event_sink,
                    PatchEventKind::Failed,
                    Some(&target.directory),
                    format!("Could not refresh upstream services: {e}"),
                );
            }
        }
    }

    refreshed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::RecordingEventSink;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_read_package() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join(PACKAGE_FILE_NAME),
            r#"{"url":"https://obsproject.com/obs2_update/rtmp-services/v5","version":250,"files":[]}"#,
        )
        .unwrap();

        let package = read_package(temp.path()).unwrap();
        assert_eq!(package.version, 250);
    }

    #[test]
    fn test_read_package_errors() {
        let temp = tempdir().unwrap();
        assert!(matches!(read_package(temp.path()), Err(SyncError::ReadPackage { .. })));

        fs::write(temp.path().join(PACKAGE_FILE_NAME), "not json").unwrap();
        assert!(matches!(read_package(temp.path()), Err(SyncError::DecodePackage { .. })));
    }

    #[tokio::test]
    async fn test_missing_url_is_reported_without_network() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(PACKAGE_FILE_NAME), r#"{"version":1}"#).unwrap();

        let client = RemoteClient::new(Duration::from_secs(1)).unwrap();
        let targets = vec![DetectedTarget {
            label: "OBS Studio".to_string(),
            directory: temp.path().to_path_buf(),
            services_path: temp.path().join("services.json"),
        }];
        let sink = RecordingEventSink::default();

        assert_eq!(refresh_all(&client, &targets, &sink).await, 0);
        assert_eq!(sink.kinds(), vec![PatchEventKind::Failed]);
        assert!(!temp.path().join(REFRESHED_FILE_NAME).exists());
    }
}
