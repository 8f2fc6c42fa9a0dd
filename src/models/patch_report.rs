// Patch Report Model
// Per-file results and the aggregated outcome of a run

use std::path::PathBuf;

use thiserror::Error;

use super::DocumentError;

/// What happened to a file that was patched successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The service was already listed, the file was not touched
    AlreadyPresent,
    /// The service was appended and the file rewritten
    Patched,
}

/// Coarse error category used in user-facing summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Decode,
    /// The patched tree could not be serialized again
    Encode,
}

/// Errors that end the patch of a single file
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    #[error("Failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PatchError::Read { .. } | PatchError::Write { .. } => ErrorKind::Io,
            PatchError::Decode { .. } => ErrorKind::Decode,
            PatchError::Encode { .. } => ErrorKind::Encode,
        }
    }

    /// Permission failures are the usual reason a write into a program
    /// files install fails.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            PatchError::Read { source, .. } | PatchError::Write { source, .. } => {
                source.kind() == std::io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }
}

/// Result of patching one discovered file
#[derive(Debug)]
pub struct FileReport {
    /// Installation label, e.g. "OBS Studio"
    pub label: String,
    pub path: PathBuf,
    pub result: Result<PatchOutcome, PatchError>,
}

impl FileReport {
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// No services file was found, nothing was attempted
    NothingToDo,
    /// Every discovered file now lists the service
    AllGood,
    /// At least one file could not be patched
    PartialFailure,
}

/// Every file report of a run, in the order the files were discovered
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<FileReport>,
}

impl RunSummary {
    pub fn push(&mut self, report: FileReport) {
        self.reports.push(report);
    }

    pub fn status(&self) -> RunStatus {
        if self.reports.is_empty() {
            RunStatus::NothingToDo
        } else if self.reports.iter().any(FileReport::is_failure) {
            RunStatus::PartialFailure
        } else {
            RunStatus::AllGood
        }
    }

    pub fn count(&self, outcome: PatchOutcome) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.result, Ok(o) if o == outcome))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.reports.iter().filter(|r| r.is_failure())
    }

    /// True when some failure looks like it needs elevated privileges
    pub fn needs_elevation(&self) -> bool {
        self.failures().any(|r| match &r.result {
            Err(e) => e.is_permission_denied() || matches!(e, PatchError::Write { .. }),
            Ok(_) => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(result: Result<PatchOutcome, PatchError>) -> FileReport {
        FileReport {
            label: "OBS Studio".to_string(),
            path: PathBuf::from("services.json"),
            result,
        }
    }

    #[test]
    fn test_empty_run_is_nothing_to_do() {
        assert_eq!(RunSummary::default().status(), RunStatus::NothingToDo);
    }

    #[test]
    fn test_status_and_counts() {
        let mut summary = RunSummary::default();
        summary.push(report(Ok(PatchOutcome::Patched)));
        summary.push(report(Ok(PatchOutcome::AlreadyPresent)));
        assert_eq!(summary.status(), RunStatus::AllGood);
        assert!(!summary.needs_elevation());

        summary.push(report(Err(PatchError::Write {
            path: PathBuf::from("services.json"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        })));
        assert_eq!(summary.status(), RunStatus::PartialFailure);
        assert_eq!(summary.count(PatchOutcome::Patched), 1);
        assert_eq!(summary.count(PatchOutcome::AlreadyPresent), 1);
        assert_eq!(summary.failures().count(), 1);
        assert!(summary.needs_elevation());
    }

    #[test]
    fn test_error_kinds() {
        let io = PatchError::Read {
            path: PathBuf::from("a"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(io.kind(), ErrorKind::Io);
        assert!(!io.is_permission_denied());

        let decode = PatchError::Decode {
            path: PathBuf::from("b"),
            source: DocumentError::Layout("root is a number".to_string()),
        };
        assert_eq!(decode.kind(), ErrorKind::Decode);
        assert!(decode.to_string().contains("Failed to parse b"));

        let encode = PatchError::Encode {
            path: PathBuf::from("c"),
            source: DocumentError::Layout("services is not an array".to_string()),
        };
        assert_eq!(encode.kind(), ErrorKind::Encode);
        assert!(!encode.is_permission_denied());
        assert!(encode.to_string().contains("Failed to encode c"));
    }
}
