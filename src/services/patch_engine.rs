// Patch Engine
// Read-modify-write of rtmp-services/services.json

use std::path::Path;

use crate::models::{
    DocumentError, FileReport, PatchError, PatchOutcome, RunSummary, Service, ServiceDocument,
};
use crate::services::{emit_patch_event, write_atomic, DetectedTarget, EventSink, PatchEventKind};

/// Add `service` to an in-memory document unless an entry with the same
/// name is already listed.
pub fn patch_document(
    document: &mut ServiceDocument,
    service: &Service,
) -> Result<PatchOutcome, DocumentError> {
    if document.contains_service(&service.name) {
        return Ok(PatchOutcome::AlreadyPresent);
    }
    document.append_service(service)?;
    Ok(PatchOutcome::Patched)
}

/// Ensure the services file at `path` lists `service` exactly once.
///
/// The file is only rewritten when the service is missing, and then through
/// a temp file and rename so an interrupted run never leaves half a file.
pub fn patch_file(path: &Path, service: &Service) -> Result<PatchOutcome, PatchError> {
    let bytes = std::fs::read(path).map_err(|source| PatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut document = ServiceDocument::from_slice(&bytes).map_err(|source| PatchError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "Decoded {:?}: format_version={:?}, {} services",
        path,
        document.format_version(),
        document.services().len()
    );

    let outcome = patch_document(&mut document, service).map_err(|source| PatchError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    if outcome == PatchOutcome::AlreadyPresent {
        return Ok(outcome);
    }

    let contents = document.to_vec_pretty().map_err(|source| PatchError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    write_atomic(path, &contents).map_err(|source| PatchError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(outcome)
}

/// Patch every detected services file in order. A failure is recorded for
/// its file and the next file is still processed.
pub fn patch_all(
    targets: &[DetectedTarget],
    service: &Service,
    event_sink: &dyn EventSink,
) -> RunSummary {
    let mut summary = RunSummary::default();

    for target in targets {
        let path = target.services_path.as_path();
        let result = patch_file(path, service);

        match &result {
            Ok(PatchOutcome::Patched) => {
                log::info!("Patched services file: {path:?}");
                emit_patch_event(
                    event_sink,
                    PatchEventKind::Patched,
                    Some(path),
                    format!("Patched {} services file", target.label),
                );
            }
            Ok(PatchOutcome::AlreadyPresent) => {
                log::info!("{} already exists in: {path:?}", service.name);
                emit_patch_event(
                    event_sink,
                    PatchEventKind::AlreadyPresent,
                    Some(path),
                    format!("{} already exists in {} services file", service.name, target.label),
                );
            }
            Err(e) => {
                log::error!("{e}");
                emit_patch_event(event_sink, PatchEventKind::Failed, Some(path), e.to_string());
            }
        }

        summary.push(FileReport {
            label: target.label.clone(),
            path: target.services_path.clone(),
            result,
        });
    }

    summary
}
