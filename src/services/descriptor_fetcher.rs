// Descriptor Fetcher
// Downloads the service definition that gets injected into every install

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::models::Service;
use crate::services::{emit_patch_event, EventSink, PatchEventKind};

/// Errors that can occur while fetching a remote document
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Got HTTP {status} from {url}")]
    Status { url: String, status: StatusCode },

    #[error("Invalid service JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid service definition: {0}")]
    InvalidDescriptor(String),
}

/// HTTP client shared by the descriptor download and the upstream refresh
pub struct RemoteClient {
    client: Client,
}

impl RemoteClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("obs-service-patcher/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` and return the body. Anything other than 200 is an error.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        log::info!("Downloading {url}");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await?;
        log::debug!("Download complete: {} bytes", body.len());
        Ok(body.to_vec())
    }
}

/// Fetches and validates the service descriptor
pub struct DescriptorFetcher<'a> {
    client: &'a RemoteClient,
    url: String,
}

impl<'a> DescriptorFetcher<'a> {
    pub fn new(client: &'a RemoteClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Download and decode the descriptor. Every error here is fatal for
    /// the run: no file gets patched with an unverified service.
    pub async fn fetch(&self, event_sink: &dyn EventSink) -> Result<Service, FetchError> {
        let body = self.client.get_bytes(&self.url).await?;
        let service = decode_descriptor(&body)?;

        log::info!("Downloaded service definition '{}' from {}", service.name, self.url);
        emit_patch_event(
            event_sink,
            PatchEventKind::Downloaded,
            None,
            format!("Downloaded {} service definition from {}", service.name, self.url),
        );
        Ok(service)
    }
}

/// Decode and validate a descriptor body
pub fn decode_descriptor(bytes: &[u8]) -> Result<Service, FetchError> {
    let service: Service = serde_json::from_slice(bytes)?;
    service.validate().map_err(FetchError::InvalidDescriptor)?;
    Ok(service)
}
