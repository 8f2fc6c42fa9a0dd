// Service Model
// A streaming destination as it appears in rtmp-services/services.json

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One named streaming-destination profile.
///
/// Only the fields the patcher reads are modelled. Everything else on the
/// object is kept in `extra` so newer OBS keys are not lost; they are
/// written after the modelled fields, in the order they were published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Display name, also the identity used for the presence test
    pub name: String,

    /// Ingest endpoints, in the order OBS lists them
    #[serde(default)]
    pub servers: Vec<ServerEndpoint>,

    /// Recommended encoder settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended: Option<RecommendedSettings>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An RTMP ingest server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEndpoint {
    pub name: String,
    pub url: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Encoder settings OBS applies when the service is selected.
/// Key names follow OBS, spaces included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendedSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyint: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(
        rename = "max video bitrate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_video_bitrate: Option<u32>,

    #[serde(
        rename = "max audio bitrate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_audio_bitrate: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bframes: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x264opts: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Service {
    /// Check the fields the patcher depends on before the service is
    /// written into anyone's configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Service name cannot be empty".to_string());
        }
        if self.servers.is_empty() {
            return Err(format!("Service '{}' has no servers", self.name));
        }
        if let Some(server) = self.servers.iter().find(|s| s.url.trim().is_empty()) {
            return Err(format!(
                "Server '{}' of service '{}' has an empty url",
                server.name, self.name
            ));
        }
        Ok(())
    }

    /// Convert to a JSON tree for insertion into a services document
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn glimesh() -> Service {
        serde_json::from_value(json!({
            "name": "Glimesh",
            "servers": [{ "name": "Primary", "url": "rtmp://glimesh" }]
        }))
        .unwrap()
    }

    #[test]
    fn test_absent_recommended_stays_absent() {
        let value = glimesh().to_value().unwrap();
        assert!(value.get("recommended").is_none());
    }

    #[test]
    fn test_recommended_keeps_obs_key_names_and_unknown_keys() {
        let input = json!({
            "name": "Glimesh",
            "servers": [{ "name": "Primary", "url": "rtmp://glimesh" }],
            "recommended": {
                "keyint": 2,
                "max video bitrate": 6000,
                "supported resolutions": ["1920x1080"]
            }
        });
        let service: Service = serde_json::from_value(input.clone()).unwrap();
        let recommended = service.recommended.as_ref().unwrap();
        assert_eq!(recommended.keyint, Some(2));
        assert_eq!(recommended.max_video_bitrate, Some(6000));
        assert_eq!(recommended.bframes, None);

        assert_eq!(service.to_value().unwrap(), input);
    }

    #[test]
    fn test_unknown_service_fields_survive() {
        let input = json!({
            "name": "Glimesh",
            "common": true,
            "servers": [{ "name": "Primary", "url": "rtmp://glimesh", "region": "us" }]
        });
        let service: Service = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(service.extra.get("common"), Some(&json!(true)));
        assert_eq!(service.to_value().unwrap(), input);
    }

    #[test]
    fn test_unknown_keys_follow_modelled_fields() {
        let input = json!({
            "name": "Glimesh",
            "common": true,
            "more_info_link": "https://glimesh.tv",
            "servers": [{ "name": "Primary", "url": "rtmp://glimesh" }],
            "recommended": { "keyint": 2 }
        });
        let service: Service = serde_json::from_value(input).unwrap();
        let value = service.to_value().unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            vec!["name", "servers", "recommended", "common", "more_info_link"]
        );
    }

    #[test]
    fn test_validate() {
        assert!(glimesh().validate().is_ok());

        let mut unnamed = glimesh();
        unnamed.name = "  ".to_string();
        assert!(unnamed.validate().is_err());

        let mut serverless = glimesh();
        serverless.servers.clear();
        assert!(serverless.validate().unwrap_err().contains("no servers"));

        let mut blank_url = glimesh();
        blank_url.servers[0].url = String::new();
        assert!(blank_url.validate().unwrap_err().contains("empty url"));
    }
}
