// ServicesPackage Model
// package.json shipped next to services.json by the rtmp-services plugin

use serde::Deserialize;

/// Update manifest the rtmp-services plugin uses to find upstream files
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicesPackage {
    /// Base URL the plugin downloads its files from
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub version: i64,

    #[serde(default)]
    pub files: Vec<PackageFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageFile {
    pub name: String,
    #[serde(default)]
    pub version: i64,
}

impl ServicesPackage {
    /// URL of the upstream services.json, if the package names a base URL
    pub fn services_url(&self) -> Option<String> {
        let base = self.url.trim().trim_end_matches('/');
        if base.is_empty() {
            None
        } else {
            Some(format!("{base}/services.json"))
        }
    }
}
