//! Path manifest written next to an uploaded folder.
//!
//! The manifest maps every uploaded file, by its slash-joined path relative
//! to the upload root, to the id the network assigned it. Paths describe the
//! folder as it was at the last successful upload and may no longer match
//! what is on disk.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fixed file name of the manifest inside the upload root.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Version written into freshly built manifests.
pub const MANIFEST_VERSION: &str = "0.1.0";

/// Gateway used to build public URLs.
pub const DEFAULT_GATEWAY: &str = "https://arweave.net";

/// Literal type tag of a path manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManifestKind {
    #[default]
    #[serde(rename = "arweave/paths")]
    ArweavePaths,
}

/// Remote record of a single uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestPath {
    pub id: String,
}

/// Public location of a file that has a remote record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestInfo {
    pub id: String,
    pub url: String,
}

/// A parsed, shape-checked manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestData {
    pub manifest: ManifestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_id: Option<String>,
    pub version: String,
    pub paths: IndexMap<String, ManifestPath>,
}

impl Default for ManifestData {
    fn default() -> Self {
        Self {
            manifest: ManifestKind::ArweavePaths,
            manifest_id: None,
            version: MANIFEST_VERSION.to_string(),
            paths: IndexMap::new(),
        }
    }
}

impl ManifestData {
    /// Build a manifest from `(relative path, id)` pairs.
    pub fn from_paths<I, P, D>(paths: I) -> Self
    where
        I: IntoIterator<Item = (P, D)>,
        P: Into<String>,
        D: Into<String>,
    {
        Self {
            paths: paths
                .into_iter()
                .map(|(p, id)| (p.into(), ManifestPath { id: id.into() }))
                .collect(),
            ..Self::default()
        }
    }

    /// Parse and shape-check a JSON document.
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Same manifest carrying the top-level remote identifier.
    pub fn with_manifest_id(mut self, manifest_id: impl Into<String>) -> Self {
        self.manifest_id = Some(manifest_id.into());
        self
    }

    /// Number of recorded paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if no paths are recorded.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Look up a relative path and build its public URL.
    ///
    /// The URL goes through the manifest id when there is one so that the
    /// path stays readable, otherwise it points at the file id directly.
    pub fn lookup(&self, relative_path: &str, gateway: &str) -> Option<ManifestInfo> {
        let entry = self.paths.get(relative_path)?;
        let gateway = gateway.trim_end_matches('/');
        let url = match &self.manifest_id {
            Some(manifest_id) => format!("{gateway}/{manifest_id}/{relative_path}"),
            None => format!("{gateway}/{}", entry.id),
        };
        Some(ManifestInfo {
            id: entry.id.clone(),
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "manifest": "arweave/paths",
        "manifestId": "MANIFEST",
        "version": "0.1.0",
        "paths": {
            "index.html": { "id": "AAA" },
            "img/logo.png": { "id": "BBB" }
        }
    }"#;

    #[test]
    fn test_parse_valid() {
        let manifest = ManifestData::parse(SAMPLE).unwrap();
        assert_eq!(manifest.manifest_id.as_deref(), Some("MANIFEST"));
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.paths["img/logo.png"].id, "BBB");
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        let wrong_tag = SAMPLE.replace("arweave/paths", "wrong-tag");
        assert!(ManifestData::parse(&wrong_tag).is_err());

        let missing_version = r#"{"manifest":"arweave/paths","paths":{}}"#;
        assert!(ManifestData::parse(missing_version).is_err());

        let bad_paths = r#"{"manifest":"arweave/paths","version":"0.1.0","paths":{"a":"x"}}"#;
        assert!(ManifestData::parse(bad_paths).is_err());
    }

    #[test]
    fn test_manifest_id_is_optional() {
        let json = r#"{"manifest":"arweave/paths","version":"0.1.0","paths":{}}"#;
        let manifest = ManifestData::parse(json).unwrap();
        assert!(manifest.manifest_id.is_none());
        assert!(manifest.is_empty());
        assert!(!manifest.to_json_pretty().unwrap().contains("manifestId"));
    }

    #[test]
    fn test_lookup_urls() {
        let manifest = ManifestData::parse(SAMPLE).unwrap();
        let info = manifest.lookup("img/logo.png", DEFAULT_GATEWAY).unwrap();
        assert_eq!(info.id, "BBB");
        assert_eq!(info.url, "https://arweave.net/MANIFEST/img/logo.png");

        let mut bare = manifest.clone();
        bare.manifest_id = None;
        let info = bare.lookup("index.html", "https://gw.example/").unwrap();
        assert_eq!(info.url, "https://gw.example/AAA");

        assert!(manifest.lookup("missing.txt", DEFAULT_GATEWAY).is_none());
    }
}
