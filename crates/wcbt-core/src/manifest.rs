//! The run manifest: the authoritative, content-addressed record of what a
//! run contains. Verification and restore consult this, never the
//! filesystem, to decide what "complete" means.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, WcbtError};
use crate::schema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    Sha256,
}

impl HashAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    Partial,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestFileEntry {
    pub rel_path: String,
    pub size_bytes: u64,
    pub hash_hex: String,
    pub mtime_ns: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunManifest {
    pub schema: String,
    pub run_id: String,
    pub created_at: String,
    pub source_root: String,
    pub destination_root: String,
    pub hash_algorithm: HashAlgorithm,
    pub run_status: RunStatus,
    pub files: Vec<ManifestFileEntry>,
}

impl RunManifest {
    pub fn new(
        run_id: impl Into<String>,
        created_at: impl Into<String>,
        source_root: impl Into<String>,
        destination_root: impl Into<String>,
        hash_algorithm: HashAlgorithm,
        run_status: RunStatus,
        files: Vec<ManifestFileEntry>,
    ) -> Self {
        Self {
            schema: schema::RUN_MANIFEST_V1.to_string(),
            run_id: run_id.into(),
            created_at: created_at.into(),
            source_root: source_root.into(),
            destination_root: destination_root.into(),
            hash_algorithm,
            run_status,
            files,
        }
    }

    /// Structural invariants a manifest consumer must check before trusting
    /// it: known schema tag, `rel_path` forward-slash/relative/no-`..`, and
    /// manifest ordering (lexicographic on `rel_path`).
    pub fn validate(&self) -> Result<(), WcbtError> {
        if self.schema != schema::RUN_MANIFEST_V1 {
            return Err(WcbtError::new(
                ErrorKind::SchemaUnsupported,
                format!("unknown manifest schema: {}", self.schema),
            ));
        }

        let mut prev: Option<&str> = None;
        for entry in &self.files {
            validate_rel_path(&entry.rel_path)?;
            if let Some(p) = prev
                && p >= entry.rel_path.as_str()
            {
                return Err(WcbtError::new(
                    ErrorKind::ManifestInvalid,
                    format!(
                        "manifest files are not strictly ordered: '{p}' before '{}'",
                        entry.rel_path
                    ),
                ));
            }
            prev = Some(entry.rel_path.as_str());
        }

        Ok(())
    }
}

pub fn validate_rel_path(rel_path: &str) -> Result<(), WcbtError> {
    if rel_path.is_empty() {
        return Err(WcbtError::new(
            ErrorKind::ManifestInvalid,
            "rel_path must not be empty",
        ));
    }
    if rel_path.starts_with('/') || rel_path.contains('\\') {
        return Err(WcbtError::new(
            ErrorKind::ManifestInvalid,
            format!("rel_path must be forward-slash relative: {rel_path}"),
        ));
    }
    if rel_path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(WcbtError::new(
            ErrorKind::ManifestInvalid,
            format!("rel_path contains an unsafe segment: {rel_path}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rel: &str) -> ManifestFileEntry {
        ManifestFileEntry {
            rel_path: rel.to_string(),
            size_bytes: 1,
            hash_hex: "deadbeef".to_string(),
            mtime_ns: 0,
        }
    }

    #[test]
    fn manifest_round_trip() {
        let manifest = RunManifest::new(
            "2025-01-01T12-00-00Z",
            "2025-01-01T12:00:00Z",
            "/src",
            "/dest",
            HashAlgorithm::Sha256,
            RunStatus::Ok,
            vec![entry("a.txt"), entry("sub/b.bin")],
        );
        let json = serde_json::to_string(&manifest).unwrap();
        let de: RunManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(manifest, de);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn rejects_dotdot_segments() {
        assert!(validate_rel_path("../etc/passwd").is_err());
        assert!(validate_rel_path("a/../b").is_err());
        assert!(validate_rel_path("/abs").is_err());
        assert!(validate_rel_path("a/b").is_ok());
    }

    #[test]
    fn rejects_out_of_order_files() {
        let manifest = RunManifest::new(
            "run",
            "2025-01-01T12:00:00Z",
            "/src",
            "/dest",
            HashAlgorithm::Sha256,
            RunStatus::Ok,
            vec![entry("b.txt"), entry("a.txt")],
        );
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn rejects_unknown_schema() {
        let mut manifest = RunManifest::new(
            "run",
            "2025-01-01T12:00:00Z",
            "/src",
            "/dest",
            HashAlgorithm::Sha256,
            RunStatus::Ok,
            vec![],
        );
        manifest.schema = "wcbt_run_manifest_v2".to_string();
        assert!(manifest.validate().is_err());
    }
}
