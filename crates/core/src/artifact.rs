//! The file(s) submitted to both analysis pipelines.
//!
//! Every part is sent under the same multipart field name, mirroring a
//! browser form with a multi-select file input.

use crate::error::CoreError;
use crate::hashing::sha256_hex;

/// Multipart field name each part is sent under.
pub const ARTIFACT_FIELD_NAME: &str = "file";

/// A single named file within an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPart {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ArtifactPart {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn sha256(&self) -> String {
        sha256_hex(&self.bytes)
    }
}

/// A non-empty set of files submitted together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    parts: Vec<ArtifactPart>,
}

impl Artifact {
    /// Build an artifact, rejecting an empty part list or unnamed parts.
    pub fn new(parts: Vec<ArtifactPart>) -> Result<Self, CoreError> {
        if parts.is_empty() {
            return Err(CoreError::Validation(
                "artifact must contain at least one file".to_string(),
            ));
        }
        if let Some(idx) = parts.iter().position(|p| p.file_name.trim().is_empty()) {
            return Err(CoreError::Validation(format!(
                "artifact part {idx} has an empty file name"
            )));
        }
        Ok(Self { parts })
    }

    /// Convenience constructor for a single file.
    pub fn single(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, CoreError> {
        Self::new(vec![ArtifactPart::new(file_name, bytes)])
    }

    pub fn parts(&self) -> &[ArtifactPart] {
        &self.parts
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.file_name.as_str()).collect()
    }

    pub fn total_bytes(&self) -> usize {
        self.parts.iter().map(|p| p.bytes.len()).sum()
    }
}
