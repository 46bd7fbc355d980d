//! Versioned model artifact storage.
//!
//! Versioned bundles are append-only and immutable; the active-pointer
//! bundle is the only mutable state and is replaced atomically so concurrent
//! readers never observe a partial write.

use crate::config::ArtifactConfig;
use crate::error::{AppError, Result};
use crate::ml::forest::IsolationForest;
use crate::ml::trainer::TrainedModel;
use crate::models::FeatureSchema;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// A loaded (model, schema) bundle plus its identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub version: String,
    pub schema: FeatureSchema,
    pub forest: IsolationForest,
}

/// Versioned JSON metadata record written next to each bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub model_name: String,
    pub version: String,
    pub features: FeatureSchema,
}

/// Paths produced by a successful save.
#[derive(Debug, Clone)]
pub struct SavedArtifact {
    pub bundle_path: PathBuf,
    pub metadata_path: PathBuf,
    pub version: String,
}

/// File-based artifact store. All paths are injected; nothing global.
pub struct ArtifactStore {
    model_dir: PathBuf,
    active_path: PathBuf,
    model_name: String,
}

impl ArtifactStore {
    pub fn new(
        model_dir: impl Into<PathBuf>,
        active_path: impl Into<PathBuf>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            model_dir: model_dir.into(),
            active_path: active_path.into(),
            model_name: model_name.into(),
        }
    }

    pub fn from_config(config: &ArtifactConfig) -> Self {
        Self::new(
            &config.model_dir,
            &config.active_model_path,
            &config.model_name,
        )
    }

    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    /// Persist a trained model: the versioned bundle, its metadata record,
    /// and an atomic overwrite of the active pointer. The versioned files
    /// are never rewritten.
    pub fn save(&self, model: &TrainedModel) -> Result<SavedArtifact> {
        let version = next_version();

        let artifact = ModelArtifact {
            name: self.model_name.clone(),
            version: version.clone(),
            schema: model.schema.clone(),
            forest: model.forest.clone(),
        };
        let bundle_bytes = bincode::serialize(&artifact)?;

        fs::create_dir_all(&self.model_dir)?;

        let bundle_path = self
            .model_dir
            .join(format!("{}_v{}.model", self.model_name, version));
        fs::write(&bundle_path, &bundle_bytes)?;

        let metadata = ArtifactMetadata {
            model_name: self.model_name.clone(),
            version: version.clone(),
            features: model.schema.clone(),
        };
        let metadata_path = self
            .model_dir
            .join(format!("{}_v{}.json", self.model_name, version));
        fs::write(&metadata_path, serde_json::to_vec_pretty(&metadata)?)?;

        write_atomic(&self.active_path, &bundle_bytes)?;

        info!(
            version = %version,
            bundle = %bundle_path.display(),
            active = %self.active_path.display(),
            "Saved model artifact"
        );

        Ok(SavedArtifact {
            bundle_path,
            metadata_path,
            version,
        })
    }

    /// Load the active bundle. Missing or unreadable bundles are
    /// `ArtifactNotFound`; no fallback artifact is fabricated.
    pub fn load_active(&self) -> Result<ModelArtifact> {
        let bytes = fs::read(&self.active_path).map_err(|e| {
            AppError::ArtifactNotFound(format!(
                "no active model at {}: {}",
                self.active_path.display(),
                e
            ))
        })?;

        bincode::deserialize(&bytes).map_err(|e| {
            AppError::ArtifactNotFound(format!(
                "active model at {} is unreadable: {}",
                self.active_path.display(),
                e
            ))
        })
    }
}

/// Second-resolution timestamp plus a random suffix, so saves within the
/// same second still get distinct versions.
fn next_version() -> String {
    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", stamp, &suffix[..8])
}

/// Write via a uniquely-named temp file in the target directory, then rename
/// into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let tmp = dir.join(format!(
        ".{}.tmp-{}",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "active".to_string()),
        Uuid::new_v4().simple()
    ));

    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        AppError::Io(e)
    })?;

    Ok(())
}
