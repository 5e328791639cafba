//! Deposit manifest and file-backed package staging
//!
//! Physical package assembly (archive layout, metadata serialization)
//! happens upstream of this crate. The manifest names each publication's
//! pre-assembled payload; `FilePackageBuilder` stages a private copy per
//! deposit attempt so that releasing a package never touches the original
//! file.

use crate::core::error::DepositError;
use crate::core::traits::{DepositFlags, Package, PackageBuilder, Publication, PublicationSource};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

fn default_media_type() -> String {
    "application/zip".to_string()
}

/// One publication entry in a deposit manifest
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub id: i64,
    pub title: String,

    /// Path to the pre-assembled deposit package
    pub package: PathBuf,

    #[serde(default = "default_media_type")]
    pub media_type: String,

    /// SWORD packaging identifier; the client default applies when absent
    #[serde(default)]
    pub packaging: Option<String>,
}

/// A batch deposit manifest: the publications of one publishing context
/// together with their package payloads
#[derive(Debug, Clone, Deserialize)]
pub struct DepositManifest {
    pub context_id: i64,

    #[serde(default)]
    pub publications: Vec<ManifestEntry>,
}

impl DepositManifest {
    /// Parse a manifest from YAML text
    pub fn parse(content: &str) -> Result<Self, DepositError> {
        serde_yaml::from_str(content)
            .map_err(|e| DepositError::Config(format!("failed to parse deposit manifest: {}", e)))
    }

    /// Load a manifest file
    pub async fn load(path: &std::path::Path) -> Result<Self, DepositError> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            DepositError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&content)
    }

    pub fn entry(&self, publication_id: i64) -> Option<&ManifestEntry> {
        self.publications.iter().find(|e| e.id == publication_id)
    }

    /// All publication ids, in manifest order
    pub fn publication_ids(&self) -> Vec<i64> {
        self.publications.iter().map(|e| e.id).collect()
    }
}

#[async_trait]
impl PublicationSource for DepositManifest {
    async fn publication(
        &self,
        publication_id: i64,
    ) -> Result<Option<Publication>, DepositError> {
        Ok(self.entry(publication_id).map(|e| Publication {
            id: e.id,
            context_id: self.context_id,
            title: e.title.clone(),
        }))
    }
}

/// Stages manifest payloads as deposit packages.
///
/// Inclusion flags are honored by whatever assembled the payload; this
/// builder only stages the declared file.
pub struct FilePackageBuilder {
    manifest: DepositManifest,
    staging_dir: PathBuf,
}

impl FilePackageBuilder {
    pub fn new(manifest: DepositManifest) -> Self {
        Self {
            manifest,
            staging_dir: std::env::temp_dir(),
        }
    }

    pub fn with_staging_dir<P: Into<PathBuf>>(mut self, staging_dir: P) -> Self {
        self.staging_dir = staging_dir.into();
        self
    }
}

#[async_trait]
impl PackageBuilder for FilePackageBuilder {
    async fn build(
        &self,
        publication: &Publication,
        _flags: DepositFlags,
    ) -> Result<Package, DepositError> {
        let entry = self
            .manifest
            .entry(publication.id)
            .ok_or_else(|| DepositError::PackageBuild {
                message: format!("no package declared for publication {}", publication.id),
            })?;

        let file_name = entry
            .package
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("publication-{}.zip", publication.id));

        let staged_path = self
            .staging_dir
            .join(format!("sword-{}-{}", Uuid::new_v4(), file_name));

        fs::copy(&entry.package, &staged_path).await.map_err(|e| {
            DepositError::PackageBuild {
                message: format!("failed to stage {}: {}", entry.package.display(), e),
            }
        })?;

        debug!(
            publication_id = publication.id,
            staged = %staged_path.display(),
            "package staged"
        );

        let mut package = Package::new(staged_path, file_name, entry.media_type.clone());
        if let Some(packaging) = &entry.packaging {
            package = package.with_packaging(packaging.clone());
        }

        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
context_id: 1
publications:
  - id: 12
    title: "Example Article"
    package: /tmp/example.zip
  - id: 13
    title: "Second Article"
    package: /tmp/second.zip
    media_type: application/x-7z-compressed
    packaging: http://purl.org/net/sword/package/SimpleZip
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = DepositManifest::parse(MANIFEST).unwrap();

        assert_eq!(manifest.context_id, 1);
        assert_eq!(manifest.publication_ids(), vec![12, 13]);
        assert_eq!(manifest.entry(12).unwrap().media_type, "application/zip");
        assert_eq!(
            manifest.entry(13).unwrap().packaging.as_deref(),
            Some("http://purl.org/net/sword/package/SimpleZip")
        );
    }

    #[tokio::test]
    async fn test_publication_lookup() {
        let manifest = DepositManifest::parse(MANIFEST).unwrap();

        let publication = manifest.publication(12).await.unwrap().unwrap();
        assert_eq!(publication.title, "Example Article");
        assert_eq!(publication.context_id, 1);

        assert!(manifest.publication(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_build_stages_a_private_copy() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("article.zip");
        fs::write(&source, b"payload").await.unwrap();

        let manifest = DepositManifest::parse(&format!(
            "context_id: 1\npublications:\n  - id: 12\n    title: A\n    package: {}\n",
            source.display()
        ))
        .unwrap();
        let builder = FilePackageBuilder::new(manifest).with_staging_dir(dir.path());

        let publication = Publication {
            id: 12,
            context_id: 1,
            title: "A".to_string(),
        };
        let package = builder
            .build(&publication, DepositFlags::default())
            .await
            .unwrap();

        assert_ne!(package.file_path, source);
        assert_eq!(package.file_name, "article.zip");
        assert!(package.file_path.exists());

        // releasing the package removes the staged copy, not the original
        package.release().await.unwrap();
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_build_fails_for_missing_payload() {
        let dir = TempDir::new().unwrap();
        let manifest = DepositManifest::parse(
            "context_id: 1\npublications:\n  - id: 12\n    title: A\n    package: /tmp/nope-missing.zip\n",
        )
        .unwrap();
        let builder = FilePackageBuilder::new(manifest).with_staging_dir(dir.path());

        let publication = Publication {
            id: 12,
            context_id: 1,
            title: "A".to_string(),
        };
        let result = builder.build(&publication, DepositFlags::default()).await;

        assert!(matches!(result, Err(DepositError::PackageBuild { .. })));
    }

    #[tokio::test]
    async fn test_build_fails_for_undeclared_publication() {
        let manifest = DepositManifest::parse("context_id: 1\npublications: []\n").unwrap();
        let builder = FilePackageBuilder::new(manifest);

        let publication = Publication {
            id: 7,
            context_id: 1,
            title: "B".to_string(),
        };
        let result = builder.build(&publication, DepositFlags::default()).await;

        assert!(matches!(result, Err(DepositError::PackageBuild { .. })));
    }
}
