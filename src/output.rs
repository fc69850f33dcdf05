//! Finished-artifact writing for the upload boundary.
//!
//! The embedding system uploads whatever this module hands back; it never
//! sees intermediate state. Artifacts are staged in a temporary file in the
//! destination directory and persisted only once fully written, so a failed
//! conversion leaves nothing behind.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use bzip2::write::BzEncoder;
use serde::Serialize;
use tempfile::NamedTempFile;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Upload metadata attached to one artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactMetadata {
    pub description: String,
    pub tags: Vec<String>,
    pub creation_date: String,
}

/// One finished, uploadable byte stream on disk.
#[derive(Debug)]
pub struct Artifact {
    pub path: PathBuf,
    pub metadata: ArtifactMetadata,
}

/// Writes the cleaned raw export, byte-identical in shape to a valid vendor
/// download.
pub fn write_raw_artifact(directory: &Path, basename: &str, text: &str) -> Result<Artifact> {
    let path = directory.join(format!("{basename}.txt"));
    persist(directory, &path, text.as_bytes())?;
    Ok(Artifact {
        path,
        metadata: metadata(
            "AncestryDNA full genotyping data, original format",
            &["AncestryDNA", "genotyping"],
        ),
    })
}

/// Writes the sorted VCF, bzip2-compressed.
pub fn write_vcf_artifact(directory: &Path, basename: &str, vcf: &str) -> Result<Artifact> {
    let path = directory.join(format!("{basename}.vcf.bz2"));

    let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder
        .write_all(vcf.as_bytes())
        .context("failed to compress VCF artifact")?;
    let compressed = encoder
        .finish()
        .context("failed to finish VCF compression")?;

    persist(directory, &path, &compressed)?;
    Ok(Artifact {
        path,
        metadata: metadata(
            "AncestryDNA full genotyping data, VCF format",
            &["AncestryDNA", "genotyping", "vcf"],
        ),
    })
}

/// Run metadata serialized alongside the artifacts for downstream tooling.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub version: &'a str,
    pub sex: String,
    pub statistics: &'a crate::ConversionSummary,
    pub artifacts: Vec<&'a ArtifactMetadata>,
}

/// Writes `<basename>_report.json` next to the artifacts.
pub fn write_run_report(directory: &Path, basename: &str, report: &RunReport<'_>) -> Result<PathBuf> {
    let path = directory.join(format!("{basename}_report.json"));
    let json = serde_json::to_string_pretty(report).context("failed to serialize run report")?;
    persist(directory, &path, json.as_bytes())?;
    tracing::info!(path = %path.display(), "wrote run report");
    Ok(path)
}

fn persist(directory: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut staging = NamedTempFile::new_in(directory)
        .with_context(|| format!("failed to stage artifact in {}", directory.display()))?;
    staging
        .write_all(bytes)
        .context("failed to write artifact")?;
    staging
        .persist(path)
        .with_context(|| format!("failed to persist artifact {}", path.display()))?;
    Ok(())
}

fn metadata(description: &str, tags: &[&str]) -> ArtifactMetadata {
    let creation_date = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"));
    ArtifactMetadata {
        description: String::from(description),
        tags: tags.iter().map(|tag| String::from(*tag)).collect(),
        creation_date,
    }
}
