use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::{
    ConversionSummary, archive, cleaner, converter,
    output::{self, Artifact},
    reference::ReferenceTable,
    sex::SexCall,
    sort,
};

/// Configuration required to drive one conversion.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Uploaded export: `.txt`, `.gz`, `.bz2`, or single-entry `.zip`.
    pub input: PathBuf,
    /// Tab-delimited (chromosome, position, base) reference table.
    pub reference: PathBuf,
    /// Directory receiving both artifacts.
    pub output_dir: PathBuf,
    /// Stem shared by both artifact names.
    pub basename: String,
}

impl ConversionConfig {
    pub const DEFAULT_BASENAME: &'static str = "AncestryDNA-genotyping";
}

/// Everything a run produces: the two uploadable artifacts, the inferred
/// sex, and the per-file counters.
#[derive(Debug)]
pub struct ConversionOutput {
    pub raw: Artifact,
    pub vcf: Artifact,
    pub sex: SexCall,
    pub summary: ConversionSummary,
}

/// Runs the whole pipeline for one uploaded export: open, clean, convert,
/// sort, write artifacts.
///
/// Data-quality problems shrink the output and update the summary; any error
/// returned here means the upload was not processable and nothing was
/// published.
pub fn convert_export(config: &ConversionConfig) -> Result<ConversionOutput> {
    tracing::info!(
        input = %config.input.display(),
        reference = %config.reference.display(),
        output_dir = %config.output_dir.display(),
        "starting conversion",
    );

    let reference = ReferenceTable::load(&config.reference)
        .with_context(|| format!("failed to load reference {}", config.reference.display()))?;

    let stream = archive::open_export(&config.input)
        .with_context(|| format!("failed to open input {}", config.input.display()))?;

    let cleaned = cleaner::clean_export(stream)
        .with_context(|| format!("failed to read input {}", config.input.display()))?;
    tracing::info!(
        retained = cleaned.retained_lines,
        dropped = cleaned.malformed_lines,
        sex = %cleaned.sex,
        "cleaned export",
    );

    let mut summary = ConversionSummary {
        malformed_lines: cleaned.malformed_lines,
        ..Default::default()
    };

    let unsorted = converter::vcf_from_cleaned(&cleaned.text, cleaned.sex, &reference, &mut summary)?;
    let sorted = sort::sort_vcf(&unsorted);

    let raw = output::write_raw_artifact(&config.output_dir, &config.basename, &cleaned.text)?;
    let vcf = output::write_vcf_artifact(&config.output_dir, &config.basename, &sorted)?;

    let report = output::RunReport {
        version: env!("CARGO_PKG_VERSION"),
        sex: cleaned.sex.to_string(),
        statistics: &summary,
        artifacts: vec![&raw.metadata, &vcf.metadata],
    };
    output::write_run_report(&config.output_dir, &config.basename, &report)?;

    tracing::info!(
        emitted = summary.emitted_records,
        variants = summary.variant_records,
        "conversion finished",
    );

    Ok(ConversionOutput {
        raw,
        vcf,
        sex: cleaned.sex,
        summary,
    })
}
