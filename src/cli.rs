use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{ConversionConfig, ConversionOutput, convert_export};

#[derive(Debug, Parser)]
#[command(author, version, about = "Convert AncestryDNA raw exports to sorted VCF", long_about = None)]
struct Cli {
    /// Raw export: .txt, .gz, .bz2, or a .zip with a single entry
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Tab-delimited reference table (chromosome, position, base)
    #[arg(long, value_name = "REFERENCE")]
    reference: PathBuf,

    /// Directory receiving the cleaned export and the compressed VCF
    #[arg(long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Stem for both artifact names
    #[arg(long, default_value = ConversionConfig::DEFAULT_BASENAME)]
    basename: String,

    /// Logging verbosity (e.g. error, warn, info, debug)
    #[arg(long, default_value = "info")]
    log_level: String,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    std::fs::create_dir_all(&cli.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            cli.output_dir.display()
        )
    })?;

    let config = ConversionConfig {
        input: cli.input,
        reference: cli.reference,
        output_dir: cli.output_dir,
        basename: cli.basename,
    };

    let output = convert_export(&config)?;
    print_summary(&output);

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();
    Ok(())
}

fn print_summary(output: &ConversionOutput) {
    let summary = &output.summary;

    println!(
        "Processed {total} genotype lines; emitted {emitted} records ({variants} variants, {references} reference) for a {sex} genotype.",
        total = summary.total_records,
        emitted = summary.emitted_records,
        variants = summary.variant_records,
        references = summary.reference_records,
        sex = output.sex,
    );
    println!(
        "Wrote {raw} and {vcf}.",
        raw = output.raw.path.display(),
        vcf = output.vcf.path.display(),
    );

    if summary.malformed_lines > 0 {
        println!(
            "Dropped {count} lines that did not match the expected format.",
            count = summary.malformed_lines
        );
    }

    if summary.uncalled_genotypes > 0 {
        println!(
            "Skipped {count} sites without explicit base calls.",
            count = summary.uncalled_genotypes
        );
    }

    if summary.missing_reference_sites > 0 {
        println!(
            "Skipped {count} sites with no reference allele.",
            count = summary.missing_reference_sites
        );
    }

    if summary.unconvertible_chromosomes > 0 || summary.female_y_sites > 0 {
        println!(
            "Skipped {chrom} unconvertible-chromosome sites and {y} Y sites.",
            chrom = summary.unconvertible_chromosomes,
            y = summary.female_y_sites
        );
    }
}
