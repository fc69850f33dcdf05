//! Fixed header material for AncestryDNA raw exports.
//!
//! Everything the cleaner matches against lives here: the banner line, the
//! version-tag patterns, the historical descriptive header blocks, and the
//! column header. All of it is process-wide immutable data.

use once_cell::sync::Lazy;
use regex::Regex;

/// First line of every genuine export.
pub const BANNER: &str = "#AncestryDNA raw data download";

/// Prefix of the normalized generation-date line emitted by the cleaner.
pub const GENERATED_AT_PREFIX: &str = "#This file was generated by AncestryDNA at: ";

/// The only non-comment header line; separates the header from the body.
pub const COLUMNS_HEADER: &str = "rsid\tchromosome\tposition\tallele1\tallele2";

/// Vendor timestamp embedded in the second header line, e.g.
/// `03/04/2015 14:12:19 MDT`.
pub static GENERATION_TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-1][0-9]/[0-3][0-9]/20[1-9][0-9] [0-9][0-9]:[0-9][0-9]:[0-9][0-9]) MDT")
        .expect("valid timestamp pattern")
});

pub static ARRAY_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#Data was collected using AncestryDNA array version: V\d\.\d")
        .expect("valid array version pattern")
});

pub static CONVERTER_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#Data is formatted using AncestryDNA converter version: V\d\.\d")
        .expect("valid converter version pattern")
});

/// Strict five-field body line. Capture groups: chromosome code, allele 1,
/// allele 2. The chromosome code is range-checked separately.
pub static GENOTYPE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((?:rs|VGXS)[0-9]+)\t([1-9][0-9]?)\t([0-9]+)\t([ACGTDI0])\t([ACGTDI0])$")
        .expect("valid genotype line pattern")
});

/// Oldest descriptive block observed in the wild.
pub const HEADER_V1: &[&str] = &[
    "#Below is a text version of your DNA file from Ancestry.com DNA, LLC.  THIS",
    "#INFORMATION IS FOR YOUR PERSONAL USE AND IS INTENDED FOR GENEALOGICAL RESEARCH",
    "#ONLY.  IT IS NOT INTENDED FOR MEDICAL OR HEALTH PURPOSES.",
    "#",
    "#Genetic data is provided below as five TAB delimited columns.  Each line",
    "#corresponds to a SNP.  Column one provides the SNP identifier (rsID where",
    "#possible).  Columns two and three contain the chromosome and basepair position",
    "#of the SNP using human reference build 37.1 coordinates.  Columns four and five",
    "#contain the two alleles observed at this SNP (genotype).  The genotype is reported",
    "#on the forward (+) strand with respect to the human reference.",
];

pub const HEADER_V2: &[&str] = &[
    "#Below is a text version of your DNA file from Ancestry.com DNA, LLC.  THIS",
    "#INFORMATION IS FOR YOUR PERSONAL USE AND IS INTENDED FOR GENEALOGICAL RESEARCH",
    "#ONLY.  IT IS NOT INTENDED FOR MEDICAL OR HEALTH PURPOSES.  THE EXPORTED DATA IS",
    "#SUBJECT TO THE AncestryDNA TERMS AND CONDITIONS, BUT PLEASE BE AWARE THAT THE",
    "#DOWNLOADED DATA WILL NO LONGER BE PROTECTED BY OUR SECURITY MEASURES.",
    "#",
    "#Genetic data is provided below as five TAB delimited columns.  Each line",
    "#corresponds to a SNP.  Column one provides the SNP identifier (rsID where",
    "#possible).  Columns two and three contain the chromosome and basepair position",
    "#of the SNP using human reference build 37.1 coordinates.  Columns four and five",
    "#contain the two alleles observed at this SNP (genotype).  The genotype is reported",
    "#on the forward (+) strand with respect to the human reference.",
];

pub const HEADER_V3: &[&str] = &[
    "#Below is a text version of your DNA file from Ancestry.com DNA, LLC.  THIS",
    "#INFORMATION IS FOR YOUR PERSONAL USE AND IS INTENDED FOR GENEALOGICAL RESEARCH",
    "#ONLY.  IT IS NOT INTENDED FOR MEDICAL OR HEALTH PURPOSES.  THE EXPORTED DATA IS",
    "#SUBJECT TO THE AncestryDNA TERMS AND CONDITIONS, BUT PLEASE BE AWARE THAT THE",
    "#DOWNLOADED DATA WILL NO LONGER BE PROTECTED BY OUR SECURITY MEASURES.",
    "#WHEN YOU DOWNLOAD YOUR RAW DNA DATA, YOU ASSUME ALL RISK OF STORING,",
    "#SECURING AND PROTECTING YOUR DATA.  FOR MORE INFORMATION, SEE ANCESTRYDNA FAQS.",
    "#",
    "#Genetic data is provided below as five TAB delimited columns.  Each line",
    "#corresponds to a SNP.  Column one provides the SNP identifier (rsID where",
    "#possible).  Columns two and three contain the chromosome and basepair position",
    "#of the SNP using human reference build 37.1 coordinates.  Columns four and five",
    "#contain the two alleles observed at this SNP (genotype).  The genotype is reported",
    "#on the forward (+) strand with respect to the human reference.  Uncalled",
    "#genotypes are reported as a pair of zeroes.",
];

/// Known descriptive blocks, tried in order against the candidate block.
pub const KNOWN_HEADERS: &[(&str, &[&str])] = &[
    ("V1", HEADER_V1),
    ("V2", HEADER_V2),
    ("V3", HEADER_V3),
];

/// Returns the canonical lines for the first known variant the candidate
/// block matches exactly (same length, same content, same order).
pub fn classify_header_block(candidate: &[String]) -> Option<&'static [&'static str]> {
    KNOWN_HEADERS
        .iter()
        .find(|(name, lines)| {
            let matched = candidate.len() == lines.len()
                && candidate.iter().zip(lines.iter()).all(|(a, b)| a == b);
            tracing::debug!(variant = name, matched, "header block comparison");
            matched
        })
        .map(|(_, lines)| *lines)
}
