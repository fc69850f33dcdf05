//! Chromosome-aware ordering of a VCF text stream.

use crate::chrom;

/// Reorders the body of a VCF text stream by (chromosome sort key, numeric
/// position), leaving the leading header block untouched.
///
/// The key comes from the exact tab-delimited CHROM field, so spellings that
/// prefix one another ("1" vs "10") can never collide. Lines whose CHROM
/// resolves to no known chromosome keep their relative order after every
/// resolvable chromosome; the stable sort makes re-sorting sorted output a
/// no-op.
pub fn sort_vcf(vcf: &str) -> String {
    let mut out = String::with_capacity(vcf.len() + 1);
    let mut body: Vec<&str> = Vec::new();
    let mut in_header = true;
    let mut unresolved = 0usize;

    for line in vcf.lines() {
        if in_header && line.starts_with('#') {
            out.push_str(line);
            out.push('\n');
            continue;
        }
        in_header = false;
        if line_key(line).0 == u8::MAX {
            unresolved += 1;
        }
        body.push(line);
    }

    if unresolved > 0 {
        tracing::warn!(
            lines = unresolved,
            "body lines with unrecognized CHROM sorted after all known chromosomes"
        );
    }

    body.sort_by_key(|line| line_key(line));

    for line in body {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn line_key(line: &str) -> (u8, u64) {
    let mut fields = line.split('\t');
    let chromosome = fields.next().unwrap_or_default();
    let key = chrom::sort_key(chromosome).unwrap_or(u8::MAX);
    let position = fields
        .next()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(u64::MAX);
    (key, position)
}
