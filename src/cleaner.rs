//! Header classification and permissive cleaning of a raw export.
//!
//! The vendor has changed the export header several times and real uploads
//! arrive truncated, re-saved, or hand-edited. Cleaning is therefore a chain
//! of independent pattern checks: every unrecognized line shrinks the output
//! and nothing short of a stream read failure aborts it.

use std::io::{self, BufRead};

use time::{PrimitiveDateTime, macros::format_description};

use crate::genotype::GenotypeLine;
use crate::headers;
use crate::sex::{SexAccumulator, SexCall};

/// Result of cleaning one export: the normalized text and the genotypic sex
/// inferred from its Y-chromosome calls.
#[derive(Debug)]
pub struct CleanedExport {
    pub text: String,
    pub sex: SexCall,
    /// Count of body lines dropped for not matching the five-field pattern.
    pub malformed_lines: usize,
    /// Count of body lines retained.
    pub retained_lines: usize,
}

/// Cleans a decompressed export stream.
///
/// Total over any text input; the only error it returns is a stream read
/// failure. Absence of a valid banner, header block, or column header simply
/// yields a smaller output.
pub fn clean_export<R: BufRead>(reader: R) -> io::Result<CleanedExport> {
    let mut lines = reader.lines();
    let mut out = String::new();

    if let Some(line) = lines.next().transpose()? {
        if line.trim_end() == headers::BANNER {
            push_line(&mut out, headers::BANNER);
        }
    }

    if let Some(line) = lines.next().transpose()? {
        if let Some(generated_at) = reformat_generation_date(line.trim_end()) {
            push_line(&mut out, &generated_at);
        }
    }

    for pattern in [&headers::ARRAY_VERSION_RE, &headers::CONVERTER_VERSION_RE] {
        if let Some(line) = lines.next().transpose()? {
            let line = line.trim_end().to_string();
            if pattern.is_match(&line) {
                push_line(&mut out, &line);
            }
        }
    }

    // Everything commented from here on is the descriptive block; the first
    // non-comment line is the column-header candidate.
    let mut block = Vec::new();
    let mut column_candidate = None;
    for line in lines.by_ref() {
        let line = line?;
        if line.starts_with('#') {
            block.push(line.trim_end().to_string());
        } else {
            column_candidate = Some(line);
            break;
        }
    }

    match headers::classify_header_block(&block) {
        Some(canonical) => {
            for line in canonical {
                push_line(&mut out, line);
            }
        }
        None => {
            tracing::warn!("descriptive header did not match any known AncestryDNA layout");
        }
    }

    if let Some(line) = column_candidate {
        if line.trim_end() == headers::COLUMNS_HEADER {
            push_line(&mut out, headers::COLUMNS_HEADER);
        }
    }

    let mut sex = SexAccumulator::new();
    let mut malformed_lines = 0;
    let mut retained_lines = 0;

    for line in lines {
        let line = line?;
        let trimmed = line.trim_end_matches(['\n', '\r']);
        match GenotypeLine::parse(trimmed) {
            Some(genotype) => {
                sex.observe(&genotype);
                push_line(&mut out, trimmed);
                retained_lines += 1;
            }
            None => {
                // Only report this class of problem once per file.
                if malformed_lines == 0 {
                    tracing::warn!(line = %trimmed, "body did not conform to expected format");
                }
                malformed_lines += 1;
            }
        }
    }

    Ok(CleanedExport {
        text: out,
        sex: sex.finish(),
        malformed_lines,
        retained_lines,
    })
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Rewrites the vendor `MM/DD/YYYY HH:MM:SS MDT` generation timestamp into
/// the long-form date line. Any line without that timestamp is dropped.
fn reformat_generation_date(line: &str) -> Option<String> {
    let captures = headers::GENERATION_TIMESTAMP_RE.captures(line)?;
    let parsed = PrimitiveDateTime::parse(
        &captures[1],
        format_description!("[month]/[day]/[year] [hour]:[minute]:[second]"),
    )
    .ok()?;
    let formatted = parsed
        .format(format_description!(
            "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [year]"
        ))
        .ok()?;
    Some(format!("{}{} MDT", headers::GENERATED_AT_PREFIX, formatted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn well_formed_export(body: &str) -> String {
        let mut text = String::new();
        text.push_str("#AncestryDNA raw data download\r\n");
        text.push_str("#This file was generated by AncestryDNA at: 03/04/2015 14:12:19 MDT\r\n");
        text.push_str("#Data was collected using AncestryDNA array version: V2.0\r\n");
        text.push_str("#Data is formatted using AncestryDNA converter version: V1.0\r\n");
        for line in headers::HEADER_V3 {
            text.push_str(line);
            text.push_str("\r\n");
        }
        text.push_str("rsid\tchromosome\tposition\tallele1\tallele2\r\n");
        text.push_str(body);
        text
    }

    #[test]
    fn cleans_well_formed_export() {
        let input = well_formed_export("rs1\t1\t100\tA\tG\r\nrs2\t2\t200\tC\tC\r\n");
        let cleaned = clean_export(Cursor::new(input)).expect("clean");

        let lines: Vec<&str> = cleaned.text.lines().collect();
        assert_eq!(lines[0], headers::BANNER);
        assert_eq!(
            lines[1],
            "#This file was generated by AncestryDNA at: Wed Mar 04 14:12:19 2015 MDT"
        );
        assert_eq!(
            lines[2],
            "#Data was collected using AncestryDNA array version: V2.0"
        );
        assert_eq!(
            lines[3],
            "#Data is formatted using AncestryDNA converter version: V1.0"
        );
        assert_eq!(&lines[4..4 + headers::HEADER_V3.len()], headers::HEADER_V3);
        assert_eq!(lines[4 + headers::HEADER_V3.len()], headers::COLUMNS_HEADER);
        assert!(cleaned.text.ends_with("rs2\t2\t200\tC\tC\n"));
        assert_eq!(cleaned.retained_lines, 2);
        assert_eq!(cleaned.malformed_lines, 0);
        assert_eq!(cleaned.sex, SexCall::Female);
    }

    #[test]
    fn unknown_header_block_is_dropped_not_fatal() {
        let mut input = String::from("#AncestryDNA raw data download\n");
        input.push_str("#no timestamp here\n");
        input.push_str("#Data was collected using AncestryDNA array version: V2.0\n");
        input.push_str("#Data is formatted using AncestryDNA converter version: V1.0\n");
        input.push_str("#Some header nobody has seen before\n");
        input.push_str("rsid\tchromosome\tposition\tallele1\tallele2\n");
        input.push_str("rs1\t1\t100\tA\tG\n");

        let cleaned = clean_export(Cursor::new(input)).expect("clean");
        let lines: Vec<&str> = cleaned.text.lines().collect();
        assert_eq!(
            lines,
            vec![
                headers::BANNER,
                "#Data was collected using AncestryDNA array version: V2.0",
                "#Data is formatted using AncestryDNA converter version: V1.0",
                headers::COLUMNS_HEADER,
                "rs1\t1\t100\tA\tG",
            ]
        );
    }

    #[test]
    fn missing_column_header_costs_first_body_line() {
        let mut input = String::from("#AncestryDNA raw data download\n");
        input.push_str("#dateline\n");
        input.push_str("#array\n");
        input.push_str("#converter\n");
        input.push_str("rs1\t1\t100\tA\tG\n");
        input.push_str("rs2\t2\t200\tC\tC\n");

        let cleaned = clean_export(Cursor::new(input)).expect("clean");
        // rs1 was consumed as the column-header candidate and dropped.
        assert!(!cleaned.text.contains("rs1"));
        assert!(cleaned.text.contains("rs2\t2\t200\tC\tC"));
    }

    #[test]
    fn malformed_body_lines_are_dropped_and_counted() {
        let body = "rs1\t1\t100\tA\tG\nJohn Smith\nrs2\t1\t200\tC\tC\nrs3\t99\t1\tA\tA\n";
        let cleaned = clean_export(Cursor::new(well_formed_export(body))).expect("clean");
        assert_eq!(cleaned.retained_lines, 2);
        assert_eq!(cleaned.malformed_lines, 2);
        assert!(!cleaned.text.contains("John Smith"));
        assert!(!cleaned.text.contains("99"));
    }

    #[test]
    fn infers_male_from_y_density() {
        let mut body = String::new();
        for i in 0..6 {
            body.push_str(&format!("rs{i}\t24\t{}\tG\tG\n", 100 + i));
        }
        for i in 6..10 {
            body.push_str(&format!("rs{i}\t24\t{}\t0\t0\n", 100 + i));
        }
        let cleaned = clean_export(Cursor::new(well_formed_export(&body))).expect("clean");
        assert_eq!(cleaned.sex, SexCall::Male);
    }

    #[test]
    fn empty_input_yields_empty_female_output() {
        let cleaned = clean_export(Cursor::new("")).expect("clean");
        assert!(cleaned.text.is_empty());
        assert_eq!(cleaned.sex, SexCall::Female);
    }

    #[test]
    fn dateline_without_timestamp_is_skipped_silently() {
        assert_eq!(reformat_generation_date("#no date"), None);
        assert_eq!(
            reformat_generation_date("#This file was generated by AncestryDNA at: 03/04/2015 14:12:19 MDT"),
            Some(
                "#This file was generated by AncestryDNA at: Wed Mar 04 14:12:19 2015 MDT"
                    .to_string()
            )
        );
    }
}
