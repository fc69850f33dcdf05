//! Per-line conversion of cleaned genotype calls into VCF records.

use anyhow::{Context, Result, anyhow};
use noodles::core::Position;
use noodles::vcf::{
    self as vcf,
    header::{
        FileFormat,
        record::{
            key,
            value::{Collection, Map, map::Format},
        },
    },
    variant::{
        io::Write as VariantRecordWrite,
        record::samples::keys::key as format_key,
        record_buf::{
            AlternateBases, Ids, Info, RecordBuf, Samples,
            info::field::Value as InfoValue,
            samples::{Keys, sample::Value as SampleValue},
        },
    },
};
use time::{OffsetDateTime, macros::format_description};

use crate::ConversionSummary;
use crate::chrom;
use crate::genotype::GenotypeLine;
use crate::headers;
use crate::reference::ReferenceTable;
use crate::sex::SexCall;

/// Recorded provenance of the reference genotypes shipped with the tool.
const REFERENCE_GENOME_URL: &str =
    "http://hgdownload-test.cse.ucsc.edu/goldenPath/hg19/bigZips/hg19.2bit";

/// Name of the single sample column in the generated VCF.
pub const SAMPLE_COLUMN: &str = "ANCESTRYDNA_DATA";

/// Converts the cleaned export text into an unsorted VCF text stream with a
/// generated header. Data-quality skips only update `summary`; the only
/// errors are structural (header construction, UTF-8).
pub fn vcf_from_cleaned(
    cleaned: &str,
    sex: SexCall,
    reference: &ReferenceTable,
    summary: &mut ConversionSummary,
) -> Result<String> {
    let header = build_header()?;
    let keys: Keys = [String::from(format_key::GENOTYPE)].into_iter().collect();

    let mut buf = Vec::new();
    {
        let mut writer = vcf::io::Writer::new(&mut buf);
        writer
            .write_header(&header)
            .context("failed to write VCF header")?;

        for line in cleaned.lines() {
            if line.starts_with('#') || line == headers::COLUMNS_HEADER {
                continue;
            }
            summary.total_records += 1;

            let Some(genotype) = GenotypeLine::parse(line) else {
                summary.malformed_lines += 1;
                continue;
            };

            if let Some(record) = convert_line(&genotype, sex, reference, &keys, summary) {
                summary.record_emission(!record.alternate_bases().as_ref().is_empty());
                writer
                    .write_variant_record(&header, &record)
                    .context("failed to write VCF record")?;
            }
        }
    }

    String::from_utf8(buf).context("generated VCF was not valid UTF-8")
}

/// Applies the per-line rules in order: explicit base calls only, reference
/// lookup, display-code mapping, sex-chromosome handling. Every `None` is an
/// expected skip accounted for in `summary`.
fn convert_line(
    genotype: &GenotypeLine,
    sex: SexCall,
    reference: &ReferenceTable,
    keys: &Keys,
    summary: &mut ConversionSummary,
) -> Option<RecordBuf> {
    let (Some(base1), Some(base2)) = (genotype.allele1.base(), genotype.allele2.base()) else {
        // D/I/0 calls have no VCF representation here.
        summary.uncalled_genotypes += 1;
        return None;
    };

    let Some(reference_base) = reference.base(&genotype.chromosome, genotype.position) else {
        summary.missing_reference_sites += 1;
        return None;
    };

    let Some(chromosome) = chrom::display_code(&genotype.chromosome) else {
        summary.unconvertible_chromosomes += 1;
        return None;
    };

    if genotype.is_y() && sex == SexCall::Female {
        summary.female_y_sites += 1;
        return None;
    }

    let hemizygous = matches!(genotype.chromosome.as_str(), "23" | "24") && sex == SexCall::Male;
    let alleles: Vec<char> = if hemizygous {
        vec![base1]
    } else {
        vec![base1, base2]
    };

    // Distinct non-reference alleles, first-occurrence order.
    let mut alt_bases: Vec<String> = Vec::new();
    for &allele in &alleles {
        if allele != reference_base {
            let alt = allele.to_string();
            if !alt_bases.contains(&alt) {
                alt_bases.push(alt);
            }
        }
    }

    let position = usize::try_from(genotype.position)
        .ok()
        .and_then(Position::new);
    let Some(position) = position else {
        summary.malformed_lines += 1;
        return None;
    };

    let mut info = Info::default();
    if alt_bases.is_empty() {
        // Confirmed-reference site: anchor a zero-length record at POS.
        let end = i32::try_from(genotype.position).unwrap_or(i32::MAX);
        info.insert(String::from("END"), Some(InfoValue::Integer(end)));
    }

    let genotype_string = genotype_indices(&alleles, reference_base, &alt_bases);
    let samples = Samples::new(
        keys.clone(),
        vec![vec![Some(SampleValue::String(genotype_string))]],
    );

    let ids: Ids = if genotype.rsid.starts_with("rs") {
        [genotype.rsid.clone()].into_iter().collect()
    } else {
        Ids::default()
    };

    Some(
        RecordBuf::builder()
            .set_reference_sequence_name(String::from(chromosome))
            .set_variant_start(position)
            .set_ids(ids)
            .set_reference_bases(reference_base.to_string())
            .set_alternate_bases(AlternateBases::from(alt_bases))
            .set_info(info)
            .set_samples(samples)
            .build(),
    )
}

/// 0-based indices of each allele into `[REF] ++ alts`, slash-joined. A
/// single allele yields a single index with no separator.
fn genotype_indices(alleles: &[char], reference_base: char, alts: &[String]) -> String {
    let codes: Vec<String> = alleles
        .iter()
        .map(|&allele| {
            if allele == reference_base {
                String::from("0")
            } else {
                let alt = allele.to_string();
                let index = alts
                    .iter()
                    .position(|candidate| candidate == &alt)
                    .map(|index| index + 1)
                    .unwrap_or_default();
                index.to_string()
            }
        })
        .collect();
    codes.join("/")
}

fn build_header() -> Result<vcf::Header> {
    let builder = vcf::Header::builder()
        .set_file_format(FileFormat::new(4, 1))
        .add_format(
            format_key::GENOTYPE,
            Map::<Format>::from(format_key::GENOTYPE),
        )
        .add_sample_name(String::from(SAMPLE_COLUMN));

    let mut header = builder.build();

    insert_other_record(&mut header, "fileDate", file_date())?;
    insert_other_record(
        &mut header,
        "source",
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
    )?;
    insert_other_record(&mut header, "reference", String::from(REFERENCE_GENOME_URL))?;

    Ok(header)
}

fn insert_other_record(header: &mut vcf::Header, raw_key: &str, value: String) -> Result<()> {
    let parsed: key::Other = raw_key
        .parse()
        .map_err(|e| anyhow!("invalid header key {raw_key}: {e}"))?;
    header
        .other_records_mut()
        .insert(parsed, Collection::Unstructured(vec![value]));
    Ok(())
}

fn file_date() -> String {
    OffsetDateTime::now_utc()
        .format(format_description!("[year][month][day]"))
        .unwrap_or_else(|_| String::from("19700101"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceTable;
    use std::io::Cursor;

    fn reference() -> ReferenceTable {
        ReferenceTable::from_reader(Cursor::new(
            "1\t100\tA\n1\t200\tA\n23\t500\tA\n24\t700\tC\n25\t800\tT\n",
        ))
        .expect("load reference")
    }

    fn records_of(output: &str) -> Vec<&str> {
        output.lines().filter(|line| !line.starts_with('#')).collect()
    }

    #[test]
    fn heterozygous_call_yields_variant_record() {
        let mut summary = ConversionSummary::default();
        let output = vcf_from_cleaned(
            "rs123\t1\t100\tA\tG\n",
            SexCall::Female,
            &reference(),
            &mut summary,
        )
        .expect("convert");
        assert_eq!(
            records_of(&output),
            vec!["1\t100\trs123\tA\tG\t.\t.\t.\tGT\t0/1"]
        );
        assert_eq!(summary.variant_records, 1);
    }

    #[test]
    fn homozygous_reference_yields_end_record() {
        let mut summary = ConversionSummary::default();
        let output = vcf_from_cleaned(
            "rs124\t1\t200\tA\tA\n",
            SexCall::Female,
            &reference(),
            &mut summary,
        )
        .expect("convert");
        assert_eq!(
            records_of(&output),
            vec!["1\t200\trs124\tA\t.\t.\t.\tEND=200\tGT\t0/0"]
        );
        assert_eq!(summary.reference_records, 1);
    }

    #[test]
    fn male_x_call_is_hemizygous() {
        let mut summary = ConversionSummary::default();
        let output = vcf_from_cleaned(
            "VGXS9\t23\t500\tA\tA\n",
            SexCall::Male,
            &reference(),
            &mut summary,
        )
        .expect("convert");
        assert_eq!(
            records_of(&output),
            vec!["X\t500\t.\tA\t.\t.\t.\tEND=500\tGT\t0"]
        );
    }

    #[test]
    fn female_y_call_is_dropped() {
        let mut summary = ConversionSummary::default();
        let output = vcf_from_cleaned(
            "rs200\t24\t700\tC\tC\n",
            SexCall::Female,
            &reference(),
            &mut summary,
        )
        .expect("convert");
        assert!(records_of(&output).is_empty());
        assert_eq!(summary.female_y_sites, 1);
    }

    #[test]
    fn male_y_call_is_hemizygous_alt() {
        let mut summary = ConversionSummary::default();
        let output = vcf_from_cleaned(
            "rs200\t24\t700\tT\tC\n",
            SexCall::Male,
            &reference(),
            &mut summary,
        )
        .expect("convert");
        assert_eq!(
            records_of(&output),
            vec!["Y\t700\trs200\tC\tT\t.\t.\t.\tGT\t1"]
        );
    }

    #[test]
    fn indel_and_uncalled_genotypes_are_skipped() {
        let mut summary = ConversionSummary::default();
        let cleaned = "rs1\t1\t100\tD\tI\nrs2\t1\t100\t0\t0\nrs3\t1\t100\tA\t0\n";
        let output =
            vcf_from_cleaned(cleaned, SexCall::Female, &reference(), &mut summary).expect("convert");
        assert!(records_of(&output).is_empty());
        assert_eq!(summary.uncalled_genotypes, 3);
    }

    #[test]
    fn missing_reference_entry_is_skipped() {
        let mut summary = ConversionSummary::default();
        let output = vcf_from_cleaned(
            "rs1\t2\t100\tA\tG\n",
            SexCall::Female,
            &reference(),
            &mut summary,
        )
        .expect("convert");
        assert!(records_of(&output).is_empty());
        assert_eq!(summary.missing_reference_sites, 1);
    }

    #[test]
    fn chromosome_25_is_not_convertible() {
        let mut summary = ConversionSummary::default();
        let output = vcf_from_cleaned(
            "rs1\t25\t800\tT\tG\n",
            SexCall::Female,
            &reference(),
            &mut summary,
        )
        .expect("convert");
        assert!(records_of(&output).is_empty());
        assert_eq!(summary.unconvertible_chromosomes, 1);
    }

    #[test]
    fn distinct_alts_keep_first_occurrence_order() {
        let mut summary = ConversionSummary::default();
        let output = vcf_from_cleaned(
            "rs1\t1\t100\tG\tC\n",
            SexCall::Female,
            &reference(),
            &mut summary,
        )
        .expect("convert");
        assert_eq!(
            records_of(&output),
            vec!["1\t100\trs1\tA\tG,C\t.\t.\t.\tGT\t1/2"]
        );
    }

    #[test]
    fn header_preamble_fields() {
        let mut summary = ConversionSummary::default();
        let output =
            vcf_from_cleaned("", SexCall::Female, &reference(), &mut summary).expect("convert");
        assert!(output.starts_with("##fileformat=VCFv4.1\n"));
        assert!(output.contains("##fileDate="));
        assert!(output.contains("##source="));
        assert!(output.contains(&format!("##reference={REFERENCE_GENOME_URL}")));
        assert!(output.contains(
            "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">"
        ));
        assert!(output.ends_with(&format!(
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{SAMPLE_COLUMN}\n"
        )));
    }

    #[test]
    fn genotype_index_formatting() {
        assert_eq!(genotype_indices(&['A', 'G'], 'A', &[String::from("G")]), "0/1");
        assert_eq!(genotype_indices(&['G', 'G'], 'A', &[String::from("G")]), "1/1");
        assert_eq!(genotype_indices(&['A'], 'A', &[]), "0");
        assert_eq!(
            genotype_indices(
                &['G', 'C'],
                'A',
                &[String::from("G"), String::from("C")]
            ),
            "1/2"
        );
    }
}
