//! Chromosome spelling tables shared by the converter and the sorter.

const AUTOSOMES: [&str; 22] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21", "22",
];

/// Resolves any accepted chromosome spelling to its numeric sort key.
///
/// Accepted spellings are the bare names `1`..`22`, `X`, `Y`, `M`, `MT` and
/// the same names behind a `chr` or `Chr` prefix. Everything else is `None`.
pub fn sort_key(chromosome: &str) -> Option<u8> {
    let name = chromosome
        .strip_prefix("chr")
        .or_else(|| chromosome.strip_prefix("Chr"))
        .unwrap_or(chromosome);

    match name {
        "X" => Some(23),
        "Y" => Some(24),
        "M" | "MT" => Some(25),
        _ => {
            if name.is_empty() || name.len() > 2 || name.starts_with('0') {
                return None;
            }
            match name.parse::<u8>() {
                Ok(code @ 1..=22) => Some(code),
                _ => None,
            }
        }
    }
}

/// Maps a numeric chromosome code from the export body to the code emitted
/// in the CHROM column. "25" has no display form and is never emitted.
pub fn display_code(code: &str) -> Option<&'static str> {
    match code {
        "23" => Some("X"),
        "24" => Some("Y"),
        _ => code
            .parse::<usize>()
            .ok()
            .filter(|code| (1..=22).contains(code))
            .map(|code| AUTOSOMES[code - 1]),
    }
}
