use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use thiserror::Error;

/// Errors raised while loading the reference table. A reference problem is
/// always fatal; conversion cannot start without a usable table.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: expected three tab-delimited fields")]
    MalformedRow { line: u64 },
    #[error("line {line}: invalid position {position:?}")]
    InvalidPosition { line: u64, position: String },
    #[error("line {line}: invalid reference base {base:?}")]
    InvalidBase { line: u64, base: String },
}

/// In-memory (chromosome code, position) -> reference base table.
///
/// Loaded once per run and read-only thereafter; a missing entry is an
/// expected outcome, not an error.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    by_chromosome: HashMap<String, HashMap<u64, char>>,
}

impl ReferenceTable {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ReferenceError> {
        let mut by_chromosome: HashMap<String, HashMap<u64, char>> = HashMap::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let number = index as u64 + 1;
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split('\t');
            let (Some(chromosome), Some(position), Some(base)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(ReferenceError::MalformedRow { line: number });
            };

            let position: u64 = position
                .parse()
                .map_err(|_| ReferenceError::InvalidPosition {
                    line: number,
                    position: position.to_string(),
                })?;

            let base = match base {
                "A" => 'A',
                "C" => 'C',
                "G" => 'G',
                "T" => 'T',
                other => {
                    return Err(ReferenceError::InvalidBase {
                        line: number,
                        base: other.to_string(),
                    });
                }
            };

            by_chromosome
                .entry(chromosome.to_string())
                .or_default()
                .insert(position, base);
        }

        Ok(Self { by_chromosome })
    }

    /// Reference base at (chromosome code, position), if known.
    pub fn base(&self, chromosome: &str, position: u64) -> Option<char> {
        self.by_chromosome
            .get(chromosome)
            .and_then(|positions| positions.get(&position))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.by_chromosome.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_chromosome.is_empty()
    }
}
