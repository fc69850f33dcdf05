//! Genotypic sex inference from Y-chromosome call density.
//!
//! The array always reports two alleles for X and Y positions. For XY
//! individuals haplozygous positions are redundantly reported; for XX
//! individuals Y positions come back as the "0" placeholder. Neither holds
//! universally, so the classification is a ratio test rather than an exact
//! one.

use std::fmt;

use crate::genotype::GenotypeLine;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SexCall {
    Female,
    Male,
}

impl fmt::Display for SexCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Female => f.write_str("Female"),
            Self::Male => f.write_str("Male"),
        }
    }
}

/// Single-pass accumulator over the retained body lines of one export.
#[derive(Debug, Default)]
pub struct SexAccumulator {
    reported_y: u64,
    called_y: u64,
}

impl SexAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, line: &GenotypeLine) {
        if !line.is_y() {
            return;
        }
        self.reported_y += 1;
        if line.allele1.is_called() && line.allele2.is_called() {
            self.called_y += 1;
        }
    }

    /// Male iff any Y positions were reported and strictly more than half of
    /// them carried a true call. The threshold comparison is `>`, not `>=`.
    pub fn finish(&self) -> SexCall {
        if self.reported_y == 0 {
            return SexCall::Female;
        }
        if self.called_y as f64 / self.reported_y as f64 > 0.5 {
            SexCall::Male
        } else {
            SexCall::Female
        }
    }
}
