use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::VariantError;
use crate::models::Region;

/// Variants larger than this many bases are always "huge".
pub const HUGE_VARIANT_SIZE_THRESHOLD: u32 = 1_000_000;
/// Fraction of the chromosome above which a variant is "huge".
pub const HUGE_VARIANT_RATIO_THRESHOLD: f64 = 0.01;

#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariantType {
    Snp,
    Mnp,
    Ins,
    Del,
    Dup,
    Inv,
    Mixed,
    /// Not a variant, just a genomic interval (e.g. a BED record).
    Interval,
    Bnd,
}

impl Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariantType::Snp => "SNP",
            VariantType::Mnp => "MNP",
            VariantType::Ins => "INS",
            VariantType::Del => "DEL",
            VariantType::Dup => "DUP",
            VariantType::Inv => "INV",
            VariantType::Mixed => "MIXED",
            VariantType::Interval => "INTERVAL",
            VariantType::Bnd => "BND",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for VariantType {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SNP" => Ok(VariantType::Snp),
            "MNP" => Ok(VariantType::Mnp),
            "INS" => Ok(VariantType::Ins),
            "DEL" => Ok(VariantType::Del),
            "DUP" => Ok(VariantType::Dup),
            "INV" => Ok(VariantType::Inv),
            "MIXED" => Ok(VariantType::Mixed),
            "INTERVAL" => Ok(VariantType::Interval),
            "BND" => Ok(VariantType::Bnd),
            _ => Err(VariantError::UnknownVariantType(s.to_string())),
        }
    }
}

///
/// Partner side of a translocation. `left` is true for `]`-style
/// brackets, `before` when the bracketed position precedes the local bases.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Breakend {
    pub chr: String,
    pub pos: u32,
    pub left: bool,
    pub before: bool,
}

impl Breakend {
    ///
    /// Parse the ALT field of a breakend record, e.g. `G]chr17:198982]`.
    /// Positions in the notation are 1-based, the result is 0-based.
    ///
    /// Returns the breakend plus the local bases of the ALT.
    ///
    pub fn parse(alt: &str) -> Result<(Breakend, String), VariantError> {
        let left = alt.contains(']');
        let sep = if left { ']' } else { '[' };
        let parts: Vec<&str> = alt.split(sep).collect();
        if parts.len() != 3 {
            return Err(VariantError::InvalidBreakend(alt.to_string()));
        }

        let before = alt.starts_with(']') || alt.starts_with('[');
        let bases = if before { parts[2] } else { parts[0] };

        let (chr, pos) = parts[1]
            .rsplit_once(':')
            .ok_or_else(|| VariantError::InvalidBreakend(alt.to_string()))?;
        let pos: u32 = pos
            .parse()
            .map_err(|_| VariantError::InvalidBreakend(alt.to_string()))?;
        if chr.is_empty() || pos == 0 {
            return Err(VariantError::InvalidBreakend(alt.to_string()));
        }

        Ok((
            Breakend {
                chr: chr.to_string(),
                pos: pos - 1,
                left,
                before,
            },
            bases.to_ascii_uppercase(),
        ))
    }
}

///
/// A sequence change relative to the reference genome.
///
/// `region.start` is always the leftmost affected base and `region.end` the
/// rightmost affected reference base (equal to `start` for SNPs and
/// insertions). Variants are never mutated once built.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variant {
    pub region: Region,
    pub reference: String,
    pub alt: String,
    pub variant_type: VariantType,
    pub genotype: Option<String>,
    pub id: Option<String>,
    pub breakend: Option<Breakend>,
}

impl Variant {
    ///
    /// Create a variant from already normalized alleles (no shared anchor
    /// base). The type is inferred from the alleles.
    ///
    /// # Arguments
    /// - chr: chromosome name
    /// - start: 0-based position of the first reference base
    /// - reference: reference allele (empty for insertions)
    /// - alt: alternative allele (empty for deletions)
    ///
    pub fn new(chr: &str, start: u32, reference: &str, alt: &str) -> Self {
        let reference = reference.to_ascii_uppercase();
        let alt = alt.to_ascii_uppercase();

        let variant_type = if reference == alt {
            VariantType::Interval
        } else if reference.len() == 1 && alt.len() == 1 {
            VariantType::Snp
        } else if reference.len() == alt.len() {
            VariantType::Mnp
        } else if reference.len() < alt.len() && alt.starts_with(&reference) {
            VariantType::Ins
        } else if reference.len() > alt.len() && reference.starts_with(&alt) {
            VariantType::Del
        } else {
            VariantType::Mixed
        };

        let end = match variant_type {
            VariantType::Ins | VariantType::Snp => start,
            _ if reference.len() > 1 => start + reference.len() as u32 - 1,
            _ => start,
        };

        Variant {
            region: Region::new(chr, start, end),
            reference,
            alt,
            variant_type,
            genotype: None,
            id: None,
            breakend: None,
        }
    }

    ///
    /// Create a variant from VCF-style alleles: the common leading and
    /// trailing bases are trimmed and `start` is shifted accordingly.
    /// Symbolic alleles (`<DEL>`) need an explicit end, use
    /// [`Variant::structural`] for those. Breakend notation produces a BND.
    ///
    pub fn from_alleles(
        chr: &str,
        start: u32,
        reference: &str,
        alt: &str,
    ) -> Result<Self, VariantError> {
        if reference.is_empty() && alt.is_empty() {
            return Err(VariantError::EmptyAlleles);
        }
        if alt.contains(',') || alt.contains('/') {
            return Err(VariantError::MultipleAlts(alt.to_string()));
        }
        if alt.starts_with('<') {
            return Err(VariantError::SymbolicAllele(alt.to_string()));
        }
        if alt.contains('[') || alt.contains(']') {
            let (breakend, _) = Breakend::parse(alt)?;
            return Ok(Variant::translocation(chr, start, reference, breakend));
        }
        if let Some(bad) = reference
            .chars()
            .chain(alt.chars())
            .find(|c| !c.is_ascii_alphabetic() && *c != '*')
        {
            return Err(VariantError::InvalidBase(bad));
        }

        let reference = reference.as_bytes();
        let alt = alt.as_bytes();

        let prefix = reference
            .iter()
            .zip(alt.iter())
            .take_while(|(r, a)| r.eq_ignore_ascii_case(a))
            .count();
        let max_suffix = reference.len().min(alt.len()) - prefix;
        let suffix = reference[prefix..]
            .iter()
            .rev()
            .zip(alt[prefix..].iter().rev())
            .take(max_suffix)
            .take_while(|(r, a)| r.eq_ignore_ascii_case(a))
            .count();

        let r = String::from_utf8_lossy(&reference[prefix..reference.len() - suffix]);
        let a = String::from_utf8_lossy(&alt[prefix..alt.len() - suffix]);

        if r.is_empty() && a.is_empty() {
            // identical alleles, keep it as an interval over the reference
            let reference = String::from_utf8_lossy(reference);
            return Ok(Variant::new(chr, start, &reference, &reference));
        }

        Ok(Variant::new(chr, start + prefix as u32, &r, &a))
    }

    ///
    /// A structural variant with known span and no allele sequence.
    ///
    /// # Panics
    /// When `variant_type` is not DEL, DUP, INV or INTERVAL.
    ///
    pub fn structural(chr: &str, start: u32, end: u32, variant_type: VariantType) -> Self {
        assert!(
            matches!(
                variant_type,
                VariantType::Del | VariantType::Dup | VariantType::Inv | VariantType::Interval
            ),
            "Cannot create a structural variant of type {}",
            variant_type
        );
        assert!(start <= end, "Variant start {} is after end {}", start, end);

        Variant {
            region: Region::new(chr, start, end),
            reference: String::new(),
            alt: String::new(),
            variant_type,
            genotype: None,
            id: None,
            breakend: None,
        }
    }

    /// A plain genomic interval (not a variant).
    pub fn interval(chr: &str, start: u32, end: u32) -> Self {
        Variant::structural(chr, start, end, VariantType::Interval)
    }

    pub fn translocation(chr: &str, pos: u32, reference: &str, breakend: Breakend) -> Self {
        Variant {
            region: Region::new(chr, pos, pos),
            reference: reference.to_ascii_uppercase(),
            alt: String::new(),
            variant_type: VariantType::Bnd,
            genotype: None,
            id: None,
            breakend: Some(breakend),
        }
    }

    pub fn with_genotype(mut self, genotype: &str) -> Self {
        self.genotype = Some(genotype.to_string());
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn chr(&self) -> &str {
        &self.region.chr
    }

    pub fn start(&self) -> u32 {
        self.region.start
    }

    pub fn end(&self) -> u32 {
        self.region.end
    }

    pub fn size(&self) -> u32 {
        self.region.size()
    }

    /// Everything except plain intervals.
    pub fn is_variant(&self) -> bool {
        self.variant_type != VariantType::Interval
    }

    pub fn is_snp(&self) -> bool {
        self.variant_type == VariantType::Snp
    }

    pub fn is_mnp(&self) -> bool {
        self.variant_type == VariantType::Mnp
    }

    pub fn is_ins(&self) -> bool {
        self.variant_type == VariantType::Ins
    }

    pub fn is_del(&self) -> bool {
        self.variant_type == VariantType::Del
    }

    pub fn is_dup(&self) -> bool {
        self.variant_type == VariantType::Dup
    }

    pub fn is_inv(&self) -> bool {
        self.variant_type == VariantType::Inv
    }

    pub fn is_mixed(&self) -> bool {
        self.variant_type == VariantType::Mixed
    }

    pub fn is_bnd(&self) -> bool {
        self.variant_type == VariantType::Bnd
    }

    pub fn is_structural(&self) -> bool {
        matches!(
            self.variant_type,
            VariantType::Del | VariantType::Dup | VariantType::Inv | VariantType::Bnd
        )
    }

    ///
    /// Is this a structural variant covering a large part of a chromosome?
    /// Uses the default thresholds.
    ///
    pub fn is_structural_huge(&self, chr_size: u32) -> bool {
        self.is_structural_huge_with(
            chr_size,
            HUGE_VARIANT_SIZE_THRESHOLD,
            HUGE_VARIANT_RATIO_THRESHOLD,
        )
    }

    pub fn is_structural_huge_with(
        &self,
        chr_size: u32,
        size_threshold: u32,
        ratio_threshold: f64,
    ) -> bool {
        if !self.is_structural() {
            return false;
        }

        let size = self.size();
        if chr_size > size_threshold {
            let ratio = size as f64 / chr_size as f64;
            return size > size_threshold || ratio > ratio_threshold;
        }
        size > size_threshold
    }

    ///
    /// Number of bases gained (positive) or lost (negative).
    ///
    pub fn length_change(&self) -> i64 {
        if self.is_snp() || self.is_mnp() {
            return 0;
        }
        if !self.reference.is_empty() || !self.alt.is_empty() {
            return self.alt.len() as i64 - self.reference.len() as i64;
        }
        match self.variant_type {
            VariantType::Del => -(self.size() as i64),
            VariantType::Dup => self.size() as i64,
            _ => 0,
        }
    }

    ///
    /// Bases inserted or deleted, on the positive strand.
    ///
    pub fn net_change(&self) -> &str {
        if self.is_del() {
            &self.reference
        } else {
            &self.alt
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reference = if self.reference.is_empty() {
            "-"
        } else {
            &self.reference
        };
        let alt = if self.alt.is_empty() { "-" } else { &self.alt };
        write!(
            f,
            "{}:{}-{}_{}/{} {}",
            self.region.chr,
            self.region.start,
            self.region.end,
            reference,
            alt,
            self.variant_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("A", "T", VariantType::Snp, 100, 100)]
    #[case("AC", "TG", VariantType::Mnp, 100, 101)]
    #[case("", "TT", VariantType::Ins, 100, 100)]
    #[case("ACG", "", VariantType::Del, 100, 102)]
    #[case("ACG", "T", VariantType::Mixed, 100, 102)]
    #[case("A", "A", VariantType::Interval, 100, 100)]
    fn test_variant_type_from_alleles(
        #[case] reference: &str,
        #[case] alt: &str,
        #[case] expected: VariantType,
        #[case] start: u32,
        #[case] end: u32,
    ) {
        let variant = Variant::new("chr1", 100, reference, alt);
        assert_eq!(variant.variant_type, expected);
        assert_eq!(variant.start(), start);
        assert_eq!(variant.end(), end);
    }

    #[rstest]
    fn test_from_alleles_trims_anchor_base() {
        let del = Variant::from_alleles("chr1", 99, "TACG", "T").unwrap();
        assert_eq!(del.variant_type, VariantType::Del);
        assert_eq!(del.reference, "ACG");
        assert_eq!(del.start(), 100);
        assert_eq!(del.end(), 102);
        assert_eq!(del.length_change(), -3);

        let ins = Variant::from_alleles("chr1", 99, "T", "TGG").unwrap();
        assert_eq!(ins.variant_type, VariantType::Ins);
        assert_eq!(ins.alt, "GG");
        assert_eq!(ins.start(), 100);
        assert_eq!(ins.length_change(), 2);
    }

    #[rstest]
    fn test_from_alleles_errors() {
        assert!(Variant::from_alleles("chr1", 1, "A", "C,G").is_err());
        assert!(Variant::from_alleles("chr1", 1, "A", "<DEL>").is_err());
        assert!(Variant::from_alleles("chr1", 1, "", "").is_err());
        assert!(Variant::from_alleles("chr1", 1, "A", "C1").is_err());
    }

    #[rstest]
    #[case("G]chr17:198982]", "chr17", 198981, true, false)]
    #[case("]chr13:123456]T", "chr13", 123455, true, true)]
    #[case("C[chr2:321682[", "chr2", 321681, false, false)]
    #[case("[chr17:198983[A", "chr17", 198982, false, true)]
    fn test_parse_breakend(
        #[case] alt: &str,
        #[case] chr: &str,
        #[case] pos: u32,
        #[case] left: bool,
        #[case] before: bool,
    ) {
        let (breakend, _) = Breakend::parse(alt).unwrap();
        assert_eq!(breakend.chr, chr);
        assert_eq!(breakend.pos, pos);
        assert_eq!(breakend.left, left);
        assert_eq!(breakend.before, before);

        let variant = Variant::from_alleles("chr1", 10, "C", alt).unwrap();
        assert!(variant.is_bnd());
        assert!(variant.is_structural());
    }

    #[rstest]
    fn test_structural_huge() {
        let small = Variant::structural("chr1", 1000, 2000, VariantType::Del);
        assert!(!small.is_structural_huge(200_000_000));

        let big = Variant::structural("chr1", 1000, 2_001_000, VariantType::Del);
        assert!(big.is_structural_huge(200_000_000));

        // 5% of a 50Mb chromosome
        let ratio = Variant::structural("chr1", 0, 2_499_999, VariantType::Inv);
        assert!(ratio.is_structural_huge(50_000_000));

        let snp = Variant::new("chr1", 1, "A", "C");
        assert!(!snp.is_structural_huge(10));
    }

    #[rstest]
    fn test_interval_is_not_variant() {
        let interval = Variant::interval("chr1", 10, 20);
        assert!(!interval.is_variant());
        assert_eq!(interval.size(), 11);
    }
}
