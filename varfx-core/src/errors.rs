use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("Error parsing region: {0}")]
    ParseError(String),

    #[error("Region end is before its start: {0}")]
    InvalidRange(String),

    #[error("Invalid strand: {0}")]
    InvalidStrand(String),
}

#[derive(Error, Debug)]
pub enum VariantError {
    #[error("Both REF and ALT are empty")]
    EmptyAlleles,

    #[error("Variants with multiple ALTs are not allowed (ALT: '{0}')")]
    MultipleAlts(String),

    #[error("Symbolic allele needs an explicit end position: {0}")]
    SymbolicAllele(String),

    #[error("Invalid base '{0}' in allele")]
    InvalidBase(char),

    #[error("Cannot parse breakend: {0}")]
    InvalidBreakend(String),

    #[error("Unknown variant type: {0}")]
    UnknownVariantType(String),
}
