use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

///
/// Data-quality diagnostics recorded on a [`crate::VariantEffect`].
/// They never abort a prediction.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorWarningType {
    WarningSequenceNotAvailable,
    WarningRefDoesNotMatchGenome,
    WarningTranscriptIncomplete,
    WarningTranscriptMultipleStopCodons,
    WarningTranscriptNoStartCodon,
    WarningTranscriptNoStopCodon,
    WarningDuplicateId,
    ErrorChromosomeNotFound,
    ErrorOutOfChromosomeRange,
    ErrorOutOfExon,
    ErrorMissingCdsSequence,
}

impl ErrorWarningType {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ErrorWarningType::ErrorChromosomeNotFound
                | ErrorWarningType::ErrorOutOfChromosomeRange
                | ErrorWarningType::ErrorOutOfExon
                | ErrorWarningType::ErrorMissingCdsSequence
        )
    }

    pub fn is_warning(&self) -> bool {
        !self.is_error()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorWarningType::WarningSequenceNotAvailable => "WARNING_SEQUENCE_NOT_AVAILABLE",
            ErrorWarningType::WarningRefDoesNotMatchGenome => "WARNING_REF_DOES_NOT_MATCH_GENOME",
            ErrorWarningType::WarningTranscriptIncomplete => "WARNING_TRANSCRIPT_INCOMPLETE",
            ErrorWarningType::WarningTranscriptMultipleStopCodons => {
                "WARNING_TRANSCRIPT_MULTIPLE_STOP_CODONS"
            }
            ErrorWarningType::WarningTranscriptNoStartCodon => "WARNING_TRANSCRIPT_NO_START_CODON",
            ErrorWarningType::WarningTranscriptNoStopCodon => "WARNING_TRANSCRIPT_NO_STOP_CODON",
            ErrorWarningType::WarningDuplicateId => "WARNING_DUPLICATE_ID",
            ErrorWarningType::ErrorChromosomeNotFound => "ERROR_CHROMOSOME_NOT_FOUND",
            ErrorWarningType::ErrorOutOfChromosomeRange => "ERROR_OUT_OF_CHROMOSOME_RANGE",
            ErrorWarningType::ErrorOutOfExon => "ERROR_OUT_OF_EXON",
            ErrorWarningType::ErrorMissingCdsSequence => "ERROR_MISSING_CDS_SEQUENCE",
        }
    }
}

impl Display for ErrorWarningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Error, Debug)]
pub enum EffectParseError {
    #[error("Unknown effect type: {0}")]
    UnknownEffectType(String),
}

///
/// Hard failures of index queries. Prediction itself records these
/// conditions as diagnostics instead.
///
#[derive(Error, Debug, PartialEq)]
pub enum PredictorError {
    #[error("Chromosome '{0}' not found in the genome")]
    ChromosomeNotFound(String),

    #[error("Region {region} is outside chromosome '{chr}' (length {length})")]
    OutOfChromosomeRange {
        region: String,
        chr: String,
        length: u32,
    },
}

#[derive(Error, Debug)]
pub enum GenomeError {
    #[error("Duplicate chromosome: {0}")]
    DuplicateChromosome(String),

    #[error("Unknown chromosome '{0}'")]
    UnknownChromosome(String),

    #[error("Duplicate {kind} identifier: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("Unknown {kind} identifier: {id}")]
    UnknownParent { kind: &'static str, id: String },

    #[error("Invalid range {start}-{end} for '{id}'")]
    InvalidRange { id: String, start: u32, end: u32 },

    #[error("'{child}' ({start}-{end}) is outside its parent '{parent}'")]
    OutsideParent {
        child: String,
        parent: String,
        start: u32,
        end: u32,
    },

    #[error("Exon sequence for '{id}' has {found} bases, expected {expected}")]
    SequenceLength {
        id: String,
        expected: u32,
        found: usize,
    },

    #[error("Exon sequence for '{id}' has invalid base '{base}'")]
    InvalidBase { id: String, base: char },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type GenomeResult<T> = std::result::Result<T, GenomeError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
