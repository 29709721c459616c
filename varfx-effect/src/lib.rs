//! Variant effect prediction in Rust.
//!
//! This crate maps sequence variants onto a genome's features (genes,
//! transcripts, exons, introns, UTRs, splice sites, regulatory and custom
//! markers) and classifies what each variant does to each feature it hits.
//!
//! ## Features
//!
//! - **Feature graph**: an arena of features with parent links, built once by
//!   a [`GenomeBuilder`] and read-only afterwards
//! - **Spatial index**: per-chromosome interval trees over the top-level features
//! - **Effects**: a severity-ordered taxonomy ([`EffectType`], [`EffectImpact`]),
//!   codon level changes on coding exons, diagnostics attached to each effect
//! - **Structural variants**: large deletions, duplications, inversions and
//!   translocations, including gene fusions
//! - **Loss of function**: LOF and NMD calls over a finished effect set
//!
//! ## Quick Start
//!
//! ```rust
//! use varfx_core::models::{Strand, Variant};
//! use varfx_effect::{EffectType, GeneSpec, GenomeBuilder, PredictorConfig, TranscriptSpec, VariantEffectPredictor};
//!
//! let config = PredictorConfig::default();
//!
//! let mut builder = GenomeBuilder::new("demo");
//! builder.add_chromosome("chr1", 50_000).unwrap();
//! builder.add_gene(GeneSpec::new("g1", "chr1", 10_000, 19_999, Strand::Plus)).unwrap();
//! builder
//!     .add_transcript(
//!         TranscriptSpec::new("t1", "g1")
//!             .with_exon(10_000, 10_999)
//!             .with_exon(19_000, 19_999)
//!             .with_cds(10_500, 19_499),
//!     )
//!     .unwrap();
//! let genome = builder.build(&config).unwrap();
//!
//! let predictor = VariantEffectPredictor::new(&genome, &config);
//! let mut effects = predictor.predict(&Variant::new("chr1", 15_000, "A", "G"));
//! effects.sort(&genome);
//!
//! let first = effects.get(0).unwrap();
//! assert_eq!(first.effect_type(), EffectType::Intron);
//! ```
//!
//! Effects are returned in the order they were found; [`VariantEffects::sort`]
//! puts the most severe first.

pub mod codon;
mod codon_change;
pub mod config;
pub mod effect_type;
pub mod errors;
pub mod feature_effect;
pub mod genome;
pub mod index;
pub mod lof;
pub mod predictor;
pub mod structural;
pub mod variant_effect;
pub mod variant_effects;

pub use self::config::PredictorConfig;
pub use self::effect_type::{EffectImpact, EffectType};
pub use self::errors::{ErrorWarningType, PredictorError};
pub use self::genome::{FeatureId, FeatureKind, FeatureLink, GeneSpec, Genome, GenomeBuilder, MarkerSpec, TranscriptSpec};
pub use self::lof::{GeneFraction, LofReport, LossOfFunction};
pub use self::predictor::VariantEffectPredictor;
pub use self::structural::{GeneFusionEffect, StructuralVariantEffect};
pub use self::variant_effect::{EffectDetail, FusionDetail, VariantEffect};
pub use self::variant_effects::VariantEffects;
