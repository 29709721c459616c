//! Core models shared by the varfx crates.
//!
//! - [`models::Region`]: a 0-based genomic range with an inclusive end
//! - [`models::Strand`]: feature orientation
//! - [`models::Variant`]: an immutable sequence change (SNP, indel,
//!   structural variant or translocation)
//!
//! # Example
//!
//! ```
//! use varfx_core::models::{Variant, VariantType};
//!
//! let variant = Variant::from_alleles("chr1", 99, "TACG", "T").unwrap();
//! assert_eq!(variant.variant_type, VariantType::Del);
//! assert_eq!(variant.start(), 100);
//! ```

pub mod errors;
pub mod models;
