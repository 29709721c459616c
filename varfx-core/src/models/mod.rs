pub mod region;
pub mod strand;
pub mod variant;

// re-export for cleaner imports
pub use self::region::Region;
pub use self::strand::Strand;
pub use self::variant::{Breakend, Variant, VariantType};
