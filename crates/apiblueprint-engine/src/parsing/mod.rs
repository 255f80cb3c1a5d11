//! Generic section parsing: signature grammar, classification and the
//! recursive-descent driver every entity processor plugs into.

pub mod classify;
pub mod driver;
pub mod section_type;
pub mod signature;

pub use classify::{Context, classify};
pub use driver::{ParserData, SectionLayout, SectionProcessor, Signature, parse_section};
pub use section_type::SectionType;
