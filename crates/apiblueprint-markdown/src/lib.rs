//! # apiblueprint-markdown
//!
//! Turns Markdown text into the block tree the API Blueprint section parser
//! walks. Parsing itself is delegated to [pulldown-cmark]; this crate only
//! shapes its offset events into [`Node`]s.
//!
//! [pulldown-cmark]: https://docs.rs/pulldown-cmark
//!
//! ## Tree shape
//!
//! ```text
//! # GET /message          Root
//! + Response 200          ├── Header "GET /message"
//!                         └── ListItem
//!         Hello               ├── Paragraph "Response 200"
//!                             └── Code "Hello\n"
//! ```
//!
//! - List containers are dropped; items become siblings of the surrounding
//!   blocks and nested items become children of their parent item.
//! - Inline content directly inside a tight list item is wrapped in a
//!   paragraph, so an item's signature is always its first paragraph.
//! - Paragraph and header text is the raw source (inline markup kept), code
//!   text has common indentation removed.
//!
//! ## Source ranges
//!
//! Every node carries [`SourceRanges`] into the original text. Paragraph
//! ranges skip continuation indentation, code ranges cover only the code
//! bytes of each line, so ranges are frequently discontinuous. Block ranges
//! run to the end of their last line so that text rebuilt from ranges keeps
//! its line breaks. [`CharacterIndex`] converts byte offsets for display.
//!
//! ```
//! use apiblueprint_markdown::{tokenize, NodeKind};
//!
//! let root = tokenize("# GET /message\n");
//! assert_eq!(root.children[0].kind, NodeKind::Header);
//! assert_eq!(root.children[0].text, "GET /message");
//! ```

pub mod index;
pub mod node;
pub mod range;
pub mod tokenizer;

pub use index::{CharacterIndex, LineColumn};
pub use node::{Node, NodeKind, first_line};
pub use range::{ByteRange, SourceRanges};
pub use tokenizer::tokenize;
