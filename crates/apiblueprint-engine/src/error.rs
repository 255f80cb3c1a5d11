use apiblueprint_markdown::NodeKind;
use thiserror::Error;

use crate::parsing::SectionType;

/// Failures of the parsing machinery itself.
///
/// These never come from document content the parser can recover from; they
/// are reported as an application error with the offending location.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("section cursor {at} is past the end of {len} sibling nodes")]
    CursorOutOfBounds { at: usize, len: usize },

    #[error("{section} section must start at a list item, found {found:?}")]
    ExpectedListItem { section: SectionType, found: NodeKind },

    #[error("{section} section must start at the document root, found {found:?}")]
    ExpectedRoot { section: SectionType, found: NodeKind },
}

/// Resource model symbol table failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    #[error("symbol '{0}' already defined")]
    AlreadyDefined(String),

    #[error("undefined resource model '{0}'")]
    Undefined(String),

    #[error(
        "resource model can be specified only for a named resource, name your resource, e.g. '# <resource name> [{0}]'"
    )]
    AnonymousModel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let err = EngineError::ExpectedListItem {
            section: SectionType::Parameters,
            found: NodeKind::Paragraph,
        };
        assert_eq!(
            err.to_string(),
            "parameters section must start at a list item, found Paragraph"
        );
        assert_eq!(
            SymbolError::AnonymousModel("/notes".to_string()).to_string(),
            "resource model can be specified only for a named resource, name your resource, e.g. '# <resource name> [/notes]'"
        );
    }
}
