//! Errors raised while turning OSM XML into element events.

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// Malformed input encountered by [`ElementStream`](super::ElementStream).
#[derive(Debug, Error)]
pub enum ElementStreamError {
    /// The document is not well-formed XML.
    #[error("malformed XML near byte {position}")]
    Xml {
        /// Byte offset where reading the offending event started.
        position: usize,
        /// Parser error.
        #[source]
        source: quick_xml::Error,
    },
    /// An attribute could not be tokenised.
    #[error("malformed attribute on <{element}> near byte {position}")]
    Attribute {
        /// Element carrying the attribute.
        element: &'static str,
        /// Byte offset of the element.
        position: usize,
        /// Attribute tokenizer error.
        #[source]
        source: AttrError,
    },
    /// A mandatory attribute was absent.
    #[error("<{element}> near byte {position} is missing the `{attribute}` attribute")]
    MissingAttribute {
        /// Element lacking the attribute.
        element: &'static str,
        /// Name of the missing attribute.
        attribute: &'static str,
        /// Byte offset of the element.
        position: usize,
    },
    /// A coordinate was unparsable or not finite.
    #[error("<{element}> near byte {position} has invalid {attribute} {value:?}")]
    InvalidCoordinate {
        /// Element carrying the coordinate.
        element: &'static str,
        /// `lat` or `lon`.
        attribute: &'static str,
        /// Raw attribute text.
        value: String,
        /// Byte offset of the element.
        position: usize,
    },
}

impl ElementStreamError {
    /// Byte offset near which the problem was detected.
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::Xml { position, .. }
            | Self::Attribute { position, .. }
            | Self::MissingAttribute { position, .. }
            | Self::InvalidCoordinate { position, .. } => *position,
        }
    }
}
