//! In-memory TLV tree.
//!
//! The converted signature is a tree of tag-length-value elements. An
//! element carries either raw content bytes or an ordered list of child
//! elements, plus two header flags (non-critical, forward). The byte
//! serialisation of the tree is a host SDK concern (see
//! `services::extend::SignatureEncoder`); this module ends at the
//! in-memory representation.

use crate::domain::hash::Imprint;
use crate::infra::error::{ConvertError, ConvertResult};

/// A single TLV element: numeric type, header flags and either raw content
/// or nested children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvElement {
    element_type: u16,
    non_critical: bool,
    forward: bool,
    content: Vec<u8>,
    children: Vec<TlvElement>,
}

impl TlvElement {
    /// Create an empty element with both header flags clear.
    #[must_use]
    pub fn new(element_type: u16) -> Self {
        TlvElement {
            element_type,
            non_critical: false,
            forward: false,
            content: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element holding an unsigned integer, encoded as the
    /// shortest big-endian byte string (zero encodes as empty content).
    #[must_use]
    pub fn from_u64(element_type: u16, value: u64) -> Self {
        let mut element = TlvElement::new(element_type);
        let bytes = value.to_be_bytes();
        let skip = bytes.iter().take_while(|&&b| b == 0).count();
        element.content = bytes[skip..].to_vec();
        element
    }

    /// Create an element holding an imprint in wire form.
    #[must_use]
    pub fn from_imprint(element_type: u16, imprint: &Imprint) -> Self {
        let mut element = TlvElement::new(element_type);
        element.content = imprint.to_bytes();
        element
    }

    /// Create an element holding raw bytes.
    #[must_use]
    pub fn from_bytes(element_type: u16, bytes: &[u8]) -> Self {
        let mut element = TlvElement::new(element_type);
        element.content = bytes.to_vec();
        element
    }

    /// Replace the raw content. Discards any children.
    pub fn set_content(&mut self, bytes: &[u8]) {
        self.children.clear();
        self.content = bytes.to_vec();
    }

    /// Append a child element. Discards any raw content.
    pub fn add_child(&mut self, child: TlvElement) {
        self.content.clear();
        self.children.push(child);
    }

    #[must_use]
    pub fn element_type(&self) -> u16 {
        self.element_type
    }

    /// Non-critical header flag.
    #[must_use]
    pub fn non_critical(&self) -> bool {
        self.non_critical
    }

    /// Forward header flag.
    #[must_use]
    pub fn forward(&self) -> bool {
        self.forward
    }

    /// Raw content bytes; empty for an element with children.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    #[must_use]
    pub fn children(&self) -> &[TlvElement] {
        &self.children
    }

    /// All direct children of the given type, in document order.
    pub fn children_of_type(&self, element_type: u16) -> impl Iterator<Item = &TlvElement> {
        self.children
            .iter()
            .filter(move |c| c.element_type == element_type)
    }

    /// First direct child of the given type, if any.
    #[must_use]
    pub fn first_child_of_type(&self, element_type: u16) -> Option<&TlvElement> {
        self.children_of_type(element_type).next()
    }

    /// Decode the content as an unsigned big-endian integer.
    pub fn as_u64(&self) -> ConvertResult<u64> {
        if self.content.len() > 8 {
            return Err(ConvertError::Format(format!(
                "TLV element 0x{:x} integer content too long: {} bytes",
                self.element_type,
                self.content.len()
            )));
        }
        let mut value = 0u64;
        for &b in &self.content {
            value = (value << 8) | u64::from(b);
        }
        Ok(value)
    }

    /// Decode the content as a data imprint.
    pub fn as_imprint(&self) -> ConvertResult<Imprint> {
        Imprint::from_bytes(&self.content)
    }
}
