//! Element walker for the DER subset the legacy token format uses.
//!
//! Routine decoding goes through the `der` crate: headers (tag and length)
//! are decoded with [`der::Header`], object identifiers with
//! [`der::asn1::ObjectIdentifier`] and integers with the crate's `u64`
//! decoder. What the library cannot provide is the byte-range capture the
//! converted signature depends on, so every element keeps verbatim
//! references to its header and content bytes as they appear on the wire —
//! the typed parsers slice those references, they never re-encode a header.

use crate::infra::error::ConvertError;
use der::asn1::ObjectIdentifier;
use der::{Decode, Encode, Header, SliceReader};
use thiserror::Error;

/// Low-level DER syntax failure. The typed structure parsers convert these
/// into `ConvertError::Format` with a `"<structure> has invalid format"`
/// message; only semantic checks produce specific messages.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DerError(pub(crate) String);

fn syntax(message: impl Into<String>) -> DerError {
    DerError(message.into())
}

/// Failure inside a structure parser: either a bare syntax error from the
/// reader, or an error that has already been classified.
#[derive(Debug)]
pub enum ParseFailure {
    Syntax(DerError),
    Classified(ConvertError),
}

impl From<DerError> for ParseFailure {
    fn from(error: DerError) -> Self {
        ParseFailure::Syntax(error)
    }
}

impl From<ConvertError> for ParseFailure {
    fn from(error: ConvertError) -> Self {
        ParseFailure::Classified(error)
    }
}

impl ParseFailure {
    /// Collapse into the conversion error space, labelling bare syntax
    /// errors with the structure being parsed.
    pub fn into_format(self, structure: &str) -> ConvertError {
        match self {
            ParseFailure::Syntax(_) => {
                ConvertError::Format(format!("{structure} has invalid format"))
            }
            ParseFailure::Classified(error) => error,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseFailure>;

/// One decoded element: tag octet, verbatim header bytes and content bytes.
#[derive(Debug, Clone, Copy)]
pub struct DerElement<'a> {
    tag: u8,
    raw: &'a [u8],
    header_len: usize,
}

impl<'a> DerElement<'a> {
    #[must_use]
    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// Header and content, exactly as they appear on the wire.
    #[must_use]
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Tag byte plus length bytes, exactly as they appear on the wire.
    #[must_use]
    pub fn header(&self) -> &'a [u8] {
        &self.raw[..self.header_len]
    }

    #[must_use]
    pub fn content(&self) -> &'a [u8] {
        &self.raw[self.header_len..]
    }

    /// Reader over the content, for constructed elements.
    #[must_use]
    pub fn inner(&self) -> DerReader<'a> {
        DerReader::new(self.content())
    }
}

/// Sequential reader over DER elements in a byte slice.
#[derive(Debug, Clone, Copy)]
pub struct DerReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        DerReader { data, pos: 0 }
    }

    #[must_use]
    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Tag octet of the next element without consuming it.
    #[must_use]
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Read the next element. The header is decoded with the `der` crate
    /// (strict DER, minimal length forms); the element then carries the
    /// original header and content slices.
    pub fn read_element(&mut self) -> Result<DerElement<'a>, DerError> {
        let remaining = &self.data[self.pos.min(self.data.len())..];
        if remaining.is_empty() {
            return Err(syntax("unexpected end of DER data"));
        }
        let mut reader = SliceReader::new(remaining)
            .map_err(|e| syntax(format!("invalid DER input: {e}")))?;
        let header = Header::decode(&mut reader)
            .map_err(|e| syntax(format!("invalid DER header: {e}")))?;

        // Strict decoding guarantees minimal length forms, so re-measuring
        // the header gives exactly the bytes consumed from the wire.
        let header_len = header
            .encoded_len()
            .map(u32::from)
            .map_err(|e| syntax(format!("invalid DER header: {e}")))? as usize;
        let content_len = u32::from(header.length) as usize;

        let end = self
            .pos
            .checked_add(header_len + content_len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| syntax("DER element length exceeds available data"))?;
        let element = DerElement {
            tag: header.tag.octet(),
            raw: &self.data[self.pos..end],
            header_len,
        };
        self.pos = end;
        Ok(element)
    }

    /// Read the next element and require a specific tag octet.
    pub fn expect_element(&mut self, tag: u8) -> Result<DerElement<'a>, DerError> {
        let element = self.read_element()?;
        if element.tag != tag {
            return Err(syntax(format!(
                "expected tag 0x{tag:02x}, found 0x{:02x}",
                element.tag
            )));
        }
        Ok(element)
    }

    /// Require that every byte has been consumed.
    pub fn finish(&self) -> Result<(), DerError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(syntax("trailing bytes after DER structure"))
        }
    }
}

/// Decode an OBJECT IDENTIFIER element into dotted form.
pub fn decode_oid(element: &DerElement<'_>) -> Result<String, DerError> {
    let oid = ObjectIdentifier::from_der(element.raw())
        .map_err(|e| syntax(format!("invalid object identifier: {e}")))?;
    Ok(oid.to_string())
}

/// Decode an INTEGER element as a non-negative value fitting 64 bits.
/// Implicitly tagged integers are accepted by restoring the universal tag
/// before handing the bytes to the decoder.
pub fn decode_u64(element: &DerElement<'_>) -> Result<u64, DerError> {
    let mut integer = element.raw().to_vec();
    integer[0] = 0x02;
    u64::from_der(&integer).map_err(|e| syntax(format!("invalid integer: {e}")))
}

/// Read an AlgorithmIdentifier and return the algorithm OID in dotted form.
/// Parameters, if present, are not interpreted.
pub fn read_algorithm_identifier(element: &DerElement<'_>) -> Result<String, DerError> {
    let mut inner = element.inner();
    let oid = inner.expect_element(crate::domain::constants::TAG_OID)?;
    decode_oid(&oid)
}
