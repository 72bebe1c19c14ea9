//! CMS `ContentInfo`, the outermost structure of a legacy token.
//!
//! ```text
//! ContentInfo ::= SEQUENCE {
//!    contentType     OBJECT IDENTIFIER,
//!    content [0]     EXPLICIT ANY DEFINED BY contentType
//! }
//! ```

use crate::domain::asn1::reader::{decode_oid, DerReader, ParseFailure, ParseResult};
use crate::domain::asn1::signed_data::SignedData;
use crate::domain::constants::{OID_SIGNED_DATA, TAG_CONTEXT_0, TAG_OID, TAG_SEQUENCE};
use crate::infra::error::{ConvertError, ConvertResult};

/// Parsed `ContentInfo` carrying a `SignedData`.
#[derive(Debug, Clone)]
pub struct ContentInfo {
    content_type: String,
    content: SignedData,
}

impl ContentInfo {
    /// Parse a DER-encoded `ContentInfo`. Bytes after the top-level
    /// element are ignored, matching stream-oriented readers.
    pub fn parse(bytes: &[u8]) -> ConvertResult<Self> {
        Self::parse_inner(bytes).map_err(|e| e.into_format("content info"))
    }

    fn parse_inner(bytes: &[u8]) -> ParseResult<Self> {
        let mut outer = DerReader::new(bytes);
        let sequence = outer.expect_element(TAG_SEQUENCE)?;
        let mut fields = sequence.inner();

        let content_type = decode_oid(&fields.expect_element(TAG_OID)?)?;
        if content_type != OID_SIGNED_DATA {
            return Err(ParseFailure::Classified(ConvertError::Format(format!(
                "invalid content type: {content_type}"
            ))));
        }

        let wrapper = fields.expect_element(TAG_CONTEXT_0)?;
        fields.finish()?;
        let mut content_reader = wrapper.inner();
        let signed_data_element = content_reader.expect_element(TAG_SEQUENCE)?;
        content_reader.finish()?;
        let content = SignedData::parse_element(&signed_data_element)?;

        Ok(ContentInfo {
            content_type,
            content,
        })
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub fn content(&self) -> &SignedData {
        &self.content
    }

    /// An extended token is traceable to a control publication without the
    /// temporary PKI signature.
    #[must_use]
    pub fn is_extended(&self) -> bool {
        self.content.is_extended()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asn1::testutil::{context, oid, sequence};

    #[test]
    fn rejects_plain_text() {
        let err = ContentInfo::parse(b"just some text, certainly not DER").unwrap_err();
        assert_eq!(err.to_string(), "content info has invalid format");
    }

    #[test]
    fn rejects_empty_input() {
        let err = ContentInfo::parse(&[]).unwrap_err();
        assert_eq!(err.to_string(), "content info has invalid format");
    }

    #[test]
    fn rejects_wrong_content_type() {
        let der = sequence(&[oid("1.2.840.113549.1.7.1"), context(0xA0, &sequence(&[]))]);
        let err = ContentInfo::parse(&der).unwrap_err();
        assert_eq!(err.to_string(), "invalid content type: 1.2.840.113549.1.7.1");
    }

    #[test]
    fn nested_structure_errors_pass_through() {
        // valid outer shell, SignedData with a bad version
        let bad_signed_data = sequence(&[crate::domain::asn1::testutil::integer(2)]);
        let der = sequence(&[
            oid("1.2.840.113549.1.7.2"),
            context(0xA0, &bad_signed_data),
        ]);
        let err = ContentInfo::parse(&der).unwrap_err();
        assert_eq!(err.to_string(), "invalid signed data version: 2");
    }
}
