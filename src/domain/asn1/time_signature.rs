//! Vendor `TimeSignature` structure carried in the SignerInfo signature
//! field, together with its `PublishedData` and optional PKI signature.
//!
//! ```text
//! TimeSignature ::= SEQUENCE {
//!    location        OCTET STRING,
//!    history         OCTET STRING,
//!    publishedData   PublishedData,
//!    pkSignature     [0] IMPLICIT SignatureInfo OPTIONAL,
//!    pubReferences   [1] IMPLICIT SET OF OCTET STRING OPTIONAL
//! }
//! PublishedData ::= SEQUENCE {
//!    publicationIdentifier   INTEGER,
//!    publicationImprint      OCTET STRING
//! }
//! ```

use crate::domain::asn1::reader::{
    decode_u64, read_algorithm_identifier, DerElement, DerError, DerReader, ParseFailure,
    ParseResult,
};
use crate::domain::constants::{
    TAG_CONTEXT_0, TAG_CONTEXT_1, TAG_INTEGER, TAG_OCTET_STRING, TAG_SEQUENCE,
};
use crate::domain::hash::Imprint;
use crate::infra::error::ConvertResult;

/// Parsed vendor time signature.
#[derive(Debug, Clone)]
pub struct TimeSignature {
    location: Vec<u8>,
    history: Vec<u8>,
    published_data: PublishedData,
    pk_signature: Option<SignatureInfo>,
    pub_references: Option<Vec<Vec<u8>>>,
}

impl TimeSignature {
    /// Parse a `TimeSignature` from DER bytes.
    pub fn parse(bytes: &[u8]) -> ConvertResult<Self> {
        Self::parse_inner(bytes).map_err(|e| e.into_format("time signature"))
    }

    fn parse_inner(bytes: &[u8]) -> ParseResult<Self> {
        let mut outer = DerReader::new(bytes);
        let sequence = outer.expect_element(TAG_SEQUENCE)?;
        let mut fields = sequence.inner();

        let location = fields.expect_element(TAG_OCTET_STRING)?.content().to_vec();
        let history = fields.expect_element(TAG_OCTET_STRING)?.content().to_vec();
        let published_data = PublishedData::parse_element(&fields.expect_element(TAG_SEQUENCE)?)?;

        let mut pk_signature = None;
        let mut pub_references = None;
        while !fields.at_end() {
            let element = fields.read_element()?;
            match element.tag() {
                TAG_CONTEXT_0 if pk_signature.is_none() => {
                    pk_signature = Some(SignatureInfo::parse_implicit(&element)?);
                }
                TAG_CONTEXT_1 if pub_references.is_none() => {
                    pub_references = Some(parse_references(&element)?);
                }
                tag => {
                    return Err(ParseFailure::Syntax(DerError(format!(
                        "unexpected tag 0x{tag:02x} in time signature"
                    ))));
                }
            }
        }

        Ok(TimeSignature {
            location,
            history,
            published_data,
            pk_signature,
            pub_references,
        })
    }

    /// Aggregation chain blob: the path from the signed document up to the
    /// calendar leaf for the registration second.
    #[must_use]
    pub fn location(&self) -> Vec<u8> {
        self.location.clone()
    }

    /// Calendar chain blob: the path from the registration leaf up to the
    /// publication root.
    #[must_use]
    pub fn history(&self) -> Vec<u8> {
        self.history.clone()
    }

    #[must_use]
    pub fn published_data(&self) -> &PublishedData {
        &self.published_data
    }

    #[must_use]
    pub fn pk_signature(&self) -> Option<&SignatureInfo> {
        self.pk_signature.as_ref()
    }

    #[must_use]
    pub fn pub_references(&self) -> Option<&[Vec<u8>]> {
        self.pub_references.as_deref()
    }

    /// An extended signature carries no temporary PKI signature.
    #[must_use]
    pub fn is_extended(&self) -> bool {
        self.pk_signature.is_none()
    }
}

/// Control publication data: publication time plus the calendar root imprint.
#[derive(Debug, Clone)]
pub struct PublishedData {
    publication_id: u64,
    publication_imprint: Imprint,
}

impl PublishedData {
    fn parse_element(element: &DerElement<'_>) -> ParseResult<Self> {
        Self::parse_fields(element)
            .map_err(|e| ParseFailure::Classified(e.into_format("published data")))
    }

    fn parse_fields(element: &DerElement<'_>) -> ParseResult<Self> {
        let mut fields = element.inner();
        let publication_id = decode_u64(&fields.expect_element(TAG_INTEGER)?)?;
        let imprint_bytes = fields.expect_element(TAG_OCTET_STRING)?.content();
        fields.finish()?;
        let publication_imprint = Imprint::from_bytes(imprint_bytes)?;
        Ok(PublishedData {
            publication_id,
            publication_imprint,
        })
    }

    /// Publication time as seconds since the epoch.
    #[must_use]
    pub fn publication_id(&self) -> u64 {
        self.publication_id
    }

    #[must_use]
    pub fn publication_imprint(&self) -> &Imprint {
        &self.publication_imprint
    }
}

/// Temporary PKI signature protecting the published data of an unextended
/// token.
///
/// ```text
/// SignatureInfo ::= SEQUENCE {
///   signatureAlgorithm   AlgorithmIdentifier,
///   signatureValue       OCTET STRING,
///   pkiReferences        [0] IMPLICIT SET OF OCTET STRING OPTIONAL
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SignatureInfo {
    signature_algorithm: String,
    signature_value: Vec<u8>,
    pki_references: Option<Vec<Vec<u8>>>,
}

impl SignatureInfo {
    /// Parse from an implicitly tagged element whose content is the
    /// SEQUENCE body.
    fn parse_implicit(element: &DerElement<'_>) -> ParseResult<Self> {
        Self::parse_fields(element)
            .map_err(|e| ParseFailure::Classified(e.into_format("signature info")))
    }

    fn parse_fields(element: &DerElement<'_>) -> ParseResult<Self> {
        let mut fields = element.inner();
        let signature_algorithm =
            read_algorithm_identifier(&fields.expect_element(TAG_SEQUENCE)?)?;
        let signature_value = fields.expect_element(TAG_OCTET_STRING)?.content().to_vec();
        let mut pki_references = None;
        if !fields.at_end() {
            let refs = fields.expect_element(TAG_CONTEXT_0)?;
            pki_references = Some(parse_references(&refs)?);
        }
        fields.finish()?;
        Ok(SignatureInfo {
            signature_algorithm,
            signature_value,
            pki_references,
        })
    }

    #[must_use]
    pub fn signature_algorithm(&self) -> &str {
        &self.signature_algorithm
    }

    #[must_use]
    pub fn signature_value(&self) -> Vec<u8> {
        self.signature_value.clone()
    }

    #[must_use]
    pub fn pki_references(&self) -> Option<&[Vec<u8>]> {
        self.pki_references.as_deref()
    }
}

/// Bibliographic reference list: an implicitly tagged SET OF OCTET STRING.
fn parse_references(element: &DerElement<'_>) -> ParseResult<Vec<Vec<u8>>> {
    let mut inner = element.inner();
    let mut references = Vec::new();
    while !inner.at_end() {
        references.push(inner.expect_element(TAG_OCTET_STRING)?.content().to_vec());
    }
    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asn1::testutil::{
        context, integer, octet_string, sequence, set,
    };
    use crate::domain::hash::HashAlgorithm;

    fn published_data(publication_id: u64, imprint: &Imprint) -> Vec<u8> {
        sequence(&[integer(publication_id), octet_string(&imprint.to_bytes())])
    }

    #[test]
    fn parses_minimal_time_signature() {
        let imprint = HashAlgorithm::Sha256.hash(&[b"root"]);
        let der = sequence(&[
            octet_string(&[0x01, 0x02]),
            octet_string(&[0x03]),
            published_data(1_395_317_319, &imprint),
        ]);

        let parsed = TimeSignature::parse(&der).unwrap();
        assert_eq!(parsed.location(), vec![0x01, 0x02]);
        assert_eq!(parsed.history(), vec![0x03]);
        assert_eq!(parsed.published_data().publication_id(), 1_395_317_319);
        assert_eq!(parsed.published_data().publication_imprint(), &imprint);
        assert!(parsed.is_extended());
        assert!(parsed.pub_references().is_none());
    }

    #[test]
    fn pk_signature_marks_token_unextended() {
        let imprint = HashAlgorithm::Sha256.hash(&[b"root"]);
        let signature_info = vec![
            sequence(&[vec![0x06, 0x03, 0x2a, 0x03, 0x04]]),
            octet_string(&[0xAA; 4]),
        ]
        .concat();
        let der = sequence(&[
            octet_string(&[]),
            octet_string(&[]),
            published_data(7, &imprint),
            context(0xA0, &signature_info),
        ]);

        let parsed = TimeSignature::parse(&der).unwrap();
        assert!(!parsed.is_extended());
        let pk = parsed.pk_signature().unwrap();
        assert_eq!(pk.signature_algorithm(), "1.2.3.4");
        assert_eq!(pk.signature_value(), vec![0xAA; 4]);
        assert!(pk.pki_references().is_none());
    }

    #[test]
    fn parses_publication_references() {
        let imprint = HashAlgorithm::Sha256.hash(&[b"root"]);
        let refs = set(&[octet_string(b"ref one"), octet_string(b"ref two")]);
        // implicit [1] replaces the SET header, so pass the set content only
        let mut refs_reader = DerReader::new(&refs);
        let refs_content = refs_reader.read_element().unwrap().content().to_vec();
        let der = sequence(&[
            octet_string(&[]),
            octet_string(&[]),
            published_data(7, &imprint),
            context(0xA1, &refs_content),
        ]);

        let parsed = TimeSignature::parse(&der).unwrap();
        let references = parsed.pub_references().unwrap();
        assert_eq!(references.len(), 2);
        assert_eq!(references[0], b"ref one");
    }

    #[test]
    fn rejects_publication_id_wider_than_64_bits() {
        let imprint = HashAlgorithm::Sha256.hash(&[b"root"]);
        let mut wide = vec![0x01];
        wide.extend_from_slice(&[0x00; 8]);
        let bad_published = sequence(&[
            {
                let mut e = vec![0x02, wide.len() as u8];
                e.extend_from_slice(&wide);
                e
            },
            octet_string(&imprint.to_bytes()),
        ]);
        let der = sequence(&[octet_string(&[]), octet_string(&[]), bad_published]);

        let err = TimeSignature::parse(&der).unwrap_err();
        assert_eq!(err.to_string(), "published data has invalid format");
    }

    #[test]
    fn rejects_malformed_publication_imprint() {
        let bad_published = sequence(&[integer(7), octet_string(&[0x01, 0x02])]);
        let der = sequence(&[octet_string(&[]), octet_string(&[]), bad_published]);
        assert!(TimeSignature::parse(&der).is_err());
    }

    #[test]
    fn rejects_non_sequence_input() {
        let err = TimeSignature::parse(&[0x04, 0x00]).unwrap_err();
        assert_eq!(err.to_string(), "time signature has invalid format");
    }
}
