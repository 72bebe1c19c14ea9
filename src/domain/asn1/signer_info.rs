//! CMS `SignerInfo` structure with byte-range capture around the
//! `message-digest` attribute value.
//!
//! ```text
//! SignerInfo ::= SEQUENCE {
//!    version                   INTEGER  { v1(1) },
//!    issuerAndSerialNumber     IssuerAndSerialNumber,
//!    digestAlgorithm           AlgorithmIdentifier,
//!    signedAttributes          [0] IMPLICIT Attributes,
//!    signatureAlgorithm        AlgorithmIdentifier,
//!    signature                 OCTET STRING,
//!    unsignedAttributes        [1] IMPLICIT Attributes OPTIONAL
//! }
//! ```
//!
//! The signed attribute set is hashed in its SET form to obtain the
//! aggregation chain input, and the converted signature carries the SET
//! encoding split around the message-digest value. The wire uses the
//! implicit `[0]` tag, so the only byte that ever differs from the wire is
//! that tag, swapped for the universal SET tag; length bytes and all other
//! content are verbatim.

use crate::domain::asn1::reader::{
    decode_oid, decode_u64, read_algorithm_identifier, DerElement, ParseFailure, ParseResult,
};
use crate::domain::asn1::time_signature::TimeSignature;
use crate::domain::constants::{
    OID_ATTR_CONTENT_TYPE, OID_ATTR_MESSAGE_DIGEST, OID_CT_TST_INFO, OID_TIME_SIGNATURE_ALG,
    SIGNER_INFO_VERSION, TAG_CONTEXT_0, TAG_CONTEXT_1, TAG_INTEGER, TAG_OCTET_STRING, TAG_OID,
    TAG_SEQUENCE, TAG_SET,
};
use crate::infra::error::{ConvertError, ConvertResult};

/// Parsed `SignerInfo` plus the captured signed-attributes byte ranges.
#[derive(Debug, Clone)]
pub struct SignerInfo {
    version: u64,
    issuer_name: Vec<u8>,
    serial_number: Vec<u8>,
    digest_algorithm: String,
    message_digest: Vec<u8>,
    signed_attrs: Vec<u8>,
    signed_attrs_prefix: Vec<u8>,
    signed_attrs_suffix: Vec<u8>,
    signature_algorithm: String,
    signature: TimeSignature,
    unsigned_attrs: Option<Vec<u8>>,
}

impl SignerInfo {
    /// Parse a `SignerInfo` from its SEQUENCE element.
    pub fn parse_element(element: &DerElement<'_>) -> ConvertResult<Self> {
        Self::parse_inner(element).map_err(|e| e.into_format("signer info"))
    }

    fn parse_inner(element: &DerElement<'_>) -> ParseResult<Self> {
        if element.tag() != TAG_SEQUENCE {
            return Err(ParseFailure::Classified(ConvertError::Format(
                "signer info has invalid format".to_string(),
            )));
        }
        let mut fields = element.inner();

        // version: must be 1 since the signer is identified by
        // issuerAndSerialNumber
        let version = decode_u64(&fields.expect_element(TAG_INTEGER)?)?;
        if version != SIGNER_INFO_VERSION {
            return Err(ParseFailure::Classified(ConvertError::Format(format!(
                "invalid signer info version: {version}"
            ))));
        }

        let issuer_and_serial = fields.expect_element(TAG_SEQUENCE)?;
        let mut sid = issuer_and_serial.inner();
        let issuer_name = sid.read_element()?.raw().to_vec();
        let serial_number = sid.expect_element(TAG_INTEGER)?.content().to_vec();
        sid.finish()?;

        let digest_algorithm =
            read_algorithm_identifier(&fields.expect_element(TAG_SEQUENCE)?)?;
        check_digest_algorithm(&digest_algorithm)?;

        if fields.peek_tag() != Some(TAG_CONTEXT_0) {
            return Err(ParseFailure::Classified(ConvertError::Format(
                "no signed attributes".to_string(),
            )));
        }
        let attrs_element = fields.read_element()?;
        let captured = capture_signed_attributes(&attrs_element)?;

        let signature_algorithm =
            read_algorithm_identifier(&fields.expect_element(TAG_SEQUENCE)?)?;
        if signature_algorithm != OID_TIME_SIGNATURE_ALG {
            return Err(ParseFailure::Classified(ConvertError::Format(format!(
                "invalid signature algorithm: {signature_algorithm}"
            ))));
        }

        let signature_octets = fields.expect_element(TAG_OCTET_STRING)?;
        let signature = TimeSignature::parse(signature_octets.content())?;

        let mut unsigned_attrs = None;
        if fields.peek_tag() == Some(TAG_CONTEXT_1) {
            let element = fields.read_element()?;
            unsigned_attrs = Some(as_set_encoding(&element));
        }
        fields.finish()?;

        Ok(SignerInfo {
            version,
            issuer_name,
            serial_number,
            digest_algorithm,
            message_digest: captured.message_digest,
            signed_attrs: captured.full_set,
            signed_attrs_prefix: captured.prefix,
            signed_attrs_suffix: captured.suffix,
            signature_algorithm,
            signature,
            unsigned_attrs,
        })
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Raw DER of the issuer Name.
    #[must_use]
    pub fn issuer_name(&self) -> Vec<u8> {
        self.issuer_name.clone()
    }

    /// Certificate serial number as raw INTEGER content bytes.
    #[must_use]
    pub fn serial_number(&self) -> Vec<u8> {
        self.serial_number.clone()
    }

    /// OID of the digest algorithm hashing both the TSTInfo and the signed
    /// attribute set.
    #[must_use]
    pub fn digest_algorithm(&self) -> &str {
        &self.digest_algorithm
    }

    /// Value of the message-digest signed attribute.
    #[must_use]
    pub fn message_digest(&self) -> Vec<u8> {
        self.message_digest.clone()
    }

    /// DER of the signed attribute set in its SET form.
    #[must_use]
    pub fn encoded_signed_attrs(&self) -> Vec<u8> {
        self.signed_attrs.clone()
    }

    /// SET header through the message-digest OCTET STRING header, verbatim
    /// apart from the implicit-tag swap.
    #[must_use]
    pub fn signed_attrs_bytes_before_message_imprint(&self) -> Vec<u8> {
        self.signed_attrs_prefix.clone()
    }

    /// Every attribute after message-digest, verbatim (may be empty).
    #[must_use]
    pub fn signed_attrs_bytes_after_message_imprint(&self) -> Vec<u8> {
        self.signed_attrs_suffix.clone()
    }

    /// OID of the signature algorithm; always the vendor time-signature
    /// algorithm for convertible tokens.
    #[must_use]
    pub fn signature_algorithm(&self) -> &str {
        &self.signature_algorithm
    }

    #[must_use]
    pub fn signature(&self) -> &TimeSignature {
        &self.signature
    }

    /// DER of the unsigned attribute set in its SET form, if present.
    #[must_use]
    pub fn encoded_unsigned_attrs(&self) -> Option<Vec<u8>> {
        self.unsigned_attrs.clone()
    }

    #[must_use]
    pub fn is_extended(&self) -> bool {
        self.signature.is_extended()
    }
}

/// Supported digest algorithm OIDs, checked without going through the
/// registry so the rejection message matches the structure-level wording.
fn check_digest_algorithm(oid: &str) -> ParseResult<()> {
    let supported = crate::domain::hash::HashAlgorithm::ALL
        .iter()
        .any(|a| a.oid() == oid);
    if supported {
        Ok(())
    } else {
        Err(ParseFailure::Classified(ConvertError::Format(format!(
            "digest algorithm not supported: {oid}"
        ))))
    }
}

/// Re-tag an implicitly tagged attribute set as a universal SET, keeping
/// the wire length bytes and content.
fn as_set_encoding(element: &DerElement<'_>) -> Vec<u8> {
    let mut out = Vec::with_capacity(element.raw().len());
    out.push(TAG_SET);
    out.extend_from_slice(&element.header()[1..]);
    out.extend_from_slice(element.content());
    out
}

struct CapturedAttributes {
    full_set: Vec<u8>,
    prefix: Vec<u8>,
    suffix: Vec<u8>,
    message_digest: Vec<u8>,
}

struct Attribute<'a> {
    type_oid: String,
    header: &'a [u8],
    oid_raw: &'a [u8],
    values_header: &'a [u8],
    values: Vec<DerElement<'a>>,
    raw: &'a [u8],
}

fn capture_signed_attributes(attrs_element: &DerElement<'_>) -> ParseResult<CapturedAttributes> {
    let mut reader = attrs_element.inner();
    let mut attributes = Vec::new();
    while !reader.at_end() {
        let attribute = reader.expect_element(TAG_SEQUENCE)?;
        let mut parts = attribute.inner();
        let oid_element = parts.expect_element(TAG_OID)?;
        let values_element = parts.expect_element(TAG_SET)?;
        parts.finish()?;

        let mut value_reader = values_element.inner();
        let mut values = Vec::new();
        while !value_reader.at_end() {
            values.push(value_reader.read_element()?);
        }

        attributes.push(Attribute {
            type_oid: decode_oid(&oid_element)?,
            header: attribute.header(),
            oid_raw: oid_element.raw(),
            values_header: values_element.header(),
            values,
            raw: attribute.raw(),
        });
    }

    let content_type = attribute_value(&attributes, OID_ATTR_CONTENT_TYPE)?;
    if content_type.tag() != TAG_OID || decode_oid(content_type)? != OID_CT_TST_INFO {
        return Err(ParseFailure::Classified(ConvertError::Format(
            "invalid content-type signed attribute value".to_string(),
        )));
    }
    let message_digest = attribute_value(&attributes, OID_ATTR_MESSAGE_DIGEST)?;
    if message_digest.tag() != TAG_OCTET_STRING {
        return Err(ParseFailure::Classified(ConvertError::Format(
            "invalid message-digest signed attribute".to_string(),
        )));
    }

    // The captured ranges require content-type first, message-digest second.
    if attributes.len() < 2 || attributes[0].type_oid != OID_ATTR_CONTENT_TYPE {
        return Err(ParseFailure::Classified(ConvertError::Format(
            "invalid content-type signed attribute value".to_string(),
        )));
    }
    if attributes[1].type_oid != OID_ATTR_MESSAGE_DIGEST {
        return Err(ParseFailure::Classified(ConvertError::Format(
            "invalid message-digest signed attribute".to_string(),
        )));
    }

    let set_header = {
        let mut h = Vec::with_capacity(attrs_element.header().len());
        h.push(TAG_SET);
        h.extend_from_slice(&attrs_element.header()[1..]);
        h
    };

    let digest_attribute = &attributes[1];
    let mut prefix = Vec::new();
    prefix.extend_from_slice(&set_header);
    prefix.extend_from_slice(attributes[0].raw);
    prefix.extend_from_slice(digest_attribute.header);
    prefix.extend_from_slice(digest_attribute.oid_raw);
    prefix.extend_from_slice(digest_attribute.values_header);
    prefix.extend_from_slice(digest_attribute.values[0].header());

    let mut suffix = Vec::new();
    for attribute in &attributes[2..] {
        suffix.extend_from_slice(attribute.raw);
    }

    let full_set = as_set_encoding(attrs_element);

    Ok(CapturedAttributes {
        full_set,
        prefix,
        suffix,
        message_digest: message_digest.content().to_vec(),
    })
}

/// The single value of the attribute with the given type, enforcing the
/// attribute-set multiplicity rules.
fn attribute_value<'a, 'b>(
    attributes: &'b [Attribute<'a>],
    oid: &str,
) -> ParseResult<&'b DerElement<'a>> {
    let mut found = None;
    let mut count = 0usize;
    for attribute in attributes.iter().filter(|a| a.type_oid == oid) {
        if attribute.values.is_empty() {
            return Err(ParseFailure::Classified(ConvertError::Format(format!(
                "empty attribute {oid}"
            ))));
        }
        if attribute.values.len() > 1 {
            return Err(ParseFailure::Classified(ConvertError::Format(format!(
                "multi-valued attribute {oid}"
            ))));
        }
        found = Some(&attribute.values[0]);
        count += 1;
    }
    let Some(value) = found else {
        return Err(ParseFailure::Classified(ConvertError::Format(format!(
            "no attribute {oid}"
        ))));
    };
    if count > 1 {
        return Err(ParseFailure::Classified(ConvertError::Format(format!(
            "multiple instances of attribute {oid}"
        ))));
    }
    Ok(value)
}
