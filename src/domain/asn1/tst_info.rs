//! RFC 3161 `TSTInfo` structure with byte-range capture around the
//! `hashedMessage` octet string.
//!
//! ```text
//! TSTInfo ::= SEQUENCE {
//!    version        INTEGER  { v1(1) },
//!    policy         TSAPolicyId,
//!    messageImprint MessageImprint,
//!    serialNumber   INTEGER,
//!    genTime        GeneralizedTime,
//!    accuracy       Accuracy OPTIONAL,
//!    ordering       BOOLEAN DEFAULT FALSE,
//!    nonce          INTEGER OPTIONAL,
//!    tsa            [0] GeneralName OPTIONAL,
//!    extensions     [1] IMPLICIT Extensions OPTIONAL
//! }
//! MessageImprint ::= SEQUENCE {
//!    hashAlgorithm AlgorithmIdentifier,
//!    hashedMessage OCTET STRING
//! }
//! ```
//!
//! Verification of a converted signature recomputes the TSTInfo digest from
//! `prefix ‖ hashedMessage ‖ suffix`, so the captured ranges are verbatim
//! slices of the wire encoding, never re-encoded.

use crate::domain::asn1::reader::{
    decode_oid, decode_u64, read_algorithm_identifier, DerElement, DerError, DerReader,
    ParseFailure, ParseResult,
};
use crate::domain::constants::{
    TAG_BOOLEAN, TAG_CONTEXT_0, TAG_CONTEXT_0_PRIMITIVE, TAG_CONTEXT_1, TAG_CONTEXT_1_PRIMITIVE,
    TAG_GENERALIZED_TIME, TAG_INTEGER, TAG_OCTET_STRING, TAG_OID, TAG_SEQUENCE,
    TST_INFO_VERSION,
};
use crate::infra::error::{ConvertError, ConvertResult};

/// Parsed `TSTInfo` plus the two captured byte ranges bracketing
/// `messageImprint.hashedMessage`.
#[derive(Debug, Clone)]
pub struct TstInfo {
    version: u64,
    policy: String,
    message_imprint: MessageImprint,
    serial_number: Vec<u8>,
    gen_time: String,
    accuracy: Option<Accuracy>,
    ordering: bool,
    nonce: Option<Vec<u8>>,
    tsa: Option<Vec<u8>>,
    extensions: Option<Vec<u8>>,
    bytes_before_hashed_message: Vec<u8>,
    bytes_after_hashed_message: Vec<u8>,
}

impl TstInfo {
    /// Parse a DER-encoded `TSTInfo`.
    pub fn parse(bytes: &[u8]) -> ConvertResult<Self> {
        Self::parse_inner(bytes).map_err(|e| e.into_format("TST info"))
    }

    fn parse_inner(bytes: &[u8]) -> ParseResult<Self> {
        let mut outer = DerReader::new(bytes);
        let sequence = outer.expect_element(TAG_SEQUENCE)?;
        let mut fields = sequence.inner();

        let version_element = fields.expect_element(TAG_INTEGER)?;
        let policy_element = fields.expect_element(TAG_OID)?;
        let imprint_element = fields.expect_element(TAG_SEQUENCE)?;

        // Bracket capture: everything from the TSTInfo header up to and
        // including the hashedMessage header, all verbatim wire bytes.
        let mut imprint_fields = imprint_element.inner();
        let algorithm_element = imprint_fields.expect_element(TAG_SEQUENCE)?;
        let hashed_message_element = imprint_fields.expect_element(TAG_OCTET_STRING)?;
        imprint_fields.finish()?;

        let mut prefix = Vec::new();
        prefix.extend_from_slice(sequence.header());
        prefix.extend_from_slice(version_element.raw());
        prefix.extend_from_slice(policy_element.raw());
        prefix.extend_from_slice(imprint_element.header());
        prefix.extend_from_slice(algorithm_element.raw());
        prefix.extend_from_slice(hashed_message_element.header());

        let version = decode_u64(&version_element)?;
        if version != TST_INFO_VERSION {
            return Err(ParseFailure::Classified(ConvertError::Format(format!(
                "invalid TST info version: {version}"
            ))));
        }
        let policy = decode_oid(&policy_element)?;
        let message_imprint = MessageImprint {
            hash_algorithm: read_algorithm_identifier(&algorithm_element)?,
            hashed_message: hashed_message_element.content().to_vec(),
        };

        let serial_element = fields.expect_element(TAG_INTEGER)?;
        let serial_number = serial_element.content().to_vec();
        let gen_time_element = fields.expect_element(TAG_GENERALIZED_TIME)?;
        let gen_time = String::from_utf8(gen_time_element.content().to_vec())
            .map_err(|_| ConvertError::Format("TST info has invalid format".to_string()))?;

        let mut suffix = Vec::new();
        suffix.extend_from_slice(serial_element.raw());
        suffix.extend_from_slice(gen_time_element.raw());

        let mut accuracy = None;
        let mut ordering = false;
        let mut nonce = None;
        let mut tsa = None;
        let mut extensions = None;
        while !fields.at_end() {
            let element = fields.read_element()?;
            suffix.extend_from_slice(element.raw());
            match element.tag() {
                TAG_SEQUENCE if accuracy.is_none() => {
                    accuracy = Some(Accuracy::parse_element(&element)?);
                }
                TAG_BOOLEAN => {
                    ordering = element.content() != [0x00];
                }
                TAG_INTEGER => {
                    nonce = Some(element.content().to_vec());
                }
                TAG_CONTEXT_0 => {
                    tsa = Some(element.content().to_vec());
                }
                TAG_CONTEXT_1 => {
                    check_extensions(&element)?;
                    extensions = Some(element.raw().to_vec());
                }
                tag => {
                    return Err(ParseFailure::Syntax(DerError(format!(
                        "unexpected tag 0x{tag:02x} in TST info"
                    ))));
                }
            }
        }

        Ok(TstInfo {
            version,
            policy,
            message_imprint,
            serial_number,
            gen_time,
            accuracy,
            ordering,
            nonce,
            tsa,
            extensions,
            bytes_before_hashed_message: prefix,
            bytes_after_hashed_message: suffix,
        })
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// OID of the timestamping policy.
    #[must_use]
    pub fn policy(&self) -> &str {
        &self.policy
    }

    #[must_use]
    pub fn message_imprint(&self) -> &MessageImprint {
        &self.message_imprint
    }

    /// Serial number as raw INTEGER content bytes (may exceed 64 bits).
    #[must_use]
    pub fn serial_number(&self) -> Vec<u8> {
        self.serial_number.clone()
    }

    /// Request time as the GeneralizedTime text from the wire.
    #[must_use]
    pub fn gen_time(&self) -> &str {
        &self.gen_time
    }

    #[must_use]
    pub fn accuracy(&self) -> Option<&Accuracy> {
        self.accuracy.as_ref()
    }

    #[must_use]
    pub fn ordering(&self) -> bool {
        self.ordering
    }

    #[must_use]
    pub fn nonce(&self) -> Option<Vec<u8>> {
        self.nonce.clone()
    }

    /// Raw encoding of the tsa GeneralName, if present.
    #[must_use]
    pub fn tsa(&self) -> Option<Vec<u8>> {
        self.tsa.clone()
    }

    /// Raw encoding of the extensions field, if present.
    #[must_use]
    pub fn encoded_extensions(&self) -> Option<Vec<u8>> {
        self.extensions.clone()
    }

    /// TSTInfo header through the hashedMessage header, verbatim.
    #[must_use]
    pub fn bytes_before_hashed_message(&self) -> Vec<u8> {
        self.bytes_before_hashed_message.clone()
    }

    /// Every TSTInfo field after the messageImprint, verbatim.
    #[must_use]
    pub fn bytes_after_hashed_message(&self) -> Vec<u8> {
        self.bytes_after_hashed_message.clone()
    }
}

/// Hash algorithm OID and digest of the timestamped datum.
#[derive(Debug, Clone)]
pub struct MessageImprint {
    hash_algorithm: String,
    hashed_message: Vec<u8>,
}

impl MessageImprint {
    #[must_use]
    pub fn hash_algorithm(&self) -> &str {
        &self.hash_algorithm
    }

    #[must_use]
    pub fn hashed_message(&self) -> Vec<u8> {
        self.hashed_message.clone()
    }
}

/// Claimed accuracy of the issuing gateway's clock.
///
/// ```text
/// Accuracy ::= SEQUENCE {
///    seconds INTEGER OPTIONAL,
///    millis  [0] INTEGER (1..999) OPTIONAL,
///    micros  [1] INTEGER (1..999) OPTIONAL
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Accuracy {
    seconds: Option<u64>,
    millis: Option<u64>,
    micros: Option<u64>,
}

impl Accuracy {
    fn parse_element(element: &DerElement<'_>) -> ParseResult<Self> {
        let mut fields = element.inner();
        let mut seconds = None;
        let mut millis = None;
        let mut micros = None;
        while !fields.at_end() {
            let part = fields.read_element()?;
            match part.tag() {
                TAG_INTEGER if seconds.is_none() => seconds = Some(decode_u64(&part)?),
                TAG_CONTEXT_0_PRIMITIVE if millis.is_none() => {
                    millis = Some(decode_u64(&part)?);
                }
                TAG_CONTEXT_1_PRIMITIVE if micros.is_none() => {
                    micros = Some(decode_u64(&part)?);
                }
                _ => {
                    return Err(ParseFailure::Classified(ConvertError::Format(
                        "accuracy has invalid format".to_string(),
                    )));
                }
            }
        }
        Ok(Accuracy {
            seconds,
            millis,
            micros,
        })
    }

    #[must_use]
    pub fn seconds(&self) -> Option<u64> {
        self.seconds
    }

    #[must_use]
    pub fn millis(&self) -> Option<u64> {
        self.millis
    }

    #[must_use]
    pub fn micros(&self) -> Option<u64> {
        self.micros
    }

    /// Total tolerance formatted for human reading. Missing components
    /// count as zero per RFC 3161.
    #[must_use]
    pub fn formatted(&self) -> String {
        let mut value = self.seconds.unwrap_or(0);
        value *= 1000;
        value += self.millis.unwrap_or(0);
        value *= 1000;
        value += self.micros.unwrap_or(0);

        if value % 1_000_000 == 0 {
            format!("{}s", value / 1_000_000)
        } else if value % 1000 == 0 {
            format!("{}ms", value / 1000)
        } else {
            format!("{value}us")
        }
    }
}

/// Reject empty extension lists, empty extensions and critical extensions.
///
/// ```text
/// Extensions ::= SEQUENCE SIZE (1..MAX) OF Extension
/// Extension  ::= SEQUENCE { extnID OID, critical BOOLEAN DEFAULT FALSE,
///                           extnValue OCTET STRING }
/// ```
fn check_extensions(element: &DerElement<'_>) -> ParseResult<()> {
    let mut extensions = element.inner();
    if extensions.at_end() {
        return Err(ParseFailure::Classified(ConvertError::Format(
            "empty extensions list".to_string(),
        )));
    }
    while !extensions.at_end() {
        let extension = extensions.expect_element(TAG_SEQUENCE)?;
        let mut parts = extension.inner();
        let oid_element = parts.expect_element(TAG_OID)?;
        let oid = decode_oid(&oid_element)?;
        if parts.at_end() {
            return Err(ParseFailure::Classified(ConvertError::Format(format!(
                "empty extension {oid}"
            ))));
        }
        if parts.peek_tag() == Some(TAG_BOOLEAN) {
            let critical = parts.read_element()?;
            if critical.content() != [0x00] {
                return Err(ParseFailure::Classified(ConvertError::Format(format!(
                    "unknown critical extension {oid}"
                ))));
            }
        }
        parts.expect_element(TAG_OCTET_STRING)?;
        parts.finish()?;
    }
    Ok(())
}
