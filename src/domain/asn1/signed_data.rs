//! CMS `SignedData` structure.
//!
//! ```text
//! SignedData ::= SEQUENCE {
//!    version          INTEGER  { v3(3) },
//!    digestAlgorithms SET OF DigestAlgorithmIdentifier,
//!    encapContentInfo EncapsulatedContentInfo,
//!    certificates     [0] IMPLICIT SET OF CertificateChoices OPTIONAL,
//!    crls             [1] IMPLICIT SET OF CertificateList OPTIONAL,
//!    signerInfos      SET OF SignerInfo
//! }
//! ```

use crate::domain::asn1::reader::{
    decode_u64, read_algorithm_identifier, DerElement, ParseFailure, ParseResult,
};
use crate::domain::asn1::signer_info::SignerInfo;
use crate::domain::asn1::tst_info::TstInfo;
use crate::domain::constants::{
    OID_CT_TST_INFO, SIGNED_DATA_VERSION, TAG_CONTEXT_0, TAG_CONTEXT_1, TAG_INTEGER,
    TAG_OCTET_STRING, TAG_OID, TAG_SEQUENCE, TAG_SET,
};
use crate::domain::hash::HashAlgorithm;
use crate::infra::error::{ConvertError, ConvertResult};

/// Parsed `SignedData`.
#[derive(Debug, Clone)]
pub struct SignedData {
    version: u64,
    digest_algorithms: Vec<String>,
    e_content_type: String,
    e_content: TstInfo,
    certificate: Option<Vec<u8>>,
    crls: Option<Vec<u8>>,
    signer_info: SignerInfo,
}

impl SignedData {
    /// Parse a `SignedData` from its SEQUENCE element.
    pub fn parse_element(element: &DerElement<'_>) -> ConvertResult<Self> {
        Self::parse_inner(element).map_err(|e| e.into_format("signed data"))
    }

    fn parse_inner(element: &DerElement<'_>) -> ParseResult<Self> {
        if element.tag() != TAG_SEQUENCE {
            return Err(ParseFailure::Classified(ConvertError::Format(
                "signed data has invalid format".to_string(),
            )));
        }
        let mut fields = element.inner();

        // version: RFC 2630 allows 0..4, this format requires exactly 3
        let version = decode_u64(&fields.expect_element(TAG_INTEGER)?)?;
        if version != SIGNED_DATA_VERSION {
            return Err(ParseFailure::Classified(ConvertError::Format(format!(
                "invalid signed data version: {version}"
            ))));
        }

        // The set may be empty and may contain duplicates; every entry must
        // still name a supported algorithm.
        let mut digest_algorithms = Vec::new();
        let algorithms_set = fields.expect_element(TAG_SET)?;
        let mut algorithms = algorithms_set.inner();
        while !algorithms.at_end() {
            let oid = read_algorithm_identifier(&algorithms.expect_element(TAG_SEQUENCE)?)?;
            check_digest_algorithm(&oid)?;
            digest_algorithms.push(oid);
        }

        let encap = fields.expect_element(TAG_SEQUENCE)?;
        let mut encap_fields = encap.inner();
        let e_content_type =
            super::reader::decode_oid(&encap_fields.expect_element(TAG_OID)?)?;
        if e_content_type != OID_CT_TST_INFO {
            return Err(ParseFailure::Classified(ConvertError::Format(format!(
                "invalid encapsulated content type: {e_content_type}"
            ))));
        }
        let e_content_wrapper = encap_fields.expect_element(TAG_CONTEXT_0)?;
        let mut e_content_reader = e_content_wrapper.inner();
        let e_content_octets = e_content_reader.expect_element(TAG_OCTET_STRING)?;
        e_content_reader.finish()?;
        encap_fields.finish()?;
        let e_content = TstInfo::parse(e_content_octets.content())?;

        let mut certificate = None;
        if fields.peek_tag() == Some(TAG_CONTEXT_0) {
            let certificates = fields.read_element()?;
            let mut certificate_reader = certificates.inner();
            // only the first certificate matters; the rest are ignored
            if !certificate_reader.at_end() {
                certificate = Some(certificate_reader.read_element()?.raw().to_vec());
            }
        }

        let mut crls = None;
        if fields.peek_tag() == Some(TAG_CONTEXT_1) {
            crls = Some(fields.read_element()?.raw().to_vec());
        }

        let signer_infos = fields.expect_element(TAG_SET)?;
        fields.finish()?;
        let mut signer_reader = signer_infos.inner();
        let mut signer_elements = Vec::new();
        while !signer_reader.at_end() {
            signer_elements.push(signer_reader.read_element()?);
        }
        if signer_elements.len() != 1 {
            return Err(ParseFailure::Classified(ConvertError::Format(format!(
                "wrong number of signer infos found: {}",
                signer_elements.len()
            ))));
        }
        let signer_info = SignerInfo::parse_element(&signer_elements[0])?;

        // The SignerInfo digest algorithm is deliberately not cross-checked
        // against digestAlgorithms; deployed tokens exist that omit it.

        Ok(SignedData {
            version,
            digest_algorithms,
            e_content_type,
            e_content,
            certificate,
            crls,
            signer_info,
        })
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn digest_algorithms(&self) -> &[String] {
        &self.digest_algorithms
    }

    #[must_use]
    pub fn e_content_type(&self) -> &str {
        &self.e_content_type
    }

    /// The encapsulated TSTInfo.
    #[must_use]
    pub fn e_content(&self) -> &TstInfo {
        &self.e_content
    }

    /// DER of the first embedded certificate, if any.
    #[must_use]
    pub fn certificate(&self) -> Option<Vec<u8>> {
        self.certificate.clone()
    }

    /// Raw CRLs field; unused by this token format.
    #[must_use]
    pub fn encoded_crls(&self) -> Option<Vec<u8>> {
        self.crls.clone()
    }

    #[must_use]
    pub fn signer_info(&self) -> &SignerInfo {
        &self.signer_info
    }

    #[must_use]
    pub fn is_extended(&self) -> bool {
        self.signer_info.is_extended()
    }
}

fn check_digest_algorithm(oid: &str) -> ParseResult<()> {
    if HashAlgorithm::ALL.iter().any(|a| a.oid() == oid) {
        Ok(())
    } else {
        Err(ParseFailure::Classified(ConvertError::Format(format!(
            "digest algorithm not supported: {oid}"
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asn1::reader::DerReader;
    use crate::domain::asn1::testutil::{
        algorithm_identifier, context, integer, octet_string, oid, sequence, set,
    };

    fn minimal_tst_info() -> Vec<u8> {
        sequence(&[
            integer(1),
            oid("1.3.6.1.4.1.27868.2.1"),
            sequence(&[
                algorithm_identifier("2.16.840.1.101.3.4.2.1"),
                octet_string(&[0xAB; 32]),
            ]),
            integer(42),
            crate::domain::asn1::testutil::generalized_time("20140320112839Z"),
        ])
    }

    fn minimal_signer_info() -> Vec<u8> {
        let time_signature = sequence(&[
            octet_string(&[]),
            octet_string(&[]),
            sequence(&[
                integer(1_395_317_319),
                octet_string(
                    &crate::domain::hash::HashAlgorithm::Sha256
                        .hash(&[b"root"])
                        .to_bytes(),
                ),
            ]),
        ]);
        sequence(&[
            integer(1),
            sequence(&[sequence(&[]), integer(99)]),
            algorithm_identifier("2.16.840.1.101.3.4.2.1"),
            context(
                0xA0,
                &[
                    sequence(&[
                        oid("1.2.840.113549.1.9.3"),
                        set(&[oid("1.2.840.113549.1.9.16.1.4")]),
                    ]),
                    sequence(&[
                        oid("1.2.840.113549.1.9.4"),
                        set(&[octet_string(&[0x5A; 32])]),
                    ]),
                ]
                .concat(),
            ),
            algorithm_identifier("1.3.6.1.4.1.27868.4.1"),
            octet_string(&time_signature),
        ])
    }

    fn encap_content_info() -> Vec<u8> {
        sequence(&[
            oid("1.2.840.113549.1.9.16.1.4"),
            context(0xA0, &octet_string(&minimal_tst_info())),
        ])
    }

    fn parse(der: &[u8]) -> ConvertResult<SignedData> {
        let mut reader = DerReader::new(der);
        let element = reader.read_element().unwrap();
        SignedData::parse_element(&element)
    }

    #[test]
    fn parses_minimal_signed_data() {
        let der = sequence(&[
            integer(3),
            set(&[algorithm_identifier("2.16.840.1.101.3.4.2.1")]),
            encap_content_info(),
            set(&[minimal_signer_info()]),
        ]);
        let signed_data = parse(&der).unwrap();
        assert_eq!(signed_data.version(), 3);
        assert_eq!(signed_data.digest_algorithms().len(), 1);
        assert_eq!(signed_data.e_content_type(), "1.2.840.113549.1.9.16.1.4");
        assert!(signed_data.certificate().is_none());
        assert!(signed_data.is_extended());
    }

    #[test]
    fn keeps_first_certificate() {
        let cert = sequence(&[integer(5)]);
        let der = sequence(&[
            integer(3),
            set(&[algorithm_identifier("2.16.840.1.101.3.4.2.1")]),
            encap_content_info(),
            context(0xA0, &cert),
            set(&[minimal_signer_info()]),
        ]);
        let signed_data = parse(&der).unwrap();
        assert_eq!(signed_data.certificate().unwrap(), cert);
    }

    #[test]
    fn rejects_wrong_version() {
        let der = sequence(&[
            integer(1),
            set(&[algorithm_identifier("2.16.840.1.101.3.4.2.1")]),
            encap_content_info(),
            set(&[minimal_signer_info()]),
        ]);
        let err = parse(&der).unwrap_err();
        assert_eq!(err.to_string(), "invalid signed data version: 1");
    }

    #[test]
    fn rejects_unsupported_digest_algorithm_entry() {
        let der = sequence(&[
            integer(3),
            set(&[algorithm_identifier("1.2.840.113549.2.5")]),
            encap_content_info(),
            set(&[minimal_signer_info()]),
        ]);
        let err = parse(&der).unwrap_err();
        assert_eq!(
            err.to_string(),
            "digest algorithm not supported: 1.2.840.113549.2.5"
        );
    }

    #[test]
    fn rejects_wrong_encapsulated_content_type() {
        let der = sequence(&[
            integer(3),
            set(&[algorithm_identifier("2.16.840.1.101.3.4.2.1")]),
            sequence(&[
                oid("1.2.840.113549.1.7.1"),
                context(0xA0, &octet_string(&minimal_tst_info())),
            ]),
            set(&[minimal_signer_info()]),
        ]);
        let err = parse(&der).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid encapsulated content type: 1.2.840.113549.1.7.1"
        );
    }

    #[test]
    fn rejects_multiple_signer_infos() {
        let der = sequence(&[
            integer(3),
            set(&[algorithm_identifier("2.16.840.1.101.3.4.2.1")]),
            encap_content_info(),
            set(&[minimal_signer_info(), minimal_signer_info()]),
        ]);
        let err = parse(&der).unwrap_err();
        assert_eq!(err.to_string(), "wrong number of signer infos found: 2");
    }
}
