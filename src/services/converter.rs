//! Conversion driver: parse the legacy token, rebuild both hash chains,
//! assemble the signature element.

use crate::domain::asn1::ContentInfo;
use crate::domain::constants::TLV_RFC3161_RECORD;
use crate::domain::hash::{HashAlgorithm, Imprint};
use crate::domain::tlv::TlvElement;
use crate::infra::error::ConvertResult;
use crate::services::aggregation_builder::AggregationChainBuilder;
use crate::services::assembler::{assemble, SignatureParts};
use crate::services::calendar_builder::CalendarChainBuilder;
use crate::services::extend::SignatureEncoder;
use std::io::Read;

/// Result of a conversion: the assembled signature element plus the
/// values a caller needs to verify or extend it.
#[derive(Debug, Clone)]
pub struct ConvertedSignature {
    signature: TlvElement,
    document_hash: Imprint,
    publication_time: u64,
    registration_time: u64,
    extended: bool,
}

impl ConvertedSignature {
    /// The assembled signature element.
    #[must_use]
    pub fn signature(&self) -> &TlvElement {
        &self.signature
    }

    /// Hash of the originally signed document, from the TSTInfo message
    /// imprint.
    #[must_use]
    pub fn document_hash(&self) -> &Imprint {
        &self.document_hash
    }

    #[must_use]
    pub fn publication_time(&self) -> u64 {
        self.publication_time
    }

    #[must_use]
    pub fn registration_time(&self) -> u64 {
        self.registration_time
    }

    /// False when the legacy token still carried its temporary PKI
    /// signature.
    #[must_use]
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    /// The RFC 3161 record child of the signature element.
    #[must_use]
    pub fn rfc3161_record(&self) -> Option<&TlvElement> {
        self.signature.first_child_of_type(TLV_RFC3161_RECORD)
    }

    /// Serialise the signature element through a host SDK encoder.
    pub fn encode_with(&self, encoder: &dyn SignatureEncoder) -> ConvertResult<Vec<u8>> {
        encoder.encode(&self.signature)
    }
}

/// Converts one legacy token into a signature element.
pub struct SignatureConverter;

impl SignatureConverter {
    /// Read a DER-encoded legacy token from `input` and convert it.
    pub fn convert<R: Read>(input: &mut R) -> ConvertResult<ConvertedSignature> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        Self::convert_bytes(&bytes)
    }

    /// Convert a DER-encoded legacy token.
    pub fn convert_bytes(bytes: &[u8]) -> ConvertResult<ConvertedSignature> {
        let content_info = ContentInfo::parse(bytes)?;
        let signed_data = content_info.content();
        let signer_info = signed_data.signer_info();
        let tst_info = signed_data.e_content();
        let time_signature = signer_info.signature();
        let publication_time = time_signature.published_data().publication_id();

        // The aggregation chain starts from the digest of the signed
        // attribute set in its SET form.
        let attrs_digest_algorithm = HashAlgorithm::by_oid(signer_info.digest_algorithm())?;
        let input_hash = attrs_digest_algorithm.hash(&[&signer_info.encoded_signed_attrs()]);
        log::debug!(
            "signed attributes hash to {} with {}",
            hex_digest(&input_hash),
            attrs_digest_algorithm.name()
        );

        let mut aggregation_builder = AggregationChainBuilder::new();
        aggregation_builder.set_input_stream(time_signature.location());
        aggregation_builder.set_input_hash(input_hash);
        let aggregation_chains = aggregation_builder.build()?;

        let mut calendar_builder = CalendarChainBuilder::new();
        calendar_builder.set_input_stream(time_signature.history());
        calendar_builder.set_input_hash(aggregation_chains.output_hash.clone());
        calendar_builder.set_publication_time(publication_time);
        let calendar_chain = calendar_builder.build()?;

        let registration_time = calendar_chain
            .first_child_of_type(0x2)
            .map(TlvElement::as_u64)
            .transpose()?
            .unwrap_or(0);

        let document_algorithm =
            HashAlgorithm::by_oid(tst_info.message_imprint().hash_algorithm())?;
        let document_hash =
            Imprint::new(document_algorithm, tst_info.message_imprint().hashed_message())?;

        let signature = assemble(SignatureParts {
            aggregation_chains: aggregation_chains.elements,
            calendar_chain,
            document_hash: &document_hash,
            attrs_digest_algorithm,
            tst_info,
            signer_info,
        })?;

        log::info!(
            "converted legacy token: publication time {publication_time}, registration time {registration_time}"
        );

        Ok(ConvertedSignature {
            signature,
            document_hash,
            publication_time,
            registration_time,
            extended: content_info.is_extended(),
        })
    }
}

fn hex_digest(imprint: &Imprint) -> String {
    imprint
        .digest()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
