//! Signature assembly: aggregation chains, calendar chain and the RFC 3161
//! record composed into the final signature element.

use crate::domain::asn1::{SignerInfo, TstInfo};
use crate::domain::constants::{TLV_RFC3161_RECORD, TLV_SIGNATURE};
use crate::domain::hash::{HashAlgorithm, Imprint};
use crate::domain::tlv::TlvElement;
use crate::infra::error::{ConvertError, ConvertResult};

/// Everything the assembler needs from the earlier phases.
pub struct SignatureParts<'a> {
    pub aggregation_chains: Vec<TlvElement>,
    pub calendar_chain: TlvElement,
    pub document_hash: &'a Imprint,
    pub attrs_digest_algorithm: HashAlgorithm,
    pub tst_info: &'a TstInfo,
    pub signer_info: &'a SignerInfo,
}

/// Compose the signature element. Every aggregation chain receives a copy
/// of the calendar chain's registration time, and the RFC 3161 record
/// carries the captured DER brackets needed to recompute the input hash.
pub fn assemble(parts: SignatureParts<'_>) -> ConvertResult<TlvElement> {
    let SignatureParts {
        mut aggregation_chains,
        calendar_chain,
        document_hash,
        attrs_digest_algorithm,
        tst_info,
        signer_info,
    } = parts;

    let registration_time = calendar_chain
        .first_child_of_type(0x2)
        .ok_or_else(|| {
            ConvertError::Format("calendar chain is missing its registration time".to_string())
        })?
        .as_u64()?;

    for chain in &mut aggregation_chains {
        chain.add_child(TlvElement::from_u64(0x2, registration_time));
    }

    let mut record = TlvElement::new(TLV_RFC3161_RECORD);
    record.add_child(TlvElement::from_u64(0x2, registration_time));
    let first_chain = aggregation_chains.first().ok_or_else(|| {
        ConvertError::Format("No links found in aggregation hash chain.".to_string())
    })?;
    for index in first_chain.children_of_type(0x3) {
        record.add_child(index.clone());
    }
    record.add_child(TlvElement::from_imprint(0x5, document_hash));
    record.add_child(TlvElement::from_bytes(
        0x10,
        &tst_info.bytes_before_hashed_message(),
    ));
    record.add_child(TlvElement::from_bytes(
        0x11,
        &tst_info.bytes_after_hashed_message(),
    ));
    record.add_child(TlvElement::from_u64(
        0x12,
        u64::from(document_hash.algorithm().gtid()),
    ));
    record.add_child(TlvElement::from_bytes(
        0x13,
        &signer_info.signed_attrs_bytes_before_message_imprint(),
    ));
    record.add_child(TlvElement::from_bytes(
        0x14,
        &signer_info.signed_attrs_bytes_after_message_imprint(),
    ));
    record.add_child(TlvElement::from_u64(
        0x15,
        u64::from(attrs_digest_algorithm.gtid()),
    ));

    let mut signature = TlvElement::new(TLV_SIGNATURE);
    for chain in aggregation_chains {
        signature.add_child(chain);
    }
    signature.add_child(calendar_chain);
    signature.add_child(record);
    Ok(signature)
}
