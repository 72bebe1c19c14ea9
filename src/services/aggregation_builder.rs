//! Aggregation hash chain builder.
//!
//! Decodes the location blob into one or more aggregation chain TLV
//! elements, splitting at the well-known gateway levels, and records the
//! output hash that feeds the calendar chain.

use crate::domain::constants::{TLV_AGGREGATION_CHAIN, TLV_LEFT_LINK, TLV_RIGHT_LINK};
use crate::domain::hash::{HashAlgorithm, Imprint};
use crate::domain::tlv::TlvElement;
use crate::infra::error::{ConvertError, ConvertResult};
use crate::services::chain_builder::{read_links, LinkEncoder};

const STATE_LEVEL: u8 = 19;
const NATIONAL_LEVEL: u8 = 39;
const TOP_LEVEL: u8 = 60;

/// The emitted chains plus the final result hash across all of them.
#[derive(Debug, Clone)]
pub struct AggregationChains {
    pub elements: Vec<TlvElement>,
    pub output_hash: Imprint,
}

/// Builds the aggregation chain TLV list from a location blob.
#[derive(Debug, Default)]
pub struct AggregationChainBuilder {
    input_stream: Option<Vec<u8>>,
    input_hash: Option<Imprint>,
}

impl AggregationChainBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input_stream(&mut self, blob: Vec<u8>) {
        self.input_stream = Some(blob);
    }

    pub fn set_input_hash(&mut self, input_hash: Imprint) {
        self.input_hash = Some(input_hash);
    }

    pub fn build(&self) -> ConvertResult<AggregationChains> {
        let blob = self.input_stream.as_deref().ok_or_else(|| {
            ConvertError::Argument("Invalid aggregation hash chain input stream: null".to_string())
        })?;
        let input_hash = self
            .input_hash
            .as_ref()
            .ok_or_else(|| ConvertError::Argument("Invalid input hash: null".to_string()))?;

        let links = read_links(blob, input_hash, &AggregationLinkEncoder)?;
        if links.is_empty() {
            return Err(ConvertError::Format(
                "No links found in aggregation hash chain.".to_string(),
            ));
        }

        let mut chains: Vec<TlvElement> = Vec::new();
        let mut chain = new_chain(&links[0].input_hash, links[0].algorithm);
        for (i, link) in links.iter().enumerate() {
            let next_level = links.get(i + 1).map(|next| next.level);
            if chain.children().len() > 2 && is_gateway(next_level) {
                chains.push(chain);
                chain = new_chain(&link.input_hash, link.algorithm);
            }
            chain.add_child(link.element.clone());
        }
        chains.push(chain);
        let output_hash = links[links.len() - 1].result_hash.clone();

        attach_chain_indices(&mut chains);

        log::debug!(
            "built {} aggregation chain(s) from {} link(s)",
            chains.len(),
            links.len()
        );

        Ok(AggregationChains {
            elements: chains,
            output_hash,
        })
    }
}

fn is_gateway(next_level: Option<u8>) -> bool {
    matches!(next_level, Some(STATE_LEVEL | NATIONAL_LEVEL | TOP_LEVEL))
}

fn new_chain(input_hash: &Imprint, algorithm: HashAlgorithm) -> TlvElement {
    let mut chain = TlvElement::new(TLV_AGGREGATION_CHAIN);
    chain.add_child(TlvElement::from_imprint(0x5, input_hash));
    chain.add_child(TlvElement::from_u64(0x6, u64::from(algorithm.gtid())));
    chain
}

/// Attach chain indices, walking from the chain nearest the root back to
/// the first: each chain receives the accumulated index list, so chain `i`
/// carries the indices of every chain above it followed by its own.
fn attach_chain_indices(chains: &mut [TlvElement]) {
    let mut indices: Vec<TlvElement> = Vec::new();
    for chain in chains.iter_mut().rev() {
        let index = calculate_chain_index(chain);
        indices.push(TlvElement::from_u64(0x3, index));
        for element in &indices {
            chain.add_child(element.clone());
        }
    }
}

/// Walk the link children in reverse: shift in a one-bit for each left
/// link, a zero for each right link, starting from 1.
fn calculate_chain_index(chain: &TlvElement) -> u64 {
    let mut index = 1u64;
    for child in chain.children().iter().rev() {
        match child.element_type() {
            TLV_LEFT_LINK => index = (index << 1) | 1,
            TLV_RIGHT_LINK => index <<= 1,
            _ => {}
        }
    }
    index
}

struct AggregationLinkEncoder;

impl LinkEncoder for AggregationLinkEncoder {
    fn encode_sibling(
        &self,
        link: &mut TlvElement,
        sibling_algorithm: HashAlgorithm,
        sibling_imprint: &[u8],
    ) -> ConvertResult<()> {
        let element_type = if sibling_algorithm == HashAlgorithm::Sha224 {
            // SHA-224 imprints carry a legacy client id, not a digest:
            // byte 0 is the algorithm id, byte 1 must be zero, byte 2 is
            // the length of an embedded ASCII label, the rest is padding.
            if sibling_imprint[1] != 0 {
                return Err(ConvertError::Format(
                    "Legacy ID second byte must be 0".to_string(),
                ));
            }
            let label_end = usize::from(sibling_imprint[2]) + 3;
            for i in label_end..sibling_imprint.len() {
                if sibling_imprint[i] != 0 {
                    return Err(ConvertError::Format(
                        "Bytes after the legacy ID string must be 0".to_string(),
                    ));
                }
            }
            0x3
        } else {
            0x2
        };
        link.add_child(TlvElement::from_bytes(element_type, sibling_imprint));
        Ok(())
    }

    fn encode_level(
        &self,
        link: &mut TlvElement,
        level: u8,
        previous_level: u8,
    ) -> ConvertResult<()> {
        if level <= previous_level {
            return Err(ConvertError::Format(format!(
                "Invalid hash step level: {level}"
            )));
        }
        if previous_level + 1 < level {
            link.add_child(TlvElement::from_u64(
                0x1,
                u64::from(level - previous_level - 1),
            ));
        }
        Ok(())
    }

    fn chain_input_hash(&self, input_hash: &Imprint, algorithm: HashAlgorithm) -> Imprint {
        algorithm.hash(&[&input_hash.to_bytes()])
    }
}
