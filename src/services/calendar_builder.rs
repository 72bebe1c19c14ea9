//! Calendar hash chain builder.
//!
//! Decodes the history blob into a single calendar chain TLV element and
//! reconstructs the registration time from the link directions and the
//! publication time.

use crate::domain::constants::{TLV_CALENDAR_CHAIN, TLV_RIGHT_LINK};
use crate::domain::hash::{HashAlgorithm, Imprint};
use crate::domain::tlv::TlvElement;
use crate::infra::error::{ConvertError, ConvertResult};
use crate::services::chain_builder::{read_links, ChainLink, LinkEncoder};

/// Builds the calendar chain TLV from a history blob.
#[derive(Debug, Default)]
pub struct CalendarChainBuilder {
    input_stream: Option<Vec<u8>>,
    input_hash: Option<Imprint>,
    publication_time: u64,
}

impl CalendarChainBuilder {
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

    pub fn set_publication_time(&mut self, publication_time: u64) {
        self.publication_time = publication_time;
    }

    pub fn build(&self) -> ConvertResult<TlvElement> {
        let blob = self.input_stream.as_deref().ok_or_else(|| {
            ConvertError::Argument(
                "Invalid calendar hash chain bytes inside legacy signature: No bytes found"
                    .to_string(),
            )
        })?;
        let input_hash = self
            .input_hash
            .as_ref()
            .ok_or_else(|| ConvertError::Argument("Invalid input hash: null".to_string()))?;

        let mut chain = TlvElement::new(TLV_CALENDAR_CHAIN);
        chain.add_child(TlvElement::from_u64(0x1, self.publication_time));
        chain.add_child(TlvElement::from_imprint(0x5, input_hash));

        let links = read_links(blob, input_hash, &CalendarLinkEncoder)?;
        for link in &links {
            chain.add_child(link.element.clone());
        }

        let registration_time = calculate_registration_time(&links, self.publication_time)?;
        debug_assert!(registration_time <= self.publication_time);
        chain.add_child(TlvElement::from_u64(0x2, registration_time));

        log::debug!(
            "built calendar chain with {} link(s), registration time {registration_time}",
            links.len()
        );

        Ok(chain)
    }
}

/// Walk the chain in reverse, splitting the publication time along the
/// link directions: a left link descends into the subtree below the
/// highest set bit, a right link accumulates it into the registration
/// time. A chain consistent with the publication time consumes it exactly.
fn calculate_registration_time(links: &[ChainLink], publication_time: u64) -> ConvertResult<u64> {
    let mut remaining = publication_time;
    let mut registration_time = 0u64;

    for link in links.iter().rev() {
        if remaining == 0 {
            return Err(ConvertError::Format(
                "Calendar hash chain shape is inconsistent with publication time".to_string(),
            ));
        }
        let high_bit = 1u64 << (63 - remaining.leading_zeros());
        if link.element.element_type() == TLV_RIGHT_LINK {
            registration_time += high_bit;
            remaining -= high_bit;
        } else {
            remaining = high_bit - 1;
        }
    }

    if remaining != 0 {
        return Err(ConvertError::Format(
            "Calendar hash chain shape inconsistent with publication time".to_string(),
        ));
    }

    Ok(registration_time)
}

struct CalendarLinkEncoder;

impl LinkEncoder for CalendarLinkEncoder {
    fn encode_sibling(
        &self,
        link: &mut TlvElement,
        _sibling_algorithm: HashAlgorithm,
        sibling_imprint: &[u8],
    ) -> ConvertResult<()> {
        link.set_content(sibling_imprint);
        Ok(())
    }

    fn encode_level(
        &self,
        _link: &mut TlvElement,
        _level: u8,
        _previous_level: u8,
    ) -> ConvertResult<()> {
        Ok(())
    }
}
