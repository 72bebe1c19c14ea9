//! Shared decoder for the compact hash-chain link encoding.
//!
//! Each link on the wire is:
//!
//! ```text
//! algo-id        : 1 byte   (numeric vendor id)
//! direction      : 1 byte   (0 = right link, 1 = left link)
//! sibling-algo   : 1 byte   (numeric vendor id)
//! sibling-digest : N bytes  (N from sibling-algo)
//! level          : 1 byte
//! ```
//!
//! The blob ends when the read at the algo-id position hits end of stream;
//! a truncated link at any later field is a hard error. The aggregation and
//! calendar builders customise the two variation points (sibling and level
//! encoding) through [`LinkEncoder`].

use crate::domain::constants::{TLV_LEFT_LINK, TLV_RIGHT_LINK};
use crate::domain::hash::{HashAlgorithm, Imprint};
use crate::domain::tlv::TlvElement;
use crate::infra::error::{ConvertError, ConvertResult};

/// One decoded link with its recomputed hashes and emitted TLV element.
#[derive(Debug, Clone)]
pub struct ChainLink {
    pub algorithm: HashAlgorithm,
    pub input_hash: Imprint,
    pub result_hash: Imprint,
    pub element: TlvElement,
    pub level: u8,
}

/// Customisation hooks for the two points where the chain kinds differ,
/// plus the first-link input hash rule.
pub trait LinkEncoder {
    /// Append the sibling imprint to the link element.
    fn encode_sibling(
        &self,
        link: &mut TlvElement,
        sibling_algorithm: HashAlgorithm,
        sibling_imprint: &[u8],
    ) -> ConvertResult<()>;

    /// Append the level correction to the link element and enforce level
    /// ordering, if the chain kind has any.
    fn encode_level(&self, link: &mut TlvElement, level: u8, previous_level: u8)
        -> ConvertResult<()>;

    /// Input hash of the first link; the chain input is used verbatim
    /// unless the chain kind pre-hashes it.
    fn chain_input_hash(&self, input_hash: &Imprint, _algorithm: HashAlgorithm) -> Imprint {
        input_hash.clone()
    }
}

/// Map a wire direction byte to the link element type.
fn link_element_type(direction: u8) -> ConvertResult<u16> {
    match direction {
        0 => Ok(TLV_RIGHT_LINK),
        1 => Ok(TLV_LEFT_LINK),
        other => Err(ConvertError::Format(format!(
            "Invalid hash step direction: {other}"
        ))),
    }
}

/// One hash step: concatenate sibling and input imprints in direction
/// order, append the level byte, hash with the link algorithm.
pub fn hash_step(
    algorithm: HashAlgorithm,
    direction: u16,
    sibling_imprint: &[u8],
    input_imprint: &[u8],
    level: u8,
) -> Imprint {
    let level_byte = [level];
    if direction == TLV_RIGHT_LINK {
        algorithm.hash(&[sibling_imprint, input_imprint, &level_byte])
    } else {
        algorithm.hash(&[input_imprint, sibling_imprint, &level_byte])
    }
}

/// Decode every link in `blob`, recomputing hashes along the chain.
pub fn read_links(
    blob: &[u8],
    input_hash: &Imprint,
    encoder: &dyn LinkEncoder,
) -> ConvertResult<Vec<ChainLink>> {
    let mut cursor = Cursor { data: blob, pos: 0 };
    let mut links: Vec<ChainLink> = Vec::new();
    let mut previous_level = 0u8;

    while let Some(algorithm_byte) = cursor.next_byte() {
        let algorithm = HashAlgorithm::by_gtid(algorithm_byte)?;
        let link_input_hash = match links.last() {
            Some(previous) => previous.result_hash.clone(),
            None => encoder.chain_input_hash(input_hash, algorithm),
        };

        let direction = cursor.next_byte().ok_or_else(|| {
            ConvertError::Format("Invalid link, end of stream after algorithm byte.".to_string())
        })?;
        let element_type = link_element_type(direction)?;

        let sibling_algorithm_byte = cursor.next_byte().ok_or_else(|| {
            ConvertError::Format("Invalid link, end of stream after direction byte.".to_string())
        })?;
        let sibling_algorithm = HashAlgorithm::by_gtid(sibling_algorithm_byte)?;
        let mut sibling_imprint = Vec::with_capacity(1 + sibling_algorithm.digest_len());
        sibling_imprint.push(sibling_algorithm_byte);
        let digest = cursor.take(sibling_algorithm.digest_len()).ok_or_else(|| {
            ConvertError::Format("Invalid link, not enough data for hash imprint.".to_string())
        })?;
        sibling_imprint.extend_from_slice(digest);

        // A stream that ends exactly at the level position reads as 255.
        let level = cursor.next_byte().unwrap_or(0xFF);

        let mut element = TlvElement::new(element_type);
        encoder.encode_level(&mut element, level, previous_level)?;
        encoder.encode_sibling(&mut element, sibling_algorithm, &sibling_imprint)?;

        let result_hash = hash_step(
            algorithm,
            element_type,
            &sibling_imprint,
            &link_input_hash.to_bytes(),
            level,
        );

        log::trace!(
            "decoded {} link at level {level}, algorithm {}",
            if element_type == TLV_LEFT_LINK { "left" } else { "right" },
            algorithm.name()
        );

        links.push(ChainLink {
            algorithm,
            input_hash: link_input_hash,
            result_hash,
            element,
            level,
        });
        previous_level = level;
    }

    Ok(links)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        byte
    }

    fn take(&mut self, count: usize) -> Option<&'a [u8]> {
        let slice = self.data.get(self.pos..self.pos + count)?;
        self.pos += count;
        Some(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PlainEncoder;

    impl LinkEncoder for PlainEncoder {
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

    fn zero_input() -> Imprint {
        Imprint::new(HashAlgorithm::Sha256, vec![0u8; 32]).unwrap()
    }

    #[test]
    fn empty_blob_decodes_to_no_links() {
        let links = read_links(&[], &zero_input(), &PlainEncoder).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn truncation_after_algorithm_byte() {
        let err = read_links(&[1], &zero_input(), &PlainEncoder).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid link, end of stream after algorithm byte."
        );
    }

    #[test]
    fn invalid_direction() {
        let err = read_links(&[1, 2], &zero_input(), &PlainEncoder).unwrap_err();
        assert_eq!(err.to_string(), "Invalid hash step direction: 2");
    }

    #[test]
    fn truncation_after_direction_byte() {
        let err = read_links(&[1, 0], &zero_input(), &PlainEncoder).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid link, end of stream after direction byte."
        );
    }

    #[test]
    fn unknown_sibling_algorithm() {
        let err = read_links(&[1, 0, 50], &zero_input(), &PlainEncoder).unwrap_err();
        assert_eq!(err.to_string(), "unsupported algorithm GTID: 50");
    }

    #[test]
    fn truncated_sibling_imprint() {
        let err = read_links(&[1, 0, 1], &zero_input(), &PlainEncoder).unwrap_err();
        assert_eq!(err.to_string(), "Invalid link, not enough data for hash imprint.");
    }

    fn step_vectors() -> (Imprint, Imprint) {
        let sibling = Imprint::new(HashAlgorithm::Sha256, vec![0u8; 32]).unwrap();
        let mut input_digest = vec![0u8; 31];
        input_digest.push(1);
        let input = Imprint::new(HashAlgorithm::Sha256, input_digest).unwrap();
        (sibling, input)
    }

    #[test]
    fn hash_step_left_matches_reference_vector() {
        let (sibling, input) = step_vectors();
        let result = hash_step(
            HashAlgorithm::Sha256,
            TLV_LEFT_LINK,
            &sibling.to_bytes(),
            &input.to_bytes(),
            75,
        );
        assert_eq!(
            hex::encode(result.digest()),
            "f32c21885bb4ec418bf2dba729df71b5345a180c63ddb6e063173b113ff0ee5f"
        );
    }

    #[test]
    fn hash_step_right_matches_reference_vector() {
        let (sibling, input) = step_vectors();
        let result = hash_step(
            HashAlgorithm::Sha256,
            TLV_RIGHT_LINK,
            &sibling.to_bytes(),
            &input.to_bytes(),
            75,
        );
        assert_eq!(
            hex::encode(result.digest()),
            "1241d5cf78cb9b55f6f5573ef3c893deb4d5f0459b489b1b961f47f9a789078f"
        );
    }

    #[test]
    fn chain_of_two_links_feeds_results_forward() {
        // two right links at levels 1 and 2, SHA-256 siblings of all zeros
        let mut blob = Vec::new();
        for level in [1u8, 2] {
            blob.push(1); // algorithm
            blob.push(0); // direction
            blob.push(1); // sibling algorithm
            blob.extend_from_slice(&[0u8; 32]);
            blob.push(level);
        }
        let links = read_links(&blob, &zero_input(), &PlainEncoder).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].input_hash, links[0].result_hash);
        assert_eq!(links[0].element.element_type(), TLV_RIGHT_LINK);
    }

    #[test]
    fn stream_end_at_level_position_reads_as_255() {
        let mut blob = vec![1, 0, 1];
        blob.extend_from_slice(&[0u8; 32]);
        let links = read_links(&blob, &zero_input(), &PlainEncoder).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].level, 255);
    }
}
