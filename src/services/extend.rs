//! Boundary interfaces to the host SDK.
//!
//! The core's responsibility ends with the in-memory signature element;
//! serialising it to wire bytes, upgrading it with calendar evidence and
//! fetching the publications file are host SDK concerns. These traits
//! define the shape of those collaborations without any network or wire
//! code.

use crate::domain::tlv::TlvElement;
use crate::infra::config::ConverterConfig;
use crate::infra::error::ConvertResult;
use crate::services::converter::ConvertedSignature;

/// Connection settings for the two services, taken from configuration.
#[derive(Debug, Clone)]
pub struct ExtenderSettings {
    pub extender_url: String,
    pub login_id: String,
    pub login_key: String,
    pub publications_file_url: String,
    pub certificate_constraint: String,
}

impl From<&ConverterConfig> for ExtenderSettings {
    fn from(config: &ConverterConfig) -> Self {
        ExtenderSettings {
            extender_url: config.extender_url.clone(),
            login_id: config.extender_login_id.clone(),
            login_key: config.extender_login_key.clone(),
            publications_file_url: config.publications_file_url.clone(),
            certificate_constraint: config.publications_file_constraint.clone(),
        }
    }
}

/// Serialises an assembled signature element to its wire form.
pub trait SignatureEncoder {
    fn encode(&self, signature: &TlvElement) -> ConvertResult<Vec<u8>>;
}

/// Fetches the publications file used to pick the publication record for
/// a signature's publication time.
pub trait PublicationsFileClient {
    fn publications_file(&self) -> ConvertResult<Vec<u8>>;
}

/// Upgrades a signature with calendar-chain evidence for the publication
/// at the given time. Network errors propagate unchanged.
pub trait ExtenderClient {
    fn extend(&self, signature: &TlvElement, publication_time: u64) -> ConvertResult<TlvElement>;
}

/// Extend a converted signature through a host SDK client.
pub fn extend_signature(
    converted: &ConvertedSignature,
    extender: &dyn ExtenderClient,
) -> ConvertResult<TlvElement> {
    extender.extend(converted.signature(), converted.publication_time())
}
