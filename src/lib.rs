//! Legacy Time-Stamp Token Converter
//!
//! Converts a legacy CMS/RFC 3161 time-stamp token carrying a vendor
//! `TimeSignature` into an equivalent keyless signature expressed as a
//! nested TLV element. The converter parses the DER token, recomputes the
//! aggregation and calendar hash chains from their compact encodings, and
//! assembles the signature together with an RFC 3161 record that preserves
//! the DER byte ranges needed to re-verify the input hash.

pub mod domain;
pub mod infra;
pub mod services;

use std::io::Read;

pub use domain::hash::{HashAlgorithm, Imprint};
pub use domain::tlv::TlvElement;
pub use infra::config::ConverterConfig;
pub use infra::error::{ConvertError, ConvertResult};
pub use services::converter::{ConvertedSignature, SignatureConverter};
pub use services::extend::{
    ExtenderClient, ExtenderSettings, PublicationsFileClient, SignatureEncoder,
};

/// Convert a legacy token read from `input`.
pub fn convert_stream<R: Read>(input: &mut R) -> ConvertResult<ConvertedSignature> {
    SignatureConverter::convert(input)
}

/// Convert a DER-encoded legacy token.
pub fn convert_bytes(bytes: &[u8]) -> ConvertResult<ConvertedSignature> {
    SignatureConverter::convert_bytes(bytes)
}
