//! Strict parsers for the DER subset used by legacy time-stamp tokens.
//!
//! Beyond ordinary decoding, the parsers capture byte-exact slices of two
//! regions of the encoded form: the TSTInfo bracket around
//! `messageImprint.hashedMessage` and the signed-attributes bracket around
//! the `message-digest` value. Both are needed to recompute the input hash
//! when the converted signature is verified.

pub mod content_info;
pub mod reader;
pub mod signed_data;
pub mod signer_info;
pub mod time_signature;
pub mod tst_info;

#[cfg(test)]
pub(crate) mod testutil;

pub use content_info::ContentInfo;
pub use signed_data::SignedData;
pub use signer_info::SignerInfo;
pub use time_signature::{PublishedData, SignatureInfo, TimeSignature};
pub use tst_info::{Accuracy, MessageImprint, TstInfo};
