//! Service layer: chain decoding, chain building and signature assembly.

pub mod aggregation_builder;
pub mod assembler;
pub mod calendar_builder;
pub mod chain_builder;
pub mod converter;
pub mod extend;

pub use aggregation_builder::{AggregationChainBuilder, AggregationChains};
pub use calendar_builder::CalendarChainBuilder;
pub use converter::{ConvertedSignature, SignatureConverter};
pub use extend::{ExtenderClient, ExtenderSettings, PublicationsFileClient, SignatureEncoder};
