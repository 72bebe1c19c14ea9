pub mod asn1;
pub mod constants;
pub mod hash;
pub mod tlv;
