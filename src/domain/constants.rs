//! Centralized constants for the DER tags, OIDs and TLV element types the
//! legacy token format uses. Only broadly reused literals live here.

// === ASN.1 DER tags ===

/// ASN.1 SEQUENCE tag
pub const TAG_SEQUENCE: u8 = 0x30;

/// ASN.1 SET tag
pub const TAG_SET: u8 = 0x31;

/// ASN.1 INTEGER tag
pub const TAG_INTEGER: u8 = 0x02;

/// ASN.1 OBJECT IDENTIFIER tag
pub const TAG_OID: u8 = 0x06;

/// ASN.1 OCTET STRING tag
pub const TAG_OCTET_STRING: u8 = 0x04;

/// ASN.1 BOOLEAN tag
pub const TAG_BOOLEAN: u8 = 0x01;

/// ASN.1 GeneralizedTime tag
pub const TAG_GENERALIZED_TIME: u8 = 0x18;

/// Context-specific constructed tag [0]
pub const TAG_CONTEXT_0: u8 = 0xA0;

/// Context-specific constructed tag [1]
pub const TAG_CONTEXT_1: u8 = 0xA1;

/// Context-specific primitive tag [0] (Accuracy millis)
pub const TAG_CONTEXT_0_PRIMITIVE: u8 = 0x80;

/// Context-specific primitive tag [1] (Accuracy micros)
pub const TAG_CONTEXT_1_PRIMITIVE: u8 = 0x81;

// === Object identifiers (dotted form) ===

/// CMS signedData content type (1.2.840.113549.1.7.2)
pub const OID_SIGNED_DATA: &str = "1.2.840.113549.1.7.2";

/// id-ct-TSTInfo encapsulated content type (1.2.840.113549.1.9.16.1.4)
pub const OID_CT_TST_INFO: &str = "1.2.840.113549.1.9.16.1.4";

/// PKCS#9 content-type attribute (1.2.840.113549.1.9.3)
pub const OID_ATTR_CONTENT_TYPE: &str = "1.2.840.113549.1.9.3";

/// PKCS#9 message-digest attribute (1.2.840.113549.1.9.4)
pub const OID_ATTR_MESSAGE_DIGEST: &str = "1.2.840.113549.1.9.4";

/// Vendor time-signature algorithm (1.3.6.1.4.1.27868.4.1)
pub const OID_TIME_SIGNATURE_ALG: &str = "1.3.6.1.4.1.27868.4.1";

// === Version fields ===

/// Required SignedData version
pub const SIGNED_DATA_VERSION: u64 = 3;

/// Required SignerInfo version
pub const SIGNER_INFO_VERSION: u64 = 1;

/// Required TSTInfo version
pub const TST_INFO_VERSION: u64 = 1;

// === TLV element types ===

/// KSI signature container element
pub const TLV_SIGNATURE: u16 = 0x800;

/// Aggregation hash chain element
pub const TLV_AGGREGATION_CHAIN: u16 = 0x801;

/// Calendar hash chain element
pub const TLV_CALENDAR_CHAIN: u16 = 0x802;

/// RFC 3161 record element
pub const TLV_RFC3161_RECORD: u16 = 0x806;

/// Left hash-chain link (wire direction byte 1)
pub const TLV_LEFT_LINK: u16 = 0x7;

/// Right hash-chain link (wire direction byte 0)
pub const TLV_RIGHT_LINK: u16 = 0x8;
