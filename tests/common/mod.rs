//! Shared fixture builders: a small DER writer and a complete synthetic
//! legacy token for end-to-end conversion tests.
#![allow(dead_code)]

/// Encode a definite DER length.
pub fn der_length(len: usize) -> Vec<u8> {
    if len < 128 {
        vec![len as u8]
    } else if len < 256 {
        vec![0x81, len as u8]
    } else {
        vec![0x82, (len >> 8) as u8, (len & 0xFF) as u8]
    }
}

pub fn der(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&der_length(content.len()));
    out.extend_from_slice(content);
    out
}

pub fn sequence(parts: &[Vec<u8>]) -> Vec<u8> {
    der(0x30, &parts.concat())
}

pub fn set(parts: &[Vec<u8>]) -> Vec<u8> {
    der(0x31, &parts.concat())
}

pub fn octet_string(content: &[u8]) -> Vec<u8> {
    der(0x04, content)
}

pub fn integer(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count().min(7);
    let mut significant = bytes[skip..].to_vec();
    if significant[0] & 0x80 != 0 {
        significant.insert(0, 0x00);
    }
    der(0x02, &significant)
}

pub fn oid(dotted: &str) -> Vec<u8> {
    let ids: Vec<u64> = dotted.split('.').map(|p| p.parse().unwrap()).collect();
    let mut content = Vec::new();
    base128(&mut content, ids[0] * 40 + ids[1]);
    for &id in &ids[2..] {
        base128(&mut content, id);
    }
    der(0x06, &content)
}

fn base128(out: &mut Vec<u8>, mut value: u64) {
    let mut bytes = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        bytes.push(0x80 | (value & 0x7F) as u8);
        value >>= 7;
    }
    bytes.reverse();
    out.extend_from_slice(&bytes);
}

pub fn algorithm_identifier(dotted: &str) -> Vec<u8> {
    sequence(&[oid(dotted), vec![0x05, 0x00]])
}

pub fn generalized_time(text: &str) -> Vec<u8> {
    der(0x18, text.as_bytes())
}

/// One compact chain link with a SHA-256 sibling.
pub fn chain_link(direction: u8, sibling_digest: &[u8; 32], level: u8) -> Vec<u8> {
    let mut bytes = vec![1, direction, 1];
    bytes.extend_from_slice(sibling_digest);
    bytes.push(level);
    bytes
}

/// Pieces of a synthetic token the assertions need to compare against.
pub struct TokenFixture {
    pub token: Vec<u8>,
    pub tst_info: Vec<u8>,
    pub signed_attrs_wire: Vec<u8>,
    pub document_digest: Vec<u8>,
    pub publication_time: u64,
}

/// A complete, convertible legacy token:
/// one aggregation link at level 1, one right calendar link, publication
/// time 1.
pub fn legacy_token() -> TokenFixture {
    let document_digest = vec![0xD0; 32];
    let publication_time = 1u64;

    let tst_info = sequence(&[
        integer(1),
        oid("1.3.6.1.4.1.27868.2.1"),
        sequence(&[
            algorithm_identifier("2.16.840.1.101.3.4.2.1"),
            octet_string(&document_digest),
        ]),
        integer(42),
        generalized_time("20140320112839Z"),
    ]);

    let location = chain_link(0, &[0u8; 32], 1);
    let history = chain_link(0, &[0u8; 32], 0);

    let mut publication_imprint = vec![0x01];
    publication_imprint.extend_from_slice(&[0x7Eu8; 32]);
    let time_signature = sequence(&[
        octet_string(&location),
        octet_string(&history),
        sequence(&[
            integer(publication_time),
            octet_string(&publication_imprint),
        ]),
        // [0] IMPLICIT SignatureInfo: an unextended token
        der(
            0xA0,
            &[
                algorithm_identifier("1.2.840.113549.1.1.11"),
                octet_string(&[0x51; 16]),
            ]
            .concat(),
        ),
    ]);

    let signed_attrs_wire = der(
        0xA0,
        &[
            sequence(&[
                oid("1.2.840.113549.1.9.3"),
                set(&[oid("1.2.840.113549.1.9.16.1.4")]),
            ]),
            sequence(&[
                oid("1.2.840.113549.1.9.4"),
                set(&[octet_string(&[0x5A; 32])]),
            ]),
        ]
        .concat(),
    );

    let signer_info = sequence(&[
        integer(1),
        sequence(&[sequence(&[]), integer(99)]),
        algorithm_identifier("2.16.840.1.101.3.4.2.1"),
        signed_attrs_wire.clone(),
        algorithm_identifier("1.3.6.1.4.1.27868.4.1"),
        octet_string(&time_signature),
    ]);

    let signed_data = sequence(&[
        integer(3),
        set(&[algorithm_identifier("2.16.840.1.101.3.4.2.1")]),
        sequence(&[
            oid("1.2.840.113549.1.9.16.1.4"),
            der(0xA0, &octet_string(&tst_info)),
        ]),
        set(&[signer_info]),
    ]);

    let token = sequence(&[oid("1.2.840.113549.1.7.2"), der(0xA0, &signed_data)]);

    TokenFixture {
        token,
        tst_info,
        signed_attrs_wire,
        document_digest,
        publication_time,
    }
}
