//! DER construction helpers for unit tests.

/// Encode a definite length (short or long form).
pub fn length(len: usize) -> Vec<u8> {
    if len < 128 {
        vec![len as u8]
    } else if len < 256 {
        vec![0x81, len as u8]
    } else {
        vec![0x82, (len >> 8) as u8, (len & 0xFF) as u8]
    }
}

/// Tag + length + content.
pub fn element(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&length(content.len()));
    out.extend_from_slice(content);
    out
}

pub fn sequence(parts: &[Vec<u8>]) -> Vec<u8> {
    element(0x30, &parts.concat())
}

pub fn set(parts: &[Vec<u8>]) -> Vec<u8> {
    element(0x31, &parts.concat())
}

pub fn octet_string(content: &[u8]) -> Vec<u8> {
    element(0x04, content)
}

pub fn integer(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count().min(7);
    let mut significant = bytes[skip..].to_vec();
    if significant[0] & 0x80 != 0 {
        significant.insert(0, 0x00);
    }
    element(0x02, &significant)
}

/// Context-specific element with an explicit raw tag byte.
pub fn context(tag: u8, content: &[u8]) -> Vec<u8> {
    element(tag, content)
}

/// OBJECT IDENTIFIER from dotted form.
pub fn oid(dotted: &str) -> Vec<u8> {
    let ids: Vec<u64> = dotted.split('.').map(|p| p.parse().unwrap()).collect();
    assert!(ids.len() >= 2);
    let mut content = Vec::new();
    encode_base128(&mut content, ids[0] * 40 + ids[1]);
    for &id in &ids[2..] {
        encode_base128(&mut content, id);
    }
    element(0x06, &content)
}

fn encode_base128(out: &mut Vec<u8>, mut value: u64) {
    let mut stack = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        stack.push(0x80 | (value & 0x7F) as u8);
        value >>= 7;
    }
    stack.reverse();
    out.extend_from_slice(&stack);
}

/// AlgorithmIdentifier with NULL parameters.
pub fn algorithm_identifier(dotted: &str) -> Vec<u8> {
    sequence(&[oid(dotted), vec![0x05, 0x00]])
}

pub fn generalized_time(text: &str) -> Vec<u8> {
    element(0x18, text.as_bytes())
}

pub fn boolean(value: bool) -> Vec<u8> {
    element(0x01, &[if value { 0xFF } else { 0x00 }])
}
