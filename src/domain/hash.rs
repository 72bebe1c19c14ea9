//! Hash algorithm registry and data imprints.
//!
//! The legacy format identifies algorithms three ways: by ASN.1 OID inside
//! the DER structures, by a one-byte numeric id (GTID) inside the compact
//! chain encoding and in imprints, and by name in operator-facing places.
//! The supported set is fixed; every lookup round-trips losslessly.

use crate::infra::error::{ConvertError, ConvertResult};
use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Ripemd160,
    Sha224,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Every supported algorithm, in GTID order.
    pub const ALL: [HashAlgorithm; 6] = [
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Ripemd160,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    /// Upper-case name without dashes, e.g. `SHA256`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Ripemd160 => "RIPEMD160",
            HashAlgorithm::Sha224 => "SHA224",
            HashAlgorithm::Sha384 => "SHA384",
            HashAlgorithm::Sha512 => "SHA512",
        }
    }

    /// Dotted object identifier.
    #[must_use]
    pub fn oid(self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "1.3.14.3.2.26",
            HashAlgorithm::Sha256 => "2.16.840.1.101.3.4.2.1",
            HashAlgorithm::Ripemd160 => "1.3.36.3.2.1",
            HashAlgorithm::Sha224 => "2.16.840.1.101.3.4.2.4",
            HashAlgorithm::Sha384 => "2.16.840.1.101.3.4.2.2",
            HashAlgorithm::Sha512 => "2.16.840.1.101.3.4.2.3",
        }
    }

    /// One-byte numeric vendor id.
    #[must_use]
    pub fn gtid(self) -> u8 {
        match self {
            HashAlgorithm::Sha1 => 0,
            HashAlgorithm::Sha256 => 1,
            HashAlgorithm::Ripemd160 => 2,
            HashAlgorithm::Sha224 => 3,
            HashAlgorithm::Sha384 => 4,
            HashAlgorithm::Sha512 => 5,
        }
    }

    /// Digest length in bytes.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Ripemd160 => 20,
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Look up an algorithm by name. Case- and dash-insensitive, so
    /// `SHA256`, `sha256`, `SHA-256` and `sha-256` are all accepted.
    pub fn by_name(name: &str) -> ConvertResult<Self> {
        let normalized = name.to_ascii_uppercase().replace('-', "");
        Self::ALL
            .into_iter()
            .find(|a| a.name() == normalized)
            .ok_or_else(|| {
                ConvertError::Argument(format!("unsupported algorithm name: {normalized}"))
            })
    }

    /// Look up an algorithm by dotted OID.
    pub fn by_oid(oid: &str) -> ConvertResult<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.oid() == oid)
            .ok_or_else(|| ConvertError::Argument(format!("unsupported algorithm OID: {oid}")))
    }

    /// Look up an algorithm by its numeric vendor id.
    pub fn by_gtid(gtid: u8) -> ConvertResult<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.gtid() == gtid)
            .ok_or_else(|| ConvertError::Argument(format!("unsupported algorithm GTID: {gtid}")))
    }

    /// Hash the concatenation of `chunks` with this algorithm.
    #[must_use]
    pub fn hash(self, chunks: &[&[u8]]) -> Imprint {
        let digest = match self {
            HashAlgorithm::Sha1 => digest_chunks::<Sha1>(chunks),
            HashAlgorithm::Sha256 => digest_chunks::<Sha256>(chunks),
            HashAlgorithm::Ripemd160 => digest_chunks::<Ripemd160>(chunks),
            HashAlgorithm::Sha224 => digest_chunks::<Sha224>(chunks),
            HashAlgorithm::Sha384 => digest_chunks::<Sha384>(chunks),
            HashAlgorithm::Sha512 => digest_chunks::<Sha512>(chunks),
        };
        Imprint {
            algorithm: self,
            digest,
        }
    }
}

fn digest_chunks<D: Digest>(chunks: &[&[u8]]) -> Vec<u8> {
    let mut hasher = D::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    hasher.finalize().to_vec()
}

/// A data imprint: hash algorithm plus a digest of the matching length.
/// Wire form is one GTID byte followed by the digest bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Imprint {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
}

impl Imprint {
    /// Build an imprint from an algorithm and digest, validating the length.
    pub fn new(algorithm: HashAlgorithm, digest: Vec<u8>) -> ConvertResult<Self> {
        if digest.len() != algorithm.digest_len() {
            return Err(ConvertError::Argument(format!(
                "invalid digest length for {}: {}",
                algorithm.name(),
                digest.len()
            )));
        }
        Ok(Imprint { algorithm, digest })
    }

    /// Parse an imprint from its wire form (GTID byte + digest).
    pub fn from_bytes(bytes: &[u8]) -> ConvertResult<Self> {
        let (&gtid, digest) = bytes
            .split_first()
            .ok_or_else(|| ConvertError::Argument("empty imprint".to_string()))?;
        Self::new(HashAlgorithm::by_gtid(gtid)?, digest.to_vec())
    }

    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Wire form: GTID byte followed by the digest. Always a fresh copy.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.digest.len());
        out.push(self.algorithm.gtid());
        out.extend_from_slice(&self.digest);
        out
    }
}
