//! EIP-191 personal-sign hashing, signer recovery and a local signing key.
//!
//! The session service uses [`verify_signature`] to check wallet assertions.
//! [`LocalSigner`] exists for the CLI `sign` command and for tests that need a
//! genuine signature.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use thiserror::Error;

use crate::types::{sign_in_message, WalletAuthAssertion};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("wallet address must be 0x followed by 40 hex characters")]
    InvalidAddress,

    #[error("signature must decode to 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("signature recovery id must be 0/1 or 27/28")]
    InvalidRecoveryId,

    #[error("invalid signature: {0}")]
    Malformed(String),

    #[error("signature does not match wallet address")]
    AddressMismatch,
}

/// Lower-case a 0x-prefixed 20-byte address, or `None` if it is not one
pub fn normalize_address(address: &str) -> Option<String> {
    let hex_part = address.trim().strip_prefix("0x")?;
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("0x{}", hex_part.to_ascii_lowercase()))
}

/// Keccak-256 of `"\x19Ethereum Signed Message:\n" + len + message`
pub fn personal_sign_hash(message: &str) -> [u8; 32] {
    let bytes = message.as_bytes();
    let prefix = format!("\x19Ethereum Signed Message:\n{}", bytes.len());
    let mut hasher = Keccak256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

pub fn address_from_key(key: &VerifyingKey) -> String {
    let encoded = key.to_encoded_point(false);
    // Skip the 0x04 uncompressed-point tag
    let digest = Keccak256::digest(&encoded.as_bytes()[1..]);
    format!("0x{}", hex::encode(&digest[12..]))
}

/// Recover the signer of `message` and return its lower-cased address
pub fn recover_address(message: &str, signature_hex: &str) -> Result<String, SignatureError> {
    let bytes = decode_prefixed(signature_hex)?;
    if bytes.len() != 65 {
        return Err(SignatureError::InvalidLength(bytes.len()));
    }

    let signature =
        Signature::try_from(&bytes[..64]).map_err(|e| SignatureError::Malformed(e.to_string()))?;
    let recovery_id = normalize_recovery_id(bytes[64])?;
    let prehash = personal_sign_hash(message);
    let key = VerifyingKey::recover_from_prehash(&prehash, &signature, recovery_id)
        .map_err(|e| SignatureError::Malformed(e.to_string()))?;

    Ok(address_from_key(&key))
}

/// Check that `signature_hex` is `expected_address`'s personal-sign signature over `message`
pub fn verify_signature(
    message: &str,
    signature_hex: &str,
    expected_address: &str,
) -> Result<String, SignatureError> {
    let expected = normalize_address(expected_address).ok_or(SignatureError::InvalidAddress)?;
    let recovered = recover_address(message, signature_hex)?;
    if recovered != expected {
        return Err(SignatureError::AddressMismatch);
    }
    Ok(expected)
}

/// `r || s` with `s` in the lower half of the curve order.
///
/// Every accepted encoding of one signature (recovery byte 0/1 or 27/28,
/// high or low `s`) maps to the same 64 bytes.
pub fn canonical_signature(signature_hex: &str) -> Result<[u8; 64], SignatureError> {
    let bytes = decode_prefixed(signature_hex)?;
    if bytes.len() != 65 {
        return Err(SignatureError::InvalidLength(bytes.len()));
    }

    let signature =
        Signature::try_from(&bytes[..64]).map_err(|e| SignatureError::Malformed(e.to_string()))?;
    let signature = signature.normalize_s().unwrap_or(signature);
    let mut out = [0u8; 64];
    out.copy_from_slice(&signature.to_bytes());
    Ok(out)
}

fn normalize_recovery_id(raw: u8) -> Result<RecoveryId, SignatureError> {
    let id = match raw {
        27 | 28 => raw - 27,
        0 | 1 => raw,
        _ => return Err(SignatureError::InvalidRecoveryId),
    };
    RecoveryId::from_byte(id).ok_or(SignatureError::InvalidRecoveryId)
}

fn decode_prefixed(value: &str) -> Result<Vec<u8>, SignatureError> {
    let trimmed = value.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .ok_or_else(|| SignatureError::InvalidHex("missing 0x prefix".to_string()))?;
    hex::decode(hex_part).map_err(|e| SignatureError::InvalidHex(e.to_string()))
}

/// secp256k1 key that produces wallet-compatible personal-sign signatures
pub struct LocalSigner {
    key: SigningKey,
}

impl LocalSigner {
    pub fn from_hex(private_key: &str) -> Result<Self, SignatureError> {
        let trimmed = private_key.trim();
        let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
            .map_err(|e| SignatureError::InvalidHex(e.to_string()))?;
        let key = SigningKey::from_slice(&bytes).map_err(|e| SignatureError::Malformed(e.to_string()))?;
        Ok(Self { key })
    }

    pub fn random() -> Self {
        Self {
            key: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    pub fn address(&self) -> String {
        address_from_key(self.key.verifying_key())
    }

    /// 0x-prefixed `r || s || v` with `v` in 27/28
    pub fn sign(&self, message: &str) -> Result<String, SignatureError> {
        let prehash = personal_sign_hash(message);
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&prehash)
            .map_err(|e| SignatureError::Malformed(e.to_string()))?;
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        Ok(format!("0x{}", hex::encode(bytes)))
    }

    /// Sign a sign-in message for `statement` stamped with `timestamp` (ms since epoch)
    pub fn sign_in(&self, statement: &str, timestamp: i64) -> Result<WalletAuthAssertion, SignatureError> {
        let message = sign_in_message(statement, timestamp);
        let signature = self.sign(&message)?;
        Ok(WalletAuthAssertion::new(self.address(), signature, message, timestamp))
    }
}
