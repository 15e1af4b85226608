//! Centralized cryptographic operations for River clients.
//!
//! **All** event hashing, secp256k1 signing and recovery, address derivation
//! and delegate-signature framing go through this module.
//!
//! # Primitives
//!
//! | Primitive  | Algorithm                     | Purpose                            |
//! |------------|-------------------------------|------------------------------------|
//! | Hash       | framed keccak-256 (32 B)      | Event ids, miniblock linkage       |
//! | Signature  | recoverable secp256k1 (65 B)  | Event authorship                   |
//! | Address    | keccak-256(pubkey)[12..]      | User identity (EIP-55 user ids)    |
//! | Delegate   | personal-message sig (65 B)   | Root key authorizes a device key   |

use crate::types::{Address, Hash, RecoverableSignature};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};

/// Leading tag of the event hash frame.
pub const HASH_HEADER: [u8; 8] = *b"CSBLANCA";
/// Tag between the length field and the payload.
pub const HASH_SEPARATOR: [u8; 8] = *b"ABCDEFG>";
/// Trailing tag of the event hash frame.
pub const HASH_FOOTER: [u8; 8] = *b"<GFEDCBA";
/// Leading tag of the delegate-signature source.
pub const DELEGATE_HASH_HEADER: [u8; 8] = *b"RIVERSIG";

// ---------------------------------------------------------------------------
// Hashing (keccak-256)
// ---------------------------------------------------------------------------

/// Plain keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Framed event hash:
/// `keccak256(HEADER || len(data) as u64 LE || SEPARATOR || data || FOOTER)`.
pub fn river_hash(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(HASH_HEADER);
    hasher.update((data.len() as u64).to_le_bytes());
    hasher.update(HASH_SEPARATOR);
    hasher.update(data);
    hasher.update(HASH_FOOTER);
    Hash(hasher.finalize().into())
}

/// Digest used by Ethereum `personal_sign`:
/// `keccak256("\x19Ethereum Signed Message:\n" || decimal(len) || message)`.
pub fn eth_message_hash(message: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    Hash(hasher.finalize().into())
}

// ---------------------------------------------------------------------------
// secp256k1 signing and recovery
// ---------------------------------------------------------------------------

/// Generate a fresh secp256k1 signing key from the OS RNG.
pub fn generate_signing_key() -> SigningKey {
    SigningKey::random(&mut rand::rngs::OsRng)
}

/// Uncompressed SEC1 public key (65 bytes, `0x04` prefix).
pub fn public_key_bytes(key: &SigningKey) -> Vec<u8> {
    key.verifying_key().to_encoded_point(false).as_bytes().to_vec()
}

/// Sign a 32-byte digest, producing `r || s || recovery_id`.
pub fn sign_hash(key: &SigningKey, hash: &Hash) -> Result<RecoverableSignature, CryptoError> {
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(hash.as_bytes())
        .map_err(|_| CryptoError::InvalidSignature)?;
    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&signature.to_bytes());
    out[64] = recovery_id.to_byte();
    Ok(RecoverableSignature(out))
}

/// Recover the uncompressed public key that produced `signature` over `hash`.
///
/// Both inputs are length-checked: the hash must be 32 bytes and the
/// signature exactly 65.
pub fn recover_public_key(hash: &[u8], signature: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if hash.len() != Hash::LEN {
        return Err(CryptoError::InvalidHashLength(hash.len()));
    }
    let signature = RecoverableSignature::try_from(signature)
        .map_err(|_| CryptoError::InvalidSignatureLength(signature.len()))?;
    let sig = Signature::from_slice(&signature.0[..64]).map_err(|_| CryptoError::InvalidSignature)?;
    let recovery_id =
        RecoveryId::from_byte(signature.recovery_byte()).ok_or(CryptoError::InvalidSignature)?;
    let key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id)
        .map_err(|_| CryptoError::InvalidSignature)?;
    Ok(key.to_encoded_point(false).as_bytes().to_vec())
}

/// Check that `signature` over `hash` was produced by `public_key`.
pub fn verify_hash(hash: &Hash, signature: &[u8], public_key: &[u8]) -> Result<(), CryptoError> {
    let recovered = recover_public_key(hash.as_bytes(), signature)?;
    let expected = public_key_to_address(public_key)?;
    if public_key_to_address(&recovered)? == expected {
        Ok(())
    } else {
        Err(CryptoError::InvalidSignature)
    }
}

// ---------------------------------------------------------------------------
// Addresses and user ids
// ---------------------------------------------------------------------------

/// Derive the 20-byte address of a 64- or 65-byte public key.
pub fn public_key_to_address(public_key: &[u8]) -> Result<Address, CryptoError> {
    let raw = match public_key.len() {
        65 if public_key[0] == 0x04 => &public_key[1..],
        64 => public_key,
        len => return Err(CryptoError::InvalidPublicKey(len)),
    };
    let digest = keccak256(raw);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[12..]);
    Ok(Address(out))
}

/// EIP-55 checksummed `0x` string form of an address; this is a user id.
pub fn user_id_from_address(address: &Address) -> String {
    let lower = hex::encode(address.as_bytes());
    let digest = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (digest[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse a user id (any letter case, `0x` optional) back into an address.
pub fn address_from_user_id(user_id: &str) -> Result<Address, CryptoError> {
    Address::from_hex(user_id).map_err(|_| CryptoError::InvalidAddress(user_id.to_string()))
}

// ---------------------------------------------------------------------------
// Delegate signatures
// ---------------------------------------------------------------------------

/// Delegate source: `RIVERSIG || device_public_key || expiry_epoch_ms (i64 LE)`.
pub fn delegate_hash_src(device_public_key: &[u8], expiry_epoch_ms: i64) -> Result<Vec<u8>, CryptoError> {
    if device_public_key.len() != 64 && device_public_key.len() != 65 {
        return Err(CryptoError::InvalidPublicKey(device_public_key.len()));
    }
    if expiry_epoch_ms < 0 {
        return Err(CryptoError::InvalidExpiry(expiry_epoch_ms));
    }
    let mut src = Vec::with_capacity(8 + device_public_key.len() + 8);
    src.extend_from_slice(&DELEGATE_HASH_HEADER);
    src.extend_from_slice(device_public_key);
    src.extend_from_slice(&expiry_epoch_ms.to_le_bytes());
    Ok(src)
}

/// Root key authorizes `device_public_key` until `expiry_epoch_ms` (0 = no expiry).
pub fn sign_delegate(
    root_key: &SigningKey,
    device_public_key: &[u8],
    expiry_epoch_ms: i64,
) -> Result<RecoverableSignature, CryptoError> {
    let src = delegate_hash_src(device_public_key, expiry_epoch_ms)?;
    sign_hash(root_key, &eth_message_hash(&src))
}

/// Verify that `delegate_sig` binds `device_public_key` to `creator_address`
/// and has not expired as of `now_ms`.
pub fn check_delegate_sig(
    device_public_key: &[u8],
    creator_address: &[u8],
    delegate_sig: &[u8],
    expiry_epoch_ms: i64,
    now_ms: i64,
) -> Result<(), CryptoError> {
    let src = delegate_hash_src(device_public_key, expiry_epoch_ms)?;
    let digest = eth_message_hash(&src);
    let root_key = recover_public_key(digest.as_bytes(), delegate_sig).map_err(|e| match e {
        CryptoError::InvalidSignature => CryptoError::DelegateMismatch,
        other => other,
    })?;
    let recovered = public_key_to_address(&root_key)?;
    if recovered.as_ref() != creator_address {
        return Err(CryptoError::DelegateMismatch);
    }
    if expiry_epoch_ms > 0 && expiry_epoch_ms < now_ms {
        return Err(CryptoError::DelegateExpired {
            expiry_epoch_ms,
            now_ms,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Secret generation (CSPRNG)
// ---------------------------------------------------------------------------

/// 32 random bytes, used as the per-event salt.
pub fn generate_salt() -> [u8; 32] {
    use rand::RngCore;
    let mut salt = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Cryptographic operation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid hash length: expected 32 bytes, got {0}")]
    InvalidHashLength(usize),

    #[error("invalid signature length: expected 65 bytes, got {0}")]
    InvalidSignatureLength(usize),

    #[error("invalid secp256k1 signature")]
    InvalidSignature,

    #[error("invalid public key length: {0}")]
    InvalidPublicKey(usize),

    #[error("invalid delegate expiry: {0}")]
    InvalidExpiry(i64),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("delegate signature does not match creator address")]
    DelegateMismatch,

    #[error("event delegate has expired (expiry {expiry_epoch_ms}, now {now_ms})")]
    DelegateExpired { expiry_epoch_ms: i64, now_ms: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_river_hash_frame_layout() {
        let data = b"hello";
        let mut framed = Vec::new();
        framed.extend_from_slice(b"CSBLANCA");
        framed.extend_from_slice(&5u64.to_le_bytes());
        framed.extend_from_slice(b"ABCDEFG>");
        framed.extend_from_slice(data);
        framed.extend_from_slice(b"<GFEDCBA");
        assert_eq!(river_hash(data).0, keccak256(&framed));
        assert_ne!(river_hash(data).0, keccak256(data));
    }

    #[test]
    fn test_sign_recover_round_trip() {
        let key = generate_signing_key();
        let hash = river_hash(b"payload");
        let sig = sign_hash(&key, &hash).unwrap();
        let recovered = recover_public_key(hash.as_bytes(), sig.as_ref()).unwrap();
        assert_eq!(recovered, public_key_bytes(&key));
        assert!(verify_hash(&hash, sig.as_ref(), &public_key_bytes(&key)).is_ok());
    }

    #[test]
    fn test_mutated_payload_breaks_verification() {
        let key = generate_signing_key();
        let payload = b"some event bytes".to_vec();
        let sig = sign_hash(&key, &river_hash(&payload)).unwrap();
        for i in 0..payload.len() {
            let mut mutated = payload.clone();
            mutated[i] ^= 0x01;
            let hash = river_hash(&mutated);
            assert_ne!(hash, river_hash(&payload));
            assert!(verify_hash(&hash, sig.as_ref(), &public_key_bytes(&key)).is_err());
        }
    }

    #[test]
    fn test_recover_rejects_bad_lengths() {
        assert_eq!(
            recover_public_key(&[0u8; 31], &[0u8; 65]),
            Err(CryptoError::InvalidHashLength(31))
        );
        assert_eq!(
            recover_public_key(&[0u8; 32], &[0u8; 64]),
            Err(CryptoError::InvalidSignatureLength(64))
        );
    }

    #[test]
    fn test_address_accepts_64_and_65_byte_keys() {
        let key = generate_signing_key();
        let full = public_key_bytes(&key);
        assert_eq!(
            public_key_to_address(&full).unwrap(),
            public_key_to_address(&full[1..]).unwrap()
        );
        assert_eq!(public_key_to_address(&full[..33]), Err(CryptoError::InvalidPublicKey(33)));
    }

    #[test]
    fn test_eip55_checksum() {
        // Reference vector from EIP-55.
        let addr = Address::from_hex("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(user_id_from_address(&addr), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        assert_eq!(address_from_user_id("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap(), addr);
    }

    #[test]
    fn test_delegate_src_layout() {
        let key = [7u8; 65];
        let src = delegate_hash_src(&key, 258).unwrap();
        assert_eq!(&src[..8], b"RIVERSIG");
        assert_eq!(&src[8..73], &key[..]);
        assert_eq!(&src[73..], &258i64.to_le_bytes());
        assert_eq!(delegate_hash_src(&[0u8; 33], 0), Err(CryptoError::InvalidPublicKey(33)));
        assert_eq!(delegate_hash_src(&key, -1), Err(CryptoError::InvalidExpiry(-1)));
    }

    #[test]
    fn test_delegate_chain() {
        let root = generate_signing_key();
        let device = generate_signing_key();
        let root_address = public_key_to_address(&public_key_bytes(&root)).unwrap();
        let device_pub = public_key_bytes(&device);

        let sig = sign_delegate(&root, &device_pub, 2_000).unwrap();
        assert!(check_delegate_sig(&device_pub, root_address.as_ref(), sig.as_ref(), 2_000, 1_000).is_ok());
        assert!(matches!(
            check_delegate_sig(&device_pub, root_address.as_ref(), sig.as_ref(), 2_000, 3_000),
            Err(CryptoError::DelegateExpired { .. })
        ));

        let other = generate_signing_key();
        let other_address = public_key_to_address(&public_key_bytes(&other)).unwrap();
        assert_eq!(
            check_delegate_sig(&device_pub, other_address.as_ref(), sig.as_ref(), 2_000, 1_000),
            Err(CryptoError::DelegateMismatch)
        );
    }
}
