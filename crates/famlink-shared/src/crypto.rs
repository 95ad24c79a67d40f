use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;

use crate::constants::{KDF_CONTEXT_BACKUP_KEY, NONCE_SIZE, SYMMETRIC_KEY_SIZE};
use crate::error::CryptoError;

pub type SymmetricKey = [u8; SYMMETRIC_KEY_SIZE];

pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

// Returns nonce || ciphertext (24 bytes nonce prepended)
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.into());
    let nonce_bytes = generate_nonce();
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

pub fn decrypt(key: &SymmetricKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() < NONCE_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
    let cipher = XChaCha20Poly1305::new(key.into());
    let nonce = XNonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)
}

// BLAKE3 KDF with domain separation
pub fn derive_key_from_passphrase(passphrase: &[u8], context: &str) -> SymmetricKey {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(passphrase);
    let hash = hasher.finalize();
    let mut key = [0u8; SYMMETRIC_KEY_SIZE];
    key.copy_from_slice(&hash.as_bytes()[..SYMMETRIC_KEY_SIZE]);
    key
}

/// Key that seals a family's backups. Anyone holding the family code can
/// open them, which matches who can join the family.
pub fn derive_backup_key(family_code: &str) -> SymmetricKey {
    derive_key_from_passphrase(family_code.as_bytes(), KDF_CONTEXT_BACKUP_KEY)
}

/// Encrypt and armor as base64 text, for storing in text files.
pub fn seal_to_text(key: &SymmetricKey, plaintext: &[u8]) -> Result<String, CryptoError> {
    Ok(STANDARD.encode(encrypt(key, plaintext)?))
}

pub fn open_text(key: &SymmetricKey, armored: &str) -> Result<Vec<u8>, CryptoError> {
    let data = STANDARD
        .decode(armored.trim())
        .map_err(|_| CryptoError::Base64Decode)?;
    decrypt(key, &data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = derive_backup_key("FAM123");
        let plaintext = b"Dinner at grandma's on Sunday";

        let encrypted = encrypt(&key, plaintext).unwrap();
        let decrypted = decrypt(&key, &encrypted).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_family_code_fails() {
        let sealed = seal_to_text(&derive_backup_key("FAM123"), b"backup").unwrap();
        assert!(open_text(&derive_backup_key("FAM124"), &sealed).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = derive_backup_key("FAM123");

        let mut encrypted = encrypt(&key, b"Important data").unwrap();
        let len = encrypted.len();
        encrypted[len - 1] ^= 0xFF;

        assert!(decrypt(&key, &encrypted).is_err());
    }

    #[test]
    fn test_empty_data_fails() {
        let key = derive_backup_key("FAM123");
        assert!(decrypt(&key, &[]).is_err());
        assert!(matches!(
            open_text(&key, "not base64!"),
            Err(CryptoError::Base64Decode)
        ));
    }

    #[test]
    fn test_backup_key_derivation_deterministic() {
        assert_eq!(derive_backup_key("FAM123"), derive_backup_key("FAM123"));
        assert_ne!(derive_backup_key("FAM123"), derive_backup_key("FAM321"));
    }
}
