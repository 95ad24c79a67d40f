use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: invalid ciphertext or wrong key")]
    DecryptionFailed,

    #[error("Base64 decode error")]
    Base64Decode,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FamilyCodeError {
    #[error("Family code must be 4 to 12 characters, got {0}")]
    InvalidLength(usize),

    #[error("Family code contains invalid character {0:?}")]
    InvalidCharacter(char),
}
