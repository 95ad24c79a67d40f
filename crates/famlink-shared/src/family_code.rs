//! Family codes: the short shared string that identifies one family and acts
//! as its only credential.
//!
//! Codes are compared after normalization (trimmed, ASCII upper-cased), so
//! `fam123` and ` FAM123 ` name the same family.

use rand::Rng;

use crate::constants::{FAMILY_CODE_MAX_LEN, FAMILY_CODE_MIN_LEN, GENERATED_FAMILY_CODE_LEN};
use crate::error::FamilyCodeError;

// No 0/O or 1/I: codes are read aloud and typed on phones.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Normalize and validate a user-supplied family code.
pub fn normalize(code: &str) -> Result<String, FamilyCodeError> {
    let code = code.trim().to_ascii_uppercase();

    if code.len() < FAMILY_CODE_MIN_LEN || code.len() > FAMILY_CODE_MAX_LEN {
        return Err(FamilyCodeError::InvalidLength(code.len()));
    }
    if let Some(c) = code.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(FamilyCodeError::InvalidCharacter(c));
    }
    Ok(code)
}

/// Generate a fresh random family code.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..GENERATED_FAMILY_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
