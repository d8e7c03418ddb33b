//! Gateway wire cipher.
//!
//! The payment gateway exchanges every request and response as
//! AES-128-CBC ciphertext, hex-encoded. The AES key is the MD5 digest of the
//! merchant's 32-character working key and the IV is the fixed sequence
//! `0x00..=0x0f`.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use md5::{Digest, Md5};
use thiserror::Error;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Length of the working key issued by the gateway.
pub const WORKING_KEY_LEN: usize = 32;

const BLOCK_SIZE: usize = 16;

const IV: [u8; BLOCK_SIZE] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
    0x0f,
];

/// Errors raised by the gateway cipher.
///
/// Messages never include key material or ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("working key must be {expected} characters, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("ciphertext is not valid hex")]
    InvalidHex,

    #[error("ciphertext length {0} is not a positive multiple of the block size")]
    InvalidCiphertextLength(usize),

    #[error("ciphertext failed padding check")]
    BadPadding,

    #[error("decrypted payload is not valid UTF-8")]
    InvalidUtf8,
}

fn derive_key(working_key: &str) -> Result<[u8; BLOCK_SIZE], CryptoError> {
    let actual = working_key.chars().count();
    if actual != WORKING_KEY_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: WORKING_KEY_LEN,
            actual,
        });
    }

    let digest = Md5::digest(working_key.as_bytes());
    let mut key = [0u8; BLOCK_SIZE];
    key.copy_from_slice(&digest);
    Ok(key)
}

/// Encrypts `plaintext` into lowercase hex ciphertext.
pub fn encrypt(plaintext: &str, working_key: &str) -> Result<String, CryptoError> {
    let key = derive_key(working_key)?;
    let cipher = Aes128CbcEnc::new(&key.into(), &IV.into());
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    Ok(hex::encode(ciphertext))
}

/// Decrypts hex ciphertext produced by [`encrypt`] or by the gateway.
///
/// Accepts either hex case and surrounding whitespace.
pub fn decrypt(hex_ciphertext: &str, working_key: &str) -> Result<String, CryptoError> {
    let key = derive_key(working_key)?;
    let bytes = hex::decode(hex_ciphertext.trim()).map_err(|_| CryptoError::InvalidHex)?;
    if bytes.is_empty() || bytes.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidCiphertextLength(bytes.len()));
    }

    let cipher = Aes128CbcDec::new(&key.into(), &IV.into());
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&bytes)
        .map_err(|_| CryptoError::BadPadding)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
}
