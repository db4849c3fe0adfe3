//! # AES-256 Encryption
//!
//! Graphene predates AEAD being the default, so the wire formats we must
//! match use plain AES-256:
//!
//! - **CBC with PKCS#7 padding** for memos and for the wallet's master
//!   secret. Integrity comes from a SHA-256 checksum carried *inside* the
//!   plaintext (memos) or next to the ciphertext (master secret), checked by
//!   the caller after decryption.
//! - **Raw single-block ECB** for BIP38, which encrypts exactly two 16-byte
//!   halves and never pads.
//!
//! Nothing here picks keys or IVs. Every caller derives them from a hash of
//! something (a shared secret, a passphrase, an scrypt output) and the
//! derivation is the caller's contract, not this module's.
//!
//! ## Padding errors
//!
//! A PKCS#7 failure after CBC decryption almost always means "wrong key".
//! We report it as [`EncryptionError::BadPadding`] and let the caller map it
//! to something meaningful (`WrongPassphrase`, `MemoError::Decode`).

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut, KeyInit, KeyIvInit};
use aes::Aes256;
use thiserror::Error;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES key length in bytes.
pub const AES_KEY_LENGTH: usize = 32;

/// AES block (and CBC IV) length in bytes.
pub const AES_BLOCK_LENGTH: usize = 16;

/// Errors that can occur during encryption/decryption.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncryptionError {
    #[error("invalid key or IV length")]
    InvalidKeyLength,

    #[error("ciphertext length {0} is not a positive multiple of the block size")]
    InvalidCiphertextLength(usize),

    #[error("bad padding -- wrong key or corrupted ciphertext")]
    BadPadding,
}

/// AES-256-CBC encrypt with PKCS#7 padding.
///
/// The output is always a whole number of blocks, and always at least one:
/// an empty plaintext encrypts to a full block of padding.
///
/// # Example
///
/// ```
/// use graphene_protocol::crypto::encryption::{cbc_decrypt, cbc_encrypt};
///
/// let key = [0x42u8; 32]; // In real code, derive this from something secret!
/// let iv = [0x24u8; 16];
/// let sealed = cbc_encrypt(&key, &iv, b"memo").unwrap();
/// assert_eq!(sealed.len(), 16);
/// assert_eq!(cbc_decrypt(&key, &iv, &sealed).unwrap(), b"memo");
/// ```
pub fn cbc_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    let cipher =
        Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| EncryptionError::InvalidKeyLength)?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// AES-256-CBC decrypt and strip PKCS#7 padding.
pub fn cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_LENGTH != 0 {
        return Err(EncryptionError::InvalidCiphertextLength(ciphertext.len()));
    }
    let cipher =
        Aes256CbcDec::new_from_slices(key, iv).map_err(|_| EncryptionError::InvalidKeyLength)?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| EncryptionError::BadPadding)
}

/// Encrypts exactly one block with AES-256 (ECB, no padding).
pub fn ecb_encrypt_block(
    key: &[u8],
    block: &[u8; AES_BLOCK_LENGTH],
) -> Result<[u8; AES_BLOCK_LENGTH], EncryptionError> {
    let cipher = Aes256::new_from_slice(key).map_err(|_| EncryptionError::InvalidKeyLength)?;
    let mut buf = aes::Block::clone_from_slice(block);
    cipher.encrypt_block(&mut buf);
    let mut out = [0u8; AES_BLOCK_LENGTH];
    out.copy_from_slice(&buf);
    Ok(out)
}

/// Decrypts exactly one block with AES-256 (ECB, no padding).
pub fn ecb_decrypt_block(
    key: &[u8],
    block: &[u8; AES_BLOCK_LENGTH],
) -> Result<[u8; AES_BLOCK_LENGTH], EncryptionError> {
    let cipher = Aes256::new_from_slice(key).map_err(|_| EncryptionError::InvalidKeyLength)?;
    let mut buf = aes::Block::clone_from_slice(block);
    cipher.decrypt_block(&mut buf);
    let mut out = [0u8; AES_BLOCK_LENGTH];
    out.copy_from_slice(&buf);
    Ok(out)
}
