//! # Memo Encryption
//!
//! Transfers can carry a note that only the sender and the recipient can
//! read. Both sides derive the same AES key from an ECDH shared secret, so
//! nothing but the two public keys and a nonce travels with the ciphertext.
//!
//! ## Derivation
//!
//! ```text
//! S     = x-coordinate of (sender_priv * recipient_pub)     32 bytes
//! ss    = SHA512(S)
//! seed  = decimal(nonce) || hex(ss)                           ASCII
//! h     = SHA512(seed)
//! key   = h[0..32]    iv = h[32..48]
//!
//! plaintext  = SHA256(message)[0..4] || message
//! ciphertext = AES-256-CBC(key, iv, PKCS7(plaintext))
//! ```
//!
//! ## Checksum
//!
//! The four checksum bytes are verified on decryption. A mismatch is a
//! [`MemoError::ChecksumMismatch`], distinct from a padding or UTF-8
//! failure ([`MemoError::Decode`]). Decrypting with the wrong key can pass
//! the padding check by luck (about 1 in 256), and the checksum is what
//! catches it.

use rand::Rng;
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

use crate::codec::Bytes;
use crate::crypto::{cbc_decrypt, cbc_encrypt, sha256, sha512, EncryptionError, PrivateKey, PublicKey};

const MEMO_CHECKSUM_LENGTH: usize = 4;

/// Memo encryption and decryption errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoError {
    /// Bad padding, a short ciphertext, or a message that is not UTF-8.
    #[error("memo could not be decoded: {0}")]
    Decode(String),

    #[error("memo checksum mismatch")]
    ChecksumMismatch,

    /// The key offered for decryption is neither side of the memo.
    #[error("key {0} is neither the sender nor the recipient of this memo")]
    NotAParty(String),

    #[error("memo encryption failed: {0}")]
    Encryption(#[from] EncryptionError),
}

graphene_object! {
    /// The `memo_data` attached to a transfer.
    pub struct Memo {
        pub from: PublicKey,
        pub to: PublicKey,
        /// Large enough that the node prints it as a string.
        #[serde(with = "crate::types::int_or_string")]
        pub nonce: u64,
        pub message: Bytes,
    }
}

/// AES key and IV for one (shared secret, nonce) pair.
fn derive_key_iv(private: &PrivateKey, public: &PublicKey, nonce: u64) -> Zeroizing<[u8; 48]> {
    let shared = private.shared_secret(public);
    let ss = Zeroizing::new(sha512(shared.as_ref()));
    let seed = Zeroizing::new(format!("{nonce}{}", hex::encode(ss.as_ref())));
    let h = Zeroizing::new(sha512(seed.as_bytes()));
    let mut key_iv = Zeroizing::new([0u8; 48]);
    key_iv.copy_from_slice(&h[..48]);
    key_iv
}

/// Encrypts `message` for the holder of `public`'s private key.
pub fn encrypt_with_nonce(
    private: &PrivateKey,
    public: &PublicKey,
    nonce: u64,
    message: &str,
) -> Result<Vec<u8>, MemoError> {
    let key_iv = derive_key_iv(private, public, nonce);
    let checksum = sha256(message.as_bytes());
    let mut plaintext = Zeroizing::new(Vec::with_capacity(MEMO_CHECKSUM_LENGTH + message.len()));
    plaintext.extend_from_slice(&checksum[..MEMO_CHECKSUM_LENGTH]);
    plaintext.extend_from_slice(message.as_bytes());
    Ok(cbc_encrypt(&key_iv[..32], &key_iv[32..], &plaintext)?)
}

/// Decrypts a memo body and verifies its checksum.
pub fn decrypt_with_nonce(
    private: &PrivateKey,
    public: &PublicKey,
    nonce: u64,
    ciphertext: &[u8],
) -> Result<String, MemoError> {
    let key_iv = derive_key_iv(private, public, nonce);
    let plaintext = Zeroizing::new(
        cbc_decrypt(&key_iv[..32], &key_iv[32..], ciphertext)
            .map_err(|e| MemoError::Decode(e.to_string()))?,
    );
    if plaintext.len() < MEMO_CHECKSUM_LENGTH {
        return Err(MemoError::Decode("plaintext shorter than its checksum".into()));
    }
    let (checksum, body) = plaintext.split_at(MEMO_CHECKSUM_LENGTH);
    if sha256(body)[..MEMO_CHECKSUM_LENGTH] != *checksum {
        debug!(nonce, "memo checksum mismatch");
        return Err(MemoError::ChecksumMismatch);
    }
    std::str::from_utf8(body)
        .map(str::to_string)
        .map_err(|e| MemoError::Decode(e.to_string()))
}

impl Memo {
    /// Encrypts `message` from `sender` to `to`. A random nonce is drawn
    /// unless one is given.
    pub fn encrypt(
        sender: &PrivateKey,
        to: &PublicKey,
        message: &str,
        nonce: Option<u64>,
    ) -> Result<Self, MemoError> {
        let nonce = nonce.unwrap_or_else(|| rand::thread_rng().gen());
        let ciphertext = encrypt_with_nonce(sender, to, nonce, message)?;
        let from = sender.public_key().with_prefix(to.prefix());
        Ok(Self {
            from,
            to: to.clone(),
            nonce,
            message: Bytes(ciphertext),
        })
    }

    /// Decrypts with either party's private key.
    pub fn decrypt(&self, key: &PrivateKey) -> Result<String, MemoError> {
        let own = key.public_key();
        let counterparty = if own == self.from {
            &self.to
        } else if own == self.to {
            &self.from
        } else {
            return Err(MemoError::NotAParty(own.to_string()));
        };
        decrypt_with_nonce(key, counterparty, self.nonce, self.message.as_slice())
    }

    /// The public key of whichever party is not `own`.
    pub fn counterparty(&self, own: &PublicKey) -> Option<&PublicKey> {
        if *own == self.from {
            Some(&self.to)
        } else if *own == self.to {
            Some(&self.from)
        } else {
            None
        }
    }
}
