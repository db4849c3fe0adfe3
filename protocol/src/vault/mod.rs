//! # Vault Module: Key Stores
//!
//! Where private keys live while the client needs them. The rest of the
//! crate only ever asks one question ("do you hold the private key for this
//! public key?"), so the contract is small: the [`KeyStore`] trait.
//!
//! ## Architecture
//!
//! ```text
//! keystore.rs   — InMemoryKeyStore: plain map, for bots and tests
//! encrypted.rs  — EncryptedKeyStore: passphrase-locked, serializable state
//! bip38.rs      — per-key BIP38 encryption used by the encrypted store
//! ```
//!
//! ## Design Principles
//!
//! 1. **Read-mostly.** Stores are `Send + Sync`. Lookups take a read lock;
//!    only adding keys takes a write lock.
//!
//! 2. **Locked means locked.** A locked encrypted store still lists its
//!    public keys (so the resolver can tell you *which* key is missing) but
//!    refuses to hand out private ones.
//!
//! 3. **Wrong passphrase is its own error.** Never a generic decode failure,
//!    so callers can re-prompt instead of reporting corruption.
//!
//! 4. **Serializable state.** The encrypted store exports a plain serde
//!    struct holding only ciphertext. Persisting it is the embedder's job.

pub mod bip38;
pub mod encrypted;
pub mod keystore;

pub use bip38::Bip38Params;
pub use encrypted::{EncryptedKeyStore, EncryptedKeyStoreState, StoredKey};
pub use keystore::InMemoryKeyStore;

use thiserror::Error;

use crate::crypto::{EncryptionError, KeyError, PrivateKey, PublicKey};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while using a key store.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    /// The passphrase did not decrypt the master secret (or a BIP38 key).
    #[error("wrong passphrase")]
    WrongPassphrase,

    /// The store must be unlocked first.
    #[error("key store is locked")]
    Locked,

    /// `create` on a store that already has a master secret.
    #[error("key store already initialized")]
    AlreadyInitialized,

    /// `unlock` on a store that was never created.
    #[error("key store has no master secret yet")]
    NotInitialized,

    /// Stored data is not in the expected format.
    #[error("corrupt key store data: {0}")]
    Corrupt(String),

    #[error("BIP38: {0}")]
    Bip38(String),

    #[error("key error: {0}")]
    Key(#[from] KeyError),

    #[error("encryption error: {0}")]
    Encryption(#[from] EncryptionError),
}

// ---------------------------------------------------------------------------
// The contract
// ---------------------------------------------------------------------------

/// Anything that can answer "give me the private key for this public key".
pub trait KeyStore: Send + Sync {
    /// The private key matching `public`, if this store holds it.
    ///
    /// `Ok(None)` means "not here". An error means the store could not look
    /// (locked, corrupt), which callers should not confuse with absence.
    fn get_private_key_for_public_key(&self, public: &PublicKey) -> Result<Option<PrivateKey>, KeyStoreError>;

    /// Whether private keys can be read right now.
    fn is_unlocked(&self) -> bool;

    /// Every public key this store holds a private key for.
    fn public_keys(&self) -> Vec<PublicKey>;
}
