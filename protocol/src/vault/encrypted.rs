//! # Passphrase-Encrypted Key Store
//!
//! Two layers, the way the reference wallet stores keys:
//!
//! 1. A random **master secret**, encrypted with AES-256-CBC under
//!    `SHA256(passphrase)` and stored as `checksum$hex(iv || ciphertext)`,
//!    where `checksum` is the first four hex characters of
//!    `SHA256(master)`.
//! 2. Every private key, BIP38-encrypted with the master secret as the
//!    passphrase.
//!
//! Changing the passphrase only re-encrypts the master secret; the per-key
//! ciphertexts stay as they are.
//!
//! ## Lifecycle
//!
//! ```text
//! new / from_state  ->  create(passphrase) or unlock(passphrase)  ->  lock()
//! ```
//!
//! While unlocked, the master secret sits behind one mutex. `lock()` drops
//! it (and every key decrypted with it), which zeroizes the secret.

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::bip38::{self, Bip38Params};
use super::{KeyStore, KeyStoreError};
use crate::config::MASTER_CHECKSUM_HEX_LEN;
use crate::crypto::encryption::{AES_BLOCK_LENGTH, AES_KEY_LENGTH};
use crate::crypto::{cbc_decrypt, cbc_encrypt, sha256, EncryptionError, PrivateKey, PublicKey};

/// One BIP38-encrypted key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredKey {
    pub public_key: PublicKey,
    pub encrypted_key: String,
}

/// Everything the store persists. Holds only ciphertext.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedKeyStoreState {
    /// `checksum$hex(iv || ciphertext)`; `None` until `create`.
    pub encrypted_master: Option<String>,
    #[serde(default)]
    pub keys: Vec<StoredKey>,
}

fn master_checksum(master: &str) -> String {
    let mut checksum = hex::encode(sha256(master.as_bytes()));
    checksum.truncate(MASTER_CHECKSUM_HEX_LEN);
    checksum
}

fn seal_master(master: &str, passphrase: &str) -> Result<String, KeyStoreError> {
    let key = Zeroizing::new(sha256(passphrase.as_bytes()));
    let mut iv = [0u8; AES_BLOCK_LENGTH];
    rand::thread_rng().fill_bytes(&mut iv);
    let ciphertext = cbc_encrypt(&key[..AES_KEY_LENGTH], &iv, master.as_bytes())?;
    let mut blob = iv.to_vec();
    blob.extend_from_slice(&ciphertext);
    Ok(format!("{}${}", master_checksum(master), hex::encode(blob)))
}

fn open_master(sealed: &str, passphrase: &str) -> Result<Zeroizing<String>, KeyStoreError> {
    let (checksum, body) = sealed
        .split_once('$')
        .ok_or_else(|| KeyStoreError::Corrupt("master secret has no checksum".into()))?;
    let blob = hex::decode(body).map_err(|e| KeyStoreError::Corrupt(format!("master secret: {e}")))?;
    if blob.len() < 2 * AES_BLOCK_LENGTH {
        return Err(KeyStoreError::Corrupt("master secret too short".into()));
    }
    let (iv, ciphertext) = blob.split_at(AES_BLOCK_LENGTH);

    let key = Zeroizing::new(sha256(passphrase.as_bytes()));
    let plaintext = match cbc_decrypt(&key[..], iv, ciphertext) {
        Ok(plaintext) => Zeroizing::new(plaintext),
        Err(EncryptionError::BadPadding) => return Err(KeyStoreError::WrongPassphrase),
        Err(e) => return Err(KeyStoreError::Corrupt(e.to_string())),
    };
    let master = Zeroizing::new(
        String::from_utf8(plaintext.to_vec()).map_err(|_| KeyStoreError::WrongPassphrase)?,
    );
    if master_checksum(&master) != checksum {
        return Err(KeyStoreError::WrongPassphrase);
    }
    Ok(master)
}

/// A key store whose private keys are only readable after `unlock`.
pub struct EncryptedKeyStore {
    state: RwLock<EncryptedKeyStoreState>,
    master: Mutex<Option<Zeroizing<String>>>,
    /// Keys already decrypted this session. Cleared on lock.
    decrypted: RwLock<HashMap<PublicKey, PrivateKey>>,
    params: Bip38Params,
}

impl EncryptedKeyStore {
    /// An empty, uninitialized store.
    pub fn new(params: Bip38Params) -> Self {
        Self::from_state(EncryptedKeyStoreState::default(), params)
    }

    /// A locked store over previously exported state.
    pub fn from_state(state: EncryptedKeyStoreState, params: Bip38Params) -> Self {
        Self {
            state: RwLock::new(state),
            master: Mutex::new(None),
            decrypted: RwLock::new(HashMap::new()),
            params,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.read().encrypted_master.is_some()
    }

    /// Generates the master secret, seals it under `passphrase`, and leaves
    /// the store unlocked.
    pub fn create(&self, passphrase: &str) -> Result<(), KeyStoreError> {
        let mut state = self.state.write();
        if state.encrypted_master.is_some() {
            return Err(KeyStoreError::AlreadyInitialized);
        }
        let mut raw = Zeroizing::new([0u8; 32]);
        rand::thread_rng().fill_bytes(raw.as_mut_slice());
        let master = Zeroizing::new(hex::encode(raw.as_slice()));
        state.encrypted_master = Some(seal_master(&master, passphrase)?);
        *self.master.lock() = Some(master);
        info!("key store created");
        Ok(())
    }

    pub fn unlock(&self, passphrase: &str) -> Result<(), KeyStoreError> {
        let sealed = self
            .state
            .read()
            .encrypted_master
            .clone()
            .ok_or(KeyStoreError::NotInitialized)?;
        let master = open_master(&sealed, passphrase)?;
        *self.master.lock() = Some(master);
        debug!("key store unlocked");
        Ok(())
    }

    /// Forgets the master secret and every decrypted key.
    pub fn lock(&self) {
        let mut master = self.master.lock();
        *master = None;
        self.decrypted.write().clear();
        debug!("key store locked");
    }

    /// Re-seals the master secret under `new`. Works locked or unlocked.
    pub fn change_passphrase(&self, old: &str, new: &str) -> Result<(), KeyStoreError> {
        let mut state = self.state.write();
        let sealed = state.encrypted_master.as_deref().ok_or(KeyStoreError::NotInitialized)?;
        let master = open_master(sealed, old)?;
        state.encrypted_master = Some(seal_master(&master, new)?);
        info!("key store passphrase changed");
        Ok(())
    }

    /// BIP38-encrypts `key` under the master secret and stores it.
    /// Requires the store to be unlocked.
    pub fn add_private_key(&self, key: &PrivateKey) -> Result<PublicKey, KeyStoreError> {
        let master = self.master_secret()?;
        let public = key.public_key();
        let encrypted_key = bip38::encrypt(key, &master, &self.params)?;

        let mut state = self.state.write();
        state.keys.retain(|stored| stored.public_key != public);
        state.keys.push(StoredKey {
            public_key: public.clone(),
            encrypted_key,
        });
        self.decrypted.write().insert(public.clone(), key.clone());
        debug!(key = %public, "key added");
        Ok(public)
    }

    /// A snapshot of the persistent state.
    pub fn export(&self) -> EncryptedKeyStoreState {
        self.state.read().clone()
    }

    fn master_secret(&self) -> Result<Zeroizing<String>, KeyStoreError> {
        self.master.lock().clone().ok_or(KeyStoreError::Locked)
    }
}

impl KeyStore for EncryptedKeyStore {
    fn get_private_key_for_public_key(&self, public: &PublicKey) -> Result<Option<PrivateKey>, KeyStoreError> {
        let master = self.master_secret()?;
        if let Some(key) = self.decrypted.read().get(public) {
            return Ok(Some(key.clone()));
        }
        let encrypted = self
            .state
            .read()
            .keys
            .iter()
            .find(|stored| &stored.public_key == public)
            .map(|stored| stored.encrypted_key.clone());
        let Some(encrypted) = encrypted else {
            return Ok(None);
        };

        let key = match bip38::decrypt(&encrypted, &master, &self.params) {
            Ok(key) => key,
            // The master secret opened, so a BIP38 failure means the entry
            // was written under another master.
            Err(KeyStoreError::WrongPassphrase) => {
                return Err(KeyStoreError::Corrupt(format!("key {public} does not decrypt")))
            }
            Err(e) => return Err(e),
        };
        if key.public_key() != *public {
            return Err(KeyStoreError::Corrupt(format!("entry for {public} holds another key")));
        }
        self.decrypted.write().insert(public.clone(), key.clone());
        Ok(Some(key))
    }

    fn is_unlocked(&self) -> bool {
        self.master.lock().is_some()
    }

    fn public_keys(&self) -> Vec<PublicKey> {
        self.state.read().keys.iter().map(|stored| stored.public_key.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHEAP: Bip38Params = Bip38Params { log_n: 8, r: 8, p: 1 };

    fn alice() -> PrivateKey {
        PrivateKey::from_seed("alice").unwrap()
    }

    #[test]
    fn test_create_add_lock_unlock() {
        let store = EncryptedKeyStore::new(CHEAP);
        assert!(!store.is_initialized());
        assert!(matches!(store.unlock("pw"), Err(KeyStoreError::NotInitialized)));

        store.create("correct horse").unwrap();
        assert!(store.is_unlocked());
        let public = store.add_private_key(&alice()).unwrap();

        store.lock();
        assert!(!store.is_unlocked());
        assert_eq!(store.public_keys(), vec![public.clone()]);
        assert!(matches!(
            store.get_private_key_for_public_key(&public),
            Err(KeyStoreError::Locked)
        ));
        assert!(matches!(store.add_private_key(&alice()), Err(KeyStoreError::Locked)));

        store.unlock("correct horse").unwrap();
        assert_eq!(store.get_private_key_for_public_key(&public).unwrap(), Some(alice()));
    }

    #[test]
    fn test_wrong_passphrase_is_distinct() {
        let store = EncryptedKeyStore::new(CHEAP);
        store.create("right").unwrap();
        store.lock();
        assert!(matches!(store.unlock("wrong"), Err(KeyStoreError::WrongPassphrase)));
        assert!(matches!(store.create("again"), Err(KeyStoreError::AlreadyInitialized)));
    }

    #[test]
    fn test_master_blob_format() {
        let sealed = seal_master("00ff", "pw").unwrap();
        let (checksum, body) = sealed.split_once('$').unwrap();
        assert_eq!(checksum, &hex::encode(sha256(b"00ff"))[..4]);
        // 16 bytes of IV plus one padded block.
        assert_eq!(body.len(), 64);
        assert_eq!(&*open_master(&sealed, "pw").unwrap(), "00ff");
        assert!(matches!(open_master("abcd", "pw"), Err(KeyStoreError::Corrupt(_))));
    }

    #[test]
    fn test_export_and_restore_with_changed_passphrase() {
        let store = EncryptedKeyStore::new(CHEAP);
        store.create("first").unwrap();
        let public = store.add_private_key(&alice()).unwrap();
        store.change_passphrase("first", "second").unwrap();
        assert!(matches!(
            store.change_passphrase("first", "third"),
            Err(KeyStoreError::WrongPassphrase)
        ));

        let state = store.export();
        let json = serde_json::to_string(&state).unwrap();
        assert!(!json.contains(&alice().to_wif()));

        let restored = EncryptedKeyStore::from_state(serde_json::from_str(&json).unwrap(), CHEAP);
        assert!(matches!(restored.unlock("first"), Err(KeyStoreError::WrongPassphrase)));
        restored.unlock("second").unwrap();
        assert_eq!(restored.get_private_key_for_public_key(&public).unwrap(), Some(alice()));

        let bob = PrivateKey::from_seed("bob").unwrap();
        assert_eq!(restored.get_private_key_for_public_key(&bob.public_key()).unwrap(), None);
    }
}
