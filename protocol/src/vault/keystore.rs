//! Plain in-memory key store.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{KeyStore, KeyStoreError};
use crate::crypto::{PrivateKey, PublicKey};

/// Keys held in process memory, unencrypted. Always unlocked.
#[derive(Default)]
pub struct InMemoryKeyStore {
    keys: RwLock<HashMap<PublicKey, PrivateKey>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with `keys`.
    pub fn with_keys(keys: impl IntoIterator<Item = PrivateKey>) -> Self {
        let store = Self::new();
        for key in keys {
            store.add_key(key);
        }
        store
    }

    /// Adds a key. Returns its public key.
    pub fn add_key(&self, key: PrivateKey) -> PublicKey {
        let public = key.public_key();
        self.keys.write().insert(public.clone(), key);
        public
    }

    /// Parses and adds a WIF key.
    pub fn add_wif(&self, wif: &str) -> Result<PublicKey, KeyStoreError> {
        Ok(self.add_key(PrivateKey::from_wif(wif)?))
    }

    pub fn remove_key(&self, public: &PublicKey) -> bool {
        self.keys.write().remove(public).is_some()
    }

    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }
}

impl KeyStore for InMemoryKeyStore {
    fn get_private_key_for_public_key(&self, public: &PublicKey) -> Result<Option<PrivateKey>, KeyStoreError> {
        Ok(self.keys.read().get(public).cloned())
    }

    fn is_unlocked(&self) -> bool {
        true
    }

    fn public_keys(&self) -> Vec<PublicKey> {
        let mut keys: Vec<_> = self.keys.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_public_key() {
        let alice = PrivateKey::from_seed("alice").unwrap();
        let store = InMemoryKeyStore::with_keys([alice.clone()]);
        assert!(store.is_unlocked());
        assert_eq!(store.len(), 1);

        let found = store.get_private_key_for_public_key(&alice.public_key()).unwrap();
        assert_eq!(found, Some(alice.clone()));

        // A different prefix names the same key.
        let testnet = alice.public_key().with_prefix("TEST");
        assert!(store.get_private_key_for_public_key(&testnet).unwrap().is_some());

        let bob = PrivateKey::from_seed("bob").unwrap();
        assert_eq!(store.get_private_key_for_public_key(&bob.public_key()).unwrap(), None);
    }

    #[test]
    fn test_add_wif_and_remove() {
        let store = InMemoryKeyStore::new();
        let wif = PrivateKey::from_seed("carol").unwrap().to_wif();
        let public = store.add_wif(&wif).unwrap();
        assert_eq!(store.public_keys(), vec![public.clone()]);
        assert!(store.remove_key(&public));
        assert!(store.is_empty());
        assert!(store.add_wif("not a wif").is_err());
    }
}
