//! # Authority Resolver
//!
//! Answers "which of the keys in my key store can sign for this account
//! under this permission?".
//!
//! An authority lists keys and *other accounts*, each with a weight. A
//! listed account counts when its own authority is satisfied, which may in
//! turn list more accounts. The resolver walks that graph:
//!
//! ```text
//! alice.active  (threshold 2)
//! ├── key A  (weight 1)        ← held? add A, weight += 1
//! └── bob    (weight 1)        ← walk bob.active at depth 1
//!     └── key B  (weight 1)    ← held? add B; bob satisfied, weight += 1
//! ```
//!
//! ## Termination
//!
//! The walk stops at depth [`MAX_AUTHORITY_DEPTH`] (depths 0, 1 and 2 are
//! visited). That is a cap, not cycle detection: `alice → bob → alice` is
//! walked until the cap and then abandoned. The node applies the same cap,
//! so keys beyond it would not count anyway.
//!
//! ## Fallback to owner
//!
//! The owner authority can do anything active can. Owner keys are only
//! looked at when active alone is short, rather than always unioned in:
//! every extra signature is one the node would reject as unnecessary. When
//! owner is satisfied its keys replace the partial active ones; when both
//! fall short the partial sets are unioned.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::MAX_AUTHORITY_DEPTH;
use crate::crypto::PublicKey;
use crate::network::{ChainApi, NodeError, RpcPolicy};
use crate::types::{Account, AccountId, Permission};
use crate::vault::{KeyStore, KeyStoreError};

/// Failures that stop resolution. Missing keys are not among them; they
/// show up as [`Resolution::Unsatisfied`].
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("account {0} does not exist")]
    UnknownAccount(AccountId),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),
}

/// Outcome of resolving one `(account, permission)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The held keys reach the threshold.
    Satisfied(Vec<PublicKey>),
    /// The held keys fall short. Carries whatever was found.
    Unsatisfied(Vec<PublicKey>),
}

impl Resolution {
    pub fn keys(&self) -> &[PublicKey] {
        match self {
            Resolution::Satisfied(keys) | Resolution::Unsatisfied(keys) => keys,
        }
    }

    pub fn into_keys(self) -> Vec<PublicKey> {
        match self {
            Resolution::Satisfied(keys) | Resolution::Unsatisfied(keys) => keys,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        matches!(self, Resolution::Satisfied(_))
    }
}

/// Result of walking one authority.
#[derive(Debug, Default)]
struct Walk {
    keys: Vec<PublicKey>,
    satisfied: bool,
}

impl Walk {
    fn absorb(&mut self, keys: Vec<PublicKey>) {
        for key in keys {
            if !self.keys.contains(&key) {
                self.keys.push(key);
            }
        }
    }
}

/// Walks authorities against a key store, fetching each account at most
/// once for the lifetime of the resolver.
pub struct AuthorityResolver {
    node: Arc<dyn ChainApi>,
    keys: Arc<dyn KeyStore>,
    policy: RpcPolicy,
    accounts: HashMap<AccountId, Option<Account>>,
}

impl AuthorityResolver {
    pub fn new(node: Arc<dyn ChainApi>, keys: Arc<dyn KeyStore>, policy: RpcPolicy) -> Self {
        Self {
            node,
            keys,
            policy,
            accounts: HashMap::new(),
        }
    }

    /// Resolves the keys available to sign for `account` under `permission`.
    pub async fn resolve(&mut self, account: AccountId, permission: Permission) -> Result<Resolution, ResolverError> {
        let root = self
            .account(account)
            .await?
            .ok_or(ResolverError::UnknownAccount(account))?;

        let mut walk = self.walk(root.clone(), permission, 0).await?;
        if !walk.satisfied && permission == Permission::Active {
            debug!(%account, "active authority short, trying owner");
            let owner = self.walk(root, Permission::Owner, 0).await?;
            if owner.satisfied {
                // Owner alone suffices; the partial active keys would be surplus.
                walk = owner;
            } else {
                walk.absorb(owner.keys);
            }
        }

        debug!(%account, %permission, keys = walk.keys.len(), satisfied = walk.satisfied, "authority resolved");
        Ok(if walk.satisfied {
            Resolution::Satisfied(walk.keys)
        } else {
            Resolution::Unsatisfied(walk.keys)
        })
    }

    /// Number of distinct accounts fetched so far.
    pub fn fetched_accounts(&self) -> usize {
        self.accounts.len()
    }

    async fn account(&mut self, id: AccountId) -> Result<Option<Account>, ResolverError> {
        if let Some(cached) = self.accounts.get(&id) {
            return Ok(cached.clone());
        }
        let node = Arc::clone(&self.node);
        let fetched = self
            .policy
            .read("get_accounts", || node.get_accounts(std::slice::from_ref(&id)))
            .await?
            .into_iter()
            .next()
            .flatten();
        self.accounts.insert(id, fetched.clone());
        Ok(fetched)
    }

    /// One level of the walk. Each level compares against its own
    /// threshold, which is what decides whether the parent may count the
    /// listed weight of this account.
    fn walk(&mut self, account: Account, permission: Permission, depth: u8) -> BoxFuture<'_, Result<Walk, ResolverError>> {
        async move {
            let mut walk = Walk::default();
            if depth > MAX_AUTHORITY_DEPTH {
                debug!(account = %account.id, depth, "authority depth cap reached");
                return Ok(walk);
            }

            let authority = account.authority(permission).clone();
            let threshold = u64::from(authority.weight_threshold);
            let mut weight = 0u64;

            for (key, key_weight) in &authority.key_auths {
                if self.keys.get_private_key_for_public_key(key)?.is_some() {
                    debug!(account = %account.id, %key, depth, "key located");
                    walk.absorb(vec![key.clone()]);
                    weight += u64::from(*key_weight);
                    // The node rejects signatures it did not need.
                    if weight >= threshold {
                        break;
                    }
                }
            }

            let mut partial = Vec::new();
            if weight < threshold {
                for (sub_id, sub_weight) in &authority.account_auths {
                    let Some(sub) = self.account(*sub_id).await? else {
                        warn!(account = %account.id, sub = %sub_id, "listed account does not exist");
                        continue;
                    };
                    let sub_walk = self.walk(sub, permission, depth + 1).await?;
                    if sub_walk.satisfied {
                        weight += u64::from(*sub_weight);
                        walk.absorb(sub_walk.keys);
                    } else {
                        partial.extend(sub_walk.keys);
                    }
                    if weight >= threshold {
                        break;
                    }
                }
            }

            walk.satisfied = weight >= threshold;
            // Keys of sub-accounts that fell short only help explain a shortfall.
            if !walk.satisfied {
                walk.absorb(partial);
            }
            Ok(walk)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use crate::network::InMemoryNode;
    use crate::types::{AccountOptions, Authority};
    use crate::vault::InMemoryKeyStore;

    fn key(seed: &str) -> PrivateKey {
        PrivateKey::from_seed(seed).unwrap()
    }

    fn account(id: u64, active: Authority, owner: Authority) -> Account {
        Account {
            id: AccountId(id),
            name: format!("acct-{id}"),
            owner,
            active,
            options: AccountOptions::new(key("memo").public_key()),
        }
    }

    fn resolver(node: InMemoryNode, keys: InMemoryKeyStore) -> AuthorityResolver {
        AuthorityResolver::new(Arc::new(node), Arc::new(keys), RpcPolicy::default())
    }

    #[tokio::test]
    async fn test_single_key_account() {
        let node = InMemoryNode::bitshares();
        let alice = key("alice");
        let auth = Authority::single_key(alice.public_key());
        node.add_account(account(100, auth.clone(), auth));
        let mut r = resolver(node, InMemoryKeyStore::with_keys([alice.clone()]));
        assert_eq!(
            r.resolve(AccountId(100), Permission::Active).await.unwrap(),
            Resolution::Satisfied(vec![alice.public_key()])
        );
    }

    #[tokio::test]
    async fn test_sub_account_weight_counts_when_satisfied() {
        let node = InMemoryNode::bitshares();
        let (a, b) = (key("a"), key("b"));
        // 100 needs 2: its own key (1) plus account 101 (1).
        let active = Authority {
            weight_threshold: 2,
            account_auths: vec![(AccountId(101), 1)],
            key_auths: vec![(a.public_key(), 1)],
            address_auths: vec![],
        };
        node.add_account(account(100, active, Authority::single_key(key("cold").public_key())));
        let bob = Authority::single_key(b.public_key());
        node.add_account(account(101, bob.clone(), bob));

        let mut r = resolver(node, InMemoryKeyStore::with_keys([a.clone(), b.clone()]));
        let resolution = r.resolve(AccountId(100), Permission::Active).await.unwrap();
        assert!(resolution.is_satisfied());
        assert_eq!(resolution.keys(), &[a.public_key(), b.public_key()]);
    }

    #[tokio::test]
    async fn test_short_active_unions_owner() {
        let node = InMemoryNode::bitshares();
        let (hot, cold) = (key("hot"), key("cold"));
        node.add_account(account(
            100,
            Authority::single_key(hot.public_key()),
            Authority::single_key(cold.public_key()),
        ));

        let mut r = resolver(node, InMemoryKeyStore::with_keys([cold.clone()]));
        assert_eq!(
            r.resolve(AccountId(100), Permission::Active).await.unwrap(),
            Resolution::Satisfied(vec![cold.public_key()])
        );
    }

    #[tokio::test]
    async fn test_stops_at_threshold_without_surplus_keys() {
        let node = InMemoryNode::bitshares();
        let (a, b) = (key("a"), key("b"));
        let either = Authority {
            weight_threshold: 1,
            account_auths: vec![],
            key_auths: vec![(a.public_key(), 1), (b.public_key(), 1)],
            address_auths: vec![],
        };
        node.add_account(account(100, either.clone(), either));

        let mut r = resolver(node, InMemoryKeyStore::with_keys([a.clone(), b.clone()]));
        let resolution = r.resolve(AccountId(100), Permission::Active).await.unwrap();
        assert!(resolution.is_satisfied());
        assert_eq!(resolution.keys().len(), 1);
        assert!(resolution.keys()[0] == a.public_key() || resolution.keys()[0] == b.public_key());
    }

    #[tokio::test]
    async fn test_satisfied_owner_drops_partial_active_keys() {
        let node = InMemoryNode::bitshares();
        let (hot, missing, cold) = (key("hot"), key("missing"), key("cold"));
        let active = Authority {
            weight_threshold: 2,
            account_auths: vec![],
            key_auths: vec![(hot.public_key(), 1), (missing.public_key(), 1)],
            address_auths: vec![],
        };
        node.add_account(account(100, active, Authority::single_key(cold.public_key())));

        let mut r = resolver(node, InMemoryKeyStore::with_keys([hot, cold.clone()]));
        assert_eq!(
            r.resolve(AccountId(100), Permission::Active).await.unwrap(),
            Resolution::Satisfied(vec![cold.public_key()])
        );
    }

    #[tokio::test]
    async fn test_missing_keys_are_unsatisfied_not_errors() {
        let node = InMemoryNode::bitshares();
        let auth = Authority::single_key(key("alice").public_key());
        node.add_account(account(100, auth.clone(), auth));
        let mut r = resolver(node, InMemoryKeyStore::new());
        assert_eq!(
            r.resolve(AccountId(100), Permission::Owner).await.unwrap(),
            Resolution::Unsatisfied(vec![])
        );
        assert!(matches!(
            r.resolve(AccountId(999), Permission::Active).await,
            Err(ResolverError::UnknownAccount(AccountId(999)))
        ));
    }

    #[tokio::test]
    async fn test_cycle_terminates_at_depth_cap() {
        let node = Arc::new(InMemoryNode::bitshares());
        let cyclic = |other: u64| Authority {
            weight_threshold: 1,
            account_auths: vec![(AccountId(other), 1)],
            key_auths: vec![],
            address_auths: vec![],
        };
        node.add_account(account(100, cyclic(101), cyclic(101)));
        node.add_account(account(101, cyclic(100), cyclic(100)));

        let mut r = AuthorityResolver::new(node.clone(), Arc::new(InMemoryKeyStore::new()), RpcPolicy::default());
        let resolution = r.resolve(AccountId(100), Permission::Active).await.unwrap();
        assert_eq!(resolution, Resolution::Unsatisfied(vec![]));
        // Each account is fetched once no matter how often the walk revisits it.
        assert_eq!(r.fetched_accounts(), 2);
        assert_eq!(node.call_count("get_accounts"), 2);
    }

    #[tokio::test]
    async fn test_keys_beyond_depth_cap_are_not_found() {
        let node = InMemoryNode::bitshares();
        let deep = key("deep");
        let via = |next: u64| Authority {
            weight_threshold: 1,
            account_auths: vec![(AccountId(next), 1)],
            key_auths: vec![],
            address_auths: vec![],
        };
        // 100 → 101 → 102 → 103(key). 103 sits at depth 3.
        node.add_account(account(100, via(101), via(101)));
        node.add_account(account(101, via(102), via(102)));
        node.add_account(account(102, via(103), via(103)));
        let leaf = Authority::single_key(deep.public_key());
        node.add_account(account(103, leaf.clone(), leaf));

        let store = InMemoryKeyStore::with_keys([deep.clone()]);
        let mut r = resolver(node, store);
        assert!(!r.resolve(AccountId(100), Permission::Active).await.unwrap().is_satisfied());
        // One level shallower, the same key is found.
        assert!(r.resolve(AccountId(101), Permission::Active).await.unwrap().is_satisfied());
    }
}
