//! # Client
//!
//! The explicit handle an application holds: one node, one key store, the
//! chain parameters and the embedding config. Builders are created from it
//! and borrow nothing from it, so several can be in flight at once.
//!
//! ## Finalizing Operations
//!
//! [`Client::finalize_op`] is the one-call path from "I have operations" to
//! "they are on their way", honoring three config switches:
//!
//! ```text
//!   proposer set?  ── yes ──▶ wrap into proposal_create, signer = proposer/active
//!        │
//!   bundle set?    ── yes ──▶ append to the client's buffer, return
//!        │
//!        └──────────────────▶ new builder, sign, broadcast
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::{ChainParams, ClientConfig};
use crate::network::{ChainApi, RpcPolicy};
use crate::operations::Operation;
use crate::transaction::{BroadcastOutcome, ProposalBuilder, TransactionBuilder, TransactionError};
use crate::types::{AccountId, Cached, Permission};
use crate::vault::KeyStore;

/// What [`Client::finalize_op`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finalized {
    /// Sent (or handed back, under `nobroadcast`).
    Broadcast(BroadcastOutcome),
    /// Held in the bundle until [`Client::broadcast_bundle`].
    Bundled { pending_ops: usize },
}

/// Node, keys and settings, passed explicitly to whatever needs them.
pub struct Client {
    node: Arc<dyn ChainApi>,
    keys: Arc<dyn KeyStore>,
    params: ChainParams,
    config: ClientConfig,
    clock: Arc<dyn Clock>,
    policy: RpcPolicy,
    chain_id: Cached<String>,
    bundle: Option<TransactionBuilder>,
}

impl Client {
    pub fn new(node: Arc<dyn ChainApi>, keys: Arc<dyn KeyStore>, params: ChainParams, config: ClientConfig) -> Self {
        let policy = RpcPolicy::from_config(&config);
        Self {
            node,
            keys,
            params,
            config,
            clock: Arc::new(SystemClock),
            policy,
            chain_id: Cached::Unfetched,
            bundle: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn node(&self) -> &Arc<dyn ChainApi> {
        &self.node
    }

    pub fn keys(&self) -> &Arc<dyn KeyStore> {
        &self.keys
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The node's chain id, fetched once.
    pub async fn chain_id(&mut self) -> Result<&str, TransactionError> {
        let node = Arc::clone(&self.node);
        let policy = self.policy;
        let id = self
            .chain_id
            .get_or_try_fetch(|| async move { policy.read("get_chain_id", || node.get_chain_id()).await })
            .await?;
        Ok(id.as_str())
    }

    /// Fails with [`TransactionError::ChainMismatch`] when the node follows a
    /// different chain than `params` describes.
    pub async fn verify_chain(&mut self) -> Result<(), TransactionError> {
        let expected = self.params.chain_id.clone();
        let found = self.chain_id().await?;
        if !found.eq_ignore_ascii_case(&expected) {
            return Err(TransactionError::ChainMismatch {
                expected,
                found: found.to_string(),
            });
        }
        Ok(())
    }

    /// A fresh builder carrying this client's settings.
    pub fn new_tx(&self) -> Result<TransactionBuilder, TransactionError> {
        Ok(
            TransactionBuilder::new(Arc::clone(&self.node), Arc::clone(&self.keys), self.params.clone())
                .configure(&self.config)?
                .with_clock(Arc::clone(&self.clock)),
        )
    }

    /// A proposal paid by `proposer`, with the configured lifetime and
    /// review period.
    pub fn new_proposal(&self, proposer: AccountId) -> ProposalBuilder {
        let proposal = ProposalBuilder::new(proposer).with_expiration(self.config.proposal_expiration());
        match self.config.proposal_review {
            Some(seconds) => proposal.with_review_period(seconds),
            None => proposal,
        }
    }

    /// Accepts either an object id (`1.2.17`) or an account name.
    pub async fn resolve_account(&self, name_or_id: &str) -> Result<AccountId, TransactionError> {
        if let Ok(id) = name_or_id.parse::<AccountId>() {
            return Ok(id);
        }
        let node = Arc::clone(&self.node);
        let account = self
            .policy
            .read("get_account_by_name", || node.get_account_by_name(name_or_id))
            .await?;
        account
            .map(|a| a.id)
            .ok_or_else(|| TransactionError::UnknownAccount(name_or_id.to_string()))
    }

    /// Sends `ops` on behalf of `account`, or wraps or bundles them as the
    /// config asks.
    pub async fn finalize_op(
        &mut self,
        ops: Vec<Operation>,
        account: AccountId,
        permission: Permission,
    ) -> Result<Finalized, TransactionError> {
        if ops.is_empty() {
            return Err(TransactionError::NoOperations);
        }

        let (ops, signer) = match self.config.proposer.clone() {
            Some(proposer) => {
                let proposer = self.resolve_account(&proposer).await?;
                let mut proposal = self.new_proposal(proposer);
                proposal.append_ops(ops);
                debug!(%proposer, ops = proposal.operations().len(), "wrapping operations into a proposal");
                let op = proposal.into_operation(self.clock.now())?;
                (vec![op], (proposer, Permission::Active))
            }
            None => (ops, (account, permission)),
        };

        if self.config.bundle {
            let mut builder = match self.bundle.take() {
                Some(builder) => builder,
                None => self.new_tx()?,
            };
            // Signer first: a failed resolution must leave the bundle untouched.
            let resolved = if builder.signers().contains(&signer) {
                Ok(())
            } else {
                builder.append_signer(signer.0, signer.1).await.map(drop)
            };
            let builder = self.bundle.insert(builder);
            resolved?;
            builder.append_ops(ops)?;
            let pending_ops = builder.operations().len();
            debug!(pending_ops, "operations bundled");
            return Ok(Finalized::Bundled { pending_ops });
        }

        let mut builder = self.new_tx()?;
        builder.append_ops(ops)?;
        builder.append_signer(signer.0, signer.1).await?;
        Ok(Finalized::Broadcast(builder.broadcast().await?))
    }

    /// Operations waiting in the bundle.
    pub fn pending_ops(&self) -> usize {
        self.bundle.as_ref().map_or(0, |b| b.operations().len())
    }

    /// Sends everything bundled so far as one transaction. The bundle is
    /// emptied whatever the outcome.
    pub async fn broadcast_bundle(&mut self) -> Result<BroadcastOutcome, TransactionError> {
        let Some(mut builder) = self.bundle.take() else {
            return Err(TransactionError::NoOperations);
        };
        info!(ops = builder.operations().len(), "broadcasting bundle");
        builder.broadcast().await
    }
}
