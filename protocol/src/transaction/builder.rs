//! The transaction builder.
//!
//! ```text
//!            append_ops            construct              sign
//!   Empty ───────────────▶ Constructing ──────▶ FeeResolved ──────▶ Signed
//!                              ▲                     │                 │
//!                              └──── append_ops ─────┴─────────────────┘
//!
//!   broadcast (from any live state with operations) ──▶ Discarded
//! ```
//!
//! The builder owns its transaction outright. Node, key store and clock are
//! shared handles passed in by the caller, usually a [`Client`].
//!
//! [`Client`]: crate::client::Client

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::fees::assemble_fees;
use super::proposal::ProposalBuilder;
use super::signing::sign_transaction;
use super::types::Transaction;
use super::TransactionError;
use crate::clock::{Clock, SystemClock};
use crate::config::{
    BlockingMode, ChainParams, ClientConfig, RefBlockSource, DEFAULT_TX_EXPIRATION, IRREVERSIBLE_POLL_INTERVAL,
    IRREVERSIBLE_WAIT_LIMIT,
};
use crate::crypto::PrivateKey;
use crate::network::{ref_block_fields, BroadcastConfirmation, ChainApi, NodeError, RpcPolicy};
use crate::operations::Operation;
use crate::resolver::{AuthorityResolver, Resolution};
use crate::types::{AccountId, AssetId, Permission};
use crate::vault::KeyStore;

// ---------------------------------------------------------------------------
// States and outcomes
// ---------------------------------------------------------------------------

/// Where a builder is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// No operations yet.
    Empty,
    /// Operations appended; fees and reference block not bound yet.
    Constructing,
    /// Fees, reference block and expiration are bound. Not signed.
    FeeResolved,
    /// Signed and ready to send.
    Signed,
    /// Broadcast (or handed back unsent). Nothing more can be done.
    Discarded,
}

impl fmt::Display for BuilderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuilderState::Empty => "empty",
            BuilderState::Constructing => "constructing",
            BuilderState::FeeResolved => "fee-resolved",
            BuilderState::Signed => "signed",
            BuilderState::Discarded => "discarded",
        })
    }
}

/// What `broadcast` did with the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// Handed to the node without waiting.
    Sent { tx_id: String },
    /// Included in a block.
    Included {
        tx_id: String,
        confirmation: BroadcastConfirmation,
    },
    /// Included in a block that has since become irreversible.
    Irreversible {
        tx_id: String,
        confirmation: BroadcastConfirmation,
    },
    /// `nobroadcast` was set: the signed transaction, unsent.
    NotBroadcast(Transaction),
}

impl BroadcastOutcome {
    /// Id of the transaction, whatever happened to it.
    pub fn tx_id(&self) -> String {
        match self {
            BroadcastOutcome::Sent { tx_id }
            | BroadcastOutcome::Included { tx_id, .. }
            | BroadcastOutcome::Irreversible { tx_id, .. } => tx_id.clone(),
            BroadcastOutcome::NotBroadcast(tx) => tx.id(),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Assembles, signs and submits one transaction.
pub struct TransactionBuilder {
    node: Arc<dyn ChainApi>,
    keys: Arc<dyn KeyStore>,
    clock: Arc<dyn Clock>,
    params: ChainParams,
    policy: RpcPolicy,
    fee_asset: AssetId,
    expiration: Duration,
    blocking: BlockingMode,
    nobroadcast: bool,
    ref_block: RefBlockSource,
    resolver: AuthorityResolver,

    state: BuilderState,
    ops: Vec<Operation>,
    signers: Vec<(AccountId, Permission)>,
    signing_keys: Vec<PrivateKey>,
    tx: Option<Transaction>,
}

impl TransactionBuilder {
    /// A builder with default settings: core-asset fees, 30 second
    /// expiration, asynchronous broadcast, head reference block.
    pub fn new(node: Arc<dyn ChainApi>, keys: Arc<dyn KeyStore>, params: ChainParams) -> Self {
        let policy = RpcPolicy::default();
        Self {
            resolver: AuthorityResolver::new(Arc::clone(&node), Arc::clone(&keys), policy),
            node,
            keys,
            clock: Arc::new(SystemClock),
            params,
            policy,
            fee_asset: AssetId::CORE,
            expiration: DEFAULT_TX_EXPIRATION,
            blocking: BlockingMode::None,
            nobroadcast: false,
            ref_block: RefBlockSource::Head,
            state: BuilderState::Empty,
            ops: Vec::new(),
            signers: Vec::new(),
            signing_keys: Vec::new(),
            tx: None,
        }
    }

    /// Applies the broadcast, expiration, fee and RPC settings of `config`.
    pub fn configure(mut self, config: &ClientConfig) -> Result<Self, TransactionError> {
        self.fee_asset = config
            .fee_asset
            .parse()
            .map_err(|e| TransactionError::Config(format!("fee_asset: {e}")))?;
        self.expiration = config.expiration();
        self.blocking = config.blocking;
        self.nobroadcast = config.nobroadcast;
        self.ref_block = config.ref_block;
        self.policy = RpcPolicy::from_config(config);
        self.resolver = AuthorityResolver::new(Arc::clone(&self.node), Arc::clone(&self.keys), self.policy);
        Ok(self)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: RpcPolicy) -> Self {
        self.policy = policy;
        self.resolver = AuthorityResolver::new(Arc::clone(&self.node), Arc::clone(&self.keys), policy);
        self
    }

    // -- inspection -------------------------------------------------------

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    /// Signers appended so far.
    pub fn signers(&self) -> &[(AccountId, Permission)] {
        &self.signers
    }

    /// The constructed transaction, once there is one.
    pub fn transaction(&self) -> Option<&Transaction> {
        self.tx.as_ref()
    }

    /// JSON of the constructed transaction.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        self.tx.as_ref().map(Transaction::to_json)
    }

    // -- appending --------------------------------------------------------

    /// Appends operations. After construction this drops the bound
    /// transaction and its signatures.
    pub fn append_ops(&mut self, ops: impl IntoIterator<Item = Operation>) -> Result<&mut Self, TransactionError> {
        self.ensure_live("append operations")?;
        let before = self.ops.len();
        for mut op in ops {
            op.normalize();
            self.ops.push(op);
        }
        if self.ops.len() == before {
            return Ok(self);
        }
        if self.tx.take().is_some() {
            debug!(state = %self.state, "operations appended after construction, signatures dropped");
        }
        self.state = BuilderState::Constructing;
        debug!(ops = self.ops.len(), "operations appended");
        Ok(self)
    }

    /// Appends the `proposal_create` built from `proposal`. The proposer
    /// still has to be appended as a signer.
    pub fn append_proposal(&mut self, proposal: ProposalBuilder) -> Result<&mut Self, TransactionError> {
        let op = proposal.into_operation(self.clock.now())?;
        self.append_ops([op])
    }

    /// Resolves the keys this store holds for `account` under `permission`
    /// and adds them to the signing set.
    ///
    /// An authority the held keys cannot satisfy is not an error here; the
    /// node will say so on broadcast. The resolution is returned for callers
    /// that want to check first.
    pub async fn append_signer(
        &mut self,
        account: AccountId,
        permission: Permission,
    ) -> Result<Resolution, TransactionError> {
        self.ensure_live("append a signer")?;
        let resolution = self.resolver.resolve(account, permission).await?;
        for public in resolution.keys() {
            if let Some(private) = self.keys.get_private_key_for_public_key(public)? {
                self.add_key(private);
            }
        }
        if !resolution.is_satisfied() {
            warn!(%account, %permission, found = resolution.keys().len(), "held keys do not satisfy the authority");
        }
        self.signers.push((account, permission));
        Ok(resolution)
    }

    /// Adds a key to the signing set directly.
    pub fn append_private_key(&mut self, key: PrivateKey) -> Result<&mut Self, TransactionError> {
        self.ensure_live("append a key")?;
        self.add_key(key);
        Ok(self)
    }

    fn add_key(&mut self, key: PrivateKey) {
        if self.signing_keys.contains(&key) {
            return;
        }
        self.signing_keys.push(key);
        // A new key means the existing signature set is incomplete.
        if self.state == BuilderState::Signed {
            if let Some(tx) = self.tx.as_mut() {
                tx.signatures.clear();
            }
            self.state = BuilderState::FeeResolved;
        }
    }

    // -- lifecycle --------------------------------------------------------

    /// Binds fees, reference block and expiration.
    pub async fn construct(&mut self) -> Result<&Transaction, TransactionError> {
        self.ensure_live("construct")?;
        if self.ops.is_empty() {
            return Err(TransactionError::NoOperations);
        }
        for op in &self.ops {
            op.validate()?;
        }

        let mut ops = self.ops.clone();
        assemble_fees(self.node.as_ref(), &self.policy, &mut ops, self.fee_asset).await?;
        let (ref_block_num, ref_block_prefix) = self.reference_block().await?;
        let expiration = self.clock.now().saturating_add(self.expiration);

        self.ops = ops;
        let tx = Transaction::new(ref_block_num, ref_block_prefix, expiration, self.ops.clone());
        info!(tx_id = %tx.id(), ops = self.ops.len(), ref_block_num, %expiration, "transaction constructed");
        self.state = BuilderState::FeeResolved;
        let tx: &Transaction = self.tx.insert(tx);
        Ok(tx)
    }

    async fn reference_block(&self) -> Result<(u16, u32), TransactionError> {
        let node = Arc::clone(&self.node);
        let props = self
            .policy
            .read("get_dynamic_global_properties", || node.get_dynamic_global_properties())
            .await?;

        match self.ref_block {
            RefBlockSource::Head => Ok(ref_block_fields(&props.head_block_id)?),
            RefBlockSource::Irreversible => {
                let next = props.last_irreversible_block_num + 1;
                let header = self
                    .policy
                    .read("get_block_header", || node.get_block_header(next))
                    .await?;
                match header {
                    // `previous` of the block after it is the irreversible block's id.
                    Some(header) => Ok(ref_block_fields(&header.previous)?),
                    None => {
                        debug!(next, "no header after the last irreversible block, using head");
                        Ok(ref_block_fields(&props.head_block_id)?)
                    }
                }
            }
        }
    }

    /// Signs with every key in the signing set. Requires a constructed
    /// transaction; re-signing a signed one replaces its signatures.
    pub fn sign(&mut self) -> Result<&Transaction, TransactionError> {
        if !matches!(self.state, BuilderState::FeeResolved | BuilderState::Signed) {
            return Err(self.invalid("sign"));
        }
        let chain_id = self
            .params
            .chain_id_bytes()
            .map_err(|e| TransactionError::Config(format!("chain id: {e}")))?;
        let Some(tx) = self.tx.as_mut() else {
            return Err(TransactionError::InvalidState {
                action: "sign",
                state: self.state.to_string(),
            });
        };
        sign_transaction(tx, &chain_id, &self.signing_keys)?;
        self.state = BuilderState::Signed;
        Ok(&*tx)
    }

    /// Asks the node whether the signatures satisfy every required authority.
    pub async fn verify_authority(&self) -> Result<(), TransactionError> {
        let Some(tx) = self.tx.as_ref().filter(|_| self.state == BuilderState::Signed) else {
            return Err(self.invalid("verify authority"));
        };
        let node = Arc::clone(&self.node);
        let ok = self
            .policy
            .read("verify_authority", || node.verify_authority(tx))
            .await?;
        if ok {
            Ok(())
        } else {
            Err(TransactionError::InsufficientAuthority)
        }
    }

    /// Constructs and signs as needed, then sends.
    ///
    /// Once the transaction is signed the builder is spent, whether the
    /// send succeeds, fails or is skipped because of `nobroadcast`. The
    /// send itself is attempted exactly once.
    pub async fn broadcast(&mut self) -> Result<BroadcastOutcome, TransactionError> {
        self.ensure_live("broadcast")?;
        match self.state {
            BuilderState::Empty => return Err(TransactionError::NoOperations),
            BuilderState::Constructing => {
                self.construct().await?;
            }
            _ => {}
        }
        if self.state == BuilderState::FeeResolved {
            self.sign()?;
        }
        let tx = self.tx.take().ok_or_else(|| self.invalid("broadcast"))?;
        self.state = BuilderState::Discarded;
        let tx_id = tx.id();

        if self.nobroadcast {
            info!(%tx_id, "nobroadcast set, returning the signed transaction unsent");
            return Ok(BroadcastOutcome::NotBroadcast(tx));
        }

        info!(%tx_id, blocking = ?self.blocking, "broadcasting transaction");
        match self.blocking {
            BlockingMode::None => {
                self.policy
                    .write("broadcast_transaction", self.node.broadcast_transaction(&tx))
                    .await
                    .map_err(broadcast_error)?;
                Ok(BroadcastOutcome::Sent { tx_id })
            }
            BlockingMode::Head => {
                let confirmation = self.broadcast_synchronous(&tx).await?;
                Ok(BroadcastOutcome::Included { tx_id, confirmation })
            }
            BlockingMode::Irreversible => {
                let confirmation = self.broadcast_synchronous(&tx).await?;
                self.wait_irreversible(confirmation.block_num).await?;
                Ok(BroadcastOutcome::Irreversible { tx_id, confirmation })
            }
        }
    }

    async fn broadcast_synchronous(&self, tx: &Transaction) -> Result<BroadcastConfirmation, TransactionError> {
        let confirmation = self
            .policy
            .write(
                "broadcast_transaction_synchronous",
                self.node.broadcast_transaction_synchronous(tx),
            )
            .await
            .map_err(broadcast_error)?;
        info!(tx_id = %confirmation.id, block_num = confirmation.block_num, "transaction included");
        Ok(confirmation)
    }

    /// Polls the chain tip until `block_num` is irreversible.
    async fn wait_irreversible(&self, block_num: u32) -> Result<(), TransactionError> {
        let node = Arc::clone(&self.node);
        let poll = async {
            loop {
                let props = self
                    .policy
                    .read("get_dynamic_global_properties", || node.get_dynamic_global_properties())
                    .await?;
                if props.last_irreversible_block_num >= block_num {
                    return Ok::<_, TransactionError>(());
                }
                tokio::time::sleep(IRREVERSIBLE_POLL_INTERVAL).await;
            }
        };
        match tokio::time::timeout(IRREVERSIBLE_WAIT_LIMIT, poll).await {
            Ok(result) => {
                result?;
                info!(block_num, "block irreversible");
                Ok(())
            }
            Err(_) => Err(TransactionError::Timeout {
                method: "wait_for_irreversible".to_string(),
                after: IRREVERSIBLE_WAIT_LIMIT,
            }),
        }
    }

    // -- helpers ----------------------------------------------------------

    fn ensure_live(&self, action: &'static str) -> Result<(), TransactionError> {
        if self.state == BuilderState::Discarded {
            return Err(self.invalid(action));
        }
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> TransactionError {
        TransactionError::InvalidState {
            action,
            state: self.state.to_string(),
        }
    }
}

fn broadcast_error(err: NodeError) -> TransactionError {
    match err {
        NodeError::Timeout { method, after } => TransactionError::Timeout { method, after },
        other => TransactionError::Broadcast(other),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::network::memory::synthetic_block_id;
    use crate::network::InMemoryNode;
    use crate::operations::Transfer;
    use crate::transaction::verify_signed_by;
    use crate::types::{Account, AccountOptions, AssetAmount, Authority, Extensions, TimePointSec};
    use crate::vault::InMemoryKeyStore;

    fn alice() -> PrivateKey {
        PrivateKey::from_seed("alice").unwrap()
    }

    fn transfer(amount: i64) -> Operation {
        Transfer {
            fee: AssetAmount::zero(),
            from: AccountId(7),
            to: AccountId(8),
            amount: AssetAmount::new(amount, AssetId::CORE),
            memo: None,
            extensions: Extensions,
        }
        .into()
    }

    fn node() -> Arc<InMemoryNode> {
        let node = InMemoryNode::bitshares();
        let auth = Authority::single_key(alice().public_key());
        node.add_account(Account {
            id: AccountId(7),
            name: "alice".into(),
            owner: auth.clone(),
            active: auth,
            options: AccountOptions::new(alice().public_key()),
        });
        Arc::new(node)
    }

    fn builder(node: &Arc<InMemoryNode>, config: ClientConfig) -> TransactionBuilder {
        let keys = Arc::new(InMemoryKeyStore::with_keys([alice()]));
        // Thirty seconds before the fixture's expiration.
        let clock = Arc::new(FixedClock::new("2016-04-06T08:28:57".parse().unwrap()));
        TransactionBuilder::new(node.clone(), keys, ChainParams::bitshares())
            .configure(&config)
            .unwrap()
            .with_clock(clock)
    }

    #[tokio::test]
    async fn test_construct_binds_fixture_fields() {
        let node = node();
        let mut b = builder(&node, ClientConfig::default());
        assert_eq!(b.state(), BuilderState::Empty);
        b.append_ops([transfer(100_000)]).unwrap();
        assert_eq!(b.state(), BuilderState::Constructing);

        let tx = b.construct().await.unwrap();
        assert_eq!(
            hex::encode(tx.signable_bytes()),
            "f68585abf4dce7c8045701000000000000000000000708a08601000000000000000000"
        );
        assert_eq!(b.state(), BuilderState::FeeResolved);
    }

    #[tokio::test]
    async fn test_sign_and_broadcast() {
        let node = node();
        node.set_fee(0, 100_000);
        let mut b = builder(&node, ClientConfig::default());
        b.append_ops([transfer(5)]).unwrap();
        let resolution = b.append_signer(AccountId(7), Permission::Active).await.unwrap();
        assert!(resolution.is_satisfied());

        b.construct().await.unwrap();
        let tx = b.sign().unwrap().clone();
        assert_eq!(tx.operations[0].fee().amount, 100_000);
        assert_eq!(tx.signatures.len(), 1);
        let chain_id = ChainParams::bitshares().chain_id_bytes().unwrap();
        assert!(verify_signed_by(&tx, &chain_id, &alice().public_key()));
        b.verify_authority().await.unwrap();

        let outcome = b.broadcast().await.unwrap();
        assert_eq!(outcome, BroadcastOutcome::Sent { tx_id: tx.id() });
        assert_eq!(b.state(), BuilderState::Discarded);
        assert_eq!(node.broadcasts(), vec![tx]);
    }

    #[tokio::test]
    async fn test_append_after_signing_drops_signatures() {
        let node = node();
        let mut b = builder(&node, ClientConfig::default());
        b.append_ops([transfer(1)]).unwrap();
        b.append_private_key(alice()).unwrap();
        b.construct().await.unwrap();
        b.sign().unwrap();
        assert_eq!(b.state(), BuilderState::Signed);

        b.append_ops([transfer(2)]).unwrap();
        assert_eq!(b.state(), BuilderState::Constructing);
        assert!(b.transaction().is_none());
        assert!(matches!(b.sign(), Err(TransactionError::InvalidState { .. })));

        let tx = b.construct().await.unwrap();
        assert_eq!(tx.operations.len(), 2);
        assert!(!tx.is_signed());
    }

    #[tokio::test]
    async fn test_sign_without_keys_is_missing_key() {
        let node = node();
        let mut b = TransactionBuilder::new(node.clone(), Arc::new(InMemoryKeyStore::new()), ChainParams::bitshares());
        b.append_ops([transfer(1)]).unwrap();
        b.construct().await.unwrap();
        let before = b.transaction().cloned();
        assert!(matches!(b.sign(), Err(TransactionError::MissingKey(_))));
        assert_eq!(b.state(), BuilderState::FeeResolved);
        assert_eq!(b.transaction().cloned(), before);
    }

    #[tokio::test]
    async fn test_empty_builder_has_nothing_to_do() {
        let node = node();
        let mut b = builder(&node, ClientConfig::default());
        assert!(matches!(b.construct().await, Err(TransactionError::NoOperations)));
        assert!(matches!(b.broadcast().await, Err(TransactionError::NoOperations)));
        assert!(node.calls().is_empty());
    }

    #[tokio::test]
    async fn test_nobroadcast_hands_back_signed_tx() {
        let node = node();
        let config = ClientConfig {
            nobroadcast: true,
            ..ClientConfig::default()
        };
        let mut b = builder(&node, config);
        b.append_ops([transfer(1)]).unwrap();
        b.append_signer(AccountId(7), Permission::Active).await.unwrap();

        match b.broadcast().await.unwrap() {
            BroadcastOutcome::NotBroadcast(tx) => assert_eq!(tx.signatures.len(), 1),
            other => panic!("expected NotBroadcast, got {other:?}"),
        }
        assert!(node.broadcasts().is_empty());
        assert_eq!(b.state(), BuilderState::Discarded);
        assert!(matches!(b.append_ops([transfer(1)]), Err(TransactionError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_blocking_head_waits_for_inclusion() {
        let node = node();
        let config = ClientConfig {
            blocking: BlockingMode::Head,
            ..ClientConfig::default()
        };
        let mut b = builder(&node, config);
        b.append_ops([transfer(1)]).unwrap();
        b.append_private_key(alice()).unwrap();
        match b.broadcast().await.unwrap() {
            BroadcastOutcome::Included { confirmation, .. } => assert_eq!(confirmation.block_num, 34295),
            other => panic!("expected Included, got {other:?}"),
        }
        assert_eq!(node.call_count("broadcast_transaction_synchronous"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocking_irreversible_polls_until_final() {
        let node = node();
        node.set_auto_finalize(false);
        let config = ClientConfig {
            blocking: BlockingMode::Irreversible,
            ..ClientConfig::default()
        };
        let mut b = builder(&node, config);
        b.append_ops([transfer(1)]).unwrap();
        b.append_private_key(alice()).unwrap();

        let finalizer = {
            let node = node.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(10)).await;
                node.set_last_irreversible(34295);
            })
        };
        let outcome = b.broadcast().await.unwrap();
        finalizer.await.unwrap();
        assert!(matches!(outcome, BroadcastOutcome::Irreversible { .. }));
        assert!(node.call_count("get_dynamic_global_properties") > 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_irreversible_wait_gives_up() {
        let node = node();
        node.set_auto_finalize(false);
        let config = ClientConfig {
            blocking: BlockingMode::Irreversible,
            ..ClientConfig::default()
        };
        let mut b = builder(&node, config);
        b.append_ops([transfer(1)]).unwrap();
        b.append_private_key(alice()).unwrap();
        let err = b.broadcast().await.unwrap_err();
        assert!(matches!(err, TransactionError::Timeout { ref method, .. } if method == "wait_for_irreversible"));
        // Landed, just not final: exactly one send.
        assert_eq!(node.broadcasts().len(), 1);
    }

    #[tokio::test]
    async fn test_irreversible_reference_block() {
        let node = node();
        let config = ClientConfig {
            ref_block: RefBlockSource::Irreversible,
            ..ClientConfig::default()
        };
        let mut b = builder(&node, config);
        b.append_ops([transfer(1)]).unwrap();
        let tx = b.construct().await.unwrap();
        let (num, prefix) = ref_block_fields(&synthetic_block_id(34280)).unwrap();
        assert_eq!((tx.ref_block_num, tx.ref_block_prefix), (num, prefix));
        assert_eq!(tx.ref_block_num, 34280);
    }

    #[tokio::test]
    async fn test_failed_broadcast_is_not_retried() {
        let node = node();
        node.fail_next("broadcast_transaction", NodeError::Transport("reset".into()));
        let mut b = builder(&node, ClientConfig::default());
        b.append_ops([transfer(1)]).unwrap();
        b.append_private_key(alice()).unwrap();
        let err = b.broadcast().await.unwrap_err();
        assert!(matches!(err, TransactionError::Broadcast(NodeError::Transport(_))));
        assert_eq!(node.call_count("broadcast_transaction"), 1);
        assert_eq!(b.state(), BuilderState::Discarded);
    }

    #[tokio::test]
    async fn test_insufficient_authority() {
        let node = node();
        node.set_authority_ok(false);
        let mut b = builder(&node, ClientConfig::default());
        b.append_ops([transfer(1)]).unwrap();
        b.append_private_key(alice()).unwrap();
        assert!(matches!(b.verify_authority().await, Err(TransactionError::InvalidState { .. })));
        b.construct().await.unwrap();
        b.sign().unwrap();
        assert!(matches!(
            b.verify_authority().await,
            Err(TransactionError::InsufficientAuthority)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_node_times_out() {
        let node = node();
        node.set_latency(Some(Duration::from_secs(60)));
        let mut b = builder(&node, ClientConfig::default());
        b.append_ops([transfer(1)]).unwrap();
        let err = b.construct().await.unwrap_err();
        assert!(matches!(err, TransactionError::Timeout { ref method, .. } if method == "get_required_fees"));
        assert_eq!(b.state(), BuilderState::Constructing);
    }

    #[tokio::test]
    async fn test_proposal_expiration_from_clock() {
        let node = node();
        let mut b = builder(&node, ClientConfig::default());
        let mut proposal = ProposalBuilder::new(AccountId(7)).with_expiration(Duration::from_secs(3600));
        proposal.append_ops([transfer(1)]);
        b.append_proposal(proposal).unwrap();
        match &b.operations()[0] {
            Operation::ProposalCreate(p) => {
                let start: TimePointSec = "2016-04-06T08:28:57".parse().unwrap();
                assert_eq!(p.expiration_time, start.saturating_add(Duration::from_secs(3600)));
            }
            other => panic!("expected proposal_create, got {}", other.name()),
        }
    }
}
