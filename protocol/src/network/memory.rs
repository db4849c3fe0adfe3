//! An in-process node for tests and demos.
//!
//! Behaves like a well-mannered node: quotes fees from a table, serves
//! accounts and block headers, records every broadcast instead of applying
//! it, and confirms synchronous broadcasts in the next block. Failures and
//! latency can be injected per method to exercise the client's error paths.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{BlockHeader, BroadcastConfirmation, ChainApi, DynamicGlobalProperties, FeeQuote, NodeError};
use crate::config::BITSHARES_CHAIN_ID;
use crate::crypto::sha256;
use crate::operations::Operation;
use crate::transaction::Transaction;
use crate::types::{Account, AccountId, AssetAmount, AssetId, TimePointSec};

/// Head block the node starts at. Its id yields ref block 34294 / 3707022213.
const GENESIS_HEAD_NUM: u32 = 34294;
const GENESIS_HEAD_ID: &str = "000085f685abf4dc000000000000000000000000";
const GENESIS_TIME: TimePointSec = TimePointSec(1_459_931_340);
const GENESIS_IRREVERSIBLE_NUM: u32 = 34280;

/// A deterministic block id for `num`: the number, big-endian, followed by
/// 16 bytes of `SHA256(num)`.
pub fn synthetic_block_id(num: u32) -> String {
    format!("{num:08x}{}", hex::encode(&sha256(&num.to_be_bytes())[..16]))
}

struct NodeState {
    chain_id: String,
    default_fee: i64,
    fees: HashMap<u16, i64>,
    accounts: HashMap<AccountId, Account>,
    props: DynamicGlobalProperties,
    headers: HashMap<u32, BlockHeader>,
    block_ids: HashMap<u32, String>,
    broadcasts: Vec<Transaction>,
    failures: HashMap<String, VecDeque<NodeError>>,
    latency: Option<Duration>,
    calls: Vec<String>,
    authority_ok: bool,
    auto_finalize: bool,
}

impl NodeState {
    fn block_id(&self, num: u32) -> String {
        self.block_ids
            .get(&num)
            .cloned()
            .unwrap_or_else(|| synthetic_block_id(num))
    }

    fn push_head(&mut self, num: u32) {
        let id = synthetic_block_id(num);
        self.block_ids.insert(num, id.clone());
        self.props.head_block_number = num;
        self.props.head_block_id = id;
    }

    fn quote(&self, op: &Operation, fee_asset: AssetId) -> FeeQuote {
        let amount = self.fees.get(&op.id()).copied().unwrap_or(self.default_fee);
        let fee = AssetAmount::new(amount, fee_asset);
        match op.proposed_ops() {
            Some(inner) => FeeQuote::Nested((
                fee,
                inner.iter().map(|w| self.quote(&w.op, fee_asset)).collect(),
            )),
            None => FeeQuote::Single(fee),
        }
    }
}

/// Scripted node implementing [`ChainApi`].
pub struct InMemoryNode {
    state: Mutex<NodeState>,
}

impl InMemoryNode {
    /// A node on `chain_id` with every fee zero and no accounts.
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(NodeState {
                chain_id: chain_id.into(),
                default_fee: 0,
                fees: HashMap::new(),
                accounts: HashMap::new(),
                props: DynamicGlobalProperties {
                    head_block_number: GENESIS_HEAD_NUM,
                    head_block_id: GENESIS_HEAD_ID.to_string(),
                    time: GENESIS_TIME,
                    last_irreversible_block_num: GENESIS_IRREVERSIBLE_NUM,
                },
                headers: HashMap::new(),
                block_ids: HashMap::from([(GENESIS_HEAD_NUM, GENESIS_HEAD_ID.to_string())]),
                broadcasts: Vec::new(),
                failures: HashMap::new(),
                latency: None,
                calls: Vec::new(),
                authority_ok: true,
                auto_finalize: true,
            }),
        }
    }

    /// A mainnet node.
    pub fn bitshares() -> Self {
        Self::new(BITSHARES_CHAIN_ID)
    }

    // -- scripting --------------------------------------------------------

    /// Fee charged for operations without an entry of their own.
    pub fn set_default_fee(&self, amount: i64) {
        self.state.lock().default_fee = amount;
    }

    pub fn set_fee(&self, op_id: u16, amount: i64) {
        self.state.lock().fees.insert(op_id, amount);
    }

    pub fn add_account(&self, account: Account) {
        self.state.lock().accounts.insert(account.id, account);
    }

    /// Moves the chain tip. The new block id is derived from the number.
    pub fn set_head(&self, num: u32) {
        self.state.lock().push_head(num);
    }

    pub fn set_last_irreversible(&self, num: u32) {
        self.state.lock().props.last_irreversible_block_num = num;
    }

    pub fn insert_header(&self, num: u32, header: BlockHeader) {
        self.state.lock().headers.insert(num, header);
    }

    /// The next call to `method` fails with `error`. Queues if called again.
    pub fn fail_next(&self, method: &str, error: NodeError) {
        self.state
            .lock()
            .failures
            .entry(method.to_string())
            .or_default()
            .push_back(error);
    }

    /// Delay applied before every call is answered.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().latency = latency;
    }

    /// Answer of `verify_authority` for signed transactions.
    pub fn set_authority_ok(&self, ok: bool) {
        self.state.lock().authority_ok = ok;
    }

    /// Whether a synchronous broadcast also makes its block irreversible.
    pub fn set_auto_finalize(&self, on: bool) {
        self.state.lock().auto_finalize = on;
    }

    // -- inspection -------------------------------------------------------

    /// Every transaction broadcast so far, in order.
    pub fn broadcasts(&self) -> Vec<Transaction> {
        self.state.lock().broadcasts.clone()
    }

    /// Method names of every call received, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state.lock().calls.iter().filter(|m| *m == method).count()
    }

    pub fn head_block_number(&self) -> u32 {
        self.state.lock().props.head_block_number
    }

    // -- plumbing ---------------------------------------------------------

    /// Applies latency, logs the call and pops an injected failure.
    async fn enter(&self, method: &str) -> Result<(), NodeError> {
        let latency = self.state.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.state.lock();
        state.calls.push(method.to_string());
        match state.failures.get_mut(method).and_then(|q| q.pop_front()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn reject_unsigned(tx: &Transaction) -> Result<(), NodeError> {
        if tx.is_signed() {
            Ok(())
        } else {
            Err(NodeError::Rpc {
                code: 1,
                message: "missing required authority: transaction carries no signatures".to_string(),
            })
        }
    }
}

impl Default for InMemoryNode {
    fn default() -> Self {
        Self::bitshares()
    }
}

#[async_trait]
impl ChainApi for InMemoryNode {
    async fn get_chain_id(&self) -> Result<String, NodeError> {
        self.enter("get_chain_id").await?;
        Ok(self.state.lock().chain_id.clone())
    }

    async fn get_required_fees(&self, ops: &[Operation], fee_asset: AssetId) -> Result<Vec<FeeQuote>, NodeError> {
        self.enter("get_required_fees").await?;
        let state = self.state.lock();
        Ok(ops.iter().map(|op| state.quote(op, fee_asset)).collect())
    }

    async fn get_dynamic_global_properties(&self) -> Result<DynamicGlobalProperties, NodeError> {
        self.enter("get_dynamic_global_properties").await?;
        Ok(self.state.lock().props.clone())
    }

    async fn get_block_header(&self, block_num: u32) -> Result<Option<BlockHeader>, NodeError> {
        self.enter("get_block_header").await?;
        let state = self.state.lock();
        if let Some(header) = state.headers.get(&block_num) {
            return Ok(Some(header.clone()));
        }
        if block_num == 0 || block_num > state.props.head_block_number {
            return Ok(None);
        }
        Ok(Some(BlockHeader {
            previous: state.block_id(block_num - 1),
            timestamp: state.props.time,
            witness: None,
        }))
    }

    async fn get_accounts(&self, ids: &[AccountId]) -> Result<Vec<Option<Account>>, NodeError> {
        self.enter("get_accounts").await?;
        let state = self.state.lock();
        Ok(ids.iter().map(|id| state.accounts.get(id).cloned()).collect())
    }

    async fn get_account_by_name(&self, name: &str) -> Result<Option<Account>, NodeError> {
        self.enter("get_account_by_name").await?;
        let state = self.state.lock();
        Ok(state.accounts.values().find(|a| a.name == name).cloned())
    }

    async fn broadcast_transaction(&self, tx: &Transaction) -> Result<(), NodeError> {
        self.enter("broadcast_transaction").await?;
        Self::reject_unsigned(tx)?;
        self.state.lock().broadcasts.push(tx.clone());
        Ok(())
    }

    async fn broadcast_transaction_synchronous(&self, tx: &Transaction) -> Result<BroadcastConfirmation, NodeError> {
        self.enter("broadcast_transaction_synchronous").await?;
        Self::reject_unsigned(tx)?;
        let mut state = self.state.lock();
        state.broadcasts.push(tx.clone());

        // The transaction lands alone in the next block.
        let block_num = state.props.head_block_number + 1;
        state.push_head(block_num);
        state.props.time = state.props.time.saturating_add(Duration::from_secs(3));
        if state.auto_finalize {
            state.props.last_irreversible_block_num = block_num;
        }
        Ok(BroadcastConfirmation {
            id: tx.id(),
            block_num,
            trx_num: 0,
        })
    }

    async fn verify_authority(&self, tx: &Transaction) -> Result<bool, NodeError> {
        self.enter("verify_authority").await?;
        Ok(self.state.lock().authority_ok && tx.is_signed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ref_block_fields;
    use crate::operations::{OpWrapper, ProposalCreate, Transfer};
    use crate::types::Extensions;

    fn transfer() -> Operation {
        Transfer {
            fee: AssetAmount::zero(),
            from: AccountId(7),
            to: AccountId(8),
            amount: AssetAmount::new(1, AssetId::CORE),
            memo: None,
            extensions: Extensions,
        }
        .into()
    }

    #[tokio::test]
    async fn test_fee_table_and_nesting() {
        let node = InMemoryNode::bitshares();
        node.set_default_fee(7);
        node.set_fee(0, 100_000);
        let proposal: Operation = ProposalCreate {
            fee: AssetAmount::zero(),
            fee_paying_account: AccountId(7),
            expiration_time: TimePointSec(0),
            proposed_ops: vec![OpWrapper::from(transfer())],
            review_period_seconds: None,
            extensions: Extensions,
        }
        .into();

        let quotes = node
            .get_required_fees(&[transfer(), proposal], AssetId(121))
            .await
            .unwrap();
        assert_eq!(quotes[0], FeeQuote::Single(AssetAmount::new(100_000, AssetId(121))));
        assert_eq!(
            quotes[1],
            FeeQuote::Nested((
                AssetAmount::new(7, AssetId(121)),
                vec![FeeQuote::Single(AssetAmount::new(100_000, AssetId(121)))]
            ))
        );
    }

    #[tokio::test]
    async fn test_genesis_head_yields_fixture_ref_block() {
        let node = InMemoryNode::bitshares();
        let props = node.get_dynamic_global_properties().await.unwrap();
        assert_eq!(
            ref_block_fields(&props.head_block_id).unwrap(),
            (34294, 3_707_022_213)
        );
        node.set_head(40_000);
        let header = node.get_block_header(34_295).await.unwrap().unwrap();
        assert_eq!(header.previous, GENESIS_HEAD_ID);
        let header = node.get_block_header(40_000).await.unwrap().unwrap();
        assert_eq!(header.previous, synthetic_block_id(39_999));
        assert!(node.get_block_header(40_001).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed_in_order() {
        let node = InMemoryNode::bitshares();
        node.fail_next("get_chain_id", NodeError::Transport("reset".into()));
        assert!(node.get_chain_id().await.is_err());
        assert_eq!(node.get_chain_id().await.unwrap(), BITSHARES_CHAIN_ID);
        assert_eq!(node.call_count("get_chain_id"), 2);
    }

    #[tokio::test]
    async fn test_unsigned_broadcast_is_rejected() {
        let node = InMemoryNode::bitshares();
        let tx = Transaction::new(1, 2, TimePointSec(3), vec![transfer()]);
        assert!(matches!(
            node.broadcast_transaction(&tx).await,
            Err(NodeError::Rpc { .. })
        ));
        assert!(node.broadcasts().is_empty());
        assert!(!node.verify_authority(&tx).await.unwrap());
    }

    #[test]
    fn test_synthetic_ids_carry_their_number() {
        let id = synthetic_block_id(0x0102_0304);
        assert_eq!(id.len(), 40);
        assert!(id.starts_with("01020304"));
    }
}
