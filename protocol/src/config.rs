//! # Protocol Configuration & Constants
//!
//! Every magic number the client needs lives here. If you're hardcoding a
//! chain id somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Two kinds of things live in this file:
//!
//! - **Protocol constants**: fixed by the node's consensus code. Changing
//!   them does not change the chain; it just makes every signature we
//!   produce invalid.
//! - **Client configuration**: [`ChainParams`] and [`ClientConfig`], the
//!   knobs an embedding application turns (which network, which node, how
//!   eagerly to broadcast).

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// BitShares mainnet chain id. Every signing digest starts with these bytes.
pub const BITSHARES_CHAIN_ID: &str =
    "4018d7844c78f6a6c41c6a552b898022310fc5dec06da467ee7905a8dad512c8";

/// Public testnet chain id.
pub const TESTNET_CHAIN_ID: &str =
    "39f5e2ede1f8bc1a3a54a7914414e3779e33193f1f5693510e73cb7a87617447";

/// Address prefix used on mainnet (`BTS6MRy...`).
pub const BITSHARES_ADDRESS_PREFIX: &str = "BTS";

/// Address prefix used on the public testnet.
pub const TESTNET_ADDRESS_PREFIX: &str = "TEST";

/// Prefix of the bare Graphene reference chain. Still seen in genesis files.
pub const GRAPHENE_ADDRESS_PREFIX: &str = "GPH";

/// What a decoded public key gets tagged with when nobody says otherwise.
pub const DEFAULT_ADDRESS_PREFIX: &str = BITSHARES_ADDRESS_PREFIX;

/// Prefixes accepted when parsing key and address strings. Order matters:
/// longer prefixes that share a leading character would need to come first.
pub const KNOWN_ADDRESS_PREFIXES: &[&str] = &[
    BITSHARES_ADDRESS_PREFIX,
    TESTNET_ADDRESS_PREFIX,
    GRAPHENE_ADDRESS_PREFIX,
];

// ---------------------------------------------------------------------------
// Object Model
// ---------------------------------------------------------------------------

/// Protocol object space (`1.x.y`). Everything an operation references lives here.
pub const PROTOCOL_SPACE: u8 = 1;

/// Implementation object space (`2.x.y`), e.g. dynamic global properties `2.1.0`.
pub const IMPLEMENTATION_SPACE: u8 = 2;

/// The core asset. Fees default to it and every chain has it at `1.3.0`.
pub const CORE_ASSET_ID: &str = "1.3.0";

/// The special "proxy to self" voting account.
pub const PROXY_TO_SELF_ACCOUNT: &str = "1.2.5";

/// `GRAPHENE_100_PERCENT`: percentages on chain are fixed point in 1/100 of a percent.
pub const HUNDRED_PERCENT: u16 = 10_000;

// ---------------------------------------------------------------------------
// Transaction Parameters
// ---------------------------------------------------------------------------

/// Default expiration horizon for a fresh transaction.
/// 30 seconds is ten blocks; long enough to cross a congested node, short
/// enough that a stuck transaction dies before anybody retries it by hand.
pub const DEFAULT_TX_EXPIRATION: Duration = Duration::from_secs(30);

/// Default lifetime of a proposal. Two days gives the other parties a
/// weekend's worth of time to approve.
pub const DEFAULT_PROPOSAL_EXPIRATION: Duration = Duration::from_secs(2 * 24 * 60 * 60);

/// Recursion cap of the authority resolver. Depths 0, 1 and 2 are visited.
/// The node applies the same bound, so raising it here only finds keys the
/// chain would refuse to count.
pub const MAX_AUTHORITY_DEPTH: u8 = 2;

/// Graphene uses `27 + 4` as the recovery header for compressed keys.
pub const SIGNATURE_RECOVERY_OFFSET: u8 = 27 + 4;

/// Length of a serialized recoverable signature: header + r + s.
pub const SIGNATURE_LENGTH: usize = 65;

/// Length of a compressed secp256k1 public key.
pub const PUBLIC_KEY_LENGTH: usize = 33;

/// Length of the RIPEMD160-based address.
pub const ADDRESS_LENGTH: usize = 20;

/// Transaction ids are the first 20 bytes of `SHA256(tx)`.
pub const TRANSACTION_ID_LENGTH: usize = 20;

/// How many nonce bumps we try before giving up on a canonical signature.
/// In practice one in four signatures is non-canonical, so hitting this
/// limit means something is broken, not unlucky.
pub const MAX_CANONICAL_SIGNING_ATTEMPTS: u32 = 256;

// ---------------------------------------------------------------------------
// Key Storage
// ---------------------------------------------------------------------------

/// WIF version byte for secp256k1 private keys.
pub const WIF_VERSION: u8 = 0x80;

/// Checksum length for WIF, public key and address strings.
pub const CHECKSUM_LENGTH: usize = 4;

/// scrypt cost exponent used by BIP38 (N = 2^14).
pub const BIP38_SCRYPT_LOG_N: u8 = 14;

/// scrypt block size used by BIP38.
pub const BIP38_SCRYPT_R: u32 = 8;

/// scrypt parallelism used by BIP38.
pub const BIP38_SCRYPT_P: u32 = 8;

/// Hex characters of SHA256(master) stored in front of the encrypted master.
pub const MASTER_CHECKSUM_HEX_LEN: usize = 4;

// ---------------------------------------------------------------------------
// RPC
// ---------------------------------------------------------------------------

/// Default node endpoint. Any public BitShares API node speaks the same
/// `call` dialect.
pub const DEFAULT_NODE_URL: &str = "http://127.0.0.1:8090/rpc";

/// Per-call timeout. A node that can't answer a fee query in ten seconds is
/// not a node you want to broadcast through.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra attempts for read-only calls. Broadcasts never get any.
pub const DEFAULT_READ_RETRIES: u32 = 2;

/// Pause between read retries.
pub const READ_RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// How often to poll the last irreversible block while waiting for a
/// broadcast to become final.
pub const IRREVERSIBLE_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Give up waiting for irreversibility after this long.
pub const IRREVERSIBLE_WAIT_LIMIT: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// Chain parameters
// ---------------------------------------------------------------------------

/// Network-specific constants that disambiguate signing digests and key
/// strings across chains sharing the same protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    /// Hex chain id, prepended (as raw bytes) to every signing digest.
    pub chain_id: String,
    /// Address prefix for keys and addresses.
    pub prefix: String,
    /// Symbol of the core asset, only used for display.
    pub core_symbol: String,
}

impl ChainParams {
    /// Mainnet parameters.
    pub fn bitshares() -> Self {
        Self {
            chain_id: BITSHARES_CHAIN_ID.to_string(),
            prefix: BITSHARES_ADDRESS_PREFIX.to_string(),
            core_symbol: "BTS".to_string(),
        }
    }

    /// Public testnet parameters.
    pub fn testnet() -> Self {
        Self {
            chain_id: TESTNET_CHAIN_ID.to_string(),
            prefix: TESTNET_ADDRESS_PREFIX.to_string(),
            core_symbol: "TEST".to_string(),
        }
    }

    /// Looks up the preset whose chain id matches, for clients that learn
    /// the chain id from the node.
    pub fn from_chain_id(chain_id: &str) -> Option<Self> {
        [Self::bitshares(), Self::testnet()]
            .into_iter()
            .find(|p| p.chain_id.eq_ignore_ascii_case(chain_id))
    }

    /// Raw chain id bytes. Only fails for hand-built params with corrupt hex.
    pub fn chain_id_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(&self.chain_id)
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::bitshares()
    }
}

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

/// Whether and how `broadcast` waits for the transaction to land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockingMode {
    /// Fire-and-forget `broadcast_transaction`.
    #[default]
    None,
    /// Wait for inclusion in the head block.
    Head,
    /// Wait for inclusion, then until the block is irreversible.
    Irreversible,
}

// The config surface uses `"head" | "irreversible" | false`, so a derived
// enum representation won't do.
impl Serialize for BlockingMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockingMode::None => serializer.serialize_bool(false),
            BlockingMode::Head => serializer.serialize_str("head"),
            BlockingMode::Irreversible => serializer.serialize_str("irreversible"),
        }
    }
}

impl<'de> Deserialize<'de> for BlockingMode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Mode(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Ok(BlockingMode::None),
            // `true` has always meant "wait for the head block".
            Raw::Flag(true) => Ok(BlockingMode::Head),
            Raw::Mode(s) => match s.as_str() {
                "head" => Ok(BlockingMode::Head),
                "irreversible" => Ok(BlockingMode::Irreversible),
                other => Err(serde::de::Error::custom(format!(
                    "unknown blocking mode '{other}', expected \"head\", \"irreversible\" or false"
                ))),
            },
        }
    }
}

/// Which block the transaction's reference-block fields point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefBlockSource {
    /// The current head block. Fast, but a fork can orphan the reference.
    #[default]
    Head,
    /// The block right after the last irreversible one. Survives forks.
    Irreversible,
}

fn default_node() -> String {
    DEFAULT_NODE_URL.to_string()
}

fn default_expiration() -> u64 {
    DEFAULT_TX_EXPIRATION.as_secs()
}

fn default_proposal_expiration() -> u64 {
    DEFAULT_PROPOSAL_EXPIRATION.as_secs()
}

fn default_fee_asset() -> String {
    CORE_ASSET_ID.to_string()
}

fn default_rpc_timeout_ms() -> u64 {
    DEFAULT_RPC_TIMEOUT.as_millis() as u64
}

fn default_read_retries() -> u32 {
    DEFAULT_READ_RETRIES
}

/// The embedding application's configuration object.
///
/// Every field has a default, so `{}` is a valid config that talks to a
/// local node, broadcasts asynchronously and pays fees in the core asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Node RPC endpoint.
    #[serde(default = "default_node")]
    pub node: String,

    /// Build and sign, but hand the transaction back instead of sending it.
    #[serde(default)]
    pub nobroadcast: bool,

    /// Accumulate operations in the client's buffer until `broadcast_bundle`.
    #[serde(default)]
    pub bundle: bool,

    /// How `broadcast` waits for the node.
    #[serde(default)]
    pub blocking: BlockingMode,

    /// Expiration horizon of new transactions, in seconds.
    #[serde(default = "default_expiration")]
    pub expiration: u64,

    /// When set, every operation is wrapped into a proposal paid by this account.
    #[serde(default)]
    pub proposer: Option<String>,

    /// Lifetime of proposals created via `proposer`, in seconds.
    #[serde(default = "default_proposal_expiration")]
    pub proposal_expiration: u64,

    /// Optional review period for proposals created via `proposer`, in seconds.
    #[serde(default)]
    pub proposal_review: Option<u32>,

    /// Asset that fees are quoted in.
    #[serde(default = "default_fee_asset")]
    pub fee_asset: String,

    /// Timeout applied to every RPC round-trip.
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,

    /// Extra attempts for read-only calls.
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,

    /// Reference block policy.
    #[serde(default)]
    pub ref_block: RefBlockSource,
}

impl ClientConfig {
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration)
    }

    pub fn proposal_expiration(&self) -> Duration {
        Duration::from_secs(self.proposal_expiration)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node: default_node(),
            nobroadcast: false,
            bundle: false,
            blocking: BlockingMode::None,
            expiration: default_expiration(),
            proposer: None,
            proposal_expiration: default_proposal_expiration(),
            proposal_review: None,
            fee_asset: default_fee_asset(),
            rpc_timeout_ms: default_rpc_timeout_ms(),
            read_retries: default_read_retries(),
            ref_block: RefBlockSource::Head,
        }
    }
}
