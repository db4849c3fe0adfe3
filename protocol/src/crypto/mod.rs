//! # Cryptographic Primitives
//!
//! Everything the client does that a node will later check with math:
//! key encodings, hashes, recoverable signatures and the AES modes that
//! memos and wallets are stored with.
//!
//! We deliberately chose boring, well-audited implementations:
//!
//! - **secp256k1** (libsecp256k1 bindings) for keys, ECDSA and ECDH.
//! - **SHA-2 / RIPEMD-160** from RustCrypto for hashing.
//! - **AES-256** (CBC and single-block ECB) from RustCrypto.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin, type-safe wrapper. The only
//! protocol-specific logic is byte layout: checksums, prefixes, the
//! recovery header and the canonical-signature retry loop.

pub mod encryption;
pub mod hash;
pub mod keys;
pub mod signatures;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy.
pub use encryption::{cbc_decrypt, cbc_encrypt, EncryptionError};
pub use hash::{double_sha256, ripemd160, sha256, sha256_concat, sha512};
pub use keys::{Address, KeyError, PrivateKey, PublicKey};
pub use signatures::{recover, recover_with_prefix, sign_digest, verify, CompactSignature, SignatureError};
