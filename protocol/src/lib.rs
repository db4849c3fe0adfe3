// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Graphene Protocol — Transaction Client Library
//!
//! Everything a wallet or bot needs to talk to a Graphene-family
//! delegated-proof-of-stake chain (BitShares and its forks) *as a client*:
//! build operations, pay their fees, find out which keys must sign, sign,
//! encrypt memos, and hand the result to a node.
//!
//! The part that has to be exactly right is the binary encoding. The node
//! re-serializes every transaction it receives and checks the signatures
//! against *its* bytes, so a single misplaced byte here shows up as
//! "missing required active authority" with no further explanation.
//!
//! ## Architecture
//!
//! - **codec** — The canonical wire encoding. Varints, fixed ints, strings.
//! - **types** — Ids, amounts, authorities, account and asset options.
//! - **operations** — The operation catalog and its static registry.
//! - **crypto** — secp256k1 keys, compact signatures, hashes, AES.
//! - **memo** — ECDH + AES-256-CBC memo encryption.
//! - **vault** — Key stores, including a passphrase-encrypted one.
//! - **network** — The node interface, a JSON-RPC adapter, an in-memory node.
//! - **resolver** — Who has to sign: recursive weighted-threshold walk.
//! - **transaction** — Builder state machine, fees, proposals, signing.
//! - **client** — The explicit handle tying node, keys and settings together.
//! - **config** — Protocol constants, chain presets, client settings.
//! - **logging** / **clock** — Ambient plumbing.
//!
//! ## Design Philosophy
//!
//! 1. Field order is declared once per type and never inferred.
//! 2. No global state. The [`client::Client`] is passed where it is needed.
//! 3. Broadcasts are never retried behind the caller's back.
//! 4. If it changes bytes that get signed, it has a known-answer test.

#[macro_use]
mod macros;

pub mod client;
pub mod clock;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod logging;
pub mod memo;
pub mod network;
pub mod operations;
pub mod resolver;
pub mod transaction;
pub mod types;
pub mod vault;
