// Serialization & signing benchmarks.
//
// Covers canonical signing of a digest, key recovery, transaction encoding
// and digest computation, and whole-transaction signing with a growing
// number of keys.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use graphene_protocol::config::BITSHARES_CHAIN_ID;
use graphene_protocol::crypto::{recover, sha256, sign_digest, PrivateKey};
use graphene_protocol::memo::encrypt_with_nonce;
use graphene_protocol::operations::{Operation, Transfer};
use graphene_protocol::transaction::{sign_transaction, Transaction};
use graphene_protocol::types::{AccountId, AssetAmount, AssetId, Extensions, TimePointSec};

fn transfer(amount: i64) -> Operation {
    Transfer {
        fee: AssetAmount::new(100_000, AssetId::CORE),
        from: AccountId(7),
        to: AccountId(8),
        amount: AssetAmount::new(amount, AssetId::CORE),
        memo: None,
        extensions: Extensions,
    }
    .into()
}

fn transaction(ops: usize) -> Transaction {
    let ops = (0..ops as i64).map(transfer).collect();
    Transaction::new(34294, 3707022213, TimePointSec(1_459_931_367), ops)
}

fn bench_sign_digest(c: &mut Criterion) {
    let key = PrivateKey::from_seed("alice").unwrap();
    let digest = sha256(b"transfer 1 BTS from alice to bob");

    c.bench_function("secp256k1/sign_canonical", |b| {
        b.iter(|| sign_digest(&key, &digest).unwrap());
    });
}

fn bench_recover(c: &mut Criterion) {
    let key = PrivateKey::from_seed("alice").unwrap();
    let digest = sha256(b"transfer 1 BTS from alice to bob");
    let sig = sign_digest(&key, &digest).unwrap();

    c.bench_function("secp256k1/recover", |b| {
        b.iter(|| recover(&sig, &digest).unwrap());
    });
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction/digest");
    let chain_id = hex::decode(BITSHARES_CHAIN_ID).unwrap();

    for ops in [1usize, 10, 100] {
        let tx = transaction(ops);
        group.throughput(Throughput::Elements(ops as u64));
        group.bench_with_input(BenchmarkId::from_parameter(ops), &tx, |b, tx| {
            b.iter(|| tx.digest(&chain_id));
        });
    }
    group.finish();
}

fn bench_sign_transaction(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction/sign");
    let chain_id = hex::decode(BITSHARES_CHAIN_ID).unwrap();

    for signers in [1usize, 3, 10] {
        let keys: Vec<PrivateKey> = (0..signers)
            .map(|i| PrivateKey::from_seed(&format!("signer-{i}")).unwrap())
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(signers), &keys, |b, keys| {
            b.iter(|| {
                let mut tx = transaction(1);
                sign_transaction(&mut tx, &chain_id, keys).unwrap();
                tx
            });
        });
    }
    group.finish();
}

fn bench_memo(c: &mut Criterion) {
    let alice = PrivateKey::from_seed("alice").unwrap();
    let bob = PrivateKey::from_seed("bob").unwrap().public_key();

    c.bench_function("memo/encrypt", |b| {
        b.iter(|| encrypt_with_nonce(&alice, &bob, 42, "Memo for a transfer").unwrap());
    });
}

criterion_group!(
    benches,
    bench_sign_digest,
    bench_recover,
    bench_encode,
    bench_sign_transaction,
    bench_memo,
);
criterion_main!(benches);
