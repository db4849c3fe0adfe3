//! Proposal assembly.
//!
//! A proposal asks the chain to hold a set of operations until every
//! authority they need has approved. The proposer only pays the fee; their
//! signature is not an approval of the contents.

use std::time::Duration;

use super::TransactionError;
use crate::config::DEFAULT_PROPOSAL_EXPIRATION;
use crate::operations::{OpWrapper, Operation, ProposalCreate};
use crate::types::{AccountId, AssetAmount, Extensions, TimePointSec};

/// Collects operations to be wrapped into one `proposal_create`.
#[derive(Debug, Clone)]
pub struct ProposalBuilder {
    proposer: AccountId,
    expiration: Duration,
    review_period: Option<u32>,
    ops: Vec<Operation>,
}

impl ProposalBuilder {
    /// An empty proposal paid for by `proposer`, expiring after the default
    /// two days.
    pub fn new(proposer: AccountId) -> Self {
        Self {
            proposer,
            expiration: DEFAULT_PROPOSAL_EXPIRATION,
            review_period: None,
            ops: Vec::new(),
        }
    }

    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    /// Review period in seconds. Required when the proposal touches
    /// committee-controlled accounts.
    pub fn with_review_period(mut self, seconds: u32) -> Self {
        self.review_period = Some(seconds);
        self
    }

    pub fn append_ops(&mut self, ops: impl IntoIterator<Item = Operation>) -> &mut Self {
        for mut op in ops {
            op.normalize();
            self.ops.push(op);
        }
        self
    }

    pub fn proposer(&self) -> AccountId {
        self.proposer
    }

    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The `proposal_create` operation, expiring `expiration` after `now`.
    pub fn build(&self, now: TimePointSec) -> Result<ProposalCreate, TransactionError> {
        if self.ops.is_empty() {
            return Err(TransactionError::NoOperations);
        }
        Ok(ProposalCreate {
            fee: AssetAmount::zero(),
            fee_paying_account: self.proposer,
            expiration_time: now.saturating_add(self.expiration),
            proposed_ops: self.ops.iter().cloned().map(OpWrapper::from).collect(),
            review_period_seconds: self.review_period,
            extensions: Extensions,
        })
    }

    /// [`build`](Self::build), as an [`Operation`].
    pub fn into_operation(self, now: TimePointSec) -> Result<Operation, TransactionError> {
        Ok(self.build(now)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::Transfer;
    use crate::types::AssetId;

    fn transfer() -> Operation {
        Transfer {
            fee: AssetAmount::zero(),
            from: AccountId(7),
            to: AccountId(8),
            amount: AssetAmount::new(5, AssetId::CORE),
            memo: None,
            extensions: Extensions,
        }
        .into()
    }

    #[test]
    fn test_defaults_to_two_days() {
        let mut p = ProposalBuilder::new(AccountId(7));
        p.append_ops([transfer(), transfer()]);
        let op = p.build(TimePointSec(1_000)).unwrap();
        assert_eq!(op.fee_paying_account, AccountId(7));
        assert_eq!(op.expiration_time, TimePointSec(1_000 + 2 * 24 * 3600));
        assert_eq!(op.proposed_ops.len(), 2);
        assert_eq!(op.review_period_seconds, None);
    }

    #[test]
    fn test_review_period_and_expiration_overrides() {
        let mut p = ProposalBuilder::new(AccountId(7))
            .with_expiration(Duration::from_secs(60))
            .with_review_period(3600);
        p.append_ops([transfer()]);
        let op = p.into_operation(TimePointSec(10)).unwrap();
        match op {
            Operation::ProposalCreate(p) => {
                assert_eq!(p.expiration_time, TimePointSec(70));
                assert_eq!(p.review_period_seconds, Some(3600));
            }
            other => panic!("expected proposal_create, got {}", other.name()),
        }
    }

    #[test]
    fn test_empty_proposal_is_refused() {
        let p = ProposalBuilder::new(AccountId(7));
        assert!(p.is_empty());
        assert!(matches!(p.build(TimePointSec(0)), Err(TransactionError::NoOperations)));
    }
}
