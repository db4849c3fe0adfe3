//! Local checks run before an operation goes anywhere near the node.
//!
//! These catch what can be caught without chain state: impossible
//! authorities, unbacked vote counts, empty proposals, self-transfers.
//! Anything needing balances or permissions is left to the node.

use super::{Operation, OperationError};
use crate::types::AuthorityError;

impl Operation {
    /// Rejects any authority this operation would create or install that
    /// could never be satisfied. Recurses into proposals.
    pub fn check_authorities(&self) -> Result<(), AuthorityError> {
        match self {
            Operation::AccountCreate(op) => {
                op.owner.validate()?;
                op.active.validate()?;
            }
            Operation::AccountUpdate(op) => {
                if let Some(owner) = &op.owner {
                    owner.validate()?;
                }
                if let Some(active) = &op.active {
                    active.validate()?;
                }
            }
            Operation::ProposalCreate(op) => {
                for wrapped in &op.proposed_ops {
                    wrapped.op.check_authorities()?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Shape checks that need no chain state.
    pub fn validate(&self) -> Result<(), OperationError> {
        self.check_authorities()?;

        let operation = self.name();
        let invalid = |reason: String| OperationError::Invalid { operation, reason };

        match self {
            Operation::Transfer(op) => {
                if op.amount.amount <= 0 {
                    return Err(invalid("amount must be positive".into()));
                }
                if op.from == op.to {
                    return Err(invalid(format!("{} cannot transfer to itself", op.from)));
                }
            }
            Operation::OverrideTransfer(op) => {
                if op.amount.amount <= 0 {
                    return Err(invalid("amount must be positive".into()));
                }
                if op.from == op.to {
                    return Err(invalid(format!("{} cannot transfer to itself", op.from)));
                }
            }
            Operation::LimitOrderCreate(op) => {
                if op.amount_to_sell.amount <= 0 || op.min_to_receive.amount <= 0 {
                    return Err(invalid("both sides of the order must be positive".into()));
                }
                if op.amount_to_sell.asset_id == op.min_to_receive.asset_id {
                    return Err(invalid("cannot trade an asset for itself".into()));
                }
            }
            Operation::AccountCreate(op) => {
                if op.name.is_empty() {
                    return Err(invalid("account name is empty".into()));
                }
                op.options.validate().map_err(invalid)?;
            }
            Operation::AccountUpdate(op) => {
                if op.owner.is_none() && op.active.is_none() && op.new_options.is_none() {
                    return Err(invalid("nothing to update".into()));
                }
                if let Some(options) = &op.new_options {
                    options.validate().map_err(invalid)?;
                }
            }
            Operation::AssetCreate(op) => {
                if op.symbol.is_empty() {
                    return Err(invalid("asset symbol is empty".into()));
                }
                op.common_options.validate().map_err(invalid)?;
            }
            Operation::AssetUpdate(op) => {
                op.new_options.validate().map_err(invalid)?;
            }
            Operation::AssetIssue(op) if op.asset_to_issue.amount <= 0 => {
                return Err(invalid("amount must be positive".into()));
            }
            Operation::AssetReserve(op) if op.amount_to_reserve.amount <= 0 => {
                return Err(invalid("amount must be positive".into()));
            }
            Operation::HtlcCreate(op) if op.amount.amount <= 0 => {
                return Err(invalid("amount must be positive".into()));
            }
            Operation::ProposalCreate(op) => {
                if op.proposed_ops.is_empty() {
                    return Err(invalid("a proposal needs at least one operation".into()));
                }
                for wrapped in &op.proposed_ops {
                    wrapped.op.validate()?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Sorts and deduplicates every set-typed field so that equal sets encode
    /// to equal bytes. The builder runs this on every appended operation.
    pub fn normalize(&mut self) {
        fn set<T: Ord>(values: &mut Vec<T>) {
            values.sort();
            values.dedup();
        }

        match self {
            Operation::AccountCreate(op) => {
                let votes = op.options.canonical_votes();
                op.options.votes = votes;
            }
            Operation::AccountUpdate(op) => {
                if let Some(options) = &mut op.new_options {
                    options.votes = options.canonical_votes();
                }
            }
            Operation::AssetCreate(op) => op.common_options.normalize(),
            Operation::AssetUpdate(op) => op.new_options.normalize(),
            Operation::AssetUpdateFeedProducers(op) => set(&mut op.new_feed_producers),
            Operation::Custom(op) => set(&mut op.required_auths),
            Operation::ProposalUpdate(op) => {
                set(&mut op.active_approvals_to_add);
                set(&mut op.active_approvals_to_remove);
                set(&mut op.owner_approvals_to_add);
                set(&mut op.owner_approvals_to_remove);
                set(&mut op.key_approvals_to_add);
                set(&mut op.key_approvals_to_remove);
            }
            Operation::ProposalCreate(op) => {
                for wrapped in &mut op.proposed_ops {
                    wrapped.op.normalize();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::crypto::PrivateKey;
    use crate::operations::*;
    use crate::types::*;

    fn key(seed: &str) -> crate::crypto::PublicKey {
        PrivateKey::from_seed(seed).unwrap().public_key()
    }

    fn account_create(owner: Authority) -> Operation {
        Operation::AccountCreate(AccountCreate {
            fee: AssetAmount::zero(),
            registrar: AccountId(7),
            referrer: AccountId(7),
            referrer_percent: 0,
            name: "newbie".into(),
            owner,
            active: Authority::single_key(key("active")),
            options: AccountOptions::new(key("memo")),
            extensions: Extensions,
        })
    }

    fn transfer(from: u64, to: u64, amount: i64) -> Operation {
        Operation::Transfer(Transfer {
            fee: AssetAmount::zero(),
            from: AccountId(from),
            to: AccountId(to),
            amount: AssetAmount::new(amount, AssetId::CORE),
            memo: None,
            extensions: Extensions,
        })
    }

    fn proposal(ops: Vec<Operation>) -> Operation {
        Operation::ProposalCreate(ProposalCreate {
            fee: AssetAmount::zero(),
            fee_paying_account: AccountId(7),
            expiration_time: TimePointSec(1_600_000_000),
            proposed_ops: ops.into_iter().map(OpWrapper::from).collect(),
            review_period_seconds: None,
            extensions: Extensions,
        })
    }

    #[test]
    fn test_unreachable_threshold_rejected() {
        let mut owner = Authority::single_key(key("owner"));
        owner.weight_threshold = 2;
        let op = account_create(owner);
        assert_eq!(
            op.check_authorities(),
            Err(AuthorityError::ThresholdUnreachable { threshold: 2, total: 1 })
        );
        assert!(matches!(op.validate(), Err(OperationError::Authority(_))));
        // The same check applies inside a proposal.
        assert!(proposal(vec![op]).check_authorities().is_err());
    }

    #[test]
    fn test_transfer_checks() {
        assert!(transfer(7, 8, 1).validate().is_ok());
        assert!(transfer(7, 7, 1).validate().is_err());
        assert!(transfer(7, 8, 0).validate().is_err());
    }

    #[test]
    fn test_empty_proposal_rejected() {
        assert!(proposal(vec![]).validate().is_err());
        assert!(proposal(vec![transfer(7, 8, 5)]).validate().is_ok());
        assert!(proposal(vec![transfer(7, 8, -5)]).validate().is_err());
    }

    #[test]
    fn test_normalize_sorts_sets() {
        let mut op = Operation::Custom(Custom {
            fee: AssetAmount::zero(),
            payer: AccountId(1),
            required_auths: vec![AccountId(9), AccountId(3), AccountId(9)],
            id: 7,
            data: crate::codec::Bytes(vec![1, 2]),
        });
        op.normalize();
        match op {
            Operation::Custom(c) => assert_eq!(c.required_auths, vec![AccountId(3), AccountId(9)]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
