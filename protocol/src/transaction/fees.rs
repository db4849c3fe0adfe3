//! Fee injection.
//!
//! Operations are built with a zero fee placeholder. Before signing, the
//! whole list goes to the node in one `get_required_fees` call and every
//! placeholder is overwritten in place. A `proposal_create` is quoted as
//! its own fee plus one quote per proposed operation, and so on down, so a
//! list of N plain operations plus one proposal of M gets N + 1 top-level
//! quotes and M inner ones, each landing on exactly its own operation.

use tracing::{debug, warn};

use super::TransactionError;
use crate::network::{ChainApi, FeeQuote, RpcPolicy};
use crate::operations::Operation;
use crate::types::AssetId;

/// Fetches fees for `ops` in `fee_asset` and writes them into place.
///
/// Every authority the operations would create is checked first, so an
/// unreachable threshold fails before any network traffic. An empty list
/// is a no-op.
pub async fn assemble_fees(
    node: &dyn ChainApi,
    policy: &RpcPolicy,
    ops: &mut [Operation],
    fee_asset: AssetId,
) -> Result<(), TransactionError> {
    if ops.is_empty() {
        return Ok(());
    }
    for op in ops.iter() {
        op.check_authorities()?;
    }

    let quotes = {
        let snapshot: &[Operation] = ops;
        policy
            .read("get_required_fees", || node.get_required_fees(snapshot, fee_asset))
            .await?
    };
    apply_quotes(ops, &quotes)?;
    debug!(ops = ops.len(), %fee_asset, "fees assembled");
    Ok(())
}

/// Writes `quotes` onto `ops`, pairwise and recursively.
pub fn apply_quotes(ops: &mut [Operation], quotes: &[FeeQuote]) -> Result<(), TransactionError> {
    if ops.len() != quotes.len() {
        return Err(TransactionError::FeeOracle(format!(
            "expected {} fee quotes, got {}",
            ops.len(),
            quotes.len()
        )));
    }
    for (op, quote) in ops.iter_mut().zip(quotes) {
        apply_quote(op, quote)?;
    }
    Ok(())
}

fn apply_quote(op: &mut Operation, quote: &FeeQuote) -> Result<(), TransactionError> {
    match quote {
        FeeQuote::Single(fee) => {
            if op.proposed_ops().is_some() {
                warn!(operation = op.name(), "flat fee quote for a proposal; proposed operations keep their fees");
            }
            *op.fee_mut() = fee.clone();
        }
        FeeQuote::Nested((fee, inner)) => {
            let Some(proposed) = op.proposed_ops_mut() else {
                return Err(TransactionError::FeeOracle(format!(
                    "nested fee quote for non-proposal operation '{}'",
                    op.name()
                )));
            };
            if proposed.len() != inner.len() {
                return Err(TransactionError::FeeOracle(format!(
                    "proposal holds {} operations but got {} inner fee quotes",
                    proposed.len(),
                    inner.len()
                )));
            }
            for (wrapper, inner_quote) in proposed.iter_mut().zip(inner) {
                apply_quote(&mut wrapper.op, inner_quote)?;
            }
            *op.fee_mut() = fee.clone();
        }
    }
    Ok(())
}
