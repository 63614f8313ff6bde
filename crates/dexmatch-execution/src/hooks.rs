//! Contract hooks run before a contract's pairs are matched.

use dexmatch_keeper::MemState;
use dexmatch_types::{ContractAddress, DexError, Pair, Result};

/// Contract-side bookkeeping ahead of matching. A hook may add orders or
/// cancellations to the block state; any error aborts the contract's
/// execution before a single pair is touched.
pub trait PreExecutionHook: Send + Sync {
    fn name(&self) -> &str;

    fn before_execution(&self, contract: &ContractAddress, pairs: &[Pair], mem_state: &mut MemState) -> Result<()>;
}

/// Run `hooks` in order, stopping at the first failure.
pub fn call_pre_execution_hooks(
    hooks: &[Box<dyn PreExecutionHook>],
    contract: &ContractAddress,
    pairs: &[Pair],
    mem_state: &mut MemState,
) -> Result<()> {
    for hook in hooks {
        hook.before_execution(contract, pairs, mem_state).map_err(|err| {
            tracing::warn!(contract = %contract, hook = hook.name(), error = %err, "Pre-execution hook failed");
            DexError::HookFailed {
                contract: contract.clone(),
                reason: format!("{}: {err}", hook.name()),
            }
        })?;
    }
    Ok(())
}
