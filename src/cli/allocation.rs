//! Allocation commands.

use crate::cli::Context;
use crate::cli::args::AllocationCommand;
use crate::core::models::AllocationType;
use crate::error::{CostcalcError, Result};
use crate::render::Removed;
use crate::storage::{AllocationChanges, NewAllocation};

/// Execute an allocation subcommand.
///
/// # Errors
/// Returns validation errors for bad input, `MissingReference` when a
/// referenced row does not exist, or a storage error.
pub fn execute(cmd: AllocationCommand, ctx: &Context) -> Result<()> {
    let ledger = ctx.open_ledger()?;

    match cmd {
        AllocationCommand::Add {
            product,
            item,
            allocation_type,
            value,
        } => {
            let allocation = ledger.add_allocation(&NewAllocation {
                product_id: product,
                cost_item_id: item,
                allocation_type: AllocationType::parse_arg(&allocation_type)?,
                allocation_value: value,
            })?;
            ctx.invalidate_cache();
            ctx.emit(&allocation)
        }

        AllocationCommand::Update {
            id,
            allocation_type,
            value,
        } => {
            let changes = AllocationChanges {
                allocation_type: allocation_type
                    .as_deref()
                    .map(AllocationType::parse_arg)
                    .transpose()?,
                allocation_value: value,
            };
            if changes.is_empty() {
                return Err(CostcalcError::invalid(
                    "update",
                    "pass at least one of --type, --value",
                ));
            }
            let allocation = ledger.update_allocation(id, &changes)?;
            ctx.invalidate_cache();
            ctx.emit(&allocation)
        }

        AllocationCommand::Remove { id } => {
            ledger.remove_allocation(id)?;
            ctx.invalidate_cache();
            ctx.emit(&Removed {
                entity: "allocation",
                id,
            })
        }
    }
}
