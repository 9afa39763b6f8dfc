//! Cost item commands.

use crate::cli::Context;
use crate::cli::args::ItemCommand;
use crate::core::models::CostPeriod;
use crate::core::query::RecordFilter;
use crate::error::{CostcalcError, Result};
use crate::storage::{CostItemChanges, NewCostItem};
use crate::util::time::parse_date_arg;

/// Execute a cost item subcommand.
///
/// # Errors
/// Returns validation errors for bad input, `MissingReference` for unknown
/// ids, or a storage error.
pub fn execute(cmd: ItemCommand, ctx: &Context) -> Result<()> {
    let ledger = ctx.open_ledger()?;

    match cmd {
        ItemCommand::Add {
            name,
            price,
            period,
            category,
            created_at,
        } => {
            let item = NewCostItem {
                name,
                price,
                period: CostPeriod::parse_arg(&period)?,
                category_id: category,
                created_at: created_at
                    .as_deref()
                    .map(|value| parse_date_arg("created_at", value))
                    .transpose()?,
            };
            let stored = ledger.add_cost_item(&item)?;
            ctx.invalidate_cache();
            ctx.emit(&stored)
        }

        ItemCommand::List { period, category } => {
            let filter = RecordFilter {
                period: period.as_deref().map(CostPeriod::parse_arg).transpose()?,
                category_id: category,
            };
            ctx.emit(&ledger.list_cost_items(&filter)?)
        }

        ItemCommand::Update {
            id,
            name,
            price,
            period,
            category,
            clear_category,
        } => {
            let changes = CostItemChanges {
                name,
                price,
                period: period.as_deref().map(CostPeriod::parse_arg).transpose()?,
                category_id: if clear_category {
                    Some(None)
                } else {
                    category.map(Some)
                },
            };
            if changes.is_empty() {
                return Err(CostcalcError::invalid(
                    "update",
                    "pass at least one of --name, --price, --period, --category, --clear-category",
                ));
            }
            let stored = ledger.update_cost_item(id, &changes)?;
            ctx.invalidate_cache();
            ctx.emit(&stored)
        }

        ItemCommand::Remove { id } => {
            let removed = ledger.remove_cost_item(id)?;
            ctx.invalidate_cache();
            ctx.emit(&removed)
        }

        ItemCommand::Log { id } => ctx.emit(&ledger.cost_item_logs(id)?),
    }
}
