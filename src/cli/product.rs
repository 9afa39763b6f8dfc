//! Product commands.

use crate::cli::Context;
use crate::cli::args::ProductCommand;
use crate::core::allocation::build_product_detail;
use crate::core::models::{CalculationModel, CalculationParams, ProductDetail};
use crate::error::{CostcalcError, Result};
use crate::render::Removed;
use crate::storage::{Ledger, NewProduct, ProductChanges};

/// Execute a product subcommand.
///
/// # Errors
/// Returns validation errors for bad input, `MissingReference` for unknown
/// ids, or a storage error.
pub fn execute(cmd: ProductCommand, ctx: &Context) -> Result<()> {
    let mut ledger = ctx.open_ledger()?;

    match cmd {
        ProductCommand::Add {
            name,
            model,
            expected_users,
        } => {
            let product = ledger.add_product(&NewProduct {
                name,
                calculation_model: CalculationModel::parse_arg(&model)?,
                expected_users,
            })?;
            ctx.emit(&product)
        }

        ProductCommand::List => ctx.emit(&ledger.list_products()?),

        ProductCommand::Show { id } => ctx.emit(&product_detail(&ledger, id)?),

        ProductCommand::Update {
            id,
            name,
            model,
            expected_users,
        } => {
            let changes = ProductChanges {
                name,
                calculation_model: model.as_deref().map(CalculationModel::parse_arg).transpose()?,
                expected_users,
            };
            if changes.is_empty() {
                return Err(CostcalcError::invalid(
                    "update",
                    "pass at least one of --name, --model, --expected-users",
                ));
            }
            let product = ledger.update_product(id, &changes)?;
            ctx.invalidate_cache();
            ctx.emit(&product)
        }

        ProductCommand::Remove { id } => {
            ledger.remove_product(id)?;
            ctx.invalidate_cache();
            ctx.emit(&Removed {
                entity: "product",
                id,
            })
        }
    }
}

/// Detail view of a product using its default parameters.
///
/// # Errors
/// Returns `MissingReference` if the product does not exist, or a storage
/// error.
pub fn product_detail(ledger: &Ledger, id: i64) -> Result<ProductDetail> {
    let product = ledger.require_product(id)?;
    let allocations = ledger.allocations_for(id)?;
    Ok(build_product_detail(
        &product,
        &allocations,
        CalculationParams::default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{AllocationType, CostPeriod};
    use crate::storage::{NewAllocation, NewCostItem};

    #[test]
    fn detail_uses_expected_users_and_normalizes_periods() {
        let ledger = Ledger::open_in_memory().unwrap();
        let yearly = ledger
            .add_cost_item(&NewCostItem {
                name: "Licence".to_string(),
                price: 1_200.0,
                period: CostPeriod::Year,
                category_id: None,
                created_at: None,
            })
            .unwrap();
        let product = ledger
            .add_product(&NewProduct {
                name: "Portal".to_string(),
                calculation_model: CalculationModel::PerUser,
                expected_users: Some(4),
            })
            .unwrap();
        ledger
            .add_allocation(&NewAllocation {
                product_id: product.id,
                cost_item_id: yearly.id,
                allocation_type: AllocationType::PerUser,
                allocation_value: 0.25,
            })
            .unwrap();

        let detail = product_detail(&ledger, product.id).unwrap();
        assert_eq!(detail.parameters.user_count, Some(4));
        // 1200 * 0.25 * 4
        assert!((detail.total_cost - 1_200.0).abs() < 1e-9);
        // (1200 / 12) * 0.25 * 4
        assert!((detail.monthly_total_cost - 100.0).abs() < 1e-9);
        assert!((detail.yearly_total_cost - 1_200.0).abs() < 1e-9);
    }
}
