//! Calculate command implementation.

use crate::cli::Context;
use crate::cli::args::CalculateArgs;
use crate::core::allocation::build_cost_report;
use crate::core::models::{CalculationParams, ProductCostReport};
use crate::error::Result;
use crate::storage::Ledger;
use crate::storage::cache::{ResultCache, product_calculation_key};

/// Execute the calculate command.
///
/// # Errors
/// Returns `InvalidParameter` for a user count or resource unit count below
/// one, `MissingReference` for an unknown product, or a storage error.
pub fn execute(args: &CalculateArgs, ctx: &Context) -> Result<()> {
    let params = CalculationParams::new(args.user_count, args.resource_units)?;
    let ledger = ctx.open_ledger()?;
    let report = calculate_product_cost(
        &ledger,
        &ctx.cache(),
        args.product_id,
        params,
        !args.no_cache,
    )?;
    ctx.emit(&report)
}

/// Cost report for a product, cached per product and parameter set.
///
/// # Errors
/// Returns `MissingReference` if the product does not exist, or a storage
/// error.
pub fn calculate_product_cost(
    ledger: &Ledger,
    cache: &ResultCache,
    product_id: i64,
    params: CalculationParams,
    use_cache: bool,
) -> Result<ProductCostReport> {
    let compute = || {
        let product = ledger.require_product(product_id)?;
        let allocations = ledger.allocations_for(product_id)?;
        let report = build_cost_report(&product, &allocations, params);
        tracing::debug!(
            product_id,
            allocations = allocations.len(),
            total_cost = report.total_cost,
            "Calculated product cost"
        );
        Ok(report)
    };

    if !use_cache {
        return compute();
    }
    cache.remember(&product_calculation_key(product_id, &params), compute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{AllocationType, CalculationModel, CostPeriod};
    use crate::error::CostcalcError;
    use crate::storage::{NewAllocation, NewCostItem, NewProduct};

    fn seeded_ledger() -> (Ledger, i64) {
        seed(Ledger::open_in_memory().unwrap(), 100.0)
    }

    fn seed(ledger: Ledger, price: f64) -> (Ledger, i64) {
        let item = ledger
            .add_cost_item(&NewCostItem {
                name: "Database".to_string(),
                price,
                period: CostPeriod::Month,
                category_id: None,
                created_at: None,
            })
            .unwrap();
        let product = ledger
            .add_product(&NewProduct {
                name: "Api".to_string(),
                calculation_model: CalculationModel::PerUser,
                expected_users: None,
            })
            .unwrap();
        ledger
            .add_allocation(&NewAllocation {
                product_id: product.id,
                cost_item_id: item.id,
                allocation_type: AllocationType::PerUser,
                allocation_value: 0.5,
            })
            .unwrap();
        (ledger, product.id)
    }

    #[test]
    fn per_user_allocation_scales_with_users() {
        let (ledger, product_id) = seeded_ledger();
        let cache = ResultCache::disabled(std::env::temp_dir());
        let params = CalculationParams::new(Some(10), None).unwrap();
        let report = calculate_product_cost(&ledger, &cache, product_id, params, true).unwrap();
        assert!((report.total_cost - 500.0).abs() < 1e-9);
        assert_eq!(report.allocations.len(), 1);
    }

    #[test]
    fn unknown_product_is_missing_reference() {
        let (ledger, _) = seeded_ledger();
        let cache = ResultCache::disabled(std::env::temp_dir());
        let err = calculate_product_cost(
            &ledger,
            &cache,
            999,
            CalculationParams::default(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, CostcalcError::MissingReference { id: 999, .. }));
    }

    #[test]
    fn results_are_cached_per_parameters() {
        let (ledger, product_id) = seeded_ledger();
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(dir.path().to_path_buf(), 60);

        let ten = CalculationParams::new(Some(10), None).unwrap();
        let two = CalculationParams::new(Some(2), None).unwrap();
        calculate_product_cost(&ledger, &cache, product_id, ten, true).unwrap();
        let report = calculate_product_cost(&ledger, &cache, product_id, two, true).unwrap();

        assert!((report.total_cost - 100.0).abs() < 1e-9);
        assert_eq!(cache.list_keys().len(), 2);
    }

    #[test]
    fn ledgers_sharing_a_cache_root_do_not_see_each_others_results() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("cache");
        let first_db = dir.path().join("first.sqlite");
        let second_db = dir.path().join("second.sqlite");
        let (first, first_product) = seed(Ledger::open(&first_db).unwrap(), 100.0);
        let (second, second_product) = seed(Ledger::open(&second_db).unwrap(), 7.0);
        assert_eq!(first_product, second_product);

        let params = CalculationParams::new(Some(2), None).unwrap();
        let first_cache = ResultCache::for_database(&root, &first_db, 60);
        let second_cache = ResultCache::for_database(&root, &second_db, 60);
        let a = calculate_product_cost(&first, &first_cache, first_product, params, true).unwrap();
        let b =
            calculate_product_cost(&second, &second_cache, second_product, params, true).unwrap();

        assert!((a.total_cost - 100.0).abs() < 1e-9);
        assert!((b.total_cost - 7.0).abs() < 1e-9);
    }
}
