//! Allocation cost evaluation and product totals.
//!
//! All functions here are pure. Allocations whose cost item no longer exists
//! contribute nothing and are reported at `warn` level.

use crate::core::models::{
    Allocation, AllocationCost, AllocationType, CalculationParams, CostItem, Product,
    ProductCostReport, ProductDetail, ResolvedAllocation,
};

/// Name shown for allocations whose cost item has been deleted.
pub const MISSING_ITEM_NAME: &str = "(deleted cost item)";

/// Months per year for yearly normalization.
const MONTHS_PER_YEAR: f64 = 12.0;

/// Cost of one allocation given its cost item's price.
///
/// Returns 0 when the cost item is missing.
#[must_use]
pub fn calculate_cost(
    allocation: &Allocation,
    cost_item: Option<&CostItem>,
    params: &CalculationParams,
) -> f64 {
    cost_item.map_or(0.0, |item| {
        cost_for_price(
            allocation.allocation_type,
            allocation.allocation_value,
            item.price,
            params,
        )
    })
}

/// Cost for a given unit price, independent of where the price came from.
#[must_use]
pub fn cost_for_price(
    allocation_type: AllocationType,
    value: f64,
    price: f64,
    params: &CalculationParams,
) -> f64 {
    match allocation_type {
        AllocationType::Fixed => price * value,
        AllocationType::PerUser => price * value * f64::from(params.users()),
        AllocationType::PerResourceUnit => price * value * f64::from(params.units()),
        AllocationType::Unknown => unrecognized_allocation_cost(price, value),
    }
}

/// Unrecognized allocation types charge the bare price and ignore the value.
const fn unrecognized_allocation_cost(price: f64, _value: f64) -> f64 {
    price
}

/// Sum of allocation costs, skipping allocations without a cost item.
#[must_use]
pub fn calculate_total_cost(allocations: &[ResolvedAllocation], params: &CalculationParams) -> f64 {
    allocations
        .iter()
        .filter_map(|resolved| {
            resolved.cost_item.as_ref().map(|item| {
                calculate_cost(&resolved.allocation, Some(item), params)
            })
        })
        .sum()
}

/// Sum of allocation costs with each price first normalized to a monthly amount.
#[must_use]
pub fn calculate_monthly_total_cost(
    allocations: &[ResolvedAllocation],
    params: &CalculationParams,
) -> f64 {
    allocations
        .iter()
        .filter_map(|resolved| {
            resolved.cost_item.as_ref().map(|item| {
                cost_for_price(
                    resolved.allocation.allocation_type,
                    resolved.allocation.allocation_value,
                    item.period.to_monthly(item.price),
                    params,
                )
            })
        })
        .sum()
}

/// Twelve times the monthly total.
#[must_use]
pub fn calculate_yearly_total_cost(
    allocations: &[ResolvedAllocation],
    params: &CalculationParams,
) -> f64 {
    calculate_monthly_total_cost(allocations, params) * MONTHS_PER_YEAR
}

/// Per-allocation cost lines. Missing cost items show with a zero cost.
#[must_use]
pub fn allocation_costs(
    allocations: &[ResolvedAllocation],
    params: &CalculationParams,
) -> Vec<AllocationCost> {
    allocations
        .iter()
        .map(|resolved| {
            let allocation = &resolved.allocation;
            if resolved.cost_item.is_none() {
                tracing::warn!(
                    allocation_id = allocation.id,
                    cost_item_id = allocation.cost_item_id,
                    "Allocation references a missing cost item"
                );
            }
            AllocationCost {
                id: allocation.id,
                cost_item_name: resolved
                    .cost_item
                    .as_ref()
                    .map_or_else(|| MISSING_ITEM_NAME.to_string(), |item| item.name.clone()),
                allocation_type: allocation.allocation_type,
                allocation_value: allocation.allocation_value,
                cost: calculate_cost(allocation, resolved.cost_item.as_ref(), params),
            }
        })
        .collect()
}

/// Parameters used when a product is shown without explicit ones.
#[must_use]
pub fn default_params(product: &Product) -> CalculationParams {
    CalculationParams {
        user_count: Some(product.expected_users.unwrap_or(1).max(1)),
        resource_units: Some(1),
    }
}

/// Cost report for a product and the caller's parameters.
#[must_use]
pub fn build_cost_report(
    product: &Product,
    allocations: &[ResolvedAllocation],
    params: CalculationParams,
) -> ProductCostReport {
    ProductCostReport {
        product: product.name.clone(),
        calculation_model: product.calculation_model,
        parameters: params,
        total_cost: calculate_total_cost(allocations, &params),
        allocations: allocation_costs(allocations, &params),
    }
}

/// Detailed view of a product with period-normalized totals.
///
/// Empty `params` fall back to [`default_params`].
#[must_use]
pub fn build_product_detail(
    product: &Product,
    allocations: &[ResolvedAllocation],
    params: CalculationParams,
) -> ProductDetail {
    let params = if params.is_empty() {
        default_params(product)
    } else {
        params
    };
    ProductDetail {
        product: product.clone(),
        parameters: params,
        total_cost: calculate_total_cost(allocations, &params),
        monthly_total_cost: calculate_monthly_total_cost(allocations, &params),
        yearly_total_cost: calculate_yearly_total_cost(allocations, &params),
        allocations: allocation_costs(allocations, &params),
    }
}
