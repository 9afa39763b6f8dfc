//! SQLite-backed ledger of cost items, products and allocations.
//!
//! Timestamps are stored as RFC 3339 UTC strings with second precision, so
//! lexical comparison matches chronological order and the first seven
//! characters are the `YYYY-MM` month key.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::core::allocation::{calculate_total_cost, default_params};
use crate::core::models::{
    Allocation, AllocationType, CalculationModel, CostItem, CostItemLog, CostPeriod,
    DashboardSummary, MonthlyBucket, PeriodTotal, Product, ProductTotal, ResolvedAllocation,
};
use crate::core::month::MonthKey;
use crate::core::query::{CostRecordQuery, RecordFilter, fill_months};
use crate::error::{CostcalcError, Result};
use crate::storage::ledger_schema::run_migrations;

/// Number of products listed in the dashboard summary.
pub const TOP_PRODUCTS: usize = 5;

const COST_ITEM_COLUMNS: &str =
    "id, name, price, period, category_id, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, name, calculation_model, expected_users, created_at";

/// Fields for a new cost item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCostItem {
    pub name: String,
    pub price: f64,
    pub period: CostPeriod,
    pub category_id: Option<i64>,
    /// Backdates the item. Defaults to now.
    pub created_at: Option<DateTime<Utc>>,
}

/// Changes to an existing cost item. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostItemChanges {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub period: Option<CostPeriod>,
    /// `Some(None)` clears the category.
    pub category_id: Option<Option<i64>>,
}

impl CostItemChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.period.is_none()
            && self.category_id.is_none()
    }
}

/// Fields for a new product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub calculation_model: CalculationModel,
    pub expected_users: Option<u32>,
}

/// Changes to an existing product. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub calculation_model: Option<CalculationModel>,
    pub expected_users: Option<u32>,
}

impl ProductChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.calculation_model.is_none() && self.expected_users.is_none()
    }
}

/// Fields for a new allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewAllocation {
    pub product_id: i64,
    pub cost_item_id: i64,
    pub allocation_type: AllocationType,
    pub allocation_value: f64,
}

/// Changes to an existing allocation. The product and cost item are fixed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AllocationChanges {
    pub allocation_type: Option<AllocationType>,
    pub allocation_value: Option<f64>,
}

impl AllocationChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.allocation_type.is_none() && self.allocation_value.is_none()
    }
}

/// Ledger database access layer.
pub struct Ledger {
    conn: Connection,
    categories: bool,
}

impl Ledger {
    /// Create or open a ledger database at the given path.
    ///
    /// # Errors
    /// Returns an error if the parent directory cannot be created, the database
    /// cannot be opened, or schema migrations fail.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(path).map_err(db_err("open ledger db"))?;
        run_migrations(&mut conn)?;

        tracing::debug!(path = %path.display(), "Opened ledger");
        Ok(Self {
            conn,
            categories: true,
        })
    }

    /// Open an in-memory ledger (for testing).
    ///
    /// # Errors
    /// Returns an error if the in-memory database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().map_err(db_err("open in-memory db"))?;
        run_migrations(&mut conn)?;
        Ok(Self {
            conn,
            categories: true,
        })
    }

    /// Toggle whether category filters are offered to the forecasting engine.
    #[must_use]
    pub const fn with_categories(mut self, enabled: bool) -> Self {
        self.categories = enabled;
        self
    }

    // -------------------------------------------------------------------------
    // Cost items
    // -------------------------------------------------------------------------

    /// Insert a cost item and log its creation.
    ///
    /// The insert and its log row commit together.
    ///
    /// # Errors
    /// Returns `InvalidParameter` for an empty name, a negative or non-finite
    /// price, or an unknown period; or a database error.
    pub fn add_cost_item(&self, item: &NewCostItem) -> Result<CostItem> {
        validate_name("name", &item.name)?;
        validate_amount("price", item.price)?;
        validate_period(item.period)?;

        let created_at = item.created_at.unwrap_or_else(Utc::now);
        let stamp = format_timestamp(created_at);
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(db_err("begin insert"))?;
        tx.execute(
            "INSERT INTO cost_items (name, price, period, category_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                item.name.trim(),
                item.price,
                item.period.as_str(),
                item.category_id,
                stamp
            ],
        )
        .map_err(db_err("insert cost item"))?;

        let id = tx.last_insert_rowid();
        let stored = self.require_cost_item(id)?;
        log_change(&tx, id, "created", None, Some(&stored))?;
        tx.commit().map_err(db_err("commit insert"))?;

        tracing::info!(id, name = %stored.name, price = stored.price, "Added cost item");
        Ok(stored)
    }

    /// Apply changes to a cost item and log old and new values.
    ///
    /// The update and its log row commit together.
    ///
    /// # Errors
    /// Returns `MissingReference` if the item does not exist, `InvalidParameter`
    /// for invalid values, or a database error.
    pub fn update_cost_item(&self, id: i64, changes: &CostItemChanges) -> Result<CostItem> {
        let old = self.require_cost_item(id)?;

        let mut updated = old.clone();
        if let Some(name) = &changes.name {
            validate_name("name", name)?;
            updated.name = name.trim().to_string();
        }
        if let Some(price) = changes.price {
            validate_amount("price", price)?;
            updated.price = price;
        }
        if let Some(period) = changes.period {
            validate_period(period)?;
            updated.period = period;
        }
        if let Some(category_id) = changes.category_id {
            updated.category_id = category_id;
        }
        updated.updated_at = Utc::now();

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(db_err("begin update"))?;
        tx.execute(
            "UPDATE cost_items
             SET name = ?1, price = ?2, period = ?3, category_id = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                updated.name,
                updated.price,
                updated.period.as_str(),
                updated.category_id,
                format_timestamp(updated.updated_at),
                id
            ],
        )
        .map_err(db_err("update cost item"))?;

        let stored = self.require_cost_item(id)?;
        log_change(&tx, id, "updated", Some(&old), Some(&stored))?;
        tx.commit().map_err(db_err("commit update"))?;

        tracing::info!(id, "Updated cost item");
        Ok(stored)
    }

    /// Delete a cost item. Allocations pointing at it are left in place.
    ///
    /// The deleted item's snapshot is logged in the same transaction.
    ///
    /// # Errors
    /// Returns `MissingReference` if the item does not exist, or a database error.
    pub fn remove_cost_item(&self, id: i64) -> Result<CostItem> {
        let old = self.require_cost_item(id)?;

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(db_err("begin delete"))?;
        tx.execute("DELETE FROM cost_items WHERE id = ?1", [id])
            .map_err(db_err("delete cost item"))?;
        log_change(&tx, id, "deleted", Some(&old), None)?;
        tx.commit().map_err(db_err("commit delete"))?;

        tracing::info!(id, name = %old.name, "Removed cost item");
        Ok(old)
    }

    /// Fetch a cost item by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn get_cost_item(&self, id: i64) -> Result<Option<CostItem>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {COST_ITEM_COLUMNS} FROM cost_items WHERE id = ?1"
            ))
            .map_err(db_err("prepare select"))?;

        stmt.query_row([id], map_cost_item)
            .optional()
            .map_err(db_err("select cost item"))
    }

    /// Fetch a cost item or fail with `MissingReference`.
    ///
    /// # Errors
    /// Returns `MissingReference` if absent, or a database error.
    pub fn require_cost_item(&self, id: i64) -> Result<CostItem> {
        self.get_cost_item(id)?
            .ok_or_else(|| CostcalcError::missing("cost item", id))
    }

    /// Cost items matching `filter`, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_cost_items(&self, filter: &RecordFilter) -> Result<Vec<CostItem>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {COST_ITEM_COLUMNS} FROM cost_items
                 WHERE (?1 IS NULL OR period = ?1)
                   AND (?2 IS NULL OR category_id = ?2)
                 ORDER BY created_at ASC, id ASC"
            ))
            .map_err(db_err("prepare select"))?;

        let rows = stmt
            .query_map(
                params![filter.period.map(CostPeriod::as_str), filter.category_id],
                map_cost_item,
            )
            .map_err(db_err("query cost items"))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err("read cost items"))
    }

    /// Change log of a cost item, oldest first. Works for deleted items too.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn cost_item_logs(&self, cost_item_id: i64) -> Result<Vec<CostItemLog>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT id, cost_item_id, action, old_value, new_value, created_at
                 FROM cost_item_logs WHERE cost_item_id = ?1 ORDER BY id ASC",
            )
            .map_err(db_err("prepare select"))?;

        let rows = stmt
            .query_map([cost_item_id], map_log)
            .map_err(db_err("query logs"))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err("read logs"))
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// Insert a product.
    ///
    /// # Errors
    /// Returns `InvalidParameter` for an empty name or a zero expected user
    /// count, or a database error.
    pub fn add_product(&self, product: &NewProduct) -> Result<Product> {
        validate_name("name", &product.name)?;
        if let Some(users) = product.expected_users {
            validate_expected_users(users)?;
        }

        let stamp = format_timestamp(Utc::now());
        self.conn
            .execute(
                "INSERT INTO products (name, calculation_model, expected_users, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![
                    product.name.trim(),
                    product.calculation_model.as_str(),
                    product.expected_users,
                    stamp
                ],
            )
            .map_err(db_err("insert product"))?;

        let id = self.conn.last_insert_rowid();
        tracing::info!(id, name = %product.name, "Added product");
        self.require_product(id)
    }

    /// Apply changes to a product.
    ///
    /// # Errors
    /// Returns `MissingReference` if the product does not exist,
    /// `InvalidParameter` for an empty name or a zero expected user count, or
    /// a database error.
    pub fn update_product(&self, id: i64, changes: &ProductChanges) -> Result<Product> {
        let mut updated = self.require_product(id)?;
        if let Some(name) = &changes.name {
            validate_name("name", name)?;
            updated.name = name.trim().to_string();
        }
        if let Some(model) = changes.calculation_model {
            updated.calculation_model = model;
        }
        if let Some(users) = changes.expected_users {
            validate_expected_users(users)?;
            updated.expected_users = Some(users);
        }

        self.conn
            .execute(
                "UPDATE products
                 SET name = ?1, calculation_model = ?2, expected_users = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    updated.name,
                    updated.calculation_model.as_str(),
                    updated.expected_users,
                    format_timestamp(Utc::now()),
                    id
                ],
            )
            .map_err(db_err("update product"))?;

        tracing::info!(id, name = %updated.name, "Updated product");
        self.require_product(id)
    }

    /// Delete a product together with its allocations.
    ///
    /// # Errors
    /// Returns `MissingReference` if the product does not exist, or a database error.
    pub fn remove_product(&mut self, id: i64) -> Result<Product> {
        let product = self.require_product(id)?;

        let tx = self.conn.transaction().map_err(db_err("begin delete"))?;
        let allocations = tx
            .execute("DELETE FROM cost_allocations WHERE product_id = ?1", [id])
            .map_err(db_err("delete allocations"))?;
        tx.execute("DELETE FROM products WHERE id = ?1", [id])
            .map_err(db_err("delete product"))?;
        tx.commit().map_err(db_err("commit delete"))?;

        tracing::info!(id, allocations, "Removed product");
        Ok(product)
    }

    /// Fetch a product by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"))
            .map_err(db_err("prepare select"))?;

        stmt.query_row([id], map_product)
            .optional()
            .map_err(db_err("select product"))
    }

    /// Fetch a product or fail with `MissingReference`.
    ///
    /// # Errors
    /// Returns `MissingReference` if absent, or a database error.
    pub fn require_product(&self, id: i64) -> Result<Product> {
        self.get_product(id)?
            .ok_or_else(|| CostcalcError::missing("product", id))
    }

    /// All products ordered by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_products(&self) -> Result<Vec<Product>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id ASC"))
            .map_err(db_err("prepare select"))?;

        let rows = stmt
            .query_map([], map_product)
            .map_err(db_err("query products"))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err("read products"))
    }

    // -------------------------------------------------------------------------
    // Allocations
    // -------------------------------------------------------------------------

    /// Link a cost item to a product.
    ///
    /// # Errors
    /// Returns `MissingReference` if either side does not exist,
    /// `InvalidParameter` for an unknown type or a negative or non-finite
    /// value, or a database error.
    pub fn add_allocation(&self, allocation: &NewAllocation) -> Result<Allocation> {
        self.require_product(allocation.product_id)?;
        self.require_cost_item(allocation.cost_item_id)?;
        validate_allocation_type(allocation.allocation_type)?;
        validate_amount("allocation_value", allocation.allocation_value)?;

        self.conn
            .execute(
                "INSERT INTO cost_allocations
                    (product_id, cost_item_id, allocation_type, allocation_value, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    allocation.product_id,
                    allocation.cost_item_id,
                    allocation.allocation_type.as_str(),
                    allocation.allocation_value,
                    format_timestamp(Utc::now())
                ],
            )
            .map_err(db_err("insert allocation"))?;

        let id = self.conn.last_insert_rowid();
        tracing::info!(
            id,
            product_id = allocation.product_id,
            cost_item_id = allocation.cost_item_id,
            "Added allocation"
        );

        Ok(Allocation {
            id,
            product_id: allocation.product_id,
            cost_item_id: allocation.cost_item_id,
            allocation_type: allocation.allocation_type,
            allocation_value: allocation.allocation_value,
        })
    }

    /// Change an allocation's type or value.
    ///
    /// # Errors
    /// Returns `MissingReference` if the allocation does not exist,
    /// `InvalidParameter` for an unknown type or a negative or non-finite
    /// value, or a database error.
    pub fn update_allocation(&self, id: i64, changes: &AllocationChanges) -> Result<Allocation> {
        let mut updated = self.require_allocation(id)?;
        if let Some(allocation_type) = changes.allocation_type {
            validate_allocation_type(allocation_type)?;
            updated.allocation_type = allocation_type;
        }
        if let Some(value) = changes.allocation_value {
            validate_amount("allocation_value", value)?;
            updated.allocation_value = value;
        }

        self.conn
            .execute(
                "UPDATE cost_allocations SET allocation_type = ?1, allocation_value = ?2
                 WHERE id = ?3",
                params![
                    updated.allocation_type.as_str(),
                    updated.allocation_value,
                    id
                ],
            )
            .map_err(db_err("update allocation"))?;

        tracing::info!(
            id,
            allocation_type = %updated.allocation_type,
            allocation_value = updated.allocation_value,
            "Updated allocation"
        );
        Ok(updated)
    }

    /// Fetch an allocation or fail with `MissingReference`.
    ///
    /// # Errors
    /// Returns `MissingReference` if absent, or a database error.
    pub fn require_allocation(&self, id: i64) -> Result<Allocation> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT id, product_id, cost_item_id, allocation_type, allocation_value
                 FROM cost_allocations WHERE id = ?1",
            )
            .map_err(db_err("prepare select"))?;

        stmt.query_row([id], map_allocation)
            .optional()
            .map_err(db_err("select allocation"))?
            .ok_or_else(|| CostcalcError::missing("allocation", id))
    }

    /// Delete an allocation.
    ///
    /// # Errors
    /// Returns `MissingReference` if the allocation does not exist, or a database error.
    pub fn remove_allocation(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM cost_allocations WHERE id = ?1", [id])
            .map_err(db_err("delete allocation"))?;
        if deleted == 0 {
            return Err(CostcalcError::missing("allocation", id));
        }
        tracing::info!(id, "Removed allocation");
        Ok(())
    }

    /// A product's allocations with their cost items, where those still exist.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn allocations_for(&self, product_id: i64) -> Result<Vec<ResolvedAllocation>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT a.id, a.product_id, a.cost_item_id, a.allocation_type, a.allocation_value,
                        c.id, c.name, c.price, c.period, c.category_id, c.created_at, c.updated_at
                 FROM cost_allocations a
                 LEFT JOIN cost_items c ON c.id = a.cost_item_id
                 WHERE a.product_id = ?1
                 ORDER BY a.id ASC",
            )
            .map_err(db_err("prepare select"))?;

        let rows = stmt
            .query_map([product_id], map_resolved_allocation)
            .map_err(db_err("query allocations"))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err("read allocations"))
    }

    // -------------------------------------------------------------------------
    // Dashboard
    // -------------------------------------------------------------------------

    /// Headline numbers across the whole ledger.
    ///
    /// Products are ranked by their total cost under default parameters.
    ///
    /// # Errors
    /// Returns an error if any query fails.
    pub fn summary(&self) -> Result<DashboardSummary> {
        let (cost_item_count, total_costs): (i64, f64) = self
            .conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(price), 0.0) FROM cost_items",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(db_err("summarize cost items"))?;

        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT period, SUM(price), COUNT(*) FROM cost_items
                 GROUP BY period ORDER BY period ASC",
            )
            .map_err(db_err("prepare select"))?;
        let costs_by_period = stmt
            .query_map([], |row| {
                Ok(PeriodTotal {
                    period: CostPeriod::from_db(&row.get::<_, String>(0)?),
                    total: row.get(1)?,
                    count: count_to_u64(row.get(2)?),
                })
            })
            .map_err(db_err("query period totals"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err("read period totals"))?;

        let products = self.list_products()?;
        let mut top_products = products
            .iter()
            .map(|product| {
                let allocations = self.allocations_for(product.id)?;
                Ok(ProductTotal {
                    id: product.id,
                    name: product.name.clone(),
                    total_cost: calculate_total_cost(&allocations, &default_params(product)),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        top_products.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost).then(a.id.cmp(&b.id)));
        top_products.truncate(TOP_PRODUCTS);

        Ok(DashboardSummary {
            cost_item_count: count_to_u64(cost_item_count),
            product_count: u64::try_from(products.len()).unwrap_or(u64::MAX),
            total_costs,
            costs_by_period,
            top_products,
        })
    }
}

impl CostRecordQuery for Ledger {
    fn fetch_monthly_totals(
        &self,
        start: MonthKey,
        end: MonthKey,
        filter: &RecordFilter,
    ) -> Result<Vec<MonthlyBucket>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT substr(created_at, 1, 7) AS month, SUM(price), COUNT(*)
                 FROM cost_items
                 WHERE created_at >= ?1 AND created_at < ?2
                   AND (?3 IS NULL OR period = ?3)
                   AND (?4 IS NULL OR category_id = ?4)
                 GROUP BY month",
            )
            .map_err(db_err("prepare monthly totals"))?;

        let rows = stmt
            .query_map(
                params![
                    format_timestamp(start.start()),
                    format_timestamp(end.next().start()),
                    filter.period.map(CostPeriod::as_str),
                    filter.category_id
                ],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .map_err(db_err("query monthly totals"))?;

        let mut totals = HashMap::new();
        for row in rows {
            let (month, total, count) = row.map_err(db_err("read monthly totals"))?;
            let month: MonthKey = month.parse()?;
            totals.insert(month, (total, count_to_u64(count)));
        }

        Ok(fill_months(start, end, &totals))
    }

    fn supports_categories(&self) -> bool {
        self.categories
    }
}

/// Append a change log row. Callers pass the transaction of the mutation.
fn log_change(
    conn: &Connection,
    cost_item_id: i64,
    action: &str,
    old: Option<&CostItem>,
    new: Option<&CostItem>,
) -> Result<()> {
    let old_value = old.map(serde_json::to_string).transpose()?;
    let new_value = new.map(serde_json::to_string).transpose()?;

    conn.execute(
        "INSERT INTO cost_item_logs (cost_item_id, action, old_value, new_value, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            cost_item_id,
            action,
            old_value,
            new_value,
            format_timestamp(Utc::now())
        ],
    )
    .map_err(db_err("insert log"))?;
    Ok(())
}

fn db_err(context: &'static str) -> impl Fn(rusqlite::Error) -> CostcalcError {
    move |e| CostcalcError::Other(anyhow::anyhow!("{context}: {e}"))
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CostcalcError::Other(anyhow::anyhow!("invalid timestamp '{value}': {e}")))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    parse_timestamp(&row.get::<_, String>(idx)?).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

fn map_cost_item(row: &Row<'_>) -> rusqlite::Result<CostItem> {
    map_cost_item_at(row, 0)
}

fn map_cost_item_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<CostItem> {
    Ok(CostItem {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        price: row.get(offset + 2)?,
        period: CostPeriod::from_db(&row.get::<_, String>(offset + 3)?),
        category_id: row.get(offset + 4)?,
        created_at: timestamp_column(row, offset + 5)?,
        updated_at: timestamp_column(row, offset + 6)?,
    })
}

fn map_product(row: &Row<'_>) -> rusqlite::Result<Product> {
    let model: String = row.get(2)?;
    let calculation_model = CalculationModel::parse_arg(&model).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        calculation_model,
        expected_users: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
    })
}

fn map_allocation(row: &Row<'_>) -> rusqlite::Result<Allocation> {
    Ok(Allocation {
        id: row.get(0)?,
        product_id: row.get(1)?,
        cost_item_id: row.get(2)?,
        allocation_type: AllocationType::from_db(&row.get::<_, String>(3)?),
        allocation_value: row.get(4)?,
    })
}

fn map_resolved_allocation(row: &Row<'_>) -> rusqlite::Result<ResolvedAllocation> {
    let allocation = map_allocation(row)?;

    let cost_item = match row.get::<_, Option<i64>>(5)? {
        Some(_) => Some(map_cost_item_at(row, 5)?),
        None => None,
    };

    Ok(ResolvedAllocation {
        allocation,
        cost_item,
    })
}

fn map_log(row: &Row<'_>) -> rusqlite::Result<CostItemLog> {
    let json_column = |idx: usize| -> rusqlite::Result<Option<serde_json::Value>> {
        row.get::<_, Option<String>>(idx)?
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    };

    Ok(CostItemLog {
        id: row.get(0)?,
        cost_item_id: row.get(1)?,
        action: row.get(2)?,
        old_value: json_column(3)?,
        new_value: json_column(4)?,
        created_at: timestamp_column(row, 5)?,
    })
}

fn validate_name(field: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CostcalcError::invalid(field, "must not be empty"));
    }
    Ok(())
}

fn validate_amount(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CostcalcError::invalid(
            field,
            format!("must be a non-negative number, got {value}"),
        ));
    }
    Ok(())
}

fn validate_expected_users(users: u32) -> Result<()> {
    if users == 0 {
        return Err(CostcalcError::invalid("expected_users", "must be at least 1"));
    }
    Ok(())
}

fn validate_allocation_type(allocation_type: AllocationType) -> Result<()> {
    if allocation_type == AllocationType::Unknown {
        return Err(CostcalcError::invalid(
            "allocation_type",
            "must be fixed, per_user or per_resource_unit",
        ));
    }
    Ok(())
}

fn validate_period(period: CostPeriod) -> Result<()> {
    if period == CostPeriod::Unknown {
        return Err(CostcalcError::invalid(
            "period",
            "must be one of minute, hour, day, month, year",
        ));
    }
    Ok(())
}
