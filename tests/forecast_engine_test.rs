//! Forecast engine running against the SQLite ledger.

use chrono::{TimeZone, Utc};

use costcalc::core::{
    CostPeriod, FixedJitter, ForecastEngine, ForecastRequest, MonthKey, RandomJitter,
    TrendDirection,
};
use costcalc::storage::{Ledger, NewCostItem};
use costcalc::{CostcalcError, assert_float_eq};

mod common;

use common::logger::TestLogger;

fn record(ledger: &Ledger, price: f64, period: CostPeriod, year: i32, month: u32) {
    ledger
        .add_cost_item(&NewCostItem {
            name: format!("item-{year}-{month:02}"),
            price,
            period,
            category_id: None,
            created_at: Some(Utc.with_ymd_and_hms(year, month, 10, 12, 0, 0).unwrap()),
        })
        .unwrap();
}

fn month(year: i32, month: u32) -> MonthKey {
    MonthKey::new(year, month).unwrap()
}

#[test]
fn flat_year_projects_seasonal_baseline() {
    let log = TestLogger::new("flat_year_projects_seasonal_baseline");
    let ledger = Ledger::open_in_memory().unwrap();

    log.phase("setup");
    // October 2023 through September 2024 at 100 per month.
    for offset in 0..12 {
        let key = month(2023, 10).add_months(offset);
        record(&ledger, 100.0, CostPeriod::Month, key.year(), key.month());
    }

    log.phase("execute");
    let as_of = Utc.with_ymd_and_hms(2024, 9, 20, 0, 0, 0).unwrap();
    let request = ForecastRequest::new(4, as_of).unwrap();
    let result = ForecastEngine::new(&ledger)
        .generate_cost_forecast(&request, &mut FixedJitter::default())
        .unwrap();

    log.phase("verify");
    assert_eq!(result.metadata.confidence_level, 100);
    assert_eq!(result.metadata.trend_direction, TrendDirection::Stable);
    assert_eq!(result.metadata.forecast_months, 4);
    assert_eq!(result.historical.len(), 12);

    let totals: Vec<(MonthKey, f64)> = result
        .forecast
        .values()
        .map(|b| (b.month_key, b.forecasted_total))
        .collect();
    assert_eq!(totals[0].0, month(2024, 10));
    assert_float_eq!(totals[0].1, 105.0);
    assert_float_eq!(totals[2].1, 105.0);
    // January falls in the low season.
    assert_eq!(totals[3].0, month(2025, 1));
    assert_float_eq!(totals[3].1, 95.0);

    let confidences: Vec<f64> = result.forecast.values().map(|b| b.confidence).collect();
    assert!(confidences.windows(2).all(|w| w[0] > w[1]));

    log.finish_ok();
}

#[test]
fn period_filter_limits_history() {
    let ledger = Ledger::open_in_memory().unwrap();
    record(&ledger, 50.0, CostPeriod::Month, 2024, 3);
    record(&ledger, 1_200.0, CostPeriod::Year, 2024, 3);
    record(&ledger, 30.0, CostPeriod::Month, 2024, 4);

    let as_of = Utc.with_ymd_and_hms(2024, 4, 30, 0, 0, 0).unwrap();
    let engine = ForecastEngine::new(&ledger);

    let all = engine
        .generate_cost_forecast(
            &ForecastRequest::new(1, as_of).unwrap(),
            &mut FixedJitter::default(),
        )
        .unwrap();
    assert_float_eq!(all.historical[&month(2024, 3)].total, 1_250.0);
    assert_eq!(all.historical[&month(2024, 3)].count, 2);

    let yearly = engine
        .generate_cost_forecast(
            &ForecastRequest::new(1, as_of)
                .unwrap()
                .with_period(Some(CostPeriod::Year)),
            &mut FixedJitter::default(),
        )
        .unwrap();
    assert_float_eq!(yearly.historical[&month(2024, 3)].total, 1_200.0);
    assert_float_eq!(yearly.historical[&month(2024, 4)].total, 0.0);
}

#[test]
fn same_seed_same_forecast() {
    let ledger = Ledger::open_in_memory().unwrap();
    for (m, price) in [(1, 80.0), (2, 95.0), (3, 90.0), (4, 120.0)] {
        record(&ledger, price, CostPeriod::Month, 2024, m);
    }

    let request =
        ForecastRequest::new(6, Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap()).unwrap();
    let engine = ForecastEngine::new(&ledger);
    let first = engine
        .generate_cost_forecast(&request, &mut RandomJitter::seeded(11))
        .unwrap();
    let second = engine
        .generate_cost_forecast(&request, &mut RandomJitter::seeded(11))
        .unwrap();

    let a: Vec<f64> = first.forecast.values().map(|b| b.forecasted_total).collect();
    let b: Vec<f64> = second.forecast.values().map(|b| b.forecasted_total).collect();
    assert_eq!(a, b);
    assert_eq!(first.metadata.trend_direction, TrendDirection::Increasing);
    assert!(a.iter().all(|total| *total >= 0.0));
}

#[test]
fn category_filter_requires_category_support() {
    let ledger = Ledger::open_in_memory().unwrap().with_categories(false);
    let request = ForecastRequest::new(3, Utc::now())
        .unwrap()
        .with_category(Some(2));

    let err = ForecastEngine::new(&ledger)
        .generate_cost_forecast(&request, &mut FixedJitter::default())
        .unwrap_err();
    assert!(matches!(err, CostcalcError::InvalidParameter { ref name, .. } if name == "category_id"));
}

#[test]
fn empty_ledger_yields_zero_forecast() {
    let ledger = Ledger::open_in_memory().unwrap();
    let request =
        ForecastRequest::new(2, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()).unwrap();

    let result = ForecastEngine::new(&ledger)
        .generate_cost_forecast(&request, &mut RandomJitter::seeded(3))
        .unwrap();

    assert_eq!(result.forecast.len(), 2);
    assert!(result.forecast.values().all(|b| b.forecasted_total == 0.0));
    assert_eq!(result.metadata.trend_direction, TrendDirection::Stable);
}
