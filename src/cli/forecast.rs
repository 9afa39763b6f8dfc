//! Forecast command implementation.

use crate::cli::Context;
use crate::cli::args::ForecastArgs;
use crate::core::forecast::{ForecastEngine, ForecastRequest};
use crate::core::models::{CostPeriod, ForecastResult};
use crate::core::predictor::RandomJitter;
use crate::core::query::CostRecordQuery;
use crate::error::{CostcalcError, Result};
use crate::storage::cache::{ResultCache, forecast_key};
use crate::util::time::resolve_as_of;

/// Execute the forecast command.
///
/// The ledger is read on a blocking thread.
///
/// # Errors
/// Returns `InvalidParameter` for a bad horizon, period, month or category
/// filter, or any storage error.
pub async fn execute(args: ForecastArgs, ctx: &Context) -> Result<()> {
    let request = build_request(&args, ctx.config.default_months)?;

    tracing::debug!(
        months = request.months_ahead(),
        as_of = %request.as_of(),
        seed = ?args.seed,
        no_cache = args.no_cache,
        "Starting forecast"
    );

    let task_ctx = ctx.clone();
    let seed = args.seed;
    let use_cache = !args.no_cache;
    let result = tokio::task::spawn_blocking(move || {
        let ledger = task_ctx.open_ledger()?;
        forecast_cached(&ledger, &request, &task_ctx.cache(), seed, use_cache)
    })
    .await
    .map_err(|e| CostcalcError::Other(anyhow::anyhow!("forecast task failed: {e}")))??;

    ctx.emit(&result)
}

/// Validate command-line input into a request.
///
/// # Errors
/// Returns `InvalidParameter` for an out-of-range horizon or unknown period,
/// or an error for a malformed `--as-of` month.
pub fn build_request(args: &ForecastArgs, default_months: i64) -> Result<ForecastRequest> {
    let months = args.months.unwrap_or(default_months);
    let as_of = resolve_as_of(args.as_of.as_deref())?;
    let period = args
        .period
        .as_deref()
        .map(CostPeriod::parse_arg)
        .transpose()?;

    Ok(ForecastRequest::new(months, as_of)?
        .with_period(period)
        .with_category(args.category))
}

/// Run a forecast, reusing a cached result for the same parameters.
///
/// Without a seed the jitter comes from the OS, and the cache keeps repeated
/// runs consistent until the entry expires or the ledger changes.
///
/// # Errors
/// Returns any error from the engine or record source.
pub fn forecast_cached<Q: CostRecordQuery>(
    query: Q,
    request: &ForecastRequest,
    cache: &ResultCache,
    seed: Option<u64>,
    use_cache: bool,
) -> Result<ForecastResult> {
    let engine = ForecastEngine::new(query);
    let compute = || {
        let mut jitter = seed.map_or_else(RandomJitter::from_os, RandomJitter::seeded);
        engine.generate_cost_forecast(request, &mut jitter)
    };

    if !use_cache {
        return compute();
    }

    let key = forecast_key(request.as_of(), request.months_ahead(), request.filter(), seed);
    cache.remember(&key, compute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::InMemoryRecords;
    use crate::test_utils::{at_date, make_test_record};

    fn args(months: Option<i64>) -> ForecastArgs {
        ForecastArgs {
            months,
            as_of: Some("2025-03".to_string()),
            ..ForecastArgs::default()
        }
    }

    fn records() -> InMemoryRecords {
        InMemoryRecords::new(vec![
            make_test_record(1, 100.0, CostPeriod::Month, at_date(2025, 1, 10)),
            make_test_record(2, 120.0, CostPeriod::Month, at_date(2025, 2, 10)),
            make_test_record(3, 140.0, CostPeriod::Month, at_date(2025, 3, 10)),
        ])
    }

    #[test]
    fn default_months_apply_when_flag_is_absent() {
        let request = build_request(&args(None), 6).unwrap();
        assert_eq!(request.months_ahead(), 6);
        assert_eq!(request.as_of().to_string(), "2025-03");
    }

    #[test]
    fn horizon_is_validated() {
        for months in [0, 25, -1] {
            let err = build_request(&args(Some(months)), 6).unwrap_err();
            assert!(
                matches!(err, CostcalcError::InvalidParameter { ref name, .. } if name == "months"),
                "months={months} gave {err:?}"
            );
        }
    }

    #[test]
    fn unknown_period_is_rejected() {
        let mut a = args(Some(3));
        a.period = Some("fortnightly".to_string());
        assert!(build_request(&a, 6).is_err());
    }

    #[test]
    fn seeded_forecasts_are_reproducible() {
        let cache = ResultCache::disabled(std::env::temp_dir());
        let request = build_request(&args(Some(3)), 6).unwrap();
        let first = forecast_cached(records(), &request, &cache, Some(42), false).unwrap();
        let second = forecast_cached(records(), &request, &cache, Some(42), false).unwrap();
        assert_eq!(first.forecast, second.forecast);
        assert_eq!(first.forecast.len(), 3);
    }

    #[test]
    fn cached_result_is_reused_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(dir.path().to_path_buf(), 60);
        let request = build_request(&args(Some(2)), 6).unwrap();

        let march = request.as_of();
        let first = forecast_cached(records(), &request, &cache, None, true).unwrap();
        assert!((first.historical[&march].total - 140.0).abs() < 1e-9);

        // Different data, same key: the cached forecast wins.
        let second =
            forecast_cached(InMemoryRecords::default(), &request, &cache, None, true).unwrap();
        assert!((second.historical[&march].total - 140.0).abs() < 1e-9);
        assert_eq!(second.forecast.len(), first.forecast.len());

        cache.invalidate_derived().unwrap();
        let third =
            forecast_cached(InMemoryRecords::default(), &request, &cache, None, true).unwrap();
        assert!(third.historical.values().all(|bucket| bucket.count == 0));
        assert!(third.forecast.values().all(|bucket| bucket.forecasted_total.abs() < f64::EPSILON));
    }
}
