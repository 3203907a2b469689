//! Configuration validation.
//!
//! Validates every config field before any data is read. The typed readers
//! ([`enabled_alphas`], [`factor_settings`], [`parse_date`]) are shared with
//! the CLI so a value is parsed the same way it was validated.

use crate::domain::alpha::momentum::parse_window_pairs;
use crate::domain::alpha::{parse_factor_list, FactorKind, FactorSettings};
use crate::domain::error::AlphatraderError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// Alphas run when `[alphas] enabled` is absent.
pub const DEFAULT_ALPHAS: [FactorKind; 3] = [
    FactorKind::PriceRatio,
    FactorKind::MeanReversion,
    FactorKind::Momentum,
];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), AlphatraderError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    validate_exchange(config)?;
    validate_codes(config)?;
    staleness_window(config)?;
    let alphas = enabled_alphas(config)?;
    factor_settings(config)?;
    validate_benchmark(config, &alphas)?;
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), AlphatraderError> {
    let value = config.get_double("backtest", "initial_capital", 100_000.0);
    if value <= 0.0 || !value.is_finite() {
        return Err(AlphatraderError::invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), AlphatraderError> {
    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;

    if start_date >= end_date {
        return Err(AlphatraderError::invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

/// Reads a required `[backtest]` date in `YYYY-MM-DD` form.
pub fn parse_date(config: &dyn ConfigPort, field: &str) -> Result<NaiveDate, AlphatraderError> {
    match config.get_string("backtest", field) {
        None => Err(AlphatraderError::missing("backtest", field)),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            AlphatraderError::invalid(
                "backtest",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_exchange(config: &dyn ConfigPort) -> Result<(), AlphatraderError> {
    match config.get_string("backtest", "exchange") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(AlphatraderError::missing("backtest", "exchange")),
    }
}

fn validate_codes(config: &dyn ConfigPort) -> Result<(), AlphatraderError> {
    let codes = config.get_string("backtest", "codes");
    let code = config.get_string("backtest", "code");

    match (codes, code) {
        (Some(c), _) if !c.trim().is_empty() => Ok(()),
        (None, Some(c)) if !c.trim().is_empty() => Ok(()),
        _ => Err(AlphatraderError::missing("backtest", "code")),
    }
}

fn validate_benchmark(
    config: &dyn ConfigPort,
    alphas: &[FactorKind],
) -> Result<(), AlphatraderError> {
    if !alphas.contains(&FactorKind::Regime) {
        return Ok(());
    }
    match config.get_string("backtest", "benchmark") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(AlphatraderError::missing("backtest", "benchmark")),
    }
}

pub fn staleness_window(config: &dyn ConfigPort) -> Result<usize, AlphatraderError> {
    positive_usize(
        config,
        "backtest",
        "staleness_window",
        crate::domain::instrument::DEFAULT_STALENESS_WINDOW,
    )
}

/// The `[alphas] enabled` list, or [`DEFAULT_ALPHAS`] when absent.
pub fn enabled_alphas(config: &dyn ConfigPort) -> Result<Vec<FactorKind>, AlphatraderError> {
    match config.get_string("alphas", "enabled") {
        None => Ok(DEFAULT_ALPHAS.to_vec()),
        Some(list) => {
            parse_factor_list(&list).map_err(|reason| AlphatraderError::invalid("alphas", "enabled", reason))
        }
    }
}

pub fn factor_settings(config: &dyn ConfigPort) -> Result<FactorSettings, AlphatraderError> {
    let defaults = FactorSettings::default();

    let momentum_windows = match config.get_string("momentum", "windows") {
        None => defaults.momentum_windows,
        Some(s) => parse_window_pairs(&s)
            .map_err(|reason| AlphatraderError::invalid("momentum", "windows", reason))?,
    };

    Ok(FactorSettings {
        price_ratio_window: positive_usize(config, "price_ratio", "window", defaults.price_ratio_window)?,
        mean_reversion_window: positive_usize(
            config,
            "mean_reversion",
            "window",
            defaults.mean_reversion_window,
        )?,
        momentum_windows,
        regime_trend_period: positive_usize(config, "regime", "ma_period", defaults.regime_trend_period)?,
    })
}

fn positive_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, AlphatraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) => match s.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(AlphatraderError::invalid(
                section,
                key,
                format!("{} must be a positive integer", key),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const BASE: &str = "[backtest]\ninitial_capital = 100000\nstart_date = 2020-01-01\nend_date = 2024-12-31\nexchange = US\ncodes = AAPL,MSFT\n";

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn with(extra: &str) -> FileConfigAdapter {
        make_config(&format!("{}{}", BASE, extra))
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
initial_capital = 100000.0
start_date = 2020-01-01
end_date = 2024-12-31
exchange = US
codes = AAPL,MSFT,GOOG
benchmark = SPY
staleness_window = 5

[alphas]
enabled = price_ratio,mean_reversion,momentum,regime

[momentum]
windows = 10:50,20:100

[regime]
ma_period = 100
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let config = make_config("[backtest]\ninitial_capital = -100\nstart_date = 2020-01-01\nend_date = 2024-12-31\nexchange = US\ncode = AAPL\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, AlphatraderError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let config = make_config("[backtest]\nstart_date = 2020/01/01\nend_date = 2024-12-31\nexchange = US\ncode = AAPL\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, AlphatraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn missing_end_date_fails() {
        let config = make_config("[backtest]\nstart_date = 2020-01-01\nexchange = US\ncode = AAPL\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, AlphatraderError::ConfigMissing { key, .. } if key == "end_date"));
    }

    #[test]
    fn start_date_after_end_date_fails() {
        let config = make_config("[backtest]\nstart_date = 2024-12-31\nend_date = 2020-01-01\nexchange = US\ncode = AAPL\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, AlphatraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn missing_exchange_fails() {
        let config = make_config("[backtest]\nstart_date = 2020-01-01\nend_date = 2024-12-31\ncode = AAPL\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, AlphatraderError::ConfigMissing { key, .. } if key == "exchange"));
    }

    #[test]
    fn missing_code_fails() {
        let config = make_config("[backtest]\nstart_date = 2020-01-01\nend_date = 2024-12-31\nexchange = US\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, AlphatraderError::ConfigMissing { key, .. } if key == "code"));
    }

    #[test]
    fn staleness_window_zero_fails() {
        let err = validate_backtest_config(&with("staleness_window = 0\n")).unwrap_err();
        assert!(
            matches!(err, AlphatraderError::ConfigInvalid { key, .. } if key == "staleness_window")
        );
    }

    #[test]
    fn unknown_alpha_fails() {
        let err = validate_backtest_config(&with("[alphas]\nenabled = momentum,alpha9\n")).unwrap_err();
        assert!(matches!(err, AlphatraderError::ConfigInvalid { section, .. } if section == "alphas"));
    }

    #[test]
    fn regime_requires_benchmark() {
        let err = validate_backtest_config(&with("[alphas]\nenabled = regime\n")).unwrap_err();
        assert!(matches!(err, AlphatraderError::ConfigMissing { key, .. } if key == "benchmark"));
    }

    #[test]
    fn bad_momentum_windows_fail() {
        let err = validate_backtest_config(&with("[momentum]\nwindows = 50:10\n")).unwrap_err();
        assert!(matches!(err, AlphatraderError::ConfigInvalid { section, .. } if section == "momentum"));
    }

    #[test]
    fn non_numeric_window_fails() {
        let err = validate_backtest_config(&with("[price_ratio]\nwindow = twelve\n")).unwrap_err();
        assert!(
            matches!(err, AlphatraderError::ConfigInvalid { section, key, .. } if section == "price_ratio" && key == "window")
        );
    }

    #[test]
    fn enabled_alphas_defaults() {
        assert_eq!(enabled_alphas(&with("")).unwrap(), DEFAULT_ALPHAS.to_vec());
    }

    #[test]
    fn factor_settings_reads_overrides() {
        let config = with("[price_ratio]\nwindow = 5\n[momentum]\nwindows = 2:4\n[regime]\nma_period = 50\n");
        let settings = factor_settings(&config).unwrap();
        assert_eq!(settings.price_ratio_window, 5);
        assert_eq!(settings.mean_reversion_window, 12);
        assert_eq!(settings.momentum_windows, vec![(2, 4)]);
        assert_eq!(settings.regime_trend_period, 50);
    }

    #[test]
    fn factor_settings_defaults() {
        assert_eq!(factor_settings(&with("")).unwrap(), FactorSettings::default());
        assert_eq!(staleness_window(&with("")).unwrap(), 5);
    }
}
