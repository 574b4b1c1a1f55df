use crate::errors::{AnalysisError, AnalysisResult};
use crate::strategy::signals::Thresholds;

/// Tradable symbols offered when `SYMBOLS` is not set.
const DEFAULT_SYMBOLS: &[&str] = &[
    "AAPL", "GOOGL", "MSFT", "AMZN", "TSLA", "META", "NVDA", "NFLX",
    "JPM", "BAC", "WFC", "C", "GS", "MS",
    "XOM", "CVX", "COP", "SLB",
    "JNJ", "PFE", "MRK", "ABBV", "UNH",
    "KO", "PEP", "WMT", "HD", "MCD", "BRK-B", "BRK-A",
];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub market_data_base_url: String,
    pub fetch_timeout_secs: u64,
    pub symbols: Vec<String>,
    pub analysis: AnalysisConfig,
    pub initial_capital: f64,
}

/// Knobs of the numeric pipeline. Copy, passed by value into the core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    pub significance: f64,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            significance: 0.05,
            entry_threshold: 2.0,
            exit_threshold: 0.5,
        }
    }
}

impl AnalysisConfig {
    #[inline]
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            entry: self.entry_threshold,
            exit: self.exit_threshold,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> AnalysisResult<Self> {
        dotenvy::dotenv().ok();

        let server_port = env_var_or("SERVER_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| AnalysisError::Config(format!("SERVER_PORT: {e}")))?;

        let fetch_timeout_secs = env_var_or("FETCH_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| AnalysisError::Config(format!("FETCH_TIMEOUT_SECS: {e}")))?;

        let significance = parse_f64("SIGNIFICANCE_LEVEL", "0.05")?;
        let entry_threshold = parse_f64("ENTRY_THRESHOLD", "2.0")?;
        let exit_threshold = parse_f64("EXIT_THRESHOLD", "0.5")?;
        let initial_capital = parse_f64("INITIAL_CAPITAL", "100000")?;

        let symbols = match std::env::var("SYMBOLS") {
            Ok(raw) => parse_symbols(&raw),
            Err(_) => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        };

        let cfg = Self {
            server_port,
            market_data_base_url: env_var_or(
                "MARKET_DATA_BASE_URL",
                "https://query1.finance.yahoo.com",
            ),
            fetch_timeout_secs,
            symbols,
            analysis: AnalysisConfig {
                significance,
                entry_threshold,
                exit_threshold,
            },
            initial_capital,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range checks on the defaults. Thresholds and capital follow the same
    /// rules as request overrides.
    pub fn validate(&self) -> AnalysisResult<()> {
        let a = &self.analysis;
        if !(a.significance > 0.0 && a.significance < 1.0) {
            return Err(AnalysisError::Config(format!(
                "SIGNIFICANCE_LEVEL: {} not in (0, 1)",
                a.significance
            )));
        }
        for (key, value) in [
            ("ENTRY_THRESHOLD", a.entry_threshold),
            ("EXIT_THRESHOLD", a.exit_threshold),
        ] {
            if value < 0.0 {
                return Err(AnalysisError::Config(format!("{key}: {value} is negative")));
            }
        }
        if a.exit_threshold >= a.entry_threshold {
            tracing::warn!(
                entry = a.entry_threshold,
                exit = a.exit_threshold,
                "exit threshold is not below entry threshold; positions may never settle"
            );
        }
        if self.initial_capital <= 0.0 {
            return Err(AnalysisError::Config(format!(
                "INITIAL_CAPITAL: {} must be positive",
                self.initial_capital
            )));
        }
        if self.symbols.is_empty() {
            return Err(AnalysisError::Config("SYMBOLS: catalog is empty".into()));
        }
        Ok(())
    }
}

fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_f64(key: &str, default: &str) -> AnalysisResult<f64> {
    let value = env_var_or(key, default)
        .parse::<f64>()
        .map_err(|e| AnalysisError::Config(format!("{key}: {e}")))?;
    if !value.is_finite() {
        return Err(AnalysisError::Config(format!("{key}: must be finite")));
    }
    Ok(value)
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
