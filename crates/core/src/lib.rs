pub mod domain;
pub mod error;
pub mod forecast;
pub mod market;
pub mod pipeline;
pub mod report;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::str::FromStr;

    /// Longest trailing history a run may request, in calendar days.
    pub const MAX_HISTORY_DAYS: i64 = 3650;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub market_data_base_url: Option<String>,
        pub market_data_timeout_secs: Option<u64>,
        pub market_data_retries: Option<u32>,
        pub ticker_timeout_secs: Option<u64>,
        pub history_days: Option<i64>,
        pub port: Option<u16>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let history_days = parse_var::<i64>(&lookup, "HISTORY_DAYS")?;
            if let Some(days) = history_days {
                anyhow::ensure!(
                    (2..=MAX_HISTORY_DAYS).contains(&days),
                    "HISTORY_DAYS must be between 2 and {MAX_HISTORY_DAYS} (got {days})"
                );
            }

            Ok(Self {
                sentry_dsn: lookup("SENTRY_DSN"),
                market_data_base_url: lookup("MARKET_DATA_BASE_URL")
                    .filter(|s| !s.trim().is_empty()),
                market_data_timeout_secs: parse_var(&lookup, "MARKET_DATA_TIMEOUT_SECS")?,
                market_data_retries: parse_var(&lookup, "MARKET_DATA_RETRIES")?,
                ticker_timeout_secs: parse_var(&lookup, "TICKER_TIMEOUT_SECS")?,
                history_days,
                port: parse_var(&lookup, "PORT")?,
            })
        }
    }

    fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match lookup(key) {
            Some(s) if !s.trim().is_empty() => s
                .trim()
                .parse::<T>()
                .map(Some)
                .with_context(|| format!("{key} has an invalid value {s:?}")),
            _ => Ok(None),
        }
    }

}
