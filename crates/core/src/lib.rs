pub mod advisory;
pub mod analytics;
pub mod decision;
pub mod domain;
pub mod explain;
pub mod ingest;
pub mod policy;
pub mod portfolio;
pub mod scoring;
pub mod simulation;
pub mod time;

#[cfg(test)]
pub(crate) mod testing;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub universe_path: Option<String>,
        pub universe_base_url: Option<String>,
        pub universe_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                universe_path: non_empty_var("UNIVERSE_PATH"),
                universe_base_url: non_empty_var("UNIVERSE_BASE_URL"),
                universe_api_key: non_empty_var("UNIVERSE_API_KEY"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_universe_base_url(&self) -> anyhow::Result<&str> {
            self.universe_base_url
                .as_deref()
                .context("UNIVERSE_BASE_URL is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}
