use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use apistub::config::{ClientOptions, MatchStrategy, ServiceConfig};
use apistub::fallback::FallbackGenerator;
use apistub::server::{build_app, AppState};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    BaseUrl,
    ExactUrl,
}

impl From<StrategyArg> for MatchStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::BaseUrl => MatchStrategy::BaseUrl,
            StrategyArg::ExactUrl => MatchStrategy::ExactUrl,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "apistub", version, about = "Catalog-backed API stub with LLM error fallback")]
struct Args {
    /// Bind address.
    #[arg(long, env = "APISTUB_BIND", default_value = "0.0.0.0:8001")]
    bind: String,

    /// JSON catalog of known endpoints, read on every request.
    #[arg(long, env = "APISTUB_CATALOG", default_value = "output.json")]
    catalog: PathBuf,

    /// LLM provider: gemini or anthropic (Bedrock).
    #[arg(long, env = "APISTUB_PROVIDER", default_value = "gemini")]
    provider: String,

    /// Model name; defaults to the provider's default model.
    #[arg(long, env = "APISTUB_MODEL")]
    model: Option<String>,

    #[arg(long, env = "APISTUB_MATCH_STRATEGY", value_enum, default_value = "base-url")]
    match_strategy: StrategyArg,

    /// Return any JSON the model produces instead of requiring
    /// error_code/error_message/error_details.
    #[arg(long, env = "APISTUB_LENIENT_LLM_OUTPUT")]
    lenient_llm_output: bool,

    /// Abort vendor calls after this many seconds.
    #[arg(long, env = "APISTUB_LLM_TIMEOUT_SECS")]
    llm_timeout_secs: Option<u64>,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn into_config(self) -> Result<ServiceConfig> {
        let api = apistub::resolve_api(&self.provider, self.model.as_deref())?;

        let mut client_options = ClientOptions::default();
        if let Some(secs) = self.llm_timeout_secs {
            client_options = client_options.with_timeout(Duration::from_secs(secs));
        }

        Ok(ServiceConfig {
            bind: self.bind,
            catalog_path: self.catalog,
            api,
            match_strategy: self.match_strategy.into(),
            strict_llm_output: !self.lenient_llm_output,
            client_options,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials commonly live in a local .env file.
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.debug {
            EnvFilter::new("apistub=debug")
        } else {
            EnvFilter::new("apistub=info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = args.into_config()?;

    let client = apistub::new_client_with_options(config.api.clone(), config.client_options.clone())
        .context("configure LLM provider")?;
    let fallback = FallbackGenerator::new(Arc::from(client))
        .with_strict_output(config.strict_llm_output);

    let state = Arc::new(AppState {
        catalog_path: config.catalog_path.clone(),
        match_strategy: config.match_strategy,
        fallback,
    });
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("bind {}", config.bind))?;

    let (provider, model) = config.api.to_strings();
    info!(
        bind = %config.bind,
        catalog = %config.catalog_path.display(),
        %provider,
        %model,
        strategy = config.match_strategy.as_str(),
        "apistub listening"
    );

    axum::serve(listener, app).await.context("serve")
}
