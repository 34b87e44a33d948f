//! `universe`: print the resolved ticker universe.

use std::sync::Arc;

use serde_json::json;

use sellscope_core::http_client::ReqwestHttpClient;
use sellscope_core::{TrackerConfig, UniverseLoader};

use crate::cli::UniverseArgs;
use crate::error::CliError;
use crate::output::CommandOutput;

pub async fn run(args: &UniverseArgs) -> Result<CommandOutput, CliError> {
    let config = TrackerConfig::from_env();
    let loader = UniverseLoader::new(
        Arc::new(ReqwestHttpClient::new()),
        config.fmp_api_key.clone(),
    );

    let mut tickers = loader.load().await;
    if let Some(limit) = args.limit {
        tickers.truncate(limit);
    }

    let table: Vec<String> = std::iter::once(format!("tickers: {}", tickers.len()))
        .chain(tickers.iter().map(|t| t.as_str().to_owned()))
        .collect();

    Ok(CommandOutput::new(json!({
        "count": tickers.len(),
        "tickers": tickers,
    }))
    .with_table(table))
}
