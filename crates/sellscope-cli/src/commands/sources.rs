//! `sources`: provider availability and constraint matrix.

use serde_json::json;

use sellscope_core::{ProviderId, ProviderPolicy, TrackerConfig};

use crate::cli::SourcesArgs;
use crate::error::CliError;
use crate::output::CommandOutput;

pub fn run(_args: &SourcesArgs) -> Result<CommandOutput, CliError> {
    let config = TrackerConfig::from_env();

    let mut rows = Vec::new();
    let mut table = vec![format!(
        "{:<20} {:>10} {:>12} {:>12}",
        "source", "configured", "quota", "ticker_cap"
    )];

    for id in ProviderId::ALL {
        let configured = config.api_key_for(id).is_some();
        let policy = ProviderPolicy::default_for(id, config.fmp_free_tier);

        rows.push(json!({
            "source": id,
            "configured": configured,
            "quota_limit": policy.quota_limit,
            "quota_window_secs": policy.quota_window.as_secs(),
            "ticker_cap": policy.ticker_cap,
        }));
        table.push(format!(
            "{:<20} {:>10} {:>12} {:>12}",
            id.as_str(),
            if configured { "yes" } else { "no" },
            format!("{}/{}s", policy.quota_limit, policy.quota_window.as_secs()),
            policy
                .ticker_cap
                .map(|cap| cap.to_string())
                .unwrap_or_else(|| String::from("-")),
        ));
    }

    Ok(CommandOutput::new(json!({ "sources": rows })).with_table(table))
}
