use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Command result carrying both renderings: the JSON payload and the
/// pre-formatted table lines.
pub struct CommandOutput {
    pub data: Value,
    pub table: Vec<String>,
}

impl CommandOutput {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            table: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: Vec<String>) -> Self {
        self.table = table;
        self
    }
}

pub fn render(output: &CommandOutput, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(&output.data)?
            } else {
                serde_json::to_string(&output.data)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => {
            if output.table.is_empty() {
                let pretty_data = serde_json::to_string_pretty(&output.data)?;
                println!("{pretty_data}");
            } else {
                for line in &output.table {
                    println!("{line}");
                }
            }
        }
    }
    Ok(())
}

/// Minimal CSV quoting: wrap fields containing separators or quotes.
pub fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(csv_field("AAPL"), "AAPL");
        assert_eq!(csv_field("COOK, TIMOTHY"), "\"COOK, TIMOTHY\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
