mod scan;
mod sources;
mod universe;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::CommandOutput;

pub async fn run(cli: &Cli) -> Result<CommandOutput, CliError> {
    match &cli.command {
        Command::Scan(args) => scan::run(args).await,
        Command::Sources(args) => sources::run(args),
        Command::Universe(args) => universe::run(args).await,
    }
}
