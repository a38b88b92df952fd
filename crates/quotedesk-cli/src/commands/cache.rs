use quotedesk_core::{ApiResponse, MarketService};

use crate::cli::CacheCommand;
use crate::error::CliError;

use super::CommandOutput;

pub fn run(command: &CacheCommand, service: &MarketService) -> Result<CommandOutput, CliError> {
    match command {
        CacheCommand::Stats => {
            let response =
                ApiResponse::ok(service.cache_stats()).with_message("Cache statistics retrieved");
            CommandOutput::success(&response)
        }
        CacheCommand::Clear => {
            service.clear_cache();
            CommandOutput::success(&ApiResponse::message_only("Cache cleared successfully"))
        }
    }
}
