use quotedesk_core::{ApiResponse, ErrorDetail, MarketService};

use crate::cli::MarketCommand;
use crate::error::CliError;

use super::CommandOutput;

pub async fn run(
    command: &MarketCommand,
    service: &MarketService,
    detail: ErrorDetail,
) -> Result<CommandOutput, CliError> {
    match command {
        MarketCommand::Overview => {
            CommandOutput::from_result(service.overview().await.map(ApiResponse::ok), detail)
        }
        MarketCommand::Sectors(args) => CommandOutput::from_result(
            service.sectors(args.limit).await.map(ApiResponse::ok),
            detail,
        ),
        MarketCommand::Trending(args) => CommandOutput::from_result(
            service.trending(args.limit).await.map(ApiResponse::ok),
            detail,
        ),
        MarketCommand::Statistics => {
            CommandOutput::from_result(service.statistics().await.map(ApiResponse::ok), detail)
        }
        MarketCommand::Indices => {
            CommandOutput::from_result(service.indices().await.map(ApiResponse::ok), detail)
        }
        MarketCommand::Gainers(args) => CommandOutput::from_result(
            service.top_gainers(args.limit).await.map(ApiResponse::ok),
            detail,
        ),
        MarketCommand::Losers(args) => CommandOutput::from_result(
            service.top_losers(args.limit).await.map(ApiResponse::ok),
            detail,
        ),
        MarketCommand::Volume(args) => CommandOutput::from_result(
            service.top_volume(args.limit).await.map(ApiResponse::ok),
            detail,
        ),
        MarketCommand::Find(args) => CommandOutput::from_result(
            service.find_stocks(&args.query).await.map(ApiResponse::ok),
            detail,
        ),
    }
}
