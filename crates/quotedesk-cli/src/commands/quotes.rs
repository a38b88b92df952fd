use quotedesk_core::{ApiResponse, ErrorDetail, MarketService};

use crate::cli::{QuoteArgs, SearchArgs};
use crate::error::CliError;

use super::CommandOutput;

fn message(cached: bool, from_cache: &'static str, fetched: &'static str) -> &'static str {
    if cached {
        from_cache
    } else {
        fetched
    }
}

pub async fn stocks(service: &MarketService, detail: ErrorDetail) -> Result<CommandOutput, CliError> {
    let result = service.all_quotes().await.map(|quotes| {
        let text = message(
            quotes.cached,
            "Stocks retrieved from cache",
            "Stocks retrieved successfully",
        );
        ApiResponse::from_cached(quotes, text)
    });
    CommandOutput::from_result(result, detail)
}

pub async fn quote(
    args: &QuoteArgs,
    service: &MarketService,
    detail: ErrorDetail,
) -> Result<CommandOutput, CliError> {
    let result = service.quote(&args.symbol).await.map(|quote| {
        let text = message(
            quote.cached,
            "Stock data from cache",
            "Stock data retrieved successfully",
        );
        ApiResponse::from_cached(quote, text)
    });
    CommandOutput::from_result(result, detail)
}

pub async fn search(
    args: &SearchArgs,
    service: &MarketService,
    detail: ErrorDetail,
) -> Result<CommandOutput, CliError> {
    let result = service.search(&args.query).await.map(|hits| {
        let text = message(
            hits.cached,
            "Search results from cache",
            "Search completed successfully",
        );
        ApiResponse::from_cached(hits, text)
    });
    CommandOutput::from_result(result, detail)
}
