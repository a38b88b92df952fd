mod cache;
mod market;
mod quotes;

use std::sync::Arc;

use quotedesk_core::{
    ApiErrorResponse, ApiResponse, ErrorDetail, HttpClient, InMemorySnapshot, JsonFileSnapshot,
    MarketService, ReqwestHttpClient, SnapshotSource, SourceError,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// One rendered envelope plus whether it reports a failure.
#[derive(Debug)]
pub struct CommandOutput {
    pub body: Value,
    pub failed: bool,
}

impl CommandOutput {
    pub fn success<T: Serialize>(response: &ApiResponse<T>) -> Result<Self, CliError> {
        Ok(Self {
            body: serde_json::to_value(response)?,
            failed: false,
        })
    }

    pub fn failure(error: &SourceError, detail: ErrorDetail) -> Result<Self, CliError> {
        let response = ApiErrorResponse::from_error(error, detail);
        debug!(code = %error.code(), status = response.status(), "command failed");
        Ok(Self {
            body: serde_json::to_value(&response)?,
            failed: true,
        })
    }

    pub fn from_result<T: Serialize>(
        result: Result<ApiResponse<T>, SourceError>,
        detail: ErrorDetail,
    ) -> Result<Self, CliError> {
        match result {
            Ok(response) => Self::success(&response),
            Err(error) => Self::failure(&error, detail),
        }
    }
}

/// Builds one service and runs the selected command `--repeat` times against it.
pub async fn run(cli: &Cli) -> Result<Vec<CommandOutput>, CliError> {
    if cli.command.needs_snapshot() && cli.snapshot.is_none() {
        return Err(CliError::MissingSnapshot);
    }

    let config = cli.service_config()?;
    let detail = config.error_detail;
    let snapshot: Arc<dyn SnapshotSource> = match &cli.snapshot {
        Some(path) => Arc::new(JsonFileSnapshot::new(path)),
        None => Arc::new(InMemorySnapshot::default()),
    };
    let http_client: Arc<dyn HttpClient> =
        Arc::new(ReqwestHttpClient::new(&config.upstream.user_agent));
    let service = MarketService::from_config(&config, http_client, snapshot);

    let mut outputs = Vec::with_capacity(cli.repeat as usize);
    for _ in 0..cli.repeat {
        outputs.push(dispatch(&cli.command, &service, detail).await?);
    }
    Ok(outputs)
}

async fn dispatch(
    command: &Command,
    service: &MarketService,
    detail: ErrorDetail,
) -> Result<CommandOutput, CliError> {
    match command {
        Command::Stocks => quotes::stocks(service, detail).await,
        Command::Quote(args) => quotes::quote(args, service, detail).await,
        Command::Search(args) => quotes::search(args, service, detail).await,
        Command::Market(args) => market::run(&args.command, service, detail).await,
        Command::Cache(args) => cache::run(&args.command, service),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;
    use serde_json::json;

    use super::*;

    fn snapshot_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        let records = json!([
            {"symbol": "EMAAR", "name": "Emaar Properties", "sector": "Real Estate",
             "currentPrice": 8.5, "previousClose": 8.0, "change": 0.5, "changePercent": 6.25,
             "volume": 1000, "marketCap": 7.5e10},
            {"symbol": "DU", "name": "Emirates Integrated Telecom", "sector": "Telecommunications",
             "currentPrice": 5.0, "previousClose": 5.0, "volume": 400, "marketCap": 2.3e10,
             "isActive": false}
        ]);
        write!(file, "{records}").expect("write snapshot");
        file
    }

    #[tokio::test]
    async fn market_commands_require_snapshot() {
        let cli = Cli::try_parse_from(["quotedesk", "market", "overview"]).expect("parse");
        let err = run(&cli).await.expect_err("snapshot is required");
        assert!(matches!(err, CliError::MissingSnapshot));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn overview_runs_once_per_repeat() {
        let file = snapshot_file();
        let path = file.path().to_string_lossy().into_owned();
        let cli = Cli::try_parse_from([
            "quotedesk",
            "market",
            "overview",
            "--snapshot",
            path.as_str(),
            "--repeat",
            "2",
        ])
        .expect("parse");

        let outputs = run(&cli).await.expect("command runs");

        assert_eq!(outputs.len(), 2);
        for output in &outputs {
            assert!(!output.failed);
            assert_eq!(output.body["success"], json!(true));
            assert_eq!(output.body["data"]["totalStocks"], json!(1));
            assert_eq!(output.body["data"]["gainers"], json!(1));
        }
    }

    #[tokio::test]
    async fn out_of_range_limit_is_error_envelope() {
        let file = snapshot_file();
        let path = file.path().to_string_lossy().into_owned();
        let cli = Cli::try_parse_from([
            "quotedesk",
            "market",
            "trending",
            "--limit",
            "21",
            "--snapshot",
            path.as_str(),
        ])
        .expect("parse");

        let outputs = run(&cli).await.expect("command runs");

        assert!(outputs[0].failed);
        assert_eq!(outputs[0].body["error"]["code"], json!("VALIDATION_ERROR"));
    }

    #[tokio::test]
    async fn cache_stats_start_empty() {
        let cli = Cli::try_parse_from(["quotedesk", "cache", "stats"]).expect("parse");
        let outputs = run(&cli).await.expect("command runs");

        assert_eq!(outputs[0].body["data"]["total"], json!(0));
        assert_eq!(
            outputs[0].body["message"],
            json!("Cache statistics retrieved")
        );
    }
}
