use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::data_source::{QuoteSource, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpErrorKind, HttpRequest};
use crate::throttling::UpstreamThrottle;
use crate::{validate_currency_code, SearchHit, StockQuote, Symbol, UtcDateTime};

/// Yahoo Finance chart/search adapter.
///
/// Every call waits for throttle budget, then runs under the configured
/// deadline (single or batch). Upstream-reported change figures are ignored
/// and recomputed from the two prices.
#[derive(Clone)]
pub struct YahooQuoteAdapter {
    http_client: Arc<dyn HttpClient>,
    config: UpstreamConfig,
    throttle: UpstreamThrottle,
}

impl YahooQuoteAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, config: UpstreamConfig) -> Self {
        let throttle = UpstreamThrottle::per_minute(config.requests_per_minute);
        Self::with_throttle(http_client, config, throttle)
    }

    pub fn with_throttle(
        http_client: Arc<dyn HttpClient>,
        config: UpstreamConfig,
        throttle: UpstreamThrottle,
    ) -> Self {
        Self {
            http_client,
            config,
            throttle,
        }
    }

    fn chart_url(&self, tickers: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.config.base_url, tickers)
    }

    fn ticker(&self, symbol: &Symbol) -> String {
        urlencoding::encode(&symbol.with_suffix(&self.config.symbol_suffix)).into_owned()
    }

    async fn get_json<T>(&self, url: String, deadline: Duration) -> Result<T, SourceError>
    where
        T: DeserializeOwned,
    {
        let request = HttpRequest::get(url.as_str())
            .with_header("user-agent", self.config.user_agent.as_str())
            .with_timeout_ms(u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX));

        debug!(%url, "upstream request");
        let call = async {
            self.throttle.acquire().await;
            self.http_client.execute(request).await
        };

        let response = match tokio::time::timeout(deadline, call).await {
            Err(_) => {
                return Err(log_failure(
                    &url,
                    SourceError::timeout(format!(
                        "upstream did not answer within {}ms",
                        deadline.as_millis()
                    )),
                ))
            }
            Ok(Err(err)) => {
                let message = format!("upstream transport error: {}", err.message());
                let classified = match err.kind() {
                    HttpErrorKind::ConnectionRefused => SourceError::unavailable(message),
                    HttpErrorKind::Connect => SourceError::network(message),
                    HttpErrorKind::Timeout => SourceError::timeout(message),
                    HttpErrorKind::Other => SourceError::internal(message),
                };
                return Err(log_failure(&url, classified));
            }
            Ok(Ok(response)) => response,
        };

        if !response.is_success() {
            let message = format!("upstream returned status {}", response.status);
            let classified = match response.status {
                404 => SourceError::not_found(message),
                429 => SourceError::rate_limited(message),
                _ => SourceError::internal(message),
            };
            return Err(log_failure(&url, classified));
        }

        serde_json::from_str(&response.body).map_err(|err| {
            log_failure(
                &url,
                SourceError::internal(format!("failed to parse upstream response: {err}")),
            )
        })
    }

    async fn fetch_one_inner(&self, symbol: &Symbol) -> Result<StockQuote, SourceError> {
        let url = self.chart_url(&self.ticker(symbol));
        let response: ChartResponse = self.get_json(url, self.config.single_timeout).await?;

        let meta = response
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .map(|result| result.meta)
            .ok_or_else(|| SourceError::not_found(format!("no data found for symbol: {symbol}")))?;

        Ok(normalize_chart_meta(
            symbol.clone(),
            meta,
            &self.config.default_currency,
        ))
    }

    async fn fetch_many_inner(&self, symbols: &[Symbol]) -> Result<Vec<StockQuote>, SourceError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let tickers = symbols
            .iter()
            .map(|symbol| self.ticker(symbol))
            .collect::<Vec<_>>()
            .join(",");
        let url = self.chart_url(&tickers);
        let response: ChartResponse = self.get_json(url, self.config.batch_timeout).await?;

        let results = response
            .chart
            .result
            .ok_or_else(|| SourceError::not_found("no data received for batch request"))?;

        let quotes = results
            .into_iter()
            .filter_map(|result| {
                let raw = result.meta.symbol.clone().unwrap_or_default();
                let bare = raw.strip_suffix(&self.config.symbol_suffix).unwrap_or(&raw);
                match Symbol::parse(bare) {
                    Ok(symbol) => Some(normalize_chart_meta(
                        symbol,
                        result.meta,
                        &self.config.default_currency,
                    )),
                    Err(err) => {
                        warn!(symbol = %raw, error = %err, "skipping chart result with unusable symbol");
                        None
                    }
                }
            })
            .collect();

        Ok(quotes)
    }

    async fn search_inner(&self, query: &str) -> Result<Vec<SearchHit>, SourceError> {
        let url = format!(
            "{}/v1/finance/search?q={}",
            self.config.base_url,
            urlencoding::encode(query)
        );
        let response: SearchResponse = self.get_json(url, self.config.single_timeout).await?;

        let hits = response
            .quotes
            .unwrap_or_default()
            .into_iter()
            .filter(|quote| quote.exchange.as_deref() == Some(self.config.exchange.as_str()))
            .filter_map(|quote| {
                let bare = quote
                    .symbol
                    .strip_suffix(&self.config.symbol_suffix)
                    .unwrap_or(&quote.symbol);
                let symbol = Symbol::parse(bare).ok()?;
                let name = quote
                    .shortname
                    .or(quote.longname)
                    .unwrap_or_else(|| symbol.to_string());
                Some(SearchHit {
                    symbol,
                    name,
                    exchange: self.config.exchange.clone(),
                })
            })
            .collect();

        Ok(hits)
    }
}

impl QuoteSource for YahooQuoteAdapter {
    fn fetch_one<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, StockQuote> {
        Box::pin(self.fetch_one_inner(symbol))
    }

    fn fetch_many<'a>(&'a self, symbols: &'a [Symbol]) -> SourceFuture<'a, Vec<StockQuote>> {
        Box::pin(self.fetch_many_inner(symbols))
    }

    fn search<'a>(&'a self, query: &'a str) -> SourceFuture<'a, Vec<SearchHit>> {
        Box::pin(self.search_inner(query))
    }
}

fn log_failure(url: &str, error: SourceError) -> SourceError {
    warn!(%url, code = error.code(), "upstream call failed: {}", error.message());
    error
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
}

/// Quote fields of a chart result's `meta` object. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: Option<String>,
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub regular_market_volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub currency: Option<String>,
    pub instrument_info: Option<InstrumentInfo>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentInfo {
    pub short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Option<Vec<SearchQuote>>,
}

#[derive(Debug, Deserialize)]
struct SearchQuote {
    symbol: String,
    #[serde(default)]
    shortname: Option<String>,
    #[serde(default)]
    longname: Option<String>,
    #[serde(default)]
    exchange: Option<String>,
}

/// Maps a chart `meta` object onto the canonical record.
///
/// | Field | Source | Default |
/// |-------|--------|---------|
/// | `name` | `instrumentInfo.shortName`, `shortName`, `longName` | the symbol |
/// | `current_price` | `regularMarketPrice` | 0 |
/// | `previous_close` | `previousClose` | 0 |
/// | `volume` | `regularMarketVolume` | 0 |
/// | `market_cap` | `marketCap` | 0 |
/// | `currency` | `currency` (3-letter code) | `default_currency` |
/// | `sector` | not supplied upstream | `None` |
///
/// Negative or non-finite numbers count as absent.
pub fn normalize_chart_meta(symbol: Symbol, meta: ChartMeta, default_currency: &str) -> StockQuote {
    let name = meta
        .instrument_info
        .and_then(|info| info.short_name)
        .or(meta.short_name)
        .or(meta.long_name)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| symbol.to_string());

    let currency = meta
        .currency
        .as_deref()
        .and_then(|code| validate_currency_code(code).ok())
        .unwrap_or_else(|| default_currency.to_owned());

    let current_price = non_negative(meta.regular_market_price);
    let previous_close = non_negative(meta.previous_close);
    let volume = non_negative(meta.regular_market_volume).round() as u64;
    let market_cap = non_negative(meta.market_cap);

    StockQuote::from_prices(
        symbol,
        name,
        None,
        current_price,
        previous_close,
        volume,
        market_cap,
        currency,
        UtcDateTime::now(),
    )
}

fn non_negative(value: Option<f64>) -> f64 {
    value
        .filter(|number| number.is_finite() && *number >= 0.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::{HttpError, HttpResponse};

    struct RecordingHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn replying(response: Result<HttpResponse, HttpError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .iter()
                .map(|request| request.url.clone())
                .collect()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn adapter(client: Arc<RecordingHttpClient>) -> YahooQuoteAdapter {
        YahooQuoteAdapter::new(client, UpstreamConfig::default())
    }

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("valid symbol")
    }

    #[test]
    fn empty_meta_normalizes_to_zeroes() {
        let quote = normalize_chart_meta(symbol("UPP"), ChartMeta::default(), "AED");

        assert_eq!(quote.name, "UPP");
        assert_eq!(quote.currency, "AED");
        assert_eq!(quote.current_price, 0.0);
        assert_eq!(quote.change_percent, 0.0);
        assert_eq!(quote.volume, 0);
        assert!(quote.sector.is_none());
    }

    #[test]
    fn zero_previous_close_yields_zero_percent() {
        let meta = ChartMeta {
            regular_market_price: Some(12.0),
            previous_close: Some(0.0),
            ..ChartMeta::default()
        };
        let quote = normalize_chart_meta(symbol("DEWA"), meta, "AED");

        assert_eq!(quote.change, 12.0);
        assert_eq!(quote.change_percent, 0.0);
    }

    #[test]
    fn name_prefers_instrument_short_name() {
        let meta = ChartMeta {
            instrument_info: Some(InstrumentInfo {
                short_name: Some(String::from("Emaar Properties")),
            }),
            long_name: Some(String::from("Emaar Properties PJSC")),
            currency: Some(String::from("usd")),
            ..ChartMeta::default()
        };
        let quote = normalize_chart_meta(symbol("EMAAR"), meta, "AED");

        assert_eq!(quote.name, "Emaar Properties");
        assert_eq!(quote.currency, "USD");
    }

    #[tokio::test]
    async fn single_fetch_appends_suffix() {
        let client = RecordingHttpClient::replying(Ok(HttpResponse::ok_json(
            r#"{"chart":{"result":[{"meta":{"symbol":"SALIK.AD","regularMarketPrice":3.3,"previousClose":3.0,"regularMarketVolume":1200}}],"error":null}}"#,
        )));
        let quote = adapter(Arc::clone(&client))
            .fetch_one(&symbol("salik"))
            .await
            .expect("quote");

        assert_eq!(quote.symbol.as_str(), "SALIK");
        assert_eq!(quote.volume, 1200);
        assert!((quote.change_percent - 10.0).abs() < 1e-9);
        assert_eq!(
            client.urls(),
            vec![String::from(
                "https://query1.finance.yahoo.com/v8/finance/chart/SALIK.AD"
            )]
        );
    }

    #[tokio::test]
    async fn empty_result_is_not_found() {
        let client = RecordingHttpClient::replying(Ok(HttpResponse::ok_json(
            r#"{"chart":{"result":[],"error":null}}"#,
        )));
        let err = adapter(client)
            .fetch_one(&symbol("ZZZ"))
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::UpstreamNotFound);
    }

    #[tokio::test]
    async fn batch_strips_suffix_and_joins_tickers() {
        let client = RecordingHttpClient::replying(Ok(HttpResponse::ok_json(
            r#"{"chart":{"result":[
                {"meta":{"symbol":"DU.AD","regularMarketPrice":6.0,"previousClose":6.0}},
                {"meta":{"symbol":"ENBD.AD","regularMarketPrice":18.0,"previousClose":20.0}},
                {"meta":{}}
            ]}}"#,
        )));
        let quotes = adapter(Arc::clone(&client))
            .fetch_many(&[symbol("DU"), symbol("ENBD")])
            .await
            .expect("batch");

        let symbols: Vec<&str> = quotes.iter().map(|quote| quote.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["DU", "ENBD"]);
        assert!((quotes[1].change_percent + 10.0).abs() < 1e-9);
        assert!(client.urls()[0].ends_with("/v8/finance/chart/DU.AD,ENBD.AD"));
    }

    #[tokio::test]
    async fn search_keeps_only_target_exchange() {
        let client = RecordingHttpClient::replying(Ok(HttpResponse::ok_json(
            r#"{"quotes":[
                {"symbol":"EMAAR.AD","shortname":"EMAAR PROPERTIES","exchange":"DFM"},
                {"symbol":"EMAARDEV.AD","longname":"Emaar Development PJSC","exchange":"DFM"},
                {"symbol":"EMAAR.L","shortname":"Emaar London","exchange":"LSE"}
            ]}"#,
        )));
        let hits = adapter(Arc::clone(&client))
            .search("emaar properties")
            .await
            .expect("search");

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].symbol.as_str(), "EMAAR");
        assert_eq!(hits[1].name, "Emaar Development PJSC");
        assert!(client.urls()[0].ends_with("/v1/finance/search?q=emaar%20properties"));
    }

    #[tokio::test]
    async fn classifies_statuses_and_transport_errors() {
        let cases = [
            (
                Ok(HttpResponse::with_status(404, "{}")),
                SourceErrorKind::UpstreamNotFound,
            ),
            (
                Ok(HttpResponse::with_status(429, "")),
                SourceErrorKind::UpstreamRateLimited,
            ),
            (
                Ok(HttpResponse::with_status(502, "")),
                SourceErrorKind::Internal,
            ),
            (
                Err(HttpError::refused("connection refused")),
                SourceErrorKind::UpstreamUnavailable,
            ),
            (
                Err(HttpError::connect("dns error")),
                SourceErrorKind::Network,
            ),
            (
                Err(HttpError::timeout("timed out")),
                SourceErrorKind::Timeout,
            ),
            (
                Err(HttpError::other("body decode")),
                SourceErrorKind::Internal,
            ),
            (
                Ok(HttpResponse::ok_json("<html>")),
                SourceErrorKind::Internal,
            ),
        ];

        for (response, expected) in cases {
            let err = adapter(RecordingHttpClient::replying(response))
                .fetch_one(&symbol("DU"))
                .await
                .expect_err("must fail");
            assert_eq!(err.kind(), expected);
        }
    }
}
