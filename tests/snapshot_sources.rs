//! Behavior tests for stored snapshots feeding the market views.

use std::io::Write;
use std::sync::Arc;

use quotedesk_core::{
    HttpClient, InMemorySnapshot, JsonFileSnapshot, MarketService, ReqwestHttpClient,
    ServiceConfig, SnapshotSource,
};
use serde_json::json;
use tempfile::NamedTempFile;

fn write_snapshot(records: &serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    write!(file, "{records}").expect("write snapshot");
    file
}

fn stored_records() -> serde_json::Value {
    json!([
        {
            "symbol": "EMAAR", "name": "Emaar Properties", "sector": "Real Estate",
            "currentPrice": 8.5, "previousClose": 8.0, "change": 0.5, "changePercent": 6.25,
            "volume": 1200000, "marketCap": 75000000000.0, "currency": "AED",
            "lastUpdated": "2025-06-02T10:00:00Z", "isActive": true
        },
        {
            "symbol": "DIB", "name": "Dubai Islamic Bank", "sector": "Banking",
            "currentPrice": 6.0, "previousClose": 6.2, "change": -0.2, "changePercent": -3.23,
            "volume": 800000, "marketCap": 43000000000.0, "currency": "AED",
            "lastUpdated": "2025-06-02T10:00:00Z"
        },
        {
            "symbol": "OLDCO", "name": "Delisted Company", "sector": "Banking",
            "currentPrice": 1.0, "previousClose": 1.0, "volume": 10, "marketCap": 1000000.0,
            "isActive": false
        }
    ])
}

fn service_over(snapshot: Arc<dyn SnapshotSource>) -> MarketService {
    let http_client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::default());
    MarketService::from_config(&ServiceConfig::default(), http_client, snapshot)
}

#[tokio::test]
async fn when_file_has_inactive_records_they_are_skipped() {
    // Given: A stored snapshot with one inactive listing
    let file = write_snapshot(&stored_records());
    let source = JsonFileSnapshot::new(file.path());

    // When: The snapshot is read
    let records = source.snapshot().await.expect("snapshot");

    // Then: Only the active listings remain, absent flags counting as active
    let symbols: Vec<&str> = records.iter().map(|quote| quote.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["EMAAR", "DIB"]);
    assert_eq!(records[1].sector.as_deref(), Some("Banking"));
}

#[tokio::test]
async fn malformed_file_is_internal_error() {
    let mut file = NamedTempFile::new().expect("temp file");
    write!(file, "{{\"not\": \"an array\"}}").expect("write");
    let source = JsonFileSnapshot::new(file.path());

    let error = source.snapshot().await.expect_err("must fail");

    assert_eq!(error.code(), "INTERNAL_ERROR");
    assert!(error.message().contains(&file.path().display().to_string()));
}

#[tokio::test]
async fn malformed_numbers_in_one_record_read_as_zero() {
    // Given: One record with a null market cap and one with a fractional volume
    let file = write_snapshot(&json!([
        {
            "symbol": "EMAAR", "name": "Emaar Properties", "sector": "Real Estate",
            "currentPrice": 8.5, "previousClose": 8.0, "change": 0.5, "changePercent": 6.25,
            "volume": 1200000, "marketCap": null
        },
        {
            "symbol": "DIB", "name": "Dubai Islamic Bank", "sector": "Banking",
            "currentPrice": 6.0, "previousClose": "n/a", "change": null, "changePercent": -3.23,
            "volume": 1234.0, "marketCap": 43000000000.0
        }
    ]));
    let service = service_over(Arc::new(JsonFileSnapshot::new(file.path())));

    // When: The market views are computed
    let overview = service.overview().await.expect("overview");
    let statistics = service.statistics().await.expect("statistics");

    // Then: Both records count, with the bad fields taken as zero
    assert_eq!(overview.total_stocks, 2);
    assert_eq!(overview.total_volume, 1_201_234);
    assert_eq!(overview.total_market_cap, 43_000_000_000.0);
    assert_eq!((overview.gainers, overview.unchanged), (1, 1));
    assert_eq!(statistics.market_cap.distribution.large, 1);
}

#[tokio::test]
async fn market_views_reflect_each_new_snapshot() {
    // Given: A service over an in-memory snapshot of the stored records
    let file = write_snapshot(&stored_records());
    let records = JsonFileSnapshot::new(file.path())
        .snapshot()
        .await
        .expect("snapshot");
    let snapshot = Arc::new(InMemorySnapshot::new(records.clone()));
    let service = service_over(Arc::clone(&snapshot) as Arc<dyn SnapshotSource>);

    // When: The overview is requested
    let before = service.overview().await.expect("overview");

    // Then: It covers both active listings
    assert_eq!(before.total_stocks, 2);
    assert_eq!((before.gainers, before.losers), (1, 1));
    assert_eq!(before.top_sectors[0].sector, "Real Estate");

    // When: The snapshot shrinks to one listing
    snapshot.replace(records.into_iter().take(1).collect());

    // Then: The next overview is recomputed, never cached
    let after = service.overview().await.expect("overview");
    assert_eq!(after.total_stocks, 1);
    assert_eq!(service.cache_stats().total, 0);
}

#[tokio::test]
async fn find_and_rankings_read_from_the_file() {
    let file = write_snapshot(&stored_records());
    let service = service_over(Arc::new(JsonFileSnapshot::new(file.path())));

    let banks = service.find_stocks("bank").await.expect("find");
    let losers = service.top_losers(Some(1)).await.expect("losers");
    let sectors = service.sectors(None).await.expect("sectors");

    assert_eq!(banks.len(), 1);
    assert_eq!(banks[0].symbol.as_str(), "DIB");
    assert_eq!(losers[0].symbol.as_str(), "DIB");
    assert_eq!(sectors.total_sectors, 2);
}

#[tokio::test]
async fn missing_file_surfaces_through_the_facade() {
    let service = service_over(Arc::new(JsonFileSnapshot::new(
        "/nonexistent/quotedesk/stocks.json",
    )));

    let error = service.statistics().await.expect_err("must fail");

    assert_eq!(error.code(), "INTERNAL_ERROR");
}
