use crate::errors::{AnalysisError, AnalysisResult};
use crate::feeds::PriceSource;
use crate::series::{PricePoint, PriceSeries};
use reqwest::Client;

/// Yahoo Finance v8 chart API client. Daily bars, split/dividend adjusted
/// closes when the response carries them.
#[derive(Clone)]
pub struct YahooChartSource {
    client: Client,
    base_url: String,
}

impl YahooChartSource {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent("Mozilla/5.0 (rusty_pairs)")
            .pool_max_idle_per_host(4)
            .build()
            .unwrap_or_default();
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl PriceSource for YahooChartSource {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch(&self, symbol: &str, period: &str) -> AnalysisResult<PriceSeries> {
        let mut parts: smallvec::SmallVec<[String; 3]> = smallvec::SmallVec::new();
        parts.push(format!("range={period}"));
        parts.push("interval=1d".to_string());
        parts.push("events=div%2Csplit".to_string());
        let url = format!("{}/v8/finance/chart/{symbol}?{}", self.base_url, parts.join("&"));

        tracing::debug!(symbol, period, "fetching price history");
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AnalysisError::UpstreamData(symbol.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::Network(format!("HTTP {status}: {body}")));
        }

        let data: ChartResponse = resp
            .json()
            .await
            .map_err(|e| AnalysisError::Parse(format!("chart {symbol}: {e}")))?;

        let points = parse_chart(symbol, data)?;
        tracing::debug!(symbol, points = points.len(), "price history received");
        PriceSeries::new(symbol, points)
    }
}

// Response shape (fields we read):
// {
//   "chart": {
//     "result": [{
//       "meta": { "gmtoffset": -14400, ... },
//       "timestamp": [1704205800, ...],
//       "indicators": {
//         "quote": [{ "close": [185.64, null, ...] }],
//         "adjclose": [{ "adjclose": [184.73, null, ...] }]
//       }
//     }],
//     "error": null
//   }
// }

#[derive(serde::Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(serde::Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(serde::Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(serde::Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(serde::Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(serde::Deserialize)]
struct Indicators {
    quote: Option<Vec<Quote>>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(serde::Deserialize)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(serde::Deserialize)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

/// Pair timestamps with closes, shifting to the exchange's local calendar
/// date. Bars with a missing close are skipped.
fn parse_chart(symbol: &str, data: ChartResponse) -> AnalysisResult<Vec<PricePoint>> {
    if let Some(err) = data.chart.error {
        tracing::warn!(
            symbol,
            code = err.code.as_deref().unwrap_or("?"),
            description = err.description.as_deref().unwrap_or(""),
            "chart API returned an error"
        );
        return Err(AnalysisError::UpstreamData(symbol.to_string()));
    }

    let result = data
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .ok_or_else(|| AnalysisError::UpstreamData(symbol.to_string()))?;

    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let timestamps = result.timestamp.unwrap_or_default();

    let adjusted = result
        .indicators
        .adjclose
        .and_then(|v| v.into_iter().next())
        .and_then(|a| a.adjclose);
    let closes = match adjusted {
        Some(c) => c,
        None => result
            .indicators
            .quote
            .and_then(|v| v.into_iter().next())
            .and_then(|q| q.close)
            .unwrap_or_default(),
    };

    let mut points: Vec<PricePoint> = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let close = close.filter(|c| c.is_finite() && *c > 0.0)?;
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)?.date_naive();
            Some(PricePoint { date, close })
        })
        .collect();

    // Intraday refreshes can repeat the last session's date; keep the latest bar.
    points.dedup_by(|later, earlier| {
        if later.date == earlier.date {
            earlier.close = later.close;
            true
        } else {
            false
        }
    });

    if points.is_empty() {
        return Err(AnalysisError::UpstreamData(symbol.to_string()));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AnalysisResult<Vec<PricePoint>> {
        let data: ChartResponse = serde_json::from_str(json).unwrap();
        parse_chart("TEST", data)
    }

    #[test]
    fn test_parse_prefers_adjusted_closes_and_skips_nulls() {
        let points = parse(
            r#"{"chart":{"result":[{
                "meta":{"gmtoffset":-18000},
                "timestamp":[1704205800,1704292200,1704378600],
                "indicators":{
                    "quote":[{"close":[185.64,184.25,181.91]}],
                    "adjclose":[{"adjclose":[184.73,null,181.02]}]
                }}],"error":null}}"#,
        )
        .unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date.to_string(), "2024-01-02");
        assert!((points[0].close - 184.73).abs() < 1e-12);
        assert_eq!(points[1].date.to_string(), "2024-01-04");
    }

    #[test]
    fn test_parse_falls_back_to_raw_close() {
        let points = parse(
            r#"{"chart":{"result":[{
                "timestamp":[1704205800],
                "indicators":{"quote":[{"close":[185.64]}]}}],"error":null}}"#,
        )
        .unwrap();
        assert_eq!(points.len(), 1);
        assert!((points[0].close - 185.64).abs() < 1e-12);
    }

    #[test]
    fn test_same_day_bars_keep_latest() {
        let points = parse(
            r#"{"chart":{"result":[{
                "meta":{"gmtoffset":0},
                "timestamp":[1704205800,1704218400],
                "indicators":{"quote":[{"close":[10.0,11.0]}]}}],"error":null}}"#,
        )
        .unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].close, 11.0);
    }

    const CHART_BODY: &str = r#"{"chart":{"result":[{
        "meta":{"gmtoffset":-18000},
        "timestamp":[1704205800,1704292200],
        "indicators":{"quote":[{"close":[60.1,60.4]}]}}],"error":null}}"#;

    /// Serves fixed chart responses on an ephemeral local port.
    async fn chart_server() -> String {
        use axum::http::{header, StatusCode};
        use axum::routing::get;

        let app = axum::Router::new()
            .route(
                "/v8/finance/chart/KO",
                get(|| async { ([(header::CONTENT_TYPE, "application/json")], CHART_BODY) }),
            )
            .route(
                "/v8/finance/chart/GONE",
                get(|| async { (StatusCode::NOT_FOUND, "not found") }),
            )
            .route(
                "/v8/finance/chart/FAIL",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream down") }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn local_source(base_url: &str) -> YahooChartSource {
        let client = Client::builder()
            .no_proxy()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap();
        YahooChartSource::with_client(client, base_url)
    }

    #[tokio::test]
    async fn test_fetch_maps_http_status() {
        let base = chart_server().await;
        let source = local_source(&format!("{base}/"));

        let series = source.fetch("KO", "1y").await.unwrap();
        assert_eq!(series.symbol(), "KO");
        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].date.to_string(), "2024-01-02");

        let missing = source.fetch("GONE", "1y").await;
        assert!(matches!(missing, Err(AnalysisError::UpstreamData(ref s)) if s == "GONE"));

        let failed = source.fetch("FAIL", "1y").await;
        assert!(
            matches!(failed, Err(AnalysisError::Network(ref m)) if m.contains("500")),
            "{failed:?}"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let res = local_source(&format!("http://{addr}")).fetch("KO", "1y").await;
        assert!(matches!(res, Err(AnalysisError::Network(_))), "{res:?}");
    }

    #[test]
    fn test_error_and_empty_payloads() {
        let err = parse(r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#);
        assert!(matches!(err, Err(AnalysisError::UpstreamData(_))));

        let empty = parse(r#"{"chart":{"result":[{"timestamp":[],"indicators":{"quote":[{"close":[]}]}}],"error":null}}"#);
        assert!(matches!(empty, Err(AnalysisError::UpstreamData(_))));

        let no_timestamps = parse(r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#);
        assert!(matches!(no_timestamps, Err(AnalysisError::UpstreamData(_))));
    }
}
