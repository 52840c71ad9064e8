//! tests/api_tests.rs - HTTP surface served over a real socket

#[cfg(test)]
mod tests {
    use crate::{
        api::create_router,
        blockchain::chains::ChainId,
        config::Config,
        resolver::IdentifierResolver,
        state::AppState,
        tests::support::{
            record, serve, Harness, MockNames, MockPrices, MockSource, ADDRESS, DAY, NOW,
        },
    };
    use reqwest::StatusCode;
    use serde_json::Value;
    use std::sync::Arc;

    const GWEI: u128 = 1_000_000_000;

    async fn start(names: Arc<MockNames>, sources: Vec<(ChainId, Arc<MockSource>)>) -> String {
        let harness = Harness::new(MockPrices::new(&[("ETH", 2500.0)]));
        let state = AppState {
            config: Config::default(),
            resolver: IdentifierResolver::new(names),
            aggregator: harness.aggregator(sources),
        };
        serve(create_router(Arc::new(state))).await
    }

    async fn start_default() -> String {
        let eth = MockSource::with_records(vec![record(ChainId::Eth, "0xabc", NOW - 10 * DAY, 21_000, 50 * GWEI)]);
        start(
            MockNames::with(&[("yuanlu.eth", ADDRESS)]),
            vec![(ChainId::Eth, eth), (ChainId::Base, MockSource::with_records(Vec::new()))],
        )
        .await
    }

    async fn get(url: &str) -> (StatusCode, Value) {
        let response = reqwest::Client::new()
            .get(url)
            .header("Origin", "http://localhost:3000")
            .send()
            .await
            .unwrap();
        let status = response.status();
        let body = response.json::<Value>().await.unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_gas_endpoint_returns_aggregate() {
        let base = start_default().await;

        let response = reqwest::Client::new()
            .get(format!("{}/api/gas?address={}&days=90", base, ADDRESS))
            .header("Origin", "http://localhost:3000")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("access-control-allow-origin"));

        let body: Value = response.json().await.unwrap();
        let data = &body["data"];
        assert_eq!(data["address"], ADDRESS);
        assert_eq!(data["window_days"], 90);
        assert_eq!(data["totals"]["tx_count"], 1);
        assert_eq!(data["totals"]["usd_complete"], true);

        let eth = &data["chains"][0];
        assert_eq!(eth["chain"], "eth");
        assert_eq!(eth["token_symbol"], "ETH");
        let tx = &eth["transactions"][0];
        assert_eq!(tx["native_fee"], "1050000000000000");
        assert_eq!(tx["gas_price"], "50000000000");
        assert_eq!(tx["hash"], "0xabc");
        assert!((tx["usd_fee"].as_f64().unwrap() - 2.625).abs() < 1e-9);

        assert_eq!(data["daily"][0]["date"], "2024-05-22");
        assert_eq!(data["chain_totals"].as_array().unwrap().len(), 2);
        assert!(data["warnings"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_gas_endpoint_accepts_names_and_default_window() {
        let base = start_default().await;

        let (status, body) = get(&format!("{}/api/gas?address=YuanLu.eth", base)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["address"], ADDRESS);
        assert_eq!(body["data"]["window_days"], 90);
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let base = start_default().await;

        let queries = vec![
            String::new(),
            "?address=".to_string(),
            "?address=0x1234".to_string(),
            "?address=not%20a%20name".to_string(),
            format!("?address={}&days=0", ADDRESS),
            format!("?address={}&days=91", ADDRESS),
            format!("?address={}&days=week", ADDRESS),
        ];
        for query in queries {
            let (status, body) = get(&format!("{}/api/gas{}", base, query)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "query {:?}", query);
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_unknown_name_is_not_found() {
        let base = start_default().await;

        let (status, body) = get(&format!("{}/api/gas?address=nobody.eth", base)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nobody.eth"));
    }

    #[tokio::test]
    async fn test_resolver_outage_is_a_client_error() {
        let eth = MockSource::with_records(Vec::new());
        let base = start(MockNames::unavailable(), vec![(ChainId::Eth, eth)]).await;

        let (status, body) = get(&format!("{}/api/gas?address=yuanlu.eth", base)).await;

        assert_eq!(status, StatusCode::FAILED_DEPENDENCY);
        assert!(status.is_client_error());
        assert!(body["error"].as_str().unwrap().contains("name resolution unavailable"));
    }

    #[tokio::test]
    async fn test_all_providers_down_is_service_unavailable() {
        let base = start(
            MockNames::with(&[]),
            vec![(ChainId::Eth, MockSource::failing()), (ChainId::Base, MockSource::failing())],
        )
        .await;

        let (status, body) = get(&format!("{}/api/gas?address={}", base, ADDRESS)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_partial_outage_still_answers() {
        let eth = MockSource::with_records(vec![record(ChainId::Eth, "0x01", NOW - DAY, 21_000, GWEI)]);
        let base = start(
            MockNames::with(&[]),
            vec![(ChainId::Eth, eth), (ChainId::Base, MockSource::failing())],
        )
        .await;

        let (status, body) = get(&format!("{}/api/gas?address={}", base, ADDRESS)).await;

        assert_eq!(status, StatusCode::OK);
        let warnings = body["data"]["warnings"].as_array().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0]["chain"], "base");
        assert_eq!(warnings[0]["kind"], "provider_unavailable");
    }

    #[tokio::test]
    async fn test_health_lists_enabled_chains() {
        let base = start_default().await;

        let (status, body) = get(&format!("{}/health", base)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["chains"], serde_json::json!(["eth", "base"]));
    }
}
