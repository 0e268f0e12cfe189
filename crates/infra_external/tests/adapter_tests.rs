//! HTTP round-trip tests for infra_external against an in-process fake service

use std::time::Duration;

use axum::extract::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};

use core_kernel::PortError;
use domain_claims::{ReasoningPort, RetrievalPort};
use infra_external::{
    GeminiConfig, GeminiReasoningAdapter, OpenAiConfig, OpenAiEmbeddings, PassageRecord, PineconeConfig,
    PineconeRetrievalAdapter,
};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn gemini(base_url: String, temperature: f32) -> GeminiReasoningAdapter {
    GeminiReasoningAdapter::new(GeminiConfig {
        api_key: "test-key".to_string(),
        base_url,
        temperature,
        timeout_secs: 1,
        ..Default::default()
    })
    .unwrap()
}

mod gemini_tests {
    use super::*;

    async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
            return (StatusCode::FORBIDDEN, Json(json!({"error": "bad key"})));
        }
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
        let temperature = body["generationConfig"]["temperature"].as_f64().unwrap_or_default();
        let reply = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": format!("t={} ", temperature)}, {"text": prompt}]}
            }]
        });
        (StatusCode::OK, Json(reply))
    }

    #[tokio::test]
    async fn test_complete_sends_prompt_and_temperature() {
        let base = serve(Router::new().route("/v1beta/models/:model", post(echo))).await;
        let reply = gemini(base, 0.7).complete("Is C1 eligible?").await.unwrap();
        assert_eq!(reply, "t=0.7 Is C1 eligible?");
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let router = Router::new().route(
            "/v1beta/models/:model",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
        );
        let err = gemini(serve(router).await, 0.5).complete("p").await.unwrap_err();
        assert!(matches!(err, PortError::ServiceUnavailable { .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_rejected_key_is_unauthorized() {
        let base = serve(Router::new().route("/v1beta/models/:model", post(echo))).await;
        let adapter = GeminiReasoningAdapter::new(GeminiConfig {
            api_key: "wrong".to_string(),
            base_url: base,
            ..Default::default()
        })
        .unwrap();
        let err = adapter.complete("p").await.unwrap_err();
        assert!(matches!(err, PortError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let router = Router::new().route("/v1beta/models/:model", post(|| async { "not json" }));
        let err = gemini(serve(router).await, 0.5).complete("p").await.unwrap_err();
        assert!(matches!(err, PortError::Transformation { .. }));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let router = Router::new().route(
            "/v1beta/models/:model",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "late"
            }),
        );
        let err = gemini(serve(router).await, 0.5).complete("p").await.unwrap_err();
        assert!(matches!(err, PortError::Timeout { .. }));
    }
}

mod pinecone_tests {
    use super::*;

    async fn embeddings(Json(body): Json<Value>) -> Json<Value> {
        let count = body["input"].as_array().map(Vec::len).unwrap_or(0);
        let data: Vec<Value> = (0..count)
            .map(|i| json!({"object": "embedding", "index": i, "embedding": [i as f32, 1.0]}))
            .collect();
        Json(json!({"object": "list", "data": data}))
    }

    async fn query(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(headers.get("Api-Key").and_then(|v| v.to_str().ok()), Some("pc-key"));
        let top_k = body["topK"].as_u64().unwrap_or(0) as usize;
        let matches: Vec<Value> = ["Part B covers office visits.", "Part A covers inpatient care.", "Part D covers drugs."]
            .iter()
            .take(top_k)
            .map(|text| json!({"id": text, "score": 0.9, "metadata": {"text": text}}))
            .collect();
        Json(json!({"matches": matches}))
    }

    async fn upsert(Json(body): Json<Value>) -> Json<Value> {
        let count = body["vectors"].as_array().map(Vec::len).unwrap_or(0);
        Json(json!({"upsertedCount": count}))
    }

    async fn adapter() -> PineconeRetrievalAdapter {
        let router = Router::new()
            .route("/v1/embeddings", post(embeddings))
            .route("/query", post(query))
            .route("/vectors/upsert", post(upsert));
        let base = serve(router).await;

        let embeddings = OpenAiEmbeddings::new(OpenAiConfig {
            api_key: "oa-key".to_string(),
            base_url: base.clone(),
            ..Default::default()
        })
        .unwrap();
        PineconeRetrievalAdapter::new(
            PineconeConfig {
                api_key: "pc-key".to_string(),
                index_host: base,
                ..Default::default()
            },
            embeddings,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_returns_metadata_text() {
        let passages = adapter().await.search("office visits", 2).await.unwrap();
        assert_eq!(passages, vec!["Part B covers office visits.", "Part A covers inpatient care."]);
    }

    #[tokio::test]
    async fn test_ingest_counts_upserts() {
        let passages: Vec<PassageRecord> = (0..3)
            .map(|i| PassageRecord {
                id: format!("MedicareB_policy.txt-{}", i),
                source: "MedicareB_policy.txt".to_string(),
                text: format!("passage {}", i),
            })
            .collect();
        assert_eq!(adapter().await.ingest(&passages).await.unwrap(), 3);
    }
}
