//! MCP protocol tests over the stdio and HTTP transports

use axum::body::Body;
use axum::http::{Request, StatusCode};
use perplexity_rs::server::{create_router, serve, McpHandler, ToolDispatcher};
use perplexity_rs::{PerplexityClient, Search, Settings};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn handler_for(server: &MockServer) -> McpHandler {
    let mut settings = Settings::default();
    settings.api.api_key = "test-key".to_string();
    settings.api.endpoint = format!("{}/chat/completions", server.uri());
    let client = PerplexityClient::with_settings(&settings.api).unwrap();
    let search = Search::new(client, Arc::new(settings));
    McpHandler::new(ToolDispatcher::new(Arc::new(search)))
}

async fn call(handler: &McpHandler, message: Value) -> Value {
    let response = handler
        .handle_message(&message.to_string())
        .await
        .expect("request should be answered");
    serde_json::to_value(response).unwrap()
}

#[tokio::test]
async fn initialize_reports_server_info() {
    let server = MockServer::start().await;
    let handler = handler_for(&server);

    let response = call(
        &handler,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": { "clientInfo": { "name": "test-client" } }
        }),
    )
    .await;

    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(response["result"]["serverInfo"]["name"], "perplexity");
    assert!(response["result"]["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn tools_list_advertises_all_tools() {
    let server = MockServer::start().await;
    let handler = handler_for(&server);

    let response = call(&handler, json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" })).await;
    let tools = response["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();

    assert_eq!(
        names,
        [
            "search",
            "academic_search",
            "financial_search",
            "filtered_search",
            "list_previous",
            "get_previous_result"
        ]
    );
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
}

#[tokio::test]
async fn tools_call_runs_search() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "model": "sonar-pro",
            "messages": [{ "role": "user", "content": "[Ticker: NVDA, Report Type: 10-K] margins" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Margins grew." } }],
            "related_questions": ["What about revenue?"]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let handler = handler_for(&server);

    let response = call(
        &handler,
        json!({
            "jsonrpc": "2.0",
            "id": "call-1",
            "method": "tools/call",
            "params": {
                "name": "financial_search",
                "arguments": { "query": "margins", "ticker": "NVDA", "report_type": "10-K" }
            }
        }),
    )
    .await;

    let result = &response["result"];
    assert_eq!(response["id"], "call-1");
    assert_eq!(result["isError"], false);
    assert_eq!(result["content"][0]["type"], "text");
    assert_eq!(
        result["content"][0]["text"],
        "Margins grew.\n\n## Related Questions\n- What about revenue?\n"
    );
}

#[tokio::test]
async fn tool_failures_are_reported_in_result() {
    let server = MockServer::start().await;
    let handler = handler_for(&server);

    let missing_query = call(
        &handler,
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "name": "search", "arguments": {} }
        }),
    )
    .await;
    assert_eq!(missing_query["result"]["isError"], true);
    assert!(missing_query["error"].is_null());

    let cache_off = call(
        &handler,
        json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": { "name": "list_previous" }
        }),
    )
    .await;
    assert_eq!(cache_off["result"]["isError"], true);
}

#[tokio::test]
async fn protocol_errors() {
    let server = MockServer::start().await;
    let handler = handler_for(&server);

    let unknown = call(&handler, json!({ "jsonrpc": "2.0", "id": 5, "method": "resources/list" })).await;
    assert_eq!(unknown["error"]["code"], -32601);

    let parse = serde_json::to_value(handler.handle_message("{not json").await.unwrap()).unwrap();
    assert_eq!(parse["error"]["code"], -32700);
    assert_eq!(parse["id"], Value::Null);

    let notification = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
    assert!(handler.handle_message(&notification.to_string()).await.is_none());
}

#[tokio::test]
async fn stdio_answers_each_line() {
    let server = MockServer::start().await;
    let handler = handler_for(&server);

    let input = [
        json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} }).to_string(),
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string(),
        String::new(),
        json!({ "jsonrpc": "2.0", "id": 2, "method": "ping" }).to_string(),
    ]
    .join("\n");

    let (mut client, transport) = tokio::io::duplex(64 * 1024);
    assert_ok!(serve(handler, input.as_bytes(), transport).await);

    let mut output = String::new();
    client.read_to_string(&mut output).await.unwrap();

    let mut ids: Vec<i64> = output
        .lines()
        .map(|line| {
            let response: Value = serde_json::from_str(line).unwrap();
            assert!(response["error"].is_null());
            response["id"].as_i64().unwrap()
        })
        .collect();
    ids.sort();
    assert_eq!(ids, [1, 2]);
}

#[tokio::test]
async fn http_transport_routes_mcp_and_health() {
    let server = MockServer::start().await;
    let router = create_router(handler_for(&server));

    let health = router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "jsonrpc": "2.0", "id": 7, "method": "tools/list" }).to_string(),
        ))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["id"], 7);
    assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 6);

    let notification = Request::builder()
        .method("POST")
        .uri("/mcp")
        .body(Body::from(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string()))
        .unwrap();
    let accepted = router.oneshot(notification).await.unwrap();
    assert_eq!(accepted.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn stdio_stops_on_read_error() {
    let server = MockServer::start().await;
    let handler = handler_for(&server);

    // Invalid UTF-8 fails the line reader
    let input: &[u8] = b"\xff\xfe\n";
    let (_client, transport) = tokio::io::duplex(1024);
    assert_err!(serve(handler, input, transport).await);
}
