//! End-to-end JSON-RPC sessions over in-memory duplex streams.

use async_trait::async_trait;
use lookup_mcp::api::{ApiClient, ApiError};
use lookup_mcp::mcp::{
    CloseReason, McpServer, ServeSummary, ServerInfo, Tool, ToolError, ToolRegistry,
};
use lookup_mcp::telemetry::{Level, MemoryLogger};
use lookup_mcp::tools::default_registry;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Test tools with fixed misbehavior.
#[derive(Debug)]
enum Faulty {
    ApiDown,
    Panics,
    Slow,
}

#[async_trait]
impl Tool for Faulty {
    fn name(&self) -> &str {
        match self {
            Self::ApiDown => "api_down",
            Self::Panics => "panics",
            Self::Slow => "slow",
        }
    }

    fn description(&self) -> &str {
        "misbehaves on purpose"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn call(&self, _args: Value, _api: Option<&ApiClient>) -> Result<String, ToolError> {
        match self {
            Self::ApiDown => Err(ToolError::Api(ApiError::Server { status: 503 })),
            Self::Panics => panic!("handler blew up"),
            Self::Slow => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("finally".to_string())
            }
        }
    }
}

fn faulty_server() -> McpServer {
    let registry = ToolRegistry::new()
        .with_tool(Arc::new(Faulty::ApiDown))
        .and_then(|r| r.with_tool(Arc::new(Faulty::Panics)))
        .and_then(|r| r.with_tool(Arc::new(Faulty::Slow)))
        .unwrap();
    McpServer::new(
        ServerInfo {
            name: "faulty".into(),
            version: "0.0.0".into(),
        },
        Arc::new(registry),
        None,
        Arc::new(MemoryLogger::new()),
    )
}

fn server_with(logger: MemoryLogger) -> McpServer {
    McpServer::new(
        ServerInfo {
            name: "lookup-mcp".into(),
            version: "9.9.9".into(),
        },
        Arc::new(default_registry().unwrap()),
        None,
        Arc::new(logger),
    )
}

fn server() -> McpServer {
    server_with(MemoryLogger::new())
}

/// Feed `input` to a fresh server, close the input, and collect every
/// response line.
async fn exchange(server: McpServer, input: &str) -> (ServeSummary, Vec<Value>) {
    let (client, server_end) = tokio::io::duplex(1 << 16);
    let (server_read, server_write) = tokio::io::split(server_end);
    let handle =
        tokio::spawn(async move { server.serve(BufReader::new(server_read), server_write).await });

    let (client_read, mut client_write) = tokio::io::split(client);
    client_write.write_all(input.as_bytes()).await.unwrap();
    client_write.shutdown().await.unwrap();

    let mut lines = BufReader::new(client_read).lines();
    let mut responses = Vec::new();
    while let Some(line) = lines.next_line().await.unwrap() {
        responses.push(serde_json::from_str(&line).expect("every output line is JSON"));
    }
    let summary = handle.await.unwrap().unwrap();
    (summary, responses)
}

fn call(id: u64, tool: &str, arguments: &Value) -> String {
    format!(
        "{}\n",
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": tool, "arguments": arguments}
        })
    )
}

fn text_of(response: &Value) -> &str {
    response["result"]["content"][0]["text"]
        .as_str()
        .expect("tool result carries a text block")
}

#[tokio::test]
async fn test_initialize_then_list() {
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        "\n",
    );
    let (summary, responses) = exchange(server(), input).await;

    assert_eq!(summary.reason, CloseReason::EndOfInput);
    assert_eq!(summary.lines_read, 3);
    assert_eq!(summary.responses_written, 2);

    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "lookup-mcp");
    assert_eq!(responses[0]["result"]["serverInfo"]["version"], "9.9.9");
    assert!(responses[0]["result"]["capabilities"]["tools"].is_object());

    let names: Vec<&str> = responses[1]["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        ["search_articles", "get_article", "list_categories", "define_term", "api_status"]
    );
    for tool in responses[1]["result"]["tools"].as_array().unwrap() {
        assert_eq!(tool["inputSchema"]["type"], "object");
    }
}

#[tokio::test]
async fn test_unknown_tool_names_alternatives() {
    let (_, responses) = exchange(server(), &call(7, "nonexistent_tool", &json!({}))).await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], 7);
    assert_eq!(responses[0]["error"]["code"], -32601);
    let message = responses[0]["error"]["message"].as_str().unwrap();
    assert!(message.contains("nonexistent_tool"));
    assert!(message.contains("search_articles"));
    assert!(message.contains("api_status"));
    assert!(responses[0].get("result").is_none());
}

#[tokio::test]
async fn test_parse_error_does_not_stop_the_loop() {
    let input = "{not json\n{\"jsonrpc\":\"2.0\",\"id\":\"after\",\"method\":\"ping\"}\n";
    let (summary, responses) = exchange(server(), input).await;

    assert_eq!(summary.lines_read, 2);
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert!(responses[0]["id"].is_null());
    assert_eq!(responses[1]["id"], "after");
    assert_eq!(responses[1]["result"], json!({}));
}

#[tokio::test]
async fn test_blank_lines_and_crlf_are_ignored() {
    let input = "\n   \r\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\r\n";
    let (_, responses) = exchange(server(), input).await;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], 1);
}

#[tokio::test]
async fn test_invalid_utf8_is_a_parse_error() {
    let (client, server_end) = tokio::io::duplex(1024);
    let (server_read, server_write) = tokio::io::split(server_end);
    let srv = server();
    let handle =
        tokio::spawn(async move { srv.serve(BufReader::new(server_read), server_write).await });

    let (client_read, mut client_write) = tokio::io::split(client);
    client_write.write_all(b"\xff\xfe\n").await.unwrap();
    client_write.shutdown().await.unwrap();

    let mut lines = BufReader::new(client_read).lines();
    let line = lines.next_line().await.unwrap().unwrap();
    let response: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(response["error"]["code"], -32700);
    assert!(lines.next_line().await.unwrap().is_none());
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_responses_follow_request_order() {
    let mut input = String::new();
    for id in 1..=6 {
        input.push_str(&call(id, "list_categories", &json!({})));
    }
    let (_, responses) = exchange(server(), &input).await;

    let ids: Vec<u64> = responses.iter().map(|r| r["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, [1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn test_every_tool_answers_without_an_api() {
    let cases = [
        ("search_articles", json!({"query": "rate limits"}), "Understanding rate limits"),
        ("get_article", json!({"id": "kb-201"}), "# Authenticating requests"),
        ("list_categories", json!({}), "## Categories"),
        ("define_term", json!({"term": "webhook"}), "**Webhook**"),
        ("api_status", json!({}), "not configured"),
    ];
    let mut input = String::new();
    for (n, (tool, args, _)) in cases.iter().enumerate() {
        input.push_str(&call(n as u64, tool, args));
    }
    let (_, responses) = exchange(server(), &input).await;

    assert_eq!(responses.len(), cases.len());
    for (response, (tool, _, expected)) in responses.iter().zip(cases.iter()) {
        assert!(response.get("error").is_none(), "{tool}: {response}");
        let content = response["result"]["content"].as_array().unwrap();
        assert_eq!(content.len(), 1, "{tool}");
        assert_eq!(content[0]["type"], "text");
        assert!(text_of(response).contains(expected), "{tool}: {}", text_of(response));
        assert!(response["result"].get("isError").is_none());
    }
}

#[tokio::test]
async fn test_invalid_arguments_come_back_as_guidance() {
    let input = call(1, "search_articles", &json!({"query": "", "limit": 500}));
    let (_, responses) = exchange(server(), &input).await;

    assert!(responses[0].get("error").is_none());
    let text = text_of(&responses[0]);
    assert!(text.contains("Invalid input for `search_articles`"));
    assert!(text.contains("`query`"));
    assert!(text.contains("`limit`"));
    assert!(text.contains("Expected arguments:"));
}

#[tokio::test]
async fn test_missing_arguments_treated_as_empty() {
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"list_categories"}}"#,
        "\n"
    );
    let (_, responses) = exchange(server(), input).await;
    assert!(text_of(&responses[0]).starts_with("## Categories"));
}

#[tokio::test]
async fn test_notification_tool_call_is_not_answered() {
    let input = concat!(
        r#"{"jsonrpc":"2.0","method":"tools/call","params":{"name":"list_categories","arguments":{}}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
        "\n",
    );
    let (summary, responses) = exchange(server(), input).await;
    assert_eq!(summary.responses_written, 1);
    assert_eq!(responses[0]["id"], 2);
}

#[tokio::test]
async fn test_logs_never_reach_the_response_stream() {
    let logger = MemoryLogger::new();
    let input = "garbage\n".to_string() + &call(1, "list_categories", &json!({}));
    let (_, responses) = exchange(server_with(logger.clone()), &input).await;

    assert_eq!(responses.len(), 2);
    assert!(responses.iter().all(|r| r["jsonrpc"] == "2.0"));
    assert!(!logger.at_least(Level::Warn).is_empty());
    assert!(logger.records().iter().any(|r| r.message == "server ready"));
}

#[tokio::test]
async fn test_shutdown_stops_the_loop() {
    let (client, server_end) = tokio::io::duplex(1024);
    let (server_read, server_write) = tokio::io::split(server_end);
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let srv = server();
    let handle = tokio::spawn(async move {
        srv.serve_until(BufReader::new(server_read), server_write, async {
            let _ = stop_rx.await;
        })
        .await
    });

    let (client_read, mut client_write) = tokio::io::split(client);
    client_write
        .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n")
        .await
        .unwrap();
    let mut lines = BufReader::new(client_read).lines();
    let first = lines.next_line().await.unwrap().unwrap();
    assert!(first.contains("\"id\":1"));

    stop_tx.send(()).unwrap();
    let summary = handle.await.unwrap().unwrap();
    assert_eq!(summary.reason, CloseReason::Shutdown);
    assert_eq!(summary.lines_read, 1);
    assert_eq!(summary.responses_written, 1);
    assert!(lines.next_line().await.unwrap().is_none());
}

#[tokio::test]
async fn test_tool_failures_become_internal_errors() {
    let mut input = call(1, "api_down", &json!({}));
    input.push_str(&call(2, "panics", &json!({})));
    input.push_str("{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}\n");
    let (summary, responses) = exchange(faulty_server(), &input).await;

    assert_eq!(summary.reason, CloseReason::EndOfInput);
    assert_eq!(responses.len(), 3);

    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["error"]["code"], -32603);
    let message = responses[0]["error"]["message"].as_str().unwrap();
    assert!(message.contains("api_down"), "{message}");
    assert!(message.contains("503"), "{message}");
    assert!(responses[0].get("result").is_none());

    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["error"]["code"], -32603);
    assert!(
        responses[1]["error"]["message"]
            .as_str()
            .unwrap()
            .contains("handler blew up")
    );

    assert_eq!(responses[2]["id"], 3);
    assert_eq!(responses[2]["result"], json!({}));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_while_idle_with_input_open() {
    let (client, server_end) = tokio::io::duplex(1024);
    let (server_read, server_write) = tokio::io::split(server_end);
    let srv = server();
    let started = tokio::time::Instant::now();

    let summary = srv
        .serve_until(
            BufReader::new(server_read),
            server_write,
            tokio::time::sleep(Duration::from_secs(30)),
        )
        .await
        .unwrap();

    assert_eq!(summary.reason, CloseReason::Shutdown);
    assert_eq!(summary.lines_read, 0);
    assert!(started.elapsed() >= Duration::from_secs(30));
    drop(client);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drops_in_flight_request() {
    let (client, server_end) = tokio::io::duplex(1024);
    let (server_read, server_write) = tokio::io::split(server_end);
    let (client_read, mut client_write) = tokio::io::split(client);
    client_write
        .write_all(call(1, "slow", &json!({})).as_bytes())
        .await
        .unwrap();

    let started = tokio::time::Instant::now();
    let summary = faulty_server()
        .serve_until(
            BufReader::new(server_read),
            server_write,
            tokio::time::sleep(Duration::from_secs(1)),
        )
        .await
        .unwrap();

    assert_eq!(summary.reason, CloseReason::Shutdown);
    assert_eq!(summary.lines_read, 1);
    assert_eq!(summary.responses_written, 0);
    assert!(started.elapsed() < Duration::from_secs(60));

    let mut lines = BufReader::new(client_read).lines();
    assert!(lines.next_line().await.unwrap().is_none());
}
