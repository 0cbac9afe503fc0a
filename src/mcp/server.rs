/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests from stdin (or any buffered reader)
/// 2. Handles each request in its own task using the news gateway
/// 3. Sends JSON-RPC responses to stdout through a single writer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::gnews::Dispatch;
use crate::mcp::protocol::*;
use crate::tools;
use crate::{GNewsServer, ServerError};

/// MCP server that handles communication with Claude
pub struct McpServer<D: Dispatch> {
    /// The underlying news gateway
    gateway: Arc<GNewsServer<D>>,
    /// Whether the client has sent its initialized notification
    initialized: AtomicBool,
}

impl<D: Dispatch + 'static> McpServer<D> {
    /// Create a new MCP server
    pub fn new(gateway: Arc<GNewsServer<D>>) -> Self {
        Self {
            gateway,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Relaxed)
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
        Ok(())
    }

    /// Serve newline-delimited JSON-RPC from `reader` until it closes
    ///
    /// Responses are written to `writer`, which is handed back once every
    /// in-flight request has been answered.
    pub async fn serve<R, W>(self, mut reader: R, writer: W) -> Result<W, ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let server = Arc::new(self);
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        // Single writer so response lines never interleave
        let writer = tokio::spawn(async move {
            let mut out = writer;
            while let Some(response) = rx.recv().await {
                out.write_all(response.as_bytes()).await?;
                out.write_all(b"\n").await?;
                out.flush().await?;
                debug!("Sent response: {}", response);
            }
            Ok::<W, std::io::Error>(out)
        });

        let mut tasks = JoinSet::new();
        let mut line = Vec::new();

        loop {
            line.clear();
            reap_finished(&mut tasks);

            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (input closed)");
                    break;
                }
                Ok(_) => {
                    let server = Arc::clone(&server);
                    let tx = tx.clone();
                    let request = line.clone();
                    tasks.spawn(async move {
                        if let Some(response) = server.process_bytes(&request).await {
                            match serde_json::to_string(&response) {
                                Ok(text) => {
                                    // Receiver only closes when the writer failed
                                    let _ = tx.send(text);
                                }
                                Err(e) => error!("Failed to serialize response: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            }
        }

        // Let in-flight calls finish before closing the writer
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Request task failed: {}", e);
            }
        }
        drop(tx);

        match writer.await {
            Ok(result) => Ok(result?),
            Err(e) => Err(std::io::Error::new(std::io::ErrorKind::Other, e).into()),
        }
    }

    /// Process one raw input line, answering invalid UTF-8 with a parse error
    pub async fn process_bytes(&self, line: &[u8]) -> Option<JsonRpcResponse> {
        match std::str::from_utf8(line) {
            Ok(text) => self.process_line(text).await,
            Err(e) => {
                warn!("Received a line that is not valid UTF-8: {}", e);
                Some(JsonRpcResponse::error(
                    json!(null),
                    error_codes::PARSE_ERROR,
                    format!("Invalid UTF-8: {}", e),
                    None,
                ))
            }
        }
    }

    /// Process a single line of JSON-RPC input
    ///
    /// Returns None for blank lines and notifications.
    pub async fn process_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    json!(null),
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        match request.id.clone() {
            Some(id) => Some(self.handle_request(id, request).await),
            None => {
                self.handle_notification(&request);
                None
            }
        }
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" | "initialized" => {
                self.initialized.store(true, Ordering::Relaxed);
                info!("MCP client initialized");
            }
            other => debug!("Ignoring notification '{}'", other),
        }
    }

    /// Handle a JSON-RPC request that expects a response
    async fn handle_request(&self, id: Value, request: JsonRpcRequest) -> JsonRpcResponse {
        if request.jsonrpc != "2.0" {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_REQUEST,
                format!("Unsupported JSON-RPC version '{}'", request.jsonrpc),
                None,
            );
        }

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" | "notifications/initialized" => {
                self.initialized.store(true, Ordering::Relaxed);
                JsonRpcResponse::success(id, json!(null))
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "resources/list" => self.handle_resources_list(id),
            "resources/read" => self.handle_resources_read(id, request.params),
            "prompts/list" => self.handle_prompts_list(id),
            "prompts/get" => self.handle_prompts_get(id, request.params),
            _ => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        }
    }

    /// Handle MCP initialization request
    fn handle_initialize(&self, id: Value) -> JsonRpcResponse {
        info!("MCP client connected");

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ListChangedCapability { list_changed: false }),
                resources: Some(ListChangedCapability { list_changed: false }),
                prompts: Some(ListChangedCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: "GNews MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        respond(id, &result)
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        let tools = vec![
            ToolDefinition {
                name: tools::SEARCH_TOOL.to_string(),
                description: tools::SEARCH_DESCRIPTION.to_string(),
                input_schema: tools::search_input_schema(),
            },
            ToolDefinition {
                name: tools::HEADLINES_TOOL.to_string(),
                description: tools::HEADLINES_DESCRIPTION.to_string(),
                input_schema: tools::headlines_input_schema(),
            },
        ];

        respond(id, &json!({ "tools": tools }))
    }

    /// Handle tools/call request
    async fn handle_tools_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match parse_params(params) {
            Ok(p) => p,
            Err(message) => return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, message, None),
        };

        info!(tool = %tool_params.name, "Tool call");

        let envelope = match tool_params.name.as_str() {
            tools::SEARCH_TOOL => tools::call_search_news(&self.gateway, tool_params.arguments).await,
            tools::HEADLINES_TOOL => tools::call_get_top_headlines(&self.gateway, tool_params.arguments).await,
            _ => {
                warn!("Unknown tool: {}", tool_params.name);
                let result = ToolCallResult::error(format!("Unknown tool: {}", tool_params.name));
                return respond(id, &result);
            }
        };

        let result = match serde_json::to_string_pretty(&envelope) {
            Ok(text) => ToolCallResult::json(text, !envelope.is_success()),
            Err(e) => ToolCallResult::error(format!("Failed to serialize result: {}", e)),
        };

        respond(id, &result)
    }

    /// Handle resources/list request
    fn handle_resources_list(&self, id: Value) -> JsonRpcResponse {
        let resources: Vec<ResourceDefinition> = tools::list_resources()
            .iter()
            .map(|r| ResourceDefinition {
                uri: r.uri.to_string(),
                name: r.name.to_string(),
                description: r.description.to_string(),
                mime_type: r.mime_type.to_string(),
            })
            .collect();

        respond(id, &json!({ "resources": resources }))
    }

    /// Handle resources/read request
    fn handle_resources_read(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let read_params: ReadResourceParams = match parse_params(params) {
            Ok(p) => p,
            Err(message) => return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, message, None),
        };

        match tools::read_resource(self.gateway.reference(), &read_params.uri) {
            Some((mime_type, text)) => {
                let contents = vec![ResourceContents {
                    uri: read_params.uri,
                    mime_type: mime_type.to_string(),
                    text,
                }];
                respond(id, &json!({ "contents": contents }))
            }
            None => JsonRpcResponse::error(
                id,
                error_codes::RESOURCE_NOT_FOUND,
                format!("Resource '{}' not found", read_params.uri),
                None,
            ),
        }
    }

    /// Handle prompts/list request
    fn handle_prompts_list(&self, id: Value) -> JsonRpcResponse {
        let prompts = vec![PromptDefinition {
            name: tools::RESEARCH_PROMPT.to_string(),
            description: tools::RESEARCH_DESCRIPTION.to_string(),
            arguments: vec![
                PromptArgument {
                    name: "topic".to_string(),
                    description: "Topic to research".to_string(),
                    required: true,
                },
                PromptArgument {
                    name: "days".to_string(),
                    description: "How many days back to look (1-365, default 7)".to_string(),
                    required: false,
                },
            ],
        }];

        respond(id, &json!({ "prompts": prompts }))
    }

    /// Handle prompts/get request
    fn handle_prompts_get(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let prompt_params: GetPromptParams = match parse_params(params) {
            Ok(p) => p,
            Err(message) => return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, message, None),
        };

        if prompt_params.name != tools::RESEARCH_PROMPT {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Unknown prompt: {}", prompt_params.name),
                None,
            );
        }

        let today = chrono::Utc::now().date_naive();
        match tools::research_prompt_from_args(&prompt_params.arguments, today) {
            Ok(text) => {
                let result = GetPromptResult {
                    description: tools::RESEARCH_DESCRIPTION.to_string(),
                    messages: vec![PromptMessage {
                        role: "user".to_string(),
                        content: ToolContent::text(text),
                    }],
                };
                respond(id, &result)
            }
            Err(e) => JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, e.to_string(), None),
        }
    }
}

/// Drop tasks that have already finished, logging any that panicked
///
/// Returns how many were removed.
fn reap_finished(tasks: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while let Some(joined) = tasks.try_join_next() {
        if let Err(e) = joined {
            error!("Request task failed: {}", e);
        }
        reaped += 1;
    }
    reaped
}

/// Deserialize request params, describing what went wrong
fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, String> {
    match params {
        Some(params) => serde_json::from_value(params).map_err(|e| format!("Invalid parameters: {}", e)),
        None => Err("Missing parameters".to_string()),
    }
}

/// Wrap a serializable result in a success response
fn respond<T: Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(
            id,
            error_codes::INTERNAL_ERROR,
            format!("Failed to serialize result: {}", e),
            None,
        ),
    }
}
