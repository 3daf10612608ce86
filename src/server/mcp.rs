use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use mcp_sdk_rs::error::{Error, ErrorCode};
use mcp_sdk_rs::server::{Server, ServerHandler};
use mcp_sdk_rs::transport::stdio::StdioTransport;
use mcp_sdk_rs::types::{
    ClientCapabilities, Implementation, ListToolsResult, ServerCapabilities, Tool, ToolResult,
};
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::catalog::ModelCatalog;
use crate::relationship::{RelationshipCandidate, ReviewStatus};
use crate::storage::SqliteStore;

#[derive(Deserialize)]
struct CallToolRequest {
    name: String,
    arguments: Option<Value>,
}

#[derive(Deserialize)]
struct IdArgs {
    id: String,
}

#[derive(Deserialize)]
struct ListRelationshipArgs {
    model: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct ListModelArgs {
    category: Option<String>,
}

pub struct McpService {
    db_path: PathBuf,
    catalog: Arc<ModelCatalog>,
}

impl McpService {
    pub fn new(db_path: PathBuf, catalog: ModelCatalog) -> Self {
        Self {
            db_path,
            catalog: Arc::new(catalog),
        }
    }

    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        let (read_tx, read_rx) = mpsc::channel::<String>(32);
        let (write_tx, mut write_rx) = mpsc::channel::<String>(32);

        // Stdin reader
        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let mut reader = BufReader::new(stdin).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                if read_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        // Stdout writer
        tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(msg) = write_rx.recv().await {
                let _ = stdout.write_all(msg.as_bytes()).await;
                let _ = stdout.write_all(b"\n").await;
                let _ = stdout.flush().await;
            }
        });

        let transport = StdioTransport::new(read_rx, write_tx);
        let server = Server::new(Arc::new(transport), Arc::new(self.clone()));
        server.start().await?;
        Ok(())
    }

    /// Open the store for one tool call. The connection never crosses an
    /// await; same-id races between concurrent calls are settled by the
    /// store's primary key constraint.
    fn open_store(&self) -> Result<SqliteStore, Error> {
        SqliteStore::open(&self.db_path)
            .map_err(|e| Error::protocol(ErrorCode::InternalError, e.to_string()))
    }
}

impl Clone for McpService {
    fn clone(&self) -> Self {
        Self {
            db_path: self.db_path.clone(),
            catalog: self.catalog.clone(),
        }
    }
}

fn tool(name: &str, description: &str, schema: Value) -> Result<Tool, Error> {
    Ok(Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: serde_json::from_value(schema)
            .map_err(|e| Error::protocol(ErrorCode::ParseError, e.to_string()))?,
        annotations: None,
    })
}

#[async_trait]
impl ServerHandler for McpService {
    async fn initialize(
        &self,
        _implementation: Implementation,
        _capabilities: ClientCapabilities,
    ) -> Result<ServerCapabilities, Error> {
        Ok(ServerCapabilities::default())
    }

    async fn shutdown(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn handle_method(&self, method: &str, params: Option<Value>) -> Result<Value, Error> {
        match method {
            "tools/list" => {
                let tools = vec![
                    tool(
                        "create_relationship",
                        "Submit a relationship candidate for validation and storage",
                        serde_json::json!({
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "model_a": { "type": "string" },
                                "model_b": { "type": "string" },
                                "relationship_type": { "type": "string" },
                                "direction": { "type": "string", "enum": ["bidirectional", "a_to_b", "b_to_a"] },
                                "confidence": { "type": "number" },
                                "logical_derivation": { "type": "string" },
                                "empirical_observation": { "type": "string" },
                                "literature_support": {
                                    "type": "object",
                                    "properties": {
                                        "has_support": { "type": "boolean" },
                                        "citation": { "type": "string" },
                                        "url": { "type": "string" }
                                    },
                                    "required": ["has_support"]
                                },
                                "validated_by": { "type": "string" },
                                "validated_at": { "type": "string" },
                                "review_status": { "type": "string", "enum": ["pending", "approved", "rejected"] },
                                "notes": { "type": "string" }
                            },
                            "required": ["id", "model_a", "model_b", "relationship_type",
                                         "direction", "confidence", "logical_derivation",
                                         "validated_by", "validated_at"]
                        }),
                    )?,
                    tool(
                        "get_relationship",
                        "Fetch a persisted relationship by id",
                        serde_json::json!({
                            "type": "object",
                            "properties": { "id": { "type": "string" } },
                            "required": ["id"]
                        }),
                    )?,
                    tool(
                        "list_relationships",
                        "List relationships, optionally filtered by model or review status",
                        serde_json::json!({
                            "type": "object",
                            "properties": {
                                "model": { "type": "string" },
                                "status": { "type": "string", "enum": ["pending", "approved", "rejected"] }
                            }
                        }),
                    )?,
                    tool(
                        "get_model",
                        "Fetch a mental model from the catalog by id",
                        serde_json::json!({
                            "type": "object",
                            "properties": { "id": { "type": "string" } },
                            "required": ["id"]
                        }),
                    )?,
                    tool(
                        "list_models",
                        "List the mental-model catalog, optionally filtered by category",
                        serde_json::json!({
                            "type": "object",
                            "properties": { "category": { "type": "string" } }
                        }),
                    )?,
                ];
                let result = ListToolsResult { tools, next_cursor: None };
                serde_json::to_value(result)
                    .map_err(|e| Error::protocol(ErrorCode::InternalError, e.to_string()))
            }
            "tools/call" => {
                let req: CallToolRequest = params
                    .and_then(|v| serde_json::from_value(v).ok())
                    .ok_or(Error::protocol(ErrorCode::InvalidParams, "Missing params"))?;

                let result_content = if req.name == "create_relationship" {
                    let candidate: RelationshipCandidate =
                        serde_json::from_value(req.arguments.unwrap_or(serde_json::json!({})))
                            .map_err(|e| Error::protocol(ErrorCode::InvalidParams, e.to_string()))?;

                    let store = self.open_store()?;
                    // Expected failures come back as tool output, not as
                    // transport errors: the batch caller logs and continues.
                    match store.create_relationship(&candidate) {
                        Ok(record) => format!(
                            "Created relationship {} ({} -[{}]-> {}):\n{}",
                            record.id,
                            record.model_a,
                            record.relationship_type,
                            record.model_b,
                            serde_json::to_string_pretty(&record).unwrap_or_default()
                        ),
                        Err(e) => format!("Rejected: {}", e),
                    }
                } else if req.name == "get_relationship" {
                    let args: IdArgs =
                        serde_json::from_value(req.arguments.unwrap_or(serde_json::json!({})))
                            .map_err(|e| Error::protocol(ErrorCode::InvalidParams, e.to_string()))?;

                    let store = self.open_store()?;
                    match store.get_relationship(&args.id) {
                        Ok(Some(record)) => {
                            serde_json::to_string_pretty(&record).unwrap_or_default()
                        }
                        Ok(None) => format!("No relationship with id '{}'.", args.id),
                        Err(e) => format!("Lookup failed: {}", e),
                    }
                } else if req.name == "list_relationships" {
                    let args: ListRelationshipArgs =
                        serde_json::from_value(req.arguments.unwrap_or(serde_json::json!({})))
                            .map_err(|e| Error::protocol(ErrorCode::InvalidParams, e.to_string()))?;

                    let store = self.open_store()?;
                    let listed = if let Some(model) = &args.model {
                        store.find_for_model(model)
                    } else if let Some(status) = &args.status {
                        match ReviewStatus::from_str(status) {
                            Ok(parsed) => store.find_by_status(parsed),
                            Err(e) => {
                                return Err(Error::protocol(
                                    ErrorCode::InvalidParams,
                                    e.to_string(),
                                ))
                            }
                        }
                    } else {
                        store.list_relationships()
                    };

                    match listed {
                        Ok(relationships) if relationships.is_empty() => {
                            "No relationships found.".to_string()
                        }
                        Ok(relationships) => {
                            let mut text_output = String::new();
                            for rel in relationships {
                                text_output.push_str(&format!(
                                    "- {} [{}] {} <-> {} (confidence: {:.2}, status: {})\n",
                                    rel.id,
                                    rel.relationship_type,
                                    rel.model_a,
                                    rel.model_b,
                                    rel.confidence,
                                    rel.review_status
                                ));
                            }
                            text_output
                        }
                        Err(e) => format!("Listing failed: {}", e),
                    }
                } else if req.name == "get_model" {
                    let args: IdArgs =
                        serde_json::from_value(req.arguments.unwrap_or(serde_json::json!({})))
                            .map_err(|e| Error::protocol(ErrorCode::InvalidParams, e.to_string()))?;

                    match self.catalog.get(&args.id) {
                        Some(model) => serde_json::to_string_pretty(model).unwrap_or_default(),
                        None => format!("No model with id '{}'.", args.id),
                    }
                } else if req.name == "list_models" {
                    let args: ListModelArgs =
                        serde_json::from_value(req.arguments.unwrap_or(serde_json::json!({})))
                            .map_err(|e| Error::protocol(ErrorCode::InvalidParams, e.to_string()))?;

                    let models: Vec<&crate::catalog::Model> = match &args.category {
                        Some(category) => self.catalog.by_category(category),
                        None => self.catalog.all().iter().collect(),
                    };

                    if models.is_empty() {
                        "No models found.".to_string()
                    } else {
                        let mut text_output = String::new();
                        for model in models {
                            text_output.push_str(&format!(
                                "- {} ({}): {}\n",
                                model.id, model.category, model.name
                            ));
                        }
                        text_output
                    }
                } else {
                    return Err(Error::protocol(ErrorCode::MethodNotFound, req.name));
                };

                // Create common response format
                let result = ToolResult {
                    content: Vec::new(),
                    structured_content: Some(
                        serde_json::to_value(vec![serde_json::json!({
                            "type": "text",
                            "text": result_content
                        })])
                        .unwrap(),
                    ),
                };

                serde_json::to_value(result)
                    .map_err(|e| Error::protocol(ErrorCode::InternalError, e.to_string()))
            }
            _ => Err(Error::protocol(ErrorCode::MethodNotFound, method.to_string())),
        }
    }
}
