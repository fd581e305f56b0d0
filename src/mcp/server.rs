//! MCP server — dispatches JSON-RPC methods and executes tools.
//!
//! Every data-plane tool composes the same two calls before touching
//! the database: resolve the effective database name, then fetch a
//! token at the tool's permission level from the cache.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::auth::TokenCache;
use crate::context::DatabaseContext;
use crate::errors::AppError;
use crate::models::token::Permission;
use crate::platform::PlatformClient;
use crate::query::pipeline::{CellValue, Stmt, StmtResult};
use crate::query::QueryClient;

use super::tools;
use super::types::*;

pub const PROTOCOL_VERSION: &str = "2025-06-18";

pub struct McpServer {
    platform: PlatformClient,
    tokens: TokenCache,
    context: DatabaseContext,
    query: QueryClient,
}

// ── Tool arguments ─────────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
struct CreateDatabaseArgs {
    name: String,
}

#[derive(Debug, serde::Deserialize)]
struct UseDatabaseArgs {
    database: String,
}

#[derive(Debug, serde::Deserialize)]
struct QueryArgs {
    query: String,
    #[serde(default)]
    args: Vec<Value>,
    #[serde(default)]
    database: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ListTablesArgs {
    #[serde(default)]
    database: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct DescribeTableArgs {
    table: String,
    #[serde(default)]
    database: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct VectorSearchArgs {
    table: String,
    vector_column: String,
    query_vector: Vec<f64>,
    #[serde(default = "default_top_k")]
    top_k: u64,
    #[serde(default)]
    database: Option<String>,
}

fn default_top_k() -> u64 {
    5
}

impl McpServer {
    pub fn new(
        platform: PlatformClient,
        tokens: TokenCache,
        context: DatabaseContext,
        query: QueryClient,
    ) -> Self {
        Self {
            platform,
            tokens,
            context,
            query,
        }
    }

    /// Handle one JSON-RPC message. Notifications return `None` — the
    /// transport answers them with an empty 202.
    pub async fn handle(&self, req: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = req.id?;

        let response = match req.method.as_str() {
            "initialize" => JsonRpcResponse::ok(
                id,
                InitializeResult {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    capabilities: ServerCapabilities {
                        tools: ToolsCapability {
                            list_changed: false,
                        },
                    },
                    server_info: Implementation {
                        name: "dblink".to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                    },
                },
            ),
            "ping" => JsonRpcResponse::ok(id, json!({})),
            "tools/list" => JsonRpcResponse::ok(
                id,
                ListToolsResult {
                    tools: tools::definitions(),
                },
            ),
            "tools/call" => {
                let params: CallToolParams = match req
                    .params
                    .ok_or_else(|| "missing params".to_string())
                    .and_then(|p| serde_json::from_value(p).map_err(|e| e.to_string()))
                {
                    Ok(p) => p,
                    Err(e) => {
                        return Some(JsonRpcResponse::err(
                            id,
                            INVALID_PARAMS,
                            format!("invalid tools/call params: {}", e),
                        ))
                    }
                };

                if !tools::is_known(&params.name) {
                    return Some(JsonRpcResponse::err(
                        id,
                        INVALID_PARAMS,
                        format!("unknown tool '{}'", params.name),
                    ));
                }

                let arguments = params.arguments.unwrap_or_else(|| json!({}));
                let result = match self.execute_tool(&params.name, arguments).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!(tool = %params.name, error = %e, "tool call failed");
                        CallToolResult::error(e.to_string())
                    }
                };
                JsonRpcResponse::ok(id, result)
            }
            other => JsonRpcResponse::err(
                id,
                METHOD_NOT_FOUND,
                format!("method '{}' not supported", other),
            ),
        };

        Some(response)
    }

    async fn execute_tool(&self, name: &str, args: Value) -> Result<CallToolResult, AppError> {
        match name {
            tools::LIST_DATABASES => {
                let databases = self.platform.list_databases().await?;
                Ok(CallToolResult::json(&databases))
            }
            tools::CREATE_DATABASE => {
                let args: CreateDatabaseArgs = parse_args(args)?;
                let database = self.platform.create_database(&args.name).await?;
                Ok(CallToolResult::json(&database))
            }
            tools::USE_DATABASE => {
                let args: UseDatabaseArgs = parse_args(args)?;
                self.context.set_current(&args.database);
                Ok(CallToolResult::text(format!(
                    "Now using database '{}'.",
                    args.database
                )))
            }
            tools::RUN_QUERY => {
                let args: QueryArgs = parse_args(args)?;
                let bound = encode_args(&args.args)?;
                self.run_statement(
                    args.database.as_deref(),
                    Stmt::with_args(args.query, bound),
                    Permission::FullAccess,
                )
                .await
            }
            tools::RUN_READ_ONLY_QUERY => {
                let args: QueryArgs = parse_args(args)?;
                let bound = encode_args(&args.args)?;
                self.run_statement(
                    args.database.as_deref(),
                    Stmt::with_args(args.query, bound),
                    Permission::ReadOnly,
                )
                .await
            }
            tools::LIST_TABLES => {
                let args: ListTablesArgs = parse_args(args)?;
                self.run_statement(
                    args.database.as_deref(),
                    Stmt::new(
                        "SELECT name FROM sqlite_schema \
                         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                    ),
                    Permission::ReadOnly,
                )
                .await
            }
            tools::DESCRIBE_TABLE => {
                let args: DescribeTableArgs = parse_args(args)?;
                self.run_statement(
                    args.database.as_deref(),
                    Stmt::with_args(
                        "SELECT sql FROM sqlite_schema WHERE name = ?",
                        vec![CellValue::Text { value: args.table }],
                    ),
                    Permission::ReadOnly,
                )
                .await
            }
            tools::VECTOR_SEARCH => {
                let args: VectorSearchArgs = parse_args(args)?;
                check_identifier(&args.table)?;
                check_identifier(&args.vector_column)?;
                let vector = serde_json::to_string(&args.query_vector)
                    .map_err(|e| anyhow::anyhow!("query_vector serialization failed: {}", e))?;
                let sql = format!(
                    "SELECT * FROM \"{}\" ORDER BY vector_distance_cos(\"{}\", vector32(?)) LIMIT {}",
                    args.table, args.vector_column, args.top_k
                );
                self.run_statement(
                    args.database.as_deref(),
                    Stmt::with_args(sql, vec![CellValue::Text { value: vector }]),
                    Permission::ReadOnly,
                )
                .await
            }
            other => Err(anyhow::anyhow!("unknown tool '{}'", other).into()),
        }
    }

    /// resolve database → fetch scoped token → execute.
    async fn run_statement(
        &self,
        explicit: Option<&str>,
        stmt: Stmt,
        permission: Permission,
    ) -> Result<CallToolResult, AppError> {
        let database = self.context.resolve(explicit)?;
        let token = self.tokens.get_token(&database, permission).await?;
        let url = self.query.database_url(&database);

        let results = self.query.execute(&url, &token.token, vec![stmt]).await?;
        Ok(CallToolResult::json(&render_results(&database, &results)))
    }
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, AppError> {
    serde_json::from_value(args).map_err(|e| anyhow::anyhow!("invalid arguments: {}", e).into())
}

fn encode_args(args: &[Value]) -> Result<Vec<CellValue>, AppError> {
    args.iter().map(CellValue::from_json).collect()
}

/// SQL identifiers that get interpolated (not bound) must stay tame.
fn check_identifier(name: &str) -> Result<(), AppError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "invalid identifier '{}': only alphanumeric characters and underscores are allowed",
            name
        )
        .into())
    }
}

fn render_results(database: &str, results: &[StmtResult]) -> Value {
    let rendered: Vec<Value> = results
        .iter()
        .map(|r| {
            json!({
                "rows": r.rows_as_json(),
                "affected_row_count": r.affected_row_count,
                "last_insert_rowid": r.last_insert_rowid,
            })
        })
        .collect();

    // Single-statement calls are the norm; don't wrap them in a list.
    let payload = match rendered.len() {
        1 => rendered.into_iter().next().unwrap_or(Value::Null),
        _ => Value::Array(rendered),
    };
    json!({ "database": database, "result": payload })
}

// ── Tests ──────────────────────────────────────────────────────
