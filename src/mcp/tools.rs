//! Tool definitions advertised by `tools/list`.

use serde_json::json;

use super::types::ToolDef;

pub const LIST_DATABASES: &str = "list_databases";
pub const CREATE_DATABASE: &str = "create_database";
pub const USE_DATABASE: &str = "use_database";
pub const RUN_QUERY: &str = "run_query";
pub const RUN_READ_ONLY_QUERY: &str = "run_read_only_query";
pub const LIST_TABLES: &str = "list_tables";
pub const DESCRIBE_TABLE: &str = "describe_table";
pub const VECTOR_SEARCH: &str = "vector_search";

pub fn is_known(name: &str) -> bool {
    definitions().iter().any(|t| t.name == name)
}

pub fn definitions() -> Vec<ToolDef> {
    let database_property = || {
        json!({
            "type": "string",
            "description": "Database name. Omitted: the session's current database, then the configured default."
        })
    };

    vec![
        ToolDef {
            name: LIST_DATABASES,
            description: "List all databases in the organization.",
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        ToolDef {
            name: CREATE_DATABASE,
            description: "Create a new database in the organization.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Name of the database to create." }
                },
                "required": ["name"]
            }),
        },
        ToolDef {
            name: USE_DATABASE,
            description: "Set the session's current database for subsequent operations.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "database": { "type": "string", "description": "Database to switch to." }
                },
                "required": ["database"]
            }),
        },
        ToolDef {
            name: RUN_QUERY,
            description: "Execute a SQL statement with full read/write access.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "SQL statement to execute." },
                    "args": {
                        "type": "array",
                        "description": "Positional arguments bound to ? placeholders.",
                        "items": {}
                    },
                    "database": database_property()
                },
                "required": ["query"]
            }),
        },
        ToolDef {
            name: RUN_READ_ONLY_QUERY,
            description: "Execute a SQL query with a read-only token. Writes are rejected by the database.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "SQL query to execute." },
                    "args": {
                        "type": "array",
                        "description": "Positional arguments bound to ? placeholders.",
                        "items": {}
                    },
                    "database": database_property()
                },
                "required": ["query"]
            }),
        },
        ToolDef {
            name: LIST_TABLES,
            description: "List the tables in a database.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "database": database_property()
                }
            }),
        },
        ToolDef {
            name: DESCRIBE_TABLE,
            description: "Show the schema of a table.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "table": { "type": "string", "description": "Table name." },
                    "database": database_property()
                },
                "required": ["table"]
            }),
        },
        ToolDef {
            name: VECTOR_SEARCH,
            description: "Find the rows nearest to a query vector using cosine distance.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "table": { "type": "string", "description": "Table holding the vectors." },
                    "vector_column": { "type": "string", "description": "Column with the embedding vectors." },
                    "query_vector": {
                        "type": "array",
                        "items": { "type": "number" },
                        "description": "Query embedding."
                    },
                    "top_k": { "type": "integer", "description": "Rows to return (default 5)." },
                    "database": database_property()
                },
                "required": ["table", "vector_column", "query_vector"]
            }),
        },
    ]
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tools_advertised() {
        let names: Vec<&str> = definitions().iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                LIST_DATABASES,
                CREATE_DATABASE,
                USE_DATABASE,
                RUN_QUERY,
                RUN_READ_ONLY_QUERY,
                LIST_TABLES,
                DESCRIBE_TABLE,
                VECTOR_SEARCH,
            ]
        );
    }

    #[test]
    fn test_is_known() {
        assert!(is_known(RUN_QUERY));
        assert!(!is_known("drop_everything"));
    }

    #[test]
    fn test_schemas_are_objects_with_required_fields() {
        for tool in definitions() {
            assert_eq!(tool.input_schema["type"], "object", "tool {}", tool.name);
            assert!(!tool.description.is_empty());
        }
        let create = definitions()
            .into_iter()
            .find(|t| t.name == CREATE_DATABASE)
            .unwrap();
        assert_eq!(create.input_schema["required"][0], "name");
    }
}
