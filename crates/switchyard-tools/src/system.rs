//! Built-in tools shared by every company

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use switchyard_core::Result;

use crate::tool::{NewTool, ToolType};

pub const SQL_QUERY: &str = "iat_sql_query";
pub const GENERATE_EXCEL: &str = "iat_generate_excel";
pub const SEND_EMAIL: &str = "iat_send_email";
pub const DOCUMENT_SEARCH: &str = "iat_document_search";
pub const IMAGE_SEARCH: &str = "iat_image_search";
pub const VISUAL_SEARCH: &str = "iat_visual_search";
pub const WEB_SEARCH: &str = "iat_web_search";

/// Executes one built-in tool
#[async_trait]
pub trait SystemToolHandler: Send + Sync {
    async fn call(&self, company: &str, args: &Map<String, Value>) -> Result<Value>;
}

/// Handlers keyed by system tool name
#[derive(Default, Clone)]
pub struct SystemToolTable {
    handlers: HashMap<String, Arc<dyn SystemToolHandler>>,
}

impl SystemToolTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_handler(mut self, name: &str, handler: Arc<dyn SystemToolHandler>) -> Self {
        self.handlers.insert(name.to_owned(), handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SystemToolHandler>> {
        self.handlers.get(name).cloned()
    }
}

fn filter_schema(what: &str) -> Value {
    json!({
        "type": "array",
        "description": format!("Optional metadata filters as key/value pairs applied to {what}."),
        "items": {
            "type": "object",
            "properties": {
                "key": {"type": "string", "description": "Metadata key, for example doc.type"},
                "value": {
                    "anyOf": [{"type": "string"}, {"type": "number"}, {"type": "boolean"}, {"type": "null"}],
                    "description": "Scalar value to match"
                }
            },
            "required": ["key", "value"],
            "additionalProperties": false
        }
    })
}

fn collection_schema() -> Value {
    json!({"type": "string", "description": "Optional collection to search, for example 'Marketing'."})
}

/// Definitions seeded by `ToolRegistry::register_system_tools`
pub fn definitions() -> Vec<NewTool> {
    vec![
        NewTool::new(
            SQL_QUERY,
            "Run a SQL query against one of the company databases. Use this for every database question.",
            ToolType::System,
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "database_key": {"type": "string", "description": "Name of the database to query."},
                "query": {"type": "string", "description": "SQL statement to run."}
            },
            "required": ["database_key", "query"]
        })),
        NewTool::new(
            GENERATE_EXCEL,
            "Generate an .xlsx file from a list of rows and return its filename, attachment token and download link.",
            ToolType::System,
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "filename": {"type": "string", "description": "Output file name, for example 'report.xlsx'", "pattern": "^.+\\.xlsx?$"},
                "sheet_name": {"type": "string", "description": "Worksheet name", "minLength": 1},
                "data": {
                    "type": "array",
                    "description": "Rows, one object per row",
                    "minItems": 1,
                    "items": {"type": "object"}
                }
            },
            "required": ["filename", "sheet_name", "data"]
        })),
        NewTool::new(SEND_EMAIL, "Send an email when the user asks for one.", ToolType::System).with_parameters(json!({
            "type": "object",
            "properties": {
                "recipient": {"type": "string", "description": "Recipient address"},
                "subject": {"type": "string", "description": "Subject line"},
                "body": {"type": "string", "description": "HTML body"},
                "attachments": {
                    "type": "array",
                    "description": "Files to attach",
                    "items": {
                        "type": "object",
                        "properties": {
                            "filename": {"type": "string"},
                            "content": {"type": "string", "description": "Base64 content"},
                            "attachment_token": {"type": "string", "description": "Token of a generated file"}
                        },
                        "required": ["filename", "content", "attachment_token"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["recipient", "subject", "body", "attachments"]
        })),
        NewTool::new(
            DOCUMENT_SEARCH,
            "Semantic search over the documents of a collection.",
            ToolType::System,
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Text or question to search for."},
                "collection": collection_schema(),
                "metadata_filter": filter_schema("document chunks")
            },
            "required": ["query", "collection", "metadata_filter"]
        })),
        NewTool::new(
            IMAGE_SEARCH,
            "Find images in the company knowledge base from a text description.",
            ToolType::System,
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Description of the image to find."},
                "collection": collection_schema(),
                "metadata_filter": filter_schema("images")
            },
            "required": ["query", "collection", "metadata_filter"]
        })),
        NewTool::new(
            VISUAL_SEARCH,
            "Find images visually similar to one the user attached.",
            ToolType::System,
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "image_index": {"type": "integer", "description": "Zero-based index of the attached image to use."},
                "n_results": {"type": "integer", "description": "Number of results", "minimum": 1, "maximum": 5},
                "collection": collection_schema(),
                "metadata_filter": filter_schema("images")
            },
            "required": ["n_results", "image_index", "collection", "metadata_filter"]
        })),
        NewTool::new(WEB_SEARCH, "Search the public web for current information.", ToolType::System).with_parameters(
            json!({
                "type": "object",
                "properties": {"query": {"type": "string", "description": "Search text."}},
                "required": ["query"]
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl SystemToolHandler for Echo {
        async fn call(&self, company: &str, args: &Map<String, Value>) -> Result<Value> {
            Ok(json!({"company": company, "args": args}))
        }
    }

    #[test]
    fn definitions_are_unique_system_tools() {
        let defs = definitions();
        assert_eq!(defs.len(), 7);
        assert!(defs.iter().all(|d| d.tool_type == ToolType::System));

        let mut names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 7);
    }

    #[tokio::test]
    async fn table_returns_registered_handler() {
        let table = SystemToolTable::new().with_handler(SQL_QUERY, Arc::new(Echo));
        let handler = table.get(SQL_QUERY).unwrap();
        let out = handler.call("acme", &Map::new()).await.unwrap();
        assert_eq!(out["company"], "acme");
        assert!(table.get(WEB_SEARCH).is_none());
    }
}
