//! Memory tool: memory
//!
//! Per-agent key-value notes. The agent is identified by
//! [`ToolContext::agent_id`]; one agent never sees another's entries.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use toolgate_application::{
    MemoryEntry, MemoryStore, Sandbox, StoreError, Tool, ToolContext, ToolError, parse_input,
};
use toolgate_domain::{Policy, ToolDefinition};

/// Tool name constant
pub const MEMORY: &str = "memory";

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Action {
    Get,
    Set,
    Delete,
    List,
    Search,
}

#[derive(Debug, Deserialize)]
struct MemoryArgs {
    action: Action,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    query: Option<String>,
}

fn required(field: Option<String>, name: &str, action: &str) -> Result<String, ToolError> {
    field
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidInput(format!("'{}' is required for {}", name, action)))
}

fn store_error(e: StoreError) -> ToolError {
    ToolError::Execution(e.to_string())
}

fn render_entries(entries: &[MemoryEntry]) -> String {
    if entries.is_empty() {
        return "(no entries)".to_string();
    }
    entries
        .iter()
        .map(|e| format!("{}: {}", e.key, e.value))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct MemoryTool {
    store: Arc<dyn MemoryStore>,
}

impl MemoryTool {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for MemoryTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            MEMORY,
            "Store and recall persistent notes. Actions: get, set, delete, list, search.",
        )
        .with_input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "action": {"type": "string", "enum": ["get", "set", "delete", "list", "search"]},
                "key": {"type": "string"},
                "value": {"type": "string"},
                "query": {"type": "string", "description": "Substring to search keys and values for"}
            },
            "required": ["action"]
        }))
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
        _sandbox: &dyn Sandbox,
        _policy: &Policy,
    ) -> Result<String, ToolError> {
        let args: MemoryArgs = parse_input(input)?;
        let agent = ctx.agent_id.as_str();

        match args.action {
            Action::Get => {
                let key = required(args.key, "key", "get")?;
                match self.store.get(agent, &key).await.map_err(store_error)? {
                    Some(entry) => Ok(entry.value),
                    None => Err(ToolError::Execution(format!("no memory stored under '{}'", key))),
                }
            }
            Action::Set => {
                let key = required(args.key, "key", "set")?;
                let value = args
                    .value
                    .ok_or_else(|| ToolError::InvalidInput("'value' is required for set".into()))?;
                self.store.set(agent, &key, &value).await.map_err(store_error)?;
                Ok(format!("Stored '{}'", key))
            }
            Action::Delete => {
                let key = required(args.key, "key", "delete")?;
                if self.store.delete(agent, &key).await.map_err(store_error)? {
                    Ok(format!("Deleted '{}'", key))
                } else {
                    Ok(format!("Nothing stored under '{}'", key))
                }
            }
            Action::List => {
                let entries = self.store.list(agent).await.map_err(store_error)?;
                Ok(render_entries(&entries))
            }
            Action::Search => {
                let query = required(args.query, "query", "search")?;
                let entries = self.store.search(agent, &query).await.map_err(store_error)?;
                Ok(render_entries(&entries))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::InMemoryMemoryStore;
    use crate::tools::testing::ScriptedSandbox;
    use serde_json::json;

    async fn run(tool: &MemoryTool, agent: &str, input: serde_json::Value) -> Result<String, ToolError> {
        tool.execute(
            &ToolContext::new(agent),
            input,
            &ScriptedSandbox::unused(),
            &Policy::default(),
        )
        .await
    }

    #[tokio::test]
    async fn test_set_get_list_search_delete() {
        let tool = MemoryTool::new(Arc::new(InMemoryMemoryStore::new()));

        run(&tool, "a1", json!({"action": "set", "key": "city", "value": "Oslo"}))
            .await
            .unwrap();
        run(&tool, "a1", json!({"action": "set", "key": "lang", "value": "Rust"}))
            .await
            .unwrap();

        assert_eq!(run(&tool, "a1", json!({"action": "get", "key": "city"})).await.unwrap(), "Oslo");
        assert_eq!(
            run(&tool, "a1", json!({"action": "list"})).await.unwrap(),
            "city: Oslo\nlang: Rust"
        );
        assert_eq!(
            run(&tool, "a1", json!({"action": "search", "query": "rust"})).await.unwrap(),
            "lang: Rust"
        );
        assert_eq!(
            run(&tool, "a1", json!({"action": "delete", "key": "city"})).await.unwrap(),
            "Deleted 'city'"
        );
        assert!(matches!(
            run(&tool, "a1", json!({"action": "get", "key": "city"})).await,
            Err(ToolError::Execution(_))
        ));
    }

    #[tokio::test]
    async fn test_agents_are_isolated() {
        let tool = MemoryTool::new(Arc::new(InMemoryMemoryStore::new()));
        run(&tool, "a1", json!({"action": "set", "key": "k", "value": "v"}))
            .await
            .unwrap();
        assert_eq!(run(&tool, "a2", json!({"action": "list"})).await.unwrap(), "(no entries)");
    }

    #[tokio::test]
    async fn test_missing_fields_are_invalid_input() {
        let tool = MemoryTool::new(Arc::new(InMemoryMemoryStore::new()));
        for input in [
            json!({"action": "get"}),
            json!({"action": "set", "key": "k"}),
            json!({"action": "search"}),
            json!({"action": "forget"}),
        ] {
            assert!(matches!(
                run(&tool, "a1", input).await,
                Err(ToolError::InvalidInput(_))
            ));
        }
    }
}
