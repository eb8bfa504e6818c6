use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn execute(&self, input: Value) -> Result<Value>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub async fn execute(&self, name: &str, input: Value) -> Result<Value> {
        let tool = self.get(name).ok_or_else(|| anyhow!("unknown tool `{name}`"))?;
        tool.execute(input).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::{Tool, ToolRegistry};

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Returns its input unchanged."
        }

        async fn execute(&self, input: Value) -> Result<Value> {
            Ok(input)
        }
    }

    #[tokio::test]
    async fn dispatches_by_name() {
        let mut registry = ToolRegistry::default();
        assert!(registry.is_empty());

        registry.register(Echo);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), vec!["echo"]);
        let output = registry.execute("echo", json!({"x": 1})).await.expect("echo should run");
        assert_eq!(output, json!({"x": 1}));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let registry = ToolRegistry::default();

        let error = registry.execute("missing", json!({})).await.expect_err("should fail");
        assert_eq!(error.to_string(), "unknown tool `missing`");
    }

    #[test]
    fn re_registering_replaces_the_tool() {
        let mut registry = ToolRegistry::default();
        registry.register(Echo);
        registry.register(Echo);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("echo").map(|tool| tool.description()), Some("Returns its input unchanged."));
    }
}
