use anyhow::Result;
use kbseek_core::{AppConfig, Retriever};
use serde_json::Value;
use tracing::{info, warn};

use crate::profile::AgentProfile;
use crate::retrieval_tool::KnowledgeBaseRetrievalTool;
use crate::tools::ToolRegistry;

pub struct AgentRuntime {
    profile: AgentProfile,
    tools: ToolRegistry,
}

impl AgentRuntime {
    pub fn new(profile: AgentProfile, tools: ToolRegistry) -> Self {
        Self { profile, tools }
    }

    /// Default profile with the knowledge-base tool registered.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut tools = ToolRegistry::default();
        tools.register(KnowledgeBaseRetrievalTool::new(Retriever::from_config(config)));
        Self::new(AgentProfile::default(), tools)
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub async fn call_tool(&self, name: &str, input: Value) -> Result<Value> {
        info!(
            event_name = "agent.tool.call",
            agent = %self.profile.name,
            tool = name,
            "dispatching tool call"
        );

        let result = self.tools.execute(name, input).await;
        if let Err(error) = &result {
            warn!(
                event_name = "agent.tool.error",
                agent = %self.profile.name,
                tool = name,
                error = %error,
                "tool call failed"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use kbseek_core::AppConfig;
    use serde_json::json;

    use super::AgentRuntime;
    use crate::retrieval_tool::RETRIEVAL_TOOL_NAME;

    #[tokio::test]
    async fn registers_the_retrieval_tool_from_config() {
        let runtime = AgentRuntime::from_config(&AppConfig::default());

        assert_eq!(runtime.tools().names(), vec![RETRIEVAL_TOOL_NAME]);
        assert_eq!(runtime.profile().name, "root_agent");

        let output = runtime
            .call_tool(RETRIEVAL_TOOL_NAME, json!({"query": "anything"}))
            .await
            .expect("tool call should produce an envelope");
        assert_eq!(output["status"], "error");
        assert!(output["error_message"]
            .as_str()
            .unwrap_or_default()
            .contains("KNOWLEDGE_BASE_ID"));
    }

    #[tokio::test]
    async fn unknown_tools_are_rejected() {
        let runtime = AgentRuntime::from_config(&AppConfig::default());

        assert!(runtime.call_tool("web_search", json!({})).await.is_err());
    }
}
