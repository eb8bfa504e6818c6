use kbseek_agent::AgentRuntime;
use serde::Serialize;

use crate::commands::{CommandResult, LoadedConfig};

#[derive(Debug, Serialize)]
struct ToolView<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct AgentView<'a> {
    name: &'a str,
    description: &'a str,
    instruction: &'a str,
    tools: Vec<ToolView<'a>>,
}

pub fn run(config: LoadedConfig<'_>) -> CommandResult {
    let config = match config {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure("agent", error),
    };

    let runtime = AgentRuntime::from_config(config);
    let profile = runtime.profile();
    let tools = runtime
        .tools()
        .names()
        .into_iter()
        .filter_map(|name| runtime.tools().get(name))
        .map(|tool| ToolView { name: tool.name(), description: tool.description() })
        .collect();

    let view = AgentView {
        name: &profile.name,
        description: &profile.description,
        instruction: &profile.instruction,
        tools,
    };

    match serde_json::to_string_pretty(&view) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("agent", "serialization", error.to_string(), 1),
    }
}
