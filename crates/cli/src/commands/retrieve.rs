use kbseek_core::{ErrorKind, ResultEnvelope, Retriever};

use crate::commands::{CommandResult, LoadedConfig};

pub fn run(config: LoadedConfig<'_>, query: &str) -> CommandResult {
    let config = match config {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure("retrieve", error),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "retrieve",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let retriever = Retriever::from_config(config);
    let envelope = runtime.block_on(retriever.retrieve(query));

    CommandResult { exit_code: exit_code(&envelope), output: render(&envelope) }
}

fn exit_code(envelope: &ResultEnvelope) -> u8 {
    match envelope.error_kind() {
        None => 0,
        Some(ErrorKind::Service) => 1,
        Some(ErrorKind::Configuration) => 2,
    }
}

fn render(envelope: &ResultEnvelope) -> String {
    serde_json::to_string_pretty(&envelope.to_json()).unwrap_or_else(|error| {
        format!(
            "{{\"status\":\"error\",\"results\":[],\"error_message\":\"{}\"}}",
            super::escape_json(&error.to_string())
        )
    })
}
