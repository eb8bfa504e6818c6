use crate::retrieval_tool::RETRIEVAL_TOOL_NAME;

/// Identity and standing instructions handed to the hosting agent framework.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentProfile {
    pub name: String,
    pub description: String,
    pub instruction: String,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            name: "root_agent".to_string(),
            description: "Answers questions using the configured Bedrock knowledge base."
                .to_string(),
            instruction: default_instruction(),
        }
    }
}

fn default_instruction() -> String {
    format!(
        "When answering, search the knowledge base whenever possible.\n\n\
         **When the user asks about a specific topic, call the '{RETRIEVAL_TOOL_NAME}' tool to \
         fetch relevant information.**\n\n\
         **If the tool returns useful information, use it to give a detailed answer.**\n\n\
         **If the tool returns an error or finds nothing relevant, answer from general \
         knowledge and say that the available information is limited.**\n\n\
         Always state the sources of retrieved information."
    )
}

#[cfg(test)]
mod tests {
    use super::AgentProfile;

    #[test]
    fn default_instruction_names_the_retrieval_tool() {
        let profile = AgentProfile::default();

        assert_eq!(profile.name, "root_agent");
        assert!(profile.instruction.contains("'bedrock_kb_retrieval'"));
        assert!(profile.instruction.contains("general knowledge"));
        assert!(profile.instruction.contains("sources"));
    }
}
