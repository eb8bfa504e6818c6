//! Agent integration for knowledge-base retrieval.
//!
//! - `tools`: the [`Tool`](tools::Tool) seam and a name-keyed registry
//! - `retrieval_tool`: `bedrock_kb_retrieval`, wrapping the core retriever
//! - `profile`: agent name, description and standing instruction
//! - `runtime`: wires the profile and registry together
//!
//! The retriever never raises: a failed search is still a successful tool
//! call whose payload has `status == "error"`, so the agent can fall back to
//! general knowledge.

pub mod profile;
pub mod retrieval_tool;
pub mod runtime;
pub mod tools;

pub use profile::AgentProfile;
pub use retrieval_tool::{KnowledgeBaseRetrievalTool, RETRIEVAL_TOOL_NAME};
pub use runtime::AgentRuntime;
pub use tools::{Tool, ToolRegistry};
