//! Natural-language questions over a SQL database: the tools the model may call,
//! the agent loop driving them, and the per-session transcript.

pub mod agent;
pub mod session;
pub mod tools;
pub mod transcript;

pub use agent::{AgentError, AgentEvent, ITERATION_LIMIT_ANSWER, SqlAgent};
pub use session::ChatSession;
pub use tools::{SqlTool, ToolOutput};
pub use transcript::{GREETING, Message, Role, Transcript};
