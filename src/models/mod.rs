pub mod chat;
pub mod task;
pub mod user;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, Conversation, MessageRole, ToolCall};
pub use task::{Task, TaskInput, TaskPriority, TaskQuery, TaskStatus};
pub use user::{User, UserCredentials};
