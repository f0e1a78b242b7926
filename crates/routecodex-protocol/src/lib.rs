pub mod anthropic;
pub mod codex;
pub mod models;
pub mod openai;
pub mod sse;
