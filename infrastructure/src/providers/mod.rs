//! Model backends and the router that picks one of them.

pub mod echo;
mod http;
mod ndjson;
pub mod ollama;
pub mod openai;
pub mod router;

pub use echo::EchoAdapter;
pub use ollama::OllamaAdapter;
pub use openai::OpenAiCompatibleAdapter;
pub use router::{ModelRouter, RouterError};
