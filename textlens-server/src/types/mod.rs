//! Wire types for external APIs.
//!
//! - `ollama`: Ollama native API (`/api/generate`, `/api/tags`)

pub mod ollama;
