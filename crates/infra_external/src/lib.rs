//! External Service Adapters
//!
//! REST adapters for the services the claims workflow delegates judgment and
//! retrieval to. Each implements a port from `domain_claims` and reports its
//! own health.
//!
//! # Available Adapters
//!
//! - **GeminiReasoningAdapter**: `ReasoningPort` over the Gemini `generateContent` API
//! - **OpenAiEmbeddings**: text embeddings used to query and fill the vector index
//! - **PineconeRetrievalAdapter**: `RetrievalPort` over a Pinecone index host
//!
//! # Error Handling
//!
//! HTTP failures are mapped to `PortError` variants:
//! - 404 -> `PortError::NotFound`
//! - 401/403 -> `PortError::Unauthorized`
//! - 429 -> `PortError::RateLimited`
//! - 5xx -> `PortError::ServiceUnavailable`
//! - Client timeouts -> `PortError::Timeout`
//! - Connect failures -> `PortError::Connection`
//! - Unexpected body -> `PortError::Transformation`
//! - Other -> `PortError::Internal`
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_external::{GeminiConfig, GeminiReasoningAdapter};
//! use domain_claims::ReasoningPort;
//! use std::sync::Arc;
//!
//! let adapter = GeminiReasoningAdapter::new(GeminiConfig {
//!     api_key: std::env::var("GOOGLE_API_KEY")?,
//!     temperature: 0.5,
//!     ..Default::default()
//! })?;
//! let port: Arc<dyn ReasoningPort> = Arc::new(adapter);
//! ```

mod http;
pub mod gemini;
pub mod openai_embeddings;
pub mod pinecone;

pub use gemini::{GeminiConfig, GeminiReasoningAdapter};
pub use openai_embeddings::{OpenAiConfig, OpenAiEmbeddings};
pub use pinecone::{PassageRecord, PineconeConfig, PineconeRetrievalAdapter};
