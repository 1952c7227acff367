//! Provider implementations.

pub mod openai;
pub use openai::OpenAIProvider;

pub mod mock;
pub use mock::MockProvider;
