//! Domain types for Communication Bridge
//! Record shapes persisted by the store, the built-in vocabulary, and error types.

pub mod error;
pub mod media;
pub mod settings;
pub mod vocabulary;

pub use error::*;
pub use media::DataUri;
pub use settings::*;
pub use vocabulary::*;
