//! Backend collaborators of the anyres generic resource.
//!
//! - [`ResourceClient`]: the JSON-speaking backend (`GET` / `PUT` / `DELETE` of one object)
//! - [`ClientError`]: the backend error taxonomy, separating not-found from everything else
//! - [`InMemoryResourceClient`]: an in-process backend with request recording and
//!   failure injection
//! - [`InMemorySchemaRegistry`]: a [`anyres_core::SchemaRegistry`] backed by a concurrent map

pub mod error;
pub mod memory;
pub mod registry;
pub mod traits;

pub use error::{ClientError, ErrorCategory, Result};
pub use memory::{InMemoryResourceClient, RecordedRequest, RequestMethod};
pub use registry::InMemorySchemaRegistry;
pub use traits::ResourceClient;
