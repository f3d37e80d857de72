//! catalog-cache-core: Core traits and types for the catalog-cache library
//!
//! This crate provides the store, serializer, key and metrics seams shared by
//! the storage adapters and the cache-aside layer.

mod error;
mod traits;
mod types;

pub use error::{CacheError, Result};
pub use traits::*;
pub use types::*;
