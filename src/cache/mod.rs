//! Cache module for the offline restaurant store
//!
//! This module provides a cache manager that keeps one record per restaurant id
//! in a versioned JSON document on disk. The gateway mirrors every successful
//! fetch into it and reads it back when the server cannot be reached.

mod manager;

pub use manager::{CacheError, CacheManager, CACHE_FILE, SCHEMA_VERSION};
