//! Port Interfaces
//!
//! Contracts the infrastructure adapters implement, following the
//! Hexagonal Architecture pattern.
//!
//! ## Driven Ports (Outbound)
//!
//! - `BlogStore`: document store holding blog resources

mod blog_store;

pub use blog_store::{BlogStore, BlogStream, StoreError};

#[cfg(test)]
pub use blog_store::MockBlogStore;
