//! Persistence Adapters
//!
//! Implementations of the [`BlogStore`](crate::application::ports::BlogStore)
//! port.

mod in_memory;

pub use in_memory::InMemoryBlogStore;
