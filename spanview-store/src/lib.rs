//! In-memory span store serving the spans screen.

pub mod error;
pub mod layout;
pub mod memory;

pub use error::StoreError;
pub use layout::assign_lanes;
pub use memory::MemoryStore;
