pub mod repository;
pub mod service;

pub use repository::{ProductRepository, ProductStore};
pub use service::{UpsertError, UpsertOutcome};
