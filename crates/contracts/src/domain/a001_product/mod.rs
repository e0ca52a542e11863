pub mod aggregate;

pub use aggregate::{
    ImageRef, Product, ProductId, ProductStatus, SyncedFields, ValidationError, WineVariant,
    DEFAULT_RATING,
};
