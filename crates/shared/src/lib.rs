pub mod collab;
pub mod error;
pub mod filter;
pub mod geo;
pub mod markers;
pub mod models;
pub mod selection;
pub mod view;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{FieldError, StoreError};
pub use models::{CoordValue, Resource, ResourceDraft, ResourceFields, ResourceStatus, ResourceType, Role};
