use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Resource, ResourceFields, Role};

// Futures are not `Send`: in the browser every call runs on the UI thread.
#[async_trait(?Send)]
pub trait ResourceStore {
    /// Every resource, newest first.
    async fn list(&self) -> Result<Vec<Resource>, StoreError>;

    async fn create(
        &self,
        fields: ResourceFields,
        created_by: Option<&str>,
    ) -> Result<Resource, StoreError>;

    async fn update(&self, id: &str, fields: ResourceFields) -> Result<Resource, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait(?Send)]
pub trait RoleSource {
    async fn role_of(&self, user_id: &str) -> Result<Role, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Fire-and-forget user notification (toast).
pub trait Notifier {
    fn notify(&self, kind: NoticeKind, message: &str);
}
