use async_trait::async_trait;
use serde_json::Value;
use shared::record::{Record, RecordId};

use crate::{error::CoreError, normalize::Payload};

/// Parameters of a server-paginated list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    /// Query parameters derived from the active filter dimensions.
    pub filters: Vec<(String, String)>,
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct ListPage<E> {
    pub items: Vec<E>,
    pub total: Option<usize>,
    pub page: Option<usize>,
}

/// Remote collection for one entity kind.
#[async_trait]
pub trait CollectionService<E: Record>: Send + Sync {
    /// `None` fetches the whole collection.
    async fn list(&self, query: Option<&PageQuery>) -> Result<ListPage<E>, CoreError>;
    async fn list_reference(&self, name: &str) -> Result<Vec<Value>, CoreError>;
    async fn create(&self, payload: &Payload) -> Result<(), CoreError>;
    async fn update(&self, id: &RecordId, payload: &Payload) -> Result<(), CoreError>;
    async fn update_status(&self, id: &RecordId, payload: &Payload) -> Result<(), CoreError>;
    async fn delete(&self, id: &RecordId) -> Result<(), CoreError>;
}
