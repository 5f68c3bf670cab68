//! Keeps the local mirror of a remote collection in sync.
//!
//! The mirror is only ever replaced as a whole. Each refresh takes a token;
//! a response is applied only while its token is still the newest issued, so
//! an earlier, slower request can never overwrite a later one.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use futures::future::try_join_all;
use serde_json::Value;
use shared::record::Record;
use tracing::{debug, info, warn};

use crate::{
    error::CoreError,
    lock,
    service::{CollectionService, PageQuery},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Whole collection fetched at once; filtering and paging happen locally.
    FullFetch,
    /// Filters and paging are sent to the service, which reports `total`/`page`.
    ServerPaginated,
}

/// Side-channel collections the edit surface needs (categories, approvers).
pub type ReferenceData = BTreeMap<String, Vec<Value>>;

#[derive(Debug)]
pub struct Snapshot<E> {
    pub items: Arc<Vec<E>>,
    pub total: usize,
    pub page: usize,
    pub references: Arc<ReferenceData>,
}

impl<E> Snapshot<E> {
    fn empty(references: Arc<ReferenceData>) -> Self {
        Self {
            items: Arc::new(Vec::new()),
            total: 0,
            page: 1,
            references,
        }
    }
}

impl<E> Clone for Snapshot<E> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            total: self.total,
            page: self.page,
            references: Arc::clone(&self.references),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { total: usize, page: usize },
    /// A newer refresh was issued while this one was in flight; result dropped.
    Superseded,
}

pub struct DataSource<E: Record> {
    service: Arc<dyn CollectionService<E>>,
    collection: String,
    mode: SyncMode,
    reference_collections: Vec<String>,
    mirror: Mutex<Snapshot<E>>,
    issued: AtomicU64,
}

impl<E: Record> DataSource<E> {
    pub fn new(
        service: Arc<dyn CollectionService<E>>,
        collection: impl Into<String>,
        mode: SyncMode,
        reference_collections: Vec<String>,
    ) -> Self {
        Self {
            service,
            collection: collection.into(),
            mode,
            reference_collections,
            mirror: Mutex::new(Snapshot::empty(Arc::new(ReferenceData::new()))),
            issued: AtomicU64::new(0),
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn snapshot(&self) -> Snapshot<E> {
        lock(&self.mirror).clone()
    }

    pub fn items(&self) -> Arc<Vec<E>> {
        Arc::clone(&lock(&self.mirror).items)
    }

    pub fn references(&self) -> Arc<ReferenceData> {
        Arc::clone(&lock(&self.mirror).references)
    }

    /// `query` is only consulted in [`SyncMode::ServerPaginated`].
    pub async fn refresh(&self, query: &PageQuery) -> Result<RefreshOutcome, CoreError> {
        let token = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let fetched = match self.mode {
            SyncMode::FullFetch => self.fetch_all().await,
            SyncMode::ServerPaginated => self.fetch_page(query).await,
        };

        let mut mirror = lock(&self.mirror);
        if self.issued.load(Ordering::SeqCst) != token {
            debug!(collection = %self.collection, token, "sync: dropping superseded response");
            return Ok(RefreshOutcome::Superseded);
        }

        match fetched {
            Ok(snapshot) => {
                let outcome = RefreshOutcome::Applied {
                    total: snapshot.total,
                    page: snapshot.page,
                };
                info!(
                    collection = %self.collection,
                    items = snapshot.items.len(),
                    total = snapshot.total,
                    page = snapshot.page,
                    "sync: mirror replaced"
                );
                *mirror = snapshot;
                Ok(outcome)
            }
            Err(err) => {
                warn!(
                    collection = %self.collection,
                    error = %err,
                    "sync: refresh failed, mirror cleared"
                );
                let references = Arc::clone(&mirror.references);
                *mirror = Snapshot::empty(references);
                Err(err)
            }
        }
    }

    async fn fetch_all(&self) -> Result<Snapshot<E>, CoreError> {
        let service = &self.service;
        let references = try_join_all(self.reference_collections.iter().map(|name| async move {
            let rows = service.list_reference(name).await?;
            Ok::<_, CoreError>((name.clone(), rows))
        }));
        let (listed, references) = futures::try_join!(service.list(None), references)?;

        let total = listed.items.len();
        Ok(Snapshot {
            items: Arc::new(listed.items),
            total,
            page: 1,
            references: Arc::new(references.into_iter().collect()),
        })
    }

    async fn fetch_page(&self, query: &PageQuery) -> Result<Snapshot<E>, CoreError> {
        let listed = self.service.list(Some(query)).await?;
        let total = listed.total.unwrap_or(listed.items.len());
        let page = listed.page.unwrap_or(query.page).max(1);
        Ok(Snapshot {
            items: Arc::new(listed.items),
            total,
            page,
            references: self.references(),
        })
    }
}

#[cfg(test)]
#[path = "tests/data_source_tests.rs"]
mod tests;
