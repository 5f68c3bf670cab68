//! The controller behind one record screen: mirror, filtered/paged view,
//! mutations and the busy indicator, wired together for one entity kind.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use shared::record::{Record, RecordId};
use tokio::sync::broadcast;
use tracing::debug;

use crate::{
    config::ClientSettings,
    data_source::{DataSource, ReferenceData, RefreshOutcome, SyncMode},
    error::CoreError,
    events::{ListEvent, Notice},
    filter::{self, FilterState},
    http::HttpCollectionService,
    kinds::EntityKindConfig,
    loading::{LoadingCoordinator, LoadingState},
    lock,
    mutation::{MutationController, MutationState, Resync},
    normalize::Payload,
    paginator,
    service::{CollectionService, PageQuery},
};

const EVENT_CAPACITY: usize = 256;

/// What the table renderer draws.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<E> {
    pub items: Vec<E>,
    pub page: usize,
    pub page_size: usize,
    /// Number of records across all pages.
    pub total: usize,
    pub page_count: usize,
}

struct ViewState<E> {
    filters: FilterState,
    page: usize,
    page_size: usize,
    /// Full-fetch only: the mirror with every active filter applied.
    filtered: Arc<Vec<E>>,
}

pub struct EntityListController<E: Record> {
    config: EntityKindConfig,
    data: DataSource<E>,
    mutations: MutationController<E>,
    loading: Arc<LoadingCoordinator>,
    events: broadcast::Sender<ListEvent>,
    view: Mutex<ViewState<E>>,
}

impl<E: Record> EntityListController<E> {
    pub fn new(config: EntityKindConfig, service: Arc<dyn CollectionService<E>>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let loading = Arc::new(LoadingCoordinator::new(events.clone()));
        let data = DataSource::new(
            Arc::clone(&service),
            config.collection.clone(),
            config.mode,
            config.reference_collections.clone(),
        );
        let mutations =
            MutationController::new(&config, service, Arc::clone(&loading), events.clone());
        let view = ViewState {
            filters: FilterState::default(),
            page: 1,
            page_size: config.page_size.max(1),
            filtered: Arc::new(Vec::new()),
        };
        Arc::new(Self {
            config,
            data,
            mutations,
            loading,
            events,
            view: Mutex::new(view),
        })
    }

    pub fn over_http(
        config: EntityKindConfig,
        settings: &ClientSettings,
    ) -> Result<Arc<Self>, CoreError> {
        let service = HttpCollectionService::<E>::new(
            &settings.server_url,
            config.collection.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )?;
        let config = config.with_page_size(settings.page_size);
        Ok(Self::new(config, Arc::new(service)))
    }

    pub fn config(&self) -> &EntityKindConfig {
        &self.config
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ListEvent> {
        self.events.subscribe()
    }

    pub fn loading_state(&self) -> LoadingState {
        self.loading.state()
    }

    pub fn mutation_state(&self) -> MutationState {
        self.mutations.state()
    }

    pub fn draft(&self) -> Option<Payload> {
        self.mutations.draft()
    }

    pub fn references(&self) -> Arc<ReferenceData> {
        self.data.references()
    }

    pub fn filters(&self) -> FilterState {
        lock(&self.view).filters.clone()
    }

    pub fn find(&self, id: &RecordId) -> Option<E> {
        self.data
            .items()
            .iter()
            .find(|record| record.id() == Some(id))
            .cloned()
    }

    /// Like `find`, but in server-paginated mode walks the other pages until
    /// the record is in the mirror. The view stays on the page that holds it;
    /// if no page does, the starting page is restored.
    pub async fn seek(&self, id: &RecordId) -> Result<E, CoreError> {
        if let Some(record) = self.find(id) {
            return Ok(record);
        }
        if self.data.mode() == SyncMode::ServerPaginated {
            let start = self.view();
            for page in (1..=start.page_count).filter(|page| *page != start.page) {
                self.set_page(page).await?;
                if let Some(record) = self.find(id) {
                    debug!(label = %self.config.label, %id, page, "controller: record found");
                    return Ok(record);
                }
            }
            self.set_page(start.page).await?;
        }
        Err(CoreError::NotFound(id.to_string()))
    }

    /// Re-synchronizes the mirror. On failure the mirror is empty and the
    /// error has already been announced as a notice.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let query = self.page_query();
        let _busy = self
            .loading
            .begin(format!("Loading {} list...", self.config.label));

        match self.data.refresh(&query).await {
            Ok(RefreshOutcome::Superseded) => Ok(()),
            Ok(RefreshOutcome::Applied { total, page }) => {
                self.rebuild_view(page);
                let _ = self
                    .events
                    .send(ListEvent::CollectionReplaced { total, page });
                Ok(())
            }
            Err(err) => {
                self.rebuild_view(1);
                let _ = self
                    .events
                    .send(ListEvent::CollectionReplaced { total: 0, page: 1 });
                let _ = self.events.send(ListEvent::Notice(Notice::error(format!(
                    "Could not load {} list: {err}",
                    self.config.label
                ))));
                Err(err)
            }
        }
    }

    /// Any change goes back to page 1.
    pub async fn set_filter(&self, dimension: &str, value: &str) -> Result<(), CoreError> {
        if !self
            .config
            .dimensions
            .iter()
            .any(|known| known.name == dimension)
        {
            return Err(CoreError::UnknownFilter(dimension.to_string()));
        }
        let changed = {
            let mut view = lock(&self.view);
            let changed = view.filters.set(dimension, value);
            if changed {
                view.page = 1;
            }
            changed
        };
        if !changed {
            return Ok(());
        }
        debug!(collection = %self.config.collection, dimension, value, "view: filter changed");
        self.after_filter_change().await
    }

    pub async fn clear_filters(&self) -> Result<(), CoreError> {
        let changed = {
            let mut view = lock(&self.view);
            let changed = view.filters.clear();
            if changed {
                view.page = 1;
            }
            changed
        };
        if !changed {
            return Ok(());
        }
        self.after_filter_change().await
    }

    async fn after_filter_change(&self) -> Result<(), CoreError> {
        match self.data.mode() {
            SyncMode::FullFetch => {
                self.rebuild_view(1);
                Ok(())
            }
            SyncMode::ServerPaginated => self.refresh().await,
        }
    }

    /// Out-of-range pages fall back to page 1.
    pub async fn set_page(&self, page: usize) -> Result<(), CoreError> {
        let mode = self.data.mode();
        {
            let mut view = lock(&self.view);
            let total = match mode {
                SyncMode::FullFetch => view.filtered.len(),
                SyncMode::ServerPaginated => self.data.snapshot().total,
            };
            let pages = paginator::page_count(total, view.page_size);
            view.page = if page == 0 || page > pages { 1 } else { page };
        }
        match mode {
            SyncMode::FullFetch => Ok(()),
            SyncMode::ServerPaginated => self.refresh().await,
        }
    }

    pub async fn set_page_size(&self, page_size: usize) -> Result<(), CoreError> {
        {
            let mut view = lock(&self.view);
            view.page_size = page_size.max(1);
            view.page = 1;
        }
        match self.data.mode() {
            SyncMode::FullFetch => Ok(()),
            SyncMode::ServerPaginated => self.refresh().await,
        }
    }

    pub fn view(&self) -> ListView<E> {
        let view = lock(&self.view);
        match self.data.mode() {
            SyncMode::FullFetch => {
                let total = view.filtered.len();
                ListView {
                    items: paginator::slice(&view.filtered, view.page, view.page_size).to_vec(),
                    page: view.page,
                    page_size: view.page_size,
                    total,
                    page_count: paginator::page_count(total, view.page_size),
                }
            }
            SyncMode::ServerPaginated => {
                let snapshot = self.data.snapshot();
                ListView {
                    items: snapshot.items.as_ref().clone(),
                    page: view.page,
                    page_size: view.page_size,
                    total: snapshot.total,
                    page_count: paginator::page_count(snapshot.total, view.page_size),
                }
            }
        }
    }

    /// Full filtered sequence; in server-paginated mode this is the current page.
    pub fn filtered(&self) -> Arc<Vec<E>> {
        match self.data.mode() {
            SyncMode::FullFetch => Arc::clone(&lock(&self.view).filtered),
            SyncMode::ServerPaginated => self.data.items(),
        }
    }

    pub fn open_create(&self) -> Result<(), CoreError> {
        self.mutations.open_create()
    }

    pub fn open_edit(&self, id: &RecordId) -> Result<(), CoreError> {
        let record = self.require(id)?;
        self.mutations.open_edit(&record)
    }

    pub fn set_draft_field(&self, field: &str, value: Value) -> Result<(), CoreError> {
        self.mutations.set_field(field, value)
    }

    pub fn cancel_edit(&self) {
        self.mutations.cancel_edit();
    }

    pub async fn save(&self) -> Result<(), CoreError> {
        self.mutations.save(self).await
    }

    pub async fn toggle_status(&self, id: &RecordId) -> Result<(), CoreError> {
        let record = self.require(id)?;
        self.mutations.toggle_status(&record, self).await
    }

    pub fn request_delete(&self, id: &RecordId) -> Result<(), CoreError> {
        self.require(id)?;
        self.mutations.request_delete(id.clone())
    }

    pub fn cancel_delete(&self) {
        self.mutations.cancel_delete();
    }

    pub async fn confirm_delete(&self) -> Result<(), CoreError> {
        self.mutations.confirm_delete(self).await
    }

    fn require(&self, id: &RecordId) -> Result<E, CoreError> {
        self.find(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    fn page_query(&self) -> PageQuery {
        let view = lock(&self.view);
        PageQuery {
            filters: view
                .filters
                .active()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            page: view.page,
            limit: view.page_size,
        }
    }

    fn rebuild_view(&self, page: usize) {
        let filtered = match self.data.mode() {
            SyncMode::FullFetch => {
                let items = self.data.items();
                let filters = lock(&self.view).filters.clone();
                Arc::new(filter::apply(&items, &filters, &self.config.dimensions))
            }
            SyncMode::ServerPaginated => Arc::new(Vec::new()),
        };
        let mut view = lock(&self.view);
        view.filtered = filtered;
        view.page = page.max(1);
    }
}

#[async_trait]
impl<E: Record> Resync for EntityListController<E> {
    async fn resync(&self) -> Result<(), CoreError> {
        self.refresh().await
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
