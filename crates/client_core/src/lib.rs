//! Synchronized, filterable, paginated record lists with optimistic-close
//! mutations, generic over the entity kind.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod config;
pub mod controller;
pub mod data_source;
pub mod error;
pub mod events;
pub mod filter;
pub mod http;
pub mod kinds;
pub mod loading;
pub mod mutation;
pub mod normalize;
pub mod paginator;
pub mod service;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

pub use controller::{EntityListController, ListView};
pub use data_source::{DataSource, ReferenceData, RefreshOutcome, SyncMode};
pub use error::CoreError;
pub use events::{ListEvent, Notice, NoticeLevel};
pub use filter::{FilterDimension, FilterState};
pub use http::HttpCollectionService;
pub use kinds::{EntityKindConfig, StatusField};
pub use loading::{LoadingCoordinator, LoadingGuard, LoadingState};
pub use mutation::{EditSession, MutationController, MutationKind, MutationState, PendingMutation};
pub use normalize::{Payload, PayloadPolicy};
pub use service::{CollectionService, ListPage, PageQuery};

/// State locks are never held across an await, so a poisoned lock only means a
/// panic elsewhere; the data itself is still whole.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
