//! Events a controller publishes for its screen: notices, dialogs, editor and loading changes.

use shared::record::RecordId;

use crate::{loading::LoadingState, mutation::PendingMutation, normalize::Payload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    /// Transient toast.
    Notice(Notice),
    /// Blocking dialog for a failed delete; `detail` is set when the server
    /// names the dependents that block it.
    DeleteConflict {
        message: String,
        detail: Option<String>,
    },
    Loading(LoadingState),
    CollectionReplaced {
        total: usize,
        page: usize,
    },
    EditorOpened {
        target_id: Option<RecordId>,
        draft: Payload,
    },
    EditorClosed,
    /// A save failed while another editor was open. The attempt is handed
    /// back here instead of overwriting the open draft.
    UnsavedDraft {
        pending: PendingMutation,
    },
}
