//! Create/update/status/delete orchestration with optimistic close and
//! rollback into the editor on failure.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use serde_json::Value;
use shared::record::{Record, RecordId};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    error::CoreError,
    events::{ListEvent, Notice},
    kinds::{EntityKindConfig, StatusField},
    loading::LoadingCoordinator,
    lock,
    normalize::{
        draft_from_record, normalize_payload, prefilled_draft, validate_required, Payload,
        PayloadPolicy,
    },
    service::CollectionService,
};

/// Re-synchronizes the collection after a mutation went through.
#[async_trait]
pub trait Resync: Send + Sync {
    async fn resync(&self) -> Result<(), CoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    StatusToggle,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
    pub kind: MutationKind,
    pub target_id: Option<RecordId>,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub target_id: Option<RecordId>,
    pub draft: Payload,
    /// The save that failed and reopened this session, if any.
    pub failed: Option<PendingMutation>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum MutationState {
    #[default]
    Idle,
    Editing(EditSession),
    /// Editor already dismissed; the request is in flight.
    Saving {
        ticket: u64,
        pending: PendingMutation,
    },
    DeletePending {
        target: RecordId,
    },
    Deleting {
        target: RecordId,
    },
}

impl MutationState {
    pub fn is_editor_open(&self) -> bool {
        matches!(self, Self::Editing(_))
    }

    fn accepts_new_editor(&self) -> bool {
        matches!(self, Self::Idle | Self::Editing(_) | Self::Saving { .. })
    }
}

pub struct MutationController<E: Record> {
    service: Arc<dyn CollectionService<E>>,
    label: String,
    policy: PayloadPolicy,
    required_fields: Vec<String>,
    template: Payload,
    status_field: Option<StatusField>,
    can_create: bool,
    loading: Arc<LoadingCoordinator>,
    events: broadcast::Sender<ListEvent>,
    state: Mutex<MutationState>,
    next_ticket: AtomicU64,
}

impl<E: Record> MutationController<E> {
    pub fn new(
        config: &EntityKindConfig,
        service: Arc<dyn CollectionService<E>>,
        loading: Arc<LoadingCoordinator>,
        events: broadcast::Sender<ListEvent>,
    ) -> Self {
        Self {
            service,
            label: config.label.clone(),
            policy: config.policy.clone(),
            required_fields: config.required_fields.clone(),
            template: config.template.clone(),
            status_field: config.status_field.clone(),
            can_create: config.can_create,
            loading,
            events,
            state: Mutex::new(MutationState::Idle),
            next_ticket: AtomicU64::new(1),
        }
    }

    pub fn state(&self) -> MutationState {
        lock(&self.state).clone()
    }

    pub fn draft(&self) -> Option<Payload> {
        match &*lock(&self.state) {
            MutationState::Editing(session) => Some(session.draft.clone()),
            _ => None,
        }
    }

    pub fn open_create(&self) -> Result<(), CoreError> {
        if !self.can_create {
            return Err(CoreError::Refused(format!(
                "not allowed to create a {}",
                self.label
            )));
        }
        self.open_editor(None, self.template.clone())
    }

    pub fn open_edit(&self, record: &E) -> Result<(), CoreError> {
        let target_id = record
            .id()
            .cloned()
            .ok_or_else(|| CoreError::NotFound("unsaved record".into()))?;
        let draft = draft_from_record(record)?;
        self.open_editor(Some(target_id), draft)
    }

    fn open_editor(&self, target_id: Option<RecordId>, draft: Payload) -> Result<(), CoreError> {
        {
            let mut state = lock(&self.state);
            if !state.accepts_new_editor() {
                return Err(CoreError::Refused(
                    "finish the pending delete before editing".into(),
                ));
            }
            *state = MutationState::Editing(EditSession {
                target_id: target_id.clone(),
                draft: draft.clone(),
                failed: None,
            });
        }
        let _ = self.events.send(ListEvent::EditorOpened { target_id, draft });
        Ok(())
    }

    pub fn set_field(&self, field: &str, value: Value) -> Result<(), CoreError> {
        let mut state = lock(&self.state);
        let MutationState::Editing(session) = &mut *state else {
            return Err(CoreError::Refused("no editor is open".into()));
        };
        session.draft.insert(field.to_string(), value);
        Ok(())
    }

    pub fn cancel_edit(&self) {
        let closed = {
            let mut state = lock(&self.state);
            if state.is_editor_open() {
                *state = MutationState::Idle;
                true
            } else {
                false
            }
        };
        if closed {
            let _ = self.events.send(ListEvent::EditorClosed);
        }
    }

    /// Validates, dismisses the editor, then issues the request. The editor is
    /// closed before the request is sent; a failure reopens it pre-filled with
    /// the id and the normalized payload that was submitted.
    pub async fn save(&self, resync: &dyn Resync) -> Result<(), CoreError> {
        let (ticket, pending) = {
            let mut state = lock(&self.state);
            let MutationState::Editing(session) = &*state else {
                return Err(CoreError::Refused("no editor is open".into()));
            };
            validate_required(&session.draft, &self.required_fields)?;

            let target_id = session.target_id.clone();
            let pending = PendingMutation {
                kind: if target_id.is_some() {
                    MutationKind::Update
                } else {
                    MutationKind::Create
                },
                target_id,
                payload: normalize_payload(&session.draft, &self.policy),
            };
            let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
            *state = MutationState::Saving {
                ticket,
                pending: pending.clone(),
            };
            (ticket, pending)
        };
        let _ = self.events.send(ListEvent::EditorClosed);

        let _busy = self.loading.begin(format!("Saving {}...", self.label));
        let result = match &pending.target_id {
            None => self.service.create(&pending.payload).await,
            Some(id) => self.service.update(id, &pending.payload).await,
        };

        match result {
            Ok(()) => {
                info!(label = %self.label, kind = ?pending.kind, "mutation: save accepted");
                self.settle_save(ticket, MutationState::Idle);
                let _ = resync.resync().await;
                let verb = match pending.kind {
                    MutationKind::Create => "created",
                    _ => "updated",
                };
                self.notify(Notice::success(format!("{} {verb}", capitalized(&self.label))));
                Ok(())
            }
            Err(err) => {
                warn!(
                    label = %self.label,
                    kind = ?pending.kind,
                    error = %err,
                    "mutation: save failed"
                );
                let draft = prefilled_draft(pending.target_id.as_ref(), &pending.payload);
                let target_id = pending.target_id.clone();
                let reopened = self.settle_save(
                    ticket,
                    MutationState::Editing(EditSession {
                        target_id: target_id.clone(),
                        draft: draft.clone(),
                        failed: Some(pending.clone()),
                    }),
                );
                if reopened {
                    let _ = self.events.send(ListEvent::EditorOpened { target_id, draft });
                } else {
                    // Another editor is open; its draft stays and this one is handed out.
                    warn!(label = %self.label, "mutation: failed save not reopened, editor busy");
                    let _ = self.events.send(ListEvent::UnsavedDraft { pending });
                }
                self.notify(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Flips the status field through the dedicated endpoint. Nothing local is
    /// touched before the server answers, so a failure needs no rollback.
    pub async fn toggle_status(&self, record: &E, resync: &dyn Resync) -> Result<(), CoreError> {
        let Some(status) = &self.status_field else {
            return Err(CoreError::Refused(format!(
                "{} has no status to toggle",
                self.label
            )));
        };
        let id = record
            .id()
            .cloned()
            .ok_or_else(|| CoreError::NotFound("unsaved record".into()))?;
        let current = draft_from_record(record)?.remove(&status.field);
        let mut payload = Payload::new();
        payload.insert(status.field.clone(), status.flipped(current.as_ref()));

        let _busy = self.loading.begin(format!("Updating {} status...", self.label));
        match self.service.update_status(&id, &payload).await {
            Ok(()) => {
                info!(label = %self.label, %id, "mutation: status toggled");
                let _ = resync.resync().await;
                self.notify(Notice::success("Status updated"));
                Ok(())
            }
            Err(err) => {
                warn!(label = %self.label, %id, error = %err, "mutation: status toggle failed");
                self.notify(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn request_delete(&self, target: RecordId) -> Result<(), CoreError> {
        let mut state = lock(&self.state);
        match &*state {
            MutationState::Idle | MutationState::Saving { .. } => {
                *state = MutationState::DeletePending { target };
                Ok(())
            }
            _ => Err(CoreError::Refused(
                "close the editor before deleting".into(),
            )),
        }
    }

    pub fn cancel_delete(&self) {
        let mut state = lock(&self.state);
        if matches!(&*state, MutationState::DeletePending { .. }) {
            *state = MutationState::Idle;
        }
    }

    pub async fn confirm_delete(&self, resync: &dyn Resync) -> Result<(), CoreError> {
        let target = {
            let mut state = lock(&self.state);
            let MutationState::DeletePending { target } = &*state else {
                return Err(CoreError::Refused("no delete awaits confirmation".into()));
            };
            let target = target.clone();
            *state = MutationState::Deleting {
                target: target.clone(),
            };
            target
        };

        let _busy = self.loading.begin(format!("Removing {}...", self.label));
        let result = self.service.delete(&target).await;
        {
            let mut state = lock(&self.state);
            if matches!(&*state, MutationState::Deleting { target: held } if *held == target) {
                *state = MutationState::Idle;
            }
        }

        match result {
            Ok(()) => {
                info!(label = %self.label, id = %target, "mutation: deleted");
                let _ = resync.resync().await;
                self.notify(Notice::success(format!("{} removed", capitalized(&self.label))));
                Ok(())
            }
            Err(CoreError::DeleteConflict { message, detail }) => {
                warn!(label = %self.label, id = %target, %message, "mutation: delete blocked");
                let _ = self.events.send(ListEvent::DeleteConflict {
                    message: message.clone(),
                    detail: detail.clone(),
                });
                Err(CoreError::DeleteConflict { message, detail })
            }
            Err(err) => {
                warn!(label = %self.label, id = %target, error = %err, "mutation: delete failed");
                let _ = self.events.send(ListEvent::DeleteConflict {
                    message: err.to_string(),
                    detail: None,
                });
                Err(err)
            }
        }
    }

    /// Moves out of `Saving` only if this save still owns the state.
    fn settle_save(&self, ticket: u64, next: MutationState) -> bool {
        let mut state = lock(&self.state);
        match &*state {
            MutationState::Saving { ticket: held, .. } if *held == ticket => {
                *state = next;
                true
            }
            _ => false,
        }
    }

    fn notify(&self, notice: Notice) {
        let _ = self.events.send(ListEvent::Notice(notice));
    }
}

fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "tests/mutation_tests.rs"]
mod tests;
