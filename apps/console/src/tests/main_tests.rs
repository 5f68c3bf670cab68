use super::*;
use client_core::{MutationKind, Notice, Payload, PendingMutation};
use serde_json::json;

fn draft() -> Payload {
    let mut draft = Payload::new();
    draft.insert("nome".into(), json!("Ana"));
    draft
}

fn opened() -> ListEvent {
    ListEvent::EditorOpened {
        target_id: Some(RecordId::Number(1)),
        draft: draft(),
    }
}

#[test]
fn opening_an_editor_prints_nothing() {
    let mut lines = EventLines::default();

    assert_eq!(lines.describe(opened()), None);
}

#[test]
fn editor_opened_after_a_close_is_a_reopen() {
    let mut lines = EventLines::default();

    assert_eq!(lines.describe(opened()), None);
    assert_eq!(lines.describe(ListEvent::EditorClosed), None);
    assert_eq!(
        lines.describe(opened()),
        Some(Line::Err(r#"editor reopened with {"nome":"Ana"}"#.into()))
    );
    assert_eq!(lines.describe(opened()), None);
}

#[test]
fn notices_go_to_the_matching_stream() {
    let mut lines = EventLines::default();

    assert_eq!(
        lines.describe(ListEvent::Notice(Notice::success("Employee updated"))),
        Some(Line::Out("ok: Employee updated".into()))
    );
    assert_eq!(
        lines.describe(ListEvent::Notice(Notice::error("offline"))),
        Some(Line::Err("error: offline".into()))
    );
}

#[test]
fn delete_conflict_detail_is_shown_when_present() {
    let mut lines = EventLines::default();

    assert_eq!(
        lines.describe(ListEvent::DeleteConflict {
            message: "in use".into(),
            detail: Some("2 harvests".into()),
        }),
        Some(Line::Err("cannot delete: in use (2 harvests)".into()))
    );
}

#[test]
fn unsaved_draft_names_its_record() {
    let mut lines = EventLines::default();

    let line = lines.describe(ListEvent::UnsavedDraft {
        pending: PendingMutation {
            kind: MutationKind::Update,
            target_id: Some(RecordId::Number(7)),
            payload: draft(),
        },
    });

    assert_eq!(
        line,
        Some(Line::Err(r#"unsaved changes for 7: {"nome":"Ana"}"#.into()))
    );
}
