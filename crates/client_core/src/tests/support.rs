//! In-memory `CollectionService` and fixtures shared by the unit tests.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::{
    domain::{Employee, RecordStatus},
    record::{Record, RecordId},
};
use tokio::sync::{broadcast, Notify};

use crate::{
    error::CoreError,
    events::ListEvent,
    lock,
    mutation::Resync,
    normalize::{draft_from_record, Payload},
    paginator,
    service::{CollectionService, ListPage, PageQuery},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(Option<PageQuery>),
    Reference(String),
    Create(Payload),
    Update(RecordId, Payload),
    Status(RecordId, Payload),
    Delete(RecordId),
}

pub struct FakeService<E> {
    pub rows: Mutex<Vec<E>>,
    pub references: BTreeMap<String, Vec<Value>>,
    pub calls: Mutex<Vec<Call>>,
    /// Returned by the next create/update/status/delete instead of succeeding.
    pub fail_next: Mutex<Option<CoreError>>,
    /// Returned by every list call while set.
    pub fail_list: Mutex<Option<CoreError>>,
    /// Held by the next create/update until notified.
    pub mutation_gate: Mutex<Option<Arc<Notify>>>,
    /// Held by the next list call until notified.
    pub list_gate: Mutex<Option<Arc<Notify>>>,
    next_id: AtomicI64,
}

impl<E: Record> FakeService<E> {
    pub fn new(rows: Vec<E>) -> Arc<Self> {
        Self::with_references(rows, BTreeMap::new())
    }

    pub fn with_references(rows: Vec<E>, references: BTreeMap<String, Vec<Value>>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            references,
            calls: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            fail_list: Mutex::new(None),
            mutation_gate: Mutex::new(None),
            list_gate: Mutex::new(None),
            next_id: AtomicI64::new(1000),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::List(_)))
            .count()
    }

    pub fn fail_next_with(&self, err: CoreError) {
        *lock(&self.fail_next) = Some(err);
    }

    pub fn gate_next_mutation(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.mutation_gate) = Some(Arc::clone(&gate));
        gate
    }

    pub fn gate_next_list(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.list_gate) = Some(Arc::clone(&gate));
        gate
    }

    pub fn set_rows(&self, rows: Vec<E>) {
        *lock(&self.rows) = rows;
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }

    fn take_failure(&self) -> Result<(), CoreError> {
        match lock(&self.fail_next).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn pass_gate(slot: &Mutex<Option<Arc<Notify>>>) {
        let gate = lock(slot).take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn merged(&self, id: &RecordId, payload: &Payload) -> Result<(), CoreError> {
        let mut rows = lock(&self.rows);
        let Some(row) = rows.iter_mut().find(|row| row.id() == Some(id)) else {
            return Err(CoreError::Rejected {
                status: 404,
                message: "not found".into(),
            });
        };
        let mut draft = draft_from_record(row)?;
        for (field, value) in payload {
            draft.insert(field.clone(), value.clone());
        }
        *row = serde_json::from_value(Value::Object(draft))
            .map_err(|err| CoreError::Rejected {
                status: 400,
                message: err.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl<E: Record> CollectionService<E> for FakeService<E> {
    async fn list(&self, query: Option<&PageQuery>) -> Result<ListPage<E>, CoreError> {
        self.record(Call::List(query.cloned()));
        Self::pass_gate(&self.list_gate).await;
        if let Some(err) = lock(&self.fail_list).clone() {
            return Err(err);
        }
        let rows = lock(&self.rows).clone();
        match query {
            None => Ok(ListPage {
                items: rows,
                total: None,
                page: None,
            }),
            Some(query) => Ok(ListPage {
                items: paginator::slice(&rows, query.page, query.limit).to_vec(),
                total: Some(rows.len()),
                page: Some(query.page),
            }),
        }
    }

    async fn list_reference(&self, name: &str) -> Result<Vec<Value>, CoreError> {
        self.record(Call::Reference(name.to_string()));
        Ok(self.references.get(name).cloned().unwrap_or_default())
    }

    async fn create(&self, payload: &Payload) -> Result<(), CoreError> {
        self.record(Call::Create(payload.clone()));
        Self::pass_gate(&self.mutation_gate).await;
        self.take_failure()?;
        let mut draft = payload.clone();
        draft.insert(
            "id".into(),
            json!(self.next_id.fetch_add(1, Ordering::Relaxed)),
        );
        let row: E = serde_json::from_value(Value::Object(draft)).map_err(|err| {
            CoreError::Rejected {
                status: 400,
                message: err.to_string(),
            }
        })?;
        lock(&self.rows).push(row);
        Ok(())
    }

    async fn update(&self, id: &RecordId, payload: &Payload) -> Result<(), CoreError> {
        self.record(Call::Update(id.clone(), payload.clone()));
        Self::pass_gate(&self.mutation_gate).await;
        self.take_failure()?;
        self.merged(id, payload)
    }

    async fn update_status(&self, id: &RecordId, payload: &Payload) -> Result<(), CoreError> {
        self.record(Call::Status(id.clone(), payload.clone()));
        self.take_failure()?;
        self.merged(id, payload)
    }

    async fn delete(&self, id: &RecordId) -> Result<(), CoreError> {
        self.record(Call::Delete(id.clone()));
        self.take_failure()?;
        lock(&self.rows).retain(|row| row.id() != Some(id));
        Ok(())
    }
}

/// Counts resync requests without touching any mirror.
#[derive(Default)]
pub struct CountingResync {
    pub calls: Mutex<usize>,
}

impl CountingResync {
    pub fn count(&self) -> usize {
        *lock(&self.calls)
    }
}

#[async_trait]
impl Resync for CountingResync {
    async fn resync(&self) -> Result<(), CoreError> {
        *lock(&self.calls) += 1;
        Ok(())
    }
}

pub fn employee(id: i64, name: &str, cpf: &str) -> Employee {
    Employee {
        id: Some(RecordId::Number(id)),
        name: name.to_string(),
        nickname: None,
        cpf: cpf.to_string(),
        position: None,
        status: RecordStatus::Active,
        pix_key: None,
        approver_id: None,
        notes: None,
        created_at: None,
    }
}

pub fn employees(count: usize) -> Vec<Employee> {
    (1..=count as i64)
        .map(|n| employee(n, &format!("Employee {n:02}"), &format!("000.000.000-{n:02}")))
        .collect()
}

pub fn drain(rx: &mut broadcast::Receiver<ListEvent>) -> Vec<ListEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Yields to the scheduler until `ready` holds or the attempts run out.
pub async fn settle(mut ready: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if ready() {
            return true;
        }
        tokio::task::yield_now().await;
    }
    ready()
}
