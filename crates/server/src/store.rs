//! In-memory record collections behind the development service.
//!
//! Rows are kept as raw JSON objects keyed by numeric id, so every entity kind
//! shares one code path; per-collection rules decide what is searchable, what
//! is required and which field must be unique.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::{json, Map, Value};
use shared::{
    error::{ApiException, ErrorCode},
    protocol::{
        ListEnvelope, ListQuery, ListResponse, APPROVERS, CATEGORIES, CROPS, CUSTOMERS,
        EMPLOYEES, FRUITS, SUPPLIERS,
    },
};
use tracing::{debug, info};

pub type Row = Map<String, Value>;

const DEFAULT_LIMIT: u64 = 20;
const ACTIVE: &str = "ativo";
const INACTIVE: &str = "inativo";
const CREATED_AT: &str = "criadoEm";

#[derive(Debug, Clone, Copy)]
struct UniqueField {
    field: &'static str,
    duplicate_message: &'static str,
}

#[derive(Debug, Clone, Copy)]
struct Rules {
    searchable: &'static [&'static str],
    unique: Option<UniqueField>,
    required: &'static [&'static str],
}

fn rules_for(collection: &str) -> Option<Rules> {
    let rules = match collection {
        EMPLOYEES => Rules {
            searchable: &["nome", "apelido", "cargo"],
            unique: Some(UniqueField {
                field: "cpf",
                duplicate_message: "CPF duplicado",
            }),
            required: &["nome", "cpf"],
        },
        CUSTOMERS => Rules {
            searchable: &["nome", "nomeFantasia", "email"],
            unique: Some(UniqueField {
                field: "cpfCnpj",
                duplicate_message: "CPF/CNPJ duplicado",
            }),
            required: &["nome", "cpfCnpj"],
        },
        SUPPLIERS => Rules {
            searchable: &["nome", "nomeFantasia"],
            unique: Some(UniqueField {
                field: "cnpj",
                duplicate_message: "CNPJ duplicado",
            }),
            required: &["nome", "cnpj"],
        },
        CROPS => Rules {
            searchable: &["nome"],
            unique: None,
            required: &["nome", "tipo"],
        },
        FRUITS => Rules {
            searchable: &["nome", "nomeCientifico", "variedade"],
            unique: None,
            required: &["nome", "tipo"],
        },
        CATEGORIES | APPROVERS => Rules {
            searchable: &["nome"],
            unique: None,
            required: &["nome"],
        },
        _ => return None,
    };
    Some(rules)
}

struct Collection {
    rules: Rules,
    rows: BTreeMap<i64, Row>,
    next_id: i64,
}

impl Collection {
    fn new(rules: Rules) -> Self {
        Self {
            rules,
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn row_mut(&mut self, id: i64) -> Result<&mut Row, ApiException> {
        self.rows
            .get_mut(&id)
            .ok_or_else(|| ApiException::new(ErrorCode::NotFound, "Registro não encontrado"))
    }

    fn check_required(&self, row: &Row) -> Result<(), ApiException> {
        let missing: Vec<&str> = self
            .rules
            .required
            .iter()
            .copied()
            .filter(|field| field_text(row, field).map_or(true, |v| v.trim().is_empty()))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiException::new(
                ErrorCode::Validation,
                format!("Campos obrigatórios: {}", missing.join(", ")),
            ))
        }
    }

    fn check_unique(&self, row: &Row, own_id: Option<i64>) -> Result<(), ApiException> {
        let Some(unique) = self.rules.unique else {
            return Ok(());
        };
        let Some(value) = field_text(row, unique.field).map(|v| digits_only(&v)) else {
            return Ok(());
        };
        if value.is_empty() {
            return Ok(());
        }
        let taken = self.rows.iter().any(|(id, other)| {
            Some(*id) != own_id
                && field_text(other, unique.field).is_some_and(|v| digits_only(&v) == value)
        });
        if taken {
            Err(ApiException::new(ErrorCode::Conflict, unique.duplicate_message))
        } else {
            Ok(())
        }
    }

    fn matches(&self, row: &Row, query: &ListQuery) -> bool {
        let equals = |field: &str, wanted: &Option<String>| {
            match wanted.as_deref().map(str::trim) {
                None | Some("") => true,
                Some(wanted) => field_text(row, field).as_deref() == Some(wanted),
            }
        };
        if !equals("status", &query.status)
            || !equals("tipo", &query.tipo)
            || !equals("categoriaId", &query.category_id)
        {
            return false;
        }

        let Some(term) = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            return true;
        };
        let term_lower = term.to_lowercase();
        let textual = self.rules.searchable.iter().any(|field| {
            field_text(row, field).is_some_and(|v| v.to_lowercase().contains(&term_lower))
        });
        if textual {
            return true;
        }
        match self.rules.unique {
            Some(unique) if looks_like_identifier(term) => {
                let term_digits = digits_only(term);
                field_text(row, unique.field)
                    .is_some_and(|v| digits_only(&v).contains(&term_digits))
            }
            _ => false,
        }
    }
}

pub struct Store {
    collections: BTreeMap<&'static str, Collection>,
    /// Active plantings per crop id; a crop with any cannot be deleted.
    plantings: BTreeMap<i64, u32>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        let collections = [
            EMPLOYEES, CUSTOMERS, SUPPLIERS, CROPS, FRUITS, CATEGORIES, APPROVERS,
        ]
        .into_iter()
        .filter_map(|name| rules_for(name).map(|rules| (name, Collection::new(rules))))
        .collect();
        Self {
            collections,
            plantings: BTreeMap::new(),
        }
    }

    /// A store with a few records in every collection.
    pub fn seeded() -> Self {
        let mut store = Self::new();
        let seed: [(&str, Value); 12] = [
            (CATEGORIES, json!({ "nome": "Insumos" })),
            (CATEGORIES, json!({ "nome": "Frutas tropicais" })),
            (APPROVERS, json!({ "nome": "Carla Mendes" })),
            (
                EMPLOYEES,
                json!({
                    "nome": "Ana Souza",
                    "apelido": "Aninha",
                    "cpf": "123.456.789-00",
                    "cargo": "Colheita",
                    "aprovadorId": 1,
                }),
            ),
            (
                EMPLOYEES,
                json!({
                    "nome": "Bruno Lima",
                    "cpf": "987.654.321-00",
                    "cargo": "Tratorista",
                    "status": INACTIVE,
                }),
            ),
            (
                CUSTOMERS,
                json!({
                    "nome": "Mercado Central",
                    "nomeFantasia": "Central",
                    "cpfCnpj": "12.345.678/0001-90",
                    "email": "compras@central.com",
                }),
            ),
            (
                SUPPLIERS,
                json!({
                    "nome": "Agro Insumos Ltda",
                    "nomeFantasia": "AgroIn",
                    "cnpj": "11.222.333/0001-44",
                    "categoriaId": 1,
                }),
            ),
            (CROPS, json!({ "nome": "Soja", "tipo": "graos" })),
            (CROPS, json!({ "nome": "Milho", "tipo": "graos" })),
            (
                FRUITS,
                json!({
                    "nome": "Manga",
                    "nomeCientifico": "Mangifera indica",
                    "variedade": "Palmer",
                    "tipo": "tropical",
                    "categoriaId": 2,
                }),
            ),
            (
                FRUITS,
                json!({
                    "nome": "Maçã",
                    "nomeCientifico": "Malus domestica",
                    "variedade": "Gala",
                    "tipo": "temperada",
                }),
            ),
            (
                CUSTOMERS,
                json!({
                    "nome": "João Pereira",
                    "cpfCnpj": "321.654.987-11",
                    "telefone": "(11) 99999-0000",
                }),
            ),
        ];
        for (collection, value) in seed {
            if let Value::Object(row) = value {
                if let Err(err) = store.create(collection, row) {
                    debug!(collection, error = %err, "store: skipped seed row");
                }
            }
        }
        store.set_plantings(1, 3);
        store
    }

    pub fn set_plantings(&mut self, crop_id: i64, active: u32) {
        if active == 0 {
            self.plantings.remove(&crop_id);
        } else {
            self.plantings.insert(crop_id, active);
        }
    }

    fn collection(&self, name: &str) -> Result<&Collection, ApiException> {
        self.collections.get(name).ok_or_else(|| unknown(name))
    }

    fn collection_mut(&mut self, name: &str) -> Result<&mut Collection, ApiException> {
        self.collections.get_mut(name).ok_or_else(|| unknown(name))
    }

    /// Bare array unless the query asks for a page, then a `{ data, total, page }` envelope.
    pub fn list(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Result<ListResponse<Row>, ApiException> {
        let store = self.collection(collection)?;
        let matching: Vec<Row> = store
            .rows
            .values()
            .filter(|row| store.matches(row, query))
            .cloned()
            .collect();

        let Some(page) = query.page else {
            return Ok(ListResponse::Bare(matching));
        };
        let page = page.max(1);
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).max(1);
        let total = matching.len() as u64;
        let skip = usize::try_from((page - 1).saturating_mul(limit)).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let data = matching.into_iter().skip(skip).take(take).collect();
        Ok(ListResponse::Envelope(ListEnvelope {
            data,
            total: Some(total),
            page: Some(page),
        }))
    }

    pub fn create(&mut self, collection: &str, mut row: Row) -> Result<Row, ApiException> {
        let store = self.collection_mut(collection)?;
        row.remove("id");
        row.remove(CREATED_AT);
        store.check_required(&row)?;
        store.check_unique(&row, None)?;
        if !matches!(row.get("status"), Some(Value::String(_))) {
            row.insert("status".into(), json!(ACTIVE));
        }

        let id = store.next_id;
        store.next_id += 1;
        row.insert("id".into(), json!(id));
        row.insert(CREATED_AT.into(), json!(Utc::now().to_rfc3339()));
        store.rows.insert(id, row.clone());
        info!(collection, id, "store: created");
        Ok(row)
    }

    /// Partial update: fields present in `patch` replace the stored ones, an
    /// explicit null clears the field.
    pub fn update(&mut self, collection: &str, id: i64, patch: Row) -> Result<Row, ApiException> {
        let store = self.collection_mut(collection)?;
        let mut merged = store.row_mut(id)?.clone();
        for (field, value) in patch {
            if field == "id" || field == CREATED_AT {
                continue;
            }
            merged.insert(field, value);
        }
        store.check_required(&merged)?;
        store.check_unique(&merged, Some(id))?;
        *store.row_mut(id)? = merged.clone();
        info!(collection, id, "store: updated");
        Ok(merged)
    }

    /// Sets `status` from the body, or flips it when the body carries none.
    pub fn update_status(
        &mut self,
        collection: &str,
        id: i64,
        body: &Row,
    ) -> Result<Row, ApiException> {
        let store = self.collection_mut(collection)?;
        let row = store.row_mut(id)?;
        let next = match body.get("status") {
            Some(Value::String(status)) if status == ACTIVE || status == INACTIVE => status.clone(),
            Some(other) => {
                return Err(ApiException::new(
                    ErrorCode::Validation,
                    format!("Status inválido: {other}"),
                ))
            }
            None if row.get("status") == Some(&json!(ACTIVE)) => INACTIVE.to_string(),
            None => ACTIVE.to_string(),
        };
        row.insert("status".into(), Value::String(next.clone()));
        info!(collection, id, status = %next, "store: status changed");
        Ok(row.clone())
    }

    pub fn delete(&mut self, collection: &str, id: i64) -> Result<(), ApiException> {
        if collection == CROPS {
            if let Some(active) = self.plantings.get(&id).copied().filter(|n| *n > 0) {
                return Err(ApiException::conflict(
                    "Cultura vinculada",
                    Some(format!("{active} plantios ativos")),
                ));
            }
        }
        let store = self.collection_mut(collection)?;
        store
            .rows
            .remove(&id)
            .ok_or_else(|| ApiException::new(ErrorCode::NotFound, "Registro não encontrado"))?;
        info!(collection, id, "store: deleted");
        Ok(())
    }
}

fn unknown(collection: &str) -> ApiException {
    ApiException::new(
        ErrorCode::NotFound,
        format!("Coleção desconhecida: {collection}"),
    )
}

/// Strings as-is, numbers rendered; anything else counts as absent.
fn field_text(row: &Row, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn looks_like_identifier(term: &str) -> bool {
    term.chars().any(|c| c.is_ascii_digit())
        && term
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '/' | ' '))
}

fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
