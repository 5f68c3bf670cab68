//! Per-kind behaviour for the five record screens.

use serde_json::{json, Value};
use shared::protocol::{APPROVERS, CATEGORIES, CROPS, CUSTOMERS, EMPLOYEES, FRUITS, SUPPLIERS};

use crate::{
    data_source::SyncMode,
    filter::FilterDimension,
    normalize::{Payload, PayloadPolicy},
};

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Binary field flipped by the status toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusField {
    pub field: String,
    pub on: Value,
    pub off: Value,
}

impl StatusField {
    pub fn active_inactive() -> Self {
        Self {
            field: "status".into(),
            on: json!("ativo"),
            off: json!("inativo"),
        }
    }

    pub fn flipped(&self, current: Option<&Value>) -> Value {
        if current == Some(&self.on) {
            self.off.clone()
        } else {
            self.on.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityKindConfig {
    pub collection: String,
    /// Singular noun used in status messages, e.g. `employee`.
    pub label: String,
    pub mode: SyncMode,
    pub page_size: usize,
    pub dimensions: Vec<FilterDimension>,
    pub policy: PayloadPolicy,
    pub required_fields: Vec<String>,
    /// Draft the editor starts from on create.
    pub template: Payload,
    pub status_field: Option<StatusField>,
    pub reference_collections: Vec<String>,
    pub can_create: bool,
}

impl EntityKindConfig {
    pub fn new(collection: &str, label: &str, mode: SyncMode) -> Self {
        Self {
            collection: collection.into(),
            label: label.into(),
            mode,
            page_size: DEFAULT_PAGE_SIZE,
            dimensions: Vec::new(),
            policy: PayloadPolicy::default(),
            required_fields: Vec::new(),
            template: Payload::new(),
            status_field: None,
            reference_collections: Vec::new(),
            can_create: true,
        }
    }

    pub fn employees() -> Self {
        let mut config = Self::new(EMPLOYEES, "employee", SyncMode::FullFetch);
        config.dimensions = vec![
            FilterDimension::text("search", &["nome", "apelido", "cargo"], &["cpf"]),
            FilterDimension::categorical("status", "status"),
        ];
        config.policy = PayloadPolicy::clearable(&["chavePix", "aprovadorId"]);
        config.required_fields = fields(&["nome", "cpf"]);
        config.template = active_template();
        config.status_field = Some(StatusField::active_inactive());
        config.reference_collections = vec![APPROVERS.into()];
        config
    }

    pub fn customers() -> Self {
        let mut config = Self::new(CUSTOMERS, "customer", SyncMode::ServerPaginated);
        config.dimensions = vec![
            FilterDimension::text("search", &["nome", "nomeFantasia"], &["cpfCnpj"]),
            FilterDimension::categorical("status", "status"),
        ];
        config.policy = PayloadPolicy::clearable(&["chavePix", "email", "telefone"]);
        config.required_fields = fields(&["nome", "cpfCnpj"]);
        config.template = active_template();
        config.status_field = Some(StatusField::active_inactive());
        config
    }

    pub fn suppliers() -> Self {
        let mut config = Self::new(SUPPLIERS, "supplier", SyncMode::FullFetch);
        config.dimensions = vec![
            FilterDimension::text("search", &["nome", "nomeFantasia"], &["cnpj"]),
            FilterDimension::categorical("status", "status"),
            FilterDimension::categorical("categoriaId", "categoriaId"),
        ];
        config.policy = PayloadPolicy::clearable(&["chavePix", "categoriaId"]);
        config.required_fields = fields(&["nome", "cnpj"]);
        config.template = active_template();
        config.status_field = Some(StatusField::active_inactive());
        config.reference_collections = vec![CATEGORIES.into()];
        config
    }

    pub fn crops() -> Self {
        let mut config = Self::new(CROPS, "crop", SyncMode::FullFetch);
        config.dimensions = vec![
            FilterDimension::text("search", &["nome"], &[]),
            FilterDimension::categorical("status", "status"),
            FilterDimension::categorical("tipo", "tipo"),
        ];
        config.required_fields = fields(&["nome", "tipo"]);
        config.template = active_template();
        config.status_field = Some(StatusField::active_inactive());
        config
    }

    pub fn fruits() -> Self {
        let mut config = Self::new(FRUITS, "fruit", SyncMode::FullFetch);
        config.dimensions = vec![
            FilterDimension::text("search", &["nome", "nomeCientifico", "variedade"], &[]),
            FilterDimension::categorical("status", "status"),
            FilterDimension::categorical("tipo", "tipo"),
        ];
        config.policy = PayloadPolicy::clearable(&["categoriaId"]);
        config.required_fields = fields(&["nome", "tipo"]);
        config.template = active_template();
        config.status_field = Some(StatusField::active_inactive());
        config.reference_collections = vec![CATEGORIES.into()];
        config
    }

    pub fn with_can_create(mut self, can_create: bool) -> Self {
        self.can_create = can_create;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }
}

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn active_template() -> Payload {
    let mut template = Payload::new();
    template.insert("status".into(), json!("ativo"));
    template
}
