use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordStatus {
    #[default]
    #[serde(rename = "ativo")]
    Active,
    #[serde(rename = "inativo")]
    Inactive,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ativo",
            Self::Inactive => "inativo",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "apelido", default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub cpf: String,
    #[serde(rename = "cargo", default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(rename = "chavePix", default, skip_serializing_if = "Option::is_none")]
    pub pix_key: Option<String>,
    #[serde(rename = "aprovadorId", default, skip_serializing_if = "Option::is_none")]
    pub approver_id: Option<RecordId>,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "criadoEm", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "nomeFantasia", default, skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,
    #[serde(rename = "cpfCnpj")]
    pub document: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "telefone", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(rename = "chavePix", default, skip_serializing_if = "Option::is_none")]
    pub pix_key: Option<String>,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "criadoEm", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "nomeFantasia", default, skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,
    pub cnpj: String,
    #[serde(rename = "categoriaId", default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<RecordId>,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(rename = "chavePix", default, skip_serializing_if = "Option::is_none")]
    pub pix_key: Option<String>,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "criadoEm", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "nome")]
    pub name: String,
    /// Crop cycle, e.g. `anual` or `perene`.
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "criadoEm", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fruit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "nomeCientifico", default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    #[serde(rename = "variedade", default, skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>,
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "categoriaId", default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<RecordId>,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(rename = "criadoEm", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn text(value: &str) -> Option<Cow<'_, str>> {
    Some(Cow::Borrowed(value))
}

fn optional(value: &Option<String>) -> Option<Cow<'_, str>> {
    value.as_deref().map(Cow::Borrowed)
}

fn id_text(value: &Option<RecordId>) -> Option<Cow<'_, str>> {
    value.as_ref().map(|id| Cow::Owned(id.to_string()))
}

impl Record for Employee {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "nome" => text(&self.name),
            "apelido" => optional(&self.nickname),
            "cpf" => text(&self.cpf),
            "cargo" => optional(&self.position),
            "status" => text(self.status.as_str()),
            "chavePix" => optional(&self.pix_key),
            "aprovadorId" => id_text(&self.approver_id),
            "observacoes" => optional(&self.notes),
            _ => None,
        }
    }
}

impl Record for Customer {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "nome" => text(&self.name),
            "nomeFantasia" => optional(&self.trade_name),
            "cpfCnpj" => text(&self.document),
            "email" => optional(&self.email),
            "telefone" => optional(&self.phone),
            "status" => text(self.status.as_str()),
            "chavePix" => optional(&self.pix_key),
            "observacoes" => optional(&self.notes),
            _ => None,
        }
    }
}

impl Record for Supplier {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "nome" => text(&self.name),
            "nomeFantasia" => optional(&self.trade_name),
            "cnpj" => text(&self.cnpj),
            "categoriaId" => id_text(&self.category_id),
            "status" => text(self.status.as_str()),
            "chavePix" => optional(&self.pix_key),
            "observacoes" => optional(&self.notes),
            _ => None,
        }
    }
}

impl Record for Crop {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "nome" => text(&self.name),
            "tipo" => text(&self.kind),
            "status" => text(self.status.as_str()),
            "observacoes" => optional(&self.notes),
            _ => None,
        }
    }
}

impl Record for Fruit {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "nome" => text(&self.name),
            "nomeCientifico" => optional(&self.scientific_name),
            "variedade" => optional(&self.variety),
            "tipo" => text(&self.kind),
            "categoriaId" => id_text(&self.category_id),
            "status" => text(self.status.as_str()),
            _ => None,
        }
    }
}
