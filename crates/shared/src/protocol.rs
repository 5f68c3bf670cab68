use serde::{Deserialize, Serialize};

pub const EMPLOYEES: &str = "funcionarios";
pub const CUSTOMERS: &str = "clientes";
pub const SUPPLIERS: &str = "fornecedores";
pub const CROPS: &str = "culturas";
pub const FRUITS: &str = "frutas";
pub const CATEGORIES: &str = "categorias";
pub const APPROVERS: &str = "aprovadores";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
}

/// `GET /{collection}` answers with either shape depending on the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Envelope(ListEnvelope<T>),
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    pub fn into_parts(self) -> (Vec<T>, Option<u64>, Option<u64>) {
        match self {
            Self::Envelope(envelope) => (envelope.data, envelope.total, envelope.page),
            Self::Bare(data) => (data, None, None),
        }
    }
}

/// Failure body shared by create, update and status calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

/// Query string of `GET /{collection}` as the service reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default, rename = "categoriaId")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}
