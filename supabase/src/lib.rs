//! Cliente minimo para as tabelas do Supabase.
//!
//! So expoe o que o app usa: select com filtros de igualdade e ordenacao,
//! insert e delete. O backend real fala com a api REST (PostgREST) e o
//! `MemoryStore` guarda tudo em memoria para os testes.

pub mod memory;
pub mod rest;
pub mod timestamp;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub use memory::MemoryStore;
pub use rest::SupabaseStore;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("falha de comunicacao com o banco: {0}")]
    Http(#[from] reqwest::Error),
    #[error("banco respondeu com status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("registro duplicado: {0}")]
    Conflict(String),
    #[error("resposta invalida do banco: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("url do banco invalida: {0}")]
    InvalidUrl(String),
    #[error("banco indisponivel")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Filtro de igualdade `coluna = valor`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            direction,
        });
        self
    }
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>>;

    /// Insere uma linha e devolve o registro como o banco gravou (id, created_at).
    async fn insert(&self, table: &str, row: Value) -> Result<Value>;

    /// Remove as linhas que batem com todos os filtros e devolve as removidas.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>>;
}

pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(DbError::from))
        .collect()
}

pub fn decode_row<T: DeserializeOwned>(row: Value) -> Result<T> {
    Ok(serde_json::from_value(row)?)
}

/// Como `decode_rows`, mas pula (com warn) as linhas que nao decodificam,
/// assim uma linha ruim nao derruba a listagem inteira.
pub fn decode_valid_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.get("id").cloned().unwrap_or(Value::Null);
            match serde_json::from_value(row) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!("linha {id} de {table} ignorada: {e}");
                    None
                }
            }
        })
        .collect()
}

pub fn row_id(row: &Value) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}
