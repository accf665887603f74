use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::{DbError, Direction, Filter, Query, Result, Store};

#[derive(Default)]
struct Table {
    rows: Vec<Map<String, Value>>,
    next_id: i64,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Table>,
    last_created_at: Option<DateTime<Utc>>,
}

/// Store em memoria, com o mesmo comportamento observavel do supabase:
/// ids sequenciais, `created_at` preenchido pelo banco e unique opcional.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    unique: Vec<(String, String)>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unique(mut self, table: &str, column: &str) -> Self {
        self.unique.push((table.to_string(), column.to_string()));
        self
    }

    /// Faz todas as operacoes seguintes falharem com `DbError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, AtomicOrdering::SeqCst);
    }

    pub async fn len(&self, table: &str) -> usize {
        self.state
            .lock()
            .await
            .tables
            .get(table)
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(AtomicOrdering::SeqCst) {
            return Err(DbError::Unavailable);
        }
        Ok(())
    }

    //created_at estritamente crescente, senao inserts no mesmo instante empatam na ordenacao
    fn next_created_at(state: &mut State) -> DateTime<Utc> {
        let now = Utc::now();
        let created_at = match state.last_created_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        state.last_created_at = Some(created_at);
        created_at
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches(row: &Map<String, Value>, filters: &[Filter]) -> bool {
    filters.iter().all(|f| {
        row.get(&f.column)
            .map(|v| as_text(v) == f.value)
            .unwrap_or(false)
    })
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        //nulls por ultimo, como no postgres em ordem ascendente
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(x), Some(y)) => as_text(x).cmp(&as_text(y)),
    }
}

fn project(row: &Map<String, Value>, columns: &str) -> Value {
    if columns.trim() == "*" {
        return Value::Object(row.clone());
    }
    let projected = columns
        .split(',')
        .map(str::trim)
        .filter_map(|c| row.get(c).map(|v| (c.to_string(), v.clone())))
        .collect();
    Value::Object(projected)
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let Some(table) = state.tables.get(table) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<&Map<String, Value>> = table
            .rows
            .iter()
            .filter(|row| matches(row, &query.filters))
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        Ok(rows.into_iter().map(|row| project(row, &query.columns)).collect())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        self.check_available()?;
        let Value::Object(mut row) = row else {
            return Err(DbError::Status {
                status: 400,
                body: "linha precisa ser um objeto".to_string(),
            });
        };

        let mut state = self.state.lock().await;
        let created_at = Self::next_created_at(&mut *state);
        let entry = state.tables.entry(table.to_string()).or_default();

        for (unique_table, column) in &self.unique {
            if unique_table != table {
                continue;
            }
            if let Some(value) = row.get(column) {
                if entry.rows.iter().any(|r| r.get(column) == Some(value)) {
                    return Err(DbError::Conflict(format!(
                        "{table}.{column} = {} ja existe",
                        as_text(value)
                    )));
                }
            }
        }

        entry.next_id += 1;
        row.insert("id".to_string(), Value::from(entry.next_id));
        row.entry("created_at".to_string()).or_insert_with(|| {
            Value::String(created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        });
        entry.rows.push(row.clone());

        Ok(Value::Object(row))
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let Some(table) = state.tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let (removed, kept): (Vec<_>, Vec<_>) = table
            .rows
            .drain(..)
            .partition(|row| matches(row, filters));
        table.rows = kept;

        Ok(removed.into_iter().map(Value::Object).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_id_and_created_at() {
        let store = MemoryStore::new();
        let a = store.insert("blocos_salvos", json!({"nome": "Reboco"})).await.unwrap();
        let b = store.insert("blocos_salvos", json!({"nome": "Pintura"})).await.unwrap();

        assert_eq!(a["id"], 1);
        assert_eq!(b["id"], 2);
        assert!(a["created_at"].as_str().unwrap() < b["created_at"].as_str().unwrap());
    }

    #[tokio::test]
    async fn test_select_filters_orders_and_projects() {
        let store = MemoryStore::new();
        for nome in ["Pintura", "Azulejo", "Reboco"] {
            store.insert("blocos_salvos", json!({"nome": nome})).await.unwrap();
        }

        let rows = store
            .select("blocos_salvos", &Query::new().order("nome", Direction::Asc))
            .await
            .unwrap();
        let nomes: Vec<&str> = rows.iter().map(|r| r["nome"].as_str().unwrap()).collect();
        assert_eq!(nomes, vec!["Azulejo", "Pintura", "Reboco"]);

        let rows = store
            .select("blocos_salvos", &Query::new().columns("id").eq("nome", "Reboco"))
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({"id": 3})]);

        let rows = store
            .select("blocos_salvos", &Query::new().eq("id", 2))
            .await
            .unwrap();
        assert_eq!(rows[0]["nome"], "Azulejo");
    }

    #[tokio::test]
    async fn test_delete_returns_removed_rows() {
        let store = MemoryStore::new();
        store.insert("orcamentos", json!({"numero": "A"})).await.unwrap();

        let removed = store.delete("orcamentos", &[Filter::eq("id", 99)]).await.unwrap();
        assert!(removed.is_empty());
        assert_eq!(store.len("orcamentos").await, 1);

        let removed = store.delete("orcamentos", &[Filter::eq("id", 1)]).await.unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(store.len("orcamentos").await, 0);
    }

    #[tokio::test]
    async fn test_unique_and_failing() {
        let store = MemoryStore::new().with_unique("orcamentos", "numero");
        store.insert("orcamentos", json!({"numero": "A"})).await.unwrap();
        let err = store.insert("orcamentos", json!({"numero": "A"})).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        store.set_failing(true);
        let err = store.select("orcamentos", &Query::new()).await.unwrap_err();
        assert!(matches!(err, DbError::Unavailable));
    }
}
