use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::Value;
use tracing::{debug, error};

use crate::{DbError, Filter, Query, Result, Store};

const REST_PATH: &str = "rest/v1";

//Fala com a api REST do supabase(PostgREST)
//Cada tabela vira /rest/v1/<tabela>, filtros vao na query string como col=eq.valor
pub struct SupabaseStore {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(url: &str, api_key: &str) -> Result<Self> {
        Self::with_client(Client::new(), url, api_key)
    }

    pub fn with_client(client: Client, url: &str, api_key: &str) -> Result<Self> {
        let mut base_url = Url::parse(url).map_err(|e| {
            error!("SUPABASE_URL invalida {url}: {:?}", e);
            DbError::InvalidUrl(url.to_string())
        })?;
        if base_url.cannot_be_a_base() {
            return Err(DbError::InvalidUrl(url.to_string()));
        }
        //sem a barra final o join substituiria o ultimo segmento
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    pub fn table_url(&self, table: &str) -> Result<Url> {
        self.base_url
            .join(&format!("{REST_PATH}/{table}"))
            .map_err(|_| DbError::InvalidUrl(format!("{}{REST_PATH}/{table}", self.base_url)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("accept", "application/json")
    }

    async fn read_rows(response: Response) -> Result<Vec<Value>> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Supabase respondeu {status}: {body}");
            if status.as_u16() == 409 {
                return Err(DbError::Conflict(body));
            }
            return Err(DbError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<Value>(&body)? {
            Value::Array(rows) => Ok(rows),
            row => Ok(vec![row]),
        }
    }
}

pub fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), format!("eq.{}", f.value)))
        .collect()
}

pub fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.columns.clone())];
    params.extend(filter_params(&query.filters));
    if let Some(order) = &query.order {
        params.push((
            "order".to_string(),
            format!("{}.{}", order.column, order.direction.as_str()),
        ));
    }
    params
}

#[async_trait]
impl Store for SupabaseStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        let url = self.table_url(table)?;
        debug!("select em {table}: {:?}", query);

        let response = self
            .authorized(self.client.get(url))
            .query(&query_params(query))
            .send()
            .await?;

        Self::read_rows(response).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        let url = self.table_url(table)?;
        debug!("insert em {table}");

        let response = self
            .authorized(self.client.post(url))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        let mut rows = Self::read_rows(response).await?;
        if rows.is_empty() {
            return Err(DbError::Status {
                status: 200,
                body: format!("insert em {table} nao devolveu o registro"),
            });
        }
        Ok(rows.swap_remove(0))
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>> {
        let url = self.table_url(table)?;
        debug!("delete em {table}: {:?}", filters);

        let response = self
            .authorized(self.client.delete(url))
            .header("Prefer", "return=representation")
            .query(&filter_params(filters))
            .send()
            .await?;

        Self::read_rows(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;

    #[test]
    fn test_table_url() {
        let store = SupabaseStore::new("https://abc.supabase.co", "chave").unwrap();
        assert_eq!(
            store.table_url("orcamentos").unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/orcamentos"
        );

        let store = SupabaseStore::new("https://proxy.local/supabase", "chave").unwrap();
        assert_eq!(
            store.table_url("blocos_salvos").unwrap().as_str(),
            "https://proxy.local/supabase/rest/v1/blocos_salvos"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            SupabaseStore::new("nao e url", "chave"),
            Err(DbError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_query_params() {
        let query = Query::new()
            .columns("id")
            .eq("numero", "MARIA-SILVA-05032024-1407")
            .order("created_at", Direction::Desc);

        assert_eq!(
            query_params(&query),
            vec![
                ("select".to_string(), "id".to_string()),
                ("numero".to_string(), "eq.MARIA-SILVA-05032024-1407".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    mod http {
        use std::sync::{Arc, Mutex};

        use axum::extract::{RawQuery, State};
        use axum::http::{HeaderMap, StatusCode};
        use axum::routing::{get, post};
        use axum::{Json, Router};
        use serde_json::{json, Value};

        use crate::{DbError, Direction, Filter, Query, Store, SupabaseStore};

        //query strings que chegaram no servidor falso
        type Recebidas = Arc<Mutex<Vec<String>>>;

        fn header<'a>(headers: &'a HeaderMap, nome: &str) -> Option<&'a str> {
            headers.get(nome).and_then(|v| v.to_str().ok())
        }

        fn autorizado(headers: &HeaderMap) -> bool {
            header(headers, "apikey") == Some("chave")
                && header(headers, "authorization") == Some("Bearer chave")
        }

        fn com_representacao(headers: &HeaderMap) -> bool {
            header(headers, "prefer") == Some("return=representation")
        }

        async fn select_blocos(
            State(recebidas): State<Recebidas>,
            headers: HeaderMap,
            RawQuery(query): RawQuery,
        ) -> (StatusCode, String) {
            if !autorizado(&headers) {
                return (StatusCode::UNAUTHORIZED, "sem chave".to_string());
            }
            recebidas.lock().unwrap().push(query.unwrap_or_default());
            (StatusCode::OK, r#"[{"id": 1, "nome": "Reboco"}]"#.to_string())
        }

        //devolve um objeto, nao uma lista
        async fn insert_orcamento(headers: HeaderMap, Json(mut row): Json<Value>) -> (StatusCode, String) {
            if !autorizado(&headers) || !com_representacao(&headers) {
                return (StatusCode::BAD_REQUEST, "faltou header".to_string());
            }
            if row["numero"] == "ORC-1" {
                return (
                    StatusCode::CONFLICT,
                    r#"{"code": "23505", "message": "duplicate key"}"#.to_string(),
                );
            }
            row["id"] = json!(7);
            (StatusCode::CREATED, row.to_string())
        }

        async fn delete_orcamento(
            State(recebidas): State<Recebidas>,
            headers: HeaderMap,
            RawQuery(query): RawQuery,
        ) -> (StatusCode, String) {
            if !autorizado(&headers) || !com_representacao(&headers) {
                return (StatusCode::BAD_REQUEST, "faltou header".to_string());
            }
            let query = query.unwrap_or_default();
            recebidas.lock().unwrap().push(query.clone());
            if query == "id=eq.99" {
                return (StatusCode::OK, String::new());
            }
            (StatusCode::OK, r#"[{"id": 1, "numero": "ORC-2"}]"#.to_string())
        }

        async fn sobe_servidor() -> (String, Recebidas) {
            let recebidas = Recebidas::default();
            let app = Router::new()
                .route("/rest/v1/blocos_salvos", get(select_blocos))
                .route(
                    "/rest/v1/orcamentos",
                    post(insert_orcamento).delete(delete_orcamento),
                )
                .route("/rest/v1/sem_retorno", post(|| async { StatusCode::CREATED }))
                .route(
                    "/rest/v1/quebrada",
                    get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
                )
                .with_state(recebidas.clone());

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

            (format!("http://{addr}"), recebidas)
        }

        #[tokio::test]
        async fn test_select_sends_key_filters_and_order() {
            let (url, recebidas) = sobe_servidor().await;
            let store = SupabaseStore::new(&url, "chave").unwrap();

            let rows = store
                .select(
                    "blocos_salvos",
                    &Query::new().eq("nome", "Reboco").order("nome", Direction::Asc),
                )
                .await
                .unwrap();
            assert_eq!(rows, vec![json!({"id": 1, "nome": "Reboco"})]);

            let query = recebidas.lock().unwrap()[0].clone();
            assert!(query.contains("nome=eq.Reboco"), "{query}");
            assert!(query.contains("order=nome.asc"), "{query}");
        }

        #[tokio::test]
        async fn test_wrong_key_is_a_status_error() {
            let (url, _) = sobe_servidor().await;
            let store = SupabaseStore::new(&url, "outra").unwrap();

            let err = store.select("blocos_salvos", &Query::new()).await.unwrap_err();
            assert!(matches!(err, DbError::Status { status: 401, .. }));
        }

        #[tokio::test]
        async fn test_insert_returns_single_object_row() {
            let (url, _) = sobe_servidor().await;
            let store = SupabaseStore::new(&url, "chave").unwrap();

            let row = store
                .insert("orcamentos", json!({"numero": "ORC-2"}))
                .await
                .unwrap();
            assert_eq!(row, json!({"numero": "ORC-2", "id": 7}));
        }

        #[tokio::test]
        async fn test_insert_conflict_maps_to_conflict() {
            let (url, _) = sobe_servidor().await;
            let store = SupabaseStore::new(&url, "chave").unwrap();

            let err = store
                .insert("orcamentos", json!({"numero": "ORC-1"}))
                .await
                .unwrap_err();
            assert!(matches!(err, DbError::Conflict(body) if body.contains("23505")));
        }

        #[tokio::test]
        async fn test_insert_without_representation_is_an_error() {
            let (url, _) = sobe_servidor().await;
            let store = SupabaseStore::new(&url, "chave").unwrap();

            let err = store.insert("sem_retorno", json!({"a": 1})).await.unwrap_err();
            assert!(matches!(err, DbError::Status { .. }));
        }

        #[tokio::test]
        async fn test_delete_rows_and_empty_body() {
            let (url, recebidas) = sobe_servidor().await;
            let store = SupabaseStore::new(&url, "chave").unwrap();

            let removidas = store
                .delete("orcamentos", &[Filter::eq("id", 1)])
                .await
                .unwrap();
            assert_eq!(removidas.len(), 1);

            let removidas = store
                .delete("orcamentos", &[Filter::eq("id", 99)])
                .await
                .unwrap();
            assert!(removidas.is_empty());

            let queries = recebidas.lock().unwrap().clone();
            assert_eq!(queries, vec!["id=eq.1".to_string(), "id=eq.99".to_string()]);
        }

        #[tokio::test]
        async fn test_server_error_keeps_status_and_body() {
            let (url, _) = sobe_servidor().await;
            let store = SupabaseStore::new(&url, "chave").unwrap();

            let err = store.select("quebrada", &Query::new()).await.unwrap_err();
            assert!(matches!(err, DbError::Status { status: 500, body } if body == "boom"));
        }
    }
}
