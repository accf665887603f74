pub mod auth;
pub mod blocos;
pub mod config;
pub mod error;
pub mod orcamentos;
pub mod render;
pub mod utils;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::{middleware, Router};
use axum_extra::extract::cookie::Key;
use supabase::Store;

use auth::auth_handler::{index, login, logout, show_login};
use auth::middleware::require_login;
use blocos::bloco_handler::{deletar_bloco, list_blocos, novo_bloco};
use config::config_model::AppConfig;
use orcamentos::orcamento_handler::{
    criar_orcamento, deletar_orcamento, home, show_criar_form, ver_orcamento,
};

pub use render::TEMPLATES;

//Contexto de cada request: banco, configuracao e a chave que assina o cookie
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub key: Key,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let key = config.chave_sessao();
        Self {
            store,
            config: Arc::new(config),
            key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

pub fn build_router(state: AppState) -> Router {
    let orcamento_routes = Router::new()
        .route("/home", get(home))
        .route("/criar", get(show_criar_form).post(criar_orcamento))
        .route("/orcamento/{id}", get(ver_orcamento))
        .route("/orcamento/{id}/deletar", post(deletar_orcamento));

    let bloco_routes = Router::new()
        .route("/blocos", get(list_blocos))
        .route("/blocos/novo", post(novo_bloco))
        .route("/blocos/{id}/deletar", post(deletar_bloco));

    let protegidas = orcamento_routes
        .merge(bloco_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    Router::new()
        .route("/", get(index))
        .route("/login", get(show_login).post(login))
        .route("/logout", get(logout))
        .merge(protegidas)
        .with_state(state)
}
