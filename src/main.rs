use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use once_cell::sync::Lazy;
use orcamentos_obras::config::config::load_config;
use orcamentos_obras::render::{templates_dir, TEMPLATES_DIR_ENV};
use orcamentos_obras::{build_router, AppState, TEMPLATES};
use supabase::SupabaseStore;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config().map_err(|e| {
        error!("erro ao carregar configuracao: {e}");
        e
    })?;

    //Setup do cliente do supabase
    let store = SupabaseStore::new(&config.supabase_url, &config.supabase_key)
        .context("erro ao criar cliente do supabase")?;
    info!("cliente do supabase criado para {}", config.supabase_url);

    //carrega as templates agora, erro de template derruba o startup e nao o primeiro request
    let templates = templates_dir();
    if !Path::new(&templates).is_dir() {
        anyhow::bail!("pasta de templates {templates} nao encontrada, defina {TEMPLATES_DIR_ENV}");
    }
    Lazy::force(&TEMPLATES);
    info!("templates carregadas de {templates}");

    let addr = config.bind_addr;
    let app = build_router(AppState::new(config, Arc::new(store)));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("erro ao criar listener em {addr}"))?;

    info!("Listening on {}", addr);
    axum::serve(listener, app)
        .await
        .context("erro ao iniciar o servidor")?;

    Ok(())
}
