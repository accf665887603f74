use std::collections::HashMap;
use std::env;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use once_cell::sync::Lazy;
use serde_json::Value;
use tera::{Context, Tera};
use tracing::error;

use crate::auth::session::Session;

pub const TEMPLATES_DIR_ENV: &str = "TEMPLATES_DIR";
const TEMPLATES_DIR_PADRAO: &str = "templates";

pub static TEMPLATES: Lazy<Tera> = Lazy::new(|| {
    let dir = templates_dir();
    match carrega_templates(&dir) {
        Ok(tera) => tera,
        Err(e) => {
            error!("Erro ao carregar templates de {dir}: {:?}", e);
            panic!("Erro ao carregar templates de {dir}: {e}")
        }
    }
});

//Pasta das templates, relativa ao diretorio de trabalho se nao for absoluta
pub fn templates_dir() -> String {
    env::var(TEMPLATES_DIR_ENV)
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .unwrap_or_else(|| TEMPLATES_DIR_PADRAO.to_string())
}

pub fn carrega_templates(dir: &str) -> tera::Result<Tera> {
    let glob = format!("{}/**/*.html", dir.trim_end_matches('/'));
    let mut tera = Tera::new(&glob)?;
    tera.register_filter("moeda", moeda);
    Ok(tera)
}

//Formata um valor monetario como 1234,50 €
pub fn formata_moeda(valor: f64) -> String {
    format!("{valor:.2} €").replace('.', ",")
}

fn moeda(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    match value.as_f64() {
        Some(valor) => Ok(Value::String(formata_moeda(valor))),
        None => Err(tera::Error::msg(format!("moeda espera um número, recebeu {value}"))),
    }
}

//Renderiza a template com as flashes pendentes da sessao
//a sessao volta na resposta para gravar que as flashes foram consumidas
pub fn renderiza(mut session: Session, template: &str, mut context: Context) -> Response {
    context.insert("flashes", &session.take_flashes());
    context.insert("logged_in", &session.is_logged_in());

    match TEMPLATES.render(template, &context) {
        Ok(html) => (session, Html(html)).into_response(),

        Err(e) => {
            error!("Failed to render {template}: {:?}", e);
            let erro = format!("Erro ao renderizar {template}: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, erro).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formata_moeda() {
        assert_eq!(formata_moeda(159.0), "159,00 €");
        assert_eq!(formata_moeda(1234.5), "1234,50 €");
        assert_eq!(formata_moeda(2.5), "2,50 €");
    }

    #[test]
    fn test_templates_carregam() {
        let nomes: Vec<&str> = TEMPLATES.get_template_names().collect();
        for esperado in [
            "base.html",
            "auth/login.html",
            "bloco/bloco_list.html",
            "orcamento/orcamento_list.html",
            "orcamento/orcamento_add.html",
            "orcamento/orcamento_view.html",
        ] {
            assert!(nomes.contains(&esperado), "faltando template {esperado}");
        }
    }

    #[test]
    fn test_carrega_templates_from_relative_dir() {
        let mut tera = carrega_templates("templates/").unwrap();
        assert!(tera.get_template_names().any(|nome| nome == "base.html"));

        let mut context = Context::new();
        context.insert("valor", &159.0);
        assert_eq!(tera.render_str("{{ valor | moeda }}", &context).unwrap(), "159,00 €");
    }
}
