//! Numero legivel do orcamento.
//!
//! Quando o usuario nao informa um numero, ele e montado a partir do nome do
//! cliente e da data/hora local (`MARIA-SILVA-05032024-1407`). Depois o banco
//! e consultado e, enquanto o numero ja existir, um sufixo `-2`, `-3`... e
//! adicionado. A consulta e o insert nao sao atomicos: o insert trata o
//! conflito de unique como corrida perdida (ver `orcamento::registra_orcamento`).

use chrono::NaiveDateTime;
use supabase::{DbError, Query, Store};
use tracing::{debug, warn};

use super::orcamento_model::TABELA_ORCAMENTOS;

const MAX_NOME: usize = 20;

//Maiusculas, so letras/numeros/espacos, espacos viram hifen, no maximo 20 chars
pub fn limpa_nome_cliente(nome_cliente: &str) -> String {
    let filtrado: String = nome_cliente
        .to_uppercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    filtrado
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(MAX_NOME)
        .collect()
}

pub fn gera_numero_base(nome_cliente: &str, agora: NaiveDateTime) -> String {
    format!(
        "{}-{}",
        limpa_nome_cliente(nome_cliente),
        agora.format("%d%m%Y-%H%M")
    )
}

//Numero informado tem prioridade, senao gera pelo cliente e data
pub fn numero_candidato(numero: Option<&str>, nome_cliente: &str, agora: NaiveDateTime) -> String {
    match numero.map(str::trim).filter(|n| !n.is_empty()) {
        Some(numero) => numero.to_string(),
        None => gera_numero_base(nome_cliente, agora),
    }
}

pub async fn numero_existe(store: &dyn Store, numero: &str) -> Result<bool, DbError> {
    let rows = store
        .select(
            TABELA_ORCAMENTOS,
            &Query::new().columns("id").eq("numero", numero),
        )
        .await?;

    Ok(!rows.is_empty())
}

//Procura o primeiro numero livre: base, base-2, base-3...
//Se o banco falhar no meio, fica com o candidato atual sem garantia de unicidade
pub async fn resolve_numero_unico(store: &dyn Store, base: &str) -> String {
    let mut numero = base.to_string();
    let mut contador = 1;

    loop {
        match numero_existe(store, &numero).await {
            Ok(false) => break,

            Ok(true) => {
                contador += 1;
                numero = format!("{base}-{contador}");
                debug!("numero ja existe, tentando {numero}");
            }

            Err(e) => {
                warn!("Erro ao checar numero {numero}, usando assim mesmo: {:?}", e);
                break;
            }
        }
    }

    numero
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use supabase::MemoryStore;

    fn agora() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(14, 7, 33))
            .unwrap()
    }

    #[test]
    fn test_gera_numero_base() {
        assert_eq!(
            gera_numero_base("Maria Silva", agora()),
            "MARIA-SILVA-05032024-1407"
        );
    }

    #[test]
    fn test_limpa_nome_cliente() {
        assert_eq!(limpa_nome_cliente("  joão   d'ávila & filhos "), "JOÃO-DÁVILA-FILHOS");
        assert_eq!(limpa_nome_cliente("Construtora Horizonte Azul Lda"), "CONSTRUTORA-HORIZONT");
        assert_eq!(limpa_nome_cliente("Ana Maria Santos Costa"), "ANA-MARIA-SANTOS-COS");
        assert_eq!(limpa_nome_cliente(""), "");
        assert_eq!(limpa_nome_cliente("!!!"), "");
    }

    #[test]
    fn test_numero_candidato() {
        assert_eq!(numero_candidato(Some("  ORC-1 "), "Maria", agora()), "ORC-1");
        assert_eq!(
            numero_candidato(Some("   "), "Maria Silva", agora()),
            "MARIA-SILVA-05032024-1407"
        );
        assert_eq!(numero_candidato(None, "", agora()), "-05032024-1407");
    }

    #[tokio::test]
    async fn test_resolve_numero_unico() {
        let store = MemoryStore::new();
        let base = gera_numero_base("Maria Silva", agora());

        assert_eq!(resolve_numero_unico(&store, &base).await, base);

        store
            .insert(TABELA_ORCAMENTOS, json!({"numero": base.clone()}))
            .await
            .unwrap();
        assert_eq!(resolve_numero_unico(&store, &base).await, format!("{base}-2"));

        store
            .insert(TABELA_ORCAMENTOS, json!({"numero": format!("{base}-2")}))
            .await
            .unwrap();
        assert_eq!(resolve_numero_unico(&store, &base).await, format!("{base}-3"));
    }

    #[tokio::test]
    async fn test_resolve_numero_unico_with_store_down() {
        let store = MemoryStore::new();
        store.insert(TABELA_ORCAMENTOS, json!({"numero": "ORC-1"})).await.unwrap();
        store.set_failing(true);

        //sem banco fica com o candidato, mesmo que ja exista
        assert_eq!(resolve_numero_unico(&store, "ORC-1").await, "ORC-1");
    }
}
