use chrono::NaiveDateTime;
use supabase::{decode_row, decode_valid_rows, row_id, DbError, Direction, Filter, Query, Store};
use tracing::{error, info, warn};

use crate::error::AppError;

use super::numero::{numero_candidato, resolve_numero_unico};
use super::orcamento_model::{NovoOrcamento, Orcamento, OrcamentoDto, TABELA_ORCAMENTOS};

//Quantas vezes o insert e refeito quando outro request pegou o mesmo numero
const MAX_TENTATIVAS_INSERT: usize = 3;

//Mais novos primeiro
pub async fn find_all_orcamentos(store: &dyn Store) -> Result<Vec<Orcamento>, AppError> {
    let rows = store
        .select(
            TABELA_ORCAMENTOS,
            &Query::new().order("created_at", Direction::Desc),
        )
        .await
        .map_err(|e| {
            error!("Failed to fetch orcamentos: {:?}", e);
            e
        })?;

    Ok(decode_valid_rows(TABELA_ORCAMENTOS, rows))
}

pub async fn find_orcamento_by_id(store: &dyn Store, id: i64) -> Result<Orcamento, AppError> {
    let rows = store
        .select(TABELA_ORCAMENTOS, &Query::new().eq("id", id))
        .await
        .map_err(|e| {
            error!("Failed to fetch orcamento {id}: {:?}", e);
            e
        })?;

    match rows.into_iter().next() {
        Some(row) => Ok(decode_row(row)?),
        None => Err(AppError::NotFound(format!("Orçamento {id}"))),
    }
}

pub async fn save_orcamento(store: &dyn Store, orcamento: &NovoOrcamento) -> Result<Orcamento, AppError> {
    let row = serde_json::to_value(orcamento).map_err(DbError::from)?;

    match store.insert(TABELA_ORCAMENTOS, row).await {
        //o banco ja gravou, uma resposta estranha nao vira erro para o usuario
        //senao ele reenvia e cria um orcamento duplicado
        Ok(row) => match decode_row(row.clone()) {
            Ok(salvo) => Ok(salvo),
            Err(e) => {
                warn!(
                    "orcamento {} salvo, resposta do banco nao decodificou: {:?}",
                    orcamento.numero, e
                );
                Ok(orcamento.clone().gravado(row_id(&row).unwrap_or_default()))
            }
        },

        Err(e) => {
            error!("Failed to save orcamento {}: {:?}", orcamento.numero, e);
            Err(e.into())
        }
    }
}

pub async fn delete_orcamento_by_id(store: &dyn Store, id: i64) -> Result<(), AppError> {
    let removidos = store
        .delete(TABELA_ORCAMENTOS, &[Filter::eq("id", id)])
        .await
        .map_err(|e| {
            error!("Failed to delete orcamento {id}: {:?}", e);
            e
        })?;

    if removidos.is_empty() {
        return Err(AppError::NotFound(format!("Orçamento {id}")));
    }
    Ok(())
}

//Monta o numero(informado ou gerado), acha o primeiro livre e salva
//Se o insert bater no unique do numero outro request ganhou a corrida:
//resolve o numero de novo e tenta outra vez
pub async fn registra_orcamento(
    store: &dyn Store,
    dto: OrcamentoDto,
    agora: NaiveDateTime,
) -> Result<Orcamento, AppError> {
    let base = numero_candidato(dto.numero.as_deref(), &dto.nome_cliente, agora);
    let mut tentativa = 1;

    loop {
        let numero = resolve_numero_unico(store, &base).await;
        let novo = dto.clone().into_novo(numero);

        match save_orcamento(store, &novo).await {
            Ok(orcamento) => {
                info!("orcamento {} criado com id {}", orcamento.numero, orcamento.id);
                return Ok(orcamento);
            }

            Err(AppError::Store(DbError::Conflict(detalhe))) if tentativa < MAX_TENTATIVAS_INSERT => {
                warn!(
                    "numero {} pego por outro request ({detalhe}), tentativa {tentativa}",
                    novo.numero
                );
                tentativa += 1;
            }

            Err(e) => return Err(e),
        }
    }
}
