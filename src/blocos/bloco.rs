use serde_json::Value;
use supabase::{decode_row, decode_valid_rows, row_id, DbError, Direction, Filter, Query, Store};
use tracing::{error, warn};

use crate::error::AppError;

use super::bloco_model::{Bloco, BlocoDto, TABELA_BLOCOS};

pub async fn find_all_blocos(store: &dyn Store) -> Result<Vec<Bloco>, AppError> {
    let rows = store
        .select(TABELA_BLOCOS, &Query::new().order("nome", Direction::Asc))
        .await
        .map_err(|e| {
            error!("Failed to fetch blocos: {:?}", e);
            e
        })?;

    Ok(decode_valid_rows(TABELA_BLOCOS, rows))
}

pub async fn save_bloco(store: &dyn Store, bloco: &BlocoDto) -> Result<Bloco, AppError> {
    let row = serde_json::to_value(bloco).map_err(DbError::from)?;

    match store.insert(TABELA_BLOCOS, row).await {
        //o banco ja gravou, uma resposta estranha nao vira erro para o usuario
        Ok(row) => match decode_row(row.clone()) {
            Ok(salvo) => Ok(salvo),
            Err(e) => {
                warn!("bloco {} salvo, resposta do banco nao decodificou: {:?}", bloco.nome, e);
                Ok(bloco.gravado(row_id(&row).unwrap_or_default()))
            }
        },

        Err(e) => {
            error!("Failed to save bloco: {:?}", e);
            Err(e.into())
        }
    }
}

//Delete que nao removeu nada conta como nao encontrado
pub async fn delete_bloco_by_id(store: &dyn Store, id: i64) -> Result<(), AppError> {
    let removidos: Vec<Value> = store
        .delete(TABELA_BLOCOS, &[Filter::eq("id", id)])
        .await
        .map_err(|e| {
            error!("Failed to delete bloco {id}: {:?}", e);
            e
        })?;

    if removidos.is_empty() {
        return Err(AppError::NotFound(format!("Bloco {id}")));
    }
    Ok(())
}
