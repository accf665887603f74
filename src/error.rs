use supabase::DbError;
use thiserror::Error;

//Erros que chegam nos handlers, cada um vira uma mensagem diferente para o usuario
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} não encontrado")]
    NotFound(String),
    #[error("dados inválidos: {0}")]
    Validation(String),
    #[error("{0}")]
    Store(#[from] DbError),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}
