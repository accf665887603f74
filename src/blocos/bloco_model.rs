use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::utils::{campo_obrigatorio, parse_decimal};

pub const TABELA_BLOCOS: &str = "blocos_salvos";

//Bloco salvo: item reutilizavel na hora de montar um orcamento
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Bloco {
    pub id: i64,
    pub nome: String,
    pub unidade: String,
    pub preco_unitario: f64,
    #[serde(default, deserialize_with = "supabase::timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
}

//Campos como chegam do formulario, tudo texto
#[derive(Deserialize, Debug, Default)]
pub struct BlocoForm {
    pub nome: Option<String>,
    pub unidade: Option<String>,
    pub preco_unitario: Option<String>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct BlocoDto {
    pub nome: String,
    pub unidade: String,
    pub preco_unitario: f64,
}

impl TryFrom<BlocoForm> for BlocoDto {
    type Error = AppError;

    fn try_from(form: BlocoForm) -> Result<Self, Self::Error> {
        let nome = campo_obrigatorio("nome", form.nome)?;
        let unidade = campo_obrigatorio("unidade", form.unidade)?;
        let preco = campo_obrigatorio("preco_unitario", form.preco_unitario)?;

        Ok(BlocoDto {
            nome,
            unidade,
            preco_unitario: parse_decimal("preco_unitario", &preco)?,
        })
    }
}

impl BlocoDto {
    pub fn gravado(&self, id: i64) -> Bloco {
        Bloco {
            id,
            nome: self.nome.clone(),
            unidade: self.unidade.clone(),
            preco_unitario: self.preco_unitario,
            created_at: None,
        }
    }
}
