use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::utils::{campo_obrigatorio, json_decimal, parse_decimal};

pub const TABELA_ORCAMENTOS: &str = "orcamentos";
pub const IVA_PADRAO: f64 = 6.0;

//Item do orcamento: valor obrigatorio, o resto(descricao, quantidade...) vai como veio
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ItemOrcamento {
    #[serde(deserialize_with = "valor_flexivel")]
    pub valor: f64,
    #[serde(flatten)]
    pub detalhes: Map<String, Value>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Orcamento {
    pub id: i64,
    pub numero: String,
    pub nome_cliente: String,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub local_obra: Option<String>,
    #[serde(default)]
    pub itens: Vec<ItemOrcamento>,
    pub total: f64,
    pub iva: f64,
    pub total_com_iva: f64,
    #[serde(default, deserialize_with = "supabase::timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
}

//Orcamentos antigos podem ter o valor do item gravado como texto
fn valor_flexivel<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let valor = Value::deserialize(deserializer)?;
    json_decimal("valor", &valor).map_err(serde::de::Error::custom)
}

impl Orcamento {
    pub fn valor_iva(&self) -> f64 {
        self.total * self.iva / 100.0
    }
}

//Campos como chegam do formulario de criacao
#[derive(Deserialize, Debug, Default)]
pub struct OrcamentoForm {
    pub nome_cliente: Option<String>,
    pub telefone: Option<String>,
    pub local_obra: Option<String>,
    pub itens: Option<String>,
    pub iva: Option<String>,
    pub numero: Option<String>,
}

//Formulario ja convertido, pronto para gerar o numero e salvar
#[derive(Debug, Clone, PartialEq)]
pub struct OrcamentoDto {
    pub numero: Option<String>,
    pub nome_cliente: String,
    pub telefone: String,
    pub local_obra: String,
    pub itens: Vec<ItemOrcamento>,
    pub iva: f64,
}

//Linha que vai para a tabela orcamentos
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NovoOrcamento {
    pub numero: String,
    pub nome_cliente: String,
    pub telefone: String,
    pub local_obra: String,
    pub itens: Vec<ItemOrcamento>,
    pub total: f64,
    pub iva: f64,
    pub total_com_iva: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totais {
    pub total: f64,
    pub valor_iva: f64,
    pub total_com_iva: f64,
}

pub fn calcula_totais(itens: &[ItemOrcamento], iva: f64) -> Totais {
    let total: f64 = itens.iter().map(|item| item.valor).sum();
    let valor_iva = total * iva / 100.0;

    Totais {
        total,
        valor_iva,
        total_com_iva: total + valor_iva,
    }
}

//Itens chegam como um array json montado pelo javascript do formulario
//cada item precisa ser um objeto com valor numerico(numero ou texto)
pub fn parse_itens(texto: &str) -> Result<Vec<ItemOrcamento>, AppError> {
    let valor: Value = serde_json::from_str(texto)
        .map_err(|e| AppError::validation(format!("itens não são um json válido: {e}")))?;

    let Value::Array(itens) = valor else {
        return Err(AppError::validation("itens precisam ser uma lista"));
    };

    itens
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let Value::Object(mut detalhes) = item else {
                return Err(AppError::validation(format!("item {} não é um objeto", i + 1)));
            };
            let valor = detalhes
                .remove("valor")
                .ok_or_else(|| AppError::validation(format!("item {} sem valor", i + 1)))?;

            Ok(ItemOrcamento {
                valor: json_decimal("valor", &valor)?,
                detalhes,
            })
        })
        .collect()
}

impl TryFrom<OrcamentoForm> for OrcamentoDto {
    type Error = AppError;

    fn try_from(form: OrcamentoForm) -> Result<Self, Self::Error> {
        let nome_cliente = campo_obrigatorio("nome_cliente", form.nome_cliente)?;
        let itens = parse_itens(&campo_obrigatorio("itens", form.itens)?)?;

        let iva = match form.iva.as_deref().map(str::trim) {
            None | Some("") => IVA_PADRAO,
            Some(iva) => parse_decimal("iva", iva)?,
        };

        let numero = form
            .numero
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(OrcamentoDto {
            numero,
            nome_cliente,
            telefone: form.telefone.unwrap_or_default(),
            local_obra: form.local_obra.unwrap_or_default(),
            itens,
            iva,
        })
    }
}

impl OrcamentoDto {
    //Totais sao calculados aqui, na criacao, e nunca mais
    pub fn into_novo(self, numero: String) -> NovoOrcamento {
        let totais = calcula_totais(&self.itens, self.iva);

        NovoOrcamento {
            numero,
            nome_cliente: self.nome_cliente,
            telefone: self.telefone,
            local_obra: self.local_obra,
            itens: self.itens,
            total: totais.total,
            iva: self.iva,
            total_com_iva: totais.total_com_iva,
        }
    }
}

impl NovoOrcamento {
    //Registro como foi enviado, para quando a resposta do banco nao decodifica
    pub fn gravado(self, id: i64) -> Orcamento {
        Orcamento {
            id,
            numero: self.numero,
            nome_cliente: self.nome_cliente,
            telefone: Some(self.telefone),
            local_obra: Some(self.local_obra),
            itens: self.itens,
            total: self.total,
            iva: self.iva,
            total_com_iva: self.total_com_iva,
            created_at: None,
        }
    }
}
