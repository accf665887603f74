use serde_json::Value;

use crate::error::AppError;

//Converte o texto de um campo do formulario em decimal
//aceita espacos em volta, recusa inf/nan
pub fn parse_decimal(campo: &str, texto: &str) -> Result<f64, AppError> {
    let valor = texto
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::validation(format!("{campo} não é um número: '{texto}'")))?;

    if !valor.is_finite() {
        return Err(AppError::validation(format!("{campo} não é um número: '{texto}'")));
    }
    Ok(valor)
}

//Mesmo que parse_decimal, mas para valores vindos de json(numero ou texto numerico)
pub fn json_decimal(campo: &str, valor: &Value) -> Result<f64, AppError> {
    match valor {
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| AppError::validation(format!("{campo} inválido: {n}"))),
        Value::String(s) => parse_decimal(campo, s),
        outro => Err(AppError::validation(format!("{campo} não é um número: {outro}"))),
    }
}

//Campo obrigatorio do formulario, so pode faltar por erro do cliente
pub fn campo_obrigatorio(campo: &str, valor: Option<String>) -> Result<String, AppError> {
    valor.ok_or_else(|| AppError::validation(format!("campo obrigatório ausente: {campo}")))
}
