//! `created_at` como o Supabase devolve.
//!
//! Coluna `timestamptz` vem em RFC3339 (`2024-03-05T14:07:00.123456+00:00`),
//! coluna `timestamp` vem sem fuso (`2024-03-05T14:07:00.123456`). A segunda
//! forma e lida como UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

const SEM_FUSO: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn parse(texto: &str) -> Option<DateTime<Utc>> {
    let texto = texto.trim();
    if let Ok(data) = DateTime::parse_from_rfc3339(texto) {
        return Some(data.with_timezone(&Utc));
    }
    //postgres manda "+00" sem os minutos
    if let Ok(data) = DateTime::parse_from_str(texto, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(data.with_timezone(&Utc));
    }
    SEM_FUSO
        .iter()
        .find_map(|formato| NaiveDateTime::parse_from_str(texto, formato).ok())
        .map(|data| data.and_utc())
}

/// Para `#[serde(deserialize_with = ...)]` em campos `Option<DateTime<Utc>>`.
/// Texto que nao e data vira `None` em vez de erro.
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let texto = Option::<String>::deserialize(deserializer)?;
    Ok(texto.as_deref().and_then(parse))
}
