use std::env;
use std::net::{IpAddr, SocketAddr};

use tracing::{debug, error};

use super::config_model::{AppConfig, ConfigError};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

//Le as variaveis do ambiente(o .env ja foi carregado pelo dotenv no main)
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(|name| env::var(name).ok())
}

//Separado do env para dar pra testar sem mexer no ambiente do processo
pub fn load_config_from<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let obrigatoria = |name: &'static str| -> Result<String, ConfigError> {
        match lookup(name) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => {
                error!("variavel de ambiente {name} nao definida");
                Err(ConfigError::MissingVar(name))
            }
        }
    };

    let secret_key = obrigatoria("SECRET_KEY")?;
    let supabase_url = obrigatoria("SUPABASE_URL")?;
    let supabase_key = obrigatoria("SUPABASE_KEY")?;
    let admin_username = obrigatoria("ADMIN_USERNAME")?;
    let admin_password = obrigatoria("ADMIN_PASSWORD")?;

    let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
    let host: IpAddr = host.trim().parse().map_err(|_| ConfigError::InvalidVar {
        name: "HOST",
        value: host.clone(),
    })?;

    let port = match lookup("PORT") {
        Some(port) => port.trim().parse::<u16>().map_err(|_| ConfigError::InvalidVar {
            name: "PORT",
            value: port.clone(),
        })?,
        None => DEFAULT_PORT,
    };

    let bind_addr = SocketAddr::new(host, port);
    debug!("configuracao carregada, escutando em {bind_addr}");

    Ok(AppConfig {
        secret_key,
        supabase_url,
        supabase_key,
        admin_username,
        admin_password,
        bind_addr,
    })
}
