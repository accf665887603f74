use std::net::SocketAddr;

use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use thiserror::Error;

//Tudo que o app precisa do ambiente, carregado uma vez no startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub secret_key: String,
    pub supabase_url: String,
    pub supabase_key: String,
    pub admin_username: String,
    pub admin_password: String,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    //O Key do cookie precisa de 64 bytes, o SECRET_KEY pode ter qualquer tamanho
    pub fn chave_sessao(&self) -> Key {
        let digest = Sha512::digest(self.secret_key.as_bytes());
        Key::from(digest.as_slice())
    }

    pub fn credenciais_validas(&self, username: &str, password: &str) -> bool {
        username == self.admin_username && password == self.admin_password
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("variavel de ambiente {0} nao definida")]
    MissingVar(&'static str),
    #[error("variavel de ambiente {name} invalida: {value}")]
    InvalidVar { name: &'static str, value: String },
}
