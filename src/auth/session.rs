//! Sessao guardada num cookie assinado.
//!
//! O cookie carrega so o flag `logged_in` e as mensagens flash pendentes,
//! serializados em json e codificados em base64. A assinatura fica a cargo
//! do `SignedCookieJar`; cookie adulterado ou ilegivel vira sessao vazia.

use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Categoria {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub categoria: Categoria,
    pub mensagem: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub logged_in: bool,
    #[serde(default)]
    pub flashes: Vec<Flash>,
}

impl SessionData {
    pub fn is_empty(&self) -> bool {
        !self.logged_in && self.flashes.is_empty()
    }

    pub fn encode(&self) -> String {
        //serializar um struct simples nao falha
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(valor: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(valor).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

pub struct Session {
    jar: SignedCookieJar,
    data: SessionData,
}

impl Session {
    pub fn new(jar: SignedCookieJar) -> Self {
        let data = match jar.get(SESSION_COOKIE) {
            Some(cookie) => SessionData::decode(cookie.value()).unwrap_or_else(|| {
                warn!("cookie de sessao ilegivel, descartando");
                SessionData::default()
            }),
            None => SessionData::default(),
        };
        Self { jar, data }
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn is_logged_in(&self) -> bool {
        self.data.logged_in
    }

    pub fn login(&mut self) {
        self.data.logged_in = true;
    }

    //Limpa tudo, inclusive flashes pendentes
    pub fn clear(&mut self) {
        self.data = SessionData::default();
    }

    pub fn flash(&mut self, categoria: Categoria, mensagem: impl Into<String>) {
        self.data.flashes.push(Flash {
            categoria,
            mensagem: mensagem.into(),
        });
    }

    pub fn success(&mut self, mensagem: impl Into<String>) {
        self.flash(Categoria::Success, mensagem);
    }

    pub fn danger(&mut self, mensagem: impl Into<String>) {
        self.flash(Categoria::Danger, mensagem);
    }

    //Consome as mensagens, a proxima pagina nao mostra de novo
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.data.flashes)
    }

    pub fn into_jar(self) -> SignedCookieJar {
        if self.data.is_empty() {
            if self.jar.get(SESSION_COOKIE).is_none() {
                return self.jar;
            }
            return self.jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
        }

        let cookie = Cookie::build((SESSION_COOKIE, self.data.encode()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        self.jar.add(cookie)
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::<Key>::from_request_parts(parts, state).await?;
        Ok(Session::new(jar))
    }
}

impl IntoResponseParts for Session {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.into_jar().into_response_parts(res)
    }
}
