use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::Form;
use serde::Deserialize;
use tracing::{info, warn};

use crate::render::renderiza;
use crate::AppState;

use super::session::Session;

#[derive(Deserialize, Debug, Default)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

//Raiz so decide para onde mandar o usuario
pub async fn index(session: Session) -> impl IntoResponse {
    if session.is_logged_in() {
        Redirect::to("/home")
    } else {
        Redirect::to("/login")
    }
}

pub async fn show_login(session: Session) -> Response {
    renderiza(session, "auth/login.html", tera::Context::new())
}

//Compara usuario e senha com os do ambiente
//Se bater marca a sessao como logada e manda para a home
//Se nao, mostra o formulario de novo com a mensagem de erro
pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.unwrap_or_default();
    let password = form.password.unwrap_or_default();

    if state.config.credenciais_validas(&username, &password) {
        info!("login de {username}");
        session.login();
        return (session, Redirect::to("/home")).into_response();
    }

    warn!("tentativa de login incorreta para '{username}'");
    session.danger("Login incorreto!");
    renderiza(session, "auth/login.html", tera::Context::new())
}

pub async fn logout(mut session: Session) -> impl IntoResponse {
    session.clear();
    (session, Redirect::to("/login"))
}
