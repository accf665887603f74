use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::debug;

use super::session::Session;

//Guard das rotas de negocio: sem sessao logada volta para o login
pub async fn require_login(session: Session, request: Request, next: Next) -> Response {
    if !session.is_logged_in() {
        debug!("acesso sem login a {}, redirecionando", request.uri().path());
        return Redirect::to("/login").into_response();
    }

    next.run(request).await
}
