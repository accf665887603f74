use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::Form;
use tracing::{error, info, warn};

use crate::auth::session::Session;
use crate::error::AppError;
use crate::render::renderiza;
use crate::AppState;

use super::bloco::{delete_bloco_by_id, find_all_blocos, save_bloco};
use super::bloco_model::{BlocoDto, BlocoForm};

//Pega todos os blocos salvos em ordem alfabetica
//Se o banco falhar a pagina abre vazia, com o aviso do erro
pub async fn list_blocos(State(state): State<AppState>, mut session: Session) -> Response {
    let blocos = match find_all_blocos(state.store.as_ref()).await {
        Ok(blocos) => blocos,

        Err(e) => {
            error!("Erro ao buscar blocos: {:?}", e);
            session.danger("Erro ao carregar blocos!");
            Vec::new()
        }
    };

    let mut context = tera::Context::new();
    context.insert("blocos", &blocos);

    renderiza(session, "bloco/bloco_list.html", context)
}

//Recebe o bloco do formulario, converte o preco e salva
//Volta para a listagem com a mensagem de sucesso ou de erro
pub async fn novo_bloco(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<BlocoForm>,
) -> impl IntoResponse {
    let resultado = match BlocoDto::try_from(form) {
        Ok(bloco) => save_bloco(state.store.as_ref(), &bloco).await,
        Err(e) => Err(e),
    };

    match resultado {
        Ok(bloco) => {
            info!("bloco {} salvo com id {}", bloco.nome, bloco.id);
            session.success("Bloco salvo!");
        }

        Err(e) => {
            error!("Failed to save bloco: {:?}", e);
            session.danger(format!("Erro: {e}"));
        }
    }

    (session, Redirect::to("/blocos"))
}

//Deleta o bloco pela id do botao de deletar
pub async fn deletar_bloco(
    State(state): State<AppState>,
    mut session: Session,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match delete_bloco_by_id(state.store.as_ref(), id).await {
        Ok(_) => session.success("Bloco deletado!"),

        Err(AppError::NotFound(e)) => {
            warn!("{e} nao existe, nada para deletar");
            session.danger("Erro ao deletar!");
        }

        Err(e) => {
            error!("Failed to delete bloco: {:?}", e);
            session.danger("Erro ao deletar!");
        }
    }

    (session, Redirect::to("/blocos"))
}
