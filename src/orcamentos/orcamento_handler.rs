use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::Form;
use chrono::Local;
use tracing::{error, warn};

use crate::auth::session::Session;
use crate::blocos::bloco::find_all_blocos;
use crate::error::AppError;
use crate::render::renderiza;
use crate::AppState;

use super::orcamento::{
    delete_orcamento_by_id, find_all_orcamentos, find_orcamento_by_id, registra_orcamento,
};
use super::orcamento_model::{OrcamentoDto, OrcamentoForm, IVA_PADRAO};

//Lista todos os orcamentos, mais novos primeiro
//Se o banco falhar a listagem abre vazia com o aviso
pub async fn home(State(state): State<AppState>, mut session: Session) -> Response {
    let orcamentos = match find_all_orcamentos(state.store.as_ref()).await {
        Ok(orcamentos) => orcamentos,

        Err(e) => {
            error!("Erro ao buscar orcamentos: {:?}", e);
            session.danger("Erro ao carregar orçamentos!");
            Vec::new()
        }
    };

    let mut context = tera::Context::new();
    context.insert("orcamentos", &orcamentos);

    renderiza(session, "orcamento/orcamento_list.html", context)
}

//Formulario de criacao, populado com os blocos salvos para facilitar montar os itens
pub async fn show_criar_form(State(state): State<AppState>, session: Session) -> Response {
    render_criar_form(&state, session).await
}

async fn render_criar_form(state: &AppState, mut session: Session) -> Response {
    let blocos = match find_all_blocos(state.store.as_ref()).await {
        Ok(blocos) => blocos,

        Err(e) => {
            error!("Erro ao buscar blocos para o formulario: {:?}", e);
            session.danger("Erro ao carregar blocos!");
            Vec::new()
        }
    };

    let mut context = tera::Context::new();
    context.insert("blocos", &blocos);
    context.insert("iva_padrao", &IVA_PADRAO);

    renderiza(session, "orcamento/orcamento_add.html", context)
}

//Recebe o formulario, converte itens/iva, gera o numero e salva
//Sucesso volta para a home, erro mostra o formulario de novo com a mensagem
pub async fn criar_orcamento(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<OrcamentoForm>,
) -> Response {
    let agora = Local::now().naive_local();
    let resultado = match OrcamentoDto::try_from(form) {
        Ok(dto) => registra_orcamento(state.store.as_ref(), dto, agora).await,
        Err(e) => Err(e),
    };

    match resultado {
        Ok(orcamento) => {
            session.success(format!("Orçamento {} criado com sucesso!", orcamento.numero));
            (session, Redirect::to("/home")).into_response()
        }

        Err(e) => {
            error!("Failed to create orcamento: {:?}", e);
            session.danger(format!("Erro: {e}"));
            render_criar_form(&state, session).await
        }
    }
}

pub async fn ver_orcamento(
    State(state): State<AppState>,
    mut session: Session,
    Path(id): Path<i64>,
) -> Response {
    match find_orcamento_by_id(state.store.as_ref(), id).await {
        Ok(orcamento) => {
            let mut context = tera::Context::new();
            context.insert("valor_iva", &orcamento.valor_iva());
            context.insert("orcamento", &orcamento);
            renderiza(session, "orcamento/orcamento_view.html", context)
        }

        Err(AppError::NotFound(e)) => {
            warn!("{e} nao existe");
            session.danger("Orçamento não encontrado!");
            (session, Redirect::to("/home")).into_response()
        }

        Err(e) => {
            error!("Failed to load orcamento {id}: {:?}", e);
            session.danger("Erro ao carregar!");
            (session, Redirect::to("/home")).into_response()
        }
    }
}

pub async fn deletar_orcamento(
    State(state): State<AppState>,
    mut session: Session,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match delete_orcamento_by_id(state.store.as_ref(), id).await {
        Ok(_) => session.success("Orçamento deletado!"),

        Err(AppError::NotFound(e)) => {
            warn!("{e} nao existe, nada para deletar");
            session.danger("Erro ao deletar!");
        }

        Err(e) => {
            error!("Failed to delete orcamento: {:?}", e);
            session.danger("Erro ao deletar!");
        }
    }

    (session, Redirect::to("/home"))
}
