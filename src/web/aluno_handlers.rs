// src/web/aluno_handlers.rs
use crate::{
    error::AppResult,
    models::documento::Snapshot,
    services::projeto_service,
    state::AppState,
    templates::{AlunoPage, ProjetosAlunoParcial},
    web::{
        feed::{self, Renderizador},
        mw_papel::UsuarioAtual, redirecionar_erro, redirecionar_sucesso, renderizar,
        renderizar_texto, Feedback,
    },
};
use axum::{
    extract::{ws::WebSocketUpgrade, Extension, Path, Query, State},
    response::{IntoResponse, Redirect},
};
use std::collections::HashMap;

const MSG_CONCLUIDO: &str = "O projeto foi marcado como concluído.";
const MSG_FALHA_CONCLUIR: &str = "Não foi possível atualizar o status do projeto.";

/// GET /aluno: projetos do aluno da sessão.
pub async fn aluno_page_handler(
    State(state): State<AppState>,
    Extension(atual): Extension<UsuarioAtual>,
    Query(feedback): Query<Feedback>,
) -> AppResult<impl IntoResponse> {
    let consulta = projeto_service::consulta_projetos_do_aluno(&atual.usuario.id);
    let documentos = state.store.consultar(&consulta).await?;
    let cursos = projeto_service::carregar_cursos(state.store.as_ref()).await?;
    let projetos = projeto_service::projetos_de(
        &Snapshot {
            documentos,
            versao: 0,
        },
        &cursos,
    );
    tracing::debug!("GET /aluno: {} projeto(s) para {}", projetos.len(), atual.usuario.id);

    let template = AlunoPage {
        nome: atual.nome(),
        projetos,
        sucesso: feedback.sucesso,
        erro: feedback.erro,
    };
    renderizar(&template)
}

fn renderizar_projetos(snapshot: &Snapshot, cursos: &HashMap<String, String>) -> AppResult<String> {
    let projetos = projeto_service::projetos_de(snapshot, cursos);
    renderizar_texto(&ProjetosAlunoParcial {
        projetos: &projetos,
    })
}

/// GET /aluno/ws: a tabela de projetos, atualizada a cada mudança.
pub async fn aluno_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(atual): Extension<UsuarioAtual>,
) -> AppResult<impl IntoResponse> {
    let uid = atual.usuario.id;
    tracing::info!("Upgrade WebSocket de projetos para o aluno {}", uid);
    let consulta = projeto_service::consulta_projetos_do_aluno(&uid);
    // Cursos não mudam durante a vida do socket
    let cursos = projeto_service::carregar_cursos(state.store.as_ref()).await?;
    let renderizar: Renderizador = Box::new(move |snapshot: &Snapshot| renderizar_projetos(snapshot, &cursos));
    Ok(ws.on_upgrade(move |socket| {
        feed::transmitir(socket, state.store.clone(), consulta, renderizar, uid)
    }))
}

/// POST /aluno/projetos/{id}/concluir
pub async fn handle_concluir_projeto(
    State(state): State<AppState>,
    Extension(atual): Extension<UsuarioAtual>,
    Path(projeto_id): Path<String>,
) -> Redirect {
    match projeto_service::concluir_projeto(state.store.as_ref(), &atual.usuario.id, &projeto_id)
        .await
    {
        Ok(()) => redirecionar_sucesso("/aluno", MSG_CONCLUIDO),
        Err(e) => {
            tracing::error!("Erro ao concluir projeto {}: {:?}", projeto_id, e);
            redirecionar_erro("/aluno", MSG_FALHA_CONCLUIR)
        }
    }
}
