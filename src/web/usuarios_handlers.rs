// src/web/usuarios_handlers.rs
use crate::{
    error::AppResult,
    models::user::TipoUsuario,
    services::user_service,
    store::DocumentStore,
    templates::{UsuarioLinha, UsuariosPage},
    web::{mw_papel::UsuarioAtual, renderizar},
};
use axum::{
    extract::{Extension, State},
    response::IntoResponse,
};
use std::sync::Arc;

/// GET /usuarios: todos os utilizadores com cursos, temas e projetos.
pub async fn usuarios_page_handler(
    State(store): State<Arc<dyn DocumentStore>>,
    Extension(atual): Extension<UsuarioAtual>,
) -> AppResult<impl IntoResponse> {
    let (usuarios, projecao) = user_service::carregar_lista_usuarios(store.as_ref()).await?;
    tracing::debug!("GET /usuarios: {} utilizador(es)", usuarios.len());

    let linhas = usuarios
        .iter()
        .map(|u| UsuarioLinha::montar(u, &projecao))
        .collect();

    let voltar = match atual.tipo {
        TipoUsuario::Administrador => None,
        outro => Some(outro.painel()),
    };

    renderizar(&UsuariosPage {
        usuarios: linhas,
        voltar,
    })
}
