// src/web/mw_papel.rs
//! Guardas por papel. Correm depois de `require_auth` e deixam o
//! utilizador carregado nas extensões, como [`UsuarioAtual`].
use crate::{
    error::AppError,
    models::user::{TipoUsuario, Usuario},
    services::user_service,
    state::AppState,
    web::mw_auth::UserId,
};
use axum::{
    extract::{Extension, Request, State},
    middleware::Next,
    response::Response,
};

/// Utilizador da sessão, com papel conhecido.
#[derive(Clone, Debug)]
pub struct UsuarioAtual {
    pub usuario: Usuario,
    pub tipo: TipoUsuario,
}

impl UsuarioAtual {
    pub fn nome(&self) -> String {
        self.usuario
            .nome
            .clone()
            .or_else(|| self.usuario.email.clone())
            .unwrap_or_default()
    }
}

async fn exigir(
    state: &AppState,
    user_id: UserId,
    mut request: Request,
    next: Next,
    permitido: fn(TipoUsuario) -> bool,
) -> Result<Response, AppError> {
    let uid = user_id.0;
    // Conta sem documento em `usuarios` ou sem papel válido não entra em lado nenhum
    let usuario = user_service::buscar_usuario(state.store.as_ref(), &uid)
        .await?
        .ok_or_else(|| AppError::DadosUsuarioAusentes(uid.clone()))?;
    let tipo = usuario
        .tipo
        .ok_or_else(|| AppError::DadosUsuarioAusentes(uid.clone()))?;

    // Papel errado dá 403, não redireciona
    if !permitido(tipo) {
        tracing::warn!("Papel MW: Acesso negado para {} ({}).", uid, tipo);
        return Err(AppError::Unauthorized);
    }

    // Os handlers recebem o utilizador já carregado
    tracing::debug!("Papel MW: Acesso concedido para {} ({}).", uid, tipo);
    request
        .extensions_mut()
        .insert(UsuarioAtual { usuario, tipo });
    Ok(next.run(request).await)
}

pub async fn require_aluno(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    exigir(&state, user_id, request, next, |t| t == TipoUsuario::Aluno).await
}

pub async fn require_professor(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    exigir(&state, user_id, request, next, |t| t == TipoUsuario::Professor).await
}

/// Lista de utilizadores: administrador ou professor.
pub async fn require_gestor(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    exigir(&state, user_id, request, next, |t| t.gere_usuarios()).await
}
