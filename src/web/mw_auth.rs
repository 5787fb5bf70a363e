// src/web/mw_auth.rs
use crate::error::AppError; // Erro da aplicação (vira página HTML)
use axum::{
    extract::Request, // Request inteiro, para poder mexer nas extensões
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// Chave da sessão com o uid do utilizador autenticado.
/// Gravada no login/cadastro, apagada no logout.
pub const CHAVE_USUARIO: &str = "user_id";

// Middleware das rotas protegidas: sem uid na sessão, volta ao login
pub async fn require_auth(
    session: Session,     // Sessão do pedido (cookie -> store SQLite)
    mut request: Request, // Mutável para receber o UserId
    next: Next,
) -> Result<Response, AppError> {
    match session.get::<String>(CHAVE_USUARIO).await {
        Ok(Some(user_id)) => {
            tracing::debug!("Autenticação MW: Utilizador '{}' autenticado.", user_id);
            // As guardas de papel e os handlers leem o uid daqui,
            // sem voltar a consultar a sessão
            request.extensions_mut().insert(UserId(user_id));
            Ok(next.run(request).await)
        }
        Ok(None) => {
            // Sessão nova ou expirada
            tracing::debug!("Autenticação MW: Sem user_id na sessão. Redirecionando para /login");
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => {
            // Falha a ler a store de sessões, não é "não autenticado"
            tracing::error!("Autenticação MW: Erro ao ler sessão: {:?}", e);
            Err(AppError::SessionError(format!("Erro ao verificar sessão: {}", e)))
        }
    }
}

// uid da sessão, nas extensões do pedido
#[derive(Clone, Debug)]
pub struct UserId(pub String);
