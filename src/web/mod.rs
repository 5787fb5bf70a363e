// src/web/mod.rs
pub mod aluno_handlers;
pub mod auth_handlers;
pub mod feed;
pub mod mw_auth;
pub mod mw_papel;
pub mod professor_handlers;
pub mod routes;
pub mod usuarios_handlers;

use crate::error::{AppError, AppResult};
use askama::Template;
use axum::response::{Html, Redirect};
use serde::Deserialize;

/// Mensagens de retorno do padrão Post/Redirect/Get (`?sucesso=` / `?erro=`).
#[derive(Deserialize, Debug, Default)]
pub struct Feedback {
    pub sucesso: Option<String>,
    pub erro: Option<String>,
}

pub fn redirecionar_sucesso(caminho: &str, mensagem: &str) -> Redirect {
    redirecionar_com(caminho, "sucesso", mensagem)
}

pub fn redirecionar_erro(caminho: &str, mensagem: &str) -> Redirect {
    redirecionar_com(caminho, "erro", mensagem)
}

fn redirecionar_com(caminho: &str, chave: &str, mensagem: &str) -> Redirect {
    let separador = if caminho.contains('?') { '&' } else { '?' };
    let redirect_url = format!(
        "{}{}{}={}",
        caminho,
        separador,
        chave,
        urlencoding::encode(mensagem)
    );
    Redirect::to(&redirect_url)
}

/// Renderiza um template Askama; falha de render vira erro interno.
pub fn renderizar_texto<T: Template>(template: &T) -> AppResult<String> {
    template.render().map_err(|e| {
        tracing::error!("Falha ao renderizar template: {}", e);
        AppError::InternalServerError
    })
}

pub fn renderizar<T: Template>(template: &T) -> AppResult<Html<String>> {
    renderizar_texto(template).map(Html)
}
