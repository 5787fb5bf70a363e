// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{CadastroForm, LoginForm},
    services::user_service,
    state::AppState,
    store::DocumentStore,
    templates::{CadastroPage, LoginPage},
    web::{
        mw_auth::{UserId, CHAVE_USUARIO},
        renderizar,
    },
};
use axum::{
    extract::{Extension, Form, State},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

async fn usuario_da_sessao(session: &Session) -> Option<String> {
    session.get::<String>(CHAVE_USUARIO).await.ok().flatten()
}

async fn autenticar_sessao(session: &Session, uid: &str) -> AppResult {
    // Novo ID de sessão a cada login
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;
    session
        .insert(CHAVE_USUARIO, uid)
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))?;
    Ok(())
}

// Erros que voltam ao formulário em vez de irem para a página de erro
fn erro_de_formulario(e: &AppError) -> bool {
    matches!(
        e,
        AppError::Validacao(_) | AppError::Identidade(_) | AppError::DadosUsuarioAusentes(_)
    )
}

// GET /login
pub async fn show_login_form(session: Session) -> AppResult<Response> {
    if usuario_da_sessao(&session).await.is_some() {
        tracing::debug!("GET /login: Utilizador já logado, redirecionando para /painel");
        return Ok(Redirect::to("/painel").into_response());
    }
    Ok(renderizar(&LoginPage { erro: None })?.into_response())
}

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    tracing::info!("Tentativa de login para: {}", form.email);

    match user_service::entrar(state.identidade.as_ref(), state.store.as_ref(), &form).await {
        Ok((conta, tipo)) => {
            autenticar_sessao(&session, &conta.uid).await?;
            tracing::info!("✅ Login bem-sucedido para: {} ({})", conta.uid, tipo);
            Ok(Redirect::to(tipo.painel()).into_response())
        }
        Err(e) if erro_de_formulario(&e) => {
            tracing::warn!("Login recusado para {}: {}", form.email, e);
            let template = LoginPage {
                erro: Some(e.mensagem_usuario()),
            };
            Ok(renderizar(&template)?.into_response())
        }
        Err(e) => Err(e),
    }
}

// GET /logout
pub async fn handle_logout(session: Session) -> AppResult<Redirect> {
    let user_id = usuario_da_sessao(&session).await;

    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;

    if let Some(id) = user_id {
        tracing::info!("🚪 Utilizador '{}' desligado.", id);
    } else {
        tracing::info!("🚪 Sessão anónima desligada.");
    }
    Ok(Redirect::to("/login"))
}

// GET /cadastro
pub async fn show_cadastro_form(session: Session) -> AppResult<Response> {
    if usuario_da_sessao(&session).await.is_some() {
        return Ok(Redirect::to("/painel").into_response());
    }
    let template = CadastroPage {
        erro: None,
        nome: String::new(),
        email: String::new(),
    };
    Ok(renderizar(&template)?.into_response())
}

// POST /cadastro: regista e já deixa o utilizador autenticado
pub async fn handle_cadastro(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CadastroForm>,
) -> AppResult<Response> {
    tracing::info!("POST /cadastro: {}", form.email);

    match user_service::registrar_usuario(state.identidade.as_ref(), state.store.as_ref(), &form)
        .await
    {
        Ok(conta) => {
            autenticar_sessao(&session, &conta.uid).await?;
            Ok(Redirect::to(form.tipo_usuario().painel()).into_response())
        }
        Err(e) => {
            tracing::warn!("Cadastro falhou para {}: {}", form.email, e);
            // Fora validação e identidade, a mensagem é sempre a genérica do cadastro
            let erro = if erro_de_formulario(&e) {
                e.mensagem_usuario()
            } else {
                "Ocorreu um erro ao realizar o cadastro.".to_string()
            };
            let template = CadastroPage {
                erro: Some(erro),
                nome: form.nome,
                email: form.email,
            };
            Ok(renderizar(&template)?.into_response())
        }
    }
}

// GET /painel: manda cada papel para a sua página
pub async fn painel(
    State(store): State<Arc<dyn DocumentStore>>,
    Extension(user_id): Extension<UserId>,
) -> AppResult<Redirect> {
    let tipo = user_service::tipo_do_usuario(store.as_ref(), &user_id.0).await?;
    Ok(Redirect::to(tipo.painel()))
}
