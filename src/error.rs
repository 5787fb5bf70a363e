// src/error.rs
use crate::services::auth_service::ErroIdentidade;
use axum::{http::StatusCode, response::Html, response::IntoResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de variável de ambiente: {0}")]
    EnvVarError(#[from] std::env::VarError),

    #[error("Erro ao (de)serializar documento: {0}")]
    JsonError(#[from] serde_json::Error),

    // Campo obrigatório vazio, detetado antes de qualquer escrita
    #[error("Validação falhou: {0}")]
    Validacao(String),

    #[error("Erro do provedor de identidade: {0}")]
    Identidade(#[from] ErroIdentidade),

    // Conta autenticada sem documento em `usuarios`, ou com papel desconhecido
    #[error("Dados do utilizador '{0}' não encontrados")]
    DadosUsuarioAusentes(String),

    #[error("Documento não encontrado: {colecao}/{id}")]
    NaoEncontrado { colecao: String, id: String },

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Erro na sessão: {0}")]
    SessionError(String),

    #[error("Erro interno inesperado")]
    InternalServerError,

    #[error("Não autorizado")]
    Unauthorized,
}

impl AppError {
    /// Mensagem fixa mostrada ao utilizador (o detalhe só vai para o log).
    pub fn mensagem_usuario(&self) -> String {
        match self {
            AppError::Validacao(msg) => msg.clone(),
            AppError::Identidade(e) => e.mensagem_usuario().to_string(),
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) | AppError::JsonError(_) => {
                "Erro ao aceder aos dados.".to_string()
            }
            AppError::DadosUsuarioAusentes(_) => "Dados do usuário não encontrados.".to_string(),
            AppError::NaoEncontrado { .. } => "Registo não encontrado.".to_string(),
            AppError::EnvVarError(_) => "Erro de configuração.".to_string(),
            AppError::PasswordHashingError => "Erro ao processar credenciais.".to_string(),
            AppError::SessionError(_) => "Erro na gestão da sua sessão.".to_string(),
            AppError::Unauthorized => "Acesso não autorizado.".to_string(),
            AppError::InternalServerError => "Ocorreu um erro inesperado.".to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validacao(_) => StatusCode::BAD_REQUEST,
            AppError::Identidade(ErroIdentidade::CredencialInvalida) => StatusCode::UNAUTHORIZED,
            AppError::Identidade(ErroIdentidade::Indisponivel(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Identidade(_) => StatusCode::BAD_REQUEST,
            AppError::NaoEncontrado { .. } | AppError::DadosUsuarioAusentes(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Como converter AppError numa resposta HTTP
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Loga o erro detalhado no servidor
        tracing::error!("Erro processado: {:?}", self);

        let status = self.status();
        let user_message = self.mensagem_usuario();

        // Alerta bloqueante simples; o utilizador volta e tenta de novo
        (status, Html(format!(r#"
            <!DOCTYPE html><html><head><title>Erro</title><style>body{{font-family:sans-serif;}}</style></head>
            <body><h1>Erro {status_code}</h1><p>{message}</p><a href="javascript:history.back()">Voltar</a></body></html>
         "#, status_code = status.as_u16(), message = user_message))).into_response()
    }
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;
