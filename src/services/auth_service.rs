// src/services/auth_service.rs
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

/// Tamanho mínimo aceite para a senha.
pub const TAMANHO_MINIMO_SENHA: usize = 6;

/// Identidade devolvida pelo provedor após registo ou login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identidade {
    pub uid: String,
    pub email: String,
}

/// Códigos de erro do provedor de identidade.
#[derive(Error, Debug)]
pub enum ErroIdentidade {
    #[error("email já em uso")]
    EmailEmUso,

    #[error("senha fraca")]
    SenhaFraca,

    #[error("email inválido")]
    EmailInvalido,

    #[error("credencial inválida")]
    CredencialInvalida,

    #[error("provedor indisponível: {0}")]
    Indisponivel(String),
}

impl ErroIdentidade {
    /// As três mensagens do registo, mais a do login.
    pub fn mensagem_usuario(&self) -> &'static str {
        match self {
            ErroIdentidade::EmailEmUso => "Este email já está em uso.",
            ErroIdentidade::SenhaFraca => "A senha deve ter no mínimo 6 caracteres.",
            ErroIdentidade::CredencialInvalida => "Email ou senha incorretos.",
            ErroIdentidade::EmailInvalido | ErroIdentidade::Indisponivel(_) => {
                "Ocorreu um erro ao realizar o cadastro."
            }
        }
    }
}

impl From<sqlx::Error> for ErroIdentidade {
    fn from(e: sqlx::Error) -> Self {
        ErroIdentidade::Indisponivel(e.to_string())
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn cadastrar(&self, email: &str, senha: &str) -> Result<Identidade, ErroIdentidade>;
    async fn entrar(&self, email: &str, senha: &str) -> Result<Identidade, ErroIdentidade>;
}

/// Verifica se a senha fornecida corresponde ao hash guardado.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verificando hash bcrypt...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao verificar senha: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Gera um hash bcrypt para uma senha.
pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Gerando hash bcrypt...");
        bcrypt::hash(&password, cost)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

#[derive(Debug, FromRow)]
struct Credencial {
    uid: String,
    email: String,
    password_hash: String,
}

/// Provedor de identidade com contas email/senha na tabela `credenciais`.
#[derive(Debug, Clone)]
pub struct SqliteIdentityProvider {
    db_pool: SqlitePool,
    bcrypt_cost: u32,
}

impl SqliteIdentityProvider {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self {
            db_pool,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Custo bcrypt menor, para os testes não demorarem.
    #[cfg(test)]
    pub fn com_custo(db_pool: SqlitePool, bcrypt_cost: u32) -> Self {
        Self { db_pool, bcrypt_cost }
    }

    async fn buscar_por_email(&self, email: &str) -> Result<Option<Credencial>, ErroIdentidade> {
        let credencial = sqlx::query_as::<_, Credencial>(
            "SELECT uid, email, password_hash FROM credenciais WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await?;
        Ok(credencial)
    }
}

fn email_valido(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, dominio)) => {
            !local.is_empty() && !dominio.is_empty() && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn falha_interna(e: AppError) -> ErroIdentidade {
    ErroIdentidade::Indisponivel(e.to_string())
}

#[async_trait]
impl IdentityProvider for SqliteIdentityProvider {
    async fn cadastrar(&self, email: &str, senha: &str) -> Result<Identidade, ErroIdentidade> {
        let email = email.trim();
        tracing::info!("Registo de nova conta: {}", email);

        if !email_valido(email) {
            return Err(ErroIdentidade::EmailInvalido);
        }
        if senha.chars().count() < TAMANHO_MINIMO_SENHA {
            return Err(ErroIdentidade::SenhaFraca);
        }
        if self.buscar_por_email(email).await?.is_some() {
            tracing::warn!("Registo falhou: email '{}' já existe.", email);
            return Err(ErroIdentidade::EmailEmUso);
        }

        let password_hash = hash_password(senha, self.bcrypt_cost)
            .await
            .map_err(falha_interna)?;
        let uid = Uuid::new_v4().simple().to_string();

        let resultado = sqlx::query(
            "INSERT INTO credenciais (uid, email, password_hash, criado_em) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&uid)
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db_pool)
        .await;

        // Corrida entre dois registos com o mesmo email: a constraint UNIQUE decide
        if let Err(sqlx::Error::Database(db_err)) = &resultado {
            if db_err.is_unique_violation() {
                tracing::warn!("Registo falhou: email '{}' já existe (constraint).", email);
                return Err(ErroIdentidade::EmailEmUso);
            }
        }
        resultado?;

        tracing::info!("✅ Conta criada: {} ({})", email, uid);
        Ok(Identidade {
            uid,
            email: email.to_string(),
        })
    }

    async fn entrar(&self, email: &str, senha: &str) -> Result<Identidade, ErroIdentidade> {
        let email = email.trim();
        let Some(credencial) = self.buscar_por_email(email).await? else {
            tracing::warn!("Login: conta não encontrada para {}", email);
            return Err(ErroIdentidade::CredencialInvalida);
        };

        if verify_password(senha, &credencial.password_hash)
            .await
            .map_err(falha_interna)?
        {
            Ok(Identidade {
                uid: credencial.uid,
                email: credencial.email,
            })
        } else {
            tracing::warn!("Login: senha incorreta para {}", email);
            Err(ErroIdentidade::CredencialInvalida)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn provedor() -> SqliteIdentityProvider {
        SqliteIdentityProvider::com_custo(db::create_memory_pool().await.expect("pool"), 4)
    }

    #[tokio::test]
    async fn cadastrar_e_entrar() {
        let p = provedor().await;
        let criada = p.cadastrar("ana@escola.br", "segredo1").await.unwrap();
        let entrou = p.entrar("ana@escola.br", "segredo1").await.unwrap();
        assert_eq!(criada, entrou);
        // Email sem distinção de maiúsculas
        assert_eq!(p.entrar("ANA@escola.br", "segredo1").await.unwrap().uid, criada.uid);
    }

    #[tokio::test]
    async fn email_repetido_da_email_em_uso() {
        let p = provedor().await;
        p.cadastrar("ana@escola.br", "segredo1").await.unwrap();
        let erro = p.cadastrar("ana@escola.br", "outra123").await.unwrap_err();
        assert!(matches!(erro, ErroIdentidade::EmailEmUso));
    }

    #[tokio::test]
    async fn senha_curta_e_fraca() {
        let p = provedor().await;
        let erro = p.cadastrar("bia@escola.br", "12345").await.unwrap_err();
        assert!(matches!(erro, ErroIdentidade::SenhaFraca));
        assert_eq!(erro.mensagem_usuario(), "A senha deve ter no mínimo 6 caracteres.");
    }

    #[tokio::test]
    async fn email_invalido_cai_na_mensagem_generica() {
        let p = provedor().await;
        let erro = p.cadastrar("sem-arroba", "segredo1").await.unwrap_err();
        assert!(matches!(erro, ErroIdentidade::EmailInvalido));
        assert_eq!(erro.mensagem_usuario(), "Ocorreu um erro ao realizar o cadastro.");
    }

    #[tokio::test]
    async fn senha_errada_ou_conta_inexistente_sao_credencial_invalida() {
        let p = provedor().await;
        p.cadastrar("ana@escola.br", "segredo1").await.unwrap();
        assert!(matches!(
            p.entrar("ana@escola.br", "errada99").await,
            Err(ErroIdentidade::CredencialInvalida)
        ));
        assert!(matches!(
            p.entrar("ninguem@escola.br", "segredo1").await,
            Err(ErroIdentidade::CredencialInvalida)
        ));
    }
}
