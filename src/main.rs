// src/main.rs

// --- Declaração dos Módulos ---
mod config;
mod db;
mod error;
mod models;
mod services;
mod state;
mod store;
mod templates;
mod web;

// --- Imports ---
use crate::{config::Config, state::AppState};
use axum::serve;
use std::env;
use time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::Key, ExpiredDeletion, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuração do Logging (Tracing) ---
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            env::var("RUST_LOG")
                .unwrap_or_else(|_| {
                    "painel_projetos=debug,tower_http=info,sqlx=warn,tower_sessions=info".into()
                })
                .into()
        }))
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Iniciando o Painel de Projetos...");

    let config = Config::from_env().map_err(|e| {
        tracing::error!("❌ Configuração inválida: {}", e);
        anyhow::anyhow!("Falha ao ler configuração: {}", e)
    })?;

    // --- Configuração da Base de Dados ---
    let db_pool = match db::create_db_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Falha crítica ao inicializar a base de dados: {}", e);
            return Err(anyhow::anyhow!("Falha ao conectar/migrar DB: {}", e));
        }
    };

    // --- Configuração das Sessões ---
    let session_store = SqliteStore::new(db_pool.clone())
        .with_table_name("sessions")
        .map_err(|e| anyhow::anyhow!("Falha ao criar session store: {}", e))?;
    session_store.migrate().await?;

    let session_store_clone = session_store.clone();
    tokio::spawn(async move {
        if let Err(e) = session_store_clone
            .continuously_delete_expired(tokio::time::Duration::from_secs(60 * 60))
            .await
        {
            tracing::error!("Erro na task de limpeza de sessões: {:?}", e);
        }
    });
    tracing::info!("🧹 Tarefa de limpeza de sessões iniciada.");

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::days(1)));

    // --- Criação do Estado da Aplicação ---
    let app_state = AppState::new(db_pool);

    // --- Router e Camadas ---
    tracing::info!("🛠️ Construindo router e aplicando middlewares...");
    let router = web::routes::create_router(app_state);
    // Cookie assinado quando o segredo serve como chave (64 bytes ou mais)
    let app = match Key::try_from(config.session_secret.as_bytes()) {
        Ok(key) => router.layer(session_layer.with_signed(key)),
        Err(e) => {
            tracing::warn!("⚠️ SESSION_SECRET não serve como chave ({}); cookie de sessão sem assinatura.", e);
            router.layer(session_layer)
        }
    }
    .layer(TraceLayer::new_for_http());
    tracing::info!("🔑 Camada de sessão configurada.");

    // --- Listener ---
    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Falha ao iniciar listener em {}: {}", config.bind_addr, e);
            return Err(e.into());
        }
    };
    tracing::info!("📡 Servidor escutando em http://{}", config.bind_addr);

    // --- Início do Servidor ---
    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Erro fatal no servidor: {}", e);
        return Err(e.into());
    }

    Ok(())
}
