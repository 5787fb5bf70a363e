// src/state.rs
use crate::{
    services::auth_service::{IdentityProvider, SqliteIdentityProvider},
    store::{DocumentStore, SqliteDocumentStore},
};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub identidade: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Estado com as implementações SQLite, todas sobre o mesmo pool.
    pub fn new(db_pool: SqlitePool) -> Self {
        Self {
            store: Arc::new(SqliteDocumentStore::new(db_pool.clone())),
            identidade: Arc::new(SqliteIdentityProvider::new(db_pool)),
        }
    }

    /// Mesmo estado com bcrypt barato, para os testes de rotas.
    #[cfg(test)]
    pub fn para_testes(db_pool: SqlitePool) -> Self {
        Self {
            store: Arc::new(SqliteDocumentStore::new(db_pool.clone())),
            identidade: Arc::new(SqliteIdentityProvider::com_custo(db_pool, 4)),
        }
    }
}

// Handlers que só leem documentos extraem o store diretamente
impl axum::extract::FromRef<AppState> for Arc<dyn DocumentStore> {
    fn from_ref(state: &AppState) -> Arc<dyn DocumentStore> {
        state.store.clone()
    }
}
