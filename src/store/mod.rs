// src/store/mod.rs
//! Cliente do armazenamento de documentos.
//!
//! O resto da aplicação fala só com o trait [`DocumentStore`]; a
//! implementação concreta fica em [`sqlite`].

pub mod sqlite;

use crate::{
    error::AppResult,
    models::documento::{Campos, Consulta, Documento},
};
use async_trait::async_trait;
use tokio::sync::broadcast;

pub use sqlite::SqliteDocumentStore;

/// Nomes das coleções usadas pela aplicação.
pub mod colecoes {
    pub const USUARIOS: &str = "usuarios";
    pub const CURSOS: &str = "cursos";
    pub const TEMAS: &str = "temas";
    pub const PROJETOS: &str = "projetos";
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Cria um documento com id gerado e devolve o id.
    async fn criar(&self, colecao: &str, campos: Campos) -> AppResult<String>;

    /// Grava o documento `colecao/id`, substituindo o que existir.
    async fn definir(&self, colecao: &str, id: &str, campos: Campos) -> AppResult<()>;

    async fn ler(&self, colecao: &str, id: &str) -> AppResult<Option<Documento>>;

    /// Documentos da coleção que passam no filtro, por ordem de criação.
    async fn consultar(&self, consulta: &Consulta) -> AppResult<Vec<Documento>>;

    /// Junta `campos` ao documento existente. Falha com
    /// `AppError::NaoEncontrado` se o documento não existir.
    async fn atualizar(&self, colecao: &str, id: &str, campos: Campos) -> AppResult<()>;

    /// Avisos de mudança: o nome da coleção alterada, um por escrita.
    fn mudancas(&self) -> broadcast::Receiver<String>;
}
