// src/store/sqlite.rs
use crate::{
    error::{AppError, AppResult},
    models::documento::{Campos, Consulta, Documento},
    store::DocumentStore,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{FromRow, SqlitePool};
use tokio::sync::broadcast;
use uuid::Uuid;

const CAPACIDADE_MUDANCAS: usize = 256;

#[derive(Debug, FromRow)]
struct LinhaDocumento {
    id: String,
    dados: String,
}

impl LinhaDocumento {
    // Linha com JSON inválido é ignorada (com aviso), não derruba a leitura
    fn into_documento(self, colecao: &str) -> Option<Documento> {
        match serde_json::from_str::<Value>(&self.dados) {
            Ok(Value::Object(campos)) => Some(Documento::new(self.id, campos)),
            Ok(outro) => {
                tracing::warn!("Documento {}/{} não é um objeto JSON: {}", colecao, self.id, outro);
                None
            }
            Err(e) => {
                tracing::warn!("Documento {}/{} com JSON inválido: {}", colecao, self.id, e);
                None
            }
        }
    }
}

/// Armazenamento de documentos JSON numa tabela SQLite.
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    db_pool: SqlitePool,
    mudancas_tx: broadcast::Sender<String>,
}

impl SqliteDocumentStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        let (mudancas_tx, _) = broadcast::channel(CAPACIDADE_MUDANCAS);
        Self { db_pool, mudancas_tx }
    }

    fn avisar(&self, colecao: &str) {
        // Sem assinantes o envio falha, o que é normal
        let n = self.mudancas_tx.send(colecao.to_string()).unwrap_or(0);
        tracing::debug!("Mudança em '{}' avisada a {} assinante(s)", colecao, n);
    }

    /// Quantos receptores de mudanças estão vivos.
    #[cfg(test)]
    pub fn assinantes(&self) -> usize {
        self.mudancas_tx.receiver_count()
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn criar(&self, colecao: &str, campos: Campos) -> AppResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        let dados = serde_json::to_string(&campos)?;
        let agora = Utc::now().to_rfc3339();
        tracing::debug!("Criando documento {}/{}", colecao, id);

        sqlx::query(
            r#"
            INSERT INTO documentos (colecao, id, dados, criado_em, atualizado_em)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
        )
        .bind(colecao)
        .bind(&id)
        .bind(dados)
        .bind(agora)
        .execute(&self.db_pool)
        .await?;

        self.avisar(colecao);
        Ok(id)
    }

    async fn definir(&self, colecao: &str, id: &str, campos: Campos) -> AppResult<()> {
        let dados = serde_json::to_string(&campos)?;
        let agora = Utc::now().to_rfc3339();
        tracing::debug!("Gravando documento {}/{}", colecao, id);

        sqlx::query(
            r#"
            INSERT INTO documentos (colecao, id, dados, criado_em, atualizado_em)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(colecao, id) DO UPDATE SET
               dados = excluded.dados,
               atualizado_em = excluded.atualizado_em
            "#,
        )
        .bind(colecao)
        .bind(id)
        .bind(dados)
        .bind(agora)
        .execute(&self.db_pool)
        .await?;

        self.avisar(colecao);
        Ok(())
    }

    async fn ler(&self, colecao: &str, id: &str) -> AppResult<Option<Documento>> {
        tracing::debug!("Lendo documento {}/{}", colecao, id);
        let linha = sqlx::query_as::<_, LinhaDocumento>(
            "SELECT id, dados FROM documentos WHERE colecao = ?1 AND id = ?2",
        )
        .bind(colecao)
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(linha.and_then(|l| l.into_documento(colecao)))
    }

    async fn consultar(&self, consulta: &Consulta) -> AppResult<Vec<Documento>> {
        let linhas = sqlx::query_as::<_, LinhaDocumento>(
            "SELECT id, dados FROM documentos WHERE colecao = ?1 ORDER BY seq ASC",
        )
        .bind(&consulta.colecao)
        .fetch_all(&self.db_pool)
        .await?;

        let documentos: Vec<Documento> = linhas
            .into_iter()
            .filter_map(|l| l.into_documento(&consulta.colecao))
            .filter(|d| consulta.aceita(d))
            .collect();
        tracing::debug!(
            "Consulta em '{}' ({:?}): {} documento(s)",
            consulta.colecao,
            consulta.filtro,
            documentos.len()
        );
        Ok(documentos)
    }

    async fn atualizar(&self, colecao: &str, id: &str, campos: Campos) -> AppResult<()> {
        tracing::debug!("Atualizando documento {}/{}: {:?}", colecao, id, campos.keys());
        // IMMEDIATE pega o lock de escrita já no BEGIN: duas atualizações
        // ao mesmo tempo esperam pelo busy_timeout em vez de falhar com
        // "database is locked" ao passar de leitura para escrita
        let mut tx = self.db_pool.begin_with("BEGIN IMMEDIATE").await?;

        let atual: Option<String> =
            sqlx::query_scalar("SELECT dados FROM documentos WHERE colecao = ?1 AND id = ?2")
                .bind(colecao)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(atual) = atual else {
            tracing::warn!("Atualização falhou: {}/{} não existe.", colecao, id);
            return Err(AppError::NaoEncontrado {
                colecao: colecao.to_string(),
                id: id.to_string(),
            });
        };

        // Documento corrompido é substituído pelos campos novos
        let mut dados = match serde_json::from_str::<Value>(&atual) {
            Ok(Value::Object(dados)) => dados,
            _ => Campos::new(),
        };
        dados.extend(campos);

        sqlx::query(
            "UPDATE documentos SET dados = ?1, atualizado_em = ?2 WHERE colecao = ?3 AND id = ?4",
        )
        .bind(serde_json::to_string(&dados)?)
        .bind(Utc::now().to_rfc3339())
        .bind(colecao)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.avisar(colecao);
        Ok(())
    }

    fn mudancas(&self) -> broadcast::Receiver<String> {
        self.mudancas_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, models::documento::para_campos, store::colecoes};
    use serde_json::json;

    async fn store() -> SqliteDocumentStore {
        SqliteDocumentStore::new(db::create_memory_pool().await.expect("pool"))
    }

    fn campos(valor: Value) -> Campos {
        para_campos(&valor).expect("campos")
    }

    #[tokio::test]
    async fn criar_e_ler() {
        let store = store().await;
        let id = store
            .criar(colecoes::CURSOS, campos(json!({ "nome": "Engenharia" })))
            .await
            .unwrap();

        let doc = store.ler(colecoes::CURSOS, &id).await.unwrap().expect("existe");
        assert_eq!(doc.texto("nome"), Some("Engenharia"));
        assert!(store.ler(colecoes::TEMAS, &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn definir_substitui_e_atualizar_junta() {
        let store = store().await;
        store
            .definir(colecoes::USUARIOS, "u1", campos(json!({ "nome": "Ana", "email": "a@x" })))
            .await
            .unwrap();
        store
            .definir(colecoes::USUARIOS, "u1", campos(json!({ "nome": "Ana Maria" })))
            .await
            .unwrap();
        let doc = store.ler(colecoes::USUARIOS, "u1").await.unwrap().unwrap();
        assert_eq!(doc.texto("email"), None);

        store
            .atualizar(colecoes::USUARIOS, "u1", campos(json!({ "email": "am@x" })))
            .await
            .unwrap();
        let doc = store.ler(colecoes::USUARIOS, "u1").await.unwrap().unwrap();
        assert_eq!(doc.texto("nome"), Some("Ana Maria"));
        assert_eq!(doc.texto("email"), Some("am@x"));
    }

    #[tokio::test]
    async fn atualizar_documento_inexistente_falha() {
        let store = store().await;
        let erro = store
            .atualizar(colecoes::PROJETOS, "nada", campos(json!({ "status": "feito" })))
            .await
            .unwrap_err();
        assert!(matches!(erro, AppError::NaoEncontrado { .. }));
    }

    #[tokio::test]
    async fn consultar_filtra_e_mantem_ordem_de_criacao() {
        let store = store().await;
        for (nome, tipo) in [("Ana", "aluno"), ("Rafael", "professor"), ("Bia", "aluno")] {
            store
                .criar(colecoes::USUARIOS, campos(json!({ "nome": nome, "tipoUsuario": tipo })))
                .await
                .unwrap();
        }
        let alunos = store
            .consultar(&Consulta::colecao(colecoes::USUARIOS).onde_igual("tipoUsuario", "aluno"))
            .await
            .unwrap();
        let nomes: Vec<_> = alunos.iter().filter_map(|d| d.texto("nome")).collect();
        assert_eq!(nomes, ["Ana", "Bia"]);

        let todos = store.consultar(&Consulta::colecao(colecoes::USUARIOS)).await.unwrap();
        assert_eq!(todos.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn atualizacoes_simultaneas_em_arquivo_nao_bloqueiam() {
        let caminho = std::env::temp_dir().join(format!("painel-{}.db", Uuid::new_v4().simple()));
        let url = format!("sqlite://{}", caminho.display());
        let store = SqliteDocumentStore::new(db::create_db_pool(&url).await.expect("pool"));

        let mut ids = Vec::new();
        for i in 0..20 {
            let id = store
                .criar(colecoes::PROJETOS, campos(json!({ "nomeProjeto": i, "status": "pendente" })))
                .await
                .unwrap();
            ids.push(id);
        }

        let tarefas: Vec<_> = ids
            .iter()
            .cloned()
            .map(|id| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .atualizar(colecoes::PROJETOS, &id, campos(json!({ "status": "feito" })))
                        .await
                })
            })
            .collect();
        let mut falhas = Vec::new();
        for tarefa in tarefas {
            if let Err(e) = tarefa.await.unwrap() {
                falhas.push(e.to_string());
            }
        }
        assert!(falhas.is_empty(), "falhas: {:?}", falhas);

        let feitos = store
            .consultar(&Consulta::colecao(colecoes::PROJETOS).onde_igual("status", "feito"))
            .await
            .unwrap();
        assert_eq!(feitos.len(), 20);

        store.db_pool.close().await;
        for sufixo in ["", "-wal", "-shm", "-journal"] {
            let _ = std::fs::remove_file(format!("{}{}", caminho.display(), sufixo));
        }
    }

    #[tokio::test]
    async fn escritas_avisam_a_colecao_alterada() {
        let store = store().await;
        let mut rx = store.mudancas();
        store.criar(colecoes::TEMAS, campos(json!({ "titulo": "IA" }))).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), colecoes::TEMAS);
        assert_eq!(store.assinantes(), 1);
        drop(rx);
        assert_eq!(store.assinantes(), 0);
    }
}
