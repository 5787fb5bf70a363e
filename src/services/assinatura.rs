// src/services/assinatura.rs
use crate::{
    error::AppResult,
    models::documento::{Consulta, Snapshot},
    store::DocumentStore,
};
use std::sync::Arc;
use tokio::{
    sync::{broadcast::error::RecvError, watch},
    task::JoinHandle,
};

/// Assinatura de uma consulta: guarda o snapshot mais recente e
/// refaz a consulta sempre que a coleção muda.
///
/// A tarefa de fundo é libertada uma única vez, em `encerrar()` ou no
/// `Drop`, o que acontecer primeiro.
pub struct Assinatura {
    rx: watch::Receiver<Snapshot>,
    tarefa: Option<JoinHandle<()>>,
    colecao: String,
}

impl Assinatura {
    pub async fn abrir(store: Arc<dyn DocumentStore>, consulta: Consulta) -> AppResult<Self> {
        // Regista antes da primeira leitura para não perder escritas no meio
        let mut mudancas = store.mudancas();
        let documentos = store.consultar(&consulta).await?;
        let (tx, rx) = watch::channel(Snapshot {
            documentos,
            versao: 0,
        });

        let colecao = consulta.colecao.clone();
        tracing::debug!("Assinatura aberta em '{}' ({:?})", colecao, consulta.filtro);

        let tarefa = tokio::spawn(async move {
            let mut versao = 0;
            loop {
                match mudancas.recv().await {
                    Ok(alterada) if alterada == consulta.colecao => {}
                    Ok(_) => continue,
                    Err(RecvError::Lagged(perdidas)) => {
                        tracing::warn!(
                            "Assinatura em '{}' perdeu {} aviso(s); relendo.",
                            consulta.colecao,
                            perdidas
                        );
                    }
                    Err(RecvError::Closed) => break,
                }

                match store.consultar(&consulta).await {
                    Ok(documentos) => {
                        versao += 1;
                        if tx.send(Snapshot { documentos, versao }).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        // Mantém o último snapshot; a próxima mudança tenta de novo
                        tracing::error!("Erro ao reler '{}' na assinatura: {:?}", consulta.colecao, e);
                    }
                }
            }
        });

        Ok(Self {
            rx,
            tarefa: Some(tarefa),
            colecao,
        })
    }

    /// Snapshot mais recente.
    pub fn atual(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// Espera pelo próximo snapshot. `None` quando o feed terminou.
    pub async fn proxima(&mut self) -> Option<Snapshot> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }

    /// Liberta a assinatura e espera que a tarefa de fundo termine.
    pub async fn encerrar(mut self) {
        if let Some(tarefa) = self.libertar() {
            // Cancelada de propósito; o JoinError é esperado
            let _ = tarefa.await;
        }
    }

    fn libertar(&mut self) -> Option<JoinHandle<()>> {
        let tarefa = self.tarefa.take()?;
        tarefa.abort();
        tracing::debug!("Assinatura em '{}' libertada.", self.colecao);
        Some(tarefa)
    }
}

impl Drop for Assinatura {
    fn drop(&mut self) {
        self.libertar();
    }
}
