// src/web/feed.rs
use crate::{
    error::AppResult,
    models::documento::{Consulta, Snapshot},
    services::assinatura::Assinatura,
    store::DocumentStore,
};
use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::{fmt::Display, sync::Arc};

/// Transforma um snapshot no HTML enviado ao cliente.
pub type Renderizador = Box<dyn Fn(&Snapshot) -> AppResult<String> + Send + Sync>;

/// Mantém uma assinatura aberta enquanto o socket vive e envia cada
/// snapshot renderizado. A assinatura é libertada quando o socket fecha.
pub async fn transmitir(
    socket: WebSocket,
    store: Arc<dyn DocumentStore>,
    consulta: Consulta,
    renderizar: Renderizador,
    dono: String,
) {
    let (ws_sender, ws_receiver) = socket.split();
    encaminhar(ws_sender, ws_receiver, store, consulta, renderizar, dono).await;
}

// Envia um snapshot; false quando o cliente já não está lá
async fn enviar<S>(ws_sender: &mut S, renderizar: &Renderizador, snapshot: &Snapshot, dono: &str) -> bool
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let html = match renderizar(snapshot) {
        Ok(html) => html,
        Err(e) => {
            // Erro de template não fecha o feed, só perde esta versão
            tracing::error!("Erro ao renderizar snapshot {} para {}: {:?}", snapshot.versao, dono, e);
            return true;
        }
    };
    match ws_sender.send(Message::Text(html.into())).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Falha ao enviar msg WS para {} ({}), fechando feed.", dono, e);
            false
        }
    }
}

async fn encaminhar<S, R, E>(
    mut ws_sender: S,
    mut ws_receiver: R,
    store: Arc<dyn DocumentStore>,
    consulta: Consulta,
    renderizar: Renderizador,
    dono: String,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let colecao = consulta.colecao.clone();
    let mut assinatura = match Assinatura::abrir(store, consulta).await {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Falha ao abrir assinatura de '{}' para {}: {:?}", colecao, dono, e);
            return;
        }
    };

    // A página foi renderizada antes do upgrade; o que mudou entretanto
    // já está no snapshot inicial, por isso vai primeiro
    let inicial = assinatura.atual();
    tracing::info!(
        "🔌 Feed WS de '{}' aberto para {} ({} documento(s))",
        colecao,
        dono,
        inicial.documentos.len()
    );
    let mut aberto = enviar(&mut ws_sender, &renderizar, &inicial, &dono).await;

    while aberto {
        tokio::select! {
            snapshot = assinatura.proxima() => {
                let Some(snapshot) = snapshot else { break };
                aberto = enviar(&mut ws_sender, &renderizar, &snapshot, &dono).await;
            }
            msg = ws_receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | None => {
                    tracing::debug!("Cliente {} fechou o feed.", dono);
                    break;
                }
                Some(Err(e)) => {
                    tracing::warn!("Erro no socket de {}: {}", dono, e);
                    break;
                }
                // O feed é só de saída
                Some(Ok(_)) => {}
            },
        }
    }

    assinatura.encerrar().await;
    tracing::info!("🔌 Feed WS de '{}' fechado para {}", colecao, dono);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        models::documento::para_campos,
        store::{colecoes, SqliteDocumentStore},
    };
    use futures_util::{sink, stream};
    use serde_json::json;
    use std::{convert::Infallible, time::Duration};
    use tokio::{sync::mpsc, time::timeout};

    fn contar(snapshot: &Snapshot) -> AppResult<String> {
        Ok(format!("{} projeto(s)", snapshot.documentos.len()))
    }

    async fn texto(saida: &mut mpsc::UnboundedReceiver<Message>) -> String {
        match timeout(Duration::from_secs(2), saida.recv()).await {
            Ok(Some(Message::Text(t))) => t.as_str().to_string(),
            outro => panic!("esperava texto, veio {:?}", outro),
        }
    }

    #[tokio::test]
    async fn envia_estado_atual_depois_mudancas_e_liberta_ao_fechar() {
        let store = Arc::new(SqliteDocumentStore::new(db::create_memory_pool().await.expect("pool")));
        let projeto = || para_campos(&json!({ "alunoId": "u1" })).unwrap();
        // Escrita entre a página e o upgrade do socket
        store.criar(colecoes::PROJETOS, projeto()).await.unwrap();

        let (saida_tx, mut saida) = mpsc::unbounded_channel::<Message>();
        let (entrada_tx, entrada_rx) = mpsc::unbounded_channel::<Result<Message, Infallible>>();
        let ws_sender = Box::pin(sink::unfold(saida_tx, |tx, msg: Message| async move {
            tx.send(msg).map_err(|_| "cliente saiu")?;
            Ok::<_, &str>(tx)
        }));
        let ws_receiver = Box::pin(stream::unfold(entrada_rx, |mut rx| async move {
            rx.recv().await.map(|m| (m, rx))
        }));
        let renderizar: Renderizador = Box::new(contar);

        let feed = tokio::spawn(encaminhar(
            ws_sender,
            ws_receiver,
            store.clone(),
            Consulta::colecao(colecoes::PROJETOS).onde_referencia("alunoId", "u1"),
            renderizar,
            "u1".to_string(),
        ));

        assert_eq!(texto(&mut saida).await, "1 projeto(s)");
        assert_eq!(store.assinantes(), 1);

        store.criar(colecoes::PROJETOS, projeto()).await.unwrap();
        assert_eq!(texto(&mut saida).await, "2 projeto(s)");

        entrada_tx.send(Ok(Message::Close(None))).unwrap();
        timeout(Duration::from_secs(2), feed)
            .await
            .expect("feed termina")
            .unwrap();
        assert_eq!(store.assinantes(), 0);
    }
}
