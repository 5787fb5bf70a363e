// src/services/projeto_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        documento::{para_campos, Campos, Consulta, Snapshot},
        projeto::{AtualizacaoProjeto, NovoProjeto, Projeto, ProjetoForm, StatusProjeto},
        user::TipoUsuario,
    },
    services::{projecao, user_service},
    store::{colecoes, DocumentStore},
};
use serde_json::Value;
use std::collections::HashMap;

pub const MSG_PROJETO_INCOMPLETO: &str = "Preencha todos os campos e associe um aluno.";

fn incompleto() -> AppError {
    AppError::Validacao(MSG_PROJETO_INCOMPLETO.to_string())
}

/// Grava um projeto novo, pendente, com o nome e email do aluno copiados.
/// Todos os campos são obrigatórios e o aluno tem de existir como aluno.
pub async fn criar_projeto(store: &dyn DocumentStore, form: &ProjetoForm) -> AppResult<String> {
    let obrigatorios = [
        &form.nome_curso,
        &form.aluno_id,
        &form.tema_projeto,
        &form.descricao_projeto,
        &form.descricao_periodo,
    ];
    if obrigatorios.iter().any(|c| c.trim().is_empty()) {
        tracing::warn!("Projeto recusado: campos vazios ou sem aluno.");
        return Err(incompleto());
    }

    let aluno_id = form.aluno_id.trim();
    let aluno = match user_service::buscar_usuario(store, aluno_id).await? {
        Some(u) if u.tipo == Some(TipoUsuario::Aluno) => u,
        _ => {
            tracing::warn!("Projeto recusado: '{}' não é um aluno.", aluno_id);
            return Err(incompleto());
        }
    };

    let novo = NovoProjeto {
        nome_curso: form.nome_curso.trim().to_string(),
        aluno_id: aluno.id.clone(),
        nome_aluno: aluno.nome.unwrap_or_default(),
        email_aluno: aluno.email.unwrap_or_default(),
        tema_projeto: form.tema_projeto.trim().to_string(),
        descricao_projeto: form.descricao_projeto.trim().to_string(),
        descricao_periodo: form.descricao_periodo.trim().to_string(),
        status: StatusProjeto::Pendente,
    };
    let id = store.criar(colecoes::PROJETOS, para_campos(&novo)?).await?;
    tracing::info!("✅ Projeto '{}' criado para o aluno {}.", id, aluno.id);
    Ok(id)
}

/// id do curso -> nome, para projetos que só trazem `cursoId`.
pub async fn carregar_cursos(store: &dyn DocumentStore) -> AppResult<HashMap<String, String>> {
    let cursos = store.consultar(&Consulta::colecao(colecoes::CURSOS)).await?;
    Ok(projecao::mapa_cursos(&cursos))
}

pub async fn buscar_projeto(store: &dyn DocumentStore, id: &str) -> AppResult<Option<Projeto>> {
    let Some(doc) = store.ler(colecoes::PROJETOS, id).await? else {
        return Ok(None);
    };
    let cursos = carregar_cursos(store).await?;
    Ok(Some(Projeto::de_documento(&doc, &cursos)))
}

pub async fn atualizar_projeto(
    store: &dyn DocumentStore,
    id: &str,
    atualizacao: &AtualizacaoProjeto,
) -> AppResult {
    if [
        &atualizacao.tema_projeto,
        &atualizacao.descricao_projeto,
        &atualizacao.nome_curso,
        &atualizacao.descricao_periodo,
    ]
    .iter()
    .any(|c| c.trim().is_empty())
    {
        return Err(AppError::Validacao(user_service::MSG_CAMPOS_VAZIOS.to_string()));
    }

    store
        .atualizar(colecoes::PROJETOS, id, para_campos(atualizacao)?)
        .await?;
    tracing::info!("Projeto '{}' atualizado ({}).", id, atualizacao.status.as_str());
    Ok(())
}

/// Marca como feito um projeto do próprio aluno.
pub async fn concluir_projeto(
    store: &dyn DocumentStore,
    aluno_uid: &str,
    projeto_id: &str,
) -> AppResult {
    let projeto = buscar_projeto(store, projeto_id)
        .await?
        .ok_or_else(|| AppError::NaoEncontrado {
            colecao: colecoes::PROJETOS.to_string(),
            id: projeto_id.to_string(),
        })?;

    if !projeto.pertence_a(aluno_uid) {
        tracing::warn!(
            "Aluno {} tentou concluir o projeto {} de outro aluno.",
            aluno_uid,
            projeto_id
        );
        return Err(AppError::Unauthorized);
    }

    let mut campos = Campos::new();
    campos.insert(
        "status".to_string(),
        Value::String(StatusProjeto::Feito.as_str().to_string()),
    );
    store.atualizar(colecoes::PROJETOS, projeto_id, campos).await?;
    tracing::info!("✅ Projeto {} concluído pelo aluno {}.", projeto_id, aluno_uid);
    Ok(())
}

pub fn consulta_projetos_do_aluno(aluno_uid: &str) -> Consulta {
    Consulta::colecao(colecoes::PROJETOS).onde_referencia("alunoId", aluno_uid)
}

pub fn consulta_todos_projetos() -> Consulta {
    Consulta::colecao(colecoes::PROJETOS)
}

pub fn projetos_de(snapshot: &Snapshot, cursos: &HashMap<String, String>) -> Vec<Projeto> {
    snapshot
        .documentos
        .iter()
        .map(|doc| Projeto::de_documento(doc, cursos))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, store::SqliteDocumentStore};
    use serde_json::json;

    async fn store_com_aluno() -> SqliteDocumentStore {
        let store = SqliteDocumentStore::new(db::create_memory_pool().await.expect("pool"));
        store
            .definir(
                colecoes::USUARIOS,
                "u1",
                para_campos(&json!({ "nome": "Ana", "email": "ana@x.com", "tipoUsuario": "aluno" }))
                    .unwrap(),
            )
            .await
            .unwrap();
        store
            .definir(
                colecoes::USUARIOS,
                "p1",
                para_campos(&json!({ "nome": "Rafael", "tipoUsuario": "professor" })).unwrap(),
            )
            .await
            .unwrap();
        store
    }

    fn form(aluno_id: &str) -> ProjetoForm {
        ProjetoForm {
            nome_curso: "Engenharia de Software".into(),
            aluno_id: aluno_id.into(),
            tema_projeto: "Gestão Acadêmica".into(),
            descricao_projeto: "Sistema web".into(),
            descricao_periodo: "2025/1".into(),
        }
    }

    #[tokio::test]
    async fn cria_projeto_pendente_com_dados_do_aluno() {
        let store = store_com_aluno().await;
        let id = criar_projeto(&store, &form("u1")).await.unwrap();

        let doc = store.ler(colecoes::PROJETOS, &id).await.unwrap().unwrap();
        assert_eq!(doc.campo("status"), Some(&json!("pendente")));
        assert_eq!(doc.texto("nomeAluno"), Some("Ana"));
        assert_eq!(doc.texto("emailAluno"), Some("ana@x.com"));

        let projeto = buscar_projeto(&store, &id).await.unwrap().unwrap();
        assert!(!projeto.concluido);
        assert!(projeto.pertence_a("u1"));
    }

    #[tokio::test]
    async fn campo_em_branco_e_recusado_antes_de_gravar() {
        let store = store_com_aluno().await;
        let mut f = form("u1");
        f.descricao_periodo = "   ".into();
        let erro = criar_projeto(&store, &f).await.unwrap_err();
        assert_eq!(erro.mensagem_usuario(), MSG_PROJETO_INCOMPLETO);
        let todos = store.consultar(&consulta_todos_projetos()).await.unwrap();
        assert!(todos.is_empty());
    }

    #[tokio::test]
    async fn so_aceita_aluno_existente() {
        let store = store_com_aluno().await;
        for id in ["p1", "fantasma"] {
            let erro = criar_projeto(&store, &form(id)).await.unwrap_err();
            assert_eq!(erro.mensagem_usuario(), MSG_PROJETO_INCOMPLETO);
        }
    }

    #[tokio::test]
    async fn concluir_marca_como_feito() {
        let store = store_com_aluno().await;
        let id = criar_projeto(&store, &form("u1")).await.unwrap();
        concluir_projeto(&store, "u1", &id).await.unwrap();

        let snapshot = Snapshot {
            documentos: store.consultar(&consulta_projetos_do_aluno("u1")).await.unwrap(),
            versao: 0,
        };
        let projetos = projetos_de(&snapshot, &HashMap::new());
        assert_eq!(projetos.len(), 1);
        assert_eq!(projetos[0].status, StatusProjeto::Feito);
        assert!(projetos[0].concluido);
    }

    #[tokio::test]
    async fn aluno_nao_conclui_projeto_alheio() {
        let store = store_com_aluno().await;
        let id = criar_projeto(&store, &form("u1")).await.unwrap();
        let erro = concluir_projeto(&store, "u2", &id).await.unwrap_err();
        assert!(matches!(erro, AppError::Unauthorized));

        let erro = concluir_projeto(&store, "u1", "nao-existe").await.unwrap_err();
        assert!(matches!(erro, AppError::NaoEncontrado { .. }));
    }

    #[tokio::test]
    async fn edicao_altera_campos_e_status() {
        let store = store_com_aluno().await;
        let id = criar_projeto(&store, &form("u1")).await.unwrap();
        let atualizacao = AtualizacaoProjeto {
            tema_projeto: "Novo tema".into(),
            descricao_projeto: "Outra descrição".into(),
            nome_curso: "Computação".into(),
            descricao_periodo: "2025/2".into(),
            status: StatusProjeto::Feito,
        };
        atualizar_projeto(&store, &id, &atualizacao).await.unwrap();

        let p = buscar_projeto(&store, &id).await.unwrap().unwrap();
        assert_eq!(p.titulo, "Novo tema");
        assert_eq!(p.curso, "Computação");
        assert!(p.concluido);
        // Campos não editados ficam
        assert_eq!(p.nome_aluno, "Ana");
    }
}
