// src/web/professor_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        documento::Snapshot,
        projeto::{EdicaoProjetoForm, ProjetoForm},
        user::CadastroForm,
    },
    services::{projeto_service, user_service},
    state::AppState,
    store::colecoes,
    templates::{EditarProjetoPage, OpcaoAluno, ProfessorPage, ProjetosProfessorParcial},
    web::{
        feed::{self, Renderizador},
        mw_papel::UsuarioAtual, redirecionar_erro, redirecionar_sucesso, renderizar,
        renderizar_texto, Feedback,
    },
};
use axum::{
    extract::{ws::WebSocketUpgrade, Extension, Form, Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use std::collections::HashMap;

/// Abas do painel do professor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Aba {
    #[default]
    Projetos,
    CadastrarProjeto,
    CadastrarUsuario,
}

impl Aba {
    /// Valor ausente ou desconhecido abre a lista de projetos.
    pub fn de_parametro(valor: Option<&str>) -> Self {
        match valor {
            Some("cadastrarProjeto") => Aba::CadastrarProjeto,
            Some("cadastrarUsuario") => Aba::CadastrarUsuario,
            _ => Aba::Projetos,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Aba::Projetos => "projetos",
            Aba::CadastrarProjeto => "cadastrarProjeto",
            Aba::CadastrarUsuario => "cadastrarUsuario",
        }
    }

    fn url(&self) -> String {
        format!("/professor?aba={}", self.as_str())
    }
}

#[derive(Deserialize, Debug)]
pub struct ProfessorQuery {
    aba: Option<String>,
    sucesso: Option<String>,
    erro: Option<String>,
}

/// GET /professor?aba=...
pub async fn professor_page_handler(
    State(state): State<AppState>,
    Extension(atual): Extension<UsuarioAtual>,
    Query(params): Query<ProfessorQuery>,
) -> AppResult<impl IntoResponse> {
    let aba = Aba::de_parametro(params.aba.as_deref());
    tracing::debug!("GET /professor: aba {}", aba.as_str());

    let mut template = ProfessorPage {
        nome: atual.nome(),
        aba: aba.as_str(),
        projetos: Vec::new(),
        alunos: Vec::new(),
        sucesso: params.sucesso,
        erro: params.erro,
    };

    // Cada aba só carrega o que mostra
    match aba {
        Aba::Projetos => {
            let documentos = state
                .store
                .consultar(&projeto_service::consulta_todos_projetos())
                .await?;
            let cursos = projeto_service::carregar_cursos(state.store.as_ref()).await?;
            template.projetos = projeto_service::projetos_de(
                &Snapshot {
                    documentos,
                    versao: 0,
                },
                &cursos,
            );
        }
        Aba::CadastrarProjeto => {
            template.alunos = user_service::listar_alunos(state.store.as_ref())
                .await?
                .into_iter()
                .map(|u| OpcaoAluno {
                    nome: u.nome.or(u.email).unwrap_or_else(|| u.id.clone()),
                    id: u.id,
                })
                .collect();
        }
        Aba::CadastrarUsuario => {}
    }

    renderizar(&template)
}

fn renderizar_projetos(snapshot: &Snapshot, cursos: &HashMap<String, String>) -> AppResult<String> {
    let projetos = projeto_service::projetos_de(snapshot, cursos);
    renderizar_texto(&ProjetosProfessorParcial {
        projetos: &projetos,
    })
}

/// GET /professor/ws: todos os projetos, ao vivo.
pub async fn professor_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(atual): Extension<UsuarioAtual>,
) -> AppResult<impl IntoResponse> {
    let uid = atual.usuario.id;
    tracing::info!("Upgrade WebSocket de projetos para o professor {}", uid);
    let cursos = projeto_service::carregar_cursos(state.store.as_ref()).await?;
    let renderizar: Renderizador = Box::new(move |snapshot: &Snapshot| renderizar_projetos(snapshot, &cursos));
    Ok(ws.on_upgrade(move |socket| {
        feed::transmitir(
            socket,
            state.store.clone(),
            projeto_service::consulta_todos_projetos(),
            renderizar,
            uid,
        )
    }))
}

/// POST /professor/projetos
pub async fn handle_criar_projeto(
    State(state): State<AppState>,
    Form(form): Form<ProjetoForm>,
) -> Redirect {
    match projeto_service::criar_projeto(state.store.as_ref(), &form).await {
        Ok(_) => redirecionar_sucesso(&Aba::Projetos.url(), "Projeto cadastrado!"),
        Err(e) => {
            tracing::error!("Erro ao cadastrar projeto: {:?}", e);
            redirecionar_erro(&Aba::CadastrarProjeto.url(), &e.mensagem_usuario())
        }
    }
}

/// GET /professor/projetos/{id}/editar
pub async fn show_editar_projeto(
    State(state): State<AppState>,
    Path(projeto_id): Path<String>,
    Query(feedback): Query<Feedback>,
) -> AppResult<impl IntoResponse> {
    let projeto = projeto_service::buscar_projeto(state.store.as_ref(), &projeto_id)
        .await?
        .ok_or_else(|| AppError::NaoEncontrado {
            colecao: colecoes::PROJETOS.to_string(),
            id: projeto_id.clone(),
        })?;

    renderizar(&EditarProjetoPage {
        projeto,
        erro: feedback.erro,
    })
}

/// POST /professor/projetos/{id}/editar
pub async fn handle_editar_projeto(
    State(state): State<AppState>,
    Path(projeto_id): Path<String>,
    Form(form): Form<EdicaoProjetoForm>,
) -> Redirect {
    let atualizacao = form.into_atualizacao();
    match projeto_service::atualizar_projeto(state.store.as_ref(), &projeto_id, &atualizacao).await
    {
        Ok(()) => redirecionar_sucesso(&Aba::Projetos.url(), "Projeto atualizado!"),
        Err(e) => {
            tracing::error!("Erro ao atualizar projeto {}: {:?}", projeto_id, e);
            let volta = format!("/professor/projetos/{}/editar", projeto_id);
            redirecionar_erro(&volta, &e.mensagem_usuario())
        }
    }
}

/// POST /professor/usuarios: regista sem mexer na sessão do professor.
pub async fn handle_criar_usuario(
    State(state): State<AppState>,
    Form(form): Form<CadastroForm>,
) -> Redirect {
    match user_service::registrar_usuario(state.identidade.as_ref(), state.store.as_ref(), &form)
        .await
    {
        Ok(conta) => {
            tracing::info!("Professor cadastrou o utilizador {}", conta.uid);
            redirecionar_sucesso(&Aba::CadastrarUsuario.url(), "Usuário cadastrado com sucesso!")
        }
        Err(e) => {
            tracing::error!("Erro ao cadastrar utilizador {}: {:?}", form.email, e);
            redirecionar_erro(&Aba::CadastrarUsuario.url(), &e.mensagem_usuario())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aba_desconhecida_abre_projetos() {
        assert_eq!(Aba::de_parametro(None), Aba::Projetos);
        assert_eq!(Aba::de_parametro(Some("outra")), Aba::Projetos);
        for aba in [Aba::Projetos, Aba::CadastrarProjeto, Aba::CadastrarUsuario] {
            assert_eq!(Aba::de_parametro(Some(aba.as_str())), aba);
        }
    }
}
