// src/templates.rs
use crate::{
    models::{
        projeto::Projeto,
        user::{TipoUsuario, Usuario},
    },
    services::projecao::{Projecao, ProjetoResumo},
};
use askama::Template;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub erro: Option<String>,
}

#[derive(Template)]
#[template(path = "cadastro.html")]
pub struct CadastroPage {
    pub erro: Option<String>,
    // Mantém o que foi escrito quando o registo falha
    pub nome: String,
    pub email: String,
}

#[derive(Template)]
#[template(path = "aluno.html")]
pub struct AlunoPage {
    pub nome: String,
    pub projetos: Vec<Projeto>,
    pub sucesso: Option<String>,
    pub erro: Option<String>,
}

/// Só a tabela de projetos do aluno; é o que o WebSocket envia.
#[derive(Template)]
#[template(path = "projetos_aluno.html")]
pub struct ProjetosAlunoParcial<'a> {
    pub projetos: &'a [Projeto],
}

/// Aluno que pode ser associado a um projeto novo.
#[derive(Debug, Clone)]
pub struct OpcaoAluno {
    pub id: String,
    pub nome: String,
}

#[derive(Template)]
#[template(path = "professor.html")]
pub struct ProfessorPage {
    pub nome: String,
    pub aba: &'static str,
    pub projetos: Vec<Projeto>,
    pub alunos: Vec<OpcaoAluno>,
    pub sucesso: Option<String>,
    pub erro: Option<String>,
}

#[derive(Template)]
#[template(path = "projetos_professor.html")]
pub struct ProjetosProfessorParcial<'a> {
    pub projetos: &'a [Projeto],
}

#[derive(Template)]
#[template(path = "editar_projeto.html")]
pub struct EditarProjetoPage {
    pub projeto: Projeto,
    pub erro: Option<String>,
}

// Linhas da lista de utilizadores, já com as junções resolvidas

#[derive(Debug, Clone)]
pub struct CursoLinha {
    pub nome: String,
    pub periodo: String,
}

#[derive(Debug, Clone)]
pub struct ProjetoLinha {
    pub nome: String,
    pub descricao: String,
    pub tema: String,
    pub curso: String,
    pub periodo: String,
    pub nota: String,
}

impl ProjetoLinha {
    fn de_resumo(resumo: &ProjetoResumo, projecao: &Projecao) -> Self {
        let ou_traco = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        Self {
            nome: ou_traco(&resumo.nome_projeto),
            descricao: ou_traco(&resumo.descricao_projeto),
            tema: projecao.titulo_tema(resumo.tema_id.as_deref()).to_string(),
            curso: projecao.nome_curso(resumo.curso_id.as_deref()).to_string(),
            periodo: ou_traco(&resumo.periodo),
            nota: resumo
                .nota_media
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UsuarioLinha {
    pub nome: String,
    pub email: String,
    pub tipo: String,
    pub avaliador: bool,
    pub matricula: String,
    pub temas: Vec<String>,
    pub cursos: Vec<CursoLinha>,
    pub e_aluno: bool,
    pub projetos: Vec<ProjetoLinha>,
}

impl UsuarioLinha {
    pub fn montar(usuario: &Usuario, projecao: &Projecao) -> Self {
        let e_aluno = usuario.tipo == Some(TipoUsuario::Aluno);
        Self {
            nome: usuario.nome.clone().unwrap_or_else(|| "Sem nome".to_string()),
            email: usuario.email.clone().unwrap_or_else(|| "-".to_string()),
            tipo: usuario
                .tipo
                .map_or_else(|| "-".to_string(), |t| t.as_str().to_string()),
            avaliador: usuario.avaliador,
            matricula: usuario.matricula.clone().unwrap_or_else(|| "-".to_string()),
            temas: usuario
                .temas
                .iter()
                .map(|t| projecao.titulo_tema_ou_id(t.id()).to_string())
                .collect(),
            cursos: usuario
                .cursos
                .iter()
                .map(|c| CursoLinha {
                    nome: projecao.nome_curso_ou_id(c.id()).to_string(),
                    periodo: usuario.periodo_do_curso(c.id()).unwrap_or("-").to_string(),
                })
                .collect(),
            e_aluno,
            projetos: if e_aluno {
                projecao
                    .projetos_do_aluno(&usuario.id)
                    .iter()
                    .map(|p| ProjetoLinha::de_resumo(p, projecao))
                    .collect()
            } else {
                Vec::new()
            },
        }
    }
}

#[derive(Template)]
#[template(path = "usuarios.html")]
pub struct UsuariosPage {
    pub usuarios: Vec<UsuarioLinha>,
    /// Professores voltam ao seu painel; o administrador já está nele.
    pub voltar: Option<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::documento::doc;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn linha_de_aluno_junta_cursos_temas_e_projetos() {
        let projecao = Projecao::construir(
            &[doc("c1", json!({ "nome": "Engenharia" }))],
            &[doc("t1", json!({ "titulo": "IA" }))],
            &[
                doc(
                    "p1",
                    json!({ "alunoId": { "id": "u1" }, "nomeProjeto": "Visão", "cursoId": "c1", "temaId": "t9", "notaMedia": 8.5 }),
                ),
                doc("p2", json!({ "alunoId": "u1", "nomeProjeto": "Robótica", "notaMedia": 8.25 })),
            ],
        );
        let usuario = Usuario::de_documento(&doc(
            "u1",
            json!({
                "nome": "Ana",
                "tipoUsuario": "aluno",
                "temas": ["t1", "t-sem-mapa"],
                "cursos": [{ "id": "c1" }, "c2"],
                "periodos": { "c1": [1, 2] }
            }),
        ));

        let linha = UsuarioLinha::montar(&usuario, &projecao);
        assert!(linha.e_aluno);
        // Tema e curso do próprio utilizador sem registo mostram o id
        assert_eq!(linha.temas, ["IA", "t-sem-mapa"]);
        assert_eq!(linha.cursos[0].nome, "Engenharia");
        assert_eq!(linha.cursos[0].periodo, "1, 2");
        assert_eq!(linha.cursos[1].nome, "c2");
        assert_eq!(linha.projetos.len(), 2);
        assert_eq!(linha.projetos[0].curso, "Engenharia");
        assert_eq!(linha.projetos[0].tema, "Tema não encontrado");
        assert_eq!(linha.projetos[0].nota, "8.5");
        // Nota sem arredondar; curso ausente no projeto continua "-"
        assert_eq!(linha.projetos[1].nota, "8.25");
        assert_eq!(linha.projetos[1].curso, "-");
    }

    #[test]
    fn professor_nao_mostra_projetos() {
        let projecao = Projecao::construir(&[], &[], &[doc("p1", json!({ "alunoId": "u2" }))]);
        let usuario = Usuario::de_documento(&doc("u2", json!({ "tipoUsuario": "professor" })));
        let linha = UsuarioLinha::montar(&usuario, &projecao);
        assert!(!linha.e_aluno);
        assert!(linha.projetos.is_empty());
        assert_eq!(linha.nome, "Sem nome");
    }

    #[test]
    fn parcial_do_aluno_so_oferece_concluir_a_pendentes() {
        let projetos = [
            doc("a", json!({ "alunoId": "u1", "temaProjeto": "Pendente", "status": "pendente" })),
            doc("b", json!({ "alunoId": "u1", "temaProjeto": "Pronto", "status": "feito" })),
        ]
        .map(|d| Projeto::de_documento(&d, &HashMap::new()));
        let html = ProjetosAlunoParcial { projetos: &projetos }.render().unwrap();
        assert!(html.contains("/aluno/projetos/a/concluir"));
        assert!(!html.contains("/aluno/projetos/b/concluir"));
    }
}
