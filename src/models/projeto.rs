// src/models/projeto.rs
use crate::models::documento::Documento;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusProjeto {
    #[default]
    Pendente,
    Feito,
}

impl StatusProjeto {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusProjeto::Pendente => "pendente",
            StatusProjeto::Feito => "feito",
        }
    }

    pub fn rotulo(&self) -> &'static str {
        match self {
            StatusProjeto::Pendente => "Pendente",
            StatusProjeto::Feito => "Feito",
        }
    }

    /// Só "feito" conta como concluído; ausente ou qualquer outro valor é pendente.
    pub fn de_texto(texto: Option<&str>) -> Self {
        match texto {
            Some("feito") => StatusProjeto::Feito,
            _ => StatusProjeto::Pendente,
        }
    }
}

/// Projeto pronto para as listas do aluno e do professor.
///
/// Aceita as duas formas de documento que existem na coleção: a do
/// formulário do professor (`temaProjeto`, `nomeCurso`, `descricaoPeriodo`)
/// e a importada (`nomeProjeto`, `cursoId`, `periodo`). Na forma importada,
/// o nome do curso sai de `cursos` (id -> nome).
#[derive(Debug, Clone, PartialEq)]
pub struct Projeto {
    pub id: String,
    pub aluno_id: Option<String>,
    pub titulo: String,
    pub descricao: String,
    pub curso: String,
    pub periodo: String,
    pub nome_aluno: String,
    pub email_aluno: String,
    pub status: StatusProjeto,
    pub status_rotulo: &'static str,
    pub concluido: bool,
}

const SEM_VALOR: &str = "-";

impl Projeto {
    pub fn de_documento(doc: &Documento, cursos: &HashMap<String, String>) -> Self {
        let status = StatusProjeto::de_texto(doc.texto("status"));
        let texto = |nomes: &[&str]| doc.texto_de(nomes).unwrap_or(SEM_VALOR).to_string();
        Self {
            id: doc.id.clone(),
            aluno_id: doc.referencia("alunoId").map(|r| r.into_id()),
            titulo: doc
                .texto_de(&["temaProjeto", "nomeProjeto"])
                .unwrap_or("Sem título")
                .to_string(),
            descricao: texto(&["descricaoProjeto"]),
            curso: doc
                .texto("nomeCurso")
                .map(str::to_string)
                .or_else(|| {
                    doc.referencia("cursoId")
                        .and_then(|r| cursos.get(r.id()).cloned())
                })
                .unwrap_or_else(|| SEM_VALOR.to_string()),
            periodo: texto(&["descricaoPeriodo", "periodo"]),
            nome_aluno: texto(&["nomeAluno"]),
            email_aluno: texto(&["emailAluno"]),
            status,
            status_rotulo: status.rotulo(),
            concluido: status == StatusProjeto::Feito,
        }
    }

    pub fn pertence_a(&self, aluno_id: &str) -> bool {
        self.aluno_id.as_deref() == Some(aluno_id)
    }
}

/// Documento gravado em `projetos` pelo formulário do professor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NovoProjeto {
    pub nome_curso: String,
    pub aluno_id: String,
    pub nome_aluno: String,
    pub email_aluno: String,
    pub tema_projeto: String,
    pub descricao_projeto: String,
    pub descricao_periodo: String,
    pub status: StatusProjeto,
}

/// Campos alterados na edição de um projeto.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AtualizacaoProjeto {
    pub tema_projeto: String,
    pub descricao_projeto: String,
    pub nome_curso: String,
    pub descricao_periodo: String,
    pub status: StatusProjeto,
}

/// Formulário "Cadastrar Projeto".
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjetoForm {
    #[serde(default)]
    pub nome_curso: String,
    #[serde(default)]
    pub aluno_id: String,
    #[serde(default)]
    pub tema_projeto: String,
    #[serde(default)]
    pub descricao_projeto: String,
    #[serde(default)]
    pub descricao_periodo: String,
}

/// Formulário "Editar Projeto".
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdicaoProjetoForm {
    #[serde(default)]
    pub tema_projeto: String,
    #[serde(default)]
    pub descricao_projeto: String,
    #[serde(default)]
    pub nome_curso: String,
    #[serde(default)]
    pub descricao_periodo: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl EdicaoProjetoForm {
    pub fn into_atualizacao(self) -> AtualizacaoProjeto {
        AtualizacaoProjeto {
            status: StatusProjeto::de_texto(self.status.as_deref()),
            tema_projeto: self.tema_projeto,
            descricao_projeto: self.descricao_projeto,
            nome_curso: self.nome_curso,
            descricao_periodo: self.descricao_periodo,
        }
    }
}
