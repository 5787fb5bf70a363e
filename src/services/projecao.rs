// src/services/projecao.rs
//! Projeção do lado de leitura.
//!
//! Junta as coleções `cursos`, `temas` e `projetos`, lidas em separado,
//! em estruturas indexadas que a página de utilizadores consulta em O(1):
//! id do curso -> nome, id do tema -> título, e id do aluno -> projetos.
//! Tudo aqui é transformação pura; nenhum registo malformado gera erro.

use crate::models::documento::Documento;
use std::collections::HashMap;

pub const SEM_CURSO: &str = "-";
pub const TEMA_NAO_ENCONTRADO: &str = "Tema não encontrado";

/// Vista simplificada de um projeto dentro do índice por aluno.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjetoResumo {
    pub nome_projeto: Option<String>,
    pub descricao_projeto: Option<String>,
    pub tema_id: Option<String>,
    pub curso_id: Option<String>,
    pub periodo: Option<String>,
    pub nota_media: Option<f64>,
}

impl ProjetoResumo {
    fn de_documento(doc: &Documento) -> Self {
        Self {
            nome_projeto: doc.texto_de(&["nomeProjeto", "temaProjeto"]).map(str::to_string),
            descricao_projeto: doc.texto("descricaoProjeto").map(str::to_string),
            tema_id: doc.referencia("temaId").map(|r| r.into_id()),
            curso_id: doc.referencia("cursoId").map(|r| r.into_id()),
            periodo: doc.texto_de(&["periodo", "descricaoPeriodo"]).map(str::to_string),
            nota_media: doc.numero("notaMedia"),
        }
    }
}

/// id -> valor do campo `campo`, para cada documento que o tenha.
/// Em ids repetidos, fica o último.
fn mapa_por_id(documentos: &[Documento], campo: &str) -> HashMap<String, String> {
    documentos
        .iter()
        .filter_map(|d| d.texto(campo).map(|v| (d.id.clone(), v.to_string())))
        .collect()
}

pub fn mapa_cursos(cursos: &[Documento]) -> HashMap<String, String> {
    mapa_por_id(cursos, "nome")
}

pub fn mapa_temas(temas: &[Documento]) -> HashMap<String, String> {
    mapa_por_id(temas, "titulo")
}

/// Agrupa os projetos pelo aluno referenciado em `alunoId`, mantendo a
/// ordem de entrada. Projetos sem aluno resolúvel ficam de fora.
pub fn indice_projetos_por_aluno(projetos: &[Documento]) -> HashMap<String, Vec<ProjetoResumo>> {
    let mut indice: HashMap<String, Vec<ProjetoResumo>> = HashMap::new();
    for doc in projetos {
        let Some(aluno) = doc.referencia("alunoId") else {
            tracing::trace!("Projeto {} sem aluno associado, ignorado.", doc.id);
            continue;
        };
        indice
            .entry(aluno.into_id())
            .or_default()
            .push(ProjetoResumo::de_documento(doc));
    }
    indice
}

/// As três estruturas da projeção, construídas de uma vez.
#[derive(Debug, Clone, Default)]
pub struct Projecao {
    pub cursos: HashMap<String, String>,
    pub temas: HashMap<String, String>,
    pub projetos_por_aluno: HashMap<String, Vec<ProjetoResumo>>,
}

impl Projecao {
    pub fn construir(cursos: &[Documento], temas: &[Documento], projetos: &[Documento]) -> Self {
        let projecao = Self {
            cursos: mapa_cursos(cursos),
            temas: mapa_temas(temas),
            projetos_por_aluno: indice_projetos_por_aluno(projetos),
        };
        tracing::debug!(
            "Projeção: {} curso(s), {} tema(s), {} aluno(s) com projetos",
            projecao.cursos.len(),
            projecao.temas.len(),
            projecao.projetos_por_aluno.len()
        );
        projecao
    }

    pub fn nome_curso(&self, curso_id: Option<&str>) -> &str {
        curso_id
            .and_then(|id| self.cursos.get(id))
            .map_or(SEM_CURSO, String::as_str)
    }

    pub fn titulo_tema(&self, tema_id: Option<&str>) -> &str {
        tema_id
            .and_then(|id| self.temas.get(id))
            .map_or(TEMA_NAO_ENCONTRADO, String::as_str)
    }

    // Nas listas do próprio utilizador um id sem registo aparece tal como está
    pub fn nome_curso_ou_id<'a>(&'a self, curso_id: &'a str) -> &'a str {
        self.cursos.get(curso_id).map_or(curso_id, String::as_str)
    }

    pub fn titulo_tema_ou_id<'a>(&'a self, tema_id: &'a str) -> &'a str {
        self.temas.get(tema_id).map_or(tema_id, String::as_str)
    }

    pub fn projetos_do_aluno(&self, aluno_id: &str) -> &[ProjetoResumo] {
        self.projetos_por_aluno
            .get(aluno_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
