// src/models/user.rs
use crate::models::{
    documento::Documento,
    referencia::Referencia,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Papel do utilizador, guardado em `usuarios.tipoUsuario`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoUsuario {
    Aluno,
    Professor,
    Administrador,
}

impl TipoUsuario {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoUsuario::Aluno => "aluno",
            TipoUsuario::Professor => "professor",
            TipoUsuario::Administrador => "administrador",
        }
    }

    /// Página inicial de cada papel, depois do login.
    pub fn painel(&self) -> &'static str {
        match self {
            TipoUsuario::Aluno => "/aluno",
            TipoUsuario::Professor => "/professor",
            TipoUsuario::Administrador => "/usuarios",
        }
    }

    /// Quem pode ver a lista completa de utilizadores.
    pub fn gere_usuarios(&self) -> bool {
        match self {
            TipoUsuario::Professor | TipoUsuario::Administrador => true,
            TipoUsuario::Aluno => false,
        }
    }
}

impl fmt::Display for TipoUsuario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("tipo de utilizador desconhecido: '{0}'")]
pub struct TipoDesconhecido(pub String);

impl FromStr for TipoUsuario {
    type Err = TipoDesconhecido;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aluno" => Ok(TipoUsuario::Aluno),
            "professor" => Ok(TipoUsuario::Professor),
            "administrador" => Ok(TipoUsuario::Administrador),
            outro => Err(TipoDesconhecido(outro.to_string())),
        }
    }
}

/// Utilizador lido de `usuarios`. O id é o uid do provedor de identidade.
#[derive(Debug, Clone, PartialEq)]
pub struct Usuario {
    pub id: String,
    pub nome: Option<String>,
    pub email: Option<String>,
    /// `None` quando o campo falta ou traz um papel desconhecido.
    pub tipo: Option<TipoUsuario>,
    pub avaliador: bool,
    pub matricula: Option<String>,
    pub temas: Vec<Referencia>,
    pub cursos: Vec<Referencia>,
    /// Curso -> período(s), já formatado ("1, 2").
    pub periodos: Vec<(String, String)>,
}

impl Usuario {
    pub fn de_documento(doc: &Documento) -> Self {
        let tipo = doc.texto("tipoUsuario").and_then(|t| match t.parse() {
            Ok(tipo) => Some(tipo),
            Err(e) => {
                tracing::warn!("Utilizador {}: {}", doc.id, e);
                None
            }
        });

        let periodos = match doc.campo("periodos") {
            Some(Value::Object(mapa)) => mapa
                .iter()
                .filter_map(|(curso, valor)| formatar_periodo(valor).map(|p| (curso.clone(), p)))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            id: doc.id.clone(),
            nome: doc.texto("nome").map(str::to_string),
            email: doc.texto("email").map(str::to_string),
            tipo,
            avaliador: doc.booleano("avaliador"),
            matricula: doc.texto("nmatricula").map(str::to_string),
            temas: doc.referencias("temas"),
            cursos: doc.referencias("cursos"),
            periodos,
        }
    }

    pub fn periodo_do_curso(&self, curso_id: &str) -> Option<&str> {
        self.periodos
            .iter()
            .find(|(c, _)| c == curso_id)
            .map(|(_, p)| p.as_str())
    }
}

// Um período pode ser valor único ou lista de valores
fn formatar_periodo(valor: &Value) -> Option<String> {
    match valor {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(itens) => Some(
            itens
                .iter()
                .filter_map(formatar_periodo)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        outro => Some(outro.to_string()),
    }
}

/// Documento gravado em `usuarios/{uid}` no registo.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NovoUsuario {
    pub nome: String,
    pub email: String,
    pub tipo_usuario: TipoUsuario,
    pub avaliador: bool,
}

// Struct para dados do formulário de login
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub senha: String,
}

/// Formulário de registo (público ou pelo painel do professor).
#[derive(Debug, Deserialize)]
pub struct CadastroForm {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub senha: String,
    // Checkbox HTML: presente ("on") quando marcada
    #[serde(default, rename = "isProfessor")]
    pub is_professor: Option<String>,
}

impl CadastroForm {
    pub fn tipo_usuario(&self) -> TipoUsuario {
        if self.is_professor.is_some() {
            TipoUsuario::Professor
        } else {
            TipoUsuario::Aluno
        }
    }
}
