// src/models/documento.rs
use crate::models::referencia::Referencia;
use serde::Serialize;
use serde_json::{Map, Value};

/// Campos de um documento, tal como guardados (objeto JSON).
pub type Campos = Map<String, Value>;

/// Um documento lido de uma coleção: id + campos opacos.
///
/// Os acessores nunca falham. Campo ausente ou de tipo inesperado dá
/// `None`, e quem apresenta decide o texto de substituição.
#[derive(Debug, Clone, PartialEq)]
pub struct Documento {
    pub id: String,
    pub dados: Campos,
}

impl Documento {
    pub fn new(id: impl Into<String>, dados: Campos) -> Self {
        Self { id: id.into(), dados }
    }

    pub fn campo(&self, nome: &str) -> Option<&Value> {
        self.dados.get(nome)
    }

    /// Texto não vazio do campo.
    pub fn texto(&self, nome: &str) -> Option<&str> {
        match self.campo(nome) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// Primeiro campo de texto presente entre `nomes`.
    pub fn texto_de(&self, nomes: &[&str]) -> Option<&str> {
        nomes.iter().find_map(|n| self.texto(n))
    }

    /// Número do campo; aceita também texto numérico ("8.5").
    pub fn numero(&self, nome: &str) -> Option<f64> {
        match self.campo(nome) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn booleano(&self, nome: &str) -> bool {
        matches!(self.campo(nome), Some(Value::Bool(true)))
    }

    pub fn referencia(&self, nome: &str) -> Option<Referencia> {
        self.campo(nome).and_then(Referencia::de_valor)
    }

    /// Lista de referências; entradas sem id são ignoradas.
    pub fn referencias(&self, nome: &str) -> Vec<Referencia> {
        match self.campo(nome) {
            Some(Value::Array(itens)) => itens.iter().filter_map(Referencia::de_valor).collect(),
            _ => Vec::new(),
        }
    }
}

/// Converte um valor serializável nos campos de um documento.
pub fn para_campos<T: Serialize>(valor: &T) -> serde_json::Result<Campos> {
    match serde_json::to_value(valor)? {
        Value::Object(campos) => Ok(campos),
        _ => Ok(Campos::new()),
    }
}

/// Filtro de igualdade de uma consulta.
#[derive(Debug, Clone, PartialEq)]
pub enum Filtro {
    /// `campo == valor`, comparação JSON exata.
    Igual { campo: String, valor: Value },
    /// O campo referencia `id`, seja como id nu ou como objeto `{id}`.
    Referencia { campo: String, id: String },
}

/// Consulta sobre uma coleção: varredura completa ou filtro por campo.
#[derive(Debug, Clone, PartialEq)]
pub struct Consulta {
    pub colecao: String,
    pub filtro: Option<Filtro>,
}

impl Consulta {
    pub fn colecao(colecao: &str) -> Self {
        Self {
            colecao: colecao.to_string(),
            filtro: None,
        }
    }

    pub fn onde_igual(mut self, campo: &str, valor: impl Into<Value>) -> Self {
        self.filtro = Some(Filtro::Igual {
            campo: campo.to_string(),
            valor: valor.into(),
        });
        self
    }

    pub fn onde_referencia(mut self, campo: &str, id: &str) -> Self {
        self.filtro = Some(Filtro::Referencia {
            campo: campo.to_string(),
            id: id.to_string(),
        });
        self
    }

    pub fn aceita(&self, doc: &Documento) -> bool {
        match &self.filtro {
            None => true,
            Some(Filtro::Igual { campo, valor }) => doc.campo(campo) == Some(valor),
            Some(Filtro::Referencia { campo, id }) => {
                doc.referencia(campo).is_some_and(|r| r.id() == id)
            }
        }
    }
}

/// Cópia de um momento do resultado de uma consulta.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub documentos: Vec<Documento>,
    /// Cresce a cada nova publicação da mesma assinatura.
    pub versao: u64,
}

#[cfg(test)]
pub(crate) fn doc(id: &str, dados: Value) -> Documento {
    match dados {
        Value::Object(campos) => Documento::new(id, campos),
        outro => panic!("documento de teste precisa ser objeto: {}", outro),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn acessores_degradam_sem_erro() {
        let d = doc(
            "p1",
            json!({ "nome": "", "nota": "8.5", "flag": "sim", "lista": [ "a", { "id": "b" }, null ] }),
        );
        assert_eq!(d.texto("nome"), None);
        assert_eq!(d.texto("ausente"), None);
        assert_eq!(d.numero("nota"), Some(8.5));
        assert!(!d.booleano("flag"));
        let ids: Vec<_> = d.referencias("lista").into_iter().map(Referencia::into_id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn filtro_por_referencia_aceita_as_duas_formas() {
        let consulta = Consulta::colecao("projetos").onde_referencia("alunoId", "u1");
        assert!(consulta.aceita(&doc("a", json!({ "alunoId": "u1" }))));
        assert!(consulta.aceita(&doc("b", json!({ "alunoId": { "id": "u1" } }))));
        assert!(!consulta.aceita(&doc("c", json!({ "alunoId": "u2" }))));
        assert!(!consulta.aceita(&doc("d", json!({}))));
    }

    #[test]
    fn filtro_igual_compara_valor_exato() {
        let consulta = Consulta::colecao("usuarios").onde_igual("tipoUsuario", "aluno");
        assert!(consulta.aceita(&doc("a", json!({ "tipoUsuario": "aluno" }))));
        assert!(!consulta.aceita(&doc("b", json!({ "tipoUsuario": "professor" }))));
    }
}
