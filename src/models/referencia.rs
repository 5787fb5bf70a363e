// src/models/referencia.rs
use serde_json::Value;

/// Identificador normalizado de um campo de referência.
///
/// No armazenamento, uma referência aparece ou como id "nu" (`"u1"`) ou
/// como objeto com campo `id` (`{"id": "u1", ...}`). As duas formas
/// produzem a mesma `Referencia`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Referencia(String);

impl Referencia {
    fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    /// Extrai o id de um valor JSON qualquer. Nunca falha: formas que não
    /// carregam um id (null, bool, lista, objeto sem `id`, texto vazio)
    /// resultam em `None`.
    pub fn de_valor(valor: &Value) -> Option<Self> {
        match valor {
            Value::String(s) => Self::new(s.as_str()),
            Value::Number(n) => Self::new(n.to_string()),
            Value::Object(obj) => match obj.get("id") {
                // Um `id` que é ele próprio objeto não é um identificador
                Some(id @ (Value::String(_) | Value::Number(_))) => Self::de_valor(id),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    pub fn into_id(self) -> String {
        self.0
    }
}
