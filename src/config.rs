// src/config.rs
use crate::error::AppResult;
use std::{env, net::SocketAddr};

const BIND_ADDR_PADRAO: &str = "0.0.0.0:3000";
const TAMANHO_MINIMO_SEGREDO: usize = 64;

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub session_secret: String,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;
        let session_secret = env::var("SESSION_SECRET")?;
        if session_secret.len() < TAMANHO_MINIMO_SEGREDO {
            tracing::warn!("⚠️ SESSION_SECRET é curta, considere usar uma chave mais longa e aleatória!");
        }

        let bind_addr = parse_bind_addr(env::var("BIND_ADDR").ok().as_deref());

        Ok(Self {
            database_url,
            session_secret,
            bind_addr,
        })
    }
}

fn parse_bind_addr(valor: Option<&str>) -> SocketAddr {
    let padrao = || {
        BIND_ADDR_PADRAO
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000)))
    };
    match valor {
        Some(v) => v.parse().unwrap_or_else(|e| {
            tracing::warn!("BIND_ADDR inválido ('{}'): {}. Usando {}", v, e, BIND_ADDR_PADRAO);
            padrao()
        }),
        None => padrao(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_usa_padrao_quando_ausente_ou_invalido() {
        assert_eq!(parse_bind_addr(None).port(), 3000);
        assert_eq!(parse_bind_addr(Some("nao-e-endereco")).port(), 3000);
        assert_eq!(parse_bind_addr(Some("127.0.0.1:8080")).port(), 8080);
    }
}
