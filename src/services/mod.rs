// src/services/mod.rs
pub mod assinatura;
pub mod auth_service;
pub mod projecao;
pub mod projeto_service;
pub mod user_service;
