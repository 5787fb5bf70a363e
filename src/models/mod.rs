// src/models/mod.rs
pub mod documento;
pub mod projeto;
pub mod referencia;
pub mod user;
