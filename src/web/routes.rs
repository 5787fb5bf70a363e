// src/web/routes.rs
use crate::{
    state::AppState,
    web::{aluno_handlers, auth_handlers, mw_auth, mw_papel, professor_handlers, usuarios_handlers},
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/login", get(auth_handlers::show_login_form).post(auth_handlers::handle_login))
        .route("/logout", get(auth_handlers::handle_logout))
        .route(
            "/cadastro",
            get(auth_handlers::show_cadastro_form).post(auth_handlers::handle_cadastro),
        )
        .route("/", get(|| async { axum::response::Redirect::permanent("/login") }));

    // --- Painel do aluno ---
    let aluno_routes = Router::new()
        .route("/", get(aluno_handlers::aluno_page_handler))
        .route("/ws", get(aluno_handlers::aluno_websocket_handler))
        .route(
            "/projetos/{id}/concluir",
            post(aluno_handlers::handle_concluir_projeto),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_papel::require_aluno,
        ));

    // --- Painel do professor ---
    let professor_routes = Router::new()
        .route("/", get(professor_handlers::professor_page_handler))
        .route("/ws", get(professor_handlers::professor_websocket_handler))
        .route("/projetos", post(professor_handlers::handle_criar_projeto))
        .route(
            "/projetos/{id}/editar",
            get(professor_handlers::show_editar_projeto)
                .post(professor_handlers::handle_editar_projeto),
        )
        .route("/usuarios", post(professor_handlers::handle_criar_usuario))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_papel::require_professor,
        ));

    // --- Lista de utilizadores (administrador ou professor) ---
    let usuarios_routes = Router::new()
        .route("/", get(usuarios_handlers::usuarios_page_handler))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_papel::require_gestor,
        ));

    // --- Rotas Autenticadas ---
    // require_auth corre antes das guardas de papel aninhadas
    let authenticated_routes = Router::new()
        .route("/painel", get(auth_handlers::painel))
        .nest("/aluno", aluno_routes)
        .nest("/professor", professor_routes)
        .nest("/usuarios", usuarios_routes)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}
