use axum::{
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::auth::{handlers as auth_handlers, middleware as auth_middleware};
use crate::config::SessionLayer;
use crate::handlers;
use crate::middleware::{add_security_headers, csrf_validation_middleware};
use crate::AppState;

pub fn build_router(state: AppState, session_layer: SessionLayer) -> Router {
    let auth_routes = Router::new()
        .route(
            "/register",
            get(auth_handlers::register_page).post(auth_handlers::register_handler),
        )
        .route(
            "/login",
            get(auth_handlers::login_page).post(auth_handlers::login_handler),
        )
        .route_layer(middleware::from_fn(
            auth_middleware::redirect_if_authenticated,
        ));

    let page_routes = Router::new()
        .route("/", get(handlers::index))
        .route_layer(middleware::from_fn(auth_middleware::require_auth));

    let api_routes = Router::new()
        .route(
            "/plots",
            get(handlers::list_plots).post(handlers::create_plot),
        )
        .route(
            "/plots/{id}",
            get(handlers::get_plot)
                .put(handlers::update_plot)
                .delete(handlers::delete_plot),
        )
        .route("/save_polygon", post(handlers::save_polygon))
        .route("/save_cadastra", post(handlers::save_cadastra))
        .route_layer(middleware::from_fn(auth_middleware::require_api_auth));

    let uploads = ServeDir::new(&state.config.upload_dir)
        .not_found_service(handlers::not_found.into_service());

    Router::new()
        .merge(auth_routes)
        .route("/logout", get(auth_handlers::logout_handler))
        .merge(page_routes)
        .merge(api_routes)
        .route("/bibiani_layout", get(handlers::bibiani_layout))
        .nest_service("/uploads", uploads)
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(middleware::from_fn(csrf_validation_middleware))
        .layer(session_layer)
        .layer(middleware::from_fn(add_security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
