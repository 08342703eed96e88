use super::{controllers, middleware, models};
use axum::{
    middleware::from_fn,
    routing::{get, post, Router},
};

#[rustfmt::skip]
pub fn get_routes() -> Router<models::AppState> {
    Router::new()
        .route("/", get(controllers::root))
        .route("/ping", get(controllers::pong))
        .route("/note", get(controllers::list_notes).post(controllers::add_note))
        .route(
            "/note/:id",
            get(controllers::get_note)
                .put(controllers::save_note)
                .delete(controllers::delete_note),
        )
        .route("/note/:id/edit", post(controllers::toggle_edit))
}

pub fn app(state: models::AppState) -> Router {
    get_routes()
        .layer(from_fn(middleware::html_headers))
        .layer(from_fn(middleware::log_requests))
        .with_state(state)
}
