// Route wiring: the full HTTP surface assembled onto one Router.

pub mod auth;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::SharedState;
use crate::handlers;

/// Build the application router. Public routes are exactly the ones
/// wired without the auth extractors: login, registration, health and
/// the resource reads.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // ===== AUTH & SESSIONS =====
        .route("/auth/login", post(auth::login).get(auth::list_sessions))
        .route(
            "/auth/login/:jti",
            get(auth::get_session)
                .patch(auth::update_session)
                .delete(auth::delete_session),
        )
        .route("/auth/profile", get(auth::profile))
        // ===== USERS =====
        .route("/users", post(handlers::create_user).get(handlers::list_users))
        .route(
            "/users/:id",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        // ===== TEAMS =====
        .route("/teams", get(handlers::list_teams).post(handlers::create_team))
        .route(
            "/teams/:id",
            get(handlers::get_team)
                .patch(handlers::update_team)
                .delete(handlers::delete_team),
        )
        // ===== GAMES =====
        .route("/games", get(handlers::list_games).post(handlers::create_game))
        .route(
            "/games/:id",
            get(handlers::get_game)
                .patch(handlers::update_game)
                .delete(handlers::delete_game),
        )
        // ===== MATCHES =====
        .route("/matches", get(handlers::list_matches).post(handlers::create_match))
        .route(
            "/matches/:id",
            get(handlers::get_match)
                .patch(handlers::update_match)
                .delete(handlers::delete_match),
        )
        // ===== MATCH ODDS =====
        .route("/match-odds", get(handlers::list_match_odds).post(handlers::create_match_odd))
        .route(
            "/match-odds/:id",
            get(handlers::get_match_odd)
                .patch(handlers::update_match_odd)
                .delete(handlers::delete_match_odd),
        )
        // ===== BETS =====
        .route("/bets", get(handlers::list_bets).post(handlers::create_bet))
        .route(
            "/bets/:id",
            get(handlers::get_bet)
                .patch(handlers::update_bet)
                .delete(handlers::delete_bet),
        )
        // ===== HEALTH =====
        .route("/health", get(handlers::health_check))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
