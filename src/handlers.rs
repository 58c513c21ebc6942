// HTTP request handlers for the resource endpoints.
//
// Reads on teams/games/matches/odds are public; mutations are behind
// the admin gate. Users and bets apply the ownership-or-admin rules.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app_state::SharedState;
use crate::auth::{self, AdminUser, AuthUser};
use crate::error::ApiError;
use crate::models::{
    Bet, BetStatus, CreateBetRequest, CreateGameRequest, CreateMatchOddRequest, CreateMatchRequest,
    CreateTeamRequest, CreateUserRequest, Game, Match, MatchOdd, Team, UpdateBetRequest, UpdateGameRequest,
    UpdateMatchOddRequest, UpdateMatchRequest, UpdateTeamRequest, UpdateUserRequest, User, UserView,
};
use crate::money;
use crate::store::UserChanges;

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ===== USERS =====

/// POST /users — public registration. Accounts always start without the
/// admin flag; promotion is a separate admin-gated update.
pub async fn create_user(
    State(state): State<SharedState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    auth::validate_username(&req.username)?;
    auth::validate_email(&req.email)?;
    auth::validate_password(&req.password)?;
    let balance = money::ensure_non_negative("balance", req.balance.unwrap_or_default())?;

    let hash = auth::hash_password(&req.password, state.config.bcrypt_cost)?;
    let user = state
        .db
        .insert_user(User::new(req.username, req.email, Some(hash), balance))?;
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

pub async fn list_users(
    State(state): State<SharedState>,
    _admin: AdminUser,
) -> Json<Vec<UserView>> {
    Json(state.db.list_users().iter().map(UserView::from).collect())
}

pub async fn get_user(
    State(state): State<SharedState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>, ApiError> {
    let user = state.db.get_user(id)?;
    auth::require_owner_or_admin(&claims, user.id)?;
    Ok(Json(UserView::from(&user)))
}

pub async fn update_user(
    State(state): State<SharedState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserView>, ApiError> {
    state.db.get_user(id)?;
    auth::require_owner_or_admin(&claims, id)?;

    // Balance adjustments and admin promotion stay admin-only even for
    // the account owner.
    if (req.balance.is_some() || req.is_admin.is_some()) && !claims.admin {
        return Err(ApiError::Forbidden("balance and admin flag can only be changed by an admin".into()));
    }
    if let Some(username) = &req.username {
        auth::validate_username(username)?;
    }
    if let Some(email) = &req.email {
        auth::validate_email(email)?;
    }
    let password_hash = match &req.password {
        Some(password) => {
            auth::validate_password(password)?;
            Some(auth::hash_password(password, state.config.bcrypt_cost)?)
        }
        None => None,
    };
    let balance = req
        .balance
        .map(|b| money::ensure_non_negative("balance", b))
        .transpose()?;

    let user = state.db.update_user(
        id,
        UserChanges {
            username: req.username,
            email: req.email,
            password_hash,
            balance,
            is_admin: req.is_admin,
        },
    )?;
    Ok(Json(UserView::from(&user)))
}

pub async fn delete_user(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.db.remove_user(id)?;
    Ok(Json(json!({ "removed": true })))
}

// ===== TEAMS =====

pub async fn create_team(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    let team = state.db.insert_team(req)?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn list_teams(State(state): State<SharedState>) -> Json<Vec<Team>> {
    Json(state.db.list_teams())
}

pub async fn get_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Team>, ApiError> {
    Ok(Json(state.db.get_team(id)?))
}

pub async fn update_team(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTeamRequest>,
) -> Result<Json<Team>, ApiError> {
    Ok(Json(state.db.update_team(id, req)?))
}

pub async fn delete_team(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.db.remove_team(id)?;
    Ok(Json(json!({ "removed": true })))
}

// ===== GAMES =====

pub async fn create_game(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Json(req): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<Game>), ApiError> {
    let game = state.db.insert_game(req)?;
    Ok((StatusCode::CREATED, Json(game)))
}

pub async fn list_games(State(state): State<SharedState>) -> Json<Vec<Game>> {
    Json(state.db.list_games())
}

pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Game>, ApiError> {
    Ok(Json(state.db.get_game(id)?))
}

pub async fn update_game(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateGameRequest>,
) -> Result<Json<Game>, ApiError> {
    Ok(Json(state.db.update_game(id, req)?))
}

pub async fn delete_game(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.db.remove_game(id)?;
    Ok(Json(json!({ "removed": true })))
}

// ===== MATCHES =====

pub async fn create_match(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Json(req): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<Match>), ApiError> {
    let m = state.db.insert_match(req)?;
    Ok((StatusCode::CREATED, Json(m)))
}

pub async fn list_matches(State(state): State<SharedState>) -> Json<Vec<Match>> {
    Json(state.db.list_matches())
}

pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Match>, ApiError> {
    Ok(Json(state.db.get_match(id)?))
}

/// PATCH /matches/:id — scores, metadata and status transitions. The
/// transition into COMPLETED settles every pending bet on the match
/// before the response is produced.
pub async fn update_match(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMatchRequest>,
) -> Result<Json<Match>, ApiError> {
    Ok(Json(state.db.update_match(id, req)?))
}

pub async fn delete_match(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.db.remove_match(id)?;
    Ok(Json(json!({ "removed": true })))
}

// ===== MATCH ODDS =====

pub async fn create_match_odd(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Json(req): Json<CreateMatchOddRequest>,
) -> Result<(StatusCode, Json<MatchOdd>), ApiError> {
    let odd = state.db.insert_match_odd(req)?;
    Ok((StatusCode::CREATED, Json(odd)))
}

pub async fn list_match_odds(State(state): State<SharedState>) -> Json<Vec<MatchOdd>> {
    Json(state.db.list_match_odds())
}

pub async fn get_match_odd(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchOdd>, ApiError> {
    Ok(Json(state.db.get_match_odd(id)?))
}

pub async fn update_match_odd(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMatchOddRequest>,
) -> Result<Json<MatchOdd>, ApiError> {
    Ok(Json(state.db.update_match_odd(id, req)?))
}

pub async fn delete_match_odd(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.db.remove_match_odd(id)?;
    Ok(Json(json!({ "removed": true })))
}

// ===== BETS =====

/// POST /bets — any authenticated user, acting as themselves; only an
/// admin may place a bet on behalf of someone else.
pub async fn create_bet(
    State(state): State<SharedState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<CreateBetRequest>,
) -> Result<(StatusCode, Json<Bet>), ApiError> {
    if req.user_id != claims.sub && !claims.admin {
        return Err(ApiError::Forbidden("bets can only be placed for your own account".into()));
    }
    let bet = state.db.place_bet(req)?;
    Ok((StatusCode::CREATED, Json(bet)))
}

pub async fn list_bets(
    State(state): State<SharedState>,
    AuthUser(claims): AuthUser,
) -> Json<Vec<Bet>> {
    if claims.admin {
        Json(state.db.list_bets())
    } else {
        Json(state.db.list_bets_for_user(claims.sub))
    }
}

pub async fn get_bet(
    State(state): State<SharedState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Bet>, ApiError> {
    let bet = state.db.get_bet(id)?;
    auth::require_owner_or_admin(&claims, bet.user_id)?;
    Ok(Json(bet))
}

/// PATCH /bets/:id — administrative cancellation is the only status an
/// update may request; WON and LOST are produced by settlement alone.
pub async fn update_bet(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBetRequest>,
) -> Result<Json<Bet>, ApiError> {
    match req.status {
        BetStatus::Cancelled => Ok(Json(state.db.cancel_bet(id)?)),
        _ => Err(ApiError::BusinessRule("bet status can only be changed to cancelled; outcomes come from settlement".into())),
    }
}

pub async fn delete_bet(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.db.remove_bet(id)?;
    Ok(Json(json!({ "removed": true })))
}
