// Domain records and request/response shapes for the betis API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ===== USERS =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// bcrypt hash; accounts without one cannot authenticate.
    pub password_hash: Option<String>,
    pub balance: Decimal,
    /// Lifetime amount wagered. Monotonic, never rewound.
    pub total_bet: Decimal,
    /// Lifetime amount credited from winning bets. Monotonic.
    pub total_won: Decimal,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: Option<String>, balance: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            balance,
            total_bet: Decimal::ZERO,
            total_won: Decimal::ZERO,
            is_admin: false,
            created_at: Utc::now(),
        }
    }
}

/// External projection of a user. The password hash never leaves the
/// store in any response body.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub balance: Decimal,
    pub total_bet: Decimal,
    pub total_won: Decimal,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            balance: u.balance,
            total_bet: u.total_bet,
            total_won: u.total_won,
            is_admin: u.is_admin,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub balance: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

// ===== TEAMS =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    /// Uppercase short tag, unique across teams.
    pub tag: String,
    pub country: String,
    pub logo_url: Option<String>,
    pub founded_year: Option<i32>,
    pub total_earnings: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    pub tag: String,
    pub country: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub total_earnings: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTeamRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub total_earnings: Option<Decimal>,
}

// ===== GAMES =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCategory {
    #[serde(rename = "FPS")]
    Fps,
    #[serde(rename = "MOBA")]
    Moba,
    #[serde(rename = "Sports")]
    Sports,
    #[serde(rename = "Fighting")]
    Fighting,
    #[serde(rename = "Battle Royale")]
    BattleRoyale,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub name: String,
    pub category: GameCategory,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub name: String,
    pub category: GameCategory,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateGameRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<GameCategory>,
}

// ===== MATCHES =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Completed,
    Cancelled,
}

impl MatchStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchFormat {
    Bo1,
    Bo3,
    Bo5,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub team1_id: Uuid,
    pub team2_id: Uuid,
    pub game_id: Uuid,
    pub match_date: Option<DateTime<Utc>>,
    pub status: MatchStatus,
    pub team1_score: u32,
    pub team2_score: u32,
    pub winner_id: Option<Uuid>,
    pub format: MatchFormat,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn involves(&self, team_id: Uuid) -> bool {
        self.team1_id == team_id || self.team2_id == team_id
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMatchRequest {
    pub team1_id: Uuid,
    pub team2_id: Uuid,
    pub game_id: Uuid,
    #[serde(default)]
    pub match_date: Option<DateTime<Utc>>,
    pub format: MatchFormat,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMatchRequest {
    #[serde(default)]
    pub status: Option<MatchStatus>,
    #[serde(default)]
    pub winner_id: Option<Uuid>,
    #[serde(default)]
    pub team1_score: Option<u32>,
    #[serde(default)]
    pub team2_score: Option<u32>,
    #[serde(default)]
    pub match_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub format: Option<MatchFormat>,
}

// ===== MATCH ODDS =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOdd {
    pub id: Uuid,
    pub match_id: Uuid,
    pub team_id: Uuid,
    pub odds: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMatchOddRequest {
    pub match_id: Uuid,
    pub team_id: Uuid,
    pub odds: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMatchOddRequest {
    pub odds: Decimal,
}

// ===== BETS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub match_id: Uuid,
    /// The backed team; one of the match's two participants.
    pub team_id: Uuid,
    pub amount: Decimal,
    /// Odds captured at placement; later odds updates never touch this.
    pub odds: Decimal,
    /// amount * odds, computed once at placement and frozen.
    pub potential_payout: Decimal,
    pub status: BetStatus,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBetRequest {
    pub user_id: Uuid,
    pub match_id: Uuid,
    pub team_id: Uuid,
    pub amount: Decimal,
    /// The odds the client saw; placement is refused if they are stale.
    pub odds: Decimal,
    /// Always server-computed; a request that supplies it is rejected.
    #[serde(default)]
    pub potential_payout: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBetRequest {
    pub status: BetStatus,
}

// ===== AUTH =====

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    /// Session identifier; the unit of revocation for /auth/login/:jti.
    pub jti: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSessionRequest {
    /// The only patchable session field; owner and jti are immutable.
    #[serde(default)]
    pub label: Option<String>,
}
