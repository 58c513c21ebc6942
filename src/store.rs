// In-process store: one table per entity behind a single writer lock.
//
// The write lock is the transaction unit. Every read-then-write of a
// shared invariant (uniqueness at registration, balance debit/credit in
// the betting engine) happens under one acquisition, so two concurrent
// requests cannot both pass a stale check. A multi-server deployment
// would need to swap this for a shared durable store; that ceiling is
// deliberate, not hidden.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use chrono::{Datelike, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    Bet, CreateGameRequest, CreateMatchOddRequest, CreateMatchRequest, CreateTeamRequest, Game, Match,
    MatchOdd, MatchStatus, Team, UpdateGameRequest, UpdateMatchOddRequest, UpdateTeamRequest, User,
};
use crate::money;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Tables {
    pub users: HashMap<Uuid, User>,
    pub teams: HashMap<Uuid, Team>,
    pub games: HashMap<Uuid, Game>,
    pub matches: HashMap<Uuid, Match>,
    pub match_odds: HashMap<Uuid, MatchOdd>,
    pub bets: HashMap<Uuid, Bet>,
}

/// Changes applied by a user update; the password arrives pre-hashed.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub balance: Option<Decimal>,
    pub is_admin: Option<bool>,
}

pub struct Db {
    pub(crate) tables: RwLock<Tables>,
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

impl Db {
    pub fn new() -> Self {
        Self { tables: RwLock::new(Tables::default()) }
    }

    // ===== SNAPSHOT PERSISTENCE =====

    /// Reload a JSON snapshot if one exists; otherwise start fresh.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<Tables>(&json) {
                Ok(tables) => {
                    tracing::info!(path = %path.display(), "loaded persisted state");
                    Self { tables: RwLock::new(tables) }
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "state file unreadable, starting fresh");
                    Self::new()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "no persisted state found, starting fresh");
                Self::new()
            }
        }
    }

    pub fn save_to_disk(&self, path: &Path) -> io::Result<()> {
        let tables = self.tables.read();
        let json = serde_json::to_string_pretty(&*tables)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "state saved to disk");
        Ok(())
    }

    // ===== USERS =====

    /// Insert a new user. The duplicate check and the insert share one
    /// lock acquisition, which is what turns a registration race into a
    /// plain Conflict instead of two rows.
    pub fn insert_user(&self, user: User) -> Result<User, ApiError> {
        let mut t = self.tables.write();
        if t.users.values().any(|u| u.username == user.username) {
            return Err(ApiError::Conflict("username already exists".into()));
        }
        if t.users.values().any(|u| u.email == user.email) {
            return Err(ApiError::Conflict("email already exists".into()));
        }
        t.users.insert(user.id, user.clone());
        tracing::info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub fn get_user(&self, id: Uuid) -> Result<User, ApiError> {
        self.tables
            .read()
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("user not found".into()))
    }

    pub fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.tables.read().users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        users
    }

    /// Authentication-only lookup; the returned record carries the hash.
    pub fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.tables.read().users.values().find(|u| u.username == username).cloned()
    }

    pub fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<User, ApiError> {
        let mut t = self.tables.write();
        if !t.users.contains_key(&id) {
            return Err(ApiError::NotFound("user not found".into()));
        }
        if let Some(username) = &changes.username {
            if t.users.values().any(|u| u.id != id && &u.username == username) {
                return Err(ApiError::Conflict("username already exists".into()));
            }
        }
        if let Some(email) = &changes.email {
            if t.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(ApiError::Conflict("email already exists".into()));
            }
        }
        let user = t.users.get_mut(&id).expect("checked above");
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = Some(hash);
        }
        if let Some(balance) = changes.balance {
            user.balance = balance;
        }
        if let Some(is_admin) = changes.is_admin {
            user.is_admin = is_admin;
        }
        Ok(user.clone())
    }

    pub fn remove_user(&self, id: Uuid) -> Result<(), ApiError> {
        let mut t = self.tables.write();
        t.users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound("user not found".into()))
    }

    // ===== TEAMS =====

    pub fn insert_team(&self, req: CreateTeamRequest) -> Result<Team, ApiError> {
        validate_team_name(&req.name)?;
        validate_tag(&req.tag)?;
        validate_country(&req.country)?;
        if let Some(year) = req.founded_year {
            validate_founded_year(year)?;
        }
        let total_earnings = money::ensure_non_negative("total_earnings", req.total_earnings.unwrap_or(Decimal::ZERO))?;

        let mut t = self.tables.write();
        if t.teams.values().any(|team| team.tag == req.tag) {
            return Err(ApiError::Conflict("team tag already exists".into()));
        }
        let team = Team {
            id: Uuid::new_v4(),
            name: req.name,
            tag: req.tag,
            country: req.country,
            logo_url: req.logo_url,
            founded_year: req.founded_year,
            total_earnings,
            created_at: Utc::now(),
        };
        t.teams.insert(team.id, team.clone());
        Ok(team)
    }

    pub fn get_team(&self, id: Uuid) -> Result<Team, ApiError> {
        self.tables
            .read()
            .teams
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("team not found".into()))
    }

    pub fn list_teams(&self) -> Vec<Team> {
        let mut teams: Vec<Team> = self.tables.read().teams.values().cloned().collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        teams
    }

    pub fn update_team(&self, id: Uuid, req: UpdateTeamRequest) -> Result<Team, ApiError> {
        if let Some(name) = &req.name {
            validate_team_name(name)?;
        }
        if let Some(tag) = &req.tag {
            validate_tag(tag)?;
        }
        if let Some(country) = &req.country {
            validate_country(country)?;
        }
        if let Some(year) = req.founded_year {
            validate_founded_year(year)?;
        }
        let total_earnings = req
            .total_earnings
            .map(|v| money::ensure_non_negative("total_earnings", v))
            .transpose()?;

        let mut t = self.tables.write();
        if !t.teams.contains_key(&id) {
            return Err(ApiError::NotFound("team not found".into()));
        }
        if let Some(tag) = &req.tag {
            if t.teams.values().any(|team| team.id != id && &team.tag == tag) {
                return Err(ApiError::Conflict("team tag already exists".into()));
            }
        }
        let team = t.teams.get_mut(&id).expect("checked above");
        if let Some(name) = req.name {
            team.name = name;
        }
        if let Some(tag) = req.tag {
            team.tag = tag;
        }
        if let Some(country) = req.country {
            team.country = country;
        }
        if let Some(logo_url) = req.logo_url {
            team.logo_url = Some(logo_url);
        }
        if let Some(year) = req.founded_year {
            team.founded_year = Some(year);
        }
        if let Some(earnings) = total_earnings {
            team.total_earnings = earnings;
        }
        Ok(team.clone())
    }

    pub fn remove_team(&self, id: Uuid) -> Result<(), ApiError> {
        let mut t = self.tables.write();
        t.teams
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound("team not found".into()))
    }

    // ===== GAMES =====

    pub fn insert_game(&self, req: CreateGameRequest) -> Result<Game, ApiError> {
        validate_game_name(&req.name)?;
        let game = Game {
            id: Uuid::new_v4(),
            name: req.name,
            category: req.category,
            created_at: Utc::now(),
        };
        self.tables.write().games.insert(game.id, game.clone());
        Ok(game)
    }

    pub fn get_game(&self, id: Uuid) -> Result<Game, ApiError> {
        self.tables
            .read()
            .games
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("game not found".into()))
    }

    pub fn list_games(&self) -> Vec<Game> {
        let mut games: Vec<Game> = self.tables.read().games.values().cloned().collect();
        games.sort_by(|a, b| a.name.cmp(&b.name));
        games
    }

    pub fn update_game(&self, id: Uuid, req: UpdateGameRequest) -> Result<Game, ApiError> {
        if let Some(name) = &req.name {
            validate_game_name(name)?;
        }
        let mut t = self.tables.write();
        let game = t
            .games
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("game not found".into()))?;
        if let Some(name) = req.name {
            game.name = name;
        }
        if let Some(category) = req.category {
            game.category = category;
        }
        Ok(game.clone())
    }

    pub fn remove_game(&self, id: Uuid) -> Result<(), ApiError> {
        let mut t = self.tables.write();
        t.games
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound("game not found".into()))
    }

    // ===== MATCHES =====

    pub fn insert_match(&self, req: CreateMatchRequest) -> Result<Match, ApiError> {
        if req.team1_id == req.team2_id {
            return Err(ApiError::BusinessRule("a match needs two distinct teams".into()));
        }
        let mut t = self.tables.write();
        if !t.teams.contains_key(&req.team1_id) || !t.teams.contains_key(&req.team2_id) {
            return Err(ApiError::NotFound("team not found".into()));
        }
        if !t.games.contains_key(&req.game_id) {
            return Err(ApiError::NotFound("game not found".into()));
        }
        let m = Match {
            id: Uuid::new_v4(),
            team1_id: req.team1_id,
            team2_id: req.team2_id,
            game_id: req.game_id,
            match_date: req.match_date,
            status: MatchStatus::Scheduled,
            team1_score: 0,
            team2_score: 0,
            winner_id: None,
            format: req.format,
            created_at: Utc::now(),
        };
        t.matches.insert(m.id, m.clone());
        tracing::info!(match_id = %m.id, "match created");
        Ok(m)
    }

    pub fn get_match(&self, id: Uuid) -> Result<Match, ApiError> {
        self.tables
            .read()
            .matches
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("match not found".into()))
    }

    pub fn list_matches(&self) -> Vec<Match> {
        let mut matches: Vec<Match> = self.tables.read().matches.values().cloned().collect();
        matches.sort_by_key(|m| m.created_at);
        matches
    }

    pub fn remove_match(&self, id: Uuid) -> Result<(), ApiError> {
        let mut t = self.tables.write();
        t.matches
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound("match not found".into()))
    }

    // ===== MATCH ODDS =====

    pub fn insert_match_odd(&self, req: CreateMatchOddRequest) -> Result<MatchOdd, ApiError> {
        let odds = money::ensure_valid_odds(req.odds)?;
        let mut t = self.tables.write();
        let m = t
            .matches
            .get(&req.match_id)
            .ok_or_else(|| ApiError::NotFound("match not found".into()))?;
        if !m.involves(req.team_id) {
            return Err(ApiError::BusinessRule("team is not part of this match".into()));
        }
        // One active odds record per (match, team); changes go through update.
        if t.match_odds
            .values()
            .any(|o| o.match_id == req.match_id && o.team_id == req.team_id)
        {
            return Err(ApiError::Conflict("odds already exist for this match and team".into()));
        }
        let now = Utc::now();
        let odd = MatchOdd {
            id: Uuid::new_v4(),
            match_id: req.match_id,
            team_id: req.team_id,
            odds,
            created_at: now,
            updated_at: now,
        };
        t.match_odds.insert(odd.id, odd.clone());
        Ok(odd)
    }

    pub fn get_match_odd(&self, id: Uuid) -> Result<MatchOdd, ApiError> {
        self.tables
            .read()
            .match_odds
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("match odd not found".into()))
    }

    pub fn list_match_odds(&self) -> Vec<MatchOdd> {
        let mut odds: Vec<MatchOdd> = self.tables.read().match_odds.values().cloned().collect();
        odds.sort_by_key(|o| o.created_at);
        odds
    }

    /// Update the quoted odds. Bets placed earlier keep the value they
    /// captured; nothing here reaches back into the bets table.
    pub fn update_match_odd(&self, id: Uuid, req: UpdateMatchOddRequest) -> Result<MatchOdd, ApiError> {
        let odds = money::ensure_valid_odds(req.odds)?;
        let mut t = self.tables.write();
        let odd = t
            .match_odds
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("match odd not found".into()))?;
        odd.odds = odds;
        odd.updated_at = Utc::now();
        Ok(odd.clone())
    }

    pub fn remove_match_odd(&self, id: Uuid) -> Result<(), ApiError> {
        let mut t = self.tables.write();
        t.match_odds
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound("match odd not found".into()))
    }

    // ===== BETS (reads; lifecycle lives in the betting engine) =====

    pub fn get_bet(&self, id: Uuid) -> Result<Bet, ApiError> {
        self.tables
            .read()
            .bets
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("bet not found".into()))
    }

    pub fn list_bets(&self) -> Vec<Bet> {
        let mut bets: Vec<Bet> = self.tables.read().bets.values().cloned().collect();
        bets.sort_by_key(|b| b.placed_at);
        bets
    }

    pub fn list_bets_for_user(&self, user_id: Uuid) -> Vec<Bet> {
        let mut bets: Vec<Bet> = self
            .tables
            .read()
            .bets
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bets.sort_by_key(|b| b.placed_at);
        bets
    }

    pub fn remove_bet(&self, id: Uuid) -> Result<(), ApiError> {
        let mut t = self.tables.write();
        t.bets
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound("bet not found".into()))
    }
}

// ===== FIELD VALIDATION =====

fn validate_team_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > 100 {
        return Err(ApiError::Validation("team name must be 1-100 characters".into()));
    }
    Ok(())
}

fn validate_game_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > 100 {
        return Err(ApiError::Validation("game name must be 1-100 characters".into()));
    }
    Ok(())
}

fn validate_tag(tag: &str) -> Result<(), ApiError> {
    let ok = (2..=5).contains(&tag.len()) && tag.chars().all(|c| c.is_ascii_uppercase());
    if !ok {
        return Err(ApiError::Validation("tag must be 2-5 uppercase letters".into()));
    }
    Ok(())
}

fn validate_country(country: &str) -> Result<(), ApiError> {
    let ok = (2..=3).contains(&country.len()) && country.chars().all(|c| c.is_ascii_uppercase());
    if !ok {
        return Err(ApiError::Validation("country must be a 2-3 letter uppercase code".into()));
    }
    Ok(())
}

fn validate_founded_year(year: i32) -> Result<(), ApiError> {
    let current = Utc::now().year();
    if !(1970..=current).contains(&year) {
        return Err(ApiError::Validation(format!("founded_year must be between 1970 and {current}")));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{GameCategory, MatchFormat};
    use rust_decimal_macros::dec;

    fn new_user(name: &str, email: &str) -> User {
        User::new(name.into(), email.into(), None, dec!(100))
    }

    #[test]
    fn duplicate_username_and_email_conflict() {
        let db = Db::new();
        db.insert_user(new_user("alice", "alice@example.com")).unwrap();

        let err = db.insert_user(new_user("alice", "other@example.com")).unwrap_err();
        assert_eq!(err, ApiError::Conflict("username already exists".into()));

        let err = db.insert_user(new_user("bob", "alice@example.com")).unwrap_err();
        assert_eq!(err, ApiError::Conflict("email already exists".into()));
    }

    #[test]
    fn update_user_rejects_collisions_with_other_users() {
        let db = Db::new();
        let alice = db.insert_user(new_user("alice", "alice@example.com")).unwrap();
        db.insert_user(new_user("bob", "bob@example.com")).unwrap();

        let err = db
            .update_user(alice.id, UserChanges { username: Some("bob".into()), ..Default::default() })
            .unwrap_err();
        assert_eq!(err.code(), "conflict");

        // Re-saving your own username is not a collision.
        let same = db
            .update_user(alice.id, UserChanges { username: Some("alice".into()), ..Default::default() })
            .unwrap();
        assert_eq!(same.username, "alice");

        let err = db
            .update_user(Uuid::new_v4(), UserChanges::default())
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn team_tag_is_unique_and_validated() {
        let db = Db::new();
        db.insert_team(CreateTeamRequest {
            name: "Team Liquid".into(),
            tag: "TL".into(),
            country: "US".into(),
            logo_url: None,
            founded_year: Some(2000),
            total_earnings: Some(dec!(500000.50)),
        })
        .unwrap();

        let err = db
            .insert_team(CreateTeamRequest {
                name: "Liquid Clone".into(),
                tag: "TL".into(),
                country: "FR".into(),
                logo_url: None,
                founded_year: None,
                total_earnings: None,
            })
            .unwrap_err();
        assert_eq!(err.code(), "conflict");

        let err = db
            .insert_team(CreateTeamRequest {
                name: "Bad Tag".into(),
                tag: "toolong".into(),
                country: "US".into(),
                logo_url: None,
                founded_year: None,
                total_earnings: None,
            })
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn match_requires_two_distinct_existing_teams() {
        let db = Db::new();
        let t1 = db
            .insert_team(CreateTeamRequest {
                name: "Fnatic".into(),
                tag: "FNC".into(),
                country: "EU".into(),
                logo_url: None,
                founded_year: None,
                total_earnings: None,
            })
            .unwrap();
        let game = db
            .insert_game(CreateGameRequest { name: "Counter-Strike 2".into(), category: GameCategory::Fps })
            .unwrap();

        let err = db
            .insert_match(CreateMatchRequest {
                team1_id: t1.id,
                team2_id: t1.id,
                game_id: game.id,
                match_date: None,
                format: MatchFormat::Bo3,
            })
            .unwrap_err();
        assert_eq!(err.code(), "business_rule_violation");

        let err = db
            .insert_match(CreateMatchRequest {
                team1_id: t1.id,
                team2_id: Uuid::new_v4(),
                game_id: game.id,
                match_date: None,
                format: MatchFormat::Bo3,
            })
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn one_odds_record_per_match_and_team() {
        let db = Db::new();
        let (m, _, _) = fixtures(&db);

        db.insert_match_odd(CreateMatchOddRequest { match_id: m.id, team_id: m.team1_id, odds: dec!(1.85) })
            .unwrap();
        let err = db
            .insert_match_odd(CreateMatchOddRequest { match_id: m.id, team_id: m.team1_id, odds: dec!(2.00) })
            .unwrap_err();
        assert_eq!(err.code(), "conflict");

        // The other side of the match is still free.
        db.insert_match_odd(CreateMatchOddRequest { match_id: m.id, team_id: m.team2_id, odds: dec!(2.10) })
            .unwrap();
    }

    #[test]
    fn odds_must_reference_a_participating_team() {
        let db = Db::new();
        let (m, _, _) = fixtures(&db);
        let outsider = db
            .insert_team(CreateTeamRequest {
                name: "Cloud9".into(),
                tag: "CNN".into(),
                country: "US".into(),
                logo_url: None,
                founded_year: None,
                total_earnings: None,
            })
            .unwrap();

        let err = db
            .insert_match_odd(CreateMatchOddRequest { match_id: m.id, team_id: outsider.id, odds: dec!(1.50) })
            .unwrap_err();
        assert_eq!(err.code(), "business_rule_violation");
    }

    #[test]
    fn snapshot_round_trips() {
        let dir = std::env::temp_dir().join(format!("betis-store-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("state.json");

        let db = Db::new();
        let user = db.insert_user(new_user("alice", "alice@example.com")).unwrap();
        db.save_to_disk(&path).unwrap();

        let reloaded = Db::load_or_default(&path);
        let back = reloaded.get_user(user.id).unwrap();
        assert_eq!(back.username, "alice");
        assert_eq!(back.balance, dec!(100));

        std::fs::remove_dir_all(&dir).ok();
    }

    /// One scheduled match between two fresh teams, plus the game.
    pub(crate) fn fixtures(db: &Db) -> (Match, Team, Team) {
        let t1 = db
            .insert_team(CreateTeamRequest {
                name: "G2 Esports".into(),
                tag: "GG".into(),
                country: "EU".into(),
                logo_url: None,
                founded_year: Some(2014),
                total_earnings: None,
            })
            .unwrap();
        let t2 = db
            .insert_team(CreateTeamRequest {
                name: "T1".into(),
                tag: "TL".into(),
                country: "KR".into(),
                logo_url: None,
                founded_year: Some(2004),
                total_earnings: None,
            })
            .unwrap();
        let game = db
            .insert_game(CreateGameRequest {
                name: "League of Legends".into(),
                category: GameCategory::Moba,
            })
            .unwrap();
        let m = db
            .insert_match(CreateMatchRequest {
                team1_id: t1.id,
                team2_id: t2.id,
                game_id: game.id,
                match_date: None,
                format: MatchFormat::Bo5,
            })
            .unwrap();
        (m, t1, t2)
    }
}
