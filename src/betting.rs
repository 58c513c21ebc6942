// Bet lifecycle engine and the match state machine that drives it.
//
// Placement, settlement and cancellation each run under one store write
// lock, so the balance check and the debit (or credit) are a single
// atomic step; two concurrent bets cannot both pass a stale balance
// check and jointly overdraw.

use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Bet, BetStatus, CreateBetRequest, Match, MatchStatus, UpdateMatchRequest};
use crate::money;
use crate::store::{Db, Tables};

impl Db {
    /// Place a bet. Preconditions, in order: the match exists and is
    /// still SCHEDULED, the backed team plays in it, the stake is
    /// positive, an active odds record exists for (match, team), the
    /// client's quoted odds are not stale, and the user can cover the
    /// stake. The stake is debited here; the potential payout is
    /// computed once from the stored odds and never recalculated.
    pub fn place_bet(&self, req: CreateBetRequest) -> Result<Bet, ApiError> {
        if req.potential_payout.is_some() {
            return Err(ApiError::Validation("potential_payout is computed by the server".into()));
        }
        let amount = money::ensure_positive_amount(req.amount)?;

        let mut t = self.tables.write();

        let m = t
            .matches
            .get(&req.match_id)
            .ok_or_else(|| ApiError::NotFound("match not found".into()))?;
        if m.status != MatchStatus::Scheduled {
            return Err(ApiError::BusinessRule("betting is only open while the match is scheduled".into()));
        }
        if !m.involves(req.team_id) {
            return Err(ApiError::BusinessRule("team is not part of this match".into()));
        }

        let odds = t
            .match_odds
            .values()
            .find(|o| o.match_id == req.match_id && o.team_id == req.team_id)
            .map(|o| o.odds)
            .ok_or_else(|| ApiError::NotFound("no odds available for this match and team".into()))?;
        if req.odds != odds {
            return Err(ApiError::BusinessRule("odds have changed since they were quoted".into()));
        }

        let user = t
            .users
            .get_mut(&req.user_id)
            .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
        if user.balance < amount {
            return Err(ApiError::BusinessRule("insufficient balance".into()));
        }
        user.balance -= amount;
        user.total_bet += amount;

        let bet = Bet {
            id: Uuid::new_v4(),
            user_id: req.user_id,
            match_id: req.match_id,
            team_id: req.team_id,
            amount,
            odds,
            potential_payout: money::potential_payout(amount, odds),
            status: BetStatus::Pending,
            placed_at: Utc::now(),
        };
        t.bets.insert(bet.id, bet.clone());
        tracing::info!(
            bet_id = %bet.id,
            user_id = %bet.user_id,
            match_id = %bet.match_id,
            amount = %bet.amount,
            odds = %bet.odds,
            payout = %bet.potential_payout,
            "bet placed"
        );
        Ok(bet)
    }

    /// Administrative match update. Score/date/format changes apply to
    /// any non-terminal match; a status change must follow the state
    /// machine. Entering COMPLETED validates the winner and settles all
    /// pending bets in the same lock; entering CANCELLED cascades a
    /// refund-cancel over them. Terminal states reject every further
    /// transition, so settlement cannot run twice for a match.
    pub fn update_match(&self, id: Uuid, req: UpdateMatchRequest) -> Result<Match, ApiError> {
        let mut t = self.tables.write();

        let current = t
            .matches
            .get(&id)
            .ok_or_else(|| ApiError::NotFound("match not found".into()))?
            .clone();

        if req.winner_id.is_some() && req.status != Some(MatchStatus::Completed) {
            return Err(ApiError::BusinessRule("winner can only be set when completing the match".into()));
        }
        if req.status.is_none() && current.status.is_terminal() && (req.team1_score.is_some() || req.team2_score.is_some()) {
            return Err(ApiError::BusinessRule("scores are frozen once the match is over".into()));
        }
        if let Some(next) = req.status {
            validate_transition(current.status, next)?;
            if next == MatchStatus::Completed {
                let winner = req
                    .winner_id
                    .ok_or_else(|| ApiError::BusinessRule("completing a match requires a winner".into()))?;
                if !current.involves(winner) {
                    return Err(ApiError::BusinessRule("winner must be one of the match's teams".into()));
                }
            }
        }

        // Checks done; everything below is infallible, so a rejected
        // update leaves the record untouched.
        let m = t.matches.get_mut(&id).expect("checked above");
        if let Some(score) = req.team1_score {
            m.team1_score = score;
        }
        if let Some(score) = req.team2_score {
            m.team2_score = score;
        }
        if let Some(date) = req.match_date {
            m.match_date = Some(date);
        }
        if let Some(format) = req.format {
            m.format = format;
        }

        match req.status {
            Some(MatchStatus::Completed) => {
                let winner = req.winner_id.expect("validated above");
                m.status = MatchStatus::Completed;
                m.winner_id = Some(winner);
                tracing::info!(match_id = %id, winner_id = %winner, "match completed, settling bets");
                settle_pending_bets(&mut t, id, winner);
            }
            Some(MatchStatus::Cancelled) => {
                m.status = MatchStatus::Cancelled;
                tracing::info!(match_id = %id, "match cancelled, refunding pending bets");
                cancel_pending_bets(&mut t, id);
            }
            Some(next) => {
                m.status = next;
                tracing::info!(match_id = %id, status = ?next, "match status updated");
            }
            None => {}
        }

        Ok(t.matches.get(&id).expect("checked above").clone())
    }

    /// Administrative cancellation of a single bet. Only PENDING bets
    /// qualify; the stake is refunded because the bettor never got a
    /// fair win-or-lose outcome.
    pub fn cancel_bet(&self, id: Uuid) -> Result<Bet, ApiError> {
        let mut t = self.tables.write();
        let bet = t
            .bets
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("bet not found".into()))?;
        if bet.status != BetStatus::Pending {
            return Err(ApiError::BusinessRule("only pending bets can be cancelled".into()));
        }
        bet.status = BetStatus::Cancelled;
        let refunded = bet.clone();
        if let Some(user) = t.users.get_mut(&refunded.user_id) {
            user.balance += refunded.amount;
        }
        tracing::info!(bet_id = %id, user_id = %refunded.user_id, amount = %refunded.amount, "bet cancelled, stake refunded");
        Ok(refunded)
    }
}

fn validate_transition(from: MatchStatus, to: MatchStatus) -> Result<(), ApiError> {
    use MatchStatus::*;
    let allowed = matches!(
        (from, to),
        (Scheduled, Live) | (Live, Completed) | (Scheduled, Cancelled) | (Live, Cancelled)
    );
    if !allowed {
        return Err(ApiError::BusinessRule(format!(
            "cannot transition match from {from:?} to {to:?}"
        )));
    }
    Ok(())
}

/// Resolve every PENDING bet on the match: backers of the winner get
/// their frozen potential payout credited and total_won bumped, the
/// rest move to LOST with no balance change. Only PENDING bets are
/// considered, which is what makes re-running this harmless.
fn settle_pending_bets(t: &mut Tables, match_id: Uuid, winner_id: Uuid) {
    let pending: Vec<Uuid> = t
        .bets
        .values()
        .filter(|b| b.match_id == match_id && b.status == BetStatus::Pending)
        .map(|b| b.id)
        .collect();

    for bet_id in pending {
        let bet = t.bets.get_mut(&bet_id).expect("collected above");
        if bet.team_id == winner_id {
            bet.status = BetStatus::Won;
            let payout = bet.potential_payout;
            let user_id = bet.user_id;
            match t.users.get_mut(&user_id) {
                Some(user) => {
                    user.balance += payout;
                    user.total_won += payout;
                    tracing::info!(bet_id = %bet_id, user_id = %user_id, payout = %payout, "bet won");
                }
                None => {
                    tracing::warn!(bet_id = %bet_id, user_id = %user_id, "winning bettor no longer exists, payout dropped");
                }
            }
        } else {
            bet.status = BetStatus::Lost;
            tracing::info!(bet_id = %bet_id, "bet lost");
        }
    }
}

/// Cascade for a cancelled match: every PENDING bet is cancelled and
/// its stake refunded.
fn cancel_pending_bets(t: &mut Tables, match_id: Uuid) {
    let pending: Vec<Uuid> = t
        .bets
        .values()
        .filter(|b| b.match_id == match_id && b.status == BetStatus::Pending)
        .map(|b| b.id)
        .collect();

    for bet_id in pending {
        let bet = t.bets.get_mut(&bet_id).expect("collected above");
        bet.status = BetStatus::Cancelled;
        let amount = bet.amount;
        let user_id = bet.user_id;
        if let Some(user) = t.users.get_mut(&user_id) {
            user.balance += amount;
        }
        tracing::info!(bet_id = %bet_id, user_id = %user_id, amount = %amount, "bet cancelled with match, stake refunded");
    }
}
