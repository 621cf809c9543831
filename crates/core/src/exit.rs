//! Exit rules for open positions.

use crate::position::{Position, PositionStatus, Side};

/// A price reading as seen by the exit rules.
///
/// Quote sources report `0.0` for symbols they have never observed, so raw
/// readings are classified before they reach any comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quote {
    Price(f64),
    Unknown,
}

impl Quote {
    /// Classifies a raw reading. Zero, negative, and non-finite values are
    /// `Unknown`.
    #[must_use]
    pub fn from_raw(raw: f64) -> Self {
        if raw.is_finite() && raw > 0.0 {
            Self::Price(raw)
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub const fn price(&self) -> Option<f64> {
        match self {
            Self::Price(p) => Some(*p),
            Self::Unknown => None,
        }
    }
}

/// Outcome of evaluating one position against one price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    Hold,
    StopLossHit,
    TargetHit,
}

impl ExitDecision {
    /// Status to persist for this decision, if any.
    #[must_use]
    pub const fn status(&self) -> Option<PositionStatus> {
        match self {
            Self::Hold => None,
            Self::StopLossHit => Some(PositionStatus::StopLossHit),
            Self::TargetHit => Some(PositionStatus::TargetHit),
        }
    }
}

/// Evaluates exit conditions for a position at `price`.
///
/// Stop-loss is checked first, so a tick that crosses both thresholds
/// resolves to `StopLossHit`. Positions that are not `Open` always hold.
#[must_use]
pub fn evaluate_exit(position: &Position, price: f64) -> ExitDecision {
    if position.status != PositionStatus::Open {
        return ExitDecision::Hold;
    }

    let (stop_hit, target_hit) = match position.side {
        Side::Buy => (price <= position.stop_loss, price >= position.target),
        Side::Sell => (price >= position.stop_loss, price <= position.target),
    };

    if stop_hit {
        ExitDecision::StopLossHit
    } else if target_hit {
        ExitDecision::TargetHit
    } else {
        ExitDecision::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn position(side: Side, entry: f64, stop_loss: f64, target: f64) -> Position {
        Position {
            id: 1,
            signal_id: 1,
            symbol: "BTCUSD".to_string(),
            side,
            entry_price: entry,
            stop_loss,
            target,
            status: PositionStatus::Open,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn buy_stop_loss_is_inclusive() {
        let pos = position(Side::Buy, 50_000.0, 49_000.0, 55_000.0);
        assert_eq!(evaluate_exit(&pos, 50_010.0), ExitDecision::Hold);
        assert_eq!(evaluate_exit(&pos, 49_000.0), ExitDecision::StopLossHit);
        assert_eq!(evaluate_exit(&pos, 48_000.0), ExitDecision::StopLossHit);
    }

    #[test]
    fn buy_target_is_inclusive() {
        let pos = position(Side::Buy, 50_000.0, 49_000.0, 55_000.0);
        assert_eq!(evaluate_exit(&pos, 55_000.0), ExitDecision::TargetHit);
        assert_eq!(evaluate_exit(&pos, 60_000.0), ExitDecision::TargetHit);
    }

    #[test]
    fn sell_rules_are_mirrored() {
        let pos = position(Side::Sell, 3_100.0, 3_200.0, 2_800.0);
        assert_eq!(evaluate_exit(&pos, 3_150.0), ExitDecision::Hold);
        assert_eq!(evaluate_exit(&pos, 3_200.0), ExitDecision::StopLossHit);
        assert_eq!(evaluate_exit(&pos, 2_800.0), ExitDecision::TargetHit);
        assert_eq!(evaluate_exit(&pos, 2_500.0), ExitDecision::TargetHit);
    }

    #[test]
    fn stop_loss_wins_when_both_cross() {
        // Inverted thresholds make both conditions true at once.
        let buy = position(Side::Buy, 50_000.0, 56_000.0, 55_000.0);
        assert_eq!(evaluate_exit(&buy, 55_500.0), ExitDecision::StopLossHit);

        let sell = position(Side::Sell, 3_100.0, 2_700.0, 2_800.0);
        assert_eq!(evaluate_exit(&sell, 2_750.0), ExitDecision::StopLossHit);
    }

    #[test]
    fn terminal_positions_always_hold() {
        let mut pos = position(Side::Buy, 50_000.0, 49_000.0, 55_000.0);
        pos.status = PositionStatus::Closed;
        assert_eq!(evaluate_exit(&pos, 1.0), ExitDecision::Hold);
        pos.status = PositionStatus::TargetHit;
        assert_eq!(evaluate_exit(&pos, 1.0), ExitDecision::Hold);
    }

    #[test]
    fn zero_and_garbage_quotes_are_unknown() {
        assert_eq!(Quote::from_raw(0.0), Quote::Unknown);
        assert_eq!(Quote::from_raw(-3.0), Quote::Unknown);
        assert_eq!(Quote::from_raw(f64::NAN), Quote::Unknown);
        assert_eq!(Quote::from_raw(f64::INFINITY), Quote::Unknown);
        assert_eq!(Quote::from_raw(68_000.0).price(), Some(68_000.0));
    }

    #[test]
    fn decisions_map_to_terminal_statuses() {
        assert_eq!(ExitDecision::Hold.status(), None);
        assert_eq!(
            ExitDecision::StopLossHit.status(),
            Some(PositionStatus::StopLossHit)
        );
        assert_eq!(
            ExitDecision::TargetHit.status(),
            Some(PositionStatus::TargetHit)
        );
    }
}
