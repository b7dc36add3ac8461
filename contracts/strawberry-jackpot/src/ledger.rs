//! Pool accounting. Prize and burn amounts are shares of the pool held at
//! settlement time, not of the stake that triggered the spin. Stakes of other
//! spins that are still pending are held back (see [`prize_base`]).

use crate::config::{PrizeConfig, POINTS_SCALE};
use crate::resolver::Outcome;
use crate::JackpotError;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settlement {
    pub payout: i128,
    pub burned: i128,
}

impl Settlement {
    pub fn total(&self) -> Result<i128, JackpotError> {
        self.payout
            .checked_add(self.burned)
            .ok_or(JackpotError::Overflow)
    }
}

/// Size the payout and burn for `outcome` against `pool`.
///
/// Rejects with `InsufficientPool` rather than truncating when the amounts
/// would exceed the pool.
pub fn settle(pool: i128, outcome: Outcome, prize: &PrizeConfig) -> Result<Settlement, JackpotError> {
    let tier_points = match outcome {
        Outcome::NoPrize => {
            return Ok(Settlement {
                payout: 0,
                burned: 0,
            })
        }
        Outcome::MiniPrize => prize.mini_prize_points,
        Outcome::MegaPrize => prize.mega_prize_points,
    };

    let settlement = Settlement {
        payout: share(pool, tier_points)?,
        burned: share(pool, prize.burn_points)?,
    };
    if settlement.total()? > pool {
        return Err(JackpotError::InsufficientPool);
    }
    Ok(settlement)
}

/// Part of `pool` a settlement may draw on once `reserved` (the stakes of
/// other pending spins) is set aside.
pub fn prize_base(pool: i128, reserved: i128) -> Result<i128, JackpotError> {
    if reserved < 0 {
        return Err(JackpotError::InvalidAmount);
    }
    pool.checked_sub(reserved)
        .filter(|base| *base >= 0)
        .ok_or(JackpotError::InsufficientPool)
}

/// Pool left after paying out `settlement`.
pub fn debit(pool: i128, settlement: &Settlement) -> Result<i128, JackpotError> {
    let total = settlement.total()?;
    if total > pool {
        return Err(JackpotError::InsufficientPool);
    }
    Ok(pool - total)
}

pub fn credit(pool: i128, amount: i128) -> Result<i128, JackpotError> {
    if amount <= 0 {
        return Err(JackpotError::InvalidAmount);
    }
    pool.checked_add(amount).ok_or(JackpotError::Overflow)
}

fn share(pool: i128, points: u32) -> Result<i128, JackpotError> {
    if pool < 0 {
        return Err(JackpotError::InsufficientPool);
    }
    pool.checked_mul(points as i128)
        .map(|v| v / POINTS_SCALE as i128)
        .ok_or(JackpotError::Overflow)
}
