//! Jackpot configuration types and their validation.
//!
//! Percentages are expressed in basis points: [`POINTS_SCALE`] is 100%.

use soroban_sdk::{contracttype, BytesN};

use crate::JackpotError;

/// 100% expressed in points.
pub const POINTS_SCALE: u32 = 10_000;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReelConfig {
    pub items_per_reel: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrizeConfig {
    /// Share of the pool paid on a mini prize.
    pub mini_prize_points: u32,
    /// Share of the pool paid on a mega prize.
    pub mega_prize_points: u32,
    /// Share of the pool burned whenever a prize is paid.
    pub burn_points: u32,
}

/// Parameters forwarded with every randomness request.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OracleConfig {
    pub key_hash: BytesN<32>,
    pub subscription_id: u64,
    pub request_confirmations: u32,
    pub callback_gas_limit: u32,
}

/// Snapshot of everything a caller needs to price and interpret a spin.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JackpotConfig {
    pub cost_per_spin: i128,
    pub reel: ReelConfig,
    pub prize: PrizeConfig,
    pub oracle: OracleConfig,
}

impl ReelConfig {
    pub fn validate(&self) -> Result<(), JackpotError> {
        if self.items_per_reel == 0 {
            return Err(JackpotError::InvalidConfiguration);
        }
        Ok(())
    }
}

impl PrizeConfig {
    /// `mini + mega + burn` must fit in [`POINTS_SCALE`]; the remainder stays in the pool.
    pub fn validate(&self) -> Result<(), JackpotError> {
        let total = self
            .mini_prize_points
            .checked_add(self.mega_prize_points)
            .and_then(|t| t.checked_add(self.burn_points))
            .ok_or(JackpotError::InvalidConfiguration)?;
        if total > POINTS_SCALE {
            return Err(JackpotError::InvalidConfiguration);
        }
        Ok(())
    }
}

impl OracleConfig {
    pub fn validate(&self) -> Result<(), JackpotError> {
        if self.request_confirmations == 0 || self.callback_gas_limit == 0 {
            return Err(JackpotError::InvalidConfiguration);
        }
        Ok(())
    }
}

pub fn validate_cost(cost_per_spin: i128) -> Result<(), JackpotError> {
    if cost_per_spin <= 0 {
        return Err(JackpotError::InvalidConfiguration);
    }
    Ok(())
}
