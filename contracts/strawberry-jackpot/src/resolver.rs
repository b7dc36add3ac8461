//! Random word → outcome mapping.
//!
//! Two values are derived from a single 256-bit word:
//!
//! - `symbol = word mod items_per_reel`, the reel position shown to players.
//!   Modulo reduction is slightly biased unless `items_per_reel` divides
//!   2^256; with reels of a few dozen items the bias is below 2^-250 and is
//!   accepted.
//! - `roll = (word / items_per_reel) mod POINTS_SCALE`, which picks the prize
//!   band. Because the band widths are the configured points and the roll
//!   space is exactly [`POINTS_SCALE`], realized odds equal configured odds
//!   with no rounding.
//!
//! Bands: `[0, mega)` is MegaPrize, `[mega, mega + mini)` is MiniPrize,
//! everything above is NoPrize.

use soroban_sdk::{contracttype, Env, U256};

use crate::config::{PrizeConfig, ReelConfig, POINTS_SCALE};

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Outcome {
    NoPrize = 0,
    MiniPrize = 1,
    MegaPrize = 2,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub symbol: u32,
    pub roll: u32,
}

pub fn resolve(env: &Env, word: &U256, reel: &ReelConfig, prize: &PrizeConfig) -> Resolution {
    let items = U256::from_u32(env, reel.items_per_reel);
    let scale = U256::from_u32(env, POINTS_SCALE);

    // Both remainders are strictly below a u32 bound, so the conversion cannot fail.
    let symbol = word.rem_euclid(&items).to_u128().unwrap_or_default() as u32;
    let roll = word
        .div(&items)
        .rem_euclid(&scale)
        .to_u128()
        .unwrap_or_default() as u32;

    Resolution {
        outcome: band(roll, prize),
        symbol,
        roll,
    }
}

fn band(roll: u32, prize: &PrizeConfig) -> Outcome {
    let mega_end = prize.mega_prize_points;
    let mini_end = mega_end.saturating_add(prize.mini_prize_points);
    if roll < mega_end {
        Outcome::MegaPrize
    } else if roll < mini_end {
        Outcome::MiniPrize
    } else {
        Outcome::NoPrize
    }
}
