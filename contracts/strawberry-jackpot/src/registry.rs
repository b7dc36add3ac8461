//! Pending spin table.
//!
//! Entries are only ever added by [`register`] and only ever removed by
//! [`consume`]. Entries are kept in persistent storage because a request can
//! stay pending for as long as the oracle takes to answer.
//!
//! The table also keeps the sum of pending stakes ([`escrowed`]). That part
//! of the pool belongs to spins that have not settled and is never paid out
//! as a prize.

use soroban_sdk::{contracttype, Address, Env};

use crate::config::{PrizeConfig, ReelConfig};
use crate::{JackpotError, StorageKey, SPIN_TTL_LEDGERS};

/// One paid spin waiting for randomness. Carries the configuration that was
/// active when it was paid for.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpinRequest {
    pub request_id: u64,
    pub participant: Address,
    pub stake: i128,
    pub created_at: u64,
    pub reel: ReelConfig,
    pub prize: PrizeConfig,
}

pub fn register(env: &Env, spin: &SpinRequest) -> Result<(), JackpotError> {
    let key = StorageKey::Spin(spin.request_id);
    if env.storage().persistent().has(&key) {
        return Err(JackpotError::DuplicateRequestId);
    }
    env.storage().persistent().set(&key, spin);
    env.storage()
        .persistent()
        .extend_ttl(&key, SPIN_TTL_LEDGERS, SPIN_TTL_LEDGERS);

    let escrow = escrowed(env)
        .checked_add(spin.stake)
        .ok_or(JackpotError::Overflow)?;
    env.storage().instance().set(&StorageKey::Escrowed, &escrow);

    let count = pending_count(env);
    env.storage()
        .instance()
        .set(&StorageKey::PendingCount, &count.saturating_add(1));
    Ok(())
}

pub fn consume(env: &Env, request_id: u64) -> Result<SpinRequest, JackpotError> {
    let key = StorageKey::Spin(request_id);
    let spin: SpinRequest = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(JackpotError::UnknownRequest)?;
    env.storage().persistent().remove(&key);

    let escrow = escrowed(env)
        .checked_sub(spin.stake)
        .filter(|left| *left >= 0)
        .ok_or(JackpotError::Overflow)?;
    env.storage().instance().set(&StorageKey::Escrowed, &escrow);

    let count = pending_count(env);
    env.storage()
        .instance()
        .set(&StorageKey::PendingCount, &count.saturating_sub(1));
    Ok(spin)
}

pub fn get(env: &Env, request_id: u64) -> Option<SpinRequest> {
    env.storage().persistent().get(&StorageKey::Spin(request_id))
}

pub fn pending_count(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&StorageKey::PendingCount)
        .unwrap_or(0)
}

/// Sum of the stakes of every pending spin.
pub fn escrowed(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&StorageKey::Escrowed)
        .unwrap_or(0)
}
