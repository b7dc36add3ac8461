#![no_std]
#![allow(clippy::too_many_arguments)]

//! # Strawberry Jackpot
//!
//! A token-funded slot machine settled by verifiable randomness.
//!
//! ## Spin flow
//! 1. A participant approves the jackpot for at least `cost_per_spin` of the
//!    payment token and calls `spin`.
//! 2. The stake is pulled into the pool, one random word is requested from
//!    the VRF coordinator and the spin is registered under the returned
//!    request id together with a snapshot of the reel and prize settings.
//! 3. In a later transaction the coordinator calls `fulfill_random_words`.
//!    The pending spin is consumed first, the word is resolved into an
//!    outcome and the prize is paid from the pool.
//!
//! ## Prizes
//! Mini and mega prizes pay `mini_prize_points` / `mega_prize_points` of the
//! pool (basis points, see [`POINTS_SCALE`]) and burn `burn_points` of the
//! pool on top. A spin that wins nothing leaves its stake in the pool.
//!
//! Stakes of spins that are still pending count towards the pool but are
//! held back when a prize is sized, so every pending spin can always be
//! refunded by `cancel_spin`.
//!
//! Settings changed by the admin only affect spins placed afterwards. Pausing
//! stops new spins but pending ones still settle.
//!
//! ## Funding
//! `fund_pool` is the accounted way to add prize money. Tokens sent to the
//! contract with a plain token `transfer` are not seen until the admin calls
//! `sync_pool`, which sets the pool to the contract's token balance.

mod config;
mod ledger;
mod registry;
mod resolver;

pub use config::{JackpotConfig, OracleConfig, PrizeConfig, ReelConfig, POINTS_SCALE};
pub use ledger::Settlement;
pub use registry::SpinRequest;
pub use resolver::{Outcome, Resolution};

use soroban_sdk::{
    contract, contractclient, contracterror, contractevent, contractimpl, contracttype, log,
    panic_with_error, token, Address, BytesN, Env, Vec, U256,
};

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvSpinInitiated {
    pub participant: Address,
    pub request_id: u64,
    pub stake: i128,
}

#[contractevent]
pub struct EvOutcomeSettled {
    pub participant: Address,
    pub request_id: u64,
    pub outcome: Outcome,
    pub symbol: u32,
    pub payout: i128,
    pub burned: i128,
}

/// Emitted when the admin refunds a spin the oracle never answered.
#[contractevent]
pub struct EvSpinCancelled {
    pub participant: Address,
    pub request_id: u64,
    pub refund: i128,
}

#[contractevent]
pub struct EvPoolFunded {
    pub funder: Address,
    pub amount: i128,
    pub pool: i128,
}

#[contractevent]
pub struct EvPoolSynced {
    pub previous: i128,
    pub pool: i128,
}

#[contractevent]
pub struct EvAdminChanged {
    pub previous: Address,
    pub admin: Address,
}

#[contractevent]
pub struct EvPauseChanged {
    pub paused: bool,
}

#[contractevent]
pub struct EvConfigUpdated {
    pub cost_per_spin: i128,
    pub items_per_reel: u32,
    pub mini_prize_points: u32,
    pub mega_prize_points: u32,
    pub burn_points: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  External trait interfaces
// ═══════════════════════════════════════════════════════════════════════════════

/// Randomness oracle. Answers each request later by calling
/// `fulfill_random_words` on the consumer.
#[contractclient(name = "VrfCoordinatorClient")]
pub trait VrfCoordinator {
    fn request_random_words(
        env: Env,
        consumer: Address,
        key_hash: BytesN<32>,
        subscription_id: u64,
        minimum_confirmations: u32,
        callback_gas_limit: u32,
        num_words: u32,
    ) -> u64;
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum JackpotError {
    Paused = 1,
    InsufficientStake = 2,
    UnauthorizedCaller = 3,
    UnknownRequest = 4,
    InsufficientPool = 5,
    InvalidConfiguration = 6,
    DuplicateRequestId = 7,
    TransferFailed = 8,
    MissingRandomWords = 9,
    InvalidAmount = 10,
    Overflow = 11,
    NotInitialized = 12,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  State & storage keys
// ═══════════════════════════════════════════════════════════════════════════════

/// Settled spin, kept so outcomes can be looked up by request id.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpinResult {
    pub participant: Address,
    pub outcome: Outcome,
    pub symbol: u32,
    pub payout: i128,
    pub burned: i128,
    pub settled_at: u64,
}

#[contracttype]
#[derive(Clone)]
pub(crate) enum StorageKey {
    Admin,
    Coordinator,
    Token,
    Config,
    Pool,
    Paused,
    PendingCount,
    /// Sum of pending stakes
    Escrowed,
    /// Pending spin: StorageKey::Spin(request_id) → SpinRequest
    Spin(u64),
    /// Settled spin: StorageKey::Settled(request_id) → SpinResult
    Settled(u64),
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Random words requested per spin.
const NUM_WORDS: u32 = 1;

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// Instance storage (config, pool, admin): 30 days
const INSTANCE_TTL_SECONDS: u32 = 30 * 24 * 60 * 60;
const INSTANCE_TTL_LEDGERS: u32 = INSTANCE_TTL_SECONDS / LEDGER_RATE_SECS; // 518,400 ledgers

// Pending spins and results: 120 days
const SPIN_TTL_SECONDS: u32 = 120 * 24 * 60 * 60;
pub(crate) const SPIN_TTL_LEDGERS: u32 = SPIN_TTL_SECONDS / LEDGER_RATE_SECS; // 2,073,600 ledgers

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct StrawberryJackpot;

#[contractimpl]
impl StrawberryJackpot {
    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Constructor
    // ───────────────────────────────────────────────────────────────────────────

    pub fn __constructor(
        env: Env,
        admin: Address,
        coordinator: Address,
        oracle: OracleConfig,
        token: Address,
        cost_per_spin: i128,
        reel: ReelConfig,
        prize: PrizeConfig,
    ) {
        let config = JackpotConfig {
            cost_per_spin,
            reel,
            prize,
            oracle,
        };
        if let Err(err) = Self::validate_config(&config) {
            panic_with_error!(&env, err);
        }

        env.storage()
            .instance()
            .set(&StorageKey::Admin, &admin);
        env.storage()
            .instance()
            .set(&StorageKey::Coordinator, &coordinator);
        env.storage()
            .instance()
            .set(&StorageKey::Token, &token);
        env.storage()
            .instance()
            .set(&StorageKey::Config, &config);
        env.storage().instance().set(&StorageKey::Pool, &0i128);
        env.storage().instance().set(&StorageKey::Paused, &false);
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Spin lifecycle
    // ───────────────────────────────────────────────────────────────────────────

    /// Pay `cost_per_spin` and request randomness for one spin.
    ///
    /// Returns the oracle request id. The outcome is only known once the
    /// coordinator fulfills the request; watch for `EvOutcomeSettled` or
    /// query `get_spin_result`.
    pub fn spin(env: Env, participant: Address) -> Result<u64, JackpotError> {
        participant.require_auth();

        if Self::load_paused(&env) {
            return Err(JackpotError::Paused);
        }

        let config = Self::load_config(&env)?;
        let token = token::Client::new(&env, &Self::load_token(&env)?);
        let this = env.current_contract_address();
        let stake = config.cost_per_spin;

        if token.balance(&participant) < stake || token.allowance(&participant, &this) < stake {
            return Err(JackpotError::InsufficientStake);
        }

        // Escrow before the randomness request goes out.
        match token.try_transfer_from(&this, &participant, &this, &stake) {
            Ok(Ok(())) => {}
            _ => return Err(JackpotError::TransferFailed),
        }
        let pool = ledger::credit(Self::load_pool(&env), stake)?;
        Self::store_pool(&env, pool);

        let coordinator = VrfCoordinatorClient::new(&env, &Self::load_coordinator(&env)?);
        let request_id = coordinator.request_random_words(
            &this,
            &config.oracle.key_hash,
            &config.oracle.subscription_id,
            &config.oracle.request_confirmations,
            &config.oracle.callback_gas_limit,
            &NUM_WORDS,
        );

        registry::register(
            &env,
            &SpinRequest {
                request_id,
                participant: participant.clone(),
                stake,
                created_at: env.ledger().timestamp(),
                reel: config.reel,
                prize: config.prize,
            },
        )?;

        EvSpinInitiated {
            participant,
            request_id,
            stake,
        }
        .publish(&env);

        Self::bump_instance(&env);
        Ok(request_id)
    }

    /// Oracle callback. Only the configured coordinator may call it, once per
    /// request id.
    ///
    /// The pending spin is consumed before anything is paid out. Any error
    /// rolls back the whole call, so the spin is either settled in full or
    /// still pending afterwards.
    pub fn fulfill_random_words(
        env: Env,
        caller: Address,
        request_id: u64,
        random_words: Vec<U256>,
    ) -> Result<(), JackpotError> {
        caller.require_auth();

        if caller != Self::load_coordinator(&env)? {
            log!(&env, "fulfillment rejected: caller is not the coordinator", caller);
            return Err(JackpotError::UnauthorizedCaller);
        }

        let spin = match registry::consume(&env, request_id) {
            Ok(spin) => spin,
            Err(err) => {
                log!(&env, "fulfillment rejected: no pending spin", request_id);
                return Err(err);
            }
        };

        let word = random_words
            .get(0)
            .ok_or(JackpotError::MissingRandomWords)?;
        let resolution = resolver::resolve(&env, &word, &spin.reel, &spin.prize);

        // This spin's stake was released by `consume`; the rest stays reserved.
        let pool = Self::load_pool(&env);
        let base = ledger::prize_base(pool, registry::escrowed(&env))?;
        let settlement = ledger::settle(base, resolution.outcome, &spin.prize)?;
        Self::store_pool(&env, ledger::debit(pool, &settlement)?);

        let token = token::Client::new(&env, &Self::load_token(&env)?);
        let this = env.current_contract_address();
        if settlement.payout > 0 {
            token.transfer(&this, &spin.participant, &settlement.payout);
        }
        if settlement.burned > 0 {
            token.burn(&this, &settlement.burned);
        }

        Self::store_result(
            &env,
            request_id,
            &SpinResult {
                participant: spin.participant.clone(),
                outcome: resolution.outcome,
                symbol: resolution.symbol,
                payout: settlement.payout,
                burned: settlement.burned,
                settled_at: env.ledger().timestamp(),
            },
        );

        log!(
            &env,
            "spin settled",
            request_id,
            resolution.roll,
            settlement.payout,
            settlement.burned
        );

        EvOutcomeSettled {
            participant: spin.participant,
            request_id,
            outcome: resolution.outcome,
            symbol: resolution.symbol,
            payout: settlement.payout,
            burned: settlement.burned,
        }
        .publish(&env);

        Self::bump_instance(&env);
        Ok(())
    }

    /// Top up the prize pool.
    pub fn fund_pool(env: Env, funder: Address, amount: i128) -> Result<i128, JackpotError> {
        funder.require_auth();

        let pool = ledger::credit(Self::load_pool(&env), amount)?;
        let token = token::Client::new(&env, &Self::load_token(&env)?);
        match token.try_transfer(&funder, &env.current_contract_address(), &amount) {
            Ok(Ok(())) => {}
            _ => return Err(JackpotError::TransferFailed),
        }
        Self::store_pool(&env, pool);

        EvPoolFunded {
            funder,
            amount,
            pool,
        }
        .publish(&env);

        Self::bump_instance(&env);
        Ok(pool)
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Read
    // ───────────────────────────────────────────────────────────────────────────

    pub fn get_config(env: Env) -> Result<JackpotConfig, JackpotError> {
        Self::load_config(&env)
    }

    pub fn get_pool(env: Env) -> i128 {
        Self::load_pool(&env)
    }

    pub fn is_paused(env: Env) -> bool {
        Self::load_paused(&env)
    }

    /// Pending spin for `request_id`, if it has not settled yet.
    pub fn get_spin(env: Env, request_id: u64) -> Option<SpinRequest> {
        registry::get(&env, request_id)
    }

    pub fn get_spin_result(env: Env, request_id: u64) -> Option<SpinResult> {
        env.storage()
            .persistent()
            .get(&StorageKey::Settled(request_id))
    }

    pub fn pending_spins(env: Env) -> u32 {
        registry::pending_count(&env)
    }

    /// Part of the pool owned by pending spins.
    pub fn get_escrowed(env: Env) -> i128 {
        registry::escrowed(&env)
    }

    pub fn get_admin(env: Env) -> Result<Address, JackpotError> {
        Self::load_admin(&env)
    }

    pub fn get_coordinator(env: Env) -> Result<Address, JackpotError> {
        Self::load_coordinator(&env)
    }

    pub fn get_token(env: Env) -> Result<Address, JackpotError> {
        Self::load_token(&env)
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Admin
    // ───────────────────────────────────────────────────────────────────────────

    pub fn pause(env: Env, caller: Address) -> Result<(), JackpotError> {
        Self::set_paused(&env, &caller, true)
    }

    pub fn unpause(env: Env, caller: Address) -> Result<(), JackpotError> {
        Self::set_paused(&env, &caller, false)
    }

    pub fn set_prize_config(
        env: Env,
        caller: Address,
        prize: PrizeConfig,
    ) -> Result<(), JackpotError> {
        Self::require_admin(&env, &caller)?;
        let mut config = Self::load_config(&env)?;
        config.prize = prize;
        Self::update_config(&env, &config)
    }

    pub fn set_reel_config(env: Env, caller: Address, reel: ReelConfig) -> Result<(), JackpotError> {
        Self::require_admin(&env, &caller)?;
        let mut config = Self::load_config(&env)?;
        config.reel = reel;
        Self::update_config(&env, &config)
    }

    pub fn set_cost_per_spin(
        env: Env,
        caller: Address,
        cost_per_spin: i128,
    ) -> Result<(), JackpotError> {
        Self::require_admin(&env, &caller)?;
        let mut config = Self::load_config(&env)?;
        config.cost_per_spin = cost_per_spin;
        Self::update_config(&env, &config)
    }

    /// Key hash, subscription and callback limits used for future requests.
    pub fn set_oracle_config(
        env: Env,
        caller: Address,
        oracle: OracleConfig,
    ) -> Result<(), JackpotError> {
        Self::require_admin(&env, &caller)?;
        let mut config = Self::load_config(&env)?;
        config.oracle = oracle;
        Self::update_config(&env, &config)
    }

    pub fn set_admin(env: Env, caller: Address, new_admin: Address) -> Result<(), JackpotError> {
        Self::require_admin(&env, &caller)?;
        env.storage().instance().set(&StorageKey::Admin, &new_admin);

        EvAdminChanged {
            previous: caller,
            admin: new_admin,
        }
        .publish(&env);

        Self::bump_instance(&env);
        Ok(())
    }

    /// Set the pool to the contract's token balance, picking up tokens that
    /// were transferred in directly. Returns the new pool.
    pub fn sync_pool(env: Env, caller: Address) -> Result<i128, JackpotError> {
        Self::require_admin(&env, &caller)?;

        let token = token::Client::new(&env, &Self::load_token(&env)?);
        let balance = token.balance(&env.current_contract_address());
        // Pending stakes must stay covered.
        ledger::prize_base(balance, registry::escrowed(&env))?;

        let previous = Self::load_pool(&env);
        Self::store_pool(&env, balance);

        EvPoolSynced {
            previous,
            pool: balance,
        }
        .publish(&env);

        Self::bump_instance(&env);
        Ok(balance)
    }

    /// Refund a spin that was never fulfilled. Returns the refunded stake.
    pub fn cancel_spin(env: Env, caller: Address, request_id: u64) -> Result<i128, JackpotError> {
        Self::require_admin(&env, &caller)?;

        let spin = registry::consume(&env, request_id)?;
        let refund = Settlement {
            payout: spin.stake,
            burned: 0,
        };
        let pool = ledger::debit(Self::load_pool(&env), &refund)?;
        Self::store_pool(&env, pool);

        let token = token::Client::new(&env, &Self::load_token(&env)?);
        token.transfer(&env.current_contract_address(), &spin.participant, &spin.stake);

        EvSpinCancelled {
            participant: spin.participant,
            request_id,
            refund: spin.stake,
        }
        .publish(&env);

        Self::bump_instance(&env);
        Ok(spin.stake)
    }

    pub fn upgrade(env: Env, caller: Address, new_wasm_hash: BytesN<32>) -> Result<(), JackpotError> {
        Self::require_admin(&env, &caller)?;
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Guards
    // ═══════════════════════════════════════════════════════════════════════════

    fn require_admin(env: &Env, caller: &Address) -> Result<(), JackpotError> {
        caller.require_auth();
        if *caller != Self::load_admin(env)? {
            return Err(JackpotError::UnauthorizedCaller);
        }
        Ok(())
    }

    fn validate_config(config: &JackpotConfig) -> Result<(), JackpotError> {
        crate::config::validate_cost(config.cost_per_spin)?;
        config.reel.validate()?;
        config.prize.validate()?;
        config.oracle.validate()
    }

    fn set_paused(env: &Env, caller: &Address, paused: bool) -> Result<(), JackpotError> {
        Self::require_admin(env, caller)?;
        env.storage().instance().set(&StorageKey::Paused, &paused);
        EvPauseChanged { paused }.publish(env);
        Ok(())
    }

    fn update_config(env: &Env, config: &JackpotConfig) -> Result<(), JackpotError> {
        Self::validate_config(config)?;
        env.storage().instance().set(&StorageKey::Config, config);

        EvConfigUpdated {
            cost_per_spin: config.cost_per_spin,
            items_per_reel: config.reel.items_per_reel,
            mini_prize_points: config.prize.mini_prize_points,
            mega_prize_points: config.prize.mega_prize_points,
            burn_points: config.prize.burn_points,
        }
        .publish(env);

        Self::bump_instance(env);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Storage
    // ═══════════════════════════════════════════════════════════════════════════

    fn bump_instance(env: &Env) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_TTL_LEDGERS, INSTANCE_TTL_LEDGERS);
    }

    fn store_result(env: &Env, request_id: u64, result: &SpinResult) {
        let key = StorageKey::Settled(request_id);
        env.storage().persistent().set(&key, result);
        env.storage()
            .persistent()
            .extend_ttl(&key, SPIN_TTL_LEDGERS, SPIN_TTL_LEDGERS);
    }

    fn load_pool(env: &Env) -> i128 {
        env.storage()
            .instance()
            .get(&StorageKey::Pool)
            .unwrap_or(0)
    }

    fn store_pool(env: &Env, pool: i128) {
        env.storage().instance().set(&StorageKey::Pool, &pool);
    }

    fn load_paused(env: &Env) -> bool {
        env.storage()
            .instance()
            .get(&StorageKey::Paused)
            .unwrap_or(false)
    }

    fn load_config(env: &Env) -> Result<JackpotConfig, JackpotError> {
        env.storage()
            .instance()
            .get(&StorageKey::Config)
            .ok_or(JackpotError::NotInitialized)
    }

    fn load_admin(env: &Env) -> Result<Address, JackpotError> {
        env.storage()
            .instance()
            .get(&StorageKey::Admin)
            .ok_or(JackpotError::NotInitialized)
    }

    fn load_coordinator(env: &Env) -> Result<Address, JackpotError> {
        env.storage()
            .instance()
            .get(&StorageKey::Coordinator)
            .ok_or(JackpotError::NotInitialized)
    }

    fn load_token(env: &Env) -> Result<Address, JackpotError> {
        env.storage()
            .instance()
            .get(&StorageKey::Token)
            .ok_or(JackpotError::NotInitialized)
    }
}
