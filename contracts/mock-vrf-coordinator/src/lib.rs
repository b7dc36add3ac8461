#![no_std]

//! # Mock VRF Coordinator
//!
//! Local stand-in for a verifiable randomness oracle, used by tests and
//! local deployments of the jackpot.
//!
//! Consumers call `request_random_words` and get a sequential request id
//! back. Nothing happens until someone calls `fulfill_random_words` (words
//! derived from the request id) or `fulfill_random_words_with_override`
//! (caller-chosen words); either one forwards the words to the consumer's
//! `fulfill_random_words` callback.
//!
//! A request is removed before the callback runs, and a failing consumer does
//! not revert the fulfillment: the outcome is only reported through
//! `EvRandomWordsFulfilled::success`.

use soroban_sdk::{
    contract, contractclient, contracterror, contractevent, contractimpl, contracttype, Address,
    Bytes, BytesN, Env, Vec, U256,
};

#[contractevent]
pub struct EvSubscriptionCreated {
    pub subscription_id: u64,
    pub owner: Address,
}

#[contractevent]
pub struct EvRandomWordsRequested {
    pub request_id: u64,
    pub subscription_id: u64,
    pub consumer: Address,
    pub num_words: u32,
}

#[contractevent]
pub struct EvRandomWordsFulfilled {
    pub request_id: u64,
    pub success: bool,
}

/// Callback every consumer has to expose.
#[contractclient(name = "VrfConsumerClient")]
pub trait VrfConsumer {
    fn fulfill_random_words(env: Env, caller: Address, request_id: u64, random_words: Vec<U256>);
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum CoordinatorError {
    InvalidSubscription = 1,
    InvalidNumWords = 2,
    UnknownRequest = 3,
    InvalidRandomWords = 4,
    IdOverflow = 5,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingRequest {
    pub consumer: Address,
    pub subscription_id: u64,
    pub key_hash: BytesN<32>,
    pub num_words: u32,
}

#[contracttype]
#[derive(Clone)]
enum MockKey {
    NextSubscriptionId,
    NextRequestId,
    Subscription(u64),
    Request(u64),
}

pub const MAX_NUM_WORDS: u32 = 500;

#[contract]
pub struct MockVrfCoordinator;

#[contractimpl]
impl MockVrfCoordinator {
    pub fn create_subscription(env: Env, owner: Address) -> Result<u64, CoordinatorError> {
        owner.require_auth();
        let id = Self::next_id(&env, MockKey::NextSubscriptionId)?;
        env.storage()
            .persistent()
            .set(&MockKey::Subscription(id), &owner);
        EvSubscriptionCreated {
            subscription_id: id,
            owner,
        }
        .publish(&env);
        Ok(id)
    }

    pub fn get_subscription(env: Env, subscription_id: u64) -> Option<Address> {
        env.storage()
            .persistent()
            .get(&MockKey::Subscription(subscription_id))
    }

    /// Confirmations and gas limit are accepted for interface parity and ignored.
    pub fn request_random_words(
        env: Env,
        consumer: Address,
        key_hash: BytesN<32>,
        subscription_id: u64,
        _minimum_confirmations: u32,
        _callback_gas_limit: u32,
        num_words: u32,
    ) -> Result<u64, CoordinatorError> {
        consumer.require_auth();

        if !env
            .storage()
            .persistent()
            .has(&MockKey::Subscription(subscription_id))
        {
            return Err(CoordinatorError::InvalidSubscription);
        }
        if num_words == 0 || num_words > MAX_NUM_WORDS {
            return Err(CoordinatorError::InvalidNumWords);
        }

        let request_id = Self::next_id(&env, MockKey::NextRequestId)?;
        env.storage().persistent().set(
            &MockKey::Request(request_id),
            &PendingRequest {
                consumer: consumer.clone(),
                subscription_id,
                key_hash,
                num_words,
            },
        );

        EvRandomWordsRequested {
            request_id,
            subscription_id,
            consumer,
            num_words,
        }
        .publish(&env);
        Ok(request_id)
    }

    pub fn pending_request(env: Env, request_id: u64) -> Option<PendingRequest> {
        env.storage().persistent().get(&MockKey::Request(request_id))
    }

    /// Fulfill with `keccak256(request_id || index)` for each requested word.
    /// Returns whether the consumer accepted the words.
    pub fn fulfill_random_words(env: Env, request_id: u64) -> Result<bool, CoordinatorError> {
        let request = Self::take_request(&env, request_id)?;
        let mut words = Vec::new(&env);
        for index in 0..request.num_words {
            words.push_back(Self::derive_word(&env, request_id, index));
        }
        Ok(Self::deliver(&env, request_id, &request, &words))
    }

    /// Fulfill with exactly the given words.
    pub fn fulfill_random_words_with_override(
        env: Env,
        request_id: u64,
        words: Vec<U256>,
    ) -> Result<bool, CoordinatorError> {
        let request = Self::pending_request(env.clone(), request_id)
            .ok_or(CoordinatorError::UnknownRequest)?;
        if words.len() != request.num_words {
            return Err(CoordinatorError::InvalidRandomWords);
        }
        Self::take_request(&env, request_id)?;
        Ok(Self::deliver(&env, request_id, &request, &words))
    }

    // ─── Internal helpers ──────────────────────────────────────────────────

    fn next_id(env: &Env, key: MockKey) -> Result<u64, CoordinatorError> {
        let id: u64 = env.storage().instance().get(&key).unwrap_or(1);
        let next = id.checked_add(1).ok_or(CoordinatorError::IdOverflow)?;
        env.storage().instance().set(&key, &next);
        Ok(id)
    }

    fn take_request(env: &Env, request_id: u64) -> Result<PendingRequest, CoordinatorError> {
        let key = MockKey::Request(request_id);
        let request: PendingRequest = env
            .storage()
            .persistent()
            .get(&key)
            .ok_or(CoordinatorError::UnknownRequest)?;
        env.storage().persistent().remove(&key);
        Ok(request)
    }

    fn derive_word(env: &Env, request_id: u64, index: u32) -> U256 {
        let mut preimage = Bytes::from_array(env, &request_id.to_be_bytes());
        preimage.append(&Bytes::from_array(env, &index.to_be_bytes()));
        let hash = env.crypto().keccak256(&preimage);
        U256::from_be_bytes(env, &Bytes::from_array(env, &hash.to_array()))
    }

    fn deliver(env: &Env, request_id: u64, request: &PendingRequest, words: &Vec<U256>) -> bool {
        let consumer = VrfConsumerClient::new(env, &request.consumer);
        let success = matches!(
            consumer.try_fulfill_random_words(&env.current_contract_address(), &request_id, words),
            Ok(Ok(()))
        );
        EvRandomWordsFulfilled {
            request_id,
            success,
        }
        .publish(env);
        success
    }
}

#[cfg(test)]
mod test;
