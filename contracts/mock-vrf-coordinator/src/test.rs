#![cfg(test)]

use crate::{CoordinatorError, MockKey, MockVrfCoordinator, MockVrfCoordinatorClient};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{contract, contractimpl, contracttype, vec, Address, Bytes, BytesN, Env, Vec, U256};

// ════════════════════════════════════════════════════════════════════════════
//  Consumers
// ════════════════════════════════════════════════════════════════════════════

#[contracttype]
#[derive(Clone)]
enum ConsumerKey {
    Calls,
    LastWords,
}

#[contract]
pub struct RecordingConsumer;

#[contractimpl]
impl RecordingConsumer {
    pub fn fulfill_random_words(env: Env, caller: Address, _request_id: u64, random_words: Vec<U256>) {
        caller.require_auth();
        let calls: u32 = env.storage().instance().get(&ConsumerKey::Calls).unwrap_or(0);
        env.storage().instance().set(&ConsumerKey::Calls, &(calls + 1));
        env.storage().instance().set(&ConsumerKey::LastWords, &random_words);
    }

    pub fn calls(env: Env) -> u32 {
        env.storage().instance().get(&ConsumerKey::Calls).unwrap_or(0)
    }

    pub fn last_words(env: Env) -> Vec<U256> {
        env.storage()
            .instance()
            .get(&ConsumerKey::LastWords)
            .unwrap_or(Vec::new(&env))
    }
}

#[contract]
pub struct RejectingConsumer;

#[contractimpl]
impl RejectingConsumer {
    pub fn fulfill_random_words(_env: Env, _caller: Address, _request_id: u64, _random_words: Vec<U256>) {
        panic!("consumer rejects every fulfillment");
    }
}

// ════════════════════════════════════════════════════════════════════════════
//  Helpers
// ════════════════════════════════════════════════════════════════════════════

fn setup() -> (Env, MockVrfCoordinatorClient<'static>, u64) {
    let env = Env::default();
    env.mock_all_auths();

    let coordinator_id = env.register(MockVrfCoordinator, ());
    let coordinator = MockVrfCoordinatorClient::new(&env, &coordinator_id);
    let subscription_id = coordinator.create_subscription(&Address::generate(&env));

    (env, coordinator, subscription_id)
}

fn key_hash(env: &Env) -> BytesN<32> {
    BytesN::from_array(env, &[0x4b; 32])
}

fn request(
    env: &Env,
    coordinator: &MockVrfCoordinatorClient,
    consumer: &Address,
    subscription_id: u64,
    num_words: u32,
) -> u64 {
    coordinator.request_random_words(consumer, &key_hash(env), &subscription_id, &3, &100_000, &num_words)
}

fn assert_coordinator_error<T, E>(
    result: &Result<Result<T, E>, Result<CoordinatorError, soroban_sdk::InvokeError>>,
    expected: CoordinatorError,
) {
    match result {
        Err(Ok(actual)) => assert_eq!(*actual, expected),
        Err(Err(invoke_err)) => panic!("Expected {:?}, got invoke error: {:?}", expected, invoke_err),
        Ok(_) => panic!("Expected error {:?}, but operation succeeded", expected),
    }
}

// ════════════════════════════════════════════════════════════════════════════
//  Subscriptions & requests
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn subscriptions_are_numbered_from_one() {
    let (env, coordinator, first) = setup();
    let owner = Address::generate(&env);
    let second = coordinator.create_subscription(&owner);
    assert_eq!(first, 1);
    assert_eq!(second, 2);
    assert_eq!(coordinator.get_subscription(&second), Some(owner));
    assert_eq!(coordinator.get_subscription(&99), None);
}

#[test]
fn request_ids_are_sequential() {
    let (env, coordinator, sub) = setup();
    let consumer = env.register(RecordingConsumer, ());

    assert_eq!(request(&env, &coordinator, &consumer, sub, 1), 1);
    assert_eq!(request(&env, &coordinator, &consumer, sub, 2), 2);

    let pending = coordinator.pending_request(&2).unwrap();
    assert_eq!(pending.consumer, consumer);
    assert_eq!(pending.num_words, 2);
    assert_eq!(pending.subscription_id, sub);
}

#[test]
fn unknown_subscription_rejected() {
    let (env, coordinator, _sub) = setup();
    let consumer = env.register(RecordingConsumer, ());
    let result =
        coordinator.try_request_random_words(&consumer, &key_hash(&env), &42, &3, &100_000, &1);
    assert_coordinator_error(&result, CoordinatorError::InvalidSubscription);
}

#[test]
fn word_count_bounds_enforced() {
    let (env, coordinator, sub) = setup();
    let consumer = env.register(RecordingConsumer, ());
    let zero = coordinator.try_request_random_words(&consumer, &key_hash(&env), &sub, &3, &100_000, &0);
    assert_coordinator_error(&zero, CoordinatorError::InvalidNumWords);
    let too_many =
        coordinator.try_request_random_words(&consumer, &key_hash(&env), &sub, &3, &100_000, &501);
    assert_coordinator_error(&too_many, CoordinatorError::InvalidNumWords);
}

#[test]
fn exhausted_request_counter_rejected() {
    let (env, coordinator, sub) = setup();
    let consumer = env.register(RecordingConsumer, ());
    env.as_contract(&coordinator.address, || {
        env.storage().instance().set(&MockKey::NextRequestId, &u64::MAX);
    });

    let result =
        coordinator.try_request_random_words(&consumer, &key_hash(&env), &sub, &3, &100_000, &1);
    assert_coordinator_error(&result, CoordinatorError::IdOverflow);
    assert!(coordinator.pending_request(&u64::MAX).is_none());
}

// ════════════════════════════════════════════════════════════════════════════
//  Fulfillment
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn fulfill_delivers_derived_words() {
    let (env, coordinator, sub) = setup();
    let consumer_id = env.register(RecordingConsumer, ());
    let consumer = RecordingConsumerClient::new(&env, &consumer_id);

    let id = request(&env, &coordinator, &consumer_id, sub, 2);
    assert!(coordinator.fulfill_random_words(&id));

    let words = consumer.last_words();
    assert_eq!(consumer.calls(), 1);
    assert_eq!(words.len(), 2);

    let mut preimage = Bytes::from_array(&env, &id.to_be_bytes());
    preimage.append(&Bytes::from_array(&env, &0u32.to_be_bytes()));
    let hash = env.crypto().keccak256(&preimage);
    let expected = U256::from_be_bytes(&env, &Bytes::from_array(&env, &hash.to_array()));
    assert_eq!(words.get(0).unwrap(), expected);
    assert_ne!(words.get(0).unwrap(), words.get(1).unwrap());

    assert!(coordinator.pending_request(&id).is_none());
}

#[test]
fn fulfill_override_delivers_given_words() {
    let (env, coordinator, sub) = setup();
    let consumer_id = env.register(RecordingConsumer, ());
    let consumer = RecordingConsumerClient::new(&env, &consumer_id);

    let id = request(&env, &coordinator, &consumer_id, sub, 1);
    let words = vec![&env, U256::from_u32(&env, 1275)];
    assert!(coordinator.fulfill_random_words_with_override(&id, &words));
    assert_eq!(consumer.last_words(), words);
}

#[test]
fn override_word_count_must_match() {
    let (env, coordinator, sub) = setup();
    let consumer_id = env.register(RecordingConsumer, ());

    let id = request(&env, &coordinator, &consumer_id, sub, 1);
    let words = vec![&env, U256::from_u32(&env, 1), U256::from_u32(&env, 2)];
    let result = coordinator.try_fulfill_random_words_with_override(&id, &words);
    assert_coordinator_error(&result, CoordinatorError::InvalidRandomWords);
    assert!(coordinator.pending_request(&id).is_some());
}

#[test]
fn request_fulfilled_only_once() {
    let (env, coordinator, sub) = setup();
    let consumer_id = env.register(RecordingConsumer, ());

    let id = request(&env, &coordinator, &consumer_id, sub, 1);
    coordinator.fulfill_random_words(&id);
    let result = coordinator.try_fulfill_random_words(&id);
    assert_coordinator_error(&result, CoordinatorError::UnknownRequest);
}

#[test]
fn rejecting_consumer_does_not_revert_fulfillment() {
    let (env, coordinator, sub) = setup();
    let consumer_id = env.register(RejectingConsumer, ());

    let id = request(&env, &coordinator, &consumer_id, sub, 1);
    assert!(!coordinator.fulfill_random_words(&id));
    assert!(coordinator.pending_request(&id).is_none());
}
