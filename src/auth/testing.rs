use std::sync::Arc;

use crate::auth::authenticator::{Authenticator, TokenLifespans};
use crate::auth::clock::ManualClock;
use crate::auth::keys::Keypair;

pub(crate) const START: i64 = 1_700_000_000;

const PUBLIC_PEM: &[u8] = include_bytes!("../../tests/fixtures/rsa.app.pub");
const PRIVATE_PEM: &[u8] = include_bytes!("../../tests/fixtures/rsa.app");
const OTHER_PUBLIC_PEM: &[u8] = include_bytes!("../../tests/fixtures/other.app.pub");
const OTHER_PRIVATE_PEM: &[u8] = include_bytes!("../../tests/fixtures/other.app");

pub(crate) fn authenticator_at(access: u64, refresh: u64) -> (Authenticator, Arc<ManualClock>) {
    build(PUBLIC_PEM, PRIVATE_PEM, access, refresh)
}

/// Same lifespans, unrelated keypair.
pub(crate) fn other_authenticator(access: u64, refresh: u64) -> (Authenticator, Arc<ManualClock>) {
    build(OTHER_PUBLIC_PEM, OTHER_PRIVATE_PEM, access, refresh)
}

fn build(
    public: &[u8],
    private: &[u8],
    access: u64,
    refresh: u64,
) -> (Authenticator, Arc<ManualClock>) {
    let keys = Keypair::from_pem(public, private).expect("fixture keys must load");
    let lifespans = TokenLifespans::new(access, refresh).expect("lifespans must be positive");
    let clock = Arc::new(ManualClock::new(START));
    let auth = Authenticator::with_clock(keys, lifespans, clock.clone());
    (auth, clock)
}
