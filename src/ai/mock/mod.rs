//! A stand-in for a real model. Replies are drawn from fixed pools
//! after a random delay that simulates network and inference latency.
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ai::provider::ResponseProvider;

pub mod pools;
pub use pools::{CANNED_RESPONSES, FOLLOW_UP_QUESTIONS};

/// Lower bound (inclusive) of the simulated response delay in ms
pub const MIN_DELAY_MS: u64 = 1000;
/// Upper bound (exclusive) of the simulated response delay in ms
pub const MAX_DELAY_MS: u64 = 3000;

/// Draw `count` indices uniformly from `[0, pool_len)`, with
/// replacement, in draw order. Returns an empty vec for an empty pool.
pub fn sample_indices<R: Rng + ?Sized>(rng: &mut R, pool_len: usize, count: usize) -> Vec<usize> {
    if pool_len == 0 {
        return Vec::new();
    }
    (0..count).map(|_| rng.gen_range(0..pool_len)).collect()
}

/// Pick one element of `pool` uniformly at random.
pub fn pick<'a, R: Rng + ?Sized>(rng: &mut R, pool: &[&'a str]) -> Option<&'a str> {
    sample_indices(rng, pool.len(), 1)
        .first()
        .map(|idx| pool[*idx])
}

/// Responds with canned sentences and random follow-up questions.
///
/// Use `MockResponseProvider::with_seed` for a reproducible sequence of
/// delays, responses and follow-ups.
pub struct MockResponseProvider {
    rng: Mutex<StdRng>,
}

impl MockResponseProvider {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A poisoned lock only means another caller panicked mid-draw,
        // the generator itself is still usable
        let mut rng = match self.rng.lock() {
            Ok(rng) => rng,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut rng)
    }

    fn next_delay(&self) -> Duration {
        self.with_rng(|rng| Duration::from_millis(rng.gen_range(MIN_DELAY_MS..MAX_DELAY_MS)))
    }
}

impl Default for MockResponseProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseProvider for MockResponseProvider {
    async fn get_response(&self) -> Result<String, Error> {
        let delay = self.next_delay();
        tracing::debug!("Simulating response latency of {}ms", delay.as_millis());
        tokio::time::sleep(delay).await;

        let response = self
            .with_rng(|rng| pick(rng, &CANNED_RESPONSES))
            .ok_or(anyhow!("No canned responses to pick from"))?;
        Ok(response.to_string())
    }

    fn get_follow_up_questions(&self) -> [String; 2] {
        let idx = self.with_rng(|rng| sample_indices(rng, FOLLOW_UP_QUESTIONS.len(), 2));
        [
            FOLLOW_UP_QUESTIONS[idx[0]].to_string(),
            FOLLOW_UP_QUESTIONS[idx[1]].to_string(),
        ]
    }
}
