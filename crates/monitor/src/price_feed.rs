//! Random-walk price source for running without a market data connection.

use crate::shutdown::Shutdown;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use trade_engine_core::{PriceFeedConfig, QuoteSource};

/// Simulated quotes for a fixed set of symbols.
///
/// Each tick moves every tracked price by a uniform step in
/// `[-max_step, max_step)`. A step that would take a price to zero or below
/// is not applied. Untracked symbols read as `0.0`.
pub struct SimulatedPriceFeed {
    prices: RwLock<HashMap<String, f64>>,
    rng: Mutex<ChaCha8Rng>,
    max_step: f64,
    tick_interval: Duration,
}

impl SimulatedPriceFeed {
    #[must_use]
    pub fn new(config: &PriceFeedConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let prices = config
            .seeds
            .iter()
            .map(|(symbol, price)| (symbol.clone(), *price))
            .collect();

        Self {
            prices: RwLock::new(prices),
            rng: Mutex::new(rng),
            max_step: config.max_step,
            tick_interval: config.tick_interval(),
        }
    }

    /// Starts tracking `symbol` at `seed`, replacing any current price.
    pub fn track(&self, symbol: impl Into<String>, seed: f64) {
        self.prices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(symbol.into(), seed);
    }

    /// Applies one random step to every tracked price.
    pub fn step_all(&self) {
        if !(self.max_step.is_finite() && self.max_step > 0.0) {
            return;
        }

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut prices = self.prices.write().unwrap_or_else(PoisonError::into_inner);
        for (symbol, price) in prices.iter_mut() {
            let next = *price + rng.gen_range(-self.max_step..self.max_step);
            if next > 0.0 {
                *price = next;
            }
            debug!(symbol = %symbol, price = *price, "Simulated price");
        }
    }

    /// Steps prices on every tick until `shutdown` fires.
    pub async fn run(&self, mut shutdown: Shutdown) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            tick_interval_secs = self.tick_interval.as_secs(),
            "Price simulation started"
        );

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => self.step_all(),
            }
        }

        info!("Price simulation stopped");
    }
}

impl QuoteSource for SimulatedPriceFeed {
    fn get_price(&self, symbol: &str) -> f64 {
        self.prices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(symbol)
            .copied()
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn config(seed: u64) -> PriceFeedConfig {
        PriceFeedConfig {
            rng_seed: Some(seed),
            ..PriceFeedConfig::default()
        }
    }

    #[test]
    fn seeded_symbols_start_at_their_seed() {
        let feed = SimulatedPriceFeed::new(&PriceFeedConfig::default());
        assert_eq!(feed.get_price("BTCUSD"), 68_000.0);
        assert_eq!(feed.get_price("ETHUSD"), 0.0);
    }

    #[test]
    fn steps_stay_within_bounds() {
        let feed = SimulatedPriceFeed::new(&config(7));
        let mut last = feed.get_price("BTCUSD");
        for _ in 0..500 {
            feed.step_all();
            let now = feed.get_price("BTCUSD");
            assert!((now - last).abs() <= 50.0);
            assert!(now > 0.0);
            last = now;
        }
    }

    #[test]
    fn same_seed_gives_same_path() {
        let a = SimulatedPriceFeed::new(&config(42));
        let b = SimulatedPriceFeed::new(&config(42));
        for _ in 0..20 {
            a.step_all();
            b.step_all();
            assert_eq!(a.get_price("BTCUSD"), b.get_price("BTCUSD"));
        }
    }

    #[test]
    fn prices_never_reach_zero() {
        let feed = SimulatedPriceFeed::new(&PriceFeedConfig {
            seeds: BTreeMap::from([("PENNY".to_string(), 1.0)]),
            max_step: 50.0,
            rng_seed: Some(3),
            ..PriceFeedConfig::default()
        });
        for _ in 0..200 {
            feed.step_all();
            assert!(feed.get_price("PENNY") > 0.0);
        }
    }

    #[test]
    fn tracked_symbol_becomes_quotable() {
        let feed = SimulatedPriceFeed::new(&config(1));
        feed.track("ETHUSD", 3_100.0);
        assert_eq!(feed.get_price("ETHUSD"), 3_100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_ticks_until_shutdown() {
        let feed = Arc::new(SimulatedPriceFeed::new(&config(9)));
        let (trigger, listener) = shutdown::channel();

        let task = {
            let feed = Arc::clone(&feed);
            tokio::spawn(async move { feed.run(listener).await })
        };

        tokio::time::sleep(Duration::from_secs(11)).await;
        trigger.trigger();
        task.await.unwrap();

        let frozen = feed.get_price("BTCUSD");
        assert_ne!(frozen, 68_000.0);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(feed.get_price("BTCUSD"), frozen);
    }
}
