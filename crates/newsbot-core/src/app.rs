use std::sync::Arc;

use crate::{
    aggregator::Aggregator,
    config::Config,
    cycle::DigestCycle,
    delivery::{paced::PacedDelivery, port::DeliveryPort},
    feed::{FeedParser, FeedSource},
    paginator::PageTemplate,
    scheduler::PeriodicScheduler,
    store::SeenStore,
};

/// Everything a trigger needs, built once at startup.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub store: Arc<dyn SeenStore>,
    pub cycle: Arc<DigestCycle>,
}

impl AppContext {
    /// Wire the pipeline around the given adapters.
    ///
    /// `delivery` is wrapped so consecutive pages are spaced by
    /// `config.send_interval`.
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn SeenStore>,
        parser: Arc<dyn FeedParser>,
        delivery: Arc<dyn DeliveryPort>,
    ) -> Self {
        let source = FeedSource::new(parser, store.clone()).with_max_entries(config.entries_per_feed);
        let aggregator = Aggregator::new(Arc::new(source))
            .with_limits(config.max_concurrent_fetches, config.feed_timeout);
        let delivery: Arc<dyn DeliveryPort> =
            Arc::new(PacedDelivery::new(delivery, config.send_interval));

        let cycle = DigestCycle::new(
            aggregator,
            config.categories.clone(),
            store.clone(),
            delivery,
            PageTemplate::new(config.digest_title.clone()),
        );

        Self {
            config,
            store,
            cycle: Arc::new(cycle),
        }
    }

    pub fn scheduler(&self) -> PeriodicScheduler {
        PeriodicScheduler::new(self.cycle.clone(), self.config.update_interval)
    }
}
