use std::sync::Arc;

use crate::{
    core::Config,
    events::Broker,
    jobs::JobRegistry,
    subscribers::{Subscribe, SubscriberWorker},
};

use super::server::Server;

/// Builder for constructing a [`Server`] with attached subscribers.
pub struct ServerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ServerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets the subscribers attached for the server's whole lifetime.
    ///
    /// Each one gets its own broker subscription and worker task.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the server.
    ///
    /// Must be called inside a Tokio runtime: subscriber workers are
    /// spawned immediately.
    pub fn build(self) -> Arc<Server> {
        let broker = Arc::new(Broker::new(self.cfg.subscriber_capacity_clamped()));
        let registry = Arc::new(JobRegistry::new());

        let workers = self
            .subscribers
            .into_iter()
            .map(|sub| SubscriberWorker::spawn(&broker, sub))
            .collect();

        Arc::new(Server::new_internal(self.cfg, registry, broker, workers))
    }
}
