//! Shared handler state.

use relay::client::SharedModelClient;
use relay::transport::StreamTransport;

/// State cloned into every request.
///
/// Immutable after startup; requests share nothing else.
#[derive(Clone)]
pub struct AppState {
    /// Model runtime adapter.
    pub client: SharedModelClient,
    /// Strategy used by the streaming endpoint.
    pub transport: StreamTransport,
    /// Per-session channel capacity for incremental streaming.
    pub channel_capacity: usize,
}

impl AppState {
    /// Create state with the default transport and channel capacity.
    #[must_use]
    pub fn new(client: SharedModelClient) -> Self {
        Self {
            client,
            transport: StreamTransport::default(),
            channel_capacity: relay::session::DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the streaming transport.
    #[must_use]
    pub const fn transport(mut self, transport: StreamTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Set the per-session channel capacity.
    #[must_use]
    pub const fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("provider", &self.client.provider_name())
            .field("model", &self.client.model())
            .field("transport", &self.transport)
            .field("channel_capacity", &self.channel_capacity)
            .finish()
    }
}
