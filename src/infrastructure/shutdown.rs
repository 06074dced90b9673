use tokio::sync::broadcast;

pub trait Shutdown {
    fn subscribe(&self) -> broadcast::Receiver<()>;
}

/// Broadcasts a single stop signal to the API server and anything else
/// that subscribed.
#[derive(Clone)]
pub struct ShutdownChannel {
    shutdown: broadcast::Sender<()>,
}

impl ShutdownChannel {
    pub fn new() -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self { shutdown }
    }

    /// Signals every subscriber. Returns how many were listening.
    pub fn trigger(&self) -> usize {
        self.shutdown.send(()).unwrap_or(0)
    }
}

impl Default for ShutdownChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown for ShutdownChannel {
    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }
}
