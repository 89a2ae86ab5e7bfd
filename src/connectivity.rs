use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Shared online/offline signal.
///
/// Subscribers are only woken on an actual transition, matching the
/// browser's `online`/`offline` events.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: watch::Sender<bool>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Publishes the new state, notifying subscribers only if it changed
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            if online {
                info!("Connectivity restored");
            } else {
                warn!("Connectivity lost");
            }
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Resolves on the first transition to online that `rx` has not seen yet.
    ///
    /// A receiver counts as having seen the state it was subscribed at, so
    /// being online then does not count; the signal has to go offline and
    /// come back. Returns `false` if the signal source is gone.
    pub async fn wait_until_restored(mut rx: watch::Receiver<bool>) -> bool {
        loop {
            if rx.changed().await.is_err() {
                return false;
            }
            if *rx.borrow_and_update() {
                return true;
            }
        }
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// `host:port` that must accept a TCP connection for us to count as online
    pub address: String,
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            address: "api.github.com:443".to_string(),
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(3),
        }
    }
}

/// Periodically probes reachability and feeds the result into `connectivity`
pub fn spawn_probe(connectivity: Connectivity, config: ProbeConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.interval);
        loop {
            interval.tick().await;
            let online = probe(&config.address, config.timeout).await;
            debug!(address = %config.address, online, "Connectivity probe");
            connectivity.set_online(online);
        }
    })
}

async fn probe(address: &str, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(address)).await,
        Ok(Ok(_))
    )
}
