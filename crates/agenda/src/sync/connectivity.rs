//! Connectivity gate
//!
//! Reachability is published on a `tokio::sync::watch` channel by a
//! [`ConnectivityMonitor`]. The [`ConnectivityGate`] waits for a definite
//! answer and then fires exactly one of its callbacks.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    /// No determination made yet
    Unknown,
    Available,
    Unavailable,
}

/// Source of reachability updates
pub trait ConnectivityMonitor: Send + Sync {
    /// Receiver of the current and all following reachability values
    fn subscribe(&self) -> watch::Receiver<Reachability>;
}

/// Reachability pushed by the host (platform network callbacks, tests)
#[derive(Debug)]
pub struct ManualConnectivity {
    sender: watch::Sender<Reachability>,
}

impl ManualConnectivity {
    pub fn new(initial: Reachability) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn set(&self, reachability: Reachability) {
        // send_replace keeps the value even while nobody is subscribed.
        self.sender.send_replace(reachability);
    }

    pub fn set_available(&self, available: bool) {
        self.set(if available {
            Reachability::Available
        } else {
            Reachability::Unavailable
        });
    }

    pub fn current(&self) -> Reachability {
        *self.sender.borrow()
    }
}

impl Default for ManualConnectivity {
    fn default() -> Self {
        Self::new(Reachability::Unknown)
    }
}

impl ConnectivityMonitor for ManualConnectivity {
    fn subscribe(&self) -> watch::Receiver<Reachability> {
        self.sender.subscribe()
    }
}

/// Determines reachability by opening a TCP connection to the schedule host
///
/// Every subscription starts a fresh probe on the current tokio runtime.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
    timeout: Duration,
}

impl TcpProbe {
    /// Probe `address` (`host:port`)
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    /// Probe the host serving `url`, on its explicit or default port
    pub fn for_url(url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
        let host = parsed
            .host_str()
            .with_context(|| format!("URL has no host: {}", url))?;
        let port = parsed
            .port_or_known_default()
            .with_context(|| format!("URL has no known port: {}", url))?;
        Ok(Self::new(format!("{}:{}", host, port), timeout))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn probe(address: &str, timeout: Duration) -> Reachability {
        match tokio::time::timeout(timeout, TcpStream::connect(address)).await {
            Ok(Ok(_)) => Reachability::Available,
            Ok(Err(e)) => {
                debug!("Connectivity probe to {} failed: {}", address, e);
                Reachability::Unavailable
            }
            Err(_) => {
                debug!("Connectivity probe to {} timed out", address);
                Reachability::Unavailable
            }
        }
    }
}

impl ConnectivityMonitor for TcpProbe {
    fn subscribe(&self) -> watch::Receiver<Reachability> {
        let (sender, receiver) = watch::channel(Reachability::Unknown);
        let address = self.address.clone();
        let timeout = self.timeout;
        tokio::spawn(async move {
            let reachability = Self::probe(&address, timeout).await;
            let _ = sender.send(reachability);
        });
        receiver
    }
}

/// Defers an action until connectivity is known
#[derive(Clone)]
pub struct ConnectivityGate {
    monitor: Arc<dyn ConnectivityMonitor>,
}

impl ConnectivityGate {
    pub fn new(monitor: Arc<dyn ConnectivityMonitor>) -> Self {
        Self { monitor }
    }

    /// Observe reachability and call `on_available` or `on_unavailable`
    /// once per determination.
    ///
    /// Callbacks always run on a spawned task, never from within `start`.
    /// With `one_shot` the observer stops after the first callback; otherwise
    /// it fires again whenever the determination flips. Must be called from
    /// within a tokio runtime.
    pub fn start<A, U>(
        &self,
        mut on_available: A,
        mut on_unavailable: U,
        one_shot: bool,
    ) -> JoinHandle<()>
    where
        A: FnMut() + Send + 'static,
        U: FnMut() + Send + 'static,
    {
        let mut receiver = self.monitor.subscribe();
        tokio::spawn(async move {
            let mut last = None;
            loop {
                let available = match receiver
                    .wait_for(|r| *r != Reachability::Unknown)
                    .await
                {
                    Ok(reachability) => *reachability == Reachability::Available,
                    Err(_) => {
                        debug!("Connectivity source closed");
                        return;
                    }
                };

                if last != Some(available) {
                    last = Some(available);
                    if available {
                        on_available();
                    } else {
                        on_unavailable();
                    }
                    if one_shot {
                        return;
                    }
                }

                if receiver.changed().await.is_err() {
                    return;
                }
            }
        })
    }

    /// One-shot determination: `true` when the network is available.
    ///
    /// A source that closes without answering counts as unavailable.
    pub async fn determine(&self) -> bool {
        let (sender, receiver) = oneshot::channel();
        let sender = Arc::new(Mutex::new(Some(sender)));
        let unavailable = Arc::clone(&sender);

        self.start(
            move || send_once(&sender, true),
            move || send_once(&unavailable, false),
            true,
        );

        match receiver.await {
            Ok(available) => available,
            Err(_) => {
                warn!("Connectivity could not be determined, assuming offline");
                false
            }
        }
    }
}

fn send_once(sender: &Mutex<Option<oneshot::Sender<bool>>>, value: bool) {
    if let Some(sender) = sender.lock().ok().and_then(|mut s| s.take()) {
        let _ = sender.send(value);
    }
}
