//! ICE connectivity monitoring
//!
//! Reports every connectivity transition and closes the connection the first
//! time it reaches `failed`. This is the only path that tears down a
//! connection the remote side abandoned at the transport layer.

use super::{ConnectivityState, PeerConnection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Observes connectivity changes of one peer connection
pub struct ConnectivityMonitor {
    state_rx: watch::Receiver<ConnectivityState>,
    closed: Arc<AtomicBool>,
}

impl ConnectivityMonitor {
    /// Register the monitor's handler on `connection`.
    ///
    /// The handler holds a weak reference, so the registration does not keep
    /// the connection alive.
    pub fn attach<P: PeerConnection>(connection: &Arc<P>) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectivityState::New);
        let state_tx = Arc::new(state_tx);
        let closed = Arc::new(AtomicBool::new(false));

        let weak: Weak<P> = Arc::downgrade(connection);
        let closed_for_handler = Arc::clone(&closed);

        connection.on_connectivity_state_change(Box::new(move |state| {
            let weak = weak.clone();
            let closed = Arc::clone(&closed_for_handler);
            let state_tx = Arc::clone(&state_tx);

            Box::pin(async move {
                info!("ICE connection state changed: {}", state);
                state_tx.send_replace(state);

                if state != ConnectivityState::Failed {
                    return;
                }

                if closed.swap(true, Ordering::SeqCst) {
                    return;
                }

                match weak.upgrade() {
                    Some(connection) => {
                        warn!("ICE connection failed, closing peer connection");
                        if let Err(e) = connection.close().await {
                            error!("Failed to close peer connection: {}", e);
                        }
                    }
                    None => warn!("ICE connection failed after the connection was dropped"),
                }
            })
        }));

        Self { state_rx, closed }
    }

    /// Last reported state
    pub fn state(&self) -> ConnectivityState {
        *self.state_rx.borrow()
    }

    /// Watch channel carrying every reported state
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state_rx.clone()
    }

    /// Whether the monitor has already requested a close
    pub fn has_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
