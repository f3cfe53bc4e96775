use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::PosApi;
use crate::kitchen::KitchenBoard;

/// What a poll produced.
#[derive(Debug)]
pub enum PollEvent {
    Refreshed(KitchenBoard),
    Failed(String),
    /// The server rejected the token. Polling pauses until the session
    /// is authenticated again.
    AuthExpired,
}

/// Periodically refreshes the kitchen board while the operator is signed in.
pub struct KitchenPoller<A: ?Sized> {
    api: Arc<A>,
    period: Duration,
}

impl<A: PosApi + ?Sized + 'static> KitchenPoller<A> {
    pub fn new(api: Arc<A>, period: Duration) -> Self {
        Self { api, period }
    }

    /// Start polling on a background task.
    pub fn spawn(
        self,
        authenticated: watch::Receiver<bool>,
        shutdown: watch::Receiver<bool>,
    ) -> (JoinHandle<()>, mpsc::Receiver<PollEvent>) {
        let (events, receiver) = mpsc::channel(16);
        let handle = tokio::spawn(self.run(authenticated, shutdown, events));
        (handle, receiver)
    }

    fn ticker(&self) -> Interval {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Poll until `shutdown` flips to true or either channel closes.
    ///
    /// The first poll happens immediately, then once per period. Nothing
    /// is fetched while `authenticated` is false.
    pub async fn run(
        self,
        mut authenticated: watch::Receiver<bool>,
        mut shutdown: watch::Receiver<bool>,
        events: mpsc::Sender<PollEvent>,
    ) {
        let mut ticker = self.ticker();
        let mut expired = false;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let signed_in = *authenticated.borrow() && !expired;
            if !signed_in {
                debug!("Kitchen polling paused until sign-in");
                tokio::select! {
                    changed = authenticated.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        expired = false;
                        ticker = self.ticker();
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                continue;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                changed = authenticated.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            let event = match KitchenBoard::fetch(self.api.as_ref()).await {
                Ok(board) => PollEvent::Refreshed(board),
                Err(err) if err.is_auth() => {
                    warn!("Kitchen polling stopped: session expired");
                    expired = true;
                    PollEvent::AuthExpired
                }
                Err(err) => {
                    warn!(error = %err, "Kitchen refresh failed");
                    PollEvent::Failed(err.user_message())
                }
            };

            if events.send(event).await.is_err() {
                break;
            }
        }

        info!("Kitchen poller stopped");
    }
}
