//! Loopback chat client.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use traychat_models::{Cookies, Snapshot};
use traychat_session::{ChatClient, ClientError, Observable, Subscription};

use crate::hub::LoopbackHub;

/// A client session against a [`LoopbackHub`].
///
/// `connect()` runs for as long as the connection lives, like a real
/// long-polling client; `disconnect()` or a service-side drop ends it.
pub struct LoopbackClient {
    hub: Arc<LoopbackHub>,
    cookies: Cookies,
    on_connect: Observable<Snapshot>,
    closer: Arc<Notify>,
}

impl LoopbackClient {
    pub fn new(hub: Arc<LoopbackHub>, cookies: Cookies) -> Self {
        Self {
            hub,
            cookies,
            on_connect: Observable::new(),
            closer: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl ChatClient for LoopbackClient {
    async fn connect(&self) -> Result<(), ClientError> {
        if !self.hub.accepts(&self.cookies) {
            warn!("session cookie rejected");
            return Err(ClientError::Connection("session expired".to_string()));
        }

        self.hub.attach(Arc::clone(&self.closer));
        let observers = self.on_connect.emit(self.hub.directory().snapshot());
        info!(observers, "loopback client connected");

        self.closer.notified().await;
        self.hub.detach(&self.closer);
        debug!("loopback client connection ended");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        debug!("loopback client disconnecting");
        self.closer.notify_one();
        Ok(())
    }

    fn on_connect(&self) -> Subscription<Snapshot> {
        self.on_connect.subscribe()
    }
}
