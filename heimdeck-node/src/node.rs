// SPDX-License-Identifier: MIT OR Apache-2.0

//! Public handle to a running engine.
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use heimdeck_auth::verifier::TokenListEntry;
use heimdeck_core::clock::SystemClock;
use heimdeck_core::{Clock, CompanionInfo, EntityKind, IspDeviceInfo, SessionToken};
use heimdeck_net::channel::PushChannel;
use heimdeck_store::DocumentStore;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::api::{
    BootstrapResponse, ClientState, CompanionResponse, IspResponse, LoginRequest, LoginResponse,
    PortUpdate, PortsResponse, VersionsResponse,
};
use crate::engine::{Engine, ToEngine};
use crate::error::EngineError;

/// Depth of the engine inbox.
const INBOX_CAPACITY: usize = 64;

/// Configures and spawns a [`Node`].
pub struct NodeBuilder {
    data_path: PathBuf,
    token_list: Vec<TokenListEntry>,
    clock: Arc<dyn Clock>,
}

impl NodeBuilder {
    /// `data_path` is the JSON state document, seeded on first run.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            token_list: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Externally provisioned labelled device tokens.
    pub fn token_list(mut self, token_list: Vec<TokenListEntry>) -> Self {
        self.token_list = token_list;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Open the state document and spawn the engine actor.
    pub fn spawn(self) -> Result<Node, EngineError> {
        let store = DocumentStore::open(self.data_path)?;
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        let shutdown = CancellationToken::new();
        let engine = Engine::new(rx, store, self.token_list, self.clock, shutdown.clone());
        let handle = tokio::spawn(async move {
            if let Err(err) = engine.run().await {
                error!("engine failed: {err:#}");
            }
        });
        Ok(Node {
            tx,
            shutdown,
            handle,
        })
    }
}

/// Front-end handle; all calls are forwarded to the engine actor and
/// processed in arrival order.
pub struct Node {
    tx: mpsc::Sender<ToEngine>,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl Node {
    pub async fn login(
        &self,
        addr: IpAddr,
        request: LoginRequest,
    ) -> Result<LoginResponse, EngineError> {
        self.call(|reply| ToEngine::Login {
            addr,
            request,
            reply,
        })
        .await
    }

    pub async fn logout(&self, token: &str) -> Result<(), EngineError> {
        let token = token.to_string();
        self.call(|reply| ToEngine::Logout { token, reply }).await
    }

    /// Version metadata available without authentication.
    pub async fn bootstrap(&self) -> Result<BootstrapResponse, EngineError> {
        self.call(|reply| ToEngine::Bootstrap { reply }).await
    }

    pub async fn state(&self, token: &str) -> Result<ClientState, EngineError> {
        let token = token.to_string();
        self.call(|reply| ToEngine::State { token, reply }).await
    }

    pub async fn versions(
        &self,
        token: &str,
        entity: EntityKind,
    ) -> Result<VersionsResponse, EngineError> {
        let token = token.to_string();
        self.call(|reply| ToEngine::Versions {
            token,
            entity,
            reply,
        })
        .await
    }

    pub async fn update_port(
        &self,
        token: &str,
        update: PortUpdate,
    ) -> Result<PortsResponse, EngineError> {
        let token = token.to_string();
        self.call(|reply| ToEngine::UpdatePort {
            token,
            update,
            reply,
        })
        .await
    }

    pub async fn set_isp_info(
        &self,
        token: &str,
        info: IspDeviceInfo,
    ) -> Result<IspResponse, EngineError> {
        let token = token.to_string();
        self.call(|reply| ToEngine::SetIspInfo { token, info, reply })
            .await
    }

    pub async fn set_companion_info(
        &self,
        token: &str,
        info: CompanionInfo,
    ) -> Result<CompanionResponse, EngineError> {
        let token = token.to_string();
        self.call(|reply| ToEngine::SetCompanionInfo { token, info, reply })
            .await
    }

    /// Register an authenticated push channel under its session.
    pub async fn bind_channel(
        &self,
        token: &str,
        channel: PushChannel,
    ) -> Result<SessionToken, EngineError> {
        let token = token.to_string();
        self.call(|reply| ToEngine::BindChannel {
            token,
            channel,
            reply,
        })
        .await
    }

    pub async fn unbind_channel(&self, token: SessionToken) {
        self.tx.send(ToEngine::UnbindChannel { token }).await.ok();
    }

    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, EngineError>>) -> ToEngine,
    ) -> Result<T, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| EngineError::Shutdown)?;
        rx.await.map_err(|_| EngineError::Shutdown)?
    }

    /// Stop the engine and wait for it to exit.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        self.handle.await.ok();
    }
}
