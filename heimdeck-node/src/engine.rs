// SPDX-License-Identifier: MIT OR Apache-2.0

//! The engine actor: owns every piece of mutable state (rate limiter,
//! session registry, channel router, state document) and processes all
//! operations sequentially off one inbox. Front ends talk to it through
//! [`crate::Node`].
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use heimdeck_auth::rate_limit::{FailureOutcome, RateLimiter};
use heimdeck_auth::session::SessionRegistry;
use heimdeck_auth::verifier::{AuthOutcome, TokenListEntry, verify};
use heimdeck_core::{
    Clock, CompanionInfo, DeviceToken, EntityKind, IspDeviceInfo, PortGroup, SessionToken,
    TokenDigest, is_hex_color,
};
use heimdeck_net::channel::PushChannel;
use heimdeck_net::message::ServerEvent;
use heimdeck_net::router::ChannelRouter;
use heimdeck_store::DocumentStore;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{
    BootstrapResponse, ClientState, CompanionResponse, IspResponse, LoginRequest, LoginResponse,
    MAX_FIELD_LEN, PortUpdate, PortsResponse, VersionsResponse, sanitize_companion_versions,
    sanitize_isp_versions,
};
use crate::error::EngineError;

/// How often live push channels are pinged and silent ones dropped.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// How often stale rate-limiter records are purged.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

type Reply<T> = oneshot::Sender<Result<T, EngineError>>;

/// Messages handled by the engine actor.
pub enum ToEngine {
    Login {
        addr: IpAddr,
        request: LoginRequest,
        reply: Reply<LoginResponse>,
    },
    Logout {
        token: String,
        reply: Reply<()>,
    },
    Bootstrap {
        reply: Reply<BootstrapResponse>,
    },
    State {
        token: String,
        reply: Reply<ClientState>,
    },
    Versions {
        token: String,
        entity: EntityKind,
        reply: Reply<VersionsResponse>,
    },
    UpdatePort {
        token: String,
        update: PortUpdate,
        reply: Reply<PortsResponse>,
    },
    SetIspInfo {
        token: String,
        info: IspDeviceInfo,
        reply: Reply<IspResponse>,
    },
    SetCompanionInfo {
        token: String,
        info: CompanionInfo,
        reply: Reply<CompanionResponse>,
    },
    BindChannel {
        token: String,
        channel: PushChannel,
        reply: Reply<SessionToken>,
    },
    UnbindChannel {
        token: SessionToken,
    },
}

pub struct Engine {
    inbox: mpsc::Receiver<ToEngine>,
    limiter: RateLimiter,
    registry: SessionRegistry,
    router: ChannelRouter,
    store: DocumentStore,
    token_list: Vec<TokenListEntry>,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
}

impl Engine {
    pub fn new(
        inbox: mpsc::Receiver<ToEngine>,
        store: DocumentStore,
        token_list: Vec<TokenListEntry>,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            inbox,
            limiter: RateLimiter::new(clock.clone()),
            registry: SessionRegistry::new(clock.clone()),
            router: ChannelRouter::new(),
            store,
            token_list,
            clock,
            shutdown,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        let mut purge = tokio::time::interval(PURGE_INTERVAL);
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        purge.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    debug!("engine shutting down");
                    self.router.close_all();
                    return Ok(());
                }
                _ = heartbeat.tick() => {
                    let live = self.registry.current().map(|s| s.token.clone());
                    self.router.evict_stale(live.as_ref());
                    self.router.probe();
                }
                _ = purge.tick() => {
                    let purged = self.limiter.purge_stale();
                    if purged > 0 {
                        debug!(purged, "dropped stale rate-limit records");
                    }
                }
                msg = self.inbox.recv() => {
                    let Some(msg) = msg else {
                        return Ok(());
                    };
                    self.on_message(msg).await;
                }
            }
        }
    }

    async fn on_message(&mut self, msg: ToEngine) {
        match msg {
            ToEngine::Login {
                addr,
                request,
                reply,
            } => {
                reply.send(self.login(addr, request).await).ok();
            }
            ToEngine::Logout { token, reply } => {
                reply.send(self.logout(&token)).ok();
            }
            ToEngine::Bootstrap { reply } => {
                reply.send(self.bootstrap().await).ok();
            }
            ToEngine::State { token, reply } => {
                reply.send(self.state(&token).await).ok();
            }
            ToEngine::Versions {
                token,
                entity,
                reply,
            } => {
                reply.send(self.versions(&token, entity).await).ok();
            }
            ToEngine::UpdatePort {
                token,
                update,
                reply,
            } => {
                reply.send(self.update_port(&token, update).await).ok();
            }
            ToEngine::SetIspInfo { token, info, reply } => {
                reply.send(self.set_isp_info(&token, info).await).ok();
            }
            ToEngine::SetCompanionInfo { token, info, reply } => {
                reply.send(self.set_companion_info(&token, info).await).ok();
            }
            ToEngine::BindChannel {
                token,
                channel,
                reply,
            } => {
                reply.send(self.bind_channel(&token, channel)).ok();
            }
            ToEngine::UnbindChannel { token } => {
                self.router.unbind(&token);
            }
        }
    }

    async fn login(
        &mut self,
        addr: IpAddr,
        request: LoginRequest,
    ) -> Result<LoginResponse, EngineError> {
        let status = self.limiter.check_locked(addr);
        if status.locked {
            return Err(EngineError::RateLimited {
                remaining_ms: status.remaining_ms,
            });
        }

        let (credentials, whitelist) = self
            .store
            .read(|doc| (doc.credentials.clone(), doc.device_tokens.clone()))
            .await;

        let outcome = verify(
            &credentials,
            &whitelist,
            &self.token_list,
            request.username.as_deref(),
            request.password.as_deref(),
            request.device_token.as_deref(),
        );

        let (label, device_token) = match outcome {
            AuthOutcome::Rejected => {
                // Token-only attempts never feed the limiter; tokens are
                // high-entropy and not brute-forceable through this path.
                let attempted_password =
                    request.password.as_deref().is_some_and(|p| !p.is_empty());
                if !attempted_password {
                    return Err(EngineError::Unauthenticated);
                }
                return Err(match self.limiter.record_failure(addr) {
                    FailureOutcome::LockedOut { lockout_ms } => EngineError::RateLimited {
                        remaining_ms: lockout_ms,
                    },
                    FailureOutcome::AttemptsLeft(attempts_left) => {
                        EngineError::InvalidCredentials { attempts_left }
                    }
                });
            }
            AuthOutcome::PasswordMatch => {
                // Mint a fresh device token for this browser and whitelist
                // its digest.
                let minted = DeviceToken::generate();
                let digest = minted.digest();
                self.store
                    .mutate(|doc| doc.register_device_token(digest.as_str().to_string()))
                    .await?;
                (request.device_label.clone(), minted)
            }
            AuthOutcome::TokenMatch { label, legacy } => {
                let presented = request
                    .device_token
                    .clone()
                    .unwrap_or_default();
                if legacy {
                    // Replace the plaintext whitelist entry with its digest.
                    let digest = TokenDigest::of(&presented);
                    self.store
                        .mutate(|doc| {
                            for entry in &mut doc.device_tokens {
                                if *entry == presented {
                                    *entry = digest.as_str().to_string();
                                }
                            }
                        })
                        .await?;
                }
                let label = label.unwrap_or_else(|| request.device_label.clone());
                (label, DeviceToken::from(presented.as_str()))
            }
        };

        self.limiter.reset(addr);

        let (session, replaced) = self.registry.login(&label);
        if let Some(previous) = replaced {
            warn!(
                evicted = %previous.device_label,
                by = %session.device_label,
                "forced takeover of active session"
            );
            self.router.notify(
                &previous.token,
                ServerEvent::ForceLogout {
                    device_label: session.device_label.clone(),
                    login_at: session.login_at,
                },
            );
        }
        self.router.evict_stale(Some(&session.token));

        let state = self.store.read(ClientState::from_document).await;
        Ok(LoginResponse {
            success: true,
            token: session.token.as_str().to_string(),
            device_token: device_token.as_str().to_string(),
            state,
        })
    }

    fn logout(&mut self, token: &str) -> Result<(), EngineError> {
        if !self.registry.is_valid(token) {
            return Err(EngineError::Unauthenticated);
        }
        self.registry.logout();
        self.router.close_all();
        Ok(())
    }

    async fn bootstrap(&self) -> Result<BootstrapResponse, EngineError> {
        let versions = self.store.read(|doc| doc.ports.history().to_vec()).await;
        Ok(BootstrapResponse { versions })
    }

    async fn state(&mut self, token: &str) -> Result<ClientState, EngineError> {
        self.authorize(token)?;
        Ok(self.store.read(ClientState::from_document).await)
    }

    async fn versions(
        &mut self,
        token: &str,
        entity: EntityKind,
    ) -> Result<VersionsResponse, EngineError> {
        self.authorize(token)?;
        let response = self
            .store
            .read(|doc| match entity {
                EntityKind::Ports => VersionsResponse::Ports(doc.ports.history().to_vec()),
                EntityKind::IspDevice => {
                    VersionsResponse::IspDevice(sanitize_isp_versions(doc.isp_device.history()))
                }
                EntityKind::Companion => VersionsResponse::Companion(sanitize_companion_versions(
                    doc.companion.history(),
                )),
            })
            .await;
        Ok(response)
    }

    async fn update_port(
        &mut self,
        token: &str,
        update: PortUpdate,
    ) -> Result<PortsResponse, EngineError> {
        self.authorize(token)?;

        let update = PortUpdate {
            group: update.group,
            id: update.id.trim().to_string(),
            label: update.label.map(|s| s.trim().to_string()),
            status: update.status.map(|s| s.trim().to_string()),
            color: update.color.map(|s| s.trim().to_string()),
        };
        let group: PortGroup = update
            .group
            .parse()
            .map_err(|_| EngineError::ValidationFailed("unknown port group".to_string()))?;
        for field in [&update.label, &update.status] {
            if let Some(value) = field {
                check_len(value)?;
            }
        }
        if let Some(color) = &update.color {
            if !is_hex_color(color) {
                return Err(EngineError::ValidationFailed(
                    "color must be #RRGGBB".to_string(),
                ));
            }
        }

        let summary = self
            .store
            .read(|doc| {
                doc.ports
                    .current()
                    .group(group)
                    .iter()
                    .find(|port| port.id == update.id)
                    .map(|port| format!("Port changed: {}", port.label))
            })
            .await
            .ok_or_else(|| EngineError::NotFound(format!("port {}", update.id)))?;

        let changed = self
            .store
            .mutate(|doc| {
                doc.ports.update(&summary, self.clock.as_ref(), |ports| {
                    if let Some(port) = ports
                        .group_mut(group)
                        .iter_mut()
                        .find(|port| port.id == update.id)
                    {
                        if let Some(label) = &update.label {
                            port.label = label.clone();
                        }
                        if let Some(status) = &update.status {
                            port.status = status.clone();
                        }
                        if let Some(color) = &update.color {
                            port.color = color.clone();
                        }
                    }
                })
            })
            .await?;
        if changed {
            self.broadcast_change(EntityKind::Ports);
        }

        let response = self
            .store
            .read(|doc| PortsResponse {
                ok: true,
                switch_ports: doc.ports.current().switch_ports.clone(),
                router_ports: doc.ports.current().router_ports.clone(),
                versions: doc.ports.history().to_vec(),
            })
            .await;
        Ok(response)
    }

    async fn set_isp_info(
        &mut self,
        token: &str,
        info: IspDeviceInfo,
    ) -> Result<IspResponse, EngineError> {
        self.authorize(token)?;
        for value in [
            &info.wifi_name,
            &info.wifi_password,
            &info.serial_number,
            &info.configuration,
            &info.remote_url,
            &info.device_password,
            &info.modem_id,
        ] {
            check_len(value)?;
        }

        let changed = self
            .store
            .mutate(|doc| {
                doc.isp_device
                    .apply("ISP device changed", info, self.clock.as_ref())
            })
            .await?;
        if changed {
            self.broadcast_change(EntityKind::IspDevice);
        }

        let response = self
            .store
            .read(|doc| IspResponse {
                ok: true,
                isp_device: doc.isp_device.current().clone(),
                versions: sanitize_isp_versions(doc.isp_device.history()),
            })
            .await;
        Ok(response)
    }

    async fn set_companion_info(
        &mut self,
        token: &str,
        info: CompanionInfo,
    ) -> Result<CompanionResponse, EngineError> {
        self.authorize(token)?;
        for value in [
            &info.model,
            &info.hostname,
            &info.ip_address,
            &info.vpn_ip,
            &info.mac_address,
            &info.ssh_user,
            &info.ssh_password,
            &info.dns_url,
            &info.dns_remote_url,
        ] {
            check_len(value)?;
        }

        let changed = self
            .store
            .mutate(|doc| {
                doc.companion
                    .apply("Companion device changed", info, self.clock.as_ref())
            })
            .await?;
        if changed {
            self.broadcast_change(EntityKind::Companion);
        }

        let response = self
            .store
            .read(|doc| CompanionResponse {
                ok: true,
                companion: doc.companion.current().clone(),
                versions: sanitize_companion_versions(doc.companion.history()),
            })
            .await;
        Ok(response)
    }

    fn bind_channel(
        &mut self,
        token: &str,
        channel: PushChannel,
    ) -> Result<SessionToken, EngineError> {
        if !self.registry.authorize(token) {
            channel.close();
            return Err(EngineError::Unauthenticated);
        }
        let session_token = self
            .registry
            .current()
            .map(|session| session.token.clone())
            .ok_or(EngineError::Unauthenticated)?;
        self.router.bind(session_token.clone(), channel);
        Ok(session_token)
    }

    fn authorize(&mut self, token: &str) -> Result<(), EngineError> {
        if self.registry.authorize(token) {
            Ok(())
        } else {
            Err(EngineError::Unauthenticated)
        }
    }

    fn broadcast_change(&mut self, entity: EntityKind) {
        let live = self.registry.current().map(|s| s.token.clone());
        self.router
            .broadcast(live.as_ref(), ServerEvent::StateChanged { entity });
    }
}

fn check_len(value: &str) -> Result<(), EngineError> {
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(EngineError::ValidationFailed(format!(
            "field exceeds {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(())
}
