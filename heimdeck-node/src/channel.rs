// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drives one push-channel transport against the engine.
use futures_util::{SinkExt, StreamExt};
use heimdeck_net::ChannelError;
use heimdeck_net::channel::PushChannel;
use heimdeck_net::codec::JsonCodec;
use heimdeck_net::handshake::read_auth_frame;
use heimdeck_net::message::{ClientMessage, ServerEvent};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::debug;

use crate::node::Node;

/// Serve one push channel over `transport` until it closes.
///
/// The first frame must authenticate with the live session token within the
/// handshake timeout; an unauthorized channel is dropped without a response
/// frame so probes cannot distinguish "bad token" from "no service". After
/// that, queued engine events are pumped out and incoming ping/pong frames
/// feed the heartbeat.
pub async fn serve_channel<T>(node: &Node, transport: T) -> Result<(), ChannelError>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let mut frames = Framed::new(transport, JsonCodec::<ClientMessage, ServerEvent>::new());

    let presented = read_auth_frame(&mut frames).await?;
    let (channel, mut events) = PushChannel::new();
    let token = node
        .bind_channel(&presented, channel.clone())
        .await
        .map_err(|_| ChannelError::Unauthorized)?;

    frames.send(ServerEvent::Auth { success: true }).await?;

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(event) => frames.send(event).await?,
                    None => break,
                }
            }
            frame = frames.next() => {
                match frame {
                    Some(Ok(ClientMessage::Ping | ClientMessage::Pong)) => {
                        channel.mark_alive();
                    }
                    Some(Ok(ClientMessage::Auth { .. })) => {
                        // Already authenticated; ignored.
                    }
                    Some(Err(err)) => {
                        debug!("push channel read failed: {err}");
                        break;
                    }
                    None => break,
                }
            }
            _ = channel.closed() => {
                // Flush events queued before the close (the force-logout
                // notification races the eviction that closes the channel).
                while let Ok(event) = events.try_recv() {
                    frames.send(event).await?;
                }
                break;
            }
        }
    }

    node.unbind_channel(token).await;
    Ok(())
}
