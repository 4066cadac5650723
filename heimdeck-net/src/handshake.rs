// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message-based channel handshake.
//!
//! A fresh push channel must authenticate with its first frame; nothing
//! else is processed before that. Channels that stay silent are closed
//! after [`AUTH_TIMEOUT`] so half-open transports cannot pile up.
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::timeout;

use crate::ChannelError;
use crate::message::ClientMessage;

/// How long a fresh channel may take to send its auth frame.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait for the handshake's auth frame and hand back the presented token.
///
/// Pings and pongs before authentication are ignored; the transport closing
/// or the timeout firing ends the handshake.
pub async fn read_auth_frame<S>(frames: &mut S) -> Result<String, ChannelError>
where
    S: futures_util::Stream<Item = Result<ClientMessage, ChannelError>> + Unpin,
{
    let deadline = timeout(AUTH_TIMEOUT, async {
        loop {
            match frames.next().await {
                Some(Ok(ClientMessage::Auth { token })) => return Ok(token),
                Some(Ok(_)) => continue,
                Some(Err(err)) => return Err(err),
                None => return Err(ChannelError::Closed),
            }
        }
    });
    deadline.await.map_err(|_| ChannelError::AuthTimeout)?
}

#[cfg(test)]
mod tests {
    use futures_util::stream;
    use tokio_stream::wrappers::ReceiverStream;

    use super::*;

    #[tokio::test]
    async fn returns_presented_token() {
        let mut frames = stream::iter(vec![
            Ok(ClientMessage::Ping),
            Ok(ClientMessage::Auth {
                token: "deadbeef".to_string(),
            }),
        ]);
        assert_eq!(read_auth_frame(&mut frames).await.unwrap(), "deadbeef");
    }

    #[tokio::test]
    async fn closed_transport_ends_handshake() {
        let mut frames = stream::iter(Vec::<Result<ClientMessage, ChannelError>>::new());
        assert!(matches!(
            read_auth_frame(&mut frames).await,
            Err(ChannelError::Closed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_channel_times_out() {
        let (_tx, rx) = tokio::sync::mpsc::channel::<Result<ClientMessage, ChannelError>>(1);
        let mut frames = ReceiverStream::new(rx);
        assert!(matches!(
            read_auth_frame(&mut frames).await,
            Err(ChannelError::AuthTimeout)
        ));
    }
}
