use anyhow::Result;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;

use crate::{
    bus::wire::{encode_outbound_message, parse_inbound_message},
    types::{InboundEvent, OutboundMessage},
};

/// Reads NDJSON messages from `reader` into the agent's inbound queue until
/// EOF or shutdown. Malformed lines are logged and skipped, except broken
/// plan requests, which are forwarded so they can be rejected.
pub async fn pump_inbound<R>(
    reader: R,
    inbound_tx: mpsc::Sender<InboundEvent>,
    shutdown: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            tracing::info!(target: "bus", "inbound_stream_closed");
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_inbound_message(line) {
            Ok(event) => {
                if inbound_tx.send(event).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(target: "bus", error = %err, "ignoring_invalid_inbound_message");
            }
        }
    }
    Ok(())
}

/// Writes every outbound message as one NDJSON line until the channel
/// closes.
pub async fn pump_outbound<W>(
    mut writer: W,
    mut outbound_rx: mpsc::UnboundedReceiver<OutboundMessage>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbound_rx.recv().await {
        let encoded = encode_outbound_message(&message)?;
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}
