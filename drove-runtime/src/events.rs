//! JSON-lines event log.
use crate::error::RuntimeError;
use drove_core::MeasurementEvent;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Events buffered between the users and the writer.
pub const EVENTS_CAPACITY: usize = 8_192;

/// Write every received event as one JSON object per line until the channel closes.
///
/// Output is flushed whenever the channel runs dry, so an abandoned writer leaves a
/// complete file up to the last drained event.
#[instrument(name = "events", skip_all, fields(path = %path.as_ref().display()))]
pub async fn write_events(
    path: impl AsRef<Path>,
    mut rx: mpsc::Receiver<MeasurementEvent>,
) -> Result<u64, RuntimeError> {
    let file = File::create(path.as_ref()).await?;
    let mut out = BufWriter::new(file);
    let mut written = 0;

    while let Some(event) = rx.recv().await {
        write_line(&mut out, &event).await?;
        written += 1;
        while let Ok(event) = rx.try_recv() {
            write_line(&mut out, &event).await?;
            written += 1;
        }
        out.flush().await?;
    }

    out.flush().await?;
    debug!("Wrote {written} events");
    Ok(written)
}

async fn write_line<W>(out: &mut W, event: &MeasurementEvent) -> Result<(), RuntimeError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(event).map_err(std::io::Error::from)?;
    line.push(b'\n');
    out.write_all(&line).await?;
    Ok(())
}
