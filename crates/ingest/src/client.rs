use crate::events::{parse_line, ProducerEvent};
use std::path::{Path, PathBuf};
use tally_core::{Result, TallyError};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Channel size shared by all producer readers.
pub const CHANNEL_CAPACITY: usize = 64;

/// Create the channel every listener forwards into.
pub fn channel() -> (mpsc::Sender<ProducerEvent>, mpsc::Receiver<ProducerEvent>) {
    mpsc::channel(CHANNEL_CAPACITY)
}

/// Spawn a background task that reads lines from `reader` and forwards
/// parsed [`ProducerEvent`]s on `tx`. Blank lines are skipped.
///
/// The task ends at EOF or when all receivers are dropped.
pub fn spawn_line_reader<R>(reader: R, source: String, tx: mpsc::Sender<ProducerEvent>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if tx.send(parse_line(&line)).await.is_err() {
                        return; // all receivers dropped
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("{source}: read error: {e}");
                    break;
                }
            }
        }
        debug!("{source}: closed");
    });
}

/// Forward producer commands typed on standard input.
pub fn spawn_stdin_listener(tx: mpsc::Sender<ProducerEvent>) {
    spawn_line_reader(tokio::io::stdin(), "stdin".to_string(), tx);
}

/// Producer socket.
///
/// Any number of producers (one per monitored line or instrument) may be
/// connected at once; their commands are interleaved line by line.
pub struct ProducerSocket {
    path: PathBuf,
}

impl ProducerSocket {
    /// Bind `path` (replacing a stale socket file) and start accepting
    /// producers in the background. Must be called inside a Tokio runtime.
    pub fn bind(path: impl AsRef<Path>, tx: mpsc::Sender<ProducerEvent>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| TallyError::Ingest(format!("remove stale '{}': {e}", path.display())))?;
        }
        let listener = UnixListener::bind(&path)
            .map_err(|e| TallyError::Ingest(format!("bind '{}': {e}", path.display())))?;
        info!("Listening for producers on {}", path.display());

        tokio::spawn(async move {
            let mut next_id = 0u64;
            loop {
                match listener.accept().await {
                    Ok((stream, _)) => {
                        next_id += 1;
                        debug!("producer #{next_id} connected");
                        spawn_line_reader(stream, format!("producer #{next_id}"), tx.clone());
                    }
                    Err(e) => {
                        error!("Cannot accept producer connection: {e}; retrying in 1s");
                        tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
                    }
                }
                if tx.is_closed() {
                    break;
                }
            }
        });

        Ok(Self { path })
    }

    /// Path of the bound socket.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProducerSocket {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::Message;
    use tokio::io::AsyncWriteExt;
    use tokio::net::UnixStream;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn line_reader_skips_blank_lines() {
        let (tx, mut rx) = channel();
        spawn_line_reader(&b"increment>>OK\n\n  \nbogus\n"[..], "test".into(), tx);

        assert_eq!(
            rx.recv().await,
            Some(ProducerEvent::Command(Message::Increment { label: "OK".into(), amount: 1 }))
        );
        assert_eq!(rx.recv().await, Some(ProducerEvent::Unknown("bogus".into())));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn socket_accepts_several_producers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.sock");
        let (tx, mut rx) = channel();
        let socket = ProducerSocket::bind(&path, tx).unwrap();

        let mut a = UnixStream::connect(socket.path()).await.unwrap();
        let mut b = UnixStream::connect(socket.path()).await.unwrap();
        a.write_all(b"increment>>OK,2\n").await.unwrap();
        b.write_all(b"increment>>NG\n").await.unwrap();
        a.shutdown().await.unwrap();
        b.shutdown().await.unwrap();

        let mut total = 0;
        for _ in 0..2 {
            let event = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
            match event {
                ProducerEvent::Command(Message::Increment { amount, .. }) => total += amount,
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn stale_socket_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.sock");
        std::fs::write(&path, b"").unwrap();

        let (tx, _rx) = channel();
        let socket = ProducerSocket::bind(&path, tx).unwrap();
        assert!(UnixStream::connect(socket.path()).await.is_ok());
        drop(socket);
        assert!(!path.exists());
    }
}
