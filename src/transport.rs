//! Transport seam between a peer session and the encrypted byte stream.
//!
//! A transport hands whole decrypted messages to the session and accepts
//! whole messages to send. Framing, encryption and the connection handshake
//! all live behind this trait.

use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::error::TransportError;

/// A duplex message transport.
///
/// Both methods take `&self` so one transport can be read by the receive
/// loop while the send loop writes to it.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Waits for the next complete message.
    async fn read_message(&self) -> Result<Vec<u8>, TransportError>;

    /// Sends one complete message.
    async fn send_message(&self, bytes: &[u8]) -> Result<(), TransportError>;
}

/// In-process transport: one end of a connected pair.
///
/// ```
/// use ln_network::transport::{MemoryTransport, Transport};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (a, b) = MemoryTransport::pair();
/// a.send_message(&[0x00, 0x12]).await.unwrap();
/// assert_eq!(b.read_message().await.unwrap(), vec![0x00, 0x12]);
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryTransport {
    tx: StdMutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl MemoryTransport {
    /// Creates two connected ends. Whatever one end sends, the other reads.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();

        (Self::new(a_tx, a_rx), Self::new(b_tx, b_rx))
    }

    fn new(tx: mpsc::UnboundedSender<Vec<u8>>, rx: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self {
            tx: StdMutex::new(Some(tx)),
            rx: Mutex::new(rx),
        }
    }

    /// Closes the sending half.
    ///
    /// Messages already in flight are still delivered; after that the other
    /// end reads [`TransportError::Closed`]. Sends from this end fail with
    /// the same error.
    pub fn close(&self) {
        if let Ok(mut tx) = self.tx.lock() {
            tx.take();
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_message(&self) -> Result<Vec<u8>, TransportError> {
        self.rx.lock().await.recv().await.ok_or(TransportError::Closed)
    }

    async fn send_message(&self, bytes: &[u8]) -> Result<(), TransportError> {
        let tx = self
            .tx
            .lock()
            .map_err(|_| TransportError::Other("transport lock poisoned".into()))?;

        match tx.as_ref() {
            Some(tx) => tx.send(bytes.to_vec()).map_err(|_| TransportError::Closed),
            None => Err(TransportError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pair_is_duplex() {
        let (a, b) = MemoryTransport::pair();

        a.send_message(&[1]).await.unwrap();
        b.send_message(&[2]).await.unwrap();

        assert_eq!(b.read_message().await.unwrap(), vec![1]);
        assert_eq!(a.read_message().await.unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn preserves_order() {
        let (a, b) = MemoryTransport::pair();
        for i in 0..10u8 {
            a.send_message(&[i]).await.unwrap();
        }
        for i in 0..10u8 {
            assert_eq!(b.read_message().await.unwrap(), vec![i]);
        }
    }

    #[tokio::test]
    async fn close_drains_then_reports_closed() {
        let (a, b) = MemoryTransport::pair();
        a.send_message(&[7]).await.unwrap();
        a.close();

        assert!(matches!(a.send_message(&[8]).await, Err(TransportError::Closed)));
        assert_eq!(b.read_message().await.unwrap(), vec![7]);
        assert!(matches!(b.read_message().await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn dropped_end_closes_the_other() {
        let (a, b) = MemoryTransport::pair();
        drop(a);

        assert!(matches!(b.read_message().await, Err(TransportError::Closed)));
        assert!(matches!(b.send_message(&[1]).await, Err(TransportError::Closed)));
    }
}
