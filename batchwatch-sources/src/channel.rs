//! Channel-based source.
//!
//! Rows (or failures) are pushed in-process through a tokio watch channel
//! and handed out on the next fetch. Useful when another component already
//! receives the row, and for driving the refresh loop in tests.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::{FetchError, RawRow, SourceClient, SourceRef};

type Slot = Option<Result<Vec<String>, FetchError>>;

/// A source whose next fetch result is set through a channel.
///
/// Until something is sent, fetches fail with [`FetchError::EmptyRange`].
/// Each fetch returns the most recently sent value; sending an `Err`
/// simulates an upstream failure.
///
/// # Example
///
/// ```
/// use batchwatch_sources::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("test");
/// tx.send(Some(Ok(vec!["147".to_string()]))).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ChannelSource {
    receiver: watch::Receiver<Slot>,
    description: String,
}

impl ChannelSource {
    /// Create a new channel source.
    pub fn new(receiver: watch::Receiver<Slot>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
        }
    }

    /// Create a channel pair for feeding a ChannelSource.
    ///
    /// Returns (sender, source).
    pub fn create(source_description: &str) -> (watch::Sender<Slot>, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self::new(rx, source_description))
    }
}

#[async_trait]
impl SourceClient for ChannelSource {
    async fn fetch(&self, source: &SourceRef) -> Result<RawRow, FetchError> {
        let current = self.receiver.borrow().clone();
        match current {
            Some(Ok(cells)) => RawRow::conform(cells, source.width()),
            Some(Err(err)) => Err(err),
            None => Err(FetchError::EmptyRange(source.a1_notation())),
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceRef {
        SourceRef::new("mem", None, "A1:C1".parse().unwrap())
    }

    #[tokio::test]
    async fn test_channel_source_fetch() {
        let (tx, client) = ChannelSource::create("test");

        // Nothing sent yet
        let err = client.fetch(&source()).await.unwrap_err();
        assert_eq!(err, FetchError::EmptyRange("A1:C1".to_string()));

        tx.send(Some(Ok(vec!["1".into(), "2".into()]))).unwrap();
        let row = client.fetch(&source()).await.unwrap();
        assert_eq!(row.cells(), &["1", "2", ""]);

        // Repeated fetches see the same row
        assert_eq!(client.fetch(&source()).await.unwrap(), row);

        tx.send(Some(Err(FetchError::Network("down".into())))).unwrap();
        assert_eq!(
            client.fetch(&source()).await.unwrap_err(),
            FetchError::Network("down".into())
        );
    }

    #[test]
    fn test_description() {
        let (_tx, client) = ChannelSource::create("rows");
        assert_eq!(client.description(), "channel: rows");
    }
}
