use futures_util::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub const CONSUMERS: usize = 5;

/// A kilobyte-sized record, shared behind an `Arc` so that cloning it per cursor is cheap.
#[derive(Debug)]
pub struct Record {
    pub id: u64,
    pub body: [u8; 1024],
}

pub type SharedRecord = Arc<Record>;

fn records(count: u64) -> Vec<SharedRecord> {
    (0..count)
        .map(|id| Arc::new(Record { id, body: [0; 1024] }))
        .collect()
}

pub fn record_iter(count: u64) -> std::vec::IntoIter<SharedRecord> {
    records(count).into_iter()
}

pub fn record_stream(count: u64) -> stream::Iter<std::vec::IntoIter<SharedRecord>> {
    stream::iter(records(count))
}

/// Yields back to the executor once before every record.
pub struct YieldingStream {
    records: std::vec::IntoIter<SharedRecord>,
    yielded: bool,
}

impl Stream for YieldingStream {
    type Item = SharedRecord;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if !self.yielded {
            self.yielded = true;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        self.yielded = false;
        Poll::Ready(self.records.next())
    }
}

pub fn yielding_stream(count: u64) -> YieldingStream {
    YieldingStream {
        records: record_iter(count),
        yielded: false,
    }
}

/// Baseline: a spawned task forwards each record into one bounded channel per consumer.
pub fn channel_fan_out<S>(mut source: S, consumers: usize) -> Vec<ReceiverStream<SharedRecord>>
where
    S: Stream<Item = SharedRecord> + Unpin + Send + 'static,
{
    let (senders, receivers): (Vec<_>, Vec<_>) =
        (0..consumers).map(|_| mpsc::channel(1024)).unzip();

    tokio::spawn(async move {
        while let Some(record) = source.next().await {
            for sender in &senders {
                if sender.send(Arc::clone(&record)).await.is_err() {
                    return;
                }
            }
        }
    });
    receivers.into_iter().map(ReceiverStream::new).collect()
}
