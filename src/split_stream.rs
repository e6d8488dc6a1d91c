use crate::split::{combine_size_hint, lock};
use crate::window::{End, Read, Window};
use futures_util::stream::{FusedStream, Stream};
use log::{debug, trace};
use std::convert::Infallible;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

type SizeHint = (usize, Option<usize>);

struct StreamShared<S>
where
    S: Stream + Unpin,
    S::Item: Clone,
{
    source: S,
    window: Window<S::Item, Infallible>,
    // Cursors parked at the frontier. The source only remembers the waker of whichever
    // cursor polled it last, so the others are woken whenever the frontier moves.
    waiters: Vec<Option<Waker>>,
    #[cfg(feature = "stats")]
    stats: crate::stats::Stats,
}

impl<S> StreamShared<S>
where
    S: Stream + Unpin,
    S::Item: Clone,
{
    fn wake_others(&mut self, index: usize) {
        for (other, waiter) in self.waiters.iter_mut().enumerate() {
            if other == index {
                *waiter = None;
            } else if let Some(waker) = waiter.take() {
                waker.wake();
            }
        }
    }

    fn poll_cursor(&mut self, index: usize, cx: &mut Context<'_>) -> Poll<Option<S::Item>> {
        match self.window.read(index) {
            Read::Item(item) => return Poll::Ready(Some(item)),
            Read::Exhausted => return Poll::Ready(None),
            Read::Failed(never) => match never {},
            Read::Frontier => {}
        }

        let polled = match Pin::new(&mut self.source).poll_next(cx) {
            Poll::Pending => {
                self.waiters[index] = Some(cx.waker().clone());
                return Poll::Pending;
            }
            Poll::Ready(Some(item)) => {
                trace!("stream cursor {} pulled a new item from the source", index);
                Some(self.window.append(index, item))
            }
            Poll::Ready(None) => {
                debug!("source stream exhausted; reached by cursor {}", index);
                self.window.finish(End::Exhausted);
                None
            }
        };
        #[cfg(feature = "stats")]
        self.stats.pulled(self.window.buffered());
        self.wake_others(index);
        Poll::Ready(polled)
    }
}

/// One of the independent cursors returned by [`split_stream`].
///
/// The async counterpart of [`Cursor`](crate::Cursor): every cursor yields every item of
/// the source stream, in order, and may be polled from any task at any rate.
///
/// # Examples
///
/// ```
/// use futures_util::{stream, StreamExt};
///
/// # tokio_test::block_on(async {
/// let data = vec!["hello", "world", "from", "rust"];
/// let mut cursors = stream_split::split_stream(stream::iter(data.clone()), 2);
/// let second = cursors.pop().unwrap();
/// let first = cursors.pop().unwrap();
///
/// let (result1, result2) = tokio::join!(
///     first.collect::<Vec<&str>>(),
///     second.collect::<Vec<&str>>()
/// );
///
/// assert_eq!(result1, data);
/// assert_eq!(result2, data);
/// # });
/// ```
///
/// # Requirements
///
/// - [`Unpin`]: required for polling the source without pinning it. For
///   [`!Unpin`](Unpin) streams, pin them first with [`Box::pin`].
/// - [`Stream::Item`]: must be [`Clone`]; every cursor receives its own clone.
pub struct StreamCursor<S>
where
    S: Stream + Unpin,
    S::Item: Clone,
{
    shared: Arc<Mutex<StreamShared<S>>>,
    index: usize,
    done: bool,
    #[cfg(feature = "stats")]
    stats: crate::stats::Stats,
}

impl<S> StreamCursor<S>
where
    S: Stream + Unpin,
    S::Item: Clone,
{
    fn terminate(&mut self) {
        if !self.done {
            self.done = true;
            // This cursor may have been the one whose waker the source holds.
            lock(&self.shared).wake_others(self.index);
            #[cfg(feature = "stats")]
            self.stats.cursor_finished();
        }
    }

    /// Marks this cursor terminal and hands `value` back to the caller.
    ///
    /// See [`Cursor::stop`](crate::Cursor::stop) for how a stopped cursor affects the
    /// shared buffer.
    pub fn stop<V>(&mut self, value: V) -> V {
        trace!("stream cursor {} stopped early", self.index);
        self.terminate();
        value
    }

    /// Marks this cursor terminal and returns `error` to the caller.
    pub fn fail<V, E>(&mut self, error: E) -> Result<V, E> {
        trace!("stream cursor {} failed early", self.index);
        self.terminate();
        Err(error)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Returns the number of items currently held by the split's shared buffer.
    pub fn buffered_len(&self) -> usize {
        lock(&self.shared).window.buffered()
    }

    /// Returns the number of buffered items this cursor has not read yet.
    pub fn pending_len(&self) -> usize {
        lock(&self.shared).window.pending(self.index)
    }

    /// Returns the metrics handle shared by every cursor of this split.
    ///
    /// ```
    /// use futures_util::{stream, StreamExt};
    ///
    /// # tokio_test::block_on(async {
    /// let mut cursors = stream_split::split_stream(stream::iter(vec![1, 2, 3]), 2);
    /// let stats = cursors[0].stats();
    /// assert_eq!(stats.active_cursors(), 2);
    ///
    /// let second = cursors.pop().unwrap();
    /// let _ = second.collect::<Vec<i32>>().await;
    /// assert_eq!(stats.active_cursors(), 1);
    /// assert_eq!(stats.source_pulls(), 4);
    /// # });
    /// ```
    #[cfg(feature = "stats")]
    #[cfg_attr(docsrs, doc(cfg(feature = "stats")))]
    pub fn stats(&self) -> crate::stats::Stats {
        self.stats.clone()
    }
}

impl<S> Stream for StreamCursor<S>
where
    S: Stream + Unpin,
    S::Item: Clone,
{
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        let index = self.index;
        let poll_result = lock(&self.shared).poll_cursor(index, cx);
        if let Poll::Ready(None) = poll_result {
            self.terminate();
        }
        poll_result
    }

    fn size_hint(&self) -> SizeHint {
        if self.done {
            return (0, Some(0));
        }
        let shared = lock(&self.shared);
        combine_size_hint(
            shared.window.pending(self.index),
            shared.window.is_ended(),
            shared.source.size_hint(),
        )
    }
}

impl<S> FusedStream for StreamCursor<S>
where
    S: Stream + Unpin,
    S::Item: Clone,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}

impl<S> Drop for StreamCursor<S>
where
    S: Stream + Unpin,
    S::Item: Clone,
{
    fn drop(&mut self) {
        // This cursor may have been the one whose waker the source holds.
        lock(&self.shared).wake_others(self.index);
        #[cfg(feature = "stats")]
        if !self.done {
            self.stats.cursor_finished();
        }
    }
}

impl<S> fmt::Debug for StreamCursor<S>
where
    S: Stream + Unpin,
    S::Item: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamCursor")
            .field("index", &self.index)
            .field("done", &self.done)
            .finish()
    }
}

/// Splits `stream` into `count` independent stream cursors.
///
/// The async counterpart of [`split`](crate::split). With `count == 0` the stream is
/// dropped without being polled.
pub fn split_stream<S>(stream: S, count: usize) -> Vec<StreamCursor<S>>
where
    S: Stream + Unpin,
    S::Item: Clone,
{
    if count == 0 {
        debug!("split stream into zero cursors; source left untouched");
        return Vec::new();
    }
    debug!("splitting stream into {} cursors", count);

    #[cfg(feature = "stats")]
    let stats = crate::stats::Stats::new(count);
    let shared = Arc::new(Mutex::new(StreamShared {
        source: stream,
        window: Window::new(count),
        waiters: vec![None; count],
        #[cfg(feature = "stats")]
        stats: stats.clone(),
    }));

    (0..count)
        .map(|index| StreamCursor {
            shared: Arc::clone(&shared),
            index,
            done: false,
            #[cfg(feature = "stats")]
            stats: stats.clone(),
        })
        .collect()
}
