use crate::window::{End, Read, Window};
use log::{debug, trace};
use std::convert::Infallible;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type SizeHint = (usize, Option<usize>);

/// Locks split state, recovering it if a panicking source poisoned the mutex.
///
/// The window is only mutated after a pull has returned, so it is consistent even when
/// the source itself panicked mid-pull.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Combines the elements buffered ahead of a cursor with what the source still promises.
pub(crate) fn combine_size_hint(pending: usize, ended: bool, source: SizeHint) -> SizeHint {
    if ended {
        return (pending, Some(pending));
    }
    let (lower, upper) = source;
    (
        pending.saturating_add(lower),
        upper.and_then(|upper| upper.checked_add(pending)),
    )
}

/// A pull-based source whose outcome is either an element or a failure.
pub(crate) trait Source {
    type Item: Clone;
    type Error: Clone;

    fn pull(&mut self) -> Option<Result<Self::Item, Self::Error>>;

    fn size_hint(&self) -> SizeHint;
}

/// An ordinary iterator; it cannot fail.
pub(crate) struct Plain<I>(I);

impl<I> Source for Plain<I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = I::Item;
    type Error = Infallible;

    fn pull(&mut self) -> Option<Result<Self::Item, Self::Error>> {
        self.0.next().map(Ok)
    }

    fn size_hint(&self) -> SizeHint {
        self.0.size_hint()
    }
}

/// An iterator of results; the first `Err` ends the source for every cursor.
pub(crate) struct Fallible<I>(I);

impl<I, T, E> Source for Fallible<I>
where
    I: Iterator<Item = Result<T, E>>,
    T: Clone,
    E: Clone,
{
    type Item = T;
    type Error = E;

    fn pull(&mut self) -> Option<Result<T, E>> {
        self.0.next()
    }

    fn size_hint(&self) -> SizeHint {
        self.0.size_hint()
    }
}

struct Shared<S: Source> {
    source: S,
    window: Window<S::Item, S::Error>,
    #[cfg(feature = "stats")]
    stats: crate::stats::Stats,
}

/// The cursor machinery shared by [`Cursor`] and [`TryCursor`].
pub(crate) struct Handle<S: Source> {
    shared: Arc<Mutex<Shared<S>>>,
    index: usize,
    done: bool,
    #[cfg(feature = "stats")]
    stats: crate::stats::Stats,
}

impl<S: Source> Handle<S> {
    fn spawn(source: S, count: usize) -> Vec<Self> {
        if count == 0 {
            debug!("split into zero cursors; source left untouched");
            return Vec::new();
        }
        debug!("splitting source into {} cursors", count);

        #[cfg(feature = "stats")]
        let stats = crate::stats::Stats::new(count);
        let shared = Arc::new(Mutex::new(Shared {
            source,
            window: Window::new(count),
            #[cfg(feature = "stats")]
            stats: stats.clone(),
        }));

        (0..count)
            .map(|index| Handle {
                shared: Arc::clone(&shared),
                index,
                done: false,
                #[cfg(feature = "stats")]
                stats: stats.clone(),
            })
            .collect()
    }

    fn terminate(&mut self) {
        if !self.done {
            self.done = true;
            #[cfg(feature = "stats")]
            self.stats.cursor_finished();
        }
    }

    fn next(&mut self) -> Option<Result<S::Item, S::Error>> {
        if self.done {
            return None;
        }

        let next = self.advance();
        // Both the end and a failure are terminal for this cursor.
        if !matches!(next, Some(Ok(_))) {
            self.terminate();
        }
        next
    }

    fn advance(&self) -> Option<Result<S::Item, S::Error>> {
        let mut guard = lock(&self.shared);
        let shared = &mut *guard;
        match shared.window.read(self.index) {
            Read::Item(item) => return Some(Ok(item)),
            Read::Exhausted => return None,
            Read::Failed(err) => return Some(Err(err)),
            Read::Frontier => {}
        }

        let next = match shared.source.pull() {
            Some(Ok(item)) => {
                trace!("cursor {} pulled a new item from the source", self.index);
                Some(Ok(shared.window.append(self.index, item)))
            }
            Some(Err(err)) => {
                debug!("source failed; error captured by cursor {}", self.index);
                shared.window.finish(End::Failed(err.clone()));
                Some(Err(err))
            }
            None => {
                debug!("source exhausted; reached by cursor {}", self.index);
                shared.window.finish(End::Exhausted);
                None
            }
        };
        #[cfg(feature = "stats")]
        shared.stats.pulled(shared.window.buffered());
        next
    }

    fn stop(&mut self) {
        trace!("cursor {} stopped early", self.index);
        self.terminate();
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

    fn buffered(&self) -> usize {
        lock(&self.shared).window.buffered()
    }

    fn pending(&self) -> usize {
        lock(&self.shared).window.pending(self.index)
    }
}

impl<S: Source> fmt::Debug for Handle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("index", &self.index)
            .field("done", &self.done)
            .finish()
    }
}

// A dropped cursor keeps its read position, like one stopped early.
#[cfg(feature = "stats")]
impl<S: Source> Drop for Handle<S> {
    fn drop(&mut self) {
        if !self.done {
            self.stats.cursor_finished();
        }
    }
}

/// One of the independent cursors returned by [`split`].
///
/// Every cursor of a split yields the full source sequence, in order, at its own pace.
/// Elements are cloned out of a buffer shared with the sibling cursors; the buffer only
/// holds elements some sibling has not read yet.
pub struct Cursor<I>
where
    I: Iterator,
    I::Item: Clone,
{
    inner: Handle<Plain<I>>,
}

impl<I> Cursor<I>
where
    I: Iterator,
    I::Item: Clone,
{
    /// Marks this cursor terminal and hands `value` back to the caller.
    ///
    /// The cursor's read position is frozen where it stopped and still counts towards
    /// eviction, so elements after it stay buffered until the split is dropped.
    ///
    /// ```
    /// let mut cursors = stream_split::split(vec![1, 2, 3], 2);
    /// assert_eq!(cursors[0].next(), Some(1));
    /// assert_eq!(cursors[0].stop("enough"), "enough");
    /// assert_eq!(cursors[0].next(), None);
    /// assert_eq!(cursors[1].by_ref().collect::<Vec<_>>(), vec![1, 2, 3]);
    /// ```
    pub fn stop<V>(&mut self, value: V) -> V {
        self.inner.stop();
        value
    }

    /// Marks this cursor terminal and returns `error` to the caller.
    ///
    /// The shared source and the sibling cursors are unaffected.
    pub fn fail<V, E>(&mut self, error: E) -> Result<V, E> {
        trace!("cursor {} failed early", self.inner.index);
        self.inner.terminate();
        Err(error)
    }

    /// Returns `true` once this cursor has signalled its end or been stopped.
    pub fn is_done(&self) -> bool {
        self.inner.done
    }

    /// Returns the number of elements currently held by the split's shared buffer.
    pub fn buffered_len(&self) -> usize {
        self.inner.buffered()
    }

    /// Returns the number of buffered elements this cursor has not read yet.
    pub fn pending_len(&self) -> usize {
        self.inner.pending()
    }

    /// Returns the metrics handle shared by every cursor of this split.
    #[cfg(feature = "stats")]
    #[cfg_attr(docsrs, doc(cfg(feature = "stats")))]
    pub fn stats(&self) -> crate::stats::Stats {
        self.inner.stats.clone()
    }
}

impl<I> Iterator for Cursor<I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|item| match item {
            Ok(item) => item,
            Err(never) => match never {},
        })
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<I> FusedIterator for Cursor<I>
where
    I: Iterator,
    I::Item: Clone,
{
}

impl<I> fmt::Debug for Cursor<I>
where
    I: Iterator,
    I::Item: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

/// One of the independent cursors returned by [`try_split`].
///
/// Yields `Ok` elements like [`Cursor`]. When the source yields an `Err`, the error is
/// captured once and each cursor receives its own clone of it when it reaches that point,
/// after which the cursor is terminal. The source is never pulled past a failure.
pub struct TryCursor<I, T, E>
where
    I: Iterator<Item = Result<T, E>>,
    T: Clone,
    E: Clone,
{
    inner: Handle<Fallible<I>>,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<I, T, E> TryCursor<I, T, E>
where
    I: Iterator<Item = Result<T, E>>,
    T: Clone,
    E: Clone,
{
    /// See [`Cursor::stop`].
    pub fn stop<V>(&mut self, value: V) -> V {
        self.inner.stop();
        value
    }

    /// See [`Cursor::fail`].
    pub fn fail<V, F>(&mut self, error: F) -> Result<V, F> {
        trace!("cursor {} failed early", self.inner.index);
        self.inner.terminate();
        Err(error)
    }

    pub fn is_done(&self) -> bool {
        self.inner.done
    }

    pub fn buffered_len(&self) -> usize {
        self.inner.buffered()
    }

    pub fn pending_len(&self) -> usize {
        self.inner.pending()
    }

    #[cfg(feature = "stats")]
    #[cfg_attr(docsrs, doc(cfg(feature = "stats")))]
    pub fn stats(&self) -> crate::stats::Stats {
        self.inner.stats.clone()
    }
}

impl<I, T, E> Iterator for TryCursor<I, T, E>
where
    I: Iterator<Item = Result<T, E>>,
    T: Clone,
    E: Clone,
{
    type Item = Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<I, T, E> FusedIterator for TryCursor<I, T, E>
where
    I: Iterator<Item = Result<T, E>>,
    T: Clone,
    E: Clone,
{
}

impl<I, T, E> fmt::Debug for TryCursor<I, T, E>
where
    I: Iterator<Item = Result<T, E>>,
    T: Clone,
    E: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

/// Splits `source` into `count` independent cursors.
///
/// Each cursor yields every element of `source`, in order, and may be advanced at any
/// rate relative to its siblings. The source is pulled exactly once per element (plus
/// the pull that reports its end) no matter how many cursors read it. With `count == 0`
/// the source is dropped without being pulled.
///
/// ```
/// let mut cursors = stream_split::split(vec![10, 20, 30], 2);
/// let second = cursors.pop().unwrap();
/// let first = cursors.pop().unwrap();
///
/// assert_eq!(first.collect::<Vec<_>>(), vec![10, 20, 30]);
/// assert_eq!(second.collect::<Vec<_>>(), vec![10, 20, 30]);
/// ```
pub fn split<I>(source: I, count: usize) -> Vec<Cursor<I::IntoIter>>
where
    I: IntoIterator,
    I::Item: Clone,
{
    Handle::spawn(Plain(source.into_iter()), count)
        .into_iter()
        .map(|inner| Cursor { inner })
        .collect()
}

/// Splits a fallible `source` into `count` independent cursors.
///
/// ```
/// let source = vec![Ok(1), Err("bad block"), Ok(3)];
/// let mut cursors = stream_split::try_split(source, 2);
///
/// for cursor in &mut cursors {
///     assert_eq!(cursor.next(), Some(Ok(1)));
///     assert_eq!(cursor.next(), Some(Err("bad block")));
///     assert_eq!(cursor.next(), None);
/// }
/// ```
pub fn try_split<I, T, E>(source: I, count: usize) -> Vec<TryCursor<I::IntoIter, T, E>>
where
    I: IntoIterator<Item = Result<T, E>>,
    T: Clone,
    E: Clone,
{
    Handle::spawn(Fallible(source.into_iter()), count)
        .into_iter()
        .map(|inner| TryCursor {
            inner,
            _marker: PhantomData,
        })
        .collect()
}
