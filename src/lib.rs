//! A library for splitting one single-pass iterator or stream into several independent
//! cursors.
//!
//! [`split`] wraps any [`IntoIterator`] and hands back `N` [`Cursor`]s. Every cursor yields
//! the complete source sequence, in order, and may be advanced at its own pace, yet the
//! source itself is traversed exactly once. [`split_stream`] does the same for any
//! [`Stream`](futures_util::Stream), and [`run_consumers`] builds on the split to run several
//! map/filter/reduce/for-each consumers over one sequence.
//!
//! # Examples
//!
//! ```
//! use stream_split::split;
//!
//! let data = vec![1, 2, 3, 4, 5];
//! let mut cursors = split(data.clone(), 2);
//!
//! // Cursors are independent: drain the first completely, then the second.
//! let result1: Vec<i32> = cursors[0].by_ref().collect();
//! let result2: Vec<i32> = cursors[1].by_ref().collect();
//!
//! assert_eq!(result1, data);
//! assert_eq!(result2, data);
//! ```
//!
//! Running several consumers over one pass of the source:
//!
//! ```
//! use stream_split::{Consumer, Output, SplitExt};
//!
//! let outputs = vec![1, 2, 3, 4]
//!     .run_consumers(vec![
//!         Consumer::map(|x, _| x * 2),
//!         Consumer::filter(|x, _| x % 2 == 0),
//!         Consumer::fold(0, |acc, x, _| acc + x),
//!         Consumer::for_each(|x, i| println!("{}: {}", i, x)),
//!     ])
//!     .unwrap();
//!
//! assert_eq!(outputs[0], Output::Mapped(vec![2, 4, 6, 8]));
//! assert_eq!(outputs[1], Output::Filtered(vec![2, 4]));
//! assert_eq!(outputs[2], Output::Reduced(Some(10)));
//! assert_eq!(outputs[3], Output::Unit);
//! ```
//!
//! # Requirements
//!
//! Items must implement [`Clone`]: each cursor receives its own clone. For async
//! splitting the stream must also be [`Unpin`]; pin a [`!Unpin`](Unpin) stream with
//! [`Box::pin`] first.
//!
//! # Behavior
//!
//! All cursors of one split share a buffer of elements that have been pulled from the
//! source but not yet read by every cursor:
//!
//! - The source is pulled only when a cursor reaches the end of the buffer, so each element
//!   is pulled exactly once no matter how many cursors read it
//! - After every read, elements that all cursors have passed are dropped, so the buffer
//!   never holds more than the gap between the fastest and the slowest cursor
//! - The end of the source, or the first error of a source split with [`try_split`], is
//!   remembered and replayed to each cursor when it gets there
//! - A cursor that was stopped early with [`Cursor::stop`] or [`Cursor::fail`] (or simply
//!   dropped) keeps its position, so elements after it stay buffered
//!
//! # Thread Safety
//!
//! Cursors are [`Send`] and [`Sync`] when the source and its items are [`Send`]. The shared
//! buffer sits behind a mutex, so cursors of one split can be drained from different
//! threads or tasks.
//!
//! ```
//! use futures_util::{stream, StreamExt};
//! use tokio::task;
//!
//! # tokio_test::block_on(async {
//! let data = vec![1, 2, 3, 4, 5];
//! let mut cursors = stream_split::split_stream(stream::iter(data.clone()), 2);
//! let stream2 = cursors.pop().unwrap();
//! let stream1 = cursors.pop().unwrap();
//!
//! let handle1 = task::spawn(async move { stream1.collect::<Vec<i32>>().await });
//! let handle2 = task::spawn(async move { stream2.collect::<Vec<i32>>().await });
//!
//! let (result1, result2) = tokio::join!(handle1, handle2);
//! assert_eq!(result1.unwrap(), data);
//! assert_eq!(result2.unwrap(), data);
//! # });
//! ```
//!
//! # Performance Considerations
//!
//! - **Memory overhead**: a slow cursor makes the buffer hold everything the fast cursors
//!   have read since; draining cursors round-robin keeps it small
//! - **Synchronization cost**: every read takes the split's mutex
//! - **Item clones**: prefer small, cheap-to-clone items (consider `Arc<T>` for large data)
//!
//! # Features
//!
//! - `stats`: per-split [`Stats`] (active cursors, source pulls, peak buffer size)

#![cfg_attr(docsrs, feature(doc_cfg))]

mod consumer;
mod error;
mod ext;
mod split;
mod split_stream;
#[cfg(feature = "stats")]
mod stats;
mod window;

pub use consumer::{
    run_consumers, run_consumers_with, try_run_consumers, try_run_consumers_with, Consumer,
    Output, Schedule, Seed,
};
pub use error::{cursor_count, Error, RunError};
pub use ext::{SplitExt, SplitStreamExt};
pub use split::{split, try_split, Cursor, TryCursor};
pub use split_stream::{split_stream, StreamCursor};
#[cfg(feature = "stats")]
pub use stats::Stats;
