//! Extension traits for splitting iterators and streams in method position.
//!
//! [`SplitExt`] adds `split_into` and `run_consumers` to anything that implements
//! [`IntoIterator`]; [`SplitStreamExt`] adds `split_stream` to every [`Stream`].

use crate::consumer::{run_consumers, Consumer, Output};
use crate::error::Error;
use crate::split::{split, Cursor};
use crate::split_stream::{split_stream, StreamCursor};
use futures_util::stream::Stream;

/// Extension trait for [`IntoIterator`] that provides `split_into` and `run_consumers`.
pub trait SplitExt: IntoIterator {
    /// Splits this sequence into `count` independent cursors. See [`split`](crate::split).
    ///
    /// ```
    /// use stream_split::SplitExt;
    ///
    /// let cursors = vec!["hello", "world"].split_into(2);
    /// for cursor in cursors {
    ///     assert_eq!(cursor.collect::<Vec<_>>(), vec!["hello", "world"]);
    /// }
    /// ```
    fn split_into(self, count: usize) -> Vec<Cursor<Self::IntoIter>>
    where
        Self: Sized,
        Self::Item: Clone,
    {
        split(self, count)
    }

    /// Runs every consumer over this sequence. See [`run_consumers`](crate::run_consumers).
    ///
    /// ```
    /// use stream_split::{Consumer, Output, SplitExt};
    ///
    /// let outputs = [2, 3, 4]
    ///     .run_consumers(vec![Consumer::reduce(|acc, x, _| acc * x)])
    ///     .unwrap();
    /// assert_eq!(outputs, vec![Output::Reduced(Some(24))]);
    /// ```
    fn run_consumers<'a, R>(
        self,
        consumers: Vec<Consumer<'a, Self::Item, R>>,
    ) -> Result<Vec<Output<Self::Item, R>>, Error>
    where
        Self: Sized,
        Self::Item: Clone,
    {
        run_consumers(self, consumers)
    }
}

impl<I> SplitExt for I where I: IntoIterator {}

/// Extension trait for [`Stream`] that provides the `split_stream` method.
pub trait SplitStreamExt: Stream {
    /// Splits this stream into `count` independent stream cursors.
    /// See [`split_stream`](crate::split_stream).
    ///
    /// ```
    /// use stream_split::SplitStreamExt;
    /// use futures_util::{stream, StreamExt};
    ///
    /// # tokio_test::block_on(async {
    /// let mut cursors = stream::iter(vec![1, 2, 3]).split_stream(2);
    /// let second = cursors.pop().unwrap();
    /// let first = cursors.pop().unwrap();
    /// assert_eq!(first.collect::<Vec<i32>>().await, vec![1, 2, 3]);
    /// assert_eq!(second.collect::<Vec<i32>>().await, vec![1, 2, 3]);
    /// # });
    /// ```
    fn split_stream(self, count: usize) -> Vec<StreamCursor<Self>>
    where
        Self: Sized + Unpin,
        Self::Item: Clone,
    {
        split_stream(self, count)
    }
}

impl<S> SplitStreamExt for S where S: Stream {}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use futures_util::StreamExt as FuturesStreamExt;

    #[test]
    fn test_split_into_trait_works() {
        let cursors = (1..=3).split_into(3);
        assert_eq!(cursors.len(), 3);
        for cursor in cursors {
            assert_eq!(cursor.collect::<Vec<i32>>(), vec![1, 2, 3]);
        }
    }

    #[test]
    fn test_run_consumers_trait_works() {
        let outputs = vec![1, 2, 3, 4]
            .run_consumers(vec![
                Consumer::map(|x, _| x * 2),
                Consumer::filter(|x, _| x % 2 == 0),
                Consumer::fold(0, |acc, x, _| acc + x),
                Consumer::for_each(|_, _| {}),
            ])
            .unwrap();
        assert_eq!(
            outputs,
            vec![
                Output::Mapped(vec![2, 4, 6, 8]),
                Output::Filtered(vec![2, 4]),
                Output::Reduced(Some(10)),
                Output::Unit,
            ]
        );
    }

    #[test]
    fn test_run_consumers_trait_rejects_no_consumers() {
        let result = vec![1].run_consumers::<i32>(Vec::new());
        assert_eq!(result, Err(Error::NoConsumers));
    }

    #[tokio::test]
    async fn test_split_stream_trait_works() {
        let data = vec![1, 2, 3];
        let cursors = stream::iter(data.clone()).split_stream(2);

        for cursor in cursors {
            let result: Vec<i32> = cursor.collect().await;
            assert_eq!(result, data);
        }
    }
}
