//! Runs several map/filter/reduce/for-each consumers over one sequence.
//!
//! Each consumer gets its own cursor from a single split of the source, so the source is
//! traversed once no matter how many consumers there are. Results come back in the order
//! the consumers were given.

use crate::error::{Error, RunError};
use crate::split::try_split;
use log::debug;
use std::convert::Infallible;
use std::fmt;

/// How the seed of a [`Consumer::Reduce`] is obtained.
pub enum Seed<T, R> {
    /// Start from this accumulator and apply the reducer from index 0.
    Initial(R),
    /// Convert the first element into the accumulator without calling the reducer, then
    /// apply the reducer from index 1.
    First(fn(T) -> R),
}

/// One consumer operation. Every callback receives the element's zero-based index.
pub enum Consumer<'a, T, R> {
    Map(Box<dyn FnMut(T, usize) -> R + 'a>),
    Filter(Box<dyn FnMut(&T, usize) -> bool + 'a>),
    Reduce {
        reducer: Box<dyn FnMut(R, T, usize) -> R + 'a>,
        seed: Seed<T, R>,
    },
    ForEach(Box<dyn FnMut(T, usize) + 'a>),
}

impl<'a, T, R> Consumer<'a, T, R> {
    pub fn map<F>(f: F) -> Self
    where
        F: FnMut(T, usize) -> R + 'a,
    {
        Consumer::Map(Box::new(f))
    }

    pub fn filter<F>(predicate: F) -> Self
    where
        F: FnMut(&T, usize) -> bool + 'a,
    {
        Consumer::Filter(Box::new(predicate))
    }

    /// A reduce seeded with `initial`.
    pub fn fold<F>(initial: R, f: F) -> Self
    where
        F: FnMut(R, T, usize) -> R + 'a,
    {
        Consumer::Reduce {
            reducer: Box::new(f),
            seed: Seed::Initial(initial),
        }
    }

    /// A reduce seeded with the first element.
    ///
    /// Over an empty source the result is [`Output::Reduced(None)`](Output::Reduced).
    pub fn reduce<F>(f: F) -> Self
    where
        F: FnMut(R, T, usize) -> R + 'a,
        T: Into<R>,
    {
        Consumer::Reduce {
            reducer: Box::new(f),
            seed: Seed::First(Into::into),
        }
    }

    pub fn for_each<F>(f: F) -> Self
    where
        F: FnMut(T, usize) + 'a,
    {
        Consumer::ForEach(Box::new(f))
    }

    fn kind(&self) -> &'static str {
        match self {
            Consumer::Map(_) => "map",
            Consumer::Filter(_) => "filter",
            Consumer::Reduce { .. } => "reduce",
            Consumer::ForEach(_) => "for_each",
        }
    }
}

impl<T, R> fmt::Debug for Consumer<'_, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Consumer").field(&self.kind()).finish()
    }
}

/// The result of one consumer, in the slot matching its position.
#[derive(Debug, Clone, PartialEq)]
pub enum Output<T, R> {
    Mapped(Vec<R>),
    Filtered(Vec<T>),
    /// `None` only when the reduce was seeded from the first element of an empty source.
    Reduced(Option<R>),
    /// The slot of a for-each consumer.
    Unit,
}

/// The order in which consumers are driven.
///
/// Both schedules produce identical results; they differ only in how much the shared
/// buffer has to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// Drain the first consumer's cursor completely, then the second, and so on. The
    /// buffer grows to the whole sequence while the first consumer runs.
    #[default]
    Sequential,
    /// Feed one element to every unfinished consumer per round. The buffer stays small.
    Interleaved,
}

enum State<'a, T, R> {
    Map {
        f: Box<dyn FnMut(T, usize) -> R + 'a>,
        out: Vec<R>,
    },
    Filter {
        predicate: Box<dyn FnMut(&T, usize) -> bool + 'a>,
        out: Vec<T>,
    },
    Reduce {
        reducer: Box<dyn FnMut(R, T, usize) -> R + 'a>,
        // `Seed::Initial` doubles as the running accumulator. Only `None` while the
        // reducer is running.
        acc: Option<Seed<T, R>>,
    },
    ForEach(Box<dyn FnMut(T, usize) + 'a>),
}

impl<'a, T, R> State<'a, T, R> {
    fn new(consumer: Consumer<'a, T, R>) -> Self {
        match consumer {
            Consumer::Map(f) => State::Map { f, out: Vec::new() },
            Consumer::Filter(predicate) => State::Filter {
                predicate,
                out: Vec::new(),
            },
            Consumer::Reduce { reducer, seed } => State::Reduce {
                reducer,
                acc: Some(seed),
            },
            Consumer::ForEach(f) => State::ForEach(f),
        }
    }

    fn feed(&mut self, item: T, index: usize) {
        match self {
            State::Map { f, out } => out.push(f(item, index)),
            State::Filter { predicate, out } => {
                if predicate(&item, index) {
                    out.push(item);
                }
            }
            State::Reduce { reducer, acc } => {
                *acc = acc.take().map(|seed| match seed {
                    Seed::Initial(acc) => Seed::Initial(reducer(acc, item, index)),
                    Seed::First(lift) => Seed::Initial(lift(item)),
                });
            }
            State::ForEach(f) => f(item, index),
        }
    }

    fn finish(self) -> Output<T, R> {
        match self {
            State::Map { out, .. } => Output::Mapped(out),
            State::Filter { out, .. } => Output::Filtered(out),
            State::Reduce { acc, .. } => match acc {
                Some(Seed::Initial(acc)) => Output::Reduced(Some(acc)),
                _ => Output::Reduced(None),
            },
            State::ForEach(_) => Output::Unit,
        }
    }
}

/// One consumer bound to its cursor.
struct Drain<'a, C, T, R> {
    cursor: C,
    state: State<'a, T, R>,
    index: usize,
    finished: bool,
}

impl<'a, C, T, R, E> Drain<'a, C, T, R>
where
    C: Iterator<Item = Result<T, E>>,
{
    /// Feeds the next element to the consumer. Returns `false` once the cursor has ended.
    fn step(&mut self) -> Result<bool, E> {
        if self.finished {
            return Ok(false);
        }
        match self.cursor.next() {
            Some(Ok(item)) => {
                self.state.feed(item, self.index);
                self.index += 1;
                Ok(true)
            }
            Some(Err(err)) => Err(err),
            None => {
                self.finished = true;
                Ok(false)
            }
        }
    }
}

/// Runs every consumer over a fallible `source` and returns one output per consumer.
///
/// The first `Err` yielded by the source aborts the run; the source is never pulled past
/// it.
pub fn try_run_consumers_with<'a, I, T, R, E>(
    source: I,
    consumers: Vec<Consumer<'a, T, R>>,
    schedule: Schedule,
) -> Result<Vec<Output<T, R>>, RunError<E>>
where
    I: IntoIterator<Item = Result<T, E>>,
    T: Clone,
    E: Clone,
{
    if consumers.is_empty() {
        return Err(Error::NoConsumers.into());
    }
    debug!(
        "running {} consumers with {:?} schedule",
        consumers.len(),
        schedule
    );

    let cursors = try_split(source, consumers.len());
    let mut drains: Vec<_> = cursors
        .into_iter()
        .zip(consumers)
        .map(|(cursor, consumer)| Drain {
            cursor,
            state: State::new(consumer),
            index: 0,
            finished: false,
        })
        .collect();

    match schedule {
        Schedule::Sequential => {
            for drain in &mut drains {
                while drain.step().map_err(RunError::Source)? {}
            }
        }
        Schedule::Interleaved => {
            let mut live = drains.len();
            while live > 0 {
                for drain in &mut drains {
                    if !drain.finished && !drain.step().map_err(RunError::Source)? {
                        live -= 1;
                    }
                }
            }
        }
    }

    Ok(drains.into_iter().map(|drain| drain.state.finish()).collect())
}

/// [`try_run_consumers_with`] using [`Schedule::Sequential`].
pub fn try_run_consumers<'a, I, T, R, E>(
    source: I,
    consumers: Vec<Consumer<'a, T, R>>,
) -> Result<Vec<Output<T, R>>, RunError<E>>
where
    I: IntoIterator<Item = Result<T, E>>,
    T: Clone,
    E: Clone,
{
    try_run_consumers_with(source, consumers, Schedule::default())
}

/// Runs every consumer over `source` using the given schedule.
pub fn run_consumers_with<'a, I, R>(
    source: I,
    consumers: Vec<Consumer<'a, I::Item, R>>,
    schedule: Schedule,
) -> Result<Vec<Output<I::Item, R>>, Error>
where
    I: IntoIterator,
    I::Item: Clone,
{
    let source = source.into_iter().map(Ok::<_, Infallible>);
    try_run_consumers_with(source, consumers, schedule).map_err(|err| match err {
        RunError::Argument(err) => err,
        RunError::Source(never) => match never {},
    })
}

/// Runs every consumer over `source` and returns one output per consumer, in order.
///
/// ```
/// use stream_split::{run_consumers, Consumer, Output};
///
/// let outputs = run_consumers(
///     vec![1, 2, 3, 4],
///     vec![
///         Consumer::map(|x, _| x * 2),
///         Consumer::filter(|x, _| x % 2 == 0),
///         Consumer::fold(0, |acc, x, _| acc + x),
///         Consumer::for_each(|_, _| {}),
///     ],
/// )
/// .unwrap();
///
/// assert_eq!(
///     outputs,
///     vec![
///         Output::Mapped(vec![2, 4, 6, 8]),
///         Output::Filtered(vec![2, 4]),
///         Output::Reduced(Some(10)),
///         Output::Unit,
///     ]
/// );
/// ```
pub fn run_consumers<'a, I, R>(
    source: I,
    consumers: Vec<Consumer<'a, I::Item, R>>,
) -> Result<Vec<Output<I::Item, R>>, Error>
where
    I: IntoIterator,
    I::Item: Clone,
{
    run_consumers_with(source, consumers, Schedule::default())
}
