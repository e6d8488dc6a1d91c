//! The buffer window shared by every cursor of one split.
//!
//! The window holds elements that have been pulled from the source but not yet read by
//! every cursor, plus one read position per cursor counted from the front of the window.
//! After each advance the window drops the prefix every cursor has passed and rebases all
//! positions, so its length is always the spread between the fastest and the slowest
//! cursor.

use log::trace;
use std::collections::VecDeque;

/// How the source ended. Cached so the source is never pulled again.
#[derive(Debug, Clone)]
pub(crate) enum End<E> {
    Exhausted,
    Failed(E),
}

/// Result of reading from the window on behalf of one cursor.
#[derive(Debug, PartialEq)]
pub(crate) enum Read<T, E> {
    /// A buffered element; the cursor has been advanced past it.
    Item(T),
    /// The cursor has read everything buffered and the source is still live.
    Frontier,
    Exhausted,
    Failed(E),
}

#[derive(Debug)]
pub(crate) struct Window<T, E> {
    buffer: VecDeque<T>,
    positions: Vec<usize>,
    end: Option<End<E>>,
}

impl<T, E> Window<T, E>
where
    T: Clone,
    E: Clone,
{
    pub(crate) fn new(count: usize) -> Self {
        Window {
            buffer: VecDeque::new(),
            positions: vec![0; count],
            end: None,
        }
    }

    /// Reads the next buffered element for cursor `index`, or reports why there is none.
    pub(crate) fn read(&mut self, index: usize) -> Read<T, E> {
        let position = self.positions[index];
        if let Some(item) = self.buffer.get(position) {
            let item = item.clone();
            self.positions[index] += 1;
            self.evict();
            return Read::Item(item);
        }

        match &self.end {
            None => Read::Frontier,
            Some(End::Exhausted) => Read::Exhausted,
            Some(End::Failed(err)) => Read::Failed(err.clone()),
        }
    }

    /// Appends an element freshly pulled by cursor `index`, which must be at the frontier.
    pub(crate) fn append(&mut self, index: usize, item: T) -> T {
        debug_assert_eq!(self.positions[index], self.buffer.len());

        // Nobody else will ever read it.
        if self.positions.len() == 1 {
            return item;
        }

        self.buffer.push_back(item.clone());
        self.positions[index] += 1;
        self.evict();
        item
    }

    pub(crate) fn finish(&mut self, end: End<E>) {
        if self.end.is_none() {
            self.end = Some(end);
        }
    }

    pub(crate) fn is_ended(&self) -> bool {
        self.end.is_some()
    }

    pub(crate) fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Buffered elements cursor `index` has not read yet.
    pub(crate) fn pending(&self, index: usize) -> usize {
        self.buffer.len() - self.positions[index]
    }

    fn evict(&mut self) {
        // Positions of terminal cursors are frozen but still count, so a cursor that was
        // stopped early keeps everything after its last read alive.
        let min = self.positions.iter().copied().min().unwrap_or(0);
        if min == 0 {
            return;
        }

        self.buffer.drain(..min);
        for position in &mut self.positions {
            *position -= min;
        }
        trace!("evicted {} buffered items, {} remain", min, self.buffer.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestWindow = Window<i32, &'static str>;

    fn assert_spread(window: &TestWindow) {
        let max = window.positions.iter().max().copied().unwrap_or(0);
        let min = window.positions.iter().min().copied().unwrap_or(0);
        assert_eq!(window.buffered(), max - min);
        assert!(window.positions.iter().all(|&p| p <= window.buffered()));
    }

    #[test]
    fn test_fresh_window_is_at_frontier() {
        let mut window = TestWindow::new(3);
        for index in 0..3 {
            assert_eq!(window.read(index), Read::Frontier);
        }
        assert_eq!(window.buffered(), 0);
    }

    #[test]
    fn test_append_then_read_by_slower_cursor() {
        let mut window = TestWindow::new(2);
        assert_eq!(window.append(0, 10), 10);
        assert_eq!(window.append(0, 20), 20);
        assert_eq!(window.buffered(), 2);
        assert_eq!(window.pending(1), 2);
        assert_spread(&window);

        assert_eq!(window.read(1), Read::Item(10));
        assert_eq!(window.buffered(), 1);
        assert_spread(&window);

        assert_eq!(window.read(1), Read::Item(20));
        assert_eq!(window.buffered(), 0);
        assert_eq!(window.read(1), Read::Frontier);
        assert_eq!(window.read(0), Read::Frontier);
    }

    #[test]
    fn test_single_cursor_never_buffers() {
        let mut window = TestWindow::new(1);
        for i in 0..5 {
            assert_eq!(window.append(0, i), i);
            assert_eq!(window.buffered(), 0);
        }
    }

    #[test]
    fn test_eviction_waits_for_the_slowest_cursor() {
        let mut window = TestWindow::new(3);
        for i in 0..4 {
            window.append(0, i);
        }
        assert_eq!(window.read(1), Read::Item(0));
        assert_eq!(window.read(1), Read::Item(1));
        // Cursor 2 has read nothing, so nothing can go.
        assert_eq!(window.buffered(), 4);
        assert_spread(&window);

        assert_eq!(window.read(2), Read::Item(0));
        assert_eq!(window.buffered(), 3);
        assert_spread(&window);
    }

    #[test]
    fn test_end_is_replayed_only_at_the_frontier() {
        let mut window = TestWindow::new(2);
        window.append(0, 1);
        window.finish(End::Exhausted);
        assert!(window.is_ended());

        assert_eq!(window.read(0), Read::Exhausted);
        assert_eq!(window.read(1), Read::Item(1));
        assert_eq!(window.read(1), Read::Exhausted);
    }

    #[test]
    fn test_failure_is_cloned_to_every_reader() {
        let mut window = TestWindow::new(2);
        window.finish(End::Failed("boom"));
        assert_eq!(window.read(0), Read::Failed("boom"));
        assert_eq!(window.read(1), Read::Failed("boom"));
    }

    #[test]
    fn test_first_end_wins() {
        let mut window = TestWindow::new(1);
        window.finish(End::Failed("first"));
        window.finish(End::Exhausted);
        assert_eq!(window.read(0), Read::Failed("first"));
    }
}
