use thiserror::Error;

/// Argument contract violations, raised before any element is pulled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("at least one consumer is required")]
    NoConsumers,

    #[error("invalid cursor count: {0}")]
    InvalidCount(f64),
}

/// Failure of a consumer run over a fallible source.
#[derive(Debug, Error)]
pub enum RunError<E> {
    #[error(transparent)]
    Argument(#[from] Error),

    /// The source raised while being pulled. Every consumer that had not yet
    /// finished is abandoned.
    #[error("source failed: {0}")]
    Source(E),
}

/// Converts a floating-point cursor count into a `usize`, truncating toward zero.
///
/// ```
/// use stream_split::{cursor_count, Error};
///
/// assert_eq!(cursor_count(3.9), Ok(3));
/// assert_eq!(cursor_count(-0.5), Ok(0));
/// assert!(matches!(cursor_count(f64::NAN), Err(Error::InvalidCount(_))));
/// ```
pub fn cursor_count(count: f64) -> Result<usize, Error> {
    let truncated = count.trunc();
    // `usize::MAX as f64` rounds up to this bound on 64-bit targets.
    let bound = 2f64.powi(usize::BITS as i32);
    if !truncated.is_finite() || truncated < 0.0 || truncated >= bound {
        return Err(Error::InvalidCount(count));
    }
    Ok(truncated as usize)
}
