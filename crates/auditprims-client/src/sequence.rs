use tracing::warn;

/// Correlation counter for requests sent on one session.
///
/// Starts at 0 and advances by one immediately before each guaranteed
/// transmission. Values stay within the non-negative `i16` range the
/// kernel echoes back intact: the value after `i16::MAX` is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceTracker {
    last: i16,
}

impl SequenceTracker {
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    /// Resume from a previously assigned value. Negative values reset to 0.
    pub const fn resume_from(last: i16) -> Self {
        if last < 0 {
            Self { last: 0 }
        } else {
            Self { last }
        }
    }

    /// The most recently assigned sequence number (0 before any send).
    pub fn current(&self) -> i16 {
        self.last
    }

    /// Assign the next sequence number.
    pub fn advance(&mut self) -> i16 {
        self.last = match self.last.checked_add(1) {
            Some(next) => next,
            None => {
                warn!("audit to kernel sequence number has rolled over");
                0
            }
        };
        self.last
    }
}
