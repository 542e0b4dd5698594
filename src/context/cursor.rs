//! Position of a context inside its middleware chain.

/// Chain cursor.
///
/// ```text
/// NotStarted --next--> Running(0) --next--> Running(1) ... Running(last) --next--> Done
///      any state --abort--> Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// Fresh or reset context; nothing has run yet.
    #[default]
    NotStarted,
    /// The middleware at this index is the latest one entered.
    Running(usize),
    /// Past the last middleware, or aborted.
    Done,
}

impl Cursor {
    /// State after one `next()` over a chain of `len` middlewares.
    pub fn advance(self, len: usize) -> Cursor {
        let index = match self {
            Cursor::NotStarted => 0,
            Cursor::Running(current) => current + 1,
            Cursor::Done => return Cursor::Done,
        };

        if index < len {
            Cursor::Running(index)
        } else {
            Cursor::Done
        }
    }

    pub fn is_done(self) -> bool {
        self == Cursor::Done
    }

    /// Index of the middleware currently entered, if any.
    pub fn index(self) -> Option<usize> {
        match self {
            Cursor::Running(index) => Some(index),
            _ => None,
        }
    }
}
