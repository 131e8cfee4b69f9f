use std::{error::Error, fmt, ptr, sync::Arc};

/// The reason a source terminated.
///
/// Delivered to every reader still waiting and to the notifier of every item discarded on abort.
#[derive(Clone, Debug)]
pub enum Termination {
    /// Graceful end: no more data, no error.
    ///
    /// Also a legal abort reason, meaning "stop now without error".
    End,
    /// Termination with an error, either supplied to an abort by the producer or passed by a
    /// reader as its abort signal.
    Error(Arc<dyn Error + Send + Sync + 'static>),
}

impl Termination {
    pub fn error<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Termination::Error(Arc::new(error))
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Termination::End)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Termination::Error(_))
    }

    pub fn as_error(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            Termination::End => None,
            Termination::Error(error) => Some(&**error),
        }
    }
}

/// Two errors are the same reason only if they share an allocation.
impl PartialEq for Termination {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Termination::End, Termination::End) => true,
            (Termination::Error(a), Termination::Error(b)) => {
                ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            },
            _ => false,
        }
    }
}

impl Eq for Termination {}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::End => f.write_str("end"),
            Termination::Error(error) => write!(f, "error: {error}"),
        }
    }
}

impl From<Arc<dyn Error + Send + Sync + 'static>> for Termination {
    fn from(error: Arc<dyn Error + Send + Sync + 'static>) -> Self {
        Termination::Error(error)
    }
}

/// Continuation handed to [`Source::read`].
///
/// Invoked exactly once, with either one value or the reason the source terminated.
pub type SourceCallback<T> = Box<dyn FnOnce(Result<T, Termination>) + Send>;

/// Completion notifier attached to a pushed item.
///
/// Invoked exactly once: `Ok(())` when the item reached a reader, `Err(reason)` when it was
/// discarded by an abort.
pub type Notifier = Box<dyn FnOnce(Result<(), Termination>) + Send>;

/// The read side of the pull protocol.
///
/// A reader asks for one value at a time. Passing `Some(reason)` as `abort` asks the source to
/// stop; the callback then resolves with a termination reason.
pub trait Source<T> {
    fn read(&self, abort: Option<Termination>, cb: SourceCallback<T>);
}

impl<T, S> Source<T> for Arc<S>
where
    S: Source<T> + ?Sized,
{
    fn read(&self, abort: Option<Termination>, cb: SourceCallback<T>) {
        (**self).read(abort, cb);
    }
}

