use std::{
    collections::VecDeque,
    fmt,
    marker::PhantomData,
    sync::{
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread,
};

use crate::{
    invariants::debug_assert_fully_drained,
    state::{Lifecycle, State},
    utils::{
        call,
        tracing::{instrument, trace},
    },
    Notifier, Source, SourceCallback, Termination,
};

#[cfg(feature = "tracing")]
use tracing::Span;

/// Hook invoked once, right after a pushable finishes, with its terminal reason.
pub type OnClose = Box<dyn FnOnce(&Termination) + Send>;

static NEXT_NAME: AtomicUsize = AtomicUsize::new(1);

/// A source that producers push values into and a single reader pulls values out of.
///
/// Values are buffered until a reader asks for them; readers wait until a value is pushed. Both
/// sides are served in FIFO order. [`end`][Pushable::end] finishes the source once every buffered
/// value has been read, while [`abort`][Pushable::abort] finishes it immediately, cancelling
/// buffered values and waiting readers alike.
///
/// Callbacks may reenter the pushable (push, read, end or abort from inside a reader callback or
/// a notifier). Work triggered that way is picked up by the drain loop already running, so the
/// stack does not grow and ordering is preserved.
///
/// Cloning a `Pushable` yields another handle to the same source.
///
/// # Examples
///
/// ```
/// use crossbeam_queue::SegQueue;
/// use std::sync::Arc;
///
/// use pushable::{for_each, Pushable, Termination};
///
/// let actual = Arc::new(SegQueue::new());
/// let closed = Arc::new(SegQueue::new());
///
/// let source = Pushable::builder()
///     .on_close({
///         let closed = Arc::clone(&closed);
///         move |reason: &Termination| closed.push(reason.clone())
///     })
///     .build();
///
/// source.push(1);
/// source.push(2);
///
/// for_each({
///     let actual = Arc::clone(&actual);
///     move |x| actual.push(x)
/// })(source.clone());
///
/// source.push(3);
/// source.end();
///
/// assert_eq!(
///     &{
///         let mut v = vec![];
///         while let Some(x) = actual.pop() {
///             v.push(x);
///         }
///         v
///     }[..],
///     [1, 2, 3]
/// );
/// assert_eq!(closed.pop(), Some(Termination::End));
/// assert!(!source.push(4));
/// ```
pub struct Pushable<T> {
    shared: Arc<Shared<T>>,
}

/// Configures a [`Pushable`] before it is created.
pub struct Builder<T> {
    name: Option<String>,
    on_close: Option<OnClose>,
    _marker: PhantomData<fn() -> T>,
}

struct Shared<T> {
    name: String,
    queue: Mutex<Queue<T>>,
    #[cfg(feature = "tracing")]
    span: Span,
}

struct Queue<T> {
    lifecycle: Lifecycle,
    buffer: VecDeque<BufferItem<T>>,
    readers: VecDeque<SourceCallback<T>>,
    /// Set while some call owns the drain loop.
    draining: bool,
    on_close: Option<OnClose>,
}

struct BufferItem<T> {
    data: T,
    notifier: Option<Notifier>,
}

/// One unit of drain work, taken out of the queue so it can run without holding the lock.
enum Step<T> {
    Deliver(SourceCallback<T>, BufferItem<T>),
    Discard(BufferItem<T>, Termination),
    Resolve(SourceCallback<T>, Termination),
    Close(Option<OnClose>, Termination),
}

/// Releases drain ownership if a callback unwinds through the drain loop.
struct DrainOwner<'a, T> {
    shared: &'a Shared<T>,
}

impl<T> Builder<T> {
    pub fn new() -> Self {
        Self {
            name: None,
            on_close: None,
            _marker: PhantomData,
        }
    }

    /// Names the pushable. Unnamed pushables are numbered in creation order, starting at `"1"`.
    pub fn name<N>(mut self, name: N) -> Self
    where
        N: Into<String>,
    {
        self.name = Some(name.into());
        self
    }

    /// Sets the hook invoked once the pushable finishes.
    pub fn on_close<F>(mut self, on_close: F) -> Self
    where
        F: FnOnce(&Termination) + Send + 'static,
    {
        self.on_close = Some(Box::new(on_close));
        self
    }

    pub fn build(self) -> Pushable<T> {
        let name = self
            .name
            .unwrap_or_else(|| NEXT_NAME.fetch_add(1, AtomicOrdering::Relaxed).to_string());
        Pushable {
            shared: Arc::new(Shared {
                #[cfg(feature = "tracing")]
                span: tracing::trace_span!("pushable", name = %name),
                name,
                queue: Mutex::new(Queue {
                    lifecycle: Lifecycle::new(),
                    buffer: VecDeque::new(),
                    readers: VecDeque::new(),
                    draining: false,
                    on_close: self.on_close,
                }),
            }),
        }
    }
}

impl<T> Default for Builder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Builder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("name", &self.name)
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

impl<T> Pushable<T> {
    pub fn new() -> Self {
        Builder::new().build()
    }

    pub fn named<N>(name: N) -> Self
    where
        N: Into<String>,
    {
        Builder::new().name(name).build()
    }

    pub fn builder() -> Builder<T> {
        Builder::new()
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Buffers `data` for the next reader.
    ///
    /// Returns `false`, dropping `data`, if the source is ending, aborting or finished.
    pub fn push(&self, data: T) -> bool {
        self.push_item(BufferItem {
            data,
            notifier: None,
        })
    }

    /// Buffers `data` for the next reader, with a notifier told how the value left the buffer.
    ///
    /// The notifier receives `Ok(())` once a reader got the value, or the abort reason if the
    /// value was discarded. If the push is rejected the notifier is dropped without being called.
    pub fn push_with<F>(&self, data: T, notifier: F) -> bool
    where
        F: FnOnce(Result<(), Termination>) + Send + 'static,
    {
        self.push_item(BufferItem {
            data,
            notifier: Some(Box::new(notifier)),
        })
    }

    fn push_item(&self, item: BufferItem<T>) -> bool {
        instrument!(parent: &self.shared.span, "push");
        {
            let mut queue = self.shared.lock();
            if !queue.lifecycle.is_normal() {
                trace!(state = ?queue.lifecycle.state(), "push rejected");
                return false;
            }
            queue.buffer.push_back(item);
            trace!(buffered = queue.buffer.len(), "push accepted");
        }
        self.drain();
        true
    }

    /// Ends the source once every buffered value has been read.
    ///
    /// Readers waiting after that resolve with [`Termination::End`]. No-op if the source is
    /// already ending, aborting or finished.
    pub fn end(&self) {
        instrument!(parent: &self.shared.span, "end");
        let requested = self.shared.lock().lifecycle.request_end();
        if !requested {
            return;
        }
        trace!("end requested");
        self.drain();
    }

    /// Finishes the source with `reason` right away.
    ///
    /// Buffered values are discarded, their notifiers and every waiting reader receiving `reason`.
    /// Supersedes a pending [`end`][Pushable::end]. No-op if the source is already aborting or
    /// finished.
    pub fn abort(&self, reason: Termination) {
        instrument!(parent: &self.shared.span, "abort");
        trace!("abort requested: {reason}");
        let requested = self.shared.lock().lifecycle.request_abort(reason);
        if !requested {
            return;
        }
        self.drain();
    }

    /// Asks for the next value.
    ///
    /// `cb` is called exactly once, with the next buffered value or with the reason the source
    /// finished. On a finished source it is called before `read` returns. Passing an `abort`
    /// reason aborts the source on the reader's behalf.
    pub fn read(&self, abort: Option<Termination>, cb: SourceCallback<T>) {
        instrument!(parent: &self.shared.span, "read");
        let mut queue = self.shared.lock();
        let finished = queue.lifecycle.finished().cloned();
        if let Some(reason) = finished {
            drop(queue);
            call!(cb, Err(reason), "source already finished: {reason}");
            return;
        }
        queue.readers.push_back(cb);
        trace!(waiting = queue.readers.len(), "read queued");
        if let Some(reason) = abort {
            trace!("abort signalled by reader: {reason}");
            queue.lifecycle.request_abort(reason);
        }
        drop(queue);
        self.drain();
    }

    /// Number of pushed values not yet handed to a reader.
    pub fn buffered(&self) -> usize {
        self.shared.lock().buffer.len()
    }

    /// Number of readers waiting for a value.
    pub fn waiting(&self) -> usize {
        self.shared.lock().readers.len()
    }

    pub fn state(&self) -> State {
        self.shared.lock().lifecycle.state().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.shared.lock().lifecycle.is_finished()
    }

    /// The reason the source finished with, if it has.
    pub fn finished(&self) -> Option<Termination> {
        self.shared.lock().lifecycle.finished().cloned()
    }

    /// Runs drain steps until none is left, unless another call already owns the loop.
    ///
    /// Ownership is given up under the same lock acquisition that found no work, so anything a
    /// callback queued is always seen by some drain loop.
    fn drain(&self) {
        {
            let mut queue = self.shared.lock();
            if queue.draining {
                trace!("drain re-entered");
                return;
            }
            queue.draining = true;
        }
        let _owner = DrainOwner {
            shared: &self.shared,
        };
        loop {
            let step = {
                let mut queue = self.shared.lock();
                match queue.next_step() {
                    Some(step) => step,
                    None => {
                        queue.draining = false;
                        return;
                    },
                }
            };
            step.run();
        }
    }
}

impl<T> Source<T> for Pushable<T> {
    fn read(&self, abort: Option<Termination>, cb: SourceCallback<T>) {
        Pushable::read(self, abort, cb);
    }
}

impl<T> Clone for Pushable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for Pushable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Pushable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.shared.lock();
        f.debug_struct("Pushable")
            .field("name", &self.shared.name)
            .field("state", queue.lifecycle.state())
            .field("buffered", &queue.buffer.len())
            .field("waiting", &queue.readers.len())
            .finish()
    }
}

impl<T> Shared<T> {
    /// Callbacks never run under this lock, so a poisoned queue is still consistent.
    fn lock(&self) -> MutexGuard<'_, Queue<T>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Queue<T> {
    /// Picks the next unit of work: abort first, then delivery, then end.
    fn next_step(&mut self) -> Option<Step<T>> {
        if let Some(reason) = self.lifecycle.pending_abort() {
            let reason = reason.clone();
            if let Some(item) = self.buffer.pop_front() {
                return Some(Step::Discard(item, reason));
            }
            if let Some(reader) = self.readers.pop_front() {
                return Some(Step::Resolve(reader, reason));
            }
            return Some(self.close(reason));
        }

        if !self.buffer.is_empty() && !self.readers.is_empty() {
            if let (Some(reader), Some(item)) = (self.readers.pop_front(), self.buffer.pop_front())
            {
                return Some(Step::Deliver(reader, item));
            }
        }

        if let Some(reason) = self.lifecycle.pending_end() {
            // values still buffered wait for more reads
            if !self.buffer.is_empty() {
                return None;
            }
            let reason = reason.clone();
            if let Some(reader) = self.readers.pop_front() {
                return Some(Step::Resolve(reader, reason));
            }
            return Some(self.close(reason));
        }

        None
    }

    fn close(&mut self, reason: Termination) -> Step<T> {
        debug_assert_fully_drained!(self.buffer.len(), self.readers.len());
        self.lifecycle.finalize(reason.clone());
        Step::Close(self.on_close.take(), reason)
    }
}

impl<T> Step<T> {
    fn run(self) {
        match self {
            Step::Deliver(reader, BufferItem { data, notifier }) => {
                call!(reader, Ok(data), "delivering to reader");
                if let Some(notifier) = notifier {
                    call!(notifier, Ok(()), "buffered value delivered");
                }
            },
            Step::Discard(BufferItem { data, notifier }, reason) => {
                drop(data);
                if let Some(notifier) = notifier {
                    call!(notifier, Err(reason), "buffered value discarded: {reason}");
                }
            },
            Step::Resolve(reader, reason) => {
                call!(reader, Err(reason), "resolving reader: {reason}");
            },
            Step::Close(on_close, reason) => {
                trace!("finished: {reason}");
                if let Some(on_close) = on_close {
                    call!(on_close, &reason, "calling close hook");
                }
            },
        }
    }
}

impl<T> Drop for DrainOwner<'_, T> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.shared.lock().draining = false;
        }
    }
}
