use std::sync::Arc;

use crate::{utils::tracing::trace, Source, SourceCallback};

/// Sink that pulls every value out of a source, one read at a time, until the source terminates.
///
/// The next read is issued from inside the callback that received the previous value. On a
/// [`Pushable`][crate::Pushable] this reentrant read is picked up by the drain loop already
/// running, so consuming a long buffer does not grow the stack. If the source has nothing buffered
/// the sink simply waits; values pushed later are handed over as they arrive.
///
/// ```
/// use std::sync::{Arc, RwLock};
///
/// use pushable::{for_each, Pushable};
///
/// let actual = Arc::new(RwLock::new(vec![]));
/// let source = Pushable::new();
///
/// for_each({
///     let actual = Arc::clone(&actual);
///     move |x| actual.write().unwrap().push(x)
/// })(source.clone());
///
/// source.push("a");
/// source.push("b");
/// source.end();
///
/// assert_eq!(*actual.read().unwrap(), ["a", "b"]);
/// assert!(source.is_finished());
/// ```
pub fn for_each<T: 'static, F: 'static, S: 'static>(f: F) -> Box<dyn Fn(S)>
where
    F: Fn(T) + Send + Sync,
    S: Source<T> + Send + Sync,
{
    let f = Arc::new(f);
    Box::new(move |source| {
        pull(Arc::new(source), Arc::clone(&f));
    })
}

fn pull<T: 'static, F: 'static, S: 'static>(source: Arc<S>, f: Arc<F>)
where
    F: Fn(T) + Send + Sync,
    S: Source<T> + Send + Sync,
{
    let next = Arc::clone(&source);
    let cb: SourceCallback<T> = Box::new(move |message| match message {
        Ok(data) => {
            f(data);
            pull(next, f);
        },
        Err(_reason) => {
            trace!("for_each stopped: {_reason}");
        },
    });
    source.read(None, cb);
}
