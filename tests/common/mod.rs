#![allow(dead_code)]

use crossbeam_queue::SegQueue;
use std::{error::Error, fmt, sync::Arc};

use pushable::{SourceCallback, Termination};

#[derive(Debug)]
pub struct Boom(pub &'static str);

impl fmt::Display for Boom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Error for Boom {}

pub fn boom(message: &'static str) -> Termination {
    Termination::error(Boom(message))
}

/// Everything observable from outside a pushable, in the order it happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event<T> {
    /// A reader received a value.
    Data(T),
    /// A reader was resolved with a termination reason.
    Terminated(Termination),
    /// The notifier of the tagged value reported delivery.
    Delivered(T),
    /// The notifier of the tagged value reported it was discarded.
    Discarded(T, Termination),
    /// The close hook ran.
    Closed(Termination),
}

pub type Log<T> = Arc<SegQueue<Event<T>>>;

pub fn log<T>() -> Log<T> {
    Arc::new(SegQueue::new())
}

/// Pops every event recorded so far.
pub fn events<T>(log: &Log<T>) -> Vec<Event<T>> {
    let mut v = vec![];
    while let Some(event) = log.pop() {
        v.push(event);
    }
    v
}

pub fn reader<T: Send + 'static>(log: &Log<T>) -> SourceCallback<T> {
    let log = Arc::clone(log);
    Box::new(move |message| {
        log.push(match message {
            Ok(data) => Event::Data(data),
            Err(reason) => Event::Terminated(reason),
        })
    })
}

pub fn notifier<T: Send + 'static>(
    log: &Log<T>,
    tag: T,
) -> impl FnOnce(Result<(), Termination>) + Send + 'static {
    let log = Arc::clone(log);
    move |result| {
        log.push(match result {
            Ok(()) => Event::Delivered(tag),
            Err(reason) => Event::Discarded(tag, reason),
        })
    }
}

pub fn on_close<T: Send + 'static>(log: &Log<T>) -> impl FnOnce(&Termination) + Send + 'static {
    let log = Arc::clone(log);
    move |reason| log.push(Event::Closed(reason.clone()))
}
