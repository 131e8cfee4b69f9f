//! A pull-driven, buffered source.
//!
//! A [`Pushable`] lets a producer push values at its own pace while a single reader pulls them one
//! at a time through the [`Source`] protocol: the reader hands over a callback, which is invoked
//! exactly once with either the next value or the [`Termination`] reason. Producers finish the
//! source gracefully with [`Pushable::end`] or immediately with [`Pushable::abort`]; readers may
//! abort it too by passing a reason along with their read.

pub use crate::{
    core::{Notifier, Source, SourceCallback, Termination},
    for_each::for_each,
    pushable::{Builder, OnClose, Pushable},
    state::{Lifecycle, State},
};

mod core;
mod for_each;
mod invariants;
mod pushable;
mod state;
mod utils;
