use crate::{
    invariants::{debug_assert_finalize_reachable, debug_assert_same_reason},
    Termination,
};

/// Where a source is in its life.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum State {
    /// Accepting pushes and reads.
    #[default]
    Normal,
    /// A graceful end was requested; buffered items are still being delivered.
    EndRequested(Termination),
    /// An abort was requested; everything outstanding is to be cancelled.
    AbortRequested(Termination),
    /// Terminated with the recorded reason. No further transitions.
    Finished(Termination),
}

/// The lifecycle state machine of a pushable source.
///
/// Pure data: transitions report whether they happened and leave acting on them to the caller.
///
/// ```
/// use pushable::{Lifecycle, Termination};
///
/// let mut lifecycle = Lifecycle::new();
/// assert!(lifecycle.request_end());
/// assert!(!lifecycle.request_end());
///
/// // abort supersedes a pending end
/// let reason = Termination::End;
/// assert!(lifecycle.request_abort(reason.clone()));
/// assert_eq!(lifecycle.pending_end(), None);
/// assert_eq!(lifecycle.pending_abort(), Some(&reason));
///
/// assert!(lifecycle.finalize(reason.clone()));
/// assert_eq!(lifecycle.finished(), Some(&reason));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Lifecycle {
    state: State,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Asks for a graceful end.
    ///
    /// Returns `false` if the source is already ending, aborting or finished.
    pub fn request_end(&mut self) -> bool {
        if !self.is_normal() {
            return false;
        }
        self.state = State::EndRequested(Termination::End);
        true
    }

    /// Asks for an abort with `reason`, superseding a pending end.
    ///
    /// Returns `false` if the source is already aborting or finished.
    pub fn request_abort(&mut self, reason: Termination) -> bool {
        match self.state {
            State::Normal | State::EndRequested(_) => {
                self.state = State::AbortRequested(reason);
                true
            },
            State::AbortRequested(_) | State::Finished(_) => false,
        }
    }

    /// Moves a pending end or abort to `Finished` with `reason`.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn finalize(&mut self, reason: Termination) -> bool {
        debug_assert_finalize_reachable!(self.state);
        match self.state {
            State::EndRequested(_) | State::AbortRequested(_) => {
                self.state = State::Finished(reason);
                true
            },
            State::Finished(ref recorded) => {
                debug_assert_same_reason!(*recorded, reason);
                false
            },
            State::Normal => false,
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self.state, State::Normal)
    }

    /// Whether an end or abort is pending but not yet carried out.
    pub fn is_terminating(&self) -> bool {
        matches!(self.state, State::EndRequested(_) | State::AbortRequested(_))
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished(_))
    }

    pub fn pending_end(&self) -> Option<&Termination> {
        match &self.state {
            State::EndRequested(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn pending_abort(&self) -> Option<&Termination> {
        match &self.state {
            State::AbortRequested(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn finished(&self) -> Option<&Termination> {
        match &self.state {
            State::Finished(reason) => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fmt, sync::Arc};

    use super::*;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("boom")
        }
    }

    impl std::error::Error for Boom {}

    #[test]
    fn it_starts_normal() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.is_normal());
        assert!(!lifecycle.is_terminating());
        assert!(!lifecycle.is_finished());
        assert_eq!(lifecycle.pending_end(), None);
        assert_eq!(lifecycle.pending_abort(), None);
        assert_eq!(lifecycle.finished(), None);
    }

    #[test]
    fn end_is_requested_once() {
        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.request_end());
        assert!(!lifecycle.request_end());
        assert!(!lifecycle.is_normal());
        assert!(lifecycle.is_terminating());
        assert_eq!(lifecycle.pending_end(), Some(&Termination::End));
    }

    #[test]
    fn abort_supersedes_pending_end() {
        let boom = Termination::error(Boom);
        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.request_end());
        assert!(lifecycle.request_abort(boom.clone()));
        assert_eq!(lifecycle.pending_end(), None);
        assert_eq!(lifecycle.pending_abort(), Some(&boom));

        assert!(lifecycle.finalize(boom.clone()));
        assert_eq!(lifecycle.finished(), Some(&boom));
    }

    #[test]
    fn abort_is_requested_once() {
        let first = Termination::error(Boom);
        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.request_abort(first.clone()));
        assert!(!lifecycle.request_abort(Termination::End));
        assert!(!lifecycle.request_end());
        assert_eq!(lifecycle.pending_abort(), Some(&first));
    }

    #[test]
    fn finished_is_terminal() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.request_end();
        assert!(lifecycle.finalize(Termination::End));
        assert!(!lifecycle.finalize(Termination::End));
        assert!(!lifecycle.request_end());
        assert!(!lifecycle.request_abort(Termination::error(Boom)));
        assert!(lifecycle.is_finished());
        assert_eq!(lifecycle.state(), &State::Finished(Termination::End));
    }

    #[test]
    fn errors_compare_by_identity() {
        let boom: Arc<dyn std::error::Error + Send + Sync> = Arc::new(Boom);
        assert_eq!(Termination::from(Arc::clone(&boom)), Termination::from(boom));
        assert_ne!(Termination::error(Boom), Termination::error(Boom));
        assert_ne!(Termination::error(Boom), Termination::End);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "never asked to end or abort")]
    fn finalize_from_normal_is_a_logic_error() {
        Lifecycle::new().finalize(Termination::End);
    }
}
