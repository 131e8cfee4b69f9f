pub(crate) mod tracing;

/// Invokes a stored callback, tracing the invocation first when the `tracing` feature is enabled.
macro_rules! call {
    ($callback:expr, $arg:expr, $($fmt:tt)+) => {
        ::cfg_if::cfg_if! {
            if #[cfg(feature = "tracing")] {
                {
                    ::tracing::trace!($($fmt)+);
                    $callback($arg);
                }
            } else {
                $callback($arg);
            }
        }
    };
}
pub(crate) use call;
