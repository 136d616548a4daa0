use thiserror::Error;

macro_rules! computation_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Computation {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Computation {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The taxonomy is deliberately small. Bad input is reported synchronously to the immediate
/// caller as [`Error::InvalidArgument`] and is never retried. A failure inside an algorithm
/// (a broken dominator chain, an inconsistent traversal state) is an [`Error::Computation`];
/// the per-function batch driver catches these, logs them, and continues with the remaining
/// functions. [`Error::Cancelled`] reports cooperative cancellation observed between
/// functions; results computed before the cancellation point remain valid.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::{Error, GraphStore, Subgraph, UniqueEntryExitGraph};
///
/// # fn demo(store: &mut GraphStore, cfg: &Subgraph) {
/// match UniqueEntryExitGraph::new(store, cfg, false) {
///     Ok(wrapped) => println!("entry: {}", wrapped.entry()),
///     Err(Error::InvalidArgument(reason)) => eprintln!("bad input: {}", reason),
///     Err(e) => eprintln!("error: {}", e),
/// }
/// # }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The caller supplied malformed or empty input.
    ///
    /// Raised for conditions such as an empty control-flow graph, a graph spanning more
    /// than one function, or missing root/exit candidates when they are required. Always
    /// surfaced synchronously; a batch driver treats it the same as any other per-function
    /// failure, but single-graph callers receive it directly.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An algorithm reached a state that violates its own invariants.
    ///
    /// This indicates a defect or a corrupted input graph rather than a recoverable
    /// condition. The error carries the source location where the violation was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the violated invariant
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Computation failed - {file}:{line}: {message}")]
    Computation {
        /// The message to be printed for the Computation error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A batch run was cancelled between functions.
    ///
    /// Cancellation is cooperative and only observed at function boundaries. Results
    /// already written to the graph store before the cancellation point are complete
    /// and remain valid.
    #[error("The operation was cancelled")]
    Cancelled,
}
