use std::error::Error;
use std::fmt;

/// The density-constraint solve produced a non-finite Lagrange
/// multiplier: the simulation has diverged and the step was aborted.
///
/// Distinct from the Clavet stability clamps, which recover locally and
/// are not errors. Callers decide whether to reset or abort.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DivergedError;

impl fmt::Display for DivergedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "density constraint diverged (non-finite lambda)")
    }
}

impl Error for DivergedError {}
