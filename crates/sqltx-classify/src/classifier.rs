use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::{Diagnostics, ErrorKind, Heuristics, SqlStateHeuristics};

/// Iterator over an error's causal chain, outermost to innermost.
struct Chain<'a> {
    next: Option<&'a (dyn StdError + 'static)>,
}

impl<'a> Chain<'a> {
    fn new(error: &'a (dyn StdError + 'static)) -> Self {
        Self { next: Some(error) }
    }
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn StdError + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.source();
        Some(current)
    }
}

/// Reduces an error to an [`ErrorKind`] by consulting [`Heuristics`] over
/// the frames of its causal chain, deepest cause first.
///
/// Per frame, connection is asked before transient; the first positive
/// answer decides and ends the walk. A chain nobody recognizes is
/// [`ErrorKind::Fatal`].
#[derive(Clone)]
pub struct Classifier {
    heuristics: Arc<dyn Heuristics>,
}

impl Classifier {
    pub fn new(heuristics: Arc<dyn Heuristics>) -> Self {
        Self { heuristics }
    }

    pub fn classify(&self, error: &(dyn StdError + 'static)) -> ErrorKind {
        let frames: Vec<_> = Chain::new(error).collect();
        for frame in frames.into_iter().rev() {
            let diagnostics = Diagnostics::from_frame(frame);
            if self.heuristics.is_connection_issue(&diagnostics) {
                return ErrorKind::Connection;
            }
            if self.heuristics.is_transient_issue(&diagnostics) {
                return ErrorKind::Transient;
            }
        }
        ErrorKind::Fatal
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Arc::new(SqlStateHeuristics))
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier").finish_non_exhaustive()
    }
}
