use std::fmt;
use std::path::PathBuf;

use swc_core::common::Span;

use crate::stylesheet::LoadError;

#[derive(Debug, thiserror::Error)]
pub enum InlineError {
  #[error("Cannot resolve stylesheet {specifier:?}: {source}")]
  Resolution {
    specifier: String,
    #[source]
    source: LoadError,
  },
  #[error("Cannot load stylesheet {specifier:?}: {source}")]
  Load {
    specifier: String,
    #[source]
    source: LoadError,
  },
}

impl InlineError {
  pub fn new(specifier: impl Into<String>, source: LoadError) -> Self {
    let specifier = specifier.into();
    match source {
      LoadError::NotFound { .. } => InlineError::Resolution { specifier, source },
      source => InlineError::Load { specifier, source },
    }
  }

  pub fn specifier(&self) -> &str {
    match self {
      InlineError::Resolution { specifier, .. } | InlineError::Load { specifier, .. } => specifier,
    }
  }
}

/// A stylesheet reference that was left in place.
#[derive(Debug)]
pub struct InlineDiagnostic {
  pub file_path: PathBuf,
  pub span: Span,
  /// One based line and column of the reference, when a source map was available
  pub location: Option<(usize, usize)>,
  pub error: InlineError,
}

impl fmt::Display for InlineDiagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.location {
      Some((line, column)) => write!(
        f,
        "{} ({},{}): {}",
        self.file_path.display(),
        line,
        column,
        self.error
      ),
      None => write!(f, "{}: {}", self.file_path.display(), self.error),
    }
  }
}
