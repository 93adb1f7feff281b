use std::path::{Path, PathBuf};

use css_modules_inline_swc_runner::runner::{
  run_visit, RunContext, RunVisitResult, RunWithTransformationError,
};

use crate::diagnostic::InlineDiagnostic;
use crate::inliner::CssModulesInliner;
use crate::options::CssModulesInlineOptions;
use crate::stylesheet::StylesheetLoader;

pub struct CompileOutput {
  pub code: String,
  /// Source map JSON with every source inlined, stylesheets included
  pub source_map: Vec<u8>,
  pub diagnostics: Vec<InlineDiagnostic>,
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
  #[error(transparent)]
  Run(#[from] RunWithTransformationError),
  #[error("{} stylesheet reference(s) could not be inlined in {}", diagnostics.len(), file_path.display())]
  Strict {
    file_path: PathBuf,
    diagnostics: Vec<InlineDiagnostic>,
  },
}

/// Parse `code` as the file at `file_path`, inline its stylesheets and generate code.
///
/// Stylesheets that fail to load are reported in [`CompileOutput::diagnostics`], or
/// fail the file when `options.strict` is set.
pub fn compile(
  code: &str,
  file_path: &Path,
  loader: &dyn StylesheetLoader,
  options: &CssModulesInlineOptions,
) -> Result<CompileOutput, CompileError> {
  let RunVisitResult {
    output_code,
    visitor,
    source_map,
  } = run_visit(code, file_path, |context: RunContext| {
    CssModulesInliner::new(context.file_path, loader, options).with_source_map(context.source_map)
  })?;

  let diagnostics = visitor.into_diagnostics();
  if options.strict && !diagnostics.is_empty() {
    return Err(CompileError::Strict {
      file_path: file_path.to_path_buf(),
      diagnostics,
    });
  }

  Ok(CompileOutput {
    code: output_code,
    source_map,
    diagnostics,
  })
}
