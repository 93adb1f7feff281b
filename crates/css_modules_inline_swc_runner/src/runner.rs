use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

use swc_core::common::input::StringInput;
use swc_core::common::source_map::SourceMapGenConfig;
use swc_core::common::sync::Lrc;
use swc_core::common::util::take::Take;
use swc_core::common::{FileName, Globals, Mark, SourceMap, GLOBALS};
use swc_core::ecma::ast::{Module, Pass, Program};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{EsSyntax, Parser, Syntax, TsSyntax};
use swc_core::ecma::transforms::base::fixer::fixer;
use swc_core::ecma::transforms::base::resolver;
use swc_core::ecma::transforms::typescript::strip;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

pub struct RunContext {
  /// Source-map in use
  pub source_map: Lrc<SourceMap>,
  /// Global mark from SWC resolver
  pub global_mark: Mark,
  /// Unresolved mark from SWC resolver
  pub unresolved_mark: Mark,
  /// Path of the file being compiled
  pub file_path: PathBuf,
}

pub struct RunVisitResult<V> {
  pub output_code: String,
  pub visitor: V,
  pub source_map: Vec<u8>,
}

/// Runner of SWC transformations
///
/// * Parse `code` with SWC, picking the syntax from the extension of `file_path`
/// * Run a visitor over it
/// * Strip TypeScript syntax so the output is plain JavaScript
/// * Return the generated code, the visitor and a source map with sources inlined
///
pub fn run_visit<V: VisitMut>(
  code: &str,
  file_path: &Path,
  make_visit: impl FnOnce(RunContext) -> V,
) -> Result<RunVisitResult<V>, RunWithTransformationError> {
  let (output_code, visitor, source_map) = run_with_transformation(
    code,
    file_path,
    |run_context: RunContext, module: &mut Module| {
      let mut visit = make_visit(run_context);
      module.visit_mut_with(&mut visit);
      visit
    },
  )?;
  Ok(RunVisitResult {
    output_code,
    visitor,
    source_map,
  })
}

#[derive(Debug, thiserror::Error)]
pub enum RunWithTransformationError {
  #[error("Failed to parse module")]
  SwcParse(swc_core::ecma::parser::error::Error),
  #[error("IO Error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Invalid utf-8 output: {0}")]
  InvalidUtf8Output(#[from] FromUtf8Error),
  #[error("Failed to generate source map")]
  SourceMap(#[from] sourcemap::Error),
}

/// Pick the parser syntax for a file from its extension.
pub fn syntax_for_path(file_path: &Path) -> Syntax {
  match file_path.extension().and_then(|ext| ext.to_str()) {
    Some("ts" | "mts" | "cts") => Syntax::Typescript(TsSyntax::default()),
    Some("tsx") => Syntax::Typescript(TsSyntax {
      tsx: true,
      ..Default::default()
    }),
    Some("jsx") => Syntax::Es(EsSyntax {
      jsx: true,
      ..Default::default()
    }),
    _ => Syntax::Es(EsSyntax::default()),
  }
}

/// Emits every source with its content so stylesheets registered during the
/// transform travel with the map.
struct InlineSourcesConfig;

impl SourceMapGenConfig for InlineSourcesConfig {
  fn file_name_to_source(&self, f: &FileName) -> String {
    f.to_string()
  }

  fn inline_sources_content(&self, _f: &FileName) -> bool {
    true
  }
}

fn strip_types(mut module: Module, unresolved_mark: Mark, global_mark: Mark) -> Module {
  let mut program = Program::Module(module.take());
  strip(unresolved_mark, global_mark).process(&mut program);
  match program {
    Program::Module(module) => module,
    Program::Script(_) => module,
  }
}

type RunWithTransformationOutput<R> = (String, R, Vec<u8>);

/// Parse code, run resolver over it, then run the `transform` function with the parsed module,
/// strip types, parenthesize whatever the transform left ambiguous, codegen and return the results.
fn run_with_transformation<R>(
  code: &str,
  file_path: &Path,
  transform: impl FnOnce(RunContext, &mut Module) -> R,
) -> Result<RunWithTransformationOutput<R>, RunWithTransformationError> {
  let source_map = Lrc::new(SourceMap::default());
  let source_file = source_map.new_source_file(
    Lrc::new(FileName::Real(file_path.to_path_buf())),
    code.into(),
  );

  let syntax = syntax_for_path(file_path);
  let lexer = Lexer::new(
    syntax,
    Default::default(),
    StringInput::from(&*source_file),
    None,
  );

  let mut parser = Parser::new_from(lexer);
  let mut module = parser
    .parse_module()
    .map_err(RunWithTransformationError::SwcParse)?;

  GLOBALS.set(
    &Globals::new(),
    || -> Result<RunWithTransformationOutput<R>, RunWithTransformationError> {
      let global_mark = Mark::new();
      let unresolved_mark = Mark::new();
      module.visit_mut_with(&mut resolver(
        unresolved_mark,
        global_mark,
        syntax.typescript(),
      ));

      let context = RunContext {
        source_map: source_map.clone(),
        global_mark,
        unresolved_mark,
        file_path: file_path.to_path_buf(),
      };
      let result = transform(context, &mut module);
      if syntax.typescript() {
        module = strip_types(module, unresolved_mark, global_mark);
      }
      module.visit_mut_with(&mut fixer(None));

      let mut line_pos_buffer = vec![];
      let mut output_buffer = vec![];
      let writer = JsWriter::new(
        source_map.clone(),
        "\n",
        &mut output_buffer,
        Some(&mut line_pos_buffer),
      );
      let mut emitter = swc_core::ecma::codegen::Emitter {
        cfg: Default::default(),
        cm: source_map.clone(),
        comments: None,
        wr: writer,
      };
      emitter.emit_module(&module)?;
      let output_code = String::from_utf8(output_buffer)?;
      let source_map =
        source_map.build_source_map_with_config(&line_pos_buffer, None, InlineSourcesConfig);
      let mut output_map_buffer = vec![];
      source_map.to_writer(&mut output_map_buffer)?;

      Ok((output_code, result, output_map_buffer))
    },
  )
}
