use std::path::{Path, PathBuf};

use regex::Regex;
use swc_core::common::sync::Lrc;
use swc_core::common::{SourceMap, Span};
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

use crate::diagnostic::{InlineDiagnostic, InlineError};
use crate::options::CssModulesInlineOptions;
use crate::path_resolver::resolve_specifier;
use crate::provenance::Provenance;
use crate::replacement::{class_names_object, namespace_binding};
use crate::stylesheet::{ClassNameMapping, StylesheetLoader};

/// Replaces stylesheet imports and requires with the class names the stylesheet exports.
///
/// ```js
/// import * as css from './button.css';
/// const other = require('./other.css');
/// ```
///
/// becomes
///
/// ```js
/// var css = { "button": "button__button___x7f3a" };
/// const other = { "other": "other__other___ab12c" };
/// ```
///
/// References that cannot be inlined are left untouched and recorded as diagnostics.
pub struct CssModulesInliner<'a> {
  file_path: PathBuf,
  loader: &'a dyn StylesheetLoader,
  options: &'a CssModulesInlineOptions,
  stylesheet_pattern: Regex,
  provenance: Option<Provenance>,
  diagnostics: Vec<InlineDiagnostic>,
}

impl<'a> CssModulesInliner<'a> {
  pub fn new(
    file_path: impl Into<PathBuf>,
    loader: &'a dyn StylesheetLoader,
    options: &'a CssModulesInlineOptions,
  ) -> Self {
    CssModulesInliner {
      file_path: file_path.into(),
      loader,
      options,
      stylesheet_pattern: stylesheet_pattern(&options.stylesheet_extensions()),
      provenance: None,
      diagnostics: vec![],
    }
  }

  /// Attribute inlined objects to their stylesheet in `source_map`.
  pub fn with_source_map(mut self, source_map: Lrc<SourceMap>) -> Self {
    self.provenance = Some(Provenance::new(source_map));
    self
  }

  pub fn diagnostics(&self) -> &[InlineDiagnostic] {
    &self.diagnostics
  }

  pub fn into_diagnostics(self) -> Vec<InlineDiagnostic> {
    self.diagnostics
  }

  fn is_stylesheet(&self, specifier: &Str) -> bool {
    match &specifier.raw {
      Some(raw) => self.stylesheet_pattern.is_match(raw),
      None => self.stylesheet_pattern.is_match(&specifier.value),
    }
  }

  /// Resolve and load the stylesheet behind `specifier`.
  ///
  /// `None` when the stylesheet is ignored or failed to load, the failure being recorded.
  fn load(&mut self, specifier: &str, span: Span) -> Option<(PathBuf, ClassNameMapping)> {
    let options = self.options;
    let hook = |specifier: &str| options.resolve_import(specifier);
    let path = resolve_specifier(specifier, &self.file_path, Some(&hook));

    if options.is_ignored(&path) {
      tracing::debug!("Ignoring stylesheet {}", path.display());
      return None;
    }

    match self.loader.load_mapping(&path) {
      Ok(mapping) => Some((path, mapping)),
      Err(err) => {
        self.report(span, InlineError::new(specifier, err));
        None
      }
    }
  }

  fn report(&mut self, span: Span, error: InlineError) {
    tracing::error!("{}: {}", self.file_path.display(), error);

    let location = self
      .provenance
      .as_ref()
      .filter(|_| !span.is_dummy())
      .map(|provenance| provenance.location(span.lo));

    self.diagnostics.push(InlineDiagnostic {
      file_path: self.file_path.clone(),
      span,
      location,
      error,
    });
  }

  fn replacement_span(&mut self, original: Span, stylesheet: &Path) -> Span {
    match &mut self.provenance {
      Some(provenance) => provenance.stylesheet_span(original, stylesheet, self.loader),
      None => original,
    }
  }

  fn inline_import(&mut self, import: &ImportDecl) -> Option<Stmt> {
    if import.type_only || !self.is_stylesheet(&import.src) {
      return None;
    }

    let (path, mapping) = self.load(&import.src.value, import.span)?;

    let local = import.specifiers.iter().find_map(|specifier| match specifier {
      ImportSpecifier::Namespace(namespace) => Some(namespace.local.clone()),
      _ => None,
    })?;

    let span = self.replacement_span(import.span, &path);
    let object = class_names_object(&mapping, span);
    Some(namespace_binding(local, object, span))
  }

  fn inline_require(&mut self, call: &CallExpr) -> Option<Expr> {
    let Callee::Expr(callee) = &call.callee else {
      return None;
    };
    if !matches!(&**callee, Expr::Ident(ident) if &*ident.sym == "require") {
      return None;
    }

    let specifier = match call.args.first() {
      Some(ExprOrSpread { spread: None, expr }) => match &**expr {
        Expr::Lit(Lit::Str(specifier)) => specifier,
        _ => return None,
      },
      _ => return None,
    };
    if !self.is_stylesheet(specifier) {
      return None;
    }

    let (path, mapping) = self.load(&specifier.value, call.span)?;
    let span = self.replacement_span(call.span, &path);
    Some(Expr::Object(class_names_object(&mapping, span)))
  }
}

/// Matches specifiers ending with one of `extensions`, optionally followed by the closing quote.
fn stylesheet_pattern(extensions: &[String]) -> Regex {
  let alternatives = extensions
    .iter()
    .map(|extension| regex::escape(extension))
    .collect::<Vec<_>>()
    .join("|");

  Regex::new(&format!(r#"(?:{alternatives})['"`]?$"#))
    .expect("escaped extensions always form a valid pattern")
}

impl VisitMut for CssModulesInliner<'_> {
  fn visit_mut_module_item(&mut self, node: &mut ModuleItem) {
    if let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = node {
      if let Some(binding) = self.inline_import(import) {
        *node = ModuleItem::Stmt(binding);
        return;
      }
    }

    node.visit_mut_children_with(self);
  }

  fn visit_mut_expr(&mut self, node: &mut Expr) {
    if let Expr::Call(call) = node {
      if let Some(object) = self.inline_require(call) {
        *node = object;
        return;
      }
    }

    node.visit_mut_children_with(self);
  }
}
