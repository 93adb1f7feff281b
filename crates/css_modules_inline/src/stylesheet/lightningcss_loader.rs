use std::borrow::Cow;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use lightningcss::css_modules::{Config, CssModuleExport, CssModuleReference, Pattern};
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use parking_lot::Mutex;
use path_slash::PathExt;

use super::composes_resolver::ComposesResolver;
use super::scoped_name::{
  apply_camel_case, lightningcss_pattern, DEFAULT_SCOPED_NAME, LOCAL_NAME_PATTERN,
};
use super::{ClassNameMapping, LoadError, StylesheetLoader};
use crate::options::{CssModulesInlineOptions, CssModulesMode, GenerateScopedName};
use crate::path_resolver::absolute_path;

/// A stylesheet run through lightningcss with CSS modules enabled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledStylesheet {
  pub path: PathBuf,
  /// Printed CSS with scoped class names, after the `process_css` hook.
  /// Only [`LightningCssLoader::compile`] hands this out.
  pub css: String,
  /// Exported classes with compositions joined, before camelCase re-keying
  pub exports: ClassNameMapping,
}

/// Loads class name mappings with lightningcss.
///
/// Mappings are cached by path unless `dev_mode` is set.
#[derive(Debug)]
pub struct LightningCssLoader {
  options: CssModulesInlineOptions,
  root_dir: PathBuf,
  cache: Mutex<HashMap<PathBuf, ClassNameMapping>>,
}

impl LightningCssLoader {
  pub fn new(options: CssModulesInlineOptions) -> Self {
    let root_dir = match &options.root_dir {
      Some(root_dir) => absolute_path(root_dir),
      None => std::env::current_dir().unwrap_or_default(),
    };

    LightningCssLoader {
      options,
      root_dir,
      cache: Mutex::new(HashMap::new()),
    }
  }

  pub fn options(&self) -> &CssModulesInlineOptions {
    &self.options
  }

  /// Compiles `path` without the cache, keeping the processed CSS.
  pub fn compile(&self, path: &Path) -> Result<CompiledStylesheet, LoadError> {
    self.compile_with_stack(path, &mut Vec::new())
  }

  fn exports(&self, path: &Path, stack: &mut Vec<PathBuf>) -> Result<ClassNameMapping, LoadError> {
    if !self.options.dev_mode {
      if let Some(cached) = self.cache.lock().get(path) {
        return Ok(cached.clone());
      }
    }

    let compiled = self.compile_with_stack(path, stack)?;

    if !self.options.dev_mode {
      self
        .cache
        .lock()
        .insert(path.to_path_buf(), compiled.exports.clone());
    }

    Ok(compiled.exports)
  }

  fn compile_with_stack(
    &self,
    path: &Path,
    stack: &mut Vec<PathBuf>,
  ) -> Result<CompiledStylesheet, LoadError> {
    if stack.iter().any(|visited| visited == path) {
      return Err(LoadError::CompositionCycle {
        path: path.to_path_buf(),
      });
    }

    tracing::debug!("Compiling stylesheet {}", path.display());

    let source = read_stylesheet(path)?;
    let source = match &self.options.preprocess_css {
      Some(preprocess) => preprocess(&source, path),
      None => source,
    };

    let pattern_source = self.pattern_source();
    let pattern = Pattern::parse(&pattern_source).map_err(|err| LoadError::Pattern {
      pattern: pattern_source.to_string(),
      message: err.to_string(),
    })?;

    let stylesheet = StyleSheet::parse(
      &source,
      ParserOptions {
        filename: self.hash_input(path),
        css_modules: Some(Config {
          pattern,
          dashed_idents: false,
          ..Default::default()
        }),
        error_recovery: false,
        ..ParserOptions::default()
      },
    )
    .map_err(|err| LoadError::Parse {
      path: path.to_path_buf(),
      message: err.to_string(),
    })?;

    let printed = stylesheet
      .to_css(PrinterOptions {
        minify: false,
        ..PrinterOptions::default()
      })
      .map_err(|err| LoadError::Print {
        path: path.to_path_buf(),
        message: err.to_string(),
      })?;

    let css = match &self.options.process_css {
      Some(process) => process(&printed.code, path),
      None => printed.code,
    };

    let ordered_exports = in_declaration_order(printed.exports.unwrap_or_default(), &source);

    stack.push(path.to_path_buf());
    let exports = self.compose_exports(path, &source, &ordered_exports, stack);
    stack.pop();

    Ok(CompiledStylesheet {
      path: path.to_path_buf(),
      css,
      exports: exports?,
    })
  }

  /// Joins each export with the classes it composes, in declaration order.
  fn compose_exports(
    &self,
    path: &Path,
    source: &str,
    exports: &[(String, CssModuleExport)],
    stack: &mut Vec<PathBuf>,
  ) -> Result<ClassNameMapping, LoadError> {
    let mut mapping = ClassNameMapping::new();

    for (local, export) in exports {
      let mut names = vec![self.scoped_name(&export.name, path, source)];

      for reference in &export.composes {
        let name = match reference {
          CssModuleReference::Local { name } => self.scoped_name(name, path, source),
          CssModuleReference::Global { name } => name.clone(),
          CssModuleReference::Dependency { name, specifier } => {
            let dependency = ComposesResolver::new(&self.options.resolve, &self.root_dir)
              .resolve(specifier, path)
              .ok_or_else(|| LoadError::UnresolvedComposition {
                specifier: specifier.clone(),
                from: path.to_path_buf(),
              })?;

            let dependency_exports = self.exports(&dependency, stack)?;
            match dependency_exports.get(name) {
              Some(generated) => generated.to_string(),
              None => {
                return Err(LoadError::MissingComposedClass {
                  name: name.clone(),
                  path: dependency,
                })
              }
            }
          }
        };

        names.push(name);
      }

      mapping.insert(local.clone(), names.join(" "));
    }

    Ok(mapping)
  }

  fn pattern_source(&self) -> Cow<'_, str> {
    match (self.options.mode, &self.options.generate_scoped_name) {
      (CssModulesMode::Global, _) | (_, Some(GenerateScopedName::Custom(_))) => {
        Cow::Borrowed(LOCAL_NAME_PATTERN)
      }
      (CssModulesMode::Local, Some(GenerateScopedName::Template(template))) => {
        lightningcss_pattern(template)
      }
      (CssModulesMode::Local, None) => Cow::Borrowed(DEFAULT_SCOPED_NAME),
    }
  }

  fn scoped_name(&self, name: &str, path: &Path, source: &str) -> String {
    match (self.options.mode, &self.options.generate_scoped_name) {
      (CssModulesMode::Local, Some(GenerateScopedName::Custom(generate))) => {
        generate(name, path, source)
      }
      _ => name.to_string(),
    }
  }

  /// Path lightningcss hashes and takes `[name]` from. The hash prefix is a
  /// leading directory so the file stem stays intact.
  fn hash_input(&self, path: &Path) -> String {
    let relative_path = pathdiff::diff_paths(path, &self.root_dir)
      .filter(|_| path.is_absolute())
      .unwrap_or_else(|| path.to_path_buf());
    let relative_path = relative_path.to_slash_lossy();

    match self.options.hash_prefix.as_deref() {
      Some(prefix) if !prefix.is_empty() => {
        format!("{}/{}", prefix.trim_end_matches('/'), relative_path)
      }
      _ => relative_path.into_owned(),
    }
  }
}

impl StylesheetLoader for LightningCssLoader {
  /// Both CSS hooks run here too. The processed CSS is dropped, see [`LightningCssLoader::compile`].
  fn load_mapping(&self, path: &Path) -> Result<ClassNameMapping, LoadError> {
    let exports = self.exports(path, &mut Vec::new())?;
    Ok(apply_camel_case(exports, self.options.camel_case))
  }
}

/// Orders exports by where their class is first declared in `source`.
fn in_declaration_order(
  exports: impl IntoIterator<Item = (String, CssModuleExport)>,
  source: &str,
) -> Vec<(String, CssModuleExport)> {
  let mut exports: Vec<(String, CssModuleExport)> = exports.into_iter().collect();
  exports.sort_by_cached_key(|(local, _)| (declaration_position(source, local), local.clone()));
  exports
}

/// Offset of the first `.local` selector, else of the first standalone `local`.
fn declaration_position(source: &str, local: &str) -> usize {
  let mut fallback = None;

  for (start, _) in source.match_indices(local) {
    let before = source[..start].chars().next_back();
    let after = source[start + local.len()..].chars().next();
    if before.is_some_and(is_ident_char) || after.is_some_and(is_ident_char) {
      continue;
    }

    if before == Some('.') {
      return start;
    }
    fallback.get_or_insert(start);
  }

  fallback.unwrap_or(usize::MAX)
}

fn is_ident_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn read_stylesheet(path: &Path) -> Result<String, LoadError> {
  std::fs::read_to_string(path).map_err(|source| match source.kind() {
    ErrorKind::NotFound => LoadError::NotFound {
      path: path.to_path_buf(),
    },
    _ => LoadError::Io {
      path: path.to_path_buf(),
      source,
    },
  })
}
