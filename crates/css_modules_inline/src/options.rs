use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob_match::glob_match;
use indexmap::IndexMap;
use path_slash::PathExt;
use regex::Regex;
use serde::Deserialize;

/// Resolves an import specifier (quotes stripped) to a stylesheet path.
pub type ImportResolverFn = dyn Fn(&str) -> Option<PathBuf> + Send + Sync;
/// Receives stylesheet text and its path, returns the text to use instead.
pub type CssHookFn = dyn Fn(&str, &Path) -> String + Send + Sync;
/// Receives a local class name, the stylesheet path and its text.
pub type ScopedNameFn = dyn Fn(&str, &Path, &str) -> String + Send + Sync;
pub type IgnoreFn = dyn Fn(&Path) -> bool + Send + Sync;

pub const DEFAULT_STYLESHEET_EXTENSION: &str = ".css";

/// A host supplied function. Cloning shares the same function.
pub struct Callback<F: ?Sized>(Arc<F>);

impl<F: ?Sized> Clone for Callback<F> {
  fn clone(&self) -> Self {
    Callback(self.0.clone())
  }
}

impl<F: ?Sized> Deref for Callback<F> {
  type Target = F;

  fn deref(&self) -> &F {
    &self.0
  }
}

impl<F: ?Sized> fmt::Debug for Callback<F> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Callback")
  }
}

/// Options shared by the transform and the stylesheet loader.
///
/// Everything except the callbacks can be read from JSON, e.g.
///
/// ```json
/// {
///   "generateScopedName": "[name]__[local]___[hash:base64:5]",
///   "camelCase": "dashes",
///   "importAliases": { "some_alias": "/project/src/styles" }
/// }
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CssModulesInlineOptions {
  /// Skip the loader's per-path cache so stylesheet edits are picked up
  #[serde(default)]
  pub dev_mode: bool,
  /// Stylesheet suffixes recognised in addition to `.css`
  #[serde(default)]
  pub extensions: Vec<String>,
  pub ignore: Option<IgnorePattern>,
  #[serde(default)]
  pub camel_case: CamelCase,
  pub generate_scoped_name: Option<GenerateScopedName>,
  pub hash_prefix: Option<String>,
  #[serde(default)]
  pub mode: CssModulesMode,
  /// Stylesheet paths are made relative to this directory before hashing
  pub root_dir: Option<PathBuf>,
  /// Resolution of `composes: x from "..."` specifiers
  #[serde(default)]
  pub resolve: ResolveOptions,
  /// Prefix to directory map used to resolve non-relative import specifiers
  #[serde(default)]
  pub import_aliases: IndexMap<String, PathBuf>,
  /// Fail the compilation when a stylesheet cannot be inlined
  #[serde(default)]
  pub strict: bool,
  #[serde(skip)]
  pub ts_import_resolver: Option<Callback<ImportResolverFn>>,
  #[serde(skip)]
  pub preprocess_css: Option<Callback<CssHookFn>>,
  #[serde(skip)]
  pub process_css: Option<Callback<CssHookFn>>,
}

impl CssModulesInlineOptions {
  pub fn with_ts_import_resolver(
    mut self,
    resolver: impl Fn(&str) -> Option<PathBuf> + Send + Sync + 'static,
  ) -> Self {
    let resolver: Arc<ImportResolverFn> = Arc::new(resolver);
    self.ts_import_resolver = Some(Callback(resolver));
    self
  }

  pub fn with_preprocess_css(
    mut self,
    hook: impl Fn(&str, &Path) -> String + Send + Sync + 'static,
  ) -> Self {
    let hook: Arc<CssHookFn> = Arc::new(hook);
    self.preprocess_css = Some(Callback(hook));
    self
  }

  pub fn with_process_css(
    mut self,
    hook: impl Fn(&str, &Path) -> String + Send + Sync + 'static,
  ) -> Self {
    let hook: Arc<CssHookFn> = Arc::new(hook);
    self.process_css = Some(Callback(hook));
    self
  }

  pub fn with_generate_scoped_name(
    mut self,
    generate: impl Fn(&str, &Path, &str) -> String + Send + Sync + 'static,
  ) -> Self {
    let generate: Arc<ScopedNameFn> = Arc::new(generate);
    self.generate_scoped_name = Some(GenerateScopedName::Custom(Callback(generate)));
    self
  }

  pub fn with_ignore(mut self, predicate: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
    let predicate: Arc<IgnoreFn> = Arc::new(predicate);
    self.ignore = Some(IgnorePattern::Predicate(Callback(predicate)));
    self
  }

  /// `.css` followed by the configured extensions, each with a leading dot.
  pub fn stylesheet_extensions(&self) -> Vec<String> {
    let mut extensions = vec![DEFAULT_STYLESHEET_EXTENSION.to_string()];
    for extension in &self.extensions {
      let extension = if extension.starts_with('.') {
        extension.clone()
      } else {
        format!(".{extension}")
      };

      if !extensions.contains(&extension) {
        extensions.push(extension);
      }
    }
    extensions
  }

  /// The user resolver hook: the `ts_import_resolver` callback wins, then `import_aliases`.
  pub fn resolve_import(&self, specifier: &str) -> Option<PathBuf> {
    if let Some(resolver) = &self.ts_import_resolver {
      if let Some(path) = resolver(specifier) {
        return Some(path);
      }
    }

    self.import_aliases.iter().find_map(|(alias, directory)| {
      let rest = specifier.strip_prefix(alias.as_str())?;
      if rest.is_empty() {
        return Some(directory.clone());
      }

      rest
        .strip_prefix('/')
        .map(|relative_path| directory.join(relative_path))
    })
  }

  pub fn is_ignored(&self, path: &Path) -> bool {
    self
      .ignore
      .as_ref()
      .is_some_and(|ignore| ignore.matches(path))
  }
}

/// Files the transform should leave alone.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum IgnorePattern {
  Glob(String),
  Regex {
    regex: String,
  },
  List(Vec<IgnorePattern>),
  #[serde(skip)]
  Predicate(Callback<IgnoreFn>),
}

impl IgnorePattern {
  pub fn matches(&self, path: &Path) -> bool {
    match self {
      IgnorePattern::Glob(glob) => glob_match(glob, &path.to_slash_lossy()),
      IgnorePattern::Regex { regex } => match Regex::new(regex) {
        Ok(regex) => regex.is_match(&path.to_slash_lossy()),
        Err(err) => {
          tracing::warn!("Invalid ignore pattern {:?}: {}", regex, err);
          false
        }
      },
      IgnorePattern::List(patterns) => patterns.iter().any(|pattern| pattern.matches(path)),
      IgnorePattern::Predicate(predicate) => predicate(path),
    }
  }
}

/// How exported class names are re-keyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "CamelCaseValue")]
pub enum CamelCase {
  #[default]
  Off,
  /// Keep the original key and add a camelCased one
  CamelCase,
  /// Keep the original key and add one with only dashes camelized
  Dashes,
  /// Only the camelCased key
  Only,
  /// Only the key with dashes camelized
  DashesOnly,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CamelCaseValue {
  Enabled(bool),
  Named(CamelCaseName),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
enum CamelCaseName {
  CamelCase,
  Dashes,
  Only,
  DashesOnly,
}

impl From<CamelCaseValue> for CamelCase {
  fn from(value: CamelCaseValue) -> Self {
    match value {
      CamelCaseValue::Enabled(false) => CamelCase::Off,
      CamelCaseValue::Enabled(true) | CamelCaseValue::Named(CamelCaseName::CamelCase) => {
        CamelCase::CamelCase
      }
      CamelCaseValue::Named(CamelCaseName::Dashes) => CamelCase::Dashes,
      CamelCaseValue::Named(CamelCaseName::Only) => CamelCase::Only,
      CamelCaseValue::Named(CamelCaseName::DashesOnly) => CamelCase::DashesOnly,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum GenerateScopedName {
  /// A name template such as `[name]__[local]___[hash:base64:5]`
  Template(String),
  #[serde(skip)]
  Custom(Callback<ScopedNameFn>),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CssModulesMode {
  /// Class names are scoped with the generated name template
  #[default]
  Local,
  /// Class names are exported as written
  Global,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveOptions {
  #[serde(default)]
  pub alias: IndexMap<String, PathBuf>,
  #[serde(default)]
  pub extensions: Vec<String>,
  #[serde(default)]
  pub modules: Vec<PathBuf>,
  pub main_file: Option<String>,
  #[serde(default)]
  pub preserve_symlinks: bool,
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn parses_json_options() {
    let options: CssModulesInlineOptions = serde_json::from_str(
      r#"{
        "devMode": true,
        "extensions": ["scss", ".less"],
        "camelCase": "dashesOnly",
        "generateScopedName": "[local]_[hash:base64:5]",
        "hashPrefix": "prefix",
        "mode": "global",
        "rootDir": "/project",
        "resolve": {
          "alias": { "styles": "/project/styles" },
          "mainFile": "main.css",
          "preserveSymlinks": true
        },
        "importAliases": { "some_alias": "/project/fixture" },
        "strict": true
      }"#,
    )
    .unwrap();

    assert!(options.dev_mode);
    assert!(options.strict);
    assert_eq!(options.camel_case, CamelCase::DashesOnly);
    assert_eq!(options.mode, CssModulesMode::Global);
    assert_eq!(options.hash_prefix.as_deref(), Some("prefix"));
    assert_eq!(options.root_dir, Some(PathBuf::from("/project")));
    assert_eq!(options.resolve.main_file.as_deref(), Some("main.css"));
    assert!(options.resolve.preserve_symlinks);
    assert_eq!(
      options.resolve.alias.get("styles"),
      Some(&PathBuf::from("/project/styles"))
    );
    assert!(matches!(
      options.generate_scoped_name,
      Some(GenerateScopedName::Template(ref template)) if template == "[local]_[hash:base64:5]"
    ));
    assert_eq!(
      options.stylesheet_extensions(),
      vec![".css".to_string(), ".scss".to_string(), ".less".to_string()]
    );
  }

  #[test]
  fn parses_camel_case_values() {
    let parse = |value: &str| {
      serde_json::from_str::<CssModulesInlineOptions>(&format!(r#"{{ "camelCase": {value} }}"#))
        .unwrap()
        .camel_case
    };

    assert_eq!(parse("false"), CamelCase::Off);
    assert_eq!(parse("true"), CamelCase::CamelCase);
    assert_eq!(parse(r#""camelCase""#), CamelCase::CamelCase);
    assert_eq!(parse(r#""dashes""#), CamelCase::Dashes);
    assert_eq!(parse(r#""only""#), CamelCase::Only);
    assert_eq!(parse(r#""dashesOnly""#), CamelCase::DashesOnly);
  }

  #[test]
  fn defaults_when_empty() {
    let options: CssModulesInlineOptions = serde_json::from_str("{}").unwrap();

    assert!(!options.dev_mode);
    assert!(!options.strict);
    assert_eq!(options.camel_case, CamelCase::Off);
    assert_eq!(options.mode, CssModulesMode::Local);
    assert!(options.generate_scoped_name.is_none());
    assert_eq!(options.stylesheet_extensions(), vec![".css".to_string()]);
  }

  #[test]
  fn resolves_imports_with_aliases() {
    let options: CssModulesInlineOptions =
      serde_json::from_str(r#"{ "importAliases": { "some_alias": "/project/fixture" } }"#).unwrap();

    assert_eq!(
      options.resolve_import("some_alias/foo.css"),
      Some(PathBuf::from("/project/fixture/foo.css"))
    );
    assert_eq!(options.resolve_import("some_aliased/foo.css"), None);
    assert_eq!(options.resolve_import("other/foo.css"), None);
  }

  #[test]
  fn resolver_callback_takes_precedence_over_aliases() {
    let mut options = CssModulesInlineOptions::default().with_ts_import_resolver(|specifier| {
      specifier
        .starts_with("some_alias")
        .then(|| PathBuf::from("/from/callback.css"))
    });
    options
      .import_aliases
      .insert("some_alias".into(), PathBuf::from("/from/alias"));

    assert_eq!(
      options.resolve_import("some_alias/foo.css"),
      Some(PathBuf::from("/from/callback.css"))
    );
  }

  #[test]
  fn matches_ignore_patterns() {
    let ignore: IgnorePattern =
      serde_json::from_str(r#"["**/vendor/**", { "regex": "legacy\\.css$" }]"#).unwrap();

    assert!(ignore.matches(Path::new("/project/vendor/reset.css")));
    assert!(ignore.matches(Path::new("/project/src/legacy.css")));
    assert!(!ignore.matches(Path::new("/project/src/button.css")));

    let options = CssModulesInlineOptions::default()
      .with_ignore(|path| path.ends_with("skip.css"));
    assert!(options.is_ignored(Path::new("/project/skip.css")));
    assert!(!options.is_ignored(Path::new("/project/keep.css")));
  }
}
