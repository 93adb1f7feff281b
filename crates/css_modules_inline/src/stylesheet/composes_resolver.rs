use std::path::{Path, PathBuf};

use crate::options::{ResolveOptions, DEFAULT_STYLESHEET_EXTENSION};
use crate::path_resolver::normalize_path;

const DEFAULT_MAIN_FILE: &str = "index.css";
const NODE_MODULES: &str = "node_modules";

/// Resolves the `from "..."` part of `composes` declarations.
pub struct ComposesResolver<'a> {
  options: &'a ResolveOptions,
  root_dir: &'a Path,
}

impl<'a> ComposesResolver<'a> {
  pub fn new(options: &'a ResolveOptions, root_dir: &'a Path) -> Self {
    ComposesResolver { options, root_dir }
  }

  pub fn resolve(&self, specifier: &str, from: &Path) -> Option<PathBuf> {
    let from_dir = from.parent().unwrap_or(self.root_dir);
    let found = self.locate(specifier, from_dir)?;

    if self.options.preserve_symlinks {
      Some(normalize_path(None, &found))
    } else {
      Some(dunce::canonicalize(&found).unwrap_or(found))
    }
  }

  fn locate(&self, specifier: &str, from_dir: &Path) -> Option<PathBuf> {
    if let Some(aliased) = self.resolve_alias(specifier) {
      return self.resolve_file(&aliased);
    }

    if specifier.starts_with('.') {
      return self.resolve_file(&from_dir.join(specifier));
    }

    if Path::new(specifier).is_absolute() {
      return self.resolve_file(Path::new(specifier));
    }

    self
      .module_directories(from_dir)
      .iter()
      .find_map(|directory| self.resolve_file(&directory.join(specifier)))
  }

  fn resolve_alias(&self, specifier: &str) -> Option<PathBuf> {
    self.options.alias.iter().find_map(|(alias, target)| {
      let rest = specifier.strip_prefix(alias.as_str())?;
      let target = if target.is_absolute() {
        target.clone()
      } else {
        self.root_dir.join(target)
      };

      if rest.is_empty() {
        Some(target)
      } else {
        rest.strip_prefix('/').map(|rest| target.join(rest))
      }
    })
  }

  /// Configured module directories, or every `node_modules` from `from_dir` up to the file system root.
  fn module_directories(&self, from_dir: &Path) -> Vec<PathBuf> {
    if !self.options.modules.is_empty() {
      return self
        .options
        .modules
        .iter()
        .map(|directory| {
          if directory.is_absolute() {
            directory.clone()
          } else {
            self.root_dir.join(directory)
          }
        })
        .collect();
    }

    from_dir
      .ancestors()
      .map(|ancestor| ancestor.join(NODE_MODULES))
      .collect()
  }

  fn resolve_file(&self, candidate: &Path) -> Option<PathBuf> {
    if candidate.is_file() {
      return Some(candidate.to_path_buf());
    }

    if candidate.is_dir() {
      let main_file = self.options.main_file.as_deref().unwrap_or(DEFAULT_MAIN_FILE);
      let main = candidate.join(main_file);
      return main.is_file().then_some(main);
    }

    if candidate.extension().is_some() {
      return None;
    }

    std::iter::once(DEFAULT_STYLESHEET_EXTENSION)
      .chain(self.options.extensions.iter().map(String::as_str))
      .map(|extension| {
        let extension = extension.trim_start_matches('.');
        candidate.with_extension(extension)
      })
      .find(|path| path.is_file())
  }
}
