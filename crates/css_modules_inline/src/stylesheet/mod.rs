use std::path::{Path, PathBuf};

pub use self::class_name_mapping::ClassNameMapping;
pub use self::lightningcss_loader::{CompiledStylesheet, LightningCssLoader};

mod class_name_mapping;
mod composes_resolver;
mod lightningcss_loader;
mod scoped_name;

/// Maps a stylesheet path to the class names it exports.
pub trait StylesheetLoader {
  fn load_mapping(&self, path: &Path) -> Result<ClassNameMapping, LoadError>;

  /// Raw stylesheet text, used to attribute inlined objects to the stylesheet in source maps.
  fn read_source(&self, path: &Path) -> std::io::Result<String> {
    std::fs::read_to_string(path)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
  #[error("Stylesheet {} does not exist", path.display())]
  NotFound { path: PathBuf },
  #[error("Failed to read {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Failed to parse CSS {}: {message}", path.display())]
  Parse { path: PathBuf, message: String },
  #[error("Failed to process CSS {}: {message}", path.display())]
  Print { path: PathBuf, message: String },
  #[error("Invalid scoped name pattern {pattern:?}: {message}")]
  Pattern { pattern: String, message: String },
  #[error("Cannot resolve {specifier:?} composed from {}", from.display())]
  UnresolvedComposition { specifier: String, from: PathBuf },
  #[error("Class {name:?} is not exported by {}", path.display())]
  MissingComposedClass { name: String, path: PathBuf },
  #[error("Stylesheet {} composes itself", path.display())]
  CompositionCycle { path: PathBuf },
}
