use std::collections::HashMap;
use std::path::{Path, PathBuf};

use swc_core::common::sync::Lrc;
use swc_core::common::{BytePos, FileName, SourceFile, SourceMap, Span};

use crate::stylesheet::StylesheetLoader;

struct RegisteredStylesheet {
  file: Lrc<SourceFile>,
  text: String,
}

/// Registers stylesheets in the compiler's source map so inlined objects map back to them.
pub struct Provenance {
  source_map: Lrc<SourceMap>,
  stylesheets: HashMap<PathBuf, Lrc<RegisteredStylesheet>>,
}

impl Provenance {
  pub fn new(source_map: Lrc<SourceMap>) -> Self {
    Provenance {
      source_map,
      stylesheets: HashMap::new(),
    }
  }

  /// One based line and column of `pos`.
  pub fn location(&self, pos: BytePos) -> (usize, usize) {
    let loc = self.source_map.lookup_char_pos(pos);
    (loc.line, loc.col.0 + 1)
  }

  /// Span over `stylesheet` carrying the offsets `original` has in the importing file.
  ///
  /// Offsets are clamped to the stylesheet text and moved back onto character
  /// boundaries. Falls back to `original` when the stylesheet cannot be read.
  pub fn stylesheet_span(
    &mut self,
    original: Span,
    stylesheet: &Path,
    loader: &dyn StylesheetLoader,
  ) -> Span {
    if original.is_dummy() {
      return original;
    }

    let Some(registered) = self.stylesheet(stylesheet, loader) else {
      return original;
    };

    let importing = self.source_map.lookup_byte_offset(original.lo);
    let lo = importing.pos.0 as usize;
    let hi = lo + (original.hi.0 - original.lo.0) as usize;
    let text = registered.text.as_str();
    let start = registered.file.start_pos.0;

    Span::new(
      BytePos(start + char_boundary_at_or_before(text, lo) as u32),
      BytePos(start + char_boundary_at_or_before(text, hi) as u32),
    )
  }

  fn stylesheet(
    &mut self,
    stylesheet: &Path,
    loader: &dyn StylesheetLoader,
  ) -> Option<Lrc<RegisteredStylesheet>> {
    if let Some(registered) = self.stylesheets.get(stylesheet) {
      return Some(registered.clone());
    }

    let source = match loader.read_source(stylesheet) {
      Ok(source) => source,
      Err(err) => {
        tracing::debug!(
          "Cannot read {} for source maps: {}",
          stylesheet.display(),
          err
        );
        return None;
      }
    };

    let file = self.source_map.new_source_file(
      Lrc::new(FileName::Real(stylesheet.to_path_buf())),
      source.clone(),
    );
    let registered = Lrc::new(RegisteredStylesheet { file, text: source });
    self
      .stylesheets
      .insert(stylesheet.to_path_buf(), registered.clone());
    Some(registered)
  }
}

/// Clamp `offset` to the last byte of `text`, then step back to the start of its character.
fn char_boundary_at_or_before(text: &str, offset: usize) -> usize {
  let mut offset = offset.min(text.len().saturating_sub(1));
  while !text.is_char_boundary(offset) {
    offset -= 1;
  }
  offset
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::stylesheet::{ClassNameMapping, LoadError};

  struct SourceOnlyLoader;

  impl StylesheetLoader for SourceOnlyLoader {
    fn load_mapping(&self, path: &Path) -> Result<ClassNameMapping, LoadError> {
      Err(LoadError::NotFound {
        path: path.to_path_buf(),
      })
    }

    fn read_source(&self, path: &Path) -> std::io::Result<String> {
      match path.to_str() {
        Some("/styles/short.css") => Ok(".a {}".into()),
        Some("/styles/accents.css") => Ok("/* é */\n.a { content: \"ü\"; }".into()),
        _ => Err(std::io::ErrorKind::NotFound.into()),
      }
    }
  }

  fn importing_file(source_map: &SourceMap) -> Lrc<SourceFile> {
    source_map.new_source_file(
      Lrc::new(FileName::Real(PathBuf::from("/src/index.js"))),
      "const a = 1;\nimport * as css from './short.css';\n".into(),
    )
  }

  #[test]
  fn translates_offsets_into_the_stylesheet() {
    let source_map: Lrc<SourceMap> = Default::default();
    let index = importing_file(&source_map);
    let mut provenance = Provenance::new(source_map.clone());

    let original = Span::new(
      BytePos(index.start_pos.0 + 2),
      BytePos(index.start_pos.0 + 3),
    );
    let span = provenance.stylesheet_span(original, Path::new("/styles/short.css"), &SourceOnlyLoader);

    let css = source_map.lookup_byte_offset(span.lo);
    assert_eq!(css.sf.name.to_string(), "/styles/short.css");
    assert_eq!(css.pos.0, 2);
    assert_eq!(source_map.lookup_byte_offset(span.hi).pos.0, 3);
  }

  #[test]
  fn clamps_offsets_to_the_stylesheet_length() {
    let source_map: Lrc<SourceMap> = Default::default();
    let index = importing_file(&source_map);
    let mut provenance = Provenance::new(source_map.clone());

    let original = Span::new(BytePos(index.start_pos.0 + 13), index.end_pos);
    let span = provenance.stylesheet_span(original, Path::new("/styles/short.css"), &SourceOnlyLoader);

    assert_eq!(source_map.lookup_byte_offset(span.lo).pos.0, 4);
    assert_eq!(source_map.lookup_byte_offset(span.hi).pos.0, 4);
  }

  #[test]
  fn moves_offsets_onto_character_boundaries() {
    let source_map: Lrc<SourceMap> = Default::default();
    let index = importing_file(&source_map);
    let mut provenance = Provenance::new(source_map.clone());

    let original = Span::new(
      BytePos(index.start_pos.0 + 4),
      BytePos(index.start_pos.0 + 25),
    );
    let span = provenance.stylesheet_span(original, Path::new("/styles/accents.css"), &SourceOnlyLoader);

    // `é` spans bytes 3..5 and `ü` spans bytes 24..26
    assert_eq!(source_map.lookup_byte_offset(span.lo).pos.0, 3);
    assert_eq!(source_map.lookup_byte_offset(span.hi).pos.0, 24);
    assert_eq!(provenance.location(span.hi), (2, 16));
  }

  #[test]
  fn registers_each_stylesheet_once() {
    let source_map: Lrc<SourceMap> = Default::default();
    let index = importing_file(&source_map);
    let mut provenance = Provenance::new(source_map.clone());
    let original = Span::new(index.start_pos, BytePos(index.start_pos.0 + 1));

    let first = provenance.stylesheet_span(original, Path::new("/styles/short.css"), &SourceOnlyLoader);
    let second = provenance.stylesheet_span(original, Path::new("/styles/short.css"), &SourceOnlyLoader);

    assert_eq!(first, second);
  }

  #[test]
  fn keeps_the_original_span_when_the_stylesheet_is_unreadable() {
    let source_map: Lrc<SourceMap> = Default::default();
    let index = importing_file(&source_map);
    let mut provenance = Provenance::new(source_map);
    let original = Span::new(index.start_pos, BytePos(index.start_pos.0 + 5));

    let span = provenance.stylesheet_span(original, Path::new("/styles/missing.css"), &SourceOnlyLoader);

    assert_eq!(span, original);
    assert_eq!(provenance.location(original.lo), (1, 1));
  }
}
