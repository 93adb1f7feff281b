use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;

#[derive(Debug, PartialEq, Eq)]
pub struct OutputPaths {
  pub code: PathBuf,
  pub source_map: PathBuf,
}

/// `<input>.js` and `<input>.js.map`, next to the input or under `out_dir`.
///
/// Relative inputs keep their directories under `out_dir`.
pub fn output_paths(input: &Path, out_dir: Option<&Path>) -> OutputPaths {
  let code = match out_dir {
    None => input.with_extension("js"),
    Some(out_dir) if input.is_relative() => {
      let relative: PathBuf = input
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .collect();
      out_dir.join(relative).with_extension("js")
    }
    Some(out_dir) => out_dir
      .join(input.file_name().unwrap_or_default())
      .with_extension("js"),
  };

  let mut source_map = code.clone().into_os_string();
  source_map.push(".map");

  OutputPaths {
    code,
    source_map: PathBuf::from(source_map),
  }
}

fn with_source_mapping_url(code: &str, source_map: &Path) -> String {
  let file_name = source_map
    .file_name()
    .map(|name| name.to_string_lossy())
    .unwrap_or_default();

  let separator = if code.ends_with('\n') { "" } else { "\n" };
  format!("{code}{separator}//# sourceMappingURL={file_name}\n")
}

pub fn write_output(paths: &OutputPaths, code: &str, source_map: &[u8]) -> anyhow::Result<()> {
  if let Some(parent) = paths.code.parent() {
    fs::create_dir_all(parent)
      .with_context(|| format!("Failed to create {}", parent.display()))?;
  }

  fs::write(&paths.code, with_source_mapping_url(code, &paths.source_map))
    .with_context(|| format!("Failed to write {}", paths.code.display()))?;
  fs::write(&paths.source_map, source_map)
    .with_context(|| format!("Failed to write {}", paths.source_map.display()))?;

  tracing::debug!("Wrote {}", paths.code.display());
  Ok(())
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn test_output_paths() {
    assert_eq!(
      output_paths(Path::new("src/index.ts"), None),
      OutputPaths {
        code: PathBuf::from("src/index.js"),
        source_map: PathBuf::from("src/index.js.map"),
      }
    );
    assert_eq!(
      output_paths(Path::new("./src/button.tsx"), Some(Path::new("dist"))),
      OutputPaths {
        code: PathBuf::from("dist/src/button.js"),
        source_map: PathBuf::from("dist/src/button.js.map"),
      }
    );
    assert_eq!(
      output_paths(Path::new("/project/src/index.ts"), Some(Path::new("dist"))),
      OutputPaths {
        code: PathBuf::from("dist/index.js"),
        source_map: PathBuf::from("dist/index.js.map"),
      }
    );
  }

  #[test]
  fn test_source_mapping_url() {
    assert_eq!(
      with_source_mapping_url("var a = 1;\n", Path::new("dist/index.js.map")),
      "var a = 1;\n//# sourceMappingURL=index.js.map\n"
    );
    assert_eq!(
      with_source_mapping_url("var a = 1;", Path::new("index.js.map")),
      "var a = 1;\n//# sourceMappingURL=index.js.map\n"
    );
  }
}
