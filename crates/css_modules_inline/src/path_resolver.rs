use std::path::{Component, Path, PathBuf};

/// Removes the quote characters around a raw specifier, e.g. `'./foo.css'` becomes `./foo.css`.
pub fn strip_quotes(raw_specifier: &str) -> &str {
  let mut chars = raw_specifier.chars();
  match (chars.next(), chars.next_back()) {
    (Some(open @ ('\'' | '"' | '`')), Some(close)) if open == close => {
      &raw_specifier[1..raw_specifier.len() - 1]
    }
    _ => raw_specifier,
  }
}

/// Resolve the raw text of an import specifier (quotes included) to a stylesheet path.
///
/// * `hook` gets the first say, so aliased and absolute import schemes can be mapped
/// * Specifiers starting with `.` are resolved against the directory of `importing_file`
/// * Anything else is returned as written and left to the stylesheet loader
///
/// Resolution never fails. A path that does not exist shows up once the stylesheet is loaded.
pub fn resolve_specifier(
  raw_specifier: &str,
  importing_file: &Path,
  hook: Option<&dyn Fn(&str) -> Option<PathBuf>>,
) -> PathBuf {
  let specifier = strip_quotes(raw_specifier);

  if let Some(resolved) = hook.and_then(|hook| hook(specifier)) {
    return resolved;
  }

  if specifier.starts_with('.') {
    let directory = importing_file.parent().unwrap_or_else(|| Path::new(""));
    return absolute_path(&directory.join(specifier));
  }

  PathBuf::from(specifier)
}

/// Make `path` absolute against the current working directory and drop `.` and `..` components.
///
/// This is lexical, symlinks are not followed.
pub fn absolute_path(path: &Path) -> PathBuf {
  let current_dir = if path.is_absolute() {
    None
  } else {
    std::env::current_dir().ok()
  };

  normalize_path(current_dir.as_deref(), path)
}

pub fn normalize_path(base: Option<&Path>, path: &Path) -> PathBuf {
  let mut result: Vec<Component> = match base {
    Some(base) if !path.is_absolute() => base.components().collect(),
    _ => vec![],
  };

  for component in path.components() {
    match component {
      Component::Prefix(prefix) => {
        result = vec![Component::Prefix(prefix)];
      }
      Component::RootDir => {
        result.push(Component::RootDir);
      }
      Component::CurDir => {}
      Component::ParentDir => {
        if matches!(result.last(), Some(Component::Normal(_))) {
          result.pop();
        } else if !matches!(result.last(), Some(Component::RootDir | Component::Prefix(_))) {
          result.push(Component::ParentDir);
        }
      }
      Component::Normal(path) => {
        result.push(Component::Normal(path));
      }
    }
  }

  PathBuf::from_iter(result)
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn test_strip_quotes() {
    assert_eq!(strip_quotes("'./foo.css'"), "./foo.css");
    assert_eq!(strip_quotes("\"./foo.css\""), "./foo.css");
    assert_eq!(strip_quotes("./foo.css"), "./foo.css");
    assert_eq!(strip_quotes("'"), "'");
    assert_eq!(strip_quotes(""), "");
  }

  #[test]
  fn test_relative_specifier_uses_importing_directory() {
    let resolved = resolve_specifier(
      "'./styles/foo.css'",
      Path::new("/project/src/index.ts"),
      None,
    );
    assert_eq!(resolved, PathBuf::from("/project/src/styles/foo.css"));

    let resolved = resolve_specifier("\"../foo.css\"", Path::new("/project/src/index.ts"), None);
    assert_eq!(resolved, PathBuf::from("/project/foo.css"));
  }

  #[test]
  fn test_relative_importing_file_is_made_absolute() {
    let resolved = resolve_specifier("'./foo.css'", Path::new("src/index.ts"), None);
    let expected = std::env::current_dir().unwrap().join("src/foo.css");
    assert_eq!(resolved, expected);
  }

  #[test]
  fn test_bare_specifier_is_unchanged() {
    let resolved = resolve_specifier(
      "'some-package/styles.css'",
      Path::new("/project/src/index.ts"),
      None,
    );
    assert_eq!(resolved, PathBuf::from("some-package/styles.css"));
  }

  #[test]
  fn test_hook_is_consulted_first() {
    let hook = |specifier: &str| {
      specifier
        .strip_prefix("some_alias/")
        .map(|rest| Path::new("/fixtures").join(rest))
    };

    let resolved = resolve_specifier(
      "'some_alias/foo.css'",
      Path::new("/project/src/index.ts"),
      Some(&hook),
    );
    assert_eq!(resolved, PathBuf::from("/fixtures/foo.css"));

    // A hook returning nothing falls back to the default resolution
    let resolved = resolve_specifier("'./foo.css'", Path::new("/project/index.ts"), Some(&hook));
    assert_eq!(resolved, PathBuf::from("/project/foo.css"));
  }

  #[test]
  fn test_normalize_path() {
    assert_eq!(
      normalize_path(None, Path::new("/a/./b/../c.css")),
      PathBuf::from("/a/c.css")
    );
    assert_eq!(
      normalize_path(Some(Path::new("/root")), Path::new("a/../../b.css")),
      PathBuf::from("/b.css")
    );
    assert_eq!(
      normalize_path(None, Path::new("../a.css")),
      PathBuf::from("../a.css")
    );
  }
}
