use indexmap::IndexMap;

/// Local class name to generated class name(s), in the order the loader produced them.
///
/// Composed classes hold every generated name separated by a space.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassNameMapping {
  entries: IndexMap<String, String>,
}

impl ClassNameMapping {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert a class, keeping the position of an existing key.
  pub fn insert(&mut self, local: impl Into<String>, generated: impl Into<String>) {
    self.entries.insert(local.into(), generated.into());
  }

  pub fn get(&self, local: &str) -> Option<&str> {
    self.entries.get(local).map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .entries
      .iter()
      .map(|(local, generated)| (local.as_str(), generated.as_str()))
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ClassNameMapping {
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    let mut mapping = ClassNameMapping::new();
    for (local, generated) in iter {
      mapping.insert(local, generated);
    }
    mapping
  }
}
