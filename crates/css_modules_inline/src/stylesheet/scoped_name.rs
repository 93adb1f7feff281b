use std::borrow::Cow;

use inflector::cases::camelcase::to_camel_case;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::ClassNameMapping;
use crate::options::CamelCase;

pub const DEFAULT_SCOPED_NAME: &str = "[name]__[local]___[hash]";

/// Pattern that leaves class names as they are written.
pub const LOCAL_NAME_PATTERN: &str = "[local]";

static HASH_PLACEHOLDER: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"\[(hash|contenthash|content-hash)(?::[^\]]*)?\]").unwrap());

static DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+(\w)").unwrap());

/// Rewrite postcss style placeholders such as `[hash:base64:5]` into lightningcss segments.
pub fn lightningcss_pattern(template: &str) -> Cow<'_, str> {
  HASH_PLACEHOLDER.replace_all(template, |captures: &Captures| {
    if &captures[1] == "hash" {
      "[hash]"
    } else {
      "[content-hash]"
    }
  })
}

fn dashes_camel_case(name: &str) -> String {
  DASHES
    .replace_all(name, |captures: &Captures| captures[1].to_uppercase())
    .into_owned()
}

pub fn apply_camel_case(mapping: ClassNameMapping, camel_case: CamelCase) -> ClassNameMapping {
  if camel_case == CamelCase::Off {
    return mapping;
  }

  let mut result = ClassNameMapping::new();
  for (local, generated) in mapping.iter() {
    match camel_case {
      CamelCase::Off => result.insert(local, generated),
      CamelCase::CamelCase => {
        result.insert(local, generated);
        result.insert(to_camel_case(local), generated);
      }
      CamelCase::Dashes => {
        result.insert(local, generated);
        result.insert(dashes_camel_case(local), generated);
      }
      CamelCase::Only => result.insert(to_camel_case(local), generated),
      CamelCase::DashesOnly => result.insert(dashes_camel_case(local), generated),
    }
  }
  result
}
