use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::options::CssModulesInlineOptions;
use crate::stylesheet::LightningCssLoader;

static LOADER: OnceCell<Arc<LightningCssLoader>> = OnceCell::new();

/// Install the process wide stylesheet loader.
///
/// Only the first call builds a loader. Later calls get the installed one back and
/// their options are ignored.
pub fn register_loader(options: CssModulesInlineOptions) -> Arc<LightningCssLoader> {
  let mut installed = false;
  let loader = LOADER.get_or_init(|| {
    installed = true;
    Arc::new(LightningCssLoader::new(options))
  });

  if !installed {
    tracing::debug!("Stylesheet loader already registered, ignoring new options");
  }

  loader.clone()
}
