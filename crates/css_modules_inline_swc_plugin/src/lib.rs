use std::path::PathBuf;

use css_modules_inline::{register_loader, CssModulesInlineOptions, CssModulesInliner};
use swc_core::common::errors::HANDLER;
use swc_core::ecma::ast::Program;
use swc_core::ecma::visit::VisitMutWith;
use swc_core::plugin::metadata::TransformPluginMetadataContextKind;
use swc_core::plugin::{plugin_transform, proxies::TransformPluginProgramMetadata};

#[plugin_transform]
pub fn process_transform(
  mut program: Program,
  metadata: TransformPluginProgramMetadata,
) -> Program {
  let options = match metadata.get_transform_plugin_config() {
    Some(config_string) => serde_json::from_str::<CssModulesInlineOptions>(&config_string)
      .expect("Invalid JSON configuration"),
    None => CssModulesInlineOptions::default(),
  };

  let file_path = metadata
    .get_context(&TransformPluginMetadataContextKind::Filename)
    .map(PathBuf::from)
    .unwrap_or_default();

  let loader = register_loader(options.clone());
  let mut inliner = CssModulesInliner::new(file_path, &*loader, &options);
  program.visit_mut_with(&mut inliner);

  HANDLER.with(|handler| {
    for diagnostic in inliner.diagnostics() {
      let message = diagnostic.error.to_string();
      if options.strict {
        handler.struct_span_err(diagnostic.span, &message).emit();
      } else {
        handler.struct_span_warn(diagnostic.span, &message).emit();
      }
    }
  });

  program
}
