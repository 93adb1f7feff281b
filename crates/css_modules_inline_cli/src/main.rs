#![deny(unused_crate_dependencies)]

mod output;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use css_modules_inline::stylesheet::StylesheetLoader;
use css_modules_inline::{
  compile, register_loader, CompileError, CssModulesInlineOptions, InlineDiagnostic,
};
use tracing_subscriber::EnvFilter;

use crate::output::{output_paths, write_output};

/// Compile JavaScript and TypeScript files with their CSS module imports inlined
#[derive(Parser, Debug)]
#[command(name = "css-modules-inline", version)]
pub struct Cli {
  /// Files to compile, e.g. "src/**/*.ts"
  pub pattern: String,
  /// JSON file with inlining options
  #[arg(long)]
  pub config: Option<PathBuf>,
  /// [default value: next to each input]
  #[arg(long)]
  pub out_dir: Option<PathBuf>,
  /// Fail files with stylesheet references that cannot be inlined
  #[arg(long)]
  pub strict: bool,
  /// [possible values: "error", "warn", "info", "debug", "trace"]
  #[arg(long = "log", env = "RUST_LOG", default_value = "warn")]
  pub log: String,
}

fn main() -> anyhow::Result<ExitCode> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .init();

  if run(&cli)? {
    Ok(ExitCode::SUCCESS)
  } else {
    Ok(ExitCode::FAILURE)
  }
}

/// Compile every file matching the pattern. Returns false when a file failed.
fn run(cli: &Cli) -> anyhow::Result<bool> {
  let options = load_options(cli.config.as_deref(), cli.strict)?;
  let loader = register_loader(options.clone());

  let entries =
    glob::glob(&cli.pattern).with_context(|| format!("Invalid pattern {:?}", cli.pattern))?;

  let mut succeeded = true;
  let mut matched = 0;
  for entry in entries {
    let input = entry?;
    if !input.is_file() {
      continue;
    }
    matched += 1;

    if let Err(err) = compile_file(&input, cli.out_dir.as_deref(), &*loader, &options) {
      eprintln!("{err:#}");
      succeeded = false;
    }
  }

  if matched == 0 {
    tracing::warn!("No files matched {}", cli.pattern);
  }

  Ok(succeeded)
}

fn load_options(config: Option<&Path>, strict: bool) -> anyhow::Result<CssModulesInlineOptions> {
  let mut options = match config {
    Some(config) => {
      let contents = fs::read_to_string(config)
        .with_context(|| format!("Failed to read {}", config.display()))?;
      serde_json::from_str::<CssModulesInlineOptions>(&contents)
        .with_context(|| format!("Invalid options in {}", config.display()))?
    }
    None => CssModulesInlineOptions::default(),
  };

  options.strict |= strict;
  Ok(options)
}

fn print_diagnostics(diagnostics: &[InlineDiagnostic]) {
  for diagnostic in diagnostics {
    eprintln!("{diagnostic}");
  }
}

fn compile_file(
  input: &Path,
  out_dir: Option<&Path>,
  loader: &dyn StylesheetLoader,
  options: &CssModulesInlineOptions,
) -> anyhow::Result<()> {
  tracing::debug!("Compiling {}", input.display());

  let code =
    fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))?;

  let output = match compile(&code, input, loader, options) {
    Ok(output) => output,
    Err(CompileError::Strict {
      file_path,
      diagnostics,
    }) => {
      print_diagnostics(&diagnostics);
      anyhow::bail!(CompileError::Strict {
        file_path,
        diagnostics
      });
    }
    Err(err) => {
      return Err(err).with_context(|| format!("Failed to compile {}", input.display()));
    }
  };

  print_diagnostics(&output.diagnostics);
  write_output(
    &output_paths(input, out_dir),
    &output.code,
    &output.source_map,
  )
}
