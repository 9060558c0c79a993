use std::collections::HashMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use switchyard_context::{Context, Field, TracingPublisher};
use switchyard_definition::{Definition, DefinitionDef, ExitCode};
use switchyard_keys::SymbolicKey;
use switchyard_runtime::{
  AsyncDriver, AsyncNodeBehavior, AsyncNodeFactory, BehaviorError, Blocking, DriverConfig,
  NodeBehavior,
};

/// Switchyard - a single-active-node workflow engine
#[derive(Parser)]
#[command(name = "switchyard")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Log filter used when RUST_LOG is not set
  #[arg(long, global = true, default_value = "warn")]
  log_level: String,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Check that a definition file builds
  Validate {
    /// Path to the definition file (JSON)
    definition_file: PathBuf,
  },

  /// Print a definition as a Graphviz digraph
  Inspect {
    /// Path to the definition file (JSON)
    definition_file: PathBuf,
  },

  /// Run a definition with scripted behaviors
  ///
  /// The context is seeded from a JSON object on stdin. Every node reads
  /// its exit codes from the `script` field, e.g.
  /// `{"script": {"Init": ["Start"], "Working": ["Next", "Done"]}}`;
  /// the n-th visit of a node produces its n-th code (the last code repeats,
  /// nodes without codes produce "Done").
  Run {
    /// Path to the definition file (JSON)
    definition_file: PathBuf,

    /// Fail after this many steps
    #[arg(long)]
    max_steps: Option<usize>,

    /// Per-node timeout in milliseconds
    #[arg(long)]
    node_timeout_ms: Option<u64>,

    /// Fail when a node with outgoing links produces an unmatched code
    #[arg(long)]
    strict: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
    )
    .with_writer(io::stderr)
    .with_target(false)
    .init();

  match cli.command {
    Some(Commands::Validate { definition_file }) => validate(&definition_file)?,
    Some(Commands::Inspect { definition_file }) => {
      let definition = load_definition(&definition_file)?;
      print!("{}", definition.to_dot());
    }
    Some(Commands::Run {
      definition_file,
      max_steps,
      node_timeout_ms,
      strict,
    }) => {
      let mut config = DriverConfig {
        node_timeout_ms,
        strict_transitions: strict,
        ..Default::default()
      };
      if let Some(max_steps) = max_steps {
        config.max_steps = max_steps;
      }
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { run_definition(&definition_file, config).await })?;
    }
    None => {
      println!("switchyard - use --help to see available commands");
    }
  }

  Ok(())
}

fn load_definition(path: &Path) -> Result<Definition> {
  let def = DefinitionDef::from_path(path)
    .with_context(|| format!("failed to load definition file: {}", path.display()))?;
  def
    .build()
    .with_context(|| format!("invalid definition: {}", path.display()))
}

fn validate(path: &Path) -> Result<()> {
  let definition = load_definition(path)?;
  let reachable = definition.reachable_from_initial();

  println!(
    "{}: {} nodes, {} links, initial '{}'",
    definition.name(),
    definition.nodes().len(),
    definition.links().len(),
    definition.initial()
  );
  for key in definition.nodes().keys() {
    if !reachable.contains(key) {
      println!("  unreachable: {}", key);
    }
  }

  Ok(())
}

async fn run_definition(path: &Path, config: DriverConfig) -> Result<()> {
  let definition = Arc::new(load_definition(path)?);

  // Every behavior type in the file runs the scripted behavior
  let mut factory = AsyncNodeFactory::new();
  for node in definition.nodes().values() {
    factory.register_fn(node.behavior().clone(), |key| {
      Box::new(Blocking::new(Scripted::new(key))) as Box<dyn AsyncNodeBehavior>
    });
  }

  let seed = read_payload_from_stdin()?;
  let context = Context::from_json(definition.name(), seed, Arc::new(TracingPublisher))
    .context("failed to seed context")?;

  let mut driver = AsyncDriver::new(definition, Arc::new(factory), context)
    .context("failed to create driver")?
    .with_config(config);

  let cancel = CancellationToken::new();
  let ctrl_c = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      ctrl_c.cancel();
    }
  });

  let outcome = driver.run(cancel).await.context("run failed")?;

  eprintln!(
    "Finished at '{}' with code '{}' after {} steps",
    outcome.node, outcome.code, outcome.steps
  );

  let output = json!({
    "outcome": serde_json::to_value(&outcome)?,
    "context": driver.context().to_json(),
  });
  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

fn field<T>(name: &str) -> Result<Field<T>, BehaviorError> {
  Field::new(name).map_err(|e| BehaviorError::with_source("invalid field name", e))
}

/// Produces the codes listed for its node in the context's `script` field
/// and appends the node name to `trail`.
struct Scripted {
  key: SymbolicKey,
  visits: usize,
}

impl Scripted {
  fn new(key: SymbolicKey) -> Self {
    Self { key, visits: 0 }
  }
}

impl NodeBehavior for Scripted {
  fn key(&self) -> &SymbolicKey {
    &self.key
  }

  fn execute(&mut self, context: &mut Context) -> Result<ExitCode, BehaviorError> {
    let script: Field<HashMap<String, Vec<ExitCode>>> = field("script")?;
    let trail: Field<Vec<String>> = field("trail")?;

    let script = context.try_value(&script)?.unwrap_or_default();
    let code = match script.get(self.key.name()) {
      Some(codes) if !codes.is_empty() => codes[self.visits.min(codes.len() - 1)].clone(),
      _ => ExitCode::DONE,
    };
    self.visits += 1;

    let mut visited = context.value(&trail);
    visited.push(self.key.name().to_string());
    context.store(&trail, visited);

    Ok(code)
  }
}

fn read_payload_from_stdin() -> Result<serde_json::Value> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    return Ok(json!({}));
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read context from stdin")?;

  if input.trim().is_empty() {
    Ok(json!({}))
  } else {
    serde_json::from_str(&input).context("failed to parse context JSON from stdin")
  }
}
