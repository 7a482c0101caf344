use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use reconflow_binder::{BindingIssue, bind_and_render};
use reconflow_catalog::{FsCatalog, ToolCatalog, load_catalog};
use reconflow_client::{ApiClient, ClientConfig};
use reconflow_session::{
  ChannelNotifier, RunTarget, SessionConfig, SessionEvent, SessionPhase, SessionRunner, prepare_run,
};
use reconflow_store::{FsWorkflowStore, WorkflowStore};
use reconflow_workflow::Workflow;

/// Reconflow - compose and run recon tool pipelines
#[derive(Parser)]
#[command(name = "reconflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.reconflow)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Base URL of the execution backend
  #[arg(
    long,
    global = true,
    env = "RECONFLOW_API_BASE",
    default_value = ClientConfig::DEFAULT_API_BASE
  )]
  server: String,

  /// Tool catalog file (default: <data-dir>/tools.yaml)
  #[arg(long, global = true)]
  catalog: Option<PathBuf>,

  /// Fetch the tool catalog from the backend instead of a file
  #[arg(long, global = true)]
  remote_catalog: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// List the tools in the catalog
  Tools,

  /// Print the command each node would run
  Render {
    /// Path to the workflow file (JSON or YAML)
    workflow_file: PathBuf,

    /// Only render this node
    #[arg(long)]
    node: Option<String>,
  },

  /// Check that a workflow can be submitted
  Validate {
    /// Path to the workflow file (JSON or YAML)
    workflow_file: PathBuf,
  },

  /// Submit a workflow and stream its progress
  Run {
    /// Path to the workflow file (JSON or YAML)
    workflow_file: PathBuf,

    /// Target environment label
    #[arg(long, default_value = "default")]
    project: String,

    /// Run-wide input as key=value, e.g. --input domain=example.com
    #[arg(long = "input", value_name = "KEY=VALUE")]
    inputs: Vec<String>,
  },

  /// Save a workflow
  Save {
    /// Path to the workflow file (JSON or YAML)
    workflow_file: PathBuf,

    /// Save to the backend instead of the data directory
    #[arg(long)]
    remote: bool,
  },

  /// List saved workflows
  List {
    /// List workflows stored on the backend
    #[arg(long)]
    remote: bool,
  },
}

struct AppContext {
  data_dir: PathBuf,
  catalog_path: PathBuf,
  remote_catalog: bool,
  client: ApiClient,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".reconflow"),
  };
  let config = ClientConfig::new(&cli.server).context("invalid --server")?;
  let ctx = AppContext {
    catalog_path: cli.catalog.unwrap_or_else(|| data_dir.join("tools.yaml")),
    data_dir,
    remote_catalog: cli.remote_catalog,
    client: ApiClient::new(config).context("failed to create http client")?,
  };

  let Some(command) = cli.command else {
    println!("reconflow - use --help to see available commands");
    return Ok(());
  };

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async {
    match command {
      Commands::Tools => list_tools(&ctx).await,
      Commands::Render {
        workflow_file,
        node,
      } => render(&ctx, &workflow_file, node.as_deref()).await,
      Commands::Validate { workflow_file } => validate(&ctx, &workflow_file).await,
      Commands::Run {
        workflow_file,
        project,
        inputs,
      } => run(&ctx, &workflow_file, project, &inputs).await,
      Commands::Save { workflow_file, remote } => save(&ctx, &workflow_file, remote).await,
      Commands::List { remote } => list(&ctx, remote).await,
    }
  })
}

async fn load_tools(ctx: &AppContext) -> Result<ToolCatalog> {
  if ctx.remote_catalog {
    return load_catalog(&ctx.client)
      .await
      .context("failed to fetch tool catalog from backend");
  }
  let source = FsCatalog::new(&ctx.catalog_path);
  load_catalog(&source)
    .await
    .with_context(|| format!("failed to load tool catalog: {}", ctx.catalog_path.display()))
}

async fn load_workflow(path: &Path) -> Result<Workflow> {
  let content = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read workflow file: {}", path.display()))?;

  let is_yaml = matches!(
    path.extension().and_then(|e| e.to_str()),
    Some("yaml") | Some("yml")
  );
  let workflow = if is_yaml {
    serde_yaml::from_str(&content).map_err(anyhow::Error::from)
  } else {
    serde_json::from_str(&content).map_err(anyhow::Error::from)
  };
  workflow.with_context(|| format!("failed to parse workflow file: {}", path.display()))
}

async fn list_tools(ctx: &AppContext) -> Result<()> {
  let catalog = load_tools(ctx).await?;
  for tool in catalog.tools() {
    let category = tool.category.as_deref().unwrap_or("-");
    println!("{:<16} {:<12} {}", tool.id, category, tool.display_name());
    for arg in &tool.args {
      let required = if arg.required { " (required)" } else { "" };
      println!("    {:<14} {:?}{}", arg.name, arg.arg_type, required);
    }
  }
  Ok(())
}

async fn render(ctx: &AppContext, workflow_file: &Path, only: Option<&str>) -> Result<()> {
  let catalog = load_tools(ctx).await?;
  let workflow = load_workflow(workflow_file).await?;

  let order = match workflow.graph().topological_order() {
    Ok(order) => order,
    Err(e) => {
      eprintln!("warning: {}", e);
      workflow.nodes().iter().map(|n| n.id.clone()).collect()
    }
  };

  if let Some(id) = only
    && workflow.get_node(id).is_none()
  {
    bail!("node '{}' not found in workflow", id);
  }

  for node_id in order.iter().filter(|id| only.is_none_or(|o| o == id.as_str())) {
    let Some(node) = workflow.get_node(node_id) else {
      continue;
    };
    let Some(tool) = catalog.get(&node.tool) else {
      println!("{}: unknown tool '{}'", node.id, node.tool);
      continue;
    };
    let (bound, argv) = bind_and_render(tool, &node.params);
    println!("{}: {}", node.id, argv.join(" "));
    for issue in bound.issues() {
      eprintln!("  ! {}", describe_issue(issue));
    }
  }
  Ok(())
}

fn describe_issue(issue: &BindingIssue) -> String {
  match issue {
    BindingIssue::MissingRequired { arg } => format!("required argument '{}' is empty", arg),
    BindingIssue::InvalidValue { arg, message } => format!("argument '{}': {}", arg, message),
    BindingIssue::UnknownArgument { arg } => format!("ignoring unknown argument '{}'", arg),
  }
}

async fn validate(ctx: &AppContext, workflow_file: &Path) -> Result<()> {
  let catalog = load_tools(ctx).await?;
  let workflow = load_workflow(workflow_file).await?;

  match prepare_run(&workflow, &catalog, "default", BTreeMap::new()) {
    Ok(request) => {
      println!("ok: {}", request.workflow.order().join(" -> "));
      Ok(())
    }
    Err(e) => {
      for issue in &e.issues {
        eprintln!("  ! {}", issue);
      }
      bail!("workflow '{}' is not runnable", workflow.id)
    }
  }
}

fn parse_inputs(raw: &[String]) -> Result<BTreeMap<String, String>> {
  raw
    .iter()
    .map(|pair| match pair.split_once('=') {
      Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
      _ => bail!("invalid --input '{}', expected KEY=VALUE", pair),
    })
    .collect()
}

async fn run(
  ctx: &AppContext,
  workflow_file: &Path,
  project: String,
  inputs: &[String],
) -> Result<()> {
  let catalog = load_tools(ctx).await?;
  let workflow = load_workflow(workflow_file).await?;
  let target = RunTarget {
    project,
    inputs: parse_inputs(inputs)?,
  };

  let runner = SessionRunner::new(
    Arc::new(ctx.client.clone()),
    Arc::new(catalog),
    SessionConfig::default(),
  );
  let (events_tx, mut events) = mpsc::unbounded_channel();
  let handle = runner.start(&workflow, target, ChannelNotifier::new(events_tx));

  let stop = handle.cancellation_token();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      eprintln!("stopping run...");
      stop.cancel();
    }
  });

  let printer = tokio::spawn(async move {
    while let Some(event) = events.recv().await {
      print_event(&event);
    }
  });

  let session = handle.wait().await?;
  let phase = session.phase();
  let failure = session.failure().map(ToString::to_string);
  let summary: Vec<String> = session
    .nodes()
    .into_iter()
    .map(|(id, state)| {
      format!(
        "  {:<12} {:<8} {} log lines",
        id,
        state.status().to_string(),
        state.logs().len()
      )
    })
    .collect();
  drop(session);
  if let Err(e) = printer.await {
    warn!(error = %e, "event printer task failed");
  }

  eprintln!("run {}", phase);
  for line in summary {
    eprintln!("{}", line);
  }
  match (phase, failure) {
    (SessionPhase::Completed, _) => Ok(()),
    (_, Some(failure)) => bail!(failure),
    (phase, None) => bail!("run ended {}", phase),
  }
}

fn print_event(event: &SessionEvent) {
  match event {
    SessionEvent::PhaseChanged { run_id, phase, .. } => match run_id {
      Some(run_id) => eprintln!("[{}] {}", run_id, phase),
      None => eprintln!("[-] {}", phase),
    },
    SessionEvent::NodeStatusChanged { node_id, to, .. } => eprintln!("[{}] {}", node_id, to),
    SessionEvent::NodeLog { node_id, line, .. } => println!("[{}] {}", node_id, line),
  }
}

async fn save(ctx: &AppContext, workflow_file: &Path, remote: bool) -> Result<()> {
  let workflow = load_workflow(workflow_file).await?;
  let store = open_store(ctx, remote);
  store
    .save(&workflow)
    .await
    .with_context(|| format!("failed to save workflow '{}'", workflow.id))?;
  println!("saved {}", workflow.id);
  Ok(())
}

async fn list(ctx: &AppContext, remote: bool) -> Result<()> {
  let store = open_store(ctx, remote);
  let workflows = store.list().await.context("failed to list workflows")?;
  for workflow in workflows {
    println!(
      "{:<20} {:<24} {} nodes",
      workflow.id,
      workflow.name,
      workflow.node_count()
    );
  }
  Ok(())
}

fn open_store(ctx: &AppContext, remote: bool) -> Box<dyn WorkflowStore> {
  if remote {
    Box::new(ctx.client.clone())
  } else {
    Box::new(FsWorkflowStore::new(ctx.data_dir.join("workflows")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_inputs() {
    let inputs = parse_inputs(&[
      "domain=example.com".to_string(),
      "url=https://a.b/?x=1".to_string(),
    ])
    .unwrap();
    assert_eq!(inputs.get("domain").map(String::as_str), Some("example.com"));
    assert_eq!(inputs.get("url").map(String::as_str), Some("https://a.b/?x=1"));
  }

  #[test]
  fn test_parse_inputs_rejects_missing_separator() {
    assert!(parse_inputs(&["domain".to_string()]).is_err());
    assert!(parse_inputs(&["=value".to_string()]).is_err());
  }
}
