//! Prunes a component set stored as a JSON document fixture.
//!
//! Usage:
//!   prune-component --document button.json --enabled enabled.json [--output pruned.json]
//!
//! Set `RUST_LOG=component_pruner=debug` to see each pruning step.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use component_pruner::build::{BuildOptions, BuildOrchestrator, NoRefresh};
use component_pruner::document::{DocumentFixture, MemoryDocument};
use component_pruner::report::TracingSink;

#[derive(Parser)]
#[command(name = "prune-component")]
#[command(about = "Build a pruned copy of a component set from an enabled map")]
#[command(long_about = None)]
struct Args {
    /// Document fixture holding the source component and viewport
    #[arg(long)]
    document: PathBuf,

    /// JSON object of property keys to keep (true) or remove (false)
    #[arg(long)]
    enabled: PathBuf,

    /// Where to write the pruned component as a fixture
    #[arg(long)]
    output: Option<PathBuf>,

    /// Leave the viewport where it is after placing the component
    #[arg(long)]
    no_focus: bool,

    /// How long to wait for a source refresh (0 waits forever)
    #[arg(long, default_value_t = component_pruner::limits::DEFAULT_REFRESH_TIMEOUT_MS)]
    refresh_timeout_ms: u64,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let fixture: DocumentFixture = read_json(&args.document)?;
    let enabled: serde_json::Value = read_json(&args.enabled)?;

    let (mut doc, source) = MemoryDocument::from_fixture(&fixture);
    let options = BuildOptions {
        refresh_timeout: (args.refresh_timeout_ms > 0)
            .then(|| Duration::from_millis(args.refresh_timeout_ms)),
        focus_viewport: !args.no_focus,
        ..BuildOptions::default()
    };

    let sink = TracingSink;
    let result = BuildOrchestrator::new(&mut doc, NoRefresh, &sink)
        .with_options(options)
        .build(source, &enabled)
        .await
        .context("build failed")?;

    println!("{}", result.summary());
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(path) = &args.output {
        let pruned = DocumentFixture {
            component: doc.snapshot(result.component)?,
            viewport: fixture.viewport,
        };
        fs::write(path, serde_json::to_string_pretty(&pruned)?)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote pruned component");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_path(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
    }

    #[test]
    fn test_read_json_fixtures() {
        let fixture: DocumentFixture = read_json(&fixture_path("button.json")).unwrap();
        assert_eq!(fixture.component.children.len(), 6);
        let enabled: serde_json::Value = read_json(&fixture_path("enabled.json")).unwrap();
        assert_eq!(enabled["size"], serde_json::json!(false));
    }

    #[test]
    fn test_read_json_names_missing_file() {
        let err = read_json::<serde_json::Value>(Path::new("no-such-file.json")).unwrap_err();
        assert!(err.to_string().contains("no-such-file.json"));
    }

    #[test]
    fn test_args_parse_flags() {
        let args = Args::parse_from([
            "prune-component",
            "--document",
            "doc.json",
            "--enabled",
            "enabled.json",
            "--no-focus",
            "--refresh-timeout-ms",
            "0",
        ]);
        assert!(args.no_focus);
        assert_eq!(args.refresh_timeout_ms, 0);
        assert!(args.output.is_none());
    }
}
