//! Build orchestration.
//!
//! A build walks these stages in order:
//!
//! ```text
//! Validating -> [Refreshing] -> Cloning -> PruningVariants -> PruningProperties -> Rendering -> Done
//! ```
//!
//! Any stage may end in `Failed`. Validation, refresh, cloning and rendering
//! failures are fatal; the two pruning stages only ever record per-item errors.
//! Each attempt produces exactly one user notification.

pub mod refresh;

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::document::{HostSurface, NodeId, NotifyOptions, Point};
use crate::error::{BuildError, DocumentError};
use crate::limits::{DEFAULT_REFRESH_TIMEOUT_MS, VIEWPORT_PADDING};
use crate::model::EnabledMap;
use crate::prune::{prune_properties, prune_variants, PropertyPruneReport, VariantPruneReport};
use crate::report::{ErrorSink, Severity};
use crate::validate::validate_enabled_map;

pub use refresh::{
    await_refresh, ChannelRefresher, NoRefresh, RefreshAck, RefreshRequest, SourceRefresher,
};

/// Where a build currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BuildStage {
    Idle,
    Validating,
    Refreshing,
    Cloning,
    PruningVariants,
    PruningProperties,
    Rendering,
    Done,
    Failed,
}

impl BuildStage {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildStage::Idle => "idle",
            BuildStage::Validating => "validating",
            BuildStage::Refreshing => "refreshing",
            BuildStage::Cloning => "cloning",
            BuildStage::PruningVariants => "pruning_variants",
            BuildStage::PruningProperties => "pruning_properties",
            BuildStage::Rendering => "rendering",
            BuildStage::Done => "done",
            BuildStage::Failed => "failed",
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables for a build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    /// How long to wait for a refresh acknowledgement. None waits forever.
    pub refresh_timeout: Option<Duration>,
    /// Distance the placed component sits above the viewport center.
    pub viewport_padding: f64,
    /// Whether to move the viewport onto the placed component.
    pub focus_viewport: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            refresh_timeout: Some(Duration::from_millis(DEFAULT_REFRESH_TIMEOUT_MS)),
            viewport_padding: VIEWPORT_PADDING,
            focus_viewport: true,
        }
    }
}

/// Statistics and collected errors of a completed build.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub build_id: Uuid,
    /// The pruned component, now owned by the canvas.
    pub component: NodeId,
    pub variants_processed: usize,
    pub variants_skipped: usize,
    pub variants_removed: usize,
    pub properties_processed: usize,
    pub properties_skipped: usize,
    pub dependents_removed: usize,
    pub elements_deleted: usize,
    pub errors: Vec<String>,
}

impl BuildResult {
    fn from_reports(
        build_id: Uuid,
        component: NodeId,
        variants: VariantPruneReport,
        properties: PropertyPruneReport,
    ) -> Self {
        let errors = variants
            .errors
            .iter()
            .chain(properties.errors.iter())
            .map(ToString::to_string)
            .collect();
        Self {
            build_id,
            component,
            variants_processed: variants.processed.len(),
            variants_skipped: variants.skipped.len(),
            variants_removed: variants.variants_removed,
            properties_processed: properties.processed.len(),
            properties_skipped: properties.skipped.len(),
            dependents_removed: properties.dependents_removed.len(),
            elements_deleted: properties.deleted_elements,
            errors,
        }
    }

    pub fn errors_count(&self) -> usize {
        self.errors.len()
    }

    /// The user-facing success message, naming only non-zero counts.
    pub fn summary(&self) -> String {
        let counts = [
            (self.variants_processed, "variant axis processed", "variant axes processed"),
            (self.variants_removed, "variant removed", "variants removed"),
            (self.properties_processed, "property removed", "properties removed"),
            (self.dependents_removed, "dependent property removed", "dependent properties removed"),
            (self.elements_deleted, "element deleted", "elements deleted"),
            (
                self.variants_skipped + self.properties_skipped,
                "item skipped",
                "items skipped",
            ),
            (self.errors_count(), "error", "errors"),
        ];
        let parts: Vec<String> = counts
            .iter()
            .filter(|(n, _, _)| *n > 0)
            .map(|(n, one, many)| format!("{n} {}", if *n == 1 { one } else { many }))
            .collect();
        if parts.is_empty() {
            "Component built with no changes".to_string()
        } else {
            format!("Component built: {}", parts.join(", "))
        }
    }
}

/// Drives one build at a time against a host.
pub struct BuildOrchestrator<'a, H, R> {
    host: &'a mut H,
    refresher: R,
    sink: &'a dyn ErrorSink,
    options: BuildOptions,
    stage: BuildStage,
}

impl<'a, H, R> BuildOrchestrator<'a, H, R>
where
    H: HostSurface,
    R: SourceRefresher,
{
    pub fn new(host: &'a mut H, refresher: R, sink: &'a dyn ErrorSink) -> Self {
        Self {
            host,
            refresher,
            sink,
            options: BuildOptions::default(),
            stage: BuildStage::Idle,
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// The stage the last build reached.
    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    pub fn host(&self) -> &H {
        self.host
    }

    /// Builds a pruned copy of `source` from a raw enabled map.
    ///
    /// The source itself is never modified. On success the pruned copy has
    /// been handed to the canvas.
    pub async fn build(
        &mut self,
        source: NodeId,
        raw: &serde_json::Value,
    ) -> Result<BuildResult, BuildError> {
        let build_id = Uuid::now_v7();
        let span = tracing::info_span!("build", %build_id, %source);
        let outcome = self.run(build_id, source, raw).instrument(span).await;

        match outcome {
            Ok(result) => {
                self.enter(BuildStage::Done);
                tracing::info!(%build_id, errors = result.errors_count(), "build finished");
                self.host.notify_user(&result.summary(), NotifyOptions { error: false });
                Ok(result)
            }
            Err(err) => {
                self.enter(BuildStage::Failed);
                tracing::error!(%build_id, stage = %err.stage(), error = %err, "build failed");
                self.sink
                    .report(Severity::Fatal, err.stage().as_str(), &err.to_string());
                self.host
                    .notify_user(&format!("Build failed: {err}"), NotifyOptions { error: true });
                Err(err)
            }
        }
    }

    async fn run(
        &mut self,
        build_id: Uuid,
        source: NodeId,
        raw: &serde_json::Value,
    ) -> Result<BuildResult, BuildError> {
        self.enter(BuildStage::Validating);
        let enabled = validate_enabled_map(raw)?;

        let source = self.ensure_live_source(source).await?;

        self.enter(BuildStage::Cloning);
        let working = self.clone_source(source)?;

        self.prune_and_place(build_id, working, &enabled)
    }

    /// Runs both pruning passes and places the result. No suspension past this point.
    fn prune_and_place(
        &mut self,
        build_id: Uuid,
        working: NodeId,
        enabled: &EnabledMap,
    ) -> Result<BuildResult, BuildError> {
        let disabled = enabled.disabled_keys();

        self.enter(BuildStage::PruningVariants);
        let variants = prune_variants(&mut *self.host, working, enabled, self.sink);

        self.enter(BuildStage::PruningProperties);
        let properties = prune_properties(&mut *self.host, working, enabled, &disabled, self.sink);

        self.enter(BuildStage::Rendering);
        if let Err(e) = self.place(working) {
            self.discard(working);
            return Err(BuildError::Render {
                component: working,
                reason: e.to_string(),
            });
        }

        Ok(BuildResult::from_reports(build_id, working, variants, properties))
    }

    /// Returns a live source node, refreshing through the host if needed.
    async fn ensure_live_source(&mut self, source: NodeId) -> Result<NodeId, BuildError> {
        if self.host.is_live(source) {
            return Ok(source);
        }

        self.enter(BuildStage::Refreshing);
        tracing::info!(%source, "source component is stale, requesting refresh");
        let ack = await_refresh(&mut self.refresher, self.options.refresh_timeout).await?;
        if !ack.success {
            return Err(BuildError::StaleSource {
                reason: "host could not reacquire the component".to_string(),
            });
        }

        match self.host.current_selection() {
            Some(node) if self.host.is_live(node) => Ok(node),
            _ => Err(BuildError::StaleSource {
                reason: "refreshed selection is not a live component".to_string(),
            }),
        }
    }

    fn clone_source(&mut self, source: NodeId) -> Result<NodeId, BuildError> {
        match self.host.clone_node(source) {
            Ok(Some(node)) => Ok(node),
            Ok(None) => Err(BuildError::Clone {
                reason: "host returned no node".to_string(),
            }),
            Err(e) => Err(BuildError::Clone {
                reason: e.to_string(),
            }),
        }
    }

    /// Appends the component centered on the viewport, raised by the padding.
    fn place(&mut self, node: NodeId) -> Result<(), DocumentError> {
        let center = self.host.viewport_center();
        let size = self.host.size(node)?;
        self.host.append_to_canvas(node)?;
        self.host.set_position(
            node,
            Point::new(
                center.x - size.width / 2.0,
                center.y - size.height / 2.0 - self.options.viewport_padding,
            ),
        )?;
        if self.options.focus_viewport {
            self.host.focus_viewport(node)?;
        }
        Ok(())
    }

    fn discard(&mut self, node: NodeId) {
        if let Err(e) = self.host.remove_node(node) {
            self.sink
                .report(Severity::Warning, "discard", &format!("could not discard {node}: {e}"));
        }
    }

    fn enter(&mut self, stage: BuildStage) {
        tracing::debug!(from = %self.stage, to = %stage, "build stage");
        self.stage = stage;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::{DocumentPort, MemoryDocument, NodeSpec, Size};
    use crate::error::ValidationError;
    use crate::model::PropertyDefinition;
    use crate::report::CollectingSink;

    fn button() -> NodeSpec {
        NodeSpec::new("Button")
            .size(200.0, 100.0)
            .definition("size", PropertyDefinition::variant("sm", ["sm", "lg"]))
            .definition("Label#1:0", PropertyDefinition::text("OK"))
            .child(NodeSpec::new("size=sm").child(NodeSpec::new("Text").reference("characters", "Label#1:0")))
            .child(NodeSpec::new("size=lg").child(NodeSpec::new("Text").reference("characters", "Label#1:0")))
    }

    #[test]
    fn test_summary_names_non_zero_counts() {
        let result = BuildResult {
            build_id: Uuid::nil(),
            component: NodeId(1),
            variants_processed: 1,
            variants_skipped: 0,
            variants_removed: 3,
            properties_processed: 0,
            properties_skipped: 1,
            dependents_removed: 0,
            elements_deleted: 0,
            errors: vec!["boom".to_string()],
        };
        assert_eq!(
            result.summary(),
            "Component built: 1 variant axis processed, 3 variants removed, 1 item skipped, 1 error"
        );
    }

    #[tokio::test]
    async fn test_build_places_pruned_clone() {
        let mut doc = MemoryDocument::new();
        doc.set_viewport_center(Point::new(500.0, 400.0));
        let source = doc.load(&button());
        let sink = CollectingSink::new();

        let result = {
            let mut builder = BuildOrchestrator::new(&mut doc, NoRefresh, &sink);
            let result = builder
                .build(source, &json!({"size": false, "Label#1:0": false}))
                .await
                .unwrap();
            assert_eq!(builder.stage(), BuildStage::Done);
            result
        };

        assert_eq!(result.variants_processed, 1);
        assert_eq!(result.variants_removed, 1);
        assert_eq!(result.properties_processed, 1);
        assert_eq!(result.elements_deleted, 1);
        assert!(result.errors.is_empty());

        assert_eq!(doc.canvas(), &[result.component]);
        assert_eq!(doc.focused(), Some(result.component));
        assert_eq!(doc.position(result.component).unwrap(), Point::new(400.0, 250.0));
        assert_eq!(doc.child_names(result.component), vec![""]);
        // The source is untouched.
        assert_eq!(doc.child_names(source), vec!["size=sm", "size=lg"]);

        assert_eq!(doc.notifications().len(), 1);
        assert!(!doc.notifications()[0].error);
    }

    #[tokio::test]
    async fn test_validation_failure_is_fatal_and_mutation_free() {
        let mut doc = MemoryDocument::new();
        let source = doc.load(&button());
        let before = doc.snapshot(source).unwrap();
        let sink = CollectingSink::new();

        let mut builder = BuildOrchestrator::new(&mut doc, NoRefresh, &sink);
        let err = builder.build(source, &json!({})).await.unwrap_err();
        assert_eq!(err, BuildError::Validation(ValidationError::Empty));
        assert_eq!(builder.stage(), BuildStage::Failed);

        assert_eq!(doc.snapshot(source).unwrap(), before);
        assert!(doc.canvas().is_empty());
        assert_eq!(doc.notifications().len(), 1);
        assert!(doc.notifications()[0].error);
        assert_eq!(sink.at_least(Severity::Fatal)[0].operation, "validating");
    }

    #[tokio::test]
    async fn test_stale_source_is_refreshed() {
        let mut doc = MemoryDocument::new();
        let stale = doc.load(&button());
        let fresh = doc.load(&button());
        doc.invalidate(stale);
        doc.select(Some(fresh));
        let sink = CollectingSink::new();

        let (refresher, mut requests) = ChannelRefresher::channel();
        let host = tokio::spawn(async move {
            let request = requests.recv().await.unwrap();
            request.complete(true);
        });

        let mut builder = BuildOrchestrator::new(&mut doc, refresher, &sink);
        let result = builder.build(stale, &json!({"size": true})).await.unwrap();
        host.await.unwrap();

        assert_eq!(doc.child_names(result.component), vec!["size=sm", "size=lg"]);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_fatal() {
        let mut doc = MemoryDocument::new();
        let source = doc.load(&button());
        doc.invalidate(source);
        let sink = CollectingSink::new();

        let mut builder = BuildOrchestrator::new(&mut doc, NoRefresh, &sink);
        let err = builder.build(source, &json!({"size": true})).await.unwrap_err();
        assert!(matches!(err, BuildError::StaleSource { .. }));
        assert_eq!(err.stage(), BuildStage::Refreshing);
    }

    #[tokio::test]
    async fn test_refresh_timeout_is_fatal() {
        let mut doc = MemoryDocument::new();
        let source = doc.load(&button());
        doc.invalidate(source);
        let sink = CollectingSink::new();
        let (refresher, _requests) = ChannelRefresher::channel();

        let mut builder = BuildOrchestrator::new(&mut doc, refresher, &sink).with_options(BuildOptions {
            refresh_timeout: Some(Duration::from_millis(5)),
            ..BuildOptions::default()
        });
        let err = builder.build(source, &json!({"size": true})).await.unwrap_err();
        assert_eq!(err, BuildError::RefreshTimedOut { after_ms: 5 });
    }

    #[tokio::test]
    async fn test_clone_failure_is_fatal() {
        let mut doc = MemoryDocument::new();
        let source = doc.load(&button());
        doc.fail_next_clone();
        let sink = CollectingSink::new();

        let mut builder = BuildOrchestrator::new(&mut doc, NoRefresh, &sink);
        let err = builder.build(source, &json!({"size": false})).await.unwrap_err();
        assert!(matches!(err, BuildError::Clone { .. }));
        assert!(doc.canvas().is_empty());
        assert!(doc.notifications()[0].message.contains("[B002]"));
    }

    #[tokio::test]
    async fn test_render_failure_discards_clone() {
        let mut doc = MemoryDocument::new();
        let source = doc.load(&button());
        doc.fail_append(true);
        let sink = CollectingSink::new();

        let mut builder = BuildOrchestrator::new(&mut doc, NoRefresh, &sink);
        let err = builder.build(source, &json!({"size": false})).await.unwrap_err();
        let BuildError::Render { component, .. } = &err else {
            panic!("expected a render error, got {err:?}");
        };
        assert!(!doc.contains(*component));
        assert!(doc.canvas().is_empty());
        assert_eq!(doc.size(source).unwrap(), Size { width: 200.0, height: 100.0 });
    }

    #[tokio::test]
    async fn test_no_focus_option() {
        let mut doc = MemoryDocument::new();
        let source = doc.load(&button());
        let sink = CollectingSink::new();

        let mut builder = BuildOrchestrator::new(&mut doc, NoRefresh, &sink).with_options(BuildOptions {
            focus_viewport: false,
            ..BuildOptions::default()
        });
        builder.build(source, &json!({"size": true})).await.unwrap();
        assert_eq!(doc.focused(), None);
        assert_eq!(doc.canvas().len(), 1);
        assert!(doc.is_live(source));
    }
}
