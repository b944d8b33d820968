//! Stage graph
//!
//! Stages are declared with their prerequisites and prompt template, then
//! validated once by [`StageGraphBuilder::build`]. A built [`StageGraph`]
//! is acyclic, every prerequisite exists, and every `{{output.<id>}}` a
//! template reads belongs to one of the stage's prerequisites.

use crate::error::GraphError;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use specflow_artifact::StageId;
use specflow_gateway::{ModelId, PromptTemplate};
use std::collections::{HashMap, HashSet};

/// Declaration of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Stage id, key in the output map
    pub id: StageId,
    /// Human readable label used in progress events
    pub label: String,
    /// Prompt template source
    pub template: String,
    /// Stages whose outputs this one needs
    #[serde(default)]
    pub prerequisites: Vec<StageId>,
    /// Model override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelId>,
}

impl StageSpec {
    /// Create new stage declaration
    #[inline]
    #[must_use]
    pub fn new(
        id: impl Into<StageId>,
        label: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            template: template.into(),
            prerequisites: Vec::new(),
            model: None,
        }
    }

    /// With prerequisites
    #[inline]
    #[must_use]
    pub fn after<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StageId>,
    {
        self.prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self
    }

    /// With model override
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<ModelId>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Validated stage with its compiled template
#[derive(Debug, Clone)]
pub struct Stage {
    spec: StageSpec,
    template: PromptTemplate,
}

impl Stage {
    /// Stage id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &StageId {
        &self.spec.id
    }

    /// Progress label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.spec.label
    }

    /// Prerequisite ids
    #[inline]
    #[must_use]
    pub fn prerequisites(&self) -> &[StageId] {
        &self.spec.prerequisites
    }

    /// Model override
    #[inline]
    #[must_use]
    pub fn model(&self) -> Option<&ModelId> {
        self.spec.model.as_ref()
    }

    /// Compiled template
    #[inline]
    #[must_use]
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Original declaration
    #[inline]
    #[must_use]
    pub fn spec(&self) -> &StageSpec {
        &self.spec
    }
}

/// Collects stage declarations for validation
#[derive(Debug, Clone, Default)]
pub struct StageGraphBuilder {
    specs: Vec<StageSpec>,
}

impl StageGraphBuilder {
    /// Create new builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stage
    #[inline]
    #[must_use]
    pub fn stage(mut self, spec: StageSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Validate and build
    ///
    /// # Errors
    /// - `GraphError::DuplicateStage` for repeated ids
    /// - `GraphError::SelfDependency` / `UnknownPrerequisite` for bad edges
    /// - `GraphError::Template` / `UndeclaredInput` for bad templates
    /// - `GraphError::Cycle` when prerequisites loop
    pub fn build(self) -> Result<StageGraph, GraphError> {
        let mut dag: DiGraph<usize, ()> = DiGraph::new();
        let mut index: HashMap<StageId, NodeIndex> = HashMap::new();

        for (pos, spec) in self.specs.iter().enumerate() {
            if index.contains_key(&spec.id) {
                return Err(GraphError::DuplicateStage(spec.id.clone()));
            }
            index.insert(spec.id.clone(), dag.add_node(pos));
        }

        let mut stages = Vec::with_capacity(self.specs.len());
        for spec in self.specs {
            let node = index[&spec.id];
            let mut prereqs = HashSet::new();
            for prereq in &spec.prerequisites {
                if *prereq == spec.id {
                    return Err(GraphError::SelfDependency(spec.id.clone()));
                }
                let from = *index.get(prereq).ok_or_else(|| GraphError::UnknownPrerequisite {
                    stage: spec.id.clone(),
                    prerequisite: prereq.clone(),
                })?;
                if prereqs.insert(prereq) {
                    dag.add_edge(from, node, ());
                }
            }

            let template =
                PromptTemplate::compile(spec.template.as_str()).map_err(|source| {
                    GraphError::Template {
                        stage: spec.id.clone(),
                        source,
                    }
                })?;
            if let Some(input) = template.stage_refs().find(|r| !prereqs.contains(r)) {
                return Err(GraphError::UndeclaredInput {
                    stage: spec.id.clone(),
                    input: input.clone(),
                });
            }

            stages.push(Stage { spec, template });
        }

        let order = toposort(&dag, None).map_err(|cycle| {
            let pos = dag[cycle.node_id()];
            GraphError::Cycle(stages[pos].spec.id.clone())
        })?;
        let order: Vec<usize> = order.into_iter().map(|n| dag[n]).collect();

        let depth = depths(&dag, &order, &index, &stages);
        tracing::debug!(stages = stages.len(), "stage graph built");

        Ok(StageGraph {
            stages,
            order,
            depth,
        })
    }
}

fn depths(
    dag: &DiGraph<usize, ()>,
    order: &[usize],
    index: &HashMap<StageId, NodeIndex>,
    stages: &[Stage],
) -> Vec<usize> {
    let mut depth = vec![0; stages.len()];
    for &pos in order {
        let node = index[stages[pos].id()];
        let d = dag
            .neighbors_directed(node, Direction::Incoming)
            .map(|n| depth[dag[n]] + 1)
            .max()
            .unwrap_or(0);
        depth[pos] = d;
    }
    depth
}

/// Validated, acyclic set of stages
#[derive(Debug, Clone)]
pub struct StageGraph {
    stages: Vec<Stage>,
    order: Vec<usize>,
    depth: Vec<usize>,
}

impl StageGraph {
    /// Start declaring a graph
    #[inline]
    #[must_use]
    pub fn builder() -> StageGraphBuilder {
        StageGraphBuilder::new()
    }

    /// Number of stages
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the graph has no stages
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stages in a topological order
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.order.iter().map(|&pos| &self.stages[pos])
    }

    /// Look up a stage
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id().as_str() == id)
    }

    /// Stage ids in a topological order
    #[must_use]
    pub fn order(&self) -> Vec<&StageId> {
        self.stages().map(Stage::id).collect()
    }

    /// Stages grouped by dependency depth; each group can run concurrently
    #[must_use]
    pub fn layers(&self) -> Vec<Vec<&Stage>> {
        let max = self.depth.iter().copied().max().map_or(0, |d| d + 1);
        let mut layers: Vec<Vec<&Stage>> = vec![Vec::new(); max];
        for &pos in &self.order {
            layers[self.depth[pos]].push(&self.stages[pos]);
        }
        layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(graph: &StageGraph) -> Vec<&str> {
        graph.order().into_iter().map(StageId::as_str).collect()
    }

    #[test]
    fn chain_orders_prerequisites_first() {
        let graph = StageGraph::builder()
            .stage(StageSpec::new("b", "B", "{{output.a}}").after(["a"]))
            .stage(StageSpec::new("a", "A", "{{title}}"))
            .build()
            .unwrap();
        assert_eq!(ids(&graph), vec!["a", "b"]);
    }

    #[test]
    fn fan_in_layers() {
        let graph = StageGraph::builder()
            .stage(StageSpec::new("x", "X", ""))
            .stage(StageSpec::new("y", "Y", ""))
            .stage(StageSpec::new("z", "Z", "{{output.x}}{{output.y}}").after(["x", "y"]))
            .build()
            .unwrap();
        let layers: Vec<Vec<&str>> = graph
            .layers()
            .iter()
            .map(|l| l.iter().map(|s| s.id().as_str()).collect())
            .collect();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1], vec!["z"]);
        assert_eq!(layers[0].len(), 2);
    }

    #[test]
    fn rejects_duplicates() {
        let err = StageGraph::builder()
            .stage(StageSpec::new("a", "A", ""))
            .stage(StageSpec::new("a", "A2", ""))
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateStage(StageId::new("a")));
    }

    #[test]
    fn rejects_unknown_prerequisite() {
        let err = StageGraph::builder()
            .stage(StageSpec::new("a", "A", "").after(["ghost"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownPrerequisite { .. }));
    }

    #[test]
    fn rejects_self_dependency() {
        let err = StageGraph::builder()
            .stage(StageSpec::new("a", "A", "").after(["a"]))
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::SelfDependency(StageId::new("a")));
    }

    #[test]
    fn rejects_cycles() {
        let err = StageGraph::builder()
            .stage(StageSpec::new("a", "A", "").after(["b"]))
            .stage(StageSpec::new("b", "B", "").after(["a"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::Cycle(_)));
    }

    #[test]
    fn rejects_unknown_placeholder() {
        let err = StageGraph::builder()
            .stage(StageSpec::new("a", "A", "{{owner}}"))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::Template { .. }));
    }

    #[test]
    fn rejects_undeclared_input() {
        let err = StageGraph::builder()
            .stage(StageSpec::new("a", "A", ""))
            .stage(StageSpec::new("b", "B", "{{output.a}}"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::UndeclaredInput {
                stage: StageId::new("b"),
                input: StageId::new("a"),
            }
        );
    }

    #[test]
    fn empty_graph_is_valid() {
        let graph = StageGraph::builder().build().unwrap();
        assert!(graph.is_empty());
        assert!(graph.layers().is_empty());
    }
}
