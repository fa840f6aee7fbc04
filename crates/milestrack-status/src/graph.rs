//! Cross-project dependency graph
//!
//! Milestones from every project live in one graph keyed by
//! `(project, milestone)`. Traversals are breadth-first and tolerate cycles,
//! since the feed is not guaranteed to be acyclic.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use milestrack_core::{DependencyEdge, MilestoneKey};

/// Milestone dependency graph
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    nodes: BTreeSet<MilestoneKey>,
    successors: HashMap<MilestoneKey, Vec<MilestoneKey>>,
    predecessors: HashMap<MilestoneKey, Vec<MilestoneKey>>,
    edge_count: usize,
}

impl DependencyGraph {
    pub fn from_edges(edges: &[DependencyEdge]) -> Self {
        let mut graph = Self::default();
        for edge in edges {
            graph.add_edge(edge.predecessor.key(), edge.successor.key());
        }
        graph
    }

    /// Add an edge; duplicates are ignored
    pub fn add_edge(&mut self, from: MilestoneKey, to: MilestoneKey) {
        self.nodes.insert(from.clone());
        self.nodes.insert(to.clone());

        let out = self.successors.entry(from.clone()).or_default();
        if out.contains(&to) {
            return;
        }
        out.push(to.clone());
        self.predecessors.entry(to).or_default().push(from);
        self.edge_count += 1;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn contains(&self, key: &MilestoneKey) -> bool {
        self.nodes.contains(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &MilestoneKey> {
        self.nodes.iter()
    }

    /// Direct successors, in insertion order
    pub fn successors(&self, key: &MilestoneKey) -> &[MilestoneKey] {
        self.successors.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct predecessors, in insertion order
    pub fn predecessors(&self, key: &MilestoneKey) -> &[MilestoneKey] {
        self.predecessors.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every milestone transitively depending on `key`, nearest first
    pub fn downstream(&self, key: &MilestoneKey) -> Vec<MilestoneKey> {
        self.walk(key, &self.successors)
    }

    /// Every milestone `key` transitively depends on, nearest first
    pub fn upstream(&self, key: &MilestoneKey) -> Vec<MilestoneKey> {
        self.walk(key, &self.predecessors)
    }

    fn walk(
        &self,
        start: &MilestoneKey,
        adjacency: &HashMap<MilestoneKey, Vec<MilestoneKey>>,
    ) -> Vec<MilestoneKey> {
        let mut visited: HashSet<&MilestoneKey> = HashSet::new();
        let mut queue: VecDeque<&MilestoneKey> = VecDeque::new();
        let mut order = Vec::new();

        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for next in adjacency.get(current).into_iter().flatten() {
                if visited.insert(next) {
                    order.push(next.clone());
                    queue.push_back(next);
                }
            }
        }

        order
    }

    /// Projects present in the graph
    pub fn projects(&self) -> BTreeSet<&str> {
        self.nodes.iter().map(|k| k.project.as_str()).collect()
    }

    /// Edges whose ends are in different projects
    pub fn cross_project_edges(&self) -> Vec<(&MilestoneKey, &MilestoneKey)> {
        let mut edges: Vec<(&MilestoneKey, &MilestoneKey)> = self
            .successors
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (from, to)))
            .filter(|(from, to)| from.project != to.project)
            .collect();
        edges.sort();
        edges
    }

    /// Project-level dependencies: project -> projects it depends on
    pub fn project_dependencies(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut deps: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (from, to) in self.cross_project_edges() {
            deps.entry(to.project.as_str())
                .or_default()
                .insert(from.project.as_str());
        }
        deps
    }
}
