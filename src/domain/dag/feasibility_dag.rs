use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use slotmap::{SlotMap, new_key_type};

use crate::domain::application::simple_application::SimpleApplication;
use crate::domain::catalogue::slot::Slot;
use crate::domain::catalogue::slot_catalogue::SlotCatalogue;
use crate::domain::dag::infeasibility::Infeasibility;
use crate::domain::search::solution_candidate::SolutionCandidate;
use crate::domain::topology::topology::Topology;
use crate::domain::utils::id::SystemNodeId;
use crate::error::{Error, Result};

new_key_type! {
    pub struct VertexId;
}

/// A vertex of a feasibility DAG: either one of the two virtual vertices or a slot.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The slot name, or `{request}_start` / `{request}_end` for the virtual vertices.
    pub label: String,

    /// The link the slot runs on, used to group vertices when rendering.
    pub group: String,

    pub slot: Option<Arc<Slot>>,

    children: Vec<VertexId>,
    parents: Vec<VertexId>,

    /// Every reason this vertex was marked infeasible for, in marking order.
    reasons: Vec<Infeasibility>,
}

impl Vertex {
    fn new(label: String, group: String, slot: Option<Arc<Slot>>) -> Self {
        Self { label, group, slot, children: Vec::new(), parents: Vec::new(), reasons: Vec::new() }
    }

    pub fn children(&self) -> &[VertexId] {
        &self.children
    }

    pub fn parents(&self) -> &[VertexId] {
        &self.parents
    }

    pub fn reasons(&self) -> &[Infeasibility] {
        &self.reasons
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_isolated(&self) -> bool {
        self.children.is_empty() && self.parents.is_empty()
    }
}

/// The pruned search graph of one request.
///
/// Every path from the virtual start vertex to the virtual end vertex is a chain of slots serving
/// the request within its current pruning parameters. Vertices that cannot reach the end are
/// disconnected during construction and keep the reasons they were cut for.
#[derive(Debug, Clone)]
pub struct FeasibilityDag {
    /// Snapshot of the request, including the pruning parameters the DAG was built with.
    request: SimpleApplication,

    vertices: SlotMap<VertexId, Vertex>,

    /// Lookup of the vertex by its label.
    label_index: HashMap<String, VertexId>,

    start: VertexId,
    end: VertexId,

    /// Vertices marked infeasible during expansion, in marking order.
    marked: Vec<(VertexId, Infeasibility)>,

    /// Labels of every (parent, child) edge removed while backtracking.
    removed_edges: Vec<(String, String)>,
}

impl FeasibilityDag {
    /// Creates a DAG holding only the virtual start and end vertices of `request`.
    pub fn new(request: SimpleApplication) -> Self {
        let mut vertices = SlotMap::with_key();
        let mut label_index = HashMap::new();

        let start_label = format!("{}_start", request.name);
        let end_label = format!("{}_end", request.name);
        let start = vertices.insert(Vertex::new(start_label.clone(), start_label.clone(), None));
        let end = vertices.insert(Vertex::new(end_label.clone(), end_label.clone(), None));
        label_index.insert(start_label, start);
        label_index.insert(end_label, end);

        Self { request, vertices, label_index, start, end, marked: Vec::new(), removed_edges: Vec::new() }
    }

    /// Builds the DAG of `request` with its current pruning parameters.
    ///
    /// Slots are explored breadth first from the departure window. A slot reaching the
    /// destination is connected to the end vertex if it arrives within the arrival window; every
    /// other slot is either expanded along the stored routes or marked infeasible. Finally all
    /// marked vertices are backtracked so that every remaining path leads to the end vertex.
    pub fn construct(topology: &Topology, catalogue: &SlotCatalogue, request: &SimpleApplication) -> Result<Self> {
        let mut dag = FeasibilityDag::new(request.clone());
        let params = request.params();
        let max_outgoing = params.max_outgoing_connections_per_slot();

        let mut frontier: Vec<VertexId> = Vec::new();
        for next_node in topology.get_successors(&request.from, &request.from, &request.to) {
            let slots = catalogue.get_sorted_slots(&request.from, &next_node, &params.departure_lower_bound(), &params.departure_upper_bound());
            for slot in slots.into_iter().take(max_outgoing) {
                let vertex = dag.add_slot_vertex(slot);
                dag.add_edge(dag.start, vertex)?;
                if !frontier.contains(&vertex) {
                    frontier.push(vertex);
                }
            }
        }

        let mut processed: HashSet<VertexId> = HashSet::new();
        while !frontier.is_empty() {
            let mut next_frontier: Vec<VertexId> = Vec::new();
            let mut in_next_frontier: HashSet<VertexId> = HashSet::new();

            for vertex in frontier {
                if !processed.insert(vertex) {
                    continue;
                }
                let Some(slot) = dag.vertices[vertex].slot.clone() else {
                    continue;
                };

                if slot.to == request.to {
                    if slot.end.is_within_bounds(&params.arrival_lower_bound(), &params.arrival_upper_bound()) {
                        dag.add_edge(vertex, dag.end)?;
                    } else if slot.end.is_within_bounds(&params.departure_lower_bound(), &params.arrival_lower_bound()) {
                        dag.mark_infeasible(vertex, Infeasibility::Underdue);
                    } else {
                        dag.mark_infeasible(vertex, Infeasibility::Overdue);
                    }
                } else if !params.is_within_hard_bounds(&slot.end) {
                    dag.mark_infeasible(vertex, Infeasibility::Overdue);
                } else {
                    for child in dag.expand(topology, catalogue, vertex, &slot)? {
                        if in_next_frontier.insert(child) {
                            next_frontier.push(child);
                        }
                    }
                }
            }

            frontier = next_frontier;
        }

        dag.backtrack_marked();

        log::debug!(
            "Request {}: DAG with {} vertices and {} edges, target reached: {}",
            request.name,
            dag.nb_vertices(),
            dag.nb_edges(),
            dag.is_target_node_reached()
        );

        Ok(dag)
    }

    /// Connects the slot vertex `vertex` to every slot departing from its arrival node within
    /// the allowed dwell time, or marks it `NoSuccessor`.
    ///
    /// # Returns
    /// The children added.
    fn expand(&mut self, topology: &Topology, catalogue: &SlotCatalogue, vertex: VertexId, slot: &Slot) -> Result<Vec<VertexId>> {
        let params = self.request.params().clone();
        let max_outgoing = params.max_outgoing_connections_per_slot();
        let at = &slot.to;

        let lower = slot.end.plus(params.min_dwell_time());
        let upper = lower.plus(params.max_additional_dwell_time(at));

        let successors = topology.get_successors(at, &self.request.from, &self.request.to);
        if successors.is_empty() {
            self.mark_infeasible(vertex, Infeasibility::NoSuccessor);
            return Ok(Vec::new());
        }

        let mut children = Vec::new();
        for next_node in successors {
            let candidates = catalogue.get_sorted_slots(at, &next_node, &lower, &upper);

            if candidates.is_empty() {
                if !matches!(catalogue.get_next_slot_within_24(at, &next_node, &upper), Ok(Some(_))) {
                    log::warn!("Request {}: no slot {} => {} within 24h after {}", self.request.name, at, next_node, slot.name);
                }
                self.mark_infeasible(vertex, Infeasibility::NoSuccessor);
                continue;
            }

            if candidates.len() > max_outgoing {
                log::debug!(
                    "Request {}: not considering {} of {} outgoing connections at slot {}",
                    self.request.name,
                    candidates.len() - max_outgoing,
                    candidates.len(),
                    slot.name
                );
            }

            for next_slot in candidates.into_iter().take(max_outgoing) {
                let child = self.add_slot_vertex(next_slot);
                self.add_edge(vertex, child)?;
                children.push(child);
            }
        }

        Ok(children)
    }

    /// Adds a vertex, or returns the existing one if `label` is taken.
    pub fn add_vertex(&mut self, label: &str, group: &str, slot: Option<Arc<Slot>>) -> VertexId {
        if let Some(id) = self.label_index.get(label) {
            return *id;
        }
        let id = self.vertices.insert(Vertex::new(label.to_string(), group.to_string(), slot));
        self.label_index.insert(label.to_string(), id);
        id
    }

    fn add_slot_vertex(&mut self, slot: Arc<Slot>) -> VertexId {
        let label = slot.name.to_string();
        let group = slot.section.to_string();
        self.add_vertex(&label, &group, Some(slot))
    }

    /// Adds the edge `from -> to`. Adding an existing edge is a no-op.
    ///
    /// # Returns
    /// `Error::CycleDetected` if `from` is reachable from `to`; the DAG is left unchanged.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId) -> Result<()> {
        if self.vertices[from].children.contains(&to) {
            return Ok(());
        }
        if from == to || self.is_reachable(to, from) {
            return Err(Error::CycleDetected { from: self.vertices[from].label.clone(), to: self.vertices[to].label.clone() });
        }

        self.vertices[from].children.push(to);
        self.vertices[to].parents.push(from);
        Ok(())
    }

    pub fn remove_edge(&mut self, from: VertexId, to: VertexId) {
        if let Some(vertex) = self.vertices.get_mut(from) {
            vertex.children.retain(|child| *child != to);
        }
        if let Some(vertex) = self.vertices.get_mut(to) {
            vertex.parents.retain(|parent| *parent != from);
        }
    }

    fn is_reachable(&self, from: VertexId, target: VertexId) -> bool {
        let mut stack = vec![from];
        let mut visited: HashSet<VertexId> = HashSet::new();
        while let Some(vertex) = stack.pop() {
            if vertex == target {
                return true;
            }
            if visited.insert(vertex) {
                stack.extend(self.vertices[vertex].children.iter().copied());
            }
        }
        false
    }

    fn mark_infeasible(&mut self, vertex: VertexId, reason: Infeasibility) {
        self.record_reason(vertex, reason);
        self.marked.push((vertex, reason));
    }

    fn record_reason(&mut self, vertex: VertexId, reason: Infeasibility) {
        let reasons = &mut self.vertices[vertex].reasons;
        if !reasons.contains(&reason) {
            reasons.push(reason);
        }
    }

    fn backtrack_marked(&mut self) {
        let marked = self.marked.clone();
        for (vertex, reason) in marked {
            self.backtrack_on_vertex(vertex, reason);
        }
    }

    /// Cuts a dead end: if `vertex` has no children but parents, records `reason`, removes the
    /// edges from its parents and continues with every parent other than the start vertex,
    /// which is then infeasible for `Backtracking` if it became childless.
    pub fn backtrack_on_vertex(&mut self, vertex: VertexId, reason: Infeasibility) {
        let mut worklist: VecDeque<(VertexId, Infeasibility)> = VecDeque::new();
        worklist.push_back((vertex, reason));

        while let Some((current, reason)) = worklist.pop_front() {
            let Some(v) = self.vertices.get(current) else {
                continue;
            };
            if !v.children.is_empty() || v.parents.is_empty() {
                continue;
            }

            self.record_reason(current, reason);

            let parents = self.vertices[current].parents.clone();
            for parent in parents {
                self.removed_edges.push((self.vertices[parent].label.clone(), self.vertices[current].label.clone()));
                self.remove_edge(parent, current);

                if parent == self.start {
                    continue;
                }
                worklist.push_back((parent, Infeasibility::Backtracking));
            }
        }
    }

    pub fn request(&self) -> &SimpleApplication {
        &self.request
    }

    pub fn start(&self) -> VertexId {
        self.start
    }

    pub fn end(&self) -> VertexId {
        self.end
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn vertex_id(&self, label: &str) -> Option<VertexId> {
        self.label_index.get(label).copied()
    }

    /// Iterates all vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices.iter()
    }

    pub fn nb_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn nb_edges(&self) -> usize {
        self.vertices.values().map(|v| v.children.len()).sum()
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.vertex_id(from), self.vertex_id(to)) {
            (Some(from), Some(to)) => self.vertices[from].children.contains(&to),
            _ => false,
        }
    }

    pub fn removed_edges(&self) -> &[(String, String)] {
        &self.removed_edges
    }

    pub fn is_target_node_reached(&self) -> bool {
        !self.vertices[self.end].parents.is_empty()
    }

    /// The number of paths from the start vertex to the end vertex, 0 if the end is not reached.
    pub fn nb_paths(&self) -> u64 {
        if !self.is_target_node_reached() {
            return 0;
        }
        self.paths_from_vertex(self.start)
    }

    /// The number of paths from `vertex` to any leaf, a leaf counting as one path. Saturates at
    /// `u64::MAX`; 0 for a vertex not in this DAG.
    pub fn paths_from_vertex(&self, vertex: VertexId) -> u64 {
        if !self.vertices.contains_key(vertex) {
            return 0;
        }
        let mut memo: HashMap<VertexId, u64> = HashMap::new();
        self.count_paths(vertex, &mut memo)
    }

    fn count_paths(&self, vertex: VertexId, memo: &mut HashMap<VertexId, u64>) -> u64 {
        if let Some(count) = memo.get(&vertex) {
            return *count;
        }
        let Some(v) = self.vertices.get(vertex) else {
            return 0;
        };
        let count = if v.children.is_empty() { 1 } else { v.children.iter().fold(0u64, |sum, child| sum.saturating_add(self.count_paths(*child, memo))) };
        memo.insert(vertex, count);
        count
    }

    /// `E - V + 2` over all connected vertices, 0 if the end is not reached.
    pub fn cyclomatic_complexity(&self) -> i64 {
        if !self.is_target_node_reached() {
            return 0;
        }

        let mut nb_edges = 0i64;
        let mut nb_vertices = 0i64;
        for vertex in self.vertices.values() {
            if vertex.is_isolated() {
                continue;
            }
            nb_vertices += 1;
            nb_edges += vertex.children.len() as i64;
        }
        nb_edges - nb_vertices + 2
    }

    /// `E - V + 2` over the graph spanned by the candidates plus a virtual start and end.
    pub fn cyclomatic_complexity_from_candidates(candidates: &[SolutionCandidate]) -> i64 {
        let mut vertices: HashSet<String> = HashSet::from(["start".to_string(), "end".to_string()]);
        let mut edges: HashSet<String> = HashSet::new();

        for candidate in candidates {
            let path = candidate.path();
            let (Some(first), Some(last)) = (path.first(), path.last()) else {
                continue;
            };
            edges.insert(format!("start_{}", first.name));
            edges.insert(format!("{}_end", last.name));
            vertices.insert(first.name.to_string());
            vertices.insert(last.name.to_string());

            for pair in path.windows(2) {
                vertices.insert(pair[0].name.to_string());
                vertices.insert(pair[1].name.to_string());
                edges.insert(format!("{}_{}", pair[0].name, pair[1].name));
            }
        }

        edges.len() as i64 - vertices.len() as i64 + 2
    }

    /// The number of distinct slots used by the candidates.
    pub fn span(candidates: &[SolutionCandidate]) -> usize {
        candidates.iter().flat_map(|candidate| candidate.path().iter().map(|slot| slot.name.clone())).collect::<HashSet<_>>().len()
    }

    /// The number of slots on the link with the fewest slots among all vertices leading to the
    /// end vertex; 0 if the end is not reached.
    pub fn bottleneck_size(&self) -> usize {
        let mut sizes: HashMap<(SystemNodeId, SystemNodeId), HashSet<VertexId>> = HashMap::new();
        let mut visited: HashSet<VertexId> = HashSet::new();
        let mut stack = vec![self.end];

        while let Some(vertex) = stack.pop() {
            for parent in &self.vertices[vertex].parents {
                if *parent == self.start {
                    continue;
                }
                if let Some(slot) = &self.vertices[*parent].slot {
                    sizes.entry((slot.from.clone(), slot.to.clone())).or_default().insert(*parent);
                }
                if visited.insert(*parent) {
                    stack.push(*parent);
                }
            }
        }

        sizes.values().map(|vertices| vertices.len()).min().unwrap_or(0)
    }

    /// # Returns
    /// The reasons the slot vertex `label` was marked infeasible for, empty for unknown labels.
    pub fn infeasibility_reasons(&self, label: &str) -> Vec<Infeasibility> {
        self.vertex_id(label).map(|id| self.vertices[id].reasons.clone()).unwrap_or_default()
    }

    /// # Returns
    /// The labels of all vertices marked infeasible for `reason`, in insertion order.
    pub fn infeasible_slots(&self, reason: Infeasibility) -> Vec<String> {
        self.vertices.values().filter(|v| v.reasons.contains(&reason)).map(|v| v.label.clone()).collect()
    }

    pub fn log_infeasibilities(&self) {
        for reason in Infeasibility::ALL {
            for label in self.infeasible_slots(reason) {
                log::info!("Request {} has infeasible slot {} since {}", self.request.name, label, reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::time::cyclic_time_frame::CyclicTimeFrame;
    use crate::domain::utils::id::{RequestName, SystemNodeId};
    use chrono::Weekday::Mon;

    fn empty_dag() -> FeasibilityDag {
        let request =
            SimpleApplication::new(RequestName::new("r"), SystemNodeId::new("X"), SystemNodeId::new("Y"), CyclicTimeFrame::new(Mon, 5, 0), CyclicTimeFrame::new(Mon, 6, 0), (0, 0, 0))
                .unwrap();
        FeasibilityDag::new(request)
    }

    #[test]
    fn test_recursive_remove() {
        let mut dag = empty_dag();
        let root = dag.add_vertex("root", "root", None);
        let a = dag.add_vertex("a", "g", None);
        let b = dag.add_vertex("b", "g", None);
        let c = dag.add_vertex("c", "g", None);
        let d = dag.add_vertex("d", "g", None);

        //  root - a - b - c
        //           |
        //           - d
        dag.add_edge(root, a).unwrap();
        dag.add_edge(a, b).unwrap();
        dag.add_edge(b, c).unwrap();
        dag.add_edge(a, d).unwrap();
        assert_eq!(dag.paths_from_vertex(root), 2);
        assert_eq!(dag.paths_from_vertex(b), 1);
        assert_eq!(dag.paths_from_vertex(a), 2);

        dag.backtrack_on_vertex(c, Infeasibility::NoSuccessor);

        //  root - a
        //           |
        //           - d
        assert!(!dag.has_edge("b", "c"));
        assert!(!dag.has_edge("a", "b"));
        assert!(dag.has_edge("root", "a"));
        assert!(dag.has_edge("a", "d"));
        assert_eq!(dag.paths_from_vertex(root), 1);
        assert_eq!(dag.paths_from_vertex(b), 1);
        assert_eq!(dag.paths_from_vertex(a), 1);

        assert_eq!(dag.infeasibility_reasons("c"), vec![Infeasibility::NoSuccessor]);
        assert_eq!(dag.infeasibility_reasons("b"), vec![Infeasibility::Backtracking]);
        assert!(dag.infeasibility_reasons("a").is_empty());
        assert_eq!(dag.removed_edges().len(), 2);
    }

    #[test]
    fn test_add_edge_rejects_cycles() {
        let mut dag = empty_dag();
        let a = dag.add_vertex("a", "g", None);
        let b = dag.add_vertex("b", "g", None);
        let c = dag.add_vertex("c", "g", None);
        dag.add_edge(a, b).unwrap();
        dag.add_edge(b, c).unwrap();
        dag.add_edge(b, c).unwrap();
        assert_eq!(dag.vertex(b).unwrap().children().len(), 1, "Adding an edge twice is a no-op");

        assert!(matches!(dag.add_edge(c, a), Err(Error::CycleDetected { .. })));
        assert!(matches!(dag.add_edge(a, a), Err(Error::CycleDetected { .. })));
        assert!(!dag.has_edge("c", "a"));
    }

    #[test]
    fn test_path_count_saturates() {
        let mut dag = empty_dag();
        let root = dag.add_vertex("root", "root", None);

        // 65 layers of two vertices, each connected to both vertices of the next layer.
        let mut previous = vec![root];
        for layer in 0..65 {
            let current = vec![dag.add_vertex(&format!("{}_a", layer), "g", None), dag.add_vertex(&format!("{}_b", layer), "g", None)];
            for from in &previous {
                for to in &current {
                    dag.add_edge(*from, *to).unwrap();
                }
            }
            previous = current;
        }

        assert_eq!(dag.paths_from_vertex(previous[0]), 1);
        assert_eq!(dag.paths_from_vertex(dag.vertex_id("1_a").unwrap()), 1 << 63);
        assert_eq!(dag.paths_from_vertex(root), u64::MAX, "2^65 paths do not fit into u64");
    }

    #[test]
    fn test_path_count_of_unknown_vertex() {
        let dag = empty_dag();
        assert_eq!(dag.paths_from_vertex(VertexId::default()), 0);
    }

    #[test]
    fn test_empty_dag_has_no_paths() {
        let dag = empty_dag();
        assert!(!dag.is_target_node_reached());
        assert_eq!(dag.nb_paths(), 0);
        assert_eq!(dag.cyclomatic_complexity(), 0);
        assert_eq!(dag.bottleneck_size(), 0);
        assert_eq!(dag.vertex(dag.start()).unwrap().label, "r_start");
        assert_eq!(dag.vertex(dag.end()).unwrap().label, "r_end");
    }
}
