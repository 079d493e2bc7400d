use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::allocation::allocation_problem::{earliness, lateness};
use crate::domain::allocation::formulation::{FLOW_CONSTRAINT_PREFIX, Formulation, SlotUsage};
use crate::domain::allocation::linear_model::{LinearModel, Sense};
use crate::domain::application::simple_application::SimpleApplication;
use crate::domain::catalogue::slot::Slot;
use crate::domain::dag::feasibility_dag::{FeasibilityDag, Vertex, VertexId};
use crate::domain::utils::id::RequestName;
use crate::error::{Error, Result};

/// One binary variable `{request}|{tail}|{head}` per DAG edge, with flow conservation per vertex.
///
/// The weight of an edge into a slot is the slot's duration plus the earliness (from the start
/// vertex) or the dwell time since the previous slot; the weight of an edge into the end vertex
/// is the lateness of the last slot. Summed along a path this is the candidate weight.
#[derive(Debug, Default)]
pub struct ArcNodeFormulation {
    /// Per variable: the request and the slot of the edge's tail, `None` for edges out of start.
    arcs: HashMap<usize, (RequestName, Option<Arc<Slot>>)>,
    slot_usage: SlotUsage,
}

impl ArcNodeFormulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nb_arcs(&self) -> usize {
        self.arcs.len()
    }
}

fn slot_of(vertex: &Vertex) -> Result<Arc<Slot>> {
    vertex.slot.clone().ok_or_else(|| Error::InternalConsistency(format!("Vertex {} is not a slot", vertex.label)))
}

fn vertex_of(dag: &FeasibilityDag, id: VertexId) -> Result<&Vertex> {
    dag.vertex(id).ok_or_else(|| Error::InternalConsistency(format!("Unknown vertex in DAG of {}", dag.request().name)))
}

fn arc_variable(vars: &HashMap<(VertexId, VertexId), usize>, from: VertexId, to: VertexId) -> Result<usize> {
    vars.get(&(from, to)).copied().ok_or_else(|| Error::InternalConsistency("Edge without variable".to_string()))
}

impl Formulation for ArcNodeFormulation {
    fn name(&self) -> &str {
        "arc-node"
    }

    fn add_request(&mut self, model: &mut LinearModel, request: &SimpleApplication, dag: &FeasibilityDag) -> Result<()> {
        let mut vars: HashMap<(VertexId, VertexId), usize> = HashMap::new();
        for (id, vertex) in dag.vertices() {
            for child in vertex.children() {
                let child_vertex = vertex_of(dag, *child)?;
                let name = format!("{}|{}|{}", request.name, vertex.label, child_vertex.label);
                let var = model.add_binary_variable(&name, 0.0)?;
                vars.insert((id, *child), var);
                self.arcs.insert(var, (request.name.clone(), vertex.slot.clone()));
            }
        }

        for (id, vertex) in dag.vertices() {
            if vertex.is_isolated() {
                continue;
            }

            let mut terms = Vec::new();
            for child in vertex.children() {
                let var = arc_variable(&vars, id, *child)?;
                terms.push((var, 1.0));

                let child_vertex = vertex_of(dag, *child)?;
                let weight = if !child_vertex.is_leaf() {
                    let second = slot_of(child_vertex)?;
                    let lead = if vertex.is_root() { earliness(request, &second) } else { second.start.distance_after(&slot_of(vertex)?.end).num_milliseconds() };
                    second.duration().num_milliseconds() + lead
                } else {
                    lateness(request, &*slot_of(vertex)?)
                };
                model.add_to_objective(var, weight as f64);

                if !vertex.is_leaf() && !vertex.is_root() {
                    self.slot_usage.add(&slot_of(vertex)?.name, var);
                }
            }
            for parent in vertex.parents() {
                terms.push((arc_variable(&vars, *parent, id)?, -1.0));
            }

            let rhs = if vertex.is_leaf() {
                -1.0
            } else if vertex.is_root() {
                1.0
            } else {
                0.0
            };
            let name = format!("{}{}|{}", FLOW_CONSTRAINT_PREFIX, request.name, vertex.label);
            model.add_constraint(&name, terms, Sense::Eq, rhs)?;
        }

        Ok(())
    }

    fn finalize(&mut self, model: &mut LinearModel) -> Result<()> {
        let added = self.slot_usage.add_unit_capacity_constraints(model, 1)?;
        log::debug!("Added {} unit capacity constraints", added);
        Ok(())
    }

    fn request_from_constraint_name<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(FLOW_CONSTRAINT_PREFIX).and_then(|rest| rest.split('|').next())
    }

    fn extract_slots(&self, _model: &LinearModel, assignment: &[bool]) -> Result<HashMap<RequestName, Vec<Arc<Slot>>>> {
        let mut allocations: HashMap<RequestName, Vec<Arc<Slot>>> = HashMap::new();

        for (var, chosen) in assignment.iter().enumerate() {
            if !*chosen {
                continue;
            }
            let Some((request, slot)) = self.arcs.get(&var) else {
                return Err(Error::InternalConsistency(format!("Chosen variable {} is not an arc", var)));
            };
            let Some(slot) = slot else {
                continue;
            };

            let slots = allocations.entry(request.clone()).or_default();
            if !slots.iter().any(|s| s.name == slot.name) {
                slots.push(slot.clone());
            }
        }

        Ok(allocations)
    }
}
