use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;

use crate::domain::catalogue::slot::Slot;
use crate::domain::dag::feasibility_dag::{FeasibilityDag, VertexId};
use crate::domain::search::solution_candidate::SolutionCandidate;
use crate::error::{Error, Result};

/// The outcome of one (possibly sampled) enumeration of a feasibility DAG.
#[derive(Debug, Clone, Default)]
pub struct EnumerationResult {
    /// Distinct candidates in discovery order.
    pub candidates: Vec<SolutionCandidate>,

    /// Edges not followed because the random draw exceeded the sample ratio.
    pub unsampled_edges: HashSet<(String, String)>,

    /// Edges not followed because the candidate cap was exceeded.
    pub excess_edges: HashSet<(String, String)>,

    names: HashSet<String>,
}

impl EnumerationResult {
    pub fn everything_enumerated(&self) -> bool {
        self.unsampled_edges.is_empty() && self.excess_edges.is_empty()
    }

    fn add_candidate(&mut self, candidate: SolutionCandidate) {
        if self.names.insert(candidate.name().to_string()) {
            self.candidates.push(candidate);
        }
    }
}

impl FeasibilityDag {
    /// Depth-first enumeration of the slot paths from start to end, following each edge with
    /// probability `sample_ratio`.
    pub fn enumerate(&self, sample_ratio: f64) -> Result<EnumerationResult> {
        let mut rng = rand::rng();
        self.enumerate_with_rng(sample_ratio, &mut rng)
    }

    /// Like [`FeasibilityDag::enumerate`], drawing from `rng`.
    pub fn enumerate_with_rng<R: Rng + ?Sized>(&self, sample_ratio: f64, rng: &mut R) -> Result<EnumerationResult> {
        let mut result = EnumerationResult::default();
        let mut path: Vec<Arc<Slot>> = Vec::new();
        self.enumerate_from(self.start(), &mut path, sample_ratio, rng, &mut result)?;
        Ok(result)
    }

    fn enumerate_from<R: Rng + ?Sized>(&self, parent: VertexId, path: &mut Vec<Arc<Slot>>, sample_ratio: f64, rng: &mut R, result: &mut EnumerationResult) -> Result<()> {
        let Some(parent_vertex) = self.vertex(parent) else {
            return Ok(());
        };
        let max_candidates = self.request().params().max_train_paths_per_request();

        for child in parent_vertex.children() {
            if *child == self.end() {
                result.add_candidate(SolutionCandidate::new(path.clone(), self.request())?);
                continue;
            }

            let Some(child_vertex) = self.vertex(*child) else {
                continue;
            };
            let edge = (parent_vertex.label.clone(), child_vertex.label.clone());

            if result.candidates.len() > max_candidates {
                result.excess_edges.insert(edge);
            } else if rng.random::<f64>() > sample_ratio {
                result.unsampled_edges.insert(edge);
            } else {
                let Some(slot) = child_vertex.slot.clone() else {
                    return Err(Error::InternalConsistency(format!("Vertex {} on a path of request {} has no slot", child_vertex.label, self.request().name)));
                };
                path.push(slot);
                self.enumerate_from(*child, path, sample_ratio, rng, result)?;
                path.pop();
            }
        }

        Ok(())
    }
}
