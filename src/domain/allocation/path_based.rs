use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::domain::allocation::formulation::{Formulation, SlotUsage};
use crate::domain::allocation::linear_model::{LinearModel, Sense};
use crate::domain::application::simple_application::SimpleApplication;
use crate::domain::catalogue::slot::Slot;
use crate::domain::dag::feasibility_dag::FeasibilityDag;
use crate::domain::search::candidate_search::enumerate_all;
use crate::domain::search::solution_candidate::{SolutionCandidate, application_name_from_candidate_name};
use crate::domain::utils::id::RequestName;
use crate::error::{Error, Result};

/// One binary variable per enumerated solution candidate.
///
/// Each request gets a choice constraint named by the request (`= 1`), each slot shared by more
/// than one candidate a unit capacity constraint (`<= 1`).
#[derive(Debug, Default)]
pub struct PathBasedFormulation {
    candidates: HashMap<String, SolutionCandidate>,
    requests: HashSet<String>,
    slot_usage: SlotUsage,
}

impl PathBasedFormulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nb_candidates(&self) -> usize {
        self.candidates.len()
    }
}

impl Formulation for PathBasedFormulation {
    fn name(&self) -> &str {
        "path-based"
    }

    fn add_request(&mut self, model: &mut LinearModel, request: &SimpleApplication, dag: &FeasibilityDag) -> Result<()> {
        let candidates = enumerate_all(dag)?;
        log::debug!("Adding choice constraint for request {} over {} candidates", request.name, candidates.len());

        let mut terms = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if candidate.request() != &request.name {
                return Err(Error::InternalConsistency(format!("Solution candidate {} does not belong to request {}", candidate, request.name)));
            }

            let var = model.add_binary_variable(candidate.name(), candidate.weight() as f64)?;
            terms.push((var, 1.0));
            for slot in candidate.path() {
                self.slot_usage.add(&slot.name, var);
            }
            self.candidates.insert(candidate.name().to_string(), candidate);
        }

        model.add_constraint(request.name.as_str(), terms, Sense::Eq, 1.0)?;
        self.requests.insert(request.name.to_string());
        Ok(())
    }

    fn finalize(&mut self, model: &mut LinearModel) -> Result<()> {
        let added = self.slot_usage.add_unit_capacity_constraints(model, 2)?;
        log::debug!("Added {} unit capacity constraints", added);
        Ok(())
    }

    fn request_from_constraint_name<'a>(&self, name: &'a str) -> Option<&'a str> {
        if let Some(request) = application_name_from_candidate_name(name) {
            return Some(request);
        }
        self.requests.contains(name).then_some(name)
    }

    fn extract_slots(&self, model: &LinearModel, assignment: &[bool]) -> Result<HashMap<RequestName, Vec<Arc<Slot>>>> {
        let mut allocations: HashMap<RequestName, Vec<Arc<Slot>>> = HashMap::new();

        for name in model.chosen_variables(assignment) {
            let Some(candidate) = self.candidates.get(name) else {
                return Err(Error::InternalConsistency(format!("Chosen variable {} is not a solution candidate", name)));
            };
            log::debug!(" ==> {}", name);
            if allocations.insert(candidate.request().clone(), candidate.path().to_vec()).is_some() {
                return Err(Error::InternalConsistency(format!("Found two allocations for request {}", candidate.request())));
            }
        }

        Ok(allocations)
    }
}
