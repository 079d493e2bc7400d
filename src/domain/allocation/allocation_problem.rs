use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;

use crate::domain::allocation::allocations::TrainPathAllocations;
use crate::domain::allocation::formulation::{Formulation, slot_from_constraint_name};
use crate::domain::allocation::linear_model::{LinearModel, Solver, SolverOutcome};
use crate::domain::application::application::Application;
use crate::domain::application::simple_application::SimpleApplication;
use crate::domain::catalogue::slot::Slot;
use crate::domain::catalogue::slot_catalogue::SlotCatalogue;
use crate::domain::dag::feasibility_dag::FeasibilityDag;
use crate::domain::search::candidate_search::find_feasible_dag;
use crate::domain::search::solution_candidate::SolutionCandidate;
use crate::domain::topology::topology::Topology;
use crate::domain::utils::id::{RequestName, SlotName};
use crate::error::{Error, Result};

/// Milliseconds `slot` departs before the requested window of `request`.
pub fn earliness(request: &SimpleApplication, slot: &Slot) -> i64 {
    slot.start.distance_before_interval(&request.start, &request.end).num_milliseconds()
}

/// Milliseconds `slot` arrives after the requested window of `request`.
pub fn lateness(request: &SimpleApplication, slot: &Slot) -> i64 {
    slot.end.distance_after_interval(&request.start, &request.end).num_milliseconds()
}

/// Orders an unordered set of slots into a path by chaining them from the request's origin.
///
/// # Returns
/// `Error::InternalConsistency` if the slots do not form a single chain or the chain is not a
/// valid candidate for `request`.
pub fn solution_candidate_from_slot_set(request: &SimpleApplication, slots: &[Arc<Slot>]) -> Result<SolutionCandidate> {
    let mut remaining: Vec<Arc<Slot>> = slots.to_vec();
    let mut path = Vec::with_capacity(remaining.len());
    let mut next_node = request.from.clone();

    while !remaining.is_empty() {
        let Some(pos) = remaining.iter().position(|slot| slot.from == next_node) else {
            return Err(Error::InternalConsistency(format!("Could not find slot starting at {} for request {}", next_node, request.name)));
        };
        let slot = remaining.remove(pos);
        next_node = slot.to.clone();
        path.push(slot);
    }

    SolutionCandidate::new(path, request)
}

/// A set of requests competing for the slots of one catalogue.
pub struct AllocationProblem<'a> {
    topology: &'a Topology,
    catalogue: &'a SlotCatalogue,
    requests: Vec<SimpleApplication>,
}

impl<'a> AllocationProblem<'a> {
    pub fn new(topology: &'a Topology, catalogue: &'a SlotCatalogue, requests: Vec<SimpleApplication>) -> Self {
        Self { topology, catalogue, requests }
    }

    /// Creates the problem of all week day requests of `applications`.
    pub fn from_applications(topology: &'a Topology, catalogue: &'a SlotCatalogue, applications: Vec<Application>) -> Self {
        let requests = applications.into_iter().flat_map(|application| application.into_children()).collect();
        Self::new(topology, catalogue, requests)
    }

    pub fn requests(&self) -> &[SimpleApplication] {
        &self.requests
    }

    pub fn request(&self, name: &str) -> Option<&SimpleApplication> {
        self.requests.iter().find(|request| request.name.as_str() == name)
    }

    pub fn nb_requests(&self) -> usize {
        self.requests.len()
    }

    /// `[ #r1 [...], ... ]`
    pub fn application_string(&self) -> String {
        let descriptions: Vec<String> = self.requests.iter().map(|request| request.description()).collect();
        format!("[ {} ]", descriptions.join(", "))
    }

    /// Runs the candidate search of every request. Requests are independent and searched in
    /// parallel; the DAGs are returned in request order.
    pub fn find_feasible_dags(&mut self) -> Result<Vec<FeasibilityDag>> {
        let (topology, catalogue) = (self.topology, self.catalogue);
        self.requests.par_iter_mut().map(|request| find_feasible_dag(topology, catalogue, request)).collect()
    }

    /// Builds the model of all feasible requests with `formulation`, optimizes it with `solver`
    /// and extracts one train path per request.
    ///
    /// # Returns
    /// * `Error::InfeasibleApplications` if some request has no path at all, unless
    ///   `ignore_infeasible_apps` is set; those requests are then reported as removed.
    /// * `Error::InfeasibleModel` with the requests and slots of the IIS if the requests cannot
    ///   all be served at once.
    pub fn solve<F: Formulation + ?Sized, S: Solver + ?Sized>(&mut self, formulation: &mut F, solver: &S, ignore_infeasible_apps: bool) -> Result<TrainPathAllocations> {
        let dags = self.find_feasible_dags()?;

        let mut model = LinearModel::new();
        let mut feasible: Vec<RequestName> = Vec::new();
        let mut infeasible: Vec<RequestName> = Vec::new();
        for (request, dag) in self.requests.iter().zip(&dags) {
            if dag.is_target_node_reached() {
                formulation.add_request(&mut model, request, dag)?;
                feasible.push(request.name.clone());
            } else {
                infeasible.push(request.name.clone());
            }
        }

        if !infeasible.is_empty() {
            if !ignore_infeasible_apps {
                return Err(Error::InfeasibleApplications(infeasible.iter().map(|r| r.to_string()).collect()));
            }
            for name in &infeasible {
                log::info!("Request {} is infeasible, continuing without it", name);
            }
        }
        log::info!("Found {} feasible requests out of {}", feasible.len(), self.requests.len());

        formulation.finalize(&mut model)?;
        log::info!("The {} model contains {} constraints and {} variables", formulation.name(), model.nb_constraints(), model.nb_variables());

        let assignment = match solver.optimize(&model)? {
            SolverOutcome::Optimal(assignment) => assignment,
            SolverOutcome::Infeasible(iis) => return Err(self.infeasibility_analysis(&*formulation, &iis)),
        };
        if assignment.len() != model.nb_variables() {
            return Err(Error::InternalConsistency(format!("Solver returned {} values for {} variables", assignment.len(), model.nb_variables())));
        }

        let slots = formulation.extract_slots(&model, &assignment)?;
        let mut allocations: HashMap<RequestName, SolutionCandidate> = HashMap::new();
        for name in &feasible {
            let (Some(request), Some(slots)) = (self.request(name.as_str()), slots.get(name)) else {
                return Err(Error::InternalConsistency(format!("Feasible request {} has not been allocated", name)));
            };
            allocations.insert(name.clone(), solution_candidate_from_slot_set(request, slots)?);
        }

        let requests = self.requests.iter().map(|request| request.name.clone()).collect();
        let result = TrainPathAllocations::new(allocations, requests, infeasible);
        result.log_info();
        Ok(result)
    }

    /// Maps the IIS constraints back to the slots and requests they are about.
    fn infeasibility_analysis<F: Formulation + ?Sized>(&self, formulation: &F, iis: &[String]) -> Error {
        log::warn!("The model is infeasible, {} constraints cannot be satisfied", iis.len());
        let mut requests: Vec<String> = Vec::new();
        let mut slots: Vec<String> = Vec::new();

        for name in iis {
            let slot = slot_from_constraint_name(name).filter(|slot| self.catalogue.get_slot(&SlotName::new(*slot)).is_some());
            let request = formulation.request_from_constraint_name(name).filter(|request| self.request(request).is_some());

            if slot.is_none() && request.is_none() {
                return Error::InternalConsistency(format!("IIS analysis: could find neither slot nor request for constraint {}", name));
            }
            if let Some(slot) = slot {
                if !slots.iter().any(|s| s == slot) {
                    log::warn!(" IIS slot {}", slot);
                    slots.push(slot.to_string());
                }
            }
            if let Some(request) = request {
                if !requests.iter().any(|r| r == request) {
                    log::warn!(" IIS request {}", request);
                    requests.push(request.to_string());
                }
            }
        }

        Error::InfeasibleModel { applications: requests, slots }
    }
}
