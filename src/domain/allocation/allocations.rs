use std::collections::HashMap;

use crate::domain::search::solution_candidate::SolutionCandidate;
use crate::domain::utils::id::RequestName;

/// The outcome of an allocation run: one train path per allocated request.
#[derive(Debug, Clone, Default)]
pub struct TrainPathAllocations {
    allocations: HashMap<RequestName, SolutionCandidate>,

    /// Every request of the problem, in problem order.
    requests: Vec<RequestName>,

    /// Requests left out because no path exists for them.
    removed: Vec<RequestName>,
}

impl TrainPathAllocations {
    pub fn new(allocations: HashMap<RequestName, SolutionCandidate>, requests: Vec<RequestName>, removed: Vec<RequestName>) -> Self {
        Self { allocations, requests, removed }
    }

    pub fn allocation(&self, request: &RequestName) -> Option<&SolutionCandidate> {
        self.allocations.get(request)
    }

    pub fn allocations(&self) -> &HashMap<RequestName, SolutionCandidate> {
        &self.allocations
    }

    pub fn requests(&self) -> &[RequestName] {
        &self.requests
    }

    pub fn allocated_requests(&self) -> Vec<&RequestName> {
        self.requests.iter().filter(|r| self.allocations.contains_key(*r)).collect()
    }

    pub fn unallocated_requests(&self) -> Vec<&RequestName> {
        self.requests.iter().filter(|r| !self.allocations.contains_key(*r)).collect()
    }

    pub fn removed_requests(&self) -> &[RequestName] {
        &self.removed
    }

    pub fn nb_allocated(&self) -> usize {
        self.allocations.len()
    }

    /// Sum of the weights of all allocated candidates, in milliseconds.
    pub fn total_weight(&self) -> i64 {
        self.allocations.values().map(|c| c.weight()).sum()
    }

    pub fn log_info(&self) {
        log::info!("Allocated {} of {} requests, total weight {} ms", self.nb_allocated(), self.requests.len(), self.total_weight());
        for request in &self.requests {
            match self.allocations.get(request) {
                Some(candidate) => log::debug!("{}", candidate.describe_full_path()),
                None => log::info!("Request {} not allocated", request),
            }
        }
    }
}
