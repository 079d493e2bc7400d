pub mod candidate_search;
pub mod solution_candidate;
