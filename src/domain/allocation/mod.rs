pub mod allocation_problem;
pub mod allocations;
pub mod arc_node;
pub mod formulation;
pub mod linear_model;
pub mod path_based;
