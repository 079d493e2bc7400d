pub mod enumeration;
pub mod feasibility_dag;
pub mod infeasibility;
