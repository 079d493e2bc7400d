pub mod application;
pub mod pruning_parameters;
pub mod simple_application;
