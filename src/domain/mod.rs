pub mod allocation;
pub mod application;
pub mod catalogue;
pub mod dag;
pub mod scenario;
pub mod search;
pub mod time;
pub mod topology;
pub mod utils;
