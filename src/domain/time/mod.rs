pub mod cyclic_time_frame;
pub mod periodicity;
