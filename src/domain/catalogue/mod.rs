pub mod slot;
pub mod slot_catalogue;
