pub mod admin;
pub mod participant;
