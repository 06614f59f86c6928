pub mod admin;
pub mod batch;
pub mod participant;

mod helper;
