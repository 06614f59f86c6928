pub mod catalog;
pub mod challenge;
pub mod plan;
pub mod team;
