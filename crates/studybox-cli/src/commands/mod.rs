pub mod chat;
pub mod exam;
pub mod generate;
pub mod graph;
pub mod models;
pub mod reset;
