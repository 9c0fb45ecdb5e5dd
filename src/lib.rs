pub mod config;
pub mod dto;
pub mod error;
pub mod model;
pub mod operators;
pub mod plan;
pub mod runner;
pub mod scorer;
pub mod solvers;

#[cfg(test)]
mod fixtures;
