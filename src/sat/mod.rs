#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
pub mod adjacency;
pub mod assignment;
pub mod clause;
pub mod cnf;
pub mod dimacs;
pub mod formula;
pub mod heuristic;
pub mod literal;
pub mod solver;
pub mod watched;
