mod common;
mod heuristics;
mod service;
