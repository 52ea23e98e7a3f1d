pub mod integration;
pub mod repo;
