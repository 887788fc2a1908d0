#![allow(non_snake_case)]

// Modules forming the library's public API, used by the `seeder` binary
// via `use StaySeeder::module_name;`.
pub mod config;
pub mod data_model;
pub mod error;
pub mod maintenance;
pub mod orchestrator;
pub mod pipeline;
pub mod rejects;
pub mod store;
