pub mod app;
pub mod constants;
pub mod engine;
pub mod geometry;
pub mod protocol;
pub mod rng;
pub mod save;
pub mod save_store;
pub mod session;
pub mod types;
pub mod world;
