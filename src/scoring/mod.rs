pub mod engine;
pub mod pending;
pub mod types;
pub mod validity;
pub mod window;
