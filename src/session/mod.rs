#[cfg(not(target_arch = "wasm32"))]
pub mod actor;
pub mod events;
pub mod gate;
