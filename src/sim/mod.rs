pub mod account;
pub mod engine;
pub mod strategy;

pub use account::*;
pub use engine::*;
pub use strategy::*;
