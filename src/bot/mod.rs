pub mod engine;
pub mod ev;
pub mod handicap;
pub mod model;
pub mod stake;

pub use engine::AdvisorEngine;
