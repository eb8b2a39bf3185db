mod app;
mod config;
mod effects;
mod picker;
mod render;

pub use app::{run, RunOutcome};
