pub mod aggregate;
pub mod cli;
pub mod error;
pub mod git;
pub mod logging;
pub mod model;
pub mod platform;
pub mod range;
pub mod render;
pub mod report;
pub mod tool;
