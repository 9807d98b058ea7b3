#![warn(clippy::all, clippy::pedantic)]

pub mod common;
pub mod instruction;
pub mod loader;
pub mod pipeline;
pub mod register;
pub mod system;
