//! Concrete resource types

mod client;
mod group;

pub use client::Client;
pub use group::{Group, Member};
