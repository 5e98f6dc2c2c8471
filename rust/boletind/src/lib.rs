pub mod calc;
pub mod config;
pub mod db;
pub mod discipline;
pub mod error;
pub mod grades;
pub mod ipc;
pub mod model;
pub mod previas;
pub mod roster;
pub mod store;
pub mod transfer;

#[cfg(test)]
mod testutil;
