pub mod boletin;
pub mod core;
pub mod discipline;
pub mod grades;
pub mod previas;
pub mod roster;
pub mod setup;
pub mod transfer;
