pub mod controller;
pub mod scheduler;
pub mod state;
