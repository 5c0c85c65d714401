//! API route handlers

pub mod health;
pub mod traces;
pub mod views;
