//! Converts midicsv tick timing into wall-clock seconds.
//!
//! Rows of midicsv text are timed on one tempo timeline shared by every
//! track. Each row keeps its original text and gets its absolute time in
//! seconds appended.
pub mod config;
pub mod midicsv;
