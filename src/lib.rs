#![forbid(unsafe_code)]

pub mod chapters;
pub mod cli;
pub mod compose;
pub mod formats;
pub mod logging;
pub mod persist;
pub mod reconcile;
pub mod save;
pub mod strategy;
pub mod workbook;
