//! File import and export.

pub mod export;
pub mod recipe_csv;
