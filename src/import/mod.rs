//! Spreadsheet import path: decoded cell grid → normalized rows →
//! canonical station map → whole-month replacement in the store.

pub mod rows;
pub mod stations;
pub mod writer;
