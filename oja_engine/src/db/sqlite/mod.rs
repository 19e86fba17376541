//! SQLite database module for the oja engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
