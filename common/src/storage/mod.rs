pub mod db;
pub mod document;
pub mod types;
