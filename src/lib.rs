//! NutriClinic Library
//!
//! Clinical nutrition records, calculations and the MCP server exposing them.

pub mod build_info;
pub mod calculations;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod tools;
