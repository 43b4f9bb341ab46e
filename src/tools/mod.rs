//! NutriClinic Tools module
//!
//! MCP tool implementations. Each function opens its own connection and
//! reports failures as plain strings for the server layer to wrap.

pub mod calculator;
pub mod consultations;
pub mod food_exchanges;
pub mod meal_plans;
pub mod menus;
pub mod nutritionists;
pub mod patients;
pub mod preferences;
pub mod snacks;
pub mod status;
