//! NutriClinic MCP Server Implementation
//!
//! Implements the MCP server with all NutriClinic tools.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::calculations::{ActivityLevel, Gender, PatientType};
use crate::db::Database;
use crate::models::{
    Anthropometrics, BudgetLevel, ConsultationCreate, ConsultationUpdate, CookingTime, DietType,
    ExchangeCategory, FoodExchangeCreate, FoodExchangeUpdate, Macros, MealPlanCreate,
    MealPlanItemCreate, MenuCategory, MenuCreate, MenuUpdate, Micronutrients, NutritionistCreate,
    NutritionistUpdate, PatientCreate, PatientUpdate, PreferencesCreate, PreferencesUpdate,
    Role, SnackCreate, SnackFilter, SnackFlags, SnackUpdate, SubscriptionPlan,
};
use crate::tools::status::StatusTracker;
use crate::tools::{
    calculator, consultations, food_exchanges, meal_plans, menus, nutritionists, patients,
    preferences, snacks,
};

/// NutriClinic MCP Service
#[derive(Clone)]
pub struct NutriClinicService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<NutriClinicService>,
}

impl NutriClinicService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

/// Current UTC time, the clock every dated operation runs against
fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn optional_json<T: Serialize>(value: Option<T>, what: &str, id: i64) -> Result<CallToolResult, McpError> {
    match value {
        Some(v) => to_json(&v),
        None => Ok(CallToolResult::success(vec![Content::text(format!(
            r#"{{"error": "{} not found", "id": {}}}"#,
            what, id
        ))])),
    }
}

fn tool_error(e: String) -> McpError {
    McpError::internal_error(e, None)
}

fn default_list_limit() -> i64 { 50 }
fn default_search_limit() -> i64 { 20 }
fn default_portion() -> String { "1 portion".to_string() }
fn default_activity() -> String { "moderate".to_string() }
fn default_patient_type() -> String { "healthy".to_string() }

// ============================================================================
// Nutritionist Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RegisterNutritionistParams {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// "nutritionist" (default) or "admin"
    pub role: Option<String>,
    pub license_number: Option<String>,
    pub specialization: Option<String>,
    pub clinic_name: Option<String>,
    pub clinic_address: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct NutritionistIdParams {
    pub nutritionist_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateNutritionistParams {
    pub nutritionist_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub specialization: Option<String>,
    pub clinic_name: Option<String>,
    pub clinic_address: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpgradeSubscriptionParams {
    pub nutritionist_id: i64,
    /// basic, professional or enterprise
    pub plan: String,
}

// ============================================================================
// Patient Parameter Structs
// ============================================================================

/// Optional body measurements: circumferences in cm, skinfolds in mm
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct AnthropometricsParams {
    pub body_fat_percentage: Option<f64>,
    pub muscle_mass: Option<f64>,
    pub waist_circumference: Option<f64>,
    pub hip_circumference: Option<f64>,
    pub arm_circumference: Option<f64>,
    pub thigh_circumference: Option<f64>,
    pub calf_circumference: Option<f64>,
    pub triceps_skinfold: Option<f64>,
    pub biceps_skinfold: Option<f64>,
    pub subscapular_skinfold: Option<f64>,
    pub suprailiac_skinfold: Option<f64>,
    pub abdominal_skinfold: Option<f64>,
}

impl From<AnthropometricsParams> for Anthropometrics {
    fn from(p: AnthropometricsParams) -> Self {
        Self {
            body_fat_percentage: p.body_fat_percentage,
            muscle_mass: p.muscle_mass,
            waist_circumference: p.waist_circumference,
            hip_circumference: p.hip_circumference,
            arm_circumference: p.arm_circumference,
            thigh_circumference: p.thigh_circumference,
            calf_circumference: p.calf_circumference,
            triceps_skinfold: p.triceps_skinfold,
            biceps_skinfold: p.biceps_skinfold,
            subscapular_skinfold: p.subscapular_skinfold,
            suprailiac_skinfold: p.suprailiac_skinfold,
            abdominal_skinfold: p.abdominal_skinfold,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreatePatientParams {
    pub nutritionist_id: i64,
    pub first_name: String,
    pub last_name: String,
    /// National ID or record number, unique per nutritionist
    pub identification: String,
    /// YYYY-MM-DD
    pub birth_date: String,
    /// male, female or other
    pub gender: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Weight in kg
    pub weight: f64,
    /// Height in cm
    pub height: f64,
    #[serde(flatten)]
    pub anthropometrics: AnthropometricsParams,
    pub medical_history: Option<String>,
    pub nutritional_history: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    /// healthy, hospitalized, icu, athlete, adolescent, elderly, pregnant
    pub patient_type: Option<String>,
    /// sedentary, light, moderate, active, very_active
    pub activity_level: Option<String>,
    /// omnivore, vegetarian, vegan, other
    pub diet_type: Option<String>,
    #[serde(default)]
    pub has_diabetes: bool,
    #[serde(default)]
    pub has_hypertension: bool,
    #[serde(default)]
    pub has_bloating: bool,
    pub other_conditions: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListPatientsParams {
    pub nutritionist_id: i64,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchPatientsParams {
    pub nutritionist_id: i64,
    /// Substring of the name or identification
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PatientRefParams {
    pub nutritionist_id: i64,
    pub patient_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdatePatientParams {
    pub nutritionist_id: i64,
    pub patient_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub identification: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    #[serde(flatten)]
    pub anthropometrics: AnthropometricsParams,
    pub medical_history: Option<String>,
    pub nutritional_history: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub patient_type: Option<String>,
    pub activity_level: Option<String>,
    pub diet_type: Option<String>,
    pub has_diabetes: Option<bool>,
    pub has_hypertension: Option<bool>,
    pub has_bloating: Option<bool>,
    pub other_conditions: Option<String>,
}

// ============================================================================
// Consultation Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateConsultationParams {
    pub nutritionist_id: i64,
    pub patient_id: i64,
    /// YYYY-MM-DD[ HH:MM[:SS]]; defaults to now
    pub consultation_date: Option<String>,
    /// Weight in kg
    pub weight: f64,
    /// Height in cm
    pub height: f64,
    #[serde(flatten)]
    pub anthropometrics: AnthropometricsParams,
    /// Set when the patient reports a new activity level
    #[serde(default)]
    pub activity_level_changed: bool,
    pub new_activity_level: Option<String>,
    pub notes: Option<String>,
    pub recommendations: Option<String>,
    pub diet_plan: Option<String>,
    pub clinical_observations: Option<String>,
    pub follow_up_notes: Option<String>,
    /// YYYY-MM-DD[ HH:MM[:SS]]
    pub next_appointment: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListConsultationsParams {
    pub nutritionist_id: i64,
    pub patient_id: i64,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ConsultationRefParams {
    pub nutritionist_id: i64,
    pub consultation_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateConsultationParams {
    pub nutritionist_id: i64,
    pub consultation_id: i64,
    pub consultation_date: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    #[serde(flatten)]
    pub anthropometrics: AnthropometricsParams,
    pub notes: Option<String>,
    pub recommendations: Option<String>,
    pub diet_plan: Option<String>,
    pub clinical_observations: Option<String>,
    pub follow_up_notes: Option<String>,
    pub next_appointment: Option<String>,
}

// ============================================================================
// Meal Plan Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MealPlanItemParams {
    /// e.g. breakfast, lunch, afternoon snack
    pub meal_time: String,
    pub food_item: String,
    #[serde(default = "default_portion")]
    pub portion: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub proteins: f64,
    #[serde(default)]
    pub carbohydrates: f64,
    #[serde(default)]
    pub fats: f64,
}

impl From<MealPlanItemParams> for MealPlanItemCreate {
    fn from(p: MealPlanItemParams) -> Self {
        Self {
            meal_time: p.meal_time,
            food_item: p.food_item,
            portion: p.portion,
            macros: Macros {
                calories: p.calories,
                proteins: p.proteins,
                carbohydrates: p.carbohydrates,
                fats: p.fats,
            },
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateMealPlanParams {
    pub nutritionist_id: i64,
    pub patient_id: i64,
    /// YYYY-MM-DD; defaults to today
    pub date_created: Option<String>,
    pub name: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<MealPlanItemParams>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MealPlanRefParams {
    pub nutritionist_id: i64,
    pub meal_plan_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReplaceMealPlanParams {
    pub nutritionist_id: i64,
    pub meal_plan_id: i64,
    pub date_created: Option<String>,
    pub name: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<MealPlanItemParams>,
}

// ============================================================================
// Catalog Parameter Structs (menus, food exchanges, snacks)
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CategoryFilterParams {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateMenuParams {
    pub name: String,
    /// healthy, diabetes, hypertension, bloating, vegetarian, vegan, athlete, other
    pub category: Option<String>,
    pub description: Option<String>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    pub fiber: Option<f64>,
    pub breakfast: Option<String>,
    pub mid_morning_snack: Option<String>,
    pub lunch: Option<String>,
    pub afternoon_snack: Option<String>,
    pub dinner: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
    pub supplements: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMenuParams {
    pub id: i64,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    pub fiber: Option<f64>,
    pub breakfast: Option<String>,
    pub mid_morning_snack: Option<String>,
    pub lunch: Option<String>,
    pub afternoon_snack: Option<String>,
    pub dinner: Option<String>,
    pub is_custom: Option<bool>,
    pub supplements: Option<String>,
}

/// Micronutrients per portion: vitamin A in mcg, the rest in mg
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct MicronutrientParams {
    pub calcium: Option<f64>,
    pub iron: Option<f64>,
    pub sodium: Option<f64>,
    pub potassium: Option<f64>,
    pub vitamin_a: Option<f64>,
    pub vitamin_c: Option<f64>,
}

impl From<MicronutrientParams> for Micronutrients {
    fn from(p: MicronutrientParams) -> Self {
        Self {
            calcium: p.calcium,
            iron: p.iron,
            sodium: p.sodium,
            potassium: p.potassium,
            vitamin_a: p.vitamin_a,
            vitamin_c: p.vitamin_c,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateFoodExchangeParams {
    pub name: String,
    /// cereals, legumes, vegetables, fruits, meat, dairy, fats, sugars
    pub category: String,
    /// Household measure, e.g. "1 cup"
    pub portion_size: String,
    /// Portion weight in grams
    pub portion_weight: f64,
    pub calories: f64,
    pub proteins: f64,
    pub carbohydrates: f64,
    pub fats: f64,
    pub fiber: Option<f64>,
    #[serde(flatten)]
    pub micronutrients: MicronutrientParams,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateFoodExchangeParams {
    pub id: i64,
    pub name: Option<String>,
    pub category: Option<String>,
    pub portion_size: Option<String>,
    pub portion_weight: Option<f64>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    pub fiber: Option<f64>,
    #[serde(flatten)]
    pub micronutrients: MicronutrientParams,
    pub notes: Option<String>,
    pub is_custom: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateSnackParams {
    pub name: String,
    /// sweet, salty, protein, fruit, vegetable, mixed
    pub category: Option<String>,
    pub description: Option<String>,
    pub recipe: Option<String>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    #[serde(default)]
    pub is_vegetarian: bool,
    #[serde(default)]
    pub is_vegan: bool,
    #[serde(default)]
    pub is_diabetic_friendly: bool,
    #[serde(default)]
    pub is_low_sodium: bool,
    #[serde(default)]
    pub is_custom: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListSnacksParams {
    pub category: Option<String>,
    pub vegetarian: Option<bool>,
    pub vegan: Option<bool>,
    pub diabetic_friendly: Option<bool>,
    pub low_sodium: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateSnackParams {
    pub id: i64,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub recipe: Option<String>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    pub is_vegetarian: Option<bool>,
    pub is_vegan: Option<bool>,
    pub is_diabetic_friendly: Option<bool>,
    pub is_low_sodium: Option<bool>,
    pub is_custom: Option<bool>,
}

// ============================================================================
// Preference Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PreferencesParams {
    pub nutritionist_id: i64,
    pub patient_id: i64,
    pub favorite_foods: Option<String>,
    pub disliked_foods: Option<String>,
    pub allergies: Option<String>,
    /// Comma-separated, e.g. "boiled, baked"
    pub cooking_methods: Option<String>,
    pub cultural_restrictions: Option<String>,
    /// low, medium, high
    pub budget_level: Option<String>,
    /// little (<15 min), medium, plenty (>30 min)
    pub cooking_time_available: Option<String>,
    /// Taste scores from 1 to 5
    pub sweet_preference: Option<i32>,
    pub salty_preference: Option<i32>,
    pub spicy_preference: Option<i32>,
    pub sour_preference: Option<i32>,
    pub bitter_preference: Option<i32>,
    pub prefers_soft_textures: Option<bool>,
    pub prefers_crunchy_textures: Option<bool>,
    /// HH:MM
    pub breakfast_time: Option<String>,
    pub lunch_time: Option<String>,
    pub dinner_time: Option<String>,
    pub snacks_per_day: Option<i32>,
    pub notes: Option<String>,
}

impl PreferencesParams {
    fn into_create(self) -> PreferencesCreate {
        let defaults = PreferencesCreate::default();
        PreferencesCreate {
            favorite_foods: self.favorite_foods,
            disliked_foods: self.disliked_foods,
            allergies: self.allergies,
            cooking_methods: self.cooking_methods,
            cultural_restrictions: self.cultural_restrictions,
            budget_level: self
                .budget_level
                .as_deref()
                .map(BudgetLevel::from_str)
                .unwrap_or(defaults.budget_level),
            cooking_time_available: self
                .cooking_time_available
                .as_deref()
                .map(CookingTime::from_str)
                .unwrap_or(defaults.cooking_time_available),
            sweet_preference: self.sweet_preference.unwrap_or(defaults.sweet_preference),
            salty_preference: self.salty_preference.unwrap_or(defaults.salty_preference),
            spicy_preference: self.spicy_preference.unwrap_or(defaults.spicy_preference),
            sour_preference: self.sour_preference.unwrap_or(defaults.sour_preference),
            bitter_preference: self.bitter_preference.unwrap_or(defaults.bitter_preference),
            prefers_soft_textures: self.prefers_soft_textures.unwrap_or(defaults.prefers_soft_textures),
            prefers_crunchy_textures: self.prefers_crunchy_textures.unwrap_or(defaults.prefers_crunchy_textures),
            breakfast_time: self.breakfast_time,
            lunch_time: self.lunch_time,
            dinner_time: self.dinner_time,
            snacks_per_day: self.snacks_per_day.unwrap_or(defaults.snacks_per_day),
            notes: self.notes,
        }
    }

    fn into_update(self) -> PreferencesUpdate {
        PreferencesUpdate {
            favorite_foods: self.favorite_foods,
            disliked_foods: self.disliked_foods,
            allergies: self.allergies,
            cooking_methods: self.cooking_methods,
            cultural_restrictions: self.cultural_restrictions,
            budget_level: self.budget_level.as_deref().map(BudgetLevel::from_str),
            cooking_time_available: self.cooking_time_available.as_deref().map(CookingTime::from_str),
            sweet_preference: self.sweet_preference,
            salty_preference: self.salty_preference,
            spicy_preference: self.spicy_preference,
            sour_preference: self.sour_preference,
            bitter_preference: self.bitter_preference,
            prefers_soft_textures: self.prefers_soft_textures,
            prefers_crunchy_textures: self.prefers_crunchy_textures,
            breakfast_time: self.breakfast_time,
            lunch_time: self.lunch_time,
            dinner_time: self.dinner_time,
            snacks_per_day: self.snacks_per_day,
            notes: self.notes,
        }
    }
}

// ============================================================================
// Calculator Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BmiParams {
    pub weight_kg: f64,
    pub height_cm: f64,
    /// Needed for the BMI category
    pub age: Option<i32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IdealWeightParams {
    pub height_cm: f64,
    pub gender: String,
    /// When given, the adjusted weight is returned too
    pub current_weight_kg: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TmbParams {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: i32,
    pub gender: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CaloricRequirementParams {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: i32,
    pub gender: String,
    #[serde(default = "default_activity")]
    pub activity_level: String,
    #[serde(default = "default_patient_type")]
    pub patient_type: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AgeParams {
    /// YYYY-MM-DD
    pub birth_date: String,
    /// YYYY-MM-DD; defaults to today
    pub reference_date: Option<String>,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl NutriClinicService {
    // --- Status ---

    #[tool(description = "Get the current status of the NutriClinic service including build info, database status, and process information")]
    async fn nutriclinic_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get the clinical workflow guide. Call this when starting a session or when unsure how to use the NutriClinic tools.")]
    fn clinic_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::CLINIC_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(CLINIC_INSTRUCTIONS)]))
    }

    // --- Nutritionists ---

    #[tool(description = "Register a nutritionist account. New accounts start a 30-day trial limited to 3 patients.")]
    fn register_nutritionist(&self, Parameters(p): Parameters<RegisterNutritionistParams>) -> Result<CallToolResult, McpError> {
        let data = NutritionistCreate {
            email: p.email, first_name: p.first_name, last_name: p.last_name, phone: p.phone,
            role: p.role.as_deref().map(Role::from_str).unwrap_or_default(),
            license_number: p.license_number, specialization: p.specialization,
            clinic_name: p.clinic_name, clinic_address: p.clinic_address, bio: p.bio,
        };
        let result = nutritionists::register_nutritionist(&self.database, data, now()).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Get a nutritionist's profile and subscription fields")]
    fn get_nutritionist(&self, Parameters(p): Parameters<NutritionistIdParams>) -> Result<CallToolResult, McpError> {
        let result = nutritionists::get_nutritionist(&self.database, p.nutritionist_id).map_err(tool_error)?;
        optional_json(result, "Nutritionist", p.nutritionist_id)
    }

    #[tool(description = "Update a nutritionist's profile. Only provided fields change.")]
    fn update_nutritionist(&self, Parameters(p): Parameters<UpdateNutritionistParams>) -> Result<CallToolResult, McpError> {
        let data = NutritionistUpdate {
            first_name: p.first_name, last_name: p.last_name, phone: p.phone,
            license_number: p.license_number, specialization: p.specialization,
            clinic_name: p.clinic_name, clinic_address: p.clinic_address, bio: p.bio,
        };
        let result = nutritionists::update_nutritionist(&self.database, p.nutritionist_id, data).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Check whether a nutritionist's trial or subscription is active, with patient count and plan limit")]
    fn subscription_status(&self, Parameters(p): Parameters<NutritionistIdParams>) -> Result<CallToolResult, McpError> {
        let result = nutritionists::subscription_status(&self.database, p.nutritionist_id, now()).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Upgrade to a paid plan for 30 days: basic (50 patients), professional (200) or enterprise (unlimited)")]
    fn upgrade_subscription(&self, Parameters(p): Parameters<UpgradeSubscriptionParams>) -> Result<CallToolResult, McpError> {
        let plan = SubscriptionPlan::from_str(&p.plan)
            .ok_or_else(|| McpError::invalid_params(format!("Unknown plan: '{}'", p.plan), None))?;
        let result = nutritionists::upgrade_subscription(&self.database, p.nutritionist_id, plan, now()).map_err(tool_error)?;
        to_json(&result)
    }

    // --- Patients ---

    #[tool(description = "Create a patient. Requires an active subscription and a free slot under the plan's patient limit.")]
    fn create_patient(&self, Parameters(p): Parameters<CreatePatientParams>) -> Result<CallToolResult, McpError> {
        let data = PatientCreate {
            first_name: p.first_name, last_name: p.last_name, identification: p.identification,
            birth_date: p.birth_date, gender: Gender::from_str(&p.gender),
            email: p.email, phone: p.phone, address: p.address,
            weight: p.weight, height: p.height, anthropometrics: p.anthropometrics.into(),
            medical_history: p.medical_history, nutritional_history: p.nutritional_history,
            allergies: p.allergies, medications: p.medications,
            patient_type: p.patient_type.as_deref().map(PatientType::from_str).unwrap_or_default(),
            activity_level: p.activity_level.as_deref().map(ActivityLevel::from_str).unwrap_or_default(),
            diet_type: p.diet_type.as_deref().map(DietType::from_str).unwrap_or_default(),
            has_diabetes: p.has_diabetes, has_hypertension: p.has_hypertension, has_bloating: p.has_bloating,
            other_conditions: p.other_conditions,
        };
        let result = patients::create_patient(&self.database, p.nutritionist_id, data, now()).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "List a nutritionist's patients with pagination. Requires an active subscription.")]
    fn list_patients(&self, Parameters(p): Parameters<ListPatientsParams>) -> Result<CallToolResult, McpError> {
        let result = patients::list_patients(&self.database, p.nutritionist_id, p.limit, p.offset, now()).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Search a nutritionist's patients by name or identification")]
    fn search_patients(&self, Parameters(p): Parameters<SearchPatientsParams>) -> Result<CallToolResult, McpError> {
        let result = patients::search_patients(&self.database, p.nutritionist_id, &p.query, p.limit, now()).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Get a patient's full record")]
    fn get_patient(&self, Parameters(p): Parameters<PatientRefParams>) -> Result<CallToolResult, McpError> {
        let result = patients::get_patient(&self.database, p.nutritionist_id, p.patient_id).map_err(tool_error)?;
        optional_json(result, "Patient", p.patient_id)
    }

    #[tool(description = "Update a patient. Only provided fields change.")]
    fn update_patient(&self, Parameters(p): Parameters<UpdatePatientParams>) -> Result<CallToolResult, McpError> {
        let data = PatientUpdate {
            first_name: p.first_name, last_name: p.last_name, identification: p.identification,
            birth_date: p.birth_date, gender: p.gender.as_deref().map(Gender::from_str),
            email: p.email, phone: p.phone, address: p.address,
            weight: p.weight, height: p.height, anthropometrics: p.anthropometrics.into(),
            medical_history: p.medical_history, nutritional_history: p.nutritional_history,
            allergies: p.allergies, medications: p.medications,
            patient_type: p.patient_type.as_deref().map(PatientType::from_str),
            activity_level: p.activity_level.as_deref().map(ActivityLevel::from_str),
            diet_type: p.diet_type.as_deref().map(DietType::from_str),
            has_diabetes: p.has_diabetes, has_hypertension: p.has_hypertension, has_bloating: p.has_bloating,
            other_conditions: p.other_conditions,
        };
        let result = patients::update_patient(&self.database, p.nutritionist_id, p.patient_id, data).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Delete a patient with their consultations, meal plans and preferences")]
    fn delete_patient(&self, Parameters(p): Parameters<PatientRefParams>) -> Result<CallToolResult, McpError> {
        let result = patients::delete_patient(&self.database, p.nutritionist_id, p.patient_id).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Compute a patient's age, BMI and category, ideal and adjusted weight, basal metabolic rate and caloric requirement with macro split")]
    fn patient_calculations(&self, Parameters(p): Parameters<PatientRefParams>) -> Result<CallToolResult, McpError> {
        let result = patients::patient_calculations(&self.database, p.nutritionist_id, p.patient_id, now()).map_err(tool_error)?;
        to_json(&result)
    }

    // --- Consultations ---

    #[tool(description = "Record a follow-up consultation. BMI, weight change, healthy and adjusted weight and caloric requirement are computed. A reported activity change also updates the patient.")]
    fn create_consultation(&self, Parameters(p): Parameters<CreateConsultationParams>) -> Result<CallToolResult, McpError> {
        let data = ConsultationCreate {
            consultation_date: p.consultation_date, weight: p.weight, height: p.height,
            anthropometrics: p.anthropometrics.into(),
            activity_level_changed: p.activity_level_changed,
            new_activity_level: p.new_activity_level.as_deref().map(ActivityLevel::from_str),
            notes: p.notes, recommendations: p.recommendations, diet_plan: p.diet_plan,
            clinical_observations: p.clinical_observations, follow_up_notes: p.follow_up_notes,
            next_appointment: p.next_appointment,
        };
        let result = consultations::create_consultation(&self.database, p.nutritionist_id, p.patient_id, data, now())
            .map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "List a patient's consultations, newest first")]
    fn list_consultations(&self, Parameters(p): Parameters<ListConsultationsParams>) -> Result<CallToolResult, McpError> {
        let result = consultations::list_consultations(&self.database, p.nutritionist_id, p.patient_id, p.limit, p.offset)
            .map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Get a consultation with all readings and derived figures")]
    fn get_consultation(&self, Parameters(p): Parameters<ConsultationRefParams>) -> Result<CallToolResult, McpError> {
        let result = consultations::get_consultation(&self.database, p.nutritionist_id, p.consultation_id).map_err(tool_error)?;
        optional_json(result, "Consultation", p.consultation_id)
    }

    #[tool(description = "Update a consultation. Only provided fields change; BMI and derived figures are recomputed when weight or height change.")]
    fn update_consultation(&self, Parameters(p): Parameters<UpdateConsultationParams>) -> Result<CallToolResult, McpError> {
        let data = ConsultationUpdate {
            consultation_date: p.consultation_date, weight: p.weight, height: p.height,
            anthropometrics: p.anthropometrics.into(),
            notes: p.notes, recommendations: p.recommendations, diet_plan: p.diet_plan,
            clinical_observations: p.clinical_observations, follow_up_notes: p.follow_up_notes,
            next_appointment: p.next_appointment,
        };
        let result = consultations::update_consultation(&self.database, p.nutritionist_id, p.consultation_id, data)
            .map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Delete a consultation")]
    fn delete_consultation(&self, Parameters(p): Parameters<ConsultationRefParams>) -> Result<CallToolResult, McpError> {
        let result = consultations::delete_consultation(&self.database, p.nutritionist_id, p.consultation_id).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "List scheduled follow-up appointments from now on, soonest first")]
    fn upcoming_appointments(&self, Parameters(p): Parameters<NutritionistIdParams>) -> Result<CallToolResult, McpError> {
        let result = consultations::upcoming_appointments(&self.database, p.nutritionist_id, now()).map_err(tool_error)?;
        to_json(&result)
    }

    // --- Meal Plans ---

    #[tool(description = "Create a meal plan for a patient. Totals are the sums of the item macros.")]
    fn create_meal_plan(&self, Parameters(p): Parameters<CreateMealPlanParams>) -> Result<CallToolResult, McpError> {
        let data = MealPlanCreate {
            date_created: p.date_created, name: p.name, notes: p.notes,
            items: p.items.into_iter().map(Into::into).collect(),
        };
        let result = meal_plans::create_meal_plan(&self.database, p.nutritionist_id, p.patient_id, data).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "List a patient's meal plans with totals")]
    fn list_meal_plans(&self, Parameters(p): Parameters<PatientRefParams>) -> Result<CallToolResult, McpError> {
        let result = meal_plans::list_meal_plans(&self.database, p.nutritionist_id, p.patient_id).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Get a meal plan with its items")]
    fn get_meal_plan(&self, Parameters(p): Parameters<MealPlanRefParams>) -> Result<CallToolResult, McpError> {
        let result = meal_plans::get_meal_plan(&self.database, p.nutritionist_id, p.meal_plan_id).map_err(tool_error)?;
        optional_json(result, "Meal plan", p.meal_plan_id)
    }

    #[tool(description = "Replace a meal plan's header and its whole item list. Totals are recomputed.")]
    fn replace_meal_plan(&self, Parameters(p): Parameters<ReplaceMealPlanParams>) -> Result<CallToolResult, McpError> {
        let data = MealPlanCreate {
            date_created: p.date_created, name: p.name, notes: p.notes,
            items: p.items.into_iter().map(Into::into).collect(),
        };
        let result = meal_plans::replace_meal_plan(&self.database, p.nutritionist_id, p.meal_plan_id, data).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Delete a meal plan and its items")]
    fn delete_meal_plan(&self, Parameters(p): Parameters<MealPlanRefParams>) -> Result<CallToolResult, McpError> {
        let result = meal_plans::delete_meal_plan(&self.database, p.nutritionist_id, p.meal_plan_id).map_err(tool_error)?;
        to_json(&result)
    }

    // --- Menus ---

    #[tool(description = "Create a full-day menu")]
    fn create_menu(&self, Parameters(p): Parameters<CreateMenuParams>) -> Result<CallToolResult, McpError> {
        let data = MenuCreate {
            name: p.name,
            category: p.category.as_deref().map(MenuCategory::from_str).unwrap_or_default(),
            description: p.description, calories: p.calories, proteins: p.proteins,
            carbohydrates: p.carbohydrates, fats: p.fats, fiber: p.fiber,
            breakfast: p.breakfast, mid_morning_snack: p.mid_morning_snack, lunch: p.lunch,
            afternoon_snack: p.afternoon_snack, dinner: p.dinner,
            is_custom: p.is_custom, supplements: p.supplements,
        };
        let result = menus::create_menu(&self.database, data).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "List menus, optionally for one category")]
    fn list_menus(&self, Parameters(p): Parameters<CategoryFilterParams>) -> Result<CallToolResult, McpError> {
        let result = menus::list_menus(&self.database, p.category).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Get a menu")]
    fn get_menu(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = menus::get_menu(&self.database, p.id).map_err(tool_error)?;
        optional_json(result, "Menu", p.id)
    }

    #[tool(description = "Update a menu. Only provided fields change.")]
    fn update_menu(&self, Parameters(p): Parameters<UpdateMenuParams>) -> Result<CallToolResult, McpError> {
        let data = MenuUpdate {
            name: p.name, category: p.category.as_deref().map(MenuCategory::from_str),
            description: p.description, calories: p.calories, proteins: p.proteins,
            carbohydrates: p.carbohydrates, fats: p.fats, fiber: p.fiber,
            breakfast: p.breakfast, mid_morning_snack: p.mid_morning_snack, lunch: p.lunch,
            afternoon_snack: p.afternoon_snack, dinner: p.dinner,
            is_custom: p.is_custom, supplements: p.supplements,
        };
        let result = menus::update_menu(&self.database, p.id, data).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Delete a menu")]
    fn delete_menu(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = menus::delete_menu(&self.database, p.id).map_err(tool_error)?;
        to_json(&result)
    }

    // --- Food Exchanges ---

    #[tool(description = "Add a food to the exchange table")]
    fn create_food_exchange(&self, Parameters(p): Parameters<CreateFoodExchangeParams>) -> Result<CallToolResult, McpError> {
        let category = ExchangeCategory::from_str(&p.category)
            .ok_or_else(|| McpError::invalid_params(format!("Unknown exchange category: '{}'", p.category), None))?;
        let data = FoodExchangeCreate {
            name: p.name, category, portion_size: p.portion_size, portion_weight: p.portion_weight,
            calories: p.calories, proteins: p.proteins, carbohydrates: p.carbohydrates, fats: p.fats,
            fiber: p.fiber, micronutrients: p.micronutrients.into(), notes: p.notes, is_custom: p.is_custom,
        };
        let result = food_exchanges::create_food_exchange(&self.database, data).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "List the exchange table, optionally for one category")]
    fn list_food_exchanges(&self, Parameters(p): Parameters<CategoryFilterParams>) -> Result<CallToolResult, McpError> {
        let result = food_exchanges::list_food_exchanges(&self.database, p.category).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Get a food exchange")]
    fn get_food_exchange(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = food_exchanges::get_food_exchange(&self.database, p.id).map_err(tool_error)?;
        optional_json(result, "Food exchange", p.id)
    }

    #[tool(description = "Update a food exchange. Only provided fields change.")]
    fn update_food_exchange(&self, Parameters(p): Parameters<UpdateFoodExchangeParams>) -> Result<CallToolResult, McpError> {
        let category = match p.category.as_deref() {
            Some(label) => Some(
                ExchangeCategory::from_str(label)
                    .ok_or_else(|| McpError::invalid_params(format!("Unknown exchange category: '{}'", label), None))?,
            ),
            None => None,
        };
        let data = FoodExchangeUpdate {
            name: p.name, category, portion_size: p.portion_size, portion_weight: p.portion_weight,
            calories: p.calories, proteins: p.proteins, carbohydrates: p.carbohydrates, fats: p.fats,
            fiber: p.fiber, micronutrients: p.micronutrients.into(), notes: p.notes, is_custom: p.is_custom,
        };
        let result = food_exchanges::update_food_exchange(&self.database, p.id, data).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Delete a food exchange")]
    fn delete_food_exchange(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = food_exchanges::delete_food_exchange(&self.database, p.id).map_err(tool_error)?;
        to_json(&result)
    }

    // --- Snacks ---

    #[tool(description = "Create a snack with dietary suitability flags")]
    fn create_snack(&self, Parameters(p): Parameters<CreateSnackParams>) -> Result<CallToolResult, McpError> {
        let category = snacks::parse_snack_category(p.category.as_deref())
            .map_err(|e| McpError::invalid_params(e, None))?;
        let data = SnackCreate {
            name: p.name, category, description: p.description, recipe: p.recipe,
            calories: p.calories, proteins: p.proteins, carbohydrates: p.carbohydrates, fats: p.fats,
            flags: SnackFlags {
                is_vegetarian: p.is_vegetarian,
                is_vegan: p.is_vegan,
                is_diabetic_friendly: p.is_diabetic_friendly,
                is_low_sodium: p.is_low_sodium,
            },
            is_custom: p.is_custom,
        };
        let result = snacks::create_snack(&self.database, data).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "List snacks. Every provided filter must match.")]
    fn list_snacks(&self, Parameters(p): Parameters<ListSnacksParams>) -> Result<CallToolResult, McpError> {
        let filter = SnackFilter {
            category: snacks::parse_snack_category(p.category.as_deref())
                .map_err(|e| McpError::invalid_params(e, None))?,
            vegetarian: p.vegetarian,
            vegan: p.vegan,
            diabetic_friendly: p.diabetic_friendly,
            low_sodium: p.low_sodium,
        };
        let result = snacks::list_snacks(&self.database, filter).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Get a snack")]
    fn get_snack(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = snacks::get_snack(&self.database, p.id).map_err(tool_error)?;
        optional_json(result, "Snack", p.id)
    }

    #[tool(description = "Update a snack. Only provided fields change.")]
    fn update_snack(&self, Parameters(p): Parameters<UpdateSnackParams>) -> Result<CallToolResult, McpError> {
        let category = snacks::parse_snack_category(p.category.as_deref())
            .map_err(|e| McpError::invalid_params(e, None))?;
        let data = SnackUpdate {
            name: p.name, category, description: p.description, recipe: p.recipe,
            calories: p.calories, proteins: p.proteins, carbohydrates: p.carbohydrates, fats: p.fats,
            is_vegetarian: p.is_vegetarian, is_vegan: p.is_vegan,
            is_diabetic_friendly: p.is_diabetic_friendly, is_low_sodium: p.is_low_sodium,
            is_custom: p.is_custom,
        };
        let result = snacks::update_snack(&self.database, p.id, data).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Delete a snack")]
    fn delete_snack(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = snacks::delete_snack(&self.database, p.id).map_err(tool_error)?;
        to_json(&result)
    }

    // --- Preferences ---

    #[tool(description = "Record a patient's food preferences. A patient holds one set; use update_preferences afterwards.")]
    fn create_preferences(&self, Parameters(p): Parameters<PreferencesParams>) -> Result<CallToolResult, McpError> {
        let (nutritionist_id, patient_id) = (p.nutritionist_id, p.patient_id);
        let result = preferences::create_preferences(&self.database, nutritionist_id, patient_id, p.into_create())
            .map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Get a patient's food preferences")]
    fn get_preferences(&self, Parameters(p): Parameters<PatientRefParams>) -> Result<CallToolResult, McpError> {
        let result = preferences::get_preferences(&self.database, p.nutritionist_id, p.patient_id).map_err(tool_error)?;
        optional_json(result, "Preferences", p.patient_id)
    }

    #[tool(description = "Update a patient's food preferences. Only provided fields change.")]
    fn update_preferences(&self, Parameters(p): Parameters<PreferencesParams>) -> Result<CallToolResult, McpError> {
        let (nutritionist_id, patient_id) = (p.nutritionist_id, p.patient_id);
        let result = preferences::update_preferences(&self.database, nutritionist_id, patient_id, p.into_update())
            .map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Delete a patient's food preferences")]
    fn delete_preferences(&self, Parameters(p): Parameters<PatientRefParams>) -> Result<CallToolResult, McpError> {
        let result = preferences::delete_preferences(&self.database, p.nutritionist_id, p.patient_id).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Suggestions from a patient's preferences and conditions: budget, cooking time, sweet/salty tastes, boiled cooking, allergies, diabetes, hypertension")]
    fn patient_recommendations(&self, Parameters(p): Parameters<PatientRefParams>) -> Result<CallToolResult, McpError> {
        let result = preferences::patient_recommendations(&self.database, p.nutritionist_id, p.patient_id).map_err(tool_error)?;
        to_json(&result)
    }

    // --- Calculator ---

    #[tool(description = "Body mass index from weight (kg) and height (cm); give age to get the category")]
    fn calculate_bmi(&self, Parameters(p): Parameters<BmiParams>) -> Result<CallToolResult, McpError> {
        let result = calculator::bmi(p.weight_kg, p.height_cm, p.age).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Ideal body weight (Devine) from height (cm) and gender")]
    fn calculate_ideal_weight(&self, Parameters(p): Parameters<IdealWeightParams>) -> Result<CallToolResult, McpError> {
        let result = calculator::ideal_weight(p.height_cm, &p.gender, None).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Adjusted body weight: ideal weight plus 25% of the excess over it")]
    fn calculate_adjusted_weight(&self, Parameters(p): Parameters<IdealWeightParams>) -> Result<CallToolResult, McpError> {
        let current = p
            .current_weight_kg
            .ok_or_else(|| McpError::invalid_params("current_weight_kg is required".to_string(), None))?;
        let result = calculator::ideal_weight(p.height_cm, &p.gender, Some(current)).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Basal metabolic rate (Harris-Benedict) in kcal/day")]
    fn calculate_tmb(&self, Parameters(p): Parameters<TmbParams>) -> Result<CallToolResult, McpError> {
        let result = calculator::tmb(p.weight_kg, p.height_cm, p.age, &p.gender).map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Daily caloric requirement with protein, carbohydrate and fat split")]
    fn calculate_caloric_requirement(&self, Parameters(p): Parameters<CaloricRequirementParams>) -> Result<CallToolResult, McpError> {
        let result = calculator::caloric_requirement(
            p.weight_kg, p.height_cm, p.age, &p.gender, &p.activity_level, &p.patient_type,
        )
        .map_err(tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Age in whole years at a reference date (default today)")]
    fn calculate_age(&self, Parameters(p): Parameters<AgeParams>) -> Result<CallToolResult, McpError> {
        let result = calculator::age(&p.birth_date, p.reference_date.as_deref(), now().date()).map_err(tool_error)?;
        to_json(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for NutriClinicService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nutriclinic".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("NutriClinic".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "NutriClinic - Clinical nutrition records and calculations. \
                 IMPORTANT: Call clinic_instructions first. Patient-scoped tools take the acting nutritionist_id. \
                 Accounts: register/get/update_nutritionist, subscription_status, upgrade_subscription. \
                 Patients: create/list/search/get/update/delete_patient, patient_calculations. \
                 Consultations: create/list/get/update/delete_consultation, upcoming_appointments. \
                 Meal plans: create/list/get/replace/delete_meal_plan. \
                 Catalogs: create/list/get/update/delete_menu, _food_exchange, _snack. \
                 Preferences: create/get/update/delete_preferences, patient_recommendations. \
                 Calculator: calculate_bmi, calculate_ideal_weight, calculate_adjusted_weight, calculate_tmb, \
                 calculate_caloric_requirement, calculate_age."
                    .into(),
            ),
        }
    }
}
