//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- NUTRITIONISTS
        -- Account holders; own patients, hold a subscription
        -- ============================================
        CREATE TABLE nutritionists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            phone TEXT,
            role TEXT NOT NULL CHECK(role IN ('nutritionist', 'admin')) DEFAULT 'nutritionist',

            subscription_status TEXT NOT NULL
                CHECK(subscription_status IN ('trial', 'active', 'expired', 'cancelled')) DEFAULT 'trial',
            subscription_plan TEXT CHECK(subscription_plan IN ('basic', 'professional', 'enterprise')),
            trial_start_date TEXT,
            trial_end_date TEXT,
            subscription_start_date TEXT,
            subscription_end_date TEXT,

            -- Professional profile
            license_number TEXT,
            specialization TEXT,
            clinic_name TEXT,
            clinic_address TEXT,
            bio TEXT,

            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- PATIENTS
        -- ============================================
        CREATE TABLE patients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nutritionist_id INTEGER NOT NULL REFERENCES nutritionists(id) ON DELETE CASCADE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            identification TEXT NOT NULL,
            birth_date TEXT NOT NULL,            -- ISO date: "1990-05-14"
            gender TEXT NOT NULL,
            email TEXT,
            phone TEXT,
            address TEXT,

            weight REAL NOT NULL,                -- kg
            height REAL NOT NULL,                -- cm

            -- Anthropometrics
            body_fat_percentage REAL,
            muscle_mass REAL,
            waist_circumference REAL,
            hip_circumference REAL,
            arm_circumference REAL,
            thigh_circumference REAL,
            calf_circumference REAL,
            triceps_skinfold REAL,
            biceps_skinfold REAL,
            subscapular_skinfold REAL,
            suprailiac_skinfold REAL,
            abdominal_skinfold REAL,

            -- Clinical history
            medical_history TEXT,
            nutritional_history TEXT,
            allergies TEXT,
            medications TEXT,

            patient_type TEXT NOT NULL DEFAULT 'healthy',
            activity_level TEXT NOT NULL DEFAULT 'moderate',
            diet_type TEXT NOT NULL CHECK(diet_type IN ('omnivore', 'vegetarian', 'vegan')) DEFAULT 'omnivore',
            has_diabetes INTEGER NOT NULL DEFAULT 0,
            has_hypertension INTEGER NOT NULL DEFAULT 0,
            has_bloating INTEGER NOT NULL DEFAULT 0,
            other_conditions TEXT,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(nutritionist_id, identification)
        );

        CREATE INDEX idx_patients_nutritionist ON patients(nutritionist_id);
        CREATE INDEX idx_patients_name ON patients(last_name, first_name);

        -- ============================================
        -- CONSULTATIONS
        -- Dated follow-up visits with derived figures
        -- ============================================
        CREATE TABLE consultations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
            consultation_date TEXT NOT NULL DEFAULT (datetime('now')),

            weight REAL NOT NULL,
            height REAL NOT NULL,
            bmi REAL,
            weight_change REAL,                  -- vs. previous consultation

            body_fat_percentage REAL,
            muscle_mass REAL,
            waist_circumference REAL,
            hip_circumference REAL,
            arm_circumference REAL,
            thigh_circumference REAL,
            calf_circumference REAL,
            triceps_skinfold REAL,
            biceps_skinfold REAL,
            subscapular_skinfold REAL,
            suprailiac_skinfold REAL,
            abdominal_skinfold REAL,

            activity_level_changed INTEGER NOT NULL DEFAULT 0,
            new_activity_level TEXT,

            caloric_requirement REAL,
            healthy_weight REAL,
            adjusted_weight REAL,

            notes TEXT,
            recommendations TEXT,
            diet_plan TEXT,
            clinical_observations TEXT,
            follow_up_notes TEXT,
            next_appointment TEXT,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_consultations_patient ON consultations(patient_id);
        CREATE INDEX idx_consultations_date ON consultations(consultation_date);
        CREATE INDEX idx_consultations_next ON consultations(next_appointment);

        -- ============================================
        -- MEAL PLANS
        -- Cached totals are recalculated when items are replaced
        -- ============================================
        CREATE TABLE meal_plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
            date_created TEXT NOT NULL DEFAULT (datetime('now')),
            name TEXT,
            notes TEXT,
            total_calories REAL NOT NULL DEFAULT 0,
            total_proteins REAL NOT NULL DEFAULT 0,
            total_carbohydrates REAL NOT NULL DEFAULT 0,
            total_fats REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_meal_plans_patient ON meal_plans(patient_id);

        CREATE TABLE meal_plan_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_plan_id INTEGER NOT NULL REFERENCES meal_plans(id) ON DELETE CASCADE,
            meal_time TEXT NOT NULL,
            food_item TEXT NOT NULL,
            portion TEXT NOT NULL,
            calories REAL NOT NULL DEFAULT 0,
            proteins REAL NOT NULL DEFAULT 0,
            carbohydrates REAL NOT NULL DEFAULT 0,
            fats REAL NOT NULL DEFAULT 0
        );

        CREATE INDEX idx_meal_plan_items_plan ON meal_plan_items(meal_plan_id);

        -- ============================================
        -- MENUS
        -- ============================================
        CREATE TABLE menus (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT NOT NULL CHECK(category IN
                ('healthy', 'diabetes', 'hypertension', 'bloating', 'vegetarian', 'vegan', 'athlete', 'other')),
            description TEXT,
            calories REAL,
            proteins REAL,
            carbohydrates REAL,
            fats REAL,
            fiber REAL,
            breakfast TEXT,
            mid_morning_snack TEXT,
            lunch TEXT,
            afternoon_snack TEXT,
            dinner TEXT,
            is_custom INTEGER NOT NULL DEFAULT 0,
            supplements TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_menus_category ON menus(category);

        -- ============================================
        -- FOOD EXCHANGES
        -- ============================================
        CREATE TABLE food_exchanges (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT NOT NULL CHECK(category IN
                ('cereals', 'legumes', 'vegetables', 'fruits', 'meat', 'dairy', 'fats', 'sugars')),
            portion_size TEXT NOT NULL,          -- e.g., "1 cup"
            portion_weight REAL NOT NULL,        -- grams
            calories REAL NOT NULL,
            proteins REAL NOT NULL,
            carbohydrates REAL NOT NULL,
            fats REAL NOT NULL,
            fiber REAL,
            calcium REAL,
            iron REAL,
            sodium REAL,
            potassium REAL,
            vitamin_a REAL,
            vitamin_c REAL,
            notes TEXT,
            is_custom INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_food_exchanges_category ON food_exchanges(category);
        CREATE INDEX idx_food_exchanges_name ON food_exchanges(name);

        -- ============================================
        -- SNACKS
        -- ============================================
        CREATE TABLE snacks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT CHECK(category IN ('sweet', 'salty', 'protein', 'fruit', 'vegetable', 'mixed')),
            description TEXT,
            recipe TEXT,
            calories REAL,
            proteins REAL,
            carbohydrates REAL,
            fats REAL,
            is_vegetarian INTEGER NOT NULL DEFAULT 0,
            is_vegan INTEGER NOT NULL DEFAULT 0,
            is_diabetic_friendly INTEGER NOT NULL DEFAULT 0,
            is_low_sodium INTEGER NOT NULL DEFAULT 0,
            is_custom INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_snacks_category ON snacks(category);

        -- ============================================
        -- PATIENT PREFERENCES
        -- At most one row per patient
        -- ============================================
        CREATE TABLE patient_preferences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL UNIQUE REFERENCES patients(id) ON DELETE CASCADE,
            favorite_foods TEXT,
            disliked_foods TEXT,
            allergies TEXT,
            cooking_methods TEXT,
            cultural_restrictions TEXT,
            budget_level TEXT NOT NULL CHECK(budget_level IN ('low', 'medium', 'high')) DEFAULT 'medium',
            cooking_time_available TEXT NOT NULL
                CHECK(cooking_time_available IN ('little', 'medium', 'plenty')) DEFAULT 'medium',

            -- Taste scores 1-5
            sweet_preference INTEGER NOT NULL CHECK(sweet_preference BETWEEN 1 AND 5) DEFAULT 3,
            salty_preference INTEGER NOT NULL CHECK(salty_preference BETWEEN 1 AND 5) DEFAULT 3,
            spicy_preference INTEGER NOT NULL CHECK(spicy_preference BETWEEN 1 AND 5) DEFAULT 3,
            sour_preference INTEGER NOT NULL CHECK(sour_preference BETWEEN 1 AND 5) DEFAULT 3,
            bitter_preference INTEGER NOT NULL CHECK(bitter_preference BETWEEN 1 AND 5) DEFAULT 3,

            prefers_soft_textures INTEGER NOT NULL DEFAULT 1,
            prefers_crunchy_textures INTEGER NOT NULL DEFAULT 1,

            breakfast_time TEXT,
            lunch_time TEXT,
            dinner_time TEXT,
            snacks_per_day INTEGER NOT NULL DEFAULT 2,
            notes TEXT,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
