use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Schema bootstrap statements, executed in order at startup.
///
/// The `users` table is owned by the (external) account service; it is created
/// here only so the `reports.user_id` reference resolves on a fresh database.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS properties (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        address TEXT NOT NULL,
        city TEXT NOT NULL,
        postal_code TEXT NOT NULL,
        property_type TEXT NOT NULL,
        surface REAL,
        rooms INTEGER,
        price REAL,
        sale_date TEXT,
        latitude REAL,
        longitude REAL,
        created_at TEXT NOT NULL,
        updated_at TEXT
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS neighborhoods (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        city TEXT NOT NULL,
        postal_code TEXT,
        latitude REAL,
        longitude REAL,
        rotation_rate_score REAL NOT NULL DEFAULT 0,
        potential_score REAL NOT NULL DEFAULT 0,
        demand_indicator REAL NOT NULL DEFAULT 0,
        average_age REAL,
        average_income REAL,
        population INTEGER,
        average_price_m2 REAL,
        average_sale_time INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS leads (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT,
        lead_type TEXT NOT NULL,
        budget_min REAL,
        budget_max REAL,
        property_type_interest TEXT,
        location_interest TEXT,
        score REAL NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'new',
        source TEXT,
        notes TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT,
        last_contact_date TEXT
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT,
        email TEXT
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS reports (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        report_type TEXT NOT NULL,
        location TEXT,
        content TEXT,
        file_path TEXT,
        status TEXT NOT NULL DEFAULT 'generating',
        user_id INTEGER NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        updated_at TEXT
    )"#,
    // Default owner for reports created without an account context.
    r#"
    INSERT INTO users (id, username, email)
    SELECT 1, 'demo', 'demo@farmio.example'
    WHERE NOT EXISTS (SELECT 1 FROM users)"#,
];

pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.create_tables().await?;
        Ok(db)
    }

    /// In-memory database for tests. A single pinned connection keeps the
    /// `:memory:` database alive for the lifetime of the pool.
    pub async fn new_in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.create_tables().await?;
        Ok(db)
    }

    /// Idempotent schema bootstrap ("create tables if absent at boot").
    pub async fn create_tables(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Database schema ready");
        Ok(())
    }
}
