//! # SQLite Specific SQL Queries
//!
//! Centralizes the schema statements for the SQLite provider. Everything
//! here is idempotent and safe to run on every application startup.

pub const CREATE_CATEGORIES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        slug TEXT NOT NULL UNIQUE,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );";

pub const CREATE_FAQ_KB_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS faq_kb (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        question TEXT NOT NULL,
        answer TEXT NOT NULL,
        category_id INTEGER REFERENCES categories(id),
        embedding BLOB,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );";

pub const CREATE_FAQ_KB_CATEGORY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_faq_kb_category_id ON faq_kb (category_id);";

pub const CREATE_CHAT_LOGS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS chat_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT,
        session_id TEXT,
        message TEXT NOT NULL,
        normalized TEXT NOT NULL,
        canonical TEXT NOT NULL,
        intent TEXT NOT NULL,
        confidence REAL NOT NULL,
        answer TEXT NOT NULL,
        source TEXT NOT NULL,
        success INTEGER NOT NULL,
        matched_ids TEXT NOT NULL,
        processing_time_ms INTEGER NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );";

/// Every statement required for a fully initialized database, in
/// dependency order.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    CREATE_CATEGORIES_TABLE,
    CREATE_FAQ_KB_TABLE,
    CREATE_FAQ_KB_CATEGORY_INDEX,
    CREATE_CHAT_LOGS_TABLE,
];
