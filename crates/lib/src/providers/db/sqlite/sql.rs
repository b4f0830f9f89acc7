//! # Receipts Schema
//!
//! DDL for the four receipt tables. `transaction` is a keyword in SQLite and
//! must stay double-quoted everywhere.

pub const CREATE_ORGANIZATION_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS organization (
        id INTEGER PRIMARY KEY,
        ico TEXT,
        dic TEXT,
        ic_dph TEXT,
        name TEXT,
        building_number TEXT,
        country TEXT,
        municipality TEXT,
        postal_code TEXT,
        street_name TEXT
    );
";

pub const CREATE_UNIT_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS unit (
        id INTEGER PRIMARY KEY,
        org_id INTEGER REFERENCES organization(id),
        name TEXT,
        country TEXT,
        municipality TEXT,
        postal_code TEXT,
        building_number TEXT,
        property_registration_number TEXT,
        street_name TEXT,
        latitude REAL,
        longitude REAL
    );
";

pub const CREATE_TRANSACTION_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS "transaction" (
        id INTEGER PRIMARY KEY,
        issue_date TEXT NOT NULL,
        org_id INTEGER REFERENCES organization(id),
        unit_id INTEGER REFERENCES unit(id)
    );
"#;

pub const CREATE_ITEM_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS item (
        id INTEGER PRIMARY KEY,
        transaction_id INTEGER REFERENCES "transaction"(id),
        quantity REAL,
        name TEXT,
        price REAL,
        ai_name_without_brand_and_quantity TEXT,
        ai_name_in_english_without_brand_and_quantity TEXT,
        ai_brand TEXT,
        ai_category TEXT,
        ai_quantity_value REAL,
        ai_quantity_unit TEXT
    );
"#;

pub const CREATE_TRANSACTION_DATE_INDEX: &str =
    r#"CREATE INDEX IF NOT EXISTS idx_transaction_issue_date ON "transaction"(issue_date);"#;

pub const CREATE_ITEM_TRANSACTION_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_item_transaction_id ON item(transaction_id);";

/// Parents before children, tables before indexes.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    CREATE_ORGANIZATION_TABLE,
    CREATE_UNIT_TABLE,
    CREATE_TRANSACTION_TABLE,
    CREATE_ITEM_TABLE,
    CREATE_TRANSACTION_DATE_INDEX,
    CREATE_ITEM_TRANSACTION_INDEX,
];
