//! # SQL Generation Prompts
//!
//! Static reference texts for the first model call: the system rules, the
//! documented receipts schema, few-shot examples, and the user prompt template.

/// The system prompt for the SQL generation stage.
pub const SQL_SYSTEM_PROMPT: &str = r#"You are a careful SQLite analyst for a personal purchase-receipt database.
You translate one user question into ONE read-only SQL SELECT statement.
You never modify data, never use more than one statement, never write comments,
and never end the statement with a semicolon.
Your entire reply is a single JSON object and nothing else."#;

/// JSON Schema for the generation payload. Shown to the model and mirrored by
/// the shape check in [`crate::validation`].
pub const SQL_PAYLOAD_JSON_SCHEMA: &str = r#"{
  "type": "object",
  "additionalProperties": false,
  "required": ["sql", "explanation", "params"],
  "properties": {
    "sql": { "type": "string", "minLength": 1 },
    "explanation": { "type": "string" },
    "params": {
      "type": "object",
      "propertyNames": { "pattern": "^\\$[1-9][0-9]*$" },
      "additionalProperties": { "type": ["string", "number", "boolean", "null"] }
    }
  }
}"#;

/// Documentation of the four tables the model may query.
pub const SCHEMA_DOCUMENTATION: &str = r#"organization -- the company that issued a receipt
  id INTEGER PRIMARY KEY
  ico TEXT                -- company registration number
  dic TEXT                -- tax identification number
  ic_dph TEXT             -- VAT identification number
  name TEXT               -- organization name
  building_number TEXT
  country TEXT
  municipality TEXT       -- town
  postal_code TEXT
  street_name TEXT

unit -- a store branch of an organization
  id INTEGER PRIMARY KEY
  org_id INTEGER REFERENCES organization(id)
  name TEXT               -- branch name
  country TEXT
  municipality TEXT       -- town of the branch
  postal_code TEXT
  building_number TEXT
  property_registration_number TEXT
  street_name TEXT
  latitude REAL
  longitude REAL

"transaction" -- one receipt (always double-quote this table name)
  id INTEGER PRIMARY KEY
  issue_date TEXT         -- ISO-8601 date and time the receipt was issued
  org_id INTEGER REFERENCES organization(id)
  unit_id INTEGER REFERENCES unit(id)

item -- one line of a receipt
  id INTEGER PRIMARY KEY
  transaction_id INTEGER REFERENCES "transaction"(id)
  quantity REAL
  name TEXT               -- name as printed on the receipt
  price REAL              -- total price of the line
  ai_name_without_brand_and_quantity TEXT
  ai_name_in_english_without_brand_and_quantity TEXT
  ai_brand TEXT
  ai_category TEXT
  ai_quantity_value REAL
  ai_quantity_unit TEXT"#;

/// Few-shot examples of questions and the expected JSON replies.
pub const FEW_SHOT_EXAMPLES: &str = r#"Q: How much did I spend in total last month?
A: {"sql": "SELECT SUM(i.price) AS total_spent FROM item i JOIN \"transaction\" t ON i.transaction_id = t.id WHERE date(t.issue_date) >= date('now', 'start of month', '-1 month') AND date(t.issue_date) < date('now', 'start of month')", "explanation": "Sum of item prices for receipts issued in the previous calendar month.", "params": {}}

Q: Top 5 brands by spend
A: {"sql": "SELECT i.ai_brand, SUM(i.price) AS total_spent FROM item i JOIN \"transaction\" t ON i.transaction_id = t.id WHERE i.ai_brand IS NOT NULL GROUP BY i.ai_brand ORDER BY total_spent DESC LIMIT 5", "explanation": "Brands ranked by total spend, highest first.", "params": {}}

Q: Koľko som minul za mlieko v roku 2024?
A: {"sql": "SELECT SUM(i.price) AS total_spent FROM item i JOIN \"transaction\" t ON i.transaction_id = t.id WHERE LOWER(i.ai_name_in_english_without_brand_and_quantity) LIKE LOWER($1) AND strftime('%Y', t.issue_date) = $2", "explanation": "Total spent on milk during 2024.", "params": {"$1": "%milk%", "$2": "2024"}}

Q: In which stores did I shop most often?
A: {"sql": "SELECT o.name AS org_name, COUNT(DISTINCT t.id) AS count FROM \"transaction\" t JOIN organization o ON t.org_id = o.id GROUP BY o.name ORDER BY count DESC LIMIT 10", "explanation": "Organizations ranked by number of receipts.", "params": {}}

Q: What did I buy in Bratislava on 2024-03-15?
A: {"sql": "SELECT i.name, i.price FROM item i JOIN \"transaction\" t ON i.transaction_id = t.id JOIN unit u ON t.unit_id = u.id WHERE LOWER(u.municipality) LIKE LOWER($1) AND date(t.issue_date) = $2 ORDER BY i.price DESC", "explanation": "Items bought in Bratislava branches on the given day.", "params": {"$1": "%bratislava%", "$2": "2024-03-15"}}"#;

/// The user prompt template for the SQL generation stage.
///
/// Placeholders: `{allowed_tables}`, `{json_schema}`, `{examples}`, `{schema}`, `{question}`
pub const SQL_USER_PROMPT: &str = r#"You are given a relational schema with FOUR tables: {allowed_tables}.

TASK:
- Generate ONE SQLite SELECT query that answers the user question.
- Use ONLY the tables and columns from the schema below.
- Use positional placeholders $1, $2, ... for all dynamic values, numbered from 1 without gaps.
- Use "transaction".issue_date for ALL date filters (year, month, range, last N days).
- Prefer case-insensitive matching for text search: LOWER(column) LIKE LOWER($1).
- Join tables via: item.transaction_id = "transaction".id, "transaction".unit_id = unit.id, "transaction".org_id = organization.id.
- Return ONLY a JSON object with keys: sql, explanation, params. No markdown, no code fences.

RESPONSE JSON SCHEMA:
{json_schema}

EXAMPLES (few-shot):
{examples}

SCHEMA (documentation):
{schema}

QUESTION:
{question}"#;
