//! Database schema definitions
//!
//! This module contains the SQL schema for the catalog database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Category tree, one row per discovered node
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(255),
    url TEXT NOT NULL,
    level INTEGER NOT NULL,
    total_sub_category INTEGER,
    parent_id INTEGER,
    total_pages INTEGER,
    total_products INTEGER,
    create_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_categories_leaf ON categories(total_sub_category, total_pages);
CREATE INDEX IF NOT EXISTS idx_categories_level ON categories(level);

-- Products scraped from leaf category listings
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id TEXT,
    product_sku TEXT,
    product_name VARCHAR(255),
    data_id TEXT,
    current_price INTEGER,
    product_brand VARCHAR(255),
    category_id INTEGER NOT NULL REFERENCES categories(id),
    product_link TEXT NOT NULL,
    product_image_link TEXT,
    original_price INTEGER,
    discount_p INTEGER,
    rating_p INTEGER,
    number_of_reviews INTEGER,
    page INTEGER NOT NULL,
    create_at TEXT NOT NULL
);

-- Per-category dedup lookup, not a uniqueness constraint
CREATE INDEX IF NOT EXISTS idx_products_category_link ON products(category_id, product_link);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
