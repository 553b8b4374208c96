//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    CategoryProductCount, CategoryRecord, NewCategory, NewProduct, ProductDetails, ProductRecord,
};
use crate::CrawlError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const CATEGORY_COLUMNS: &str = "id, name, url, level, total_sub_category, parent_id, \
     total_pages, total_products, create_at";

const PRODUCT_COLUMNS: &str = "id, product_id, product_sku, product_name, data_id, \
     current_price, product_brand, category_id, product_link, product_image_link, \
     original_price, discount_p, rating_p, number_of_reviews, page, create_at";

/// SQLite storage backend
///
/// Owns the single connection used for a run. Statements autocommit.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CrawlError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, CrawlError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, CrawlError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_categories(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Vec<CategoryRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let categories = stmt
            .query_map(params, category_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<CategoryRecord> {
    Ok(CategoryRecord {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        url: row.get(2)?,
        level: row.get(3)?,
        total_sub_category: row.get(4)?,
        parent_id: row.get(5)?,
        total_pages: row.get(6)?,
        total_products: row.get(7)?,
        create_at: row.get(8)?,
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<ProductRecord> {
    Ok(ProductRecord {
        id: row.get(0)?,
        category_id: row.get(7)?,
        page: row.get(14)?,
        details: ProductDetails {
            product_id: row.get(1)?,
            product_sku: row.get(2)?,
            product_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            data_id: row.get(4)?,
            current_price: row.get(5)?,
            product_brand: row.get(6)?,
            product_link: row.get(8)?,
            product_image_link: row.get(9)?,
            original_price: row.get(10)?,
            discount_p: row.get(11)?,
            rating_p: row.get(12)?,
            number_of_reviews: row.get(13)?,
        },
        create_at: row.get(15)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Category Tree =====

    fn insert_category(&mut self, category: &NewCategory) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO categories (name, url, level, parent_id, create_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                category.name,
                category.url,
                category.level,
                category.parent_id,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_category(&self, id: i64) -> StorageResult<CategoryRecord> {
        let sql = format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLUMNS);
        self.conn
            .query_row(&sql, params![id], category_from_row)
            .optional()?
            .ok_or(StorageError::CategoryNotFound(id))
    }

    fn get_categories_by_level(&self, level: u32) -> StorageResult<Vec<CategoryRecord>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE level = ?1 ORDER BY id",
            CATEGORY_COLUMNS
        );
        self.query_categories(&sql, params![level])
    }

    fn get_children(&self, parent_id: i64) -> StorageResult<Vec<CategoryRecord>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE parent_id = ?1 ORDER BY id",
            CATEGORY_COLUMNS
        );
        self.query_categories(&sql, params![parent_id])
    }

    fn update_total_sub_category(&mut self, id: i64, total: u32) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE categories SET total_sub_category = ?1 WHERE id = ?2",
            params![total, id],
        )?;
        if updated == 0 {
            return Err(StorageError::CategoryNotFound(id));
        }
        Ok(())
    }

    // ===== Crawl Progress =====

    fn find_unresumed(&self) -> StorageResult<Vec<CategoryRecord>> {
        let last_crawled_sql = format!(
            "SELECT {} FROM categories
             WHERE total_sub_category = 0 AND total_pages IS NOT NULL
             ORDER BY id DESC LIMIT 1",
            CATEGORY_COLUMNS
        );
        let never_crawled_sql = format!(
            "SELECT {} FROM categories
             WHERE total_sub_category = 0 AND total_pages IS NULL
             ORDER BY id",
            CATEGORY_COLUMNS
        );

        let mut categories = self.query_categories(&last_crawled_sql, [])?;
        categories.extend(self.query_categories(&never_crawled_sql, [])?);
        Ok(categories)
    }

    fn update_progress(
        &mut self,
        id: i64,
        total_pages: u32,
        total_products: u32,
    ) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE categories SET total_pages = ?1, total_products = ?2 WHERE id = ?3",
            params![total_pages, total_products, id],
        )?;
        if updated == 0 {
            return Err(StorageError::CategoryNotFound(id));
        }
        Ok(())
    }

    // ===== Products =====

    fn insert_product(&mut self, product: &NewProduct) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let details = &product.details;
        self.conn.execute(
            "INSERT INTO products (product_id, product_sku, product_name, data_id, current_price,
             product_brand, category_id, product_link, product_image_link, original_price,
             discount_p, rating_p, number_of_reviews, page, create_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                details.product_id,
                details.product_sku,
                details.product_name,
                details.data_id,
                details.current_price,
                details.product_brand,
                product.category_id,
                details.product_link,
                details.product_image_link,
                details.original_price,
                details.discount_p,
                details.rating_p,
                details.number_of_reviews,
                product.page,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn product_links(&self, category_id: i64) -> StorageResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT product_link FROM products WHERE category_id = ?1")?;

        let links = stmt
            .query_map(params![category_id], |row| row.get(0))?
            .collect::<Result<HashSet<String>, _>>()?;

        Ok(links)
    }

    fn get_products_for_category(&self, category_id: i64) -> StorageResult<Vec<ProductRecord>> {
        let sql = format!(
            "SELECT {} FROM products WHERE category_id = ?1 ORDER BY id",
            PRODUCT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let products = stmt
            .query_map(params![category_id], product_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    // ===== Statistics =====

    fn count_categories(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_categories_by_level(&self) -> StorageResult<BTreeMap<u32, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT level, COUNT(*) FROM categories GROUP BY level ORDER BY level")?;

        let mut breakdown = BTreeMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (level, count) = row?;
            breakdown.insert(level, count as u64);
        }

        Ok(breakdown)
    }

    fn count_leaf_categories(&self) -> StorageResult<(u64, u64)> {
        let (all, crawled): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COUNT(total_pages) FROM categories WHERE total_sub_category = 0",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((all as u64, crawled as u64))
    }

    fn count_products(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn top_categories_by_products(
        &self,
        limit: usize,
    ) -> StorageResult<Vec<CategoryProductCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, COUNT(p.id) AS n
             FROM categories c JOIN products p ON p.category_id = c.id
             GROUP BY c.id
             ORDER BY n DESC, c.id
             LIMIT ?1",
        )?;

        let counts = stmt
            .query_map(params![limit as i64], |row| {
                Ok(CategoryProductCount {
                    category_id: row.get(0)?,
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    products: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}
