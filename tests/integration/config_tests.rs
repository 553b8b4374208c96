//! Configuration loading tests with files on disk

use std::io::Write;
use tempfile::NamedTempFile;
use tiki_harvest::config::{load_config, load_config_with_hash};
use tiki_harvest::storage::SqliteStorage;
use tiki_harvest::Harvester;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_partial_config_keeps_defaults() {
    let file = write_config(
        r#"
[crawler]
page-delay-min-ms = 200
page-delay-max-ms = 400
max-skipped-pages = 5

[output]
database-path = "catalog.db"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.site.base_url, "https://tiki.vn");
    assert_eq!(config.crawler.page_delay_min_ms, 200);
    assert_eq!(config.crawler.page_delay_max_ms, 400);
    assert_eq!(config.crawler.max_skipped_pages, 5);
    assert_eq!(config.crawler.retry_delay_ms, 5000);
    assert_eq!(config.output.database_path, "catalog.db");
    assert_eq!(config.selectors.product_item, "div.product-item");
}

#[test]
fn test_loaded_config_builds_harvester() {
    let file = write_config(
        r#"
[site]
base-url = "https://tiki.vn"

[user-agent]
crawler-name = "catalog-bot"
crawler-version = "2.1"
contact-url = "https://example.com/bot"

[selectors]
product-item = "div.product-card"
"#,
    );

    let (config, hash) = load_config_with_hash(file.path()).unwrap();
    assert_eq!(hash.len(), 64);
    assert_eq!(
        config.user_agent.header_value(),
        "catalog-bot/2.1 (+https://example.com/bot)"
    );

    let storage = SqliteStorage::new_in_memory().unwrap();
    assert!(Harvester::new(&config, storage).is_ok());
}

#[test]
fn test_broken_selector_is_rejected() {
    let file = write_config(
        r#"
[selectors]
rating = ".rating[["
"#,
    );

    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_on_disk_database_survives_reopen() {
    use tiki_harvest::storage::NewCategory;
    use tiki_harvest::Storage;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("tiki.db");

    {
        let mut storage = SqliteStorage::new(&db_path).unwrap();
        storage
            .insert_category(&NewCategory::root("Sách", "https://tiki.vn/sach/c316"))
            .unwrap();
    }

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_categories().unwrap(), 1);
}
