//! Pagination crawl tests against a mock listing

use crate::common::{
    create_test_config, empty_listing_page, insert_leaf, listing_page, product_link, seed_products,
};
use tiki_harvest::crawler::CategoryStatus;
use tiki_harvest::storage::SqliteStorage;
use tiki_harvest::{Harvester, Storage};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PATH: &str = "/dien-thoai-smartphone/c1795";

async fn mount_page(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn listing_url(server: &MockServer) -> String {
    format!("{}{}?src=c.1789.hamburger_menu", server.uri(), LISTING_PATH)
}

#[tokio::test]
async fn test_two_pages_then_exhausted() {
    let server = MockServer::start().await;
    mount_page(&server, "1", listing_page("p1", 20)).await;
    mount_page(&server, "2", listing_page("p2", 5)).await;
    mount_page(&server, "3", empty_listing_page()).await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let category = insert_leaf(&mut storage, "Điện thoại Smartphone", &listing_url(&server));

    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();
    let summary = harvester.crawl_products().await.unwrap();

    assert_eq!(summary.categories.len(), 1);
    let report = &summary.categories[0];
    assert_eq!(report.status, CategoryStatus::Exhausted);
    assert_eq!(report.first_page, 1);
    assert_eq!(report.last_page, Some(2));
    assert_eq!(report.pages_processed, 2);
    assert_eq!(report.products_added, 25);

    let storage = harvester.storage();
    let stored = storage.get_category(category.id).unwrap();
    assert_eq!(stored.total_pages, Some(2));
    assert_eq!(stored.total_products, Some(25));

    let products = storage.get_products_for_category(category.id).unwrap();
    assert_eq!(products.len(), 25);
    assert_eq!(products.iter().filter(|p| p.page == 1).count(), 20);
    assert_eq!(products.iter().filter(|p| p.page == 2).count(), 5);

    let first = &products[0];
    assert_eq!(first.details.product_link, product_link(&server.uri(), "p1", 1));
    assert_eq!(first.details.product_name, "Sản phẩm p1 1");
    assert_eq!(first.details.current_price, 100_001);
    assert_eq!(first.details.original_price, 100_001);
    assert_eq!(first.details.discount_p, 0);
    assert_eq!(first.details.number_of_reviews, 1);
}

#[tokio::test]
async fn test_page_urls_keep_existing_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("src", "c.1789.hamburger_menu"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(empty_listing_page()))
        .expect(1)
        .mount(&server)
        .await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    insert_leaf(&mut storage, "Điện thoại Smartphone", &listing_url(&server));

    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();
    harvester.crawl_products().await.unwrap();
}

#[tokio::test]
async fn test_resume_starts_at_stored_page() {
    let server = MockServer::start().await;

    for page in ["1", "2"] {
        Mock::given(method("GET"))
            .and(path(LISTING_PATH))
            .and(query_param("page", page))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing_page("old", 20)))
            .expect(0)
            .mount(&server)
            .await;
    }
    mount_page(&server, "3", listing_page("p3", 20)).await;
    mount_page(&server, "4", listing_page("p4", 5)).await;
    mount_page(&server, "5", empty_listing_page()).await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let category = insert_leaf(&mut storage, "Điện thoại Smartphone", &listing_url(&server));

    // Previous run stopped after finishing page 3
    let page_three: Vec<String> = (1..=20)
        .map(|i| product_link(&server.uri(), "p3", i))
        .collect();
    seed_products(&mut storage, category.id, 3, &page_three);
    storage.update_progress(category.id, 3, 60).unwrap();

    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();
    let summary = harvester.crawl_products().await.unwrap();

    let report = &summary.categories[0];
    assert_eq!(report.first_page, 3);
    assert_eq!(report.products_added, 5);

    let stored = harvester.storage().get_category(category.id).unwrap();
    assert_eq!(stored.total_pages, Some(4));
    assert_eq!(stored.total_products, Some(65));
    assert_eq!(harvester.storage().count_products().unwrap(), 25);
}

#[tokio::test]
async fn test_recrawl_adds_no_duplicates() {
    let server = MockServer::start().await;
    mount_page(&server, "1", listing_page("p1", 20)).await;
    mount_page(&server, "2", listing_page("p2", 5)).await;
    mount_page(&server, "3", empty_listing_page()).await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let category = insert_leaf(&mut storage, "Điện thoại Smartphone", &listing_url(&server));

    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();
    harvester.crawl_products().await.unwrap();

    // Second pass resumes on page 2, which is already stored
    let second = harvester.crawl_products().await.unwrap();
    assert_eq!(second.categories.len(), 1);
    assert_eq!(second.categories[0].first_page, 2);
    assert_eq!(second.products_added(), 0);

    let storage = harvester.storage();
    assert_eq!(storage.count_products().unwrap(), 25);
    let stored = storage.get_category(category.id).unwrap();
    assert_eq!(stored.total_pages, Some(2));
    assert_eq!(stored.total_products, Some(25));
}

#[tokio::test]
async fn test_repeated_cards_across_pages_stored_once() {
    let server = MockServer::start().await;
    mount_page(&server, "1", listing_page("p", 10)).await;
    // Page 2 repeats the first 10 cards and adds 2 more
    mount_page(&server, "2", listing_page("p", 12)).await;
    mount_page(&server, "3", empty_listing_page()).await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let category = insert_leaf(&mut storage, "Tai nghe", &listing_url(&server));

    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();
    harvester.crawl_products().await.unwrap();

    let stored = harvester.storage().get_category(category.id).unwrap();
    assert_eq!(stored.total_pages, Some(2));
    assert_eq!(stored.total_products, Some(12));
    assert_eq!(harvester.storage().count_products().unwrap(), 12);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    mount_page(&server, "1", listing_page("p1", 20)).await;
    mount_page(&server, "2", listing_page("p2", 20)).await;

    // First request for page 3 fails, the retry succeeds
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page("p3", 7)))
        .with_priority(2)
        .expect(1)
        .mount(&server)
        .await;

    mount_page(&server, "4", empty_listing_page()).await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let category = insert_leaf(&mut storage, "Điện thoại Smartphone", &listing_url(&server));

    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();
    let summary = harvester.crawl_products().await.unwrap();

    let report = &summary.categories[0];
    assert_eq!(report.skipped_pages, 0);
    assert_eq!(report.products_added, 47);

    let storage = harvester.storage();
    let stored = storage.get_category(category.id).unwrap();
    assert_eq!(stored.total_pages, Some(3));
    assert_eq!(stored.total_products, Some(47));

    let products = storage.get_products_for_category(category.id).unwrap();
    assert_eq!(products.iter().filter(|p| p.page == 3).count(), 7);
}

#[tokio::test]
async fn test_page_failing_twice_is_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "1", listing_page("p1", 20)).await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "3", listing_page("p3", 5)).await;
    mount_page(&server, "4", empty_listing_page()).await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let category = insert_leaf(&mut storage, "Điện thoại Smartphone", &listing_url(&server));

    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();
    let summary = harvester.crawl_products().await.unwrap();

    let report = &summary.categories[0];
    assert_eq!(report.status, CategoryStatus::Exhausted);
    assert_eq!(report.skipped_pages, 1);
    assert_eq!(report.pages_processed, 2);

    let stored = harvester.storage().get_category(category.id).unwrap();
    assert_eq!(stored.total_pages, Some(3));
    assert_eq!(stored.total_products, Some(25));
}

#[tokio::test]
async fn test_too_many_skipped_pages_abandons_category() {
    let server = MockServer::start().await;
    mount_page(&server, "1", listing_page("p1", 20)).await;

    // Every other page is down
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(10)
        .mount(&server)
        .await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let category = insert_leaf(&mut storage, "Điện thoại Smartphone", &listing_url(&server));

    let mut config = create_test_config(&server.uri());
    config.crawler.max_skipped_pages = 2;

    let mut harvester = Harvester::new(&config, storage).unwrap();
    let summary = harvester.crawl_products().await.unwrap();

    let report = &summary.categories[0];
    assert_eq!(report.status, CategoryStatus::Abandoned { at_page: 4 });
    assert_eq!(report.skipped_pages, 3);
    assert_eq!(summary.abandoned(), 1);

    // Progress stays on the last good page
    let stored = harvester.storage().get_category(category.id).unwrap();
    assert_eq!(stored.total_pages, Some(1));
    assert_eq!(stored.total_products, Some(20));
}

#[tokio::test]
async fn test_empty_category_is_marked_crawled() {
    let server = MockServer::start().await;
    mount_page(&server, "1", empty_listing_page()).await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let category = insert_leaf(&mut storage, "Sách cũ", &listing_url(&server));

    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();
    let summary = harvester.crawl_products().await.unwrap();
    assert_eq!(summary.categories[0].last_page, Some(0));

    let stored = harvester.storage().get_category(category.id).unwrap();
    assert_eq!(stored.total_pages, Some(0));
    assert_eq!(stored.total_products, Some(0));
}

#[tokio::test]
async fn test_failed_first_page_leaves_category_uncrawled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "2", empty_listing_page()).await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let category = insert_leaf(&mut storage, "Sách cũ", &listing_url(&server));

    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();
    harvester.crawl_products().await.unwrap();

    let stored = harvester.storage().get_category(category.id).unwrap();
    assert_eq!(stored.total_pages, None);
    assert_eq!(stored.total_products, None);
}

#[tokio::test]
async fn test_categories_crawled_in_resume_order() {
    let server = MockServer::start().await;
    for page in ["1", "2", "3"] {
        Mock::given(method("GET"))
            .and(query_param("page", page))
            .respond_with(ResponseTemplate::new(200).set_body_string(empty_listing_page()))
            .mount(&server)
            .await;
    }

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let first = insert_leaf(&mut storage, "Một", &format!("{}/mot/c1", server.uri()));
    let second = insert_leaf(&mut storage, "Hai", &format!("{}/hai/c2", server.uri()));
    let third = insert_leaf(&mut storage, "Ba", &format!("{}/ba/c3", server.uri()));
    storage.update_progress(second.id, 3, 60).unwrap();

    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();
    let summary = harvester.crawl_products().await.unwrap();

    let order: Vec<i64> = summary.categories.iter().map(|r| r.category_id).collect();
    assert_eq!(order, vec![second.id, first.id, third.id]);
    assert_eq!(summary.categories[0].first_page, 3);
}
