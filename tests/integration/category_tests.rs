//! Category tree walk tests against a mock shop

use crate::common::{create_test_config, empty_listing_page, insert_leaf, listing_page};
use tiki_harvest::storage::SqliteStorage;
use tiki_harvest::{CrawlError, Harvester, Storage};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn home_page() -> String {
    r#"<html><body><nav>
        <a class="MenuItem__MenuLink-sc-181aa19-1 fKvTQu" href="/dien-thoai-may-tinh-bang/c1789">
          <span class="icon"></span><span class="text">Điện Thoại - Máy Tính Bảng</span>
        </a>
        <a class="MenuItem__MenuLink-sc-181aa19-1 fKvTQu" href="/nha-sach-tiki/c8322">
          <span class="text">Nhà Sách Tiki</span>
        </a>
        <a class="promo" href="/khuyen-mai">Khuyến mãi</a>
    </nav></body></html>"#
        .to_string()
}

fn phones_page() -> String {
    r#"<html><body><div class="list-group">
        <div class="list-group-item">Điện Thoại - Máy Tính Bảng</div>
        <div class="list-group-item is-child"><a href="/dien-thoai-smartphone/c1795">
            Điện thoại Smartphone
            (4512)
        </a></div>
        <div class="list-group-item is-child"><a href="/may-tinh-bang/c1794">Máy tính bảng (800)</a></div>
    </div></body></html>"#
        .to_string()
}

fn leaf_page() -> String {
    r#"<html><body><div class="list-group"><div class="list-group-item">Leaf</div></div></body></html>"#
        .to_string()
}

async fn mount_html(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Home page with two top-level categories; the second one is down
async fn mount_shop(server: &MockServer) {
    mount_html(server, "/", home_page()).await;
    mount_html(server, "/dien-thoai-may-tinh-bang/c1789", phones_page()).await;
    Mock::given(method("GET"))
        .and(path("/nha-sach-tiki/c8322"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(server)
        .await;
    mount_html(server, "/dien-thoai-smartphone/c1795", leaf_page()).await;
    mount_html(server, "/may-tinh-bang/c1794", leaf_page()).await;
}

#[tokio::test]
async fn test_walk_builds_tree() {
    let server = MockServer::start().await;
    mount_shop(&server).await;

    let storage = SqliteStorage::new_in_memory().unwrap();
    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();
    let summary = harvester.crawl_categories().await.unwrap();

    assert_eq!(summary.main_categories, 2);
    assert_eq!(summary.sub_categories, 2);
    assert_eq!(summary.parents_read, 3);
    assert_eq!(summary.parents_failed, 1);

    let storage = harvester.storage();
    assert_eq!(storage.count_categories().unwrap(), 4);

    let roots = storage.get_categories_by_level(1).unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0].name, "Điện Thoại - Máy Tính Bảng");
    assert_eq!(
        roots[0].url,
        format!("{}/dien-thoai-may-tinh-bang/c1789", server.uri())
    );
    assert_eq!(roots[0].parent_id, None);
    assert_eq!(roots[0].total_sub_category, Some(2));

    // The failed parent is not mistaken for a leaf
    assert_eq!(roots[1].name, "Nhà Sách Tiki");
    assert_eq!(roots[1].total_sub_category, None);

    let children = storage.get_children(roots[0].id).unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].name, "Điện thoại Smartphone");
    assert_eq!(children[1].name, "Máy tính bảng");
    for child in &children {
        assert_eq!(child.level, 2);
        assert_eq!(child.parent_id, Some(roots[0].id));
        assert_eq!(child.total_sub_category, Some(0));
        assert_eq!(child.total_pages, None);
    }
}

#[tokio::test]
async fn test_walk_descends_several_levels() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<a class="MenuItem__MenuLink-sc-181aa19-1 fKvTQu" href="/a/c1"><span class="text">A</span></a>"#
            .to_string(),
    )
    .await;
    mount_html(
        &server,
        "/a/c1",
        r#"<div class="list-group-item is-child"><a href="/a/b/c2">B</a></div>"#.to_string(),
    )
    .await;
    mount_html(
        &server,
        "/a/b/c2",
        r#"<div class="list-group-item is-child"><a href="/a/b/c/c3">C</a></div>"#.to_string(),
    )
    .await;
    mount_html(&server, "/a/b/c/c3", leaf_page()).await;

    let storage = SqliteStorage::new_in_memory().unwrap();
    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();
    harvester.crawl_categories().await.unwrap();

    let storage = harvester.storage();
    let levels = storage.count_categories_by_level().unwrap();
    assert_eq!(levels.into_iter().collect::<Vec<_>>(), vec![(1, 1), (2, 1), (3, 1)]);

    let deepest = storage.get_categories_by_level(3).unwrap();
    let middle = storage.get_categories_by_level(2).unwrap();
    assert_eq!(deepest[0].name, "C");
    assert_eq!(deepest[0].parent_id, Some(middle[0].id));
    assert!(deepest[0].is_leaf());
    assert_eq!(storage.count_leaf_categories().unwrap(), (1, 0));
}

#[tokio::test]
async fn test_unreachable_home_page_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let storage = SqliteStorage::new_in_memory().unwrap();
    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();

    let result = harvester.crawl_categories().await;
    assert!(matches!(result, Err(CrawlError::Fetch { .. })));
    assert_eq!(harvester.storage().count_categories().unwrap(), 0);
}

#[tokio::test]
async fn test_run_walks_then_paginates() {
    let server = MockServer::start().await;
    mount_shop(&server).await;

    // Listing pages of both leaves
    for (leaf, prefix) in [("/dien-thoai-smartphone/c1795", "phone"), ("/may-tinh-bang/c1794", "tablet")] {
        Mock::given(method("GET"))
            .and(path(leaf))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(prefix, 3)))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(leaf))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(empty_listing_page()))
            .with_priority(1)
            .mount(&server)
            .await;
    }

    let storage = SqliteStorage::new_in_memory().unwrap();
    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();
    let summary = harvester.run().await.unwrap();

    assert_eq!(summary.walk.as_ref().map(|w| w.main_categories), Some(2));
    assert_eq!(summary.products.categories.len(), 2);
    assert_eq!(summary.products.products_added(), 6);

    let storage = harvester.storage();
    assert_eq!(storage.count_products().unwrap(), 6);
    assert_eq!(storage.count_leaf_categories().unwrap(), (2, 2));
}

#[tokio::test]
async fn test_run_skips_walk_when_tree_is_stored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(home_page()))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sach/c316"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(empty_listing_page()))
        .expect(1)
        .mount(&server)
        .await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    insert_leaf(&mut storage, "Sách", &format!("{}/sach/c316", server.uri()));

    let mut harvester = Harvester::new(&create_test_config(&server.uri()), storage).unwrap();
    let summary = harvester.run().await.unwrap();

    assert!(summary.walk.is_none());
    assert_eq!(summary.products.categories.len(), 1);
    assert_eq!(harvester.storage().count_categories().unwrap(), 1);
}
