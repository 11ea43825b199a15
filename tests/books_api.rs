//! HTTP-level tests for the book resource: JSON request → router →
//! mapper → entity store → JSON response.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use folio_app::modules::books::BooksModule;
use folio_kernel::settings::Settings;
use folio_kernel::ModuleRegistry;
use folio_store::memory::MemoryStore;
use folio_store::EntityStore;
use serde_json::{json, Map, Value};
use uuid::Uuid;

async fn make_server(store: &Arc<dyn EntityStore>) -> TestServer {
    let mut registry = ModuleRegistry::new();
    registry.register(Arc::new(BooksModule::new(store.clone())));

    let settings = Settings::default();
    let router = folio_http::build_router(&registry, &settings).await.unwrap();
    TestServer::new(router)
}

fn fields(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

async fn seed_book(store: &Arc<dyn EntityStore>, title: &str) -> Uuid {
    store
        .create(
            "book",
            fields(json!({
                "title": title,
                "pages": 100,
                "publisher": "Ace",
                "available": true,
            })),
        )
        .await
        .unwrap()
        .id()
}

#[tokio::test]
async fn list_returns_every_book_in_storage_order() {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    seed_book(&store, "first").await;
    store
        .create("author", fields(json!({"name": "not a book"})))
        .await
        .unwrap();
    seed_book(&store, "second").await;
    let server = make_server(&store).await;

    let response = server.get("/api/book/all").await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    let books = body.as_array().unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0]["title"], "first");
    assert_eq!(books[1]["title"], "second");
}

#[tokio::test]
async fn get_returns_book_with_empty_authors() {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let id = seed_book(&store, "Dune").await;
    let server = make_server(&store).await;

    let response = server.get(&format!("/api/book/{id}")).await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["id"], json!(id));
    assert_eq!(body["title"], "Dune");
    assert_eq!(body["authors"], json!([]));
}

#[tokio::test]
async fn get_unknown_id_is_404() {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let server = make_server(&store).await;

    let response = server.get(&format!("/api/book/{}", Uuid::new_v4())).await;
    response.assert_status(StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn get_entity_of_another_kind_is_404() {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let author = store
        .create("author", fields(json!({"name": "Frank"})))
        .await
        .unwrap();
    let server = make_server(&store).await;

    let response = server.get(&format!("/api/book/{}", author.id())).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_answers_200_and_echoes_fields() {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let server = make_server(&store).await;

    let response = server
        .post("/api/book/add")
        .json(&json!({
            "title": "Dune",
            "pages": 412,
            "publisher": "Chilton",
            "available": true,
            "authors": [],
        }))
        .await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();
    assert_eq!(body["title"], "Dune");
    assert_eq!(body["pages"], 412);
    assert_eq!(body["publisher"], "Chilton");
    assert_eq!(body["available"], true);
    assert_eq!(body["authors"], json!([]));
}

#[tokio::test]
async fn create_echoes_page_counts_beyond_32_bits() {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let server = make_server(&store).await;

    let response = server
        .post("/api/book/add")
        .json(&json!({"title": "Encyclopedia", "pages": 4_294_967_297u64}))
        .await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["pages"], json!(4_294_967_297u64));
}

#[tokio::test]
async fn create_without_title_is_rejected() {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let server = make_server(&store).await;

    let response = server
        .post("/api/book/add")
        .json(&json!({"pages": 412}))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["details"][0]["field"], "title");
}

#[tokio::test]
async fn create_associates_only_author_kind_references() {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let author = store
        .create("author", fields(json!({"name": "Frank"})))
        .await
        .unwrap();
    let not_author = seed_book(&store, "decoy").await;
    let server = make_server(&store).await;

    let response = server
        .post("/api/book/add")
        .json(&json!({
            "title": "Dune",
            "authors": [
                {"id": author.id()},
                {"id": not_author},
                {"id": Uuid::new_v4()},
            ],
        }))
        .await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    let created_id = Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();

    let stored = store.load_by_id(created_id).await.unwrap().unwrap();
    assert_eq!(stored.get("authors"), Some(&json!([author.id()])));
}

#[tokio::test]
async fn patch_answers_201_and_wipes_absent_fields() {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let id = seed_book(&store, "Dune").await;
    let server = make_server(&store).await;

    let response = server
        .patch(&format!("/api/book/{id}"))
        .json(&json!({"title": "Dune Messiah"}))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["title"], "Dune Messiah");
    assert_eq!(body["pages"], json!(null));
    assert_eq!(body["publisher"], json!(null));
    assert_eq!(body["available"], json!(null));

    // A fresh read reflects the overwrite; the never-written available
    // field coerces back to false.
    let reread: Value = server.get(&format!("/api/book/{id}")).await.json();
    assert_eq!(reread["title"], "Dune Messiah");
    assert_eq!(reread["pages"], json!(null));
    assert_eq!(reread["available"], false);
}

#[tokio::test]
async fn patch_unknown_id_is_404() {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let server = make_server(&store).await;

    let response = server
        .patch(&format!("/api/book/{}", Uuid::new_v4()))
        .json(&json!({"title": "ghost"}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_with_wrong_types_is_rejected() {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let id = seed_book(&store, "Dune").await;
    let server = make_server(&store).await;

    let response = server
        .patch(&format!("/api/book/{id}"))
        .json(&json!({"pages": -5}))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn delete_then_get_is_404() {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let id = seed_book(&store, "Dune").await;
    let server = make_server(&store).await;

    let response = server.delete(&format!("/api/book/{id}")).await;
    response.assert_status(StatusCode::NO_CONTENT);
    assert!(response.text().is_empty());

    let follow_up = server.get(&format!("/api/book/{id}")).await;
    follow_up.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_body_is_a_client_error() {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let server = make_server(&store).await;

    let response = server
        .post("/api/book/add")
        .text("{not json")
        .content_type("application/json")
        .await;
    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn healthz_is_wired() {
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let server = make_server(&store).await;

    let response = server.get("/healthz").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.text(), "ok");
}
