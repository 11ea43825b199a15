pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use folio_http::error::AppError;
use folio_kernel::schema::{check_payload, KindDef};
use folio_kernel::{InitCtx, Module};
use folio_store::{Entity, EntityStore, StoreError};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use models::{Book, MapperError, BOOK_FIELDS, BOOK_KIND};

type Store = Arc<dyn EntityStore>;

/// REST resource for the book content kind
pub struct BooksModule {
    store: Store,
}

impl BooksModule {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "book"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "book module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/all", get(list_books))
            .route("/add", post(create_book))
            .route(
                "/{id}",
                get(get_book).patch(update_book).delete(delete_book),
            )
            .with_state(self.store.clone())
    }

    fn openapi(&self) -> Option<Value> {
        Some(json!({
            "paths": {
                "/all": {
                    "get": {
                        "summary": "List all books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "List of books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/add": {
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookPayload" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Created book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "422": {
                                "description": "Payload failed validation",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": [{
                            "name": "id",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string", "format": "uuid" }
                        }],
                        "responses": {
                            "200": {
                                "description": "Book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "404": {
                                "description": "No book with this id",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    },
                    "patch": {
                        "summary": "Replace a book's fields",
                        "tags": ["Books"],
                        "parameters": [{
                            "name": "id",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string", "format": "uuid" }
                        }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookPayload" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Updated book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "404": {
                                "description": "No book with this id",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [{
                            "name": "id",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string", "format": "uuid" }
                        }],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "404": {
                                "description": "No book with this id",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "string",
                                "format": "uuid",
                                "nullable": true,
                                "description": "Storage-assigned identifier"
                            },
                            "title": { "type": "string", "nullable": true },
                            "pages": { "type": "integer", "minimum": 0, "nullable": true },
                            "publisher": { "type": "string", "nullable": true },
                            "available": { "type": "boolean", "nullable": true },
                            "authors": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/AuthorRef" }
                            }
                        },
                        "required": ["id", "title", "pages", "publisher", "available", "authors"]
                    },
                    "BookPayload": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "pages": { "type": "integer", "minimum": 0 },
                            "publisher": { "type": "string" },
                            "available": { "type": "boolean" },
                            "authors": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/AuthorRef" }
                            }
                        }
                    },
                    "AuthorRef": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" }
                        },
                        "required": ["id"]
                    }
                }
            }
        }))
    }

    fn content_kinds(&self) -> Vec<KindDef> {
        models::content_kinds()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "book module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "book module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(store: Store) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}

/// List every stored book in storage iteration order
async fn list_books(State(store): State<Store>) -> Result<Json<Vec<Book>>, AppError> {
    let entities = store
        .load_all_by_kind(BOOK_KIND)
        .await
        .map_err(store_error)?;

    Ok(Json(entities.iter().map(Book::from_entity).collect()))
}

/// Get a single book by id
async fn get_book(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Json<Book>, AppError> {
    let entity = resolve_book(store.as_ref(), id).await?;
    Ok(Json(Book::from_entity(&entity)))
}

/// Create a book. Answers 200 rather than 201; existing clients depend
/// on that.
async fn create_book(
    State(store): State<Store>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<Book>, AppError> {
    let violations = check_payload(BOOK_FIELDS, &payload, true);
    if !violations.is_empty() {
        return Err(AppError::validation(
            violations,
            "book payload failed validation",
        ));
    }

    let mut book = Book::default();
    book.apply_partial(&payload);

    let entity = book.persist_new(store.as_ref()).await.map_err(mapper_error)?;
    Ok(Json(Book::from_entity(&entity)))
}

/// Replace a book's fields wholesale and answer 201 with the result
async fn update_book(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let mut entity = resolve_book(store.as_ref(), id).await?;

    let violations = check_payload(BOOK_FIELDS, &payload, false);
    if !violations.is_empty() {
        return Err(AppError::validation(
            violations,
            "book payload failed validation",
        ));
    }

    let mut book = Book::from_entity(&entity);
    book.apply_partial(&payload);
    book.persist_update(&mut entity, store.as_ref())
        .await
        .map_err(mapper_error)?;

    Ok((StatusCode::CREATED, Json(book)))
}

/// Hard-delete a book
async fn delete_book(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let entity = resolve_book(store.as_ref(), id).await?;
    store.delete(&entity).await.map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Resolve `{id}` to a book entity. Missing ids and entities of another
/// kind both answer 404, the route-level kind constraint.
async fn resolve_book(store: &dyn EntityStore, id: Uuid) -> Result<Entity, AppError> {
    match store.load_by_id(id).await.map_err(store_error)? {
        Some(entity) if entity.kind() == BOOK_KIND => Ok(entity),
        _ => Err(AppError::not_found(format!("no book with id {id}"))),
    }
}

fn store_error(err: StoreError) -> AppError {
    AppError::Internal(err.into())
}

fn mapper_error(err: MapperError) -> AppError {
    match err {
        MapperError::KindMismatch { .. } => AppError::bad_request(err.to_string()),
        MapperError::Store(e) => AppError::Internal(e.into()),
    }
}
