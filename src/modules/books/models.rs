//! Book record mapper: converts stored entities to the transport shape and
//! back, and owns the persistence rules for the book kind.

use folio_kernel::schema::{FieldSpec, FieldType, KindDef};
use folio_store::{Entity, EntityStore, StoreError};
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Storage kind backing the book resource.
pub const BOOK_KIND: &str = "book";
/// Storage kind referenced by a book's author list.
pub const AUTHOR_KIND: &str = "author";

/// Field manifest for the book kind. Drives payload validation and kind
/// registration at boot; the mapper below reads and writes exactly these
/// fields, so there is no reflective property walking anywhere.
pub const BOOK_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("title", FieldType::Text),
    FieldSpec::optional("pages", FieldType::Integer),
    FieldSpec::optional("publisher", FieldType::Text),
    FieldSpec::optional("available", FieldType::Boolean),
    FieldSpec::optional("authors", FieldType::References),
];

/// Minimal manifest for authors; the book resource only ever checks the kind.
pub const AUTHOR_FIELDS: &[FieldSpec] = &[FieldSpec::required("name", FieldType::Text)];

/// Content kinds the books module manages.
pub fn content_kinds() -> Vec<KindDef> {
    vec![
        KindDef {
            kind: BOOK_KIND,
            fields: BOOK_FIELDS,
        },
        KindDef {
            kind: AUTHOR_KIND,
            fields: AUTHOR_FIELDS,
        },
    ]
}

/// Reference to an author entity, transported as `{"id": "..."}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthorRef {
    pub id: Uuid,
}

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("entity {id} has kind '{kind}', expected '{BOOK_KIND}'")]
    KindMismatch { id: Uuid, kind: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Transport and domain record for a book. Every field serializes by name,
/// absent fields serialize as null; no renaming or omission.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Book {
    pub id: Option<Uuid>,
    pub title: Option<String>,
    pub pages: Option<u64>,
    pub publisher: Option<String>,
    pub available: Option<bool>,
    pub authors: Vec<AuthorRef>,
}

impl Book {
    /// Build a record from a stored entity. `available` coerces to false
    /// when the field was never written. Authors are not hydrated.
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            id: Some(entity.id()),
            title: entity.get("title").and_then(Value::as_str).map(str::to_owned),
            pages: entity.get("pages").and_then(Value::as_u64),
            publisher: entity
                .get("publisher")
                .and_then(Value::as_str)
                .map(str::to_owned),
            available: Some(
                entity
                    .get("available")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            ),
            authors: Vec::new(),
        }
    }

    /// Overwrite every known field from the payload. Fields absent from the
    /// payload are wiped to null; this is a wholesale replacement, not a
    /// sparse merge. The id is never taken from a payload.
    pub fn apply_partial(&mut self, payload: &Map<String, Value>) {
        self.title = payload
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_owned);
        self.pages = payload.get("pages").and_then(Value::as_u64);
        self.publisher = payload
            .get("publisher")
            .and_then(Value::as_str)
            .map(str::to_owned);
        self.available = payload.get("available").and_then(Value::as_bool);
        self.authors = payload
            .get("authors")
            .and_then(Value::as_array)
            .map(|refs| refs.iter().filter_map(author_ref).collect())
            .unwrap_or_default();
    }

    /// Write the scalar fields back onto the entity and save it. Entities of
    /// any other kind are refused with an explicit error rather than being
    /// silently ignored.
    pub async fn persist_update(
        &self,
        entity: &mut Entity,
        store: &dyn EntityStore,
    ) -> Result<(), MapperError> {
        if entity.kind() != BOOK_KIND {
            tracing::warn!(
                id = %entity.id(),
                kind = entity.kind(),
                "refusing book update on entity of another kind"
            );
            return Err(MapperError::KindMismatch {
                id: entity.id(),
                kind: entity.kind().to_owned(),
            });
        }

        for (name, value) in self.scalar_fields() {
            entity.set(name, value);
        }
        // TODO: update author linkage once author hydration lands.
        store.save(entity).await?;

        Ok(())
    }

    /// Create and save a new book entity. Author references resolving to an
    /// `author` entity are associated; unknown ids and other kinds are
    /// skipped with a warning.
    pub async fn persist_new(&self, store: &dyn EntityStore) -> Result<Entity, MapperError> {
        let mut fields = self.scalar_fields();

        let mut author_ids = Vec::new();
        for reference in &self.authors {
            match store.load_by_id(reference.id).await? {
                Some(author) if author.kind() == AUTHOR_KIND => {
                    author_ids.push(json!(author.id()));
                }
                Some(other) => {
                    tracing::warn!(
                        id = %other.id(),
                        kind = other.kind(),
                        "skipping author reference of another kind"
                    );
                }
                None => {
                    tracing::warn!(id = %reference.id, "skipping unknown author reference");
                }
            }
        }
        fields.insert("authors".into(), Value::Array(author_ids));

        let entity = store.create(BOOK_KIND, fields).await?;
        Ok(entity)
    }

    /// The four scalar fields as stored on a book entity.
    fn scalar_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("title".into(), json!(self.title));
        fields.insert("available".into(), json!(self.available));
        fields.insert("pages".into(), json!(self.pages));
        fields.insert("publisher".into(), json!(self.publisher));
        fields
    }
}

fn author_ref(value: &Value) -> Option<AuthorRef> {
    let id = value.get("id")?.as_str()?;
    Uuid::parse_str(id).ok().map(|id| AuthorRef { id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_store::memory::MemoryStore;
    use serde_json::json;

    fn book_fields() -> Map<String, Value> {
        json!({
            "title": "Dune",
            "pages": 412,
            "publisher": "Chilton",
            "available": true,
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[tokio::test]
    async fn round_trip_reproduces_scalar_fields() {
        let store = MemoryStore::new();
        let entity = store.create(BOOK_KIND, book_fields()).await.unwrap();

        let transport = serde_json::to_value(Book::from_entity(&entity)).unwrap();

        assert_eq!(transport["id"], json!(entity.id()));
        assert_eq!(transport["title"], json!("Dune"));
        assert_eq!(transport["pages"], json!(412));
        assert_eq!(transport["publisher"], json!("Chilton"));
        assert_eq!(transport["available"], json!(true));
        assert_eq!(transport["authors"], json!([]));
    }

    #[tokio::test]
    async fn available_defaults_to_false_when_never_written() {
        let store = MemoryStore::new();
        let entity = store
            .create(BOOK_KIND, json!({"title": "t"}).as_object().cloned().unwrap())
            .await
            .unwrap();

        let book = Book::from_entity(&entity);
        assert_eq!(book.available, Some(false));
    }

    #[test]
    fn apply_partial_wipes_absent_fields() {
        let mut book = Book {
            id: None,
            title: Some("Dune".into()),
            pages: Some(412),
            publisher: Some("Chilton".into()),
            available: Some(true),
            authors: vec![AuthorRef { id: Uuid::new_v4() }],
        };

        let payload = json!({"title": "Dune Messiah"}).as_object().cloned().unwrap();
        book.apply_partial(&payload);

        let transport = serde_json::to_value(&book).unwrap();
        assert_eq!(transport["title"], json!("Dune Messiah"));
        assert_eq!(transport["pages"], json!(null));
        assert_eq!(transport["publisher"], json!(null));
        assert_eq!(transport["available"], json!(null));
        assert_eq!(transport["authors"], json!([]));
    }

    #[tokio::test]
    async fn page_counts_beyond_32_bits_survive_unchanged() {
        let store = MemoryStore::new();

        let mut book = Book::default();
        book.apply_partial(
            json!({"title": "t", "pages": 4_294_967_297u64})
                .as_object()
                .unwrap(),
        );
        assert_eq!(book.pages, Some(4_294_967_297));

        let entity = book.persist_new(&store).await.unwrap();
        assert_eq!(Book::from_entity(&entity).pages, Some(4_294_967_297));
    }

    #[test]
    fn apply_partial_never_takes_an_id() {
        let mut book = Book::default();
        let payload = json!({"id": Uuid::new_v4(), "title": "t"})
            .as_object()
            .cloned()
            .unwrap();
        book.apply_partial(&payload);
        assert_eq!(book.id, None);
    }

    #[tokio::test]
    async fn persist_update_rejects_wrong_kind_without_writing() {
        let store = MemoryStore::new();
        let mut entity = store
            .create(AUTHOR_KIND, json!({"name": "Frank"}).as_object().cloned().unwrap())
            .await
            .unwrap();

        let mut book = Book::default();
        book.apply_partial(&json!({"title": "hijack"}).as_object().cloned().unwrap());

        let err = book.persist_update(&mut entity, &store).await.unwrap_err();
        assert!(matches!(err, MapperError::KindMismatch { .. }));

        // Storage is untouched.
        let stored = store.load_by_id(entity.id()).await.unwrap().unwrap();
        assert_eq!(stored.get("name"), Some(&json!("Frank")));
        assert_eq!(stored.get("title"), None);
    }

    #[tokio::test]
    async fn persist_update_writes_all_scalars() {
        let store = MemoryStore::new();
        let mut entity = store.create(BOOK_KIND, book_fields()).await.unwrap();

        let mut book = Book::from_entity(&entity);
        book.apply_partial(&json!({"title": "Dune Messiah"}).as_object().cloned().unwrap());
        book.persist_update(&mut entity, &store).await.unwrap();

        let stored = store.load_by_id(entity.id()).await.unwrap().unwrap();
        assert_eq!(stored.get("title"), Some(&json!("Dune Messiah")));
        // Full-overwrite semantics reach storage too.
        assert_eq!(stored.get("pages"), Some(&json!(null)));
        assert_eq!(stored.get("publisher"), Some(&json!(null)));
        assert_eq!(stored.get("available"), Some(&json!(null)));
    }

    #[tokio::test]
    async fn persist_new_associates_only_real_authors() {
        let store = MemoryStore::new();
        let author = store
            .create(AUTHOR_KIND, json!({"name": "Frank"}).as_object().cloned().unwrap())
            .await
            .unwrap();
        let impostor = store.create(BOOK_KIND, book_fields()).await.unwrap();

        let mut book = Book::default();
        book.apply_partial(
            json!({
                "title": "Dune",
                "authors": [
                    {"id": author.id()},
                    {"id": impostor.id()},
                    {"id": Uuid::new_v4()},
                ],
            })
            .as_object()
            .unwrap(),
        );

        let entity = book.persist_new(&store).await.unwrap();
        assert_eq!(entity.kind(), BOOK_KIND);
        assert_eq!(entity.get("authors"), Some(&json!([author.id()])));

        // The created entity is persisted and readable back.
        let stored = store.load_by_id(entity.id()).await.unwrap().unwrap();
        assert_eq!(stored.get("title"), Some(&json!("Dune")));
    }

    #[test]
    fn author_refs_without_valid_ids_are_dropped() {
        let mut book = Book::default();
        book.apply_partial(
            json!({"authors": [{"id": "not-a-uuid"}, "junk", {"name": "x"}]})
                .as_object()
                .unwrap(),
        );
        assert!(book.authors.is_empty());
    }
}
