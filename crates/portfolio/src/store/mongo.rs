use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document as BsonDocument};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use serde_json::Value;

use super::{
    Document, DocumentStore, Filter, FindOptions, IndexSpec, InsertOutcome, SortOrder,
    StoreError, UpdateOutcome,
};
use crate::config::StoreConfig;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB-backed store. Documents keep their application `id`; the driver's `_id` is
/// stripped on the way out.
#[derive(Debug, Clone)]
pub struct MongoDocumentStore {
    client: Client,
    database: Database,
}

impl MongoDocumentStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(&config.url)
            .await
            .map_err(map_error)?;
        let database = client.database(&config.database);
        Ok(Self { client, database })
    }

    fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.database.collection(name)
    }
}

fn map_error(err: mongodb::error::Error) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => {
            write_error(write.code, &write.message)
        }
        ErrorKind::ServerSelection { message, .. } => StoreError::Unavailable(message.clone()),
        _ => StoreError::Backend(err.to_string()),
    }
}

fn write_error(code: i32, message: &str) -> StoreError {
    if code == DUPLICATE_KEY_CODE {
        StoreError::DuplicateKey(message.to_string())
    } else {
        StoreError::Backend(format!("write failed with code {code}: {message}"))
    }
}

fn to_bson(document: Document) -> Result<BsonDocument, StoreError> {
    bson::to_document(&Value::Object(document))
        .map_err(|err| StoreError::Serialization(err.to_string()))
}

fn from_bson(mut document: BsonDocument) -> Result<Document, StoreError> {
    document.remove("_id");
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Corrupt(format!("expected object, found {other}"))),
    }
}

fn direction(order: SortOrder) -> i32 {
    match order {
        SortOrder::Ascending => 1,
        SortOrder::Descending => -1,
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(map_error)
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<InsertOutcome, StoreError> {
        let document = to_bson(document)?;
        let result = self
            .collection(collection)
            .insert_one(document)
            .await
            .map_err(map_error)?;
        Ok(InsertOutcome {
            acknowledged: !matches!(result.inserted_id, Bson::Null),
        })
    }

    async fn find(
        &self,
        collection: &str,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let mut query = self.collection(collection).find(to_bson(filter)?);
        if let Some((field, order)) = options.sort {
            let mut sort = BsonDocument::new();
            sort.insert(field, direction(order));
            query = query.sort(sort);
        }
        if let Some(limit) = options.limit {
            query = query.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let cursor = query.await.map_err(map_error)?;
        let documents: Vec<BsonDocument> = cursor.try_collect().await.map_err(map_error)?;
        documents.into_iter().map(from_bson).collect()
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Filter,
    ) -> Result<Option<Document>, StoreError> {
        self.collection(collection)
            .find_one(to_bson(filter)?)
            .await
            .map_err(map_error)?
            .map(from_bson)
            .transpose()
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let result = self
            .collection(collection)
            .update_one(to_bson(filter)?, doc! { "$set": to_bson(set)? })
            .await
            .map_err(map_error)?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn create_index(&self, collection: &str, index: IndexSpec) -> Result<(), StoreError> {
        let mut keys = BsonDocument::new();
        keys.insert(index.field, direction(index.order));
        let model = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(index.unique).build())
            .build();

        self.collection(collection)
            .create_index(model)
            .await
            .map(|_| ())
            .map_err(map_error)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::{ContactId, ContactRecord, NewContact};
    use crate::store::encode;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use mongodb::bson::oid::ObjectId;

    fn record_at(created_at: DateTime<Utc>) -> Document {
        let contact = NewContact {
            name: "Mongo Student".to_string(),
            email: "mongo@chess.org".to_string(),
            phone: Some("+1-555-0100".to_string()),
            experience: None,
            message: "Checking how records are stored".to_string(),
        };
        encode(&ContactRecord::from_new(
            contact,
            ContactId::generate(),
            created_at,
        ))
        .expect("encode record")
    }

    #[test]
    fn duplicate_key_writes_map_to_duplicate_key() {
        match write_error(DUPLICATE_KEY_CODE, "E11000 duplicate key error") {
            StoreError::DuplicateKey(message) => assert!(message.starts_with("E11000")),
            other => panic!("expected duplicate key, got {other:?}"),
        }
        match write_error(121, "document failed validation") {
            StoreError::Backend(message) => assert!(message.contains("121")),
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[test]
    fn io_failures_map_to_backend_errors() {
        let err = mongodb::error::Error::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset by peer",
        ));
        match map_error(err) {
            StoreError::Backend(message) => assert!(message.contains("reset by peer")),
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[test]
    fn direction_follows_sort_order() {
        assert_eq!(direction(SortOrder::Ascending), 1);
        assert_eq!(direction(SortOrder::Descending), -1);
    }

    #[test]
    fn encoded_records_convert_to_bson() {
        let document = record_at(Utc::now());

        let bson = to_bson(document.clone()).expect("to bson");

        assert_eq!(bson.get_str("status").ok(), Some("new"));
        assert_eq!(bson.get_str("id").ok(), document.get("id").and_then(Value::as_str));
        assert!(!bson.contains_key("experience"));
    }

    #[test]
    fn driver_ids_are_stripped_on_read() {
        let mut stored = to_bson(record_at(Utc::now())).expect("to bson");
        stored.insert("_id", ObjectId::new());

        let document = from_bson(stored).expect("from bson");

        assert!(!document.contains_key("_id"));
        assert_eq!(document.get("status"), Some(&Value::from("new")));
        assert!(document.get("createdAt").is_some_and(Value::is_string));
    }

    #[test]
    fn stored_creation_times_sort_bytewise_within_a_second() {
        let second = Utc
            .with_ymd_and_hms(2025, 10, 1, 10, 0, 0)
            .single()
            .expect("valid timestamp");
        let pairs = [
            (second, second + Duration::microseconds(1)),
            (
                second + Duration::microseconds(500_000),
                second + Duration::microseconds(500_123),
            ),
        ];

        for (earlier, later) in pairs {
            let earlier = to_bson(record_at(earlier)).expect("to bson");
            let later = to_bson(record_at(later)).expect("to bson");
            let earlier = earlier.get_str("createdAt").expect("createdAt string");
            let later = later.get_str("createdAt").expect("createdAt string");
            assert!(later > earlier, "{later} should sort after {earlier}");
        }
    }
}
