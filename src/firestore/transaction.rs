use super::models::{
    CommitRequest, CommitResponse, Document, DocumentMask, Precondition, RollbackRequest, Write,
    WriteOperation,
};
use super::reference::DocumentReference;
use super::value::format_timestamp;
use super::{ensure_success, Firestore, FirestoreError};
use chrono::{DateTime, Utc};
use reqwest::header;
use serde::{Serialize, Serializer};

/// Options for [`Firestore::begin_transaction`].
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum TransactionOptions {
    /// Reads only, optionally at a fixed point in time.
    ReadOnly {
        #[serde(
            rename = "readTime",
            skip_serializing_if = "Option::is_none",
            serialize_with = "serialize_read_time"
        )]
        read_time: Option<DateTime<Utc>>,
    },
    /// Reads and writes, optionally retrying an earlier transaction.
    ReadWrite {
        #[serde(rename = "retryTransaction", skip_serializing_if = "Option::is_none")]
        retry_transaction: Option<String>,
    },
}

impl TransactionOptions {
    pub fn read_only() -> Self {
        TransactionOptions::ReadOnly { read_time: None }
    }

    pub fn read_only_at(read_time: DateTime<Utc>) -> Self {
        TransactionOptions::ReadOnly {
            read_time: Some(read_time),
        }
    }

    pub fn read_write() -> Self {
        TransactionOptions::ReadWrite {
            retry_transaction: None,
        }
    }

    /// Retries the transaction with the given id.
    pub fn retry(transaction_id: impl Into<String>) -> Self {
        TransactionOptions::ReadWrite {
            retry_transaction: Some(transaction_id.into()),
        }
    }
}

fn serialize_read_time<S: Serializer>(
    read_time: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match read_time {
        Some(time) => serializer.serialize_str(&format_timestamp(time)),
        None => serializer.serialize_none(),
    }
}

/// A Firestore transaction.
///
/// Reads go to the server immediately; writes are buffered until [`commit`](Self::commit).
pub struct Transaction<'a> {
    firestore: &'a Firestore,
    transaction_id: String,
    writes: Vec<Write>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(firestore: &'a Firestore, transaction_id: String) -> Self {
        Self {
            firestore,
            transaction_id,
            writes: Vec::new(),
        }
    }

    /// The server-assigned transaction id.
    pub fn id(&self) -> &str {
        &self.transaction_id
    }

    /// Number of buffered writes.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Reads a document within the transaction. Returns `Ok(None)` if it does not exist.
    pub async fn get(
        &self,
        doc_ref: &DocumentReference<'_>,
    ) -> Result<Option<Document>, FirestoreError> {
        let url = self.firestore.document_url(doc_ref.path())?;
        let response = self
            .firestore
            .client()
            .get(url)
            .query(&[("transaction", &self.transaction_id)])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = ensure_success(response, "Transaction get document failed").await?;
        let doc: Document = response.json().await?;
        Ok(doc.exists().then_some(doc))
    }

    /// Buffers a write of `document`'s fields to `doc_ref`.
    pub fn update(
        &mut self,
        doc_ref: &DocumentReference<'_>,
        document: &Document,
        mask: Option<DocumentMask>,
        precondition: Option<Precondition>,
    ) {
        let document = document.renamed(doc_ref.resource_name());
        self.writes.push(Write {
            operation: WriteOperation::Update(document),
            update_mask: mask,
            current_document: precondition,
        });
    }

    /// Buffers a full overwrite of `doc_ref`.
    pub fn set(&mut self, doc_ref: &DocumentReference<'_>, document: &Document) {
        self.update(doc_ref, document, None, None);
    }

    /// Buffers a delete of `doc_ref`.
    pub fn delete(&mut self, doc_ref: &DocumentReference<'_>) {
        self.writes.push(Write {
            operation: WriteOperation::Delete(doc_ref.resource_name()),
            update_mask: None,
            current_document: None,
        });
    }

    /// Commits the buffered writes atomically.
    pub async fn commit(self) -> Result<CommitResponse, FirestoreError> {
        let url = self.firestore.method_url("", "commit")?;
        let request = CommitRequest {
            transaction: Some(self.transaction_id),
            writes: self.writes,
        };

        let response = self
            .firestore
            .client()
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        let response = ensure_success(response, "Commit transaction failed").await?;
        Ok(response.json().await?)
    }

    /// Abandons the transaction, discarding buffered writes.
    pub async fn rollback(self) -> Result<(), FirestoreError> {
        let url = self.firestore.method_url("", "rollback")?;
        let request = RollbackRequest {
            transaction: self.transaction_id,
        };

        let response = self
            .firestore
            .client()
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        ensure_success(response, "Rollback transaction failed").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_options_wire_format() {
        assert_eq!(
            serde_json::to_value(TransactionOptions::read_write()).unwrap(),
            json!({ "readWrite": {} })
        );
        assert_eq!(
            serde_json::to_value(TransactionOptions::retry("abc")).unwrap(),
            json!({ "readWrite": { "retryTransaction": "abc" } })
        );
        let at = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            serde_json::to_value(TransactionOptions::read_only_at(at)).unwrap(),
            json!({ "readOnly": { "readTime": "2021-01-01T00:00:00Z" } })
        );
    }
}
