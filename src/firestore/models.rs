use super::value::{fields_from_serializable, fields_into, Value};
use super::FirestoreError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A Firestore document.
///
/// Documents read from the server carry their full resource name and timestamps;
/// documents built locally for writes usually only carry fields.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Self {
            fields: Some(fields),
            ..Default::default()
        }
    }

    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    /// Builds a document from any struct that serializes to a JSON object.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, FirestoreError> {
        Ok(Self::new(fields_from_serializable(value)?))
    }

    /// `true` when the document has both a name and fields.
    pub fn exists(&self) -> bool {
        self.name.is_some() && self.fields.is_some()
    }

    /// The last segment of the resource name.
    pub fn id(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(|name| name.rsplit_once('/').map_or(name, |(_, id)| id))
    }

    pub fn fields(&self) -> Option<&HashMap<String, Value>> {
        self.fields.as_ref()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.as_ref().and_then(|fields| fields.get(field))
    }

    /// Deserializes the fields into `T`. Returns `Ok(None)` if the document does not exist.
    pub fn data<T: DeserializeOwned>(&self) -> Result<Option<T>, FirestoreError> {
        match &self.fields {
            Some(fields) if self.exists() => Ok(Some(fields_into(fields.clone())?)),
            _ => Ok(None),
        }
    }

    /// The request body for single-document writes: fields only, borrowed.
    pub(crate) fn fields_body(&self) -> FieldsBody<'_> {
        FieldsBody {
            fields: self.fields.as_ref(),
        }
    }

    /// Copies the fields under a new resource name, dropping server timestamps.
    pub(crate) fn renamed(&self, name: String) -> Self {
        Self {
            name: Some(name),
            fields: Some(self.fields.clone().unwrap_or_default()),
            create_time: None,
            update_time: None,
        }
    }
}

/// A [`Document`] stripped of its name and server timestamps, which create and
/// patch requests must not carry.
#[derive(Serialize, Debug)]
pub(crate) struct FieldsBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<&'a HashMap<String, Value>>,
}

/// Accumulates fields for a new [`Document`].
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    fields: HashMap<String, Value>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(fields: HashMap<String, Value>) -> Self {
        Self { fields }
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn fields<I, K>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    pub fn current_fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn build(self) -> Document {
        Document::new(self.fields)
    }
}

/// The set of field paths an update touches.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    pub field_paths: Vec<String>,
}

impl DocumentMask {
    pub fn new<I, S>(field_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_paths: field_paths.into_iter().map(Into::into).collect(),
        }
    }
}

/// A condition on the stored document that a write requires.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Precondition {
    /// The document must (or must not) exist.
    Exists(bool),
    /// The document must have last been updated at exactly this time.
    UpdateTime(String),
}

impl Precondition {
    /// The query parameter used by single-document REST calls.
    pub(crate) fn query_pair(&self) -> (String, String) {
        match self {
            Precondition::Exists(exists) => ("currentDocument.exists".to_string(), exists.to_string()),
            Precondition::UpdateTime(time) => ("currentDocument.updateTime".to_string(), time.clone()),
        }
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct ListDocumentsOptions {
    pub page_size: Option<i32>,
    pub page_token: Option<String>,
    pub order_by: Option<String>,
}

impl ListDocumentsOptions {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(size) = self.page_size {
            params.push(("pageSize", size.to_string()));
        }
        if let Some(token) = &self.page_token {
            params.push(("pageToken", token.clone()));
        }
        if let Some(order_by) = &self.order_by {
            params.push(("orderBy", order_by.clone()));
        }
        params
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<Document>,
    pub next_page_token: Option<String>,
}

#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListCollectionIdsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CollectionIds {
    #[serde(default)]
    pub collection_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub enum WriteOperation {
    Update(Document),
    /// Resource name of the document to delete.
    Delete(String),
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    #[serde(flatten)]
    pub operation: WriteOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<DocumentMask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_document: Option<Precondition>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    pub writes: Vec<Write>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    #[serde(default)]
    pub write_results: Vec<WriteResult>,
    pub commit_time: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    pub update_time: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct BeginTransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<super::transaction::TransactionOptions>,
}

#[derive(Deserialize, Debug)]
pub struct BeginTransactionResponse {
    pub transaction: String,
}

#[derive(Serialize, Debug)]
pub struct RollbackRequest {
    pub transaction: String,
}
