use super::models::{CollectionIds, Document, DocumentList, DocumentMask, ListDocumentsOptions, Precondition};
use super::path;
use super::{ensure_success, Firestore, FirestoreError};
use reqwest::header;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A reference to a collection; holds a validated collection path.
#[derive(Clone)]
pub struct CollectionReference<'a> {
    pub(crate) firestore: &'a Firestore,
    pub(crate) path: String,
}

impl<'a> CollectionReference<'a> {
    pub(crate) fn new(firestore: &'a Firestore, path: String) -> Self {
        Self { firestore, path }
    }

    /// The collection id, i.e. the last path segment.
    pub fn id(&self) -> &str {
        path::last_segment(&self.path)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The document containing this subcollection, `None` for a root collection.
    pub fn parent(&self) -> Option<DocumentReference<'a>> {
        path::parent_path(&self.path)
            .map(|parent| DocumentReference::new(self.firestore, parent.to_string()))
    }

    /// Gets a `DocumentReference` relative to this collection, e.g. `"alice"` or
    /// `"alice/posts/first"`.
    pub fn doc(&self, relative_path: &str) -> Result<DocumentReference<'a>, FirestoreError> {
        let full = path::join(&self.path, relative_path);
        path::validate_document_path(&full)?;
        Ok(DocumentReference::new(self.firestore, full))
    }

    /// Creates a document in this collection.
    ///
    /// Firestore picks a random id when `document_id` is `None`.
    pub async fn create_document(
        &self,
        document_id: Option<&str>,
        document: &Document,
    ) -> Result<Document, FirestoreError> {
        let url = self.firestore.document_url(&self.path)?;
        let mut request = self
            .firestore
            .client()
            .post(url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = document_id {
            request = request.query(&[("documentId", id)]);
        }

        let response = request
            .body(serde_json::to_vec(&document.fields_body())?)
            .send()
            .await?;
        let response = ensure_success(response, "Create document failed").await?;

        let created: Document = response.json().await?;
        log::debug!("created document {:?}", created.name);
        Ok(created)
    }

    /// Creates a document with a generated id from a serializable struct.
    pub async fn add<T: Serialize>(&self, value: &T) -> Result<Document, FirestoreError> {
        let document = Document::from_serializable(value)?;
        self.create_document(None, &document).await
    }

    pub async fn list_documents(
        &self,
        options: ListDocumentsOptions,
    ) -> Result<DocumentList, FirestoreError> {
        let url = self.firestore.document_url(&self.path)?;

        let response = self
            .firestore
            .client()
            .get(url)
            .query(&options.query_pairs())
            .send()
            .await?;

        let response = ensure_success(response, "List documents failed").await?;
        Ok(response.json().await?)
    }
}

/// A reference to a document; holds a validated document path.
#[derive(Clone)]
pub struct DocumentReference<'a> {
    pub(crate) firestore: &'a Firestore,
    pub(crate) path: String,
}

impl<'a> DocumentReference<'a> {
    pub(crate) fn new(firestore: &'a Firestore, path: String) -> Self {
        Self { firestore, path }
    }

    /// The document id, i.e. the last path segment.
    pub fn id(&self) -> &str {
        path::last_segment(&self.path)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Full resource name, suitable for [`Value::reference`](super::value::Value::reference).
    pub fn resource_name(&self) -> String {
        self.firestore.resource_name(&self.path)
    }

    /// The collection containing this document.
    pub fn parent(&self) -> CollectionReference<'a> {
        let parent = path::parent_path(&self.path).unwrap_or_default();
        CollectionReference::new(self.firestore, parent.to_string())
    }

    /// Gets a subcollection relative to this document, e.g. `"posts"`.
    pub fn collection(&self, relative_path: &str) -> Result<CollectionReference<'a>, FirestoreError> {
        let full = path::join(&self.path, relative_path);
        path::validate_collection_path(&full)?;
        Ok(CollectionReference::new(self.firestore, full))
    }

    /// Reads the document. Returns `Ok(None)` if it does not exist.
    pub async fn get(&self) -> Result<Option<Document>, FirestoreError> {
        let url = self.firestore.document_url(&self.path)?;
        let response = self.firestore.client().get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = ensure_success(response, "Get document failed").await?;
        let doc: Document = response.json().await?;
        Ok(doc.exists().then_some(doc))
    }

    /// Reads the document and deserializes its fields into `T`.
    pub async fn get_as<T: DeserializeOwned>(&self) -> Result<Option<T>, FirestoreError> {
        match self.get().await? {
            Some(doc) => doc.data(),
            None => Ok(None),
        }
    }

    /// Writes `document`'s fields.
    ///
    /// With a mask only the listed field paths change; without one the stored fields
    /// are replaced. A precondition makes the write fail unless it holds.
    pub async fn update(
        &self,
        document: &Document,
        mask: Option<DocumentMask>,
        precondition: Option<Precondition>,
    ) -> Result<Document, FirestoreError> {
        let url = self.firestore.document_url(&self.path)?;

        let mut params = Vec::new();
        if let Some(mask) = mask {
            for field in mask.field_paths {
                params.push(("updateMask.fieldPaths".to_string(), field));
            }
        }
        if let Some(precondition) = precondition {
            params.push(precondition.query_pair());
        }

        let response = self
            .firestore
            .client()
            .patch(url)
            .query(&params)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&document.fields_body())?)
            .send()
            .await?;

        let response = ensure_success(response, "Update document failed").await?;
        Ok(response.json().await?)
    }

    /// Overwrites the document, creating it if needed.
    pub async fn set(&self, document: &Document) -> Result<Document, FirestoreError> {
        self.update(document, None, None).await
    }

    /// Overwrites the document with the fields of a serializable struct.
    pub async fn set_from<T: Serialize>(&self, value: &T) -> Result<Document, FirestoreError> {
        self.set(&Document::from_serializable(value)?).await
    }

    pub async fn delete(&self) -> Result<(), FirestoreError> {
        let url = self.firestore.document_url(&self.path)?;
        let response = self.firestore.client().delete(url).send().await?;

        ensure_success(response, "Delete document failed").await?;
        log::debug!("deleted document {}", self.path);
        Ok(())
    }

    /// Lists the ids of this document's subcollections, one page at a time.
    pub async fn list_collection_ids(
        &self,
        page_size: Option<i32>,
        page_token: Option<&str>,
    ) -> Result<CollectionIds, FirestoreError> {
        let url = self.firestore.method_url(&self.path, "listCollectionIds")?;
        self.firestore
            .post_list_collection_ids(url, page_size, page_token)
            .await
    }
}
