//! Single-document operations.
//!
//! Documents are any `Serialize` type on the way in and any
//! `DeserializeOwned` type on the way out; the descriptors are generic over
//! the document type so replies decode straight into it.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ShardStats, segment};
use crate::{
    Body, CommonParams, Endpoint, Method, OpType, Params, Probe, Refresh, Request, RequestBuilder,
    RequestDescriptor, Result, VersionType, WaitForActiveShards,
};

fn doc_path(index: &str, id: &str) -> Result<String> {
    Ok(format!(
        "/{}/_doc/{}",
        segment("index name", index)?,
        segment("document id", id)?
    ))
}

// ============================================================================
// Index
// ============================================================================

/// Parameters of [`DocumentIndex`].
#[derive(Debug, Clone, Default, PartialEq, Params)]
pub struct DocumentIndexParams {
    /// Make the write visible to search.
    pub refresh: Refresh,
    /// `create` fails when the id is taken.
    pub op_type: OpType,
    /// Custom shard routing value.
    pub routing: Option<String>,
    /// Time to wait for the primary shard.
    pub timeout: Option<Duration>,
    /// Expected version, for optimistic concurrency.
    pub version: Option<u64>,
    /// How `version` is interpreted.
    pub version_type: VersionType,
    /// Only write if the document has this sequence number.
    pub if_seq_no: Option<u64>,
    /// Only write if the document has this primary term.
    pub if_primary_term: Option<u64>,
    /// Ingest pipeline to run first.
    pub pipeline: Option<String>,
    /// The target must be an alias.
    pub require_alias: bool,
    /// Active shard copies required before writing.
    pub wait_for_active_shards: WaitForActiveShards,
    /// Flags accepted by every endpoint.
    #[param(flatten)]
    pub common: CommonParams,
}

/// Index a document: `PUT /{index}/_doc/{id}`, or `POST /{index}/_doc` to
/// let the cluster assign the id.
#[derive(Debug, Clone)]
pub struct DocumentIndex<T> {
    /// Target index or alias.
    pub index: String,
    /// Document id; generated by the cluster when `None`.
    pub id: Option<String>,
    /// The document.
    pub document: T,
    /// Query parameters.
    pub params: DocumentIndexParams,
}

impl<T> DocumentIndex<T> {
    /// Index `document` into `index` under a generated id.
    #[must_use]
    pub fn new(index: impl Into<String>, document: T) -> Self {
        Self {
            index: index.into(),
            id: None,
            document,
            params: DocumentIndexParams::default(),
        }
    }

    /// Use an explicit document id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the query parameters.
    #[must_use]
    pub fn params(mut self, params: DocumentIndexParams) -> Self {
        self.params = params;
        self
    }
}

impl<T: Serialize + Send> RequestDescriptor for DocumentIndex<T> {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        let (method, path) = match &self.id {
            Some(id) => (Method::Put, doc_path(&self.index, id)?),
            None => (
                Method::Post,
                format!("/{}/_doc", segment("index name", &self.index)?),
            ),
        };
        RequestBuilder::new(method, base_url, path)
            .encode(&self.params)
            .body(Body::json(&self.document)?)
            .build()
    }
}

impl<T: Serialize + Send> Endpoint for DocumentIndex<T> {
    type Response = WriteResponse;
}

/// Outcome of a single-document write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteResult {
    /// A new document was stored.
    Created,
    /// An existing document was replaced.
    Updated,
    /// The document was removed.
    Deleted,
    /// There was nothing to delete.
    NotFound,
    /// The write changed nothing.
    Noop,
}

impl fmt::Display for WriteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::NotFound => "not_found",
            Self::Noop => "noop",
        })
    }
}

/// Reply of [`DocumentIndex`] and [`DocumentDelete`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteResponse {
    /// Index the document lives in.
    #[serde(rename = "_index")]
    pub index: String,
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Document version after the write.
    #[serde(rename = "_version")]
    pub version: u64,
    /// What happened.
    pub result: WriteResult,
    /// Shard summary.
    #[serde(rename = "_shards")]
    pub shards: ShardStats,
    /// Sequence number assigned to the write.
    #[serde(rename = "_seq_no")]
    pub seq_no: u64,
    /// Primary term of the write.
    #[serde(rename = "_primary_term")]
    pub primary_term: u64,
    /// A refresh was forced by `refresh=true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_refresh: Option<bool>,
}

// ============================================================================
// Get
// ============================================================================

/// Parameters of [`DocumentGet`] and [`DocumentExists`].
#[derive(Debug, Clone, Default, PartialEq, Params)]
pub struct DocumentGetParams {
    /// Custom shard routing value.
    pub routing: Option<String>,
    /// Shard copy preference, e.g. `_local`.
    pub preference: Option<String>,
    /// Read from the translog instead of the last refresh.
    pub realtime: Option<bool>,
    /// Refresh the shard before reading.
    pub refresh: Option<bool>,
    /// Stored fields to return.
    pub stored_fields: Vec<String>,
    /// Source fields to return; empty returns the whole source.
    #[param(rename = "_source")]
    pub source: Vec<String>,
    /// Source fields to include.
    #[param(rename = "_source_includes")]
    pub source_includes: Vec<String>,
    /// Source fields to exclude.
    #[param(rename = "_source_excludes")]
    pub source_excludes: Vec<String>,
    /// Expected version.
    pub version: Option<u64>,
    /// How `version` is interpreted.
    pub version_type: Option<VersionType>,
    /// Flags accepted by every endpoint.
    #[param(flatten)]
    pub common: CommonParams,
}

/// `GET /{index}/_doc/{id}`.
pub struct DocumentGet<T> {
    /// Index or alias.
    pub index: String,
    /// Document id.
    pub id: String,
    /// Query parameters.
    pub params: DocumentGetParams,
    document: PhantomData<fn() -> T>,
}

impl<T> DocumentGet<T> {
    /// Fetch document `id` from `index`.
    #[must_use]
    pub fn new(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
            params: DocumentGetParams::default(),
            document: PhantomData,
        }
    }

    /// Set the query parameters.
    #[must_use]
    pub fn params(mut self, params: DocumentGetParams) -> Self {
        self.params = params;
        self
    }
}

impl<T> fmt::Debug for DocumentGet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentGet")
            .field("index", &self.index)
            .field("id", &self.id)
            .field("params", &self.params)
            .finish()
    }
}

impl<T> Clone for DocumentGet<T> {
    fn clone(&self) -> Self {
        Self {
            index: self.index.clone(),
            id: self.id.clone(),
            params: self.params.clone(),
            document: PhantomData,
        }
    }
}

impl<T> RequestDescriptor for DocumentGet<T> {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        RequestBuilder::new(Method::Get, base_url, doc_path(&self.index, &self.id)?)
            .encode(&self.params)
            .build()
    }
}

impl<T: DeserializeOwned + Send> Endpoint for DocumentGet<T> {
    type Response = GetResponse<T>;
}

/// Reply of [`DocumentGet`].
///
/// A missing document is a 404 and surfaces as an error; `found` is `true`
/// on every successful reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetResponse<T> {
    /// Index the document lives in.
    #[serde(rename = "_index")]
    pub index: String,
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Current version.
    #[serde(rename = "_version", default)]
    pub version: Option<u64>,
    /// Sequence number of the last write.
    #[serde(rename = "_seq_no", default)]
    pub seq_no: Option<u64>,
    /// Primary term of the last write.
    #[serde(rename = "_primary_term", default)]
    pub primary_term: Option<u64>,
    /// The document exists.
    pub found: bool,
    /// Routing value the document was indexed with.
    #[serde(rename = "_routing", default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<String>,
    /// The document, unless source was disabled or filtered out.
    #[serde(rename = "_source", default = "Option::default")]
    pub source: Option<T>,
}

// ============================================================================
// Exists
// ============================================================================

/// `HEAD /{index}/_doc/{id}`.
#[derive(Debug, Clone, Default)]
pub struct DocumentExists {
    /// Index or alias.
    pub index: String,
    /// Document id.
    pub id: String,
    /// Query parameters.
    pub params: DocumentGetParams,
}

impl DocumentExists {
    /// Probe document `id` in `index`.
    #[must_use]
    pub fn new(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
            params: DocumentGetParams::default(),
        }
    }

    /// Set the query parameters.
    #[must_use]
    pub fn params(mut self, params: DocumentGetParams) -> Self {
        self.params = params;
        self
    }
}

impl RequestDescriptor for DocumentExists {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        RequestBuilder::new(Method::Head, base_url, doc_path(&self.index, &self.id)?)
            .encode(&self.params)
            .build()
    }
}

impl Probe for DocumentExists {}

// ============================================================================
// Delete
// ============================================================================

/// Parameters of [`DocumentDelete`].
#[derive(Debug, Clone, Default, PartialEq, Params)]
pub struct DocumentDeleteParams {
    /// Make the delete visible to search.
    pub refresh: Refresh,
    /// Custom shard routing value.
    pub routing: Option<String>,
    /// Time to wait for the primary shard.
    pub timeout: Option<Duration>,
    /// Expected version.
    pub version: Option<u64>,
    /// How `version` is interpreted.
    pub version_type: VersionType,
    /// Only delete if the document has this sequence number.
    pub if_seq_no: Option<u64>,
    /// Only delete if the document has this primary term.
    pub if_primary_term: Option<u64>,
    /// Active shard copies required before deleting.
    pub wait_for_active_shards: WaitForActiveShards,
    /// Flags accepted by every endpoint.
    #[param(flatten)]
    pub common: CommonParams,
}

/// `DELETE /{index}/_doc/{id}`.
///
/// Deleting a missing document is a 404 with a `not_found` body; it surfaces
/// as an error carrying that body.
#[derive(Debug, Clone, Default)]
pub struct DocumentDelete {
    /// Index or alias.
    pub index: String,
    /// Document id.
    pub id: String,
    /// Query parameters.
    pub params: DocumentDeleteParams,
}

impl DocumentDelete {
    /// Delete document `id` from `index`.
    #[must_use]
    pub fn new(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
            params: DocumentDeleteParams::default(),
        }
    }

    /// Set the query parameters.
    #[must_use]
    pub fn params(mut self, params: DocumentDeleteParams) -> Self {
        self.params = params;
        self
    }
}

impl RequestDescriptor for DocumentDelete {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        RequestBuilder::new(Method::Delete, base_url, doc_path(&self.index, &self.id)?)
            .encode(&self.params)
            .build()
    }
}

impl Endpoint for DocumentDelete {
    type Response = WriteResponse;
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Book {
        title: String,
        pages: u32,
    }

    fn base() -> Url {
        Url::parse("http://localhost:9200").expect("url")
    }

    fn book() -> Book {
        Book {
            title: "Dune".to_string(),
            pages: 412,
        }
    }

    #[test]
    fn index_with_id_is_a_put() {
        let request = DocumentIndex::new("books", book())
            .id("1")
            .params(DocumentIndexParams {
                refresh: Refresh::WaitFor,
                op_type: OpType::Create,
                ..DocumentIndexParams::default()
            })
            .build_request(&base())
            .expect("request");

        check!(request.request_line() == "PUT /books/_doc/1?op_type=create&refresh=wait_for");
        check!(request.body().as_bytes() == Some(br#"{"title":"Dune","pages":412}"#.as_slice()));
    }

    #[test]
    fn index_without_id_is_a_post() {
        let request = DocumentIndex::new("books", book())
            .build_request(&base())
            .expect("request");
        check!(request.request_line() == "POST /books/_doc");
    }

    #[test]
    fn ids_are_escaped() {
        let request = DocumentGet::<Book>::new("books", "a/b c")
            .build_request(&base())
            .expect("request");
        check!(request.path() == "/books/_doc/a%2Fb%20c");
    }

    #[test]
    fn source_filters_use_underscore_keys() {
        let request = DocumentGet::<Book>::new("books", "1")
            .params(DocumentGetParams {
                source_includes: vec!["title".to_string()],
                realtime: Some(false),
                ..DocumentGetParams::default()
            })
            .build_request(&base())
            .expect("request");
        check!(request.request_line() == "GET /books/_doc/1?_source_includes=title&realtime=false");
    }

    #[test]
    fn empty_id_is_rejected() {
        let_assert!(Err(err) = DocumentDelete::new("books", "").build_request(&base()));
        check!(err.transport_kind() == Some(crate::TransportErrorKind::Build));
    }

    #[test]
    fn get_response_decodes_source() {
        let body = json!({
            "_index": "books",
            "_id": "1",
            "_version": 3,
            "_seq_no": 7,
            "_primary_term": 1,
            "found": true,
            "_source": {"title": "Dune", "pages": 412}
        });
        let response: GetResponse<Book> = serde_json::from_value(body).expect("decode");
        check!(response.version == Some(3));
        check!(response.source == Some(book()));
    }

    #[test]
    fn write_response_decodes() {
        let body = json!({
            "_index": "books",
            "_id": "1",
            "_version": 1,
            "result": "created",
            "_shards": {"total": 2, "successful": 1, "failed": 0},
            "_seq_no": 0,
            "_primary_term": 1
        });
        let response: WriteResponse = serde_json::from_value(body).expect("decode");
        check!(response.result == WriteResult::Created);
        check!(response.result.to_string() == "created");
        check!(response.forced_refresh.is_none());
    }
}
