//! [`DocumentStore`] backed by the Firestore REST API (v1).

pub mod auth;
pub mod value;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{
    document::{Document, Fields},
    error::StoreError,
    path::{CollectionPath, DocPath},
    DocumentStore, WriteMode,
};

use self::auth::{ServiceAccountKey, TokenSource};

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const LIST_PAGE_SIZE: &str = "300";
/// Token the emulator accepts as an administrator bypassing security rules.
const EMULATOR_TOKEN: &str = "owner";

pub struct FirestoreStore {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    tokens: TokenSource,
}

#[derive(Deserialize)]
struct RestDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RestDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl FirestoreStore {
    /// Creates a store for the `(default)` database of `project_id` on the public endpoint.
    pub fn new(project_id: impl Into<String>, tokens: TokenSource) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, project_id, tokens)
    }

    /// Creates a store against a custom API root such as a proxy or a mock server.
    pub fn with_base_url(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        tokens: TokenSource,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            tokens,
        }
    }

    /// Creates a store on the public endpoint authenticated as a service account. Token
    /// exchange and API calls share one HTTP client.
    pub fn with_service_account(project_id: impl Into<String>, key: ServiceAccountKey) -> Self {
        let client = reqwest::Client::new();

        Self {
            tokens: TokenSource::service_account(key, client.clone()),
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
        }
    }

    /// Creates a store talking to a local emulator, e.g. `localhost:8080`.
    pub fn emulator(host: &str, project_id: impl Into<String>) -> Self {
        Self::with_base_url(
            format!("http://{host}/v1"),
            project_id,
            TokenSource::Static(EMULATOR_TOKEN.to_string()),
        )
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn documents_root(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    /// Builds `{base}/projects/{p}/databases/(default)/documents/{segments...}`.
    fn url_for(&self, segments: &[String]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StoreError::UnexpectedResponse(format!("invalid base URL: {e}")))?;
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                StoreError::UnexpectedResponse(format!(
                    "base URL {} cannot carry a path",
                    self.base_url
                ))
            })?;
            path.pop_if_empty()
                .extend([
                    "projects",
                    self.project_id.as_str(),
                    "databases",
                    "(default)",
                    "documents",
                ])
                .extend(segments);
        }
        Ok(url)
    }

    fn doc_url(&self, path: &DocPath) -> Result<Url, StoreError> {
        let mut segments = path.parent().segments().to_vec();
        segments.push(path.id().to_string());
        self.url_for(&segments)
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, StoreError> {
        let builder = self.client.request(method, url);
        Ok(match self.tokens.bearer().await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Turns a full resource name back into a [`DocPath`].
    fn parse_name(&self, name: &str) -> Result<DocPath, StoreError> {
        let root = self.documents_root();
        let relative = name
            .strip_prefix(&root)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| {
                StoreError::UnexpectedResponse(format!(
                    "document name {name} is outside {root}"
                ))
            })?;
        DocPath::parse(relative)
    }

    fn into_document(&self, raw: RestDocument) -> Result<Document, StoreError> {
        let path = self.parse_name(&raw.name)?;
        let fields = value::decode_fields(&raw.fields)?;
        Ok(Document::new(path, fields))
    }
}

/// Fails with [`StoreError::Status`] unless the response was successful.
async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        url,
        status: status.as_u16(),
        body,
    })
}

/// Quotes a top-level field name for use in an update mask.
fn field_path(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if simple {
        name.to_string()
    } else {
        let escaped = name.replace('\\', "\\\\").replace('`', "\\`");
        format!("`{escaped}`")
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        path.validate()?;
        let url = self.doc_url(path)?;

        let response = self.request(Method::GET, url).await?.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let raw: RestDocument = ensure_success(response).await?.json().await?;
        self.into_document(raw).map(Some)
    }

    async fn set(&self, path: &DocPath, fields: Fields, mode: WriteMode) -> Result<(), StoreError> {
        path.validate()?;
        if mode == WriteMode::Merge && fields.is_empty() {
            return Ok(());
        }

        let mut url = self.doc_url(path)?;
        if mode == WriteMode::Merge {
            let mut query = url.query_pairs_mut();
            for name in fields.keys() {
                query.append_pair("updateMask.fieldPaths", &field_path(name));
            }
        }

        let body = json!({ "fields": value::encode_fields(&fields) });
        let response = self
            .request(Method::PATCH, url)
            .await?
            .json(&body)
            .send()
            .await?;
        ensure_success(response).await?;

        Ok(())
    }

    async fn add(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> Result<DocPath, StoreError> {
        collection.validate()?;
        let url = self.url_for(collection.segments())?;

        let body = json!({ "fields": value::encode_fields(&fields) });
        let response = self
            .request(Method::POST, url)
            .await?
            .json(&body)
            .send()
            .await?;

        let raw: RestDocument = ensure_success(response).await?.json().await?;
        self.parse_name(&raw.name)
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        collection.validate()?;

        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.url_for(collection.segments())?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", LIST_PAGE_SIZE);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self.request(Method::GET, url).await?.send().await?;
            let page: ListResponse = ensure_success(response).await?.json().await?;

            for raw in page.documents {
                documents.push(self.into_document(raw)?);
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        documents.sort_by(|a, b| a.id().cmp(b.id()));
        tracing::trace!("Listed {} documents from {}", documents.len(), collection);

        Ok(documents)
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        path.validate()?;
        let url = self.doc_url(path)?;

        let response = self.request(Method::DELETE, url).await?.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success(response).await?;

        Ok(())
    }
}
