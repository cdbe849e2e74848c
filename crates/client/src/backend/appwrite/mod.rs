//! Appwrite REST API client.
//!
//! Uses `reqwest` 0.13 with a cookie store, so the session opened by
//! [`BackendService::sign_in`] is sent with every later request. Catalog
//! reads are cached with `moka` (5-minute TTL by default).

mod documents;
mod query;

use std::sync::Arc;
use std::time::Duration;

use food_order_core::{CategoryId, MenuItemId, UserId, unique_id};
use moka::future::Cache;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument, warn};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::types::{Category, Customization, MenuItem, User};
use super::{BackendError, BackendService, ImageUpload, MenuFilter, ProfileUpdate, SignInForm, SignUpForm};
use crate::config::AppwriteConfig;

use documents::{
    AccountResponse, CategoryDocument, CustomizationDocument, DocumentList, ErrorResponse,
    FileResponse, MenuCustomizationDocument, MenuDocument, UserDocument, convert_all,
};
use query::Query;

/// Longest response body excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// AppwriteClient
// =============================================================================

/// Client for the Appwrite account, database and storage APIs.
#[derive(Clone)]
pub struct AppwriteClient {
    inner: Arc<AppwriteClientInner>,
}

struct AppwriteClientInner {
    client: reqwest::Client,
    config: AppwriteConfig,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for AppwriteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppwriteClient")
            .field("config", &self.inner.config)
            .field("cached_entries", &self.inner.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl AppwriteClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if a header value is invalid or the HTTP client fails to build.
    pub fn new(config: &AppwriteConfig, cache_ttl: Duration) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Appwrite-Project",
            HeaderValue::from_str(&config.project_id).map_err(|e| {
                BackendError::InvalidPayload(format!("invalid project id header: {e}"))
            })?,
        );
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(key.expose_secret()).map_err(|e| {
                BackendError::InvalidPayload(format!("invalid API key header: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert("X-Appwrite-Key", value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .user_agent(format!(
                "{} food-order-client/{}",
                config.platform,
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(AppwriteClientInner {
                client,
                config: config.clone(),
                cache,
            }),
        })
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    fn url(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.inner.config.url(path)?)
    }

    fn documents_url(&self, collection: &str) -> Result<Url, BackendError> {
        self.url(&format!(
            "databases/{}/collections/{collection}/documents",
            self.inner.config.database_id
        ))
    }

    fn documents_query_url(&self, collection: &str, queries: &[Query]) -> Result<Url, BackendError> {
        let mut url = self.documents_url(collection)?;
        query::append_to(&mut url, queries)?;
        Ok(url)
    }

    fn document_url(&self, collection: &str, id: &str) -> Result<Url, BackendError> {
        self.url(&format!(
            "databases/{}/collections/{collection}/documents/{id}",
            self.inner.config.database_id
        ))
    }

    /// Send a request and return the body of a successful response.
    async fn execute(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }

        let error: ErrorResponse = serde_json::from_str(&body).unwrap_or(ErrorResponse {
            message: body.chars().take(200).collect(),
            kind: String::new(),
        });
        match status {
            StatusCode::UNAUTHORIZED => Err(BackendError::Unauthorized),
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(error.message)),
            _ => {
                tracing::error!(
                    status = %status,
                    body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                    "Appwrite API returned non-success status"
                );
                Err(BackendError::Api {
                    status: status.as_u16(),
                    code: error.kind,
                    message: error.message,
                })
            }
        }
    }

    /// Send a request and parse the JSON body.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Failed to parse Appwrite response"
            );
            BackendError::Parse(e)
        })
    }

    async fn list_documents<T: DeserializeOwned>(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<Vec<T>, BackendError> {
        let request = self
            .inner
            .client
            .get(self.documents_query_url(collection, queries)?);
        let list: DocumentList<T> = self.fetch(request).await?;
        debug!(collection, total = list.total, returned = list.documents.len(), "Listed documents");
        Ok(list.documents)
    }

    async fn get_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<T, BackendError> {
        if id.is_empty() {
            return Err(BackendError::NotFound(format!("{collection} document with empty id")));
        }
        let request = self.inner.client.get(self.document_url(collection, id)?);
        self.fetch(request).await
    }

    /// URL of the generated initials avatar for `name`.
    fn initials_avatar_url(&self, name: &str) -> Result<Url, BackendError> {
        let mut url = self.url("avatars/initials")?;
        url.query_pairs_mut()
            .append_pair("name", name)
            .append_pair("project", &self.inner.config.project_id);
        Ok(url)
    }

    /// Public view URL of a stored file.
    fn file_view_url(&self, bucket: &str, file_id: &str) -> Result<Url, BackendError> {
        let mut url = self.url(&format!("storage/buckets/{bucket}/files/{file_id}/view"))?;
        url.query_pairs_mut()
            .append_pair("project", &self.inner.config.project_id);
        Ok(url)
    }
}

// =============================================================================
// BackendService
// =============================================================================

impl BackendService for AppwriteClient {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<Option<User>, BackendError> {
        let account: AccountResponse = match self
            .fetch(self.inner.client.get(self.url("account")?))
            .await
        {
            Ok(account) => account,
            Err(BackendError::Unauthorized) => return Ok(None),
            Err(e) => return Err(e),
        };

        let collection = &self.inner.config.collections.user;
        let documents: Vec<UserDocument> = self
            .list_documents(
                collection,
                &[Query::equal("accountId", [account.id.as_str()]), Query::limit(1)],
            )
            .await?;

        match documents.into_iter().next() {
            Some(doc) => Ok(Some(User::try_from(doc)?)),
            None => {
                warn!(account_id = %account.id, "Account has no profile document");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, form), fields(email = %form.email))]
    async fn create_account(&self, form: &SignUpForm) -> Result<User, BackendError> {
        let request = self.inner.client.post(self.url("account")?).json(&json!({
            "userId": unique_id(),
            "email": form.email.as_str(),
            "password": form.password.expose(),
            "name": form.name,
        }));
        let account: AccountResponse = self.fetch(request).await?;
        debug!(account_id = %account.id, "Account created");

        self.sign_in(&form.sign_in_form()).await?;

        let avatar = self.initials_avatar_url(&form.name)?;
        let request = self
            .inner
            .client
            .post(self.documents_url(&self.inner.config.collections.user)?)
            .json(&json!({
                "documentId": unique_id(),
                "data": {
                    "accountId": account.id,
                    "email": form.email.as_str(),
                    "name": form.name,
                    "avatar": avatar.as_str(),
                },
            }));
        let doc: UserDocument = self.fetch(request).await?;
        User::try_from(doc)
    }

    #[instrument(skip(self, form), fields(email = %form.email))]
    async fn sign_in(&self, form: &SignInForm) -> Result<(), BackendError> {
        let request = self
            .inner
            .client
            .post(self.url("account/sessions/email")?)
            .json(&json!({
                "email": form.email.as_str(),
                "password": form.password.expose(),
            }));
        self.execute(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), BackendError> {
        let request = self
            .inner
            .client
            .delete(self.url("account/sessions/current")?);
        self.execute(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_menu(&self, filter: &MenuFilter) -> Result<Vec<MenuItem>, BackendError> {
        let cache_key = CacheKey::Menu(filter.clone());
        if let Some(CacheValue::Menu(items)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for menu");
            return Ok(items);
        }

        let mut queries = Vec::new();
        if let Some(category) = &filter.category {
            queries.push(Query::equal("categories", [category.as_str()]));
        }
        if let Some(text) = &filter.query {
            queries.push(Query::search("name", text));
        }
        if let Some(limit) = filter.limit {
            queries.push(Query::limit(limit));
        }

        let documents: Vec<MenuDocument> = self
            .list_documents(&self.inner.config.collections.menu, &queries)
            .await?;
        let items: Vec<MenuItem> = convert_all(documents)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Menu(items.clone()))
            .await;
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let documents: Vec<CategoryDocument> = self
            .list_documents(&self.inner.config.collections.categories, &[])
            .await?;
        let categories: Vec<Category> = convert_all(documents)?;

        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    #[instrument(skip(self), fields(category_id = %id))]
    async fn get_category(&self, id: &CategoryId) -> Result<Category, BackendError> {
        let cache_key = CacheKey::Category(id.clone());
        if let Some(CacheValue::Category(category)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for category");
            return Ok(category);
        }

        let doc: CategoryDocument = self
            .get_document(&self.inner.config.collections.categories, id.as_str())
            .await?;
        let category = Category::try_from(doc)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Category(category.clone()))
            .await;
        Ok(category)
    }

    #[instrument(skip(self), fields(menu_id = %id))]
    async fn get_menu_item(&self, id: &MenuItemId) -> Result<MenuItem, BackendError> {
        let cache_key = CacheKey::MenuItem(id.clone());
        if let Some(CacheValue::MenuItem(item)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for menu item");
            return Ok(*item);
        }

        let doc: MenuDocument = self
            .get_document(&self.inner.config.collections.menu, id.as_str())
            .await?;
        let item = MenuItem::try_from(doc)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::MenuItem(Box::new(item.clone())))
            .await;
        Ok(item)
    }

    #[instrument(skip(self), fields(menu_id = %menu_id))]
    async fn list_customizations(
        &self,
        menu_id: &MenuItemId,
    ) -> Result<Vec<Customization>, BackendError> {
        if menu_id.is_empty() {
            return Ok(Vec::new());
        }

        let cache_key = CacheKey::Customizations(menu_id.clone());
        if let Some(CacheValue::Customizations(customizations)) =
            self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for customizations");
            return Ok(customizations);
        }

        let collections = &self.inner.config.collections;
        let links: Vec<MenuCustomizationDocument> = self
            .list_documents(
                &collections.menu_customization,
                &[Query::equal("menu", [menu_id.as_str()])],
            )
            .await?;

        let mut ids: Vec<String> = links
            .into_iter()
            .filter_map(|link| link.customizations)
            .flat_map(documents::Relations::into_ids)
            .filter(|id| !id.is_empty())
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let customizations: Vec<Customization> = if ids.is_empty() {
            Vec::new()
        } else {
            let limit = u32::try_from(ids.len()).unwrap_or(u32::MAX);
            let documents: Vec<CustomizationDocument> = self
                .list_documents(
                    &collections.customization,
                    &[Query::equal("$id", ids), Query::limit(limit)],
                )
                .await?;
            convert_all(documents)?
        };

        self.inner
            .cache
            .insert(cache_key, CacheValue::Customizations(customizations.clone()))
            .await;
        Ok(customizations)
    }

    #[instrument(skip(self, update), fields(user_id = %user_id))]
    async fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<User, BackendError> {
        let collection = &self.inner.config.collections.user;

        let mut data = Map::new();
        if let Some(name) = update.name_to_send() {
            data.insert("name".to_string(), Value::from(name));
        }
        if let Some(avatar) = update.avatar_to_send() {
            data.insert("avatar".to_string(), Value::from(avatar));
        }

        let doc: UserDocument = if data.is_empty() {
            debug!("Empty profile update, re-reading profile");
            self.get_document(collection, user_id.as_str()).await?
        } else {
            let request = self
                .inner
                .client
                .patch(self.document_url(collection, user_id.as_str())?)
                .json(&json!({ "data": data }));
            self.fetch(request).await?
        };
        User::try_from(doc)
    }

    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.bytes.len()))]
    async fn upload_image(&self, upload: ImageUpload) -> Result<Url, BackendError> {
        let bucket = self.inner.config.asset_bucket.as_deref().ok_or_else(|| {
            BackendError::Unsupported("no asset bucket configured (APPWRITE_ASSET_BUCKET)".to_string())
        })?;

        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(upload.content_type)?;
        let form = reqwest::multipart::Form::new()
            .text("fileId", unique_id())
            .part("file", part);

        let request = self
            .inner
            .client
            .post(self.url(&format!("storage/buckets/{bucket}/files"))?)
            .multipart(form);
        let file: FileResponse = self.fetch(request).await?;
        debug!(file_id = %file.id, "Image uploaded");

        self.file_view_url(bucket, &file.id)
    }
}
