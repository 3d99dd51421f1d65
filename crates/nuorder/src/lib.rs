//! Client for the NuOrder wholesale API.
//!
//! Every request carries an OAuth 1.0a signature (see [`oauth`]). On top of
//! the raw verb helpers sit the connector operations the settings form and
//! the CLI trigger: connection check, order retrieval, customer/item push,
//! and the queued full sync.

use std::io::Write as _;
use std::time::Duration;

use flate2::{write::GzEncoder, Compression};
use reqwest::{
    header::{AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE},
    Method,
};
use serde_json::{json, Value};
use shared::{
    domain::OrderStatus,
    error::{ErrorCode, RemoteException},
    protocol::{CompanyPayload, OrderSummary, ProductPayload},
};

pub mod catalog;
pub mod config;
pub mod oauth;
pub mod ops;
pub mod sync;
pub mod synclog;

pub use config::ConnectorSettings;
pub use oauth::OauthCredentials;
pub use ops::ConnectorOps;
pub use synclog::SyncLog;

/// Endpoint probed by the connection check; cheap and requires valid auth.
const CHECK_ENDPOINT: &str = "/api/companies/codes/list";
const COMPANY_NEW_ENDPOINT: &str = "/api/company/new";
const PRODUCT_NEW_ENDPOINT: &str = "/api/product/new";

pub const ORDER_PAGE_SIZE: usize = 100;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct NuOrderClient {
    http: reqwest::Client,
    hostname: String,
    credentials: OauthCredentials,
    dry_run: bool,
}

impl NuOrderClient {
    pub fn from_settings(settings: &ConnectorSettings) -> Result<Self, RemoteException> {
        let mut builder = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .connect_timeout(CONNECT_TIMEOUT);
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|err| RemoteException::transport(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            hostname: settings.hostname.clone(),
            credentials: settings.credentials(),
            dry_run: false,
        })
    }

    /// In dry-run mode requests are described instead of sent.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn url_for(&self, endpoint: &str) -> String {
        if self.hostname.contains("://") {
            format!("{}{endpoint}", self.hostname)
        } else {
            format!("https://{}{endpoint}", self.hostname)
        }
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        data: Option<String>,
        gzip_data: bool,
        additional_base_args: &[(String, String)],
        additional_header_args: &[(String, String)],
    ) -> Result<Value, RemoteException> {
        let url = self.url_for(endpoint);
        let timestamp = oauth::oauth_timestamp();
        let nonce = oauth::oauth_nonce();
        let authorization = oauth::authorization_header(
            &self.credentials,
            method.as_str(),
            &url,
            &timestamp,
            &nonce,
            additional_base_args,
            additional_header_args,
        );

        if self.dry_run {
            return Ok(json!({
                "would_do": {
                    "method": method.as_str(),
                    "url": url,
                    "gzip": gzip_data,
                    "data": data.as_deref().map(|_| "[as passed in]"),
                }
            }));
        }

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/json");
        if let Some(data) = data {
            request = if gzip_data {
                request
                    .header(CONTENT_ENCODING, "gzip")
                    .body(gzip_compress(data.as_bytes())?)
            } else {
                request.body(data)
            };
        }

        tracing::info!(method = %method, %url, "nuorder request");
        let response = request
            .send()
            .await
            .map_err(|err| RemoteException::transport(format!("{method} {url} failed: {err}")))?;
        let status = response.status();
        let text = response.text().await.map_err(|err| {
            RemoteException::transport(format!("failed to read response from {method} {url}: {err}"))
        })?;

        if !status.is_success() {
            return Err(RemoteException::new(
                ErrorCode::from_status(status.as_u16()),
                format!("got HTTP {status} from {method} {endpoint}"),
            )
            .with_body(prettify(&text)));
        }
        tracing::info!(status = status.as_u16(), "nuorder response");

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            // Non-JSON success bodies are wrapped rather than treated as errors.
            Err(err) => Ok(json!({
                "response_status_code": status.as_u16(),
                "response_text": text,
                "error": err.to_string(),
            })),
        }
    }

    pub async fn get(&self, endpoint: &str) -> Result<Value, RemoteException> {
        self.request(Method::GET, endpoint, None, false, &[], &[]).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Value, RemoteException> {
        self.request(Method::DELETE, endpoint, None, false, &[], &[]).await
    }

    pub async fn post(
        &self,
        endpoint: &str,
        data: Option<String>,
        gzip_data: bool,
    ) -> Result<Value, RemoteException> {
        self.request(Method::POST, endpoint, data, gzip_data, &[], &[]).await
    }

    pub async fn put(
        &self,
        endpoint: &str,
        data: Option<String>,
        gzip_data: bool,
    ) -> Result<Value, RemoteException> {
        self.request(Method::PUT, endpoint, data, gzip_data, &[], &[]).await
    }

    /// First step of the token bootstrap; the returned temporary token must be
    /// approved in the NuOrder admin page.
    pub async fn oauth_initiate(&self, app_name: &str) -> Result<Value, RemoteException> {
        let base_args = [("oauth_callback".to_string(), "oob".to_string())];
        let header_args = [
            ("application_name".to_string(), app_name.to_string()),
            ("oauth_callback".to_string(), "oob".to_string()),
        ];
        self.request(Method::GET, "/api/initiate", None, false, &base_args, &header_args)
            .await
    }

    /// Second step: exchanges the approval verifier for the final token pair.
    pub async fn oauth_token_request(&self, verifier: &str) -> Result<Value, RemoteException> {
        let args = [("oauth_verifier".to_string(), verifier.to_string())];
        self.request(Method::GET, "/api/token", None, false, &args, &args)
            .await
    }

    /// One authenticated probe. Validation needs a plain boolean, so every
    /// failure mode maps to `false` and the cause goes to the log.
    pub async fn check_connection(&self) -> bool {
        match self.get(CHECK_ENDPOINT).await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!("connection check failed: {err}");
                false
            }
        }
    }

    /// Reads all orders in `status`, page by page until a short page.
    pub async fn get_orders(&self, status: OrderStatus) -> Result<Vec<OrderSummary>, RemoteException> {
        let mut orders = Vec::new();
        let mut page = 0usize;
        loop {
            let endpoint = format!(
                "/api/orders/list/{}?page={page}&size={ORDER_PAGE_SIZE}",
                status.as_str()
            );
            let value = self.get(&endpoint).await?;
            if value.is_null() {
                break;
            }
            let batch: Vec<OrderSummary> = serde_json::from_value(value).map_err(|err| {
                RemoteException::new(
                    ErrorCode::Internal,
                    format!("unexpected order listing payload on page {page}: {err}"),
                )
            })?;
            let batch_len = batch.len();
            orders.extend(batch);
            if batch_len < ORDER_PAGE_SIZE {
                break;
            }
            page += 1;
        }
        tracing::info!(count = orders.len(), status = %status, "orders read");
        Ok(orders)
    }

    pub async fn push_companies(
        &self,
        companies: &[CompanyPayload],
    ) -> Result<usize, RemoteException> {
        for company in companies {
            let data = encode_payload(company)?;
            self.put(COMPANY_NEW_ENDPOINT, Some(data), false).await?;
        }
        tracing::info!(count = companies.len(), "companies written");
        Ok(companies.len())
    }

    pub async fn push_products(
        &self,
        products: &[ProductPayload],
    ) -> Result<usize, RemoteException> {
        for product in products {
            let data = encode_payload(product)?;
            self.put(PRODUCT_NEW_ENDPOINT, Some(data), false).await?;
        }
        tracing::info!(count = products.len(), "products written");
        Ok(products.len())
    }
}

fn encode_payload<T: serde::Serialize>(payload: &T) -> Result<String, RemoteException> {
    serde_json::to_string(payload).map_err(|err| {
        RemoteException::new(ErrorCode::Internal, format!("failed to encode payload: {err}"))
    })
}

fn gzip_compress(bytes: &[u8]) -> Result<Vec<u8>, RemoteException> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .and_then(|()| encoder.finish())
        .map_err(|err| {
            RemoteException::new(ErrorCode::Internal, format!("failed to gzip request body: {err}"))
        })
}

fn prettify(text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.to_string()),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
