//! REST client for the upstream contract API
//!
//! Wraps the upstream HTTP endpoints using [`reqwest`]. Responses may be bare
//! JSON or wrapped in a `{ "data": ... }` envelope; both are accepted.

use super::{ContractSource, SourceError};
use crate::auth::Session;
use crate::models::{ContractPayload, ContractRecord, PeriodPayload, PeriodRecord, RecordId};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// HTTP client for the upstream contract API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(data) => data,
        }
    }
}

impl ApiClient {
    /// * `base_url` - API root, e.g. `https://contracts.example.go.th/api`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str, session: &Session) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, or turn the status and
    /// body text into [`SourceError::Api`].
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SourceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SourceError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<Envelope<T>>().await?.into_inner())
    }
}

impl ContractSource for ApiClient {
    async fn list_contracts(&self, session: &Session) -> Result<Vec<ContractRecord>, SourceError> {
        let response = self.request(Method::GET, "/contracts", session).send().await?;
        Self::parse_response(response).await
    }

    async fn list_periods(
        &self,
        session: &Session,
        contract_id: &RecordId,
    ) -> Result<Vec<PeriodRecord>, SourceError> {
        let response = self
            .request(Method::GET, &format!("/contracts/{}/periods", contract_id), session)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn create_contract(
        &self,
        session: &Session,
        payload: &ContractPayload,
    ) -> Result<ContractRecord, SourceError> {
        let response = self
            .request(Method::POST, "/contracts", session)
            .json(payload)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn update_contract(
        &self,
        session: &Session,
        id: &RecordId,
        payload: &ContractPayload,
    ) -> Result<ContractRecord, SourceError> {
        let response = self
            .request(Method::PUT, &format!("/contracts/{}", id), session)
            .json(payload)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn create_period(
        &self,
        session: &Session,
        payload: &PeriodPayload,
    ) -> Result<PeriodRecord, SourceError> {
        let response = self
            .request(
                Method::POST,
                &format!("/contracts/{}/periods", payload.contract_id),
                session,
            )
            .json(payload)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn update_period(
        &self,
        session: &Session,
        id: &RecordId,
        payload: &PeriodPayload,
    ) -> Result<PeriodRecord, SourceError> {
        let response = self
            .request(Method::PUT, &format!("/periods/{}", id), session)
            .json(payload)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn delete_period(&self, session: &Session, id: &RecordId) -> Result<(), SourceError> {
        let response = self
            .request(Method::DELETE, &format!("/periods/{}", id), session)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
