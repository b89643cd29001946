//! Remote cart service seam and its HTTP client.

use crate::auth::Session;
use crate::error::RemoteError;
use async_trait::async_trait;
use basket_engine::{
    AddLineRequest, ErrorBody, LineId, LinesResponse, Quantity, RemoteCartLine,
    UpdateQuantityRequest,
};
use reqwest::{Response, StatusCode};

/// The authenticated cart, kept by a remote service.
///
/// Pricing is computed by the service. Every call acts on the cart owned by
/// the session's user.
#[async_trait]
pub trait RemoteCartService: Send + Sync {
    async fn list_lines(&self, session: &Session) -> Result<Vec<RemoteCartLine>, RemoteError>;

    async fn add_line(&self, session: &Session, request: &AddLineRequest)
        -> Result<(), RemoteError>;

    async fn update_line_quantity(
        &self,
        session: &Session,
        id: LineId,
        quantity: Quantity,
    ) -> Result<(), RemoteError>;

    async fn remove_line(&self, session: &Session, id: LineId) -> Result<(), RemoteError>;

    async fn clear(&self, session: &Session) -> Result<(), RemoteError>;
}

/// [`RemoteCartService`] over the Basket HTTP API.
#[derive(Debug, Clone)]
pub struct HttpRemoteCart {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteCart {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn lines_url(&self) -> String {
        format!("{}/cart/lines", self.base_url)
    }

    fn line_url(&self, id: LineId) -> String {
        format!("{}/cart/lines/{}", self.base_url, id)
    }

    /// Map non-success responses to errors.
    async fn check(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Unauthorized);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);

        Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RemoteCartService for HttpRemoteCart {
    async fn list_lines(&self, session: &Session) -> Result<Vec<RemoteCartLine>, RemoteError> {
        let response = self
            .client
            .get(self.lines_url())
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        let body: LinesResponse = Self::check(response).await?.json().await?;
        tracing::debug!(lines = body.lines.len(), "fetched remote cart");
        Ok(body.lines)
    }

    async fn add_line(
        &self,
        session: &Session,
        request: &AddLineRequest,
    ) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.lines_url())
            .bearer_auth(&session.access_token)
            .json(request)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn update_line_quantity(
        &self,
        session: &Session,
        id: LineId,
        quantity: Quantity,
    ) -> Result<(), RemoteError> {
        let response = self
            .client
            .patch(self.line_url(id))
            .bearer_auth(&session.access_token)
            .json(&UpdateQuantityRequest { quantity })
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn remove_line(&self, session: &Session, id: LineId) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.line_url(id))
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn clear(&self, session: &Session) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.lines_url())
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}
