use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Url};

use super::{LoginForm, PortalError};

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects.
    pub url: Url,
    pub body: String,
}

/// HTTP client holding the portal cookies for one run.
///
/// Every response's cookies are stored and sent back on later requests, so
/// the account page fetch sees the session established by the login POST.
#[derive(Debug, Clone)]
pub struct PortalSession {
    client: Client,
}

impl PortalSession {
    /// Creates a session that sends `user_agent` with every request.
    pub fn new(user_agent: &str) -> Result<Self, PortalError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);

        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// GET `url`, failing on transport errors and non-success statuses.
    pub async fn get_page(&self, url: &Url) -> Result<Page, PortalError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;

        Self::read_page(response).await
    }

    /// POST `form` URL-encoded to `url`.
    pub async fn post_form(&self, url: &Url, form: &LoginForm) -> Result<Page, PortalError> {
        let response = self
            .client
            .post(url.clone())
            .form(form.fields())
            .send()
            .await?
            .error_for_status()?;

        Self::read_page(response).await
    }

    async fn read_page(response: reqwest::Response) -> Result<Page, PortalError> {
        let url = response.url().clone();
        let body = response.text().await?;
        Ok(Page { url, body })
    }
}
