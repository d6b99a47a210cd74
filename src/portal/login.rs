use reqwest::Url;
use scraper::{Html, Selector};
use tracing::debug;

use super::{PortalError, PortalSession};
use crate::credentials::Credentials;

/// Form field carrying the user identifier.
pub const IDENT_FIELD: &str = "login-ident";
/// Form field carrying the password.
pub const PASSWORD_FIELD: &str = "login-pwd";

/// How much of the login response to show in debug output.
const SNIPPET_CHARS: usize = 500;

/// URL-encoded body for the login POST.
///
/// Fields keep their insertion order. Setting an existing name replaces its
/// value in place.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    fields: Vec<(String, String)>,
}

impl LoginForm {
    /// A form holding only the two credential fields.
    pub fn with_credentials(credentials: &Credentials) -> Self {
        let mut form = Self::default();
        form.set(IDENT_FIELD, credentials.identifier());
        form.set(PASSWORD_FIELD, credentials.expose_secret());
        form
    }

    /// Build the login payload from the login page HTML.
    ///
    /// Starts from the credential fields, then copies every named
    /// `type="hidden"` input of the first `<form>` in the document. A hidden
    /// input sharing a credential field's name overwrites it.
    pub fn from_login_page(html: &str, credentials: &Credentials) -> Self {
        let document = Html::parse_document(html);
        let mut form = Self::with_credentials(credentials);

        let Some(login_form) = document.select(&selector("form")).next() else {
            debug!("Form found: false");
            return form;
        };

        let element = login_form.value();
        debug!(
            action = element.attr("action"),
            method = element.attr("method"),
            "Form found: true"
        );
        for input in login_form.select(&selector("input")) {
            debug!(
                name = input.value().attr("name"),
                input_type = input.value().attr("type"),
                "Input"
            );
        }

        for hidden in login_form.select(&selector(r#"input[type="hidden"]"#)) {
            let Some(name) = hidden.value().attr("name").filter(|n| !n.is_empty()) else {
                continue;
            };
            let value = hidden.value().attr("value").unwrap_or_default();
            form.set(name, value);
        }

        form
    }

    /// Set `name` to `value`, replacing any existing value.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Field names in submission order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Values may hold the password.
        f.debug_struct("LoginForm")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Decides from the login response body whether the login succeeded.
pub trait LoginCheck {
    fn is_logged_in(&self, body: &str) -> bool;
}

/// Succeeds when any marker substring appears in the response body.
///
/// The markers are text that only the logged-in account page is expected to
/// contain. Markers rendered by client-side script are never seen.
#[derive(Debug, Clone)]
pub struct MarkerCheck {
    markers: Vec<String>,
}

impl MarkerCheck {
    pub fn new(markers: Vec<String>) -> Self {
        Self { markers }
    }
}

impl Default for MarkerCheck {
    fn default() -> Self {
        Self::new(vec!["conso-progress".to_string(), "Consumi".to_string()])
    }
}

impl LoginCheck for MarkerCheck {
    fn is_logged_in(&self, body: &str) -> bool {
        let mut found = false;
        for marker in &self.markers {
            let present = body.contains(marker.as_str());
            debug!(marker = marker.as_str(), present, "Login marker");
            found |= present;
        }
        found
    }
}

/// Runs the single login attempt against the portal.
pub struct LoginSequencer<C = MarkerCheck> {
    login_url: Url,
    check: C,
}

impl LoginSequencer<MarkerCheck> {
    pub fn new(login_url: Url) -> Self {
        Self::with_check(login_url, MarkerCheck::default())
    }
}

impl<C: LoginCheck> LoginSequencer<C> {
    pub fn with_check(login_url: Url, check: C) -> Self {
        Self { login_url, check }
    }

    /// Log in once.
    ///
    /// Returns `Ok(false)` when the portal answered but the response does not
    /// look like the account page. Transport failures and non-success
    /// statuses on either request are errors. There is no retry.
    pub async fn attempt_login(
        &self,
        session: &PortalSession,
        credentials: &Credentials,
    ) -> Result<bool, PortalError> {
        debug!(user = %credentials.masked_identifier(), url = %self.login_url, "Fetching login page");
        let login_page = session.get_page(&self.login_url).await?;

        let form = LoginForm::from_login_page(&login_page.body, credentials);
        debug!(keys = ?form.keys().collect::<Vec<_>>(), "Payload keys");

        let response = session.post_form(&self.login_url, &form).await?;
        debug!(url = %response.url, "Response URL");
        debug!(snippet = %snippet(&response.body), "Response snippet");

        Ok(self.check.is_logged_in(&response.body))
    }
}

fn snippet(body: &str) -> &str {
    match body.char_indices().nth(SNIPPET_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}
