use reqwest::Url;
use scraper::{Html, Selector};
use tracing::debug;

use super::{PortalError, PortalSession};

/// Attribute holding the usage percentage, e.g. `data-progress-value="42,50"`.
pub const PROGRESS_ATTR: &str = "data-progress-value";

/// Locates the usage progress bar on the account page.
///
/// Selectors are tried in order and the first element carrying
/// [`PROGRESS_ATTR`] wins, so narrower selectors should come first.
#[derive(Debug, Clone)]
pub struct ProgressExtractor {
    strategies: Vec<(String, Selector)>,
}

impl ProgressExtractor {
    /// The portal's current markup: the `#conso-progress` bar, then any
    /// `.progressbar` carrying the attribute.
    pub const DEFAULT_SELECTORS: [&'static str; 2] = [
        "div#conso-progress.progressbar[data-progress-value]",
        "div.progressbar[data-progress-value]",
    ];

    pub fn new<S: AsRef<str>>(selectors: &[S]) -> Result<Self, PortalError> {
        let strategies = selectors
            .iter()
            .map(|css| {
                let css = css.as_ref();
                Selector::parse(css)
                    .map(|selector| (css.to_string(), selector))
                    .map_err(|e| PortalError::InvalidSelector {
                        selector: css.to_string(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { strategies })
    }

    /// Extract the raw progress value from account page HTML.
    ///
    /// Returns `None` when no strategy matches.
    pub fn extract(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        for (css, selector) in &self.strategies {
            let value = document
                .select(selector)
                .find_map(|el| el.value().attr(PROGRESS_ATTR));
            if let Some(value) = value {
                debug!(selector = css.as_str(), value, "Progress bar found");
                return Some(value.to_string());
            }
            debug!(selector = css.as_str(), "No progress bar match");
        }

        None
    }

    /// GET the account page and extract the progress value from it.
    pub async fn fetch(
        &self,
        session: &PortalSession,
        account_url: &Url,
    ) -> Result<Option<String>, PortalError> {
        let page = session.get_page(account_url).await?;
        Ok(self.extract(&page.body))
    }
}

impl Default for ProgressExtractor {
    fn default() -> Self {
        let strategies = Self::DEFAULT_SELECTORS
            .iter()
            .map(|css| {
                let selector = Selector::parse(css).expect("default selector is valid CSS");
                (css.to_string(), selector)
            })
            .collect();
        Self { strategies }
    }
}
