//! Server route table.

/// Absolute URLs of every server route the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoutes {
    api_url: String,
    app_url: String,
}

impl ApiRoutes {
    /// Creates routes from the API base and the application origin (for the demo route).
    #[must_use]
    pub fn new(api_url: impl AsRef<str>, app_url: impl AsRef<str>) -> Self {
        Self {
            api_url: api_url.as_ref().trim_end_matches('/').to_string(),
            app_url: app_url.as_ref().trim_end_matches('/').to_string(),
        }
    }

    /// API base URL.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    #[must_use]
    pub fn refresh(&self) -> String {
        format!("{}/auth/refresh", self.api_url)
    }

    #[must_use]
    pub fn logout(&self) -> String {
        format!("{}/auth/logout", self.api_url)
    }

    #[must_use]
    pub fn whoami(&self) -> String {
        format!("{}/users/whoami", self.api_url)
    }

    #[must_use]
    pub fn terms_agree(&self) -> String {
        format!("{}/users/terms-agree", self.api_url)
    }

    #[must_use]
    pub fn subscriptions(&self) -> String {
        format!("{}/subscriptions", self.api_url)
    }

    #[must_use]
    pub fn unsubscribe(&self) -> String {
        format!("{}/subscriptions/unsubscribe", self.api_url)
    }

    #[must_use]
    pub fn check_subscription(&self) -> String {
        format!("{}/subscriptions/check", self.api_url)
    }

    #[must_use]
    pub fn push_demo(&self) -> String {
        format!("{}/api/push-demo", self.app_url)
    }

    /// Returns whether `url` targets the token refresh route.
    #[must_use]
    pub fn is_refresh(&self, url: &str) -> bool {
        let url = url.split(['?', '#']).next().unwrap_or(url);
        url.trim_end_matches('/') == self.refresh()
    }
}
