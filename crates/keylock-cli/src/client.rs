// HTTP client for the keylock license server

use anyhow::{anyhow, bail, Context, Result};
use keylock_core::Verdict;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(15);

/// A newly issued license, as returned by the server.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedLicense {
    pub key: String,
    pub duration_days: i32,
    pub created_at: String,
    pub valid_until: String,
}

/// A stored license, as returned by the admin endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseView {
    pub key: String,
    pub duration_days: i32,
    pub created_at: String,
    pub valid_until: String,
    pub active: bool,
    pub hwid: Option<String>,
    pub expired: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicensePage {
    pub licenses: Vec<LicenseView>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueRequest {
    duration_days: i32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for one license server.
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
    admin_password: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new().timeout(TIMEOUT).build(),
            admin_password: None,
        }
    }

    /// Sets the password sent as a Bearer token on admin requests.
    pub fn with_admin_password(mut self, password: String) -> Self {
        self.admin_password = Some(password);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Checks a license for a machine. Rejections are returned as verdicts.
    pub fn check(&self, key: &str, hwid: &str) -> Result<Verdict> {
        let result = self
            .agent
            .get(&self.url("/api/v1/licenses/check"))
            .query("key", key)
            .query("hwid", hwid)
            .call();

        match result {
            Ok(response) => response.into_json().context("Invalid verdict from server"),
            // Rejections carry a verdict body with a 4xx status
            Err(ureq::Error::Status(code, response)) if (400..500).contains(&code) => response
                .into_json()
                .with_context(|| format!("Invalid verdict from server (HTTP {})", code)),
            Err(e) => Err(request_error(e)),
        }
    }

    pub fn issue(&self, duration_days: i32) -> Result<IssuedLicense> {
        let request = self.admin(self.agent.post(&self.url("/api/v1/admin/licenses")))?;
        let result = request.send_json(IssueRequest { duration_days });
        parse(result)
    }

    pub fn list(&self, page: i64, page_size: i64) -> Result<LicensePage> {
        let request = self
            .admin(self.agent.get(&self.url("/api/v1/admin/licenses")))?
            .query("page", &page.to_string())
            .query("pageSize", &page_size.to_string());
        parse(request.call())
    }

    pub fn show(&self, key: &str) -> Result<LicenseView> {
        let request = self.admin(self.agent.get(&self.license_url(key, "")))?;
        parse(request.call())
    }

    pub fn set_active(&self, key: &str, active: bool) -> Result<LicenseView> {
        let action = if active { "/activate" } else { "/deactivate" };
        let request = self.admin(self.agent.post(&self.license_url(key, action)))?;
        parse(request.call())
    }

    pub fn reset_hwid(&self, key: &str) -> Result<LicenseView> {
        let request = self.admin(self.agent.delete(&self.license_url(key, "/hwid")))?;
        parse(request.call())
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        let request = self.admin(self.agent.delete(&self.license_url(key, "")))?;
        request.call().map_err(request_error)?;
        Ok(())
    }

    fn license_url(&self, key: &str, suffix: &str) -> String {
        self.url(&format!(
            "/api/v1/admin/licenses/{}{}",
            urlencoding::encode(key),
            suffix
        ))
    }

    fn admin(&self, request: ureq::Request) -> Result<ureq::Request> {
        let password = self
            .admin_password
            .as_deref()
            .ok_or_else(|| anyhow!("Admin password required"))?;
        Ok(request.set("Authorization", &format!("Bearer {}", password)))
    }
}

fn parse<T: DeserializeOwned>(result: Result<ureq::Response, ureq::Error>) -> Result<T> {
    let response = result.map_err(request_error)?;
    response.into_json().context("Invalid response from server")
}

fn request_error(e: ureq::Error) -> anyhow::Error {
    match e {
        ureq::Error::Status(code, response) => {
            let message = response
                .into_json::<ErrorBody>()
                .map(|body| body.error)
                .unwrap_or_else(|_| "no details".to_string());
            anyhow!("Server returned HTTP {}: {}", code, message)
        }
        ureq::Error::Transport(t) => anyhow!("Could not reach server: {}", t),
    }
}

/// Reads the admin password from the environment, prompting when unset.
pub fn admin_password() -> Result<String> {
    if let Ok(password) = std::env::var("KEYLOCK_ADMIN_PASSWORD") {
        if !password.is_empty() {
            return Ok(password);
        }
    }
    let password =
        rpassword::prompt_password("Admin password: ").context("Failed to read password")?;
    if password.is_empty() {
        bail!("Admin password cannot be empty");
    }
    Ok(password)
}
