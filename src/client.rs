//! reqwest-backed HttpTransport: basic auth on every request, crumb header when one has been issued.
//!
//! The client keeps no state besides the credentials and does not look at status codes;
//! interpreting responses is left to the stages that call it. GETs follow up to
//! [`GET_REDIRECT_LIMIT`] redirects. POSTs never do, so the `Location` of a trigger response
//! reaches the caller untouched.

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Response};

use crate::config::Credentials;
use crate::contract::{Crumb, HttpResponse, HttpTransport};
use crate::error::RemoteJobError;

pub const GET_REDIRECT_LIMIT: usize = 10;

pub struct JenkinsClient {
    http: Client,
    trigger_http: Client,
    credentials: Credentials,
}

fn build_client(policy: Policy) -> Result<Client, RemoteJobError> {
    Client::builder().redirect(policy).build().map_err(|e| {
        tracing::error!(error = ?e, "Failed to build HTTP client");
        RemoteJobError::Config(format!("cannot build HTTP client: {e}"))
    })
}

impl JenkinsClient {
    pub fn new(credentials: Credentials) -> Result<Self, RemoteJobError> {
        let http = build_client(Policy::limited(GET_REDIRECT_LIMIT))?;
        // The trigger's Location names the queue item, not a page to follow.
        let trigger_http = build_client(Policy::none())?;
        tracing::debug!(user = %credentials.user, "Initialized Jenkins client");
        Ok(JenkinsClient {
            http,
            trigger_http,
            credentials,
        })
    }

    async fn send(
        &self,
        request: RequestBuilder,
        url: &str,
        crumb: Option<Crumb>,
    ) -> Result<HttpResponse, RemoteJobError> {
        let mut request =
            request.basic_auth(&self.credentials.user, Some(&self.credentials.token));
        if let Some(crumb) = crumb {
            request = request.header(crumb.field.as_str(), crumb.value.as_str());
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = ?e, url, "Request failed");
            RemoteJobError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;
        into_http_response(response, url).await
    }
}

async fn into_http_response(response: Response, url: &str) -> Result<HttpResponse, RemoteJobError> {
    let status = response.status().as_u16();
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.map_err(|e| {
        tracing::error!(error = ?e, url, "Failed to read response body");
        RemoteJobError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        }
    })?;
    tracing::debug!(url, status, has_location = location.is_some(), "Received response");
    Ok(HttpResponse {
        status,
        location,
        body,
    })
}

#[async_trait]
impl HttpTransport for JenkinsClient {
    async fn get(&self, url: &str, crumb: Option<Crumb>) -> Result<HttpResponse, RemoteJobError> {
        tracing::debug!(url, "GET");
        self.send(self.http.get(url), url, crumb).await
    }

    async fn post(&self, url: &str, crumb: Option<Crumb>) -> Result<HttpResponse, RemoteJobError> {
        tracing::debug!(url, "POST");
        self.send(self.trigger_http.post(url), url, crumb).await
    }
}
