use serde::Deserialize;
use tracing::{debug, error};

use crate::config::TriggerRequest;
use crate::contract::{Crumb, HttpTransport, DEFAULT_CRUMB_FIELD};
use crate::error::RemoteJobError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CrumbResponse {
    crumb: String,
    #[serde(default)]
    crumb_request_field: Option<String>,
}

pub fn crumb_url(request: &TriggerRequest) -> String {
    format!("{}/crumbIssuer/api/json", request.server_url())
}

/// Asks the server for the anti-forgery token that must accompany the trigger POST.
pub async fn fetch_crumb<T>(transport: &T, request: &TriggerRequest) -> Result<Crumb, RemoteJobError>
where
    T: HttpTransport + ?Sized,
{
    let url = crumb_url(request);
    let decoded: CrumbResponse = transport
        .get(&url, None)
        .await?
        .into_json(&url)
        .map_err(|e| {
            error!(error = %e, url = %url, "Could not obtain crumb");
            e
        })?;

    let field = decoded
        .crumb_request_field
        .filter(|field| !field.is_empty())
        .unwrap_or_else(|| DEFAULT_CRUMB_FIELD.to_string());
    debug!(field = %field, "Obtained crumb");
    Ok(Crumb {
        field,
        value: decoded.crumb,
    })
}
