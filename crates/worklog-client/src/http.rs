//! Shared blocking HTTP plumbing

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use worklog_core::FetchError;

pub(crate) fn build_http_client(timeout: Duration, user_agent: &str) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(transport_error)
}

/// Send `request` with `authorization` and decode a JSON body.
///
/// Non-2xx statuses become [`FetchError::Http`] carrying the body; an
/// undecodable body becomes [`FetchError::Decode`].
pub(crate) fn get_json<T>(request: RequestBuilder, authorization: &str) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    let response = request
        .header(AUTHORIZATION, authorization)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "application/json")
        .send()
        .map_err(transport_error)?;

    let status = response.status();
    let url = response.url().to_string();
    let body = response.text().map_err(transport_error)?;

    if !status.is_success() {
        return Err(FetchError::Http {
            status: status.as_u16(),
            url,
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| FetchError::Decode(format!("{url}: {e}")))
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Transport(format!("request timed out: {err}"))
    } else if err.is_connect() {
        FetchError::Transport(format!("connection failed: {err}"))
    } else {
        FetchError::Transport(err.to_string())
    }
}
