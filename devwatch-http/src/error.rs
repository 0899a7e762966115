//! Mapping of transport errors onto the devwatch error taxonomy

use devwatch_core::Error;

/// Classify a reqwest failure for the poll loop
pub(crate) fn from_reqwest(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::RequestTimeout(err.to_string())
    } else if err.is_connect() {
        Error::Connection(err.to_string())
    } else if err.is_decode() {
        Error::MalformedResponse(err.to_string())
    } else {
        Error::Other(format!("HTTP request failed: {}", err))
    }
}

/// Turn a non-success response into [`Error::Api`], keeping the body for logs
pub(crate) async fn check_status(response: reqwest::Response) -> Result<String, Error> {
    let status = response.status();
    let body = response.text().await.map_err(from_reqwest)?;

    if !status.is_success() {
        return Err(Error::Api {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}
