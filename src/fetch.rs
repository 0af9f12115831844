use gloo::net::http::Request;

use folio_core::{FetchError, FragmentSource};

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct HttpSource;

impl FragmentSource for HttpSource {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let response = Request::get(path)
            .send()
            .await
            .map_err(|err| FetchError::Network {
                path: path.to_string(),
                message: err.to_string(),
            })?;
        if !response.ok() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: response.status(),
            });
        }
        response.text().await.map_err(|err| FetchError::Body {
            path: path.to_string(),
            message: err.to_string(),
        })
    }
}
