//! HTTP requests of the S3 upload protocol

use log::debug;
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};

use crate::config::UploadConfig;
use crate::error::{UploadError, UploadResult};
use crate::types::{CompletedPart, UploadSession};
use crate::xml;

/// Thin wrapper over `reqwest::Client` bound to one endpoint and token.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
}

/// Encode URI path - encode each segment individually, keep / as separator
fn encode_uri_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

async fn error_for(operation: &'static str, response: Response) -> UploadError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    UploadError::status(operation, status, &text)
}

impl StoreClient {
    pub fn new(config: &UploadConfig) -> UploadResult<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url().to_string(),
            auth_token: config.auth_token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn object_url(&self, destination: &str) -> String {
        format!("{}{}", self.base_url, encode_uri_path(destination))
    }

    fn session_url(&self, session: &UploadSession) -> String {
        format!(
            "{}?uploadId={}",
            self.object_url(&session.destination),
            urlencoding::encode(&session.upload_id)
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Single PUT of a whole object. `body` may be streamed; `content_length` is sent as-is.
    pub async fn put_object(
        &self,
        destination: &str,
        body: Body,
        content_length: u64,
    ) -> UploadResult<()> {
        let response = self
            .authorize(self.http.put(self.object_url(destination)))
            .header("content-length", content_length)
            .body(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            _ => Err(error_for("upload", response).await),
        }
    }

    pub async fn initiate_multipart_upload(&self, destination: &str) -> UploadResult<UploadSession> {
        let url = format!("{}?uploads", self.object_url(destination));
        let response = self.authorize(self.http.post(&url)).send().await?;

        if response.status() != StatusCode::OK {
            return Err(error_for("initiate multipart upload", response).await);
        }

        let body = response.text().await?;
        let upload_id = xml::parse_upload_id(&body).ok_or_else(|| {
            debug!("initiate_response: {}", body);
            UploadError::MissingUploadId
        })?;

        Ok(UploadSession {
            destination: destination.to_string(),
            upload_id,
        })
    }

    /// Uploads one part and returns its ETag without quotes.
    pub async fn upload_part(
        &self,
        session: &UploadSession,
        part_number: u32,
        data: Vec<u8>,
    ) -> UploadResult<String> {
        let url = format!(
            "{}?partNumber={}&uploadId={}",
            self.object_url(&session.destination),
            part_number,
            urlencoding::encode(&session.upload_id)
        );
        let response = self.authorize(self.http.put(&url)).body(data).send().await?;

        if response.status() != StatusCode::OK {
            return Err(error_for("upload part", response).await);
        }

        response
            .headers()
            .get("ETag")
            .and_then(|v| v.to_str().ok())
            .map(|etag| etag.trim_matches('"').to_string())
            .ok_or(UploadError::MissingEtag(part_number))
    }

    /// Commits the session. `parts` must be sorted by part number.
    pub async fn complete_multipart_upload(
        &self,
        session: &UploadSession,
        parts: &[CompletedPart],
    ) -> UploadResult<()> {
        let response = self
            .authorize(self.http.post(self.session_url(session)))
            .header("Content-Type", "application/xml")
            .body(xml::completion_body(parts))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(error_for("complete multipart upload", response).await);
        }
        Ok(())
    }

    pub async fn abort_multipart_upload(&self, session: &UploadSession) -> UploadResult<()> {
        let response = self
            .authorize(self.http.delete(self.session_url(session)))
            .send()
            .await?;

        if response.status() != StatusCode::NO_CONTENT {
            return Err(error_for("abort multipart upload", response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> StoreClient {
        StoreClient::new(&UploadConfig::new(endpoint)).unwrap()
    }

    #[test]
    fn object_url_joins_endpoint_and_destination() {
        let c = client("http://localhost:8080/");
        assert_eq!(
            c.object_url("/uploads/photo.jpg"),
            "http://localhost:8080/uploads/photo.jpg"
        );
    }

    #[test]
    fn object_url_encodes_segments() {
        let c = client("http://localhost:8080");
        assert_eq!(
            c.object_url("/private/my file.tar.gz"),
            "http://localhost:8080/private/my%20file.tar.gz"
        );
    }

    #[test]
    fn session_url_encodes_upload_id() {
        let c = client("http://localhost:8080");
        let session = UploadSession {
            destination: "/private/a.bin".into(),
            upload_id: "abc+/=".into(),
        };
        assert_eq!(
            c.session_url(&session),
            "http://localhost:8080/private/a.bin?uploadId=abc%2B%2F%3D"
        );
    }

    #[test]
    fn empty_token_is_ignored() {
        let config = UploadConfig {
            auth_token: Some(String::new()),
            ..UploadConfig::default()
        };
        let c = StoreClient::new(&config).unwrap();
        assert!(c.auth_token.is_none());
    }
}
