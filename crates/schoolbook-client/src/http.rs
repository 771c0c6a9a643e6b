//! REST backend over reqwest.

use crate::api::{AttendanceApi, EnrollmentApi, ResourceApi, ScopedListApi};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use schoolbook_config::ApiConfig;
use schoolbook_core::{ApiError, ListQuery, Page};
use schoolbook_models::{
    AttendanceRecord, BulkAttendanceRequest, BulkAttendanceResult, BulkAttendanceRow, ClassId,
    ClassSession, ClassSessionId, Invoice, ParentId, Resource, Student, StudentId,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{Instrument, field};

/// Span for one outgoing request, with the status filled in on response.
macro_rules! http_client_span {
    ($method:expr, $path:expr) => {
        tracing::info_span!(
            "http.client",
            http.method = %$method,
            http.url = %$path,
            http.status_code = field::Empty,
            error.message = field::Empty
        )
    };
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<Response, ApiError> {
        let span = http_client_span!(method, path);
        async move {
            let response = builder.send().await.map_err(map_reqwest_error)?;
            let status = response.status();
            tracing::Span::current().record("http.status_code", status.as_u16());

            if status.is_success() {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            let error = ApiError::from_status(status.as_u16(), error_message(status, &body));
            tracing::Span::current().record("error.message", error.message.as_str());
            tracing::warn!(status = status.as_u16(), error.kind = %error.kind, "Request rejected");
            Err(error)
        }
        .instrument(span)
        .await
    }

    async fn fetch<T: DeserializeOwned>(&self, method: Method, path: String) -> Result<T, ApiError> {
        let builder = self.request(method.clone(), &path);
        decode(self.send(method, &path, builder).await?).await
    }

    async fn fetch_with_query<T: DeserializeOwned>(
        &self,
        path: String,
        query: &ListQuery,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, &path).query(&query.to_query_pairs());
        decode(self.send(Method::GET, &path, builder).await?).await
    }

    async fn submit<B, T>(&self, method: Method, path: String, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let builder = self.request(method.clone(), &path).json(body);
        decode(self.send(method, &path, builder).await?).await
    }

    /// Scoped list endpoints answer with a bare array or a page envelope.
    async fn fetch_items<T: DeserializeOwned>(&self, path: String) -> Result<Vec<T>, ApiError> {
        let page: Page<T> = self.fetch(Method::GET, path).await?;
        Ok(page.data)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::transport("Request timed out")
    } else if err.is_connect() {
        ApiError::transport(format!("Could not reach the server: {}", err))
    } else if err.is_decode() {
        ApiError::unknown(format!("Invalid response body: {}", err))
    } else {
        ApiError::transport(format!("Request failed: {}", err))
    }
}

/// Pulls a readable message out of an error body (`error` or `message`,
/// either a string or a list of strings).
fn error_message(status: StatusCode, body: &str) -> String {
    let extracted = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(message_text))
        });

    extracted.unwrap_or_else(|| match status.canonical_reason() {
        Some(reason) => format!("Request failed with status {} {}", status.as_u16(), reason),
        None => format!("Request failed with status {}", status.as_u16()),
    })
}

fn message_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

/// Bulk writes answer with `{ created, errors }`; older deployments return
/// the created rows as a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum BulkResponse {
    Created(Vec<AttendanceRecord>),
    Result(BulkAttendanceResult),
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for HttpBackend {
    async fn list(&self, query: &ListQuery) -> Result<Page<R>, ApiError> {
        self.fetch_with_query(R::KIND.path().to_string(), query).await
    }

    async fn get(&self, id: &R::Id) -> Result<R, ApiError> {
        self.fetch(Method::GET, format!("{}/{}", R::KIND.path(), id))
            .await
    }

    async fn create(&self, dto: &R::Create) -> Result<R, ApiError> {
        self.submit(Method::POST, R::KIND.path().to_string(), dto)
            .await
    }

    async fn update(&self, id: &R::Id, patch: &R::Update) -> Result<R, ApiError> {
        self.submit(Method::PATCH, format!("{}/{}", R::KIND.path(), id), patch)
            .await
    }

    async fn delete(&self, id: &R::Id) -> Result<(), ApiError> {
        let path = format!("{}/{}", R::KIND.path(), id);
        let builder = self.request(Method::DELETE, &path);
        self.send(Method::DELETE, &path, builder).await?;
        Ok(())
    }
}

#[async_trait]
impl AttendanceApi for HttpBackend {
    async fn list_by_class_session(
        &self,
        session_id: &ClassSessionId,
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        self.fetch_items(format!("attendance/class-session/{}", session_id))
            .await
    }

    async fn create_bulk(
        &self,
        session_id: &ClassSessionId,
        rows: &[BulkAttendanceRow],
    ) -> Result<BulkAttendanceResult, ApiError> {
        let request = BulkAttendanceRequest {
            class_session_id: session_id.clone(),
            records: rows.to_vec(),
        };
        let response: BulkResponse = self
            .submit(Method::POST, "attendance/bulk".to_string(), &request)
            .await?;

        let result = match response {
            BulkResponse::Created(created) => BulkAttendanceResult {
                created,
                errors: Vec::new(),
            },
            BulkResponse::Result(result) => result,
        };
        Ok(result.account_for(rows))
    }
}

#[async_trait]
impl EnrollmentApi for HttpBackend {
    async fn students_by_class(&self, class_id: &ClassId) -> Result<Vec<Student>, ApiError> {
        self.fetch_items(format!("classes/{}/students", class_id))
            .await
    }
}

#[async_trait]
impl ScopedListApi for HttpBackend {
    async fn sessions_by_class(&self, class_id: &ClassId) -> Result<Vec<ClassSession>, ApiError> {
        self.fetch_items(format!("class-sessions/class/{}", class_id))
            .await
    }

    async fn invoices_by_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<Invoice>, ApiError> {
        self.fetch_items(format!("invoices/student/{}", student_id))
            .await
    }

    async fn students_by_parent(&self, parent_id: &ParentId) -> Result<Vec<Student>, ApiError> {
        self.fetch_items(format!("parents/{}/students", parent_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_error_field() {
        let msg = error_message(
            StatusCode::NOT_FOUND,
            r#"{"error":"Student not found","message":"ignored"}"#,
        );
        assert_eq!(msg, "Student not found");
    }

    #[test]
    fn test_error_message_joins_list() {
        let msg = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"message":["first_name is required","email must be valid"]}"#,
        );
        assert_eq!(msg, "first_name is required, email must be valid");
    }

    #[test]
    fn test_error_message_fallback_for_non_json() {
        let msg = error_message(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(msg, "Request failed with status 502 Bad Gateway");
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = ApiConfig::default().with_base_url("http://example.test/api/");
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(backend.base_url(), "http://example.test/api");
    }
}
