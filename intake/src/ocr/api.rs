use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::preprocessing::PreparedImage;
use super::provider::{IdentityRecognizer, OcrAttemptConfig, SecondaryReading, TextRecognizer};
use crate::config::{OcrConfig, SecondaryOcrConfig, DEFAULT_OCR_BASE_URL};
use crate::error::{IntakeError, Result};
use crate::extraction::normalize_record;
use crate::models::{CanonicalIdentityRecord, IdentityField};

/// OCR.space-compatible `parse/image` client.
#[derive(Clone, Debug)]
pub struct OcrSpaceClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorMessage {
    fn joined(&self) -> String {
        match self {
            ErrorMessage::One(message) => message.clone(),
            ErrorMessage::Many(messages) => messages.join("; "),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<ErrorMessage>,
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
}

fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| IntakeError::ProviderUnavailable(format!("Failed to create HTTP client: {e}")))
}

fn file_part(image: &PreparedImage) -> Result<multipart::Part> {
    multipart::Part::bytes(image.bytes.clone())
        .file_name(image.file_name())
        .mime_str(&image.mime)
        .map_err(|e| IntakeError::UnsupportedFormat(format!("Invalid MIME type: {e}")))
}

fn transport_error(e: reqwest::Error) -> IntakeError {
    if e.is_timeout() {
        IntakeError::ProviderTransport("Request timeout".to_string())
    } else {
        IntakeError::ProviderTransport(format!("Request failed: {e}"))
    }
}

fn map_http_error(status: StatusCode, body: &str) -> IntakeError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => IntakeError::ProviderTransport(
            format!("Authentication failed ({status}): {body}"),
        ),
        StatusCode::TOO_MANY_REQUESTS => {
            IntakeError::ProviderTransport(format!("Rate limit exceeded ({status}): {body}"))
        }
        _ => IntakeError::ProviderTransport(format!("OCR API error ({status}): {body}")),
    }
}

impl OcrSpaceClient {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| IntakeError::ProviderUnavailable("OCR_API_KEY is not set".to_string()))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OCR_BASE_URL.to_string());

        Ok(Self {
            client: build_client(config.timeout_secs)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TextRecognizer for OcrSpaceClient {
    async fn recognize(
        &self,
        image: &PreparedImage,
        attempt: &OcrAttemptConfig,
    ) -> Result<String> {
        let form = multipart::Form::new()
            .text("apikey", self.api_key.clone())
            .text("language", attempt.language.clone())
            .text("OCREngine", attempt.engine.clone())
            .text("isOverlayRequired", "false")
            .text("scale", "true")
            .text("detectOrientation", "true")
            .part("file", file_part(image)?);

        let url = format!("{}/parse/image", self.base_url);
        debug!(
            language = %attempt.language,
            engine = %attempt.engine,
            bytes = image.bytes.len(),
            "Sending OCR request to {}",
            url
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(map_http_error(status, &body));
        }

        let parsed: OcrSpaceResponse = response.json().await.map_err(|e| {
            IntakeError::ProviderTransport(format!("Failed to parse OCR response: {e}"))
        })?;

        if parsed.is_errored_on_processing {
            let message = parsed
                .error_message
                .map(|m| m.joined())
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(IntakeError::ProviderProcessing(message));
        }

        let text = parsed
            .parsed_results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|result| result.parsed_text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(IntakeError::ProviderProcessing(
                "OCR response contained empty text".to_string(),
            ));
        }

        Ok(text)
    }
}

/// Client for the backend's own KTP reader, which returns fields rather
/// than text.
#[derive(Clone, Debug)]
pub struct KtpBackendClient {
    client: Client,
    url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KtpBackendResponse {
    #[serde(rename = "Data", alias = "data", default)]
    data: Option<Map<String, Value>>,
    #[serde(default)]
    warning: Option<String>,
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Maps the backend's payload onto the canonical record. The NIK arrives
/// as `nikKTP`; every other key already matches.
fn record_from_data(data: &Map<String, Value>) -> CanonicalIdentityRecord {
    let mut record = CanonicalIdentityRecord::default();
    for field in IdentityField::ALL {
        let value = match field {
            IdentityField::Nik => data.get("nikKTP").or_else(|| data.get("nik")),
            _ => data.get(field.key()),
        };
        if let Some(value) = value.and_then(scalar_text) {
            record.set(field, value);
        }
    }
    normalize_record(record)
}

impl KtpBackendClient {
    pub fn new(config: &SecondaryOcrConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            url: config.url.clone(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl IdentityRecognizer for KtpBackendClient {
    async fn recognize_identity(&self, image: &PreparedImage) -> Result<SecondaryReading> {
        let form = multipart::Form::new().part("fotoKTP", file_part(image)?);

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        debug!(bytes = image.bytes.len(), "Sending KTP to backend OCR");
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(map_http_error(status, &body));
        }

        let parsed: KtpBackendResponse = response.json().await.map_err(|e| {
            IntakeError::ProviderTransport(format!("Failed to parse KTP OCR response: {e}"))
        })?;

        let data = parsed.data.ok_or_else(|| {
            IntakeError::ProviderProcessing("KTP OCR response has no Data".to_string())
        })?;

        Ok(SecondaryReading {
            fields: record_from_data(&data),
            warning: parsed.warning.filter(|w| !w.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_string_contains, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_config(base_url: String) -> OcrConfig {
        OcrConfig {
            api_key: Some("test-api-key".to_string()),
            base_url: Some(base_url),
            ..OcrConfig::default()
        }
    }

    fn test_image() -> PreparedImage {
        PreparedImage {
            bytes: b"fake jpeg".to_vec(),
            mime: "image/jpeg".to_string(),
            tier: None,
        }
    }

    fn attempt() -> OcrAttemptConfig {
        OcrAttemptConfig::new("ind", "2")
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = OcrSpaceClient::new(&OcrConfig::default());
        assert!(matches!(result, Err(IntakeError::ProviderUnavailable(_))));
    }

    #[tokio::test]
    async fn test_form_fields_and_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/parse/image"))
            .and(body_string_contains("test-api-key"))
            .and(body_string_contains("name=\"OCREngine\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "IsErroredOnProcessing": false,
                "ParsedResults": [
                    {"ParsedText": "NIK : 3201234567890001"},
                    {"ParsedText": "Nama : BUDI"}
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OcrSpaceClient::new(&test_config(mock_server.uri())).unwrap();
        let text = client.recognize(&test_image(), &attempt()).await.unwrap();
        assert_eq!(text, "NIK : 3201234567890001\nNama : BUDI");
    }

    #[tokio::test]
    async fn test_processing_error_with_message_list() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/parse/image"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "IsErroredOnProcessing": true,
                "ErrorMessage": ["File failed validation", "Image too small"],
                "ParsedResults": null
            })))
            .mount(&mock_server)
            .await;

        let client = OcrSpaceClient::new(&test_config(mock_server.uri())).unwrap();
        let error = client.recognize(&test_image(), &attempt()).await.unwrap_err();
        match error {
            IntakeError::ProviderProcessing(message) => {
                assert_eq!(message, "File failed validation; Image too small")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_text_is_processing_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/parse/image"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "IsErroredOnProcessing": false,
                "ErrorMessage": "",
                "ParsedResults": [{"ParsedText": "  \r\n"}]
            })))
            .mount(&mock_server)
            .await;

        let client = OcrSpaceClient::new(&test_config(mock_server.uri())).unwrap();
        let error = client.recognize(&test_image(), &attempt()).await.unwrap_err();
        assert!(matches!(error, IntakeError::ProviderProcessing(_)));
    }

    #[tokio::test]
    async fn test_http_error_is_transport_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/parse/image"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&mock_server)
            .await;

        let client = OcrSpaceClient::new(&test_config(mock_server.uri())).unwrap();
        let error = client.recognize(&test_image(), &attempt()).await.unwrap_err();
        match error {
            IntakeError::ProviderTransport(message) => assert!(message.contains("403")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_backend_reading_is_normalized() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ocr-ktp"))
            .and(header("Authorization", "Bearer backend-token"))
            .and(body_string_contains("name=\"fotoKTP\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Data": {
                    "nikKTP": "3201234567890001",
                    "namaLengkap": " SITI  AMINAH ",
                    "tanggalLahir": "02-03-1988",
                    "jenisKelamin": "PEREMPUAN",
                    "kewarganegaraan": "INDONESIA",
                    "rt": null
                },
                "warning": "Foto agak buram"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = KtpBackendClient::new(&SecondaryOcrConfig {
            url: format!("{}/ocr-ktp", mock_server.uri()),
            token: Some("backend-token".to_string()),
            timeout_secs: 5,
        })
        .unwrap();

        let reading = client.recognize_identity(&test_image()).await.unwrap();
        assert_eq!(reading.fields.nik, "3201234567890001");
        assert_eq!(reading.fields.nama_lengkap, "SITI AMINAH");
        assert_eq!(reading.fields.tanggal_lahir, "1988-03-02");
        assert_eq!(reading.fields.jenis_kelamin, "Perempuan");
        assert_eq!(reading.fields.kewarganegaraan, "WNI");
        assert!(reading.fields.rt.is_empty());
        assert_eq!(reading.warning.as_deref(), Some("Foto agak buram"));
    }

    #[tokio::test]
    async fn test_backend_without_data_is_processing_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "gagal"})),
            )
            .mount(&mock_server)
            .await;

        let client = KtpBackendClient::new(&SecondaryOcrConfig {
            url: mock_server.uri(),
            token: None,
            timeout_secs: 5,
        })
        .unwrap();

        let error = client.recognize_identity(&test_image()).await.unwrap_err();
        assert!(matches!(error, IntakeError::ProviderProcessing(_)));
    }
}
