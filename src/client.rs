//! Corpus service client.
//!
//! [`CorpusService`] is the seam between the CLI/pipeline and the remote
//! service; [`VectaraClient`] implements it over the Vectara REST v1 API
//! using a blocking `reqwest` client. Every call is synchronous.
//!
//! # Retry Strategy
//!
//! Transient failures are retried with exponential backoff, up to
//! `service.max_retries` extra attempts:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Remote failures are surfaced as [`Error::Service`] carrying the response
//! body verbatim.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{multipart, Client, RequestBuilder};
use serde_json::{json, Value};

use crate::config::{load_config, Config, ServiceConfig};
use crate::credentials::{CredentialStore, Credentials};
use crate::error::{Error, Result};
use crate::models::{
    CorpusConfig, CorpusId, Document, IndexAck, QueryHit, QueryRequest,
};

/// Operations offered by the corpus service.
pub trait CorpusService {
    /// Create a corpus and return the id assigned by the service.
    fn create_corpus(&self, config: &CorpusConfig) -> Result<CorpusId>;

    /// Delete a corpus. Unknown ids are reported as a service error.
    fn delete_corpus(&self, corpus_id: CorpusId) -> Result<()>;

    /// Upload one file for service-side extraction and indexing.
    ///
    /// With `return_extracted` set, returns the text the service extracted.
    fn upload_file(
        &self,
        corpus_id: CorpusId,
        path: &Path,
        metadata: Option<&Value>,
        return_extracted: bool,
    ) -> Result<Option<String>>;

    /// Index a document built from text.
    fn index_document(&self, document: &Document) -> Result<IndexAck>;

    /// Index a single chunk of text with attached JSON metadata.
    fn index_text(
        &self,
        corpus_id: CorpusId,
        document_id: &str,
        text: &str,
        metadata_json: &str,
    ) -> Result<IndexAck>;

    /// Run a search request against one corpus.
    fn query(&self, request: &QueryRequest) -> Result<Vec<QueryHit>>;
}

/// HTTP client for the Vectara REST API.
pub struct VectaraClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
    max_retries: u32,
}

impl VectaraClient {
    pub fn new(credentials: Credentials, config: &ServiceConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            max_retries: config.max_retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("customer-id", &self.credentials.customer_id)
            .header("x-api-key", &self.credentials.api_key)
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        self.send_with_retry(path, || {
            Ok(self
                .authorized(self.http.post(&url))
                .header("Content-Type", "application/json")
                .json(body))
        })
    }

    /// Send a request, retrying transient failures. `build` is called once
    /// per attempt since request bodies are consumed on send.
    fn send_with_retry<F>(&self, operation: &str, build: F) -> Result<Value>
    where
        F: Fn() -> Result<RequestBuilder>,
    {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::warn!(
                    operation,
                    attempt,
                    max_retries = self.max_retries,
                    backoff_secs = delay.as_secs(),
                    "retrying request"
                );
                std::thread::sleep(delay);
            }

            match build()?.send() {
                Ok(response) => {
                    let status = response.status();
                    let body_text = match response.text() {
                        Ok(text) => text,
                        Err(e) => {
                            last_err = Some(Error::service(
                                Some(status.as_u16()),
                                format!("failed to read response body: {}", e),
                            ));
                            continue;
                        }
                    };

                    if status.is_success() {
                        return parse_body(&body_text);
                    }

                    let err = Error::service(Some(status.as_u16()), body_text);
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    last_err = Some(Error::service(None, e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::service(None, "request failed after retries")))
    }
}

/// Load the config file and build a client from the credentials stored in it.
pub fn connect(config_path: &Path) -> Result<(Config, VectaraClient)> {
    let config = load_config(config_path)?;
    let credentials = CredentialStore::new(config_path).get_api_keys()?;
    let client = VectaraClient::new(credentials, &config.service)?;
    Ok((config, client))
}

impl CorpusService for VectaraClient {
    fn create_corpus(&self, config: &CorpusConfig) -> Result<CorpusId> {
        let resp = self.post_json("/v1/create-corpus", &create_corpus_body(config))?;
        parse_create_corpus_response(&resp)
    }

    fn delete_corpus(&self, corpus_id: CorpusId) -> Result<()> {
        let body = json!({
            "customerId": self.credentials.customer_id,
            "corpusId": corpus_id,
        });
        let resp = self.post_json("/v1/delete-corpus", &body)?;
        check_status(&resp)
    }

    fn upload_file(
        &self,
        corpus_id: CorpusId,
        path: &Path,
        metadata: Option<&Value>,
        return_extracted: bool,
    ) -> Result<Option<String>> {
        let mut url = format!(
            "{}?c={}&o={}",
            self.url("/v1/upload"),
            self.credentials.customer_id,
            corpus_id
        );
        if return_extracted {
            url.push_str("&d=true");
        }
        tracing::debug!(%url, file = %path.display(), "upload");

        let resp = self.send_with_retry("/v1/upload", || {
            let mut form = multipart::Form::new().file("file", path)?;
            if let Some(meta) = metadata {
                form = form.text("doc_metadata", meta.to_string());
            }
            Ok(self.authorized(self.http.post(&url)).multipart(form))
        })?;

        parse_upload_response(&resp, return_extracted)
    }

    fn index_document(&self, document: &Document) -> Result<IndexAck> {
        let body = index_body(
            &self.credentials.customer_id,
            document.corpus_id,
            &document.document_id,
            &document.title,
            &document.metadata.to_string(),
            &document.section_text,
        );
        let resp = self.post_json("/v1/index", &body)?;
        parse_index_response(&resp)
    }

    fn index_text(
        &self,
        corpus_id: CorpusId,
        document_id: &str,
        text: &str,
        metadata_json: &str,
    ) -> Result<IndexAck> {
        let body = index_body(
            &self.credentials.customer_id,
            corpus_id,
            document_id,
            "",
            metadata_json,
            text,
        );
        let resp = self.post_json("/v1/index", &body)?;
        parse_index_response(&resp)
    }

    fn query(&self, request: &QueryRequest) -> Result<Vec<QueryHit>> {
        let body = query_body(&self.credentials.customer_id, request);
        let resp = self.post_json("/v1/query", &body)?;
        parse_query_response(&resp)
    }
}

fn parse_body(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text)
        .map_err(|e| Error::service(None, format!("invalid JSON response ({}): {}", e, text)))
}

pub(crate) fn create_corpus_body(config: &CorpusConfig) -> Value {
    json!({ "corpus": config })
}

pub(crate) fn index_body(
    customer_id: &str,
    corpus_id: CorpusId,
    document_id: &str,
    title: &str,
    metadata_json: &str,
    text: &str,
) -> Value {
    json!({
        "customerId": customer_id,
        "corpusId": corpus_id,
        "document": {
            "documentId": document_id,
            "title": title,
            "metadataJson": metadata_json,
            "section": [{ "text": text }],
        },
    })
}

pub(crate) fn query_body(customer_id: &str, request: &QueryRequest) -> Value {
    let mut corpus_key = json!({
        "customerId": customer_id,
        "corpusId": request.corpus_id,
    });
    if let Some(filter) = &request.metadata_filter {
        corpus_key["metadataFilter"] = json!(filter);
    }
    json!({
        "query": [{
            "query": request.query,
            "start": request.start,
            "numResults": request.num_results,
            "corpusKey": [corpus_key],
        }]
    })
}

/// Fail if a response carries a `status.code` other than `OK`.
///
/// Authentication codes are mapped onto their HTTP equivalents so the
/// dispatcher can tell them apart.
pub(crate) fn check_status(resp: &Value) -> Result<()> {
    let status = resp
        .get("status")
        .or_else(|| resp.get("response").and_then(|r| r.get("status")));

    let code = match status.and_then(|s| s.get("code")).and_then(Value::as_str) {
        None | Some("OK") => return Ok(()),
        Some(code) => code,
    };

    let http_equiv = match code {
        "UNAUTHENTICATED" => Some(401),
        "PERMISSION_DENIED" => Some(403),
        "NOT_FOUND" => Some(404),
        "ALREADY_EXISTS" => Some(409),
        _ => None,
    };
    Err(Error::service(http_equiv, resp.to_string()))
}

pub(crate) fn parse_create_corpus_response(resp: &Value) -> Result<CorpusId> {
    check_status(resp)?;
    resp.get("corpusId")
        .and_then(|id| id.as_u64().or_else(|| id.as_str().and_then(|s| s.parse().ok())))
        .ok_or_else(|| Error::service(None, format!("response has no corpusId: {}", resp)))
}

pub(crate) fn parse_index_response(resp: &Value) -> Result<IndexAck> {
    check_status(resp)?;
    let status = resp.get("status");
    let field = |name: &str| {
        status
            .and_then(|s| s.get(name))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let mut ack = IndexAck {
        status_code: field("code"),
        status_detail: field("statusDetail"),
    };
    if ack.status_code.is_empty() {
        ack.status_code = "OK".to_string();
    }
    Ok(ack)
}

pub(crate) fn parse_upload_response(resp: &Value, return_extracted: bool) -> Result<Option<String>> {
    check_status(resp)?;
    if !return_extracted {
        return Ok(None);
    }
    Ok(resp.get("document").map(extract_document_text))
}

/// Concatenate the text of every (possibly nested) section, in order.
pub(crate) fn extract_document_text(document: &Value) -> String {
    fn collect<'a>(node: &'a Value, out: &mut Vec<&'a str>) {
        if let Some(sections) = node.get("section").and_then(Value::as_array) {
            for section in sections {
                if let Some(text) = section.get("text").and_then(Value::as_str) {
                    if !text.is_empty() {
                        out.push(text);
                    }
                }
                collect(section, out);
            }
        }
    }

    let mut parts = Vec::new();
    collect(document, &mut parts);
    parts.join("\n")
}

pub(crate) fn parse_query_response(resp: &Value) -> Result<Vec<QueryHit>> {
    check_status(resp)?;
    let set = match resp
        .get("responseSet")
        .and_then(Value::as_array)
        .and_then(|sets| sets.first())
    {
        Some(set) => set,
        None => return Ok(Vec::new()),
    };

    let documents: Vec<&Value> = set
        .get("document")
        .and_then(Value::as_array)
        .map(|docs| docs.iter().collect())
        .unwrap_or_default();

    let hits = set
        .get("response")
        .and_then(Value::as_array)
        .map(|responses| {
            responses
                .iter()
                .map(|r| {
                    let document_id = r
                        .get("documentIndex")
                        .and_then(Value::as_u64)
                        .and_then(|i| documents.get(i as usize))
                        .and_then(|d| d.get("id"))
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    QueryHit {
                        text: r
                            .get("text")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        score: r.get("score").and_then(Value::as_f64).unwrap_or(0.0),
                        document_id,
                        metadata: name_value_pairs(r.get("metadata")),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(hits)
}

fn name_value_pairs(list: Option<&Value>) -> std::collections::BTreeMap<String, String> {
    list.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|m| {
                    Some((
                        m.get("name")?.as_str()?.to_string(),
                        m.get("value")?.as_str()?.to_string(),
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Serve one connection: read the request head, then write `raw` verbatim.
    fn serve_once(raw: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                read_request(&mut stream);
                let _ = stream.write_all(raw.as_bytes());
                let _ = stream.flush();
            }
        });
        url
    }

    fn read_request(stream: &mut std::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                return;
            }
        }
    }

    fn test_client(base_url: String) -> VectaraClient {
        let config = ServiceConfig {
            base_url,
            timeout_secs: 5,
            max_retries: 0,
        };
        let credentials = Credentials {
            customer_id: "1234".to_string(),
            api_key: "zqt_key".to_string(),
        };
        VectaraClient::new(credentials, &config).unwrap()
    }

    #[test]
    fn test_truncated_success_body_is_an_error() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 500\r\n\
             Connection: close\r\n\r\n{\"status\": {\"code\": \"OK\"",
        );
        let client = test_client(url);

        let err = client
            .index_text(2, "doc1.txt", "chunk", r#"{"entities":[]}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Service { status: Some(200), .. }));
        assert!(err.to_string().contains("failed to read response body"));
    }

    #[test]
    fn test_complete_success_body_is_acknowledged() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 24\r\n\
             Connection: close\r\n\r\n{\"status\":{\"code\":\"OK\"}}",
        );
        let client = test_client(url);

        let ack = client.index_text(2, "doc1.txt", "chunk", "{}").unwrap();
        assert_eq!(ack.status_code, "OK");
    }

    #[test]
    fn test_create_corpus_body_shape() {
        let mut cfg = CorpusConfig::new("Research", "papers");
        cfg.id = Some(7);
        let body = create_corpus_body(&cfg);
        assert_eq!(body["corpus"]["name"], "Research");
        assert_eq!(body["corpus"]["id"], 7);
        assert_eq!(body["corpus"]["encoderId"], 1);
        assert_eq!(body["corpus"]["public"], false);
        assert!(body["corpus"]["customDimensions"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_create_corpus_response_returns_assigned_id() {
        let resp = json!({"corpusId": 42, "status": {"code": "OK", "statusDetail": ""}});
        assert_eq!(parse_create_corpus_response(&resp).unwrap(), 42);

        let resp = json!({"corpusId": "17"});
        assert_eq!(parse_create_corpus_response(&resp).unwrap(), 17);
    }

    #[test]
    fn test_create_corpus_response_without_id_is_service_error() {
        let resp = json!({"status": {"code": "OK"}});
        assert!(matches!(
            parse_create_corpus_response(&resp),
            Err(Error::Service { .. })
        ));
    }

    #[test]
    fn test_non_ok_status_surfaces_body() {
        let resp = json!({"status": {"code": "NOT_FOUND", "statusDetail": "Corpus 9 not found"}});
        let err = check_status(&resp).unwrap_err();
        assert!(err.to_string().contains("Corpus 9 not found"));
        assert!(matches!(err, Error::Service { status: Some(404), .. }));

        let resp = json!({"status": {"code": "UNAUTHENTICATED"}});
        assert!(check_status(&resp).unwrap_err().is_auth_failure());
    }

    #[test]
    fn test_index_body_carries_metadata_json() {
        let body = index_body("1234", 3, "doc1.txt", "", r#"{"entities":[]}"#, "chunk text");
        assert_eq!(body["corpusId"], 3);
        assert_eq!(body["document"]["documentId"], "doc1.txt");
        assert_eq!(body["document"]["metadataJson"], r#"{"entities":[]}"#);
        assert_eq!(body["document"]["section"][0]["text"], "chunk text");
    }

    #[test]
    fn test_index_response_defaults_to_ok() {
        let ack = parse_index_response(&json!({"quotaConsumed": {"numChars": 10}})).unwrap();
        assert_eq!(ack.status_code, "OK");

        let err = parse_index_response(&json!({"status": {"code": "ALREADY_EXISTS"}})).unwrap_err();
        assert!(matches!(err, Error::Service { status: Some(409), .. }));
    }

    #[test]
    fn test_upload_response_extracts_nested_sections() {
        let resp = json!({
            "response": {"status": {"code": "OK"}},
            "document": {
                "documentId": "doc1.pdf",
                "section": [
                    {"text": "First."},
                    {"title": "Part", "section": [{"text": "Second."}, {"text": ""}]},
                    {"text": "Third."}
                ]
            }
        });
        let text = parse_upload_response(&resp, true).unwrap();
        assert_eq!(text.as_deref(), Some("First.\nSecond.\nThird."));
        assert_eq!(parse_upload_response(&resp, false).unwrap(), None);
    }

    #[test]
    fn test_upload_response_failure_status() {
        let resp = json!({"response": {"status": {"code": "ALREADY_EXISTS", "statusDetail": "dup"}}});
        assert!(parse_upload_response(&resp, true).is_err());
    }

    #[test]
    fn test_query_body_and_response() {
        let req = QueryRequest {
            corpus_id: 5,
            query: "who founded it?".to_string(),
            start: 0,
            num_results: 3,
            metadata_filter: Some("doc.lang = 'en'".to_string()),
        };
        let body = query_body("1234", &req);
        assert_eq!(body["query"][0]["numResults"], 3);
        assert_eq!(body["query"][0]["corpusKey"][0]["corpusId"], 5);
        assert_eq!(
            body["query"][0]["corpusKey"][0]["metadataFilter"],
            "doc.lang = 'en'"
        );

        let resp = json!({
            "responseSet": [{
                "response": [
                    {"text": "Ada founded it.", "score": 0.91, "documentIndex": 1,
                     "metadata": [{"name": "lang", "value": "en"}]},
                    {"text": "Unrelated.", "score": 0.12, "documentIndex": 0}
                ],
                "document": [{"id": "a.txt"}, {"id": "b.txt"}]
            }]
        });
        let hits = parse_query_response(&resp).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document_id.as_deref(), Some("b.txt"));
        assert_eq!(hits[0].metadata.get("lang").map(String::as_str), Some("en"));
        assert!((hits[1].score - 0.12).abs() < 1e-9);
    }

    #[test]
    fn test_query_response_without_results() {
        assert!(parse_query_response(&json!({})).unwrap().is_empty());
    }
}
