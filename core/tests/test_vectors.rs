//! Verify classification, decoding and request building against JSON test
//! vectors stored in `test-vectors/`.
//!
//! Request bodies are compared as parsed JSON, not raw strings, so field
//! ordering never causes a false negative.

use serde_json::Value;
use xms_core::decode::decode;
use xms_core::types::{BatchDeliveryReport, CallbackEvent, MoSms, MtBatchSmsResult, MtBatchSmsUpdate};
use xms_core::{ApiError, ClientConfig, HttpMethod, HttpResponse, XmsClient};

const HOST: &str = "http://localhost:3000";

fn client() -> XmsClient {
    XmsClient::new(ClientConfig::new("plan", "token").with_endpoint(format!("{HOST}/xms"))).unwrap()
}

fn cases(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn error_kind(err: &ApiError) -> &'static str {
    match err {
        ApiError::Transport { .. } => "Transport",
        ApiError::Unauthorized { .. } => "Unauthorized",
        ApiError::NotFound { .. } => "NotFound",
        ApiError::RequestRejected { .. } => "RequestRejected",
        ApiError::UnexpectedStatus { .. } => "UnexpectedStatus",
        ApiError::MalformedResponse { .. } => "MalformedResponse",
        ApiError::UnexpectedShape { .. } => "UnexpectedShape",
        ApiError::Encoding(_) => "Encoding",
    }
}

/// Check an error against the `expected` object of a vector.
fn assert_error(name: &str, err: &ApiError, expected: &Value, body: &str) {
    assert_eq!(error_kind(err), expected["kind"].as_str().unwrap(), "{name}: kind ({err})");
    match err {
        ApiError::UnexpectedShape { discriminator, .. } => {
            assert_eq!(discriminator.as_deref(), expected["discriminator"].as_str(), "{name}: discriminator");
        }
        ApiError::RequestRejected { code, text } => {
            assert_eq!(code, expected["code"].as_str().unwrap(), "{name}: code");
            assert_eq!(text, expected["text"].as_str().unwrap(), "{name}: text");
        }
        _ => {}
    }
    if let Some(payload) = err.payload() {
        assert_eq!(payload, body.as_bytes(), "{name}: payload must be the full body");
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[test]
fn classify_test_vectors() {
    let c = client();
    let req = c.build_fetch_batch("b1");
    for case in cases(include_str!("../../test-vectors/classify.json")) {
        let name = case["name"].as_str().unwrap();
        let body = case["body"].as_str().unwrap();
        let status = case["status"].as_u64().unwrap() as u16;
        let expected = &case["expected"];

        match c.classify(&req, Ok(HttpResponse::new(status, body))) {
            Ok(ok) => {
                assert_eq!(expected["kind"], "Success", "{name}: kind");
                assert_eq!(ok.status(), status, "{name}: status");
                assert_eq!(ok.body(), body.as_bytes(), "{name}: body");
            }
            Err(err) => assert_error(name, &err, expected, body),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode `body` as `family` and summarize the result as `(variant, id)`.
fn decode_family(c: &XmsClient, family: &str, body: &str) -> Result<Value, ApiError> {
    let ok = c
        .classify(&c.build_fetch_batch("b1"), Ok(HttpResponse::new(200, body)))
        .unwrap();
    Ok(match family {
        "batch" => {
            let batch = c.parse_batch(&ok)?;
            let variant = match batch {
                MtBatchSmsResult::Text(_) => "mt_text",
                MtBatchSmsResult::Binary(_) => "mt_binary",
            };
            serde_json::json!({ "variant": variant, "id": batch.id() })
        }
        "inbound" => {
            let inbound = c.parse_inbound(&ok)?;
            let variant = match inbound {
                MoSms::Text(_) => "mo_text",
                MoSms::Binary(_) => "mo_binary",
            };
            serde_json::json!({ "variant": variant, "id": inbound.id() })
        }
        "delivery_report" => {
            let report: BatchDeliveryReport = c.parse_delivery_report(&ok)?;
            serde_json::json!({ "variant": "delivery_report_sms", "id": report.batch_id })
        }
        "callback" => match decode::<CallbackEvent>(body.as_bytes())? {
            CallbackEvent::Inbound(m) => serde_json::json!({ "variant": "inbound", "id": m.id() }),
            CallbackEvent::BatchReport(r) => {
                serde_json::json!({ "variant": "delivery_report_sms", "id": r.batch_id })
            }
            CallbackEvent::RecipientReport(r) => {
                serde_json::json!({ "variant": "recipient_delivery_report_sms", "id": r.batch_id })
            }
        },
        "batches_page" => {
            let page = c.parse_batches_page(&ok)?;
            serde_json::json!({ "size": page.size, "total_size": page.total_size })
        }
        other => panic!("unknown family: {other}"),
    })
}

#[test]
fn decode_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/decode.json")) {
        let name = case["name"].as_str().unwrap();
        let family = case["family"].as_str().unwrap();
        let body = case["body"].as_str().unwrap();
        let expected = &case["expected"];

        match decode_family(&c, family, body) {
            Ok(summary) => {
                assert_eq!(expected["kind"], "Ok", "{name}: expected failure, got {summary}");
                for (key, value) in summary.as_object().unwrap() {
                    assert_eq!(&expected[key], value, "{name}: {key}");
                }
            }
            Err(err) => assert_error(name, &err, expected, body),
        }
    }
}

// ---------------------------------------------------------------------------
// Update requests
// ---------------------------------------------------------------------------

#[test]
fn update_request_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/update_requests.json")) {
        let name = case["name"].as_str().unwrap();
        let input: MtBatchSmsUpdate = serde_json::from_value(case["input"].clone()).unwrap();
        let expected_req = &case["expected_request"];

        let req = c.build_update_batch("b1", &input).unwrap();
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.path, format!("{HOST}{}", expected_req["path"].as_str().unwrap()), "{name}: path");

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        let req_body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(req_body, expected_req["body"], "{name}: body");
    }
}
