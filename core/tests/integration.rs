//! Lifecycle tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises the client over
//! real HTTP using ureq as the `Transport`. Validates that request building,
//! classification, decoding and paging work end to end with the server.

use std::net::SocketAddr;

use xms_core::tristate::UpdateValue;
use xms_core::types::{
    DeliveryReportQuery, DeliveryStatus, GroupCreate, GroupUpdate, MtBatchSmsCreate, MtBatchSmsUpdate,
    MtBatchTextSmsCreate, MtBatchTextSmsUpdate, MoSms, ParameterValues, Parameters, ReportType, TagsUpdate,
};
use xms_core::{
    ApiError, BatchFilter, ClientConfig, GroupFilter, HttpMethod, HttpRequest, HttpResponse, InboundFilter,
    TransportFailure, XmsClient,
};

const PLAN: &str = "it-plan";
const TOKEN: &str = "it-token";

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, req: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &req.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Execute an `HttpRequest` using ureq.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses come back as data and the core does the classification.
fn send(req: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();
    let body = req.body.as_deref().unwrap_or_default().as_bytes();

    let mut response = match req.method {
        HttpMethod::Get => with_headers(agent.get(&req.path), req).call(),
        HttpMethod::Delete => with_headers(agent.delete(&req.path), req).call(),
        HttpMethod::Post => with_headers(agent.post(&req.path), req).send(body),
        HttpMethod::Put => with_headers(agent.put(&req.path), req).send(body),
    }
    .map_err(|e| TransportFailure::new(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_vec()
        .map_err(|e| TransportFailure::new(e.to_string()))?;
    Ok(HttpResponse::new(status, body))
}

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            let config = mock_server::MockConfig {
                service_plan_id: PLAN.to_string(),
                token: TOKEN.to_string(),
            };
            mock_server::run(listener, config).await
        })
        .unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr, token: &str) -> XmsClient {
    XmsClient::new(ClientConfig::new(PLAN, token).with_endpoint(format!("http://{addr}/xms"))).unwrap()
}

fn text_batch(from: &str, to: &[&str]) -> MtBatchSmsCreate {
    let to = to.iter().map(|r| r.to_string()).collect();
    MtBatchTextSmsCreate::new(from, to, "Hello").into()
}

fn create(client: &XmsClient, batch: &MtBatchSmsCreate) -> xms_core::types::MtBatchSmsResult {
    let req = client.build_create_batch(batch).unwrap();
    client.parse_batch(&client.execute(&send, &req).unwrap()).unwrap()
}

#[test]
fn batch_lifecycle() {
    let client = client_for(start_server(), TOKEN);

    // Step 1: an empty collection is exactly one empty page.
    let batches = client.batches(&send, BatchFilter::default());
    let pages: Vec<_> = batches.iter().map(Result::unwrap).collect();
    assert_eq!(pages.len(), 1);
    assert!(pages[0].is_empty());

    // Step 2: create a text batch with optional fields.
    let batch: MtBatchSmsCreate = MtBatchTextSmsCreate {
        delivery_report: Some(ReportType::Full),
        callback_url: Some("http://example.com/cb".to_string()),
        client_reference: Some("order-17".to_string()),
        tags: vec!["campaign".to_string()],
        parameters: Parameters::new().with(
            "name",
            ParameterValues::new().with_recipient("111", "Ann").with_default("friend"),
        ),
        ..MtBatchTextSmsCreate::new("12345", vec!["111".to_string(), "222".to_string()], "Hi ${name}")
    }
    .into();
    let created = create(&client, &batch);
    assert_eq!(created.sender(), "12345");
    assert_eq!(created.recipients(), ["111", "222"]);
    assert!(!created.is_canceled());
    let id = created.id().to_string();

    // Step 3: fetch it back.
    let req = client.build_fetch_batch(&id);
    let fetched = client.parse_batch(&client.execute(&send, &req).unwrap()).unwrap();
    assert_eq!(fetched, created);

    // Step 4: update with set, reset and unset fields.
    let update: MtBatchSmsUpdate = MtBatchTextSmsUpdate {
        body: Some("Changed".to_string()),
        callback_url: UpdateValue::Reset,
        delivery_report: UpdateValue::Reset,
        to_add: vec!["333".to_string()],
        ..Default::default()
    }
    .into();
    let req = client.build_update_batch(&id, &update).unwrap();
    let updated = client.parse_batch(&client.execute(&send, &req).unwrap()).unwrap();
    let text = updated.as_text().unwrap();
    assert_eq!(text.body, "Changed");
    assert_eq!(text.base.callback_url, None);
    assert_eq!(text.base.delivery_report, Some(ReportType::None));
    assert_eq!(text.base.client_reference.as_deref(), Some("order-17"));
    assert_eq!(updated.recipients(), ["111", "222", "333"]);

    // Step 5: tags.
    let req = client.build_fetch_batch_tags(&id);
    let tags = client.parse_tags(&client.execute(&send, &req).unwrap()).unwrap();
    assert_eq!(tags.tags, ["campaign"]);
    let tags_update = TagsUpdate {
        add: vec!["vip".to_string()],
        remove: Vec::new(),
    };
    let req = client.build_update_batch_tags(&id, &tags_update).unwrap();
    let tags = client.parse_tags(&client.execute(&send, &req).unwrap()).unwrap();
    assert_eq!(tags.tags, ["campaign", "vip"]);

    // Step 6: delivery reports.
    let query = DeliveryReportQuery {
        report_type: Some(ReportType::Full),
        ..Default::default()
    };
    let req = client.build_fetch_delivery_report(&id, &query);
    let report = client
        .parse_delivery_report(&client.execute(&send, &req).unwrap())
        .unwrap();
    assert_eq!(report.batch_id, id);
    assert_eq!(report.total_message_count, 3);
    assert_eq!(report.statuses[0].status, DeliveryStatus::Queued);
    assert_eq!(report.statuses[0].recipients, ["111", "222", "333"]);

    let req = client.build_fetch_recipient_delivery_report(&id, "222");
    let report = client
        .parse_recipient_delivery_report(&client.execute(&send, &req).unwrap())
        .unwrap();
    assert_eq!(report.recipient, "222");
    assert!(!report.status.is_final());

    // Step 7: a server-side rejection surfaces its code and text.
    let update: MtBatchSmsUpdate = MtBatchTextSmsUpdate {
        to_remove: vec!["111".to_string(), "222".to_string(), "333".to_string()],
        ..Default::default()
    }
    .into();
    let req = client.build_update_batch(&id, &update).unwrap();
    match client.execute(&send, &req).unwrap_err() {
        ApiError::RequestRejected { code, .. } => assert_eq!(code, "missing_parameter"),
        other => panic!("expected RequestRejected, got {other:?}"),
    }

    // Step 8: cancel.
    let req = client.build_cancel_batch(&id);
    let canceled = client.parse_batch(&client.execute(&send, &req).unwrap()).unwrap();
    assert!(canceled.is_canceled());
    let req = client.build_fetch_delivery_report(&id, &DeliveryReportQuery::default());
    let report = client
        .parse_delivery_report(&client.execute(&send, &req).unwrap())
        .unwrap();
    assert_eq!(report.statuses[0].status, DeliveryStatus::Cancelled);

    // Step 9: unknown batch is NotFound with the exact URL.
    let req = client.build_fetch_batch("does-not-exist");
    match client.execute(&send, &req).unwrap_err() {
        ApiError::NotFound { url } => assert_eq!(url, req.path),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn batch_paging() {
    let client = client_for(start_server(), TOKEN);
    for from in ["111", "222", "111"] {
        create(&client, &text_batch(from, &["999"]));
    }

    let filter = BatchFilter {
        page_size: Some(2),
        ..Default::default()
    };
    let batches = client.batches(&send, filter);
    let sizes: Vec<u32> = batches.iter().map(|p| p.unwrap().size).collect();
    assert_eq!(sizes, [2, 1, 0]);

    // A second pass restarts from page 0.
    assert_eq!(batches.items().count(), 3);
    assert_eq!(batches.get(1).unwrap().size, 1);

    let filter = BatchFilter {
        senders: vec!["111".to_string()],
        ..Default::default()
    };
    let senders: Vec<String> = client
        .batches(&send, filter)
        .items()
        .map(|b| b.unwrap().sender().to_string())
        .collect();
    assert_eq!(senders, ["111", "111"]);
}

#[test]
fn null_body_update_keeps_the_body() {
    let client = client_for(start_server(), TOKEN);
    let id = create(&client, &text_batch("12345", &["111"])).id().to_string();

    let update: MtBatchSmsUpdate =
        serde_json::from_value(serde_json::json!({ "type": "mt_text", "body": null, "callback_url": null })).unwrap();
    let req = client.build_update_batch(&id, &update).unwrap();
    assert_eq!(req.body.as_deref(), Some(r#"{"type":"mt_text","callback_url":null}"#));

    let updated = client.parse_batch(&client.execute(&send, &req).unwrap()).unwrap();
    assert_eq!(updated.as_text().unwrap().body, "Hello");
}

#[test]
fn inbounds_are_listed_and_fetched() {
    let client = client_for(start_server(), TOKEN);

    let ids: Vec<String> = client
        .inbounds(&send, InboundFilter::default())
        .items()
        .map(|m| m.unwrap().id().to_string())
        .collect();
    assert_eq!(ids, ["mo-1", "mo-2", "mo-3"]);

    let req = client.build_fetch_inbound("mo-3");
    match client.parse_inbound(&client.execute(&send, &req).unwrap()).unwrap() {
        MoSms::Binary(m) => {
            assert_eq!(m.body, [1, 2, 3]);
            assert_eq!(m.udh, [0x05, 0x00, 0x03, 0xcc, 0x02, 0x01]);
        }
        other => panic!("expected binary message, got {other:?}"),
    }

    let filter = InboundFilter {
        recipients: vec!["12345".to_string()],
        ..Default::default()
    };
    assert_eq!(client.inbounds(&send, filter).items().count(), 2);
}

#[test]
fn group_lifecycle() {
    let client = client_for(start_server(), TOKEN);

    let group = GroupCreate {
        name: Some("friends".to_string()),
        members: vec!["111".to_string(), "222".to_string()],
        tags: vec!["team".to_string()],
        ..Default::default()
    };
    let req = client.build_create_group(&group).unwrap();
    let created = client.parse_group(&client.execute(&send, &req).unwrap()).unwrap();
    assert_eq!(created.size, 2);
    assert_eq!(created.name.as_deref(), Some("friends"));

    let update = GroupUpdate {
        name: UpdateValue::Reset,
        add: vec!["333".to_string()],
        ..Default::default()
    };
    let req = client.build_update_group(&created.id, &update).unwrap();
    let updated = client.parse_group(&client.execute(&send, &req).unwrap()).unwrap();
    assert_eq!(updated.name, None);
    assert_eq!(updated.size, 3);

    let req = client.build_fetch_group_members(&created.id);
    let members = client
        .parse_group_members(&client.execute(&send, &req).unwrap())
        .unwrap();
    assert_eq!(members, ["111", "222", "333"]);

    let filter = GroupFilter {
        tags: vec!["team".to_string()],
        ..Default::default()
    };
    let listed: Vec<String> = client
        .groups(&send, filter)
        .items()
        .map(|g| g.unwrap().id)
        .collect();
    assert_eq!(listed, [created.id.clone()]);

    let req = client.build_delete_group(&created.id);
    let deleted = client.execute(&send, &req).unwrap();
    assert_eq!(deleted.status(), 204);

    let req = client.build_fetch_group(&created.id);
    assert!(matches!(client.execute(&send, &req), Err(ApiError::NotFound { .. })));
}

#[test]
fn wrong_token_is_unauthorized() {
    let client = client_for(start_server(), "wrong-token");
    let req = client.build_fetch_batch("anything");
    match client.execute(&send, &req).unwrap_err() {
        ApiError::Unauthorized { credentials } => {
            assert_eq!(credentials.service_plan_id, PLAN);
            assert_eq!(credentials.token, "wrong-token");
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[test]
fn unreachable_server_is_a_transport_failure() {
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let client = client_for(addr, TOKEN);
    let req = client.build_fetch_batch("b1");
    match client.execute(&send, &req).unwrap_err() {
        ApiError::Transport { url, .. } => assert_eq!(url, req.path),
        other => panic!("expected Transport, got {other:?}"),
    }
}
