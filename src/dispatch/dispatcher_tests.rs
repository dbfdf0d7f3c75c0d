//! Tests for `Dispatcher`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::{DispatchError, DispatchOutcome, Dispatcher, Event, Outcome};
use super::dispatcher::abandoned_ids;
use crate::model::{OwnerScope, TriggerType, Webhook};
use crate::render::RequestBody;
use crate::store::mock::FailingLogStore;
use crate::store::{MemoryStore, WebhookStore};
use crate::template::HandlebarsEngine;
use crate::time::mock::MockClock;
use crate::transport::mock::{MockClient, response};
use crate::transport::{HttpClient, HttpError, HttpRequest, HttpResponse};

type TestDispatcher = Dispatcher<MemoryStore, Arc<MockClient>, HandlebarsEngine, MockClock>;

const NOW: i64 = 1_700_000_000;

fn hook(id: &str) -> Webhook {
    Webhook::new(id)
        .with_url(format!("https://example.com/{id}"))
        .with_trigger_type(TriggerType::AlertGroupNew)
}

fn dispatcher(webhooks: Vec<Webhook>, client: &Arc<MockClient>) -> TestDispatcher {
    Dispatcher::new(
        MemoryStore::with_webhooks(webhooks),
        Arc::clone(client),
        HandlebarsEngine::new(),
    )
    .with_clock(MockClock::new(NOW))
}

fn new_group(data: Value) -> Event {
    Event::new(TriggerType::AlertGroupNew, data)
}

mod builder {
    use super::*;

    #[test]
    fn defaults() {
        let d = dispatcher(vec![], &Arc::new(MockClient::success()));
        assert_eq!(d.max_concurrency(), 8);
        assert_eq!(d.request_timeout(), Duration::from_secs(4));
    }

    #[test]
    fn zero_concurrency_is_raised_to_one() {
        let d = dispatcher(vec![], &Arc::new(MockClient::success())).with_max_concurrency(0);
        assert_eq!(d.max_concurrency(), 1);
    }
}

mod dispatch {
    use super::*;

    #[tokio::test]
    async fn no_matching_webhooks_does_nothing() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(vec![hook("WH1")], &client);

        let outcomes = d
            .dispatch(&Event::new(TriggerType::AlertGroupResolve, json!({})))
            .await;

        assert!(outcomes.is_empty());
        assert_eq!(client.calls(), 0);
        assert!(d.store().logs().is_empty());
    }

    #[tokio::test]
    async fn outcomes_follow_store_order() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(vec![hook("WH3"), hook("WH1"), hook("WH2")], &client);

        let outcomes = d.dispatch(&new_group(json!({"id": 1}))).await;

        let ids: Vec<_> = outcomes.iter().map(|o| o.webhook_id.as_str()).collect();
        assert_eq!(ids, ["WH3", "WH1", "WH2"]);
        assert!(outcomes.iter().all(DispatchOutcome::is_delivered));
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn only_webhooks_in_scope_fire() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(
            vec![
                hook("ACME").with_owner(OwnerScope::organization("acme")),
                hook("GLOBEX").with_owner(OwnerScope::organization("globex")),
            ],
            &client,
        );

        let event = new_group(json!({})).with_scope(OwnerScope::organization("acme"));
        let outcomes = d.dispatch(&event).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].webhook_id, "ACME");
    }

    #[tokio::test]
    async fn successful_delivery_is_logged() {
        let client = Arc::new(MockClient::with_status(202, "queued"));
        let d = dispatcher(vec![hook("WH1")], &client);

        let outcomes = d.dispatch(&new_group(json!({"id": 7}))).await;
        let log = &d.store().logs_for("WH1").unwrap()[0];

        assert_eq!(log, &outcomes[0].log);
        assert_eq!(log.last_run_at.timestamp(), NOW);
        assert_eq!(log.input_data, json!({"id": 7}));
        assert_eq!(log.trigger, None);
        assert_eq!(log.url.as_deref(), Some("https://example.com/WH1"));
        assert_eq!(log.response_status.as_deref(), Some("202"));
        assert_eq!(log.response.as_deref(), Some("queued"));
        assert!(log.has_response_code());
        assert!(log.request.as_deref().unwrap().contains("\"method\":\"POST\""));
    }

    #[tokio::test]
    async fn error_status_is_still_a_delivery() {
        let client = Arc::new(MockClient::with_status(500, "oops"));
        let d = dispatcher(vec![hook("WH1")], &client);

        let outcomes = d.dispatch(&new_group(json!({}))).await;

        assert!(outcomes[0].is_delivered());
        assert_eq!(outcomes[0].log.response_status.as_deref(), Some("500"));
    }

    #[tokio::test]
    async fn transport_error_is_logged_with_kind() {
        let client = Arc::new(MockClient::failing(HttpError::Connection("refused".into())));
        let d = dispatcher(vec![hook("WH1")], &client);

        let outcomes = d.dispatch(&new_group(json!({}))).await;
        let log = &outcomes[0].log;

        assert!(matches!(outcomes[0].error(), Some(DispatchError::Transport(_))));
        assert_eq!(log.response_status.as_deref(), Some("TransportError"));
        assert!(log.response.as_deref().unwrap().contains("refused"));
        assert!(!log.has_response_code());
        assert_eq!(d.store().logs().len(), 1);
    }

    #[tokio::test]
    async fn trigger_failure_is_logged_without_call() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(vec![hook("WH1").with_trigger_template("{{#if}}")], &client);

        let outcomes = d.dispatch(&new_group(json!({}))).await;

        assert!(matches!(
            outcomes[0].error(),
            Some(DispatchError::InvalidWebhookTrigger(m)) if m.starts_with("Template Error: ")
        ));
        assert_eq!(
            outcomes[0].log.response_status.as_deref(),
            Some("InvalidWebhookTrigger")
        );
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn unsupported_method_never_reaches_network() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(vec![hook("WH1").with_method("PATCH")], &client);

        let outcomes = d.dispatch(&new_group(json!({"id": 1}))).await;

        assert!(matches!(
            outcomes[0].error(),
            Some(DispatchError::UnsupportedHttpMethod(m)) if m == "PATCH"
        ));
        assert_eq!(
            outcomes[0].log.response_status.as_deref(),
            Some("UnsupportedHttpMethod")
        );
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn lenient_body_failure_sends_error_body() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(vec![hook("WH1").with_data("{{#each}}")], &client);

        let outcomes = d.dispatch(&new_group(json!({}))).await;

        let Ok(Outcome::Delivered(delivery)) = &outcomes[0].result else {
            panic!("expected delivery, got {:?}", outcomes[0].result);
        };
        let Some(RequestBody::Json(body)) = &delivery.request.body else {
            panic!("expected JSON body");
        };
        assert!(body["error"].as_str().unwrap().starts_with("Template Error: "));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn log_store_failure_does_not_change_outcome() {
        let client = Arc::new(MockClient::success());
        let d = Dispatcher::new(
            FailingLogStore::new(vec![hook("WH1")]),
            Arc::clone(&client),
            HandlebarsEngine::new(),
        );

        let outcomes = d.dispatch(&new_group(json!({}))).await;

        assert!(outcomes[0].is_delivered());
        assert_eq!(outcomes[0].log.response_status.as_deref(), Some("200"));
        assert!(d.store().inner.logs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_endpoint_times_out() {
        let client = Arc::new(MockClient::success().with_delay(Duration::from_secs(30)));
        let d = dispatcher(vec![hook("WH1")], &client);

        let outcomes = d.dispatch(&new_group(json!({}))).await;

        assert!(matches!(
            outcomes[0].error(),
            Some(DispatchError::Transport(HttpError::Timeout))
        ));
        assert_eq!(
            outcomes[0].log.response_status.as_deref(),
            Some("TransportError")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn custom_timeout_allows_slow_endpoint() {
        let client = Arc::new(MockClient::success().with_delay(Duration::from_secs(6)));
        let d = dispatcher(vec![hook("WH1")], &client)
            .with_request_timeout(Duration::from_secs(10));

        let outcomes = d.dispatch(&new_group(json!({}))).await;

        assert!(outcomes[0].is_delivered());
    }
}

mod concurrency {
    use super::*;

    /// Client that tracks how many requests are in flight at once.
    #[derive(Debug, Default)]
    struct GaugeClient {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        total: AtomicUsize,
    }

    impl HttpClient for Arc<GaugeClient> {
        async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.total.fetch_add(1, Ordering::SeqCst);
            Ok(response(200, ""))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fan_out_respects_limit() {
        let client = Arc::new(GaugeClient::default());
        let webhooks = (0..6).map(|i| hook(&format!("WH{i}"))).collect();
        let d = Dispatcher::new(
            MemoryStore::with_webhooks(webhooks),
            Arc::clone(&client),
            HandlebarsEngine::new(),
        )
        .with_max_concurrency(2);

        let outcomes = d.dispatch(&new_group(json!({}))).await;

        assert_eq!(outcomes.len(), 6);
        assert_eq!(client.total.load(Ordering::SeqCst), 6);
        assert_eq!(client.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fan_out_runs_in_parallel() {
        let client = Arc::new(GaugeClient::default());
        let webhooks = (0..4).map(|i| hook(&format!("WH{i}"))).collect();
        let d = Dispatcher::new(
            MemoryStore::with_webhooks(webhooks),
            Arc::clone(&client),
            HandlebarsEngine::new(),
        );

        let started = tokio::time::Instant::now();
        d.dispatch(&new_group(json!({}))).await;

        assert_eq!(client.peak.load(Ordering::SeqCst), 4);
        assert!(started.elapsed() < Duration::from_millis(200));
    }
}

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn cancelled_before_start_sends_nothing() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(vec![hook("WH1"), hook("WH2")], &client);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcomes = d.dispatch_with_cancel(&new_group(json!({})), cancel).await;

        assert!(outcomes.is_empty());
        assert_eq!(client.calls(), 0);
        assert!(d.store().logs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_requests_are_abandoned_and_completed_kept() {
        let client = Arc::new(MockClient::success().with_delay(Duration::from_secs(3)));
        let d = dispatcher(
            vec![
                hook("QUIET").with_trigger_template("false"),
                hook("SLOW"),
            ],
            &client,
        );
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let outcomes = d.dispatch_with_cancel(&new_group(json!({})), cancel).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].webhook_id, "QUIET");
        assert_eq!(client.calls(), 1);

        let logs = d.store().logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].webhook_id, "QUIET");
    }

    #[tokio::test]
    async fn abandoned_ids_name_unfinished_webhooks_in_order() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(vec![], &client);
        let finished = d
            .dispatch_one(&hook("B").with_trigger_template("false"), &json!({}))
            .await;
        let ids = ["A".to_string(), "B".to_string(), "C".to_string()];

        let abandoned = abandoned_ids(&ids, &[(1, finished)]);

        assert_eq!(abandoned, ["A", "C"]);
    }

    #[test]
    fn nothing_abandoned_when_all_finished() {
        let ids = ["A".to_string()];
        let finished = (
            0,
            DispatchOutcome {
                webhook_id: "A".to_string(),
                result: Ok(Outcome::NotFired {
                    trigger: "false".to_string(),
                }),
                log: crate::model::WebhookLog::new(
                    "A".to_string(),
                    chrono::Utc::now(),
                    json!({}),
                ),
            },
        );

        assert!(abandoned_ids(&ids, &[finished]).is_empty());
    }
}

mod dispatch_one {
    use super::*;

    #[tokio::test]
    async fn runs_inactive_trigger_type_webhook_directly() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(vec![], &client);
        let manual = Webhook::new("MANUAL").with_url("https://example.com/manual");

        let outcome = d.dispatch_one(&manual, &json!({"id": 1})).await;

        assert!(outcome.is_delivered());
        assert_eq!(d.store().logs_for("MANUAL").unwrap().len(), 1);
    }
}

mod test_webhook {
    use super::*;

    #[tokio::test]
    async fn unknown_id_is_reported() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(vec![], &client);

        let err = d.test_webhook("NOPE", &json!({})).await.unwrap_err();

        assert!(matches!(err, DispatchError::UnknownWebhook(ref id) if id == "NOPE"));
        assert!(d.store().logs().is_empty());
    }

    #[tokio::test]
    async fn soft_deleted_webhook_is_unknown() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(vec![hook("WH1")], &client);
        d.store().soft_delete("WH1", chrono::Utc::now());

        let err = d.test_webhook("WH1", &json!({})).await.unwrap_err();
        assert_eq!(err.kind(), "UnknownWebhook");
    }

    #[tokio::test]
    async fn returns_request_and_response() {
        let client = Arc::new(MockClient::with_status(200, "ok"));
        let d = dispatcher(vec![hook("WH1")], &client);

        let outcome = d.test_webhook("WH1", &json!({"id": 1})).await.unwrap();

        let Outcome::Delivered(delivery) = outcome else {
            panic!("expected delivery");
        };
        assert_eq!(delivery.request.url.as_str(), "https://example.com/WH1");
        assert_eq!(delivery.response.body_text(), Some("ok"));
    }

    #[tokio::test]
    async fn strict_mode_raises_body_failure() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(vec![hook("WH1").with_data("{{#each}}")], &client);

        let err = d.test_webhook("WH1", &json!({})).await.unwrap_err();

        assert_eq!(err.kind(), "InvalidWebhookData");
        assert_eq!(client.calls(), 0);
        let logs = d.store().logs_for("WH1").unwrap();
        assert_eq!(logs[0].response_status.as_deref(), Some("InvalidWebhookData"));
    }

    #[tokio::test]
    async fn transport_error_propagates_and_is_logged() {
        let client = Arc::new(MockClient::failing(HttpError::Timeout));
        let d = dispatcher(vec![hook("WH1")], &client);

        let err = d.test_webhook("WH1", &json!({})).await.unwrap_err();

        assert!(matches!(err, DispatchError::Transport(HttpError::Timeout)));
        let logs = d.store().logs_for("WH1").unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].response_status.as_deref(), Some("TransportError"));
    }

    #[tokio::test]
    async fn basic_auth_wins_over_authorization_header_on_wire() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(
            vec![
                hook("WH1")
                    .with_authorization_header("Bearer Y")
                    .with_basic_auth("user", "pass"),
            ],
            &client,
        );

        let outcome = d.test_webhook("WH1", &json!({})).await.unwrap();

        let Outcome::Delivered(delivery) = outcome else {
            panic!("expected delivery");
        };
        assert_eq!(delivery.request.headers["Authorization"], "Bearer Y");
        assert!(delivery.request.auth.is_some());

        let sent = &client.captured_requests()[0];
        assert_eq!(sent.headers[http::header::AUTHORIZATION], "Basic dXNlcjpwYXNz");
    }
}

mod preview {
    use super::*;

    #[test]
    fn renders_without_sending_or_logging() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(
            vec![hook("WH1").with_url_template("https://example.com/{{ id }}")],
            &client,
        );

        let preview = d.preview("WH1", &json!({"id": "AG1"})).unwrap();

        assert!(preview.decision.fired);
        assert_eq!(
            preview.request.unwrap().url.as_str(),
            "https://example.com/AG1"
        );
        assert_eq!(client.calls(), 0);
        assert!(d.store().logs().is_empty());
    }

    #[test]
    fn not_fired_has_no_request() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(
            vec![hook("WH1").with_trigger_template("{{ ready }}")],
            &client,
        );

        let preview = d.preview("WH1", &json!({"ready": false})).unwrap();

        assert!(!preview.decision.fired);
        assert_eq!(preview.decision.rendered, "false");
        assert!(preview.request.is_none());
    }

    #[test]
    fn rendering_errors_propagate() {
        let client = Arc::new(MockClient::success());
        let d = dispatcher(vec![hook("WH1").with_headers_template("nope")], &client);

        let err = d.preview("WH1", &json!({})).unwrap_err();
        assert_eq!(err.kind(), "InvalidWebhookHeaders");
    }
}
