//! The dispatcher: per-webhook pipeline and bounded fan-out.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::model::{Webhook, WebhookLog};
use crate::render::{RenderMode, RenderedRequest, RequestRenderer};
use crate::store::WebhookStore;
use crate::template::{HandlebarsEngine, TemplateEngine};
use crate::time::{Clock, SystemClock};
use crate::transport::{HttpClient, HttpError, HttpResponse, REQUEST_TIMEOUT};
use crate::trigger;

use super::{Delivery, DispatchError, DispatchOutcome, Event, Outcome, Preview};

/// Webhooks executed concurrently for one event unless configured otherwise.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Runs webhooks for events and records every execution.
///
/// # Type Parameters
///
/// - `S`: webhook source and log sink
/// - `H`: HTTP client
/// - `T`: template engine (defaults to [`HandlebarsEngine`])
/// - `C`: clock stamping audit records (defaults to [`SystemClock`])
///
/// Cloning is cheap; clones share the store, client, engine and the
/// concurrency limit.
///
/// # Example
///
/// ```
/// use alert_webhooks::dispatch::Dispatcher;
/// use alert_webhooks::store::MemoryStore;
/// use alert_webhooks::template::HandlebarsEngine;
/// use alert_webhooks::transport::ReqwestClient;
///
/// let dispatcher = Dispatcher::new(
///     MemoryStore::new(),
///     ReqwestClient::new().unwrap(),
///     HandlebarsEngine::new(),
/// )
/// .with_max_concurrency(4);
/// assert_eq!(dispatcher.max_concurrency(), 4);
/// ```
#[derive(Debug)]
pub struct Dispatcher<S, H, T = HandlebarsEngine, C = SystemClock> {
    store: Arc<S>,
    client: Arc<H>,
    engine: Arc<T>,
    clock: Arc<C>,
    limiter: Arc<Semaphore>,
    max_concurrency: usize,
    request_timeout: Duration,
}

impl<S, H, T, C> Clone for Dispatcher<S, H, T, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            client: Arc::clone(&self.client),
            engine: Arc::clone(&self.engine),
            clock: Arc::clone(&self.clock),
            limiter: Arc::clone(&self.limiter),
            max_concurrency: self.max_concurrency,
            request_timeout: self.request_timeout,
        }
    }
}

impl<S, H, T> Dispatcher<S, H, T, SystemClock> {
    /// Creates a dispatcher with the system clock, the default concurrency
    /// limit and the fixed [`REQUEST_TIMEOUT`].
    #[must_use]
    pub fn new(store: S, client: H, engine: T) -> Self {
        Self {
            store: Arc::new(store),
            client: Arc::new(client),
            engine: Arc::new(engine),
            clock: Arc::new(SystemClock),
            limiter: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENCY)),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl<S, H, T, C> Dispatcher<S, H, T, C> {
    /// Sets the clock used to stamp audit records.
    #[must_use]
    pub fn with_clock<C2>(self, clock: C2) -> Dispatcher<S, H, T, C2> {
        Dispatcher {
            store: self.store,
            client: self.client,
            engine: self.engine,
            clock: Arc::new(clock),
            limiter: self.limiter,
            max_concurrency: self.max_concurrency,
            request_timeout: self.request_timeout,
        }
    }

    /// Sets how many webhooks of one dispatch run at the same time.
    ///
    /// Values below one are raised to one.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self.limiter = Arc::new(Semaphore::new(self.max_concurrency));
        self
    }

    /// Sets the timeout applied to every outgoing request.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the concurrency limit.
    #[must_use]
    pub const fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Returns the outgoing request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl<S, H, T, C> Dispatcher<S, H, T, C>
where
    S: WebhookStore + 'static,
    H: HttpClient + 'static,
    T: TemplateEngine + 'static,
    C: Clock + 'static,
{
    /// Executes every webhook matching `event`.
    ///
    /// Outcomes are returned in store order. Failures are recorded per
    /// webhook and never abort the dispatch.
    pub async fn dispatch(&self, event: &Event) -> Vec<DispatchOutcome> {
        self.dispatch_with_cancel(event, CancellationToken::new())
            .await
    }

    /// Like [`dispatch`](Self::dispatch), stopping early when `cancel` fires.
    ///
    /// On cancellation, executions still in flight are aborted. Executions
    /// that already completed keep their audit records and are returned.
    pub async fn dispatch_with_cancel(
        &self,
        event: &Event,
        cancel: CancellationToken,
    ) -> Vec<DispatchOutcome> {
        let webhooks = self.store.matching(event.trigger_type, &event.scope);
        if webhooks.is_empty() {
            tracing::debug!("No webhooks match {}", event.trigger_type);
            return Vec::new();
        }

        let total = webhooks.len();
        let ids: Vec<String> = webhooks.iter().map(|w| w.id.clone()).collect();
        let data = Arc::new(event.data.clone());
        let mut tasks = JoinSet::new();

        for (index, webhook) in webhooks.into_iter().enumerate() {
            let this = self.clone();
            let data = Arc::clone(&data);
            tasks.spawn(async move {
                // The semaphore is never closed, so acquisition only fails
                // if that changes; run unthrottled in that case.
                let _permit = this.limiter.acquire().await.ok();
                (index, this.execute(&webhook, &data, RenderMode::Lenient).await)
            });
        }

        let mut results = Vec::with_capacity(total);
        let mut cancelled = false;
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled(), if !cancelled => {
                    tracing::warn!(
                        "Dispatch of {} cancelled with {} webhook(s) in flight",
                        event.trigger_type,
                        tasks.len()
                    );
                    tasks.abort_all();
                    cancelled = true;
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok(result)) => results.push(result),
                    Some(Err(e)) if e.is_cancelled() => {}
                    Some(Err(e)) => tracing::error!("Webhook task failed: {e}"),
                    None => break,
                },
            }
        }

        results.sort_by_key(|(index, _)| *index);
        if cancelled {
            let abandoned = abandoned_ids(&ids, &results);
            if !abandoned.is_empty() {
                tracing::warn!(
                    "Abandoned without a log record: {}",
                    abandoned.join(", ")
                );
            }
        }
        let outcomes: Vec<_> = results.into_iter().map(|(_, outcome)| outcome).collect();
        log_summary(event, total, &outcomes);
        outcomes
    }

    /// Executes a single webhook in fan-out mode.
    ///
    /// Body template failures are degraded to an error body. Every other
    /// failure is returned in the outcome and recorded in its log.
    pub async fn dispatch_one(&self, webhook: &Webhook, event_data: &Value) -> DispatchOutcome {
        self.execute(webhook, event_data, RenderMode::Lenient).await
    }

    /// Sends webhook `id` interactively.
    ///
    /// Every failure propagates, including body template failures and
    /// transport errors. The execution is still logged.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownWebhook`] if no active webhook has the
    /// key, or the error that ended the execution.
    pub async fn test_webhook(&self, id: &str, event_data: &Value) -> Result<Outcome, DispatchError> {
        let webhook = self
            .store
            .get(id)
            .ok_or_else(|| DispatchError::UnknownWebhook(id.to_string()))?;

        self.execute(&webhook, event_data, RenderMode::Strict)
            .await
            .result
    }

    /// Evaluates the trigger and renders the request for webhook `id`
    /// without sending anything or writing a log.
    ///
    /// # Errors
    ///
    /// Same as [`test_webhook`](Self::test_webhook), minus transport errors.
    pub fn preview(&self, id: &str, event_data: &Value) -> Result<Preview, DispatchError> {
        let webhook = self
            .store
            .get(id)
            .ok_or_else(|| DispatchError::UnknownWebhook(id.to_string()))?;

        let decision = trigger::evaluate(
            self.engine.as_ref(),
            webhook.trigger_template.as_deref(),
            event_data,
        )?;
        let request = if decision.fired {
            let renderer = RequestRenderer::new(self.engine.as_ref(), RenderMode::Strict);
            Some(renderer.render(&webhook, event_data)?)
        } else {
            None
        };

        Ok(Preview { decision, request })
    }

    /// Runs the pipeline for one webhook and writes its audit record.
    async fn execute(&self, webhook: &Webhook, event_data: &Value, mode: RenderMode) -> DispatchOutcome {
        let mut log = WebhookLog::new(webhook.id.clone(), self.clock.now(), event_data.clone());

        let result = self.run(webhook, event_data, mode, &mut log).await;
        if let Err(e) = &result {
            tracing::warn!(webhook = %webhook.id, "Webhook '{}' failed: {e}", webhook.display_name());
            log.response_status = Some(e.kind().to_string());
            log.response = Some(e.to_string());
        }

        if let Err(e) = self.store.append_log(log.clone()).await {
            tracing::error!(webhook = %webhook.id, "Failed to record webhook log: {e}");
        }

        DispatchOutcome {
            webhook_id: webhook.id.clone(),
            result,
            log,
        }
    }

    async fn run(
        &self,
        webhook: &Webhook,
        event_data: &Value,
        mode: RenderMode,
        log: &mut WebhookLog,
    ) -> Result<Outcome, DispatchError> {
        let trigger_template = webhook.trigger_template.as_deref().filter(|t| !t.is_empty());
        let decision = trigger::evaluate(self.engine.as_ref(), trigger_template, event_data)?;
        if trigger_template.is_some() {
            log.trigger = Some(decision.rendered.clone());
        }

        if !decision.fired {
            tracing::debug!(
                webhook = %webhook.id,
                "Trigger rendered '{}', not firing",
                decision.rendered
            );
            return Ok(Outcome::NotFired {
                trigger: decision.rendered,
            });
        }

        let request = RequestRenderer::new(self.engine.as_ref(), mode).render(webhook, event_data)?;
        log.url = Some(request.url.to_string());
        log.request = Some(request.to_log_string());

        let response = self.send(&request).await?;
        log.response_status = Some(response.status.as_u16().to_string());
        log.response = Some(response.body_text_lossy());
        tracing::debug!(
            webhook = %webhook.id,
            "{} {} -> {}",
            request.method,
            request.url,
            response.status
        );

        Ok(Outcome::Delivered(Delivery { request, response }))
    }

    /// Sends the request, bounded by the request timeout.
    async fn send(&self, request: &RenderedRequest) -> Result<HttpResponse, HttpError> {
        let wire = request.to_http_request()?;
        tokio::time::timeout(self.request_timeout, self.client.request(wire))
            .await
            .map_err(|_| HttpError::Timeout)?
    }
}

/// Ids of matched webhooks with no finished execution, in store order.
pub(super) fn abandoned_ids<'a>(
    ids: &'a [String],
    finished: &[(usize, DispatchOutcome)],
) -> Vec<&'a str> {
    ids.iter()
        .enumerate()
        .filter(|(index, _)| !finished.iter().any(|(done, _)| done == index))
        .map(|(_, id)| id.as_str())
        .collect()
}

fn log_summary(event: &Event, matched: usize, outcomes: &[DispatchOutcome]) {
    let delivered = outcomes.iter().filter(|o| o.is_delivered()).count();
    let failed = outcomes.iter().filter(|o| o.error().is_some()).count();
    tracing::info!(
        "Dispatched {}: {matched} matched, {delivered} delivered, {} not fired, {failed} failed",
        event.trigger_type,
        outcomes.len() - delivered - failed
    );
}
