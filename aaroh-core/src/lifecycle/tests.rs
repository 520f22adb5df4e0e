use super::*;
use crate::entities::OrderStatus;
use crate::entities::payable_order::OrderRef;
use crate::entities::purchase::InsertPurchase;
use crate::events::{NotificationEvent, NotificationReceiver, notification_channel};
use crate::testing::{CountingGateway, InMemoryStore};
use aaroh_sdk::objects::{
    AdminPaymentStatus, ConfirmPaymentRequest, CreateCustomSongOrder, DeliveryType,
    ProductionStatus,
};
use aaroh_sdk::signature::{sign_payment, sign_webhook_body};
use kanau::processor::Processor;
use rust_decimal::Decimal;

const KEY_SECRET: &[u8] = b"rzp-key-secret";
const WEBHOOK_SECRET: &[u8] = b"rzp-webhook-secret";
const BUYER: &str = "buyer@example.com";

struct Harness {
    lifecycle: OrderLifecycle<InMemoryStore, CountingGateway>,
    store: InMemoryStore,
    gateway: CountingGateway,
    events: NotificationReceiver,
}

fn harness() -> Harness {
    let store = InMemoryStore::new();
    let gateway = CountingGateway::default();
    let (tx, events) = notification_channel();
    let lifecycle = OrderLifecycle::new(
        store.clone(),
        gateway.clone(),
        tx,
        PaymentSettings {
            key_id: "rzp_test_key".into(),
            key_secret: KEY_SECRET.into(),
            webhook_secret: WEBHOOK_SECRET.into(),
            currency: "INR".into(),
        },
    );
    Harness {
        lifecycle,
        store,
        gateway,
        events,
    }
}

impl Harness {
    fn drain(&mut self) -> Vec<NotificationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    fn failures(&mut self) -> usize {
        self.drain()
            .iter()
            .filter(|e| matches!(e, NotificationEvent::PaymentFailed { .. }))
            .count()
    }

    fn completions(&mut self) -> usize {
        self.drain()
            .iter()
            .filter(|e| matches!(e, NotificationEvent::PaymentCompleted { .. }))
            .count()
    }

    async fn ready_song(&self, delivery_type: DeliveryType) -> OrderRef {
        let order = self
            .lifecycle
            .create_custom_song_order(BUYER, song_request(delivery_type))
            .await
            .unwrap();
        self.lifecycle
            .set_preview(order.id, "https://cdn.example.com/preview.mp3", None)
            .await
            .unwrap();
        OrderRef::custom_song(order.id)
    }

    async fn course_purchase(&self, price: Decimal) -> OrderRef {
        let course_id = self.store.add_course("Raag Yaman basics", price, true);
        let purchase = self
            .lifecycle
            .create_purchase(BUYER, course_id)
            .await
            .unwrap();
        OrderRef::purchase(purchase.id)
    }
}

fn song_request(delivery_type: DeliveryType) -> CreateCustomSongOrder {
    CreateCustomSongOrder {
        occasion: "birthday".into(),
        recipient_name: "Asha".into(),
        story: "We met at a music camp in Pune.".into(),
        mood: "joyful".into(),
        style: "acoustic".into(),
        language: "hindi".into(),
        length: "3 minutes".into(),
        delivery_type,
    }
}

fn confirmation(order: OrderRef, external_order_id: &str, payment_id: &str) -> ConfirmPaymentRequest {
    ConfirmPaymentRequest {
        order_id: order.id,
        external_order_id: external_order_id.to_string(),
        external_payment_id: payment_id.to_string(),
        external_signature: sign_payment(external_order_id, payment_id, KEY_SECRET),
    }
}

fn webhook_body(event: &str, external_order_id: &str, payment_id: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "entity": "event",
        "event": event,
        "payload": {"payment": {"entity": {
            "id": payment_id,
            "order_id": external_order_id,
            "error_description": "Payment declined by bank"
        }}}
    }))
    .unwrap()
}

async fn signed_webhook(
    h: &Harness,
    body: &[u8],
) -> Result<WebhookOutcome, LifecycleError> {
    let signature = sign_webhook_body(body, WEBHOOK_SECRET);
    h.lifecycle.apply_webhook(body, Some(&signature)).await
}

// -------------------------------------------------------------------------
// Creation and pricing
// -------------------------------------------------------------------------

#[tokio::test]
async fn express_song_end_to_end() {
    let mut h = harness();
    let order = h
        .lifecycle
        .create_custom_song_order(BUYER, song_request(DeliveryType::Express))
        .await
        .unwrap();
    assert_eq!(order.amount, Decimal::new(4499, 0));
    assert_eq!(order.status, OrderStatus::Pending);

    let ready = h
        .lifecycle
        .set_preview(order.id, "https://cdn.example.com/preview.mp3", None)
        .await
        .unwrap();
    assert_eq!(ready.status, OrderStatus::Ready);

    let order_ref = OrderRef::custom_song(order.id);
    let intent = h
        .lifecycle
        .create_payment_intent(order_ref, Some(BUYER))
        .await
        .unwrap();
    assert_eq!(intent.amount, 449_900);
    assert_eq!(intent.currency.as_str(), "INR");
    assert_eq!(intent.key_id, "rzp_test_key");

    let confirm = confirmation(order_ref, &intent.external_order_id, "pay_e2e");
    let first = h
        .lifecycle
        .confirm_payment(order_ref, Some(BUYER), &confirm)
        .await
        .unwrap();
    assert_eq!(first.status, OrderStatus::Completed);
    let second = h
        .lifecycle
        .confirm_payment(order_ref, Some(BUYER), &confirm)
        .await
        .unwrap();
    assert_eq!(second.status, OrderStatus::Completed);

    let events = h.drain();
    let completions = events
        .iter()
        .filter(|e| matches!(e, NotificationEvent::PaymentCompleted { .. }))
        .count();
    assert_eq!(completions, 1);
    assert!(events.contains(&NotificationEvent::PreviewReady { order_id: order.id }));
    assert_eq!(h.gateway.calls(), 1);
    assert_eq!(
        h.store.song(order.id).external_payment_id.as_deref(),
        Some("pay_e2e")
    );
}

#[tokio::test]
async fn order_amount_is_frozen_at_creation() {
    let h = harness();
    let order = h
        .lifecycle
        .create_custom_song_order(BUYER, song_request(DeliveryType::Standard))
        .await
        .unwrap();
    h.lifecycle
        .update_pricing(Decimal::new(3999, 0), Decimal::new(5999, 0))
        .await
        .unwrap();

    assert_eq!(h.store.song(order.id).amount, Decimal::new(2999, 0));
    let later = h
        .lifecycle
        .create_custom_song_order(BUYER, song_request(DeliveryType::Standard))
        .await
        .unwrap();
    assert_eq!(later.amount, Decimal::new(3999, 0));
}

#[tokio::test]
async fn pricing_must_be_positive() {
    let h = harness();
    let result = h
        .lifecycle
        .update_pricing(Decimal::ZERO, Decimal::new(4499, 0))
        .await;
    assert!(matches!(result, Err(LifecycleError::Validation(_))));
}

#[tokio::test]
async fn blank_fields_are_rejected() {
    let mut h = harness();
    let mut request = song_request(DeliveryType::Standard);
    request.story = "   ".into();
    let result = h.lifecycle.create_custom_song_order(BUYER, request).await;
    assert!(matches!(result, Err(LifecycleError::Validation(m)) if m.contains("story")));
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn checkout_reentry_reuses_the_open_purchase() {
    let mut h = harness();
    let course_id = h.store.add_course("Tabla for beginners", Decimal::new(1499, 0), true);
    let first = h.lifecycle.create_purchase(BUYER, course_id).await.unwrap();
    let again = h
        .lifecycle
        .create_purchase("  BUYER@example.com", course_id)
        .await
        .unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(h.store.purchase_count(), 1);
    assert_eq!(h.drain().len(), 1);
}

#[tokio::test]
async fn completed_course_cannot_be_bought_twice() {
    let h = harness();
    let course_id = h.store.add_course("Tabla for beginners", Decimal::new(1499, 0), true);
    let purchase = h.lifecycle.create_purchase(BUYER, course_id).await.unwrap();
    h.lifecycle
        .admin_set_payment(OrderRef::purchase(purchase.id), AdminPaymentStatus::Paid)
        .await
        .unwrap();
    let result = h.lifecycle.create_purchase(BUYER, course_id).await;
    assert!(matches!(result, Err(LifecycleError::Conflict)));
}

#[tokio::test]
async fn unpublished_course_is_not_found() {
    let h = harness();
    let course_id = h.store.add_course("Draft", Decimal::new(999, 0), false);
    let result = h.lifecycle.create_purchase(BUYER, course_id).await;
    assert!(matches!(result, Err(LifecycleError::NotFound)));
}

// -------------------------------------------------------------------------
// Payment intents
// -------------------------------------------------------------------------

#[tokio::test]
async fn payment_intent_creates_one_gateway_order() {
    let h = harness();
    let order = h.ready_song(DeliveryType::Standard).await;
    let first = h.lifecycle.create_payment_intent(order, None).await.unwrap();
    let second = h.lifecycle.create_payment_intent(order, None).await.unwrap();
    assert_eq!(first.external_order_id, second.external_order_id);
    assert_eq!(h.gateway.calls(), 1);
}

#[tokio::test]
async fn song_without_preview_is_not_payable() {
    let h = harness();
    let order = h
        .lifecycle
        .create_custom_song_order(BUYER, song_request(DeliveryType::Standard))
        .await
        .unwrap();
    let result = h
        .lifecycle
        .create_payment_intent(OrderRef::custom_song(order.id), None)
        .await;
    assert!(matches!(result, Err(LifecycleError::NotReady)));
    assert_eq!(h.gateway.calls(), 0);
}

#[tokio::test]
async fn amounts_below_gateway_minimum_are_rejected() {
    let h = harness();
    let order = h.course_purchase(Decimal::new(50, 2)).await;
    let result = h.lifecycle.create_payment_intent(order, None).await;
    assert!(matches!(result, Err(LifecycleError::InvalidAmount)));
    assert_eq!(h.gateway.calls(), 0);
}

#[tokio::test]
async fn other_buyers_cannot_see_the_order() {
    let h = harness();
    let order = h.ready_song(DeliveryType::Standard).await;
    let result = h
        .lifecycle
        .create_payment_intent(order, Some("someone@else.com"))
        .await;
    assert!(matches!(result, Err(LifecycleError::NotFound)));
}

#[tokio::test]
async fn missing_order_is_not_found() {
    let h = harness();
    let result = h
        .lifecycle
        .create_payment_intent(OrderRef::purchase(uuid::Uuid::now_v7()), None)
        .await;
    assert!(matches!(result, Err(LifecycleError::NotFound)));
}

// -------------------------------------------------------------------------
// Confirmation
// -------------------------------------------------------------------------

#[tokio::test]
async fn tampered_confirmation_is_rejected() {
    let mut h = harness();
    let order = h.course_purchase(Decimal::new(1499, 0)).await;
    let intent = h.lifecycle.create_payment_intent(order, None).await.unwrap();

    let mut confirm = confirmation(order, &intent.external_order_id, "pay_1");
    confirm.external_payment_id = "pay_2".into();
    let result = h.lifecycle.confirm_payment(order, None, &confirm).await;
    assert!(matches!(result, Err(LifecycleError::SignatureInvalid)));
    assert_eq!(h.store.purchase(order.id).status, OrderStatus::Pending);
    assert_eq!(h.completions(), 0);
}

#[tokio::test]
async fn confirmation_for_another_gateway_order_is_rejected() {
    let h = harness();
    let order = h.course_purchase(Decimal::new(1499, 0)).await;
    h.lifecycle.create_payment_intent(order, None).await.unwrap();

    let confirm = confirmation(order, "order_someone_else", "pay_1");
    let result = h.lifecycle.confirm_payment(order, None, &confirm).await;
    assert!(matches!(result, Err(LifecycleError::SignatureInvalid)));
}

#[tokio::test]
async fn first_confirmation_wins() {
    let mut h = harness();
    let order = h.course_purchase(Decimal::new(1499, 0)).await;
    let intent = h.lifecycle.create_payment_intent(order, None).await.unwrap();

    let first = confirmation(order, &intent.external_order_id, "pay_first");
    let second = confirmation(order, &intent.external_order_id, "pay_second");
    h.lifecycle.confirm_payment(order, None, &first).await.unwrap();
    let settled = h.lifecycle.confirm_payment(order, None, &second).await.unwrap();

    assert_eq!(settled.external_payment_id.as_deref(), Some("pay_first"));
    assert_eq!(h.completions(), 1);
}

// -------------------------------------------------------------------------
// Webhooks
// -------------------------------------------------------------------------

#[tokio::test]
async fn webhook_with_bad_signature_changes_nothing() {
    let h = harness();
    let order = h.course_purchase(Decimal::new(1499, 0)).await;
    let intent = h.lifecycle.create_payment_intent(order, None).await.unwrap();
    let body = webhook_body("payment.captured", &intent.external_order_id, "pay_1");

    let forged = sign_webhook_body(&body, b"wrong-secret");
    let result = h.lifecycle.apply_webhook(&body, Some(&forged)).await;
    assert!(matches!(result, Err(LifecycleError::SignatureInvalid)));

    // The per-payment key must not authenticate webhooks.
    let wrong_key = sign_webhook_body(&body, KEY_SECRET);
    let result = h.lifecycle.apply_webhook(&body, Some(&wrong_key)).await;
    assert!(matches!(result, Err(LifecycleError::SignatureInvalid)));

    let result = h.lifecycle.apply_webhook(&body, None).await;
    assert!(matches!(result, Err(LifecycleError::SignatureInvalid)));

    assert_eq!(h.store.purchase(order.id).status, OrderStatus::Pending);
}

#[tokio::test]
async fn captured_webhook_is_idempotent() {
    let mut h = harness();
    let order = h.ready_song(DeliveryType::Express).await;
    let intent = h.lifecycle.create_payment_intent(order, None).await.unwrap();
    let body = webhook_body("payment.captured", &intent.external_order_id, "pay_wh");

    assert_eq!(signed_webhook(&h, &body).await.unwrap(), WebhookOutcome::Applied);
    assert_eq!(
        signed_webhook(&h, &body).await.unwrap(),
        WebhookOutcome::AlreadyApplied
    );
    assert_eq!(h.store.song(order.id).status, OrderStatus::Completed);
    assert_eq!(h.completions(), 1);
}

#[tokio::test]
async fn webhook_and_confirmation_complete_once() {
    let mut h = harness();
    let order = h.course_purchase(Decimal::new(1499, 0)).await;
    let intent = h.lifecycle.create_payment_intent(order, None).await.unwrap();

    let body = webhook_body("payment.captured", &intent.external_order_id, "pay_1");
    signed_webhook(&h, &body).await.unwrap();
    let confirm = confirmation(order, &intent.external_order_id, "pay_1");
    let confirmed = h.lifecycle.confirm_payment(order, None, &confirm).await.unwrap();

    assert_eq!(confirmed.status, OrderStatus::Completed);
    assert_eq!(h.completions(), 1);
}

#[tokio::test]
async fn late_failure_never_undoes_a_capture() {
    let mut h = harness();
    let order = h.course_purchase(Decimal::new(1499, 0)).await;
    let intent = h.lifecycle.create_payment_intent(order, None).await.unwrap();

    let captured = webhook_body("payment.captured", &intent.external_order_id, "pay_1");
    let failed = webhook_body("payment.failed", &intent.external_order_id, "pay_1");
    signed_webhook(&h, &captured).await.unwrap();
    assert_eq!(
        signed_webhook(&h, &failed).await.unwrap(),
        WebhookOutcome::AlreadyApplied
    );

    assert_eq!(h.store.purchase(order.id).status, OrderStatus::Completed);
    assert!(
        !h.drain()
            .iter()
            .any(|e| matches!(e, NotificationEvent::PaymentFailed { .. }))
    );
}

#[tokio::test]
async fn failed_purchase_can_be_retried_on_the_same_gateway_order() {
    let mut h = harness();
    let order = h.course_purchase(Decimal::new(1499, 0)).await;
    let intent = h.lifecycle.create_payment_intent(order, None).await.unwrap();

    let failed = webhook_body("payment.failed", &intent.external_order_id, "pay_1");
    assert_eq!(signed_webhook(&h, &failed).await.unwrap(), WebhookOutcome::Applied);
    assert_eq!(h.store.purchase(order.id).status, OrderStatus::Failed);
    assert!(h.drain().iter().any(|e| matches!(
        e,
        NotificationEvent::PaymentFailed { reason: Some(r), .. } if r == "Payment declined by bank"
    )));

    let retry = h.lifecycle.create_payment_intent(order, None).await.unwrap();
    assert_eq!(retry.external_order_id, intent.external_order_id);
    assert_eq!(h.gateway.calls(), 1);

    let confirm = confirmation(order, &intent.external_order_id, "pay_2");
    let done = h.lifecycle.confirm_payment(order, None, &confirm).await.unwrap();
    assert_eq!(done.status, OrderStatus::Completed);
}

#[tokio::test]
async fn failed_payment_keeps_song_ready() {
    let h = harness();
    let order = h.ready_song(DeliveryType::Standard).await;
    let intent = h.lifecycle.create_payment_intent(order, None).await.unwrap();
    let failed = webhook_body("payment.failed", &intent.external_order_id, "pay_1");
    signed_webhook(&h, &failed).await.unwrap();

    let song = h.store.song(order.id);
    assert_eq!(song.status, OrderStatus::Ready);
    assert!(song.preview_url.is_some());
}

#[tokio::test]
async fn redelivered_purchase_failure_notifies_once() {
    let mut h = harness();
    let order = h.course_purchase(Decimal::new(1499, 0)).await;
    let intent = h.lifecycle.create_payment_intent(order, None).await.unwrap();
    let failed = webhook_body("payment.failed", &intent.external_order_id, "pay_1");

    assert_eq!(signed_webhook(&h, &failed).await.unwrap(), WebhookOutcome::Applied);
    assert_eq!(
        signed_webhook(&h, &failed).await.unwrap(),
        WebhookOutcome::AlreadyApplied
    );
    assert_eq!(h.store.purchase(order.id).status, OrderStatus::Failed);
    assert_eq!(h.failures(), 1);
}

#[tokio::test]
async fn redelivered_song_failure_notifies_once() {
    let mut h = harness();
    let order = h.ready_song(DeliveryType::Standard).await;
    let intent = h.lifecycle.create_payment_intent(order, None).await.unwrap();
    let failed = webhook_body("payment.failed", &intent.external_order_id, "pay_1");

    assert_eq!(signed_webhook(&h, &failed).await.unwrap(), WebhookOutcome::Applied);
    assert_eq!(
        signed_webhook(&h, &failed).await.unwrap(),
        WebhookOutcome::AlreadyApplied
    );
    assert_eq!(h.failures(), 1);

    // A new attempt on the same gateway order is a new failure.
    let retried = webhook_body("payment.failed", &intent.external_order_id, "pay_2");
    assert_eq!(signed_webhook(&h, &retried).await.unwrap(), WebhookOutcome::Applied);
    assert_eq!(h.failures(), 1);
    assert_eq!(h.store.song(order.id).status, OrderStatus::Ready);
}

#[tokio::test]
async fn failure_after_reset_is_recorded_again() {
    let mut h = harness();
    let order = h.course_purchase(Decimal::new(1499, 0)).await;
    let intent = h.lifecycle.create_payment_intent(order, None).await.unwrap();
    let failed = webhook_body("payment.failed", &intent.external_order_id, "pay_1");
    signed_webhook(&h, &failed).await.unwrap();
    h.lifecycle
        .admin_set_payment(order, AdminPaymentStatus::Unpaid)
        .await
        .unwrap();
    h.drain();

    let reopened = h.lifecycle.create_payment_intent(order, None).await.unwrap();
    let failed = webhook_body("payment.failed", &reopened.external_order_id, "pay_1");
    assert_eq!(signed_webhook(&h, &failed).await.unwrap(), WebhookOutcome::Applied);
    assert_eq!(h.failures(), 1);
}

#[tokio::test]
async fn capture_for_an_already_owned_course_is_absorbed() {
    let mut h = harness();
    let price = Decimal::new(1499, 0);
    let course_id = h.store.add_course("Raag Bhairav", price, true);
    let first = h.lifecycle.create_purchase(BUYER, course_id).await.unwrap();
    // Two checkouts that both passed the open-purchase lookup.
    let second = h
        .store
        .process(InsertPurchase {
            user_email: BUYER.into(),
            course_id,
            amount: price,
        })
        .await
        .unwrap();
    let first = OrderRef::purchase(first.id);
    let second = OrderRef::purchase(second.id);
    let a = h.lifecycle.create_payment_intent(first, None).await.unwrap();
    let b = h.lifecycle.create_payment_intent(second, None).await.unwrap();

    let captured_a = webhook_body("payment.captured", &a.external_order_id, "pay_a");
    let captured_b = webhook_body("payment.captured", &b.external_order_id, "pay_b");
    assert_eq!(signed_webhook(&h, &captured_a).await.unwrap(), WebhookOutcome::Applied);
    assert_eq!(
        signed_webhook(&h, &captured_b).await.unwrap(),
        WebhookOutcome::AlreadyApplied
    );

    assert_eq!(h.store.purchase(first.id).status, OrderStatus::Completed);
    assert_eq!(h.store.purchase(second.id).status, OrderStatus::Pending);
    assert_eq!(h.completions(), 1);
}

#[tokio::test]
async fn unknown_events_are_ignored() {
    let h = harness();
    let body = webhook_body("refund.processed", "order_unknown", "pay_1");
    assert_eq!(signed_webhook(&h, &body).await.unwrap(), WebhookOutcome::Ignored);
}

#[tokio::test]
async fn webhook_for_unknown_order_is_not_found() {
    let h = harness();
    let body = webhook_body("payment.captured", "order_unknown", "pay_1");
    let result = signed_webhook(&h, &body).await;
    assert!(matches!(result, Err(LifecycleError::NotFound)));
}

#[tokio::test]
async fn malformed_webhook_is_a_validation_error() {
    let h = harness();
    let result = signed_webhook(&h, b"{\"event\": \"payment.captured\"}").await;
    assert!(matches!(result, Err(LifecycleError::Validation(_))));
}

// -------------------------------------------------------------------------
// Admin
// -------------------------------------------------------------------------

#[tokio::test]
async fn reset_to_unpaid_clears_gateway_state_once() {
    let h = harness();
    let order = h.ready_song(DeliveryType::Express).await;

    // Several attempts before the admin steps in.
    for attempt in 0..3 {
        let intent = h.lifecycle.create_payment_intent(order, None).await.unwrap();
        let failed = webhook_body("payment.failed", &intent.external_order_id, "pay_x");
        signed_webhook(&h, &failed).await.unwrap();
        assert_eq!(h.store.song(order.id).admin_reset_count, 0, "attempt {attempt}");
    }
    let intent = h.lifecycle.create_payment_intent(order, None).await.unwrap();
    let confirm = confirmation(order, &intent.external_order_id, "pay_ok");
    h.lifecycle.confirm_payment(order, None, &confirm).await.unwrap();

    let reset = h
        .lifecycle
        .admin_set_payment(order, AdminPaymentStatus::Unpaid)
        .await
        .unwrap();
    assert_eq!(reset.admin_reset_count, 1);
    assert_eq!(reset.status, OrderStatus::Ready);
    assert!(reset.external_order_id.is_none());
    assert!(reset.external_payment_id.is_none());
    assert!(h.store.song(order.id).external_signature.is_none());
}

#[tokio::test]
async fn reset_song_without_preview_goes_back_to_pending() {
    let h = harness();
    let order = h
        .lifecycle
        .create_custom_song_order(BUYER, song_request(DeliveryType::Standard))
        .await
        .unwrap();
    let order = OrderRef::custom_song(order.id);
    h.lifecycle
        .admin_set_payment(order, AdminPaymentStatus::Paid)
        .await
        .unwrap();
    let reset = h
        .lifecycle
        .admin_set_payment(order, AdminPaymentStatus::Unpaid)
        .await
        .unwrap();
    assert_eq!(reset.status, OrderStatus::Pending);
}

#[tokio::test]
async fn admin_paid_notifies_only_on_transition() {
    let mut h = harness();
    let order = h.course_purchase(Decimal::new(1499, 0)).await;
    h.lifecycle
        .admin_set_payment(order, AdminPaymentStatus::Paid)
        .await
        .unwrap();
    let again = h
        .lifecycle
        .admin_set_payment(order, AdminPaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(again.status, OrderStatus::Completed);
    assert_eq!(h.completions(), 1);
}

#[tokio::test]
async fn refund_only_from_completed() {
    let h = harness();
    let order = h.course_purchase(Decimal::new(1499, 0)).await;
    let result = h.lifecycle.refund_purchase(order.id).await;
    assert!(matches!(result, Err(LifecycleError::NotReady)));

    let intent = h.lifecycle.create_payment_intent(order, None).await.unwrap();
    let confirm = confirmation(order, &intent.external_order_id, "pay_1");
    h.lifecycle.confirm_payment(order, None, &confirm).await.unwrap();
    let refunded = h.lifecycle.refund_purchase(order.id).await.unwrap();
    assert_eq!(refunded.status, OrderStatus::Refunded);

    // A replayed confirmation cannot resurrect a refunded purchase.
    let result = h.lifecycle.confirm_payment(order, None, &confirm).await;
    assert!(matches!(result, Err(LifecycleError::NotReady)));
    let result = h
        .lifecycle
        .admin_set_payment(order, AdminPaymentStatus::Unpaid)
        .await;
    assert!(matches!(result, Err(LifecycleError::NotReady)));
}

#[tokio::test]
async fn refund_of_missing_purchase_is_not_found() {
    let h = harness();
    let result = h.lifecycle.refund_purchase(uuid::Uuid::now_v7()).await;
    assert!(matches!(result, Err(LifecycleError::NotFound)));
}

#[tokio::test]
async fn preview_after_completion_is_refused() {
    let h = harness();
    let order = h.ready_song(DeliveryType::Standard).await;
    h.store.force_status(order, OrderStatus::Completed);
    let result = h
        .lifecycle
        .set_preview(order.id, "https://cdn.example.com/v2.mp3", None)
        .await;
    assert!(matches!(result, Err(LifecycleError::NotReady)));
}

#[tokio::test]
async fn preview_url_must_be_http() {
    let h = harness();
    let order = h
        .lifecycle
        .create_custom_song_order(BUYER, song_request(DeliveryType::Standard))
        .await
        .unwrap();
    let result = h
        .lifecycle
        .set_preview(order.id, "javascript:alert(1)", None)
        .await;
    assert!(matches!(result, Err(LifecycleError::Validation(_))));
}

#[tokio::test]
async fn production_status_only_before_preview() {
    let h = harness();
    let order = h
        .lifecycle
        .create_custom_song_order(BUYER, song_request(DeliveryType::Standard))
        .await
        .unwrap();
    let in_progress = h
        .lifecycle
        .set_production_status(order.id, ProductionStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(in_progress.status, OrderStatus::InProgress);

    h.lifecycle
        .set_preview(order.id, "https://cdn.example.com/p.mp3", Some("https://cdn.example.com/p.jpg"))
        .await
        .unwrap();
    let result = h
        .lifecycle
        .set_production_status(order.id, ProductionStatus::Failed)
        .await;
    assert!(matches!(result, Err(LifecycleError::NotReady)));
}

#[tokio::test]
async fn full_audio_is_hidden_until_paid() {
    let h = harness();
    let order = h.ready_song(DeliveryType::Standard).await;
    let song = h
        .lifecycle
        .set_full_audio(order.id, "https://cdn.example.com/full.mp3")
        .await
        .unwrap();
    assert!(song.to_response().full_audio_url.is_none());

    h.lifecycle
        .admin_set_payment(order, AdminPaymentStatus::Paid)
        .await
        .unwrap();
    let song = h.store.song(order.id);
    assert_eq!(
        song.to_response().full_audio_url.as_deref(),
        Some("https://cdn.example.com/full.mp3")
    );
}

#[tokio::test]
async fn approval_toggles() {
    let h = harness();
    let order = h.ready_song(DeliveryType::Standard).await;
    let approved = h.lifecycle.set_approval(order.id, true).await.unwrap();
    assert!(approved.is_approved);
    let result = h.lifecycle.set_approval(uuid::Uuid::now_v7(), true).await;
    assert!(matches!(result, Err(LifecycleError::NotFound)));
}
