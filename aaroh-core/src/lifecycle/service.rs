use super::LifecycleError;
use super::pricing::{chargeable_minor_units, resolve_price};
use super::state::{can_attach_preview, can_set_production_status};
use super::validation;
use crate::clients::{CreateGatewayOrder, GatewayError, GatewayOrder};
use crate::config::GatewayConfig;
use crate::entities::OrderStatus;
use crate::entities::course::{Course, GetCourseById};
use crate::entities::custom_song_order::{
    CustomSongOrder, GetCustomSongOrderById, InsertCustomSongOrder, SetCustomSongApproval,
    SetCustomSongFullAudio, SetCustomSongPreview, SetCustomSongProductionStatus,
};
use crate::entities::custom_song_settings::{
    CustomSongSettings, GetCustomSongSettings, UpdateCustomSongSettings,
};
use crate::entities::payable_order::{
    AttachExternalOrder, FindPayableByExternalOrderId, GetPayableOrder, MarkPaymentCompleted,
    MarkPaymentFailed, OrderRef, PayableOrder, RefundPurchase, ResetPayment,
};
use crate::entities::purchase::{FindLatestPurchase, InsertPurchase, Purchase};
use crate::events::{NotificationEvent, NotificationSender, emit};
use crate::utils::otp::normalize_email;
use aaroh_sdk::objects::{
    AdminPaymentStatus, ConfirmPaymentRequest, CreateCustomSongOrder, PaymentIntentResponse,
    ProductionStatus, WebhookEnvelope, WebhookEventType,
};
use aaroh_sdk::signature::{verify_payment, verify_webhook_body};
use compact_str::CompactString;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

/// Every query the lifecycle issues.
///
/// Implemented by [`DatabaseProcessor`](crate::framework::DatabaseProcessor)
/// and by the in-memory store used in tests.
pub trait LifecycleStore:
    Processor<GetCourseById, Output = Option<Course>, Error = sqlx::Error>
    + Processor<InsertPurchase, Output = Purchase, Error = sqlx::Error>
    + Processor<FindLatestPurchase, Output = Option<Purchase>, Error = sqlx::Error>
    + Processor<GetCustomSongSettings, Output = CustomSongSettings, Error = sqlx::Error>
    + Processor<UpdateCustomSongSettings, Output = CustomSongSettings, Error = sqlx::Error>
    + Processor<InsertCustomSongOrder, Output = CustomSongOrder, Error = sqlx::Error>
    + Processor<GetCustomSongOrderById, Output = Option<CustomSongOrder>, Error = sqlx::Error>
    + Processor<SetCustomSongPreview, Output = Option<CustomSongOrder>, Error = sqlx::Error>
    + Processor<SetCustomSongFullAudio, Output = Option<CustomSongOrder>, Error = sqlx::Error>
    + Processor<SetCustomSongProductionStatus, Output = Option<CustomSongOrder>, Error = sqlx::Error>
    + Processor<SetCustomSongApproval, Output = Option<CustomSongOrder>, Error = sqlx::Error>
    + Processor<GetPayableOrder, Output = Option<PayableOrder>, Error = sqlx::Error>
    + Processor<FindPayableByExternalOrderId, Output = Option<PayableOrder>, Error = sqlx::Error>
    + Processor<AttachExternalOrder, Output = Option<PayableOrder>, Error = sqlx::Error>
    + Processor<MarkPaymentCompleted, Output = Option<PayableOrder>, Error = sqlx::Error>
    + Processor<MarkPaymentFailed, Output = Option<PayableOrder>, Error = sqlx::Error>
    + Processor<ResetPayment, Output = Option<PayableOrder>, Error = sqlx::Error>
    + Processor<RefundPurchase, Output = Option<PayableOrder>, Error = sqlx::Error>
    + Send
    + Sync
{
}

impl<T> LifecycleStore for T where
    T: Processor<GetCourseById, Output = Option<Course>, Error = sqlx::Error>
        + Processor<InsertPurchase, Output = Purchase, Error = sqlx::Error>
        + Processor<FindLatestPurchase, Output = Option<Purchase>, Error = sqlx::Error>
        + Processor<GetCustomSongSettings, Output = CustomSongSettings, Error = sqlx::Error>
        + Processor<UpdateCustomSongSettings, Output = CustomSongSettings, Error = sqlx::Error>
        + Processor<InsertCustomSongOrder, Output = CustomSongOrder, Error = sqlx::Error>
        + Processor<GetCustomSongOrderById, Output = Option<CustomSongOrder>, Error = sqlx::Error>
        + Processor<SetCustomSongPreview, Output = Option<CustomSongOrder>, Error = sqlx::Error>
        + Processor<SetCustomSongFullAudio, Output = Option<CustomSongOrder>, Error = sqlx::Error>
        + Processor<
            SetCustomSongProductionStatus,
            Output = Option<CustomSongOrder>,
            Error = sqlx::Error,
        > + Processor<SetCustomSongApproval, Output = Option<CustomSongOrder>, Error = sqlx::Error>
        + Processor<GetPayableOrder, Output = Option<PayableOrder>, Error = sqlx::Error>
        + Processor<FindPayableByExternalOrderId, Output = Option<PayableOrder>, Error = sqlx::Error>
        + Processor<AttachExternalOrder, Output = Option<PayableOrder>, Error = sqlx::Error>
        + Processor<MarkPaymentCompleted, Output = Option<PayableOrder>, Error = sqlx::Error>
        + Processor<MarkPaymentFailed, Output = Option<PayableOrder>, Error = sqlx::Error>
        + Processor<ResetPayment, Output = Option<PayableOrder>, Error = sqlx::Error>
        + Processor<RefundPurchase, Output = Option<PayableOrder>, Error = sqlx::Error>
        + Send
        + Sync
{
}

/// Gateway credentials snapshot used for one request.
#[derive(Debug, Clone)]
pub struct PaymentSettings {
    pub key_id: String,
    pub key_secret: Box<[u8]>,
    pub webhook_secret: Box<[u8]>,
    pub currency: CompactString,
}

impl From<&GatewayConfig> for PaymentSettings {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            webhook_secret: config.webhook_secret.clone(),
            currency: config.currency.clone(),
        }
    }
}

/// What a webhook delivery did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The event changed the order.
    Applied,
    /// The order had already absorbed this (or a superseding) result.
    AlreadyApplied,
    /// Event type we do not act on.
    Ignored,
}

pub struct OrderLifecycle<S, G> {
    store: S,
    gateway: G,
    notifications: NotificationSender,
    payment: PaymentSettings,
}

impl<S, G> OrderLifecycle<S, G>
where
    S: LifecycleStore,
    G: Processor<CreateGatewayOrder, Output = GatewayOrder, Error = GatewayError> + Send + Sync,
{
    pub fn new(
        store: S,
        gateway: G,
        notifications: NotificationSender,
        payment: PaymentSettings,
    ) -> Self {
        Self {
            store,
            gateway,
            notifications,
            payment,
        }
    }

    // ---------------------------------------------------------------------
    // Order creation
    // ---------------------------------------------------------------------

    /// Start a course checkout.
    ///
    /// Re-entering checkout returns the buyer's unfinished purchase instead
    /// of creating another one. A course can only be bought once.
    pub async fn create_purchase(
        &self,
        user_email: &str,
        course_id: Uuid,
    ) -> Result<Purchase, LifecycleError> {
        let user_email = validation::email(user_email)?;
        let course = self
            .store
            .process(GetCourseById { course_id })
            .await?
            .filter(|c| c.is_published)
            .ok_or(LifecycleError::NotFound)?;

        let existing = self
            .store
            .process(FindLatestPurchase {
                user_email: user_email.clone(),
                course_id,
            })
            .await?;
        match existing {
            Some(p) if p.status == OrderStatus::Completed => return Err(LifecycleError::Conflict),
            Some(p) if matches!(p.status, OrderStatus::Pending | OrderStatus::Failed) => {
                return Ok(p);
            }
            _ => {}
        }

        let purchase = self
            .store
            .process(InsertPurchase {
                user_email,
                course_id,
                amount: course.price,
            })
            .await?;
        info!(purchase_id = %purchase.id, course_id = %course_id, "Purchase created");
        emit(
            &self.notifications,
            NotificationEvent::OrderCreated {
                order: OrderRef::purchase(purchase.id),
            },
        );
        Ok(purchase)
    }

    /// Create a custom song order priced from the current settings.
    ///
    /// The amount is frozen on the order; later price changes never touch it.
    pub async fn create_custom_song_order(
        &self,
        user_email: &str,
        request: CreateCustomSongOrder,
    ) -> Result<CustomSongOrder, LifecycleError> {
        let insert = InsertCustomSongOrder {
            user_email: validation::email(user_email)?,
            occasion: validation::required("occasion", &request.occasion)?,
            recipient_name: validation::required("recipient_name", &request.recipient_name)?,
            story: validation::required("story", &request.story)?,
            mood: validation::required("mood", &request.mood)?,
            style: validation::required("style", &request.style)?,
            language: validation::required("language", &request.language)?,
            length: validation::required("length", &request.length)?,
            delivery_type: request.delivery_type.into(),
            amount: Decimal::ZERO,
        };

        let settings = self.store.process(GetCustomSongSettings).await?;
        let amount = resolve_price(insert.delivery_type, &settings);
        let order = self
            .store
            .process(InsertCustomSongOrder { amount, ..insert })
            .await?;

        info!(
            order_id = %order.id,
            delivery_type = ?order.delivery_type,
            amount = %order.amount,
            "Custom song order created"
        );
        emit(
            &self.notifications,
            NotificationEvent::OrderCreated {
                order: OrderRef::custom_song(order.id),
            },
        );
        Ok(order)
    }

    // ---------------------------------------------------------------------
    // Production (admin)
    // ---------------------------------------------------------------------

    /// Attach a preview. The order becomes `ready`, hence payable.
    pub async fn set_preview(
        &self,
        order_id: Uuid,
        preview_url: &str,
        poster_url: Option<&str>,
    ) -> Result<CustomSongOrder, LifecycleError> {
        let preview_url = validation::media_url("preview_url", preview_url)?;
        let poster_url = poster_url
            .map(|p| validation::media_url("poster_url", p))
            .transpose()?;

        let updated = self
            .store
            .process(SetCustomSongPreview {
                order_id,
                preview_url,
                poster_url,
            })
            .await?;
        let Some(order) = updated else {
            let current = self.song(order_id).await?;
            return Err(if can_attach_preview(current.status) {
                LifecycleError::Conflict
            } else {
                LifecycleError::NotReady
            });
        };

        info!(order_id = %order_id, "Preview attached");
        emit(
            &self.notifications,
            NotificationEvent::PreviewReady { order_id },
        );
        Ok(order)
    }

    /// Store the full track. It is only served once the order is completed.
    pub async fn set_full_audio(
        &self,
        order_id: Uuid,
        full_audio_url: &str,
    ) -> Result<CustomSongOrder, LifecycleError> {
        let full_audio_url = validation::media_url("full_audio_url", full_audio_url)?;
        match self
            .store
            .process(SetCustomSongFullAudio {
                order_id,
                full_audio_url,
            })
            .await?
        {
            Some(order) => Ok(order),
            None => {
                self.song(order_id).await?;
                Err(LifecycleError::NotReady)
            }
        }
    }

    pub async fn set_production_status(
        &self,
        order_id: Uuid,
        status: ProductionStatus,
    ) -> Result<CustomSongOrder, LifecycleError> {
        let status = match status {
            ProductionStatus::InProgress => OrderStatus::InProgress,
            ProductionStatus::Failed => OrderStatus::Failed,
        };
        match self
            .store
            .process(SetCustomSongProductionStatus { order_id, status })
            .await?
        {
            Some(order) => {
                info!(order_id = %order_id, status = ?status, "Production status updated");
                Ok(order)
            }
            None => {
                let current = self.song(order_id).await?;
                Err(if can_set_production_status(current.status) {
                    LifecycleError::Conflict
                } else {
                    LifecycleError::NotReady
                })
            }
        }
    }

    pub async fn set_approval(
        &self,
        order_id: Uuid,
        is_approved: bool,
    ) -> Result<CustomSongOrder, LifecycleError> {
        self.store
            .process(SetCustomSongApproval {
                order_id,
                is_approved,
            })
            .await?
            .ok_or(LifecycleError::NotFound)
    }

    pub async fn update_pricing(
        &self,
        standard_price: Decimal,
        express_price: Decimal,
    ) -> Result<CustomSongSettings, LifecycleError> {
        validation::positive_price("standard_price", standard_price)?;
        validation::positive_price("express_price", express_price)?;
        let settings = self
            .store
            .process(UpdateCustomSongSettings {
                standard_price,
                express_price,
            })
            .await?;
        info!(
            standard_price = %settings.standard_price,
            express_price = %settings.express_price,
            "Custom song pricing updated"
        );
        Ok(settings)
    }

    // ---------------------------------------------------------------------
    // Payment
    // ---------------------------------------------------------------------

    /// Create (or return the existing) gateway order for a payable order.
    ///
    /// `owner` restricts access to the buyer; other users get `NotFound`.
    pub async fn create_payment_intent(
        &self,
        order: OrderRef,
        owner: Option<&str>,
    ) -> Result<PaymentIntentResponse, LifecycleError> {
        let payable = self.payable(order, owner).await?;
        if !payable.is_payable() {
            return Err(LifecycleError::NotReady);
        }
        let amount = chargeable_minor_units(payable.amount).ok_or(LifecycleError::InvalidAmount)?;

        if let Some(external_order_id) = payable.external_order_id {
            return Ok(self.intent(order, external_order_id, amount));
        }

        let created = self
            .gateway
            .process(CreateGatewayOrder {
                amount,
                currency: self.payment.currency.clone(),
                receipt: order.to_string(),
            })
            .await?;

        let attached = self
            .store
            .process(AttachExternalOrder {
                order,
                external_order_id: created.id.clone(),
            })
            .await?;
        if let Some(attached) = attached {
            let external_order_id = attached.external_order_id.unwrap_or(created.id);
            return Ok(self.intent(order, external_order_id, amount));
        }

        // Another request attached its gateway order first; hand out that one.
        let current = self
            .store
            .process(GetPayableOrder { order })
            .await?
            .ok_or(LifecycleError::NotFound)?;
        warn!(
            order = %order,
            discarded_external_order_id = %created.id,
            "Concurrent payment intent, reusing stored gateway order"
        );
        let external_order_id = current.external_order_id.ok_or(LifecycleError::Conflict)?;
        Ok(self.intent(order, external_order_id, amount))
    }

    /// Apply the payment result the checkout client forwards.
    ///
    /// The first valid confirmation completes the order; repeats are no-ops
    /// that return the order as stored.
    pub async fn confirm_payment(
        &self,
        order: OrderRef,
        owner: Option<&str>,
        request: &ConfirmPaymentRequest,
    ) -> Result<PayableOrder, LifecycleError> {
        verify_payment(
            &request.external_order_id,
            &request.external_payment_id,
            &request.external_signature,
            &self.payment.key_secret,
        )?;

        let payable = self.payable(order, owner).await?;
        if payable.external_order_id.as_deref() != Some(request.external_order_id.as_str()) {
            warn!(order = %order, "Confirmation for a gateway order this order does not own");
            return Err(LifecycleError::SignatureInvalid);
        }
        if payable.status == OrderStatus::Refunded {
            return Err(LifecycleError::NotReady);
        }

        let completed = self
            .store
            .process(MarkPaymentCompleted {
                order,
                external_order_id: Some(request.external_order_id.clone()),
                external_payment_id: Some(request.external_payment_id.clone()),
                external_signature: Some(request.external_signature.clone()),
            })
            .await?;
        match completed {
            Some(updated) => {
                info!(
                    order = %order,
                    external_payment_id = %request.external_payment_id,
                    "Payment confirmed"
                );
                emit(
                    &self.notifications,
                    NotificationEvent::PaymentCompleted { order },
                );
                Ok(updated)
            }
            None => self.already_settled(order, &request.external_payment_id).await,
        }
    }

    /// Verify and apply a gateway webhook. The signature is checked against
    /// the raw body before anything is parsed.
    pub async fn apply_webhook(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, LifecycleError> {
        let signature = signature.ok_or(LifecycleError::SignatureInvalid)?;
        verify_webhook_body(raw_body, signature, &self.payment.webhook_secret)?;

        let envelope: WebhookEnvelope = serde_json::from_slice(raw_body)
            .map_err(|e| LifecycleError::Validation(format!("malformed webhook payload: {e}")))?;
        if envelope.event == WebhookEventType::Other {
            return Ok(WebhookOutcome::Ignored);
        }

        let payment = envelope.payment();
        let payable = self
            .store
            .process(FindPayableByExternalOrderId {
                external_order_id: payment.order_id.clone(),
            })
            .await?
            .ok_or(LifecycleError::NotFound)?;
        let order = payable.order_ref();

        match envelope.event {
            WebhookEventType::PaymentCaptured => {
                let completed = match self
                    .store
                    .process(MarkPaymentCompleted {
                        order,
                        external_order_id: Some(payment.order_id.clone()),
                        external_payment_id: Some(payment.id.clone()),
                        external_signature: None,
                    })
                    .await
                    .map_err(LifecycleError::from)
                {
                    Err(LifecycleError::Conflict) => {
                        // The buyer already owns the course through another purchase.
                        warn!(
                            order = %order,
                            external_payment_id = %payment.id,
                            "Captured payment duplicates a completed purchase"
                        );
                        return Ok(WebhookOutcome::AlreadyApplied);
                    }
                    other => other?,
                };
                if completed.is_none() {
                    return Ok(WebhookOutcome::AlreadyApplied);
                }
                info!(order = %order, external_payment_id = %payment.id, "Payment captured");
                emit(
                    &self.notifications,
                    NotificationEvent::PaymentCompleted { order },
                );
                Ok(WebhookOutcome::Applied)
            }
            WebhookEventType::PaymentFailed => {
                if !payable.accepts_payment_result() {
                    info!(order = %order, "Ignoring payment failure for a settled order");
                    return Ok(WebhookOutcome::AlreadyApplied);
                }
                let failed = self
                    .store
                    .process(MarkPaymentFailed {
                        order,
                        external_order_id: payment.order_id.clone(),
                        external_payment_id: payment.id.clone(),
                        status: payable.status_after_failure(),
                    })
                    .await?;
                if failed.is_none() {
                    return Ok(WebhookOutcome::AlreadyApplied);
                }
                warn!(
                    order = %order,
                    reason = payment.error_description.as_deref().unwrap_or("unknown"),
                    "Payment failed"
                );
                emit(
                    &self.notifications,
                    NotificationEvent::PaymentFailed {
                        order,
                        reason: payment.error_description.clone(),
                    },
                );
                Ok(WebhookOutcome::Applied)
            }
            WebhookEventType::Other => Ok(WebhookOutcome::Ignored),
        }
    }

    /// Admin override of the payment state.
    ///
    /// `paid` force-completes the order. `unpaid` clears all gateway
    /// correlation, returns the order to its pre-payment status and bumps
    /// `admin_reset_count` by one.
    pub async fn admin_set_payment(
        &self,
        order: OrderRef,
        status: AdminPaymentStatus,
    ) -> Result<PayableOrder, LifecycleError> {
        let payable = self.payable(order, None).await?;
        match status {
            AdminPaymentStatus::Paid => {
                let completed = self
                    .store
                    .process(MarkPaymentCompleted {
                        order,
                        external_order_id: None,
                        external_payment_id: None,
                        external_signature: None,
                    })
                    .await?;
                match completed {
                    Some(updated) => {
                        info!(order = %order, "Order marked paid by admin");
                        emit(
                            &self.notifications,
                            NotificationEvent::PaymentCompleted { order },
                        );
                        Ok(updated)
                    }
                    None if payable.status == OrderStatus::Refunded => {
                        Err(LifecycleError::NotReady)
                    }
                    None => self.payable(order, None).await,
                }
            }
            AdminPaymentStatus::Unpaid => {
                if !payable.can_reset() {
                    return Err(LifecycleError::NotReady);
                }
                let reset = self
                    .store
                    .process(ResetPayment {
                        order,
                        status: payable.unpaid_status(),
                    })
                    .await?
                    .ok_or(LifecycleError::NotReady)?;
                info!(
                    order = %order,
                    status = ?reset.status,
                    admin_reset_count = reset.admin_reset_count,
                    "Order marked unpaid by admin"
                );
                Ok(reset)
            }
        }
    }

    /// Refund a completed purchase.
    pub async fn refund_purchase(&self, purchase_id: Uuid) -> Result<PayableOrder, LifecycleError> {
        match self.store.process(RefundPurchase { purchase_id }).await? {
            Some(refunded) => {
                info!(purchase_id = %purchase_id, "Purchase refunded");
                Ok(refunded)
            }
            None => {
                self.payable(OrderRef::purchase(purchase_id), None).await?;
                Err(LifecycleError::NotReady)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    async fn payable(
        &self,
        order: OrderRef,
        owner: Option<&str>,
    ) -> Result<PayableOrder, LifecycleError> {
        let payable = self
            .store
            .process(GetPayableOrder { order })
            .await?
            .ok_or(LifecycleError::NotFound)?;
        let foreign = owner.is_some_and(|o| payable.user_email != normalize_email(o));
        if foreign {
            return Err(LifecycleError::NotFound);
        }
        Ok(payable)
    }

    async fn song(&self, order_id: Uuid) -> Result<CustomSongOrder, LifecycleError> {
        self.store
            .process(GetCustomSongOrderById { order_id })
            .await?
            .ok_or(LifecycleError::NotFound)
    }

    async fn already_settled(
        &self,
        order: OrderRef,
        external_payment_id: &str,
    ) -> Result<PayableOrder, LifecycleError> {
        let current = self.payable(order, None).await?;
        match current.status {
            OrderStatus::Completed
                if current.external_payment_id.as_deref() != Some(external_payment_id) =>
            {
                warn!(
                    order = %order,
                    external_payment_id = %external_payment_id,
                    "Order already completed by a different payment"
                );
                Ok(current)
            }
            OrderStatus::Completed => Ok(current),
            OrderStatus::Refunded => Err(LifecycleError::NotReady),
            // Gateway correlation changed underneath us (admin reset).
            _ => Err(LifecycleError::Conflict),
        }
    }

    fn intent(&self, order: OrderRef, external_order_id: String, amount: i64) -> PaymentIntentResponse {
        PaymentIntentResponse {
            order_id: order.id,
            external_order_id,
            amount,
            currency: self.payment.currency.clone(),
            key_id: self.payment.key_id.clone(),
        }
    }
}
