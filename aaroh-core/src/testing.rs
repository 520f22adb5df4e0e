//! In-memory stand-ins for the database, the gateway and the mailer.
//!
//! `InMemoryStore` answers the same processor queries as
//! `DatabaseProcessor`, applying the same guards as the SQL.

#![allow(clippy::unwrap_used)]

use crate::clients::{
    CreateGatewayOrder, EmailMessage, GatewayError, GatewayOrder, MailError, SendEmail,
};
use crate::entities::course::{Course, GetCourseById};
use crate::entities::custom_song_order::{
    CustomSongOrder, GetCustomSongOrderById, InsertCustomSongOrder, SetCustomSongApproval,
    SetCustomSongFullAudio, SetCustomSongPreview, SetCustomSongProductionStatus,
};
use crate::entities::custom_song_settings::{
    CustomSongSettings, GetCustomSongSettings, UpdateCustomSongSettings,
};
use crate::entities::order_summary::{GetOrderSummary, OrderSummary};
use crate::entities::payable_order::{
    AttachExternalOrder, FindPayableByExternalOrderId, GetPayableOrder, MarkPaymentCompleted,
    MarkPaymentFailed, OrderKind, OrderRef, PayableOrder, RefundPurchase, ResetPayment,
};
use crate::entities::purchase::{FindLatestPurchase, InsertPurchase, Purchase};
use crate::entities::{OrderStatus, now_primitive};
use kanau::processor::Processor;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug)]
struct State {
    courses: Vec<Course>,
    purchases: Vec<Purchase>,
    songs: Vec<CustomSongOrder>,
    settings: CustomSongSettings,
    /// `last_failed_payment_id` column, which the entities do not select.
    last_failed: HashMap<Uuid, String>,
}

#[derive(Debug, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Empty store with the default prices (2999 standard, 4499 express).
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                courses: Vec::new(),
                purchases: Vec::new(),
                songs: Vec::new(),
                settings: CustomSongSettings {
                    standard_price: Decimal::new(2999, 0),
                    express_price: Decimal::new(4499, 0),
                    updated_at: now_primitive(),
                },
                last_failed: HashMap::new(),
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn add_course(&self, title: &str, price: Decimal, is_published: bool) -> Uuid {
        let id = Uuid::now_v7();
        self.with(|s| {
            s.courses.push(Course {
                id,
                title: title.to_string(),
                description: format!("{title} description"),
                price,
                is_published,
                created_at: now_primitive(),
            })
        });
        id
    }

    pub fn purchase(&self, id: Uuid) -> Purchase {
        self.with(|s| s.purchases.iter().find(|p| p.id == id).cloned())
            .unwrap()
    }

    pub fn song(&self, id: Uuid) -> CustomSongOrder {
        self.with(|s| s.songs.iter().find(|o| o.id == id).cloned())
            .unwrap()
    }

    pub fn purchase_count(&self) -> usize {
        self.with(|s| s.purchases.len())
    }

    /// Overwrite the status of an order, bypassing all guards.
    pub fn force_status(&self, order: OrderRef, status: OrderStatus) {
        self.with(|s| match order.kind {
            OrderKind::Purchase => {
                if let Some(p) = s.purchases.iter_mut().find(|p| p.id == order.id) {
                    p.status = status;
                }
            }
            OrderKind::CustomSong => {
                if let Some(o) = s.songs.iter_mut().find(|o| o.id == order.id) {
                    o.status = status;
                }
            }
        })
    }
}

fn purchase_payable(p: &Purchase) -> PayableOrder {
    PayableOrder {
        kind: OrderKind::Purchase,
        id: p.id,
        user_email: p.user_email.clone(),
        amount: p.amount,
        status: p.status,
        external_order_id: p.external_order_id.clone(),
        external_payment_id: p.external_payment_id.clone(),
        admin_reset_count: p.admin_reset_count,
        has_preview: false,
    }
}

fn song_payable(o: &CustomSongOrder) -> PayableOrder {
    PayableOrder {
        kind: OrderKind::CustomSong,
        id: o.id,
        user_email: o.user_email.clone(),
        amount: o.amount,
        status: o.status,
        external_order_id: o.external_order_id.clone(),
        external_payment_id: o.external_payment_id.clone(),
        admin_reset_count: o.admin_reset_count,
        has_preview: o.preview_url.is_some(),
    }
}

/// Mutable view over the payment columns both order kinds share.
struct PaymentColumns<'a> {
    status: &'a mut OrderStatus,
    external_order_id: &'a mut Option<String>,
    external_payment_id: &'a mut Option<String>,
    external_signature: &'a mut Option<String>,
    admin_reset_count: &'a mut i32,
    updated_at: &'a mut time::PrimitiveDateTime,
}

/// Run `f` on the payment columns of `order`; `f` returns whether it wrote.
fn update_payment(
    state: &mut State,
    order: OrderRef,
    f: impl FnOnce(PaymentColumns<'_>) -> bool,
) -> Option<PayableOrder> {
    match order.kind {
        OrderKind::Purchase => {
            let p = state.purchases.iter_mut().find(|p| p.id == order.id)?;
            let wrote = f(PaymentColumns {
                status: &mut p.status,
                external_order_id: &mut p.external_order_id,
                external_payment_id: &mut p.external_payment_id,
                external_signature: &mut p.external_signature,
                admin_reset_count: &mut p.admin_reset_count,
                updated_at: &mut p.updated_at,
            });
            wrote.then(|| purchase_payable(p))
        }
        OrderKind::CustomSong => {
            let o = state.songs.iter_mut().find(|o| o.id == order.id)?;
            let wrote = f(PaymentColumns {
                status: &mut o.status,
                external_order_id: &mut o.external_order_id,
                external_payment_id: &mut o.external_payment_id,
                external_signature: &mut o.external_signature,
                admin_reset_count: &mut o.admin_reset_count,
                updated_at: &mut o.updated_at,
            });
            wrote.then(|| song_payable(o))
        }
    }
}

fn settled(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Completed | OrderStatus::Refunded)
}

/// Stand-in for the error Postgres raises on a unique index, such as
/// `purchases_one_completed`.
#[derive(Debug, thiserror::Error)]
#[error("duplicate key value violates unique constraint \"{0}\"")]
struct UniqueViolation(&'static str);

impl sqlx::error::DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint"
    }

    fn constraint(&self) -> Option<&str> {
        Some(self.0)
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> sqlx::error::ErrorKind {
        sqlx::error::ErrorKind::UniqueViolation
    }
}

impl Processor<GetCourseById> for InMemoryStore {
    type Output = Option<Course>;
    type Error = sqlx::Error;
    async fn process(&self, query: GetCourseById) -> Result<Option<Course>, sqlx::Error> {
        Ok(self.with(|s| s.courses.iter().find(|c| c.id == query.course_id).cloned()))
    }
}

impl Processor<InsertPurchase> for InMemoryStore {
    type Output = Purchase;
    type Error = sqlx::Error;
    async fn process(&self, insert: InsertPurchase) -> Result<Purchase, sqlx::Error> {
        let now = now_primitive();
        let purchase = Purchase {
            id: Uuid::now_v7(),
            user_email: insert.user_email,
            course_id: insert.course_id,
            amount: insert.amount,
            status: OrderStatus::Pending,
            external_order_id: None,
            external_payment_id: None,
            external_signature: None,
            admin_reset_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.with(|s| s.purchases.push(purchase.clone()));
        Ok(purchase)
    }
}

impl Processor<FindLatestPurchase> for InMemoryStore {
    type Output = Option<Purchase>;
    type Error = sqlx::Error;
    async fn process(&self, query: FindLatestPurchase) -> Result<Option<Purchase>, sqlx::Error> {
        Ok(self.with(|s| {
            s.purchases
                .iter()
                .enumerate()
                .filter(|(_, p)| p.user_email == query.user_email && p.course_id == query.course_id)
                .max_by_key(|(i, p)| (p.status == OrderStatus::Completed, *i))
                .map(|(_, p)| p.clone())
        }))
    }
}

impl Processor<GetCustomSongSettings> for InMemoryStore {
    type Output = CustomSongSettings;
    type Error = sqlx::Error;
    async fn process(&self, _query: GetCustomSongSettings) -> Result<CustomSongSettings, sqlx::Error> {
        Ok(self.with(|s| s.settings.clone()))
    }
}

impl Processor<UpdateCustomSongSettings> for InMemoryStore {
    type Output = CustomSongSettings;
    type Error = sqlx::Error;
    async fn process(
        &self,
        cmd: UpdateCustomSongSettings,
    ) -> Result<CustomSongSettings, sqlx::Error> {
        Ok(self.with(|s| {
            s.settings = CustomSongSettings {
                standard_price: cmd.standard_price,
                express_price: cmd.express_price,
                updated_at: now_primitive(),
            };
            s.settings.clone()
        }))
    }
}

impl Processor<InsertCustomSongOrder> for InMemoryStore {
    type Output = CustomSongOrder;
    type Error = sqlx::Error;
    async fn process(&self, insert: InsertCustomSongOrder) -> Result<CustomSongOrder, sqlx::Error> {
        let now = now_primitive();
        let order = CustomSongOrder {
            id: Uuid::now_v7(),
            user_email: insert.user_email,
            occasion: insert.occasion,
            recipient_name: insert.recipient_name,
            story: insert.story,
            mood: insert.mood,
            style: insert.style,
            language: insert.language,
            length: insert.length,
            delivery_type: insert.delivery_type,
            amount: insert.amount,
            status: OrderStatus::Pending,
            preview_url: None,
            full_audio_url: None,
            poster_url: None,
            is_approved: false,
            admin_reset_count: 0,
            external_order_id: None,
            external_payment_id: None,
            external_signature: None,
            created_at: now,
            updated_at: now,
        };
        self.with(|s| s.songs.push(order.clone()));
        Ok(order)
    }
}

impl Processor<GetCustomSongOrderById> for InMemoryStore {
    type Output = Option<CustomSongOrder>;
    type Error = sqlx::Error;
    async fn process(
        &self,
        query: GetCustomSongOrderById,
    ) -> Result<Option<CustomSongOrder>, sqlx::Error> {
        Ok(self.with(|s| s.songs.iter().find(|o| o.id == query.order_id).cloned()))
    }
}

impl InMemoryStore {
    fn update_song(
        &self,
        order_id: Uuid,
        f: impl FnOnce(&mut CustomSongOrder) -> bool,
    ) -> Option<CustomSongOrder> {
        self.with(|s| {
            let order = s.songs.iter_mut().find(|o| o.id == order_id)?;
            if f(order) {
                order.updated_at = now_primitive();
                Some(order.clone())
            } else {
                None
            }
        })
    }
}

impl Processor<SetCustomSongPreview> for InMemoryStore {
    type Output = Option<CustomSongOrder>;
    type Error = sqlx::Error;
    async fn process(
        &self,
        cmd: SetCustomSongPreview,
    ) -> Result<Option<CustomSongOrder>, sqlx::Error> {
        Ok(self.update_song(cmd.order_id, |o| {
            if !matches!(
                o.status,
                OrderStatus::Pending | OrderStatus::InProgress | OrderStatus::Ready
            ) {
                return false;
            }
            o.preview_url = Some(cmd.preview_url);
            if cmd.poster_url.is_some() {
                o.poster_url = cmd.poster_url;
            }
            o.status = OrderStatus::Ready;
            true
        }))
    }
}

impl Processor<SetCustomSongFullAudio> for InMemoryStore {
    type Output = Option<CustomSongOrder>;
    type Error = sqlx::Error;
    async fn process(
        &self,
        cmd: SetCustomSongFullAudio,
    ) -> Result<Option<CustomSongOrder>, sqlx::Error> {
        Ok(self.update_song(cmd.order_id, |o| {
            if o.status == OrderStatus::Failed {
                return false;
            }
            o.full_audio_url = Some(cmd.full_audio_url);
            true
        }))
    }
}

impl Processor<SetCustomSongProductionStatus> for InMemoryStore {
    type Output = Option<CustomSongOrder>;
    type Error = sqlx::Error;
    async fn process(
        &self,
        cmd: SetCustomSongProductionStatus,
    ) -> Result<Option<CustomSongOrder>, sqlx::Error> {
        Ok(self.update_song(cmd.order_id, |o| {
            if !matches!(o.status, OrderStatus::Pending | OrderStatus::InProgress) {
                return false;
            }
            o.status = cmd.status;
            true
        }))
    }
}

impl Processor<SetCustomSongApproval> for InMemoryStore {
    type Output = Option<CustomSongOrder>;
    type Error = sqlx::Error;
    async fn process(
        &self,
        cmd: SetCustomSongApproval,
    ) -> Result<Option<CustomSongOrder>, sqlx::Error> {
        Ok(self.update_song(cmd.order_id, |o| {
            o.is_approved = cmd.is_approved;
            true
        }))
    }
}

impl Processor<GetPayableOrder> for InMemoryStore {
    type Output = Option<PayableOrder>;
    type Error = sqlx::Error;
    async fn process(&self, query: GetPayableOrder) -> Result<Option<PayableOrder>, sqlx::Error> {
        let id = query.order.id;
        Ok(self.with(|s| match query.order.kind {
            OrderKind::Purchase => s.purchases.iter().find(|p| p.id == id).map(purchase_payable),
            OrderKind::CustomSong => s.songs.iter().find(|o| o.id == id).map(song_payable),
        }))
    }
}

impl Processor<FindPayableByExternalOrderId> for InMemoryStore {
    type Output = Option<PayableOrder>;
    type Error = sqlx::Error;
    async fn process(
        &self,
        query: FindPayableByExternalOrderId,
    ) -> Result<Option<PayableOrder>, sqlx::Error> {
        let wanted = Some(query.external_order_id);
        Ok(self.with(|s| {
            s.purchases
                .iter()
                .find(|p| p.external_order_id == wanted)
                .map(purchase_payable)
                .or_else(|| {
                    s.songs
                        .iter()
                        .find(|o| o.external_order_id == wanted)
                        .map(song_payable)
                })
        }))
    }
}

impl Processor<AttachExternalOrder> for InMemoryStore {
    type Output = Option<PayableOrder>;
    type Error = sqlx::Error;
    async fn process(&self, cmd: AttachExternalOrder) -> Result<Option<PayableOrder>, sqlx::Error> {
        Ok(self.with(|s| {
            update_payment(s, cmd.order, |c| {
                if c.external_order_id.is_some() {
                    return false;
                }
                *c.external_order_id = Some(cmd.external_order_id);
                *c.updated_at = now_primitive();
                true
            })
        }))
    }
}

impl Processor<MarkPaymentCompleted> for InMemoryStore {
    type Output = Option<PayableOrder>;
    type Error = sqlx::Error;
    async fn process(&self, cmd: MarkPaymentCompleted) -> Result<Option<PayableOrder>, sqlx::Error> {
        self.with(|s| {
            let duplicate = matches!(cmd.order.kind, OrderKind::Purchase)
                && s.purchases
                    .iter()
                    .find(|p| p.id == cmd.order.id)
                    .is_some_and(|target| {
                        s.purchases.iter().any(|p| {
                            p.id != target.id
                                && p.user_email == target.user_email
                                && p.course_id == target.course_id
                                && p.status == OrderStatus::Completed
                        })
                    });
            let mut violated = false;
            let updated = update_payment(s, cmd.order, |c| {
                if settled(*c.status) {
                    return false;
                }
                if cmd.external_order_id.is_some() && *c.external_order_id != cmd.external_order_id {
                    return false;
                }
                if duplicate {
                    violated = true;
                    return false;
                }
                *c.status = OrderStatus::Completed;
                if cmd.external_payment_id.is_some() {
                    *c.external_payment_id = cmd.external_payment_id;
                }
                if cmd.external_signature.is_some() {
                    *c.external_signature = cmd.external_signature;
                }
                *c.updated_at = now_primitive();
                true
            });
            if violated {
                return Err(sqlx::Error::Database(Box::new(UniqueViolation(
                    "purchases_one_completed",
                ))));
            }
            Ok(updated)
        })
    }
}

impl Processor<MarkPaymentFailed> for InMemoryStore {
    type Output = Option<PayableOrder>;
    type Error = sqlx::Error;
    async fn process(&self, cmd: MarkPaymentFailed) -> Result<Option<PayableOrder>, sqlx::Error> {
        Ok(self.with(|s| {
            let repeated = s.last_failed.get(&cmd.order.id) == Some(&cmd.external_payment_id);
            let updated = update_payment(s, cmd.order, |c| {
                if repeated
                    || settled(*c.status)
                    || c.external_order_id.as_deref() != Some(cmd.external_order_id.as_str())
                {
                    return false;
                }
                *c.status = cmd.status;
                *c.updated_at = now_primitive();
                true
            });
            if updated.is_some() {
                s.last_failed.insert(cmd.order.id, cmd.external_payment_id);
            }
            updated
        }))
    }
}

impl Processor<ResetPayment> for InMemoryStore {
    type Output = Option<PayableOrder>;
    type Error = sqlx::Error;
    async fn process(&self, cmd: ResetPayment) -> Result<Option<PayableOrder>, sqlx::Error> {
        Ok(self.with(|s| {
            let updated = update_payment(s, cmd.order, |c| {
                if *c.status == OrderStatus::Refunded {
                    return false;
                }
                *c.status = cmd.status;
                *c.external_order_id = None;
                *c.external_payment_id = None;
                *c.external_signature = None;
                *c.admin_reset_count += 1;
                *c.updated_at = now_primitive();
                true
            });
            if updated.is_some() {
                s.last_failed.remove(&cmd.order.id);
            }
            updated
        }))
    }
}

impl Processor<RefundPurchase> for InMemoryStore {
    type Output = Option<PayableOrder>;
    type Error = sqlx::Error;
    async fn process(&self, cmd: RefundPurchase) -> Result<Option<PayableOrder>, sqlx::Error> {
        Ok(self.with(|s| {
            update_payment(s, OrderRef::purchase(cmd.purchase_id), |c| {
                if *c.status != OrderStatus::Completed {
                    return false;
                }
                *c.status = OrderStatus::Refunded;
                *c.updated_at = now_primitive();
                true
            })
        }))
    }
}

impl Processor<GetOrderSummary> for InMemoryStore {
    type Output = Option<OrderSummary>;
    type Error = sqlx::Error;
    async fn process(&self, query: GetOrderSummary) -> Result<Option<OrderSummary>, sqlx::Error> {
        let id = query.order.id;
        Ok(self.with(|s| match query.order.kind {
            OrderKind::Purchase => {
                let p = s.purchases.iter().find(|p| p.id == id)?;
                let course = s.courses.iter().find(|c| c.id == p.course_id)?;
                Some(OrderSummary {
                    order: query.order,
                    user_email: p.user_email.clone(),
                    amount: p.amount,
                    title: course.title.clone(),
                    preview_url: None,
                })
            }
            OrderKind::CustomSong => {
                let o = s.songs.iter().find(|o| o.id == id)?;
                Some(OrderSummary {
                    order: query.order,
                    user_email: o.user_email.clone(),
                    amount: o.amount,
                    title: format!("Custom {} song for {}", o.occasion, o.recipient_name),
                    preview_url: o.preview_url.clone(),
                })
            }
        }))
    }
}

/// Gateway fake that hands out sequential order ids and counts calls.
#[derive(Debug, Clone, Default)]
pub struct CountingGateway {
    calls: Arc<AtomicUsize>,
}

impl CountingGateway {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Processor<CreateGatewayOrder> for CountingGateway {
    type Output = GatewayOrder;
    type Error = GatewayError;
    async fn process(&self, _order: CreateGatewayOrder) -> Result<GatewayOrder, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(GatewayOrder {
            id: format!("order_test{n:04}"),
        })
    }
}

/// Mailer fake that records every message, optionally failing each send.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Processor<SendEmail> for RecordingMailer {
    type Output = ();
    type Error = MailError;
    async fn process(&self, SendEmail(message): SendEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(message);
        if self.fail {
            return Err(MailError::Rejected {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(())
    }
}
