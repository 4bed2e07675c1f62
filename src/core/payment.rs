//! Payment business logic - checkout intents and gateway webhook reconciliation.
//!
//! A payment intent records a `pendiente` payment and hands the checkout
//! widget everything it needs. The gateway later reports the outcome through
//! a signed webhook; an approved transaction completes the payment and starts
//! the new subscription in one transaction. Completion is a conditional
//! `pendiente -> completado` update, so replayed events change nothing.

use crate::{
    config::WompiConfig,
    core::{
        subscription::{activate_subscription, period_price, plan_limits},
        wompi::{self, TransactionStatus, WebhookEvent, WompiClient},
    },
    entities::{
        BillingPeriod, Payment, PaymentStatus, PlanTier, Store, payment, store,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};

/// Builds a unique payment reference: `{prefix}-{store}-{millis}-{random}`.
#[must_use]
pub fn new_reference(prefix: &str, store_id: i64) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{prefix}-{store_id}-{}-{}",
        Utc::now().timestamp_millis(),
        &random[..8]
    )
}

/// Converts a major-unit amount into integer minor units.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Checkout request
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentInput {
    pub plan: String,
    #[serde(default)]
    pub period: BillingPeriod,
}

/// Everything the checkout widget needs to start a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentIntent {
    pub public_key: String,
    pub reference: String,
    pub amount_in_cents: i64,
    pub currency: String,
    /// Integrity signature over reference, amount and currency
    pub signature: String,
    pub customer_email: String,
    pub redirect_url: String,
    pub plan: PlanTier,
    pub period: BillingPeriod,
}

/// What a webhook call did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// Payment completed and a subscription started
    Activated { payment_id: i64, subscription_id: i64 },
    /// Payment was already completed; nothing changed
    AlreadyProcessed { payment_id: i64 },
    /// Payment marked as failed
    Failed { payment_id: i64 },
    /// Event not relevant to billing
    Ignored,
}

/// Records a pending payment for a plan and returns the checkout parameters.
///
/// # Errors
/// Returns an error if:
/// - The plan is unknown (not found) or free (nothing to pay)
/// - The database fails
pub async fn create_payment_intent(
    db: &DatabaseConnection,
    wompi: &WompiConfig,
    frontend_url: &str,
    store_id: i64,
    customer_email: &str,
    input: PaymentIntentInput,
) -> Result<PaymentIntent> {
    let plan = PlanTier::parse(&input.plan).ok_or_else(|| Error::not_found("Plan", &input.plan))?;
    if plan == PlanTier::Free {
        return Err(Error::validation("The free plan does not require a payment"));
    }

    let limits = plan_limits(db, plan).await?;
    let amount = period_price(&limits, input.period);
    let amount_in_cents = to_cents(amount);
    let reference = new_reference("SUB", store_id);
    let signature = wompi::integrity_signature(
        &reference,
        amount_in_cents,
        &wompi.currency,
        &wompi.integrity_secret,
    );

    payment::ActiveModel {
        store_id: Set(store_id),
        subscription_id: Set(None),
        amount: Set(amount),
        currency: Set(wompi.currency.clone()),
        plan: Set(plan),
        payment_method: Set("wompi".to_string()),
        status: Set(PaymentStatus::Pendiente),
        reference: Set(reference.clone()),
        billing_period: Set(input.period),
        integrity_signature: Set(Some(signature.clone())),
        external_transaction_id: Set(None),
        created_at: Set(Utc::now()),
        paid_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(
        store_id,
        %reference,
        plan = plan.as_str(),
        amount_in_cents,
        "Payment intent created"
    );

    Ok(PaymentIntent {
        public_key: wompi.public_key.clone(),
        reference,
        amount_in_cents,
        currency: wompi.currency.clone(),
        signature,
        customer_email: customer_email.to_string(),
        redirect_url: format!("{frontend_url}/payment/success"),
        plan,
        period: input.period,
    })
}

/// Verifies and applies a gateway webhook.
///
/// # Errors
/// Returns an error if:
/// - The signature is missing or does not match the raw body
/// - The body is not a valid event
/// - The referenced payment does not exist
/// - The approved amount differs from the recorded one
/// - The database fails
pub async fn handle_webhook(
    db: &DatabaseConnection,
    events_secret: &str,
    body: &[u8],
    signature: Option<&str>,
) -> Result<WebhookOutcome> {
    let signature = signature.ok_or_else(|| Error::unauthorized("Missing webhook signature"))?;
    wompi::verify_event_signature(events_secret, body, signature)?;

    let event: WebhookEvent = serde_json::from_slice(body)
        .map_err(|e| Error::validation(format!("Invalid webhook payload: {e}")))?;

    if event.event != wompi::TRANSACTION_UPDATED {
        tracing::debug!(event = %event.event, "Ignoring webhook event");
        return Ok(WebhookOutcome::Ignored);
    }

    let transaction = event
        .data
        .transaction
        .ok_or_else(|| Error::validation("Transaction event without a transaction"))?;
    match transaction.status {
        TransactionStatus::Approved => {
            approve_payment(
                db,
                &transaction.reference,
                &transaction.id,
                transaction.amount_in_cents,
            )
            .await
        }
        TransactionStatus::Declined | TransactionStatus::Voided | TransactionStatus::Error => {
            fail_payment(db, &transaction.reference, &transaction.id).await
        }
        TransactionStatus::Pending | TransactionStatus::Unknown => Ok(WebhookOutcome::Ignored),
    }
}

async fn approve_payment(
    db: &DatabaseConnection,
    reference: &str,
    transaction_id: &str,
    amount_in_cents: Option<i64>,
) -> Result<WebhookOutcome> {
    let txn = db.begin().await?;

    let payment = Payment::find()
        .filter(payment::Column::Reference.eq(reference))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Payment", reference))?;

    match payment.status {
        PaymentStatus::Completado => {
            tracing::info!(%reference, "Webhook replay for completed payment");
            return Ok(WebhookOutcome::AlreadyProcessed {
                payment_id: payment.id,
            });
        }
        PaymentStatus::Fallido => {
            tracing::warn!(%reference, "Approval received for a failed payment, ignoring");
            return Ok(WebhookOutcome::Ignored);
        }
        PaymentStatus::Pendiente => {}
    }

    if let Some(cents) = amount_in_cents {
        if cents != to_cents(payment.amount) {
            tracing::warn!(
                %reference,
                cents,
                expected = to_cents(payment.amount),
                "Webhook amount mismatch"
            );
            return Err(Error::validation("Transaction amount does not match the payment"));
        }
    }

    let now = Utc::now();
    let completed = Payment::update_many()
        .col_expr(
            payment::Column::Status,
            Expr::value(PaymentStatus::Completado.to_value()),
        )
        .col_expr(
            payment::Column::ExternalTransactionId,
            Expr::value(Some(transaction_id.to_string())),
        )
        .col_expr(payment::Column::PaidAt, Expr::value(Some(now)))
        .filter(payment::Column::Id.eq(payment.id))
        .filter(payment::Column::Status.eq(PaymentStatus::Pendiente))
        .exec(&txn)
        .await?;
    if completed.rows_affected == 0 {
        return Ok(WebhookOutcome::AlreadyProcessed {
            payment_id: payment.id,
        });
    }

    let subscription = activate_subscription(
        &txn,
        payment.store_id,
        payment.plan,
        payment.billing_period,
        payment.amount,
        &payment.payment_method,
    )
    .await?;

    Payment::update_many()
        .col_expr(
            payment::Column::SubscriptionId,
            Expr::value(Some(subscription.id)),
        )
        .filter(payment::Column::Id.eq(payment.id))
        .exec(&txn)
        .await?;

    Store::update_many()
        .col_expr(store::Column::LastPaymentAt, Expr::value(Some(now)))
        .filter(store::Column::Id.eq(payment.store_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        payment_id = payment.id,
        subscription_id = subscription.id,
        store_id = payment.store_id,
        "Payment approved"
    );
    Ok(WebhookOutcome::Activated {
        payment_id: payment.id,
        subscription_id: subscription.id,
    })
}

async fn fail_payment(
    db: &DatabaseConnection,
    reference: &str,
    transaction_id: &str,
) -> Result<WebhookOutcome> {
    let payment = Payment::find()
        .filter(payment::Column::Reference.eq(reference))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Payment", reference))?;

    let result = Payment::update_many()
        .col_expr(
            payment::Column::Status,
            Expr::value(PaymentStatus::Fallido.to_value()),
        )
        .col_expr(
            payment::Column::ExternalTransactionId,
            Expr::value(Some(transaction_id.to_string())),
        )
        .filter(payment::Column::Id.eq(payment.id))
        .filter(payment::Column::Status.eq(PaymentStatus::Pendiente))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Ok(WebhookOutcome::Ignored);
    }
    tracing::info!(payment_id = payment.id, %reference, "Payment failed at gateway");
    Ok(WebhookOutcome::Failed {
        payment_id: payment.id,
    })
}

/// Looks up a store's transaction at the gateway.
///
/// # Errors
/// Returns [`Error::NotFound`] if the transaction does not belong to one of the
/// store's payments, or [`Error::Gateway`] if the gateway call fails.
pub async fn transaction_status(
    db: &DatabaseConnection,
    client: &WompiClient,
    store_id: i64,
    transaction_id: &str,
) -> Result<serde_json::Value> {
    Payment::find()
        .filter(payment::Column::StoreId.eq(store_id))
        .filter(payment::Column::ExternalTransactionId.eq(transaction_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Transaction", transaction_id))?;

    client.get_transaction(transaction_id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::{Subscription, SubscriptionStatus, subscription};
    use crate::test_utils::*;
    use serde_json::json;

    fn webhook_body(reference: &str, status: &str, cents: i64) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "event": "transaction.updated",
            "data": {"transaction": {
                "id": "tx-123",
                "status": status,
                "reference": reference,
                "amount_in_cents": cents,
                "customer_email": "owner@example.com"
            }}
        }))
        .unwrap()
    }

    async fn deliver(db: &DatabaseConnection, body: &[u8]) -> Result<WebhookOutcome> {
        let config = test_wompi_config();
        let signature = wompi::sign_event(&config.events_secret, body)?;
        handle_webhook(db, &config.events_secret, body, Some(&signature)).await
    }

    async fn intent(db: &DatabaseConnection, store_id: i64, plan: &str) -> Result<PaymentIntent> {
        create_payment_intent(
            db,
            &test_wompi_config(),
            "http://localhost:5173",
            store_id,
            "owner@example.com",
            PaymentIntentInput {
                plan: plan.to_string(),
                period: BillingPeriod::Mensual,
            },
        )
        .await
    }

    #[test]
    fn test_reference_and_cents() {
        let a = new_reference("SUB", 7);
        let b = new_reference("SUB", 7);
        assert!(a.starts_with("SUB-7-"));
        assert_ne!(a, b);
        assert_eq!(a.split('-').count(), 4);

        assert_eq!(to_cents(29.0), 2900);
        assert_eq!(to_cents(79.99), 7999);
        assert_eq!(to_cents(0.0), 0);
    }

    #[tokio::test]
    async fn test_create_payment_intent() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, _) = create_test_store(&db, "Uno").await?;
        let config = test_wompi_config();

        let intent = intent(&db, store.id, "premium").await?;
        assert_eq!(intent.amount_in_cents, 7900);
        assert_eq!(intent.currency, "COP");
        assert_eq!(intent.public_key, config.public_key);
        assert_eq!(intent.redirect_url, "http://localhost:5173/payment/success");
        assert_eq!(
            intent.signature,
            wompi::integrity_signature(&intent.reference, 7900, "COP", &config.integrity_secret)
        );

        let stored = Payment::find()
            .filter(payment::Column::Reference.eq(intent.reference.as_str()))
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::Pendiente);
        assert_eq!(stored.amount, 79.0);
        assert_eq!(stored.billing_period, BillingPeriod::Mensual);
        assert_eq!(stored.integrity_signature, Some(intent.signature));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_payment_intent_rejections() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, _) = create_test_store(&db, "Uno").await?;

        let result = intent(&db, store.id, "gold").await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        let result = intent(&db, store.id, "free").await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_approved_webhook_activates_subscription_once() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, _) = create_test_store(&db, "Uno").await?;
        let intent = intent(&db, store.id, "basic").await?;
        let body = webhook_body(&intent.reference, "APPROVED", intent.amount_in_cents);

        let outcome = deliver(&db, &body).await?;
        let WebhookOutcome::Activated {
            payment_id,
            subscription_id,
        } = outcome
        else {
            return Err(Error::internal(format!("expected activation, got {outcome:?}")));
        };

        let payment = Payment::find_by_id(payment_id).one(&db).await?.unwrap();
        assert_eq!(payment.status, PaymentStatus::Completado);
        assert_eq!(payment.subscription_id, Some(subscription_id));
        assert_eq!(payment.external_transaction_id.as_deref(), Some("tx-123"));
        assert!(payment.paid_at.is_some());

        let store_row = Store::find_by_id(store.id).one(&db).await?.unwrap();
        assert_eq!(store_row.plan, PlanTier::Basic);
        assert!(store_row.last_payment_at.is_some());

        // Replay changes nothing
        let replay = deliver(&db, &body).await?;
        assert_eq!(replay, WebhookOutcome::AlreadyProcessed { payment_id });
        let subscriptions = Subscription::find()
            .filter(subscription::Column::StoreId.eq(store.id))
            .all(&db)
            .await?;
        assert_eq!(subscriptions.len(), 1);
        assert_eq!(subscriptions[0].status, SubscriptionStatus::Activa);
        Ok(())
    }

    #[tokio::test]
    async fn test_webhook_rejections() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, _) = create_test_store(&db, "Uno").await?;
        let intent = intent(&db, store.id, "basic").await?;
        let config = test_wompi_config();
        let body = webhook_body(&intent.reference, "APPROVED", intent.amount_in_cents);

        let result = handle_webhook(&db, &config.events_secret, &body, None).await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));

        let forged = wompi::sign_event("not-the-secret", &body)?;
        let result = handle_webhook(&db, &config.events_secret, &body, Some(&forged)).await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));

        let result = deliver(&db, &webhook_body("SUB-0-0-unknown", "APPROVED", 100)).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        let result = deliver(&db, &webhook_body(&intent.reference, "APPROVED", 1)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        // None of the above touched the payment
        let payment = Payment::find()
            .filter(payment::Column::Reference.eq(intent.reference.as_str()))
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Pendiente);
        assert_eq!(Subscription::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_declined_and_ignored_events() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, _) = create_test_store(&db, "Uno").await?;
        let intent = intent(&db, store.id, "premium").await?;

        let pending = deliver(&db, &webhook_body(&intent.reference, "PENDING", 7900)).await?;
        assert_eq!(pending, WebhookOutcome::Ignored);

        let other_event = serde_json::to_vec(&json!({
            "event": "nequi_token.updated",
            "data": {"nequi_token": {
                "id": "nequi_1",
                "phone_number": "3107654321",
                "status": "APPROVED"
            }}
        }))
        .unwrap();
        assert_eq!(deliver(&db, &other_event).await?, WebhookOutcome::Ignored);

        let declined = deliver(&db, &webhook_body(&intent.reference, "DECLINED", 7900)).await?;
        assert!(matches!(declined, WebhookOutcome::Failed { .. }));

        // A later approval for a failed payment does not activate anything
        let late = deliver(&db, &webhook_body(&intent.reference, "APPROVED", 7900)).await?;
        assert_eq!(late, WebhookOutcome::Ignored);
        assert_eq!(Subscription::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_transaction_status_requires_own_payment() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, _) = create_test_store(&db, "Uno").await?;
        let client = WompiClient::new(&test_wompi_config());

        let result = transaction_status(&db, &client, store.id, "tx-unknown").await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }
}
