//! Subscription business logic - plan catalog, plan changes and cancellation.
//!
//! A store has at most one `activa` subscription. Every path that starts a
//! new one goes through [`activate_subscription`], which cancels the previous
//! one and moves the store to the new plan inside the caller's transaction.

use crate::{
    core::payment::new_reference,
    entities::{
        BillingPeriod, Payment, PaymentStatus, PlanLimit, PlanTier, Store, Subscription,
        SubscriptionStatus, payment, plan_limit, store, subscription,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Months, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};

/// Payments listed in the billing history.
const HISTORY_LIMIT: u64 = 50;

/// Plan change request
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePlanInput {
    /// Requested tier, validated against the fixed set
    pub plan: String,
    #[serde(default)]
    pub period: BillingPeriod,
    pub payment_method: Option<String>,
}

/// Active subscription together with the limits of its plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentSubscription {
    #[serde(flatten)]
    pub subscription: subscription::Model,
    pub limits: Option<plan_limit::Model>,
}

/// Result of a plan change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanChange {
    pub subscription: subscription::Model,
    /// Pending charge, absent for the free plan
    pub payment: Option<payment::Model>,
}

/// Price of one billing period of a plan.
#[must_use]
pub fn period_price(limits: &plan_limit::Model, period: BillingPeriod) -> f64 {
    match period {
        BillingPeriod::Mensual => limits.monthly_price,
        BillingPeriod::Anual => limits.annual_price,
    }
}

/// Adds one billing period to `from`.
pub fn next_payment_date(from: DateTime<Utc>, period: BillingPeriod) -> Result<DateTime<Utc>> {
    from.checked_add_months(Months::new(period.months()))
        .ok_or_else(|| Error::internal("Next payment date out of range"))
}

/// Loads the limits row of a plan.
pub async fn plan_limits<C>(db: &C, plan: PlanTier) -> Result<plan_limit::Model>
where
    C: ConnectionTrait,
{
    PlanLimit::find()
        .filter(plan_limit::Column::Plan.eq(plan))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Plan", plan.as_str()))
}

/// Replaces the store's active subscription with a new one and updates the store's plan.
///
/// Runs on the caller's connection so it joins the caller's transaction.
pub async fn activate_subscription<C>(
    db: &C,
    store_id: i64,
    plan: PlanTier,
    period: BillingPeriod,
    amount: f64,
    payment_method: &str,
) -> Result<subscription::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();

    let replaced = end_active_subscriptions(db, store_id, now).await?;

    let created = subscription::ActiveModel {
        store_id: Set(store_id),
        plan: Set(plan),
        status: Set(SubscriptionStatus::Activa),
        started_at: Set(now),
        next_payment_at: Set(next_payment_date(now, period)?),
        ended_at: Set(None),
        amount: Set(amount),
        period: Set(period),
        payment_method: Set(payment_method.to_string()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    set_store_plan(db, store_id, plan).await?;

    tracing::info!(
        store_id,
        subscription_id = created.id,
        plan = plan.as_str(),
        replaced,
        "Subscription activated"
    );
    Ok(created)
}

async fn end_active_subscriptions<C>(db: &C, store_id: i64, now: DateTime<Utc>) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Subscription::update_many()
        .col_expr(
            subscription::Column::Status,
            Expr::value(SubscriptionStatus::Cancelada.to_value()),
        )
        .col_expr(subscription::Column::EndedAt, Expr::value(Some(now)))
        .filter(subscription::Column::StoreId.eq(store_id))
        .filter(subscription::Column::Status.eq(SubscriptionStatus::Activa))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

async fn set_store_plan<C>(db: &C, store_id: i64, plan: PlanTier) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Store::update_many()
        .col_expr(store::Column::Plan, Expr::value(plan.to_value()))
        .filter(store::Column::Id.eq(store_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("Store", store_id));
    }
    Ok(())
}

/// Lists every plan, cheapest first.
pub async fn list_plans(db: &DatabaseConnection) -> Result<Vec<plan_limit::Model>> {
    PlanLimit::find()
        .order_by_asc(plan_limit::Column::MonthlyPrice)
        .order_by_asc(plan_limit::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns the store's active subscription with its plan limits.
///
/// # Errors
/// Returns [`Error::NotFound`] if the store has no active subscription.
pub async fn current_subscription(
    db: &DatabaseConnection,
    store_id: i64,
) -> Result<CurrentSubscription> {
    let subscription = Subscription::find()
        .filter(subscription::Column::StoreId.eq(store_id))
        .filter(subscription::Column::Status.eq(SubscriptionStatus::Activa))
        .order_by_desc(subscription::Column::CreatedAt)
        .order_by_desc(subscription::Column::Id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Subscription", "active"))?;

    let limits = PlanLimit::find()
        .filter(plan_limit::Column::Plan.eq(subscription.plan))
        .one(db)
        .await?;

    Ok(CurrentSubscription {
        subscription,
        limits,
    })
}

/// Moves the store to another plan.
///
/// Non-free plans also record a pending payment for the first period.
///
/// # Errors
/// Returns an error if:
/// - The plan is not one of the fixed tiers
/// - The plan has no limits row
/// - The database fails
pub async fn change_plan(
    db: &DatabaseConnection,
    store_id: i64,
    input: ChangePlanInput,
) -> Result<PlanChange> {
    let plan = PlanTier::parse(&input.plan)
        .ok_or_else(|| Error::validation("The selected plan is not valid"))?;
    let payment_method = input
        .payment_method
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "tarjeta".to_string());

    let txn = db.begin().await?;

    let limits = plan_limits(&txn, plan).await?;
    let amount = period_price(&limits, input.period);

    let subscription =
        activate_subscription(&txn, store_id, plan, input.period, amount, &payment_method)
            .await?;

    let payment = if plan == PlanTier::Free {
        None
    } else {
        Some(
            payment::ActiveModel {
                store_id: Set(store_id),
                subscription_id: Set(Some(subscription.id)),
                amount: Set(amount),
                currency: Set("COP".to_string()),
                plan: Set(plan),
                payment_method: Set(payment_method),
                status: Set(PaymentStatus::Pendiente),
                reference: Set(new_reference("PAY", store_id)),
                billing_period: Set(input.period),
                integrity_signature: Set(None),
                external_transaction_id: Set(None),
                created_at: Set(Utc::now()),
                paid_at: Set(None),
                ..Default::default()
            }
            .insert(&txn)
            .await?,
        )
    };

    txn.commit().await?;

    Ok(PlanChange {
        subscription,
        payment,
    })
}

/// Cancels any active subscription and reverts the store to the free plan.
///
/// Idempotent: a store without an active subscription is simply left on free.
pub async fn cancel_subscription(db: &DatabaseConnection, store_id: i64) -> Result<PlanTier> {
    let txn = db.begin().await?;

    let cancelled = end_active_subscriptions(&txn, store_id, Utc::now()).await?;
    set_store_plan(&txn, store_id, PlanTier::Free).await?;

    txn.commit().await?;

    tracing::info!(store_id, cancelled, "Subscription cancelled, store reverted to free plan");
    Ok(PlanTier::Free)
}

/// Returns the store's most recent payments, newest first.
pub async fn payment_history(
    db: &DatabaseConnection,
    store_id: i64,
) -> Result<Vec<payment::Model>> {
    Payment::find()
        .filter(payment::Column::StoreId.eq(store_id))
        .order_by_desc(payment::Column::CreatedAt)
        .order_by_desc(payment::Column::Id)
        .limit(HISTORY_LIMIT)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn change(plan: &str, period: BillingPeriod) -> ChangePlanInput {
        ChangePlanInput {
            plan: plan.to_string(),
            period,
            payment_method: None,
        }
    }

    async fn active_count(db: &DatabaseConnection, store_id: i64) -> u64 {
        Subscription::find()
            .filter(subscription::Column::StoreId.eq(store_id))
            .filter(subscription::Column::Status.eq(SubscriptionStatus::Activa))
            .count(db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_change_plan_rejects_unknown_plan() -> Result<()> {
        let db = setup_test_db().await?;
        let result = change_plan(&db, 1, change("gold", BillingPeriod::Mensual)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_plans_sorted_by_price() -> Result<()> {
        let db = setup_test_db().await?;
        let plans = list_plans(&db).await?;
        let tiers: Vec<PlanTier> = plans.iter().map(|p| p.plan).collect();
        assert_eq!(
            tiers,
            vec![
                PlanTier::Free,
                PlanTier::Basic,
                PlanTier::Premium,
                PlanTier::Enterprise
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_change_plan_with_payment() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, _) = create_test_store(&db, "Uno").await?;

        let changed = change_plan(&db, store.id, change("basic", BillingPeriod::Anual)).await?;
        assert_eq!(changed.subscription.plan, PlanTier::Basic);
        assert_eq!(changed.subscription.amount, 290.0);
        assert_eq!(changed.subscription.period, BillingPeriod::Anual);
        assert!(changed.subscription.next_payment_at > Utc::now() + chrono::Duration::days(360));

        let payment = changed.payment.unwrap();
        assert_eq!(payment.status, PaymentStatus::Pendiente);
        assert_eq!(payment.subscription_id, Some(changed.subscription.id));
        assert!(payment.reference.starts_with(&format!("PAY-{}-", store.id)));

        let store = Store::find_by_id(store.id).one(&db).await?.unwrap();
        assert_eq!(store.plan, PlanTier::Basic);

        // Switching again leaves exactly one active subscription
        let second = change_plan(&db, store.id, change("premium", BillingPeriod::Mensual)).await?;
        assert_eq!(active_count(&db, store.id).await, 1);
        let current = current_subscription(&db, store.id).await?;
        assert_eq!(current.subscription.id, second.subscription.id);
        assert_eq!(current.limits.unwrap().max_users, Some(10));
        Ok(())
    }

    #[tokio::test]
    async fn test_change_to_free_records_no_payment() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, _) = create_test_store(&db, "Uno").await?;

        let changed = change_plan(&db, store.id, change("free", BillingPeriod::Mensual)).await?;
        assert!(changed.payment.is_none());
        assert_eq!(changed.subscription.amount, 0.0);
        assert!(payment_history(&db, store.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_subscription_reverts_to_free() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, _) = create_test_store(&db, "Uno").await?;

        let result = current_subscription(&db, store.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert_eq!(cancel_subscription(&db, store.id).await?, PlanTier::Free);
        assert_eq!(active_count(&db, store.id).await, 0);

        change_plan(&db, store.id, change("premium", BillingPeriod::Mensual)).await?;
        assert_eq!(cancel_subscription(&db, store.id).await?, PlanTier::Free);

        assert_eq!(active_count(&db, store.id).await, 0);
        let store = Store::find_by_id(store.id).one(&db).await?.unwrap();
        assert_eq!(store.plan, PlanTier::Free);

        let ended = Subscription::find().one(&db).await?.unwrap();
        assert_eq!(ended.status, SubscriptionStatus::Cancelada);
        assert!(ended.ended_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_history_is_per_store() -> Result<()> {
        let db = setup_test_db().await?;
        let (store_a, _) = create_test_store(&db, "A").await?;
        let (store_b, _) = create_test_store(&db, "B").await?;

        change_plan(&db, store_a.id, change("basic", BillingPeriod::Mensual)).await?;
        change_plan(&db, store_a.id, change("enterprise", BillingPeriod::Mensual)).await?;

        let history = payment_history(&db, store_a.id).await?;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].plan, PlanTier::Enterprise);
        assert!(payment_history(&db, store_b.id).await?.is_empty());
        Ok(())
    }
}
