//! Closed value sets stored as text columns.
//!
//! The stored strings match the wire values the client already speaks, so the
//! same spelling is used for `serde` and for the database.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription tier of a store
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    /// Free tier, granted on registration with a trial period
    #[sea_orm(string_value = "free")]
    Free,
    /// Small stores
    #[sea_orm(string_value = "basic")]
    Basic,
    /// Growing stores
    #[sea_orm(string_value = "premium")]
    Premium,
    /// Large operations
    #[sea_orm(string_value = "enterprise")]
    Enterprise,
}

impl PlanTier {
    /// Parses a plan identifier, returning `None` for anything outside the fixed set.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::try_from_value(&value.trim().to_string()).ok()
    }

    /// Wire/database spelling of the plan.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Premium => "premium",
            Self::Enterprise => "enterprise",
        }
    }
}

/// Role a user holds inside a store
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Store creator
    #[sea_orm(string_value = "owner")]
    Owner,
    /// Back-office administrator
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Point-of-sale seller
    #[sea_orm(string_value = "vendedor")]
    Vendedor,
    /// Read-only point-of-sale account
    #[sea_orm(string_value = "solo_lectura")]
    SoloLectura,
}

/// Whether a store may operate
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    #[sea_orm(string_value = "activo")]
    Activo,
    #[sea_orm(string_value = "suspendido")]
    Suspendido,
}

/// Whether a user may sign in
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[sea_orm(string_value = "activo")]
    Activo,
    #[sea_orm(string_value = "inactivo")]
    Inactivo,
}

/// How a customer paid an invoice
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash
    #[sea_orm(string_value = "efectivo")]
    Efectivo,
    /// Card
    #[sea_orm(string_value = "tarjeta")]
    Tarjeta,
    /// Bank transfer
    #[sea_orm(string_value = "transferencia")]
    Transferencia,
}

/// Invoice lifecycle. Invoices are created `Completada`; `Cancelada` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[sea_orm(string_value = "pendiente")]
    Pendiente,
    #[sea_orm(string_value = "completada")]
    Completada,
    #[sea_orm(string_value = "cancelada")]
    Cancelada,
}

/// Subscription lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[sea_orm(string_value = "activa")]
    Activa,
    #[sea_orm(string_value = "cancelada")]
    Cancelada,
}

/// Billing period of a subscription or payment
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    #[default]
    #[sea_orm(string_value = "mensual")]
    Mensual,
    #[sea_orm(string_value = "anual")]
    Anual,
}

impl BillingPeriod {
    /// Number of months one billing cycle covers.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::Mensual => 1,
            Self::Anual => 12,
        }
    }
}

/// Payment lifecycle. Only the gateway webhook moves a payment out of `Pendiente`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pendiente")]
    Pendiente,
    #[sea_orm(string_value = "completado")]
    Completado,
    #[sea_orm(string_value = "fallido")]
    Fallido,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_tier_parse() {
        assert_eq!(PlanTier::parse("premium"), Some(PlanTier::Premium));
        assert_eq!(PlanTier::parse(" basic "), Some(PlanTier::Basic));
        assert_eq!(PlanTier::parse("gold"), None);
        assert_eq!(PlanTier::parse(""), None);
    }

    #[test]
    fn test_wire_spelling_matches_storage() {
        assert_eq!(
            serde_json::to_string(&Role::SoloLectura).ok().as_deref(),
            Some("\"solo_lectura\"")
        );
        assert_eq!(Role::SoloLectura.to_value(), "solo_lectura");
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Transferencia).ok().as_deref(),
            Some("\"transferencia\"")
        );
        assert_eq!(PlanTier::Enterprise.as_str(), PlanTier::Enterprise.to_value());
    }

    #[test]
    fn test_billing_period_months() {
        assert_eq!(BillingPeriod::Mensual.months(), 1);
        assert_eq!(BillingPeriod::Anual.months(), 12);
        assert_eq!(BillingPeriod::default(), BillingPeriod::Mensual);
    }
}
