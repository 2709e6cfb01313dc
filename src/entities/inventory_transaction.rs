use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reason codes for ledger entries. Stored as strings in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionReason {
    /// A blank was consumed printing a line item on the floor.
    AssemblyUsage,
    /// Compensating decrement for a spoiled print; discounted at settlement.
    Misprint,
    /// Pre-made stock pulled for a session at start time.
    StockAllocation,
    ManualAdjustment,
    Restock,
}

impl TransactionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionReason::AssemblyUsage => "assembly_usage",
            TransactionReason::Misprint => "misprint",
            TransactionReason::StockAllocation => "stock_allocation",
            TransactionReason::ManualAdjustment => "manual_adjustment",
            TransactionReason::Restock => "restock",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "assembly_usage" => Some(TransactionReason::AssemblyUsage),
            "misprint" => Some(TransactionReason::Misprint),
            "stock_allocation" => Some(TransactionReason::StockAllocation),
            "manual_adjustment" => Some(TransactionReason::ManualAdjustment),
            "restock" => Some(TransactionReason::Restock),
            _ => None,
        }
    }
}

/// Append-only ledger row recording one quantity change against exactly one
/// SKU (a blank variant or a product variant). Invariant at insert time:
/// `new_quantity == previous_quantity + change_amount`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub blank_variant_id: Option<Uuid>,
    pub product_variant_id: Option<Uuid>,
    pub change_amount: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub reason: String,
    pub session_id: Option<Uuid>,
    pub line_item_id: Option<Uuid>,
    pub audit_log_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn is_misprint(&self) -> bool {
        TransactionReason::from_str(&self.reason) == Some(TransactionReason::Misprint)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::blank_variant::Entity",
        from = "Column::BlankVariantId",
        to = "super::blank_variant::Column::Id"
    )]
    BlankVariant,
    #[sea_orm(
        belongs_to = "super::product_variant::Entity",
        from = "Column::ProductVariantId",
        to = "super::product_variant::Column::Id"
    )]
    ProductVariant,
}

impl Related<super::blank_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BlankVariant.def()
    }
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductVariant.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
