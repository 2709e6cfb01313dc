use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fulfillment lifecycle of an order. Stored as a string column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillmentStatus {
    Unfulfilled,
    InProgress,
    Fulfilled,
    Blocked,
}

impl FulfillmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Unfulfilled => "unfulfilled",
            FulfillmentStatus::InProgress => "in_progress",
            FulfillmentStatus::Fulfilled => "fulfilled",
            FulfillmentStatus::Blocked => "blocked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unfulfilled" => Some(FulfillmentStatus::Unfulfilled),
            "in_progress" => Some(FulfillmentStatus::InProgress),
            "fulfilled" => Some(FulfillmentStatus::Fulfilled),
            "blocked" => Some(FulfillmentStatus::Blocked),
            _ => None,
        }
    }

    /// Terminal or blocked orders never enter a production session.
    pub fn is_producible(&self) -> bool {
        matches!(
            self,
            FulfillmentStatus::Unfulfilled | FulfillmentStatus::InProgress
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub cancelled: bool,
    pub fulfillment_status: String,
    /// Derived externally from unresolved holds; the engine only reads it.
    pub has_active_hold: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn is_eligible_for_production(&self) -> bool {
        !self.cancelled
            && FulfillmentStatus::from_str(&self.fulfillment_status)
                .map(|s| s.is_producible())
                .unwrap_or(false)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::line_item::Entity")]
    LineItems,
}

impl Related<super::line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }
        if let ActiveValue::NotSet = active_model.updated_at {
            active_model.updated_at = Set(Some(now));
        }
        Ok(active_model)
    }
}
