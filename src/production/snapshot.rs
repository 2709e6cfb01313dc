//! Frozen session-plan snapshots.
//!
//! The assembly plan and picking requirements are persisted as two JSON
//! blobs on the session row. This module is the single boundary where that
//! loosely typed persisted data re-enters the core: deserialization
//! validates shape and invariants and rejects anything malformed. A session
//! with a corrupt snapshot cannot be settled.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ExpectedFulfillment;
use crate::errors::ServiceError;

/// One rank in the frozen assembly order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssemblyLineEntry {
    pub line_item_id: Uuid,
    /// 0-based position in the frozen total order.
    pub item_position: u32,
    pub expected_fulfillment: ExpectedFulfillment,
}

/// One picking requirement row, with display names snapshotted at plan time
/// so later catalog edits cannot corrupt historical plans. A line item split
/// between stock and print appears as two records with complementary
/// quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PickingRequirementRecord {
    pub line_item_id: Uuid,
    pub line_item_name: String,
    pub order_id: Uuid,
    pub order_name: String,
    pub expected_fulfillment: ExpectedFulfillment,
    pub blank_variant_id: Option<Uuid>,
    pub product_variant_id: Option<Uuid>,
    pub quantity: i32,
    pub blank_name: Option<String>,
    pub blank_variant_name: Option<String>,
    pub product_name: Option<String>,
    pub product_variant_name: Option<String>,
}

pub fn serialize_assembly_plan(entries: &[AssemblyLineEntry]) -> Result<String, ServiceError> {
    serde_json::to_string(entries)
        .map_err(|e| ServiceError::SerializationError(format!("assembly plan: {}", e)))
}

pub fn serialize_picking_requirements(
    records: &[PickingRequirementRecord],
) -> Result<String, ServiceError> {
    serde_json::to_string(records)
        .map_err(|e| ServiceError::SerializationError(format!("picking requirements: {}", e)))
}

/// Parses and validates a frozen assembly plan. Positions must be the
/// contiguous range `0..len` with no duplicate line items.
pub fn parse_assembly_plan(raw: &str) -> Result<Vec<AssemblyLineEntry>, ServiceError> {
    let entries: Vec<AssemblyLineEntry> = serde_json::from_str(raw).map_err(|e| {
        ServiceError::SerializationError(format!("corrupt assembly plan snapshot: {}", e))
    })?;

    let mut seen_positions: Vec<u32> = entries.iter().map(|e| e.item_position).collect();
    seen_positions.sort_unstable();
    for (expected, actual) in seen_positions.iter().enumerate() {
        if *actual != expected as u32 {
            return Err(ServiceError::ValidationError(format!(
                "assembly plan positions are not contiguous from zero (found {})",
                actual
            )));
        }
    }

    let mut ids: Vec<Uuid> = entries.iter().map(|e| e.line_item_id).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() != entries.len() {
        return Err(ServiceError::ValidationError(
            "assembly plan contains duplicate line items".to_string(),
        ));
    }

    Ok(entries)
}

/// Parses and validates frozen picking requirements. Each record must carry
/// a positive quantity and the target its fulfillment path implies.
pub fn parse_picking_requirements(
    raw: &str,
) -> Result<Vec<PickingRequirementRecord>, ServiceError> {
    let records: Vec<PickingRequirementRecord> = serde_json::from_str(raw).map_err(|e| {
        ServiceError::SerializationError(format!("corrupt picking requirements snapshot: {}", e))
    })?;

    for record in &records {
        if record.quantity < 1 {
            return Err(ServiceError::ValidationError(format!(
                "picking requirement for line item {} has non-positive quantity {}",
                record.line_item_id, record.quantity
            )));
        }
        match record.expected_fulfillment {
            ExpectedFulfillment::Print if record.blank_variant_id.is_none() => {
                return Err(ServiceError::ValidationError(format!(
                    "print requirement for line item {} is missing its blank variant",
                    record.line_item_id
                )));
            }
            ExpectedFulfillment::Stock if record.product_variant_id.is_none() => {
                return Err(ServiceError::ValidationError(format!(
                    "stock requirement for line item {} is missing its product variant",
                    record.line_item_id
                )));
            }
            _ => {}
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn entry(position: u32) -> AssemblyLineEntry {
        AssemblyLineEntry {
            line_item_id: Uuid::new_v4(),
            item_position: position,
            expected_fulfillment: ExpectedFulfillment::Print,
        }
    }

    fn requirement(fulfillment: ExpectedFulfillment) -> PickingRequirementRecord {
        PickingRequirementRecord {
            line_item_id: Uuid::new_v4(),
            line_item_name: "Tour Tee".to_string(),
            order_id: Uuid::new_v4(),
            order_name: "#1042".to_string(),
            expected_fulfillment: fulfillment,
            blank_variant_id: Some(Uuid::new_v4()),
            product_variant_id: Some(Uuid::new_v4()),
            quantity: 2,
            blank_name: Some("Heavyweight Tee".to_string()),
            blank_variant_name: Some("Heavyweight Tee / black / md".to_string()),
            product_name: Some("Tour Tee".to_string()),
            product_variant_name: Some("Tour Tee / md".to_string()),
        }
    }

    #[test]
    fn plan_round_trips() {
        let entries = vec![entry(0), entry(1), entry(2)];
        let raw = serialize_assembly_plan(&entries).unwrap();
        let parsed = parse_assembly_plan(&raw).unwrap();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn corrupt_json_is_a_hard_error() {
        assert_matches!(
            parse_assembly_plan("{not json"),
            Err(ServiceError::SerializationError(_))
        );
        assert_matches!(
            parse_picking_requirements("[{\"line_item_id\": 7}]"),
            Err(ServiceError::SerializationError(_))
        );
    }

    #[test]
    fn unknown_fields_are_rejected_not_coerced() {
        let raw = r#"[{"line_item_id":"5b2c6f4e-9f3a-4a4e-9d8a-1c2b3d4e5f60","item_position":0,"expected_fulfillment":"print","surprise":true}]"#;
        assert_matches!(
            parse_assembly_plan(raw),
            Err(ServiceError::SerializationError(_))
        );
    }

    #[test]
    fn gapped_positions_are_rejected() {
        let raw = serialize_assembly_plan(&[entry(0), entry(2)]).unwrap();
        assert_matches!(parse_assembly_plan(&raw), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn duplicate_line_items_are_rejected() {
        let mut a = entry(0);
        let mut b = entry(1);
        b.line_item_id = a.line_item_id;
        a.item_position = 0;
        b.item_position = 1;
        let raw = serialize_assembly_plan(&[a, b]).unwrap();
        assert_matches!(parse_assembly_plan(&raw), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn print_requirement_without_blank_target_is_invalid() {
        let mut record = requirement(ExpectedFulfillment::Print);
        record.blank_variant_id = None;
        let raw = serialize_picking_requirements(&[record]).unwrap();
        assert_matches!(
            parse_picking_requirements(&raw),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn non_positive_quantity_is_invalid() {
        let mut record = requirement(ExpectedFulfillment::Stock);
        record.quantity = 0;
        let raw = serialize_picking_requirements(&[record]).unwrap();
        assert_matches!(
            parse_picking_requirements(&raw),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn valid_requirements_parse() {
        let records = vec![
            requirement(ExpectedFulfillment::Stock),
            requirement(ExpectedFulfillment::Print),
            requirement(ExpectedFulfillment::BlackLabel),
        ];
        let raw = serialize_picking_requirements(&records).unwrap();
        assert_eq!(parse_picking_requirements(&raw).unwrap(), records);
    }
}
