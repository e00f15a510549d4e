//! Dynamic, field-driven query filtering.
//!
//! Translates an open-ended map of query-parameter name → raw value into a
//! `sea_orm::Condition` over the asset table. Only fields in the closed
//! table below may be filtered, and only with the comparisons allowed for
//! each field. Foreign-key fields are resolved by display name, employees
//! fuzzily across name tokens.
//!
//! The engine never fails on user input: unknown parameter names are
//! silently ignored, disallowed operators and malformed values drop the
//! field's predicate, and an unresolvable reference name fails closed to
//! an impossible predicate. The worst case is an empty or overly broad
//! result, by design.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};
use tracing::debug;

use crate::entities::{asset, department, employee, location, major_category, minor_category, supplier};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Exact,
    IExact,
    IContains,
    Lt,
    Lte,
    Gt,
    Gte,
    Range,
}

/// Reference entities resolvable by display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTarget {
    MajorCategory,
    MinorCategory,
    Department,
    Location,
    Supplier,
    Employee,
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text(asset::Column),
    Int(asset::Column),
    Money(asset::Column),
    Date(asset::Column),
    DateTime(asset::Column),
    Bool(asset::Column),
    Categorical(asset::Column),
    ForeignKey(RefTarget),
}

pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub allowed: &'static [Comparison],
}

const TEXT_OPS: &[Comparison] = &[Comparison::Exact, Comparison::IContains, Comparison::IExact];
const CONTAINS_ONLY: &[Comparison] = &[Comparison::IContains];
const ORDERING_OPS: &[Comparison] = &[
    Comparison::Exact,
    Comparison::Lt,
    Comparison::Lte,
    Comparison::Gt,
    Comparison::Gte,
];
const ORDERING_AND_RANGE_OPS: &[Comparison] = &[
    Comparison::Exact,
    Comparison::Lt,
    Comparison::Lte,
    Comparison::Gt,
    Comparison::Gte,
    Comparison::Range,
];
const EXACT_ONLY: &[Comparison] = &[Comparison::Exact];

/// The closed filterable-field table. Nothing outside it is reachable
/// from a query parameter.
pub static FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "asset_code", kind: FieldKind::Text(asset::Column::AssetCode), allowed: TEXT_OPS },
    FieldSpec { name: "barcode", kind: FieldKind::Text(asset::Column::Barcode), allowed: TEXT_OPS },
    FieldSpec { name: "rfid", kind: FieldKind::Text(asset::Column::Rfid), allowed: TEXT_OPS },
    FieldSpec { name: "description", kind: FieldKind::Text(asset::Column::Description), allowed: CONTAINS_ONLY },
    FieldSpec { name: "serial_number", kind: FieldKind::Text(asset::Column::SerialNumber), allowed: TEXT_OPS },
    FieldSpec { name: "model_number", kind: FieldKind::Text(asset::Column::ModelNumber), allowed: TEXT_OPS },
    FieldSpec { name: "asset_type", kind: FieldKind::Categorical(asset::Column::AssetType), allowed: EXACT_ONLY },
    FieldSpec { name: "major_category", kind: FieldKind::ForeignKey(RefTarget::MajorCategory), allowed: EXACT_ONLY },
    FieldSpec { name: "minor_category", kind: FieldKind::ForeignKey(RefTarget::MinorCategory), allowed: EXACT_ONLY },
    FieldSpec { name: "location", kind: FieldKind::ForeignKey(RefTarget::Location), allowed: EXACT_ONLY },
    FieldSpec { name: "department", kind: FieldKind::ForeignKey(RefTarget::Department), allowed: EXACT_ONLY },
    FieldSpec { name: "employee", kind: FieldKind::ForeignKey(RefTarget::Employee), allowed: EXACT_ONLY },
    FieldSpec { name: "supplier", kind: FieldKind::ForeignKey(RefTarget::Supplier), allowed: EXACT_ONLY },
    FieldSpec { name: "economic_life", kind: FieldKind::Int(asset::Column::EconomicLife), allowed: ORDERING_OPS },
    FieldSpec { name: "purchase_price", kind: FieldKind::Money(asset::Column::PurchasePrice), allowed: ORDERING_AND_RANGE_OPS },
    FieldSpec { name: "net_book_value", kind: FieldKind::Money(asset::Column::NetBookValue), allowed: ORDERING_AND_RANGE_OPS },
    FieldSpec { name: "revalued_amount", kind: FieldKind::Money(asset::Column::RevaluedAmount), allowed: ORDERING_AND_RANGE_OPS },
    FieldSpec { name: "units", kind: FieldKind::Int(asset::Column::Units), allowed: ORDERING_OPS },
    FieldSpec { name: "date_of_purchase", kind: FieldKind::Date(asset::Column::DateOfPurchase), allowed: ORDERING_AND_RANGE_OPS },
    FieldSpec { name: "date_placed_in_service", kind: FieldKind::Date(asset::Column::DatePlacedInService), allowed: ORDERING_AND_RANGE_OPS },
    FieldSpec { name: "condition", kind: FieldKind::Categorical(asset::Column::Condition), allowed: EXACT_ONLY },
    FieldSpec { name: "status", kind: FieldKind::Categorical(asset::Column::Status), allowed: EXACT_ONLY },
    FieldSpec { name: "depreciation_method", kind: FieldKind::Categorical(asset::Column::DepreciationMethod), allowed: EXACT_ONLY },
    FieldSpec { name: "created_at", kind: FieldKind::DateTime(asset::Column::CreatedAt), allowed: ORDERING_AND_RANGE_OPS },
    FieldSpec { name: "updated_at", kind: FieldKind::DateTime(asset::Column::UpdatedAt), allowed: ORDERING_AND_RANGE_OPS },
    FieldSpec { name: "disposed_at", kind: FieldKind::DateTime(asset::Column::DisposedAt), allowed: ORDERING_AND_RANGE_OPS },
    FieldSpec { name: "is_disposed", kind: FieldKind::Bool(asset::Column::IsDisposed), allowed: EXACT_ONLY },
];

static FIELD_INDEX: Lazy<HashMap<&'static str, &'static FieldSpec>> =
    Lazy::new(|| FIELDS.iter().map(|spec| (spec.name, spec)).collect());

pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELD_INDEX.get(name).copied()
}

/// Maps an operator token (a raw lookup suffix or a human-readable name)
/// to a comparison kind. Unknown tokens, including the unsupported
/// exclusion vocabulary, yield `None` and drop the field's predicate.
pub fn comparison_from_token(token: &str) -> Option<Comparison> {
    match token {
        "exact" | "equals" => Some(Comparison::Exact),
        "iexact" => Some(Comparison::IExact),
        "icontains" | "contains" => Some(Comparison::IContains),
        "lt" | "less than" => Some(Comparison::Lt),
        "lte" | "less than or equal to" => Some(Comparison::Lte),
        "gt" | "greater than" => Some(Comparison::Gt),
        "gte" | "greater than or equal to" => Some(Comparison::Gte),
        "range" | "within range" => Some(Comparison::Range),
        _ => None,
    }
}

/// Splits a raw value into `(value, comparison)`. Values may carry an
/// embedded operator suffix: `100__gte`, `100__greater than`. No suffix
/// means an exact match; an unrecognized suffix means the whole predicate
/// is dropped (`None`).
pub fn split_operator(raw: &str) -> Option<(&str, Comparison)> {
    match raw.split_once("__") {
        None => Some((raw, Comparison::Exact)),
        Some((value, token)) => comparison_from_token(token).map(|cmp| (value, cmp)),
    }
}

/// Filter outcome: the composed predicate plus, for diagnostics, the
/// fields that actually contributed to it.
#[derive(Debug)]
pub struct AppliedFilter {
    pub condition: Condition,
    pub fields: Vec<&'static str>,
}

/// Builds the asset predicate from raw query parameters.
///
/// `match_all=false` keeps the reference behavior: the accumulated AND
/// chain is OR-combined with an empty predicate, which collapses back to
/// the same conjunction. Preserved for compatibility (see DESIGN.md).
pub async fn build_asset_filter(
    db: &DatabaseConnection,
    params: &HashMap<String, String>,
) -> Result<AppliedFilter, ServiceError> {
    let mut condition = Condition::all();
    let mut fields = Vec::new();

    for (name, raw) in params {
        if name == "match_all" {
            continue;
        }
        let Some(spec) = field_spec(name) else {
            continue; // unknown parameter names are silently ignored
        };

        let per_field = match spec.kind {
            FieldKind::ForeignKey(target) => {
                // Foreign keys only support exact matching on the display
                // name; the raw value is the name itself.
                reference_condition(db, target, raw).await?
            }
            _ => scalar_condition(spec, raw),
        };

        if let Some(per_field) = per_field {
            debug!(field = spec.name, value = %raw, "Applied filter");
            condition = condition.add(per_field);
            fields.push(spec.name);
        }
    }

    fields.sort_unstable();

    let match_all = params
        .get("match_all")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(true);
    if !match_all {
        // OR of the chain with nothing else: identical result set.
        condition = Condition::any().add(condition);
    }

    Ok(AppliedFilter { condition, fields })
}

/// Builds the predicate for a non-reference field. Returns `None` when the
/// operator is not allowed for the field or the value fails to coerce.
pub fn scalar_condition(spec: &FieldSpec, raw: &str) -> Option<Condition> {
    let (value, cmp) = split_operator(raw)?;
    if !spec.allowed.contains(&cmp) {
        return None;
    }

    let expr = match spec.kind {
        FieldKind::Text(col) => match cmp {
            Comparison::Exact => col.eq(value),
            Comparison::IExact => case_insensitive_eq(col, value),
            Comparison::IContains => case_insensitive_contains(col, value),
            _ => return None,
        },
        FieldKind::Categorical(col) => col.eq(value),
        FieldKind::Bool(col) => col.eq(parse_bool(value)?),
        FieldKind::Int(col) => {
            if cmp == Comparison::Range {
                let (low, high) = parse_range::<i64>(value)?;
                col.between(low, high)
            } else {
                ordering_expr(col, cmp, value.trim().parse::<i64>().ok()?)?
            }
        }
        FieldKind::Money(col) => {
            if cmp == Comparison::Range {
                let (low, high) = parse_range::<Decimal>(value)?;
                col.between(low, high)
            } else {
                ordering_expr(col, cmp, value.trim().parse::<Decimal>().ok()?)?
            }
        }
        FieldKind::Date(col) => {
            if cmp == Comparison::Range {
                let (low, high) = parse_range_with(value, parse_date)?;
                col.between(low, high)
            } else {
                ordering_expr(col, cmp, parse_date(value)?)?
            }
        }
        FieldKind::DateTime(col) => {
            if cmp == Comparison::Range {
                let (low, high) = parse_range_with(value, parse_datetime)?;
                col.between(low, high)
            } else {
                ordering_expr(col, cmp, parse_datetime(value)?)?
            }
        }
        FieldKind::ForeignKey(_) => return None,
    };

    Some(Condition::all().add(expr))
}

/// Case-insensitive equality. sqlite's LIKE is already insensitive for
/// ASCII but postgres equality is not; uppercasing both sides keeps the
/// backends in agreement.
fn case_insensitive_eq<C: ColumnTrait>(col: C, value: &str) -> SimpleExpr {
    Expr::expr(Func::upper(Expr::col(col))).eq(value.to_uppercase())
}

fn case_insensitive_contains<C: ColumnTrait>(col: C, value: &str) -> SimpleExpr {
    Expr::expr(Func::upper(Expr::col(col))).like(format!("%{}%", value.to_uppercase()))
}

fn ordering_expr<V>(
    col: asset::Column,
    cmp: Comparison,
    value: V,
) -> Option<sea_orm::sea_query::SimpleExpr>
where
    V: Into<sea_orm::Value>,
{
    Some(match cmp {
        Comparison::Exact => col.eq(value),
        Comparison::Lt => col.lt(value),
        Comparison::Lte => col.lte(value),
        Comparison::Gt => col.gt(value),
        Comparison::Gte => col.gte(value),
        Comparison::IExact | Comparison::IContains | Comparison::Range => return None,
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            parse_date(trimmed)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
        })
}

fn parse_range<T: std::str::FromStr>(value: &str) -> Option<(T, T)> {
    parse_range_with(value, |part| part.trim().parse::<T>().ok())
}

fn parse_range_with<T>(value: &str, parse: impl Fn(&str) -> Option<T>) -> Option<(T, T)> {
    let (low, high) = value.split_once(',')?;
    Some((parse(low)?, parse(high)?))
}

/// Resolves a foreign-key filter by display name.
///
/// Employees match fuzzily: each whitespace token is OR-matched against
/// first, middle, and last name, and the asset predicate becomes an id-set
/// membership test. Other references must match the stored name exactly;
/// a miss fails closed to an impossible predicate (empty result, never an
/// error).
async fn reference_condition(
    db: &DatabaseConnection,
    target: RefTarget,
    raw: &str,
) -> Result<Option<Condition>, ServiceError> {
    if target == RefTarget::Employee {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.is_empty() {
            // A blank name must not degenerate into "has any custodian".
            return Ok(Some(
                Condition::all().add(asset::Column::EmployeeId.is_in(Vec::<i64>::new())),
            ));
        }
        let mut name_filter = Condition::any();
        for token in tokens {
            name_filter = name_filter
                .add(case_insensitive_contains(employee::Column::FirstName, token))
                .add(case_insensitive_contains(employee::Column::MiddleName, token))
                .add(case_insensitive_contains(employee::Column::LastName, token));
        }
        let ids: Vec<i64> = employee::Entity::find()
            .filter(name_filter)
            .select_only()
            .column(employee::Column::Id)
            .into_tuple()
            .all(db)
            .await?;
        debug!(?ids, "Resolved employee name filter");
        // An empty id set is an impossible membership test; unmatched
        // employee names therefore return nothing rather than erroring.
        return Ok(Some(
            Condition::all().add(asset::Column::EmployeeId.is_in(ids)),
        ));
    }

    let name = raw.trim();
    let (fk_column, resolved) = match target {
        RefTarget::MajorCategory => (
            asset::Column::MajorCategoryId,
            major_category::Entity::find()
                .filter(major_category::Column::Name.eq(name))
                .one(db)
                .await?
                .map(|m| m.id),
        ),
        RefTarget::MinorCategory => (
            asset::Column::MinorCategoryId,
            minor_category::Entity::find()
                .filter(minor_category::Column::Name.eq(name))
                .one(db)
                .await?
                .map(|m| m.id),
        ),
        RefTarget::Department => (
            asset::Column::DepartmentId,
            department::Entity::find()
                .filter(department::Column::Name.eq(name))
                .one(db)
                .await?
                .map(|m| m.id),
        ),
        RefTarget::Location => (
            asset::Column::LocationId,
            location::Entity::find()
                .filter(location::Column::Name.eq(name))
                .one(db)
                .await?
                .map(|m| m.id),
        ),
        RefTarget::Supplier => (
            asset::Column::SupplierId,
            supplier::Entity::find()
                .filter(supplier::Column::Name.eq(name))
                .one(db)
                .await?
                .map(|m| m.id),
        ),
        RefTarget::Employee => unreachable!("employee handled above"),
    };

    let expr = match resolved {
        Some(id) => fk_column.eq(id),
        // Fail closed: name not found matches nothing.
        None => fk_column.is_in(Vec::<i64>::new()),
    };
    Ok(Some(Condition::all().add(expr)))
}
