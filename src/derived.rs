//! Derived-field engine
//!
//! Quantity, amount, volumes and weight totals are pure functions of the
//! record's base fields:
//!
//! - `qty = ctns × unit_ctn`
//! - `amount = qty × unit_price_rmb`
//! - `cbm = length × width × height / 1,000,000` (cm → m³)
//! - `total_cbm = ctns × cbm`
//! - `total_gw = ctns × gw`
//! - `nw = unit_ctn × unit_weight / 1000` (g → kg)
//! - `total_nw = ctns × nw`
//!
//! Every edit goes through [`update_field`], which recomputes them before the
//! caller persists the record.

use anyhow::Result;
use rust_decimal::Decimal;
use tracing::warn;

use crate::db::models::{Field, FieldValue, QuotationRecord};
use crate::error::QuoteError;

const CM3_PER_M3: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
const GRAMS_PER_KG: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

/// Recompute every derived field from the current base fields
///
/// Returns a copy identical to `record` except for the seven derived
/// fields. Idempotent.
pub fn recompute(record: &QuotationRecord) -> QuotationRecord {
    let mut out = record.clone();

    out.qty = mul(record.ctns, record.unit_ctn);
    out.amount = mul(out.qty, record.unit_price_rmb);
    out.cbm = div(
        mul(mul(record.length, record.width), record.height),
        CM3_PER_M3,
    );
    out.total_cbm = mul(record.ctns, out.cbm);
    out.total_gw = mul(record.ctns, record.gw);
    out.nw = div(mul(record.unit_ctn, record.unit_weight), GRAMS_PER_KG);
    out.total_nw = mul(record.ctns, out.nw);

    out
}

/// Set one base field and return the recomputed record
///
/// The value is coerced to the field's kind (unparseable numbers become 0).
/// Derived fields cannot be set.
pub fn update_field(
    record: &QuotationRecord,
    field: Field,
    value: FieldValue,
) -> Result<QuotationRecord> {
    if field.is_derived() {
        return Err(QuoteError::DerivedField(field.to_string()).into());
    }

    let mut updated = record.clone();
    updated.set(field, value);
    Ok(recompute(&updated))
}

fn mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or_else(|| {
        warn!("Decimal overflow computing {} × {}, using 0", a, b);
        Decimal::ZERO
    })
}

fn div(a: Decimal, b: Decimal) -> Decimal {
    a.checked_div(b).unwrap_or(Decimal::ZERO)
}
