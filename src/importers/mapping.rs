//! Raw row to `QuotationRecord` mapping
//!
//! A fixed, ordered table of field rules says where each record attribute
//! comes from in the supplier sheet. Header lookup tries the exact header
//! text first, then the normalized form of every column header. Mapping is
//! lenient and never fails: missing values get defaults and the validator
//! decides later whether the record is acceptable.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use super::header::RawRow;
use super::normalizer::normalize_field;
use super::Cell;
use crate::db::models::{Field, FieldKind, FieldValue, QuotationRecord};
use crate::derived;

/// Placeholder reference for rows without a reference code
pub const UNKNOWN_REFERENCE: &str = "UNKNOWN";

/// Where one record attribute is read from and how it is converted
#[derive(Debug)]
pub struct FieldRule {
    /// Accepted header texts, most specific first
    pub sources: &'static [&'static str],
    pub target: Field,
    pub required: bool,
    pub transform: fn(&Cell) -> FieldValue,
}

/// Sheet columns understood by the importer
pub static FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        sources: &["REF", "REFERENCIA", "REFERENCE", "REF NO", "ITEM REF"],
        target: Field::Referencia,
        required: true,
        transform: text_value,
    },
    FieldRule {
        sources: &["ITEM NO", "ITEM", "ITEM NUMBER", "ART NO"],
        target: Field::ItemNo,
        required: false,
        transform: text_value,
    },
    FieldRule {
        sources: &["PHOTO", "PHOTO NO", "PICTURE", "PIC"],
        target: Field::PhotoNo,
        required: false,
        transform: text_value,
    },
    FieldRule {
        sources: &["DESCRIPTION", "DESCRIPCION", "DESCRICAO", "DESC"],
        target: Field::Description,
        required: true,
        transform: text_value,
    },
    FieldRule {
        sources: &["NAME", "NOME", "PRODUCT NAME"],
        target: Field::Name,
        required: true,
        transform: text_value,
    },
    FieldRule {
        sources: &["ENGLISH DESCRIPTION", "DESCRIPTION EN", "ENG DESCRIPTION"],
        target: Field::EnglishDescription,
        required: false,
        transform: text_value,
    },
    FieldRule {
        sources: &["REMARK", "REMARKS"],
        target: Field::Remark,
        required: false,
        transform: text_value,
    },
    FieldRule {
        sources: &["OBS", "OBSERVATION", "OBSERVATIONS", "OBSERVACAO"],
        target: Field::Obs,
        required: false,
        transform: text_value,
    },
    FieldRule {
        sources: &["NCM", "HS CODE", "HS"],
        target: Field::Ncm,
        required: false,
        transform: text_value,
    },
    FieldRule {
        sources: &["MOQ", "MIN ORDER", "MINIMUM ORDER"],
        target: Field::Moq,
        required: false,
        transform: number_value,
    },
    FieldRule {
        sources: &["CTNS", "CTN", "CARTONS"],
        target: Field::Ctns,
        required: true,
        transform: number_value,
    },
    FieldRule {
        sources: &["UNIT/CTN", "PCS/CTN", "QTY/CTN", "UNITS PER CARTON"],
        target: Field::UnitCtn,
        required: true,
        transform: number_value,
    },
    FieldRule {
        sources: &["U.PRICE", "UNIT PRICE", "PRICE", "PRICE RMB"],
        target: Field::UnitPriceRmb,
        required: true,
        transform: number_value,
    },
    FieldRule {
        sources: &["UNIT"],
        target: Field::Unit,
        required: false,
        transform: text_value,
    },
    FieldRule {
        sources: &["L", "LENGTH"],
        target: Field::Length,
        required: false,
        transform: number_value,
    },
    FieldRule {
        sources: &["W", "WIDTH"],
        target: Field::Width,
        required: false,
        transform: number_value,
    },
    FieldRule {
        sources: &["H", "HEIGHT"],
        target: Field::Height,
        required: false,
        transform: number_value,
    },
    FieldRule {
        sources: &["G.W", "GW", "GROSS WEIGHT"],
        target: Field::Gw,
        required: false,
        transform: number_value,
    },
    FieldRule {
        sources: &["UNIT WEIGHT", "U.WEIGHT", "UNIT WEIGHT (G)"],
        target: Field::UnitWeight,
        required: false,
        transform: number_value,
    },
];

static NORMALIZED_SOURCES: Lazy<Vec<Vec<String>>> = Lazy::new(|| {
    FIELD_RULES
        .iter()
        .map(|rule| rule.sources.iter().map(|s| normalize_field(s)).collect())
        .collect()
});

/// Values supplied by the user for every row of an import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingContext {
    pub shop_no: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub quotation_date: Option<NaiveDate>,
    pub segment: String,
}

/// Map one raw row into a fully typed record
///
/// Deterministic: the same row and context always produce the same record.
pub fn map_row(raw: &RawRow, ctx: &MappingContext) -> QuotationRecord {
    let mut record = QuotationRecord {
        shop_no: ctx.shop_no.trim().to_string(),
        contact_name: ctx.contact_name.trim().to_string(),
        contact_phone: ctx.contact_phone.trim().to_string(),
        quotation_date: ctx.quotation_date,
        segment: ctx.segment.trim().to_string(),
        ..Default::default()
    };

    for (idx, rule) in FIELD_RULES.iter().enumerate() {
        match locate(raw, rule, &NORMALIZED_SOURCES[idx]) {
            Some(cell) if !cell.is_empty() => {
                record.set(rule.target, (rule.transform)(cell));
            }
            _ if rule.required => {
                debug!("Required column {} missing or empty", rule.target);
                record.set(rule.target, missing_default(rule.target));
            }
            _ => {}
        }
    }

    let reference = record.referencia.trim().to_string();
    record.referencia = if reference.is_empty() {
        UNKNOWN_REFERENCE.to_string()
    } else {
        reference
    };
    record.quotation_no = quotation_number(&record);

    derived::recompute(&record)
}

/// Mapping target for each header, for sheet inspection
pub fn resolve_headers<'a>(
    headers: impl IntoIterator<Item = &'a str>,
) -> Vec<(String, String, Option<Field>)> {
    headers
        .into_iter()
        .map(|header| {
            let normalized = normalize_field(header);
            let target = FIELD_RULES
                .iter()
                .enumerate()
                .find(|(idx, rule)| {
                    rule.sources.iter().any(|source| *source == header)
                        || NORMALIZED_SOURCES[*idx].contains(&normalized)
                })
                .map(|(_, rule)| rule.target);
            (header.to_string(), normalized, target)
        })
        .collect()
}

/// Parse a numeric cell leniently
///
/// Currency symbols and thousands separators are stripped; anything
/// unparseable becomes 0.
pub fn parse_number(text: &str) -> Decimal {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '¥' | '￥' | '$' | ',') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .unwrap_or_else(|_| {
            debug!("Unparseable number '{}', using 0", text);
            Decimal::ZERO
        })
}

fn locate<'r>(raw: &'r RawRow, rule: &FieldRule, normalized: &[String]) -> Option<&'r Cell> {
    if let Some(cell) = rule.sources.iter().find_map(|source| raw.get(source)) {
        return Some(cell);
    }

    raw.iter()
        .find(|(key, _)| {
            let key = normalize_field(key);
            !key.is_empty() && normalized.contains(&key)
        })
        .map(|(_, cell)| cell)
}

fn text_value(cell: &Cell) -> FieldValue {
    FieldValue::Text(cell.as_text().trim().to_string())
}

fn number_value(cell: &Cell) -> FieldValue {
    match cell {
        Cell::Number(n) => FieldValue::Number(*n),
        Cell::Text(text) => FieldValue::Number(parse_number(text)),
        Cell::Empty => FieldValue::Number(Decimal::ZERO),
    }
}

fn missing_default(field: Field) -> FieldValue {
    match field.kind() {
        FieldKind::Number => FieldValue::Number(Decimal::ZERO),
        FieldKind::Text | FieldKind::Date => FieldValue::Text(String::new()),
    }
}

fn quotation_number(record: &QuotationRecord) -> String {
    let date = record
        .quotation_date
        .map(|d| d.to_string())
        .unwrap_or_default();
    let seed = format!("{}|{}|{}", record.shop_no, date, record.referencia);
    let hex = blake3::hash(seed.as_bytes()).to_hex();
    format!("Q-{}", hex.as_str()[..10].to_uppercase())
}
