use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QuoteError;

/// Primary key assigned by the record store
pub type RecordKey = i64;

/// Import quotation line (one product offered by one shop)
///
/// `qty`, `amount`, `cbm`, `total_cbm`, `total_gw`, `nw` and `total_nw` are
/// derived: they are always recomputed from the base fields by
/// `derived::recompute` and never set directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationRecord {
    // Identity
    pub shop_no: String,
    pub quotation_no: String,
    pub referencia: String,
    pub item_no: String,
    pub photo_no: String,

    // Descriptive
    pub description: String,
    pub name: String,
    pub remark: String,
    pub obs: String,
    pub ncm: String,
    pub english_description: String,

    // Commercial
    pub moq: Decimal,
    pub ctns: Decimal,
    pub unit_ctn: Decimal,
    pub qty: Decimal,
    pub unit_price_rmb: Decimal,
    pub unit: String,
    pub amount: Decimal,

    // Physical (cm, kg per carton, g per unit)
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    pub cbm: Decimal,
    pub total_cbm: Decimal,
    pub gw: Decimal,
    pub total_gw: Decimal,
    pub nw: Decimal,
    pub total_nw: Decimal,
    pub unit_weight: Decimal,

    // Contact / segment
    pub contact_name: String,
    pub contact_phone: String,
    pub quotation_date: Option<NaiveDate>,
    pub segment: String,
}

impl Default for QuotationRecord {
    fn default() -> Self {
        Self {
            shop_no: String::new(),
            quotation_no: String::new(),
            referencia: String::new(),
            item_no: String::new(),
            photo_no: String::new(),
            description: String::new(),
            name: String::new(),
            remark: String::new(),
            obs: String::new(),
            ncm: String::new(),
            english_description: String::new(),
            moq: Decimal::ONE,
            ctns: Decimal::ZERO,
            unit_ctn: Decimal::ZERO,
            qty: Decimal::ZERO,
            unit_price_rmb: Decimal::ZERO,
            unit: String::new(),
            amount: Decimal::ZERO,
            length: Decimal::ZERO,
            width: Decimal::ZERO,
            height: Decimal::ZERO,
            cbm: Decimal::ZERO,
            total_cbm: Decimal::ZERO,
            gw: Decimal::ZERO,
            total_gw: Decimal::ZERO,
            nw: Decimal::ZERO,
            total_nw: Decimal::ZERO,
            unit_weight: Decimal::ZERO,
            contact_name: String::new(),
            contact_phone: String::new(),
            quotation_date: None,
            segment: String::new(),
        }
    }
}

impl QuotationRecord {
    /// Natural key used for duplicate detection
    pub fn natural_key(&self) -> &str {
        self.referencia.trim()
    }

    /// Current value of a field
    pub fn get(&self, field: Field) -> FieldValue {
        use Field::*;
        match field {
            ShopNo => FieldValue::Text(self.shop_no.clone()),
            QuotationNo => FieldValue::Text(self.quotation_no.clone()),
            Referencia => FieldValue::Text(self.referencia.clone()),
            ItemNo => FieldValue::Text(self.item_no.clone()),
            PhotoNo => FieldValue::Text(self.photo_no.clone()),
            Description => FieldValue::Text(self.description.clone()),
            Name => FieldValue::Text(self.name.clone()),
            Remark => FieldValue::Text(self.remark.clone()),
            Obs => FieldValue::Text(self.obs.clone()),
            Ncm => FieldValue::Text(self.ncm.clone()),
            EnglishDescription => FieldValue::Text(self.english_description.clone()),
            Moq => FieldValue::Number(self.moq),
            Ctns => FieldValue::Number(self.ctns),
            UnitCtn => FieldValue::Number(self.unit_ctn),
            Qty => FieldValue::Number(self.qty),
            UnitPriceRmb => FieldValue::Number(self.unit_price_rmb),
            Unit => FieldValue::Text(self.unit.clone()),
            Amount => FieldValue::Number(self.amount),
            Length => FieldValue::Number(self.length),
            Width => FieldValue::Number(self.width),
            Height => FieldValue::Number(self.height),
            Cbm => FieldValue::Number(self.cbm),
            TotalCbm => FieldValue::Number(self.total_cbm),
            Gw => FieldValue::Number(self.gw),
            TotalGw => FieldValue::Number(self.total_gw),
            Nw => FieldValue::Number(self.nw),
            TotalNw => FieldValue::Number(self.total_nw),
            UnitWeight => FieldValue::Number(self.unit_weight),
            ContactName => FieldValue::Text(self.contact_name.clone()),
            ContactPhone => FieldValue::Text(self.contact_phone.clone()),
            QuotationDate => FieldValue::Date(self.quotation_date),
            Segment => FieldValue::Text(self.segment.clone()),
        }
    }

    /// Overwrite a field, coercing the value to the field's kind
    ///
    /// Text given to a numeric field is parsed leniently (0 on failure);
    /// numbers given to a text field are rendered. This does not recompute
    /// derived fields.
    pub fn set(&mut self, field: Field, value: FieldValue) {
        use Field::*;
        match field {
            ShopNo => self.shop_no = value.into_text(),
            QuotationNo => self.quotation_no = value.into_text(),
            Referencia => self.referencia = value.into_text(),
            ItemNo => self.item_no = value.into_text(),
            PhotoNo => self.photo_no = value.into_text(),
            Description => self.description = value.into_text(),
            Name => self.name = value.into_text(),
            Remark => self.remark = value.into_text(),
            Obs => self.obs = value.into_text(),
            Ncm => self.ncm = value.into_text(),
            EnglishDescription => self.english_description = value.into_text(),
            Moq => self.moq = value.into_number(),
            Ctns => self.ctns = value.into_number(),
            UnitCtn => self.unit_ctn = value.into_number(),
            Qty => self.qty = value.into_number(),
            UnitPriceRmb => self.unit_price_rmb = value.into_number(),
            Unit => self.unit = value.into_text(),
            Amount => self.amount = value.into_number(),
            Length => self.length = value.into_number(),
            Width => self.width = value.into_number(),
            Height => self.height = value.into_number(),
            Cbm => self.cbm = value.into_number(),
            TotalCbm => self.total_cbm = value.into_number(),
            Gw => self.gw = value.into_number(),
            TotalGw => self.total_gw = value.into_number(),
            Nw => self.nw = value.into_number(),
            TotalNw => self.total_nw = value.into_number(),
            UnitWeight => self.unit_weight = value.into_number(),
            ContactName => self.contact_name = value.into_text(),
            ContactPhone => self.contact_phone = value.into_text(),
            QuotationDate => self.quotation_date = value.into_date(),
            Segment => self.segment = value.into_text(),
        }
    }
}

/// Value kinds a record attribute can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Date,
}

/// Every attribute of a `QuotationRecord`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    ShopNo,
    QuotationNo,
    Referencia,
    ItemNo,
    PhotoNo,
    Description,
    Name,
    Remark,
    Obs,
    Ncm,
    EnglishDescription,
    Moq,
    Ctns,
    UnitCtn,
    Qty,
    UnitPriceRmb,
    Unit,
    Amount,
    Length,
    Width,
    Height,
    Cbm,
    TotalCbm,
    Gw,
    TotalGw,
    Nw,
    TotalNw,
    UnitWeight,
    ContactName,
    ContactPhone,
    QuotationDate,
    Segment,
}

impl Field {
    pub const ALL: [Field; 32] = [
        Field::ShopNo,
        Field::QuotationNo,
        Field::Referencia,
        Field::ItemNo,
        Field::PhotoNo,
        Field::Description,
        Field::Name,
        Field::Remark,
        Field::Obs,
        Field::Ncm,
        Field::EnglishDescription,
        Field::Moq,
        Field::Ctns,
        Field::UnitCtn,
        Field::Qty,
        Field::UnitPriceRmb,
        Field::Unit,
        Field::Amount,
        Field::Length,
        Field::Width,
        Field::Height,
        Field::Cbm,
        Field::TotalCbm,
        Field::Gw,
        Field::TotalGw,
        Field::Nw,
        Field::TotalNw,
        Field::UnitWeight,
        Field::ContactName,
        Field::ContactPhone,
        Field::QuotationDate,
        Field::Segment,
    ];

    /// External (camelCase) attribute name
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::ShopNo => "shopNo",
            Field::QuotationNo => "quotationNo",
            Field::Referencia => "referencia",
            Field::ItemNo => "itemNo",
            Field::PhotoNo => "photoNo",
            Field::Description => "description",
            Field::Name => "name",
            Field::Remark => "remark",
            Field::Obs => "obs",
            Field::Ncm => "ncm",
            Field::EnglishDescription => "englishDescription",
            Field::Moq => "moq",
            Field::Ctns => "ctns",
            Field::UnitCtn => "unitCtn",
            Field::Qty => "qty",
            Field::UnitPriceRmb => "unitPriceRmb",
            Field::Unit => "unit",
            Field::Amount => "amount",
            Field::Length => "length",
            Field::Width => "width",
            Field::Height => "height",
            Field::Cbm => "cbm",
            Field::TotalCbm => "totalCbm",
            Field::Gw => "gw",
            Field::TotalGw => "totalGw",
            Field::Nw => "nw",
            Field::TotalNw => "totalNw",
            Field::UnitWeight => "unitWeight",
            Field::ContactName => "contactName",
            Field::ContactPhone => "contactPhone",
            Field::QuotationDate => "quotationDate",
            Field::Segment => "segment",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Moq
            | Field::Ctns
            | Field::UnitCtn
            | Field::Qty
            | Field::UnitPriceRmb
            | Field::Amount
            | Field::Length
            | Field::Width
            | Field::Height
            | Field::Cbm
            | Field::TotalCbm
            | Field::Gw
            | Field::TotalGw
            | Field::Nw
            | Field::TotalNw
            | Field::UnitWeight => FieldKind::Number,
            Field::QuotationDate => FieldKind::Date,
            Field::ShopNo
            | Field::QuotationNo
            | Field::Referencia
            | Field::ItemNo
            | Field::PhotoNo
            | Field::Description
            | Field::Name
            | Field::Remark
            | Field::Obs
            | Field::Ncm
            | Field::EnglishDescription
            | Field::Unit
            | Field::ContactName
            | Field::ContactPhone
            | Field::Segment => FieldKind::Text,
        }
    }

    /// Fields computed by the derived-field engine
    pub fn is_derived(&self) -> bool {
        matches!(
            self,
            Field::Qty
                | Field::Amount
                | Field::Cbm
                | Field::TotalCbm
                | Field::TotalGw
                | Field::Nw
                | Field::TotalNw
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = QuoteError;

    /// Accepts camelCase, snake_case or any case variant of the attribute name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        Field::ALL
            .iter()
            .copied()
            .find(|field| field.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| QuoteError::UnknownField(s.to_string()))
    }
}

/// A typed attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Number(Decimal),
    Date(Option<NaiveDate>),
    Text(String),
}

impl FieldValue {
    pub fn into_text(self) -> String {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Number(n) => n.normalize().to_string(),
            FieldValue::Date(d) => d.map(|d| d.to_string()).unwrap_or_default(),
        }
    }

    pub fn into_number(self) -> Decimal {
        match self {
            FieldValue::Number(n) => n,
            FieldValue::Text(s) => crate::importers::mapping::parse_number(&s),
            FieldValue::Date(_) => Decimal::ZERO,
        }
    }

    pub fn into_date(self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => d,
            FieldValue::Text(s) => parse_date(&s),
            FieldValue::Number(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clone().into_text())
    }
}

/// Parse a quotation date (ISO or day-first)
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// A record together with its store key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub key: RecordKey,
    #[serde(flatten)]
    pub record: QuotationRecord,
}

/// Partial update: the attributes that changed, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub changes: Vec<(Field, FieldValue)>,
}

impl RecordPatch {
    /// Attributes whose values differ between `before` and `after`
    pub fn between(before: &QuotationRecord, after: &QuotationRecord) -> Self {
        let changes = Field::ALL
            .iter()
            .copied()
            .filter_map(|field| {
                let value = after.get(field);
                (before.get(field) != value).then_some((field, value))
            })
            .collect();
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Apply the changes to a record in place
    pub fn apply_to(&self, record: &mut QuotationRecord) {
        for (field, value) in &self.changes {
            record.set(*field, value.clone());
        }
    }
}

/// Comment attached to a stored quotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Option<i64>,
    pub quotation_key: RecordKey,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_set_writes_each_field_to_its_own_slot() {
        let mut record = QuotationRecord::default();
        for (i, field) in Field::ALL.iter().enumerate() {
            if *field != Field::QuotationDate {
                record.set(*field, FieldValue::Text((i + 1).to_string()));
            }
        }
        record.set(Field::QuotationDate, FieldValue::Text("2026-01-05".to_string()));

        for (i, field) in Field::ALL.iter().enumerate() {
            let expected = match field.kind() {
                FieldKind::Text => FieldValue::Text((i + 1).to_string()),
                FieldKind::Number => FieldValue::Number(Decimal::from(i + 1)),
                FieldKind::Date => FieldValue::Date(NaiveDate::from_ymd_opt(2026, 1, 5)),
            };
            assert_eq!(record.get(*field), expected, "field {}", field.as_str());
        }
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(field.as_str().parse::<Field>().unwrap(), field);
        }
    }

    #[test]
    fn test_field_parse_accepts_snake_case() {
        assert_eq!("unit_price_rmb".parse::<Field>().unwrap(), Field::UnitPriceRmb);
        assert_eq!("TOTAL_NW".parse::<Field>().unwrap(), Field::TotalNw);
        assert!("colour".parse::<Field>().is_err());
    }

    #[test]
    fn test_exactly_seven_derived_fields() {
        let derived: Vec<Field> = Field::ALL.into_iter().filter(|f| f.is_derived()).collect();
        assert_eq!(derived.len(), 7);
        assert!(derived.iter().all(|f| f.kind() == FieldKind::Number));
    }

    #[test]
    fn test_set_coerces_values() {
        let mut record = QuotationRecord::default();
        record.set(Field::Ctns, FieldValue::Text("12".into()));
        record.set(Field::Name, FieldValue::Number(dec!(7.50)));
        record.set(Field::QuotationDate, FieldValue::Text("15/03/2025".into()));
        record.set(Field::Gw, FieldValue::Text("n/a".into()));

        assert_eq!(record.ctns, dec!(12));
        assert_eq!(record.name, "7.5");
        assert_eq!(record.quotation_date, NaiveDate::from_ymd_opt(2025, 3, 15));
        assert_eq!(record.gw, Decimal::ZERO);
    }

    #[test]
    fn test_patch_between_lists_only_changes() {
        let before = QuotationRecord::default();
        let mut after = before.clone();
        after.ctns = dec!(3);
        after.remark = "fragile".to_string();

        let patch = RecordPatch::between(&before, &after);
        assert_eq!(
            patch.changes,
            vec![
                (Field::Remark, FieldValue::Text("fragile".into())),
                (Field::Ctns, FieldValue::Number(dec!(3))),
            ]
        );

        let mut target = before.clone();
        patch.apply_to(&mut target);
        assert_eq!(target, after);
    }

    #[test]
    fn test_natural_key_is_trimmed() {
        let record = QuotationRecord {
            referencia: "  A1 ".to_string(),
            ..Default::default()
        };
        assert_eq!(record.natural_key(), "A1");
    }
}
