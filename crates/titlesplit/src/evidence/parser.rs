use crate::domain::{ComparableSale, EnergyRating, EpcRecord, PropertyType, TenureCode};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use std::io::Read;
use tracing::warn;

pub(crate) fn parse_comparables<R: Read>(reader: R) -> Result<Vec<ComparableSale>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut sales = Vec::new();

    for (index, record) in csv_reader.deserialize::<PricePaidRow>().enumerate() {
        let row = record?;
        match row.into_sale() {
            Ok(sale) => sales.push(sale),
            Err(reason) => warn!(row = index + 1, %reason, "skipping comparable sale"),
        }
    }

    Ok(sales)
}

pub(crate) fn parse_epcs<R: Read>(reader: R) -> Result<Vec<EpcRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.deserialize::<EpcRow>() {
        records.push(record?.into_record());
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct PricePaidRow {
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "Postcode")]
    postcode: String,
    #[serde(rename = "Price")]
    price: i64,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Property Type")]
    property_type: String,
    #[serde(rename = "New Build", default, deserialize_with = "empty_string_as_none")]
    new_build: Option<String>,
    #[serde(rename = "Tenure")]
    tenure: String,
}

impl PricePaidRow {
    fn into_sale(self) -> Result<ComparableSale, String> {
        let sale_date = parse_sale_date(&self.date)
            .ok_or_else(|| format!("unrecognised sale date '{}'", self.date))?;
        let property_type = PropertyType::from_code(&self.property_type)
            .ok_or_else(|| format!("unknown property type '{}'", self.property_type))?;
        let tenure = TenureCode::from_code(&self.tenure)
            .ok_or_else(|| format!("unknown tenure '{}'", self.tenure))?;
        if self.price <= 0 {
            return Err(format!("non-positive price {}", self.price));
        }

        let new_build = self
            .new_build
            .as_deref()
            .map(|flag| matches!(flag.trim().to_ascii_uppercase().as_str(), "Y" | "YES" | "TRUE"))
            .unwrap_or(false);

        Ok(ComparableSale {
            address: self.address,
            postcode: self.postcode.to_ascii_uppercase(),
            price: self.price,
            sale_date,
            property_type,
            new_build,
            tenure,
        })
    }
}

#[derive(Debug, Deserialize)]
struct EpcRow {
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "Postcode")]
    postcode: String,
    #[serde(rename = "Current Rating", default, deserialize_with = "empty_string_as_none")]
    current_rating: Option<String>,
    #[serde(rename = "Total Floor Area", default, deserialize_with = "empty_string_as_none")]
    total_floor_area: Option<String>,
}

impl EpcRow {
    fn into_record(self) -> EpcRecord {
        let rating = self.current_rating.as_deref().and_then(EnergyRating::from_code);
        let floor_area_sqm = self
            .total_floor_area
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|sqm| sqm.is_finite() && *sqm > 0.0);

        EpcRecord {
            address: self.address,
            postcode: self.postcode.to_ascii_uppercase(),
            rating,
            floor_area_sqm,
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_sale_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M") {
        return Some(dt.date());
    }

    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

#[cfg(test)]
pub(crate) fn parse_sale_date_for_tests(value: &str) -> Option<NaiveDate> {
    parse_sale_date(value)
}
