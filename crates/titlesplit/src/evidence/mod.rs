//! CSV importers for the pre-fetched evidence the engine consumes.

mod normalizer;
mod parser;

pub(crate) use normalizer::normalize_address;

use crate::domain::{ComparableSale, EpcRecord};
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum EvidenceImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for EvidenceImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvidenceImportError::Io(err) => write!(f, "failed to read evidence export: {}", err),
            EvidenceImportError::Csv(err) => write!(f, "invalid evidence CSV data: {}", err),
        }
    }
}

impl std::error::Error for EvidenceImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EvidenceImportError::Io(err) => Some(err),
            EvidenceImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for EvidenceImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for EvidenceImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads Price Paid style exports:
/// `Address, Postcode, Price, Date, Property Type, New Build, Tenure`.
pub struct ComparableImporter;

impl ComparableImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ComparableSale>, EvidenceImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ComparableSale>, EvidenceImportError> {
        Ok(parser::parse_comparables(reader)?)
    }
}

/// Reads EPC register exports: `Address, Postcode, Current Rating, Total Floor Area`.
pub struct EpcImporter;

impl EpcImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<EpcRecord>, EvidenceImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<EpcRecord>, EvidenceImportError> {
        Ok(parser::parse_epcs(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EnergyRating, PropertyType, TenureCode};
    use chrono::NaiveDate;
    use std::io::Cursor;

    #[test]
    fn sale_dates_accept_price_paid_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date");
        assert_eq!(
            parser::parse_sale_date_for_tests("2024-03-15 00:00"),
            Some(expected)
        );
        assert_eq!(parser::parse_sale_date_for_tests("2024-03-15"), Some(expected));
        assert_eq!(parser::parse_sale_date_for_tests("15/03/2024"), Some(expected));
        assert_eq!(
            parser::parse_sale_date_for_tests("2024-03-15T09:30:00Z"),
            Some(expected)
        );
        assert!(parser::parse_sale_date_for_tests(" ").is_none());
    }

    #[test]
    fn comparable_import_skips_unrecognised_codes() {
        let csv = "Address,Postcode,Price,Date,Property Type,New Build,Tenure\n\
Flat 1 10 Lord Street,pr9 0np,82000,2024-11-02,F,N,L\n\
3 Hill Road,PR9 0NP,245000,2024-10-12,X,N,F\n\
Flat 4 12 Lord Street,PR9 0NP,91000,2024-09-30,F,Y,L\n";

        let sales = ComparableImporter::from_reader(Cursor::new(csv)).expect("import succeeds");

        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].postcode, "PR9 0NP");
        assert_eq!(sales[0].property_type, PropertyType::Flat);
        assert_eq!(sales[0].tenure, TenureCode::Leasehold);
        assert!(!sales[0].new_build);
        assert!(sales[1].new_build);
    }

    #[test]
    fn comparable_import_rejects_malformed_prices() {
        let csv = "Address,Postcode,Price,Date,Property Type,New Build,Tenure\n\
Flat 1,PR9 0NP,eighty thousand,2024-11-02,F,N,L\n";

        let error = ComparableImporter::from_reader(Cursor::new(csv)).expect_err("csv error");
        assert!(matches!(error, EvidenceImportError::Csv(_)));
    }

    #[test]
    fn epc_import_reads_ratings_and_areas() {
        let csv = "Address,Postcode,Current Rating,Total Floor Area\n\
Flat 1 10 Lord Street,PR9 0NP,d,48.5\n\
Flat 2 10 Lord Street,PR9 0NP,,\n";

        let records = EpcImporter::from_reader(Cursor::new(csv)).expect("import succeeds");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rating, Some(EnergyRating::D));
        assert_eq!(records[0].floor_area_sqm, Some(48.5));
        assert_eq!(records[1].rating, None);
        assert_eq!(records[1].floor_area_sqm, None);
    }

    #[test]
    fn importer_from_path_propagates_io_errors() {
        let error = EpcImporter::from_path("./does-not-exist.csv").expect_err("expected io error");

        match error {
            EvidenceImportError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
