//! Tests for parsing, validation, and the error report.

use super::headers::{canonical_field, field};
use super::parser::RowParser;
use super::report::error_report;
use super::row::RawRow;
use super::validate::{validate_allocations, validate_rate_card};
use crate::vocab::RequestType;
use rust_decimal_macros::dec;

const RATE_CARD: &str = "\
Geography,Client Name,Process Type,Location,Request Type,Rate,Flat Rate
US,Acme,Intake,SiteA,Key,2.5,
US,Acme,Intake,SiteB,New Request,4.0,100
";

fn parse(input: &str) -> (Vec<String>, Vec<RawRow>) {
    let parser = RowParser::new(input.as_bytes()).expect("header row");
    let columns = parser.columns().to_vec();
    let rows = parser.collect::<Result<Vec<_>, _>>().expect("rows parse");
    (columns, rows)
}

#[test]
fn test_header_mapping() {
    assert_eq!(canonical_field("Geography"), Some(field::GEOGRAPHY));
    assert_eq!(canonical_field("Sub Region"), Some(field::GEOGRAPHY));
    assert_eq!(canonical_field("Delivery Location"), Some(field::SUBPROJECT));
    assert_eq!(canonical_field("Request_Type"), Some(field::REQUEST_TYPE));
    assert_eq!(canonical_field("Flat Rate"), Some(field::FLATRATE));
    assert_eq!(canonical_field("Rate"), Some(field::RATE));
    assert_eq!(canonical_field("Resource Email"), Some(field::RESOURCE_EMAIL));
    assert_eq!(canonical_field("Resource"), Some(field::RESOURCE_NAME));
    assert_eq!(canonical_field("Comments"), None);
}

#[test]
fn test_parser_maps_and_trims() {
    let (columns, rows) = parse(RATE_CARD);
    assert!(columns.contains(&field::GEOGRAPHY.to_string()));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].number, 1);
    assert_eq!(rows[0].get(field::CLIENT), Some("Acme"));
    assert_eq!(rows[0].get(field::FLATRATE), None);
    assert_eq!(rows[1].get(field::FLATRATE), Some("100"));
}

#[test]
fn test_parser_drops_blank_rows_silently() {
    let input = "\
Geography,Client,Process Type,Location,Request Type,Rate
US,Acme,Intake,SiteA,Key,2.5
,,,,,
US,Acme,Intake,SiteB,Key,2.5
";
    let (_, rows) = parse(input);
    assert_eq!(rows.len(), 2);
    // Blank rows still consume a row number so reports match the file.
    assert_eq!(rows[1].number, 3);
}

#[test]
fn test_missing_required_column_fails_up_front() {
    let input = "Geography,Client,Process Type,Location,Request Type\nUS,Acme,Intake,SiteA,Key\n";
    let parser = RowParser::new(input.as_bytes()).expect("header row");

    parser
        .require_columns(&[field::GEOGRAPHY, field::CLIENT])
        .expect("present columns pass");
    let err = parser
        .require_columns(&[field::GEOGRAPHY, field::RATE])
        .expect_err("rate column is absent");
    assert_eq!(
        err.to_string(),
        "Required column 'rate' not found in header row"
    );
}

#[test]
fn test_unmapped_headers_pass_through() {
    let input = "Geography,Comments\nUS,hello\n";
    let (columns, rows) = parse(input);
    assert_eq!(columns[1], "Comments");
    assert_eq!(rows[0].get("Comments"), Some("hello"));
}

#[test]
fn test_rate_card_valid_file() {
    let (_, rows) = parse(RATE_CARD);
    let validated = validate_rate_card(&rows);
    assert!(validated.is_clean());
    assert_eq!(validated.rows.len(), 2);
    assert_eq!(validated.rows[0].request_type, RequestType::Key);
    assert_eq!(validated.rows[0].rate, dec!(2.5));
    assert_eq!(validated.rows[1].flatrate, Some(dec!(100)));
}

#[test]
fn test_rate_card_missing_field_and_bad_number() {
    let input = "\
Geography,Client,Process Type,Location,Request Type,Rate
US,Acme,Intake,SiteA,Key,2.5
US,,Intake,SiteB,Key,NaN
";
    let (_, rows) = parse(input);
    let validated = validate_rate_card(&rows);
    assert_eq!(validated.rows.len(), 1);
    assert_eq!(validated.errors.len(), 1);
    let error = &validated.errors[0];
    assert_eq!(error.row_number, 2);
    assert!(error.messages.contains(&"Missing required field 'Client'".to_string()));
    assert!(error.messages.contains(&"Rate 'NaN' is not a number".to_string()));
}

#[test]
fn test_rate_card_unknown_vocab() {
    let input = "\
Geography,Client,Process Type,Location,Request Type,Rate
US,Acme,Shipping,SiteA,Telepathy,2.5
";
    let (_, rows) = parse(input);
    let validated = validate_rate_card(&rows);
    assert!(validated.rows.is_empty());
    let messages = &validated.errors[0].messages;
    assert!(messages.contains(&"Unknown process type 'Shipping'".to_string()));
    assert!(messages.contains(&"Unknown request type 'Telepathy'".to_string()));
}

#[test]
fn test_rate_card_intra_file_duplicate_rejected() {
    // Same key with different rates: must be rejected before any write.
    let input = "\
Geography,Client,Process Type,Location,Request Type,Rate
US,Acme,Intake,SiteA,Key,2.5
US,Acme,Intake,SiteA,Key,3.0
";
    let (_, rows) = parse(input);
    let validated = validate_rate_card(&rows);
    assert_eq!(validated.rows.len(), 1);
    assert_eq!(validated.errors.len(), 1);
    assert_eq!(validated.errors[0].row_number, 2);
    assert!(validated.errors[0].messages[0].starts_with("Duplicate row for key"));
}

#[test]
fn test_invalid_row_does_not_claim_its_duplicate_key() {
    // Row 1 fails on the rate; row 2 carries the same key but is well
    // formed. The error belongs to row 1 alone and row 2 is accepted.
    let input = "\
Geography,Client,Process Type,Location,Request Type,Rate
US,Acme,Intake,SiteA,Key,bogus
US,Acme,Intake,SiteA,Key,2.5
";
    let (_, rows) = parse(input);
    let validated = validate_rate_card(&rows);

    assert_eq!(validated.rows.len(), 1);
    assert_eq!(validated.rows[0].row_number, 2);
    assert_eq!(validated.errors.len(), 1);
    assert_eq!(validated.errors[0].row_number, 1);
    assert_eq!(
        validated.errors[0].messages,
        vec!["Rate 'bogus' is not a number".to_string()]
    );
}

#[test]
fn test_duplicate_detection_is_normalized() {
    let input = "\
Geography,Client,Process Type,Location,Request Type,Rate
US,Acme Corp,Intake,SiteA,Key,2.5
us,ACME_CORP,intake,SiteA,KEY,9.9
";
    let (_, rows) = parse(input);
    let validated = validate_rate_card(&rows);
    assert_eq!(validated.errors.len(), 1);
}

#[test]
fn test_productivity_pairing() {
    let input = "\
Geography,Client,Process Type,Location,Request Type,Rate,Productivity Level,Base Rate
US,Acme,Intake,SiteA,Key,2.5,high,18
US,Acme,Intake,SiteB,Key,2.5,best,
";
    let (_, rows) = parse(input);
    let validated = validate_rate_card(&rows);
    assert_eq!(validated.rows.len(), 1);
    assert!(validated.rows[0].productivity.is_some());
    assert!(
        validated.errors[0]
            .messages
            .contains(&"Productivity level given without a base rate".to_string())
    );
}

#[test]
fn test_allocation_feed_validation() {
    let input = "\
Geography,Process,Location,Request Type,Allocation Date,Resource,Resource Email
Offshore,Intake_Client_3,SiteA,Key,2026-03-14,Dana,dana@example.com
Offshore,Intake_Client_3,SiteA,Key,14-not-a-date,Dana,dana@example.com
";
    let (_, rows) = parse(input);
    let validated = validate_allocations(&rows);
    assert_eq!(validated.rows.len(), 1);
    assert_eq!(validated.rows[0].process, "Intake_Client_3");
    assert_eq!(
        validated.errors[0].messages,
        vec!["Unparseable date '14-not-a-date'".to_string()]
    );
}

#[test]
fn test_error_report_round_trip() {
    let input = "\
Geography,Client,Process Type,Location,Request Type,Rate
US,Acme,Intake,SiteA,Key,2.5
US,,Intake,SiteB,Key,bad
";
    let (columns, rows) = parse(input);
    let validated = validate_rate_card(&rows);
    let report = error_report(&columns, &rows, &validated.errors).expect("report builds");
    let text = String::from_utf8(report).expect("utf8");

    let mut lines = text.lines();
    let header = lines.next().expect("header line");
    assert!(header.ends_with(",errors"));
    let line = lines.next().expect("one error row");
    assert!(line.contains("SiteB"));
    assert!(line.contains("Missing required field 'Client'; Rate 'bad' is not a number"));
    assert!(lines.next().is_none());
}
