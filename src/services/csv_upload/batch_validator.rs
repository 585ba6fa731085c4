use std::collections::HashSet;

use crate::errors::FieldError;
use crate::models::{Diagnostic, Transaction};

use super::field_validators;
use super::row_parser::{self, RawRow};

/// Outcome of scanning one upload: the rows that passed and one diagnostic per
/// line that did not.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub transactions: Vec<Transaction>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BatchReport {
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Trimmed first column of every well-formed line, used to look up persisted
/// reference numbers in a single query before the scan.
pub fn candidate_references(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    row_parser::rows(content)
        .filter_map(Result::ok)
        .map(|row| row.field(0).trim().to_string())
        .filter(|reference| !reference.is_empty() && seen.insert(reference.clone()))
        .collect()
}

/// Validates every non-blank line of `content`.
///
/// `persisted` holds the reference numbers already in the record store. A
/// line is checked in a fixed order and stops at its first failure: numeric
/// and date parsing, then reference number format, duplicates, name, symbol,
/// order side and order status.
pub fn validate_batch(content: &str, persisted: &HashSet<String>) -> BatchReport {
    let mut report = BatchReport::default();
    let mut batch_references: HashSet<String> = HashSet::new();

    for row in row_parser::rows(content) {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                report.diagnostics.push(Diagnostic::new(e.line_number(), e.to_string()));
                continue;
            }
        };

        match validate_row(&row, &batch_references, persisted) {
            Ok(transaction) => {
                batch_references.insert(transaction.reference_number.clone());
                report.transactions.push(transaction);
            }
            Err(e) => {
                report.diagnostics.push(Diagnostic::new(row.line_number, e.to_string()));
            }
        }
    }

    report
}

fn validate_row(
    row: &RawRow,
    batch_references: &HashSet<String>,
    persisted: &HashSet<String>,
) -> Result<Transaction, FieldError> {
    let reference_number = row.field(0).trim();
    let quantity = field_validators::quantity(row.field(1).trim())?;
    let amount = field_validators::amount(row.field(2).trim())?;
    let name = row.field(3).trim();
    let transaction_date = field_validators::transaction_date(row.field(4).trim())?;
    let symbol = row.field(5).trim();
    let order_side = row.field(6).trim();
    let order_status = row.field(7).trim();

    let reference_number = field_validators::reference_number(reference_number)?;
    if batch_references.contains(&reference_number) || persisted.contains(&reference_number) {
        return Err(FieldError::DuplicateReferenceNumber);
    }
    let name = field_validators::name(name)?;
    let symbol = field_validators::symbol(symbol)?;
    let order_side = field_validators::order_side(order_side)?;
    let order_status = field_validators::order_status(order_status)?;

    Ok(Transaction {
        reference_number,
        quantity,
        amount,
        name,
        transaction_date,
        symbol,
        order_side,
        order_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderSide, OrderStatus};
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    const VALID: &str = "AB12,100,250.50,John Doe,01/01/2024 10:00:00,ABC,Buy,Open";

    fn line(reference: &str) -> String {
        format!("{},100,250.50,John Doe,01/01/2024 10:00:00,ABC,Buy,Open", reference)
    }

    fn messages(report: &BatchReport) -> Vec<String> {
        report.diagnostics.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_valid_line_builds_transaction() {
        let report = validate_batch(VALID, &HashSet::new());
        assert!(report.is_valid());
        assert_eq!(report.transactions.len(), 1);

        let transaction = &report.transactions[0];
        assert_eq!(transaction.reference_number, "AB12");
        assert_eq!(transaction.quantity, 100);
        assert_eq!(transaction.amount, BigDecimal::from_str("250.50").unwrap());
        assert_eq!(transaction.name, "John Doe");
        assert_eq!(transaction.symbol, "ABC");
        assert_eq!(transaction.order_side, OrderSide::Buy);
        assert_eq!(transaction.order_status, OrderStatus::Open);
        assert_eq!(transaction.transaction_date.to_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn test_fields_are_trimmed() {
        let content = " AB12 , 100 , 250.50 , John Doe , 01/01/2024 10:00:00 , ABC , Sell , Matched ";
        let report = validate_batch(content, &HashSet::new());
        assert!(report.is_valid(), "{:?}", messages(&report));
        assert_eq!(report.transactions[0].reference_number, "AB12");
        assert_eq!(report.transactions[0].order_side, OrderSide::Sell);
    }

    #[test]
    fn test_wrong_date_format_is_diagnosed() {
        let content = format!(
            "{}\nAB13,100,250.50,John Doe,2024-01-01 10:00:00,ABC,Buy,Open\n{}",
            VALID,
            line("AB14")
        );
        let report = validate_batch(&content, &HashSet::new());
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].line_number, 2);
        assert!(report.diagnostics[0].message.starts_with("Invalid TransactionDate:"));
        assert_eq!(report.transactions.len(), 2);
    }

    #[test]
    fn test_column_count_error_does_not_stop_scan() {
        let content = format!("a,b,c,d,e,f,g\n{}\nx,y\n", VALID);
        let report = validate_batch(&content, &HashSet::new());
        assert_eq!(
            messages(&report),
            vec![
                "Line 1: Invalid column count (must be 8 columns).".to_string(),
                "Line 3: Invalid column count (must be 8 columns).".to_string(),
            ]
        );
        assert_eq!(report.transactions.len(), 1);
    }

    #[test]
    fn test_duplicate_within_batch_flags_second_occurrence() {
        let content = format!("{}\n{}\n{}", line("AB12"), line("CD34"), line("AB12"));
        let report = validate_batch(&content, &HashSet::new());
        assert_eq!(messages(&report), vec!["Line 3: Duplicate ReferenceNumber.".to_string()]);
        assert_eq!(report.transactions.len(), 2);
    }

    #[test]
    fn test_duplicate_against_persisted_references() {
        let persisted: HashSet<String> = ["AB12".to_string()].into_iter().collect();
        let report = validate_batch(&line("AB12"), &persisted);
        assert_eq!(messages(&report), vec!["Line 1: Duplicate ReferenceNumber.".to_string()]);
    }

    #[test]
    fn test_invalid_first_occurrence_does_not_reserve_reference() {
        let content = format!(
            "AB12,100,250.50,,01/01/2024 10:00:00,ABC,Buy,Open\n{}",
            line("AB12")
        );
        let report = validate_batch(&content, &HashSet::new());
        assert_eq!(messages(&report), vec!["Line 1: Name is required.".to_string()]);
        assert_eq!(report.transactions.len(), 1);
    }

    #[test]
    fn test_reference_format_checked_before_duplicate() {
        let malformed = "AB-12";
        let persisted: HashSet<String> = [malformed.to_string()].into_iter().collect();
        let content = format!("{}\n{}", line(malformed), line(malformed));
        let report = validate_batch(&content, &persisted);
        assert_eq!(
            messages(&report),
            vec![
                "Line 1: Invalid ReferenceNumber.".to_string(),
                "Line 2: Invalid ReferenceNumber.".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_failures_take_precedence_over_rule_checks() {
        // Bad reference, bad quantity and bad side: quantity is reported.
        let content = "AB-12,ten,250.50,John Doe,01/01/2024 10:00:00,ABC,Hold,Open";
        let report = validate_batch(content, &HashSet::new());
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.starts_with("Invalid Quantity:"));

        let content = "AB12,10,abc,John Doe,bad date,ABC,Buy,Open";
        let report = validate_batch(content, &HashSet::new());
        assert!(report.diagnostics[0].message.starts_with("Invalid Amount:"));
    }

    #[test]
    fn test_rule_check_order() {
        let cases = [
            ("AB12,1,1.00,,01/01/2024 10:00:00,AB,Hold,Done", "Name is required."),
            ("AB12,1,1.00,Jane,01/01/2024 10:00:00,AB,Hold,Done", "Invalid Symbol."),
            ("AB12,1,1.00,Jane,01/01/2024 10:00:00,ABC,Hold,Done", "OrderSide must be Buy or Sell."),
            ("AB12,1,1.00,Jane,01/01/2024 10:00:00,ABC,Sell,Done", "Invalid OrderStatus."),
        ];
        for (content, expected) in cases {
            let report = validate_batch(content, &HashSet::new());
            assert_eq!(report.diagnostics.len(), 1, "{}", content);
            assert_eq!(report.diagnostics[0].message, expected);
        }
    }

    #[test]
    fn test_blank_lines_never_diagnosed() {
        let content = format!("\n{}\n   \n\n{}\n", line("AB12"), line("CD34"));
        let report = validate_batch(&content, &HashSet::new());
        assert!(report.is_valid());
        assert_eq!(report.transactions.len(), 2);
    }

    #[test]
    fn test_bare_cr_separated_lines_keep_their_numbers() {
        let content = format!("{}\ra,b,c\r{}\rx,y\r", line("AB12"), line("CD34"));
        let report = validate_batch(&content, &HashSet::new());
        assert_eq!(report.transactions.len(), 2);
        assert_eq!(
            messages(&report),
            vec![
                "Line 2: Invalid column count (must be 8 columns).".to_string(),
                "Line 4: Invalid column count (must be 8 columns).".to_string(),
            ]
        );
    }

    #[test]
    fn test_rescanning_same_content_is_deterministic() {
        let content = format!("{}\nbad\n{}\n{}", line("AB12"), line("AB12"), line("X!"));
        let first = messages(&validate_batch(&content, &HashSet::new()));
        let second = messages(&validate_batch(&content, &HashSet::new()));
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_candidate_references_are_unique_and_trimmed() {
        let content = format!("{}\n {} \nshort,row\n{}", line("AB12"), line("CD34"), line("AB12"));
        assert_eq!(candidate_references(&content), vec!["AB12".to_string(), "CD34".to_string()]);
    }
}
