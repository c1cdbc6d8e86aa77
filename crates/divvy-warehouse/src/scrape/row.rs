use super::month;
use crate::error::MalformedRow;
use crate::model::Dividend;
use chrono::NaiveDate;
use tracing::trace;

/// Trailing token marking a cash-dividend row; splits and other events lack it.
pub const DIVIDEND_MARKER: &str = "Dividend";

/// Read one flattened table row.
///
/// - `Ok(None)`: not a dividend row (a price line, a stock split, ...); skip it.
/// - `Ok(Some(_))`: a dividend.
/// - `Err(_)`: claims to be a dividend but cannot be read; the caller must
///   abandon the whole page.
///
/// A dividend row is exactly `<month> <day>, <year> <amount> Dividend`.
pub fn parse(row: &str) -> Result<Option<Dividend>, MalformedRow> {
    let row = row.trim();
    let Some(body) = row.strip_suffix(DIVIDEND_MARKER) else {
        trace!("skipping non-dividend row: {row:?}");
        return Ok(None);
    };

    let fields: Vec<&str> = body.split_whitespace().collect();
    let [month_token, day, year, amount] = fields.as_slice() else {
        return Err(MalformedRow::new(
            row,
            format!("expected 4 fields before the marker, found {}", fields.len()),
        ));
    };

    let month = month::resolve(month_token)
        .ok_or_else(|| MalformedRow::new(row, format!("unknown month {month_token:?}")))?;
    let day: u32 = day
        .replace(',', "")
        .parse()
        .map_err(|_| MalformedRow::new(row, format!("day {day:?} is not an integer")))?;
    let year: i32 = year
        .parse()
        .map_err(|_| MalformedRow::new(row, format!("year {year:?} is not an integer")))?;
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| MalformedRow::new(row, format!("{year}-{month:02}-{day:02} is not a date")))?;

    if !amount.replace(',', "").parse::<f64>().is_ok_and(f64::is_finite) {
        return Err(MalformedRow::new(row, format!("amount {amount:?} is not numeric")));
    }

    Ok(Some(Dividend {
        date,
        amount: amount.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dividend_row_is_parsed() {
        let dividend = parse("Jan 15, 2021 0.42 Dividend").unwrap().unwrap();
        assert_eq!(dividend.date, NaiveDate::from_ymd_opt(2021, 1, 15).unwrap());
        assert_eq!(dividend.amount, "0.42");
    }

    #[test]
    fn amount_text_is_kept_verbatim() {
        let dividend = parse("  Nov 8, 2019 0.7700 Dividend ").unwrap().unwrap();
        assert_eq!(dividend.date, NaiveDate::from_ymd_opt(2019, 11, 8).unwrap());
        assert_eq!(dividend.amount, "0.7700");
    }

    #[test]
    fn other_rows_are_skipped() {
        assert_eq!(parse("Jan 15, 2021 0.42 Stock Split"), Ok(None));
        assert_eq!(parse("Aug 31, 2020 4:1 Stock Splits"), Ok(None));
        assert_eq!(parse("Jan 15, 2021 130.1 131.2 129.9 130.5 130.5 1,000,000"), Ok(None));
        assert_eq!(parse(""), Ok(None));
    }

    #[test]
    fn unknown_month_is_malformed() {
        let err = parse("Foo 15, 2021 0.42 Dividend").unwrap_err();
        assert_eq!(err.row, "Foo 15, 2021 0.42 Dividend");
        assert!(err.reason.contains("Foo"));
    }

    #[test]
    fn non_integer_day_or_year_is_malformed() {
        assert!(parse("Jan 1x, 2021 0.42 Dividend").is_err());
        assert!(parse("Jan 15, 20x1 0.42 Dividend").is_err());
    }

    #[test]
    fn impossible_date_is_malformed() {
        assert!(parse("Feb 30, 2021 0.42 Dividend").is_err());
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        assert!(parse("Jan 15, 2021 Dividend").is_err());
        assert!(parse("Dividend").is_err());
        assert!(parse("Jan 15, 2021 0.42 extra Dividend").is_err());
    }

    #[test]
    fn non_numeric_amount_is_malformed() {
        assert!(parse("Jan 15, 2021 n/a Dividend").is_err());
    }

    #[test]
    fn non_finite_amount_is_malformed() {
        for amount in ["NaN", "inf", "-inf", "infinity", "Infinity"] {
            let row = format!("Jan 15, 2021 {amount} Dividend");
            assert!(parse(&row).is_err(), "{row}");
        }
        assert!(parse("Jan 15, 2021 1,000.5 Dividend").unwrap().is_some());
    }
}
