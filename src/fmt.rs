use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount with thousands separators and two decimals: 1,234.56
pub fn amount(val: Decimal) -> String {
    let rounded = val
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let fixed = format!("{rounded:.2}");
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if val.is_sign_negative() && !rounded.is_zero() {
        format!("-{with_commas}.{dec_part}")
    } else {
        format!("{with_commas}.{dec_part}")
    }
}

/// Blank for a missing amount.
pub fn amount_opt(val: Option<Decimal>) -> String {
    val.map(amount).unwrap_or_default()
}

pub fn date_opt(val: Option<NaiveDate>) -> String {
    val.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_amount_formatting() {
        assert_eq!(amount(dec("1234.56")), "1,234.56");
        assert_eq!(amount(dec("-500")), "-500.00");
        assert_eq!(amount(Decimal::ZERO), "0.00");
        assert_eq!(amount(dec("1000000.99")), "1,000,000.99");
        assert_eq!(amount(dec("42.1")), "42.10");
        assert_eq!(amount(dec("0.005")), "0.01");
        assert_eq!(amount(dec("-0.001")), "0.00");
    }

    #[test]
    fn test_optional_values() {
        assert_eq!(amount_opt(None), "");
        assert_eq!(amount_opt(Some(dec("99.5"))), "99.50");
        assert_eq!(date_opt(NaiveDate::from_ymd_opt(2024, 4, 1)), "2024-04-01");
        assert_eq!(date_opt(None), "");
    }
}
