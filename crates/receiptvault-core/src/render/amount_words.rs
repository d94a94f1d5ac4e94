//! Indian-English amount formatting (lakh/crore grouping)

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::model::money;

const ONES: [&str; 20] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Eleven",
    "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen", "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

/// 0..=999
fn below_thousand(n: u64) -> String {
    match n {
        0 => String::new(),
        1..=19 => ONES[n as usize].to_string(),
        20..=99 => {
            let tens = TENS[(n / 10) as usize];
            match n % 10 {
                0 => tens.to_string(),
                ones => format!("{} {}", tens, ONES[ones as usize]),
            }
        }
        _ => {
            let head = format!("{} Hundred", ONES[(n / 100) as usize]);
            match n % 100 {
                0 => head,
                rest => format!("{} {}", head, below_thousand(rest)),
            }
        }
    }
}

/// Whole number in words, "Zero" for 0
pub fn integer_in_words(n: u64) -> String {
    if n == 0 {
        return "Zero".to_string();
    }

    let mut parts = Vec::new();
    let crores = n / 10_000_000;
    if crores > 0 {
        parts.push(format!("{} Crore", integer_in_words(crores)));
    }
    let lakhs = (n / 100_000) % 100;
    if lakhs > 0 {
        parts.push(format!("{} Lakh", below_thousand(lakhs)));
    }
    let thousands = (n / 1_000) % 100;
    if thousands > 0 {
        parts.push(format!("{} Thousand", below_thousand(thousands)));
    }
    let rest = n % 1_000;
    if rest > 0 {
        parts.push(below_thousand(rest));
    }
    parts.join(" ")
}

/// "One Lakh Twenty Three Thousand Four Hundred Fifty Six Only";
/// paise are spelled out when non-zero. `None` past `u64::MAX` rupees.
pub fn amount_in_words(amount: Decimal) -> Option<String> {
    let amount = money::normalize(amount.abs());
    let rupees = amount.trunc().to_u64()?;
    let paise = ((amount - amount.trunc()) * Decimal::ONE_HUNDRED).to_u64()?;

    let words = integer_in_words(rupees);
    if paise == 0 {
        Some(format!("{} Only", words))
    } else {
        Some(format!("{} and {} Paise Only", words, below_thousand(paise)))
    }
}

/// `₹ 1,23,456.50`
pub fn format_inr(amount: Decimal) -> String {
    let text = money::normalize(amount).to_string();
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let digits: Vec<char> = whole.chars().collect();
    let mut grouped = String::new();
    if digits.len() > 3 {
        let (head, tail) = digits.split_at(digits.len() - 3);
        for (i, c) in head.iter().enumerate() {
            if i > 0 && (head.len() - i) % 2 == 0 {
                grouped.push(',');
            }
            grouped.push(*c);
        }
        grouped.push(',');
        grouped.extend(tail);
    } else {
        grouped.extend(digits);
    }
    format!("₹ {}{}.{}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_indian_grouping_words() {
        assert_eq!(integer_in_words(20_000), "Twenty Thousand");
        assert_eq!(
            integer_in_words(123_456),
            "One Lakh Twenty Three Thousand Four Hundred Fifty Six"
        );
        assert_eq!(integer_in_words(1_000_000), "Ten Lakh");
        assert_eq!(integer_in_words(10_000_000), "One Crore");
        assert_eq!(integer_in_words(1_250_000_000), "One Hundred Twenty Five Crore");
    }

    #[test]
    fn test_amount_with_and_without_paise() {
        assert_eq!(amount_in_words(dec("0")).unwrap(), "Zero Only");
        assert_eq!(
            amount_in_words(dec("1500.00")).unwrap(),
            "One Thousand Five Hundred Only"
        );
        assert_eq!(
            amount_in_words(dec("1234.50")).unwrap(),
            "One Thousand Two Hundred Thirty Four and Fifty Paise Only"
        );
    }

    #[test]
    fn test_amount_beyond_u64_has_no_words() {
        assert_eq!(amount_in_words(dec("30000000000000000000000000000")), None);
        assert!(amount_in_words(money::max_amount() * Decimal::from(5)).is_some());
    }

    #[test]
    fn test_format_inr_groups() {
        assert_eq!(format_inr(dec("123456.5")), "₹ 1,23,456.50");
        assert_eq!(format_inr(dec("999")), "₹ 999.00");
        assert_eq!(format_inr(dec("12345678")), "₹ 1,23,45,678.00");
    }
}
