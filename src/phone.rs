//! Swedish phone number handling.
//!
//! Numbers are stored in E.164 (`+46701234567`) and shown to people in the
//! conventional Swedish display form (`070-123 45 67`, `08-123 45 67`).

const COUNTRY_CODE: &str = "46";

/// Area codes that are two digits after the trunk zero (`031`, `040`, ...).
/// Everything else outside Stockholm and the mobile ranges uses three.
const TWO_DIGIT_AREA_CODES: &[&str] = &[
    "11", "13", "16", "18", "19", "21", "23", "26", "31", "35", "36", "40", "42", "44", "46", "54",
    "60", "63", "90",
];

const MOBILE_PREFIXES: &[char] = &['0', '2', '3', '6', '9'];

/// Normalizes user input to E.164.
///
/// Accepts national (`070-123 45 67`), international (`+46 70 123 45 67`,
/// `0046701234567`) and bare country-code (`46701234567`) forms. Returns
/// `None` for anything that is not a plausible Swedish number.
pub fn normalize_swedish_number(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let has_plus = trimmed.starts_with('+');
    let digits: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.' | '/' | '+'))
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let national = if has_plus {
        digits.strip_prefix(COUNTRY_CODE)?
    } else if let Some(rest) = digits.strip_prefix("00") {
        rest.strip_prefix(COUNTRY_CODE)?
    } else if let Some(rest) = digits.strip_prefix('0') {
        rest
    } else {
        digits.strip_prefix(COUNTRY_CODE)?
    };

    // "+46 (0)70 ..." style input keeps the trunk zero after the country code
    let national = national.strip_prefix('0').unwrap_or(national);

    if !(7..=9).contains(&national.len()) || national.starts_with('0') {
        return None;
    }

    Some(format!("+{}{}", COUNTRY_CODE, national))
}

/// Formats a number for display. Input that cannot be normalized is
/// returned unchanged.
pub fn format_swedish_number(number: &str) -> String {
    let Some(e164) = normalize_swedish_number(number) else {
        return number.to_string();
    };
    let national = &e164[1 + COUNTRY_CODE.len()..];

    let (area, subscriber) = split_area_code(national);
    format!("0{}-{}", area, group_subscriber(subscriber))
}

/// Splits the national significant number (no trunk zero) into area code and
/// subscriber part.
fn split_area_code(national: &str) -> (&str, &str) {
    let mut chars = national.chars();
    let first = chars.next();
    let second = chars.next();

    match (first, second) {
        (Some('7'), Some(second)) if MOBILE_PREFIXES.contains(&second) && national.len() == 9 => {
            national.split_at(2)
        }
        (Some('8'), _) => national.split_at(1),
        _ if TWO_DIGIT_AREA_CODES.contains(&&national[..2]) => national.split_at(2),
        _ => national.split_at(3),
    }
}

fn group_subscriber(digits: &str) -> String {
    let groups: &[usize] = match digits.len() {
        5 => &[3, 2],
        6 => &[2, 2, 2],
        7 => &[3, 2, 2],
        8 => &[3, 3, 2],
        _ => return digits.to_string(),
    };

    let mut parts = Vec::with_capacity(groups.len());
    let mut offset = 0;
    for size in groups {
        parts.push(&digits[offset..offset + size]);
        offset += size;
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_common_input_forms() {
        for input in [
            "070-123 45 67",
            "0701234567",
            "+46 70 123 45 67",
            "+46701234567",
            "0046701234567",
            "46701234567",
            "+46 (0)70-123 45 67",
        ] {
            assert_eq!(
                normalize_swedish_number(input).as_deref(),
                Some("+46701234567"),
                "input {input}"
            );
        }
    }

    #[test]
    fn rejects_non_swedish_and_malformed() {
        assert_eq!(normalize_swedish_number(""), None);
        assert_eq!(normalize_swedish_number("+4915112345678"), None);
        assert_eq!(normalize_swedish_number("0047 123 45 678"), None);
        assert_eq!(normalize_swedish_number("070-123"), None);
        assert_eq!(normalize_swedish_number("070 123 45 67 89"), None);
        assert_eq!(normalize_swedish_number("070-12a 45 67"), None);
        assert_eq!(normalize_swedish_number("00701234567"), None);
    }

    #[test]
    fn formats_mobile_numbers() {
        assert_eq!(format_swedish_number("+46701234567"), "070-123 45 67");
        assert_eq!(format_swedish_number("+46739876543"), "073-987 65 43");
    }

    #[test]
    fn formats_stockholm_numbers() {
        assert_eq!(format_swedish_number("+4681234567"), "08-123 45 67");
        assert_eq!(format_swedish_number("+46812345678"), "08-123 456 78");
    }

    #[test]
    fn formats_two_and_three_digit_area_codes() {
        assert_eq!(format_swedish_number("+46311234567"), "031-123 45 67");
        assert_eq!(format_swedish_number("+4640123456"), "040-12 34 56");
        assert_eq!(format_swedish_number("+46171123456"), "0171-12 34 56");
        assert_eq!(format_swedish_number("+46980123456"), "0980-12 34 56");
    }

    #[test]
    fn unknown_input_is_returned_unchanged() {
        assert_eq!(format_swedish_number("not a number"), "not a number");
        assert_eq!(format_swedish_number("+4915112345678"), "+4915112345678");
    }

    #[test]
    fn display_form_round_trips() {
        for number in [
            "+46701234567",
            "+46769876543",
            "+4681234567",
            "+46812345678",
            "+46311234567",
            "+4631123456",
            "+4640123456",
            "+46901234567",
            "+46171123456",
            "+46980123456",
            "+4617112345",
        ] {
            let display = format_swedish_number(number);
            assert_ne!(display, number);
            assert_eq!(
                normalize_swedish_number(&display).as_deref(),
                Some(number),
                "display {display}"
            );
        }
    }
}
