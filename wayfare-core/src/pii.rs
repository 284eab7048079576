/// Masking helpers for traveler contact details so log lines never carry
/// raw PII.

pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first = local.chars().next().unwrap_or('*');
            format!("{}***@{}", first, domain)
        }
        _ => "***".to_string(),
    }
}

pub fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return "***".to_string();
    }
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("***{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email_keeps_first_char_and_domain() {
        assert_eq!(mask_email("john@x.com"), "j***@x.com");
    }

    #[test]
    fn test_mask_email_degenerate_input() {
        assert_eq!(mask_email("not-an-email"), "***");
        assert_eq!(mask_email("@x.com"), "***");
    }

    #[test]
    fn test_mask_phone_keeps_last_four_digits() {
        assert_eq!(mask_phone("555-0100"), "***0100");
        assert_eq!(mask_phone("+1 (555) 867-5309"), "***5309");
    }

    #[test]
    fn test_mask_phone_too_short() {
        assert_eq!(mask_phone("12"), "***");
    }
}
