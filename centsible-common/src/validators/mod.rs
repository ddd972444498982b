#[derive(Debug)]
pub enum Validity {
    Valid,
    Invalid(String),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        match &self {
            Validity::Valid => true,
            Validity::Invalid(_) => false,
        }
    }
}

pub fn validate_email_address(email: &str) -> Validity {
    if email.chars().count() > 320 {
        return Validity::Invalid(String::from("Email address is too long."));
    }

    for c in email.chars() {
        if c == ' ' || !c.is_ascii() {
            return Validity::Invalid(String::from(
                "Email address cannot contain a space or non-ASCII characters.",
            ));
        }
    }

    if email.contains("@.") {
        return Validity::Invalid(String::from(
            "Domain name in email address cannot begin with a period.",
        ));
    }

    let email = match email.split_once('@') {
        Some(s) => s,
        None => {
            return Validity::Invalid(String::from("Email address must contain an at symbol (@)."))
        }
    };

    if email.0.is_empty() || email.1.len() < 3 {
        return Validity::Invalid(String::from("Email username or domain name is too short."));
    }

    if email.1.contains('@') || !email.1.contains('.') {
        return Validity::Invalid(String::from(
            "Email address must have only one at symbol (@) and the domain must contain a period.",
        ));
    }

    if email.1.ends_with('.') {
        return Validity::Invalid(String::from("Email address cannot end with a period."));
    }

    Validity::Valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_address_accepts_common_forms() {
        assert!(validate_email_address("test@example.com").is_valid());
        assert!(validate_email_address("test.me@example.com").is_valid());
        assert!(validate_email_address("email@example.co.jp").is_valid());
        assert!(validate_email_address("firstname+lastname@example.com").is_valid());
        assert!(validate_email_address("1234567890@example.co.uk").is_valid());
        assert!(validate_email_address("email@example-one.com").is_valid());
    }

    #[test]
    fn test_validate_email_address_rejects_malformed_addresses() {
        assert!(!validate_email_address("plainaddress").is_valid());
        assert!(!validate_email_address("@example.com").is_valid());
        assert!(!validate_email_address("email@example").is_valid());
        assert!(!validate_email_address("email@example.com.").is_valid());
        assert!(!validate_email_address("email@.example.com").is_valid());
        assert!(!validate_email_address("em ail@example.com").is_valid());
        assert!(!validate_email_address("email@exam@ple.com").is_valid());
    }

    #[test]
    fn test_validate_email_address_rejects_overlong_addresses() {
        let overlong = format!("{}@example.com", "a".repeat(320));
        assert!(!validate_email_address(&overlong).is_valid());
    }
}
