//! Input contracts for every operation.
//!
//! Raw input arrives as untyped JSON. [`parse`] turns it into one of the
//! typed shapes in [`crate::api`] or rejects it; no operation performs any
//! I/O before its input has passed through here.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::api::{ContactInput, EmailInput, EmailTokenInput, RegisterInput, TokenInput};

const EMAIL_MAX_LEN: usize = 254;
const TOKEN_MAX_LEN: usize = 256;
const NAME_MAX_LEN: usize = 100;
const MESSAGE_MAX_LEN: usize = 5000;
const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_MAX_LEN: usize = 128;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("malformed input: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("invalid {field}: {reason}")]
    Field {
        field: &'static str,
        reason: &'static str,
    },
}

impl ValidationError {
    fn field(field: &'static str, reason: &'static str) -> Self {
        Self::Field { field, reason }
    }
}

/// A shape that can check (and normalize) its own fields once deserialized.
pub trait Validate: DeserializeOwned {
    fn validate(self) -> Result<Self, ValidationError>;
}

/// Deserialize `raw` into `T` and apply its field rules.
pub fn parse<T: Validate>(raw: Value) -> Result<T, ValidationError> {
    let input: T = serde_json::from_value(raw)?;
    input.validate()
}

impl Validate for EmailInput {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            email: normalize_email(&self.email)?,
        })
    }
}

impl Validate for EmailTokenInput {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            email: normalize_email(&self.email)?,
            token: check_token(self.token)?,
        })
    }
}

impl Validate for TokenInput {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            token: check_token(self.token)?,
        })
    }
}

impl Validate for ContactInput {
    fn validate(self) -> Result<Self, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::field("name", "must not be empty"));
        }
        if name.chars().count() > NAME_MAX_LEN {
            return Err(ValidationError::field("name", "too long"));
        }

        let message = self.message.trim();
        if message.is_empty() {
            return Err(ValidationError::field("message", "must not be empty"));
        }
        if message.chars().count() > MESSAGE_MAX_LEN {
            return Err(ValidationError::field("message", "too long"));
        }

        Ok(Self {
            name: name.to_string(),
            email: normalize_email(&self.email)?,
            message: message.to_string(),
        })
    }
}

impl Validate for RegisterInput {
    fn validate(self) -> Result<Self, ValidationError> {
        let len = self.password.chars().count();
        if len < PASSWORD_MIN_LEN {
            return Err(ValidationError::field("password", "too short"));
        }
        if len > PASSWORD_MAX_LEN {
            return Err(ValidationError::field("password", "too long"));
        }

        Ok(Self {
            email: normalize_email(&self.email)?,
            password: self.password,
        })
    }
}

/// Trim and lowercase an address, rejecting anything that is not
/// plausibly `local@domain.tld`.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();

    if email.len() < 3 || email.len() > EMAIL_MAX_LEN {
        return Err(ValidationError::field("email", "bad length"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::field("email", "contains whitespace"));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::field("email", "missing @"));
    };
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::field("email", "malformed local part"));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::field("email", "malformed domain"));
    }

    Ok(email)
}

fn check_token(token: String) -> Result<String, ValidationError> {
    if token.is_empty() || token.len() > TOKEN_MAX_LEN {
        return Err(ValidationError::field("token", "bad length"));
    }
    let url_safe = token
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if !url_safe {
        return Err(ValidationError::field("token", "not base64url"));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_is_normalized() {
        let input: EmailInput = parse(json!({ "email": "  A@X.com " })).unwrap();
        assert_eq!(input.email, "a@x.com");
    }

    #[test]
    fn rejects_bad_emails() {
        for bad in ["", "ax.com", "@x.com", "a@x", "a@.com", "a@x.", "a b@x.com", "a@b@x.com"] {
            let result = parse::<EmailInput>(json!({ "email": bad }));
            assert!(result.is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rejects_wrong_shapes() {
        assert!(parse::<EmailInput>(json!({})).is_err());
        assert!(parse::<EmailInput>(json!({ "email": 42 })).is_err());
        assert!(parse::<EmailInput>(json!("a@x.com")).is_err());
        assert!(parse::<EmailInput>(json!({ "email": "a@x.com", "extra": true })).is_err());
        assert!(parse::<TokenInput>(Value::Null).is_err());
    }

    #[test]
    fn token_must_be_url_safe() {
        assert!(parse::<TokenInput>(json!({ "token": "abc_DEF-123" })).is_ok());
        assert!(parse::<TokenInput>(json!({ "token": "" })).is_err());
        assert!(parse::<TokenInput>(json!({ "token": "abc+/=" })).is_err());
        assert!(parse::<TokenInput>(json!({ "token": "a".repeat(257) })).is_err());
    }

    #[test]
    fn email_token_checks_both_fields() {
        let ok = parse::<EmailTokenInput>(json!({ "email": "a@x.com", "token": "t0k" })).unwrap();
        assert_eq!(ok.token, "t0k");
        assert!(parse::<EmailTokenInput>(json!({ "email": "a@x.com", "token": "t k" })).is_err());
        assert!(parse::<EmailTokenInput>(json!({ "email": "nope", "token": "tok" })).is_err());
    }

    #[test]
    fn contact_fields_are_trimmed_and_bounded() {
        let input: ContactInput = parse(json!({
            "name": "  Ada ",
            "email": "ada@example.org",
            "message": " hello \n",
        }))
        .unwrap();
        assert_eq!(input.name, "Ada");
        assert_eq!(input.message, "hello");

        assert!(parse::<ContactInput>(json!({ "name": " ", "email": "a@x.com", "message": "hi" })).is_err());
        assert!(parse::<ContactInput>(json!({ "name": "A", "email": "a@x.com", "message": "" })).is_err());
        assert!(
            parse::<ContactInput>(json!({ "name": "A", "email": "a@x.com", "message": "m".repeat(5001) }))
                .is_err()
        );
    }

    #[test]
    fn register_password_bounds() {
        assert!(parse::<RegisterInput>(json!({ "email": "a@x.com", "password": "short" })).is_err());
        assert!(parse::<RegisterInput>(json!({ "email": "a@x.com", "password": "p".repeat(129) })).is_err());
        assert!(parse::<RegisterInput>(json!({ "email": "a@x.com", "password": "long enough" })).is_ok());
    }

    #[test]
    fn field_errors_name_the_field() {
        let err = parse::<TokenInput>(json!({ "token": "" })).unwrap_err();
        assert_eq!(err.to_string(), "invalid token: bad length");
    }
}
