//! Validation and shape mapping between wire payloads and stored users.
//!
//! Payloads arrive as raw JSON values so that missing, `null`, blank, and
//! mistyped fields each get their own message.

use crate::{
    error::{Result, ServerError, ValidationErrors},
    services::{auth::MAX_PASSWORD_BYTES, AccountManager, UserExtras},
};
use accounts_core::{email, AccountError, User, UserChanges};
use serde::Serialize;
use serde_json::{Map, Value};

const MIN_PASSWORD_LENGTH: usize = 5;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_EMAIL_LENGTH: usize = 255;
const MAX_NAME_LENGTH: usize = 255;

const AUTHENTICATION_FAILED: &str = "Unable to authenticate with provided credentials";
const DUPLICATE_EMAIL: &str = "user with this email already exists.";
const INVALID_EMAIL: &str = "Enter a valid email address.";
const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_BLANK: &str = "This field may not be blank.";
const NOT_A_STRING: &str = "Not a valid string.";

/// Public view of a user: never includes the password
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRepresentation {
    pub email: String,
    pub name: String,
}

impl From<&User> for UserRepresentation {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenRepresentation {
    pub token: String,
}

/// A registration payload that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedCreate {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// A profile update that passed validation; `None` fields are left alone
#[derive(Debug, Clone, Default)]
pub struct ValidatedUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Email and password from a token request
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy)]
struct CharRules {
    required: bool,
    allow_blank: bool,
    trim: bool,
    min_length: Option<usize>,
    max_length: usize,
    /// Limit on the UTF-8 encoded length, checked after `max_length`
    max_bytes: Option<usize>,
}

const EMAIL_RULES: CharRules = CharRules {
    required: true,
    allow_blank: false,
    trim: true,
    min_length: None,
    max_length: MAX_EMAIL_LENGTH,
    max_bytes: None,
};

const PASSWORD_RULES: CharRules = CharRules {
    required: true,
    allow_blank: false,
    trim: true,
    min_length: Some(MIN_PASSWORD_LENGTH),
    max_length: MAX_PASSWORD_LENGTH,
    max_bytes: Some(MAX_PASSWORD_BYTES),
};

const NAME_RULES: CharRules = CharRules {
    required: false,
    allow_blank: true,
    trim: true,
    min_length: None,
    max_length: MAX_NAME_LENGTH,
    max_bytes: None,
};

/// Validate a registration payload `{email, password, name?}`
pub async fn validate_create(accounts: &AccountManager, data: &Value) -> Result<ValidatedCreate> {
    let data = as_object(data)?;
    let mut errors = ValidationErrors::new();

    let email = char_field(data, "email", EMAIL_RULES, false, &mut errors);
    let password = char_field(data, "password", PASSWORD_RULES, false, &mut errors);
    let name = char_field(data, "name", NAME_RULES, false, &mut errors);

    let email = match email {
        Some(email) => unique_email(accounts, email, None, &mut errors).await?,
        None => None,
    };

    match (email, password) {
        (Some(email), Some(password)) if errors.is_empty() => Ok(ValidatedCreate {
            email,
            password,
            name: name.unwrap_or_default(),
        }),
        _ => Err(ServerError::Validation(errors)),
    }
}

/// Persist a validated registration through the account manager
pub async fn create(accounts: &AccountManager, validated: ValidatedCreate) -> Result<User> {
    accounts
        .create_user(
            Some(&validated.email),
            Some(&validated.password),
            UserExtras {
                name: validated.name,
                ..Default::default()
            },
        )
        .await
        .map_err(duplicate_email_as_validation)
}

/// Validate a profile update against the current `instance`
///
/// With `partial` set only the fields present are checked; otherwise email
/// and password are required as on registration.
pub async fn validate_update(
    accounts: &AccountManager,
    instance: &User,
    data: &Value,
    partial: bool,
) -> Result<ValidatedUpdate> {
    let data = as_object(data)?;
    let mut errors = ValidationErrors::new();

    let email = char_field(data, "email", EMAIL_RULES, partial, &mut errors);
    let password = char_field(data, "password", PASSWORD_RULES, partial, &mut errors);
    let name = char_field(data, "name", NAME_RULES, partial, &mut errors);

    let email = match email {
        Some(email) => unique_email(accounts, email, Some(instance), &mut errors).await?,
        None => None,
    };

    errors.into_result()?;

    Ok(ValidatedUpdate {
        email,
        name,
        password,
    })
}

/// Apply a validated update
///
/// Name and email go through the generic update path; a new password is
/// hashed and saved on its own.
pub async fn update(
    accounts: &AccountManager,
    instance: &User,
    validated: ValidatedUpdate,
) -> Result<User> {
    let user = accounts
        .update_user(
            instance,
            UserChanges {
                email: validated.email,
                name: validated.name,
            },
        )
        .await
        .map_err(duplicate_email_as_validation)?;

    if let Some(password) = validated.password {
        accounts.set_password(&user, &password).await?;
    }

    Ok(user)
}

/// Extract credentials from a token request
///
/// Every problem maps to the same non-field error so a caller cannot tell
/// which part was wrong.
pub fn validate_credentials(data: &Value) -> Result<Credentials> {
    let field = |name: &str, trim: bool| -> Option<String> {
        let value = data.get(name)?.as_str()?;
        let value = if trim { value.trim() } else { value };
        (!value.is_empty()).then(|| value.to_string())
    };

    match (field("email", true), field("password", false)) {
        (Some(email), Some(password)) => Ok(Credentials { email, password }),
        _ => Err(authentication_failed()),
    }
}

pub fn authentication_failed() -> ServerError {
    ServerError::Validation(ValidationErrors::non_field(AUTHENTICATION_FAILED))
}

fn as_object(data: &Value) -> Result<&Map<String, Value>> {
    data.as_object().ok_or_else(|| {
        ServerError::Validation(ValidationErrors::non_field(format!(
            "Invalid data. Expected a dictionary, but got {}.",
            type_name(data)
        )))
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Read and check a string field, recording any error under its name
///
/// Returns the cleaned value only when it is present and valid.
fn char_field(
    data: &Map<String, Value>,
    field: &str,
    rules: CharRules,
    partial: bool,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let raw = match data.get(field) {
        None => {
            if rules.required && !partial {
                errors.add(field, REQUIRED);
            }
            return None;
        }
        Some(Value::Null) => {
            errors.add(field, NOT_NULL);
            return None;
        }
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => {
            errors.add(field, NOT_A_STRING);
            return None;
        }
    };

    let value = if rules.trim {
        raw.trim().to_string()
    } else {
        raw
    };

    if value.is_empty() {
        if !rules.allow_blank {
            errors.add(field, NOT_BLANK);
            return None;
        }
        return Some(value);
    }

    let length = value.chars().count();
    let mut valid = true;

    if let Some(min) = rules.min_length {
        if length < min {
            errors.add(
                field,
                format!("Ensure this field has at least {} characters.", min),
            );
            valid = false;
        }
    }

    if length > rules.max_length {
        errors.add(
            field,
            format!(
                "Ensure this field has no more than {} characters.",
                rules.max_length
            ),
        );
        valid = false;
    } else if let Some(max_bytes) = rules.max_bytes {
        if value.len() > max_bytes {
            errors.add(
                field,
                format!("Ensure this field has no more than {} bytes.", max_bytes),
            );
            valid = false;
        }
    }

    valid.then_some(value)
}

/// Check email syntax and that no other account already uses it
async fn unique_email(
    accounts: &AccountManager,
    value: String,
    instance: Option<&User>,
    errors: &mut ValidationErrors,
) -> Result<Option<String>> {
    if !email::is_valid(&value) {
        errors.add("email", INVALID_EMAIL);
        return Ok(None);
    }

    if let Some(existing) = accounts.find_by_email(&value).await? {
        if instance.map_or(true, |user| user.id != existing.id) {
            errors.add("email", DUPLICATE_EMAIL);
            return Ok(None);
        }
    }

    Ok(Some(value))
}

/// A unique-constraint race on insert/update still reads as a field error
fn duplicate_email_as_validation(err: ServerError) -> ServerError {
    match err {
        ServerError::Account(AccountError::Duplicate(_)) => {
            let mut errors = ValidationErrors::new();
            errors.add("email", DUPLICATE_EMAIL);
            ServerError::Validation(errors)
        }
        other => other,
    }
}
