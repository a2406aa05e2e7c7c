//! Request payload parsing.
//!
//! Payloads arrive as raw JSON objects. [`FieldReader`] coerces each field to
//! its type and reports missing or mistyped values; the payload structs then
//! declare their length, blank and precision rules with `validator`. Every
//! problem is reported at once, keyed by field name.

pub mod catalog;
pub mod installation;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use validator::{Validate, ValidationError, ValidationErrors};

/// Messages per field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const REQUIRED: &str = "This field is required.";
pub const NOT_NULL: &str = "This field may not be null.";
pub const NOT_BLANK: &str = "This field may not be blank.";
pub const INVALID_STRING: &str = "Not a valid string.";
pub const INVALID_INTEGER: &str = "A valid integer is required.";
pub const INVALID_NUMBER: &str = "A valid number is required.";
pub const INVALID_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";

pub const MAX_DIGITS: u32 = 10;
pub const DECIMAL_PLACES: u32 = 2;

/// Appends `message` to the list kept for `field`.
pub fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

pub fn missing_pk(id: i32) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

pub fn missing_slug(field: &str, value: &str) -> String {
    format!("Object with {}={} does not exist.", field, value)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Reads typed fields out of a JSON object, collecting per-field errors.
///
/// Accessors always return a value; when a field is invalid the error is
/// recorded and a placeholder is returned. Call [`FieldReader::finish`] to
/// turn the collected errors into a result.
pub struct FieldReader<'a> {
    data: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> FieldReader<'a> {
    pub fn new(value: &'a Value) -> Result<Self, FieldErrors> {
        match value {
            Value::Object(data) => Ok(Self {
                data,
                errors: FieldErrors::new(),
            }),
            Value::Null => {
                let mut errors = FieldErrors::new();
                push_error(&mut errors, "non_field_errors", "No data provided");
                Err(errors)
            }
            other => {
                let mut errors = FieldErrors::new();
                push_error(
                    &mut errors,
                    "non_field_errors",
                    format!(
                        "Invalid data. Expected a dictionary, but got {}.",
                        json_type_name(other)
                    ),
                );
                Err(errors)
            }
        }
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        push_error(&mut self.errors, field, message);
    }

    /// Present and non-null value of `field`, recording required/null errors.
    fn required(&mut self, field: &str) -> Option<&'a Value> {
        match self.data.get(field) {
            None => {
                self.error(field, REQUIRED);
                None
            }
            Some(Value::Null) => {
                self.error(field, NOT_NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    fn optional(&self, field: &str) -> Option<&'a Value> {
        match self.data.get(field) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    fn text(&mut self, field: &str, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => {
                self.error(field, INVALID_STRING);
                None
            }
        }
    }

    /// Required string, trimmed.
    pub fn string(&mut self, field: &str) -> String {
        let Some(value) = self.required(field) else {
            return String::new();
        };
        self.text(field, value).unwrap_or_default()
    }

    /// Nullable string; blank values are kept as given.
    pub fn optional_string(&mut self, field: &str) -> Option<String> {
        let value = self.optional(field)?;
        self.text(field, value)
    }

    fn parse_integer(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => {
                let trimmed = s.trim();
                let trimmed = match trimmed.split_once('.') {
                    Some((whole, zeros)) if zeros.chars().all(|c| c == '0') => whole,
                    _ => trimmed,
                };
                trimmed.parse::<i64>().ok()
            }
            _ => None,
        }
    }

    /// Required integer; numeric strings are accepted.
    pub fn integer(&mut self, field: &str) -> i32 {
        let Some(value) = self.required(field) else {
            return 0;
        };
        match Self::parse_integer(value).and_then(|n| i32::try_from(n).ok()) {
            Some(n) => n,
            None => {
                self.error(field, INVALID_INTEGER);
                0
            }
        }
    }

    /// Required reference to another row by integer primary key.
    pub fn pk(&mut self, field: &str) -> i32 {
        let Some(value) = self.required(field) else {
            return 0;
        };
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match parsed.and_then(|n| i32::try_from(n).ok()) {
            Some(n) => n,
            None => {
                self.error(
                    field,
                    format!(
                        "Incorrect type. Expected pk value, received {}.",
                        json_type_name(value)
                    ),
                );
                0
            }
        }
    }

    fn number(&mut self, field: &str, value: &Value) -> Option<Decimal> {
        let raw = match value {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().to_string(),
            _ => {
                self.error(field, INVALID_NUMBER);
                return None;
            }
        };
        match Decimal::from_str(&raw).or_else(|_| Decimal::from_scientific(&raw)) {
            Ok(number) => Some(number),
            Err(_) => {
                self.error(field, INVALID_NUMBER);
                None
            }
        }
    }

    /// Required decimal.
    pub fn decimal(&mut self, field: &str) -> Decimal {
        let Some(value) = self.required(field) else {
            return Decimal::ZERO;
        };
        self.number(field, value).unwrap_or(Decimal::ZERO)
    }

    /// Nullable decimal; an empty string reads as null.
    pub fn optional_decimal(&mut self, field: &str) -> Option<Decimal> {
        match self.optional(field)? {
            Value::String(s) if s.trim().is_empty() => None,
            value => self.number(field, value),
        }
    }

    /// Required `YYYY-MM-DD` date.
    pub fn date(&mut self, field: &str) -> NaiveDate {
        let Some(value) = self.required(field) else {
            return NaiveDate::default();
        };
        match value.as_str().and_then(parse_date) {
            Some(date) => date,
            None => {
                self.error(field, INVALID_DATE);
                NaiveDate::default()
            }
        }
    }

    /// Runs the payload's declared rules and returns it when neither the
    /// reader nor the rules found a problem.
    ///
    /// Fields the reader already rejected keep only the reader's messages,
    /// since their value is a placeholder.
    pub fn finish<T: Validate>(mut self, value: T) -> Result<T, FieldErrors> {
        if let Err(rules) = value.validate() {
            for (field, messages) in validation_messages(&rules) {
                if !self.errors.contains_key(&field) {
                    self.errors.insert(field, messages);
                }
            }
        }

        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

/// Flattens `validator` errors into per-field messages.
pub fn validation_messages(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({}).", e.code),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

fn rule_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Rejects empty (already trimmed) strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(rule_error("blank", NOT_BLANK.to_string()))
    } else {
        Ok(())
    }
}

/// Digit limits of `decimal(10, 2)` columns.
pub fn decimal_10_2(value: &Decimal) -> Result<(), ValidationError> {
    check_precision(value).map_err(|message| rule_error("decimal", message))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Digit limits for `decimal(10, 2)` columns.
pub fn check_precision(value: &Decimal) -> Result<(), String> {
    let digits = value.mantissa().unsigned_abs().to_string().len() as u32;
    let decimal_places = value.scale();
    let total_digits = digits.max(decimal_places);
    let whole_digits = total_digits - decimal_places;

    if total_digits > MAX_DIGITS {
        return Err(format!(
            "Ensure that there are no more than {} digits in total.",
            MAX_DIGITS
        ));
    }
    if decimal_places > DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {} decimal places.",
            DECIMAL_PLACES
        ));
    }
    if whole_digits > MAX_DIGITS - DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            MAX_DIGITS - DECIMAL_PLACES
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    /// Wraps reader output so `finish` has something to validate.
    #[derive(Debug, PartialEq)]
    struct Unchecked<T>(T);

    impl<T> Validate for Unchecked<T> {
        fn validate(&self) -> Result<(), ValidationErrors> {
            Ok(())
        }
    }

    fn read<T>(value: Value, f: impl FnOnce(&mut FieldReader<'_>) -> T) -> Result<T, FieldErrors> {
        let mut reader = FieldReader::new(&value)?;
        let out = f(&mut reader);
        reader.finish(Unchecked(out)).map(|Unchecked(out)| out)
    }

    #[derive(Debug, Validate)]
    struct Sample {
        #[validate(
            length(max = 5, message = "Ensure this field has no more than 5 characters."),
            custom = "not_blank"
        )]
        name: String,
        #[validate(custom = "decimal_10_2")]
        amount: Decimal,
        #[validate(custom = "decimal_10_2")]
        extra: Option<Decimal>,
    }

    fn sample(value: Value) -> Result<Sample, FieldErrors> {
        let mut r = FieldReader::new(&value)?;
        let sample = Sample {
            name: r.string("name"),
            amount: r.decimal("amount"),
            extra: r.optional_decimal("extra"),
        };
        r.finish(sample)
    }

    #[test]
    fn strings_are_trimmed_and_numbers_accepted() {
        let out = read(json!({"a": "  hola ", "b": 42}), |r| {
            (r.string("a"), r.string("b"))
        })
        .unwrap();
        assert_eq!(out, ("hola".to_string(), "42".to_string()));
    }

    #[test]
    fn missing_null_and_blank_are_reported_separately() {
        let errors = read(json!({"b": null}), |r| {
            r.string("a");
            r.string("b");
        })
        .unwrap_err();
        assert_eq!(errors["a"], vec![REQUIRED]);
        assert_eq!(errors["b"], vec![NOT_NULL]);

        let errors = sample(json!({"name": "   ", "amount": 1})).unwrap_err();
        assert_eq!(errors["name"], vec![NOT_BLANK]);
    }

    #[test]
    fn max_length_counts_characters() {
        let errors = sample(json!({"name": "ñañaña", "amount": 1})).unwrap_err();
        assert_eq!(
            errors["name"],
            vec!["Ensure this field has no more than 5 characters."]
        );
        assert!(sample(json!({"name": "ñaña", "amount": 1})).is_ok());
    }

    #[test]
    fn reader_errors_win_over_rule_errors() {
        // A missing string is read as "" but only reports the missing field
        let errors = sample(json!({"amount": "1.234"})).unwrap_err();
        assert_eq!(errors["name"], vec![REQUIRED]);
        assert_eq!(
            errors["amount"],
            vec!["Ensure that there are no more than 2 decimal places."]
        );
    }

    #[test]
    fn optional_fields_accept_null_and_absence() {
        let out = read(json!({"a": null, "d": ""}), |r| {
            (
                r.optional_string("a"),
                r.optional_string("b"),
                r.optional_decimal("c"),
                r.optional_decimal("d"),
            )
        })
        .unwrap();
        assert_eq!(out, (None, None, None, None));
    }

    #[test]
    fn integers_accept_numeric_strings() {
        let out = read(json!({"a": "7", "b": 3, "c": "4.00"}), |r| {
            (r.integer("a"), r.integer("b"), r.integer("c"))
        })
        .unwrap();
        assert_eq!(out, (7, 3, 4));

        let errors = read(json!({"a": "siete", "b": 1.5}), |r| {
            r.integer("a");
            r.integer("b");
        })
        .unwrap_err();
        assert_eq!(errors["a"], vec![INVALID_INTEGER]);
        assert_eq!(errors["b"], vec![INVALID_INTEGER]);
    }

    #[test]
    fn pk_rejects_non_numeric_values() {
        let errors = read(json!({"id_tecnico": "abc"}), |r| r.pk("id_tecnico")).unwrap_err();
        assert_eq!(
            errors["id_tecnico"],
            vec!["Incorrect type. Expected pk value, received str."]
        );
    }

    #[test]
    fn decimals_accept_numbers_and_strings() {
        let out = read(json!({"a": 12.5, "b": "30000", "c": " 1.25 "}), |r| {
            (r.decimal("a"), r.decimal("b"), r.decimal("c"))
        })
        .unwrap();
        assert_eq!(out, (dec!(12.50), dec!(30000.00), dec!(1.25)));

        let errors = read(json!({"d": "x"}), |r| r.decimal("d")).unwrap_err();
        assert_eq!(errors["d"], vec![INVALID_NUMBER]);
    }

    #[test]
    fn decimals_enforce_digit_limits() {
        let message = |raw: &str| {
            let value = Decimal::from_str(raw).unwrap();
            decimal_10_2(&value).unwrap_err().message.unwrap().to_string()
        };
        assert_eq!(
            message("1.234"),
            "Ensure that there are no more than 2 decimal places."
        );
        assert_eq!(
            message("123456789"),
            "Ensure that there are no more than 8 digits before the decimal point."
        );
        assert_eq!(
            message("12345678901"),
            "Ensure that there are no more than 10 digits in total."
        );
        assert!(decimal_10_2(&dec!(12345678.99)).is_ok());
    }

    #[test]
    fn optional_decimals_are_checked_when_present() {
        let errors = sample(json!({"name": "a", "amount": 1, "extra": "0.001"})).unwrap_err();
        assert_eq!(
            errors["extra"],
            vec!["Ensure that there are no more than 2 decimal places."]
        );
        assert!(sample(json!({"name": "a", "amount": 1, "extra": null})).is_ok());
    }

    #[test]
    fn dates_must_be_iso() {
        let date = read(json!({"f": "2024-03-05"}), |r| r.date("f")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());

        let errors = read(json!({"f": "05/03/2024"}), |r| r.date("f")).unwrap_err();
        assert_eq!(errors["f"], vec![INVALID_DATE]);
    }

    #[test]
    fn non_objects_are_rejected() {
        let errors = FieldReader::new(&json!([1, 2])).err().unwrap();
        assert_eq!(
            errors["non_field_errors"],
            vec!["Invalid data. Expected a dictionary, but got list."]
        );
    }
}
