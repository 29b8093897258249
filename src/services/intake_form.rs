use crate::errors::FormErrors;
use crate::models::{BloodType, FormField, RequestFormData, RequestFormInput};

/// Working state of the blood-request form. Dropped when the form is
/// submitted, cancelled or replaced by another sub-flow.
#[derive(Debug, Clone, Default)]
pub struct IntakeForm {
    pub input: RequestFormInput,
    /// Bank whose "request" button opened the form, if any.
    pub bank_id: Option<String>,
    errors: FormErrors,
}

impl IntakeForm {
    pub fn new(bank_id: Option<String>) -> Self {
        Self {
            bank_id,
            ..Self::default()
        }
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    /// Validates the current input. Errors are kept on the form until the
    /// next attempt; `on_submit` only runs when there are none.
    pub fn submit<F, R>(&mut self, on_submit: F) -> Result<R, FormErrors>
    where
        F: FnOnce(RequestFormData) -> R,
    {
        match validate(&self.input, self.bank_id.clone()) {
            Ok(data) => {
                self.errors = FormErrors::default();
                Ok(on_submit(data))
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }
}

pub fn validate(
    input: &RequestFormInput,
    bank_id: Option<String>,
) -> Result<RequestFormData, FormErrors> {
    let mut errors = FormErrors::default();

    let blood_type = if input.blood_type.trim().is_empty() {
        errors.insert(FormField::BloodType, "Blood type is required");
        None
    } else {
        let parsed = BloodType::parse(&input.blood_type);
        if parsed.is_none() {
            errors.insert(FormField::BloodType, "Unknown blood type");
        }
        parsed
    };

    let units = match input.units.trim().parse::<u32>() {
        Ok(n) if n >= 1 => Some(n),
        _ => {
            errors.insert(FormField::Units, "Valid number of units is required");
            None
        }
    };

    let recipient_name = input.recipient_name.trim();
    if recipient_name.is_empty() {
        errors.insert(FormField::RecipientName, "Recipient name is required");
    }

    let contact_number = input.contact_number.trim();
    if contact_number.is_empty() {
        errors.insert(FormField::ContactNumber, "Contact number is required");
    } else if !is_phone_number(&input.contact_number) {
        errors.insert(FormField::ContactNumber, "Invalid phone number format");
    }

    match (blood_type, units) {
        (Some(blood_type), Some(units)) if errors.is_empty() => Ok(RequestFormData {
            blood_type,
            units,
            delivery_type: input.delivery_type,
            recipient_type: input.recipient_type,
            recipient_name: recipient_name.to_string(),
            contact_number: contact_number.to_string(),
            urgency: input.urgency,
            notes: Some(input.notes.trim())
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            bank_id,
        }),
        _ => Err(errors),
    }
}

/// Digits, spaces, `+`, `-` and parentheses only.
fn is_phone_number(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
}
