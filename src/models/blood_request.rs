use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APos,
    #[serde(rename = "A-")]
    ANeg,
    #[serde(rename = "B+")]
    BPos,
    #[serde(rename = "B-")]
    BNeg,
    #[serde(rename = "O+")]
    OPos,
    #[serde(rename = "O-")]
    ONeg,
    #[serde(rename = "AB+")]
    AbPos,
    #[serde(rename = "AB-")]
    AbNeg,
}

impl BloodType {
    pub const ALL: [BloodType; 8] = [
        BloodType::APos,
        BloodType::ANeg,
        BloodType::BPos,
        BloodType::BNeg,
        BloodType::OPos,
        BloodType::ONeg,
        BloodType::AbPos,
        BloodType::AbNeg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::APos => "A+",
            BloodType::ANeg => "A-",
            BloodType::BPos => "B+",
            BloodType::BNeg => "B-",
            BloodType::OPos => "O+",
            BloodType::ONeg => "O-",
            BloodType::AbPos => "AB+",
            BloodType::AbNeg => "AB-",
        }
    }

    /// Accepts the canonical label, case-insensitively and with
    /// surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim().to_uppercase();
        Self::ALL.into_iter().find(|t| t.as_str() == wanted)
    }
}

impl std::fmt::Display for BloodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    #[default]
    Pickup,
    Delivery,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    #[default]
    Patient,
    Hospital,
}

impl RecipientType {
    pub fn name_label(&self) -> &'static str {
        match self {
            RecipientType::Patient => "Patient Name",
            RecipientType::Hospital => "Hospital Name",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Routine,
    Urgent,
    Critical,
}

impl Urgency {
    pub fn describe(&self) -> &'static str {
        match self {
            Urgency::Routine => "Routine (within 24-48 hours)",
            Urgency::Urgent => "Urgent (within 6-12 hours)",
            Urgency::Critical => "Critical (immediate)",
        }
    }
}

/// Raw field values as typed into the request form, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestFormInput {
    pub blood_type: String,
    pub units: String,
    pub delivery_type: DeliveryType,
    pub recipient_type: RecipientType,
    pub recipient_name: String,
    pub contact_number: String,
    pub urgency: Urgency,
    pub notes: String,
}

/// A request that passed validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestFormData {
    pub blood_type: BloodType,
    pub units: u32,
    pub delivery_type: DeliveryType,
    pub recipient_type: RecipientType,
    pub recipient_name: String,
    pub contact_number: String,
    pub urgency: Urgency,
    pub notes: Option<String>,
    pub bank_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    BloodType,
    Units,
    RecipientName,
    ContactNumber,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::BloodType => "bloodType",
            FormField::Units => "units",
            FormField::RecipientName => "recipientName",
            FormField::ContactNumber => "contactNumber",
        }
    }
}
