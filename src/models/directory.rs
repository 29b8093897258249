use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::BloodType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BloodBank {
    pub id: String,
    pub name: String,
    pub address: String,
    pub area: String,
    pub district: String,
    pub lat: f64,
    pub lng: f64,
    pub phone: String,
    pub availability: BTreeMap<BloodType, u32>,
    pub hours: String,
    /// Distance from the user in kilometres.
    pub distance: f64,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StockLevel {
    High,
    Medium,
    Low,
}

impl StockLevel {
    pub fn for_units(units: u32) -> Self {
        if units >= 40 {
            StockLevel::High
        } else if units >= 15 {
            StockLevel::Medium
        } else {
            StockLevel::Low
        }
    }
}

impl BloodBank {
    pub fn units_of(&self, blood_type: BloodType) -> u32 {
        self.availability.get(&blood_type).copied().unwrap_or(0)
    }

    pub fn available_types(&self) -> Vec<BloodType> {
        self.availability
            .iter()
            .filter(|(_, units)| **units > 0)
            .map(|(t, _)| *t)
            .collect()
    }

    pub fn availability_summary(&self) -> String {
        format!("{} types available", self.available_types().len())
    }

    pub fn distance_label(&self) -> String {
        format!("{:.1} km", self.distance)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DonationDrive {
    pub id: String,
    pub title: String,
    pub organizer: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub lat: f64,
    pub lng: f64,
    pub slots_available: u32,
    pub total_slots: u32,
    pub urgent_needs: Vec<BloodType>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Many,
    Limited,
    Few,
}

impl SlotStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SlotStatus::Many => "Many slots available",
            SlotStatus::Limited => "Limited slots",
            SlotStatus::Few => "Few slots left",
        }
    }
}

impl DonationDrive {
    pub fn slot_status(&self) -> SlotStatus {
        if self.total_slots == 0 {
            return SlotStatus::Few;
        }
        let percentage = f64::from(self.slots_available) * 100.0 / f64::from(self.total_slots);
        if percentage > 50.0 {
            SlotStatus::Many
        } else if percentage > 20.0 {
            SlotStatus::Limited
        } else {
            SlotStatus::Few
        }
    }
}

/// A bank able to serve urgent requests right now.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyListing {
    pub id: String,
    pub name: String,
    pub address: String,
    pub distance: String,
    pub phone: String,
    pub hours: String,
    pub available_types: Vec<BloodType>,
    pub total_units: u32,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hotline {
    pub number: String,
    pub label: String,
}

pub fn emergency_hotlines() -> Vec<Hotline> {
    vec![
        Hotline {
            number: "1122".to_string(),
            label: "Rescue".to_string(),
        },
        Hotline {
            number: "115".to_string(),
            label: "Aman".to_string(),
        },
    ]
}

/// Snapshot shown by the emergency sub-flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyView {
    pub urgent_blood_type: Option<BloodType>,
    pub listings: Vec<EmergencyListing>,
    pub hotlines: Vec<Hotline>,
}
