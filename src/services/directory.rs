use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{BloodBank, BloodType, DonationDrive, EmergencyListing};

/// Read-only source of blood banks, donation drives and emergency listings.
pub trait DirectoryProvider: Send + Sync {
    /// Banks ordered nearest first, at most `limit` of them.
    fn nearby_banks(&self, limit: usize) -> Vec<BloodBank>;

    fn bank(&self, id: &str) -> Option<BloodBank>;

    fn emergency_listings(&self) -> Vec<EmergencyListing>;

    fn donation_drives(&self) -> Vec<DonationDrive>;
}

/// In-memory directory.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    banks: Vec<BloodBank>,
    emergency: Vec<EmergencyListing>,
    drives: Vec<DonationDrive>,
}

impl StaticDirectory {
    pub fn new(
        banks: Vec<BloodBank>,
        emergency: Vec<EmergencyListing>,
        drives: Vec<DonationDrive>,
    ) -> Self {
        Self {
            banks,
            emergency,
            drives,
        }
    }

    /// Sample data for Karachi.
    pub fn karachi() -> Self {
        let banks = vec![
            bank(
                "1",
                "Aga Khan University Hospital Blood Bank",
                "Stadium Road, Karachi",
                ("Karsaz", "Karachi East"),
                (24.8898, 67.0722),
                "+92-21-34864196",
                "24/7",
                2.3,
                [45, 12, 38, 8, 52, 15, 22, 5],
                "10 mins ago",
            ),
            bank(
                "2",
                "Liaquat National Hospital Blood Bank",
                "National Stadium Road, Karachi",
                ("Gulshan-e-Iqbal", "Karachi East"),
                (24.8768, 67.0661),
                "+92-21-34120368",
                "8:00 AM - 8:00 PM",
                3.1,
                [32, 18, 28, 11, 41, 9, 19, 7],
                "25 mins ago",
            ),
            bank(
                "3",
                "Jinnah Postgraduate Medical Centre",
                "Rafiqui Shaheed Road, Karachi",
                ("Garden", "Karachi Central"),
                (24.8786, 67.0446),
                "+92-21-99201300",
                "24/7",
                4.5,
                [55, 22, 44, 14, 62, 19, 31, 9],
                "5 mins ago",
            ),
        ];

        use BloodType::*;
        let emergency = vec![
            EmergencyListing {
                id: "1".to_string(),
                name: "Aga Khan University Hospital".to_string(),
                address: "Stadium Road, Karachi".to_string(),
                distance: "2.3 km".to_string(),
                phone: "+92-21-34864196".to_string(),
                hours: "24/7 Emergency".to_string(),
                available_types: vec![APos, BPos, OPos, ONeg, AbPos],
                total_units: 184,
                lat: 24.8898,
                lng: 67.0722,
            },
            EmergencyListing {
                id: "3".to_string(),
                name: "Jinnah Postgraduate Medical Centre".to_string(),
                address: "Rafiqui Shaheed Road, Karachi".to_string(),
                distance: "4.5 km".to_string(),
                phone: "+92-21-99201300".to_string(),
                hours: "24/7 Emergency".to_string(),
                available_types: BloodType::ALL.to_vec(),
                total_units: 256,
                lat: 24.8786,
                lng: 67.0446,
            },
        ];

        let drives = vec![
            drive(
                "1",
                "Karachi Blood Donation Camp",
                "Sindh Blood Transfusion Authority",
                (2025, 11, 15),
                "10:00 AM - 6:00 PM",
                "Expo Centre, Karachi",
                (24.8935, 67.0351),
                (342, 500),
                vec![ONeg, AbNeg, BNeg],
            ),
            drive(
                "2",
                "Emergency Blood Collection Drive",
                "Pakistan Red Crescent Society",
                (2025, 11, 13),
                "9:00 AM - 5:00 PM",
                "NED University, University Road, Karachi",
                (24.9261, 67.1105),
                (178, 500),
                vec![OPos, ONeg, ANeg],
            ),
        ];

        Self::new(banks, emergency, drives)
    }
}

impl DirectoryProvider for StaticDirectory {
    fn nearby_banks(&self, limit: usize) -> Vec<BloodBank> {
        let mut banks = self.banks.clone();
        banks.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        banks.truncate(limit);
        banks
    }

    fn bank(&self, id: &str) -> Option<BloodBank> {
        self.banks.iter().find(|b| b.id == id).cloned()
    }

    fn emergency_listings(&self) -> Vec<EmergencyListing> {
        self.emergency.clone()
    }

    fn donation_drives(&self) -> Vec<DonationDrive> {
        self.drives.clone()
    }
}

#[allow(clippy::too_many_arguments)]
fn bank(
    id: &str,
    name: &str,
    address: &str,
    (area, district): (&str, &str),
    (lat, lng): (f64, f64),
    phone: &str,
    hours: &str,
    distance: f64,
    units: [u32; 8],
    last_updated: &str,
) -> BloodBank {
    let availability: BTreeMap<BloodType, u32> =
        BloodType::ALL.into_iter().zip(units).collect();
    BloodBank {
        id: id.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        area: area.to_string(),
        district: district.to_string(),
        lat,
        lng,
        phone: phone.to_string(),
        availability,
        hours: hours.to_string(),
        distance,
        last_updated: Some(last_updated.to_string()),
    }
}

#[allow(clippy::too_many_arguments)]
fn drive(
    id: &str,
    title: &str,
    organizer: &str,
    (y, m, d): (i32, u32, u32),
    time: &str,
    location: &str,
    (lat, lng): (f64, f64),
    (slots_available, total_slots): (u32, u32),
    urgent_needs: Vec<BloodType>,
) -> DonationDrive {
    DonationDrive {
        id: id.to_string(),
        title: title.to_string(),
        organizer: organizer.to_string(),
        date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
        time: time.to_string(),
        location: location.to_string(),
        lat,
        lng,
        slots_available,
        total_slots,
        urgent_needs,
    }
}
