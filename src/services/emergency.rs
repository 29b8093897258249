use crate::models::{emergency_hotlines, BloodType, EmergencyListing, EmergencyView};

impl EmergencyView {
    /// Builds the view from the directory's emergency listings.
    ///
    /// `urgent_blood_type` only drives emphasis and the headline. The
    /// listing is passed through unfiltered: every emergency-capable bank
    /// is shown whatever type was asked for.
    pub fn build(urgent_blood_type: Option<BloodType>, listings: Vec<EmergencyListing>) -> Self {
        Self {
            urgent_blood_type,
            listings,
            hotlines: emergency_hotlines(),
        }
    }

    pub fn headline(&self) -> String {
        let wanted = self
            .urgent_blood_type
            .map(|t| t.as_str())
            .unwrap_or("critical");
        format!("Showing blood banks with {wanted} stock available")
    }

    pub fn is_emphasized(&self, blood_type: BloodType) -> bool {
        self.urgent_blood_type == Some(blood_type)
    }

    pub fn summary(&self) -> String {
        format!("{} Blood Banks with Available Stock", self.listings.len())
    }

    pub fn total_units(&self) -> u32 {
        self.listings.iter().map(|l| l.total_units).sum()
    }
}
