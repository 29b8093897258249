pub mod blood_request;
pub mod conversation;
pub mod directory;
pub mod eligibility;
pub mod intent;

pub use blood_request::{
    BloodType, DeliveryType, FormField, RecipientType, RequestFormData, RequestFormInput, Urgency,
};
pub use conversation::{Author, ConversationState, FlowPayload, Message, Transcript};
pub use directory::{
    emergency_hotlines, BloodBank, DonationDrive, EmergencyListing, EmergencyView, Hotline,
    SlotStatus, StockLevel,
};
pub use eligibility::{Answer, EligibilityOutcome, EligibilityQuestion, ELIGIBILITY_QUESTIONS};
pub use intent::{Intent, QuickAction, QUICK_ACTIONS};
