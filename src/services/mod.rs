pub mod actions;
pub mod clock;
pub mod conversation;
pub mod directory;
pub mod eligibility;
pub mod emergency;
pub mod intake_form;
pub mod intent;
pub mod reply_queue;
pub mod session;
