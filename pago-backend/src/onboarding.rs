//! Onboarding state gate.
//!
//! Two states, one transition: a profile unlocks the tool-enabled assistant
//! the instant it carries both a display name and an email address. Mode is
//! a pure function of the profile (no hysteresis, no hidden state), so a
//! profile that somehow loses a required field drops back to onboarding on
//! its next message.

use crate::models::UserProfile;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Onboarding,
    Operational,
}

fn filled(field: &Option<String>) -> bool {
    field.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

pub fn is_onboarded(profile: &UserProfile) -> bool {
    filled(&profile.display_name) && filled(&profile.email_address)
}

pub fn next_mode(profile: &UserProfile) -> Mode {
    if is_onboarded(profile) {
        Mode::Operational
    } else {
        Mode::Onboarding
    }
}
