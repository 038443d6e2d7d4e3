//! Bot invite link.

use autorooms_model::PermissionSet;

/// OAuth2 authorization endpoint of the platform.
pub const INVITE_BASE_URL: &str = "https://discord.com/oauth2/authorize";

/// The link a guild admin follows to add the bot with exactly the
/// permissions autorooms needs.
pub fn invite_link(application_id: u64) -> String {
    format!(
        "{INVITE_BASE_URL}?client_id={application_id}&scope=bot&permissions={}",
        PermissionSet::AUTOROOM_CAPABILITY.bits()
    )
}
