//! Explicit sign-in context passed to every operation that acts on behalf
//! of a member.

use chrono::{DateTime, Utc};
use famlink_shared::MemberId;
use famlink_store::Member;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub member_id: MemberId,
    /// Normalized code of the family the member signed into.
    pub family_code: String,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(member: &Member, family_code: impl Into<String>) -> Self {
        Self {
            member_id: member.id,
            family_code: family_code.into(),
            started_at: Utc::now(),
        }
    }
}
