pub mod match_record;
pub mod travel_post;
pub mod traveler;
pub mod trip;

use tripmatch_sdk::objects::{
    Gender as SdkGender, GenderPreference as SdkGenderPreference, MatchStatus as SdkMatchStatus,
    PostStatus as SdkPostStatus,
};

/// Traveler gender for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `tripmatch_sdk::objects::Gender`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "gender")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl From<Gender> for SdkGender {
    fn from(value: Gender) -> Self {
        match value {
            Gender::Male => SdkGender::Male,
            Gender::Female => SdkGender::Female,
            Gender::Other => SdkGender::Other,
        }
    }
}

impl From<SdkGender> for Gender {
    fn from(value: SdkGender) -> Self {
        match value {
            SdkGender::Male => Gender::Male,
            SdkGender::Female => Gender::Female,
            SdkGender::Other => Gender::Other,
        }
    }
}

/// Companion gender preference of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "gender_preference")]
pub enum GenderPreference {
    Any,
    Male,
    Female,
}

impl GenderPreference {
    /// `Any` admits everyone, including travelers with no recorded gender.
    /// Other preferences require an exact match.
    pub fn accepts(self, gender: Option<Gender>) -> bool {
        match self {
            GenderPreference::Any => true,
            GenderPreference::Male => gender == Some(Gender::Male),
            GenderPreference::Female => gender == Some(Gender::Female),
        }
    }

    /// The gender a candidate must have, or `None` for the wildcard.
    pub fn required_gender(self) -> Option<Gender> {
        match self {
            GenderPreference::Any => None,
            GenderPreference::Male => Some(Gender::Male),
            GenderPreference::Female => Some(Gender::Female),
        }
    }
}

impl From<GenderPreference> for SdkGenderPreference {
    fn from(value: GenderPreference) -> Self {
        match value {
            GenderPreference::Any => SdkGenderPreference::Any,
            GenderPreference::Male => SdkGenderPreference::Male,
            GenderPreference::Female => SdkGenderPreference::Female,
        }
    }
}

impl From<SdkGenderPreference> for GenderPreference {
    fn from(value: SdkGenderPreference) -> Self {
        match value {
            SdkGenderPreference::Any => GenderPreference::Any,
            SdkGenderPreference::Male => GenderPreference::Male,
            SdkGenderPreference::Female => GenderPreference::Female,
        }
    }
}

/// Post status. `Active` → `Closed` is the only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "post_status")]
pub enum PostStatus {
    Active,
    Closed,
}

impl From<PostStatus> for SdkPostStatus {
    fn from(value: PostStatus) -> Self {
        match value {
            PostStatus::Active => SdkPostStatus::Active,
            PostStatus::Closed => SdkPostStatus::Closed,
        }
    }
}

/// Match status. `Pending` moves to one of the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "match_status")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Rejected,
}

impl MatchStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, MatchStatus::Pending)
    }
}

impl From<MatchStatus> for SdkMatchStatus {
    fn from(value: MatchStatus) -> Self {
        match value {
            MatchStatus::Pending => SdkMatchStatus::Pending,
            MatchStatus::Accepted => SdkMatchStatus::Accepted,
            MatchStatus::Rejected => SdkMatchStatus::Rejected,
        }
    }
}

impl From<SdkMatchStatus> for MatchStatus {
    fn from(value: SdkMatchStatus) -> Self {
        match value {
            SdkMatchStatus::Pending => MatchStatus::Pending,
            SdkMatchStatus::Accepted => MatchStatus::Accepted,
            SdkMatchStatus::Rejected => MatchStatus::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_preference_accepts() {
        assert!(GenderPreference::Any.accepts(None));
        assert!(GenderPreference::Any.accepts(Some(Gender::Other)));
        assert!(GenderPreference::Female.accepts(Some(Gender::Female)));
        assert!(!GenderPreference::Female.accepts(Some(Gender::Male)));
        assert!(!GenderPreference::Male.accepts(None));
    }
}
