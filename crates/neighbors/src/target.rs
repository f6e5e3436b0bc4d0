//! Builds a `TargetProfile` from the `RatingIndex`.

use crate::types::TargetProfile;
use data_loader::{RatingIndex, UserId};

/// Build the profile of the user we are recommending for
///
/// An unknown user is not an error here: the profile simply has an empty
/// history, which every later stage turns into "nothing to recommend".
/// Telling the two apart is left to the caller via `RatingIndex::contains_user`.
pub fn build_target_profile(index: &RatingIndex, user_id: UserId) -> TargetProfile {
    let history = index.history_of(user_id);

    let mut profile = TargetProfile::new(user_id);
    profile.rated_books = history.iter().map(|r| r.book_id).collect();
    profile.history = history.to_vec();
    profile
}
