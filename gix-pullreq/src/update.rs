//! Editing title and description of a pull request.

use std::time::{SystemTime, UNIX_EPOCH};

use gix_forge::{PullReq, PullReqStore};

use crate::{Error, Result};

/// The new title and description of a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateInput {
    /// The title, must not be empty after trimming.
    pub title: String,
    /// The description.
    pub description: String,
}

impl UpdateInput {
    /// Create a new input.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    fn sanitize(self) -> Result<Self> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::Validation("pull request title can't be empty".into()));
        }
        Ok(Self {
            title: title.to_owned(),
            description: self.description.trim().to_owned(),
        })
    }
}

/// Set title and description of pull request `number` of repository `repo_id`.
///
/// Unchanged input returns the stored pull request without writing. A changed title counts as
/// activity and advances [`PullReq::activity_seq`]. If the pull request was modified concurrently,
/// this fails with a conflict and the caller may retry.
pub async fn update_pull_request(
    store: &dyn PullReqStore,
    repo_id: i64,
    number: i64,
    input: UpdateInput,
) -> Result<PullReq> {
    let input = input.sanitize()?;
    let pr = store.find_by_number(repo_id, number).await?;

    if pr.title == input.title && pr.description == input.description {
        return Ok(pr);
    }

    let title_changed = pr.title != input.title;
    let updated = store
        .update_opt_lock(&pr, &mut |pr: &mut PullReq| {
            pr.title.clone_from(&input.title);
            pr.description.clone_from(&input.description);
            pr.edited = now_millis();
            if title_changed {
                pr.activity_seq += 1;
            }
            Ok(())
        })
        .await?;

    if title_changed {
        tracing::debug!(
            repo_id,
            number,
            old = %pr.title,
            new = %updated.title,
            "pull request title changed"
        );
    }
    Ok(updated)
}

pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_is_trimmed() -> Result<()> {
        let input = UpdateInput::new("  Fix it \n", "\tdetails ").sanitize()?;
        assert_eq!(input, UpdateInput::new("Fix it", "details"));
        Ok(())
    }

    #[test]
    fn blank_titles_are_rejected() {
        let err = UpdateInput::new(" \t", "anything").sanitize().expect_err("blank");
        assert_eq!(err.kind(), gix_forge::Kind::Validation);
        assert_eq!(err.to_string(), "pull request title can't be empty");
    }
}
