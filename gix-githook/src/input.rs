//! Parsing of the post-receive hook input.

use gix_forge::{ObjectId, RefUpdate};

use crate::Error;

/// Everything the git server hands to the post-receive hook of one push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReceiveInput {
    /// The repository that was pushed to.
    pub repo_id: i64,
    /// Who pushed.
    pub principal_id: i64,
    /// All applied reference updates, in the order the server reported them.
    pub ref_updates: Vec<RefUpdate>,
}

impl PostReceiveInput {
    /// Create an input from already parsed updates.
    pub fn new(repo_id: i64, principal_id: i64, ref_updates: Vec<RefUpdate>) -> Self {
        Self {
            repo_id,
            principal_id,
            ref_updates,
        }
    }

    /// Parse `text` as written to the standard input of a post-receive hook.
    pub fn from_text(repo_id: i64, principal_id: i64, text: &str) -> Result<Self, Error> {
        Ok(Self::new(repo_id, principal_id, parse_ref_updates(text)?))
    }
}

/// Parse lines of the form `<old-oid> <new-oid> <refname>`, skipping blank lines.
pub fn parse_ref_updates(text: &str) -> Result<Vec<RefUpdate>, Error> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Result<RefUpdate, Error> {
    let mut it = line.split_whitespace();
    let old_hex = it.next().ok_or_else(|| Error::Protocol("missing <old> oid".into()))?;
    let new_hex = it.next().ok_or_else(|| Error::Protocol("missing <new> oid".into()))?;
    let name = it.next().ok_or_else(|| Error::Protocol("missing <refname>".into()))?;

    // Refnames can't contain spaces.
    if it.next().is_some() {
        return Err(Error::Protocol("unexpected tokens after <refname>".into()));
    }

    let old = parse_oid(old_hex).map_err(|e| Error::Protocol(format!("invalid old oid '{old_hex}': {e}")))?;
    let new = parse_oid(new_hex).map_err(|e| Error::Protocol(format!("invalid new oid '{new_hex}': {e}")))?;
    if old.is_null() && new.is_null() {
        return Err(Error::Validation(format!(
            "both old and new are zero for '{name}' (invalid update)"
        )));
    }
    if old.kind() != new.kind() {
        return Err(Error::Validation(format!("old and new oid of '{name}' differ in hash kind")));
    }

    Ok(RefUpdate::new(name, old, new))
}

fn parse_oid(hex: &str) -> Result<ObjectId, String> {
    ObjectId::from_hex(hex.as_bytes()).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO: &str = "0000000000000000000000000000000000000000";
    const ONE: &str = "1111111111111111111111111111111111111111";
    const TWO: &str = "2222222222222222222222222222222222222222";

    fn oid(hex: &str) -> ObjectId {
        ObjectId::from_hex(hex.as_bytes()).expect("valid hex")
    }

    #[test]
    fn create_update_delete() -> Result<(), Error> {
        let text = format!(
            "{ZERO} {ONE} refs/heads/main\n\n{ONE} {TWO} refs/heads/main\n{TWO} {ZERO} refs/tags/v1\n"
        );
        let updates = parse_ref_updates(&text)?;
        assert_eq!(updates.len(), 3);

        assert!(updates[0].is_create());
        assert_eq!(updates[0].new, oid(ONE));

        assert_eq!(updates[1], RefUpdate::new("refs/heads/main", oid(ONE), oid(TWO)));

        assert!(updates[2].is_delete());
        assert_eq!(updates[2].tag_name(), Some("v1"));
        Ok(())
    }

    #[test]
    fn input_carries_identity() -> Result<(), Error> {
        let input = PostReceiveInput::from_text(3, 9, &format!("{ONE} {TWO} refs/heads/x"))?;
        assert_eq!((input.repo_id, input.principal_id, input.ref_updates.len()), (3, 9, 1));
        Ok(())
    }

    #[test]
    fn malformed_lines() {
        for bad in [
            format!("{ONE}"),
            format!("{ONE} {TWO}"),
            format!("{ONE} {TWO} refs/heads/a extra"),
            format!("zz {TWO} refs/heads/a"),
            format!("{ONE} 123 refs/heads/a"),
        ] {
            let err = parse_ref_updates(&bad).expect_err(&bad);
            assert!(matches!(err, Error::Protocol(_)), "{bad}: {err}");
        }

        let err = parse_ref_updates(&format!("{ZERO} {ZERO} refs/heads/a")).expect_err("both zero");
        assert!(matches!(err, Error::Validation(_)));
    }
}
