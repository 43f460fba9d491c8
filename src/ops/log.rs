use std::collections::HashSet;

use crate::error::Result;
use crate::hash::Digest;
use crate::object::read_commit;
use crate::repo::Repo;
use crate::types::Commit;

/// commit with its digest for log output
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub digest: Digest,
    pub commit: Commit,
}

/// get commit history starting at a commit, newest first
///
/// each commit is listed once even when reachable through several merges.
pub fn log(repo: &Repo, head: &Digest, max_count: Option<usize>) -> Result<Vec<LogEntry>> {
    let mut entries = Vec::new();
    let mut to_visit = vec![*head];
    let mut visited = HashSet::new();

    while let Some(digest) = to_visit.pop() {
        if !visited.insert(digest) {
            continue;
        }

        let commit = read_commit(repo, &digest)?;

        // add parents to visit queue (first parent on top)
        for parent in commit.parents()?.into_iter().rev() {
            to_visit.push(parent);
        }

        entries.push(LogEntry { digest, commit });
    }

    // sort by timestamp descending (newest first); stable keeps walk order on ties
    entries.sort_by(|a, b| b.commit.timestamp().cmp(&a.commit.timestamp()));

    if let Some(max) = max_count {
        entries.truncate(max);
    }

    Ok(entries)
}

/// format a log entry for display
impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "commit {}", self.digest)?;
        if self.commit.is_merge() {
            let short: Vec<_> = self
                .commit
                .kvlm()
                .get_all("parent")
                .iter()
                .map(|p| String::from_utf8_lossy(&p[..p.len().min(7)]))
                .collect();
            writeln!(f, "Merge: {}", short.join(" "))?;
        }
        if let Some(author) = self.commit.author() {
            writeln!(f, "Author: {}", identity_name(&author))?;
            if let Some(date) = identity_date(&author) {
                writeln!(f, "Date:   {}", date)?;
            }
        }

        writeln!(f)?;
        for line in self.commit.message().lines() {
            writeln!(f, "    {}", line)?;
        }

        Ok(())
    }
}

/// `Name <mail>` part of an identity, dropping the trailing time fields
fn identity_name(ident: &str) -> &str {
    match ident.rfind('>') {
        Some(end) => &ident[..=end],
        None => ident,
    }
}

/// `<seconds> <tz>` part of an identity
fn identity_date(ident: &str) -> Option<&str> {
    let end = ident.rfind('>')?;
    let date = ident[end + 1..].trim();
    (!date.is_empty()).then_some(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::write_object;
    use crate::types::Object;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo_path = dir.path().join("repo");
        let repo = Repo::init(&repo_path).unwrap();
        (dir, repo)
    }

    fn ident(ts: i64) -> String {
        format!("Test Author <test@example.com> {} +0000", ts)
    }

    fn commit_at(repo: &Repo, parents: &[Digest], ts: i64, msg: &str) -> Digest {
        let commit = Commit::new(Digest::ZERO, parents, ident(ts), ident(ts), format!("{}\n", msg));
        write_object(Some(repo), &Object::Commit(commit)).unwrap()
    }

    #[test]
    fn test_log_single_commit() {
        let (_dir, repo) = test_repo();
        let head = commit_at(&repo, &[], 100, "first commit");

        let entries = log(&repo, &head, None).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].commit.message(), "first commit\n");
    }

    #[test]
    fn test_log_multiple_commits() {
        let (_dir, repo) = test_repo();
        let c1 = commit_at(&repo, &[], 100, "commit 1");
        let c2 = commit_at(&repo, &[c1], 200, "commit 2");
        let c3 = commit_at(&repo, &[c2], 300, "commit 3");

        let entries = log(&repo, &c3, None).unwrap();
        let digests: Vec<_> = entries.iter().map(|e| e.digest).collect();
        assert_eq!(digests, vec![c3, c2, c1]);
    }

    #[test]
    fn test_log_merge_visits_once() {
        let (_dir, repo) = test_repo();
        let base = commit_at(&repo, &[], 100, "base");
        let left = commit_at(&repo, &[base], 200, "left");
        let right = commit_at(&repo, &[base], 300, "right");
        let merge = commit_at(&repo, &[left, right], 400, "merge");

        let entries = log(&repo, &merge, None).unwrap();
        let digests: Vec<_> = entries.iter().map(|e| e.digest).collect();
        assert_eq!(digests, vec![merge, right, left, base]);
    }

    #[test]
    fn test_log_max_count() {
        let (_dir, repo) = test_repo();
        let mut head = commit_at(&repo, &[], 0, "commit 0");
        for i in 1..5 {
            head = commit_at(&repo, &[head], i, &format!("commit {}", i));
        }

        let entries = log(&repo, &head, Some(2)).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].commit.message(), "commit 4\n");
    }

    #[test]
    fn test_log_missing_parent() {
        let (_dir, repo) = test_repo();
        let head = commit_at(&repo, &[Digest::from_bytes([9; 20])], 1, "orphan");

        assert!(matches!(
            log(&repo, &head, None),
            Err(crate::Error::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_log_entry_display() {
        let (_dir, repo) = test_repo();
        let head = commit_at(&repo, &[], 1527025023, "test message");

        let entries = log(&repo, &head, None).unwrap();
        let display = format!("{}", entries[0]);

        assert!(display.starts_with(&format!("commit {}\n", head)));
        assert!(display.contains("Author: Test Author <test@example.com>\n"));
        assert!(display.contains("Date:   1527025023 +0000\n"));
        assert!(display.contains("    test message"));
    }
}
