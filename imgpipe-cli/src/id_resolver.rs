//! ID resolver module
//!
//! Resolves job id prefixes to full UUIDs by searching the caller's jobs.
//! This allows users to type short, unambiguous prefixes instead of full UUIDs.

use anyhow::{Context, Result, anyhow};
use imgpipe_client::ImgpipeClient;
use imgpipe_core::dto::job::{MAX_PAGE_SIZE, PageRequest};
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Resolve a job ID or prefix to a full UUID
///
/// A full UUID is returned as-is. A prefix is matched against every job the
/// caller owns.
///
/// # Errors
/// Returns an error if no job or several jobs match, or the API call fails
pub async fn resolve_job_id(client: &ImgpipeClient, id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    if let Some(uuid) = id_or_prefix.as_uuid() {
        return Ok(uuid);
    }

    let mut matches = Vec::new();
    let mut page = 1;
    loop {
        let jobs = client
            .list_jobs(PageRequest::new(page, MAX_PAGE_SIZE as i64))
            .await
            .context("Failed to fetch jobs for ID resolution")?;

        matches.extend(
            jobs.items
                .iter()
                .map(|job| job.id)
                .filter(|id| id_or_prefix.matches(*id)),
        );

        if jobs.items.is_empty() || page as usize * jobs.limit >= jobs.total {
            break;
        }
        page += 1;
    }

    pick_unique(id_or_prefix, &matches)
}

fn pick_unique(id_or_prefix: &IdOrPrefix, matches: &[Uuid]) -> Result<Uuid> {
    match matches {
        [] => Err(anyhow!(
            "No job found with ID starting with '{}'",
            id_or_prefix
        )),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(|id| id.to_string()).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple jobs: {}",
                id_or_prefix,
                ids.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_unique() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let prefix = IdOrPrefix::parse("ab");

        assert_eq!(pick_unique(&prefix, &[a]).unwrap(), a);

        let err = pick_unique(&prefix, &[]).unwrap_err();
        assert!(err.to_string().contains("No job found"));

        let err = pick_unique(&prefix, &[a, b]).unwrap_err();
        assert!(err.to_string().contains("Ambiguous prefix 'ab'"));
        assert!(err.to_string().contains(&b.to_string()));
    }
}
