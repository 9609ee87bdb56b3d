use super::download::download_filter;
use crate::filter::DnsFilter;
use chrono::{Duration, Utc};
use dnswarden_application::ports::RefreshOutcome;
use dnswarden_domain::{DomainError, FilterListConf};
use std::fs::FileTimes;
use std::time::SystemTime;
use tracing::{debug, info, warn};

fn find_list<'c>(
    lists: &'c [FilterListConf],
    id: i32,
) -> Result<&'c FilterListConf, DomainError> {
    lists
        .iter()
        .find(|l| l.id == id)
        .ok_or_else(|| DomainError::FilterNotFound(format!("id {id}")))
}

impl DnsFilter {
    /// Fetch one list and install its content if it changed.
    ///
    /// Unchanged content only bumps the canonical file's mtime and the
    /// in-memory timestamp; changed content is renamed into place
    /// atomically (the temp handle is closed first) and the list metadata
    /// is updated. Returns whether the content changed.
    pub(crate) async fn update_filter_content(
        &self,
        id: i32,
        allow: bool,
    ) -> Result<bool, DomainError> {
        let conf = self.conf.load_full();
        let lists = if allow {
            &conf.whitelist_filters
        } else {
            &conf.filters
        };
        let list = find_list(lists, id)?;
        let url = list.url.clone();
        let old_checksum = list.checksum;
        let canonical = list.file_path(&conf.data_dir);
        let filters_dir = conf.data_dir.join("filters");

        let downloaded = download_filter(&self.http, &url, &filters_dir).await?;
        let now = Utc::now();
        let changed = downloaded.checksum != old_checksum;

        if changed {
            // Close the handle before the rename; some platforms refuse to
            // replace a file that is still open.
            let temp_path = downloaded.temp.into_temp_path();
            temp_path
                .persist(&canonical)
                .map_err(|e| DomainError::IoError(e.to_string()))?;
            info!(
                id,
                url = %url,
                rules = downloaded.rules_count,
                checksum = downloaded.checksum,
                "Filter list updated"
            );
        } else {
            // Temp file is dropped and removed; push the refresh window
            // out by touching the canonical file.
            if let Ok(file) = std::fs::OpenOptions::new().append(true).open(&canonical) {
                let _ = file.set_times(FileTimes::new().set_modified(SystemTime::now()));
            }
            debug!(id, url = %url, "Filter list unchanged");
        }

        let title = downloaded.title;
        let rules_count = downloaded.rules_count;
        let checksum = downloaded.checksum;
        self.mutate_conf(move |c| {
            let lists = if allow {
                &mut c.whitelist_filters
            } else {
                &mut c.filters
            };
            let Some(list) = lists.iter_mut().find(|l| l.id == id) else {
                // Removed while we were downloading; nothing to record.
                return Ok(());
            };
            list.last_updated = Some(now);
            if changed {
                list.checksum = checksum;
                list.rules_count = rules_count;
                if !list.user_named {
                    if let Some(title) = title {
                        list.name = title;
                    }
                }
            }
            Ok(())
        })
        .await?;

        Ok(changed)
    }

    /// One refresh cycle: walk block lists then allow lists, updating the
    /// ones that are due (or all of them when forced). At most one cycle
    /// runs at a time; a second caller returns immediately empty-handed.
    pub async fn refresh_filters(&self, force: bool) -> Result<RefreshOutcome, DomainError> {
        let Ok(_guard) = self.refresh_lock.try_lock() else {
            debug!("Refresh cycle already running");
            return Ok(RefreshOutcome::default());
        };

        let conf = self.conf.load_full();
        let interval = conf.filters_update_interval;
        let now = Utc::now();
        let due = |list: &FilterListConf| {
            if force {
                return true;
            }
            if interval.is_disabled() {
                return false;
            }
            match list.last_updated {
                Some(at) => at + Duration::hours(i64::from(interval.hours())) <= now,
                None => true,
            }
        };

        let candidates: Vec<(i32, bool)> = conf
            .filters
            .iter()
            .filter(|l| l.enabled && due(l))
            .map(|l| (l.id, false))
            .chain(
                conf.whitelist_filters
                    .iter()
                    .filter(|l| l.enabled && due(l))
                    .map(|l| (l.id, true)),
            )
            .collect();
        drop(conf);

        let mut outcome = RefreshOutcome::default();
        for (id, allow) in candidates {
            outcome.checked += 1;
            match self.update_filter_content(id, allow).await {
                Ok(true) => outcome.updated += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(id, error = %e, "Filter refresh failed; keeping previous content");
                    if e.is_transient() {
                        outcome.network_errors += 1;
                    }
                }
            }
        }

        if outcome.updated > 0 {
            self.enqueue_rebuild().await;
        }

        info!(
            checked = outcome.checked,
            updated = outcome.updated,
            network_errors = outcome.network_errors,
            "Refresh cycle finished"
        );
        Ok(outcome)
    }
}
