use crate::filter::DnsFilter;
use async_trait::async_trait;
use dnswarden_application::ports::{
    BlockedServicesStore, FilterListStore, FilterProperties, FilterRefresher, RefreshOutcome,
    RewriteStore,
};
use dnswarden_domain::{BlockedServicesConfig, DomainError, FilterListConf, LegacyRewrite};
use tracing::warn;

fn url_in_use(conf: &dnswarden_domain::FilteringConfig, url: &str) -> bool {
    conf.filters
        .iter()
        .chain(conf.whitelist_filters.iter())
        .any(|l| l.url == url)
}

#[async_trait]
impl FilterListStore for DnsFilter {
    async fn list_filters(&self, allow: bool) -> Vec<FilterListConf> {
        let conf = self.conf.load();
        if allow {
            conf.whitelist_filters.clone()
        } else {
            conf.filters.clone()
        }
    }

    async fn add_filter(
        &self,
        url: String,
        name: String,
        allow: bool,
    ) -> Result<FilterListConf, DomainError> {
        let id = self.id_gen.next();

        self.mutate_conf({
            let url = url.clone();
            let name = name.clone();
            move |c| {
                if url_in_use(c, &url) {
                    return Err(DomainError::DuplicateFilter(url));
                }
                let mut list = FilterListConf::new(id, url.clone(), name.clone());
                list.white = allow;
                list.user_named = !name.is_empty();
                if list.name.is_empty() {
                    list.name = url;
                }
                if allow {
                    c.whitelist_filters.push(list);
                } else {
                    c.filters.push(list);
                }
                Ok(())
            }
        })
        .await?;

        // First fetch; a failure rolls the registration back so the config
        // is exactly as before.
        if let Err(e) = self.update_filter_content(id, allow).await {
            let _ = self
                .mutate_conf(move |c| {
                    let lists = if allow {
                        &mut c.whitelist_filters
                    } else {
                        &mut c.filters
                    };
                    lists.retain(|l| l.id != id);
                    Ok(())
                })
                .await;
            return Err(e);
        }

        self.enqueue_rebuild().await;

        let conf = self.conf.load();
        let lists = if allow {
            &conf.whitelist_filters
        } else {
            &conf.filters
        };
        lists
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| DomainError::FilterNotFound(format!("id {id}")))
    }

    async fn remove_filter(&self, url: &str, allow: bool) -> Result<(), DomainError> {
        let url = url.to_string();
        let removed = self
            .mutate_conf(move |c| {
                let lists = if allow {
                    &mut c.whitelist_filters
                } else {
                    &mut c.filters
                };
                let Some(idx) = lists.iter().position(|l| l.url == url) else {
                    return Err(DomainError::FilterNotFound(url));
                };
                Ok(lists.remove(idx))
            })
            .await?;

        // Retire the content file rather than deleting it.
        let conf = self.conf.load();
        let path = removed.file_path(&conf.data_dir);
        if path.exists() {
            let retired = path.with_extension("txt.old");
            if let Err(e) = std::fs::rename(&path, &retired) {
                warn!(id = removed.id, error = %e, "Failed to retire filter file");
            }
        }

        self.enqueue_rebuild().await;
        Ok(())
    }

    async fn set_filter_properties(
        &self,
        url: &str,
        props: FilterProperties,
        allow: bool,
    ) -> Result<bool, DomainError> {
        let url = url.to_string();
        let (id, refetch) = self
            .mutate_conf(move |c| {
                if props.url != url && url_in_use(c, &props.url) {
                    return Err(DomainError::DuplicateFilter(props.url));
                }
                let lists = if allow {
                    &mut c.whitelist_filters
                } else {
                    &mut c.filters
                };
                let Some(list) = lists.iter_mut().find(|l| l.url == url) else {
                    return Err(DomainError::FilterNotFound(url));
                };

                let refetch = props.url != list.url;
                if !props.name.is_empty() {
                    list.name = props.name;
                    list.user_named = true;
                }
                list.enabled = props.enabled;
                if refetch {
                    list.url = props.url;
                    list.checksum = 0;
                    list.rules_count = 0;
                    list.last_updated = None;
                }
                Ok((list.id, refetch && list.enabled))
            })
            .await?;

        if refetch {
            self.update_filter_content(id, allow).await?;
        }
        self.enqueue_rebuild().await;
        Ok(refetch)
    }
}

#[async_trait]
impl RewriteStore for DnsFilter {
    async fn list_rewrites(&self) -> Vec<LegacyRewrite> {
        self.conf.load().rewrites.clone()
    }

    async fn add_rewrite(&self, rewrite: LegacyRewrite) -> Result<(), DomainError> {
        self.mutate_conf(move |c| {
            if c.rewrites
                .iter()
                .any(|r| r.domain == rewrite.domain && r.answer == rewrite.answer)
            {
                return Err(DomainError::Validation(format!(
                    "rewrite {} -> {} already exists",
                    rewrite.domain, rewrite.answer
                )));
            }
            c.rewrites.push(rewrite);
            Ok(())
        })
        .await
    }

    async fn remove_rewrite(&self, domain: &str, answer: &str) -> Result<(), DomainError> {
        let domain = domain.to_ascii_lowercase();
        let answer = answer.to_string();
        self.mutate_conf(move |c| {
            let Some(idx) = c
                .rewrites
                .iter()
                .position(|r| r.domain == domain && r.answer == answer)
            else {
                return Err(DomainError::RewriteNotFound(format!("{domain} -> {answer}")));
            };
            c.rewrites.remove(idx);
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl BlockedServicesStore for DnsFilter {
    async fn get_blocked_services(&self) -> BlockedServicesConfig {
        self.conf.load().blocked_services.clone()
    }

    async fn set_blocked_services(&self, conf: BlockedServicesConfig) -> Result<(), DomainError> {
        conf.validate()?;
        self.mutate_conf(move |c| {
            c.blocked_services = conf;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl FilterRefresher for DnsFilter {
    async fn refresh(&self, force: bool) -> Result<RefreshOutcome, DomainError> {
        self.refresh_filters(force).await
    }
}
