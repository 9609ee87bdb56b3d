use async_trait::async_trait;
use dnswarden_application::ports::{
    BlockedServicesStore, FilterListStore, FilterProperties, RewriteStore,
};
use dnswarden_domain::{BlockedServicesConfig, DomainError, FilterListConf, LegacyRewrite};
use std::sync::Mutex;

/// In-memory filter-list store mirroring the engine's admin behaviour.
pub struct MockFilterStore {
    pub lists: Mutex<Vec<FilterListConf>>,
}

impl MockFilterStore {
    pub fn new() -> Self {
        Self {
            lists: Mutex::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.lists.lock().unwrap().len()
    }
}

#[async_trait]
impl FilterListStore for MockFilterStore {
    async fn list_filters(&self, _allow: bool) -> Vec<FilterListConf> {
        self.lists.lock().unwrap().clone()
    }

    async fn add_filter(
        &self,
        url: String,
        name: String,
        _allow: bool,
    ) -> Result<FilterListConf, DomainError> {
        let mut lists = self.lists.lock().unwrap();
        if lists.iter().any(|l| l.url == url) {
            return Err(DomainError::DuplicateFilter(url));
        }
        let id = lists.len() as i32 + 1;
        let conf = FilterListConf::new(id, url, name);
        lists.push(conf.clone());
        Ok(conf)
    }

    async fn remove_filter(&self, url: &str, _allow: bool) -> Result<(), DomainError> {
        let mut lists = self.lists.lock().unwrap();
        let Some(idx) = lists.iter().position(|l| l.url == url) else {
            return Err(DomainError::FilterNotFound(url.to_string()));
        };
        lists.remove(idx);
        Ok(())
    }

    async fn set_filter_properties(
        &self,
        url: &str,
        props: FilterProperties,
        _allow: bool,
    ) -> Result<bool, DomainError> {
        let mut lists = self.lists.lock().unwrap();
        let Some(list) = lists.iter_mut().find(|l| l.url == url) else {
            return Err(DomainError::FilterNotFound(url.to_string()));
        };
        let refetch = props.url != list.url;
        list.name = props.name;
        list.url = props.url;
        list.enabled = props.enabled;
        Ok(refetch)
    }
}

/// In-memory rewrite store.
pub struct MockRewriteStore {
    pub rewrites: Mutex<Vec<LegacyRewrite>>,
}

impl MockRewriteStore {
    pub fn new() -> Self {
        Self {
            rewrites: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RewriteStore for MockRewriteStore {
    async fn list_rewrites(&self) -> Vec<LegacyRewrite> {
        self.rewrites.lock().unwrap().clone()
    }

    async fn add_rewrite(&self, rewrite: LegacyRewrite) -> Result<(), DomainError> {
        self.rewrites.lock().unwrap().push(rewrite);
        Ok(())
    }

    async fn remove_rewrite(&self, domain: &str, answer: &str) -> Result<(), DomainError> {
        let mut rewrites = self.rewrites.lock().unwrap();
        let Some(idx) = rewrites
            .iter()
            .position(|r| r.domain == domain && r.answer == answer)
        else {
            return Err(DomainError::RewriteNotFound(format!("{domain} -> {answer}")));
        };
        rewrites.remove(idx);
        Ok(())
    }
}

/// In-memory blocked-services store.
pub struct MockServicesStore {
    pub conf: Mutex<BlockedServicesConfig>,
}

impl MockServicesStore {
    pub fn new() -> Self {
        Self {
            conf: Mutex::new(BlockedServicesConfig::default()),
        }
    }
}

#[async_trait]
impl BlockedServicesStore for MockServicesStore {
    async fn get_blocked_services(&self) -> BlockedServicesConfig {
        self.conf.lock().unwrap().clone()
    }

    async fn set_blocked_services(&self, conf: BlockedServicesConfig) -> Result<(), DomainError> {
        *self.conf.lock().unwrap() = conf;
        Ok(())
    }
}
