use crate::hosts::HostsMatcher;
use crate::result::{FilterReason, FilterResult};
use crate::rewrites;
use crate::rules::RuleQuery;
use crate::services::{self, CompiledService};
use crate::settings::RequestSettings;
use crate::swap::{FilterSource, RebuildRequest, SourceContent, SwapCoordinator};
use arc_swap::ArcSwap;
use chrono::Utc;
use dnswarden_application::ports::{Checker, HostsStorage};
use dnswarden_domain::filter_list::normalize_filter_ids;
use dnswarden_domain::{builtin, DomainError, FilteringConfig, IdGenerator};
use hickory_proto::rr::RecordType;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// External collaborators injected at construction time.
#[derive(Default)]
pub struct DnsFilterDeps {
    pub hosts: Option<Arc<dyn HostsStorage>>,
    pub safe_browsing: Option<Arc<dyn Checker>>,
    pub parental: Option<Arc<dyn Checker>>,
    pub safe_search: Option<Arc<dyn Checker>>,
}

/// The filtering engine: composes legacy rewrites, the OS hosts database,
/// rule-list matching, blocked services and the remote checkers into a
/// single verdict per query.
///
/// `check_host` is fully concurrent; configuration lives behind an
/// atomically-swappable snapshot and the matching engines behind the swap
/// coordinator, so queries never block on admin activity.
pub struct DnsFilter {
    pub(crate) conf: ArcSwap<FilteringConfig>,
    /// Serialises configuration mutations; readers never take it.
    pub(crate) admin_lock: Mutex<()>,
    pub(crate) id_gen: IdGenerator,
    pub(crate) swap: SwapCoordinator,
    /// Non-blocking guard: at most one refresh cycle in flight.
    pub(crate) refresh_lock: Mutex<()>,
    pub(crate) http: reqwest::Client,
    hosts: Option<HostsMatcher>,
    safe_browsing: Option<Arc<dyn Checker>>,
    parental: Option<Arc<dyn Checker>>,
    safe_search: Option<Arc<dyn Checker>>,
    services: Vec<CompiledService>,
    shutdown: CancellationToken,
}

impl DnsFilter {
    /// Build the filter and its initial matching engines. A storage that
    /// cannot be built at startup is fatal.
    pub fn new(mut conf: FilteringConfig, deps: DnsFilterDeps) -> Result<Arc<Self>, DomainError> {
        let id_gen = IdGenerator::new();

        for list in &mut conf.filters {
            list.white = false;
            list.user_named = !list.name.is_empty();
        }
        for list in &mut conf.whitelist_filters {
            list.white = true;
            list.user_named = !list.name.is_empty();
        }
        let mut lists: Vec<&mut _> = conf
            .filters
            .iter_mut()
            .chain(conf.whitelist_filters.iter_mut())
            .collect();
        normalize_filter_ids(&mut lists, &id_gen);

        conf.blocked_services.validate()?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("DnsWarden/", env!("CARGO_PKG_VERSION"), " (filter-refresh)"))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DomainError::NetworkError(e.to_string()))?;

        let (block, allow) = Self::collect_sources(&conf);
        let swap = SwapCoordinator::new(crate::swap::build_engine_set(&block, &allow)?);
        info!(
            block_lists = conf.filters.len(),
            allow_lists = conf.whitelist_filters.len(),
            rewrites = conf.rewrites.len(),
            "DnsFilter initialized"
        );

        Ok(Arc::new(Self {
            conf: ArcSwap::from_pointee(conf),
            admin_lock: Mutex::new(()),
            id_gen,
            swap,
            refresh_lock: Mutex::new(()),
            http,
            hosts: deps.hosts.map(HostsMatcher::new),
            safe_browsing: deps.safe_browsing,
            parental: deps.parental,
            safe_search: deps.safe_search,
            services: services::compile_catalogue(),
            shutdown: CancellationToken::new(),
        }))
    }

    /// Start the asynchronous engine swap worker.
    pub fn start(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let token = self.shutdown.child_token();
        tokio::spawn(async move {
            this.swap.run_worker(token).await;
        });
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn config(&self) -> Arc<FilteringConfig> {
        self.conf.load_full()
    }

    /// Snapshot global settings plus the schedule-reduced service rules.
    /// The caller layers per-client overrides on top.
    pub fn request_settings(&self) -> RequestSettings {
        let conf = self.conf.load();
        let mut settings = RequestSettings::from_config(&conf);
        settings.services_rules =
            services::service_rules_at(&conf.blocked_services, &self.services, Utc::now());
        settings
    }

    /// Decide the verdict for one hostname query.
    ///
    /// Legacy rewrites run first because they change the host whose
    /// answers are constructed; the hosts database precedes rule lists so
    /// local mappings always win; blocked services follow the rule engine
    /// so an allow rule can whitelist a service domain. Checker failures
    /// surface as errors wrapped with the checker's name, never panics.
    pub async fn check_host(
        &self,
        host: &str,
        qtype: RecordType,
        settings: &RequestSettings,
    ) -> Result<FilterResult, DomainError> {
        if host.is_empty() {
            return Ok(FilterResult::not_found());
        }
        let host = host.to_ascii_lowercase();

        if settings.filtering_enabled {
            let conf = self.conf.load();
            if let Some(res) = rewrites::resolve(&host, qtype, &conf.rewrites) {
                if res.reason == FilterReason::Rewritten {
                    return Ok(res);
                }
            }
        }

        if let Some(hosts) = &self.hosts {
            let res = hosts.check(&host, qtype);
            if res.is_match() {
                return Ok(res);
            }
        }

        if settings.filtering_enabled {
            let query = RuleQuery {
                host: &host,
                qtype,
                client_ip: settings.client_ip,
                client_name: settings.client_name.as_deref(),
                client_tags: &settings.client_tags,
            };
            let engines = self.swap.current();
            let res = engines.match_host(&query, settings);
            if res.is_match() {
                return Ok(res);
            }
        }

        let res = services::match_blocked_services(&host, settings);
        if res.is_match() {
            return Ok(res);
        }

        if settings.protection_enabled && settings.safe_browsing_enabled {
            if let Some(res) = self
                .run_checker(&self.safe_browsing, &host, FilterReason::FilteredSafeBrowsing)
                .await?
            {
                return Ok(res);
            }
        }

        if settings.protection_enabled && settings.parental_enabled {
            if let Some(res) = self
                .run_checker(&self.parental, &host, FilterReason::FilteredParental)
                .await?
            {
                return Ok(res);
            }
        }

        if settings.protection_enabled && settings.safe_search_enabled {
            if let Some(res) = self
                .run_checker(&self.safe_search, &host, FilterReason::FilteredSafeSearch)
                .await?
            {
                return Ok(res);
            }
        }

        Ok(FilterResult::not_found())
    }

    async fn run_checker(
        &self,
        checker: &Option<Arc<dyn Checker>>,
        host: &str,
        reason: FilterReason,
    ) -> Result<Option<FilterResult>, DomainError> {
        let Some(checker) = checker else {
            return Ok(None);
        };
        let list_id = match reason {
            FilterReason::FilteredSafeBrowsing => builtin::SAFE_BROWSING,
            FilterReason::FilteredParental => builtin::PARENTAL,
            _ => builtin::SAFE_SEARCH,
        };
        match checker.check(host).await {
            Ok(true) => Ok(Some(FilterResult::from_checker(
                reason,
                checker.name(),
                list_id,
            ))),
            Ok(false) => Ok(None),
            Err(e) => Err(DomainError::CheckerFailed {
                name: checker.name(),
                message: e.to_string(),
            }),
        }
    }

    /// Admin diagnostic: like `check_host`, but checker failures degrade
    /// to a best-effort "not filtered, error" verdict instead of an error.
    pub async fn check_host_diagnostic(
        &self,
        host: &str,
        qtype: RecordType,
    ) -> FilterResult {
        let settings = self.request_settings();
        match self.check_host(host, qtype, &settings).await {
            Ok(res) => res,
            Err(e) => {
                debug!(host, error = %e, "Diagnostic check failed");
                FilterResult::checker_error()
            }
        }
    }

    /// Assemble the rule sources for both storages from the current
    /// configuration: the inline user rules plus every enabled list file.
    pub(crate) fn collect_sources(conf: &FilteringConfig) -> (Vec<FilterSource>, Vec<FilterSource>) {
        let mut block = Vec::new();
        if !conf.user_rules.is_empty() {
            block.push(FilterSource {
                id: builtin::CUSTOM_RULES,
                content: SourceContent::Inline(conf.user_rules.join("\n")),
            });
        }
        for list in conf.filters.iter().filter(|l| l.enabled) {
            block.push(FilterSource {
                id: list.id,
                content: SourceContent::File(list.file_path(&conf.data_dir)),
            });
        }
        let allow = conf
            .whitelist_filters
            .iter()
            .filter(|l| l.enabled)
            .map(|list| FilterSource {
                id: list.id,
                content: SourceContent::File(list.file_path(&conf.data_dir)),
            })
            .collect();
        (block, allow)
    }

    /// Rebuild the engines synchronously from the current configuration.
    pub fn rebuild_now(&self) -> Result<(), DomainError> {
        let conf = self.conf.load();
        let (block, allow) = Self::collect_sources(&conf);
        self.swap.set_filters_sync(&block, &allow)
    }

    /// Queue an asynchronous rebuild; a pending one is superseded.
    pub(crate) async fn enqueue_rebuild(&self) {
        let conf = self.conf.load();
        let (block, allow) = Self::collect_sources(&conf);
        self.swap.enqueue(RebuildRequest { block, allow }).await;
    }

    /// Clone-mutate-store on the configuration snapshot, serialised by the
    /// admin lock. The closure must not perform I/O.
    pub(crate) async fn mutate_conf<R>(
        &self,
        mutate: impl FnOnce(&mut FilteringConfig) -> Result<R, DomainError>,
    ) -> Result<R, DomainError> {
        let _guard = self.admin_lock.lock().await;
        let mut conf = (**self.conf.load()).clone();
        let result = mutate(&mut conf)?;
        self.conf.store(Arc::new(conf));
        Ok(result)
    }
}
