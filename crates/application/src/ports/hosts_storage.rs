use std::net::IpAddr;

/// Read view over the operating-system hosts database.
///
/// The watcher that keeps it current is an external collaborator; lookups
/// are in-memory and synchronous.
pub trait HostsStorage: Send + Sync {
    fn by_name(&self, host: &str) -> Vec<IpAddr>;

    fn by_addr(&self, addr: IpAddr) -> Vec<String>;
}
