//! DNS lookups through the system resolver configuration

use crate::error::{AppError, Result};
use std::net::IpAddr;
use std::time::{Duration, Instant};
use trust_dns_resolver::{system_conf, TokioAsyncResolver};
use tokio::sync::RwLock;

/// Outcome of one lookup, rendered like `nslookup` output
#[derive(Debug, Clone)]
pub struct DnsLookup {
    pub domain: String,
    pub addresses: Vec<IpAddr>,
    pub nameservers: Vec<String>,
    pub duration: Duration,
    pub error: Option<String>,
}

impl DnsLookup {
    pub fn success(&self) -> bool {
        self.error.is_none() && !self.addresses.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.nameservers.is_empty() {
            out.push_str("Server:\t(system resolver)\n");
        } else {
            out.push_str(&format!("Server:\t{}\n", self.nameservers.join(", ")));
        }
        out.push_str(&format!("Name:\t{}\n", self.domain));
        for address in &self.addresses {
            out.push_str(&format!("Address:\t{}\n", address));
        }
        if let Some(error) = &self.error {
            out.push_str(&format!("** lookup failed: {}\n", error));
        }
        out.push_str(&format!("Query time:\t{} ms\n", self.duration.as_millis()));
        out
    }
}

/// Lazily initialized system resolver
pub struct DnsManager {
    system_resolver: RwLock<Option<(TokioAsyncResolver, Vec<String>)>>,
}

impl Default for DnsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsManager {
    pub fn new() -> Self {
        Self {
            system_resolver: RwLock::new(None),
        }
    }

    /// Initialize the system DNS resolver
    async fn system_resolver(&self) -> Result<(TokioAsyncResolver, Vec<String>)> {
        if let Some(ready) = self.system_resolver.read().await.as_ref() {
            return Ok(ready.clone());
        }

        let (config, opts) = system_conf::read_system_conf().map_err(|e| {
            AppError::dns_resolution(format!("Failed to read system DNS config: {}", e))
        })?;
        let nameservers = config
            .name_servers()
            .iter()
            .map(|ns| ns.socket_addr.ip().to_string())
            .fold(Vec::new(), |mut acc, ip| {
                if !acc.contains(&ip) {
                    acc.push(ip);
                }
                acc
            });
        let resolver = TokioAsyncResolver::tokio(config, opts);

        let mut slot = self.system_resolver.write().await;
        *slot = Some((resolver.clone(), nameservers.clone()));
        Ok((resolver, nameservers))
    }

    /// Resolve a domain name to its addresses
    pub async fn resolve(&self, domain: &str) -> Result<Vec<IpAddr>> {
        if let Ok(ip) = domain.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }
        let (resolver, _) = self.system_resolver().await?;
        let response = resolver.lookup_ip(domain).await?;
        Ok(response.iter().collect())
    }

    /// Resolve and keep everything needed for the run log
    pub async fn lookup(&self, domain: &str) -> DnsLookup {
        let start = Instant::now();
        let nameservers = match self.system_resolver().await {
            Ok((_, nameservers)) => nameservers,
            Err(_) => Vec::new(),
        };

        let (addresses, error) = match self.resolve(domain).await {
            Ok(addresses) if addresses.is_empty() => {
                (addresses, Some("no addresses returned".to_string()))
            }
            Ok(addresses) => (addresses, None),
            Err(e) => (Vec::new(), Some(e.to_string())),
        };

        DnsLookup {
            domain: domain.to_string(),
            addresses,
            nameservers,
            duration: start.elapsed(),
            error,
        }
    }
}
