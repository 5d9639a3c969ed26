//! Network reachability classification
//!
//! One pass of ping, DNS lookup and traceroute against the endpoint and a
//! reference host. All tool output goes to the run log; only the two ping
//! results decide the [`NetStatus`].

use crate::dns::DnsManager;
use crate::logging::{LogLevel, RunLog};
use crate::types::NetStatus;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;

/// Network probe kinds, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProbeKind {
    Ping,
    DnsLookup,
    Traceroute,
}

impl ProbeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProbeKind::Ping => "ping",
            ProbeKind::DnsLookup => "dns lookup",
            ProbeKind::Traceroute => "traceroute",
        }
    }
}

/// Output of one probe against one host
#[derive(Debug, Clone, Serialize)]
pub struct ProbeOutput {
    pub kind: ProbeKind,
    pub host: String,
    pub success: bool,
    pub output: String,
    pub elapsed_ms: u64,
}

impl ProbeOutput {
    pub fn new<H: Into<String>, O: Into<String>>(
        kind: ProbeKind,
        host: H,
        success: bool,
        output: O,
    ) -> Self {
        Self {
            kind,
            host: host.into(),
            success,
            output: output.into(),
            elapsed_ms: 0,
        }
    }

    fn title(&self) -> String {
        format!(
            "{} {} ({}, {} ms)",
            self.kind.name(),
            self.host,
            if self.success { "ok" } else { "failed" },
            self.elapsed_ms
        )
    }
}

/// Runs the individual network probes
#[async_trait]
pub trait ProbeRunner: Send + Sync {
    async fn ping(&self, host: &str) -> ProbeOutput;
    async fn dns_lookup(&self, host: &str) -> ProbeOutput;
    async fn traceroute(&self, host: &str) -> ProbeOutput;
}

/// Probes through the platform's own tools and the system resolver
#[derive(Default)]
pub struct SystemProbeRunner {
    dns: DnsManager,
}

impl SystemProbeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(windows)]
    fn ping_command(host: &str) -> (&'static str, Vec<String>) {
        ("ping", vec!["-n".into(), "4".into(), host.into()])
    }

    #[cfg(target_os = "macos")]
    fn ping_command(host: &str) -> (&'static str, Vec<String>) {
        ("ping", vec!["-c".into(), "4".into(), "-t".into(), "10".into(), host.into()])
    }

    #[cfg(not(any(windows, target_os = "macos")))]
    fn ping_command(host: &str) -> (&'static str, Vec<String>) {
        ("ping", vec!["-c".into(), "4".into(), "-W".into(), "2".into(), host.into()])
    }

    #[cfg(windows)]
    fn traceroute_command(host: &str) -> (&'static str, Vec<String>) {
        ("tracert", vec!["-d".into(), "-h".into(), "20".into(), host.into()])
    }

    #[cfg(not(windows))]
    fn traceroute_command(host: &str) -> (&'static str, Vec<String>) {
        (
            "traceroute",
            vec!["-n".into(), "-m".into(), "20".into(), "-w".into(), "2".into(), host.into()],
        )
    }

    /// Windows ping exits 0 on "Destination host unreachable"
    #[cfg(windows)]
    fn ping_succeeded(status_ok: bool, output: &str) -> bool {
        status_ok && output.contains("TTL=")
    }

    #[cfg(not(windows))]
    fn ping_succeeded(status_ok: bool, _output: &str) -> bool {
        status_ok
    }

    async fn run_tool(kind: ProbeKind, host: &str, program: &str, args: &[String]) -> ProbeOutput {
        let start = Instant::now();
        let mut probe = match Command::new(program).args(args).output().await {
            Ok(output) => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr);
                if !stderr.trim().is_empty() {
                    text.push_str(&stderr);
                }
                let status_ok = output.status.success();
                let success = match kind {
                    ProbeKind::Ping => Self::ping_succeeded(status_ok, &text),
                    _ => status_ok,
                };
                let transcript = format!("$ {} {}\n{}", program, args.join(" "), text);
                ProbeOutput::new(kind, host, success, transcript)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ProbeOutput::new(
                kind,
                host,
                false,
                format!(
                    "`{}` is not available on this system; install it to get {} output",
                    program,
                    kind.name()
                ),
            ),
            Err(e) => {
                ProbeOutput::new(kind, host, false, format!("failed to run `{}`: {}", program, e))
            }
        };
        probe.elapsed_ms = start.elapsed().as_millis() as u64;
        probe
    }
}

#[async_trait]
impl ProbeRunner for SystemProbeRunner {
    async fn ping(&self, host: &str) -> ProbeOutput {
        let (program, args) = Self::ping_command(host);
        Self::run_tool(ProbeKind::Ping, host, program, &args).await
    }

    async fn dns_lookup(&self, host: &str) -> ProbeOutput {
        let lookup = self.dns.lookup(host).await;
        let mut probe =
            ProbeOutput::new(ProbeKind::DnsLookup, host, lookup.success(), lookup.render());
        probe.elapsed_ms = lookup.duration.as_millis() as u64;
        probe
    }

    async fn traceroute(&self, host: &str) -> ProbeOutput {
        let (program, args) = Self::traceroute_command(host);
        Self::run_tool(ProbeKind::Traceroute, host, program, &args).await
    }
}

/// Everything the classification stage produced
#[derive(Debug, Clone, Serialize)]
pub struct NetworkReport {
    pub status: NetStatus,
    pub probes: Vec<ProbeOutput>,
}

impl NetworkReport {
    pub fn probe(&self, kind: ProbeKind, host: &str) -> Option<&ProbeOutput> {
        self.probes.iter().find(|p| p.kind == kind && p.host == host)
    }
}

/// Reachability classifier
pub struct NetworkDiagnostics {
    runner: Arc<dyn ProbeRunner>,
    reference_host: String,
}

impl NetworkDiagnostics {
    pub fn new<S: Into<String>>(runner: Arc<dyn ProbeRunner>, reference_host: S) -> Self {
        Self {
            runner,
            reference_host: reference_host.into(),
        }
    }

    pub fn reference_host(&self) -> &str {
        &self.reference_host
    }

    /// Run every probe against `endpoint_host` and the reference host
    pub async fn classify(&self, endpoint_host: &str, log: &RunLog) -> NetworkReport {
        let hosts = [endpoint_host, self.reference_host.as_str()];
        let mut probes = Vec::with_capacity(6);

        for kind in [ProbeKind::Ping, ProbeKind::DnsLookup, ProbeKind::Traceroute] {
            for host in hosts {
                let probe = match kind {
                    ProbeKind::Ping => self.runner.ping(host).await,
                    ProbeKind::DnsLookup => self.runner.dns_lookup(host).await,
                    ProbeKind::Traceroute => self.runner.traceroute(host).await,
                };
                log.block(LogLevel::Info, &probe.title(), &probe.output).await;
                probes.push(probe);
            }
        }

        let ping_ok = |host: &str| {
            probes
                .iter()
                .any(|p| p.kind == ProbeKind::Ping && p.host == host && p.success)
        };
        let status = NetStatus::classify(ping_ok(endpoint_host), ping_ok(&self.reference_host));

        log.info("network classified")
            .field("endpoint", endpoint_host)
            .field("reference_host", &self.reference_host)
            .field("status", status)
            .log()
            .await;

        NetworkReport { status, probes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProbeConfig;
    use proptest::prelude::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct ScriptedRunner {
        endpoint_ping: bool,
        reference_ping: bool,
        reference: String,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(endpoint_ping: bool, reference_ping: bool) -> Self {
            Self {
                endpoint_ping,
                reference_ping,
                reference: "ref.example".to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, kind: ProbeKind, host: &str) {
            self.calls.lock().unwrap().push(format!("{} {}", kind.name(), host));
        }
    }

    #[async_trait]
    impl ProbeRunner for ScriptedRunner {
        async fn ping(&self, host: &str) -> ProbeOutput {
            self.record(ProbeKind::Ping, host);
            let ok = if host == self.reference { self.reference_ping } else { self.endpoint_ping };
            ProbeOutput::new(ProbeKind::Ping, host, ok, format!("ping output for {}", host))
        }

        async fn dns_lookup(&self, host: &str) -> ProbeOutput {
            self.record(ProbeKind::DnsLookup, host);
            // DNS and traceroute never influence the status
            ProbeOutput::new(ProbeKind::DnsLookup, host, false, format!("dns output for {}", host))
        }

        async fn traceroute(&self, host: &str) -> ProbeOutput {
            self.record(ProbeKind::Traceroute, host);
            let output = format!("trace output for {}", host);
            ProbeOutput::new(ProbeKind::Traceroute, host, false, output)
        }
    }

    async fn classify(endpoint_ping: bool, reference_ping: bool) -> NetStatus {
        let runner = Arc::new(ScriptedRunner::new(endpoint_ping, reference_ping));
        let diagnostics = NetworkDiagnostics::new(runner, "ref.example");
        let log = RunLog::terminal_only(&ProbeConfig::default());
        diagnostics.classify("bj.bcebos.com", &log).await.status
    }

    #[tokio::test]
    async fn test_reachable() {
        assert_eq!(classify(true, false).await, NetStatus::Reachable);
    }

    #[tokio::test]
    async fn test_endpoint_unreachable() {
        assert_eq!(classify(false, true).await, NetStatus::EndpointUnreachable);
    }

    #[tokio::test]
    async fn test_client_offline() {
        assert_eq!(classify(false, false).await, NetStatus::ClientOffline);
    }

    #[tokio::test]
    async fn test_probe_order_and_log_output() {
        let runner = Arc::new(ScriptedRunner::new(true, true));
        let diagnostics = NetworkDiagnostics::new(runner.clone(), "ref.example");
        let dir = TempDir::new().unwrap();
        let log = RunLog::create(dir.path(), &ProbeConfig::default());

        let report = diagnostics.classify("bj.bcebos.com", &log).await;

        let calls = runner.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "ping bj.bcebos.com",
                "ping ref.example",
                "dns lookup bj.bcebos.com",
                "dns lookup ref.example",
                "traceroute bj.bcebos.com",
                "traceroute ref.example",
            ]
        );
        assert_eq!(report.probes.len(), 6);
        assert!(report.probe(ProbeKind::Traceroute, "ref.example").is_some());

        let text = std::fs::read_to_string(log.path().unwrap()).unwrap();
        assert!(text.contains("ping output for bj.bcebos.com"));
        assert!(text.contains("dns output for ref.example"));
        assert!(text.contains("trace output for bj.bcebos.com"));
    }

    #[tokio::test]
    async fn test_missing_tool_is_a_failed_probe() {
        let probe = SystemProbeRunner::run_tool(
            ProbeKind::Traceroute,
            "bj.bcebos.com",
            "bosprobe-no-such-tool",
            &[],
        )
        .await;
        assert!(!probe.success);
        assert!(probe.output.contains("not available"));
    }

    proptest! {
        #[test]
        fn classification_depends_only_on_ping(endpoint_ping: bool, reference_ping: bool) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let status = rt.block_on(classify(endpoint_ping, reference_ping));
            prop_assert_eq!(status, NetStatus::classify(endpoint_ping, reference_ping));
        }
    }
}
