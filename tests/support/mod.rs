// ABOUTME: Test support utilities.
// ABOUTME: In-memory runtime, probe and reloader fakes plus a temp-dir layout for integration tests.

use async_trait::async_trait;
use cutover::config::Settings;
use cutover::probe::{Probe, ProbeError};
use cutover::proxy::{ProxyError, Reloader};
use cutover::runtime::{
    ContainerError, ContainerFilters, ContainerOps, ContainerRecord, ContainerSpec,
    ContainerSummary, ROLE_LABEL, ROLE_RELEASE, TAG_LABEL,
};
use cutover::types::ContainerId;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("cutover=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Settings whose every path lives under `dir`, with a short probe window.
#[allow(dead_code)]
pub fn settings_in(dir: &Path) -> Settings {
    let mut settings = Settings::default();
    let layout = &mut settings.layout;
    layout.nginx_conf_dir = dir.join("server");
    layout.nginx_pid_file = dir.join("nginx.pid");
    layout.tag_file = dir.join("state/production-tag");
    layout.env_file = dir.join("rell.env");
    layout.lock_file = dir.join("state/deploy.lock");
    layout.probe_timeout = Duration::from_millis(200);
    layout.probe_interval = Duration::from_millis(5);
    layout.stop_timeout = Duration::from_secs(1);
    std::fs::create_dir_all(&layout.nginx_conf_dir).unwrap();
    std::fs::write(&layout.env_file, "APP_ENV=production\n\n  SECRET=abc  \n").unwrap();
    settings
}

/// One runtime call, named by the container it concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Inspect(String),
    Create(String),
    Start(String),
    Stop(String),
    Remove(String),
    List,
}

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub running: bool,
    pub ip: Option<IpAddr>,
    pub labels: HashMap<String, String>,
    pub spec: Option<ContainerSpec>,
}

impl FakeContainer {
    fn record(&self) -> ContainerRecord {
        ContainerRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
            running: self.running,
            ip_address: self.ip,
            labels: self.labels.clone(),
        }
    }

    fn summary(&self) -> ContainerSummary {
        ContainerSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
            state: if self.running { "running" } else { "exited" }.to_string(),
            labels: self.labels.clone(),
        }
    }
}

#[derive(Default)]
struct FakeState {
    containers: Vec<FakeContainer>,
    calls: Vec<Call>,
    next: u8,
    fail_create: HashSet<String>,
    fail_stop: HashSet<String>,
    fail_remove: HashSet<String>,
    fail_list: bool,
}

impl FakeState {
    fn allocate(&mut self) -> (ContainerId, IpAddr) {
        self.next += 1;
        (
            ContainerId::new(format!("fake{:04}", self.next)),
            IpAddr::V4(Ipv4Addr::new(172, 17, 0, self.next + 1)),
        )
    }

    fn find(&self, name_or_id: &str) -> Option<usize> {
        self.containers
            .iter()
            .position(|c| c.name == name_or_id || c.id.as_str() == name_or_id)
    }

    fn name_of(&self, id: &ContainerId) -> String {
        self.find(id.as_str())
            .map(|i| self.containers[i].name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

/// In-memory container runtime that records every call.
#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<FakeState>,
}

#[allow(dead_code)]
impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing container.
    pub fn with_container(self, name: &str, image: &str, running: bool, labels: &[(&str, &str)]) -> Self {
        {
            let mut state = self.state.lock();
            let (id, ip) = state.allocate();
            state.containers.push(FakeContainer {
                id,
                name: name.to_string(),
                image: image.to_string(),
                running,
                ip: running.then_some(ip),
                labels: labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                spec: None,
            });
        }
        self
    }

    /// Add a running, labelled release container for `tag`.
    pub fn with_release(self, tag: &str) -> Self {
        self.with_container(
            &format!("rell-{tag}"),
            &format!("daaku/rell:{tag}"),
            true,
            &[(ROLE_LABEL, ROLE_RELEASE), (TAG_LABEL, tag)],
        )
    }

    pub fn fail_create(&self, name: &str) {
        self.state.lock().fail_create.insert(name.to_string());
    }

    pub fn fail_stop(&self, name: &str) {
        self.state.lock().fail_stop.insert(name.to_string());
    }

    pub fn fail_remove(&self, name: &str) {
        self.state.lock().fail_remove.insert(name.to_string());
    }

    pub fn fail_list(&self) {
        self.state.lock().fail_list = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Calls matching `pred`, in order.
    pub fn calls_where(&self, pred: impl Fn(&Call) -> bool) -> Vec<Call> {
        self.calls().into_iter().filter(|c| pred(c)).collect()
    }

    pub fn container(&self, name: &str) -> Option<FakeContainer> {
        let state = self.state.lock();
        state.find(name).map(|i| state.containers[i].clone())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .state
            .lock()
            .containers
            .iter()
            .map(|c| c.name.clone())
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn inspect_container(&self, name_or_id: &str) -> Result<ContainerRecord, ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Inspect(name_or_id.to_string()));
        state
            .find(name_or_id)
            .map(|i| state.containers[i].record())
            .ok_or_else(|| ContainerError::NotFound(name_or_id.to_string()))
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Create(spec.name.clone()));
        if state.fail_create.contains(&spec.name) {
            return Err(ContainerError::ImageNotFound(spec.image.clone()));
        }
        if state.find(&spec.name).is_some() {
            return Err(ContainerError::AlreadyExists(spec.name.clone()));
        }
        let (id, ip) = state.allocate();
        state.containers.push(FakeContainer {
            id: id.clone(),
            name: spec.name.clone(),
            image: spec.image.clone(),
            running: false,
            ip: Some(ip),
            labels: spec.labels.clone(),
            spec: Some(spec.clone()),
        });
        Ok(id)
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        let name = state.name_of(id);
        state.calls.push(Call::Start(name));
        let i = state
            .find(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        state.containers[i].running = true;
        Ok(())
    }

    async fn stop_container(&self, id: &ContainerId, _timeout: Duration) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        let name = state.name_of(id);
        state.calls.push(Call::Stop(name.clone()));
        if state.fail_stop.contains(&name) {
            return Err(ContainerError::Runtime(format!("cannot stop {name}")));
        }
        let i = state
            .find(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        state.containers[i].running = false;
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        let name = state.name_of(id);
        state.calls.push(Call::Remove(name.clone()));
        if state.fail_remove.contains(&name) {
            return Err(ContainerError::Runtime(format!("cannot remove {name}")));
        }
        let i = state
            .find(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        state.containers.remove(i);
        Ok(())
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::List);
        if state.fail_list {
            return Err(ContainerError::Runtime("list failed".to_string()));
        }
        Ok(state
            .containers
            .iter()
            .filter(|c| filters.all || c.running)
            .filter(|c| {
                filters
                    .labels
                    .iter()
                    .all(|(k, v)| c.labels.get(k) == Some(v))
            })
            .map(FakeContainer::summary)
            .collect())
    }
}

/// Probe that fails a fixed number of times, then succeeds. `None` never succeeds.
pub struct FakeProbe {
    ready_after: Option<u32>,
    delay: Duration,
    attempts: AtomicU32,
    addresses: Mutex<Vec<SocketAddr>>,
}

#[allow(dead_code)]
impl FakeProbe {
    pub fn ready() -> Self {
        Self::ready_after(0)
    }

    pub fn ready_after(failures: u32) -> Self {
        Self {
            ready_after: Some(failures),
            delay: Duration::ZERO,
            attempts: AtomicU32::new(0),
            addresses: Mutex::new(Vec::new()),
        }
    }

    pub fn never() -> Self {
        Self {
            ready_after: None,
            delay: Duration::ZERO,
            attempts: AtomicU32::new(0),
            addresses: Mutex::new(Vec::new()),
        }
    }

    /// Make every attempt wait `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn addresses(&self) -> Vec<SocketAddr> {
        self.addresses.lock().clone()
    }
}

#[async_trait]
impl Probe for FakeProbe {
    async fn probe(&self, address: SocketAddr) -> Result<(), ProbeError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        self.addresses.lock().push(address);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.ready_after {
            Some(failures) if attempt >= failures => Ok(()),
            _ => Err(ProbeError::Connect {
                address,
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            }),
        }
    }
}

/// Reloader that counts calls and can be told to fail.
#[derive(Default)]
pub struct FakeReloader {
    reloads: AtomicU32,
    fail: bool,
}

#[allow(dead_code)]
impl FakeReloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            reloads: AtomicU32::new(0),
            fail: true,
        }
    }

    pub fn reloads(&self) -> u32 {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reloader for FakeReloader {
    async fn reload(&self) -> Result<(), ProxyError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProxyError::ParsePid {
                path: "/run/nginx.pid".into(),
                contents: String::new(),
            });
        }
        Ok(())
    }
}
