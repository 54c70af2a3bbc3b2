// ABOUTME: Integration tests for nginx config synthesis.
// ABOUTME: Writes upstream and production configs into a temp conf dir and checks their contents.

mod support;

use cutover::proxy::{ConfigSynthesizer, ProxyError};
use cutover::runtime::ContainerRecord;
use cutover::types::{ContainerId, ReleaseTag};
use std::collections::HashMap;
use std::fs;
use std::net::{IpAddr, Ipv4Addr};

fn record(name: &str, ip: Option<IpAddr>) -> ContainerRecord {
    ContainerRecord {
        id: ContainerId::new("abc"),
        name: name.to_string(),
        image: "daaku/rell:v42".to_string(),
        running: true,
        ip_address: ip,
        labels: HashMap::new(),
    }
}

#[test]
fn upstream_config_is_named_after_container() {
    let dir = tempfile::tempdir().unwrap();
    let settings = support::settings_in(dir.path());
    let synth = ConfigSynthesizer::new(&settings);
    let tag = ReleaseTag::new("v42").unwrap();
    let ip = IpAddr::V4(Ipv4Addr::new(172, 17, 0, 9));

    let path = synth
        .write_upstream_config(&tag, &record("rell-v42", Some(ip)))
        .unwrap();

    assert_eq!(path, settings.layout.nginx_conf_dir.join("rell-v42.conf"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("upstream rell-v42 {\n  server               172.17.0.9:43600;\n}"));
    assert!(text.contains("server_name          v42.minetti.fbrell.com;"));
    assert!(text.contains("proxy_pass         http://rell-v42;"));
    assert!(text.contains("ssl_certificate      /etc/nginx/cert/star-minetti-cert.pem;"));
    assert!(text.ends_with("}\n"));
}

#[test]
fn production_config_points_at_release_backend() {
    let dir = tempfile::tempdir().unwrap();
    let settings = support::settings_in(dir.path());
    let synth = ConfigSynthesizer::new(&settings);

    let path = synth
        .write_production_config(&ReleaseTag::new("v42").unwrap())
        .unwrap();

    assert_eq!(path, settings.layout.nginx_conf_dir.join("rell-prod.conf"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("http://rell-v42;"));
    assert!(text.contains("minetti.fbrell.com"));
    assert!(!text.contains("{{"));
    assert!(text.ends_with("}\n") && !text.ends_with("\n\n"));
}

#[test]
fn rewriting_production_replaces_previous_release() {
    let dir = tempfile::tempdir().unwrap();
    let synth = ConfigSynthesizer::new(&support::settings_in(dir.path()));

    synth
        .write_production_config(&ReleaseTag::new("v41").unwrap())
        .unwrap();
    let path = synth
        .write_production_config(&ReleaseTag::new("v42").unwrap())
        .unwrap();

    let text = fs::read_to_string(path).unwrap();
    assert!(text.contains("rell-v42"));
    assert!(!text.contains("rell-v41"));
}

#[test]
fn container_without_address_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let synth = ConfigSynthesizer::new(&support::settings_in(dir.path()));

    let err = synth
        .write_upstream_config(&ReleaseTag::new("v1").unwrap(), &record("rell-v1", None))
        .unwrap_err();

    assert!(matches!(err, ProxyError::NoAddress { .. }));
    assert!(!synth.upstream_path("rell-v1").exists());
}

#[test]
fn missing_conf_dir_fails_without_creating_it() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = support::settings_in(dir.path());
    settings.layout.nginx_conf_dir = dir.path().join("absent");
    let synth = ConfigSynthesizer::new(&settings);

    let err = synth
        .write_production_config(&ReleaseTag::new("v1").unwrap())
        .unwrap_err();

    assert!(matches!(err, ProxyError::Create { .. }));
    assert!(err.to_string().contains("absent"));
    assert!(!settings.layout.nginx_conf_dir.exists());
}

#[test]
fn removing_absent_upstream_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let synth = ConfigSynthesizer::new(&support::settings_in(dir.path()));

    assert!(!synth.remove_upstream_config("rell-v0").unwrap());

    fs::write(synth.upstream_path("rell-v0"), "x").unwrap();
    assert!(synth.remove_upstream_config("rell-v0").unwrap());
    assert!(!synth.upstream_path("rell-v0").exists());
}
