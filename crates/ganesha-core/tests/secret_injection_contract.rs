//! Contract Test: Credential Injection
//!
//! Constraints verified:
//! - CEPH FSALs get the host's `ganesha.<short host>` user and its secret
//! - RGW FSALs keep given keys and fetch only the missing ones
//! - Each host with an RGW export gets exactly one RGW backend block
//! - The first failure aborts the call
//! - Export views read back from a rendered config carry no credentials
//!
//! If this test fails, daemons may start with missing or leaked keys.

mod common;

use common::*;
use ganesha_core::conf::Attributes;
use ganesha_core::{
    ExportSpec, HostExportSet, SecretError, Value, host_exports_from_config, inject_secrets,
    render_host_configs,
};

fn view(json: &str) -> Vec<HostExportSet> {
    serde_json::from_str(json).unwrap()
}

fn fsal_attrs(spec: &[(&str, &str)]) -> Option<Attributes> {
    Some(spec.iter().copied().collect())
}

#[tokio::test]
async fn ceph_export_gets_host_credentials() {
    let hosts = view(
        r#"[{"host": "data1", "exports": [
            {"export_id": 1, "path": "/", "pseudo": "/cephfs", "fsal": {"name": "CEPH"}}
        ]}]"#,
    );
    let credentials = FixedCredentials::new().with_keyring("client.ganesha.data1", "AQBsecret==");

    let configs = inject_secrets(hosts, &credentials).await.unwrap();
    let fsal = configs[0].blocks[0].fsal().unwrap();
    assert_eq!(fsal.get("user_id"), Some(&Value::from("ganesha.data1")));
    assert_eq!(fsal.get("secret_access_key"), Some(&Value::from("AQBsecret==")));
    assert_eq!(credentials.lookup_count(), 1);
}

#[tokio::test]
async fn ceph_user_follows_short_hostname() {
    let export = ExportSpec {
        fsal: fsal_attrs(&[("name", "CEPH"), ("user_id", "someone.else")]),
        ..Default::default()
    };
    let credentials = FixedCredentials::new().with_keyring("client.ganesha.node3", "AQB3==");

    let configs = inject_secrets(
        vec![HostExportSet::new("node3.example.com", vec![export])],
        &credentials,
    )
    .await
    .unwrap();
    let fsal = configs[0].blocks[0].fsal().unwrap();
    assert_eq!(fsal.get("user_id"), Some(&Value::from("ganesha.node3")));
}

#[tokio::test]
async fn rgw_keys_fetched_only_when_missing() {
    let partial = ExportSpec {
        fsal: fsal_attrs(&[("name", "RGW"), ("user_id", "admin"), ("access_key_id", "GIVEN")]),
        ..Default::default()
    };
    let credentials = FixedCredentials::new().with_rgw_user("admin", "AK", "SK");

    let configs = inject_secrets(vec![HostExportSet::new("gw1", vec![partial])], &credentials)
        .await
        .unwrap();
    let blocks = &configs[0].blocks;
    let fsal = blocks[0].fsal().unwrap();
    assert_eq!(fsal.get("access_key_id"), Some(&Value::from("GIVEN")));
    assert_eq!(fsal.get("secret_access_key"), Some(&Value::from("SK")));
    assert_eq!(credentials.lookup_count(), 1);

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].name, "RGW");
    assert_eq!(blocks[1].get("ceph_conf"), Some(&Value::from("/etc/ceph/ceph.conf")));
    assert_eq!(blocks[1].get("name"), Some(&Value::from("client.ganesha.gw1")));
    assert_eq!(blocks[1].get("cluster"), Some(&Value::from("ceph")));
}

#[tokio::test]
async fn unknown_rgw_user_fails() {
    let export = ExportSpec {
        fsal: fsal_attrs(&[("name", "RGW"), ("user_id", "ghost")]),
        ..Default::default()
    };
    let err = inject_secrets(vec![HostExportSet::new("gw1", vec![export])], &FixedCredentials::new())
        .await
        .unwrap_err();
    assert_eq!(err, SecretError::UnknownUser("ghost".to_string()));
}

#[tokio::test]
async fn first_failure_short_circuits() {
    let hosts = view(
        r#"[
            {"host": "data1", "exports": [{"export_id": 1, "path": "/"}]},
            {"host": "data2", "exports": [{"export_id": 1, "path": "/", "fsal": {"name": "CEPH"}}]}
        ]"#,
    );
    let credentials = FixedCredentials::new().with_keyring("client.ganesha.data2", "AQB2==");

    let err = inject_secrets(hosts, &credentials).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Bad format: export \"fsal\" is missing"
    );
    assert_eq!(credentials.lookup_count(), 0);
}

#[tokio::test]
async fn rendered_config_reads_back_without_credentials() {
    let hosts = view(
        r#"[{"host": "data1.ceph", "exports": [
            {"export_id": 1, "path": "/", "pseudo": "/cephfs", "fsal": {"name": "CEPH"},
             "client_blocks": [{"clients": "10.0.0.0/24", "access_type": "RW"}]},
            {"export_id": 2, "path": "/", "pseudo": "/rgw",
             "fsal": {"name": "RGW", "user_id": "admin"}}
        ]}]"#,
    );
    let credentials = FixedCredentials::new()
        .with_keyring("client.ganesha.data1", "AQB1==")
        .with_rgw_user("admin", "AK", "SK");

    let rendered = render_host_configs(hosts.clone(), &credentials).await.unwrap();
    assert_eq!(rendered.len(), 1);
    let (host, text) = &rendered[0];
    assert_eq!(host, "data1.ceph");
    assert!(text.contains("clients = 10.0.0.0/24;"));
    assert!(text.contains("secret_access_key = \"SK\";"));

    let read_back = host_exports_from_config(host.clone(), Some(text.as_str())).unwrap();
    assert_eq!(read_back, hosts[0]);
}
