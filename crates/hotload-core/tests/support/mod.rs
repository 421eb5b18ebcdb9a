//! Shared fixtures for deploy pipeline tests.

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hotload_core::config::DeployConfig;
use hotload_core::deploy::Deployer;
use hotload_core::runtime::InMemoryRuntime;
use tempfile::TempDir;

pub const LOCAL_NODE: &str = "shop@build";
pub const REMOTE_NODE: &str = "shop@web-01";

pub struct Harness {
    pub temp: TempDir,
    pub runtime: Arc<InMemoryRuntime>,
    pub deployer: Deployer,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    pub fn with_config(adjust: impl FnOnce(DeployConfig) -> DeployConfig) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let config = DeployConfig::local(LOCAL_NODE, temp.path().join("staging/local"))
            .with_target(REMOTE_NODE, temp.path().join("staging/remote"));
        let config = adjust(config);
        let runtime = Arc::new(InMemoryRuntime::new());
        let deployer =
            Deployer::from_config(&config, runtime.clone()).expect("Failed to build deployer");
        Self {
            temp,
            runtime,
            deployer,
        }
    }

    pub fn build_dir(&self) -> PathBuf {
        let dir = self.temp.path().join("build");
        std::fs::create_dir_all(&dir).expect("Failed to create build dir");
        dir
    }

    pub fn local_staging(&self) -> PathBuf {
        self.temp.path().join("staging/local")
    }

    pub fn write_module(&self, name: &str) -> PathBuf {
        let path = self.build_dir().join(format!("{}.beam", name));
        std::fs::write(&path, format!("FOR1 {}", name)).expect("Failed to write module");
        path
    }

    /// Write a `.tar.gz` package declaring `apps`, one code dir per app.
    pub fn write_package(&self, file_name: &str, apps: &[&str]) -> PathBuf {
        let path = self.build_dir().join(file_name);
        write_release_tar_gz(&path, apps);
        path
    }

    /// Same as [`Harness::write_package`], with code dirs under `lib/{app}-{version}`.
    pub fn write_package_version(&self, file_name: &str, apps: &[&str], version: &str) -> PathBuf {
        let path = self.build_dir().join(file_name);
        write_release_tar_gz_version(&path, apps, version);
        path
    }
}

pub fn manifest_json(apps: &[&str]) -> String {
    manifest_json_version(apps, "1.0.0")
}

pub fn manifest_json_version(apps: &[&str], version: &str) -> String {
    let config: serde_json::Map<String, serde_json::Value> = apps
        .iter()
        .map(|app| (app.to_string(), serde_json::json!({ "enabled": true })))
        .collect();
    serde_json::json!({
        "name": "shop",
        "version": version,
        "applications": apps,
        "config": config,
    })
    .to_string()
}

pub fn write_release_tar_gz(path: &Path, apps: &[&str]) {
    write_release_tar_gz_version(path, apps, "1.0.0");
}

pub fn write_release_tar_gz_version(path: &Path, apps: &[&str], version: &str) {
    let file = File::create(path).expect("Failed to create archive");
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let manifest = manifest_json_version(apps, version);
    append(&mut builder, "manifest.json", manifest.as_bytes());
    for app in apps {
        let module = format!("lib/{app}-{version}/ebin/{app}.beam");
        append(&mut builder, &module, b"FOR1");
        let app_file = format!("lib/{app}-{version}/ebin/{app}.app");
        append(&mut builder, &app_file, b"{application, x, []}.");
    }

    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .expect("Failed to finish archive");
}

fn append<W: std::io::Write>(builder: &mut tar::Builder<W>, name: &str, data: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, name, data)
        .expect("Failed to append entry");
}
