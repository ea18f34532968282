//! Test helpers shared by the CLI unit and behaviour tests.

use super::*;
use crate::plan::{PlanConfig, RoutingBackend, RoutingSources};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::TimeZone;
use haulplan_core::test_support::{RoadNetwork, StubGeocodeSource, StubMatrixSource};
use std::sync::Arc;
use tempfile::TempDir;

/// Write `contents` to `path`, creating the file.
pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write test file");
}

/// A temporary directory addressed by UTF-8 paths.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }
}

/// Routing backend answering from the HUB/A/B/C sample network.
pub(super) struct SampleBackend {
    pub(super) network: Arc<RoadNetwork>,
}

impl SampleBackend {
    pub(super) fn new() -> Self {
        Self {
            network: Arc::new(RoadNetwork::sample()),
        }
    }
}

impl RoutingBackend for SampleBackend {
    fn build(&self, _config: &PlanConfig) -> Result<RoutingSources, CliError> {
        Ok(RoutingSources {
            geocoder: Arc::new(StubGeocodeSource::new(Arc::clone(&self.network))),
            matrix: Arc::new(StubMatrixSource::new(Arc::clone(&self.network))),
        })
    }
}

/// A complete `plan` configuration for `database`.
pub(super) fn plan_config(database: Utf8PathBuf) -> PlanConfig {
    PlanConfig {
        database,
        hub: "HUB".to_owned(),
        truck_count: 1,
        truck_capacity: 10,
        depart_at: chrono::Utc
            .with_ymd_and_hms(2026, 3, 2, 8, 0, 0)
            .single()
            .expect("valid timestamp"),
        return_to_start: false,
        ors_api_key: "test-key".to_owned(),
        ors_base_url: "http://127.0.0.1:9".to_owned(),
    }
}
