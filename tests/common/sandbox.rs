//! Isolated environment for running the `costcalc` binary.

use std::path::PathBuf;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Environment variables the binary reads; cleared so the host cannot leak in.
const INHERITED_VARS: &[&str] = &[
    "COSTCALC_FORMAT",
    "COSTCALC_PRETTY",
    "COSTCALC_NO_COLOR",
    "COSTCALC_LOG",
    "COSTCALC_LOG_FORMAT",
    "COSTCALC_LOG_FILE",
    "RUST_LOG",
];

/// A temp directory holding the ledger, result cache and (absent) config file.
pub struct Sandbox {
    dir: TempDir,
    cache_dir: Option<PathBuf>,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create sandbox dir"),
            cache_dir: None,
        }
    }

    /// Point the result cache at `dir` instead of this sandbox's own.
    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = Some(dir);
        self
    }

    pub fn database(&self) -> PathBuf {
        self.dir.path().join("ledger.sqlite")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.dir.path().join("cache"))
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    /// Write a config file that the next runs will pick up.
    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.config_file(), contents).expect("write config");
    }

    /// A `costcalc` command bound to this sandbox.
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("costcalc").expect("costcalc binary");
        for var in INHERITED_VARS {
            cmd.env_remove(var);
        }
        cmd.env("COSTCALC_DB", self.database())
            .env("COSTCALC_CACHE_DIR", self.cache_dir())
            .env("COSTCALC_CONFIG", self.config_file())
            .env("NO_COLOR", "1");
        cmd
    }

    /// Run with `--json` and return the envelope's `data`.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .output()
            .expect("run costcalc");
        assert!(
            output.status.success(),
            "costcalc {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let envelope: Value =
            serde_json::from_slice(&output.stdout).expect("stdout is a JSON envelope");
        assert_eq!(envelope["success"], Value::Bool(true));
        envelope["data"].clone()
    }

    /// Record a monthly cost item and return its id.
    pub fn add_item(&self, name: &str, price: &str, extra: &[&str]) -> i64 {
        let mut args = vec!["item", "add", name, "--price", price];
        args.extend_from_slice(extra);
        self.json(&args)["id"].as_i64().expect("item id")
    }

    /// Create a product and return its id.
    pub fn add_product(&self, name: &str, model: &str) -> i64 {
        self.json(&["product", "add", name, "--model", model])["id"]
            .as_i64()
            .expect("product id")
    }

    /// Allocate an item to a product and return the allocation id.
    pub fn allocate(&self, product: i64, item: i64, kind: &str, value: &str) -> i64 {
        let product = product.to_string();
        let item = item.to_string();
        self.json(&[
            "allocation",
            "add",
            "--product",
            &product,
            "--item",
            &item,
            "--type",
            kind,
            "--value",
            value,
        ])["id"]
            .as_i64()
            .expect("allocation id")
    }
}
