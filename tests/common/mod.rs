#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const EUR_MASTER: &str = "ITEM NO., PRODUCT ,COLOR,PRICE
65001,Table,White,100
70001,Chair,Black,50
";

pub const APMEA_MASTER: &str = "ITEM NO.,PRODUCT,COLOR
65001,Table,White
70001,Chair,Black
";

pub const GBP_MASTER: &str = "ITEM NO.,PRODUCT,COLOR
65001,Table,White
";

pub const US_MASTER: &str = "PATTERN NO.,PRODUCT,COLOR,LIST PRICE
65002,Table,White,120
80001,Lamp,Grey,30
";

const CONFIG: &str = r#"library: library.csv
regions:
  - code: EUR
    source: eur.csv
  - code: APMEA
    source: apmea.csv
  - code: GBP
    source: gbp.csv
  - code: US
    source: us.csv
"#;

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes the configuration only; master files are up to the test.
    pub fn config(&self) -> PathBuf {
        self.write("lookup.yaml", CONFIG)
    }

    /// Writes the four regional master files and a config pointing at them.
    pub fn with_masters(&self) -> PathBuf {
        self.write("eur.csv", EUR_MASTER);
        self.write("apmea.csv", APMEA_MASTER);
        self.write("gbp.csv", GBP_MASTER);
        self.write("us.csv", US_MASTER);
        self.config()
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).expect("read workspace file")
    }
}

/// Parses CSV text into headers and rows.
pub fn parse_csv(text: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .expect("headers")
        .iter()
        .map(|h| h.to_string())
        .collect();
    let rows = reader
        .records()
        .map(|r| r.expect("record").iter().map(|c| c.to_string()).collect())
        .collect();
    (headers, rows)
}

pub fn column(headers: &[String], name: &str) -> usize {
    headers
        .iter()
        .position(|h| h == name)
        .unwrap_or_else(|| panic!("Column '{name}' not found in {headers:?}"))
}
