//! Top-consumer sampling through the `ps` listing utility.
//!
//! `ps` is invoked twice, sorted by CPU share and by resident memory share;
//! its output is already descending, so the parser keeps utility order and
//! truncates.

use tokio::process::Command;

/// How many consumers to keep per metric.
pub const TOP_N: usize = 3;

/// One process row: name plus its percentage share.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TopProcess {
    pub name: String,
    pub percent: f64,
}

/// Top consumers for both metrics, captured in one sampling pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopSample {
    pub by_cpu: Vec<TopProcess>,
    pub by_memory: Vec<TopProcess>,
}

async fn run_ps(column: &str, sort_flag: &str) -> Option<String> {
    let output = Command::new("/bin/ps")
        .args(["-Aceo", column, sort_flag])
        .output()
        .await;
    match output {
        Ok(out) if out.status.success() => Some(String::from_utf8_lossy(&out.stdout).into_owned()),
        Ok(out) => {
            log::debug!("ps exited with {}", out.status);
            None
        }
        Err(e) => {
            log::debug!("ps unavailable: {}", e);
            None
        }
    }
}

/// Sample both top-consumer lists. Either list degrades to empty when the
/// listing utility fails; the sample itself is always returned.
pub async fn sample() -> TopSample {
    let by_cpu = match run_ps("pcpu,comm", "-r").await {
        Some(out) => parse(&out, TOP_N),
        None => Vec::new(),
    };
    let by_memory = match run_ps("pmem,comm", "-m").await {
        Some(out) => parse(&out, TOP_N),
        None => Vec::new(),
    };
    TopSample { by_cpu, by_memory }
}

/// Parse listing output: a leading floating-point token, then the process
/// name. Header rows whose first token is not a float are silently skipped;
/// rows stay in the order the utility produced them.
pub fn parse(output: &str, limit: usize) -> Vec<TopProcess> {
    let mut rows = Vec::new();
    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (value, name) = match trimmed.split_once(char::is_whitespace) {
            Some((v, n)) => (v, n.trim()),
            None => continue,
        };
        let percent: f64 = match value.parse() {
            Ok(p) => p,
            Err(_) => continue,
        };
        if name.is_empty() {
            continue;
        }
        rows.push(TopProcess {
            name: name.to_string(),
            percent,
        });
        if rows.len() == limit {
            break;
        }
    }
    rows
}
