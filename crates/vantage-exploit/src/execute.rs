//! Exploit execution placeholder.
//!
//! No module is actually launched. A request for a known module is
//! accepted and echoed back as an [`ExploitRun`] so the surrounding
//! workflow can be exercised end to end.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::source::ModuleSource;
use crate::types::ExploitRun;

/// Accept an execution request for `module` against `target`.
///
/// Fails with `ModuleNotFound` when the source does not know the module.
pub fn execute(
    source: &dyn ModuleSource,
    module: &str,
    target: &str,
    options: &BTreeMap<String, String>,
) -> Result<ExploitRun> {
    source.lookup(module)?;

    let rendered: Vec<String> = options.iter().map(|(k, v)| format!("{k}={v}")).collect();
    let output = if rendered.is_empty() {
        format!("Module {module} accepted for {target}")
    } else {
        format!(
            "Module {module} accepted for {target} with {}",
            rendered.join(" ")
        )
    };

    tracing::warn!(
        module = %module,
        target = %target,
        "Execution is simulated; no payload was sent"
    );

    Ok(ExploitRun {
        id: Uuid::new_v4(),
        timestamp: Utc::now(),
        module: module.to_string(),
        target: target.to_string(),
        success: true,
        output,
    })
}
