//! Text rendering of test verdicts.

use crate::runner::SuiteReport;
use crate::snapshot::{RunResult, Verdict};

/// Width the test name is right-aligned to in summary lines.
pub const NAME_WIDTH: usize = 20;

const DIFF_HEADER: &str = "----------- test reference diff -----------";
const DIFF_FOOTER: &str = "-------------------------------------------";

/// `"<name>: <verdict>"` with the name right-aligned.
pub fn summary_line(result: &RunResult) -> String {
    format!("{:>width$}: {}", result.name, result.verdict, width = NAME_WIDTH)
}

/// The full block printed for one result: the summary line, the framed
/// diff for `Failed`, or the detail for `Timeout` and `BuildFailed`.
pub fn render_result(result: &RunResult) -> String {
    let mut out = summary_line(result);
    out.push('\n');

    match (&result.verdict, &result.diff) {
        (Verdict::Failed, Some(diff)) => {
            out.push('\n');
            out.push_str(DIFF_HEADER);
            out.push('\n');
            out.push_str(&diff.render());
            out.push_str(DIFF_FOOTER);
            out.push_str("\n\n");
        }
        _ => {
            if let Some(detail) = &result.detail {
                out.push_str(&format!("{:>width$}  {detail}\n", "", width = NAME_WIDTH));
            }
        }
    }
    out
}

/// One-line totals, e.g. `5 tests: 3 ok, 1 new, 1 failed`.
pub fn render_totals(report: &SuiteReport) -> String {
    let mut parts = Vec::new();
    for (verdict, word) in [
        (Verdict::Ok, "ok"),
        (Verdict::New, "new"),
        (Verdict::Failed, "failed"),
        (Verdict::Timeout, "timed out"),
        (Verdict::BuildFailed, "build failed"),
    ] {
        let count = report.count(verdict);
        if count > 0 {
            parts.push(format!("{count} {word}"));
        }
    }

    let total = report.results.len();
    let noun = if total == 1 { "test" } else { "tests" };
    if parts.is_empty() {
        format!("{total} {noun}")
    } else {
        format!("{total} {noun}: {}", parts.join(", "))
    }
}
