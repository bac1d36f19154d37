//! 检测结果输出
//!
//! 把一轮检测结果渲染为文本、表格或JSON

use crate::error::Result;
use crate::health::{CheckResult, RunSummary};
use serde::Serialize;
use std::fmt::Write;

/// 文本输出，每个端点一行 `name - OK|NO`
///
/// `verbose` 为真时追加观测值、期望值与耗时。
pub fn render_text(results: &[CheckResult], verbose: bool) -> String {
    let mut output = String::new();
    for result in results {
        if verbose {
            let _ = writeln!(
                output,
                "{} - {} (状态: {}, 期望: {}, 耗时: {:.3}s)",
                result.name(),
                result.verdict(),
                result.observed(),
                result.expected(),
                result.elapsed().as_secs_f64()
            );
        } else {
            let _ = writeln!(output, "{} - {}", result.name(), result.verdict());
        }
    }
    output
}

/// 定宽表格输出，末尾附汇总行
pub fn render_table(results: &[CheckResult]) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<20} {:<6} {:<15} {:<10} {:<10} URL",
        "端点名称", "结果", "状态", "期望", "耗时(ms)"
    );
    let _ = writeln!(output, "{}", "-".repeat(85));

    for result in results {
        let _ = writeln!(
            output,
            "{:<20} {:<6} {:<15} {:<10} {:<10} {}",
            truncate(result.name(), 20),
            result.verdict(),
            result.observed().to_string(),
            result.expected().to_string(),
            result.response_time_ms(),
            result.url()
        );
    }

    let _ = writeln!(output, "{}", "-".repeat(85));
    output.push_str(&render_summary(&RunSummary::from_results(results)));
    output
}

/// 汇总行
pub fn render_summary(summary: &RunSummary) -> String {
    format!(
        "总计: {}, 健康: {}, 异常: {}, 平均耗时: {:.1}ms, 最大耗时: {}ms\n",
        summary.total,
        summary.healthy,
        summary.unhealthy,
        summary.average_response_time_ms,
        summary.max_response_time_ms
    )
}

#[derive(Serialize)]
struct JsonReport<'a> {
    results: &'a [CheckResult],
    summary: RunSummary,
}

/// 带汇总的 JSON 输出
pub fn render_json(results: &[CheckResult]) -> Result<String> {
    let report = JsonReport {
        results,
        summary: RunSummary::from_results(results),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(3)).collect();
        cut.push_str("...");
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::EndpointDescriptor;
    use crate::health::{EndpointSpec, Observation};
    use std::time::Duration;

    fn result(name: &str, url: &str, observed: Observation, millis: u64) -> CheckResult {
        let spec = EndpointSpec::from_descriptor(&EndpointDescriptor {
            name: name.to_string(),
            url: url.to_string(),
            expect_code: None,
            description: None,
        })
        .unwrap();
        CheckResult::new(&spec, observed, Duration::from_millis(millis))
    }

    fn sample() -> Vec<CheckResult> {
        vec![
            result("web", "http://example.com", Observation::Status(200), 120),
            result("db", "tcp://10.0.0.5:5432", Observation::Unreachable, 30),
        ]
    }

    #[test]
    fn test_render_text_plain() {
        let text = render_text(&sample(), false);
        assert_eq!(text, "web - OK\ndb - NO\n");
    }

    #[test]
    fn test_render_text_verbose() {
        let text = render_text(&sample(), true);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("web - OK"));
        assert!(lines[0].contains("状态: 200"));
        assert!(lines[1].contains("状态: Unreachable"));
        assert!(lines[1].contains("期望: Connected"));
    }

    #[test]
    fn test_render_table_contains_rows_and_summary() {
        let table = render_table(&sample());
        assert!(table.contains("web"));
        assert!(table.contains("tcp://10.0.0.5:5432"));
        assert!(table.contains("总计: 2, 健康: 1, 异常: 1"));
        assert!(table.contains("最大耗时: 120ms"));
    }

    #[test]
    fn test_render_json_shape() {
        let json = render_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let results = value["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["name"], "web");
        assert_eq!(results[0]["status"], 200);
        assert_eq!(results[0]["ok"], true);
        assert_eq!(results[1]["status"], "Unreachable");
        assert_eq!(value["summary"]["unhealthy"], 1);
    }

    #[test]
    fn test_render_empty() {
        assert!(render_text(&[], false).is_empty());
        assert!(render_table(&[]).contains("总计: 0"));
    }

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("short", 20), "short");
        assert_eq!(truncate("a-very-long-endpoint-name", 10), "a-very-...");
    }
}
