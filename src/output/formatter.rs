//! Report formatters: colored console, JSON and Markdown

use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::report::FinalReport;
use crate::processing::audit::{AuditCheck, Impact, QualityReport};
use crate::processing::similarity::MatchCategory;
use colored::{Color, Colorize};
use std::path::Path;

/// Number of gaps shown outside detailed mode
const TOP_GAPS: usize = 5;

pub trait OutputFormatter {
    fn format_report(&self, report: &FinalReport) -> Result<String>;
    fn format_quality(&self, report: &QualityReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Picks the formatter for a requested output format
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

fn score_label(score: f32) -> &'static str {
    match score {
        s if s >= 85.0 => "EXCELLENT",
        s if s >= 70.0 => "GOOD",
        s if s >= 55.0 => "FAIR",
        s if s >= 40.0 => "WEAK",
        _ => "POOR",
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let (prefix, color) = match level {
            1 => ("█", Color::Blue),
            2 => ("▓", Color::Green),
            _ => ("▒", Color::Yellow),
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: f32) -> String {
        let label = score_label(score);
        let color = match label {
            "EXCELLENT" => Color::Green,
            "GOOD" => Color::BrightGreen,
            "FAIR" => Color::Yellow,
            "WEAK" => Color::Red,
            _ => Color::BrightRed,
        };

        if self.use_colors {
            format!("[{}]", label.color(color).bold())
        } else {
            format!("[{}]", label)
        }
    }

    fn format_check(&self, check: &AuditCheck) -> String {
        let mark = if check.status {
            self.colorize("✔", Color::Green)
        } else {
            let color = match check.impact {
                Impact::Critical => Color::Red,
                Impact::High => Color::Yellow,
                _ => Color::BrightBlack,
            };
            self.colorize("✘", color)
        };

        format!(
            "  {} {:<20} {} {}\n",
            mark,
            check.name,
            check.feedback,
            self.colorize(&format!("({}, {})", check.category, check.impact), Color::BrightBlack)
        )
    }

    fn format_checks(&self, checks: &[AuditCheck]) -> String {
        let mut output = String::new();
        for check in checks.iter().filter(|c| self.detailed || !c.status) {
            output.push_str(&self.format_check(check));
        }
        if output.is_empty() {
            output.push_str(&format!("  {}\n", self.colorize("All checks passed", Color::Green)));
        }
        output
    }

    fn format_penalties(&self, penalties: &[String]) -> String {
        penalties
            .iter()
            .map(|p| format!("  ⚠ {}\n", self.colorize(p, Color::Yellow)))
            .collect()
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &FinalReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("ATS SCORE REPORT", 1));
        output.push_str(&format!(
            "Generated: {}\n",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        output.push_str(&self.format_header("Summary", 2));
        output.push_str(&format!(
            "Overall Score: {:.1} {}\n",
            report.score,
            self.format_score_badge(report.score)
        ));
        output.push_str(&format!("Verdict: {}\n", self.colorize(report.verdict(), Color::Cyan)));
        output.push_str(&format!(
            "Quality: {:.1} | Relevance: {}\n",
            report.quality_score,
            if report.has_job_description() {
                format!("{:.1} ({})", report.relevance_score, report.relevance_method)
            } else {
                "n/a".to_string()
            }
        ));
        if report.degraded {
            output.push_str(&self.colorize(
                "Relevance is an approximation: semantic skill matching was not available.\n",
                Color::Yellow,
            ));
        }
        output.push_str(&self.format_penalties(&report.penalties_applied));

        output.push_str(&self.format_header("Document Checks", 2));
        output.push_str(&self.format_checks(&report.checks));

        if !report.match_details.is_empty() {
            output.push_str(&self.format_header("Skill Match", 2));
            output.push_str(&format!(
                "{} matched, {} partial, {} missing of {} ({}%)\n",
                report.stats.matched, report.stats.partial, report.stats.missing, report.stats.total, report.stats.overall
            ));

            if self.detailed {
                for m in &report.match_details {
                    let color = match m.category {
                        MatchCategory::HighMatch => Color::Green,
                        MatchCategory::PartialMatch => Color::Yellow,
                        MatchCategory::LowMatch => Color::Red,
                    };
                    output.push_str(&format!(
                        "  {:<24} → {:<24} {:>5.1}% {}\n",
                        m.requirement_skill,
                        m.best_resume_skill,
                        m.similarity * 100.0,
                        self.colorize(&m.category.to_string(), color)
                    ));
                }
            }
        }

        if !report.skill_gaps.is_empty() {
            output.push_str(&self.format_header("Skill Gaps", 3));
            let limit = if self.detailed { report.skill_gaps.len() } else { TOP_GAPS };
            for gap in report.skill_gaps.iter().take(limit) {
                let marker = if gap.critical {
                    self.colorize(" [critical]", Color::Red)
                } else {
                    String::new()
                };
                output.push_str(&format!(
                    "  • {}{} {}\n",
                    gap.skill,
                    marker,
                    self.colorize(&format!("({})", gap.group), Color::BrightBlack)
                ));
            }
            if report.skill_gaps.len() > limit {
                output.push_str(&format!("  ... and {} more\n", report.skill_gaps.len() - limit));
            }
        }

        if self.detailed {
            let features = &report.features;
            output.push_str(&self.format_header("Document Signals", 3));
            output.push_str(&format!("  Email: {} | Phone: {}\n", features.email_or_na(), features.phone_or_na()));
            output.push_str(&format!(
                "  Words: {} | Bullets: {} | Metrics: {} | Power verbs: {}\n",
                features.word_count, features.bullet_count, features.metric_count, features.verb_count
            ));
            if !features.top_keywords.is_empty() {
                let keywords: Vec<String> = features
                    .top_keywords
                    .iter()
                    .map(|(word, count)| format!("{} ({})", word, count))
                    .collect();
                output.push_str(&format!("  Top keywords: {}\n", keywords.join(", ")));
            }
        }

        output.push_str(&format!(
            "\n{} ats-scorer v{} | audit: {:?} | blend: {} | model: {}\n",
            self.colorize("ℹ", Color::Blue),
            report.metadata.version,
            report.metadata.audit_preset,
            report.metadata.blend.preset_name(),
            report.metadata.embedding_model.as_deref().unwrap_or("none")
        ));

        Ok(output)
    }

    fn format_quality(&self, report: &QualityReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("RESUME QUALITY AUDIT", 1));
        output.push_str(&format!(
            "Quality Score: {:.1} {} ({:.1} of {:.1} points)\n",
            report.score,
            self.format_score_badge(report.score),
            report.raw_score,
            report.max_possible_score
        ));
        output.push_str(&self.format_penalties(&report.penalties_applied));

        output.push_str(&self.format_header("Checks", 2));
        output.push_str(&self.format_checks(&report.checks));

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &FinalReport) -> Result<String> {
        self.to_json(report)
    }

    fn format_quality(&self, report: &QualityReport) -> Result<String> {
        self.to_json(report)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn checks_table(checks: &[AuditCheck]) -> String {
        let mut output = String::from("| Check | Category | Impact | Status | Feedback |\n");
        output.push_str("|-------|----------|--------|--------|----------|\n");
        for check in checks {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                check.name,
                check.category,
                check.impact,
                if check.status { "✅" } else { "❌" },
                check.feedback.replace('|', "\\|")
            ));
        }
        output.push('\n');
        output
    }

    fn penalties(penalties: &[String]) -> String {
        if penalties.is_empty() {
            return String::new();
        }
        let mut output: String = penalties.iter().map(|p| format!("> ⚠️ {}\n", p)).collect();
        output.push('\n');
        output
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &FinalReport) -> Result<String> {
        let mut output = String::new();

        output.push_str("# ATS Score Report\n\n");
        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Audit:** {:?} | **Blend:** {}\n\n",
                report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                report.metadata.audit_preset,
                report.metadata.blend.preset_name()
            ));
        }

        output.push_str("## Summary\n\n");
        output.push_str(&format!("**Overall Score:** {:.1} ({})\n\n", report.score, score_label(report.score)));
        output.push_str(&format!("**Verdict:** {}\n\n", report.verdict()));
        output.push_str("| Component | Score |\n|-----------|-------|\n");
        output.push_str(&format!("| Document quality | {:.1} |\n", report.quality_score));
        if report.has_job_description() {
            output.push_str(&format!(
                "| Job relevance ({}) | {:.1} |\n",
                report.relevance_method, report.relevance_score
            ));
        }
        output.push('\n');
        if report.degraded {
            output.push_str("> Relevance is an approximation: semantic skill matching was not available.\n\n");
        }
        output.push_str(&Self::penalties(&report.penalties_applied));

        output.push_str("## Document Checks\n\n");
        output.push_str(&Self::checks_table(&report.checks));

        if !report.match_details.is_empty() {
            output.push_str("## Skill Match\n\n");
            output.push_str(&format!(
                "**{}** matched, **{}** partial, **{}** missing of {} ({}%)\n\n",
                report.stats.matched, report.stats.partial, report.stats.missing, report.stats.total, report.stats.overall
            ));
            output.push_str("| Requirement | Best resume skill | Similarity | Category |\n");
            output.push_str("|-------------|-------------------|------------|----------|\n");
            for m in &report.match_details {
                output.push_str(&format!(
                    "| {} | {} | {:.1}% | {} |\n",
                    m.requirement_skill,
                    m.best_resume_skill,
                    m.similarity * 100.0,
                    m.category
                ));
            }
            output.push('\n');
        }

        if !report.skill_gaps.is_empty() {
            output.push_str("## Skill Gaps\n\n");
            for gap in &report.skill_gaps {
                let critical = if gap.critical { " **(critical)**" } else { "" };
                output.push_str(&format!("- {}{} ({})\n", gap.skill, critical, gap.group));
            }
            output.push('\n');
        }

        if self.include_metadata {
            output.push_str("---\n\n");
            output.push_str(&format!(
                "*Generated by ats-scorer v{} using {}*\n",
                report.metadata.version,
                report.metadata.embedding_model.as_deref().unwrap_or("no embedding model")
            ));
        }

        Ok(output)
    }

    fn format_quality(&self, report: &QualityReport) -> Result<String> {
        let mut output = String::new();

        output.push_str("# Resume Quality Audit\n\n");
        output.push_str(&format!(
            "**Quality Score:** {:.1} ({}), {:.1} of {:.1} points\n\n",
            report.score,
            score_label(report.score),
            report.raw_score,
            report.max_possible_score
        ));
        output.push_str(&Self::penalties(&report.penalties_applied));
        output.push_str(&Self::checks_table(&report.checks));

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, false, true, true)
    }

    pub fn with_options(use_colors: bool, detailed: bool, pretty_json: bool, include_metadata: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
        }
    }

    fn formatter(&self, format: OutputFormat) -> &dyn OutputFormatter {
        match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
        }
    }

    pub fn generate_report(&self, report: &FinalReport, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_report(report)
    }

    pub fn generate_quality_report(&self, report: &QualityReport, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_quality(report)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: OutputFormat, resume_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(resume_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    let extension = match format {
        OutputFormat::Console => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
    };

    format!("{}_ats_score{}.{}", base_name, timestamp_suffix, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuditPreset, BlendPolicy};
    use crate::output::report::{RelevanceMethod, ReportMetadata};
    use crate::processing::aggregator::SkillGap;
    use crate::processing::audit::CheckCategory;
    use crate::processing::features::DocumentFeatures;
    use crate::processing::similarity::{MatchStats, SkillMatch};
    use crate::processing::skills::SkillGroup;

    fn sample_report() -> FinalReport {
        FinalReport {
            score: 72.4,
            quality_score: 80.0,
            relevance_score: 61.0,
            checks: vec![
                AuditCheck {
                    category: CheckCategory::Essentials,
                    name: "Email Address".to_string(),
                    status: true,
                    feedback: "Found: a@b.io".to_string(),
                    impact: Impact::Critical,
                },
                AuditCheck {
                    category: CheckCategory::Essentials,
                    name: "LinkedIn Profile".to_string(),
                    status: false,
                    feedback: "Add your LinkedIn URL.".to_string(),
                    impact: Impact::High,
                },
            ],
            match_details: vec![SkillMatch {
                requirement_skill: "AWS".to_string(),
                best_resume_skill: "Docker".to_string(),
                similarity: 0.31,
                category: MatchCategory::LowMatch,
            }],
            stats: MatchStats {
                overall: 0,
                matched: 0,
                partial: 0,
                missing: 1,
                total: 1,
            },
            missing_keywords: vec!["AWS".to_string()],
            skill_gaps: vec![SkillGap {
                skill: "AWS".to_string(),
                similarity: 0.31,
                critical: true,
                group: SkillGroup::CloudDevOps,
            }],
            relevance_method: RelevanceMethod::Semantic,
            degraded: false,
            penalties_applied: Vec::new(),
            features: DocumentFeatures::default(),
            metadata: ReportMetadata::new(Some("potion-base-8M".to_string()), AuditPreset::Standard, BlendPolicy::default()),
        }
    }

    #[test]
    fn test_console_without_colors() {
        let output = ConsoleFormatter::new(false, false).format_report(&sample_report()).unwrap();

        assert!(output.contains("Overall Score: 72.4 [GOOD]"));
        assert!(output.contains("LinkedIn Profile"));
        // Passing checks only appear in detailed mode
        assert!(!output.contains("Email Address"));
        assert!(output.contains("AWS [critical] (Cloud/DevOps)"));
        assert!(!output.contains('\u{1b}'));
    }

    #[test]
    fn test_console_detailed_lists_all_checks() {
        let output = ConsoleFormatter::new(false, true).format_report(&sample_report()).unwrap();
        assert!(output.contains("Email Address"));
        assert!(output.contains("Document Signals"));
    }

    #[test]
    fn test_json_shape() {
        let output = JsonFormatter::new(false).format_report(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["relevance_method"], "Semantic");
        assert_eq!(value["stats"]["total"], 1);
        assert_eq!(value["checks"][1]["impact"], "High");
        assert_eq!(value["match_details"][0]["category"], "LowMatch");
        assert_eq!(value["missing_keywords"][0], "AWS");
        assert_eq!(value["degraded"], false);
        assert!(value["metadata"]["generated_at"].is_string());
    }

    #[test]
    fn test_markdown() {
        let output = MarkdownFormatter::new(true).format_report(&sample_report()).unwrap();

        assert!(output.starts_with("# ATS Score Report"));
        assert!(output.contains("| AWS | Docker | 31.0% | Low Match |"));
        assert!(output.contains("- AWS **(critical)** (Cloud/DevOps)"));
        assert!(output.contains("potion-base-8M"));
    }

    #[test]
    fn test_quality_report_formats() {
        let quality = QualityReport {
            score: 45.0,
            raw_score: 60.0,
            max_possible_score: 76.4,
            checks: sample_report().checks,
            penalties_applied: vec!["Experience section missing: capped at 45".to_string()],
        };
        let generator = ReportGenerator::with_options(false, true, false, true);

        let console = generator.generate_quality_report(&quality, OutputFormat::Console).unwrap();
        assert!(console.contains("Quality Score: 45.0 [WEAK]"));
        assert!(console.contains("capped at 45"));

        let markdown = generator.generate_quality_report(&quality, OutputFormat::Markdown).unwrap();
        assert!(markdown.contains("| Email Address | Essentials | Critical | ✅ |"));
    }

    #[test]
    fn test_suggest_filename() {
        assert_eq!(suggest_filename(OutputFormat::Json, "/tmp/jane_resume.txt", false), "jane_resume_ats_score.json");
        assert_eq!(suggest_filename(OutputFormat::Markdown, "cv.md", false), "cv_ats_score.md");
    }
}
