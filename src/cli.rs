//! CLI interface for the ATS scorer

use crate::config::{AuditPreset, BlendPreset, OutputFormat};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// Extensions accepted for resume and job description files
pub const TEXT_EXTENSIONS: [&str; 4] = ["txt", "text", "md", "markdown"];

#[derive(Parser)]
#[command(name = "ats-scorer", version)]
#[command(about = "Score a resume for ATS readiness and job-description fit")]
#[command(long_about = "Audit resume quality with rule-based checks and, when a job description is given, \
measure skill relevance with static embeddings. Both are blended into a single 0-95 score.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a resume, optionally against a job description
    Score {
        /// Path to resume file (TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT, MD)
        #[arg(short, long)]
        job: Option<PathBuf>,

        /// Comma-separated requirement skills that count double
        #[arg(long, value_delimiter = ',')]
        critical: Vec<String>,

        /// Comma-separated resume skills; extracted from the resume text when omitted
        #[arg(long, value_delimiter = ',')]
        resume_skills: Vec<String>,

        /// Comma-separated job requirement skills; extracted from the job text when omitted
        #[arg(long, value_delimiter = ',')]
        jd_skills: Vec<String>,

        /// Weighting between document quality and job relevance
        #[arg(long, value_enum)]
        blend: Option<BlendArg>,

        /// Audit preset
        #[arg(long, value_enum)]
        audit: Option<AuditArg>,

        /// Similarity at or above which a skill counts as matched
        #[arg(long)]
        match_threshold: Option<f32>,

        /// Similarity at or above which a skill counts as a partial match
        #[arg(long)]
        partial_threshold: Option<f32>,

        /// Embedding model to use (catalog id, repo id or local directory)
        #[arg(short, long)]
        embedding: Option<String>,

        /// Skip semantic matching and use keyword overlap only
        #[arg(long)]
        no_embeddings: bool,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Output detailed analysis
        #[arg(short, long)]
        detailed: bool,
    },

    /// Run the document quality audit only
    Audit {
        /// Path to resume file (TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Audit preset
        #[arg(long, value_enum)]
        audit: Option<AuditArg>,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Embedding model management
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show or reset configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BlendArg {
    QualityFirst,
    RelevanceFirst,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AuditArg {
    Standard,
    Strict,
}

impl From<BlendArg> for BlendPreset {
    fn from(arg: BlendArg) -> Self {
        match arg {
            BlendArg::QualityFirst => BlendPreset::QualityFirst,
            BlendArg::RelevanceFirst => BlendPreset::RelevanceFirst,
        }
    }
}

impl From<AuditArg> for AuditPreset {
    fn from(arg: AuditArg) -> Self {
        match arg {
            AuditArg::Standard => AuditPreset::Standard,
            AuditArg::Strict => AuditPreset::Strict,
        }
    }
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List catalog models and their download status
    List,

    /// Download a model
    Download {
        /// Catalog id or Hugging Face repo id
        model: String,
    },

    /// Show model information
    Info {
        /// Model name
        model: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown",
            format
        )),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

/// Trim comma-list skill entries and drop empty ones
pub fn normalize_skill_list(skills: &[String]) -> Vec<String> {
    skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
