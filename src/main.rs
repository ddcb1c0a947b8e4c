//! ats-scorer: resume quality audit and job-description fit scoring

use ats_scorer::cli::{self, Cli, Commands, ConfigAction, ModelAction, TEXT_EXTENSIONS};
use ats_scorer::config::{AuditConfig, BlendPolicy, Config, OutputFormat};
use ats_scorer::error::{Result, ScorerError};
use ats_scorer::input::InputManager;
use ats_scorer::output::formatter::{save_report_to_file, suggest_filename, ReportGenerator};
use ats_scorer::processing::embedding_manager::EmbeddingModelManager;
use ats_scorer::processing::embeddings::{Embedder, Model2VecEmbedder};
use ats_scorer::processing::engine::{ScoreRequest, ScoringEngine};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, &config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::Score {
            resume,
            job,
            critical,
            resume_skills,
            jd_skills,
            blend,
            audit,
            match_threshold,
            partial_threshold,
            embedding,
            no_embeddings,
            output,
            save,
            detailed,
        } => {
            let output_format = resolve_output_format(output.as_deref(), &config)?;

            cli::validate_file_extension(&resume, &TEXT_EXTENSIONS)
                .map_err(|e| ScorerError::InvalidInput(format!("Resume file: {}", e)))?;
            if let Some(job) = &job {
                cli::validate_file_extension(job, &TEXT_EXTENSIONS)
                    .map_err(|e| ScorerError::InvalidInput(format!("Job description file: {}", e)))?;
            }

            let mut scoring = config.scoring.clone();
            if let Some(blend) = blend {
                scoring.blend = BlendPolicy::from_preset(blend.into());
            }
            if let Some(audit) = audit {
                scoring.audit = AuditConfig::from_preset(audit.into());
            }
            if let Some(value) = match_threshold {
                scoring.thresholds.match_threshold = value;
            }
            if let Some(value) = partial_threshold {
                scoring.thresholds.partial_threshold = value;
            }
            scoring.validate()?;

            let mut input_manager = InputManager::new();
            let resume_text = input_manager.extract_text(&resume).await?;
            let job_text = match &job {
                Some(job) => Some(input_manager.extract_text(job).await?),
                None => None,
            };

            let mut embedding_config = config.embedding.clone();
            embedding_config.enabled = embedding_config.enabled && !no_embeddings;

            let resume_skills = cli::normalize_skill_list(&resume_skills);
            let jd_skills = cli::normalize_skill_list(&jd_skills);

            let embedder = if embedding_config.enabled && (job_text.is_some() || !jd_skills.is_empty()) {
                let model = embedding.unwrap_or_else(|| config.models.default_embedding_model.clone());
                load_embedder(&config, &model).await
            } else {
                None
            };

            let engine = ScoringEngine::new(embedder, embedding_config)?;

            let mut request = ScoreRequest::new(resume_text).with_critical_skills(cli::normalize_skill_list(&critical));
            if let Some(job_text) = job_text {
                request = request.with_job_description(job_text);
            }
            if !resume_skills.is_empty() {
                request = request.with_resume_skills(resume_skills);
            }
            if !jd_skills.is_empty() {
                request = request.with_jd_skills(jd_skills);
            }

            info!("Scoring {}", resume.display());
            let report = engine.score_document(&request, &scoring).await?;

            emit(&config, output_format, detailed, save.as_deref(), &resume, |generator, format| {
                generator.generate_report(&report, format)
            })?;
        }

        Commands::Audit {
            resume,
            audit,
            output,
            save,
        } => {
            let output_format = resolve_output_format(output.as_deref(), &config)?;
            cli::validate_file_extension(&resume, &TEXT_EXTENSIONS)
                .map_err(|e| ScorerError::InvalidInput(format!("Resume file: {}", e)))?;

            let audit_config = audit
                .map(|preset| AuditConfig::from_preset(preset.into()))
                .unwrap_or(config.scoring.audit);
            audit_config.validate()?;

            let resume_text = InputManager::new().extract_text(&resume).await?;
            let engine = ScoringEngine::new(None, config.embedding.clone())?;
            let quality = engine.score_quality(&resume_text, &audit_config);

            emit(&config, output_format, true, save.as_deref(), &resume, |generator, format| {
                generator.generate_quality_report(&quality, format)
            })?;
        }

        Commands::Models { action } => {
            let manager = EmbeddingModelManager::new(config.models_dir().clone()).await?;

            match action {
                ModelAction::List => {
                    println!("📚 Embedding Models\n");
                    for (id, info) in manager.list_models() {
                        let status = if manager.is_model_downloaded(id).await {
                            "✅ Downloaded"
                        } else {
                            "⬇️  Available"
                        };
                        let default_marker = if *id == config.models.default_embedding_model {
                            " (default)"
                        } else {
                            ""
                        };
                        println!("  • {}{} [{}]", id, default_marker, status);
                        println!("    {} ({}) - {} MB, {} dims", info.name, info.repo_id, info.size_mb, info.dimensions);
                        println!("    {}", info.description);
                    }
                    println!("\n💡 Download: ats-scorer models download <model>");
                }

                ModelAction::Download { model } => {
                    let spinner = spinner(&format!("Downloading {}...", model));
                    let result = manager.download_model(&model).await;
                    spinner.finish_and_clear();

                    let model_path = result?;
                    println!("✅ Model '{}' ready", model);
                    println!("📁 Location: {}", model_path.display());
                }

                ModelAction::Info { model } => {
                    let model_id = manager
                        .resolve_model_id(&model)
                        .ok_or_else(|| ScorerError::ModelError(format!("Unknown embedding model: {}", model)))?;

                    if let Some(info) = manager.get_model_info(&model_id) {
                        println!("📋 Model Information for '{}'\n", model_id);
                        println!("Name: {}", info.name);
                        println!("Repository: {}", info.repo_id);
                        println!("Size: {} MB", info.size_mb);
                        println!("Dimensions: {}", info.dimensions);
                        println!("Description: {}", info.description);

                        match manager.local_model_path(&model_id).await {
                            Some(path) => println!("Status: ✅ Downloaded ({})", path.display()),
                            None => println!(
                                "Status: ⬇️  Not downloaded. Run: ats-scorer models download {}",
                                model_id
                            ),
                        }
                    }
                }
            }
        }

        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => {
                let content = toml::to_string_pretty(&config)
                    .map_err(|e| ScorerError::Configuration(format!("Failed to serialize config: {}", e)))?;
                println!("# {}\n", config_path.display());
                println!("{}", content);
            }
            ConfigAction::Reset => {
                Config::default().save_to(config_path)?;
                println!("✅ Configuration reset to defaults: {}", config_path.display());
            }
            ConfigAction::Path => {
                println!("{}", config_path.display());
            }
        },
    }

    Ok(())
}

fn resolve_output_format(output: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match output {
        Some(format) => cli::parse_output_format(format).map_err(ScorerError::InvalidInput),
        None => Ok(config.output.format),
    }
}

/// Print the formatted report, or write it to `save` (a file or a directory)
fn emit<F>(
    config: &Config,
    format: OutputFormat,
    detailed: bool,
    save: Option<&Path>,
    resume: &Path,
    render: F,
) -> Result<()>
where
    F: Fn(&ReportGenerator, OutputFormat) -> Result<String>,
{
    let detailed = detailed || config.output.detailed;

    match save {
        Some(path) => {
            let target: PathBuf = if path.is_dir() {
                path.join(suggest_filename(format, &resume.to_string_lossy(), true))
            } else {
                path.to_path_buf()
            };

            let generator = ReportGenerator::with_options(false, detailed, true, true);
            save_report_to_file(&render(&generator, format)?, &target)?;
            println!("💾 Report saved to {}", target.display());
        }
        None => {
            let generator = ReportGenerator::with_options(config.output.color_output, detailed, true, true);
            println!("{}", render(&generator, format)?);
        }
    }

    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

async fn open_embedder(config: &Config, model: &str) -> Result<Model2VecEmbedder> {
    let manager = EmbeddingModelManager::new(config.models_dir().clone()).await?;
    manager.load_embedder(model, config.embedding.batch_size).await
}

/// Load the embedding model once for this run. Failure is not fatal: the
/// engine falls back to keyword overlap.
async fn load_embedder(config: &Config, model: &str) -> Option<Arc<dyn Embedder>> {
    let spinner = spinner(&format!("Loading embedding model {}...", model));
    let result = open_embedder(config, model).await;
    spinner.finish_and_clear();

    match result {
        Ok(embedder) => {
            info!("Loaded embedding model {}", embedder.model_name());
            Some(Arc::new(embedder))
        }
        Err(e) => {
            warn!("Embedding model unavailable, using keyword overlap: {}", e);
            None
        }
    }
}
