use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, CaseForm, FlowError, HistoryFlow, HttpGateway, IdentityProvider, Notice,
    Route, Shell,
};
use shared::domain::{CaseDetail, CaseId, CaseSummary, DifficultyLevel, DifficultyTone};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "casegen", about = "Generate and browse teaching cases")]
struct Args {
    /// Backend base URL; overrides casegen.toml and the environment.
    #[arg(long, global = true)]
    server_url: Option<String>,
    /// File holding the client identity.
    #[arg(long, global = true)]
    identity_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new case.
    Generate {
        #[arg(long)]
        knowledge_points: String,
        #[arg(long = "objectives", alias = "learning-objectives")]
        learning_objectives: String,
        #[arg(long)]
        scenario: String,
        #[arg(long, conflicts_with = "materials_file")]
        materials: Option<String>,
        /// Read supporting materials from a file.
        #[arg(long)]
        materials_file: Option<PathBuf>,
        /// Skip question generation.
        #[arg(long)]
        no_questions: bool,
        #[arg(long)]
        question_type: Option<String>,
        /// 初级/中级/高级 or beginner/intermediate/advanced.
        #[arg(long, default_value = "intermediate")]
        difficulty: DifficultyLevel,
    },
    /// List previously generated cases.
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one case in full.
    Show { id: i64 },
    /// Like a case.
    Like { id: i64 },
    /// Print the local identity and settings.
    Whoami,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings()?;
    if let Some(url) = args.server_url {
        settings.server_url = client_core::settings::normalize_server_url(&url);
    }
    if let Some(path) = args.identity_file {
        settings.identity_path = Some(path);
    }
    debug!(server_url = %settings.server_url, "settings loaded");

    let gateway = HttpGateway::with_timeout(&settings.server_url, settings.request_timeout())
        .context("failed to set up backend client")?;
    let identity = IdentityProvider::from_path(settings.identity_path.clone());

    let route = match &args.command {
        Command::Generate { .. } => Route::Home,
        Command::History { .. } | Command::Show { .. } | Command::Like { .. } => Route::History,
        Command::Whoami => Route::Settings,
    };
    let mut shell = Shell::open(identity, settings, route.path())?;

    match args.command {
        Command::Generate {
            knowledge_points,
            learning_objectives,
            scenario,
            materials,
            materials_file,
            no_questions,
            question_type,
            difficulty,
        } => {
            let case_materials = match materials_file {
                Some(path) => std::fs::read_to_string(&path).with_context(|| {
                    format!("failed to read materials file '{}'", path.display())
                })?,
                None => materials.unwrap_or_default(),
            };
            let mut form = CaseForm {
                knowledge_points,
                learning_objectives,
                case_scenario: scenario,
                case_materials,
                generate_questions: !no_questions,
                difficulty,
                ..CaseForm::default()
            };
            if let Some(question_type) = question_type {
                form.question_type = question_type;
            }
            let flow = shell
                .submission_mut()
                .ok_or_else(|| anyhow!("case form not mounted"))?;
            let notices = flow.submit(&gateway, &form).await.map_err(report)?;
            if let Some(artifact) = flow.artifact() {
                println!("{}", artifact.case_content);
                if let Some(questions) = &artifact.questions {
                    println!("\n--- questions ---\n{}", questions.render());
                }
                if let Some(id) = artifact.case_id {
                    println!("\ncase id: {id}");
                }
            }
            print_notices(&notices);
        }
        Command::History { page, search } => {
            let flow = history(&mut shell)?;
            flow.load_page(&gateway, page, search.as_deref())
                .await
                .map_err(report)?;
            print_history(flow);
        }
        Command::Show { id } => {
            let flow = history(&mut shell)?;
            flow.load_detail(&gateway, CaseId(id)).await.map_err(report)?;
            if let Some(detail) = flow.detail() {
                print_detail(detail);
            }
        }
        Command::Like { id } => {
            let flow = history(&mut shell)?;
            flow.load_detail(&gateway, CaseId(id)).await.map_err(report)?;
            flow.like(&gateway, CaseId(id)).await.map_err(report)?;
            let likes = flow.detail().map(|d| d.summary.like_count).unwrap_or_default();
            print_notices(&[Notice::success(format!("Liked case {id} ({likes} likes)."))]);
        }
        Command::Whoami => {
            let view = shell
                .settings_view()
                .ok_or_else(|| anyhow!("settings not mounted"))?;
            match &view.identity {
                Some(identity) => println!("identity: {identity}"),
                None => println!("identity: (none yet)"),
            }
            println!("stored in: {}", view.identity_storage);
            if view.identity_degraded {
                println!("warning: identity storage unavailable, identity is session-only");
            }
            println!("server: {}", view.server_url);
        }
    }

    Ok(())
}

fn history(shell: &mut Shell) -> Result<&mut HistoryFlow> {
    shell
        .history_mut()
        .ok_or_else(|| anyhow!("history not mounted"))
}

/// Turns a flow failure into its user-facing notice text.
fn report(err: FlowError) -> anyhow::Error {
    let notice = match &err {
        FlowError::Client(client) => Notice::from_client_error(client),
        other => Notice::error(other.to_string()),
    };
    debug!(error = %err, "command failed");
    anyhow!(notice.text)
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        eprintln!("{notice}");
    }
}

fn tone_marker(tone: DifficultyTone) -> &'static str {
    match tone {
        DifficultyTone::Low => "+",
        DifficultyTone::Medium => "~",
        DifficultyTone::High => "!",
        DifficultyTone::Neutral => " ",
    }
}

fn summary_line(case: &CaseSummary) -> String {
    format!(
        "{:>6} {} {:<8} {:<16} {} (views {}, likes {})",
        case.id,
        tone_marker(case.tone()),
        case.difficulty_level.as_deref().unwrap_or("-"),
        case.created_at_display(),
        case.display_title(),
        case.view_count,
        case.like_count
    )
}

fn print_history(flow: &HistoryFlow) {
    if flow.cases().is_empty() {
        println!("{}", flow.empty_message());
        return;
    }
    for case in flow.cases() {
        println!("{}", summary_line(case));
    }
    if flow.show_pagination() {
        println!(
            "\n{} (page {}/{})",
            flow.range_label(),
            flow.current_page(),
            flow.total_pages()
        );
    }
}

fn print_detail(detail: &CaseDetail) {
    let summary = &detail.summary;
    println!("{}", summary.display_title());
    println!("{}", summary_line(summary));
    for (label, value) in [
        ("knowledge points", &summary.knowledge_points),
        ("learning objectives", &summary.learning_objectives),
        ("scenario", &summary.case_scenario),
    ] {
        if let Some(value) = value {
            println!("{label}: {value}");
        }
    }
    if !summary.tags.is_empty() {
        println!("tags: {}", summary.tags.join(", "));
    }
    println!("\n{}", detail.content);
    if let Some(questions) = &detail.questions {
        println!("\n--- questions ---\n{}", questions.render());
    }
}
