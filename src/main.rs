use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use decisio::{
    Config, ConfidenceLevel, Database, Decision, DecisionContextSnapshot,
    DecisionContextSnapshotCreate, DecisionCreate, DecisionEvaluation, DecisionService,
    DecisionType, Page, ProjectContext, ProjectContextService, ProjectContextUpdate, RiskLevel,
};
use std::io;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "decisio")]
#[command(author, version, about = "Decision tracking with context snapshots and drift evaluation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API server
    Serve {
        /// Interface to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Record a new decision
    Add {
        /// Short title
        title: String,

        /// What was decided and why
        #[arg(short, long)]
        description: String,

        /// Decision type: architecture, technology, process
        #[arg(short = 't', long = "type", default_value = "architecture")]
        decision_type: DecisionType,

        /// Confidence: low, medium, high
        #[arg(short, long, default_value = "medium")]
        confidence: ConfidenceLevel,
    },

    /// List decisions
    Decisions {
        /// Number of decisions to skip
        #[arg(long, default_value = "0")]
        skip: i64,

        /// Maximum number of decisions to show
        #[arg(short = 'n', long, default_value = "100")]
        limit: i64,
    },

    /// Show one decision with its snapshots and evaluations
    Show {
        /// Decision id
        id: String,
    },

    /// Snapshot the context a decision was made under.
    /// Without values, the current project context is copied.
    Snapshot {
        /// Decision id
        id: String,

        /// Team size at decision time
        #[arg(long)]
        team: Option<i32>,

        /// Expected users at decision time
        #[arg(long)]
        users: Option<i32>,

        /// Timeline in months at decision time
        #[arg(long)]
        timeline: Option<i32>,

        /// Free-text assumptions
        #[arg(short, long)]
        assumptions: Option<String>,
    },

    /// Evaluate drift between a decision's latest snapshot and the current context
    Evaluate {
        /// Decision id
        id: String,
    },

    /// List past evaluations for a decision
    Evaluations {
        /// Decision id
        id: String,
    },

    /// Show or update the project context
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Show database location and record counts
    Status,

    /// Generate shell completion script
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ContextAction {
    /// Show the current project context
    Show,

    /// Create or update the project context. Creation needs all three values.
    Set {
        /// Team size
        #[arg(long)]
        team: Option<i32>,

        /// Expected users
        #[arg(long)]
        users: Option<i32>,

        /// Timeline in months
        #[arg(long)]
        timeline: Option<i32>,

        /// Free-text constraints
        #[arg(long, conflicts_with = "clear_constraints")]
        constraints: Option<String>,

        /// Remove stored constraints
        #[arg(long)]
        clear_constraints: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Command::Serve { .. } => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> decisio::Result<()> {
    if let Command::Completion { shell } = command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "decisio", &mut io::stdout());
        return Ok(());
    }

    let mut config = Config::load();
    let db = Database::open_with(&config.database)?;
    let decisions = DecisionService::new(db.clone());
    let contexts = ProjectContextService::new(db.clone());

    match command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            decisio::serve::start_api_server(db, &config.server)?;
        }

        Command::Add {
            title,
            description,
            decision_type,
            confidence,
        } => {
            let decision = decisions.create_decision(DecisionCreate {
                title,
                description,
                decision_type,
                confidence_level: confidence,
            })?;
            println!("{} {}", "Created decision".green(), decision.id.bold());
            print_decision(&decision);
        }

        Command::Decisions { skip, limit } => {
            let list = decisions.list_decisions(Page { skip, limit })?;
            if list.is_empty() {
                println!("No decisions recorded.");
            }
            for d in &list {
                println!(
                    "{}  {:<12} {:<6}  {}",
                    d.id.dimmed(),
                    d.decision_type.as_str().cyan(),
                    d.confidence_level.as_str(),
                    d.title
                );
            }
        }

        Command::Show { id } => {
            let decision = decisions.get_decision(&id)?;
            print_decision(&decision);

            let snapshots = decisions.list_snapshots(&id)?;
            println!("\n{} ({})", "Snapshots".bold(), snapshots.len());
            for s in &snapshots {
                print_snapshot(s);
            }

            let evaluations = decisions.list_evaluations(&id)?;
            println!("\n{} ({})", "Evaluations".bold(), evaluations.len());
            for e in &evaluations {
                print_evaluation(e);
            }
        }

        Command::Snapshot {
            id,
            team,
            users,
            timeline,
            assumptions,
        } => {
            let snapshot = match (team, users, timeline) {
                (Some(team), Some(users), Some(timeline)) => decisions.create_snapshot(
                    &id,
                    DecisionContextSnapshotCreate {
                        team_size_at_decision: team,
                        expected_users_at_decision: users,
                        timeline_at_decision: timeline,
                        assumptions,
                    },
                )?,
                (None, None, None) => decisions.snapshot_from_context(&id, assumptions)?,
                _ => {
                    return Err(decisio::Error::Validation(
                        "Provide --team, --users and --timeline together, \
                         or none to copy the project context"
                            .to_string(),
                    ))
                }
            };
            println!("{} {}", "Created snapshot".green(), snapshot.id.bold());
            print_snapshot(&snapshot);
        }

        Command::Evaluate { id } => {
            let evaluation = decisions.evaluate(&id)?;
            print_evaluation(&evaluation);
        }

        Command::Evaluations { id } => {
            let evaluations = decisions.list_evaluations(&id)?;
            if evaluations.is_empty() {
                println!("No evaluations for {}.", id);
            }
            for e in &evaluations {
                print_evaluation(e);
            }
        }

        Command::Context { action } => match action {
            ContextAction::Show => print_context(&contexts.get()?),
            ContextAction::Set {
                team,
                users,
                timeline,
                constraints,
                clear_constraints,
            } => {
                let constraints = if clear_constraints {
                    Some(None)
                } else {
                    constraints.map(Some)
                };
                let context = contexts.update(ProjectContextUpdate {
                    team_size: team,
                    expected_users: users,
                    timeline_months: timeline,
                    constraints,
                })?;
                println!("{}", "Project context saved".green());
                print_context(&context);
            }
        },

        Command::Status => {
            let summary = db.summary()?;
            println!("{} {}", "Database:".bold(), db.path().display());
            println!("  decisions:       {}", summary.decisions);
            println!("  snapshots:       {}", summary.snapshots);
            println!("  evaluations:     {}", summary.evaluations);
            println!(
                "  project context: {}",
                if summary.has_project_context { "set" } else { "not set" }
            );
            for schema in db.schema_versions()? {
                println!("  schema:          {} ({})", schema.version, schema.name);
            }
        }

        Command::Completion { .. } => {}
    }

    Ok(())
}

fn print_decision(d: &Decision) {
    println!("{}", d.title.bold());
    println!("  id:         {}", d.id);
    println!("  type:       {}", d.decision_type);
    println!("  confidence: {}", d.confidence_level);
    println!("  created:    {}", d.created_at);
    println!("  {}", d.description);
}

fn print_snapshot(s: &DecisionContextSnapshot) {
    println!(
        "  {}  team={} users={} timeline={}mo",
        s.created_at.dimmed(),
        s.team_size_at_decision,
        s.expected_users_at_decision,
        s.timeline_at_decision
    );
    if let Some(assumptions) = &s.assumptions {
        println!("    assumptions: {}", assumptions);
    }
}

fn print_evaluation(e: &DecisionEvaluation) {
    let risk = match e.risk_level {
        RiskLevel::Low => e.risk_level.as_str().green(),
        RiskLevel::Medium => e.risk_level.as_str().yellow(),
        RiskLevel::High => e.risk_level.as_str().red(),
    };
    println!(
        "  {}  drift {:>3}/100  risk {}",
        e.evaluated_at.dimmed(),
        e.drift_score,
        risk.bold()
    );
    println!("    {}", e.explanation);
}

fn print_context(c: &ProjectContext) {
    println!("{}", "Project context".bold());
    println!("  team size:      {}", c.team_size);
    println!("  expected users: {}", c.expected_users);
    println!("  timeline:       {} months", c.timeline_months);
    if let Some(constraints) = &c.constraints {
        println!("  constraints:    {}", constraints);
    }
    println!("  updated:        {}", c.updated_at);
}
