use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::{Confirm, Input, Select};
use dotenvy::dotenv;
use schoolbook::logging::init_tracing;
use schoolbook::notifications::LogNotifier;
use schoolbook::rollcall::{Phase, RollCallController, RollCallError, SaveOutcome, SessionSwitch};
use schoolbook::store::{ResourceStore, Stores};
use schoolbook_client::HttpBackend;
use schoolbook_config::{ApiConfig, StoreConfig};
use schoolbook_core::ListQuery;
use schoolbook_core::pagination::DEFAULT_LIMIT;
use schoolbook_models::{
    AcademicYear, AttendanceRecord, AttendanceStatus, Class, ClassId, ClassSession,
    ClassSessionId, Grade, Invoice, Parent, Resource, Schedule, Student, StudentId, Teacher,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "schoolbook")]
#[command(about = "Schoolbook - browse school records and take roll call", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of a resource collection
    List {
        resource: ResourceArg,

        /// Page number (1-based)
        #[arg(short = 'p', long, default_value = "1")]
        page: i64,

        /// Only show records matching this text
        #[arg(short = 's', long)]
        search: Option<String>,
    },
    /// Show a single record
    Show { resource: ResourceArg, id: String },
    /// Delete a single record
    Delete {
        resource: ResourceArg,
        id: String,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Take attendance for a class session
    RollCall {
        /// Class whose enrolled students are listed
        #[arg(short = 'c', long)]
        class: String,

        /// Class session to record (prompted when omitted)
        #[arg(short = 's', long)]
        session: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResourceArg {
    Teachers,
    Students,
    Parents,
    Classes,
    Schedules,
    ClassSessions,
    Attendance,
    Invoices,
    AcademicYears,
    Grades,
}

/// Binds `$store` to the store selected by `$arg` and evaluates `$body`
/// once per resource type.
macro_rules! with_store {
    ($stores:expr, $arg:expr, |$store:ident| $body:expr) => {
        match $arg {
            ResourceArg::Teachers => {
                let $store: &ResourceStore<Teacher> = &$stores.teachers;
                $body
            }
            ResourceArg::Students => {
                let $store: &ResourceStore<Student> = &$stores.students;
                $body
            }
            ResourceArg::Parents => {
                let $store: &ResourceStore<Parent> = &$stores.parents;
                $body
            }
            ResourceArg::Classes => {
                let $store: &ResourceStore<Class> = &$stores.classes;
                $body
            }
            ResourceArg::Schedules => {
                let $store: &ResourceStore<Schedule> = &$stores.schedules;
                $body
            }
            ResourceArg::ClassSessions => {
                let $store: &ResourceStore<ClassSession> = &$stores.class_sessions;
                $body
            }
            ResourceArg::Attendance => {
                let $store: &ResourceStore<AttendanceRecord> = &$stores.attendance;
                $body
            }
            ResourceArg::Invoices => {
                let $store: &ResourceStore<Invoice> = &$stores.invoices;
                $body
            }
            ResourceArg::AcademicYears => {
                let $store: &ResourceStore<AcademicYear> = &$stores.academic_years;
                $body
            }
            ResourceArg::Grades => {
                let $store: &ResourceStore<Grade> = &$stores.grades;
                $body
            }
        }
    };
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("\n❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    init_tracing()?;

    let api_config = ApiConfig::from_env();
    let backend = Arc::new(HttpBackend::new(&api_config).context("Failed to build HTTP client")?);
    tracing::debug!(base_url = %backend.base_url(), "Backend configured");
    let stores = Stores::new(backend, Arc::new(LogNotifier), &StoreConfig::from_env());

    match cli.command {
        Commands::List {
            resource,
            page,
            search,
        } => with_store!(stores, resource, |store| handle_list(store, page, search).await),
        Commands::Show { resource, id } => {
            with_store!(stores, resource, |store| handle_show(store, id).await)
        }
        Commands::Delete { resource, id, yes } => {
            with_store!(stores, resource, |store| handle_delete(store, id, yes).await)
        }
        Commands::RollCall { class, session } => {
            handle_roll_call(&stores, ClassId::from(class), session.map(ClassSessionId::from))
                .await
        }
    }
}

fn store_error<R: Resource>(store: &ResourceStore<R>) -> anyhow::Error {
    anyhow!(
        store
            .error()
            .unwrap_or_else(|| format!("{} request failed", R::KIND.title()))
    )
}

async fn handle_list<R: Resource>(
    store: &ResourceStore<R>,
    page: i64,
    search: Option<String>,
) -> Result<()> {
    let mut query = ListQuery::page(page, DEFAULT_LIMIT);
    if let Some(search) = search {
        query = query.with_search(search);
    }

    let items = store
        .list(query)
        .await
        .ok_or_else(|| store_error(store))?;

    for item in items.iter() {
        println!("{}\t{}", item.id(), serde_json::to_string(item)?);
    }

    match store.snapshot().meta {
        Some(meta) => {
            let limit = meta.limit.max(1);
            let pages = (meta.total + limit - 1) / limit;
            println!(
                "\n{} of {} {} records (page {} of {})",
                items.len(),
                meta.total,
                R::KIND.label(),
                meta.page.unwrap_or(page),
                pages.max(1)
            );
        }
        None => println!("\n{} {} records", items.len(), R::KIND.label()),
    }
    Ok(())
}

async fn handle_show<R: Resource>(store: &ResourceStore<R>, id: String) -> Result<()>
where
    R::Id: From<String>,
{
    let item = store
        .get_by_id(&R::Id::from(id))
        .await
        .ok_or_else(|| store_error(store))?;
    println!("{}", serde_json::to_string_pretty(&item)?);
    Ok(())
}

async fn handle_delete<R: Resource>(store: &ResourceStore<R>, id: String, yes: bool) -> Result<()>
where
    R::Id: From<String>,
{
    let confirmed = yes
        || Confirm::new()
            .with_prompt(format!("Delete {} {}?", R::KIND.label(), id))
            .default(false)
            .interact()?;
    if !confirmed {
        println!("Aborted");
        return Ok(());
    }

    if !store.delete(&R::Id::from(id.clone())).await {
        return Err(store_error(store));
    }
    println!("✅ {} {} deleted", R::KIND.title(), id);
    Ok(())
}

async fn handle_roll_call(
    stores: &Stores,
    class_id: ClassId,
    session_id: Option<ClassSessionId>,
) -> Result<()> {
    let controller = RollCallController::new(stores.attendance.clone(), stores.classes.clone());

    let enrolled = controller.load_enrolled(&class_id).await?;
    if enrolled == 0 {
        println!("No students are enrolled in class {}", class_id);
        return Ok(());
    }

    let session_id = match session_id {
        Some(id) => id,
        None => pick_session(stores, &class_id).await?,
    };
    controller.select_session(&session_id).await?;

    let result = roll_call_loop(stores, &controller).await;
    controller.close();
    result
}

async fn pick_session(stores: &Stores, class_id: &ClassId) -> Result<ClassSessionId> {
    let sessions = stores
        .class_sessions
        .list_by_class(class_id)
        .await
        .ok_or_else(|| store_error(&*stores.class_sessions))?;
    if sessions.is_empty() {
        return Err(anyhow!("Class {} has no sessions", class_id));
    }

    let labels: Vec<String> = sessions.iter().map(ClassSession::label).collect();
    let index = Select::new()
        .with_prompt("Class session")
        .items(&labels)
        .default(labels.len() - 1)
        .interact()?;
    Ok(sessions[index].id.clone())
}

const MENU: [&str; 6] = [
    "Set status",
    "Set comment",
    "Save",
    "Retry failed rows",
    "Switch session",
    "Quit",
];

async fn roll_call_loop(stores: &Stores, controller: &RollCallController) -> Result<()> {
    loop {
        let state = controller.state();
        if state.phase == Phase::LoadFailed {
            eprintln!(
                "❌ {}",
                state.error.as_deref().unwrap_or("Failed to load attendance")
            );
            if Confirm::new().with_prompt("Retry?").default(true).interact()? {
                controller.reload().await?;
                continue;
            }
            return Ok(());
        }

        print_draft(controller);

        let choice = Select::new()
            .with_prompt("Action")
            .items(&MENU)
            .default(0)
            .interact()?;

        match choice {
            0 => {
                let student_id = pick_student(controller)?;
                let labels: Vec<&str> = AttendanceStatus::ALL.iter().map(|s| s.as_str()).collect();
                let index = Select::new()
                    .with_prompt("Status")
                    .items(&labels)
                    .default(0)
                    .interact()?;
                controller.set_status(&student_id, AttendanceStatus::ALL[index])?;
            }
            1 => {
                let student_id = pick_student(controller)?;
                let current = controller
                    .state()
                    .draft
                    .get(&student_id)
                    .map(|e| e.comment.clone())
                    .unwrap_or_default();
                let comment: String = Input::new()
                    .with_prompt("Comment")
                    .with_initial_text(current)
                    .allow_empty(true)
                    .interact_text()?;
                controller.set_comment(&student_id, comment)?;
            }
            2 => report(controller.save().await),
            3 => report(controller.retry_failed().await),
            4 => {
                let Some(class_id) = state.class_id.clone() else {
                    continue;
                };
                let pending = controller.pending_edits();
                if pending > 0
                    && !Confirm::new()
                        .with_prompt(format!("Discard {} unsaved edits?", pending))
                        .default(false)
                        .interact()?
                {
                    continue;
                }
                let session_id = pick_session(stores, &class_id).await?;
                if let SessionSwitch::DiscardedEdits(n) =
                    controller.select_session(&session_id).await?
                {
                    println!("Discarded {} unsaved edits", n);
                }
            }
            _ => {
                let pending = controller.pending_edits();
                if pending == 0
                    || Confirm::new()
                        .with_prompt(format!("Quit with {} unsaved edits?", pending))
                        .default(false)
                        .interact()?
                {
                    return Ok(());
                }
            }
        }
    }
}

fn pick_student(controller: &RollCallController) -> Result<StudentId> {
    let state = controller.state();
    let labels: Vec<String> = state
        .draft
        .entries()
        .iter()
        .map(|e| student_name(&state.students, &e.student_id))
        .collect();
    let index = Select::new()
        .with_prompt("Student")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(state.draft.entries()[index].student_id.clone())
}

fn student_name(students: &[Student], id: &StudentId) -> String {
    students
        .iter()
        .find(|s| &s.id == id)
        .map(Student::full_name)
        .unwrap_or_else(|| id.to_string())
}

fn print_draft(controller: &RollCallController) {
    let state = controller.state();
    println!();
    for entry in state.draft.entries() {
        let marker = if entry.is_edited() { "*" } else { " " };
        println!(
            "{} {:<30} {:<8} {}",
            marker,
            student_name(&state.students, &entry.student_id),
            entry.status.as_str(),
            entry.comment
        );
    }
    for failure in &state.failed {
        println!(
            "  ❌ {} not saved: {}",
            student_name(&state.students, &failure.student_id),
            failure.reason
        );
    }
    println!();
}

fn report(result: Result<SaveOutcome, RollCallError>) {
    match result {
        Ok(SaveOutcome::Saved { saved }) => println!("✅ Saved {} attendance records", saved),
        Ok(SaveOutcome::Partial { saved, failed }) => {
            println!("⚠️  Saved {} records, {} failed:", saved, failed.len());
            for failure in failed {
                println!("   {} ({})", failure.student_id, failure.reason);
            }
        }
        Err(e) => eprintln!("❌ {}", e),
    }
}
