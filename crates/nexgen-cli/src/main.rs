use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::{Args, Parser, Subcommand};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use nexgen_contracts::auth::{require_admin, AuthError, Registration, SessionManager};
use nexgen_contracts::chat::{parse_chat_input, ChatAction, HELP_LINES};
use nexgen_contracts::events::ActivityLog;
use nexgen_contracts::models::{
    projects_owned_by, search_leads, search_users, ChatMessage, ChatRole, Conversation, Lead,
    LeadStatus, ProjectIdea, ProposalData, ScoreBand, ServiceType, StartupAnalysis,
    StartupFeasibility, User,
};
use nexgen_contracts::store::{FileBackend, LocalDatabase, Repository};
use nexgen_engine::consultant::{Consultant, ConsultantOptions};
use nexgen_engine::intake::{ContactForm, LeadIntake};
use nexgen_engine::pipeline::{IdeaMode, PipelineError, ResultTab, StartupBuilder};
use nexgen_engine::proposals::{ProposalService, ProposalSource};
use nexgen_engine::provider::{DryrunTransport, GeminiTransport};
use nexgen_engine::{CancelToken, Credential, EngineConfig, GenerationContext, GenerativeTransport};
use tracing_subscriber::EnvFilter;

const MAX_IMAGE_DIM: u32 = 1536;
const EXIT_GATED: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "nexgen", version, about = "NexGen Digital back-office and AI tools")]
struct Cli {
    /// Directory holding the JSON collections and activity.jsonl.
    #[arg(long, global = true, default_value = ".nexgen")]
    data_dir: PathBuf,
    /// Answer every generative call offline with canned content.
    #[arg(long, global = true)]
    dryrun: bool,
    #[arg(long, global = true)]
    model: Option<String>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Seed the local database. Safe to repeat.
    Init,
    Chat(ChatArgs),
    Startup(StartupArgs),
    Proposal(ProposalArgs),
    #[command(subcommand)]
    Leads(LeadsCommand),
    #[command(subcommand)]
    Users(UsersCommand),
    #[command(subcommand)]
    Projects(ProjectsCommand),
    Login {
        email: String,
        password: String,
    },
    Register(RegisterArgs),
    Guest {
        name: String,
    },
    Logout,
    Whoami,
    Contact(ContactArgs),
    /// Ask for a formal quote on one of your projects.
    Quote {
        project_id: String,
        #[arg(long)]
        message: Option<String>,
    },
}

#[derive(Debug, Args)]
struct ChatArgs {
    #[arg(long)]
    no_search: bool,
    /// Let the consultant register leads through function calling.
    #[arg(long)]
    capture_leads: bool,
}

#[derive(Debug, Args)]
struct StartupArgs {
    /// Business idea, or a site URL with --site.
    idea: String,
    #[arg(long)]
    site: bool,
    /// Also generate the landing page.
    #[arg(long)]
    website: bool,
    /// Where to write the landing page HTML.
    #[arg(long)]
    html_out: Option<PathBuf>,
    /// Print a WhatsApp link to request this startup.
    #[arg(long)]
    quote: bool,
}

#[derive(Debug, Args)]
struct ProposalArgs {
    /// Generate (or reuse) the proposal stored on this lead.
    #[arg(long, conflicts_with_all = ["client", "title", "description"])]
    lead: Option<String>,
    #[arg(long)]
    client: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum LeadsCommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: String,
    },
    Status {
        id: String,
        /// new, contacted, confirmed or cancelled
        status: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum UsersCommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum ProjectsCommand {
    /// Your projects; admins see every project.
    List,
    Add(ProjectFields),
    Edit {
        id: String,
        #[command(flatten)]
        fields: ProjectEdits,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Args)]
struct ProjectFields {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    #[arg(long = "feature")]
    features: Vec<String>,
    #[arg(long)]
    budget: Option<String>,
    #[arg(long = "image")]
    images: Vec<PathBuf>,
    #[arg(long)]
    drive_link: Option<String>,
}

#[derive(Debug, Args)]
struct ProjectEdits {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Replaces the feature list when given.
    #[arg(long = "feature")]
    features: Vec<String>,
    #[arg(long)]
    budget: Option<String>,
    /// Appended to the existing images.
    #[arg(long = "image")]
    images: Vec<PathBuf>,
    #[arg(long)]
    drive_link: Option<String>,
}

#[derive(Debug, Args)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    password: String,
    #[arg(long = "confirm")]
    confirm_password: String,
}

#[derive(Debug, Args)]
struct ContactArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    company: Option<String>,
    /// web, mobile, ai, design, seo or ads
    #[arg(long, default_value = "web", value_parser = parse_service)]
    service: ServiceType,
    #[arg(long)]
    message: String,
}

fn parse_service(raw: &str) -> Result<ServiceType, String> {
    ServiceType::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = ServiceType::ALL.iter().map(|service| service.slug()).collect();
        format!("unknown service `{raw}` (expected one of: {})", known.join(", "))
    })
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("nexgen error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("nexgen: ignoring unreadable .env: {err}");
        }
    }
    init_tracing();

    let cli = Cli::parse();
    let app = App::open(&cli)?;
    let report = app.db.init()?;
    match cli.command {
        Command::Init => {
            println!(
                "Base de dados pronta em {} ({} utilizadores adicionados, projetos semeados: {}).",
                cli.data_dir.display(),
                report.users_added,
                report.projects_seeded
            );
            Ok(0)
        }
        Command::Chat(args) => {
            app.run_chat(args)?;
            Ok(0)
        }
        Command::Startup(args) => app.run_startup(args),
        Command::Proposal(args) => app.run_proposal(args),
        Command::Leads(command) => app.run_leads(command),
        Command::Users(command) => app.run_users(command),
        Command::Projects(command) => app.run_projects(command),
        Command::Login { email, password } => {
            let user = app.sessions().login(&email, &password)?;
            println!("Olá, {} ({}).", user.name, user.role.as_str());
            Ok(0)
        }
        Command::Register(args) => {
            let user = app.sessions().register(&Registration {
                name: args.name,
                email: args.email,
                phone: args.phone,
                password: args.password,
                confirm_password: args.confirm_password,
            })?;
            println!("Conta criada para {} <{}>.", user.name, user.email);
            Ok(0)
        }
        Command::Guest { name } => {
            let user = app.sessions().continue_as_guest(&name)?;
            println!("Sessão de visitante iniciada para {}.", user.name);
            Ok(0)
        }
        Command::Logout => {
            app.sessions().logout()?;
            println!("Sessão terminada.");
            Ok(0)
        }
        Command::Whoami => {
            match app.sessions().current() {
                Some(user) => println!("{} <{}> [{}] id={}", user.name, user.email, user.role.as_str(), user.id),
                None => println!("Sem sessão iniciada."),
            }
            Ok(0)
        }
        Command::Contact(args) => {
            let lead = app.intake().register_contact(&ContactForm {
                name: args.name,
                company: args.company,
                email: args.email,
                service: args.service,
                message: args.message,
            })?;
            println!("Mensagem recebida. Lead {} registado.", lead.id);
            Ok(0)
        }
        Command::Quote { project_id, message } => app.run_quote(&project_id, message.as_deref()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

struct App {
    config: EngineConfig,
    db: LocalDatabase<FileBackend>,
    activity: ActivityLog,
    dryrun: bool,
}

impl App {
    fn open(cli: &Cli) -> Result<Self> {
        let mut config = EngineConfig::from_env();
        if let Some(model) = cli.model.as_deref().map(str::trim).filter(|model| !model.is_empty()) {
            config.model = model.to_string();
        }
        if let Some(secs) = cli.timeout_secs {
            config = config.with_timeout_secs(secs);
        }
        if cli.dryrun && config.credential.is_empty() {
            config.credential = Credential::new("dryrun");
        }

        fs::create_dir_all(&cli.data_dir)
            .with_context(|| format!("failed to create {}", cli.data_dir.display()))?;
        let db = LocalDatabase::new(FileBackend::new(&cli.data_dir));
        let activity = ActivityLog::new(
            cli.data_dir.join("activity.jsonl"),
            uuid::Uuid::new_v4().to_string(),
        );
        tracing::debug!(
            model = %config.model,
            dryrun = cli.dryrun,
            keyed = !config.credential.is_empty(),
            "configuration loaded"
        );
        Ok(Self {
            config,
            db,
            activity,
            dryrun: cli.dryrun,
        })
    }

    fn context(&self) -> GenerationContext {
        let transport: Arc<dyn GenerativeTransport> = if self.dryrun {
            Arc::new(DryrunTransport)
        } else {
            Arc::new(GeminiTransport::new(&self.config))
        };
        GenerationContext::new(self.config.clone(), transport).with_activity(self.activity.clone())
    }

    fn sessions(&self) -> SessionManager<'_, FileBackend> {
        SessionManager::new(&self.db)
    }

    fn intake(&self) -> LeadIntake<'_, FileBackend> {
        LeadIntake::new(&self.db, &self.config).with_activity(self.activity.clone())
    }

    fn current_user(&self) -> Result<User> {
        Ok(self.sessions().current().ok_or(AuthError::NotSignedIn)?)
    }

    fn require_admin(&self) -> Result<User> {
        let current = self.sessions().current();
        Ok(require_admin(current.as_ref())?.clone())
    }

    fn run_chat(&self, args: ChatArgs) -> Result<()> {
        let mut consultant = Consultant::new(self.context()).with_options(ConsultantOptions {
            web_search: !args.no_search,
            capture_leads: args.capture_leads,
        });
        let mut conversation = Conversation::new();
        let mut pending_image: Option<String> = None;
        let stdin = io::stdin();
        let mut line = String::new();

        println!("Consultor NexGen. Escreva /help para ver os comandos.");
        loop {
            print!("> ");
            io::stdout().flush()?;

            line.clear();
            let read = match stdin.read_line(&mut line) {
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            if read == 0 {
                break;
            }

            let intent = parse_chat_input(line.trim_end_matches(['\n', '\r']));
            match intent.action {
                ChatAction::Noop => {}
                ChatAction::Help => {
                    for help in HELP_LINES {
                        println!("{help}");
                    }
                }
                ChatAction::Quit => break,
                ChatAction::AttachImage => match intent.path.as_deref() {
                    Some(path) => match prepare_image_data_url(Path::new(path), MAX_IMAGE_DIM) {
                        Ok(data_url) => {
                            pending_image = Some(data_url);
                            println!("Imagem anexada: {path}");
                        }
                        Err(err) => println!("Não foi possível ler a imagem: {err:#}"),
                    },
                    None => println!("/image requer um caminho"),
                },
                ChatAction::DetachImage => {
                    pending_image = None;
                    println!("Imagem removida.");
                }
                ChatAction::SetWebSearch => {
                    let mut options = consultant.options();
                    options.web_search = intent.enabled.unwrap_or(true);
                    consultant.set_options(options);
                    println!("Pesquisa web: {}", on_off(options.web_search));
                }
                ChatAction::SetLeadCapture => {
                    let mut options = consultant.options();
                    options.capture_leads = intent.enabled.unwrap_or(true);
                    consultant.set_options(options);
                    println!("Registo de contactos: {}", on_off(options.capture_leads));
                }
                ChatAction::ShowHistory => {
                    if conversation.is_empty() {
                        println!("Ainda não há mensagens.");
                    }
                    for message in conversation.messages() {
                        let who = match message.role {
                            ChatRole::User => "você",
                            ChatRole::Model => "consultor",
                        };
                        let image = if message.image.is_some() { " [imagem]" } else { "" };
                        println!("{who}{image}: {}", message.text);
                    }
                }
                ChatAction::ClearConversation => {
                    let dropped = conversation.len();
                    conversation = Conversation::new();
                    pending_image = None;
                    println!("Conversa reiniciada ({dropped} mensagens removidas).");
                }
                ChatAction::Unknown => {
                    println!(
                        "Comando desconhecido: {}",
                        intent.command.as_deref().unwrap_or(intent.raw.as_str())
                    );
                }
                ChatAction::Message => {
                    let text = intent.message.unwrap_or_default();
                    let image = pending_image.take();
                    let reply = consultant.reply(
                        &text,
                        image.as_deref(),
                        conversation.messages(),
                        &CancelToken::new(),
                    );
                    println!("{}", reply.text);

                    if reply.error.is_none() {
                        let mut sent = ChatMessage::user(text);
                        if let Some(image) = image {
                            sent = sent.with_image(image);
                        }
                        conversation.push(sent);
                        conversation.push(ChatMessage::model(reply.text.clone()));
                    }
                    if let Some(draft) = reply.lead {
                        let lead = self.intake().register_chat_lead(draft)?;
                        println!("(lead {} registado para {})", lead.id, lead.name);
                    }
                }
            }
        }
        Ok(())
    }

    fn run_startup(&self, args: StartupArgs) -> Result<i32> {
        let mode = if args.site { IdeaMode::Site } else { IdeaMode::Idea };
        let mut builder = StartupBuilder::new(self.context());

        let feasibility = match builder.submit_idea(&args.idea, mode) {
            Ok(feasibility) => feasibility.clone(),
            Err(err) => return report_pipeline_error(err),
        };
        print_feasibility(&feasibility);

        if !builder.can_continue() {
            println!("\nA pontuação não permite avançar para o plano completo. Reveja o conselho de pivot.");
            return Ok(EXIT_GATED);
        }

        let analysis = match builder.generate_plan() {
            Ok(analysis) => analysis.clone(),
            Err(err) => return report_pipeline_error(err),
        };
        print_plan(&analysis);

        if args.website || args.html_out.is_some() {
            if let Err(err) = builder.activate_tab(ResultTab::Website) {
                return report_pipeline_error(err);
            }
            let html = builder.website_html().unwrap_or_default();
            match &args.html_out {
                Some(path) => {
                    fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
                    println!("\nLanding page gravada em {}", path.display());
                }
                None => println!("\n{html}"),
            }
        }

        if args.quote {
            let quote = self.intake().startup_quote(&analysis);
            println!("\nPedir este projeto no WhatsApp:\n{}", quote.whatsapp_url);
            quote.sheet.wait();
        }
        Ok(0)
    }

    fn run_proposal(&self, args: ProposalArgs) -> Result<i32> {
        self.require_admin()?;
        let service = ProposalService::new(self.context());
        let cancel = CancelToken::new();
        let proposal = match (&args.lead, &args.client) {
            (Some(lead_id), _) => {
                let (proposal, source) = service.for_lead(&self.db, lead_id, &cancel)?;
                if source == ProposalSource::Cached {
                    println!("(proposta já guardada neste lead)");
                }
                proposal
            }
            (None, Some(client)) => {
                let (Some(title), Some(description)) = (args.title.as_deref(), args.description.as_deref())
                else {
                    bail!("--client needs --title and --description");
                };
                service.manual(client, title, description, &cancel)?
            }
            (None, None) => bail!("use --lead <id> or --client with --title and --description"),
        };

        if args.json {
            println!("{}", serde_json::to_string_pretty(&proposal)?);
        } else {
            print_proposal(&proposal);
        }
        Ok(0)
    }

    fn run_leads(&self, command: LeadsCommand) -> Result<i32> {
        self.require_admin()?;
        match command {
            LeadsCommand::List { search } => {
                let leads = self.db.leads().list();
                let rows = search_leads(&leads, search.as_deref().unwrap_or_default());
                if rows.is_empty() {
                    println!("Nenhum lead encontrado.");
                }
                for lead in rows {
                    print_lead_row(lead);
                }
            }
            LeadsCommand::Show { id } => {
                let lead = self
                    .db
                    .leads()
                    .get(&id)
                    .with_context(|| format!("lead `{id}` not found"))?;
                println!("{}", serde_json::to_string_pretty(&lead)?);
            }
            LeadsCommand::Status { id, status } => {
                let Some(status) = LeadStatus::parse(&status) else {
                    bail!("unknown status `{status}` (new, contacted, confirmed, cancelled)");
                };
                match self.db.update_lead_status(&id, status)? {
                    Some(lead) => println!("Lead {} agora está {}.", lead.id, lead.status.label()),
                    None => println!("Lead {id} não existe; nada alterado."),
                }
            }
            LeadsCommand::Delete { id } => {
                let remaining = self.db.leads().delete(&id)?;
                println!("{} leads restantes.", remaining.len());
            }
        }
        Ok(0)
    }

    fn run_users(&self, command: UsersCommand) -> Result<i32> {
        let admin = self.require_admin()?;
        match command {
            UsersCommand::List { search } => {
                let users = self.db.users().list();
                for user in search_users(&users, search.as_deref().unwrap_or_default()) {
                    println!("{:<14} {:<7} {:<28} {}", user.id, user.role.as_str(), user.email, user.name);
                }
            }
            UsersCommand::Delete { id } => {
                if id == admin.id {
                    bail!("refusing to delete the signed-in account");
                }
                let remaining = self.db.users().delete(&id)?;
                println!("{} utilizadores restantes.", remaining.len());
            }
        }
        Ok(0)
    }

    fn run_projects(&self, command: ProjectsCommand) -> Result<i32> {
        let user = self.current_user()?;
        match command {
            ProjectsCommand::List => {
                let projects = self.db.projects().list();
                let rows: Vec<&ProjectIdea> = if user.is_admin() {
                    projects.iter().collect()
                } else {
                    projects_owned_by(&projects, &user.id)
                };
                if rows.is_empty() {
                    println!("Ainda não há projetos.");
                }
                for project in rows {
                    println!(
                        "{:<38} {:<30} {} imagem(ns) {}",
                        project.id,
                        project.title,
                        project.images.len(),
                        project.budget_range.as_deref().unwrap_or("-")
                    );
                }
            }
            ProjectsCommand::Add(fields) => {
                let mut project = ProjectIdea::new(fields.title.trim(), fields.description.trim());
                project.owner_id = Some(user.id.clone());
                project.features = clean_list(fields.features);
                project.budget_range = non_blank(fields.budget);
                project.drive_link = non_blank(fields.drive_link);
                project.images = load_images(&fields.images)?;
                self.db.projects().upsert(project.clone())?;
                println!("Projeto {} criado.", project.id);
            }
            ProjectsCommand::Edit { id, fields } => {
                let mut project = self.owned_project(&user, &id)?;
                if let Some(title) = non_blank(fields.title) {
                    project.title = title;
                }
                if let Some(description) = non_blank(fields.description) {
                    project.description = description;
                }
                if !fields.features.is_empty() {
                    project.features = clean_list(fields.features);
                }
                if fields.budget.is_some() {
                    project.budget_range = non_blank(fields.budget);
                }
                if fields.drive_link.is_some() {
                    project.drive_link = non_blank(fields.drive_link);
                }
                project.images.extend(load_images(&fields.images)?);
                self.db.projects().upsert(project)?;
                println!("Projeto {id} atualizado.");
            }
            ProjectsCommand::Delete { id } => {
                self.owned_project(&user, &id)?;
                self.db.projects().delete(&id)?;
                println!("Projeto {id} removido.");
            }
        }
        Ok(0)
    }

    fn run_quote(&self, project_id: &str, message: Option<&str>) -> Result<i32> {
        let user = self.current_user()?;
        let project = self.owned_project(&user, project_id)?;
        let quote = self.intake().request_quote(&user, &project, message)?;
        println!("Pedido registado (lead {}).", quote.lead.id);
        println!("Envie ao administrador pelo WhatsApp:\n{}", quote.whatsapp_url);
        quote.sheet.wait();
        Ok(0)
    }

    /// Owners may change their own projects; admins may change any.
    fn owned_project(&self, user: &User, id: &str) -> Result<ProjectIdea> {
        let project = self
            .db
            .projects()
            .get(id)
            .with_context(|| format!("project `{id}` not found"))?;
        if !user.is_admin() && !project.owned_by(&user.id) {
            return Err(AuthError::NotAuthorized.into());
        }
        Ok(project)
    }
}

fn report_pipeline_error(err: PipelineError) -> Result<i32> {
    match err {
        PipelineError::Generation(err) => {
            eprintln!("{}", err.user_message());
            tracing::debug!(error = %err, "startup builder stopped");
            Ok(1)
        }
        other => Err(other.into()),
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "ligada"
    } else {
        "desligada"
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|value| non_blank(Some(value)))
        .collect()
}

fn load_images(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|path| prepare_image_data_url(path, MAX_IMAGE_DIM))
        .collect()
}

/// Downscales to `max_dim` and re-encodes as JPEG. Files the image crate
/// cannot decode are passed through with a MIME type guessed from the
/// extension.
fn prepare_image_data_url(path: &Path, max_dim: u32) -> Result<String> {
    let (bytes, mime) = match image::open(path) {
        Ok(image) => {
            let image = if image.width() > max_dim || image.height() > max_dim {
                image.resize(max_dim, max_dim, FilterType::Triangle)
            } else {
                image
            };
            let mut bytes = Vec::new();
            JpegEncoder::new_with_quality(&mut bytes, 90)
                .encode_image(&DynamicImage::ImageRgb8(image.to_rgb8()))
                .with_context(|| format!("failed to encode {}", path.display()))?;
            (bytes, "image/jpeg")
        }
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "image decode failed, sending raw bytes");
            let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            (bytes, guess_image_mime(path))
        }
    };
    Ok(format!("data:{mime};base64,{}", BASE64.encode(bytes)))
}

fn guess_image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

fn print_feasibility(feasibility: &StartupFeasibility) {
    println!(
        "Viabilidade: {}/100 [{}] ({})",
        feasibility.score,
        score_band_label(feasibility.band()),
        feasibility.verdict.as_str()
    );
    if !feasibility.summary.is_empty() {
        println!("{}", feasibility.summary);
    }
    print_list("Pontos fortes", &feasibility.strengths);
    print_list("Pontos fracos", &feasibility.weaknesses);
    if let Some(advice) = feasibility.pivot_advice.as_deref().filter(|advice| !advice.trim().is_empty()) {
        println!("\nConselho de pivot: {advice}");
    }
}

fn score_band_label(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Strong => "forte",
        ScoreBand::Moderate => "moderada",
        ScoreBand::Weak => "fraca",
    }
}

fn print_plan(analysis: &StartupAnalysis) {
    println!("\n== {} ==", analysis.name);
    if !analysis.slogan.is_empty() {
        println!("{}", analysis.slogan);
    }
    for (label, value) in [
        ("Problema", &analysis.problem),
        ("Solução", &analysis.solution),
        ("Mercado", &analysis.market_size),
        ("Monetização", &analysis.monetization),
        ("Marketing", &analysis.marketing_strategy),
    ] {
        if !value.is_empty() {
            println!("{label}: {value}");
        }
    }
    print_list("Concorrentes", &analysis.competitors);
    if !analysis.colors.is_empty() {
        println!("Cores: {}", analysis.colors.join(" "));
    }
    println!(
        "\nMVP: {} ({})\nIdeal: {} ({})",
        analysis.budgets.mvp.range,
        analysis.budgets.mvp.timeline,
        analysis.budgets.ideal.range,
        analysis.budgets.ideal.timeline
    );
}

fn print_proposal(proposal: &ProposalData) {
    println!("# {}", proposal.title);
    if let Some(subtitle) = &proposal.subtitle {
        println!("{subtitle}");
    }
    println!("\n{}", proposal.executive_summary);
    if !proposal.scope.is_empty() {
        println!("\nEscopo:");
        for item in &proposal.scope {
            println!("- {}: {}", item.title, item.description);
        }
    }
    if !proposal.tech_stack.is_empty() {
        println!("\nTecnologias: {}", proposal.tech_stack.join(", "));
    }
    if !proposal.timeline.is_empty() {
        println!("\nCronograma:");
        for phase in &proposal.timeline {
            println!("- {} ({}): {}", phase.phase, phase.duration, phase.deliverable);
        }
    }
    println!("\nInvestimento: {}", proposal.investment_value);
    if !proposal.investment_details.is_empty() {
        println!("{}", proposal.investment_details);
    }
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n{label}:");
    for item in items {
        println!("- {item}");
    }
}

fn print_lead_row(lead: &Lead) {
    let proposal = if lead.generated_proposal.is_some() { " [proposta]" } else { "" };
    println!(
        "{}  {:<11} {}  {} <{}>  {}{}",
        lead.created_at.format("%Y-%m-%d"),
        lead.status.label(),
        lead.id,
        lead.name,
        lead.contact,
        lead.interest,
        proposal
    );
}
