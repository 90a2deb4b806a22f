//! A line-oriented shell over the placement portal core.
//!
//! ```text
//! cargo run -p portal-shell             # talk to PLACEMENT_API_URL
//! cargo run -p portal-shell -- --stub   # talk to a built-in fake backend
//! ```
//!
//! Type `help` at the prompt for the command list.

use placement::prelude::*;
use placement_api::stub::StubGateway;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Whoami,
    Menu,
    Goto(String),
    Login {
        email: String,
        password: String,
    },
    Logout,
    Register {
        name: String,
        email: String,
        password: String,
        role: Role,
    },
    Forgot(String),
    Reset {
        token: String,
        password: String,
    },
    Get(String),
    Quit,
}

const HELP: &str = "\
commands:
  whoami                                  show the current session
  menu                                    show the navigation bar
  goto <path>                             navigate, e.g. goto /admin
  login <email> <password>
  logout
  register <name> <email> <password> <role>
  forgot <email>                          request a reset link
  reset <token> <new-password>
  get <path>                              authenticated GET, e.g. get user/profile
  quit";

impl Command {
    fn parse(line: &str) -> Result<Command, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let arity = |n: usize, usage: &str| {
            if words.len() == n + 1 {
                Ok(())
            } else {
                Err(format!("usage: {usage}"))
            }
        };

        match words.first().copied() {
            Some("help") | Some("?") => Ok(Command::Help),
            Some("whoami") => Ok(Command::Whoami),
            Some("menu") => Ok(Command::Menu),
            Some("goto") => {
                arity(1, "goto <path>")?;
                Ok(Command::Goto(words[1].to_string()))
            }
            Some("login") => {
                arity(2, "login <email> <password>")?;
                Ok(Command::Login {
                    email: words[1].into(),
                    password: words[2].into(),
                })
            }
            Some("logout") => Ok(Command::Logout),
            Some("register") => {
                arity(4, "register <name> <email> <password> <role>")?;
                let role = words[4].parse::<Role>().map_err(|e| e.to_string())?;
                Ok(Command::Register {
                    name: words[1].into(),
                    email: words[2].into(),
                    password: words[3].into(),
                    role,
                })
            }
            Some("forgot") => {
                arity(1, "forgot <email>")?;
                Ok(Command::Forgot(words[1].to_string()))
            }
            Some("reset") => {
                arity(2, "reset <token> <new-password>")?;
                Ok(Command::Reset {
                    token: words[1].into(),
                    password: words[2].into(),
                })
            }
            Some("get") => {
                arity(1, "get <path>")?;
                Ok(Command::Get(words[1].to_string()))
            }
            Some("quit") | Some("exit") => Ok(Command::Quit),
            Some(other) => Err(format!("unknown command {other:?}, try `help`")),
            None => Err(String::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn describe_session(session: &SessionSnapshot) -> String {
    match session.role() {
        Some(role) => format!("logged in as {role} (revision {})", session.revision()),
        None => format!("not logged in (revision {})", session.revision()),
    }
}

fn describe_navigation(nav: &Navigation) -> String {
    let mut out = format!("{} → {}", nav.path, nav.view);
    if let Some(reason) = nav.redirected {
        out.push_str(&format!("  (redirected: {reason:?})"));
    }
    for (name, value) in &nav.params {
        out.push_str(&format!("  {name}={value}"));
    }
    out
}

fn describe_menu(items: &[MenuItem]) -> String {
    items
        .iter()
        .map(|item| match item {
            MenuItem::Link { label, to } => format!("[{label} {}]", to.path()),
            MenuItem::Logout => "[Logout]".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs one command and returns what to print.
async fn execute<K: KeyValueStorage>(
    portal: &Portal<K>,
    command: Command,
) -> Result<String, PortalError> {
    let out = match command {
        Command::Help => HELP.to_string(),
        Command::Whoami => describe_session(&portal.session()),
        Command::Menu => describe_menu(&portal.menu()),
        Command::Goto(path) => describe_navigation(&portal.navigate(&path)?),
        Command::Login { email, password } => {
            describe_navigation(&portal.login(&email, &password).await?)
        }
        Command::Logout => describe_navigation(&portal.logout()?),
        Command::Register {
            name,
            email,
            password,
            role,
        } => {
            let request = RegisterRequest {
                name,
                email,
                password,
                role,
            };
            let user = portal.register(&request).await?;
            format!("registered {} as {} (id {})", user.email, user.role, user.id)
        }
        Command::Forgot(email) => portal.forgot_password(&email).await?,
        Command::Reset { token, password } => portal.reset_password(&token, &password).await?,
        Command::Get(path) => {
            let body: serde_json::Value = portal.get(&path).await?;
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
        }
        Command::Quit => String::new(),
    };
    Ok(out)
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

async fn start_stub() -> std::io::Result<StubGateway> {
    let gateway = StubGateway::start().await?;
    gateway.add_user("admin@uni.edu", "admin", Role::Admin);
    gateway.add_user("hr@acme.io", "employer", Role::Employer);
    gateway.add_user("ana@uni.edu", "student", Role::Student);
    gateway.add_job("Backend Intern", "Acme");
    gateway.add_job("Data Analyst", "Globex");
    Ok(gateway)
}

async fn repl<K: KeyValueStorage>(portal: Portal<K>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("{}", describe_session(&portal.session()));
    loop {
        stdout.write_all(b"portal> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                if !message.is_empty() {
                    println!("{message}");
                }
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        match execute(&portal, command).await {
            Ok(out) => println!("{out}"),
            Err(e) => println!("error: {e}"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    placement::init_logging();

    let use_stub = std::env::args().skip(1).any(|arg| arg == "--stub");
    let mut config = PortalConfig::from_env()?;

    // Kept alive until the shell exits.
    let _stub = if use_stub {
        let gateway = start_stub().await?;
        config = config.api_url(gateway.base_url());
        eprintln!(
            "stub backend at {} (admin@uni.edu/admin, hr@acme.io/employer, ana@uni.edu/student)",
            gateway.base_url()
        );
        Some(gateway)
    } else {
        None
    };

    tracing::info!(api_url = %config.api_url, "starting portal shell");
    match config.session_file.clone() {
        Some(path) => repl(Portal::new(&config, FileStorage::new(path))?).await?,
        None => repl(Portal::new(&config, MemoryStorage::new())?).await?,
    }
    Ok(())
}
