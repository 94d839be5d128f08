mod auth;
mod dashboard;
mod profile;

use log::info;
use std::error::Error;
use std::io::Write as _;
use std::sync::Arc;
use tokio::io::{ AsyncBufReadExt, BufReader, Lines, Stdin };

use crate::api::ApiClient;
use crate::cli::Args;
use crate::session::{ FileSessionStore, SessionStore };

/// Shared application state, owned here and handed to screens by reference.
pub struct App {
    pub args: Args,
    pub api: Arc<ApiClient>,
    pub session: Arc<dyn SessionStore>,
}

/// Line-oriented stdin wrapper for the console screens.
pub(crate) struct Console {
    lines: Lines<BufReader<Stdin>>,
    eof: bool,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            eof: false,
        }
    }

    pub fn eof(&self) -> bool {
        self.eof
    }

    pub async fn prompt(&mut self, label: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
        print!("{}: ", label);
        std::io::stdout().flush()?;
        match self.lines.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => {
                self.eof = true;
                Ok(String::new())
            }
        }
    }
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let api = Arc::new(ApiClient::new(&args.api_base_url)?);
    let session: Arc<dyn SessionStore> = Arc::new(
        FileSessionStore::new(&args.session_path, &args.token_path)
    );
    let app = App { args, api, session };
    let mut console = Console::new();

    // A persisted session skips the auth screen entirely.
    let mut user = app.session.load_user()?;

    loop {
        if console.eof() {
            break;
        }
        match user.take() {
            None =>
                match auth::run(&app, &mut console).await? {
                    Some(logged_in) => {
                        user = Some(logged_in);
                    }
                    None => {
                        break;
                    }
                }
            Some(current) =>
                match dashboard::run(&app, &mut console, current).await? {
                    dashboard::Exit::Logout => {
                        app.session.clear_user()?;
                        app.session.clear_token()?;
                        info!("Session cleared");
                    }
                    dashboard::Exit::Quit => {
                        break;
                    }
                }
        }
    }

    println!("Goodbye.");
    Ok(())
}
