use std::error::Error;
use std::fmt;
use std::io::{self, Write};

use crate::api;
use crate::cli::{DashArgs, ListArgs, ServeArgs};
use crate::client::{ClientError, HttpPersonApi, PersonApi};
use crate::config::{ConfigError, FileConfig};
use crate::dashboard::event_loop;
use crate::dashboard::input::{self, HELP};
use crate::dashboard::view::{self, Palette};
use crate::dashboard::Session;
use crate::domain::person::Person;
use crate::store::{Store, StoreError};

pub fn run_serve(
    config: &FileConfig,
    db: Option<std::path::PathBuf>,
    args: &ServeArgs,
) -> Result<(), AppError> {
    let settings = config.serve_settings(db, args);
    let store = Store::new(settings.db_path);
    store.bootstrap()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(api::serve(store, &settings.bind))?;
    Ok(())
}

pub fn run_list(config: &FileConfig, args: &ListArgs) -> Result<Vec<Person>, AppError> {
    let settings = config.list_settings(args);
    let client = HttpPersonApi::new(&settings.server_url, settings.timeout);
    Ok(client.list()?)
}

pub fn run_dash(config: &FileConfig, args: &DashArgs) -> Result<(), AppError> {
    let settings = config.dash_settings(args)?;
    let client = HttpPersonApi::new(&settings.client.server_url, settings.client.timeout);
    let mut session = Session::new(client, settings.poll_interval);

    let (tx, rx) = crossbeam::channel::unbounded();
    std::thread::Builder::new()
        .name("dash-input".to_string())
        .spawn(move || input::forward_lines(io::stdin().lock(), &tx))?;

    eprintln!("{HELP}");
    let palette = Palette::auto();
    event_loop::run(&mut session, &rx, settings.poll_interval, |session| {
        let rendered = view::render_session(
            session.working(),
            session.phase(),
            session.message(),
            &palette,
        );
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{rendered}");
        let _ = stdout.flush();
    });
    Ok(())
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Store(StoreError),
    Client(ClientError),
    Config(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Store(err) => write!(f, "store error: {}", err),
            AppError::Client(err) => write!(f, "{}", err),
            AppError::Config(err) => write!(f, "{}", err),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Client(err) => Some(err),
            AppError::Config(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Store(value)
    }
}

impl From<ClientError> for AppError {
    fn from(value: ClientError) -> Self {
        AppError::Client(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}
