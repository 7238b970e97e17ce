//! A terminal front-end for the task service.
//!
//! ```text
//! organizo [list [QUERY]]
//! organizo due YYYY-MM-DD
//! organizo create TITLE YYYY-MM-DD [STATUS]
//! organizo complete ID
//! organizo delete ID
//! ```
//!
//! The service URL is read from `ORGANIZO_API_URL`. Set `RUST_LOG` to see more or less details.

use std::error::Error;

use chrono::NaiveDate;

use organizo::client::Client;
use organizo::config::{Config, BASE_URL_ENV_VAR};
use organizo::retry::Retrying;
use organizo::view::{local_today, UiEvent};
use organizo::{Session, TaskId, TaskStatus};

type Shell = Session<Retrying<Client>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = Config::from_env()?;
    log::info!("Using task service at {} (set {} to change it)", config.base_url, BASE_URL_ENV_VAR);
    let store = Retrying::new(Client::from_config(&config), config.retry);
    let session = Session::new(store);

    if session.load().await == false {
        log::warn!("Unable to fetch tasks, see the previous log lines for more info");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        [] | ["list"] => {},
        ["list", query] => {
            session.dispatch(UiEvent::Search(query.to_string())).await;
        },
        ["due", date] => {
            session.dispatch(UiEvent::SelectDate(parse_day(date)?)).await;
        },
        ["create", title, date, rest @ ..] => {
            create(&session, title, parse_day(date)?, rest.first().copied()).await?;
        },
        ["complete", id] => {
            session.dispatch(UiEvent::Complete(parse_id(id))).await;
        },
        ["delete", id] => {
            session.dispatch(UiEvent::Delete(parse_id(id))).await;
        },
        _ => {
            return Err(format!("Unexpected arguments {:?}", args).into());
        },
    }

    organizo::utils::print_shell_view(&session.view(local_today()));
    Ok(())
}

async fn create(session: &Shell, title: &str, due: NaiveDate, status: Option<&str>) -> Result<(), Box<dyn Error>> {
    let status = match status {
        None => TaskStatus::Pending,
        Some(s) => s.parse::<TaskStatus>()?,
    };

    session.dispatch(UiEvent::ToggleCreateForm).await;
    session.dispatch(UiEvent::SetCreateTitle(title.to_string())).await;
    session.dispatch(UiEvent::SetCreateDueDate(Some(due))).await;
    session.dispatch(UiEvent::SetCreateStatus(Some(status))).await;
    session.dispatch(UiEvent::SubmitCreate).await;
    Ok(())
}

fn parse_day(text: &str) -> Result<NaiveDate, Box<dyn Error>> {
    Ok(NaiveDate::parse_from_str(text, "%Y-%m-%d")?)
}

/// IDs that look like numbers are sent as numbers
fn parse_id(text: &str) -> TaskId {
    match text.parse::<u64>() {
        Ok(n) => TaskId::from(n),
        Err(_) => TaskId::from(text),
    }
}
