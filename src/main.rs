use std::sync::Arc;

use stillmind::config::AppConfig;
use stillmind::countries;
use stillmind::notify::{reminder_fire_time, LogNotifier, Notifier};
use stillmind::session::{types, Reminder, SessionManager, SignupRequest};
use stillmind::store::FileStore;

const USAGE: &str = "usage: stillmind <command>

commands:
  status                                      show session state
  signup <name> <username> <email> <password> [age] [country]
  login <email> <password>
  logout
  fav <content-id>                            toggle a favorite
  done <content-id>                           toggle completion
  remind <YYYY-MM-DD> <HH:mm>                 add a reminder
  setting <flag>                              toggle a settings flag
  countries                                   list countries from the lookup API";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "stillmind=debug".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let store = Arc::new(FileStore::open(&config.data_dir).await?);
    let mut session = SessionManager::new(store);
    session.hydrate().await;

    match (command.as_str(), &args[1..]) {
        ("status", _) => {
            match session.current_user() {
                Some(user) => println!("signed in as {} <{}>", user.username, user.email),
                None => println!("signed out"),
            }
            println!("registered accounts: {}", session.registered_users());
            println!("favorites: {:?}", session.favorites());
            println!("reminders: {}", session.reminders().len());
            println!(
                "dark mode: {}, notifications: {}",
                session.settings().is_enabled(types::DARK_MODE),
                session.settings().is_enabled(types::NOTIFICATIONS),
            );
        }
        ("signup", [name, username, email, password, rest @ ..]) => {
            let status = session
                .signup(SignupRequest {
                    name: name.clone(),
                    username: username.clone(),
                    email: email.clone(),
                    password: password.clone(),
                    age: rest.first().cloned(),
                    country: rest.get(1).cloned(),
                })
                .await?;
            println!("account created ({status:?}); you can now log in");
        }
        ("login", [email, password]) => {
            let status = session.login(email, password).await?;
            if let Some(user) = session.current_user() {
                println!("welcome back, {} ({status:?})", user.name);
            }
        }
        ("logout", _) => {
            let status = session.logout().await?;
            println!("signed out ({status:?})");
        }
        ("fav", [id]) => {
            let status = session.toggle_favorite(id).await?;
            println!("favorites now {:?} ({status:?})", session.favorites());
        }
        ("done", [id]) => {
            let status = session.toggle_done(id).await?;
            let state = if session.is_done(id) { "done" } else { "not done" };
            println!("{id} is {state} ({status:?})");
        }
        ("remind", [date, time]) => {
            let reminder = Reminder::new(date.clone(), time.clone());
            let fire_at = reminder_fire_time(&reminder)?;
            let status = session.add_reminder(reminder).await?;
            let handle = LogNotifier
                .schedule("Time to meditate", "Your daily session is waiting.", fire_at)
                .await?;
            println!("reminder stored ({status:?}), delivery handle {handle}");
        }
        ("setting", [flag]) => {
            let status = session.toggle_setting(flag).await?;
            let value = session.settings().is_enabled(flag);
            println!("{flag} = {value} ({status:?})");
        }
        ("countries", _) => {
            let client = reqwest::Client::new();
            let list = countries::fetch_countries(&client, &config.countries_url).await?;
            for country in &list {
                println!(
                    "{} ({})",
                    country.name,
                    country.cca2.as_deref().unwrap_or("??")
                );
            }
            println!("{} countries", list.len());
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}
