//!
//! libris CLI binary
//! -----------------
//! Interactive console over the admin routing core: sign in (against the
//! backend or offline), navigate, and inspect the registered routes, the
//! sidebar menu and the open tabs.

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use tracing_subscriber::{fmt, EnvFilter};

use libris::app::AppContext;
use libris::cli::{print_menu, print_routes, print_tags};
use libris::config::AppConfig;
use libris::identity::UserType;

const HELP: &str = "Commands:
  login <user> <password> <user_type>   sign in against the backend (user_type 0=user 1=admin 2=root)
  offline <user> <user_type>            sign in without a backend
  go <path>                             navigate, e.g. go /book/list?page=2
  menu                                  sidebar entries for the current roles
  routes                                routes registered in the live router
  tags                                  open tabs and cached views
  status                                session and current location
  logout                                end the session
  help                                  show this help
  quit | exit                           leave";

fn parse_user_type(s: &str) -> Option<UserType> { s.parse::<i64>().ok().and_then(UserType::from_code) }

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let config = AppConfig::load().context("loading configuration")?;
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().context("Failed to build Tokio runtime")?;
    let app = AppContext::new(config).context("building app context")?;

    match rt.block_on(app.bootstrap()) {
        Ok(0) => {}
        Ok(n) => println!("preloaded {} routes from cached roles", n),
        Err(e) => eprintln!("preload failed: {}", e),
    }

    let mut rl = rustyline::DefaultEditor::new().context("Failed to create readline editor")?;
    println!("libris-cli. Type 'help' for commands.");
    loop {
        let line = match rl.readline("libris> ") {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["quit"] | ["exit"] => break,
            ["help"] => println!("{}", HELP),
            ["login", user, password, user_type] => {
                let Some(ut) = parse_user_type(user_type) else {
                    eprintln!("user_type must be 0, 1 or 2");
                    continue;
                };
                match rt.block_on(app.login(user, password, ut)) {
                    Ok(landing) => go(&rt, &app, &landing),
                    Err(e) => eprintln!("login failed: {}", e),
                }
            }
            ["offline", user, user_type] => {
                let Some(ut) = parse_user_type(user_type) else {
                    eprintln!("user_type must be 0, 1 or 2");
                    continue;
                };
                match app.login_offline(user, ut) {
                    Ok(landing) => go(&rt, &app, &landing),
                    Err(e) => eprintln!("login failed: {}", e),
                }
            }
            ["go", path] => go(&rt, &app, path),
            ["menu"] => print_menu(&app.menu()),
            ["routes"] => print_routes(&app.router.get_routes()),
            ["tags"] => print_tags(&app.tags_view.visited_views(), &app.tags_view.cached_views()),
            ["status"] => {
                let s = app.session.snapshot();
                println!("user: {}  roles: {:?}  token: {}", s.username, s.roles, if s.token.is_empty() { "none" } else { "set" });
                println!("materialized: {}", app.navigator.guard().materialized());
                match app.navigator.current() {
                    Some(c) => println!("at: {}  title: {}", c.full_path, app.title.get()),
                    None => println!("at: nowhere"),
                }
            }
            ["logout"] => match app.logout() {
                Ok(()) => println!("signed out"),
                Err(e) => eprintln!("logout failed: {}", e),
            },
            _ => eprintln!("unknown command '{}'; try 'help'", line),
        }
        for msg in app.notifications.drain() {
            eprintln!("! {}", msg);
        }
    }
    Ok(())
}

fn go(rt: &tokio::runtime::Runtime, app: &AppContext, path: &str) {
    match rt.block_on(app.navigate(path)) {
        Ok(out) => {
            if !out.redirects.is_empty() {
                println!("redirected via {}", out.redirects.join(" -> "));
            }
            println!("{}  [{}]", out.location.full_path, app.title.get());
        }
        Err(e) => eprintln!("navigation failed: {}", e),
    }
}
