//! The shell session: routing, guarded pages and command dispatch.
//!
//! DESIGN
//! ======
//! Every non-login path mounts a fresh `ProtectedRoute` under the view scope.
//! Guard redirects move the router to the login path; the shell then
//! unmounts the route, the same way leaving a page unmounts its guard.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::rc::Rc;

use super::command::{self, Command, HELP};
use super::router::Router;
use super::views;
use crate::nav::counts::{PendingCounts, invalidate_pending_counts, load_pending_counts};
use crate::nav::menu::{build_navigation, find_entry};
use crate::state::scope::Scope;
use crate::state::session::{SessionError, SessionStore};
use crate::util::auth::{Navigator, ProtectedRoute, Rendered};
use crate::util::toast::{ToastKind, ToastQueue};

/// Result of one command.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Continue(String),
    Quit,
}

pub struct Shell {
    scope: Scope,
    store: SessionStore,
    router: Rc<Router>,
    toasts: ToastQueue,
    login_path: String,
    home_path: String,
    route: Option<ProtectedRoute>,
    counts: PendingCounts,
}

impl Shell {
    /// `toasts` must be the queue the store notifies, so the shell can
    /// print what each command produced.
    pub fn new(store: SessionStore, toasts: ToastQueue, login_path: &str, home_path: &str) -> Self {
        let root = Scope::root();
        root.provide_session(store.clone());
        Self {
            scope: root.child(),
            store,
            router: Rc::new(Router::new(home_path)),
            toasts,
            login_path: login_path.to_owned(),
            home_path: home_path.to_owned(),
            route: None,
            counts: PendingCounts::default(),
        }
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn counts(&self) -> PendingCounts {
        self.counts
    }

    /// Probe the session and show the start page.
    pub async fn start(&mut self) -> String {
        self.store.probe().await;
        let path = self.router.current();
        self.enter(&path);
        self.refresh_counts().await;
        self.with_toasts(self.screen())
    }

    /// Parse and run one input line.
    pub async fn run_line(&mut self, line: &str) -> Step {
        match command::parse(line) {
            Ok(Some(command)) => self.execute(command).await,
            Ok(None) => Step::Continue(String::new()),
            Err(e) => Step::Continue(e.to_string()),
        }
    }

    pub async fn execute(&mut self, command: Command) -> Step {
        tracing::debug!(?command, "shell command");
        let output = match command {
            Command::Login { username, password } => self.login(&username, &password).await,
            Command::Logout => {
                if self.store.logout().await.is_ok() {
                    self.counts = PendingCounts::default();
                }
                self.sync_route();
                self.screen()
            }
            Command::Whoami => views::whoami(&self.store.state()),
            Command::Menu => {
                self.refresh_counts().await;
                let groups = build_navigation(
                    self.store.role(),
                    self.counts.incomplete_patients,
                    self.counts.upcoming_events,
                );
                if groups.is_empty() {
                    "no menu: not signed in".to_owned()
                } else {
                    views::sidebar(&groups)
                }
            }
            Command::Open(path) => {
                if !self.router.is_at(&path) {
                    self.router.navigate(&path);
                }
                self.enter(&path);
                self.screen()
            }
            Command::Refresh => {
                invalidate_pending_counts(self.store.cache().as_ref());
                self.store.refresh().await;
                self.sync_route();
                self.refresh_counts().await;
                self.screen()
            }
            Command::Help => HELP.to_owned(),
            Command::Quit => return Step::Quit,
        };
        Step::Continue(self.with_toasts(output))
    }

    async fn login(&mut self, username: &str, password: &str) -> String {
        match self.store.login(username, password).await {
            Ok(()) => {
                if self.router.is_at(&self.login_path) {
                    let home = self.home_path.clone();
                    self.router.navigate(&home);
                    self.enter(&home);
                }
                self.refresh_counts().await;
                self.screen()
            }
            Err(SessionError::MissingCredentials) => SessionError::MissingCredentials.to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "login command failed");
                self.counts = PendingCounts::default();
                self.sync_route();
                self.screen()
            }
        }
    }

    /// Mount the page at `path`, replacing the current one.
    fn enter(&mut self, path: &str) {
        self.route = None;
        if path != self.login_path {
            let navigator: Rc<dyn Navigator> = self.router.clone();
            self.route = Some(ProtectedRoute::mount(&self.scope, navigator, &self.login_path));
        }
        self.sync_route();
    }

    fn sync_route(&mut self) {
        if self.route.is_some() && self.router.is_at(&self.login_path) {
            self.route = None;
        }
    }

    async fn refresh_counts(&mut self) {
        self.counts = load_pending_counts(self.store.cache().as_ref(), &self.store.api(), self.store.role()).await;
    }

    fn screen(&self) -> String {
        let state = self.store.state();
        let body = if self.router.is_at(&self.login_path) {
            views::login_page(state.error.as_deref())
        } else {
            let path = self.router.current();
            let rendered = match &self.route {
                Some(route) => route.render(|state| {
                    let label = state.role().and_then(|role| find_entry(role, &path));
                    views::page(label, &path)
                }),
                None => Rendered::Content(views::page(None, &path)),
            };
            match rendered {
                Rendered::Placeholder => "loading...".to_owned(),
                Rendered::Nothing => String::new(),
                Rendered::Content(page) => page,
            }
        };
        format!("{}\n{body}", views::header(&state, self.counts))
    }

    fn with_toasts(&self, output: String) -> String {
        let mut lines: Vec<String> = self
            .toasts
            .drain()
            .into_iter()
            .map(|toast| match toast.kind {
                ToastKind::Success => format!("[ok] {}", toast.message),
                ToastKind::Error => format!("[error] {}", toast.message),
            })
            .collect();
        if !output.is_empty() {
            lines.push(output);
        }
        lines.join("\n")
    }
}
