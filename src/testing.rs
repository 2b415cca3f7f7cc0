//! In-memory backend used by unit tests.
//!
//! `FakeApi` behaves like the real backend with one cookie: login sets the
//! server-side session, logout clears it, `/auth/me` reports it. Each call
//! computes its answer when it is issued; `hold` delays when the answer is
//! delivered so tests can force any settle order.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::{Value, json};

use crate::net::api::{ApiError, ClinicApi};
use crate::net::types::{City, Collaborator, LoginRequest, Role, SessionPayload, User};

pub(crate) const LOGIN: &str = "login";
pub(crate) const LOGOUT: &str = "logout";
pub(crate) const ME: &str = "me";
pub(crate) const PATIENTS: &str = "patients";
pub(crate) const EVENTS: &str = "events";

/// Releases one held call.
pub(crate) struct Gate(oneshot::Sender<()>);

impl Gate {
    pub(crate) fn release(self) {
        if self.0.send(()).is_err() {
            panic!("held call was never issued");
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeApi {
    accounts: RefCell<Vec<(String, String, SessionPayload)>>,
    session: RefCell<Option<SessionPayload>>,
    holds: RefCell<HashMap<&'static str, VecDeque<oneshot::Receiver<()>>>>,
    failures: RefCell<HashMap<&'static str, VecDeque<ApiError>>>,
    calls: RefCell<HashMap<&'static str, u32>>,
    patients: RefCell<Vec<Value>>,
    events: RefCell<Vec<Value>>,
}

impl FakeApi {
    pub(crate) fn new() -> Rc<Self> {
        let api = Rc::new(Self::default());
        api.add_account("ana", "correct", ana());
        api.add_account("bia", "secret", bia());
        api
    }

    pub(crate) fn add_account(&self, username: &str, password: &str, payload: SessionPayload) {
        self.accounts.borrow_mut().push((username.to_owned(), password.to_owned(), payload));
    }

    pub(crate) fn set_session(&self, payload: Option<SessionPayload>) {
        *self.session.borrow_mut() = payload;
    }

    pub(crate) fn set_counts(&self, patients: usize, events: usize) {
        *self.patients.borrow_mut() = (0..patients).map(|i| json!({ "id": i })).collect();
        *self.events.borrow_mut() = (0..events).map(|i| json!({ "id": i })).collect();
    }

    /// Delay delivery of the next `op` call's result until the gate is released.
    pub(crate) fn hold(&self, op: &'static str) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.holds.borrow_mut().entry(op).or_default().push_back(rx);
        Gate(tx)
    }

    pub(crate) fn fail_next(&self, op: &'static str, error: ApiError) {
        self.failures.borrow_mut().entry(op).or_default().push_back(error);
    }

    pub(crate) fn calls(&self, op: &'static str) -> u32 {
        self.calls.borrow().get(op).copied().unwrap_or(0)
    }

    fn begin(&self, op: &'static str) -> (Option<ApiError>, Option<oneshot::Receiver<()>>) {
        *self.calls.borrow_mut().entry(op).or_default() += 1;
        let failure = self.failures.borrow_mut().get_mut(op).and_then(VecDeque::pop_front);
        let hold = self.holds.borrow_mut().get_mut(op).and_then(VecDeque::pop_front);
        (failure, hold)
    }

    async fn deliver<T>(hold: Option<oneshot::Receiver<()>>, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Some(rx) = hold {
            if rx.await.is_err() {
                return Err(ApiError::Transport("held call abandoned".to_owned()));
            }
        }
        result
    }
}

#[async_trait(?Send)]
impl ClinicApi for FakeApi {
    async fn login(&self, request: &LoginRequest) -> Result<SessionPayload, ApiError> {
        let (failure, hold) = self.begin(LOGIN);
        let result = match failure {
            Some(error) => Err(error),
            None => {
                let found = self
                    .accounts
                    .borrow()
                    .iter()
                    .find(|(u, p, _)| *u == request.username && *p == request.password)
                    .map(|(_, _, payload)| payload.clone());
                match found {
                    Some(payload) => {
                        self.set_session(Some(payload.clone()));
                        Ok(payload)
                    }
                    None => Err(ApiError::Rejected { status: 401, message: "Invalid credentials".to_owned() }),
                }
            }
        };
        Self::deliver(hold, result).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let (failure, hold) = self.begin(LOGOUT);
        let result = match failure {
            Some(error) => Err(error),
            None => {
                self.set_session(None);
                Ok(())
            }
        };
        Self::deliver(hold, result).await
    }

    async fn me(&self) -> Result<Option<SessionPayload>, ApiError> {
        let (failure, hold) = self.begin(ME);
        let result = match failure {
            Some(error) => Err(error),
            None => Ok(self.session.borrow().clone()),
        };
        Self::deliver(hold, result).await
    }

    async fn incomplete_patients(&self) -> Result<Vec<Value>, ApiError> {
        let (failure, hold) = self.begin(PATIENTS);
        let result = match failure {
            Some(error) => Err(error),
            None => Ok(self.patients.borrow().clone()),
        };
        Self::deliver(hold, result).await
    }

    async fn upcoming_events(&self) -> Result<Vec<Value>, ApiError> {
        let (failure, hold) = self.begin(EVENTS);
        let result = match failure {
            Some(error) => Err(error),
            None => Ok(self.events.borrow().clone()),
        };
        Self::deliver(hold, result).await
    }
}

pub(crate) fn ana() -> SessionPayload {
    SessionPayload {
        user: User { id: "1".to_owned(), username: "ana".to_owned(), name: "Ana".to_owned(), role: Role::Admin },
        collaborator: None,
    }
}

pub(crate) fn bia() -> SessionPayload {
    let user = User { id: "2".to_owned(), username: "bia".to_owned(), name: "Bia".to_owned(), role: Role::Collaborator };
    SessionPayload {
        collaborator: Some(Collaborator {
            id: "20".to_owned(),
            user_id: "2".to_owned(),
            city_id: "3".to_owned(),
            revenue_goal: 12_000.0,
            consultation_goal: 30,
            is_active: true,
            user: user.clone(),
            city: City { id: "3".to_owned(), name: "Campinas".to_owned(), state: "SP".to_owned() },
        }),
        user,
    }
}
