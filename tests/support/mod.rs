//! Scripted in-process implementations of the remote collaborators, with
//! call counters so tests can assert exactly which operations ran.

use anyhow::{anyhow, Result};
use cloudsign::client::{CloudClient, CloudSession, FamilyGroup, NotifySink, SignBonus};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct CallCounters {
    pub logins: AtomicUsize,
    pub personal_signs: AtomicUsize,
    pub group_lookups: AtomicUsize,
    pub family_signs: AtomicUsize,
    pub family_group_ids: Mutex<Vec<String>>,
}

#[derive(Clone)]
pub enum LoginBehavior {
    Succeed,
    Fail(&'static str),
    Panic(&'static str),
}

/// Per-account behavior script. Sign-in outcomes are drawn from a shared
/// queue in call order; calls past the end of the queue behave like a
/// duplicate sign-in (success, zero bonus).
#[derive(Clone)]
pub struct AccountScript {
    login: LoginBehavior,
    personal: Arc<Mutex<VecDeque<Result<u64, String>>>>,
    groups: Vec<String>,
    family: Arc<Mutex<VecDeque<Result<u64, String>>>>,
}

impl AccountScript {
    pub fn new(login: LoginBehavior) -> Self {
        Self {
            login,
            personal: Arc::new(Mutex::new(VecDeque::new())),
            groups: Vec::new(),
            family: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn with_personal(self, outcomes: Vec<Result<u64, String>>) -> Self {
        *self.personal.lock().unwrap() = outcomes.into();
        self
    }

    pub fn with_groups(mut self, ids: &[&str]) -> Self {
        self.groups = ids.iter().map(|id| (*id).to_owned()).collect();
        self
    }

    pub fn with_family(self, outcomes: Vec<Result<u64, String>>) -> Self {
        *self.family.lock().unwrap() = outcomes.into();
        self
    }
}

pub fn ok_times(bonus_mb: u64, count: usize) -> Vec<Result<u64, String>> {
    (0..count).map(|_| Ok(bonus_mb)).collect()
}

pub fn err_times(message: &str, count: usize) -> Vec<Result<u64, String>> {
    (0..count).map(|_| Err(message.to_owned())).collect()
}

#[derive(Default)]
pub struct ScriptedClient {
    scripts: Mutex<HashMap<String, AccountScript>>,
    counters: Arc<CallCounters>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> Arc<CallCounters> {
        Arc::clone(&self.counters)
    }

    pub fn script(&self, username: &str, script: AccountScript) {
        self.scripts
            .lock()
            .unwrap()
            .insert(username.to_owned(), script);
    }
}

impl CloudClient for ScriptedClient {
    fn login<'a>(
        &'a self,
        username: &'a str,
        _password: &'a str,
    ) -> BoxFuture<'a, Result<Arc<dyn CloudSession>>> {
        async move {
            self.counters.logins.fetch_add(1, Ordering::SeqCst);
            let script = self
                .scripts
                .lock()
                .unwrap()
                .get(username)
                .cloned()
                .ok_or_else(|| anyhow!("unknown account {username}"))?;

            match script.login {
                LoginBehavior::Succeed => Ok(Arc::new(ScriptedSession {
                    script,
                    counters: Arc::clone(&self.counters),
                }) as Arc<dyn CloudSession>),
                LoginBehavior::Fail(message) => Err(anyhow!("{message}")),
                LoginBehavior::Panic(message) => panic!("{message}"),
            }
        }
        .boxed()
    }
}

struct ScriptedSession {
    script: AccountScript,
    counters: Arc<CallCounters>,
}

fn pop_outcome(queue: &Mutex<VecDeque<Result<u64, String>>>) -> Result<SignBonus> {
    match queue.lock().unwrap().pop_front() {
        Some(Ok(bonus_mb)) => Ok(SignBonus {
            bonus_mb,
            already_signed: false,
        }),
        Some(Err(message)) => Err(anyhow!("{message}")),
        None => Ok(SignBonus {
            bonus_mb: 0,
            already_signed: true,
        }),
    }
}

impl CloudSession for ScriptedSession {
    fn personal_sign(&self) -> BoxFuture<'_, Result<SignBonus>> {
        async move {
            self.counters.personal_signs.fetch_add(1, Ordering::SeqCst);
            pop_outcome(&self.script.personal)
        }
        .boxed()
    }

    fn list_family_groups(&self) -> BoxFuture<'_, Result<Vec<FamilyGroup>>> {
        async move {
            self.counters.group_lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .script
                .groups
                .iter()
                .map(|id| FamilyGroup { id: id.clone() })
                .collect())
        }
        .boxed()
    }

    fn family_sign<'a>(&'a self, group_id: &'a str) -> BoxFuture<'a, Result<SignBonus>> {
        async move {
            self.counters.family_signs.fetch_add(1, Ordering::SeqCst);
            self.counters
                .family_group_ids
                .lock()
                .unwrap()
                .push(group_id.to_owned());
            pop_outcome(&self.script.family)
        }
        .boxed()
    }
}

/// Notification sink that records every delivery attempt and can be told to
/// fail each one.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

impl NotifySink for RecordingNotifier {
    fn send<'a>(&'a self, title: &'a str, body: &'a str) -> BoxFuture<'a, Result<()>> {
        async move {
            self.sent
                .lock()
                .unwrap()
                .push((title.to_owned(), body.to_owned()));
            if self.fail {
                return Err(anyhow!("webhook unreachable"));
            }
            Ok(())
        }
        .boxed()
    }
}
