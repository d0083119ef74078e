//! Shared in-memory fakes for the collaborator traits.
//!
//! The fakes record every mutation so tests can assert on what a pass
//! actually changed, and they support injected failures keyed by issue so
//! error paths are reachable without a network.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::bugzilla::{Bug, BugComment, BugzillaClient, BugzillaError};
use crate::jira::{
    Issue, IssueComment, IssueFields, JiraClient, JiraError, RemoteLink, Transition,
};
use crate::scm::{PullRequest, ScmClient, ScmError};
use crate::types::{BugzillaBugId, IssueKey, PrNumber, RepoId};

/// A bare issue with the given ID and key.
pub fn issue(id: &str, key: &str) -> Issue {
    Issue {
        id: id.to_string(),
        key: IssueKey::new(key),
        fields: IssueFields::default(),
    }
}

/// An in-memory Jira server.
pub struct FakeJira {
    issues: Mutex<Vec<Issue>>,
    remote_links: Mutex<HashMap<String, Vec<RemoteLink>>>,
    transitions: Mutex<Vec<Transition>>,
    get_errors: Mutex<HashMap<String, String>>,
    update_errors: Mutex<HashMap<String, String>>,
    create_error: Mutex<Option<String>>,
    comments: Mutex<HashMap<String, Vec<IssueComment>>>,
    updates: AtomicUsize,
    transitions_applied: AtomicUsize,
    creates: AtomicUsize,
    next_link_id: AtomicU64,
}

impl FakeJira {
    pub fn new() -> Self {
        let statuses = ["NEW", "MODIFIED", "UPDATED", "VERIFIED", "CLOSED"];
        FakeJira {
            issues: Mutex::new(Vec::new()),
            remote_links: Mutex::new(HashMap::new()),
            transitions: Mutex::new(
                statuses
                    .iter()
                    .enumerate()
                    .map(|(i, status)| Transition {
                        id: (i + 1).to_string(),
                        name: status.to_string(),
                        target_status: status.to_string(),
                    })
                    .collect(),
            ),
            get_errors: Mutex::new(HashMap::new()),
            update_errors: Mutex::new(HashMap::new()),
            create_error: Mutex::new(None),
            comments: Mutex::new(HashMap::new()),
            updates: AtomicUsize::new(0),
            transitions_applied: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
            next_link_id: AtomicU64::new(1),
        }
    }

    pub fn insert(&self, issue: Issue) {
        self.issues.lock().unwrap().push(issue);
    }

    pub fn issue(&self, reference: &str) -> Issue {
        self.find(reference)
            .unwrap_or_else(|| panic!("no issue {reference} in the fake"))
    }

    fn find(&self, reference: &str) -> Option<Issue> {
        self.issues
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.key.as_str() == reference || i.id == reference)
            .cloned()
    }

    pub fn fail_get(&self, reference: &str, message: &str) {
        self.get_errors
            .lock()
            .unwrap()
            .insert(reference.to_string(), message.to_string());
    }

    pub fn fail_update(&self, reference: &str, message: &str) {
        self.update_errors
            .lock()
            .unwrap()
            .insert(reference.to_string(), message.to_string());
    }

    pub fn fail_create(&self, message: &str) {
        *self.create_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn set_transitions(&self, statuses: &[&str]) {
        *self.transitions.lock().unwrap() = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| Transition {
                id: (i + 1).to_string(),
                name: status.to_string(),
                target_status: status.to_string(),
            })
            .collect();
    }

    pub fn set_remote_links(&self, key: &str, links: Vec<RemoteLink>) {
        self.remote_links
            .lock()
            .unwrap()
            .insert(key.to_string(), links);
    }

    pub fn remote_links(&self, key: &str) -> Vec<RemoteLink> {
        self.remote_links
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn comments(&self, key: &str) -> Vec<IssueComment> {
        self.comments
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn transition_count(&self) -> usize {
        self.transitions_applied.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// The key the next created issue will get: one past the highest
    /// existing numeric suffix in the project.
    fn next_key(&self, project: &str) -> IssueKey {
        let issues = self.issues.lock().unwrap();
        let max = issues
            .iter()
            .filter_map(|i| i.key.as_str().strip_prefix(&format!("{project}-")))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        IssueKey::new(format!("{project}-{}", max + 1))
    }
}

impl Default for FakeJira {
    fn default() -> Self {
        FakeJira::new()
    }
}

impl JiraClient for FakeJira {
    fn base_url(&self) -> &str {
        "https://my-jira.com"
    }

    async fn get_issue(&self, reference: &str) -> Result<Option<Issue>, JiraError> {
        if let Some(message) = self.get_errors.lock().unwrap().get(reference) {
            return Err(JiraError::remote(message.clone()));
        }
        Ok(self.find(reference))
    }

    async fn create_issue(&self, fields: IssueFields) -> Result<Issue, JiraError> {
        if let Some(message) = self.create_error.lock().unwrap().clone() {
            return Err(JiraError::remote(message));
        }
        let project = fields.project.clone().unwrap_or_else(|| "OCPBUGS".to_string());
        let key = self.next_key(&project);
        let created = {
            let mut issues = self.issues.lock().unwrap();
            let created = Issue {
                id: (issues.len() + 1).to_string(),
                key,
                fields,
            };
            issues.push(created.clone());
            created
        };
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(created)
    }

    async fn update_issue(&self, issue: &Issue) -> Result<(), JiraError> {
        if let Some(message) = self.update_errors.lock().unwrap().get(issue.key.as_str()) {
            return Err(JiraError::remote(message.clone()));
        }
        let mut issues = self.issues.lock().unwrap();
        let stored = issues
            .iter_mut()
            .find(|i| i.key == issue.key)
            .unwrap_or_else(|| panic!("update for unknown issue {}", issue.key));
        *stored = issue.clone();
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_transitions(&self, _key: &str) -> Result<Vec<Transition>, JiraError> {
        Ok(self.transitions.lock().unwrap().clone())
    }

    async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<(), JiraError> {
        let target = self
            .transitions
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == transition_id)
            .map(|t| t.target_status.clone())
            .ok_or_else(|| JiraError::remote(format!("no transition {transition_id}")))?;
        let mut issues = self.issues.lock().unwrap();
        let stored = issues
            .iter_mut()
            .find(|i| i.key.as_str() == key || i.id == key)
            .ok_or_else(|| JiraError::remote(format!("no issue {key}")))?;
        stored.fields.status = Some(target);
        self.transitions_applied.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_remote_links(&self, key: &str) -> Result<Vec<RemoteLink>, JiraError> {
        Ok(self.remote_links(key))
    }

    async fn add_remote_link(&self, key: &str, link: &RemoteLink) -> Result<(), JiraError> {
        let mut stored = link.clone();
        if stored.id.is_none() {
            stored.id = Some(self.next_link_id.fetch_add(1, Ordering::SeqCst));
        }
        self.remote_links
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push(stored);
        Ok(())
    }

    async fn remove_remote_link(&self, key: &str, link_id: u64) -> Result<(), JiraError> {
        let mut links = self.remote_links.lock().unwrap();
        if let Some(links) = links.get_mut(key) {
            links.retain(|l| l.id != Some(link_id));
        }
        Ok(())
    }

    async fn add_comment(&self, key: &str, comment: &IssueComment) -> Result<(), JiraError> {
        self.comments
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push(comment.clone());
        Ok(())
    }
}

/// An in-memory legacy tracker.
pub struct FakeBugzilla {
    bugs: Mutex<HashMap<u64, Bug>>,
    comments: Mutex<HashMap<u64, Vec<BugComment>>>,
    sub_components: Mutex<HashMap<u64, HashMap<String, Vec<String>>>>,
}

impl FakeBugzilla {
    pub fn new() -> Self {
        FakeBugzilla {
            bugs: Mutex::new(HashMap::new()),
            comments: Mutex::new(HashMap::new()),
            sub_components: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, bug: Bug) {
        self.bugs.lock().unwrap().insert(bug.id, bug);
    }

    pub fn set_comments(&self, id: u64, texts: &[&str]) {
        self.comments.lock().unwrap().insert(
            id,
            texts
                .iter()
                .map(|text| BugComment {
                    text: text.to_string(),
                    private: false,
                })
                .collect(),
        );
    }

    pub fn set_sub_components(&self, id: u64, component: &str, subs: &[&str]) {
        self.sub_components.lock().unwrap().entry(id).or_default().insert(
            component.to_string(),
            subs.iter().map(|s| s.to_string()).collect(),
        );
    }
}

impl Default for FakeBugzilla {
    fn default() -> Self {
        FakeBugzilla::new()
    }
}

impl BugzillaClient for FakeBugzilla {
    fn base_url(&self) -> &str {
        "https://my-bugzilla.com"
    }

    async fn get_bug(&self, id: BugzillaBugId) -> Result<Option<Bug>, BugzillaError> {
        Ok(self.bugs.lock().unwrap().get(&id.0).cloned())
    }

    async fn list_comments(&self, id: BugzillaBugId) -> Result<Vec<BugComment>, BugzillaError> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .get(&id.0)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_sub_components(
        &self,
        id: BugzillaBugId,
    ) -> Result<HashMap<String, Vec<String>>, BugzillaError> {
        Ok(self
            .sub_components
            .lock()
            .unwrap()
            .get(&id.0)
            .cloned()
            .unwrap_or_default())
    }
}

/// An in-memory source-control host.
pub struct FakeScm {
    prs: Mutex<HashMap<(RepoId, PrNumber), PullRequest>>,
    labels: Mutex<HashMap<(RepoId, PrNumber), Vec<String>>>,
    human_labels: Mutex<HashSet<(RepoId, PrNumber, String)>>,
    users_by_email: Mutex<HashMap<String, Vec<String>>>,
}

impl FakeScm {
    pub fn new() -> Self {
        FakeScm {
            prs: Mutex::new(HashMap::new()),
            labels: Mutex::new(HashMap::new()),
            human_labels: Mutex::new(HashSet::new()),
            users_by_email: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert_pr(&self, repo: RepoId, pr: PullRequest) {
        self.prs.lock().unwrap().insert((repo, pr.number), pr);
    }

    pub fn set_labels(&self, repo: &RepoId, number: PrNumber, labels: &[&str]) {
        self.labels.lock().unwrap().insert(
            (repo.clone(), number),
            labels.iter().map(|l| l.to_string()).collect(),
        );
    }

    pub fn labels(&self, repo: &RepoId, number: PrNumber) -> Vec<String> {
        self.labels
            .lock()
            .unwrap()
            .get(&(repo.clone(), number))
            .cloned()
            .unwrap_or_default()
    }

    pub fn mark_human_label(&self, repo: &RepoId, number: PrNumber, label: &str) {
        self.human_labels
            .lock()
            .unwrap()
            .insert((repo.clone(), number, label.to_string()));
    }

    pub fn set_users(&self, email: &str, logins: &[&str]) {
        self.users_by_email.lock().unwrap().insert(
            email.to_string(),
            logins.iter().map(|l| l.to_string()).collect(),
        );
    }
}

impl Default for FakeScm {
    fn default() -> Self {
        FakeScm::new()
    }
}

impl ScmClient for FakeScm {
    async fn get_pull_request(
        &self,
        repo: &RepoId,
        number: PrNumber,
    ) -> Result<Option<PullRequest>, ScmError> {
        Ok(self
            .prs
            .lock()
            .unwrap()
            .get(&(repo.clone(), number))
            .cloned())
    }

    async fn list_labels(
        &self,
        repo: &RepoId,
        number: PrNumber,
    ) -> Result<Vec<String>, ScmError> {
        Ok(self.labels(repo, number))
    }

    async fn add_label(
        &self,
        repo: &RepoId,
        number: PrNumber,
        label: &str,
    ) -> Result<(), ScmError> {
        self.labels
            .lock()
            .unwrap()
            .entry((repo.clone(), number))
            .or_default()
            .push(label.to_string());
        Ok(())
    }

    async fn remove_label(
        &self,
        repo: &RepoId,
        number: PrNumber,
        label: &str,
    ) -> Result<(), ScmError> {
        if let Some(labels) = self.labels.lock().unwrap().get_mut(&(repo.clone(), number)) {
            labels.retain(|l| l != label);
        }
        Ok(())
    }

    async fn label_applied_by_human(
        &self,
        repo: &RepoId,
        number: PrNumber,
        label: &str,
    ) -> Result<bool, ScmError> {
        Ok(self
            .human_labels
            .lock()
            .unwrap()
            .contains(&(repo.clone(), number, label.to_string())))
    }

    async fn search_users_by_email(&self, email: &str) -> Result<Vec<String>, ScmError> {
        Ok(self
            .users_by_email
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .unwrap_or_default())
    }
}
