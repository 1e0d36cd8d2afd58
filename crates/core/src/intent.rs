use serde::{Deserialize, Serialize};

use crate::catalog::ProjectKey;
use crate::patterns::{PatternTable, TextClassifier};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Schedule,
    Learn,
    Contact,
    Question,
    Greeting,
    Thanks,
    ProjectSpecific,
    Unknown,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Learn => "learn",
            Self::Contact => "contact",
            Self::Question => "question",
            Self::Greeting => "greeting",
            Self::Thanks => "thanks",
            Self::ProjectSpecific => "project_specific",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword classifier for visitor messages.
///
/// Matching is case-insensitive and ordered: the first category whose rule
/// matches wins, so "schedule a call about a project" is `Schedule`.
#[derive(Clone, Debug)]
pub struct IntentClassifier {
    intents: PatternTable<Intent>,
    projects: PatternTable<ProjectKey>,
    lead_signals: PatternTable<Intent>,
}

impl IntentClassifier {
    /// `owner_name` feeds the rules that mention the site owner by name
    /// ("can ilyas ...", "contact ilyas").
    pub fn new(owner_name: &str) -> Self {
        let owner = owner_alternative(owner_name);

        let intents = PatternTable::compile([
            (Intent::Schedule, "(?i)schedul|meeting|call|chat|talk|speak|connect|book".to_string()),
            (Intent::Learn, "(?i)project|work|built|portfolio|show|tell.*about".to_string()),
            (Intent::Contact, r"(?i)contact|email|reach|linkedin|get\s+in\s+touch".to_string()),
            (
                Intent::Question,
                format!(r"(?i)experience|expertise|skill|know|background|capable|can\s+(he{owner})"),
            ),
            (Intent::ProjectSpecific, "(?i)lulu|rag|coa|antibod|librechat|graph|recommend".to_string()),
            (Intent::Greeting, r"(?i)^(hi|hello|hey|good\s+(morning|afternoon|evening)|greetings)".to_string()),
            (Intent::Thanks, "(?i)thank|thanks|thx|appreciate".to_string()),
        ]);

        let projects = PatternTable::compile([
            (ProjectKey::LuluBot, "(?i)lulu"),
            (ProjectKey::Rag, r"(?i)rag|technical\s+service|salesforce|search"),
            (ProjectKey::Coa, "(?i)coa|pdf|certificate|million|document"),
            (ProjectKey::Antibody, "(?i)antibod|pair|xgboost|semi.*supervis"),
            (ProjectKey::LibreChat, "(?i)librechat|chatgpt|internal"),
            (ProjectKey::Graph, "(?i)graph|recommend|network"),
        ]);

        let lead_signals = PatternTable::compile([
            (
                Intent::Schedule,
                r"(?i)\b(schedule|book|set\s*up)\s*(a\s*)?(call|meeting|time|chat)\b".to_string(),
            ),
            (Intent::Schedule, r"(?i)\b(hire|hiring|job|position|opportunity|recruit)\b".to_string()),
            (Intent::Contact, format!(r"(?i)\b(contact|reach|get\s*in\s*touch)\s*(him{owner})?\b")),
            (
                Intent::Contact,
                r"(?i)\b(share|give|send)\s*(my|me)?\s*(info|contact|email|details)\b".to_string(),
            ),
        ]);

        Self { intents, projects, lead_signals }
    }

    pub fn with_tables(
        intents: PatternTable<Intent>,
        projects: PatternTable<ProjectKey>,
        lead_signals: PatternTable<Intent>,
    ) -> Self {
        Self { intents, projects, lead_signals }
    }

    pub fn classify(&self, text: &str) -> Intent {
        self.intents.first_match(text).unwrap_or(Intent::Unknown)
    }

    pub fn detect_project(&self, text: &str) -> Option<ProjectKey> {
        self.projects.first_match(text)
    }

    /// Strong, explicit requests that start lead capture without an offer.
    pub fn detect_lead_intent(&self, text: &str) -> Option<Intent> {
        self.lead_signals.first_match(text)
    }
}

/// `|firstname` for splicing into an alternation, or nothing when the owner
/// has no name configured.
fn owner_alternative(owner_name: &str) -> String {
    match owner_name.split_whitespace().next() {
        Some(first) => format!("|{}", regex::escape(&first.to_lowercase())),
        None => String::new(),
    }
}
