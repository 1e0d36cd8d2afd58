//! Canned replies, keyed by reject reason, intent and capture step.
//!
//! This is the single table consulted by both the fallback resolver and the
//! direct paths (security replies, capture prompts, submission outcomes).
//! All text is parameterised by the site owner's profile.

use crate::capture::CapturePrompt;
use crate::catalog::{ProjectKey, EXPERTISE, PROJECTS};
use crate::config::OwnerConfig;
use crate::domain::lead::LeadRecord;
use crate::guard::RejectReason;
use crate::intent::Intent;

/// Follow-up the resolver should take after rendering a fallback reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyAction {
    None,
    StartCapture(Intent),
    OfferCapture(Intent),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CannedReply {
    /// Empty when the action produces its own text (capture start).
    pub text: String,
    pub action: ReplyAction,
}

impl CannedReply {
    fn say(text: String) -> Self {
        Self { text, action: ReplyAction::None }
    }

    fn offer(text: String, intent: Intent) -> Self {
        Self { text, action: ReplyAction::OfferCapture(intent) }
    }
}

#[derive(Clone, Debug)]
pub struct ReplyCatalog {
    owner: OwnerConfig,
}

impl ReplyCatalog {
    pub fn new(owner: OwnerConfig) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> &OwnerConfig {
        &self.owner
    }

    fn name(&self) -> &str {
        self.owner.name.split_whitespace().next().unwrap_or("the owner")
    }

    pub fn security(&self, reason: RejectReason) -> String {
        let name = self.name();
        match reason {
            RejectReason::TooLong => "I appreciate the detail, but could you keep your message shorter? I work best with concise questions. 😊".to_string(),
            RejectReason::RateLimited => "I'm still processing! Give me just a moment to respond.".to_string(),
            RejectReason::SessionLimitReached => format!(
                "We've had quite a conversation! If you'd like to continue chatting with {name} directly, I'd be happy to take your contact info and have {name} reach out."
            ),
            RejectReason::InjectionAttempt => format!(
                "I'm designed specifically to help you learn about {name} and get in touch. Is there something about {name}'s work or experience I can help you with?"
            ),
            RejectReason::ExtractionAttempt => format!(
                "I'm {name}'s portfolio assistant, here to help you learn about {name}'s work and get connected! What would you like to know about the projects or expertise?"
            ),
        }
    }

    pub fn off_topic(&self) -> String {
        let name = self.name();
        format!(
            "Great question, but I'm specifically here to help you learn about {name} and {name}'s work in AI and Data Science. I can tell you about projects, expertise, or help you get in touch. What interests you?"
        )
    }

    /// Generic reply when a message cannot be handled any other way.
    pub fn blocked(&self) -> String {
        let name = self.name();
        format!("I'm here to help you connect with {name} and learn about {name}'s AI/ML work. How can I assist you with that?")
    }

    pub fn greeting(&self) -> String {
        let name = self.name();
        format!(
            "Hello! 👋 Great to meet you! I'm here to help you learn about {name} and get connected.\n\nWhat brings you here today?\n\n📅 Schedule a conversation\n💼 Explore the projects\n📧 Get in touch\n❓ Ask about expertise"
        )
    }

    pub fn thanks(&self) -> String {
        let name = self.name();
        format!(
            "You're welcome! 😊 Is there anything else I can help you with? Feel free to ask about {name}'s work or let me know if you'd like to connect."
        )
    }

    pub fn contact_card(&self) -> String {
        let name = self.name();
        let email = &self.owner.email;
        format!(
            "Here's how to reach {name}:\n\n📧 Email: {email}\n\nWould you like me to let {name} know you're reaching out? I can take your details and you'll hear back within 24-48 hours!"
        )
    }

    pub fn project_list(&self) -> String {
        let mut text = format!("{} has built some impressive AI systems:\n\n", self.name());
        for (index, project) in PROJECTS.iter().enumerate() {
            text.push_str(&format!("{}️⃣ **{}**\n", index + 1, project.title));
        }
        text.push_str("\nWhich one would you like to know more about?");
        text
    }

    pub fn project_details(&self, key: ProjectKey) -> String {
        let project = key.project();
        let name = self.name();
        format!(
            "**{}**\n\n{}\n\nWould you like {name} to tell you more about how this was built? I can connect you!",
            project.title, project.description
        )
    }

    pub fn expertise(&self) -> String {
        let mut text = format!("{} specializes in:\n\n", self.name());
        for skill in EXPERTISE {
            text.push_str(&format!("• {skill}\n"));
        }
        let name = self.name();
        text.push_str(&format!(
            "\n{name} is particularly passionate about building AI systems that actually get deployed and used, not just POCs.\n\nAnything specific you'd like to know more about?"
        ));
        text
    }

    pub fn unknown(&self) -> String {
        let name = self.name();
        format!(
            "I'm here to help you learn about {name} and get connected! I can:\n\n📅 Help you schedule a conversation\n💼 Tell you about the AI/ML projects\n📧 Connect you with {name} directly\n❓ Answer questions about expertise\n\nWhat would you like to know?"
        )
    }

    /// Canned answer for a classified message when no remote answer is
    /// available.
    pub fn fallback(&self, intent: Intent, project: Option<ProjectKey>) -> CannedReply {
        match intent {
            Intent::Greeting => CannedReply::say(self.greeting()),
            Intent::Thanks => CannedReply::say(self.thanks()),
            Intent::Schedule => CannedReply {
                text: String::new(),
                action: ReplyAction::StartCapture(Intent::Schedule),
            },
            Intent::Contact => CannedReply::offer(self.contact_card(), Intent::Contact),
            Intent::Learn => CannedReply::say(self.project_list()),
            Intent::ProjectSpecific => match project {
                Some(key) => CannedReply::offer(self.project_details(key), Intent::Learn),
                None => CannedReply::say(self.unknown()),
            },
            Intent::Question => CannedReply::offer(self.expertise(), Intent::Question),
            Intent::Unknown => CannedReply::say(self.unknown()),
        }
    }

    pub fn capture_prompt(&self, prompt: &CapturePrompt) -> String {
        let name = self.name();
        match prompt {
            CapturePrompt::Opening(intent) => match intent {
                Intent::Schedule => format!(
                    "I'd love to help you set up a conversation with {name}! Let me get a few details so {name} can reach out to you personally.\n\nWhat's your name?"
                ),
                Intent::Learn => format!(
                    "That's great you're interested in {name}'s work! If you'd like more details directly from {name}, I can connect you.\n\nWhat's your name?"
                ),
                Intent::Question => format!(
                    "Great question! I'll make sure {name} can follow up with a detailed answer.\n\nFirst, what's your name?"
                ),
                _ => format!(
                    "Perfect, I'll make sure {name} gets your info! Responses typically arrive within 24-48 hours.\n\nWhat's your name?"
                ),
            },
            CapturePrompt::NameRetry => "I didn't quite catch that. Could you share your name?".to_string(),
            CapturePrompt::EmailAsk { name: visitor } => {
                format!("Nice to meet you, {visitor}! 😊\n\nWhat's the best email to reach you?")
            }
            CapturePrompt::EmailRetry => {
                "Hmm, that doesn't look like a valid email. Could you double-check it?".to_string()
            }
            CapturePrompt::CompanyAsk => "Got it! And where are you currently working? (Company name, or \"independent\" if freelancing)".to_string(),
            CapturePrompt::RoleAsk => "Great! What's your role there?".to_string(),
            CapturePrompt::ContextAsk(intent) => match intent {
                Intent::Schedule => format!(
                    "Perfect! Last thing: what would you like to discuss with {name}? (e.g., job opportunity, collaboration, technical consultation)"
                ),
                Intent::Learn => format!(
                    "Awesome! Is there a specific project or topic you'd like {name} to elaborate on?"
                ),
                Intent::Question => format!("Got it! What's the question you'd like {name} to answer?"),
                _ => format!("Great! Any specific message you'd like me to pass along to {name}?"),
            },
        }
    }

    pub fn decline(&self) -> String {
        format!(
            "No problem! Feel free to explore or ask me anything else about {}'s work. 😊",
            self.name()
        )
    }

    /// Capture start refused because the lead quota is spent.
    pub fn already_submitted_on_start(&self) -> String {
        format!("You've already submitted your info. {} will be in touch soon!", self.name())
    }

    /// Capture completed but the lead quota is spent.
    pub fn already_submitted_on_complete(&self) -> String {
        format!(
            "Thanks for your interest! You've already submitted your info. {} will reach out soon! 😊",
            self.name()
        )
    }

    pub fn confirmation(&self, lead: &LeadRecord) -> String {
        let name = self.name();
        format!(
            "Perfect, {}! 🎉\n\nI've passed your information to {name}:\n• **Email:** {}\n• **Company:** {}\n• **Role:** {}\n• **Reason:** {}\n\nExpect a response within **24-48 hours**. In the meantime, feel free to explore the projects or ask me anything else!",
            lead.name, lead.email, lead.company, lead.role, lead.message
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{ReplyAction, ReplyCatalog};
    use crate::capture::CapturePrompt;
    use crate::catalog::{ProjectKey, EXPERTISE};
    use crate::config::AppConfig;
    use crate::domain::lead::{LeadRecord, LEAD_SOURCE};
    use crate::guard::RejectReason;
    use crate::intent::Intent;

    fn catalog() -> ReplyCatalog {
        let mut owner = AppConfig::default().owner;
        owner.name = "Dana Reyes".to_string();
        owner.email = "dana@example.com".to_string();
        ReplyCatalog::new(owner)
    }

    #[test]
    fn security_replies_are_distinct_per_reason() {
        let catalog = catalog();
        let reasons = [
            RejectReason::TooLong,
            RejectReason::RateLimited,
            RejectReason::SessionLimitReached,
            RejectReason::InjectionAttempt,
            RejectReason::ExtractionAttempt,
        ];

        let mut texts: Vec<String> = reasons.iter().map(|reason| catalog.security(*reason)).collect();
        texts.push(catalog.off_topic());
        texts.sort();
        texts.dedup();

        assert_eq!(texts.len(), 6);
        assert!(catalog.security(RejectReason::SessionLimitReached).contains("Dana"));
    }

    #[test]
    fn fallback_actions_follow_intent() {
        let catalog = catalog();

        assert_eq!(
            catalog.fallback(Intent::Schedule, None).action,
            ReplyAction::StartCapture(Intent::Schedule)
        );
        assert_eq!(
            catalog.fallback(Intent::Contact, None).action,
            ReplyAction::OfferCapture(Intent::Contact)
        );
        assert_eq!(
            catalog.fallback(Intent::ProjectSpecific, Some(ProjectKey::Rag)).action,
            ReplyAction::OfferCapture(Intent::Learn)
        );
        assert_eq!(
            catalog.fallback(Intent::Question, None).action,
            ReplyAction::OfferCapture(Intent::Question)
        );
        assert_eq!(catalog.fallback(Intent::Learn, None).action, ReplyAction::None);
        assert_eq!(catalog.fallback(Intent::Greeting, None).action, ReplyAction::None);
    }

    #[test]
    fn project_specific_without_project_uses_unknown_menu() {
        let catalog = catalog();

        assert_eq!(catalog.fallback(Intent::ProjectSpecific, None).text, catalog.unknown());
    }

    #[test]
    fn contact_card_includes_owner_email() {
        assert!(catalog().contact_card().contains("dana@example.com"));
    }

    #[test]
    fn project_list_numbers_every_catalog_entry() {
        let text = catalog().project_list();

        assert!(text.starts_with("Dana has built"));
        assert!(text.contains("1️⃣ **LuluBot**"));
        assert!(text.contains("6️⃣ **Graph Recommendation Engine**"));
        assert!(text.ends_with("Which one would you like to know more about?"));
    }

    #[test]
    fn expertise_lists_one_bullet_per_skill() {
        let text = catalog().expertise();

        assert!(text.starts_with("Dana specializes in:\n\n• "));
        assert_eq!(text.matches("\n• ").count(), EXPERTISE.len());
        assert!(text.ends_with("Anything specific you'd like to know more about?"));
    }

    #[test]
    fn opening_prompt_defaults_to_contact_wording() {
        let catalog = catalog();

        assert_eq!(
            catalog.capture_prompt(&CapturePrompt::Opening(Intent::Greeting)),
            catalog.capture_prompt(&CapturePrompt::Opening(Intent::Contact))
        );
        assert_ne!(
            catalog.capture_prompt(&CapturePrompt::Opening(Intent::Schedule)),
            catalog.capture_prompt(&CapturePrompt::Opening(Intent::Contact))
        );
        assert!(catalog
            .capture_prompt(&CapturePrompt::EmailAsk { name: "Ann".to_string() })
            .starts_with("Nice to meet you, Ann!"));
    }

    #[test]
    fn confirmation_summarises_captured_fields() {
        let lead = LeadRecord {
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            company: "Acme".to_string(),
            role: "Engineer".to_string(),
            intent: Intent::Schedule,
            project_interest: None,
            message: "Discuss a role".to_string(),
            created_at: Utc::now(),
            source: LEAD_SOURCE.to_string(),
        };

        let text = catalog().confirmation(&lead);

        assert!(text.starts_with("Perfect, Ann!"));
        assert!(text.contains("• **Email:** ann@example.com"));
        assert!(text.contains("• **Company:** Acme"));
        assert!(text.contains("• **Role:** Engineer"));
        assert!(text.contains("• **Reason:** Discuss a role"));
        assert!(text.contains("**24-48 hours**"));
    }
}
