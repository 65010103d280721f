use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MapSearchError, Result};

const GREETING: &str = "Hi! 👋 I'm your EstateIndia assistant. How can I help you today?";

const FALLBACK: &str = "I understand your question. Let me connect you with our support team for the best assistance. Please use the 'Contact Support' button below!";

/// Canned question with its fixed answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickQuestion {
    pub question: &'static str,
    pub answer: &'static str,
}

pub const QUICK_QUESTIONS: [QuickQuestion; 5] = [
    QuickQuestion {
        question: "How do I list my property?",
        answer: "To list your property:\n1. Sign up as a Property Owner\n2. Click 'Post Property' in the header\n3. Fill in property details\n4. Upload photos\n5. Submit for review\n\nYour property will be live within 24 hours!",
    },
    QuickQuestion {
        question: "What are the fees?",
        answer: "Our pricing is transparent:\n\n• Property Owners: Free to list, 2% commission on sale\n• Brokers: ₹999/month subscription\n• Tenants/Buyers: Completely FREE\n• Premium listings: Starting from ₹2,999/month",
    },
    QuickQuestion {
        question: "How to schedule a property visit?",
        answer: "Scheduling a visit is easy:\n1. Go to the property details page\n2. Click 'Request Information' or 'Contact via WhatsApp'\n3. Fill in your details and preferred time\n4. The owner/broker will contact you within 2 hours!",
    },
    QuickQuestion {
        question: "Is my data safe?",
        answer: "Absolutely! We take security seriously:\n✅ SSL encrypted connections\n✅ No data sharing with third parties\n✅ Verified property owners\n✅ Secure payment gateway\n✅ Privacy-first approach",
    },
    QuickQuestion {
        question: "How do I contact support?",
        answer: "We're here to help!\n\n📧 Email: support@estateindia.com\n📱 Phone: +91 98765 43210\n💬 Live Chat: Right here!\n⏰ Working Hours: Mon-Sat, 9 AM - 7 PM",
    },
];

/// Keyword groups checked in order; the first group with a hit picks the answer
const KEYWORD_RULES: [(&[&str], usize); 5] = [
    (&["price", "cost", "fee"], 1),
    (&["list", "post", "sell"], 0),
    (&["visit", "schedule", "viewing"], 2),
    (&["safe", "security", "privacy"], 3),
    (&["contact", "support", "help"], 4),
];

/// Answer for free text, falling back to the contact-support prompt
pub fn reply(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, index)| QUICK_QUESTIONS[*index].answer)
        .unwrap_or(FALLBACK)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: u32,
    pub text: String,
    pub from_bot: bool,
    pub timestamp: DateTime<Utc>,
}

/// Contact form handed to the assistant. Nothing is stored or sent anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Rule-based assistant with an in-memory transcript
#[derive(Debug, Clone)]
pub struct Chatbot {
    messages: Vec<ChatMessage>,
}

impl Default for Chatbot {
    fn default() -> Self {
        Self::new()
    }
}

impl Chatbot {
    pub fn new() -> Self {
        let mut bot = Self {
            messages: Vec::new(),
        };
        bot.push(GREETING.to_string(), true);
        bot
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send a user message. Blank input is ignored and returns `None`.
    pub fn send(&mut self, text: &str) -> Option<&ChatMessage> {
        if text.trim().is_empty() {
            return None;
        }
        let answer = reply(text);
        debug!(input = text, "chat message received");
        self.push(text.to_string(), false);
        Some(self.push(answer.to_string(), true))
    }

    pub fn ask_quick(&mut self, index: usize) -> Option<&ChatMessage> {
        let quick = *QUICK_QUESTIONS.get(index)?;
        self.push(quick.question.to_string(), false);
        Some(self.push(quick.answer.to_string(), true))
    }

    pub fn submit_contact(&mut self, request: &ContactRequest) -> Result<&ChatMessage> {
        let name = request.name.trim();
        let email = request.email.trim();
        if name.is_empty() {
            return Err(MapSearchError::InvalidContact("name is required".to_string()));
        }
        if !email.contains('@') {
            return Err(MapSearchError::InvalidContact(format!("invalid email: {}", email)));
        }

        let text = format!(
            "Thank you, {}! 🎉 We've received your message and will get back to you at {} within 2 hours. Our team is on it!",
            name, email
        );
        Ok(self.push(text, true))
    }

    fn push(&mut self, text: String, from_bot: bool) -> &ChatMessage {
        let id = self.messages.len() as u32 + 1;
        self.messages.push(ChatMessage {
            id,
            text,
            from_bot,
            timestamp: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }
}
