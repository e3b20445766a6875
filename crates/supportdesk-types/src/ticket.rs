//! Bulk ticket view: listing payloads, ordering, filtering and summary figures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::{
    Classification, ClassificationReasons, QueryResult, ResponseType, SessionId, TICKET_SESSION_ID,
};

/// Flat ticket record as stored by the backend's ticket index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub id: String,
    pub subject: String,
    pub body: String,
    pub topic: String,
    pub sentiment: String,
    pub priority: String,
    pub confidence: f64,
    pub topic_reasoning: String,
    pub sentiment_reasoning: String,
    pub priority_reasoning: String,
    pub processing_time: f64,
    #[serde(default)]
    pub cache_hit: Option<bool>,
    #[serde(default)]
    pub response_type: Option<ResponseType>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TicketRecord {
    /// Project the record onto the dashboard's ticket shape
    pub fn into_ticket(self, listed_at: DateTime<Utc>) -> Ticket {
        Ticket {
            id: self.id,
            timestamp: self.timestamp.unwrap_or(listed_at),
            query: self.subject,
            result: QueryResult {
                answer: self.body,
                citations: Vec::new(),
                classification: Classification {
                    topic: self.topic,
                    sentiment: self.sentiment,
                    priority: self.priority,
                    confidence: self.confidence,
                },
                classification_reasons: ClassificationReasons {
                    topic: self.topic_reasoning,
                    sentiment: self.sentiment_reasoning,
                    priority: self.priority_reasoning,
                },
                processing_time_seconds: self.processing_time,
                cache_hit: self.cache_hit.unwrap_or(false),
                followup_suggestions: Vec::new(),
                session_id: SessionId::from(TICKET_SESSION_ID),
                response_type: self.response_type.unwrap_or_default(),
            },
        }
    }
}

/// Response of the ticket listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TicketList {
    pub tickets: Vec<TicketRecord>,
    #[serde(default)]
    pub count: Option<usize>,
    /// Set by the backend when the listing itself failed
    #[serde(default)]
    pub error: Option<String>,
}

/// Read-only classified ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub query: String,
    #[serde(flatten)]
    pub result: QueryResult,
}

impl Ticket {
    pub fn classification(&self) -> &Classification {
        &self.result.classification
    }

    fn sequence_number(&self) -> Option<u64> {
        self.id
            .rsplit_once('-')
            .map(|(_, n)| n)
            .unwrap_or(&self.id)
            .parse()
            .ok()
    }
}

/// Order tickets by the numeric part of `TICKET-<n>`; unnumbered ids go last
pub fn sort_tickets(tickets: &mut [Ticket]) {
    tickets.sort_by(|a, b| match (a.sequence_number(), b.sequence_number()) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
}

/// Label filter for the ticket table; all set fields must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub topic: Option<String>,
    pub sentiment: Option<String>,
    pub priority: Option<String>,
}

impl TicketFilter {
    /// Build a filter where `None` or `"all"` leaves a field unconstrained
    pub fn new(topic: Option<String>, sentiment: Option<String>, priority: Option<String>) -> Self {
        fn normalize(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty() && !v.trim().eq_ignore_ascii_case("all"))
        }
        Self {
            topic: normalize(topic),
            sentiment: normalize(sentiment),
            priority: normalize(priority),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.topic.is_none() && self.sentiment.is_none() && self.priority.is_none()
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        let c = ticket.classification();
        self.topic.as_deref().map_or(true, |t| c.topic == t)
            && self.sentiment.as_deref().map_or(true, |s| c.sentiment == s)
            && self.priority.as_deref().map_or(true, |p| c.priority == p)
    }

    pub fn apply<'a>(&self, tickets: &'a [Ticket]) -> Vec<&'a Ticket> {
        tickets.iter().filter(|t| self.matches(t)).collect()
    }
}

/// Headline figures shown above the ticket table
#[derive(Debug, Clone, PartialEq)]
pub struct TicketSummary {
    pub total: usize,
    pub high_priority: usize,
    pub average_confidence: Option<f64>,
    pub average_processing_time: Option<f64>,
}

impl TicketSummary {
    pub fn from_tickets<'a, I>(tickets: I) -> Self
    where
        I: IntoIterator<Item = &'a Ticket>,
    {
        let mut total = 0usize;
        let mut high_priority = 0usize;
        let mut confidence_sum = 0.0;
        let mut processing_sum = 0.0;

        for ticket in tickets {
            total += 1;
            if ticket.classification().priority == "P0" {
                high_priority += 1;
            }
            confidence_sum += ticket.classification().confidence;
            processing_sum += ticket.result.processing_time_seconds;
        }

        let average = |sum: f64| (total > 0).then(|| sum / total as f64);
        Self {
            total,
            high_priority,
            average_confidence: average(confidence_sum),
            average_processing_time: average(processing_sum),
        }
    }
}
