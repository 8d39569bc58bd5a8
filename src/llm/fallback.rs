// ABOUTME: Canned chatbot responses used when no Gemini API key is configured
// ABOUTME: Matches keywords in priority order and always returns an answer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

//! Keyword-matched fallback responses.
//!
//! Rules are evaluated top to bottom against the lowercased user message and
//! the first match wins, so a message mentioning both pricing and chatbots
//! gets the pricing answer. The final rule matches everything.

/// Pricing overview, first priority
const PRICING_RESPONSE: &str = "Our LLM Chatbot solutions start at $2,000-$4,000 for basic implementations, with our most popular Professional tier at $5,000-$12,000. RAG Systems start at $3,000-$5,000 for a proof of concept. For an accurate quote tailored to your needs, please fill out our contact form below and we'll get back to you within 24 hours!";

/// Chatbot service line pitch
const CHATBOT_RESPONSE: &str = "Our LLM-powered chatbots are trained on your specific business data to handle 60-80% of support tickets autonomously. They provide 24/7 support, reduce response times, and seamlessly hand off complex issues to human agents. Would you like to learn more about our pricing or get a custom quote?";

/// RAG service line pitch
const RAG_RESPONSE: &str = "Our RAG (Retrieval-Augmented Generation) systems connect AI to your internal documents and databases, providing accurate, cited answers without hallucinations. They're perfect for legal research, healthcare protocols, and internal knowledge bases. Scroll down to our contact form to discuss your specific use case!";

/// Steer the prospect to the contact form
const CONTACT_RESPONSE: &str = "I'd love to connect you with our team! Please scroll down to the 'Get In Touch' section and fill out the contact form. Include details about your project, and we'll get back to you within 24 hours with a personalized consultation.";

/// Implementation timeline answer
const TIMELINE_RESPONSE: &str = "Implementation typically takes 2-6 weeks for chatbots and 4-8 weeks for RAG systems, depending on complexity and data volume. We'll provide a detailed timeline during our consultation. Ready to get started? Fill out the contact form below!";

/// Greeting
const GREETING_RESPONSE: &str = "Hello! Welcome to Anchor Systems. I'm here to help you learn about our AI solutions. We specialize in LLM-powered chatbots and enterprise RAG systems. What would you like to know more about?";

/// Catch-all when nothing else matched
const DEFAULT_RESPONSE: &str = "Thanks for your interest in Anchor Systems! We specialize in custom LLM chatbots and enterprise RAG systems. I'd recommend filling out our contact form below so our team can provide personalized information for your specific needs. We respond within 24 hours!";

/// Keyword rules in priority order; the first rule whose keywords match wins
const RULES: &[(&[&str], &str)] = &[
    (&["pricing", "cost", "price"], PRICING_RESPONSE),
    (&["chatbot", "chat bot"], CHATBOT_RESPONSE),
    (&["rag", "retrieval"], RAG_RESPONSE),
    (&["quote", "contact", "talk", "speak"], CONTACT_RESPONSE),
    (&["how long", "timeline", "implementation"], TIMELINE_RESPONSE),
    (&["hello", "hi", "hey"], GREETING_RESPONSE),
];

/// Pick a canned reply for the user's message
///
/// Matching is case-insensitive substring search, so "hi" also fires inside
/// words like "this". That looseness is accepted; the canned answers are all
/// reasonable for a sales context.
#[must_use]
pub fn fallback_response(user_message: &str) -> &'static str {
    let lower = user_message.to_lowercase();
    for (keywords, response) in RULES {
        if keywords.iter().any(|k| lower.contains(k)) {
            return response;
        }
    }
    DEFAULT_RESPONSE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_takes_priority_over_chatbot() {
        let reply = fallback_response("What is the cost of a chatbot?");
        assert!(reply.contains("$2,000-$4,000"));
        assert!(reply.contains("$5,000-$12,000"));
    }

    #[test]
    fn test_chatbot_keyword() {
        let reply = fallback_response("Tell me about your chat bot offering");
        assert!(reply.contains("60-80%"));
    }

    #[test]
    fn test_rag_keyword_case_insensitive() {
        let reply = fallback_response("Do you build RAG pipelines?");
        assert!(reply.contains("Retrieval-Augmented Generation"));
    }

    #[test]
    fn test_contact_keyword() {
        let reply = fallback_response("I want to speak with someone");
        assert!(reply.contains("Get In Touch"));
    }

    #[test]
    fn test_timeline_phrase() {
        let reply = fallback_response("how long does this take?");
        assert!(reply.contains("2-6 weeks"));
    }

    #[test]
    fn test_greeting() {
        let reply = fallback_response("hello there");
        assert!(reply.contains("Welcome to Anchor Systems"));
    }

    #[test]
    fn test_default_for_unmatched_message() {
        let reply = fallback_response("xyzzy");
        assert!(reply.contains("Thanks for your interest in Anchor Systems"));
    }

    #[test]
    fn test_substring_matching_is_loose() {
        // "hi" inside "this" fires the greeting rule
        let reply = fallback_response("this does not mention anything");
        assert!(reply.contains("Welcome to Anchor Systems"));
    }
}
