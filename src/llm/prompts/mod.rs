// ABOUTME: System prompts for LLM interactions loaded at compile time
// ABOUTME: Provides the Anchor Systems sales assistant prompt for the chat endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy maintenance.

/// Anchor Systems sales assistant system prompt
///
/// Contains instructions for the AI assistant including:
/// - Role and communication style
/// - Service and pricing details for both product lines
/// - Guidelines for steering prospects toward the contact form
pub const ANCHOR_SYSTEM_PROMPT: &str = include_str!("anchor_system.md");

/// Get the system prompt for the Anchor Systems sales assistant
#[must_use]
pub const fn anchor_system_prompt() -> &'static str {
    ANCHOR_SYSTEM_PROMPT
}
