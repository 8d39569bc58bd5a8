// ABOUTME: Offset-based pagination metadata shared by the listing endpoints
// ABOUTME: Serializes as the {total, limit, offset, hasMore} wire shape
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

use serde::{Deserialize, Serialize};

/// Pagination metadata returned alongside every paginated listing
///
/// The invariant consumers rely on: `has_more == offset + limit < total`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    /// Total number of rows matching the filter, ignoring limit/offset
    pub total: i64,
    /// Requested page size
    pub limit: i64,
    /// Requested row offset
    pub offset: i64,
    /// Whether another page exists past this one
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

impl Pagination {
    /// Build pagination metadata from a total count and the request window
    #[must_use]
    pub const fn new(total: i64, limit: i64, offset: i64) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: offset + limit < total,
        }
    }
}
