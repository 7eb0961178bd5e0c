// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Sessions
//!
//! Two record types joined by one projection:
//!
//! | Type | Lives in | Holds key | Crosses process boundary |
//! |------|----------|-----------|--------------------------|
//! | [`InternalSession`] | process memory | yes | never |
//! | [`Session`] | responses, external storage | no | always |

pub mod engine;
pub mod store;
pub mod sweeper;
pub mod types;

pub use engine::{
    identity_id, new_session_id, validate_session_id, SessionEngine, SessionRequest, SignResult,
    SESSION_TTL,
};
pub use store::{BoundedStore, Expiring, InsertError};
pub use sweeper::SessionSweeper;
pub use types::{InternalSession, Session, SessionCapability};
