// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Declarative theme bundle management for the desktop.
//!
//! Oxitheme resolves theme manifests out of remote repositories, keeps a
//! local theme store in sync with their sources, and runs component
//! lifecycle hooks on apply and removal. The [`theme`] module owns the
//! manifest and resolution machinery, [`registry`] enumerates the central
//! registry, and [`install`] synchronizes local working copies.

pub mod config;
pub mod install;
pub mod path;
pub mod registry;
pub mod script;
pub mod theme;
