// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — wires configuration to the backend crates for the CLI.

pub mod app_services;
pub mod data_dir;
pub mod files;
pub mod orchestrator;
pub mod settings;
