// Camera Wi-Fi Setup - UI Module
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! User interface components.

mod console;

pub use console::Console;
