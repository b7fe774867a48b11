//! Application-level orchestration utilities.
//!
//! This module owns the interactive analysis lifecycle (submit/resolve/open) and
//! post-analysis processing such as exports and report retrieval. UI/CLI layers call into
//! this module to keep responsibilities separated.

mod controller;
mod post_process;

pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use post_process::{export_json, process_analysis};
