//! Shared test harness modules for the speedcam CLI.

use super::*;

mod build_steps;
mod helpers;
