//! Shared test harness modules for the osmgrid CLI.

use super::*;

mod helpers;
mod pipeline;
mod unit;
