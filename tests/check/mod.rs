//! Tests for the cross-store consistency checks.
//!
//! This module seeds both stores with diverging data and verifies the matches, alerts and
//! proposed SQL each checker reports.

mod cross_reference;
mod validation;
